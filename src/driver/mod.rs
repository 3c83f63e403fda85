// Driver module - the client-connectivity capability consumed by `Connection` and `ResultRow`
//
// - cursor: caller and worker halves of a statement stepped one row per fetch
// - worker: thread owning a native connection for the bundled backends
// - scripted: in-memory driver for unit tests

pub(crate) mod cursor;
#[cfg(test)]
pub(crate) mod scripted;
#[cfg(any(feature = "sqlite", feature = "postgres"))]
pub(crate) mod worker;

use crate::config::ConnectionConfig;
use crate::error::SqlPassthroughError;

/// A client library binding able to run SQL text on one connection.
///
/// Implementations own the native connection handle. `Connection` serializes every call behind
/// its guard, so methods take `&mut self` and need no internal locking.
pub trait Driver: Send + Sized {
    type Statement: Statement;

    /// Allocate, configure (timeout) and connect.
    ///
    /// # Errors
    /// Returns `SqlPassthroughError` if any setup step fails.
    fn connect(config: &ConnectionConfig) -> Result<Self, SqlPassthroughError>;

    /// Execute text directly on a transient statement and discard any rows.
    ///
    /// # Errors
    /// Returns `SqlPassthroughError` if the driver rejects the statement.
    fn exec_direct(&mut self, sql: &str) -> Result<(), SqlPassthroughError>;

    /// Execute text and keep the statement open for fetching.
    ///
    /// The returned cursor is positioned before the first row.
    ///
    /// # Errors
    /// Returns `SqlPassthroughError` if the driver rejects the statement.
    fn open_cursor(&mut self, sql: &str) -> Result<Self::Statement, SqlPassthroughError>;

    /// Row id generated by the most recent insert, or 0 where the backend has no such notion.
    fn last_insert_id(&self) -> u64 {
        0
    }

    /// Human readable version of the underlying client library.
    fn client_version(&self) -> String {
        String::new()
    }

    /// Disconnect and free the handle.
    ///
    /// # Errors
    /// Returns `SqlPassthroughError` if the driver reports a failure while closing.
    fn disconnect(self) -> Result<(), SqlPassthroughError>;
}

/// An executed statement and its cursor. Ordinals are 1-based.
pub trait Statement {
    /// Number of result columns.
    ///
    /// # Errors
    /// Returns `SqlPassthroughError` if column metadata is unavailable.
    fn column_count(&self) -> Result<u16, SqlPassthroughError>;

    /// Column name as reported by the driver.
    ///
    /// # Errors
    /// Returns `SqlPassthroughError` if the ordinal is out of range.
    fn column_name(&self, ordinal: u16) -> Result<String, SqlPassthroughError>;

    /// Advance to the next row. `Ok(false)` at end of data.
    ///
    /// # Errors
    /// Returns `SqlPassthroughError` if the driver fails while fetching.
    fn fetch(&mut self) -> Result<bool, SqlPassthroughError>;

    /// Current row value as a signed 64-bit integer; `None` for NULL.
    ///
    /// # Errors
    /// Returns `SqlPassthroughError` if there is no current row or the value does not convert.
    fn get_i64(&self, ordinal: u16) -> Result<Option<i64>, SqlPassthroughError>;

    /// Current row value as text; `None` for NULL.
    ///
    /// # Errors
    /// Returns `SqlPassthroughError` if there is no current row or the value does not convert.
    fn get_text(&self, ordinal: u16) -> Result<Option<String>, SqlPassthroughError>;

    /// Current row value as raw bytes, sized by the driver; `None` for NULL.
    ///
    /// # Errors
    /// Returns `SqlPassthroughError` if there is no current row or the value does not convert.
    fn get_binary(&self, ordinal: u16) -> Result<Option<Vec<u8>>, SqlPassthroughError>;
}
