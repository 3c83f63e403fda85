use std::collections::HashMap;

use crate::connection::Lease;
use crate::driver::{Driver, Statement};
use crate::error::SqlPassthroughError;

/// The current row of an executed query.
///
/// This is a cursor, not a materialized row set: fields are read from whatever row the statement
/// is positioned on, and [`next`](Self::next) moves it. The column name to ordinal mapping is
/// built once at construction and never changes.
///
/// A `ResultRow` owns its statement and holds the connection's guard until it is dropped, so no
/// other statement can run on the same connection while rows are being fetched. Other threads
/// wait for it; the holding thread gets [`SqlPassthroughError::StatementActive`] until it drops
/// the row.
pub struct ResultRow<'c, D: Driver> {
    statement: D::Statement,
    column_index: HashMap<String, u16>,
    column_names: Vec<String>,
    // declared last: the statement is released before the connection is handed back
    _lease: Lease<'c, D>,
}

impl<'c, D: Driver> ResultRow<'c, D> {
    /// Wrap an executed statement, reading its column metadata.
    ///
    /// If the metadata cannot be read the mapping is left empty and every lookup falls back to
    /// its "column not found" result.
    pub(crate) fn new(lease: Lease<'c, D>, statement: D::Statement) -> Self {
        let column_names = match read_column_names(&statement) {
            Ok(names) => names,
            Err(e) => {
                tracing::warn!("failed to enumerate result columns: {e}");
                Vec::new()
            }
        };

        // Build a cache of column name to ordinal; a repeated name resolves to its last ordinal
        let column_index = column_names
            .iter()
            .cloned()
            .zip(1u16..)
            .collect::<HashMap<_, _>>();

        Self {
            statement,
            column_index,
            column_names,
            _lease: lease,
        }
    }

    /// Advance to the next row.
    ///
    /// Returns `false` both at end of data and on a fetch error; use [`try_next`](Self::try_next)
    /// to tell them apart.
    pub fn next(&mut self) -> bool {
        match self.try_next() {
            Ok(more) => more,
            Err(e) => {
                tracing::warn!("fetch failed: {e}");
                false
            }
        }
    }

    /// Advance to the next row, reporting driver errors.
    ///
    /// # Errors
    ///
    /// Returns `SqlPassthroughError` if the driver fails while fetching.
    pub fn try_next(&mut self) -> Result<bool, SqlPassthroughError> {
        self.statement.fetch()
    }

    /// Alias of [`next`](Self::next): advances the cursor.
    pub fn has_next(&mut self) -> bool {
        self.next()
    }

    /// 1-based ordinal of `name`, exactly as the driver reported it.
    #[must_use]
    pub fn ordinal(&self, name: &str) -> Option<u16> {
        self.column_index.get(name).copied()
    }

    /// Column names in ordinal order.
    #[must_use]
    pub fn column_names(&self) -> &[String] {
        &self.column_names
    }

    #[must_use]
    pub fn column_count(&self) -> usize {
        self.column_names.len()
    }

    fn lookup(&self, name: &str) -> Result<u16, SqlPassthroughError> {
        self.ordinal(name)
            .ok_or_else(|| SqlPassthroughError::ColumnNotFound(name.to_string()))
    }

    /// Integer value of `name` in the current row; `Ok(None)` for NULL.
    ///
    /// # Errors
    ///
    /// Returns `SqlPassthroughError::ColumnNotFound` if the result has no such column, or the
    /// driver's error if the value cannot be fetched as an integer.
    pub fn try_get_integer(&self, name: &str) -> Result<Option<i64>, SqlPassthroughError> {
        let ordinal = self.lookup(name)?;
        self.statement.get_i64(ordinal)
    }

    /// Text value of `name` in the current row; `Ok(None)` for NULL.
    ///
    /// # Errors
    ///
    /// Returns `SqlPassthroughError::ColumnNotFound` if the result has no such column, or the
    /// driver's error if the value cannot be fetched as text.
    pub fn try_get_string(&self, name: &str) -> Result<Option<String>, SqlPassthroughError> {
        let ordinal = self.lookup(name)?;
        self.statement.get_text(ordinal)
    }

    /// Binary value of `name` in the current row; `Ok(None)` for NULL.
    ///
    /// The buffer is sized by the driver from the actual value length.
    ///
    /// # Errors
    ///
    /// Returns `SqlPassthroughError::ColumnNotFound` if the result has no such column, or the
    /// driver's error if the value cannot be fetched as bytes.
    pub fn try_get_binary(&self, name: &str) -> Result<Option<Vec<u8>>, SqlPassthroughError> {
        let ordinal = self.lookup(name)?;
        self.statement.get_binary(ordinal)
    }

    /// Integer value of `name`, or `0` when the column is absent, NULL, or unreadable.
    ///
    /// A `0` is ambiguous; callers that need to know why should use
    /// [`try_get_integer`](Self::try_get_integer).
    #[must_use]
    pub fn get_integer(&self, name: &str) -> i64 {
        match self.try_get_integer(name) {
            Ok(value) => value.unwrap_or_default(),
            Err(SqlPassthroughError::ColumnNotFound(_)) => 0,
            Err(e) => {
                tracing::warn!("error during get_integer({name}): {e}");
                0
            }
        }
    }

    /// Integer value of `name` converted to `T`, or `T::default()` if it does not fit.
    #[must_use]
    pub fn get_number<T>(&self, name: &str) -> T
    where
        T: TryFrom<i64> + Default,
    {
        let value = self.get_integer(name);
        T::try_from(value).unwrap_or_else(|_| {
            tracing::warn!("value {value} of column {name} is out of range");
            T::default()
        })
    }

    /// Text value of `name`, or an empty string when the column is absent, NULL, or unreadable.
    ///
    /// NULL and empty text are deliberately the same here: columns that default to NULL read as
    /// "no value".
    #[must_use]
    pub fn get_string(&self, name: &str) -> String {
        match self.try_get_string(name) {
            Ok(value) => value.unwrap_or_default(),
            Err(SqlPassthroughError::ColumnNotFound(_)) => String::new(),
            Err(e) => {
                tracing::warn!("error during get_string({name}): {e}");
                String::new()
            }
        }
    }

    /// Binary value of `name`, or `None` when the column is absent, NULL, or unreadable.
    ///
    /// The value's size is the length of the returned vector.
    #[must_use]
    pub fn get_binary(&self, name: &str) -> Option<Vec<u8>> {
        match self.try_get_binary(name) {
            Ok(value) => value,
            Err(SqlPassthroughError::ColumnNotFound(_)) => None,
            Err(e) => {
                tracing::warn!("error during get_binary({name}): {e}");
                None
            }
        }
    }
}

impl<D: Driver> Drop for ResultRow<'_, D> {
    fn drop(&mut self) {
        tracing::trace!("releasing statement");
    }
}

fn read_column_names<S: Statement>(statement: &S) -> Result<Vec<String>, SqlPassthroughError> {
    let count = statement.column_count()?;
    (1..=count)
        .map(|ordinal| statement.column_name(ordinal))
        .collect()
}
