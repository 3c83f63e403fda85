use std::fmt;
use std::ops::{Deref, DerefMut};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::thread::{self, ThreadId};

use crate::config::ConnectionConfig;
use crate::driver::Driver;
use crate::error::SqlPassthroughError;
use crate::escape::{escape_bytes, escape_string};
use crate::results::ResultRow;
use crate::translation::{TranslationMode, translate_if};

/// One database connection shared by every caller.
///
/// All statements go through a single guard: at most one `execute` or `query` talks to the driver
/// at a time and other callers block until it is free. A [`ResultRow`] returned by `query` keeps
/// holding the guard until it is dropped; a statement issued from the thread holding that row
/// fails with [`SqlPassthroughError::StatementActive`] instead of waiting on itself.
///
/// If the connection could not be established every operation is a no-op that reports failure.
///
/// ```rust
/// # #[cfg(feature = "sqlite")]
/// # {
/// use sql_passthrough::prelude::*;
///
/// let conn = SqliteConnection::open(&ConnectionConfig::builder(":memory:".into()).finish());
/// assert!(conn.execute("CREATE TABLE `players` (`id` INTEGER, `name` TEXT)"));
/// let name = conn.escape_string("O'Brien");
/// assert!(conn.execute(&format!("INSERT INTO `players` VALUES (1, {name})")));
///
/// let row = conn.query("SELECT `id`, `name` FROM `players`").expect("one row");
/// assert_eq!(row.get_string("name"), "O'Brien");
/// # }
/// ```
pub struct Connection<D: Driver> {
    driver: Mutex<Option<D>>,
    holder: Mutex<Option<ThreadId>>,
    connected: bool,
    translate_identifiers: bool,
    data_source: String,
}

impl<D: Driver> Connection<D> {
    /// Connect using `config`, logging and returning a disconnected connection on failure.
    #[must_use]
    pub fn open(config: &ConnectionConfig) -> Self {
        match Self::try_open(config) {
            Ok(conn) => conn,
            Err(e) => {
                tracing::error!(
                    "failed to connect to data source {} (user {}): {e}",
                    config.data_source,
                    config.user
                );
                Self {
                    driver: Mutex::new(None),
                    holder: Mutex::new(None),
                    connected: false,
                    translate_identifiers: config.translate_identifiers,
                    data_source: config.data_source.clone(),
                }
            }
        }
    }

    /// Connect using `config`.
    ///
    /// # Errors
    ///
    /// Returns `SqlPassthroughError` if the driver fails to allocate, configure or connect.
    pub fn try_open(config: &ConnectionConfig) -> Result<Self, SqlPassthroughError> {
        let driver = D::connect(config)?;
        tracing::debug!("connected to data source {}", config.data_source);
        Ok(Self {
            driver: Mutex::new(Some(driver)),
            holder: Mutex::new(None),
            connected: true,
            translate_identifiers: config.translate_identifiers,
            data_source: config.data_source.clone(),
        })
    }

    /// Wrap a driver that is already connected.
    #[must_use]
    pub fn from_driver(driver: D, translate_identifiers: bool) -> Self {
        Self {
            driver: Mutex::new(Some(driver)),
            holder: Mutex::new(None),
            connected: true,
            translate_identifiers,
            data_source: String::new(),
        }
    }

    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.connected
    }

    pub(crate) fn lease(&self) -> Result<Lease<'_, D>, SqlPassthroughError> {
        let me = thread::current().id();
        if *lock_holder(&self.holder) == Some(me) {
            return Err(SqlPassthroughError::StatementActive);
        }
        let guard = match self.driver.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                // a caller panicked mid-statement; the driver itself is still usable
                tracing::warn!("recovering poisoned connection guard");
                poisoned.into_inner()
            }
        };
        *lock_holder(&self.holder) = Some(me);
        Ok(Lease {
            guard,
            holder: &self.holder,
        })
    }

    /// Run `sql` and discard any rows.
    ///
    /// # Errors
    ///
    /// Returns `SqlPassthroughError::NotConnected` if the connection was never established,
    /// `SqlPassthroughError::StatementActive` if this thread still holds a [`ResultRow`] from this
    /// connection, or the driver's error if the statement fails.
    pub fn try_execute(&self, sql: &str) -> Result<(), SqlPassthroughError> {
        self.try_execute_with(sql, TranslationMode::ConnectionDefault)
    }

    /// [`try_execute`](Self::try_execute) with an explicit translation choice.
    ///
    /// # Errors
    ///
    /// Same as [`try_execute`](Self::try_execute).
    pub fn try_execute_with(
        &self,
        sql: &str,
        translation: TranslationMode,
    ) -> Result<(), SqlPassthroughError> {
        let sql = translate_if(sql, translation.resolve(self.translate_identifiers));
        let mut lease = self.lease()?;
        let driver = lease.as_mut().ok_or(SqlPassthroughError::NotConnected)?;
        driver.exec_direct(&sql)
    }

    /// Run `sql` and discard any rows; `false` on failure.
    pub fn execute(&self, sql: &str) -> bool {
        match self.try_execute(sql) {
            Ok(()) => true,
            Err(e) => {
                tracing::error!("execute failed: {sql}: {e}");
                false
            }
        }
    }

    /// Run `sql` and return a row cursor positioned on the first row.
    ///
    /// `Ok(None)` when the statement produced no rows. The returned row holds the connection's
    /// guard until it is dropped.
    ///
    /// # Errors
    ///
    /// Returns `SqlPassthroughError::NotConnected` if the connection was never established,
    /// `SqlPassthroughError::StatementActive` if this thread still holds a [`ResultRow`] from this
    /// connection, or the driver's error if executing or fetching the first row fails.
    pub fn try_query(&self, sql: &str) -> Result<Option<ResultRow<'_, D>>, SqlPassthroughError> {
        self.try_query_with(sql, TranslationMode::ConnectionDefault)
    }

    /// [`try_query`](Self::try_query) with an explicit translation choice.
    ///
    /// # Errors
    ///
    /// Same as [`try_query`](Self::try_query).
    pub fn try_query_with(
        &self,
        sql: &str,
        translation: TranslationMode,
    ) -> Result<Option<ResultRow<'_, D>>, SqlPassthroughError> {
        let sql = translate_if(sql, translation.resolve(self.translate_identifiers));
        let mut lease = self.lease()?;
        let driver = lease.as_mut().ok_or(SqlPassthroughError::NotConnected)?;
        let statement = driver.open_cursor(&sql)?;

        let mut row = ResultRow::new(lease, statement);
        if row.try_next()? {
            Ok(Some(row))
        } else {
            Ok(None)
        }
    }

    /// Run `sql` and return a row cursor positioned on the first row.
    ///
    /// `None` when the statement fails or produced no rows; callers never see a cursor that has
    /// not been advanced.
    pub fn query(&self, sql: &str) -> Option<ResultRow<'_, D>> {
        match self.try_query(sql) {
            Ok(row) => row,
            Err(e) => {
                tracing::error!("query failed: {sql}: {e}");
                None
            }
        }
    }

    /// Escape `s` into a single-quoted literal.
    #[must_use]
    pub fn escape_string(&self, s: &str) -> String {
        escape_string(s)
    }

    /// Escape `buf` into a single-quoted literal.
    #[must_use]
    pub fn escape_bytes(&self, buf: &[u8]) -> Vec<u8> {
        escape_bytes(buf)
    }

    /// Row id of the last insert, or 0 when disconnected or unsupported by the backend.
    pub fn last_insert_id(&self) -> u64 {
        match self.lease() {
            Ok(lease) => lease.as_ref().map_or(0, |driver| driver.last_insert_id()),
            Err(e) => {
                tracing::warn!("last_insert_id unavailable: {e}");
                0
            }
        }
    }

    /// Version of the client library, empty when disconnected.
    pub fn client_version(&self) -> String {
        match self.lease() {
            Ok(lease) => lease
                .as_ref()
                .map(|driver| driver.client_version())
                .unwrap_or_default(),
            Err(e) => {
                tracing::warn!("client_version unavailable: {e}");
                String::new()
            }
        }
    }

    /// Disconnect now instead of at drop.
    ///
    /// # Errors
    ///
    /// Returns the driver's error if disconnecting fails.
    pub fn close(self) -> Result<(), SqlPassthroughError> {
        let driver = self.lease()?.take();
        match driver {
            Some(driver) => driver.disconnect(),
            None => Ok(()),
        }
    }
}

/// Exclusive hold on a connection's driver, carried by a live [`ResultRow`].
///
/// Records the holding thread so that thread cannot queue behind its own row.
pub(crate) struct Lease<'c, D> {
    guard: MutexGuard<'c, Option<D>>,
    holder: &'c Mutex<Option<ThreadId>>,
}

fn lock_holder(holder: &Mutex<Option<ThreadId>>) -> MutexGuard<'_, Option<ThreadId>> {
    holder.lock().unwrap_or_else(PoisonError::into_inner)
}

impl<D> Deref for Lease<'_, D> {
    type Target = Option<D>;

    fn deref(&self) -> &Option<D> {
        &self.guard
    }
}

impl<D> DerefMut for Lease<'_, D> {
    fn deref_mut(&mut self) -> &mut Option<D> {
        &mut self.guard
    }
}

impl<D> Drop for Lease<'_, D> {
    fn drop(&mut self) {
        // cleared before the guard is released
        *lock_holder(self.holder) = None;
    }
}

impl<D: Driver> Drop for Connection<D> {
    fn drop(&mut self) {
        let slot = match self.driver.get_mut() {
            Ok(slot) => slot,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Some(driver) = slot.take() {
            match driver.disconnect() {
                Ok(()) => tracing::debug!("disconnected from data source {}", self.data_source),
                Err(e) => tracing::warn!("disconnect from {} failed: {e}", self.data_source),
            }
        }
    }
}

impl<D: Driver> fmt::Debug for Connection<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("data_source", &self.data_source)
            .field("connected", &self.connected)
            .field("translate_identifiers", &self.translate_identifiers)
            .finish_non_exhaustive()
    }
}
