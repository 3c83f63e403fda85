use rusqlite::types::Value;

use super::config::open_connection;
use super::query::SqliteStatement;
use crate::config::ConnectionConfig;
use crate::driver::Driver;
use crate::driver::cursor::{CursorTask, RowReply};
use crate::driver::worker::{Session, Worker};
use crate::error::SqlPassthroughError;

/// `Driver` over a single rusqlite connection owned by a dedicated worker thread.
///
/// Rows are stepped on the worker one fetch at a time; only the current row crosses the channel.
#[derive(Debug)]
pub struct SqliteDriver {
    worker: Worker<Vec<Value>>,
}

impl SqliteDriver {
    /// Move an already opened rusqlite connection onto a worker thread.
    ///
    /// # Errors
    /// Returns `SqlPassthroughError::ConnectionError` if the worker thread cannot be spawned.
    pub fn spawn(conn: rusqlite::Connection) -> Result<Self, SqlPassthroughError> {
        let worker = Worker::spawn("sqlite-worker", SqliteSession { conn })?;
        Ok(Self { worker })
    }
}

impl Driver for SqliteDriver {
    type Statement = SqliteStatement;

    fn connect(config: &ConnectionConfig) -> Result<Self, SqlPassthroughError> {
        Self::spawn(open_connection(config)?)
    }

    fn exec_direct(&mut self, sql: &str) -> Result<(), SqlPassthroughError> {
        self.worker.execute(sql)
    }

    fn open_cursor(&mut self, sql: &str) -> Result<SqliteStatement, SqlPassthroughError> {
        self.worker.query(sql).map(SqliteStatement::new)
    }

    fn last_insert_id(&self) -> u64 {
        self.worker.last_insert_id()
    }

    fn client_version(&self) -> String {
        format!("SQLite {}", rusqlite::version())
    }

    fn disconnect(self) -> Result<(), SqlPassthroughError> {
        self.worker.close()
    }
}

struct SqliteSession {
    conn: rusqlite::Connection,
}

impl Session for SqliteSession {
    type Row = Vec<Value>;

    fn execute(&mut self, sql: &str) -> Result<(), SqlPassthroughError> {
        self.conn.execute_batch(sql)?;
        Ok(())
    }

    fn stream(&mut self, sql: &str, cursor: CursorTask<Vec<Value>>) {
        let mut stmt = match self.conn.prepare(sql) {
            Ok(stmt) => stmt,
            Err(e) => return cursor.fail(e.into()),
        };
        let columns: Vec<String> = stmt
            .column_names()
            .iter()
            .map(std::string::ToString::to_string)
            .collect();
        let width = columns.len();

        let mut rows = match stmt.query([]) {
            Ok(rows) => rows,
            Err(e) => return cursor.fail(e.into()),
        };
        cursor.serve(columns, || -> RowReply<Vec<Value>> {
            let Some(row) = rows.next()? else {
                return Ok(None);
            };
            let values = (0..width)
                .map(|i| row.get::<_, Value>(i))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Some(values))
        });
    }

    fn last_insert_id(&self) -> u64 {
        u64::try_from(self.conn.last_insert_rowid()).unwrap_or_default()
    }

    fn close(self) -> Result<(), SqlPassthroughError> {
        self.conn
            .close()
            .map_err(|(_conn, e)| SqlPassthroughError::SqliteError(e))
    }
}
