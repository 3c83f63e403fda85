use postgres::fallible_iterator::FallibleIterator;
use postgres::types::ToSql;
use postgres::{Client, Row};

use super::config::create_postgres_client;
use super::query::PostgresStatement;
use crate::config::ConnectionConfig;
use crate::driver::Driver;
use crate::driver::cursor::CursorTask;
use crate::driver::worker::{Session, Worker};
use crate::error::SqlPassthroughError;

/// `Driver` over a single synchronous Postgres client owned by a dedicated worker thread.
#[derive(Debug)]
pub struct PostgresDriver {
    worker: Worker<Row>,
}

impl PostgresDriver {
    /// Move an already connected client onto a worker thread.
    ///
    /// # Errors
    /// Returns `SqlPassthroughError::ConnectionError` if the worker thread cannot be spawned.
    pub fn spawn(client: Client) -> Result<Self, SqlPassthroughError> {
        let worker = Worker::spawn("postgres-worker", PostgresSession { client })?;
        Ok(Self { worker })
    }
}

impl Driver for PostgresDriver {
    type Statement = PostgresStatement;

    fn connect(config: &ConnectionConfig) -> Result<Self, SqlPassthroughError> {
        Self::spawn(create_postgres_client(config)?)
    }

    fn exec_direct(&mut self, sql: &str) -> Result<(), SqlPassthroughError> {
        self.worker.execute(sql)
    }

    fn open_cursor(&mut self, sql: &str) -> Result<PostgresStatement, SqlPassthroughError> {
        self.worker.query(sql).map(PostgresStatement::new)
    }

    fn client_version(&self) -> String {
        "postgres 0.19".to_string()
    }

    fn disconnect(self) -> Result<(), SqlPassthroughError> {
        self.worker.close()
    }
}

struct PostgresSession {
    client: Client,
}

impl Session for PostgresSession {
    type Row = Row;

    fn execute(&mut self, sql: &str) -> Result<(), SqlPassthroughError> {
        // simple query protocol: the text goes to the server as-is
        self.client.batch_execute(sql)?;
        Ok(())
    }

    // extended protocol: one statement per query text, rows streamed as they arrive
    fn stream(&mut self, sql: &str, cursor: CursorTask<Row>) {
        let statement = match self.client.prepare(sql) {
            Ok(statement) => statement,
            Err(e) => return cursor.fail(e.into()),
        };
        let columns = statement
            .columns()
            .iter()
            .map(|col| col.name().to_string())
            .collect();

        let mut rows = match self
            .client
            .query_raw(&statement, std::iter::empty::<&dyn ToSql>())
        {
            Ok(rows) => rows,
            Err(e) => return cursor.fail(e.into()),
        };
        cursor.serve(columns, || Ok(rows.next()?));
    }

    fn close(self) -> Result<(), SqlPassthroughError> {
        self.client.close()?;
        Ok(())
    }
}
