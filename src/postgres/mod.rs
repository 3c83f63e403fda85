// Postgres module - synchronous `postgres` client binding of the driver traits
//
// - config: translating `ConnectionConfig` into a client configuration
// - connection: the `Driver` implementation, a worker thread owning the client
// - query: converting the current row's values per column type
//
// `execute` sends text over the simple query protocol, so one call may carry several
// `;`-separated statements. `query` prepares the text and streams it over the extended protocol,
// which accepts exactly one statement.

pub mod config;
pub mod connection;
pub mod query;

pub use connection::PostgresDriver;
pub use query::PostgresStatement;

/// A `Connection` backed by the synchronous Postgres client.
pub type PostgresConnection = crate::connection::Connection<PostgresDriver>;
