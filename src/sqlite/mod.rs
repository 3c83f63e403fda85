// SQLite module - rusqlite binding of the driver traits
//
// - config: opening and configuring the rusqlite connection
// - connection: the `Driver` implementation
// - query: draining rows and converting values for typed fetches

pub mod config;
pub mod connection;
pub mod query;

pub use connection::SqliteDriver;
pub use query::SqliteStatement;

/// A `Connection` backed by rusqlite.
pub type SqliteConnection = crate::connection::Connection<SqliteDriver>;
