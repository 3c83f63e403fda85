//! Synchronous single-connection SQL passthrough.
//!
//! SQL text is sent to the database as-is after one rewrite: backtick-quoted identifiers become
//! double-quoted identifiers (string literals are left alone). Values are embedded with
//! [`escape::escape_string`] / [`escape::escape_bytes`], and rows are read by column name through
//! [`ResultRow`].
//!
//! The client library sits behind the [`driver::Driver`] trait. `SQLite` (default feature
//! `sqlite`) and Postgres (feature `postgres`) bindings are bundled.

pub mod config;
pub mod connection;
pub mod driver;
pub mod error;
pub mod escape;
pub mod prelude;
pub mod results;
pub mod translation;

#[cfg(feature = "postgres")]
pub mod postgres;
#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use config::{ConnectionConfig, ConnectionConfigBuilder};
pub use connection::Connection;
pub use error::SqlPassthroughError;
pub use results::ResultRow;
