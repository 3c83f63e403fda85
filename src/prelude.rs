//! Convenient imports for common functionality.
//!
//! This module re-exports the most commonly used types and functions
//! to make it easier to get started with the library.

pub use crate::config::{ConnectionConfig, ConnectionConfigBuilder};
pub use crate::connection::Connection;
pub use crate::driver::{Driver, Statement};
pub use crate::error::SqlPassthroughError;
pub use crate::escape::{escape_bytes, escape_string};
pub use crate::results::ResultRow;
pub use crate::translation::{TranslationMode, translate_identifiers};

#[cfg(feature = "postgres")]
pub use crate::postgres::{PostgresConnection, PostgresDriver};
#[cfg(feature = "sqlite")]
pub use crate::sqlite::{SqliteConnection, SqliteDriver};
