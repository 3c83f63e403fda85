use thiserror::Error;

#[cfg(feature = "postgres")]
use postgres;
#[cfg(feature = "sqlite")]
use rusqlite;

#[derive(Debug, Error)]
pub enum SqlPassthroughError {
    #[cfg(feature = "sqlite")]
    #[error(transparent)]
    SqliteError(#[from] rusqlite::Error),

    #[cfg(feature = "postgres")]
    #[error(transparent)]
    PostgresError(#[from] postgres::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Connection is not established")]
    NotConnected,

    #[error("A result row held by this thread is still using the connection")]
    StatementActive,

    #[error("SQL execution error: {0}")]
    ExecutionError(String),

    #[error("Column not found: {0}")]
    ColumnNotFound(String),

    #[error("Conversion error at column {ordinal}: {message}")]
    ConversionError { ordinal: u16, message: String },

    #[error("Cursor is not positioned on a row")]
    NoCurrentRow,

    #[error("Malformed literal: {0}")]
    MalformedLiteral(String),
}

impl From<serde_json::Error> for SqlPassthroughError {
    fn from(err: serde_json::Error) -> Self {
        SqlPassthroughError::ConfigError(format!("invalid configuration document: {err}"))
    }
}

impl SqlPassthroughError {
    pub(crate) fn conversion(ordinal: u16, message: impl Into<String>) -> Self {
        SqlPassthroughError::ConversionError {
            ordinal,
            message: message.into(),
        }
    }
}
