use crate::config::ConnectionConfig;
use crate::error::SqlPassthroughError;

/// Open a rusqlite connection for `config`.
///
/// The data source is a file path (or `:memory:`). SQLite has no credentials, so user and password
/// are ignored; the connection timeout becomes the busy timeout.
///
/// # Errors
/// Returns `SqlPassthroughError::ConnectionError` if the database cannot be opened or configured.
pub fn open_connection(config: &ConnectionConfig) -> Result<rusqlite::Connection, SqlPassthroughError> {
    config.validate()?;

    if !config.user.is_empty() || !config.password.is_empty() {
        tracing::debug!("sqlite ignores credentials (user {})", config.user);
    }

    let conn = rusqlite::Connection::open(&config.data_source).map_err(|e| {
        SqlPassthroughError::ConnectionError(format!(
            "Failed to open SQLite database {}: {e}",
            config.data_source
        ))
    })?;

    conn.busy_timeout(config.connect_timeout()).map_err(|e| {
        SqlPassthroughError::ConnectionError(format!("Failed to set SQLite busy timeout: {e}"))
    })?;

    Ok(conn)
}
