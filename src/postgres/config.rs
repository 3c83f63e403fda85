use postgres::{Client, Config as PostgresConfig, NoTls};

use crate::config::ConnectionConfig;
use crate::error::SqlPassthroughError;

/// Build a client configuration from `config`.
///
/// The data source is a libpq-style connection string (`host=db dbname=game` or a
/// `postgresql://` URL). A non-empty user or password overrides whatever the string carries.
///
/// # Errors
/// Returns `SqlPassthroughError` if the connection string does not parse.
pub fn build_postgres_config(config: &ConnectionConfig) -> Result<PostgresConfig, SqlPassthroughError> {
    config.validate()?;

    let mut pg: PostgresConfig = config.data_source.parse().map_err(|e| {
        SqlPassthroughError::ConfigError(format!("invalid Postgres data source: {e}"))
    })?;
    if !config.user.is_empty() {
        pg.user(&config.user);
    }
    if !config.password.is_empty() {
        pg.password(&config.password);
    }
    pg.connect_timeout(config.connect_timeout());
    Ok(pg)
}

/// Connect a client for `config` without TLS.
///
/// # Errors
/// Returns `SqlPassthroughError::ConnectionError` if the server cannot be reached or rejects the
/// credentials.
pub fn create_postgres_client(config: &ConnectionConfig) -> Result<Client, SqlPassthroughError> {
    let pg = build_postgres_config(config)?;
    pg.connect(NoTls).map_err(|e| {
        SqlPassthroughError::ConnectionError(format!(
            "Failed to connect to Postgres (user {}): {e}",
            config.user
        ))
    })
}
