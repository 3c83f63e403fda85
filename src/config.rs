use std::fmt;
use std::time::Duration;

use serde::Deserialize;

use crate::error::SqlPassthroughError;

/// Connection timeout applied when none is configured, in milliseconds.
pub const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 5_000;

fn default_connect_timeout_ms() -> u64 {
    DEFAULT_CONNECT_TIMEOUT_MS
}

/// Whole milliseconds covering `timeout`; a partial millisecond rounds up.
fn timeout_millis(timeout: Duration) -> u64 {
    let millis = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
    if timeout.subsec_nanos() % 1_000_000 == 0 {
        millis
    } else {
        millis.saturating_add(1)
    }
}

fn default_translate_identifiers() -> bool {
    true
}

/// Everything needed to open a [`Connection`](crate::Connection).
///
/// Read once when the connection is constructed; nothing is looked up from process-wide state.
///
/// ```rust
/// use sql_passthrough::ConnectionConfig;
///
/// let config = ConnectionConfig::from_json_str(
///     r#"{ "data_source": ":memory:", "user": "otserv", "password": "secret" }"#,
/// )?;
/// assert_eq!(config.connect_timeout_ms, 5_000);
/// # Ok::<(), sql_passthrough::SqlPassthroughError>(())
/// ```
#[derive(Clone, Deserialize)]
pub struct ConnectionConfig {
    /// Data source name: a file path or `:memory:` for SQLite, a connection string for Postgres.
    pub data_source: String,
    #[serde(default)]
    pub user: String,
    #[serde(default)]
    pub password: String,
    /// Connect timeout in milliseconds; SQLite uses it as the busy timeout.
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
    /// Rewrite backtick identifiers to double quotes before sending SQL to the driver.
    #[serde(default = "default_translate_identifiers")]
    pub translate_identifiers: bool,
}

impl ConnectionConfig {
    #[must_use]
    pub fn new(data_source: String, user: String, password: String) -> Self {
        Self {
            data_source,
            user,
            password,
            connect_timeout_ms: DEFAULT_CONNECT_TIMEOUT_MS,
            translate_identifiers: true,
        }
    }

    #[must_use]
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout_ms = timeout_millis(timeout);
        self
    }

    #[must_use]
    pub fn with_translation(mut self, translate_identifiers: bool) -> Self {
        self.translate_identifiers = translate_identifiers;
        self
    }

    #[must_use]
    pub fn builder(data_source: String) -> ConnectionConfigBuilder {
        ConnectionConfigBuilder::new(data_source)
    }

    #[must_use]
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    /// Parse a configuration from a JSON document.
    ///
    /// # Errors
    ///
    /// Returns `SqlPassthroughError::ConfigError` if the document is not valid JSON, is missing
    /// `data_source`, or names an empty data source.
    pub fn from_json_str(json: &str) -> Result<Self, SqlPassthroughError> {
        let config: ConnectionConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check the fields a connection attempt cannot do without.
    ///
    /// # Errors
    ///
    /// Returns `SqlPassthroughError::ConfigError` for an empty data source or a zero timeout.
    pub fn validate(&self) -> Result<(), SqlPassthroughError> {
        if self.data_source.trim().is_empty() {
            return Err(SqlPassthroughError::ConfigError(
                "data_source must not be empty".to_string(),
            ));
        }
        if self.connect_timeout_ms == 0 {
            return Err(SqlPassthroughError::ConfigError(
                "connect_timeout_ms must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

impl fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("data_source", &self.data_source)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("connect_timeout_ms", &self.connect_timeout_ms)
            .field("translate_identifiers", &self.translate_identifiers)
            .finish()
    }
}

/// Fluent builder for [`ConnectionConfig`].
#[derive(Debug, Clone)]
pub struct ConnectionConfigBuilder {
    config: ConnectionConfig,
}

impl ConnectionConfigBuilder {
    #[must_use]
    pub fn new(data_source: String) -> Self {
        Self {
            config: ConnectionConfig::new(data_source, String::new(), String::new()),
        }
    }

    #[must_use]
    pub fn user(mut self, user: String) -> Self {
        self.config.user = user;
        self
    }

    #[must_use]
    pub fn password(mut self, password: String) -> Self {
        self.config.password = password;
        self
    }

    #[must_use]
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.connect_timeout_ms = timeout_millis(timeout);
        self
    }

    #[must_use]
    pub fn translation(mut self, translate_identifiers: bool) -> Self {
        self.config.translate_identifiers = translate_identifiers;
        self
    }

    #[must_use]
    pub fn finish(self) -> ConnectionConfig {
        self.config
    }
}
