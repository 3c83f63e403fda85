use clap::{Parser, ValueEnum};
use serde::Serialize;
use sql_passthrough::ConnectionConfig;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize)]
pub(crate) enum BackendKind {
    Sqlite,
    Postgres,
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Send SQL text through sql-passthrough and print rows as JSON")]
pub(crate) struct Args {
    #[arg(long, value_enum, default_value = "sqlite")]
    pub(crate) backend: BackendKind,
    /// JSON file with `data_source`, `user`, `password`, `connect_timeout_ms`.
    #[arg(long)]
    pub(crate) config: Option<PathBuf>,
    #[arg(long, env = "SQLPASS_DATA_SOURCE")]
    pub(crate) data_source: Option<String>,
    #[arg(long, env = "SQLPASS_USER")]
    pub(crate) user: Option<String>,
    #[arg(long, env = "SQLPASS_PASSWORD", hide_env_values = true)]
    pub(crate) password: Option<String>,
    /// Connect timeout in milliseconds.
    #[arg(long)]
    pub(crate) timeout_ms: Option<u64>,
    /// Send backticks to the server untouched.
    #[arg(long)]
    pub(crate) no_translate: bool,
    /// Statement to execute; repeatable, run in order before any query.
    #[arg(long = "exec")]
    pub(crate) exec: Vec<String>,
    /// Query whose rows are printed; repeatable.
    #[arg(long = "query")]
    pub(crate) query: Vec<String>,
    #[arg(long)]
    pub(crate) log: Option<PathBuf>,
    #[arg(long)]
    pub(crate) verbose: bool,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct ShellPlan {
    pub(crate) backend: BackendKind,
    pub(crate) data_source: String,
    #[serde(skip)]
    pub(crate) config: ConnectionConfig,
    pub(crate) exec: Vec<String>,
    pub(crate) queries: Vec<String>,
}

impl ShellPlan {
    /// Merge the optional config file with command-line overrides.
    pub(crate) fn from_args(args: Args) -> Result<Self, String> {
        let mut config = match &args.config {
            Some(path) => {
                let json = std::fs::read_to_string(path)
                    .map_err(|e| format!("failed to read {}: {e}", path.display()))?;
                ConnectionConfig::from_json_str(&json).map_err(|e| e.to_string())?
            }
            None => {
                let data_source = args
                    .data_source
                    .clone()
                    .ok_or("either --config or --data-source is required")?;
                ConnectionConfig::new(data_source, String::new(), String::new())
            }
        };

        if let Some(data_source) = args.data_source {
            config.data_source = data_source;
        }
        if let Some(user) = args.user {
            config.user = user;
        }
        if let Some(password) = args.password {
            config.password = password;
        }
        if let Some(millis) = args.timeout_ms {
            config = config.with_connect_timeout(Duration::from_millis(millis));
        }
        if args.no_translate {
            config = config.with_translation(false);
        }
        config.validate().map_err(|e| e.to_string())?;

        if args.exec.is_empty() && args.query.is_empty() {
            return Err("nothing to do: pass --exec and/or --query".to_string());
        }

        Ok(ShellPlan {
            backend: args.backend,
            data_source: config.data_source.clone(),
            config,
            exec: args.exec,
            queries: args.query,
        })
    }
}
