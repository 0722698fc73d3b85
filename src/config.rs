use std::env;
use std::time::Duration;

const DEFAULT_DATABASE_URL: &str = "sqlite:studysync.db";
const DEFAULT_MAX_CONNECTIONS: u32 = 5;
const DEFAULT_ALERT_CHECK_INTERVAL_SECS: u64 = 60;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{name} must be a positive integer, got {value:?}")]
    InvalidNumber { name: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub database_url: String,
    pub max_connections: u32,
    pub alert_check_interval: Duration,
}

impl Config {
    /// Reads settings from the process environment (after `.env` is loaded).
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string());
        let max_connections = positive(&lookup, "DATABASE_MAX_CONNECTIONS", DEFAULT_MAX_CONNECTIONS.into())?;
        let interval_secs = positive(&lookup, "ALERT_CHECK_INTERVAL_SECS", DEFAULT_ALERT_CHECK_INTERVAL_SECS)?;

        Ok(Self {
            database_url,
            max_connections: u32::try_from(max_connections).map_err(|_| ConfigError::InvalidNumber {
                name: "DATABASE_MAX_CONNECTIONS",
                value: max_connections.to_string(),
            })?,
            alert_check_interval: Duration::from_secs(interval_secs),
        })
    }
}

fn positive<F>(lookup: &F, name: &'static str, default: u64) -> Result<u64, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        None => Ok(default),
        Some(value) => match value.trim().parse::<u64>() {
            Ok(n) if n > 0 => Ok(n),
            _ => Err(ConfigError::InvalidNumber { name, value }),
        },
    }
}
