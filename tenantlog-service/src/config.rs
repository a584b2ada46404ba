use std::env;

use tenantlog_core::config::{CoreConfig, PrefixedVars};
use tenantlog_core::errors::ConfigError;

use crate::pool::{WorkerPoolConfig, DEFAULT_QUEUE_CAPACITY, DEFAULT_WORKERS};

pub const ENV_PREFIX: &str = "TENANTLOG_";
pub const DEFAULT_DB_MAX_CONNECTIONS: u32 = 5;

/// Configuration of the log service process.
#[derive(Debug, Clone, Default)]
pub struct ServiceConfig {
    pub core: CoreConfig,
    pub pool: WorkerPoolConfig,
    pub db_max_connections: u32,
}

impl ServiceConfig {
    /// Loads `TENANTLOG_*` variables (with unprefixed fallbacks) and `.env`.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(ENV_PREFIX, |key| env::var(key).ok())
    }

    pub fn from_lookup<F>(prefix: &str, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let core = CoreConfig::from_lookup(prefix, &lookup)?;
        let vars = PrefixedVars::new(prefix, &lookup);

        let workers: usize = vars.parse_or("WORKERS", DEFAULT_WORKERS)?;
        if workers == 0 {
            return Err(ConfigError::InvalidValue {
                key: vars.key("WORKERS"),
                value: "0".into(),
                reason: "at least one worker is required".into(),
            });
        }

        Ok(Self {
            core,
            pool: WorkerPoolConfig {
                workers,
                queue_capacity: vars.parse_or("QUEUE_CAPACITY", DEFAULT_QUEUE_CAPACITY)?,
            },
            db_max_connections: vars.parse_or("DB_MAX_CONNECTIONS", DEFAULT_DB_MAX_CONNECTIONS)?,
        })
    }

    /// In-memory storage bound to an ephemeral local port.
    pub fn ephemeral() -> Self {
        Self {
            core: CoreConfig {
                http_bind: "127.0.0.1:0".to_string(),
                ..CoreConfig::default()
            },
            pool: WorkerPoolConfig::default(),
            db_max_connections: DEFAULT_DB_MAX_CONNECTIONS,
        }
    }
}
