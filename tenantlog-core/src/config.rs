use crate::errors::ConfigError;
use crate::logging::LogFormat;

/// Backend holding tenant records and log namespaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Memory,
    Postgres,
}

impl StorageBackend {
    fn parse(key: &str, value: &str) -> Result<Self, ConfigError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "memory" | "in-memory" => Ok(StorageBackend::Memory),
            "postgres" | "postgresql" | "pg" => Ok(StorageBackend::Postgres),
            other => Err(ConfigError::InvalidValue {
                key: key.to_string(),
                value: other.to_string(),
                reason: "expected `memory` or `postgres`".into(),
            }),
        }
    }
}

pub const DEFAULT_HTTP_BIND: &str = "0.0.0.0:8080";

/// Global configuration shared across the tenantlog binaries.
#[derive(Debug, Clone)]
pub struct CoreConfig {
    pub database_url: Option<String>,
    pub storage: StorageBackend,
    pub node_name: String,
    pub http_bind: String,
    pub log_format: LogFormat,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            database_url: None,
            storage: StorageBackend::Memory,
            node_name: "tenantlog-node".to_string(),
            http_bind: DEFAULT_HTTP_BIND.to_string(),
            log_format: LogFormat::default(),
        }
    }
}

impl CoreConfig {
    /// Builds the configuration from an arbitrary variable source, trying
    /// `PREFIX_KEY` before the unprefixed `KEY`.
    pub fn from_lookup<F>(prefix: &str, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let vars = PrefixedVars::new(prefix, &lookup);

        let database_url = vars.get("DATABASE_URL").filter(|url| !url.trim().is_empty());

        let storage = match vars.get("STORAGE") {
            Some(raw) => StorageBackend::parse(&vars.key("STORAGE"), &raw)?,
            None if database_url.is_some() => StorageBackend::Postgres,
            None => StorageBackend::Memory,
        };

        if storage == StorageBackend::Postgres && database_url.is_none() {
            return Err(ConfigError::MissingEnvVar(vars.key("DATABASE_URL")));
        }

        let node_name = vars
            .get("NODE_NAME")
            .unwrap_or_else(|| "tenantlog-node".to_string());

        let http_bind = vars
            .get("HTTP_BIND")
            .unwrap_or_else(|| DEFAULT_HTTP_BIND.to_string());

        let log_format = match vars.get("LOG_FORMAT") {
            Some(raw) => LogFormat::parse(&raw).ok_or_else(|| ConfigError::InvalidValue {
                key: vars.key("LOG_FORMAT"),
                value: raw.clone(),
                reason: "expected `pretty`, `compact` or `json`".into(),
            })?,
            None => LogFormat::default(),
        };

        Ok(Self {
            database_url,
            storage,
            node_name,
            http_bind,
            log_format,
        })
    }

    /// Returns the Postgres URL when one is configured.
    pub fn database_url(&self) -> Option<&str> {
        self.database_url.as_deref()
    }
}

/// Resolves `PREFIX_KEY` first and `KEY` second.
pub struct PrefixedVars<'a, F> {
    prefix: &'a str,
    lookup: &'a F,
}

impl<'a, F> PrefixedVars<'a, F>
where
    F: Fn(&str) -> Option<String>,
{
    pub fn new(prefix: &'a str, lookup: &'a F) -> Self {
        Self { prefix, lookup }
    }

    pub fn key(&self, suffix: &str) -> String {
        format!("{}{}", self.prefix, suffix)
    }

    pub fn get(&self, suffix: &str) -> Option<String> {
        (self.lookup)(&self.key(suffix)).or_else(|| {
            if self.prefix.is_empty() {
                None
            } else {
                (self.lookup)(suffix)
            }
        })
    }

    /// Parses a numeric variable, falling back to `default` when unset.
    pub fn parse_or<T>(&self, suffix: &str, default: T) -> Result<T, ConfigError>
    where
        T: std::str::FromStr,
        T::Err: std::fmt::Display,
    {
        match self.get(suffix) {
            Some(raw) => raw
                .trim()
                .parse::<T>()
                .map_err(|err| ConfigError::InvalidValue {
                    key: self.key(suffix),
                    value: raw.clone(),
                    reason: err.to_string(),
                }),
            None => Ok(default),
        }
    }
}
