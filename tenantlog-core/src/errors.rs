use thiserror::Error;

/// Result type used across the tenantlog crates.
pub type Result<T> = std::result::Result<T, TenantLogError>;

/// Canonical error representation shared by all services.
#[derive(Debug, Error)]
pub enum TenantLogError {
    #[error("name has already been taken: {0}")]
    NameTaken(String),

    /// Raised by a tenant directory when a record with the same name exists.
    #[error("a tenant named {0} is already stored")]
    DuplicateName(String),

    #[error("invalid api key or app id")]
    InvalidCredentials,

    #[error("invalid date filter: {0}")]
    InvalidDate(String),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("worker pool saturated, try again later")]
    Overloaded,

    #[error("worker failed: {0}")]
    WorkerFailed(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("configuration error: {0}")]
    Config(String),
}

impl From<serde_json::Error> for TenantLogError {
    fn from(err: serde_json::Error) -> Self {
        TenantLogError::Serialization(err.to_string())
    }
}

impl From<sqlx::Error> for TenantLogError {
    fn from(err: sqlx::Error) -> Self {
        TenantLogError::Storage(err.to_string())
    }
}

/// Dedicated configuration error used by the configuration module.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value {value:?} for {key}: {reason}")]
    InvalidValue {
        key: String,
        value: String,
        reason: String,
    },
}

impl From<ConfigError> for TenantLogError {
    fn from(value: ConfigError) -> Self {
        TenantLogError::Config(value.to_string())
    }
}
