use std::time::Duration;

use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::{Pool, Postgres};

use crate::config::CoreConfig;
use crate::errors::{ConfigError, Result};

/// Wrapper around the Postgres connection pool shared by the storage backends.
#[derive(Clone)]
pub struct DatabasePool {
    pool: Pool<Postgres>,
}

impl DatabasePool {
    /// Establishes a new connection pool based on the core configuration.
    pub async fn connect(config: &CoreConfig, max_connections: u32) -> Result<Self> {
        let url = config
            .database_url()
            .ok_or_else(|| ConfigError::MissingEnvVar("DATABASE_URL".into()))?;
        Self::connect_with_url(url, max_connections).await
    }

    /// Establishes a connection pool directly from a database URL.
    pub async fn connect_with_url(database_url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections.max(1))
            .acquire_timeout(Duration::from_secs(5))
            .connect(database_url)
            .await?;

        Ok(Self { pool })
    }

    /// Builds a pool that only connects on first use.
    pub fn connect_lazy(database_url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new().connect_lazy(database_url)?;
        Ok(Self { pool })
    }

    pub fn inner(&self) -> &Pool<Postgres> {
        &self.pool
    }
}

/// Implemented by stores that own tables and create them on startup.
///
/// Statements must be idempotent; there is no versioned migration history.
#[async_trait]
pub trait SchemaInitializer {
    async fn ensure_schema(&self, pool: &DatabasePool) -> Result<()>;
}

/// Runs every initializer in order, stopping at the first failure.
pub async fn ensure_schemas(
    pool: &DatabasePool,
    initializers: &[&(dyn SchemaInitializer + Send + Sync)],
) -> Result<()> {
    for initializer in initializers {
        initializer.ensure_schema(pool).await?;
    }
    Ok(())
}
