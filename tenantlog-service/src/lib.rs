pub mod access;
pub mod api;
pub mod clock;
pub mod config;
pub mod credentials;
pub mod directory;
pub mod log_store;
pub mod pool;
pub mod repository;
pub mod sanitizer;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tenantlog_core::config::StorageBackend;
use tenantlog_core::db::{ensure_schemas, DatabasePool};
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tracing::info;

use access::AccessService;
use config::ServiceConfig;
use directory::{InMemoryTenantDirectory, TenantDirectory};
use log_store::{InMemoryLogStore, LogStore};
use repository::{PgLogStore, PgTenantDirectory};

/// Tenant directory and log store selected by configuration.
pub struct Storage {
    pub directory: Arc<dyn TenantDirectory>,
    pub store: Arc<dyn LogStore>,
}

/// Opens the configured backend, creating Postgres tables when missing.
pub async fn build_storage(config: &ServiceConfig) -> tenantlog_core::CoreResult<Storage> {
    match config.core.storage {
        StorageBackend::Memory => {
            info!("using in-memory storage");
            Ok(Storage {
                directory: Arc::new(InMemoryTenantDirectory::new()),
                store: Arc::new(InMemoryLogStore::new()),
            })
        }
        StorageBackend::Postgres => {
            let pool = DatabasePool::connect(&config.core, config.db_max_connections).await?;
            let directory = PgTenantDirectory::new(pool.clone());
            let store = PgLogStore::new(pool.clone());
            ensure_schemas(&pool, &[&directory, &store]).await?;
            info!(max_connections = config.db_max_connections, "using postgres storage");
            Ok(Storage {
                directory: Arc::new(directory),
                store: Arc::new(store),
            })
        }
    }
}

/// Builds the access service over the configured storage.
pub async fn build_service(config: &ServiceConfig) -> tenantlog_core::CoreResult<AccessService> {
    let storage = build_storage(config).await?;
    Ok(AccessService::builder(storage.directory, storage.store)
        .pool(config.pool)
        .build())
}

/// Handle returned when the service is started programmatically.
pub struct ServiceHandle {
    pub addr: SocketAddr,
    shutdown: oneshot::Sender<()>,
}

impl ServiceHandle {
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn shutdown(self) {
        let _ = self.shutdown.send(());
    }
}

/// Binds the configured address and serves in the background until the
/// handle is shut down.
pub async fn start_service(config: ServiceConfig) -> anyhow::Result<ServiceHandle> {
    let service = build_service(&config)
        .await
        .context("failed to initialise storage")?;

    let addr: SocketAddr = config
        .core
        .http_bind
        .parse()
        .context("invalid bind address")?;
    let listener = TcpListener::bind(addr)
        .await
        .context("failed to bind service listener")?;
    let actual_addr = listener
        .local_addr()
        .context("failed to read socket address")?;
    info!(%actual_addr, "starting tenantlog-service");

    let (tx, rx) = oneshot::channel();
    let router = api::router(service);

    tokio::spawn(async move {
        axum::serve(listener, router)
            .with_graceful_shutdown(async move {
                let _ = rx.await;
            })
            .await
            .ok();
    });

    Ok(ServiceHandle {
        addr: actual_addr,
        shutdown: tx,
    })
}
