use std::sync::Arc;

use tenantlog_core::errors::{Result, TenantLogError};
use tenantlog_protocol::log::{DateFilter, LogEntry, DEFAULT_LOG_LEVEL};
use tenantlog_protocol::request::{LogsParams, PostLogParams};
use tenantlog_protocol::tenant::Tenant;
use tracing::{debug, info, warn};

use crate::clock::{Clock, LocalClock};
use crate::credentials::{CredentialIssuer, UuidIssuer};
use crate::directory::TenantDirectory;
use crate::log_store::LogStore;
use crate::pool::{WorkerPool, WorkerPoolConfig};
use crate::sanitizer::sanitize_text;

struct Inner {
    directory: Arc<dyn TenantDirectory>,
    store: Arc<dyn LogStore>,
    issuer: Arc<dyn CredentialIssuer>,
    clock: Arc<dyn Clock>,
}

/// Registration, log ingestion and log retrieval for tenants.
///
/// Every operation runs on the shared [`WorkerPool`].
#[derive(Clone)]
pub struct AccessService {
    inner: Arc<Inner>,
    pool: WorkerPool,
}

impl AccessService {
    pub fn builder(
        directory: Arc<dyn TenantDirectory>,
        store: Arc<dyn LogStore>,
    ) -> AccessServiceBuilder {
        AccessServiceBuilder {
            directory,
            store,
            issuer: Arc::new(UuidIssuer),
            clock: Arc::new(LocalClock),
            pool: WorkerPoolConfig::default(),
        }
    }

    pub fn pool(&self) -> &WorkerPool {
        &self.pool
    }

    /// Registers a new application and creates its log namespace.
    ///
    /// The returned tenant carries the api key; it is not retrievable later.
    pub async fn register(&self, name: impl Into<String>) -> Result<Tenant> {
        let inner = Arc::clone(&self.inner);
        let name = name.into();
        self.pool.execute(async move { inner.register(name).await }).await
    }

    /// Appends one sanitized entry, stamped with the current local time.
    pub async fn append(&self, params: PostLogParams) -> Result<()> {
        let inner = Arc::clone(&self.inner);
        self.pool.execute(async move { inner.append(params).await }).await
    }

    /// Returns the caller's entries, optionally for one `YYYY-MM-DD` day.
    pub async fn query(&self, params: LogsParams) -> Result<Vec<LogEntry>> {
        let inner = Arc::clone(&self.inner);
        self.pool.execute(async move { inner.query(params).await }).await
    }
}

impl Inner {
    async fn register(&self, name: String) -> Result<Tenant> {
        if self.directory.find_by_name(&name).await?.is_some() {
            debug!(app_name = %name, "registration refused, name in use");
            return Err(TenantLogError::NameTaken(name));
        }

        let tenant = Tenant::new(name, self.issuer.issue_id(), self.issuer.issue_api_key());
        match self.directory.save(&tenant).await {
            Ok(()) => {}
            Err(TenantLogError::DuplicateName(name)) => {
                debug!(app_name = %name, "lost registration race");
                return Err(TenantLogError::NameTaken(name));
            }
            Err(err) => return Err(err),
        }

        self.store.create_namespace(&tenant.namespace()).await?;
        info!(app_name = %tenant.name, app_id = %tenant.id, "registered application");
        Ok(tenant)
    }

    async fn authenticate(&self, api_key: &str, id: &str) -> Result<Tenant> {
        match self.directory.find_by_key_and_id(api_key, id).await? {
            Some(tenant) => Ok(tenant),
            None => {
                warn!(app_id = %id, "rejected credentials");
                Err(TenantLogError::InvalidCredentials)
            }
        }
    }

    async fn append(&self, params: PostLogParams) -> Result<()> {
        let tenant = self.authenticate(&params.api_key, &params.app_id).await?;

        // An empty level counts as absent.
        let log_level = match params.log_level.as_str() {
            "" => DEFAULT_LOG_LEVEL,
            level => level,
        };
        let entry = LogEntry::stamped(
            sanitize_text(&params.message),
            sanitize_text(&params.class_name),
            sanitize_text(log_level),
            self.clock.now(),
        );
        let namespace = tenant.namespace();
        self.store.append(&namespace, entry).await?;
        debug!(%namespace, "appended log entry");
        Ok(())
    }

    async fn query(&self, params: LogsParams) -> Result<Vec<LogEntry>> {
        let tenant = self.authenticate(&params.api_key, &params.app_id).await?;

        let filter = params
            .date
            .as_deref()
            .map(DateFilter::parse)
            .transpose()
            .map_err(|err| TenantLogError::InvalidDate(err.0))?;

        let namespace = tenant.namespace();
        let entries = self.store.query(&namespace, filter).await?;
        debug!(%namespace, count = entries.len(), "returned log entries");
        Ok(entries)
    }
}

pub struct AccessServiceBuilder {
    directory: Arc<dyn TenantDirectory>,
    store: Arc<dyn LogStore>,
    issuer: Arc<dyn CredentialIssuer>,
    clock: Arc<dyn Clock>,
    pool: WorkerPoolConfig,
}

impl AccessServiceBuilder {
    pub fn issuer(mut self, issuer: Arc<dyn CredentialIssuer>) -> Self {
        self.issuer = issuer;
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn pool(mut self, config: WorkerPoolConfig) -> Self {
        self.pool = config;
        self
    }

    pub fn build(self) -> AccessService {
        AccessService {
            inner: Arc::new(Inner {
                directory: self.directory,
                store: self.store,
                issuer: self.issuer,
                clock: self.clock,
            }),
            pool: WorkerPool::new(self.pool),
        }
    }
}
