use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use tenantlog_core::errors::{Result, TenantLogError};
use tenantlog_protocol::tenant::Tenant;

/// Registry of tenants keyed by application name.
#[async_trait]
pub trait TenantDirectory: Send + Sync {
    async fn find_by_name(&self, name: &str) -> Result<Option<Tenant>>;

    /// Resolves a credential pair; both halves must belong to the same record.
    async fn find_by_key_and_id(&self, api_key: &str, id: &str) -> Result<Option<Tenant>>;

    /// Stores a new tenant. Fails with [`TenantLogError::DuplicateName`] when
    /// the name is taken; the check and the insert are one atomic step.
    async fn save(&self, tenant: &Tenant) -> Result<()>;
}

#[derive(Default)]
struct DirectoryIndex {
    by_name: HashMap<String, Tenant>,
    name_by_id: HashMap<String, String>,
}

/// In-memory tenant directory.
#[derive(Default, Clone)]
pub struct InMemoryTenantDirectory {
    inner: Arc<RwLock<DirectoryIndex>>,
}

impl InMemoryTenantDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.inner.read().by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl TenantDirectory for InMemoryTenantDirectory {
    async fn find_by_name(&self, name: &str) -> Result<Option<Tenant>> {
        Ok(self.inner.read().by_name.get(name).cloned())
    }

    async fn find_by_key_and_id(&self, api_key: &str, id: &str) -> Result<Option<Tenant>> {
        let inner = self.inner.read();
        let tenant = inner
            .name_by_id
            .get(id)
            .and_then(|name| inner.by_name.get(name))
            .filter(|tenant| tenant.matches(api_key, id))
            .cloned();
        Ok(tenant)
    }

    async fn save(&self, tenant: &Tenant) -> Result<()> {
        let mut inner = self.inner.write();
        if inner.by_name.contains_key(&tenant.name) {
            return Err(TenantLogError::DuplicateName(tenant.name.clone()));
        }
        if inner.name_by_id.contains_key(&tenant.id) {
            return Err(TenantLogError::Storage(format!(
                "tenant id {} is already assigned",
                tenant.id
            )));
        }

        inner
            .name_by_id
            .insert(tenant.id.clone(), tenant.name.clone());
        inner.by_name.insert(tenant.name.clone(), tenant.clone());
        Ok(())
    }
}
