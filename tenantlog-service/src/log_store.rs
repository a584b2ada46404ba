use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use tenantlog_core::errors::Result;
use tenantlog_protocol::log::{DateFilter, LogEntry};
use tenantlog_protocol::tenant::Namespace;

/// Append-only log collections, one per tenant namespace.
#[async_trait]
pub trait LogStore: Send + Sync {
    /// Creates an empty namespace; a no-op when it already exists.
    async fn create_namespace(&self, namespace: &Namespace) -> Result<()>;

    /// Adds one entry. Unknown namespaces are created on first write.
    async fn append(&self, namespace: &Namespace, entry: LogEntry) -> Result<()>;

    /// Returns every entry of the namespace in store order, optionally
    /// restricted to one calendar day. Unknown namespaces yield nothing.
    async fn query(&self, namespace: &Namespace, filter: Option<DateFilter>)
        -> Result<Vec<LogEntry>>;
}

type Collection = Arc<RwLock<Vec<LogEntry>>>;

/// In-memory log store. Each namespace carries its own lock so writers of
/// different tenants never contend beyond the namespace lookup.
#[derive(Default, Clone)]
pub struct InMemoryLogStore {
    namespaces: Arc<RwLock<HashMap<Namespace, Collection>>>,
}

impl InMemoryLogStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn namespaces(&self) -> Vec<Namespace> {
        let mut names: Vec<Namespace> = self.namespaces.read().keys().cloned().collect();
        names.sort();
        names
    }

    fn collection(&self, namespace: &Namespace) -> Option<Collection> {
        self.namespaces.read().get(namespace).cloned()
    }

    fn collection_or_create(&self, namespace: &Namespace) -> Collection {
        if let Some(existing) = self.collection(namespace) {
            return existing;
        }
        self.namespaces
            .write()
            .entry(namespace.clone())
            .or_default()
            .clone()
    }
}

#[async_trait]
impl LogStore for InMemoryLogStore {
    async fn create_namespace(&self, namespace: &Namespace) -> Result<()> {
        self.collection_or_create(namespace);
        Ok(())
    }

    async fn append(&self, namespace: &Namespace, entry: LogEntry) -> Result<()> {
        self.collection_or_create(namespace).write().push(entry);
        Ok(())
    }

    async fn query(
        &self,
        namespace: &Namespace,
        filter: Option<DateFilter>,
    ) -> Result<Vec<LogEntry>> {
        let Some(collection) = self.collection(namespace) else {
            return Ok(Vec::new());
        };
        let entries = collection.read();
        let selected = match filter {
            Some(filter) => entries
                .iter()
                .filter(|entry| filter.matches(&entry.date))
                .cloned()
                .collect(),
            None => entries.clone(),
        };
        Ok(selected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(message: &str, date: &str) -> LogEntry {
        LogEntry {
            message: message.to_string(),
            class_name: "Test".to_string(),
            log_level: "info".to_string(),
            date: date.to_string(),
            time: "12:00:00".to_string(),
        }
    }

    fn ns(name: &str) -> Namespace {
        Namespace::for_tenant(name, "id")
    }

    #[tokio::test]
    async fn create_namespace_is_idempotent() {
        let store = InMemoryLogStore::new();
        store.append(&ns("a"), entry("kept", "2024-01-01")).await.unwrap();
        store.create_namespace(&ns("a")).await.unwrap();
        store.create_namespace(&ns("a")).await.unwrap();

        assert_eq!(store.namespaces(), vec![ns("a")]);
        assert_eq!(store.query(&ns("a"), None).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn query_keeps_insertion_order() {
        let store = InMemoryLogStore::new();
        for message in ["first", "second", "third"] {
            store.append(&ns("a"), entry(message, "2024-01-01")).await.unwrap();
        }
        let messages: Vec<String> = store
            .query(&ns("a"), None)
            .await
            .unwrap()
            .into_iter()
            .map(|entry| entry.message)
            .collect();
        assert_eq!(messages, vec!["first", "second", "third"]);
    }

    #[tokio::test]
    async fn date_filter_selects_one_day() {
        let store = InMemoryLogStore::new();
        for date in ["2023-12-31", "2024-01-01", "2024-01-01", "2024-01-02"] {
            store.append(&ns("a"), entry(date, date)).await.unwrap();
        }
        let filter = DateFilter::parse("2024-01-01").unwrap();
        let found = store.query(&ns("a"), Some(filter)).await.unwrap();
        assert_eq!(found.len(), 2);
        assert!(found.iter().all(|entry| entry.date == "2024-01-01"));
    }

    #[tokio::test]
    async fn namespaces_are_isolated() {
        let store = InMemoryLogStore::new();
        store.append(&ns("a"), entry("for a", "2024-01-01")).await.unwrap();
        store.append(&ns("b"), entry("for b", "2024-01-01")).await.unwrap();

        let a = store.query(&ns("a"), None).await.unwrap();
        assert_eq!(a.len(), 1);
        assert_eq!(a[0].message, "for a");
    }

    #[tokio::test]
    async fn unknown_namespace_is_empty() {
        let store = InMemoryLogStore::new();
        assert!(store.query(&ns("ghost"), None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn concurrent_appends_are_all_kept() {
        let store = InMemoryLogStore::new();
        let writers: Vec<_> = (0..64)
            .map(|idx| {
                let store = store.clone();
                tokio::spawn(async move {
                    store
                        .append(&ns("shared"), entry(&format!("m{idx}"), "2024-01-01"))
                        .await
                })
            })
            .collect();
        for writer in writers {
            writer.await.unwrap().unwrap();
        }
        assert_eq!(store.query(&ns("shared"), None).await.unwrap().len(), 64);
    }
}
