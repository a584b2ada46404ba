use async_trait::async_trait;
use sqlx::{FromRow, QueryBuilder};
use tenantlog_core::db::{DatabasePool, SchemaInitializer};
use tenantlog_core::errors::{Result, TenantLogError};
use tenantlog_protocol::log::{DateFilter, LogEntry};
use tenantlog_protocol::tenant::{Namespace, Tenant};

use crate::directory::TenantDirectory;
use crate::log_store::LogStore;

/// Postgres-backed tenant directory.
#[derive(Clone)]
pub struct PgTenantDirectory {
    pool: DatabasePool,
}

impl PgTenantDirectory {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SchemaInitializer for PgTenantDirectory {
    async fn ensure_schema(&self, pool: &DatabasePool) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS tenants (
                app_name   TEXT PRIMARY KEY,
                app_id     TEXT NOT NULL UNIQUE,
                api_key    TEXT NOT NULL,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )
            "#,
        )
        .execute(pool.inner())
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS tenants_credentials_idx ON tenants (api_key, app_id)",
        )
        .execute(pool.inner())
        .await?;

        Ok(())
    }
}

#[async_trait]
impl TenantDirectory for PgTenantDirectory {
    async fn find_by_name(&self, name: &str) -> Result<Option<Tenant>> {
        let row = sqlx::query_as::<_, TenantRow>(
            "SELECT app_name, app_id, api_key FROM tenants WHERE app_name = $1",
        )
        .bind(name)
        .fetch_optional(self.pool.inner())
        .await?;

        Ok(row.map(Into::into))
    }

    async fn find_by_key_and_id(&self, api_key: &str, id: &str) -> Result<Option<Tenant>> {
        let row = sqlx::query_as::<_, TenantRow>(
            "SELECT app_name, app_id, api_key FROM tenants WHERE api_key = $1 AND app_id = $2",
        )
        .bind(api_key)
        .bind(id)
        .fetch_optional(self.pool.inner())
        .await?;

        Ok(row.map(Into::into))
    }

    async fn save(&self, tenant: &Tenant) -> Result<()> {
        let inserted = sqlx::query(
            r#"
            INSERT INTO tenants (app_name, app_id, api_key)
            VALUES ($1, $2, $3)
            ON CONFLICT (app_name) DO NOTHING
            "#,
        )
        .bind(&tenant.name)
        .bind(&tenant.id)
        .bind(&tenant.api_key)
        .execute(self.pool.inner())
        .await?
        .rows_affected();

        if inserted == 0 {
            return Err(TenantLogError::DuplicateName(tenant.name.clone()));
        }
        Ok(())
    }
}

#[derive(FromRow)]
struct TenantRow {
    app_name: String,
    app_id: String,
    api_key: String,
}

impl From<TenantRow> for Tenant {
    fn from(row: TenantRow) -> Self {
        Tenant::new(row.app_name, row.app_id, row.api_key)
    }
}

/// Postgres-backed log store. All namespaces share one entries table keyed
/// by namespace; `log_namespaces` records which ones were created.
#[derive(Clone)]
pub struct PgLogStore {
    pool: DatabasePool,
}

impl PgLogStore {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }

    async fn register_namespace(&self, namespace: &Namespace) -> Result<()> {
        sqlx::query(
            "INSERT INTO log_namespaces (namespace) VALUES ($1) ON CONFLICT (namespace) DO NOTHING",
        )
        .bind(namespace.as_str())
        .execute(self.pool.inner())
        .await?;
        Ok(())
    }
}

#[async_trait]
impl SchemaInitializer for PgLogStore {
    async fn ensure_schema(&self, pool: &DatabasePool) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS log_namespaces (
                namespace  TEXT PRIMARY KEY,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )
            "#,
        )
        .execute(pool.inner())
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS log_entries (
                id         BIGSERIAL PRIMARY KEY,
                namespace  TEXT NOT NULL REFERENCES log_namespaces (namespace),
                message    TEXT NOT NULL,
                class_name TEXT NOT NULL,
                log_level  TEXT NOT NULL,
                date       TEXT NOT NULL,
                time       TEXT NOT NULL
            )
            "#,
        )
        .execute(pool.inner())
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS log_entries_namespace_date_idx ON log_entries (namespace, date)",
        )
        .execute(pool.inner())
        .await?;

        Ok(())
    }
}

#[async_trait]
impl LogStore for PgLogStore {
    async fn create_namespace(&self, namespace: &Namespace) -> Result<()> {
        self.register_namespace(namespace).await
    }

    async fn append(&self, namespace: &Namespace, entry: LogEntry) -> Result<()> {
        self.register_namespace(namespace).await?;

        sqlx::query(
            r#"
            INSERT INTO log_entries (namespace, message, class_name, log_level, date, time)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(namespace.as_str())
        .bind(&entry.message)
        .bind(&entry.class_name)
        .bind(&entry.log_level)
        .bind(&entry.date)
        .bind(&entry.time)
        .execute(self.pool.inner())
        .await?;

        Ok(())
    }

    async fn query(
        &self,
        namespace: &Namespace,
        filter: Option<DateFilter>,
    ) -> Result<Vec<LogEntry>> {
        let mut builder = QueryBuilder::new(
            "SELECT message, class_name, log_level, date, time FROM log_entries WHERE namespace = ",
        );
        builder.push_bind(namespace.as_str());

        if let Some(filter) = filter {
            builder.push(" AND date >= ");
            builder.push_bind(filter.lower_bound());
            if let Some(upper) = filter.upper_bound() {
                builder.push(" AND date < ");
                builder.push_bind(upper);
            }
        }

        builder.push(" ORDER BY id ASC");

        let rows = builder
            .build_query_as::<LogEntryRow>()
            .fetch_all(self.pool.inner())
            .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }
}

#[derive(FromRow)]
struct LogEntryRow {
    message: String,
    class_name: String,
    log_level: String,
    date: String,
    time: String,
}

impl From<LogEntryRow> for LogEntry {
    fn from(row: LogEntryRow) -> Self {
        LogEntry {
            message: row.message,
            class_name: row.class_name,
            log_level: row.log_level,
            date: row.date,
            time: row.time,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tenantlog_core::db::ensure_schemas;
    use uuid::Uuid;

    /// Runs only against a disposable database named by
    /// `TENANTLOG_TEST_DATABASE_URL`.
    async fn test_pool() -> Option<DatabasePool> {
        let url = std::env::var("TENANTLOG_TEST_DATABASE_URL").ok()?;
        let pool = DatabasePool::connect_with_url(&url, 2)
            .await
            .expect("connect test database");
        let directory = PgTenantDirectory::new(pool.clone());
        let store = PgLogStore::new(pool.clone());
        ensure_schemas(&pool, &[&directory, &store])
            .await
            .expect("create schema");
        Some(pool)
    }

    #[tokio::test]
    async fn postgres_directory_rejects_duplicate_names() {
        let Some(pool) = test_pool().await else {
            return;
        };
        let directory = PgTenantDirectory::new(pool);
        let name = format!("app-{}", Uuid::new_v4().simple());
        let first = Tenant::new(&name, Uuid::new_v4().to_string(), "key-1");
        directory.save(&first).await.unwrap();

        let err = directory
            .save(&Tenant::new(&name, Uuid::new_v4().to_string(), "key-2"))
            .await
            .unwrap_err();
        assert!(matches!(err, TenantLogError::DuplicateName(_)));
        assert_eq!(
            directory.find_by_key_and_id("key-1", &first.id).await.unwrap(),
            Some(first)
        );
    }

    #[tokio::test]
    async fn postgres_store_filters_by_day_in_insertion_order() {
        let Some(pool) = test_pool().await else {
            return;
        };
        let store = PgLogStore::new(pool);
        let namespace = Namespace::for_tenant("pg", &Uuid::new_v4().to_string());
        store.create_namespace(&namespace).await.unwrap();
        store.create_namespace(&namespace).await.unwrap();

        for (message, date) in [("a", "2024-01-01"), ("b", "2024-01-02"), ("c", "2024-01-01")] {
            let entry = LogEntry {
                message: message.into(),
                class_name: "Pg".into(),
                log_level: "info".into(),
                date: date.into(),
                time: "08:00:00".into(),
            };
            store.append(&namespace, entry).await.unwrap();
        }

        let day = DateFilter::parse("2024-01-01").unwrap();
        let messages: Vec<String> = store
            .query(&namespace, Some(day))
            .await
            .unwrap()
            .into_iter()
            .map(|entry| entry.message)
            .collect();
        assert_eq!(messages, vec!["a", "c"]);
        assert_eq!(store.query(&namespace, None).await.unwrap().len(), 3);
    }
}
