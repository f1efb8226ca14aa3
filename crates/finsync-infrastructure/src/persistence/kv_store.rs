use async_trait::async_trait;
use chrono::Utc;
use sqlx::SqlitePool;

use finsync_domain::shared::DomainError;
use finsync_domain::storage::KeyValueStore;

/// Key-value store persisted in the local SQLite database
#[derive(Clone)]
pub struct SqliteKeyValueStore {
    pool: SqlitePool,
}

impl SqliteKeyValueStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

fn storage_err(context: &str) -> impl Fn(sqlx::Error) -> DomainError + '_ {
    move |e| DomainError::Storage(format!("{}: {}", context, e))
}

#[async_trait]
impl KeyValueStore for SqliteKeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<String>, DomainError> {
        let value: Option<String> =
            sqlx::query_scalar("SELECT value FROM key_value_store WHERE key = ?1")
                .bind(key)
                .fetch_optional(&self.pool)
                .await
                .map_err(storage_err("Read key"))?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), DomainError> {
        let query = r#"
            INSERT INTO key_value_store (key, value, updated_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(key) DO UPDATE SET
                value = ?2,
                updated_at = ?3
        "#;

        sqlx::query(query)
            .bind(key)
            .bind(value)
            .bind(Utc::now().to_rfc3339())
            .execute(&self.pool)
            .await
            .map_err(storage_err("Write key"))?;

        log::debug!("Stored key '{}'", key);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), DomainError> {
        sqlx::query("DELETE FROM key_value_store WHERE key = ?1")
            .bind(key)
            .execute(&self.pool)
            .await
            .map_err(storage_err("Delete key"))?;
        Ok(())
    }
}
