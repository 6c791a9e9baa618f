use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use chrono::Utc;
use entity::kv_entries;
use sea_orm::{
    ActiveValue::Set, ConnectionTrait, EntityTrait, Statement, sea_query::OnConflict,
};
use tracing::instrument;

use crate::{DbError, DbPool, DbResult};

/// Synchronous-in-spirit key-value storage: every call completes before the
/// caller continues, nothing is buffered.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> DbResult<Option<String>>;

    async fn set(&self, key: &str, value: &str) -> DbResult<()>;

    async fn ping(&self) -> DbResult<()> {
        Ok(())
    }
}

#[async_trait]
impl<T: KeyValueStore + ?Sized> KeyValueStore for Arc<T> {
    async fn get(&self, key: &str) -> DbResult<Option<String>> {
        (**self).get(key).await
    }

    async fn set(&self, key: &str, value: &str) -> DbResult<()> {
        (**self).set(key, value).await
    }

    async fn ping(&self) -> DbResult<()> {
        (**self).ping().await
    }
}

/// In-process store. Clones share the same entries, which lets tests model a
/// fresh session reading what an earlier one wrote.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.lock().map(|entries| entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> DbResult<std::sync::MutexGuard<'_, HashMap<String, String>>> {
        self.entries
            .lock()
            .map_err(|_| DbError::Unavailable("memory store lock poisoned".into()))
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> DbResult<Option<String>> {
        Ok(self.lock()?.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> DbResult<()> {
        self.lock()?.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Key-value entries stored in the `kv_entries` table.
#[derive(Clone, Debug)]
pub struct SqlStore {
    pool: DbPool,
}

impl SqlStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }
}

#[async_trait]
impl KeyValueStore for SqlStore {
    #[instrument(name = "kv.get", skip(self))]
    async fn get(&self, key: &str) -> DbResult<Option<String>> {
        let entry = kv_entries::Entity::find_by_id(key.to_string())
            .one(&self.pool)
            .await?;
        Ok(entry.map(|model| model.value))
    }

    #[instrument(name = "kv.set", skip(self, value), fields(bytes = value.len()))]
    async fn set(&self, key: &str, value: &str) -> DbResult<()> {
        let model = kv_entries::ActiveModel {
            key: Set(key.to_string()),
            value: Set(value.to_string()),
            updated_at: Set(Utc::now().into()),
        };
        kv_entries::Entity::insert(model)
            .on_conflict(
                OnConflict::column(kv_entries::Column::Key)
                    .update_columns([kv_entries::Column::Value, kv_entries::Column::UpdatedAt])
                    .to_owned(),
            )
            .exec(&self.pool)
            .await?;
        Ok(())
    }

    async fn ping(&self) -> DbResult<()> {
        let backend = self.pool.get_database_backend();
        self.pool
            .execute(Statement::from_string(backend, "SELECT 1".to_string()))
            .await?;
        Ok(())
    }
}
