//! Host key-value storage the store document is persisted in.
//!
//! The engine writes one serialized blob under one key. Two backends exist:
//!
//! - [`SqliteStorage`]: a `kv_store` table reached through sea-orm (created by
//!   the `migration` crate).
//! - [`MemoryStorage`]: an in-process map with an optional byte quota, useful
//!   for tests and for simulating a full storage.
use std::{
    collections::HashMap,
    fmt::Debug,
    sync::{
        Arc, RwLock,
        atomic::{AtomicUsize, Ordering},
    },
};

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{ActiveValue, DatabaseConnection, EntityTrait, sea_query::OnConflict};

use crate::{EngineError, ResultEngine};

#[async_trait]
pub trait KeyValueStorage: Send + Sync + Debug {
    /// Returns the value stored under `key`, if any.
    async fn get(&self, key: &str) -> ResultEngine<Option<String>>;

    /// Stores `value` under `key`, replacing any previous value.
    async fn set(&self, key: &str, value: &str) -> ResultEngine<()>;

    /// Removes `key`. Removing a missing key is not an error.
    async fn remove(&self, key: &str) -> ResultEngine<()>;
}

mod kv_store {
    use sea_orm::entity::prelude::*;

    #[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
    #[sea_orm(table_name = "kv_store")]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        pub key: String,
        #[sea_orm(column_type = "Text")]
        pub value: String,
        pub updated_at: DateTimeUtc,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {}

    impl ActiveModelBehavior for ActiveModel {}
}

/// SQLite (or any sea-orm backend) table `kv_store(key, value, updated_at)`.
#[derive(Clone, Debug)]
pub struct SqliteStorage {
    database: DatabaseConnection,
}

impl SqliteStorage {
    pub fn new(database: DatabaseConnection) -> Self {
        Self { database }
    }
}

#[async_trait]
impl KeyValueStorage for SqliteStorage {
    async fn get(&self, key: &str) -> ResultEngine<Option<String>> {
        let model = kv_store::Entity::find_by_id(key.to_string())
            .one(&self.database)
            .await?;
        Ok(model.map(|m| m.value))
    }

    async fn set(&self, key: &str, value: &str) -> ResultEngine<()> {
        let model = kv_store::ActiveModel {
            key: ActiveValue::Set(key.to_string()),
            value: ActiveValue::Set(value.to_string()),
            updated_at: ActiveValue::Set(Utc::now()),
        };
        kv_store::Entity::insert(model)
            .on_conflict(
                OnConflict::column(kv_store::Column::Key)
                    .update_columns([kv_store::Column::Value, kv_store::Column::UpdatedAt])
                    .to_owned(),
            )
            .exec_without_returning(&self.database)
            .await?;
        Ok(())
    }

    async fn remove(&self, key: &str) -> ResultEngine<()> {
        kv_store::Entity::delete_by_id(key.to_string())
            .exec(&self.database)
            .await?;
        Ok(())
    }
}

/// In-memory storage. Uses RwLock for thread-safe access.
///
/// With a quota, a `set` whose value is larger than the quota fails the way a
/// full browser storage does. Clones share both the values and the quota.
#[derive(Clone, Debug)]
pub struct MemoryStorage {
    values: Arc<RwLock<HashMap<String, String>>>,
    quota_bytes: Arc<AtomicUsize>,
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self {
            values: Arc::default(),
            quota_bytes: Arc::new(AtomicUsize::new(usize::MAX)),
        }
    }
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Storage refusing values larger than `quota_bytes`.
    pub fn with_quota(quota_bytes: usize) -> Self {
        let storage = Self::default();
        storage.set_quota(Some(quota_bytes));
        storage
    }

    /// Changes the quota; `None` removes it.
    pub fn set_quota(&self, quota_bytes: Option<usize>) {
        self.quota_bytes
            .store(quota_bytes.unwrap_or(usize::MAX), Ordering::SeqCst);
    }

    fn lock_error<E: std::fmt::Display>(err: E) -> EngineError {
        EngineError::Storage(format!("memory storage lock poisoned: {err}"))
    }
}

#[async_trait]
impl KeyValueStorage for MemoryStorage {
    async fn get(&self, key: &str) -> ResultEngine<Option<String>> {
        let values = self.values.read().map_err(Self::lock_error)?;
        Ok(values.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> ResultEngine<()> {
        let quota = self.quota_bytes.load(Ordering::SeqCst);
        if value.len() > quota {
            return Err(EngineError::Storage(format!(
                "quota exceeded: {} bytes > {quota} bytes",
                value.len()
            )));
        }
        let mut values = self.values.write().map_err(Self::lock_error)?;
        values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> ResultEngine<()> {
        let mut values = self.values.write().map_err(Self::lock_error)?;
        values.remove(key);
        Ok(())
    }
}
