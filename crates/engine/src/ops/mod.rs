use std::sync::Arc;

use chrono::{DateTime, Utc};
use sea_orm::DatabaseConnection;
use serde_json::Value;
use tokio::sync::Mutex;

use crate::{
    EngineError, ResultEngine, SCHEMA_VERSION, StoreDocument, migrate,
    storage::{KeyValueStorage, MemoryStorage, SqliteStorage},
    util::{Clock, SystemClock, generate_id_at},
};

mod backup;
mod cash_flows;
mod clients;
mod expenses;
mod products;
mod receivables;
mod reports;
mod sales;
mod settings;
mod statistics;

pub use clients::ClientHistory;
pub use sales::MAX_INSTALLMENTS;

/// Storage key used when none is configured.
pub const DEFAULT_STORAGE_KEY: &str = "shopkeep_sgi";

/// A record kept in one of the document's collections.
pub(crate) trait Collection: Clone {
    /// Name used in errors and logs.
    const LABEL: &'static str;

    fn id(&self) -> &str;
    fn collection(doc: &StoreDocument) -> &Vec<Self>;
    fn collection_mut(doc: &mut StoreDocument) -> &mut Vec<Self>;
}

/// A collection record with insert / merge-patch semantics.
pub(crate) trait Record: Collection {
    type Draft;

    fn draft_id(draft: &Self::Draft) -> Option<&str>;
    fn create(id: String, draft: Self::Draft, now: DateTime<Utc>) -> ResultEngine<Self>;
    fn merge(&mut self, draft: Self::Draft, now: DateTime<Utc>) -> ResultEngine<()>;
}

/// Handle on one persisted store.
///
/// Every mutation runs `load → mutate an in-memory copy → save once` while
/// holding `write_lock`, so concurrent callers are linearised and a failed
/// save leaves nothing behind. Reads do not lock.
#[derive(Debug)]
pub struct Engine {
    storage: Arc<dyn KeyValueStorage>,
    storage_key: String,
    clock: Arc<dyn Clock>,
    write_lock: Mutex<()>,
}

impl Engine {
    /// Return a builder for `Engine`. Help to build the struct.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    /// Current time according to the engine clock.
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub fn storage_key(&self) -> &str {
        &self.storage_key
    }

    /// Reads the whole document.
    ///
    /// Never fails: a missing or unreadable blob yields a fresh default
    /// document. An old document is migrated and the result persisted.
    pub async fn load(&self) -> StoreDocument {
        match self.read_document().await {
            Ok((doc, false)) => doc,
            Ok((_, true)) => {
                let _guard = self.write_lock.lock().await;
                match self.read_for_write().await {
                    Ok(doc) => doc,
                    Err(err) => {
                        tracing::warn!("failed to read store document, using defaults: {err}");
                        StoreDocument::new(self.now())
                    }
                }
            }
            Err(err) => {
                tracing::warn!("failed to read store document, using defaults: {err}");
                StoreDocument::new(self.now())
            }
        }
    }

    /// Replaces the stored document wholesale.
    pub async fn save(&self, mut doc: StoreDocument) -> ResultEngine<()> {
        let _guard = self.write_lock.lock().await;
        self.write_document(&mut doc).await
    }

    /// Persists a default document when the key is empty, otherwise loads the
    /// stored one and persists it when a migration was needed.
    async fn init(&self) -> ResultEngine<()> {
        let _guard = self.write_lock.lock().await;
        if self.storage.get(&self.storage_key).await?.is_none() {
            let mut doc = StoreDocument::new(self.now());
            self.write_document(&mut doc).await?;
            tracing::debug!(key = self.storage_key.as_str(), "default store document created");
            return Ok(());
        }
        self.read_for_write().await.map(|_| ())
    }

    /// Raw read. The flag is `true` when the document was migrated.
    ///
    /// Host read errors propagate; an unparseable blob degrades to defaults.
    async fn read_document(&self) -> ResultEngine<(StoreDocument, bool)> {
        let now = self.now();
        let Some(raw) = self.storage.get(&self.storage_key).await? else {
            return Ok((StoreDocument::new(now), false));
        };

        let value: Value = match serde_json::from_str(&raw) {
            Ok(value) => value,
            Err(err) => {
                tracing::warn!("store document is corrupt, starting from defaults: {err}");
                return Ok((StoreDocument::new(now), false));
            }
        };

        if migrate::needs_migration(&value) {
            return Ok((migrate::migrate(value, now), true));
        }

        match serde_json::from_value::<StoreDocument>(value) {
            Ok(doc) => Ok((doc, false)),
            Err(err) => {
                tracing::warn!("store document does not match schema, starting from defaults: {err}");
                Ok((StoreDocument::new(now), false))
            }
        }
    }

    /// Read path for callers holding `write_lock`.
    async fn read_for_write(&self) -> ResultEngine<StoreDocument> {
        let (doc, migrated) = self.read_document().await?;
        if migrated {
            let mut migrated_doc = doc.clone();
            if let Err(err) = self.write_document(&mut migrated_doc).await {
                tracing::warn!("failed to persist migrated store document: {err}");
            }
            return Ok(migrated_doc);
        }
        Ok(doc)
    }

    /// Stamps `lastUpdate` and writes the document under the store key.
    async fn write_document(&self, doc: &mut StoreDocument) -> ResultEngine<()> {
        doc.schema_version = SCHEMA_VERSION.to_string();
        doc.last_update = self.now();
        let payload = serde_json::to_string(doc)?;
        self.storage.set(&self.storage_key, &payload).await
    }

    /// Runs `f` against a fresh copy of the document and saves it once.
    ///
    /// If `f` or the save fails nothing is persisted.
    pub(crate) async fn mutate<T, F>(&self, operation: &'static str, f: F) -> ResultEngine<T>
    where
        F: FnOnce(&mut StoreDocument, DateTime<Utc>) -> ResultEngine<T> + Send,
        T: Send,
    {
        let _guard = self.write_lock.lock().await;
        let mut doc = self.read_for_write().await?;
        let now = self.now();
        let value = match f(&mut doc, now) {
            Ok(value) => value,
            Err(err) => {
                tracing::debug!(operation, "operation rejected: {err}");
                return Err(err);
            }
        };
        if let Err(err) = self.write_document(&mut doc).await {
            tracing::warn!(operation, "failed to save store document: {err}");
            return Err(err);
        }
        tracing::debug!(operation, "store document saved");
        Ok(value)
    }

    pub(crate) async fn all_records<R: Collection>(&self) -> Vec<R> {
        let mut doc = self.load().await;
        std::mem::take(R::collection_mut(&mut doc))
    }

    pub(crate) async fn find_record<R: Collection>(&self, id: &str) -> Option<R> {
        let doc = self.load().await;
        R::collection(&doc)
            .iter()
            .find(|record| record.id() == id)
            .cloned()
    }

    pub(crate) async fn save_record<R>(&self, operation: &'static str, draft: R::Draft) -> ResultEngine<R>
    where
        R: Record + Send,
        R::Draft: Send,
    {
        self.mutate(operation, move |doc, now| upsert::<R>(doc, draft, now))
            .await
    }

    pub(crate) async fn delete_record<R: Collection>(
        &self,
        operation: &'static str,
        id: &str,
    ) -> ResultEngine<()> {
        self.mutate(operation, |doc, _| {
            remove::<R>(doc, id);
            Ok(())
        })
        .await
    }
}

/// Inserts (no id) or merge-patches (with id) a record inside `doc`.
pub(crate) fn upsert<R: Record>(
    doc: &mut StoreDocument,
    draft: R::Draft,
    now: DateTime<Utc>,
) -> ResultEngine<R> {
    match R::draft_id(&draft).map(str::to_string) {
        Some(id) => {
            let record = require_mut::<R>(doc, &id)?;
            record.merge(draft, now)?;
            Ok(record.clone())
        }
        None => {
            let record = R::create(generate_id_at(now), draft, now)?;
            R::collection_mut(doc).push(record.clone());
            Ok(record)
        }
    }
}

pub(crate) fn require_mut<'a, R: Collection>(
    doc: &'a mut StoreDocument,
    id: &str,
) -> ResultEngine<&'a mut R> {
    R::collection_mut(doc)
        .iter_mut()
        .find(|record| record.id() == id)
        .ok_or_else(|| EngineError::KeyNotFound(format!("{} {id}", R::LABEL)))
}

/// Filters the record out; returns whether something was removed.
pub(crate) fn remove<R: Collection>(doc: &mut StoreDocument, id: &str) -> bool {
    let records = R::collection_mut(doc);
    let before = records.len();
    records.retain(|record| record.id() != id);
    records.len() != before
}

/// The builder for `Engine`
#[derive(Default)]
pub struct EngineBuilder {
    storage: Option<Arc<dyn KeyValueStorage>>,
    storage_key: Option<String>,
    clock: Option<Arc<dyn Clock>>,
}

impl EngineBuilder {
    /// Persist into a sea-orm database (`kv_store` table).
    pub fn database(self, db: DatabaseConnection) -> EngineBuilder {
        self.storage(SqliteStorage::new(db))
    }

    /// Persist into any host storage.
    pub fn storage(mut self, storage: impl KeyValueStorage + 'static) -> EngineBuilder {
        self.storage = Some(Arc::new(storage));
        self
    }

    pub fn storage_key(mut self, key: impl Into<String>) -> EngineBuilder {
        self.storage_key = Some(key.into());
        self
    }

    pub fn clock(mut self, clock: impl Clock + 'static) -> EngineBuilder {
        self.clock = Some(Arc::new(clock));
        self
    }

    /// Construct `Engine`, migrating the stored document if needed.
    pub async fn build(self) -> ResultEngine<Engine> {
        let storage_key = self
            .storage_key
            .unwrap_or_else(|| DEFAULT_STORAGE_KEY.to_string());
        if storage_key.trim().is_empty() {
            return Err(EngineError::InvalidInput(
                "storage key must not be empty".to_string(),
            ));
        }
        let engine = Engine {
            storage: self
                .storage
                .unwrap_or_else(|| Arc::new(MemoryStorage::new())),
            storage_key,
            clock: self.clock.unwrap_or_else(|| Arc::new(SystemClock)),
            write_lock: Mutex::new(()),
        };
        engine.init().await?;
        Ok(engine)
    }
}
