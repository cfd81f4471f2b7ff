use serde_json::Value;

use crate::{EngineError, ResultEngine, StoreDocument, migrate};

use super::Engine;

const EXPORT_METADATA: [&str; 2] = ["exportedAt", "exportedBy"];

impl Engine {
    /// Pretty JSON of the current document plus `exportedAt` / `exportedBy`.
    pub async fn export_snapshot(&self) -> ResultEngine<String> {
        let doc = self.load().await;
        let mut value = serde_json::to_value(&doc)?;
        if let Value::Object(map) = &mut value {
            map.insert(
                "exportedAt".to_string(),
                serde_json::to_value(self.now())?,
            );
            map.insert(
                "exportedBy".to_string(),
                Value::String(format!("Shopkeep v{}", env!("CARGO_PKG_VERSION"))),
            );
        }
        Ok(serde_json::to_string_pretty(&value)?)
    }

    /// Replaces the whole document with a snapshot.
    ///
    /// The payload must be a JSON object carrying a `schemaVersion` (or legacy
    /// `version`) marker, otherwise `InvalidBackup` is returned and the stored
    /// document is left untouched. Older snapshots go through the migration
    /// steps first; a collection they carry that cannot be read rejects the
    /// snapshot as well.
    pub async fn import_snapshot(&self, snapshot: &str) -> ResultEngine<StoreDocument> {
        let mut value: Value = serde_json::from_str(snapshot)
            .map_err(|err| EngineError::InvalidBackup(format!("not valid JSON: {err}")))?;
        let Value::Object(map) = &mut value else {
            return Err(EngineError::InvalidBackup(
                "snapshot must be a JSON object".to_string(),
            ));
        };
        for key in EXPORT_METADATA {
            map.remove(key);
        }
        if migrate::version_marker(&value).is_none() {
            return Err(EngineError::InvalidBackup(
                "snapshot has no schema version".to_string(),
            ));
        }

        let now = self.now();
        let mut doc = if migrate::needs_migration(&value) {
            migrate::try_migrate(value, now)?
        } else {
            serde_json::from_value::<StoreDocument>(value)
                .map_err(|err| EngineError::InvalidBackup(format!("unreadable snapshot: {err}")))?
        };

        let _guard = self.write_lock.lock().await;
        self.write_document(&mut doc).await?;
        tracing::info!(
            clients = doc.clients.len(),
            products = doc.products.len(),
            sales = doc.sales.len(),
            "snapshot imported"
        );
        Ok(doc)
    }

    /// Removes the stored blob and starts over from a default document.
    pub async fn clear_all_data(&self) -> ResultEngine<()> {
        let _guard = self.write_lock.lock().await;
        self.storage.remove(&self.storage_key).await?;
        let mut doc = StoreDocument::new(self.now());
        self.write_document(&mut doc).await?;
        tracing::info!("store data cleared");
        Ok(())
    }

    /// Size in bytes of the stored blob, 0 when nothing is stored.
    pub async fn storage_size(&self) -> ResultEngine<usize> {
        Ok(self
            .storage
            .get(&self.storage_key)
            .await?
            .map_or(0, |raw| raw.len()))
    }
}
