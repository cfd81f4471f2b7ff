use std::sync::Arc;

use chrono::{TimeZone, Utc};
use sea_orm::{Database, DatabaseConnection};
use serde_json::{Value, json};

use engine::{
    ClientDraft, Engine, EngineError, FixedClock, KeyValueStorage, MemoryStorage, Money,
    PaymentMethod, ProductDraft, SCHEMA_VERSION, SaleDraft, SaleItemDraft, SqliteStorage,
    StoreDocument,
};
use migration::MigratorTrait;

const KEY: &str = "shopkeep_sgi";

async fn engine_with_db() -> (Engine, DatabaseConnection) {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let engine = Engine::builder()
        .database(db.clone())
        .build()
        .await
        .unwrap();
    (engine, db)
}

async fn engine_with_memory(storage: &MemoryStorage) -> Engine {
    Engine::builder()
        .storage(storage.clone())
        .clock(FixedClock(Utc.with_ymd_and_hms(2024, 5, 15, 10, 0, 0).unwrap()))
        .build()
        .await
        .unwrap()
}

async fn stored_json(storage: &impl KeyValueStorage) -> Value {
    let raw = storage.get(KEY).await.unwrap().unwrap();
    serde_json::from_str(&raw).unwrap()
}

#[tokio::test]
async fn build_persists_a_default_document() {
    let (engine, db) = engine_with_db().await;
    let stored = stored_json(&SqliteStorage::new(db)).await;
    assert_eq!(stored["schemaVersion"], SCHEMA_VERSION);
    assert_eq!(stored["clients"], json!([]));
    assert!(engine.storage_size().await.unwrap() > 0);
    assert_eq!(engine.storage_key(), KEY);
}

#[tokio::test]
async fn documents_survive_a_new_engine_on_the_same_database() {
    let (engine, db) = engine_with_db().await;
    let ana = engine.save_client(ClientDraft::new("Ana")).await.unwrap();
    drop(engine);

    let reopened = Engine::builder().database(db).build().await.unwrap();
    assert_eq!(reopened.clients().await, vec![ana]);
}

#[tokio::test]
async fn save_and_delete_semantics() {
    let (engine, _db) = engine_with_db().await;
    let ana = engine.save_client(ClientDraft::new("  Ana ")).await.unwrap();
    assert_eq!(ana.name, "Ana");

    let patched = engine
        .save_client(ClientDraft {
            id: Some(ana.id.clone()),
            phone: Some("555-0101".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(patched.name, "Ana");
    assert_eq!(patched.phone.as_deref(), Some("555-0101"));

    let err = engine
        .save_client(ClientDraft {
            id: Some("missing".to_string()),
            name: Some("Ghost".to_string()),
            ..Default::default()
        })
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::KeyNotFound("client missing".to_string()));

    let err = engine.save_client(ClientDraft::new("  ")).await.unwrap_err();
    assert!(matches!(err, EngineError::InvalidInput(_)));

    engine.delete_client(&ana.id).await.unwrap();
    engine.delete_client(&ana.id).await.unwrap();
    assert!(engine.clients().await.is_empty());
    assert_eq!(engine.client(&ana.id).await, None);
}

#[tokio::test]
async fn search_ignores_case_and_accents() {
    let (engine, _db) = engine_with_db().await;
    engine.save_client(ClientDraft::new("João Conceição")).await.unwrap();
    engine.save_client(ClientDraft::new("Maria")).await.unwrap();

    let found = engine.search_clients("conceicao").await;
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].name, "João Conceição");
    assert_eq!(engine.search_clients("").await.len(), 2);
}

#[tokio::test]
async fn failed_save_persists_nothing() {
    let storage = MemoryStorage::new();
    let engine = engine_with_memory(&storage).await;
    let before = storage.get(KEY).await.unwrap();

    storage.set_quota(Some(16));
    let err = engine.save_client(ClientDraft::new("Ana")).await.unwrap_err();
    assert!(matches!(err, EngineError::Storage(_)));
    assert!(err.is_storage());

    storage.set_quota(None);
    assert_eq!(storage.get(KEY).await.unwrap(), before);
    assert!(engine.clients().await.is_empty());
}

#[tokio::test]
async fn corrupt_blob_loads_as_defaults() {
    let storage = MemoryStorage::new();
    storage.set(KEY, "{ not json").await.unwrap();
    let engine = engine_with_memory(&storage).await;

    let doc = engine.load().await;
    assert!(doc.clients.is_empty());
    assert_eq!(doc.settings.store_name, "Flor de Maria");

    engine.save_client(ClientDraft::new("Ana")).await.unwrap();
    assert_eq!(engine.clients().await.len(), 1);
}

#[tokio::test]
async fn legacy_document_is_migrated_and_persisted() {
    let storage = MemoryStorage::new();
    let legacy = json!({
        "version": "1.0.0",
        "createdAt": "2023-01-10T08:00:00Z",
        "clients": [{"id": "c1", "name": "Ana", "createdAt": "2023-01-10T08:00:00Z"}],
        "products": [{
            "id": "p1",
            "code": "P1",
            "name": "Vase",
            "quantity": 4,
            "costPrice": 10.0,
            "salePrice": 24.9
        }],
        "cashFlow": [{
            "id": "e1",
            "type": "income",
            "amount": 25,
            "date": "2023-01-11",
            "description": "Opening"
        }],
        "sales": "unreadable",
        "settings": {"storeName": "Loja", "lowStockAlert": 2}
    });
    storage.set(KEY, &legacy.to_string()).await.unwrap();

    let engine = engine_with_memory(&storage).await;
    let doc = engine.load().await;
    assert_eq!(doc.schema_version, SCHEMA_VERSION);
    assert_eq!(doc.created_at, Utc.with_ymd_and_hms(2023, 1, 10, 8, 0, 0).unwrap());
    assert_eq!(doc.clients.len(), 1);
    assert_eq!(doc.clients[0].name, "Ana");
    assert_eq!(doc.products[0].quantity, 4);
    assert_eq!(doc.products[0].sale_price, Money::new(2_490));
    assert_eq!(doc.cash_flow_entries.len(), 1);
    assert!(doc.sales.is_empty());
    assert!(doc.expenses.is_empty());
    assert!(doc.receivables.is_empty());
    assert_eq!(doc.settings.store_name, "Loja");
    assert_eq!(doc.settings.low_stock_threshold, 2);
    assert_eq!(doc.settings.owner_name, "Maria");

    let stored = stored_json(&storage).await;
    assert_eq!(stored["schemaVersion"], SCHEMA_VERSION);
    assert!(stored.get("cashFlow").is_none());
    assert_eq!(engine.current_balance().await, Money::new(2_500));
}

#[tokio::test]
async fn snapshot_round_trip() {
    let (engine, _db) = engine_with_db().await;
    let ana = engine.save_client(ClientDraft::new("Ana")).await.unwrap();
    let vase = engine
        .save_product(ProductDraft {
            code: Some("P1".to_string()),
            name: Some("Vase".to_string()),
            quantity: Some(3),
            sale_price: Some(Money::new(2_500)),
            ..Default::default()
        })
        .await
        .unwrap();
    engine
        .record_sale(
            SaleDraft::new(PaymentMethod::Credit, vec![SaleItemDraft::new(&vase.id, 1)])
                .client(&ana.id)
                .installments(2),
        )
        .await
        .unwrap();
    let before = engine.load().await;

    let snapshot = engine.export_snapshot().await.unwrap();
    let value: Value = serde_json::from_str(&snapshot).unwrap();
    assert!(value["exportedBy"].as_str().unwrap().starts_with("Shopkeep v"));
    assert!(value.get("exportedAt").is_some());

    engine.clear_all_data().await.unwrap();
    assert!(engine.clients().await.is_empty());

    let imported = engine.import_snapshot(&snapshot).await.unwrap();
    assert!(imported.same_content(&before));
    assert!(engine.load().await.same_content(&before));
}

#[tokio::test]
async fn invalid_snapshots_leave_the_store_untouched() {
    let (engine, _db) = engine_with_db().await;
    engine.save_client(ClientDraft::new("Ana")).await.unwrap();
    let before = engine.load().await;

    for payload in ["not json", "[1, 2]", r#"{"clients": []}"#] {
        let err = engine.import_snapshot(payload).await.unwrap_err();
        assert!(matches!(err, EngineError::InvalidBackup(_)), "{payload}: {err}");
    }
    for payload in [
        json!({"schemaVersion": SCHEMA_VERSION, "clients": 7}),
        json!({"schemaVersion": "1.0.0", "clients": 7, "products": "x"}),
        json!({"version": "2.0", "settings": "loja"}),
    ] {
        let err = engine.import_snapshot(&payload.to_string()).await.unwrap_err();
        assert!(matches!(err, EngineError::InvalidBackup(_)), "{payload}: {err}");
    }

    assert!(engine.load().await.same_content(&before));
}

#[tokio::test]
async fn legacy_snapshot_is_migrated_on_import() {
    let (engine, _db) = engine_with_db().await;
    let snapshot = json!({
        "version": "2.0",
        "clients": [{"id": "c1", "name": "Ana"}],
        "exportedAt": "2023-05-01T00:00:00Z",
        "exportedBy": "SGI v2.0"
    });

    let doc = engine.import_snapshot(&snapshot.to_string()).await.unwrap();
    assert_eq!(doc.schema_version, SCHEMA_VERSION);
    assert_eq!(engine.clients().await[0].id, "c1");
}

#[tokio::test]
async fn empty_storage_key_is_rejected() {
    let err = Engine::builder().storage_key(" ").build().await.unwrap_err();
    assert!(matches!(err, EngineError::InvalidInput(_)));
}

#[tokio::test]
async fn concurrent_writers_are_linearised() {
    let (engine, _db) = engine_with_db().await;
    let engine = Arc::new(engine);

    let mut tasks = tokio::task::JoinSet::new();
    for i in 0..20 {
        let engine = engine.clone();
        tasks.spawn(async move {
            engine
                .save_client(ClientDraft::new(format!("Client {i}")))
                .await
                .unwrap();
        });
    }
    while let Some(result) = tasks.join_next().await {
        result.unwrap();
    }

    assert_eq!(engine.clients().await.len(), 20);
}

#[tokio::test]
async fn save_replaces_the_document() {
    let (engine, _db) = engine_with_db().await;
    let mut doc = StoreDocument::new(engine.now());
    doc.settings.store_name = "Replaced".to_string();
    engine.save(doc).await.unwrap();

    let loaded = engine.load().await;
    assert_eq!(loaded.settings.store_name, "Replaced");
    assert_eq!(loaded.schema_version, SCHEMA_VERSION);
}
