//! Forward migration of stored documents.
//!
//! A stored document whose `schemaVersion` is absent or differs from
//! [`SCHEMA_VERSION`] is rewritten by running every step of [`STEPS`] in order
//! on the raw JSON object, then merged forward into a fresh default document:
//! each known collection (and `settings`) present on the old document is
//! carried over verbatim, everything else stays at its default.
//!
//! New schema changes append a step; steps must be idempotent because a
//! document of any older shape runs all of them.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::{EngineError, ResultEngine, SCHEMA_VERSION, Settings, StoreDocument};

/// One ordered rewrite of the raw document object.
pub struct DocumentMigration {
    pub name: &'static str,
    pub apply: fn(&mut Map<String, Value>),
}

/// Steps applied, in order, to documents written by older versions.
pub const STEPS: &[DocumentMigration] = &[
    DocumentMigration {
        name: "legacy_decimal_amounts",
        apply: convert_legacy_amounts,
    },
    DocumentMigration {
        name: "legacy_browser_keys",
        apply: rename_legacy_keys,
    },
];

/// Version marker keys accepted on load and import.
const VERSION_KEYS: [&str; 2] = ["schemaVersion", "version"];

/// Documents written by the browser application used `version`, `cashFlow`
/// and a `lowStockAlert` setting.
fn rename_legacy_keys(doc: &mut Map<String, Value>) {
    rename_key(doc, "version", "schemaVersion");
    rename_key(doc, "cashFlow", "cashFlowEntries");
    if let Some(Value::Object(settings)) = doc.get_mut("settings") {
        rename_key(settings, "lowStockAlert", "lowStockThreshold");
    }
}

/// The browser application stored amounts as decimal units (`25.9`) and sale
/// lines as `{price, total}`. Only documents still carrying the legacy
/// `version` marker are touched.
fn convert_legacy_amounts(doc: &mut Map<String, Value>) {
    if !doc.contains_key("version") || doc.contains_key("schemaVersion") {
        return;
    }
    for_each_record(doc, "products", |product| {
        to_cents(product, "costPrice");
        to_cents(product, "salePrice");
    });
    for_each_record(doc, "sales", |sale| {
        rename_key(sale, "saleDate", "createdAt");
        to_cents(sale, "total");
        if let Some(Value::Array(items)) = sale.get_mut("items") {
            for item in items.iter_mut().filter_map(Value::as_object_mut) {
                rename_key(item, "price", "unitPrice");
                rename_key(item, "total", "lineTotal");
                to_cents(item, "unitPrice");
                to_cents(item, "lineTotal");
            }
        }
    });
    for key in ["cashFlow", "expenses", "receivables"] {
        for_each_record(doc, key, |record| {
            to_cents(record, "amount");
            to_timestamp(record, "date");
            to_timestamp(record, "dueDate");
        });
    }
}

fn for_each_record(
    doc: &mut Map<String, Value>,
    key: &str,
    mut apply: impl FnMut(&mut Map<String, Value>),
) {
    if let Some(Value::Array(records)) = doc.get_mut(key) {
        records
            .iter_mut()
            .filter_map(Value::as_object_mut)
            .for_each(&mut apply);
    }
}

fn to_cents(record: &mut Map<String, Value>, field: &str) {
    if let Some(value) = record.get_mut(field)
        && let Some(amount) = value.as_f64()
    {
        *value = Value::from((amount * 100.0).round() as i64);
    }
}

/// Date-only values (`2024-05-01`) become midnight UTC.
fn to_timestamp(record: &mut Map<String, Value>, field: &str) {
    if let Some(Value::String(raw)) = record.get_mut(field)
        && let Ok(day) = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
    {
        *raw = day.and_time(NaiveTime::MIN).and_utc().to_rfc3339();
    }
}

fn rename_key(map: &mut Map<String, Value>, from: &str, to: &str) {
    if map.contains_key(to) {
        map.remove(from);
        return;
    }
    if let Some(value) = map.remove(from) {
        map.insert(to.to_string(), value);
    }
}

/// Returns the version marker of a raw document, if it has one.
pub fn version_marker(value: &Value) -> Option<&str> {
    VERSION_KEYS
        .iter()
        .find_map(|key| value.get(key).and_then(Value::as_str))
}

/// `true` when the raw document must go through [`migrate`].
pub fn needs_migration(value: &Value) -> bool {
    value.get("schemaVersion").and_then(Value::as_str) != Some(SCHEMA_VERSION)
}

/// Runs every step and merges the result forward into a default document.
///
/// Unreadable collections or settings are dropped with a warning.
pub fn migrate(old: Value, now: DateTime<Utc>) -> StoreDocument {
    let mut doc = StoreDocument::new(now);
    let Value::Object(mut map) = old else {
        tracing::warn!("stored document is not an object, starting from defaults");
        return doc;
    };

    let from = apply_steps(&mut map);
    for problem in merge_forward(&mut map, &mut doc) {
        tracing::warn!("dropping {problem} during migration");
    }
    tracing::info!(from = from.as_str(), to = SCHEMA_VERSION, "store document migrated");
    doc
}

/// Strict variant of [`migrate`] used for imported snapshots: a collection or
/// `settings` present but unreadable rejects the whole payload.
pub fn try_migrate(old: Value, now: DateTime<Utc>) -> ResultEngine<StoreDocument> {
    let mut doc = StoreDocument::new(now);
    let Value::Object(mut map) = old else {
        return Err(EngineError::InvalidBackup(
            "snapshot must be a JSON object".to_string(),
        ));
    };

    let from = apply_steps(&mut map);
    if let Some(problem) = merge_forward(&mut map, &mut doc).into_iter().next() {
        return Err(EngineError::InvalidBackup(problem));
    }
    tracing::info!(from = from.as_str(), to = SCHEMA_VERSION, "snapshot migrated");
    Ok(doc)
}

/// Applies [`STEPS`] and returns the version the document was written with.
fn apply_steps(map: &mut Map<String, Value>) -> String {
    let from = VERSION_KEYS
        .iter()
        .find_map(|key| map.get(*key).and_then(Value::as_str))
        .unwrap_or("none")
        .to_string();
    for step in STEPS {
        tracing::debug!(step = step.name, "applying document migration step");
        (step.apply)(map);
    }
    from
}

/// Carries the known collections and `settings` into `doc`. Returns one
/// message per value that could not be read; those stay at their defaults.
fn merge_forward(map: &mut Map<String, Value>, doc: &mut StoreDocument) -> Vec<String> {
    if let Some(created_at) = map
        .get("createdAt")
        .and_then(|value| serde_json::from_value::<DateTime<Utc>>(value.clone()).ok())
    {
        doc.created_at = created_at;
    }

    let mut problems = Vec::new();
    carry(map, "clients", &mut doc.clients, &mut problems);
    carry(map, "products", &mut doc.products, &mut problems);
    carry(map, "sales", &mut doc.sales, &mut problems);
    carry(map, "cashFlowEntries", &mut doc.cash_flow_entries, &mut problems);
    carry(map, "expenses", &mut doc.expenses, &mut problems);
    carry(map, "receivables", &mut doc.receivables, &mut problems);

    if let Some(settings) = map.remove("settings") {
        match serde_json::from_value::<Settings>(settings) {
            Ok(settings) => doc.settings = settings,
            Err(err) => problems.push(format!("unreadable settings: {err}")),
        }
    }
    problems
}

fn carry<T: DeserializeOwned>(
    map: &mut Map<String, Value>,
    key: &str,
    target: &mut Vec<T>,
    problems: &mut Vec<String>,
) {
    let Some(value) = map.remove(key) else {
        return;
    };
    match serde_json::from_value::<Vec<T>>(value) {
        Ok(records) => *target = records,
        Err(err) => problems.push(format!("unreadable collection '{key}': {err}")),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn current_version_needs_no_migration() {
        assert!(!needs_migration(&json!({ "schemaVersion": SCHEMA_VERSION })));
        assert!(needs_migration(&json!({ "schemaVersion": "1.0.0" })));
        assert!(needs_migration(&json!({ "clients": [] })));
    }

    #[test]
    fn legacy_keys_are_renamed() {
        let now = Utc::now();
        let old = json!({
            "version": "2.0.0",
            "cashFlow": [{
                "id": "c1",
                "type": "income",
                "amount": 4000,
                "date": "2024-05-01T10:00:00Z",
                "description": "Sale #000001"
            }],
            "settings": { "storeName": "Loja", "lowStockAlert": 2 }
        });
        let doc = migrate(old, now);
        assert_eq!(doc.schema_version, SCHEMA_VERSION);
        assert_eq!(doc.cash_flow_entries.len(), 1);
        assert_eq!(doc.settings.store_name, "Loja");
        assert_eq!(doc.settings.low_stock_threshold, 2);
        assert_eq!(doc.settings.owner_name, "Maria");
    }

    #[test]
    fn legacy_amounts_become_cents() {
        let old = json!({
            "version": "2.0.0",
            "products": [{ "id": "p1", "code": "P1", "name": "Vase", "salePrice": 25.9 }],
            "sales": [{
                "id": "s1",
                "items": [{ "productId": "p1", "quantity": 2, "price": 25.9, "total": 51.8 }],
                "total": 51.8,
                "paymentMethod": "pix",
                "saleDate": "2024-05-01T10:00:00Z"
            }]
        });
        let doc = migrate(old, Utc::now());
        assert_eq!(doc.products[0].sale_price.cents(), 2_590);
        assert_eq!(doc.sales[0].items[0].line_total.cents(), 5_180);
        assert_eq!(doc.sales[0].total.cents(), 5_180);
        assert_eq!(doc.sales[0].created_at.to_rfc3339(), "2024-05-01T10:00:00+00:00");
    }

    #[test]
    fn legacy_date_only_values_become_timestamps() {
        let old = json!({
            "version": "2.0.0",
            "expenses": [{ "id": "e1", "description": "Rent", "amount": 800, "date": "2024-05-01" }]
        });
        let doc = migrate(old, Utc::now());
        assert_eq!(doc.expenses[0].amount.cents(), 80_000);
        assert_eq!(doc.expenses[0].date.to_rfc3339(), "2024-05-01T00:00:00+00:00");
    }

    #[test]
    fn unreadable_collection_falls_back_to_default() {
        let old = json!({
            "clients": [{ "id": "a", "name": "Ana" }],
            "products": "not a list"
        });
        let doc = migrate(old, Utc::now());
        assert_eq!(doc.clients.len(), 1);
        assert!(doc.products.is_empty());
    }

    #[test]
    fn strict_migration_rejects_unreadable_collections() {
        let old = json!({ "schemaVersion": "1.0.0", "clients": 7, "products": "x" });
        let err = try_migrate(old, Utc::now()).unwrap_err();
        assert!(matches!(err, EngineError::InvalidBackup(_)));

        let old = json!({ "version": "2.0.0", "settings": "loja" });
        assert!(try_migrate(old, Utc::now()).is_err());

        let old = json!({ "version": "2.0.0", "clients": [{ "id": "a", "name": "Ana" }] });
        assert_eq!(try_migrate(old, Utc::now()).unwrap().clients.len(), 1);
    }

    #[test]
    fn version_marker_accepts_legacy_key() {
        assert_eq!(version_marker(&json!({ "version": "2.0.0" })), Some("2.0.0"));
        assert_eq!(version_marker(&json!({ "schemaVersion": "3.0.0" })), Some("3.0.0"));
        assert_eq!(version_marker(&json!({ "clients": [] })), None);
    }
}
