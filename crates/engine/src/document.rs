//! The root aggregate persisted under the store key.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{CashFlowEntry, Client, Expense, Product, Receivable, Sale, Settings};

/// Version written into every saved document. A stored document with another
/// (or no) version goes through [`crate::migrate`] on load.
pub const SCHEMA_VERSION: &str = "3.0.0";

/// Names of the collections carried by a document, in serialized form.
pub const COLLECTIONS: [&str; 6] = [
    "clients",
    "products",
    "sales",
    "cashFlowEntries",
    "expenses",
    "receivables",
];

/// Every entity collection plus the settings singleton.
///
/// Collections keep insertion order; the only uniqueness constraint is `id`.
/// References between collections (`clientId`, `saleId`, ...) are plain ids and
/// may dangle.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreDocument {
    pub schema_version: String,
    pub created_at: DateTime<Utc>,
    pub last_update: DateTime<Utc>,
    #[serde(default)]
    pub clients: Vec<Client>,
    #[serde(default)]
    pub products: Vec<Product>,
    #[serde(default)]
    pub sales: Vec<Sale>,
    #[serde(default)]
    pub cash_flow_entries: Vec<CashFlowEntry>,
    #[serde(default)]
    pub expenses: Vec<Expense>,
    #[serde(default)]
    pub receivables: Vec<Receivable>,
    #[serde(default)]
    pub settings: Settings,
}

impl StoreDocument {
    /// Fresh document: empty collections, default settings.
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            schema_version: SCHEMA_VERSION.to_string(),
            created_at: now,
            last_update: now,
            clients: Vec::new(),
            products: Vec::new(),
            sales: Vec::new(),
            cash_flow_entries: Vec::new(),
            expenses: Vec::new(),
            receivables: Vec::new(),
            settings: Settings::default(),
        }
    }

    /// `true` when every collection equals the other document's and settings
    /// match. Timestamps and version are ignored.
    pub fn same_content(&self, other: &StoreDocument) -> bool {
        self.clients == other.clients
            && self.products == other.products
            && self.sales == other.sales
            && self.cash_flow_entries == other.cash_flow_entries
            && self.expenses == other.expenses
            && self.receivables == other.receivables
            && self.settings == other.settings
    }
}
