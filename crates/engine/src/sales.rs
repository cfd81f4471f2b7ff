//! The module contains the `Sale` record.
//!
//! Sales are immutable: they are only created through
//! [`Engine::record_sale`](crate::Engine::record_sale).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Money, StoreDocument, ops::Collection, search::Searchable};

/// How a sale was paid.
///
/// `Cash` and `Pix` (instant bank transfer) settle immediately and produce a
/// cash-flow income. `Credit` (store installment credit) and `Card` are
/// deferred and produce receivables.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    Cash,
    Pix,
    Credit,
    Card,
}

impl PaymentMethod {
    #[must_use]
    pub const fn is_immediate(self) -> bool {
        matches!(self, PaymentMethod::Cash | PaymentMethod::Pix)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::Pix => "pix",
            PaymentMethod::Credit => "credit",
            PaymentMethod::Card => "card",
        }
    }
}

impl TryFrom<&str> for PaymentMethod {
    type Error = crate::EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "cash" => Ok(PaymentMethod::Cash),
            "pix" => Ok(PaymentMethod::Pix),
            "credit" => Ok(PaymentMethod::Credit),
            "card" => Ok(PaymentMethod::Card),
            other => Err(crate::EngineError::InvalidInput(format!(
                "unknown payment method: {other}"
            ))),
        }
    }
}

/// One line of a sale. Code and name are snapshots taken when the sale was
/// recorded.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleItem {
    pub product_id: String,
    #[serde(default)]
    pub product_code: String,
    #[serde(default)]
    pub product_name: String,
    pub quantity: i64,
    pub unit_price: Money,
    pub line_total: Money,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sale {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    pub items: Vec<SaleItem>,
    pub total: Money,
    pub payment_method: PaymentMethod,
    #[serde(default = "default_installments")]
    pub installments: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default)]
    pub created_at: DateTime<Utc>,
}

fn default_installments() -> u32 {
    1
}

/// A requested sale line. `unit_price` defaults to the product's sale price.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleItemDraft {
    pub product_id: String,
    pub quantity: i64,
    #[serde(default)]
    pub unit_price: Option<Money>,
}

impl SaleItemDraft {
    pub fn new(product_id: impl Into<String>, quantity: i64) -> Self {
        Self {
            product_id: product_id.into(),
            quantity,
            unit_price: None,
        }
    }

    #[must_use]
    pub fn unit_price(mut self, price: Money) -> Self {
        self.unit_price = Some(price);
        self
    }
}

/// Payload for [`Engine::record_sale`](crate::Engine::record_sale).
///
/// When `total` is absent it is the sum of the line totals. `installments`
/// defaults to 1 and only matters for deferred payment methods.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleDraft {
    #[serde(default)]
    pub client_id: Option<String>,
    pub items: Vec<SaleItemDraft>,
    #[serde(default)]
    pub total: Option<Money>,
    pub payment_method: PaymentMethod,
    #[serde(default)]
    pub installments: Option<u32>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl SaleDraft {
    pub fn new(payment_method: PaymentMethod, items: Vec<SaleItemDraft>) -> Self {
        Self {
            client_id: None,
            items,
            total: None,
            payment_method,
            installments: None,
            notes: None,
        }
    }

    #[must_use]
    pub fn client(mut self, client_id: impl Into<String>) -> Self {
        self.client_id = Some(client_id.into());
        self
    }

    #[must_use]
    pub fn total(mut self, total: Money) -> Self {
        self.total = Some(total);
        self
    }

    #[must_use]
    pub fn installments(mut self, installments: u32) -> Self {
        self.installments = Some(installments);
        self
    }
}

impl Collection for Sale {
    const LABEL: &'static str = "sale";

    fn id(&self) -> &str {
        &self.id
    }

    fn collection(doc: &StoreDocument) -> &Vec<Self> {
        &doc.sales
    }

    fn collection_mut(doc: &mut StoreDocument) -> &mut Vec<Self> {
        &mut doc.sales
    }
}

impl Searchable for Sale {
    fn search_fields(&self) -> Vec<&str> {
        let mut fields = vec![self.id.as_str(), self.payment_method.as_str()];
        for item in &self.items {
            fields.push(item.product_code.as_str());
            fields.push(item.product_name.as_str());
        }
        fields
    }
}
