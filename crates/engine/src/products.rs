//! The module contains the `Product` record and its stock rules.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    EngineError, Money, ResultEngine, StoreDocument,
    ops::{Collection, Record},
    search::Searchable,
    util::{apply_optional_text_patch, normalize_optional_text, normalize_required_text},
};

/// An inventory item.
///
/// `quantity` changes only through a stock adjustment or a recorded sale and
/// never goes below zero.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: String,
    pub code: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub quantity: i64,
    #[serde(default)]
    pub cost_price: Money,
    #[serde(default)]
    pub sale_price: Money,
    #[serde(default)]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: DateTime<Utc>,
}

/// Stock bucket of a product relative to the low-stock threshold.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StockStatus {
    Available,
    Low,
    Out,
}

impl Product {
    #[must_use]
    pub fn stock_status(&self, low_stock_threshold: i64) -> StockStatus {
        if self.quantity <= 0 {
            StockStatus::Out
        } else if self.quantity <= low_stock_threshold {
            StockStatus::Low
        } else {
            StockStatus::Available
        }
    }

    /// Applies a signed stock delta, rejecting changes that would oversell.
    pub(crate) fn apply_stock_delta(&mut self, delta: i64, now: DateTime<Utc>) -> ResultEngine<()> {
        let next = self
            .quantity
            .checked_add(delta)
            .ok_or_else(|| EngineError::InvalidInput("stock quantity overflow".to_string()))?;
        if next < 0 {
            return Err(EngineError::InsufficientStock(format!(
                "product '{}' has {} in stock, requested {}",
                self.code, self.quantity, -delta
            )));
        }
        self.quantity = next;
        self.updated_at = now;
        Ok(())
    }
}

/// Insert (no `id`) or merge-patch (with `id`) payload for a product.
///
/// `quantity` is the opening stock and only accepted on insert.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProductDraft {
    pub id: Option<String>,
    pub code: Option<String>,
    pub name: Option<String>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub quantity: Option<i64>,
    pub cost_price: Option<Money>,
    pub sale_price: Option<Money>,
}

fn validate_price(price: Money, label: &str) -> ResultEngine<Money> {
    if price.is_negative() {
        return Err(EngineError::InvalidAmount(format!("{label} must be >= 0")));
    }
    Ok(price)
}

impl Collection for Product {
    const LABEL: &'static str = "product";

    fn id(&self) -> &str {
        &self.id
    }

    fn collection(doc: &StoreDocument) -> &Vec<Self> {
        &doc.products
    }

    fn collection_mut(doc: &mut StoreDocument) -> &mut Vec<Self> {
        &mut doc.products
    }
}

impl Record for Product {
    type Draft = ProductDraft;

    fn draft_id(draft: &ProductDraft) -> Option<&str> {
        draft.id.as_deref()
    }

    fn create(id: String, draft: ProductDraft, now: DateTime<Utc>) -> ResultEngine<Self> {
        let code = normalize_required_text(draft.code.as_deref().unwrap_or_default(), "product code")?;
        let name = normalize_required_text(draft.name.as_deref().unwrap_or_default(), "product name")?;
        let quantity = draft.quantity.unwrap_or(0);
        if quantity < 0 {
            return Err(EngineError::InvalidInput(
                "opening stock must be >= 0".to_string(),
            ));
        }
        Ok(Self {
            id,
            code,
            name,
            category: normalize_optional_text(draft.category.as_deref()),
            description: normalize_optional_text(draft.description.as_deref()),
            quantity,
            cost_price: validate_price(draft.cost_price.unwrap_or_default(), "cost price")?,
            sale_price: validate_price(draft.sale_price.unwrap_or_default(), "sale price")?,
            created_at: now,
            updated_at: now,
        })
    }

    fn merge(&mut self, draft: ProductDraft, now: DateTime<Utc>) -> ResultEngine<()> {
        if draft.quantity.is_some() {
            return Err(EngineError::InvalidInput(
                "stock changes go through adjust_stock".to_string(),
            ));
        }
        if let Some(code) = draft.code.as_deref() {
            self.code = normalize_required_text(code, "product code")?;
        }
        if let Some(name) = draft.name.as_deref() {
            self.name = normalize_required_text(name, "product name")?;
        }
        if let Some(price) = draft.cost_price {
            self.cost_price = validate_price(price, "cost price")?;
        }
        if let Some(price) = draft.sale_price {
            self.sale_price = validate_price(price, "sale price")?;
        }
        self.category = apply_optional_text_patch(self.category.take(), draft.category.as_deref());
        self.description =
            apply_optional_text_patch(self.description.take(), draft.description.as_deref());
        self.updated_at = now;
        Ok(())
    }
}

impl Searchable for Product {
    fn search_fields(&self) -> Vec<&str> {
        [
            Some(self.code.as_str()),
            Some(self.name.as_str()),
            self.category.as_deref(),
        ]
        .into_iter()
        .flatten()
        .collect()
    }
}
