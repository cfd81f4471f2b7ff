//! The module contains the representation of a cash-flow entry.
//!
//! Entries created by a sale, an expense or a paid receivable carry a
//! back-reference to their origin and are locked: only the operation that owns
//! them may change or remove them. Entries without a back-reference are
//! ordinary user records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    EngineError, Money, ResultEngine, StoreDocument,
    ops::{Collection, Record},
    search::Searchable,
    util::{apply_optional_text_patch, normalize_optional_text, normalize_required_text},
};

pub const CATEGORY_SALES: &str = "sales";
pub const CATEGORY_EXPENSES: &str = "expenses";
pub const CATEGORY_RECEIVABLES: &str = "receivables";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    Income,
    Expense,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CashFlowEntry {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: EntryKind,
    /// Always positive; `kind` carries the sign.
    pub amount: Money,
    pub date: DateTime<Utc>,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sale_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expense_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub receivable_id: Option<String>,
    #[serde(default)]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: DateTime<Utc>,
}

impl CashFlowEntry {
    /// `true` when the entry was generated by another record.
    #[must_use]
    pub fn is_system(&self) -> bool {
        self.sale_id.is_some() || self.expense_id.is_some() || self.receivable_id.is_some()
    }

    /// Contribution of this entry to the balance.
    #[must_use]
    pub fn signed_amount(&self) -> Money {
        match self.kind {
            EntryKind::Income => self.amount,
            EntryKind::Expense => -self.amount,
        }
    }

    pub(crate) fn system(
        id: String,
        kind: EntryKind,
        amount: Money,
        date: DateTime<Utc>,
        description: String,
        category: &str,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            kind,
            amount,
            date,
            description,
            category: Some(category.to_string()),
            sale_id: None,
            expense_id: None,
            receivable_id: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Insert (no `id`) or merge-patch (with `id`) payload for a user entry.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CashFlowDraft {
    pub id: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<EntryKind>,
    pub amount: Option<Money>,
    pub date: Option<DateTime<Utc>>,
    pub description: Option<String>,
    pub category: Option<String>,
}

pub(crate) fn validate_entry_amount(amount: Money) -> ResultEngine<Money> {
    if !amount.is_positive() {
        return Err(EngineError::InvalidAmount("amount must be > 0".to_string()));
    }
    Ok(amount)
}

impl Collection for CashFlowEntry {
    const LABEL: &'static str = "cash_flow_entry";

    fn id(&self) -> &str {
        &self.id
    }

    fn collection(doc: &StoreDocument) -> &Vec<Self> {
        &doc.cash_flow_entries
    }

    fn collection_mut(doc: &mut StoreDocument) -> &mut Vec<Self> {
        &mut doc.cash_flow_entries
    }
}

impl Record for CashFlowEntry {
    type Draft = CashFlowDraft;

    fn draft_id(draft: &CashFlowDraft) -> Option<&str> {
        draft.id.as_deref()
    }

    fn create(id: String, draft: CashFlowDraft, now: DateTime<Utc>) -> ResultEngine<Self> {
        let kind = draft
            .kind
            .ok_or_else(|| EngineError::InvalidInput("entry type is required".to_string()))?;
        let amount = validate_entry_amount(draft.amount.unwrap_or_default())?;
        let description = normalize_required_text(
            draft.description.as_deref().unwrap_or_default(),
            "entry description",
        )?;
        Ok(Self {
            id,
            kind,
            amount,
            date: draft.date.unwrap_or(now),
            description,
            category: normalize_optional_text(draft.category.as_deref()),
            sale_id: None,
            expense_id: None,
            receivable_id: None,
            created_at: now,
            updated_at: now,
        })
    }

    fn merge(&mut self, draft: CashFlowDraft, now: DateTime<Utc>) -> ResultEngine<()> {
        if self.is_system() {
            return Err(EngineError::LockedEntry(self.id.clone()));
        }
        if let Some(kind) = draft.kind {
            self.kind = kind;
        }
        if let Some(amount) = draft.amount {
            self.amount = validate_entry_amount(amount)?;
        }
        if let Some(date) = draft.date {
            self.date = date;
        }
        if let Some(description) = draft.description.as_deref() {
            self.description = normalize_required_text(description, "entry description")?;
        }
        self.category = apply_optional_text_patch(self.category.take(), draft.category.as_deref());
        self.updated_at = now;
        Ok(())
    }
}

impl Searchable for CashFlowEntry {
    fn search_fields(&self) -> Vec<&str> {
        [Some(self.description.as_str()), self.category.as_deref()]
            .into_iter()
            .flatten()
            .collect()
    }
}
