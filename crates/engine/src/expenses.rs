//! The module contains the `Expense` record.
//!
//! Every expense owns exactly one paired cash-flow entry (`expenseId`
//! back-reference); see [`Engine::record_expense`](crate::Engine::record_expense).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    EngineError, Money, ResultEngine, StoreDocument,
    cash_flows::validate_entry_amount,
    ops::{Collection, Record},
    search::Searchable,
    util::{apply_optional_text_patch, normalize_optional_text, normalize_required_text},
};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Expense {
    pub id: String,
    pub description: String,
    pub amount: Money,
    pub date: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// Copied into the next month by `create_recurring_expenses`.
    #[serde(default)]
    pub recurring: bool,
    #[serde(default)]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExpenseDraft {
    pub id: Option<String>,
    pub description: Option<String>,
    pub amount: Option<Money>,
    pub date: Option<DateTime<Utc>>,
    pub category: Option<String>,
    pub notes: Option<String>,
    pub recurring: Option<bool>,
}

impl ExpenseDraft {
    pub fn new(description: impl Into<String>, amount: Money) -> Self {
        Self {
            description: Some(description.into()),
            amount: Some(amount),
            ..Default::default()
        }
    }

    /// Patch payload for an existing expense.
    pub fn update(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            ..Default::default()
        }
    }
}

impl Collection for Expense {
    const LABEL: &'static str = "expense";

    fn id(&self) -> &str {
        &self.id
    }

    fn collection(doc: &StoreDocument) -> &Vec<Self> {
        &doc.expenses
    }

    fn collection_mut(doc: &mut StoreDocument) -> &mut Vec<Self> {
        &mut doc.expenses
    }
}

impl Record for Expense {
    type Draft = ExpenseDraft;

    fn draft_id(draft: &ExpenseDraft) -> Option<&str> {
        draft.id.as_deref()
    }

    fn create(id: String, draft: ExpenseDraft, now: DateTime<Utc>) -> ResultEngine<Self> {
        let description = normalize_required_text(
            draft.description.as_deref().unwrap_or_default(),
            "expense description",
        )?;
        let amount = draft
            .amount
            .ok_or_else(|| EngineError::InvalidAmount("expense amount is required".to_string()))
            .and_then(validate_entry_amount)?;
        Ok(Self {
            id,
            description,
            amount,
            date: draft.date.unwrap_or(now),
            category: normalize_optional_text(draft.category.as_deref()),
            notes: normalize_optional_text(draft.notes.as_deref()),
            recurring: draft.recurring.unwrap_or(false),
            created_at: now,
            updated_at: now,
        })
    }

    fn merge(&mut self, draft: ExpenseDraft, now: DateTime<Utc>) -> ResultEngine<()> {
        if let Some(description) = draft.description.as_deref() {
            self.description = normalize_required_text(description, "expense description")?;
        }
        if let Some(amount) = draft.amount {
            self.amount = validate_entry_amount(amount)?;
        }
        if let Some(date) = draft.date {
            self.date = date;
        }
        if let Some(recurring) = draft.recurring {
            self.recurring = recurring;
        }
        self.category = apply_optional_text_patch(self.category.take(), draft.category.as_deref());
        self.notes = apply_optional_text_patch(self.notes.take(), draft.notes.as_deref());
        self.updated_at = now;
        Ok(())
    }
}

impl Searchable for Expense {
    fn search_fields(&self) -> Vec<&str> {
        [
            Some(self.description.as_str()),
            self.category.as_deref(),
            self.notes.as_deref(),
        ]
        .into_iter()
        .flatten()
        .collect()
    }
}
