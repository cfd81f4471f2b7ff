//! The module contains the `Receivable` record.
//!
//! A receivable moves from `Pending` to `Paid` exactly once, through
//! [`Engine::mark_receivable_paid`](crate::Engine::mark_receivable_paid).
//! Overdue is derived from the due date and never stored.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    EngineError, Money, ResultEngine, StoreDocument,
    cash_flows::validate_entry_amount,
    ops::{Collection, Record},
    search::Searchable,
    util::{apply_optional_text_patch, normalize_optional_text, normalize_required_text},
};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReceivableStatus {
    #[default]
    Pending,
    Paid,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Receivable {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sale_id: Option<String>,
    #[serde(default)]
    pub description: String,
    pub amount: Money,
    pub due_date: DateTime<Utc>,
    #[serde(default)]
    pub status: ReceivableStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paid_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: DateTime<Utc>,
}

impl Receivable {
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.status == ReceivableStatus::Pending
    }

    /// Pending and due on a day strictly before `today`.
    #[must_use]
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        self.is_pending() && self.due_date.date_naive() < today
    }
}

/// Insert (no `id`) or merge-patch (with `id`) payload for a manual
/// receivable. Status is not patchable.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReceivableDraft {
    pub id: Option<String>,
    pub client_id: Option<String>,
    pub description: Option<String>,
    pub amount: Option<Money>,
    pub due_date: Option<DateTime<Utc>>,
}

impl Collection for Receivable {
    const LABEL: &'static str = "receivable";

    fn id(&self) -> &str {
        &self.id
    }

    fn collection(doc: &StoreDocument) -> &Vec<Self> {
        &doc.receivables
    }

    fn collection_mut(doc: &mut StoreDocument) -> &mut Vec<Self> {
        &mut doc.receivables
    }
}

impl Record for Receivable {
    type Draft = ReceivableDraft;

    fn draft_id(draft: &ReceivableDraft) -> Option<&str> {
        draft.id.as_deref()
    }

    fn create(id: String, draft: ReceivableDraft, now: DateTime<Utc>) -> ResultEngine<Self> {
        let description = normalize_required_text(
            draft.description.as_deref().unwrap_or_default(),
            "receivable description",
        )?;
        let amount = draft
            .amount
            .ok_or_else(|| EngineError::InvalidAmount("receivable amount is required".to_string()))
            .and_then(validate_entry_amount)?;
        let due_date = draft
            .due_date
            .ok_or_else(|| EngineError::InvalidInput("due date is required".to_string()))?;
        Ok(Self {
            id,
            client_id: normalize_optional_text(draft.client_id.as_deref()),
            sale_id: None,
            description,
            amount,
            due_date,
            status: ReceivableStatus::Pending,
            paid_at: None,
            created_at: now,
            updated_at: now,
        })
    }

    fn merge(&mut self, draft: ReceivableDraft, now: DateTime<Utc>) -> ResultEngine<()> {
        if !self.is_pending() {
            return Err(EngineError::AlreadyPaid(self.id.clone()));
        }
        if let Some(description) = draft.description.as_deref() {
            self.description = normalize_required_text(description, "receivable description")?;
        }
        if let Some(amount) = draft.amount {
            self.amount = validate_entry_amount(amount)?;
        }
        if let Some(due_date) = draft.due_date {
            self.due_date = due_date;
        }
        self.client_id = apply_optional_text_patch(self.client_id.take(), draft.client_id.as_deref());
        self.updated_at = now;
        Ok(())
    }
}

impl Searchable for Receivable {
    fn search_fields(&self) -> Vec<&str> {
        vec![self.description.as_str()]
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn overdue_is_strictly_before_today() {
        let today = NaiveDate::from_ymd_opt(2024, 5, 15).unwrap();
        let mut receivable = Receivable::create(
            "r1".to_string(),
            ReceivableDraft {
                description: Some("Installment".to_string()),
                amount: Some(Money::new(100)),
                due_date: Some(Utc.with_ymd_and_hms(2024, 5, 15, 23, 0, 0).unwrap()),
                ..Default::default()
            },
            Utc::now(),
        )
        .unwrap();
        assert!(!receivable.is_overdue(today));

        receivable.due_date = Utc.with_ymd_and_hms(2024, 5, 14, 23, 59, 59).unwrap();
        assert!(receivable.is_overdue(today));

        receivable.status = ReceivableStatus::Paid;
        assert!(!receivable.is_overdue(today));
    }
}
