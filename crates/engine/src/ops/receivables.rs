use crate::{
    CashFlowEntry, EngineError, EntryKind, Receivable, ReceivableDraft, ReceivableStatus,
    ResultEngine, cash_flows::CATEGORY_RECEIVABLES, util::generate_id_at,
};

use super::{Engine, require_mut};

impl Engine {
    pub async fn receivables(&self) -> Vec<Receivable> {
        self.all_records().await
    }

    pub async fn receivable(&self, receivable_id: &str) -> Option<Receivable> {
        self.find_record(receivable_id).await
    }

    /// Creates a manual receivable or patches a pending one.
    pub async fn save_receivable(&self, draft: ReceivableDraft) -> ResultEngine<Receivable> {
        self.save_record("save_receivable", draft).await
    }

    /// Deletes a receivable. The income entry of a paid receivable is kept.
    pub async fn delete_receivable(&self, receivable_id: &str) -> ResultEngine<()> {
        self.delete_record::<Receivable>("delete_receivable", receivable_id)
            .await
    }

    /// Marks a pending receivable as paid and books its amount as income.
    ///
    /// The transition is one-way: a second call fails with `AlreadyPaid` and
    /// books nothing.
    pub async fn mark_receivable_paid(&self, receivable_id: &str) -> ResultEngine<Receivable> {
        self.mutate("mark_receivable_paid", |doc, now| {
            let receivable = require_mut::<Receivable>(doc, receivable_id)?;
            if !receivable.is_pending() {
                return Err(EngineError::AlreadyPaid(receivable.id.clone()));
            }
            receivable.status = ReceivableStatus::Paid;
            receivable.paid_at = Some(now);
            receivable.updated_at = now;
            let paid = receivable.clone();

            let mut entry = CashFlowEntry::system(
                generate_id_at(now),
                EntryKind::Income,
                paid.amount,
                now,
                format!("Payment received - {}", paid.description),
                CATEGORY_RECEIVABLES,
                now,
            );
            entry.receivable_id = Some(paid.id.clone());
            doc.cash_flow_entries.push(entry);
            Ok(paid)
        })
        .await
    }

    /// Pending receivables due strictly before today (engine clock).
    pub async fn overdue_receivable_list(&self) -> Vec<Receivable> {
        let today = self.now().date_naive();
        self.receivables()
            .await
            .into_iter()
            .filter(|receivable| receivable.is_overdue(today))
            .collect()
    }
}
