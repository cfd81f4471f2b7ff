use crate::{CashFlowDraft, CashFlowEntry, EngineError, ResultEngine, search::search};

use super::{Engine, remove};

impl Engine {
    pub async fn cash_flow_entries(&self) -> Vec<CashFlowEntry> {
        self.all_records().await
    }

    pub async fn cash_flow_entry(&self, entry_id: &str) -> Option<CashFlowEntry> {
        self.find_record(entry_id).await
    }

    /// Creates or merge-patches a user entry.
    ///
    /// Entries generated by a sale, an expense or a paid receivable are
    /// locked and fail with `LockedEntry`.
    pub async fn save_cash_flow_entry(&self, draft: CashFlowDraft) -> ResultEngine<CashFlowEntry> {
        self.save_record("save_cash_flow_entry", draft).await
    }

    /// Deletes a user entry. Absent ids succeed; locked entries fail with
    /// `LockedEntry` and must be removed through their owning record.
    pub async fn delete_cash_flow_entry(&self, entry_id: &str) -> ResultEngine<()> {
        self.mutate("delete_cash_flow_entry", |doc, _| {
            if let Some(entry) = doc.cash_flow_entries.iter().find(|e| e.id == entry_id)
                && entry.is_system()
            {
                return Err(EngineError::LockedEntry(entry.id.clone()));
            }
            remove::<CashFlowEntry>(doc, entry_id);
            Ok(())
        })
        .await
    }

    pub async fn search_cash_flow_entries(&self, term: &str) -> Vec<CashFlowEntry> {
        let entries = self.cash_flow_entries().await;
        search(&entries, term).into_iter().cloned().collect()
    }
}
