use chrono::{DateTime, Utc};

use crate::{
    CashFlowEntry, EntryKind, Expense, ExpenseDraft, ResultEngine, StoreDocument,
    cash_flows::CATEGORY_EXPENSES, search::search, util::generate_id_at,
};

use super::{Engine, remove, upsert};

const RECURRING_NOTE: &str = "(recurring)";

impl Engine {
    pub async fn expenses(&self) -> Vec<Expense> {
        self.all_records().await
    }

    pub async fn expense(&self, expense_id: &str) -> Option<Expense> {
        self.find_record(expense_id).await
    }

    /// Creates or updates an expense together with its paired cash-flow entry.
    ///
    /// On insert one expense entry is appended; on update the paired entry's
    /// description, amount and date follow the expense (and the entry is
    /// recreated if it had gone missing).
    pub async fn record_expense(&self, draft: ExpenseDraft) -> ResultEngine<Expense> {
        self.mutate("record_expense", move |doc, now| {
            let expense = upsert::<Expense>(doc, draft, now)?;
            sync_paired_entry(doc, &expense, now);
            Ok(expense)
        })
        .await
    }

    /// Removes the expense and every entry referencing it. Absent ids succeed.
    pub async fn delete_expense(&self, expense_id: &str) -> ResultEngine<()> {
        self.mutate("delete_expense", |doc, _| {
            remove::<Expense>(doc, expense_id);
            doc.cash_flow_entries
                .retain(|entry| entry.expense_id.as_deref() != Some(expense_id));
            Ok(())
        })
        .await
    }

    /// Copies every recurring expense into a new expense dated `target_date`,
    /// each with its paired entry. The copies are not recurring themselves.
    pub async fn create_recurring_expenses(
        &self,
        target_date: DateTime<Utc>,
    ) -> ResultEngine<Vec<Expense>> {
        self.mutate("create_recurring_expenses", move |doc, now| {
            let templates: Vec<Expense> = doc
                .expenses
                .iter()
                .filter(|expense| expense.recurring)
                .cloned()
                .collect();
            let mut created = Vec::with_capacity(templates.len());
            for template in templates {
                let notes = match template.notes.as_deref() {
                    Some(notes) => format!("{notes} {RECURRING_NOTE}"),
                    None => RECURRING_NOTE.to_string(),
                };
                let expense = Expense {
                    id: generate_id_at(now),
                    date: target_date,
                    notes: Some(notes),
                    recurring: false,
                    created_at: now,
                    updated_at: now,
                    ..template
                };
                doc.expenses.push(expense.clone());
                sync_paired_entry(doc, &expense, now);
                created.push(expense);
            }
            tracing::debug!("created {} recurring expenses", created.len());
            Ok(created)
        })
        .await
    }

    pub async fn search_expenses(&self, term: &str) -> Vec<Expense> {
        let expenses = self.expenses().await;
        search(&expenses, term).into_iter().cloned().collect()
    }
}

fn sync_paired_entry(doc: &mut StoreDocument, expense: &Expense, now: DateTime<Utc>) {
    let is_paired = |entry: &CashFlowEntry| entry.expense_id.as_deref() == Some(expense.id.as_str());

    if !doc.cash_flow_entries.iter().any(is_paired) {
        let mut entry = CashFlowEntry::system(
            generate_id_at(now),
            EntryKind::Expense,
            expense.amount,
            expense.date,
            expense.description.clone(),
            CATEGORY_EXPENSES,
            now,
        );
        entry.expense_id = Some(expense.id.clone());
        doc.cash_flow_entries.push(entry);
        return;
    }

    for entry in doc.cash_flow_entries.iter_mut().filter(|entry| is_paired(entry)) {
        entry.description = expense.description.clone();
        entry.amount = expense.amount;
        entry.date = expense.date;
        entry.updated_at = now;
    }
}
