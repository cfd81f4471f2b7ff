//! Derived figures computed from a document snapshot.
//!
//! Nothing here is stored: every figure is folded from the collections on each
//! call. "Monthly" means the calendar month and year of `now` in UTC.

use chrono::{DateTime, Datelike, Utc};
use serde::Serialize;

use crate::{Money, StoreDocument};

/// Dashboard snapshot.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Statistics {
    pub current_balance: Money,
    pub monthly_revenue: Money,
    pub monthly_expenses: Money,
    pub total_receivables: Money,
    pub overdue_receivables: usize,
    pub low_stock_products: usize,
    pub total_clients: usize,
    pub total_products: usize,
    pub total_sales: usize,
}

impl Statistics {
    pub fn compute(doc: &StoreDocument, now: DateTime<Utc>) -> Self {
        Self {
            current_balance: current_balance(doc),
            monthly_revenue: monthly_revenue(doc, now),
            monthly_expenses: monthly_expenses(doc, now),
            total_receivables: total_receivables(doc),
            overdue_receivables: overdue_receivables(doc, now),
            low_stock_products: low_stock_products(doc),
            total_clients: doc.clients.len(),
            total_products: doc.products.len(),
            total_sales: doc.sales.len(),
        }
    }
}

fn same_month(at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    at.year() == now.year() && at.month() == now.month()
}

/// Income minus expense over every cash-flow entry.
pub fn current_balance(doc: &StoreDocument) -> Money {
    doc.cash_flow_entries
        .iter()
        .map(|entry| entry.signed_amount())
        .sum()
}

/// Sum of the totals of sales created in the current month.
pub fn monthly_revenue(doc: &StoreDocument, now: DateTime<Utc>) -> Money {
    doc.sales
        .iter()
        .filter(|sale| same_month(sale.created_at, now))
        .map(|sale| sale.total)
        .sum()
}

/// Sum of the amounts of expenses dated in the current month.
pub fn monthly_expenses(doc: &StoreDocument, now: DateTime<Utc>) -> Money {
    doc.expenses
        .iter()
        .filter(|expense| same_month(expense.date, now))
        .map(|expense| expense.amount)
        .sum()
}

/// Outstanding amount over pending receivables.
pub fn total_receivables(doc: &StoreDocument) -> Money {
    doc.receivables
        .iter()
        .filter(|receivable| receivable.is_pending())
        .map(|receivable| receivable.amount)
        .sum()
}

pub fn overdue_receivables(doc: &StoreDocument, now: DateTime<Utc>) -> usize {
    let today = now.date_naive();
    doc.receivables
        .iter()
        .filter(|receivable| receivable.is_overdue(today))
        .count()
}

/// Products with `0 < quantity <= lowStockThreshold`. Out-of-stock products
/// are not counted.
pub fn low_stock_products(doc: &StoreDocument) -> usize {
    let threshold = doc.settings.low_stock_threshold;
    doc.products
        .iter()
        .filter(|product| product.quantity > 0 && product.quantity <= threshold)
        .count()
}
