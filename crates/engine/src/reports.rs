//! Period-filtered summaries over a document snapshot.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::{Money, PaymentMethod, StockStatus, StoreDocument, search::fold};

/// Inclusive range of calendar days (UTC). Open ends are unbounded.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Period {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl Period {
    /// Every day.
    pub const ALL: Period = Period {
        start: None,
        end: None,
    };

    pub fn new(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        Self { start, end }
    }

    pub fn between(start: NaiveDate, end: NaiveDate) -> Self {
        Self::new(Some(start), Some(end))
    }

    #[must_use]
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        let day = at.date_naive();
        self.start.is_none_or(|start| day >= start) && self.end.is_none_or(|end| day <= end)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SalesReport {
    pub count: usize,
    pub revenue: Money,
    pub average_ticket: Money,
    pub by_payment_method: BTreeMap<PaymentMethod, Money>,
    pub by_day: BTreeMap<NaiveDate, Money>,
}

pub fn sales_report(doc: &StoreDocument, period: Period) -> SalesReport {
    let mut report = SalesReport::default();
    for sale in doc.sales.iter().filter(|sale| period.contains(sale.created_at)) {
        report.count += 1;
        report.revenue += sale.total;
        *report
            .by_payment_method
            .entry(sale.payment_method)
            .or_default() += sale.total;
        *report
            .by_day
            .entry(sale.created_at.date_naive())
            .or_default() += sale.total;
    }
    if report.count > 0 {
        report.average_ticket = Money::new(report.revenue.cents() / report.count as i64);
    }
    report
}

/// Status filter for [`receivables_report`]. `Overdue` selects pending
/// receivables due before `today`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReceivableStatusFilter {
    Pending,
    Paid,
    Overdue,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReceivablesFilter {
    pub client_id: Option<String>,
    pub status: Option<ReceivableStatusFilter>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceivablesReport {
    pub count: usize,
    pub total: Money,
    pub pending: Money,
    pub paid: Money,
    pub overdue: Money,
    pub overdue_count: usize,
}

/// Receivables whose due day falls in `period` and which pass `filter`.
pub fn receivables_report(
    doc: &StoreDocument,
    period: Period,
    filter: &ReceivablesFilter,
    today: NaiveDate,
) -> ReceivablesReport {
    let mut report = ReceivablesReport::default();
    let selected = doc.receivables.iter().filter(|receivable| {
        period.contains(receivable.due_date)
            && filter
                .client_id
                .as_deref()
                .is_none_or(|client| receivable.client_id.as_deref() == Some(client))
            && filter.status.is_none_or(|status| match status {
                ReceivableStatusFilter::Pending => receivable.is_pending(),
                ReceivableStatusFilter::Paid => !receivable.is_pending(),
                ReceivableStatusFilter::Overdue => receivable.is_overdue(today),
            })
    });
    for receivable in selected {
        report.count += 1;
        report.total += receivable.amount;
        if receivable.is_pending() {
            report.pending += receivable.amount;
        } else {
            report.paid += receivable.amount;
        }
        if receivable.is_overdue(today) {
            report.overdue += receivable.amount;
            report.overdue_count += 1;
        }
    }
    report
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfitabilityReport {
    pub revenue: Money,
    pub cost: Money,
    pub gross_profit: Money,
    /// Gross profit as a percentage of revenue.
    pub margin_percent: f64,
}

/// Revenue against the current cost price of the sold units. Lines of
/// products that no longer exist count at zero cost.
pub fn profitability_report(doc: &StoreDocument, period: Period) -> ProfitabilityReport {
    let cost_prices: HashMap<&str, Money> = doc
        .products
        .iter()
        .map(|product| (product.id.as_str(), product.cost_price))
        .collect();

    let mut report = ProfitabilityReport::default();
    for sale in doc.sales.iter().filter(|sale| period.contains(sale.created_at)) {
        report.revenue += sale.total;
        for item in &sale.items {
            let unit_cost = cost_prices
                .get(item.product_id.as_str())
                .copied()
                .unwrap_or_default();
            report.cost += unit_cost * item.quantity;
        }
    }
    report.gross_profit = report.revenue - report.cost;
    report.margin_percent = report.gross_profit.percent_of(report.revenue);
    report
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductSales {
    pub product_id: String,
    pub product_code: String,
    pub product_name: String,
    pub quantity: i64,
    pub revenue: Money,
    /// Number of sales containing the product.
    pub sales: usize,
}

/// Products sold in `period`, best sellers (by units) first.
pub fn product_ranking(doc: &StoreDocument, period: Period) -> Vec<ProductSales> {
    let mut by_product: HashMap<&str, ProductSales> = HashMap::new();
    for sale in doc.sales.iter().filter(|sale| period.contains(sale.created_at)) {
        let mut counted: Vec<&str> = Vec::new();
        for item in &sale.items {
            let row = by_product
                .entry(item.product_id.as_str())
                .or_insert_with(|| ProductSales {
                    product_id: item.product_id.clone(),
                    product_code: item.product_code.clone(),
                    product_name: item.product_name.clone(),
                    quantity: 0,
                    revenue: Money::ZERO,
                    sales: 0,
                });
            row.quantity += item.quantity;
            row.revenue += item.line_total;
            if !counted.contains(&item.product_id.as_str()) {
                row.sales += 1;
                counted.push(item.product_id.as_str());
            }
        }
    }
    let mut ranking: Vec<ProductSales> = by_product.into_values().collect();
    ranking.sort_by(|a, b| {
        b.quantity
            .cmp(&a.quantity)
            .then_with(|| b.revenue.cmp(&a.revenue))
            .then_with(|| a.product_code.cmp(&b.product_code))
    });
    ranking
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InventoryFilter {
    /// Matched case- and accent-insensitively.
    pub category: Option<String>,
    pub status: Option<StockStatus>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryReport {
    pub products: usize,
    pub units: i64,
    pub value_at_sale_price: Money,
    pub value_at_cost: Money,
    pub out_of_stock: usize,
    pub low_stock: usize,
}

/// Current stock snapshot. Negative quantities contribute no value.
pub fn inventory_report(doc: &StoreDocument, filter: &InventoryFilter) -> InventoryReport {
    let threshold = doc.settings.low_stock_threshold;
    let category = filter.category.as_deref().map(fold);
    let mut report = InventoryReport::default();
    let selected = doc.products.iter().filter(|product| {
        category.as_deref().is_none_or(|wanted| {
            product
                .category
                .as_deref()
                .is_some_and(|actual| fold(actual) == wanted)
        }) && filter
            .status
            .is_none_or(|status| product.stock_status(threshold) == status)
    });
    for product in selected {
        let units = product.quantity.max(0);
        report.products += 1;
        report.units += units;
        report.value_at_sale_price += product.sale_price * units;
        report.value_at_cost += product.cost_price * units;
        match product.stock_status(threshold) {
            StockStatus::Out => report.out_of_stock += 1,
            StockStatus::Low => report.low_stock += 1,
            StockStatus::Available => {}
        }
    }
    report
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CashFlowReport {
    pub count: usize,
    pub income: Money,
    pub expense: Money,
    pub net: Money,
}

pub fn cash_flow_report(doc: &StoreDocument, period: Period) -> CashFlowReport {
    let mut report = CashFlowReport::default();
    for entry in doc
        .cash_flow_entries
        .iter()
        .filter(|entry| period.contains(entry.date))
    {
        report.count += 1;
        match entry.kind {
            crate::EntryKind::Income => report.income += entry.amount,
            crate::EntryKind::Expense => report.expense += entry.amount,
        }
    }
    report.net = report.income - report.expense;
    report
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::{Sale, SaleItem};

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn sale(id: &str, created_at: DateTime<Utc>, method: PaymentMethod, lines: &[(&str, i64, i64)]) -> Sale {
        let items: Vec<SaleItem> = lines
            .iter()
            .map(|(product, quantity, price)| SaleItem {
                product_id: product.to_string(),
                product_code: product.to_uppercase(),
                product_name: product.to_string(),
                quantity: *quantity,
                unit_price: Money::new(*price),
                line_total: Money::new(price * quantity),
            })
            .collect();
        Sale {
            id: id.to_string(),
            client_id: None,
            total: items.iter().map(|item| item.line_total).sum(),
            items,
            payment_method: method,
            installments: 1,
            notes: None,
            created_at,
        }
    }

    #[test]
    fn period_bounds_are_inclusive_days() {
        let period = Period::between(day(2024, 5, 1), day(2024, 5, 31));
        assert!(period.contains(Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap()));
        assert!(period.contains(Utc.with_ymd_and_hms(2024, 5, 31, 23, 59, 59).unwrap()));
        assert!(!period.contains(Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap()));
        assert!(Period::ALL.contains(Utc.with_ymd_and_hms(1999, 1, 1, 0, 0, 0).unwrap()));
    }

    #[test]
    fn sales_report_groups_by_method_and_day() {
        let now = Utc.with_ymd_and_hms(2024, 5, 15, 10, 0, 0).unwrap();
        let mut doc = StoreDocument::new(now);
        doc.sales.push(sale("s1", now, PaymentMethod::Cash, &[("p1", 2, 1_000)]));
        doc.sales.push(sale("s2", now, PaymentMethod::Credit, &[("p2", 1, 3_000)]));
        doc.sales.push(sale(
            "s3",
            Utc.with_ymd_and_hms(2024, 4, 1, 10, 0, 0).unwrap(),
            PaymentMethod::Cash,
            &[("p1", 1, 1_000)],
        ));

        let report = sales_report(&doc, Period::between(day(2024, 5, 1), day(2024, 5, 31)));
        assert_eq!(report.count, 2);
        assert_eq!(report.revenue, Money::new(5_000));
        assert_eq!(report.average_ticket, Money::new(2_500));
        assert_eq!(report.by_payment_method[&PaymentMethod::Cash], Money::new(2_000));
        assert_eq!(report.by_day[&day(2024, 5, 15)], Money::new(5_000));
    }

    #[test]
    fn ranking_orders_by_units_sold() {
        let now = Utc.with_ymd_and_hms(2024, 5, 15, 10, 0, 0).unwrap();
        let mut doc = StoreDocument::new(now);
        doc.sales.push(sale("s1", now, PaymentMethod::Cash, &[("p1", 1, 1_000), ("p2", 3, 500)]));
        doc.sales.push(sale("s2", now, PaymentMethod::Pix, &[("p1", 1, 1_000)]));

        let ranking = product_ranking(&doc, Period::ALL);
        assert_eq!(ranking[0].product_id, "p2");
        assert_eq!(ranking[0].quantity, 3);
        assert_eq!(ranking[1].sales, 2);
        assert_eq!(ranking[1].revenue, Money::new(2_000));
    }
}
