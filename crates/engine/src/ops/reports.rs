use crate::reports::{
    self, CashFlowReport, InventoryFilter, InventoryReport, Period, ProductSales,
    ProfitabilityReport, ReceivablesFilter, ReceivablesReport, SalesReport,
};

use super::Engine;

impl Engine {
    pub async fn sales_report(&self, period: Period) -> SalesReport {
        reports::sales_report(&self.load().await, period)
    }

    /// Overdue is judged against the engine clock's current day.
    pub async fn receivables_report(
        &self,
        period: Period,
        filter: &ReceivablesFilter,
    ) -> ReceivablesReport {
        let today = self.now().date_naive();
        reports::receivables_report(&self.load().await, period, filter, today)
    }

    pub async fn profitability_report(&self, period: Period) -> ProfitabilityReport {
        reports::profitability_report(&self.load().await, period)
    }

    pub async fn product_ranking(&self, period: Period) -> Vec<ProductSales> {
        reports::product_ranking(&self.load().await, period)
    }

    pub async fn inventory_report(&self, filter: &InventoryFilter) -> InventoryReport {
        reports::inventory_report(&self.load().await, filter)
    }

    pub async fn cash_flow_report(&self, period: Period) -> CashFlowReport {
        reports::cash_flow_report(&self.load().await, period)
    }
}
