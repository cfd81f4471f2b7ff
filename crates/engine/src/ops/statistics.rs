use chrono::{DateTime, Utc};

use crate::{Money, Product, Statistics, statistics};

use super::Engine;

impl Engine {
    /// Dashboard figures at the engine clock's "now".
    pub async fn statistics(&self) -> Statistics {
        self.statistics_at(self.now()).await
    }

    pub async fn statistics_at(&self, now: DateTime<Utc>) -> Statistics {
        Statistics::compute(&self.load().await, now)
    }

    pub async fn current_balance(&self) -> Money {
        statistics::current_balance(&self.load().await)
    }

    pub async fn monthly_revenue(&self) -> Money {
        statistics::monthly_revenue(&self.load().await, self.now())
    }

    pub async fn monthly_expenses(&self) -> Money {
        statistics::monthly_expenses(&self.load().await, self.now())
    }

    pub async fn total_receivables(&self) -> Money {
        statistics::total_receivables(&self.load().await)
    }

    pub async fn overdue_receivables_count(&self) -> usize {
        statistics::overdue_receivables(&self.load().await, self.now())
    }

    pub async fn low_stock_products_count(&self) -> usize {
        statistics::low_stock_products(&self.load().await)
    }

    /// Products with `0 < quantity <= lowStockThreshold`.
    pub async fn low_stock_products(&self) -> Vec<Product> {
        let doc = self.load().await;
        let threshold = doc.settings.low_stock_threshold;
        doc.products
            .into_iter()
            .filter(|product| product.quantity > 0 && product.quantity <= threshold)
            .collect()
    }
}
