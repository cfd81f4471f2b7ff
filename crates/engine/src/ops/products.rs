use crate::{Product, ProductDraft, ResultEngine, search::search};

use super::{Engine, require_mut};

impl Engine {
    pub async fn products(&self) -> Vec<Product> {
        self.all_records().await
    }

    pub async fn product(&self, product_id: &str) -> Option<Product> {
        self.find_record(product_id).await
    }

    /// Creates a product with its opening stock, or merge-patches an existing
    /// one. Stock of an existing product changes only via [`Engine::adjust_stock`].
    pub async fn save_product(&self, draft: ProductDraft) -> ResultEngine<Product> {
        self.save_record("save_product", draft).await
    }

    pub async fn delete_product(&self, product_id: &str) -> ResultEngine<()> {
        self.delete_record::<Product>("delete_product", product_id)
            .await
    }

    /// Applies a signed delta to the product stock.
    ///
    /// Fails with `InsufficientStock` when the result would be negative and
    /// with `KeyNotFound` for an unknown product.
    pub async fn adjust_stock(&self, product_id: &str, delta: i64) -> ResultEngine<Product> {
        self.mutate("adjust_stock", |doc, now| {
            let product = require_mut::<Product>(doc, product_id)?;
            product.apply_stock_delta(delta, now)?;
            Ok(product.clone())
        })
        .await
    }

    pub async fn search_products(&self, term: &str) -> Vec<Product> {
        let products = self.products().await;
        search(&products, term).into_iter().cloned().collect()
    }
}
