use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::{
    CashFlowEntry, EngineError, EntryKind, Money, Product, Receivable, ReceivableStatus,
    ResultEngine, Sale, SaleDraft, SaleItem, StoreDocument,
    cash_flows::CATEGORY_SALES,
    util::{add_months, generate_id_at, normalize_optional_text, short_id},
};

use super::{Engine, require_mut};

/// Upper bound on the installments of a deferred sale.
pub const MAX_INSTALLMENTS: u32 = 48;

impl Engine {
    pub async fn sales(&self) -> Vec<Sale> {
        self.all_records().await
    }

    pub async fn sale(&self, sale_id: &str) -> Option<Sale> {
        self.find_record(sale_id).await
    }

    /// Records a sale as one unit:
    ///
    /// - decrements the stock of every sold product;
    /// - for cash/pix, appends one income entry for the total;
    /// - for credit/card, appends one pending receivable per installment, due
    ///   1..=n months after the sale;
    /// - appends the sale.
    ///
    /// The whole request is validated before anything changes: unknown
    /// products, non-positive quantities and quantities above the available
    /// stock reject the sale, as do more installments than
    /// [`MAX_INSTALLMENTS`] or than the total has cents.
    pub async fn record_sale(&self, draft: SaleDraft) -> ResultEngine<Sale> {
        self.mutate("record_sale", move |doc, now| apply_sale(doc, draft, now))
            .await
    }
}

fn apply_sale(doc: &mut StoreDocument, draft: SaleDraft, now: DateTime<Utc>) -> ResultEngine<Sale> {
    if draft.items.is_empty() {
        return Err(EngineError::InvalidInput(
            "a sale needs at least one item".to_string(),
        ));
    }
    let installments = if draft.payment_method.is_immediate() {
        1
    } else {
        draft.installments.unwrap_or(1)
    };
    if !(1..=MAX_INSTALLMENTS).contains(&installments) {
        return Err(EngineError::InvalidInput(format!(
            "installments must be between 1 and {MAX_INSTALLMENTS}"
        )));
    }

    let mut items = Vec::with_capacity(draft.items.len());
    let mut requested: BTreeMap<String, i64> = BTreeMap::new();
    for line in &draft.items {
        if line.quantity <= 0 {
            return Err(EngineError::InvalidInput(format!(
                "quantity for product {} must be > 0",
                line.product_id
            )));
        }
        let product = doc
            .products
            .iter()
            .find(|p| p.id == line.product_id)
            .ok_or_else(|| EngineError::KeyNotFound(format!("product {}", line.product_id)))?;
        let unit_price = line.unit_price.unwrap_or(product.sale_price);
        if unit_price.is_negative() {
            return Err(EngineError::InvalidAmount(
                "unit price must be >= 0".to_string(),
            ));
        }
        let line_total = unit_price
            .checked_mul(line.quantity)
            .ok_or_else(|| EngineError::InvalidAmount("line total too large".to_string()))?;
        items.push(SaleItem {
            product_id: product.id.clone(),
            product_code: product.code.clone(),
            product_name: product.name.clone(),
            quantity: line.quantity,
            unit_price,
            line_total,
        });
        *requested.entry(product.id.clone()).or_default() += line.quantity;
    }

    for (product_id, quantity) in &requested {
        let available = doc
            .products
            .iter()
            .find(|p| &p.id == product_id)
            .map(|p| (p.code.as_str(), p.quantity));
        if let Some((code, stock)) = available
            && *quantity > stock
        {
            return Err(EngineError::InsufficientStock(format!(
                "product '{code}' has {stock} in stock, requested {quantity}"
            )));
        }
    }

    let total = match draft.total {
        Some(total) => total,
        None => items.iter().map(|item| item.line_total).sum::<Money>(),
    };
    if !total.is_positive() {
        return Err(EngineError::InvalidAmount(
            "sale total must be > 0".to_string(),
        ));
    }
    if i64::from(installments) > total.cents() {
        return Err(EngineError::InvalidInput(format!(
            "{installments} installments would leave some of them at zero for a total of {total}"
        )));
    }

    for (product_id, quantity) in &requested {
        require_mut::<Product>(doc, product_id)?.apply_stock_delta(-quantity, now)?;
    }

    let sale = Sale {
        id: generate_id_at(now),
        client_id: normalize_optional_text(draft.client_id.as_deref()),
        items,
        total,
        payment_method: draft.payment_method,
        installments,
        notes: normalize_optional_text(draft.notes.as_deref()),
        created_at: now,
    };
    let reference = short_id(&sale.id).to_string();

    if sale.payment_method.is_immediate() {
        let mut entry = CashFlowEntry::system(
            generate_id_at(now),
            EntryKind::Income,
            sale.total,
            sale.created_at,
            format!("Sale #{reference}"),
            CATEGORY_SALES,
            now,
        );
        entry.sale_id = Some(sale.id.clone());
        doc.cash_flow_entries.push(entry);
    } else {
        for (index, amount) in sale.total.split(installments).into_iter().enumerate() {
            let number = index as u32 + 1;
            doc.receivables.push(Receivable {
                id: generate_id_at(now),
                client_id: sale.client_id.clone(),
                sale_id: Some(sale.id.clone()),
                description: format!("Installment {number}/{installments} - Sale #{reference}"),
                amount,
                due_date: add_months(sale.created_at, number)?,
                status: ReceivableStatus::Pending,
                paid_at: None,
                created_at: now,
                updated_at: now,
            });
        }
    }

    doc.sales.push(sale.clone());
    Ok(sale)
}
