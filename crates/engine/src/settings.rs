//! Store-level configuration singleton.

use serde::{Deserialize, Serialize};

use crate::{Currency, EngineError, ResultEngine, util::apply_optional_text_patch};

pub const DEFAULT_LOW_STOCK_THRESHOLD: i64 = 5;

/// Settings kept inside the store document.
///
/// Missing fields deserialize to their defaults, so a partial stored record is
/// always merged over [`Settings::default`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub store_name: String,
    pub owner_name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    #[serde(alias = "lowStockAlert")]
    pub low_stock_threshold: i64,
    /// Monthly interest in percent, informational.
    pub default_interest_rate: f64,
    pub currency: Currency,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            store_name: "Flor de Maria".to_string(),
            owner_name: "Maria".to_string(),
            phone: None,
            email: None,
            address: None,
            low_stock_threshold: DEFAULT_LOW_STOCK_THRESHOLD,
            default_interest_rate: 0.0,
            currency: Currency::default(),
        }
    }
}

/// Shallow patch: every present field replaces the stored one.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SettingsPatch {
    pub store_name: Option<String>,
    pub owner_name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    #[serde(alias = "lowStockAlert")]
    pub low_stock_threshold: Option<i64>,
    pub default_interest_rate: Option<f64>,
    pub currency: Option<Currency>,
}

impl Settings {
    pub(crate) fn apply(&mut self, patch: SettingsPatch) -> ResultEngine<()> {
        if let Some(threshold) = patch.low_stock_threshold {
            if threshold < 0 {
                return Err(EngineError::InvalidInput(
                    "low stock threshold must be >= 0".to_string(),
                ));
            }
            self.low_stock_threshold = threshold;
        }
        if let Some(rate) = patch.default_interest_rate {
            if !rate.is_finite() || rate < 0.0 {
                return Err(EngineError::InvalidInput(
                    "interest rate must be a non-negative number".to_string(),
                ));
            }
            self.default_interest_rate = rate;
        }
        if let Some(store_name) = patch.store_name {
            self.store_name = store_name.trim().to_string();
        }
        if let Some(owner_name) = patch.owner_name {
            self.owner_name = owner_name.trim().to_string();
        }
        if let Some(currency) = patch.currency {
            self.currency = currency;
        }
        self.phone = apply_optional_text_patch(self.phone.take(), patch.phone.as_deref());
        self.email = apply_optional_text_patch(self.email.take(), patch.email.as_deref());
        self.address = apply_optional_text_patch(self.address.take(), patch.address.as_deref());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_record_merges_over_defaults() {
        let settings: Settings =
            serde_json::from_str(r#"{"storeName":"Loja","lowStockAlert":3}"#).unwrap();
        assert_eq!(settings.store_name, "Loja");
        assert_eq!(settings.low_stock_threshold, 3);
        assert_eq!(settings.owner_name, "Maria");
        assert_eq!(settings.currency, Currency::Brl);
    }

    #[test]
    fn patch_rejects_negative_threshold() {
        let mut settings = Settings::default();
        let patch = SettingsPatch {
            low_stock_threshold: Some(-1),
            ..Default::default()
        };
        assert!(settings.apply(patch).is_err());
        assert_eq!(settings.low_stock_threshold, DEFAULT_LOW_STOCK_THRESHOLD);
    }
}
