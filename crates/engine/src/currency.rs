use serde::{Deserialize, Serialize};

use crate::{EngineError, Money};

/// ISO currency code shown by the store.
///
/// The engine stores monetary values as an `i64` number of **minor units** (see
/// `Money`); the currency only drives formatting.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    #[default]
    Brl,
    Eur,
    Usd,
}

impl Currency {
    /// Canonical currency code.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Currency::Brl => "BRL",
            Currency::Eur => "EUR",
            Currency::Usd => "USD",
        }
    }

    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Currency::Brl => "R$",
            Currency::Eur => "€",
            Currency::Usd => "$",
        }
    }

    /// Number of fraction digits used when formatting/parsing amounts.
    #[must_use]
    pub const fn minor_units(self) -> u8 {
        2
    }

    /// Formats an amount the way the store displays it, e.g. `R$ 1.234,50`.
    #[must_use]
    pub fn format(self, amount: Money) -> String {
        let sign = if amount.is_negative() { "-" } else { "" };
        let abs = amount.cents().unsigned_abs();
        let units = group_thousands(abs / 100, self.group_separator());
        let cents = abs % 100;
        let decimal = self.decimal_separator();
        match self {
            Currency::Brl => format!("{sign}R$ {units}{decimal}{cents:02}"),
            Currency::Eur => format!("{sign}{units}{decimal}{cents:02} €"),
            Currency::Usd => format!("{sign}${units}{decimal}{cents:02}"),
        }
    }

    const fn decimal_separator(self) -> char {
        match self {
            Currency::Brl | Currency::Eur => ',',
            Currency::Usd => '.',
        }
    }

    const fn group_separator(self) -> char {
        match self {
            Currency::Brl | Currency::Eur => '.',
            Currency::Usd => ',',
        }
    }
}

fn group_thousands(value: u64, separator: char) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(separator);
        }
        out.push(ch);
    }
    out
}

impl core::fmt::Display for Currency {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.code())
    }
}

impl TryFrom<&str> for Currency {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_uppercase().as_str() {
            "BRL" => Ok(Currency::Brl),
            "EUR" => Ok(Currency::Eur),
            "USD" => Ok(Currency::Usd),
            other => Err(EngineError::InvalidInput(format!(
                "unsupported currency: {other}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_with_local_separators() {
        assert_eq!(Currency::Brl.format(Money::new(123_450)), "R$ 1.234,50");
        assert_eq!(Currency::Eur.format(Money::new(1050)), "10,50 €");
        assert_eq!(Currency::Usd.format(Money::new(-99)), "-$0.99");
    }

    #[test]
    fn parses_codes_case_insensitively() {
        assert_eq!(Currency::try_from(" brl "), Ok(Currency::Brl));
        assert!(Currency::try_from("JPY").is_err());
    }
}
