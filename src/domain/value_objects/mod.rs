//! Value objects shared across the checkout domain.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Normalized 8-digit Brazilian postal code (CEP) value object.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PostalCode(String);

impl PostalCode {
    /// Accepts formatted ("01001-000") or bare ("01001000") input and
    /// keeps only the digits.
    pub fn new(value: impl AsRef<str>) -> Result<Self, PostalCodeError> {
        let digits: String = value.as_ref().chars().filter(char::is_ascii_digit).collect();
        if digits.len() != 8 {
            return Err(PostalCodeError::InvalidLength);
        }
        Ok(Self(digits))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// "01001000" rendered as "01001-000".
    pub fn formatted(&self) -> String {
        format!("{}-{}", &self.0[..5], &self.0[5..])
    }
}

impl fmt::Display for PostalCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone)]
pub enum PostalCodeError {
    InvalidLength,
}
impl std::error::Error for PostalCodeError {}
impl fmt::Display for PostalCodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "postal code must have exactly 8 digits")
    }
}

/// Currency rendering configuration. The locale is an explicit input, not
/// an inference; the default matches the storefront's pt-BR format.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CurrencyFormat {
    pub symbol: String,
    pub decimal_separator: char,
}

impl CurrencyFormat {
    pub fn new(symbol: impl Into<String>, decimal_separator: char) -> Self {
        Self { symbol: symbol.into(), decimal_separator }
    }

    /// Always two decimal places, symbol prefix, configured separator.
    pub fn format(&self, amount: Decimal) -> String {
        let mut amount = amount.round_dp(2);
        amount.rescale(2);
        let mut digits = amount.to_string();
        if self.decimal_separator != '.' {
            digits = digits.replace('.', &self.decimal_separator.to_string());
        }
        format!("{} {}", self.symbol, digits)
    }
}

impl Default for CurrencyFormat {
    fn default() -> Self {
        Self::new("R$", ',')
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn postal_code_strips_formatting() {
        let code = PostalCode::new("01001-000").unwrap();
        assert_eq!(code.as_str(), "01001000");
        assert_eq!(code.formatted(), "01001-000");
    }

    #[test]
    fn postal_code_rejects_wrong_length() {
        assert!(PostalCode::new("1234").is_err());
        assert!(PostalCode::new("123456789").is_err());
        assert!(PostalCode::new("abcdefgh").is_err());
    }

    #[test]
    fn default_format_is_brl() {
        let fmt = CurrencyFormat::default();
        assert_eq!(fmt.format("29.90".parse().unwrap()), "R$ 29,90");
        assert_eq!(fmt.format("59.8".parse().unwrap()), "R$ 59,80");
        assert_eq!(fmt.format("1000".parse().unwrap()), "R$ 1000,00");
    }

    #[test]
    fn custom_format_keeps_dot_separator() {
        let fmt = CurrencyFormat::new("US$", '.');
        assert_eq!(fmt.format("5".parse().unwrap()), "US$ 5.00");
    }
}
