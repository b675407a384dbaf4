//! Type-safe price representation using decimal arithmetic.

use core::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A price denominated in a ledger token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Price {
    /// Amount in whole token units.
    pub amount: Decimal,
    /// Token the amount is denominated in.
    #[serde(default)]
    pub token: Token,
}

impl Price {
    /// Create a new price.
    #[must_use]
    pub const fn new(amount: Decimal, token: Token) -> Self {
        Self { amount, token }
    }

    /// Create a price from a whole number of WEIL.
    #[must_use]
    pub fn weil(amount: i64) -> Self {
        Self::new(Decimal::from(amount), Token::Weil)
    }

    /// Format for display (e.g., "12 WEIL", "2.5 WEIL").
    #[must_use]
    pub fn display(&self) -> String {
        format!("{} {}", self.amount.normalize(), self.token.symbol())
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display())
    }
}

/// Tokens accepted by the marketplace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Token {
    #[default]
    Weil,
}

impl Token {
    /// Ticker symbol shown next to amounts.
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Weil => "WEIL",
        }
    }
}

/// Serde adapter storing a [`Price`] as a bare JSON number of tokens.
///
/// Purchase ledgers persist prices this way. On read, numeric strings and the
/// `{"amount", "token"}` object form are accepted too.
pub mod as_number {
    use rust_decimal::Decimal;
    use rust_decimal::prelude::ToPrimitive;
    use serde::{Deserialize, Deserializer, Serializer, de};

    use super::{Price, Token};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Stored {
        Integer(i64),
        Float(f64),
        Text(String),
        Object(Price),
    }

    /// Write the amount as an integer when whole, otherwise as a float.
    ///
    /// # Errors
    ///
    /// Propagates serializer errors.
    pub fn serialize<S: Serializer>(price: &Price, serializer: S) -> Result<S::Ok, S::Error> {
        let amount = price.amount.normalize();
        if let Some(whole) = amount.fract().is_zero().then(|| amount.to_i64()).flatten() {
            return serializer.serialize_i64(whole);
        }
        match amount.to_f64() {
            Some(float) => serializer.serialize_f64(float),
            None => serializer.serialize_str(&amount.to_string()),
        }
    }

    /// Read a bare amount as a WEIL price.
    ///
    /// # Errors
    ///
    /// Fails when the value is not a number, a numeric string, or a price object.
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Price, D::Error> {
        let amount = match Stored::deserialize(deserializer)? {
            Stored::Integer(whole) => Decimal::from(whole),
            Stored::Float(float) => Decimal::try_from(float).map_err(de::Error::custom)?,
            Stored::Text(text) => text.trim().parse::<Decimal>().map_err(de::Error::custom)?,
            Stored::Object(price) => return Ok(price),
        };
        Ok(Price::new(amount, Token::Weil))
    }
}
