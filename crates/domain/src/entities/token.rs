use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable identifier of a token (coin type, mint, or display id).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TokenId(pub String);

impl TokenId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TokenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Token {
    pub id: TokenId,
    pub symbol: String,
    pub decimals: u8,
    /// Balance kept back from every deposit or swap, e.g. for gas.
    #[serde(default)]
    pub min_reserve: Decimal,
}

impl Token {
    pub fn new(id: impl Into<String>, symbol: impl Into<String>, decimals: u8) -> Self {
        Self {
            id: TokenId::new(id),
            symbol: symbol.into(),
            decimals,
            min_reserve: Decimal::ZERO,
        }
    }

    #[must_use]
    pub fn with_reserve(mut self, min_reserve: Decimal) -> Self {
        self.min_reserve = min_reserve;
        self
    }
}
