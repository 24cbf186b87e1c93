use crate::entities::token::{Token, TokenId};
use crate::enums::PairToken;
use crate::error::DomainError;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Long-lived configuration of a managed pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairConfig {
    pub token_a: Token,
    pub token_b: Token,
    pub fee_rate_bps: u32,
    /// Token the strategy prefers to hold while idle.
    pub priority_token: TokenId,
    /// Fraction of the available balance committed per rebalance.
    pub max_capital_fraction: Decimal,
}

impl PairConfig {
    /// Resolves which side of the pair the priority token is.
    pub fn priority(&self) -> Result<PairToken, DomainError> {
        if self.priority_token == self.token_a.id {
            Ok(PairToken::A)
        } else if self.priority_token == self.token_b.id {
            Ok(PairToken::B)
        } else {
            Err(DomainError::UnknownPriorityToken {
                priority: self.priority_token.to_string(),
                token_a: self.token_a.id.to_string(),
                token_b: self.token_b.id.to_string(),
            })
        }
    }

    pub fn token(&self, which: PairToken) -> &Token {
        match which {
            PairToken::A => &self.token_a,
            PairToken::B => &self.token_b,
        }
    }

    /// Validates the priority token, capital fraction and token reserves.
    pub fn validate(&self) -> Result<PairToken, DomainError> {
        if self.max_capital_fraction <= Decimal::ZERO || self.max_capital_fraction > Decimal::ONE
        {
            return Err(DomainError::InvalidCapitalFraction(
                self.max_capital_fraction.to_string(),
            ));
        }
        for token in [&self.token_a, &self.token_b] {
            if token.min_reserve < Decimal::ZERO {
                return Err(DomainError::NegativeReserve {
                    token: token.symbol.clone(),
                    reserve: token.min_reserve.to_string(),
                });
            }
        }
        self.priority()
    }

    /// Amount of a `balance` of `token` the strategy may commit.
    ///
    /// The token's reserve is held back before the capital fraction is
    /// applied. Zero when nothing is left above the reserve.
    pub fn allocatable(&self, token: &Token, balance: Decimal) -> Decimal {
        ((balance - token.min_reserve) * self.max_capital_fraction).max(Decimal::ZERO)
    }

    pub fn display_id(&self) -> String {
        format!("{}/{}", self.token_a.symbol, self.token_b.symbol)
    }
}
