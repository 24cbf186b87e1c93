use thiserror::Error;

/// Errors raised while validating snapshots and pair configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    /// Tick spacing must be strictly positive.
    #[error("invalid tick spacing {0} for pool {1}")]
    InvalidTickSpacing(i32, String),

    /// Position bounds violate `lower < upper` or spacing alignment.
    #[error("invalid position range [{lower}, {upper}] with spacing {spacing}")]
    InvalidPositionRange {
        /// Lower tick bound.
        lower: i32,
        /// Upper tick bound.
        upper: i32,
        /// Pool tick spacing.
        spacing: i32,
    },

    /// The priority token is neither token A nor token B of the pair.
    #[error("priority token {priority} is not part of pair {token_a}/{token_b}")]
    UnknownPriorityToken {
        /// Configured priority token id.
        priority: String,
        /// Token A id.
        token_a: String,
        /// Token B id.
        token_b: String,
    },

    /// Capital fraction outside `(0, 1]`.
    #[error("max capital fraction must be in (0, 1], got {0}")]
    InvalidCapitalFraction(String),

    /// A token reserve below zero.
    #[error("min reserve of {token} must not be negative, got {reserve}")]
    NegativeReserve {
        /// Token symbol.
        token: String,
        /// Configured reserve.
        reserve: String,
    },

    /// Price conversion overflowed.
    #[error("price conversion failed: {0}")]
    PriceConversion(&'static str),
}
