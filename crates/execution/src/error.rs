//! Engine error type.

use crate::store::StoreError;
use crate::strategy::ExecutorError;
use clmm_rebalancer_domain::DomainError;
use thiserror::Error;

/// Errors raised while evaluating or acting on a pair.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Rejected engine or runner configuration.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// Invalid snapshot or pair configuration.
    #[error(transparent)]
    Domain(#[from] DomainError),
    /// Store failure while reading or updating throttle/volatility state.
    #[error(transparent)]
    Store(#[from] StoreError),
    /// An executor call failed after all retries.
    #[error("{operation} failed: {source}")]
    Executor {
        operation: String,
        #[source]
        source: ExecutorError,
    },
    /// A deterministic precondition of a step does not hold.
    #[error("precondition failed: {0}")]
    Precondition(String),
}

impl EngineError {
    pub fn is_precondition(&self) -> bool {
        matches!(self, EngineError::Precondition(_))
    }
}
