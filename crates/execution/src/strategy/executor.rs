//! Transaction executor contract and a dry-run implementation.

use async_trait::async_trait;
use clmm_rebalancer_domain::entities::{PairConfig, PoolSnapshot, PositionSnapshot, Token, TokenId};
use clmm_rebalancer_domain::enums::{PairToken, SwapDirection};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;
use tracing::info;

/// Receipt of a submitted transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxReceipt {
    /// Transaction digest.
    pub digest: String,
}

impl TxReceipt {
    pub fn new(digest: impl Into<String>) -> Self {
        Self {
            digest: digest.into(),
        }
    }
}

/// Errors returned by a transaction executor.
///
/// Every variant is treated as retryable by the engine.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ExecutorError {
    /// Temporary remote failure.
    #[error("transient executor failure: {0}")]
    Transient(String),
    /// Failure the executor does not expect to recover from.
    #[error("executor failure: {0}")]
    Terminal(String),
    /// Call exceeded its deadline.
    #[error("executor call timed out after {0:?}")]
    Timeout(Duration),
}

/// Single-sided deposit into a new range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenPositionRequest {
    /// Token deposited.
    pub deposit: PairToken,
    /// Lower tick of the new range.
    pub tick_lower: i32,
    /// Upper tick of the new range.
    pub tick_upper: i32,
    /// Amount of `deposit` to add.
    pub amount: Decimal,
}

/// Submits transactions on behalf of the engine.
///
/// Implementations own signing and transaction construction.
#[async_trait]
pub trait TransactionExecutor: Send + Sync {
    /// Wallet balance of `token` available for deployment.
    async fn available_balance(&self, token: &Token) -> Result<Decimal, ExecutorError>;

    /// Withdraws all liquidity and closes the position.
    async fn close_position(
        &self,
        pool: &PoolSnapshot,
        position: &PositionSnapshot,
    ) -> Result<TxReceipt, ExecutorError>;

    /// Swaps `amount` of the direction's source token.
    async fn swap(
        &self,
        pair: &PairConfig,
        direction: SwapDirection,
        amount: Decimal,
    ) -> Result<TxReceipt, ExecutorError>;

    /// Opens a position and deposits a single token into it.
    async fn open_position(
        &self,
        pool: &PoolSnapshot,
        request: &OpenPositionRequest,
    ) -> Result<TxReceipt, ExecutorError>;
}

/// Executor that logs intended transactions without submitting them.
pub struct DryRunExecutor {
    balances: HashMap<TokenId, Decimal>,
}

impl DryRunExecutor {
    /// Creates an executor reporting the given balances.
    pub fn new(balances: HashMap<TokenId, Decimal>) -> Self {
        Self { balances }
    }

    fn digest() -> TxReceipt {
        TxReceipt::new(format!("dry-run-{}", uuid::Uuid::new_v4()))
    }
}

#[async_trait]
impl TransactionExecutor for DryRunExecutor {
    async fn available_balance(&self, token: &Token) -> Result<Decimal, ExecutorError> {
        Ok(self.balances.get(&token.id).copied().unwrap_or(Decimal::ZERO))
    }

    async fn close_position(
        &self,
        pool: &PoolSnapshot,
        position: &PositionSnapshot,
    ) -> Result<TxReceipt, ExecutorError> {
        info!(
            pool = %pool.pool_id,
            position = %position.position_id,
            range = format!("[{}, {}]", position.tick_lower, position.tick_upper),
            "Dry run - would close position"
        );
        Ok(Self::digest())
    }

    async fn swap(
        &self,
        pair: &PairConfig,
        direction: SwapDirection,
        amount: Decimal,
    ) -> Result<TxReceipt, ExecutorError> {
        info!(
            pair = %pair.display_id(),
            direction = ?direction,
            amount = %amount,
            "Dry run - would swap"
        );
        Ok(Self::digest())
    }

    async fn open_position(
        &self,
        pool: &PoolSnapshot,
        request: &OpenPositionRequest,
    ) -> Result<TxReceipt, ExecutorError> {
        info!(
            pool = %pool.pool_id,
            range = format!("[{}, {}]", request.tick_lower, request.tick_upper),
            deposit = ?request.deposit,
            amount = %request.amount,
            "Dry run - would open position"
        );
        Ok(Self::digest())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn test_dry_run_balances() {
        let sui = Token::new("0x2::sui::SUI", "SUI", 9);
        let usdc = Token::new("0x5::usdc::USDC", "USDC", 6);
        let executor = DryRunExecutor::new(HashMap::from([(sui.id.clone(), dec!(42))]));

        assert_eq!(executor.available_balance(&sui).await.unwrap(), dec!(42));
        assert_eq!(executor.available_balance(&usdc).await.unwrap(), Decimal::ZERO);
    }

    #[tokio::test]
    async fn test_dry_run_returns_distinct_digests() {
        let executor = DryRunExecutor::new(HashMap::new());
        let pool = PoolSnapshot::new("pool", 130, 60);
        let position = PositionSnapshot::new("pos", 0, 60);

        let first = executor.close_position(&pool, &position).await.unwrap();
        let second = executor.close_position(&pool, &position).await.unwrap();
        assert!(first.digest.starts_with("dry-run-"));
        assert_ne!(first, second);
    }
}
