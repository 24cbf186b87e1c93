//! Throughput controls for on-chain actions.
//!
//! Provides:
//! - Fixed-window transaction limiters (long and short window)
//! - Per-pair cooldown after a rebalance
//! - A cap on fresh allocations per window
//!
//! All state lives in the shared store with a TTL; an absent key means the
//! corresponding window has fully reset.

mod allocation;
mod controller;
mod cooldown;
mod limiter;

pub use allocation::*;
pub use controller::*;
pub use cooldown::*;
pub use limiter::*;

use crate::store::StoreError;
use std::time::Duration;
use thiserror::Error;

/// Errors raised by throttle components.
#[derive(Debug, Error)]
pub enum ThrottleError {
    /// The limiter has fewer points left than requested.
    #[error("rate limit {scope} exhausted ({remaining} points left, resets in {resets_in:?})")]
    Exhausted {
        scope: String,
        remaining: i64,
        resets_in: Option<Duration>,
    },
    /// Underlying store failure.
    #[error(transparent)]
    Store(#[from] StoreError),
}
