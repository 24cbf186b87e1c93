//! Composition of the throttle mechanisms used by the engine.

use super::{AllocationCounter, Cooldown, LimiterStatus, RateLimiter, ThrottleError};
use crate::store::{KeyValueStore, StoreError};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Configuration for the throttle controller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThrottleConfig {
    /// Scope name shared by the limiters and allocation counter.
    pub scope: String,
    /// Transactions allowed per long window.
    pub long_window_points: u32,
    /// Long window length in seconds.
    pub long_window_secs: u64,
    /// Transactions allowed per short window.
    pub short_window_points: u32,
    /// Short window length in seconds.
    pub short_window_secs: u64,
    /// Cooldown after a rebalance, in seconds.
    pub cooldown_secs: u64,
    /// Fresh allocations allowed per allocation window.
    pub allocation_cap: u32,
    /// Allocation window length in seconds.
    pub allocation_window_secs: u64,
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self {
            scope: "venue".to_string(),
            long_window_points: 60,
            long_window_secs: 8 * 60 * 60, // 8 hours
            short_window_points: 6,
            short_window_secs: 5 * 60, // 5 minutes
            cooldown_secs: 5 * 60,
            allocation_cap: 1,
            allocation_window_secs: 15 * 60, // 15 minutes
        }
    }
}

/// Why a pair may not act this cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ThrottleGate {
    /// All throttles have headroom.
    Open,
    /// The pair is cooling down.
    Cooldown { remaining: Option<Duration> },
    /// A transaction limiter is exhausted.
    RateLimited(LimiterStatus),
}

impl ThrottleGate {
    pub fn is_open(&self) -> bool {
        matches!(self, ThrottleGate::Open)
    }
}

/// Point-in-time view of all throttle state.
#[derive(Debug, Clone, Serialize)]
pub struct ThrottleState {
    pub long_window: LimiterStatus,
    pub short_window: LimiterStatus,
    pub allocations: i64,
    pub allocation_cap: u32,
}

/// Long/short transaction limiters, cooldown and allocation cap.
pub struct ThrottleController {
    long_window: RateLimiter,
    short_window: RateLimiter,
    cooldown: Cooldown,
    allocations: AllocationCounter,
    config: ThrottleConfig,
}

impl ThrottleController {
    pub fn new(store: Arc<dyn KeyValueStore>, config: ThrottleConfig) -> Self {
        let long_window = RateLimiter::new(
            store.clone(),
            format!("{}:long", config.scope),
            config.long_window_points,
            Duration::from_secs(config.long_window_secs),
        );
        let short_window = RateLimiter::new(
            store.clone(),
            format!("{}:short", config.scope),
            config.short_window_points,
            Duration::from_secs(config.short_window_secs),
        );
        let cooldown = Cooldown::new(store.clone(), Duration::from_secs(config.cooldown_secs));
        let allocations = AllocationCounter::new(
            store,
            config.scope.clone(),
            config.allocation_cap,
            Duration::from_secs(config.allocation_window_secs),
        );
        Self {
            long_window,
            short_window,
            cooldown,
            allocations,
            config,
        }
    }

    pub fn config(&self) -> &ThrottleConfig {
        &self.config
    }

    /// Checks the cooldown for `pair_key`, then both limiters.
    pub async fn check(&self, pair_key: &str) -> Result<ThrottleGate, StoreError> {
        if self.cooldown.is_active(pair_key).await? {
            return Ok(ThrottleGate::Cooldown {
                remaining: self.cooldown.remaining(pair_key).await?,
            });
        }
        for limiter in [&self.long_window, &self.short_window] {
            let status = limiter.status().await?;
            if status.is_exhausted() {
                return Ok(ThrottleGate::RateLimited(status));
            }
        }
        Ok(ThrottleGate::Open)
    }

    /// Counts one submitted transaction against both limiters.
    ///
    /// The transaction already happened, so exhaustion is only logged.
    pub async fn record_transaction(&self) -> Result<(), StoreError> {
        for limiter in [&self.long_window, &self.short_window] {
            match limiter.consume(1).await {
                Ok(status) => debug!(scope = %status.scope, remaining = status.remaining, "Transaction counted"),
                Err(ThrottleError::Exhausted { scope, .. }) => {
                    warn!(scope = %scope, "Transaction recorded past exhausted limit");
                }
                Err(ThrottleError::Store(e)) => return Err(e),
            }
        }
        Ok(())
    }

    pub async fn start_cooldown(&self, pair_key: &str) -> Result<(), StoreError> {
        self.cooldown.start(pair_key).await
    }

    pub async fn is_cooling_down(&self, pair_key: &str) -> Result<bool, StoreError> {
        self.cooldown.is_active(pair_key).await
    }

    /// Whether a fresh position may be opened this window.
    pub async fn allocation_available(&self) -> Result<bool, StoreError> {
        Ok(!self.allocations.is_exceeded().await?)
    }

    pub async fn record_allocation(&self) -> Result<i64, StoreError> {
        self.allocations.record().await
    }

    pub async fn state(&self) -> Result<ThrottleState, StoreError> {
        Ok(ThrottleState {
            long_window: self.long_window.status().await?,
            short_window: self.short_window.status().await?,
            allocations: self.allocations.count().await?,
            allocation_cap: self.config.allocation_cap,
        })
    }

    /// Clears limiter windows and the allocation counter.
    pub async fn reset(&self) -> Result<(), StoreError> {
        self.long_window.reset().await?;
        self.short_window.reset().await?;
        self.allocations.reset().await
    }
}
