//! Engine and poll loop configuration.

use crate::error::EngineError;
use crate::resilience::RetryPolicy;
use crate::throttle::ThrottleConfig;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the rebalance engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Limiter, cooldown and allocation settings.
    pub throttle: ThrottleConfig,
    /// Retry policy applied to every executor call.
    pub retry: RetryPolicy,
    /// Deadline for a single executor call, in seconds.
    pub call_timeout_secs: u64,
    /// Lifetime of a stored sample window, in seconds.
    pub sample_ttl_secs: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            throttle: ThrottleConfig::default(),
            retry: RetryPolicy::default(),
            call_timeout_secs: 30,
            sample_ttl_secs: 60 * 60, // 1 hour
        }
    }
}

impl EngineConfig {
    pub fn call_timeout(&self) -> Duration {
        Duration::from_secs(self.call_timeout_secs)
    }

    pub fn sample_ttl(&self) -> Duration {
        Duration::from_secs(self.sample_ttl_secs)
    }

    /// Rejects settings the engine cannot run with.
    pub fn validate(&self) -> Result<(), EngineError> {
        let throttle = &self.throttle;
        let invalid = |msg: &str| Err(EngineError::InvalidConfig(msg.to_string()));

        if throttle.long_window_points == 0 || throttle.short_window_points == 0 {
            return invalid("limiter points must be positive");
        }
        if throttle.long_window_secs == 0
            || throttle.short_window_secs == 0
            || throttle.allocation_window_secs == 0
        {
            return invalid("throttle windows must be positive");
        }
        if throttle.scope.is_empty() {
            return invalid("throttle scope must not be empty");
        }
        if self.retry.factor.is_nan() || self.retry.factor < 1.0 {
            return invalid("retry factor must be at least 1");
        }
        if self.call_timeout_secs == 0 {
            return invalid("call_timeout_secs must be positive");
        }
        if self.sample_ttl_secs == 0 {
            return invalid("sample_ttl_secs must be positive");
        }
        Ok(())
    }
}

/// Configuration for the poll loop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    /// Poll interval in seconds.
    pub poll_interval_secs: u64,
    /// Stop after this many cycles; run forever when unset.
    pub max_cycles: Option<u64>,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: 3,
            max_cycles: None,
        }
    }
}

impl RunnerConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        if self.poll_interval_secs == 0 {
            return Err(EngineError::InvalidConfig(
                "poll_interval_secs must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
