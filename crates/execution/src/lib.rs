//! Rebalancing control loop for concentrated-liquidity positions.
//!
//! This crate provides the stateful side of the rebalancer:
//! - TTL-aware key-value store abstraction with an in-memory backend
//! - Rolling tick-sample volatility estimation
//! - Transaction rate limiting, cooldowns and an allocation cap
//! - Retry with exponential backoff and jitter
//! - The rebalance decision engine and the executor contract it drives
//! - Pool state samplers and the poll loop
//! - A journal of completed transaction steps

/// Prelude module for convenient imports.
pub mod prelude;

/// Engine and poll loop configuration.
pub mod config;
/// Engine error type.
pub mod error;
/// Journal of completed transaction steps.
pub mod lifecycle;
/// Retry with backoff.
pub mod resilience;
/// Pool state samplers.
pub mod sampler;
/// Poll loop.
pub mod scheduler;
/// Key-value store abstraction.
pub mod store;
/// Decision logic, executor contract and engine.
pub mod strategy;
/// Rate limiting, cooldown and allocation cap.
pub mod throttle;
/// Volatility estimation.
pub mod volatility;
