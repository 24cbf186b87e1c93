//! Domain model for the concentrated-liquidity rebalancer.
//!
//! Contains the pool/position snapshots sampled every poll, the pair
//! configuration, and the pure tick-range arithmetic the decision engine
//! relies on.

/// Pool, position, token and pair entities.
pub mod entities;
/// Shared enumerations.
pub mod enums;
/// Domain errors.
pub mod error;
/// Tick and range math.
pub mod math;
/// Value objects produced by range analysis.
pub mod value_objects;

pub use error::DomainError;
