//! Rebalancing strategy.
//!
//! - Pure decision logic over a pair snapshot
//! - The transaction executor contract
//! - The engine that gates, decides and executes each cycle

mod decision;
mod engine;
mod executor;

pub use decision::*;
pub use engine::*;
pub use executor::*;
