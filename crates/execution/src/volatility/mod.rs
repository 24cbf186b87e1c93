//! Short-term volatility estimation from a rolling tick window.
//!
//! Provides:
//! - A bounded FIFO window of `(timestamp, tick)` samples per pair
//! - A windowed rate-of-change verdict scaled to the pool's tick spacing

mod estimator;
mod window;

pub use estimator::*;
pub use window::*;
