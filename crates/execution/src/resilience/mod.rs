//! Resilience helpers for fallible remote operations.
//!
//! Provides bounded retry with exponential backoff and jitter.

mod retry;

pub use retry::*;
