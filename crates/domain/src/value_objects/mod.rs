pub mod rebalance_outcome;

pub use rebalance_outcome::{RangeStatus, RebalanceOutcome};
