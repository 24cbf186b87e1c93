use crate::enums::Side;
use serde::{Deserialize, Serialize};

/// Relationship between the current tick and a position's bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RangeStatus {
    InRange,
    OutOfRange { side: Side, distance: i32 },
}

impl RangeStatus {
    pub fn is_in_range(&self) -> bool {
        matches!(self, RangeStatus::InRange)
    }
}

/// Classification of a pair at the current tick.
///
/// "Same side" means the price left the range toward the side where the
/// position ends up fully in the priority token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RebalanceOutcome {
    NoPosition,
    InRange,
    OutOfRangeSameSide { side: Side, distance: i32 },
    OutOfRangeOppositeSide { side: Side, distance: i32 },
}

impl RebalanceOutcome {
    /// Tick distance past the nearest bound (0 unless out of range).
    pub fn distance(&self) -> i32 {
        match self {
            RebalanceOutcome::OutOfRangeSameSide { distance, .. }
            | RebalanceOutcome::OutOfRangeOppositeSide { distance, .. } => *distance,
            _ => 0,
        }
    }

    pub fn side(&self) -> Option<Side> {
        match self {
            RebalanceOutcome::OutOfRangeSameSide { side, .. }
            | RebalanceOutcome::OutOfRangeOppositeSide { side, .. } => Some(*side),
            _ => None,
        }
    }

    pub fn is_out_of_range(&self) -> bool {
        self.side().is_some()
    }
}
