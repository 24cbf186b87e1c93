//! Pure range analysis over a pool and position snapshot.
//!
//! Functions taking a pool assume it is validated (`tick_spacing > 0`).
//! The eligibility checks take a raw spacing and are false for a
//! non-positive one. Remainders use Euclidean arithmetic so buckets stay
//! well defined below tick zero.

use crate::entities::{PoolSnapshot, PositionSnapshot};
use crate::enums::{PairToken, Side};
use crate::value_objects::{RangeStatus, RebalanceOutcome};

/// Upper bound on the tolerated tick drift, whatever the spacing.
pub const MAX_ALLOWED_DEVIATION: i32 = 4;

/// Spacing-aligned bucket `[lower, lower + spacing)` containing the current tick.
///
/// # Panics
///
/// Panics if the pool's tick spacing is zero.
pub fn tick_bounds(pool: &PoolSnapshot) -> (i32, i32) {
    let spacing = pool.tick_spacing;
    let lower = pool.current_tick.div_euclid(spacing) * spacing;
    (lower, lower + spacing)
}

/// Locates the current tick relative to the position's inclusive bounds.
pub fn position_range(pool: &PoolSnapshot, position: &PositionSnapshot) -> RangeStatus {
    let tick = pool.current_tick;
    if tick > position.tick_upper {
        RangeStatus::OutOfRange {
            side: Side::Right,
            distance: tick - position.tick_upper,
        }
    } else if tick < position.tick_lower {
        RangeStatus::OutOfRange {
            side: Side::Left,
            distance: position.tick_lower - tick,
        }
    } else {
        RangeStatus::InRange
    }
}

/// Maximum tick drift ignored before acting: `min(spacing / 10, 4)`.
pub fn allowed_deviation(pool: &PoolSnapshot) -> i32 {
    (pool.tick_spacing / 10).min(MAX_ALLOWED_DEVIATION)
}

fn settle_band(spacing: i32) -> i32 {
    spacing / 3
}

/// True once the price has left the old range by at least one bucket and
/// sits within the first third of a bucket.
pub fn close_eligible(tick_diff: i32, spacing: i32) -> bool {
    if spacing <= 0 || tick_diff < spacing {
        return false;
    }
    tick_diff.rem_euclid(spacing) <= settle_band(spacing)
}

/// True when the current tick is within a third of a bucket from the edge
/// a new single-sided range would be opened against.
pub fn add_eligible(prefer_a: bool, current_tick: i32, spacing: i32) -> bool {
    if spacing <= 0 {
        return false;
    }
    let remainder = current_tick.rem_euclid(spacing);
    let distance = if prefer_a {
        spacing - remainder
    } else {
        remainder
    };
    distance <= settle_band(spacing)
}

/// Single-bucket range to open when depositing only `deposit` token.
///
/// Token A is deposited into the bucket above the current one, token B
/// into the bucket below, so the new position starts out of range holding
/// only the deposited token.
pub fn target_range(pool: &PoolSnapshot, deposit: PairToken) -> (i32, i32) {
    let spacing = pool.tick_spacing;
    let (lower, upper) = tick_bounds(pool);
    let new_lower = match deposit {
        PairToken::A => upper,
        PairToken::B => lower - spacing,
    };
    (new_lower, new_lower + spacing)
}

/// Classifies the pair against the priority token.
pub fn classify(
    pool: &PoolSnapshot,
    position: Option<&PositionSnapshot>,
    priority: PairToken,
) -> RebalanceOutcome {
    let Some(position) = position else {
        return RebalanceOutcome::NoPosition;
    };
    match position_range(pool, position) {
        RangeStatus::InRange => RebalanceOutcome::InRange,
        RangeStatus::OutOfRange { side, distance } if side.held_token() == priority => {
            RebalanceOutcome::OutOfRangeSameSide { side, distance }
        }
        RangeStatus::OutOfRange { side, distance } => {
            RebalanceOutcome::OutOfRangeOppositeSide { side, distance }
        }
    }
}
