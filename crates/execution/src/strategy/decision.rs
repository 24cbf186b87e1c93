//! Pure rebalancing decision logic.
//!
//! [`decide`] maps one pair's snapshot, volatility verdict and allocation
//! headroom to a [`Decision`]. It performs no I/O, so the same input always
//! produces the same decision.

use crate::volatility::VolatilityVerdict;
use clmm_rebalancer_domain::entities::{PoolSnapshot, PositionSnapshot};
use clmm_rebalancer_domain::enums::{
    PairToken, SwapDirection, TrendDirection, VolatilityPolicy,
};
use clmm_rebalancer_domain::math::tick_range::{
    add_eligible, allowed_deviation, classify, close_eligible, target_range,
};
use clmm_rebalancer_domain::value_objects::RebalanceOutcome;
use serde::Serialize;
use std::fmt;

/// Everything [`decide`] looks at for one pair.
#[derive(Debug, Clone)]
pub struct DecisionInput<'a> {
    pub pool: &'a PoolSnapshot,
    pub position: Option<&'a PositionSnapshot>,
    pub priority: PairToken,
    pub verdict: &'a VolatilityVerdict,
    pub policy: VolatilityPolicy,
    /// Whether the allocation cap still admits a fresh open.
    pub allocation_available: bool,
}

/// Tick range a position is opened into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TargetRange {
    pub tick_lower: i32,
    pub tick_upper: i32,
}

impl From<(i32, i32)> for TargetRange {
    fn from((tick_lower, tick_upper): (i32, i32)) -> Self {
        Self {
            tick_lower,
            tick_upper,
        }
    }
}

impl fmt::Display for TargetRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.tick_lower, self.tick_upper)
    }
}

/// Why no action was taken.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum HoldReason {
    /// Not enough samples for a volatility verdict.
    Loading,
    /// Price is moving too fast.
    Volatile {
        delta: f64,
        direction: Option<TrendDirection>,
    },
    /// Position is still earning.
    InRange,
    /// Fresh opens are capped for the current window.
    AllocationCapReached,
    /// Price has not settled into the entry band of a bucket.
    AwaitingEntry { outcome: RebalanceOutcome },
    /// Drift is below the allowed deviation.
    WithinDeviation { distance: i32, allowed: i32 },
}

/// Action selected for a pair.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Decision {
    Hold(HoldReason),
    /// Deposit the priority token into a fresh range.
    OpenPosition {
        deposit: PairToken,
        target: TargetRange,
    },
    /// Close and reopen on the same side.
    Reposition {
        deposit: PairToken,
        target: TargetRange,
    },
    /// Close, swap the held token into the priority token, reopen.
    CloseSwapReopen {
        swap: SwapDirection,
        deposit: PairToken,
        target: TargetRange,
    },
    /// Close and swap everything into the priority token without reopening.
    ExitToPriority { swap: SwapDirection },
}

/// One transaction step of an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Step {
    Close,
    Swap(SwapDirection),
    Open {
        deposit: PairToken,
        target: TargetRange,
    },
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::Close => f.write_str("close"),
            Step::Swap(_) => f.write_str("swap"),
            Step::Open { .. } => f.write_str("open"),
        }
    }
}

impl Decision {
    /// Ordered transaction steps; empty for a hold.
    pub fn steps(&self) -> Vec<Step> {
        match *self {
            Decision::Hold(_) => Vec::new(),
            Decision::OpenPosition { deposit, target } => vec![Step::Open { deposit, target }],
            Decision::Reposition { deposit, target } => {
                vec![Step::Close, Step::Open { deposit, target }]
            }
            Decision::CloseSwapReopen {
                swap,
                deposit,
                target,
            } => vec![Step::Close, Step::Swap(swap), Step::Open { deposit, target }],
            Decision::ExitToPriority { swap } => vec![Step::Close, Step::Swap(swap)],
        }
    }

    pub fn is_hold(&self) -> bool {
        matches!(self, Decision::Hold(_))
    }

    /// Short label for logs and reports.
    pub fn label(&self) -> &'static str {
        match self {
            Decision::Hold(_) => "hold",
            Decision::OpenPosition { .. } => "open_position",
            Decision::Reposition { .. } => "reposition",
            Decision::CloseSwapReopen { .. } => "close_swap_reopen",
            Decision::ExitToPriority { .. } => "exit_to_priority",
        }
    }
}

/// Decides the action for one pair.
pub fn decide(input: &DecisionInput<'_>) -> Decision {
    let verdict = input.verdict;
    if verdict.is_loading {
        return Decision::Hold(HoldReason::Loading);
    }

    let pool = input.pool;
    let priority = input.priority;
    let outcome = classify(pool, input.position, priority);
    let into_priority = SwapDirection::from_token(priority.opposite());

    if verdict.is_volatile {
        let exit = input.policy == VolatilityPolicy::ExitToPriority
            && input.position.is_some()
            && verdict.direction == Some(TrendDirection::against(priority))
            && !matches!(outcome, RebalanceOutcome::OutOfRangeSameSide { .. });
        if exit {
            return Decision::ExitToPriority {
                swap: into_priority,
            };
        }
        return Decision::Hold(HoldReason::Volatile {
            delta: verdict.delta,
            direction: verdict.direction,
        });
    }

    let spacing = pool.tick_spacing;
    let prefer_a = priority == PairToken::A;
    let target = TargetRange::from(target_range(pool, priority));

    match outcome {
        RebalanceOutcome::NoPosition => {
            if !input.allocation_available {
                Decision::Hold(HoldReason::AllocationCapReached)
            } else if !add_eligible(prefer_a, pool.current_tick, spacing) {
                Decision::Hold(HoldReason::AwaitingEntry { outcome })
            } else {
                Decision::OpenPosition {
                    deposit: priority,
                    target,
                }
            }
        }
        RebalanceOutcome::InRange => Decision::Hold(HoldReason::InRange),
        RebalanceOutcome::OutOfRangeSameSide { distance, .. } => {
            if close_eligible(distance, spacing) && add_eligible(prefer_a, pool.current_tick, spacing)
            {
                Decision::Reposition {
                    deposit: priority,
                    target,
                }
            } else {
                Decision::Hold(HoldReason::AwaitingEntry { outcome })
            }
        }
        RebalanceOutcome::OutOfRangeOppositeSide { distance, .. } => {
            let allowed = allowed_deviation(pool);
            if distance < allowed {
                Decision::Hold(HoldReason::WithinDeviation { distance, allowed })
            } else {
                Decision::CloseSwapReopen {
                    swap: into_priority,
                    deposit: priority,
                    target,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn steady() -> VolatilityVerdict {
        VolatilityVerdict {
            is_volatile: false,
            delta: 0.0,
            is_loading: false,
            direction: Some(TrendDirection::Up),
        }
    }

    fn volatile(direction: TrendDirection) -> VolatilityVerdict {
        let delta = match direction {
            TrendDirection::Up => 5.0,
            TrendDirection::Down => -5.0,
        };
        VolatilityVerdict {
            is_volatile: true,
            delta,
            is_loading: false,
            direction: Some(direction),
        }
    }

    fn input<'a>(
        pool: &'a PoolSnapshot,
        position: Option<&'a PositionSnapshot>,
        priority: PairToken,
        verdict: &'a VolatilityVerdict,
    ) -> DecisionInput<'a> {
        DecisionInput {
            pool,
            position,
            priority,
            verdict,
            policy: VolatilityPolicy::Skip,
            allocation_available: true,
        }
    }

    #[test]
    fn test_loading_holds() {
        let pool = PoolSnapshot::new("pool", 130, 60);
        let verdict = VolatilityVerdict::loading();
        let decision = decide(&input(&pool, None, PairToken::A, &verdict));
        assert_eq!(decision, Decision::Hold(HoldReason::Loading));
        assert!(decision.steps().is_empty());
    }

    #[test]
    fn test_in_range_holds() {
        let pool = PoolSnapshot::new("pool", 130, 60);
        let position = PositionSnapshot::new("pos", 120, 180);
        let verdict = steady();
        let decision = decide(&input(&pool, Some(&position), PairToken::A, &verdict));
        assert_eq!(decision, Decision::Hold(HoldReason::InRange));
    }

    #[test]
    fn test_open_position_for_priority_a() {
        // 175 mod 60 = 55, distance to the upper edge is 5.
        let pool = PoolSnapshot::new("pool", 175, 60);
        let verdict = steady();
        let decision = decide(&input(&pool, None, PairToken::A, &verdict));
        assert_eq!(
            decision,
            Decision::OpenPosition {
                deposit: PairToken::A,
                target: TargetRange::from((180, 240)),
            }
        );
        assert_eq!(decision.steps().len(), 1);
    }

    #[test]
    fn test_open_waits_for_entry_band() {
        let pool = PoolSnapshot::new("pool", 150, 60);
        let verdict = steady();
        let decision = decide(&input(&pool, None, PairToken::A, &verdict));
        assert!(matches!(
            decision,
            Decision::Hold(HoldReason::AwaitingEntry {
                outcome: RebalanceOutcome::NoPosition
            })
        ));
    }

    #[test]
    fn test_open_blocked_by_allocation_cap() {
        let pool = PoolSnapshot::new("pool", 175, 60);
        let verdict = steady();
        let mut input = input(&pool, None, PairToken::A, &verdict);
        input.allocation_available = false;
        assert_eq!(
            decide(&input),
            Decision::Hold(HoldReason::AllocationCapReached)
        );
    }

    #[test]
    fn test_allocation_cap_does_not_block_reposition() {
        let pool = PoolSnapshot::new("pool", 195, 60);
        let position = PositionSnapshot::new("pos", 60, 120);
        let verdict = steady();
        let mut input = input(&pool, Some(&position), PairToken::B, &verdict);
        input.allocation_available = false;
        assert!(matches!(decide(&input), Decision::Reposition { .. }));
    }

    #[test]
    fn test_same_side_not_yet_eligible() {
        // Right of (60, 120) by 10 ticks: not a full bucket out.
        let pool = PoolSnapshot::new("pool", 130, 60);
        let position = PositionSnapshot::new("pos", 60, 120);
        let verdict = steady();
        let decision = decide(&input(&pool, Some(&position), PairToken::B, &verdict));
        assert!(matches!(
            decision,
            Decision::Hold(HoldReason::AwaitingEntry { .. })
        ));
    }

    #[test]
    fn test_same_side_reposition() {
        // Right of (60, 120) by 75 ticks, 75 mod 60 = 15 <= 20.
        let pool = PoolSnapshot::new("pool", 195, 60);
        let position = PositionSnapshot::new("pos", 60, 120);
        let verdict = steady();
        let decision = decide(&input(&pool, Some(&position), PairToken::B, &verdict));
        assert_eq!(
            decision,
            Decision::Reposition {
                deposit: PairToken::B,
                target: TargetRange::from((120, 180)),
            }
        );
        assert_eq!(
            decision.steps(),
            vec![
                Step::Close,
                Step::Open {
                    deposit: PairToken::B,
                    target: TargetRange::from((120, 180)),
                }
            ]
        );
    }

    #[test]
    fn test_opposite_side_close_swap_reopen() {
        // Priority A, price exited right: the position now holds B.
        let pool = PoolSnapshot::new("pool", 130, 60);
        let position = PositionSnapshot::new("pos", 60, 120);
        let verdict = steady();
        let decision = decide(&input(&pool, Some(&position), PairToken::A, &verdict));
        assert_eq!(
            decision,
            Decision::CloseSwapReopen {
                swap: SwapDirection::BToA,
                deposit: PairToken::A,
                target: TargetRange::from((180, 240)),
            }
        );
        assert_eq!(decision.steps().len(), 3);
    }

    #[test]
    fn test_opposite_side_within_deviation_holds() {
        // Spacing 60 allows 4 ticks of drift.
        let pool = PoolSnapshot::new("pool", 123, 60);
        let position = PositionSnapshot::new("pos", 60, 120);
        let verdict = steady();
        let decision = decide(&input(&pool, Some(&position), PairToken::A, &verdict));
        assert_eq!(
            decision,
            Decision::Hold(HoldReason::WithinDeviation {
                distance: 3,
                allowed: 4
            })
        );
    }

    #[test]
    fn test_volatile_skip_policy_holds() {
        let pool = PoolSnapshot::new("pool", 130, 60);
        let position = PositionSnapshot::new("pos", 120, 180);
        let verdict = volatile(TrendDirection::Up);
        let decision = decide(&input(&pool, Some(&position), PairToken::A, &verdict));
        assert!(matches!(decision, Decision::Hold(HoldReason::Volatile { .. })));
    }

    #[test]
    fn test_volatile_exit_to_priority() {
        let pool = PoolSnapshot::new("pool", 130, 60);
        let position = PositionSnapshot::new("pos", 120, 180);
        let verdict = volatile(TrendDirection::Up);
        let mut input = input(&pool, Some(&position), PairToken::A, &verdict);
        input.policy = VolatilityPolicy::ExitToPriority;

        let decision = decide(&input);
        assert_eq!(
            decision,
            Decision::ExitToPriority {
                swap: SwapDirection::BToA
            }
        );
        assert_eq!(
            decision.steps(),
            vec![Step::Close, Step::Swap(SwapDirection::BToA)]
        );
    }

    #[test]
    fn test_exit_requires_adverse_direction() {
        let pool = PoolSnapshot::new("pool", 130, 60);
        let position = PositionSnapshot::new("pos", 120, 180);
        let verdict = volatile(TrendDirection::Down);
        let mut input = input(&pool, Some(&position), PairToken::A, &verdict);
        input.policy = VolatilityPolicy::ExitToPriority;
        assert!(decide(&input).is_hold());
    }

    #[test]
    fn test_exit_skipped_when_already_in_priority() {
        // Priority A, price left of the range: already fully in A.
        let pool = PoolSnapshot::new("pool", 0, 60);
        let position = PositionSnapshot::new("pos", 120, 180);
        let verdict = volatile(TrendDirection::Up);
        let mut input = input(&pool, Some(&position), PairToken::A, &verdict);
        input.policy = VolatilityPolicy::ExitToPriority;
        assert!(decide(&input).is_hold());
    }

    #[test]
    fn test_exit_requires_position() {
        let pool = PoolSnapshot::new("pool", 175, 60);
        let verdict = volatile(TrendDirection::Up);
        let mut input = input(&pool, None, PairToken::A, &verdict);
        input.policy = VolatilityPolicy::ExitToPriority;
        assert!(decide(&input).is_hold());
    }

    #[test]
    fn test_decide_is_idempotent() {
        let pool = PoolSnapshot::new("pool", 195, 60);
        let position = PositionSnapshot::new("pos", 60, 120);
        let verdict = steady();
        for priority in [PairToken::A, PairToken::B] {
            let input = input(&pool, Some(&position), priority, &verdict);
            assert_eq!(decide(&input), decide(&input));
        }
    }
}
