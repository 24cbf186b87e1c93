use serde::{Deserialize, Serialize};
use std::fmt;

/// One of the two tokens of a pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PairToken {
    A,
    B,
}

impl PairToken {
    #[must_use]
    pub fn opposite(self) -> Self {
        match self {
            PairToken::A => PairToken::B,
            PairToken::B => PairToken::A,
        }
    }
}

/// Side of a position the current tick has exited toward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    /// Price fell below the lower bound.
    Left,
    /// Price rose above the upper bound.
    Right,
}

impl Side {
    /// Token a position is fully converted into once the price leaves on this side.
    pub fn held_token(self) -> PairToken {
        match self {
            Side::Left => PairToken::A,
            Side::Right => PairToken::B,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Left => f.write_str("left"),
            Side::Right => f.write_str("right"),
        }
    }
}

/// Short-term trend of the tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Up,
    Down,
}

impl TrendDirection {
    /// Direction that converts a position into the token opposite to `priority`.
    pub fn against(priority: PairToken) -> Self {
        match priority {
            PairToken::A => TrendDirection::Up,
            PairToken::B => TrendDirection::Down,
        }
    }
}

impl fmt::Display for TrendDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrendDirection::Up => f.write_str("up"),
            TrendDirection::Down => f.write_str("down"),
        }
    }
}

/// Direction of a swap between the pair's tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SwapDirection {
    AToB,
    BToA,
}

impl SwapDirection {
    /// Swap that turns `from` into the other token.
    pub fn from_token(from: PairToken) -> Self {
        match from {
            PairToken::A => SwapDirection::AToB,
            PairToken::B => SwapDirection::BToA,
        }
    }

    pub fn source(self) -> PairToken {
        match self {
            SwapDirection::AToB => PairToken::A,
            SwapDirection::BToA => PairToken::B,
        }
    }
}

/// How the engine reacts to a volatile verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VolatilityPolicy {
    /// Never act while volatile.
    #[default]
    Skip,
    /// Close and swap into the priority token when the trend runs against it.
    ExitToPriority,
}
