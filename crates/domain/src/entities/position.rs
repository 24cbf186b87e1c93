use crate::error::DomainError;
use serde::{Deserialize, Serialize};

/// The open position of a pair, if any.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionSnapshot {
    pub position_id: String,
    pub tick_lower: i32,
    pub tick_upper: i32,
    #[serde(default)]
    pub liquidity: u128,
}

impl PositionSnapshot {
    pub fn new(position_id: impl Into<String>, tick_lower: i32, tick_upper: i32) -> Self {
        Self {
            position_id: position_id.into(),
            tick_lower,
            tick_upper,
            liquidity: 0,
        }
    }

    /// Ensures `lower < upper` and both bounds sit on the spacing grid.
    pub fn validate(&self, tick_spacing: i32) -> Result<(), DomainError> {
        let aligned = tick_spacing > 0
            && self.tick_lower.rem_euclid(tick_spacing) == 0
            && self.tick_upper.rem_euclid(tick_spacing) == 0;
        if self.tick_lower >= self.tick_upper || !aligned {
            return Err(DomainError::InvalidPositionRange {
                lower: self.tick_lower,
                upper: self.tick_upper,
                spacing: tick_spacing,
            });
        }
        Ok(())
    }

    pub fn width(&self) -> i32 {
        self.tick_upper - self.tick_lower
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_accepts_aligned_range() {
        assert!(PositionSnapshot::new("p", -120, 60).validate(60).is_ok());
    }

    #[test]
    fn test_validate_rejects_inverted_or_misaligned() {
        assert!(PositionSnapshot::new("p", 120, 60).validate(60).is_err());
        assert!(PositionSnapshot::new("p", 60, 60).validate(60).is_err());
        assert!(PositionSnapshot::new("p", 10, 70).validate(60).is_err());
    }
}
