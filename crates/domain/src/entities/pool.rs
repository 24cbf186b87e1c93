use crate::error::DomainError;
use crate::math::price_tick::tick_to_price;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Pool state sampled once per poll cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolSnapshot {
    pub pool_id: String,
    pub current_tick: i32,
    pub tick_spacing: i32,
    #[serde(default)]
    pub fee_rate_bps: u32,
}

impl PoolSnapshot {
    pub fn new(pool_id: impl Into<String>, current_tick: i32, tick_spacing: i32) -> Self {
        Self {
            pool_id: pool_id.into(),
            current_tick,
            tick_spacing,
            fee_rate_bps: 0,
        }
    }

    /// Checks that the tick spacing is usable for bucket arithmetic.
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.tick_spacing <= 0 {
            return Err(DomainError::InvalidTickSpacing(
                self.tick_spacing,
                self.pool_id.clone(),
            ));
        }
        Ok(())
    }

    /// Price ratio (token B per token A) at the current tick.
    pub fn price(&self) -> Result<Decimal, DomainError> {
        tick_to_price(self.current_tick).map_err(DomainError::PriceConversion)
    }
}
