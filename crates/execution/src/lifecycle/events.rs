//! Lifecycle events recorded for completed transaction steps.

use chrono::{DateTime, Utc};
use clmm_rebalancer_domain::enums::{PairToken, SwapDirection};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Type of lifecycle event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LifecycleEventType {
    /// Position was closed and its liquidity withdrawn.
    PositionClosed,
    /// Held token was swapped.
    Swapped,
    /// Single-sided position was opened.
    PositionOpened,
}

/// A lifecycle event for a pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LifecycleEvent {
    /// Event ID.
    pub id: Uuid,
    /// Event type.
    pub event_type: LifecycleEventType,
    /// Pair key the event belongs to.
    pub pair: String,
    /// Pool the transaction targeted.
    pub pool_id: String,
    /// Transaction digest returned by the executor.
    pub digest: String,
    /// Timestamp.
    pub timestamp: DateTime<Utc>,
    /// Event-specific data.
    pub data: EventData,
}

impl LifecycleEvent {
    /// Creates a new lifecycle event stamped with the current time.
    pub fn new(
        pair: impl Into<String>,
        pool_id: impl Into<String>,
        digest: impl Into<String>,
        data: EventData,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            event_type: data.event_type(),
            pair: pair.into(),
            pool_id: pool_id.into(),
            digest: digest.into(),
            timestamp: Utc::now(),
            data,
        }
    }

    /// Overrides the event timestamp.
    #[must_use]
    pub fn at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }
}

/// Event-specific data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EventData {
    /// Position closed data.
    PositionClosed(PositionClosedData),
    /// Swap data.
    Swapped(SwapData),
    /// Position opened data.
    PositionOpened(PositionOpenedData),
}

impl EventData {
    /// Event type matching this payload.
    pub fn event_type(&self) -> LifecycleEventType {
        match self {
            EventData::PositionClosed(_) => LifecycleEventType::PositionClosed,
            EventData::Swapped(_) => LifecycleEventType::Swapped,
            EventData::PositionOpened(_) => LifecycleEventType::PositionOpened,
        }
    }
}

/// Data for position closed event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionClosedData {
    /// Closed position id.
    pub position_id: String,
    /// Lower tick of the closed range.
    pub tick_lower: i32,
    /// Upper tick of the closed range.
    pub tick_upper: i32,
    /// Liquidity withdrawn.
    pub liquidity: u128,
}

/// Data for swap event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapData {
    /// Swap direction.
    pub direction: SwapDirection,
    /// Amount of the source token sold.
    pub amount: Decimal,
}

/// Data for position opened event.
///
/// Mirrors a liquidity-range record: the range, the deposit and the pool
/// tick at the time the range was created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionOpenedData {
    /// Lower tick.
    pub tick_lower: i32,
    /// Upper tick.
    pub tick_upper: i32,
    /// Token deposited.
    pub deposit: PairToken,
    /// Amount deposited.
    pub amount: Decimal,
    /// Pool tick when the range was created.
    pub tick_at_creation: i32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_lifecycle_event_creation() {
        let event = LifecycleEvent::new(
            "SUI/USDC/25",
            "pool-1",
            "0xabc",
            EventData::PositionOpened(PositionOpenedData {
                tick_lower: 180,
                tick_upper: 240,
                deposit: PairToken::A,
                amount: dec!(12.5),
                tick_at_creation: 130,
            }),
        );

        assert_eq!(event.event_type, LifecycleEventType::PositionOpened);
        assert_eq!(event.digest, "0xabc");
    }

    #[test]
    fn test_event_serializes_with_type() {
        let event = LifecycleEvent::new(
            "pair",
            "pool",
            "digest",
            EventData::Swapped(SwapData {
                direction: SwapDirection::BToA,
                amount: dec!(3),
            }),
        );
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event_type"], "Swapped");
        assert_eq!(json["pair"], "pair");
    }
}
