//! In-memory journal of completed transaction steps.
//!
//! Each pair keeps only its most recent events, so a long-running process
//! holds a bounded history.

use super::{EventData, LifecycleEvent, LifecycleEventType};
use chrono::{DateTime, Utc};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;

/// Events retained per pair unless configured otherwise.
pub const DEFAULT_EVENTS_PER_PAIR: usize = 256;

/// Per-pair counts of journaled steps.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PairActivity {
    /// Positions closed.
    pub closes: u32,
    /// Swaps performed.
    pub swaps: u32,
    /// Positions opened.
    pub opens: u32,
    /// Timestamp of the most recent event.
    pub last_event_at: Option<DateTime<Utc>>,
}

/// Records lifecycle events for all pairs.
pub struct ActionJournal {
    /// Events by pair key, oldest first.
    events: Arc<RwLock<HashMap<String, VecDeque<LifecycleEvent>>>>,
    /// Oldest events are dropped past this many per pair.
    capacity: usize,
}

impl ActionJournal {
    /// Creates an empty journal keeping `DEFAULT_EVENTS_PER_PAIR` events per pair.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_EVENTS_PER_PAIR)
    }

    /// Creates an empty journal keeping at most `capacity` events per pair.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            events: Arc::new(RwLock::new(HashMap::new())),
            capacity: capacity.max(1),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Appends an event for `pair` at `at`.
    pub async fn record(
        &self,
        pair: &str,
        pool_id: &str,
        digest: &str,
        data: EventData,
        at: DateTime<Utc>,
    ) -> LifecycleEvent {
        let event = LifecycleEvent::new(pair, pool_id, digest, data).at(at);

        match &event.data {
            EventData::PositionClosed(closed) => info!(
                pair,
                digest,
                position = %closed.position_id,
                range = format!("[{}, {}]", closed.tick_lower, closed.tick_upper),
                "Position closed"
            ),
            EventData::Swapped(swap) => info!(
                pair,
                digest,
                direction = ?swap.direction,
                amount = %swap.amount,
                "Swapped"
            ),
            EventData::PositionOpened(opened) => info!(
                pair,
                digest,
                range = format!("[{}, {}]", opened.tick_lower, opened.tick_upper),
                deposit = ?opened.deposit,
                amount = %opened.amount,
                tick = opened.tick_at_creation,
                "Position opened"
            ),
        }

        let mut events = self.events.write().await;
        let history = events.entry(pair.to_string()).or_default();
        if history.len() >= self.capacity {
            history.pop_front();
        }
        history.push_back(event.clone());
        event
    }

    /// Gets the retained events for a pair, oldest first.
    pub async fn get_events(&self, pair: &str) -> Vec<LifecycleEvent> {
        self.events
            .read()
            .await
            .get(pair)
            .map(|events| events.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Most recent open for a pair, if any.
    pub async fn last_open(&self, pair: &str) -> Option<LifecycleEvent> {
        self.events.read().await.get(pair).and_then(|events| {
            events
                .iter()
                .rev()
                .find(|e| e.event_type == LifecycleEventType::PositionOpened)
                .cloned()
        })
    }

    /// Counts of retained steps for a pair.
    pub async fn activity(&self, pair: &str) -> PairActivity {
        let events = self.events.read().await;
        let mut activity = PairActivity::default();
        for event in events.get(pair).into_iter().flatten() {
            match event.event_type {
                LifecycleEventType::PositionClosed => activity.closes += 1,
                LifecycleEventType::Swapped => activity.swaps += 1,
                LifecycleEventType::PositionOpened => activity.opens += 1,
            }
            activity.last_event_at = Some(event.timestamp);
        }
        activity
    }

    /// Total number of events across pairs.
    pub async fn len(&self) -> usize {
        self.events.read().await.values().map(VecDeque::len).sum()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl Default for ActionJournal {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::{PositionClosedData, PositionOpenedData, SwapData};
    use clmm_rebalancer_domain::enums::{PairToken, SwapDirection};
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn test_journal_records_in_order() {
        let journal = ActionJournal::new();
        let now = Utc::now();

        journal
            .record(
                "pair",
                "pool",
                "close-digest",
                EventData::PositionClosed(PositionClosedData {
                    position_id: "pos-1".to_string(),
                    tick_lower: 0,
                    tick_upper: 60,
                    liquidity: 1_000,
                }),
                now,
            )
            .await;
        journal
            .record(
                "pair",
                "pool",
                "open-digest",
                EventData::PositionOpened(PositionOpenedData {
                    tick_lower: 120,
                    tick_upper: 180,
                    deposit: PairToken::A,
                    amount: dec!(5),
                    tick_at_creation: 100,
                }),
                now,
            )
            .await;

        let events = journal.get_events("pair").await;
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].digest, "close-digest");
        assert_eq!(events[1].event_type, LifecycleEventType::PositionOpened);

        let activity = journal.activity("pair").await;
        assert_eq!(activity.closes, 1);
        assert_eq!(activity.opens, 1);
        assert_eq!(activity.swaps, 0);
        assert_eq!(activity.last_event_at, Some(now));

        let last = journal.last_open("pair").await.unwrap();
        assert_eq!(last.digest, "open-digest");
        assert!(journal.get_events("other").await.is_empty());
        assert_eq!(journal.len().await, 2);
    }

    #[tokio::test]
    async fn test_journal_drops_oldest_past_capacity() {
        let journal = ActionJournal::with_capacity(3);
        let now = Utc::now();

        for i in 0..5 {
            journal
                .record(
                    "pair",
                    "pool",
                    &format!("swap-{i}"),
                    EventData::Swapped(SwapData {
                        direction: SwapDirection::BToA,
                        amount: dec!(1),
                    }),
                    now,
                )
                .await;
        }
        journal
            .record(
                "other",
                "pool",
                "swap-other",
                EventData::Swapped(SwapData {
                    direction: SwapDirection::AToB,
                    amount: dec!(1),
                }),
                now,
            )
            .await;

        let digests: Vec<_> = journal
            .get_events("pair")
            .await
            .into_iter()
            .map(|e| e.digest)
            .collect();
        assert_eq!(digests, vec!["swap-2", "swap-3", "swap-4"]);
        assert_eq!(journal.activity("pair").await.swaps, 3);
        assert_eq!(journal.get_events("other").await.len(), 1);
        assert_eq!(journal.len().await, 4);
    }
}
