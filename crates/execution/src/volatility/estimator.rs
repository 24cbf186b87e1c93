//! Store-backed volatility estimator.

use super::{SampleWindow, TickSample, VolatilityVerdict};
use crate::store::{KeyValueStore, StoreError, get_typed, set_typed};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Default lifetime of a stored sample window.
pub const DEFAULT_SAMPLE_TTL: Duration = Duration::from_secs(60 * 60);

/// Maintains one [`SampleWindow`] per pair in the shared store.
pub struct VolatilityEstimator {
    store: Arc<dyn KeyValueStore>,
    sample_ttl: Duration,
}

impl VolatilityEstimator {
    /// Creates an estimator persisting windows for `sample_ttl`.
    pub fn new(store: Arc<dyn KeyValueStore>, sample_ttl: Duration) -> Self {
        Self { store, sample_ttl }
    }

    fn key(pair_key: &str) -> String {
        format!("volatility:{pair_key}")
    }

    /// Loads the current window for a pair (empty if none stored).
    pub async fn window(&self, pair_key: &str) -> Result<SampleWindow, StoreError> {
        Ok(get_typed(self.store.as_ref(), &Self::key(pair_key))
            .await?
            .unwrap_or_default())
    }

    /// Appends a tick observed at `now_ms`.
    pub async fn add_sample(
        &self,
        pair_key: &str,
        tick: i32,
        now_ms: i64,
    ) -> Result<(), StoreError> {
        let mut window = self.window(pair_key).await?;
        window.push(TickSample {
            timestamp_ms: now_ms,
            tick,
        });
        debug!(pair = pair_key, tick, samples = window.len(), "Recorded tick sample");
        set_typed(
            self.store.as_ref(),
            &Self::key(pair_key),
            &window,
            Some(self.sample_ttl),
        )
        .await
    }

    /// Evaluates the pair's window at `now_ms`.
    pub async fn check_volatility(
        &self,
        pair_key: &str,
        tick_spacing: i32,
        window: Duration,
        threshold: f64,
        now_ms: i64,
    ) -> Result<VolatilityVerdict, StoreError> {
        let samples = self.window(pair_key).await?;
        let window_ms = i64::try_from(window.as_millis()).unwrap_or(i64::MAX);
        Ok(samples.verdict(now_ms, window_ms, tick_spacing, threshold))
    }

    /// Drops the stored window for a pair.
    pub async fn reset(&self, pair_key: &str) -> Result<(), StoreError> {
        self.store.delete(&Self::key(pair_key)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use clmm_rebalancer_domain::enums::TrendDirection;

    fn estimator() -> VolatilityEstimator {
        VolatilityEstimator::new(Arc::new(MemoryStore::new()), DEFAULT_SAMPLE_TTL)
    }

    #[tokio::test]
    async fn test_add_and_check() {
        let est = estimator();
        let window = Duration::from_secs(60);

        est.add_sample("sui-usdc", 100, 0).await.unwrap();
        let verdict = est
            .check_volatility("sui-usdc", 40, window, 3.0, 0)
            .await
            .unwrap();
        assert!(verdict.is_loading);

        est.add_sample("sui-usdc", 130, 10_000).await.unwrap();
        let verdict = est
            .check_volatility("sui-usdc", 40, window, 3.0, 10_000)
            .await
            .unwrap();
        assert!(verdict.is_volatile);
        assert_eq!(verdict.direction, Some(TrendDirection::Up));
    }

    #[tokio::test]
    async fn test_windows_are_per_pair() {
        let est = estimator();
        for i in 0..150 {
            est.add_sample("a", i, i64::from(i) * 1_000).await.unwrap();
        }
        est.add_sample("b", 1, 0).await.unwrap();

        assert_eq!(est.window("a").await.unwrap().len(), 100);
        assert_eq!(est.window("b").await.unwrap().len(), 1);

        est.reset("a").await.unwrap();
        assert!(est.window("a").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_repeated_checks_are_reproducible() {
        let est = estimator();
        est.add_sample("p", 10, 0).await.unwrap();
        est.add_sample("p", 25, 3_000).await.unwrap();
        let window = Duration::from_secs(60);
        let first = est.check_volatility("p", 60, window, 3.0, 4_000).await.unwrap();
        let second = est.check_volatility("p", 60, window, 3.0, 4_000).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test(start_paused = true)]
    async fn test_window_expires_with_ttl() {
        let est = VolatilityEstimator::new(Arc::new(MemoryStore::new()), Duration::from_secs(5));
        est.add_sample("p", 10, 0).await.unwrap();
        tokio::time::advance(Duration::from_secs(6)).await;
        assert!(est.window("p").await.unwrap().is_empty());
    }
}
