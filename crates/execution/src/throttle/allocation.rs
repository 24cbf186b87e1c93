//! Cap on fresh capital allocations per window.

use crate::store::{KeyValueStore, StoreError};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Counts positions opened from an idle balance.
pub struct AllocationCounter {
    store: Arc<dyn KeyValueStore>,
    scope: String,
    cap: u32,
    window: Duration,
}

impl AllocationCounter {
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        scope: impl Into<String>,
        cap: u32,
        window: Duration,
    ) -> Self {
        Self {
            store,
            scope: scope.into(),
            cap,
            window,
        }
    }

    fn key(&self) -> String {
        format!("allocations:{}", self.scope)
    }

    pub async fn count(&self) -> Result<i64, StoreError> {
        Ok(self
            .store
            .get(&self.key())
            .await?
            .and_then(|value| value.as_i64())
            .unwrap_or(0))
    }

    /// Whether the cap for the current window has been reached.
    pub async fn is_exceeded(&self) -> Result<bool, StoreError> {
        Ok(self.count().await? >= i64::from(self.cap))
    }

    /// Records one allocation and returns the new count.
    pub async fn record(&self) -> Result<i64, StoreError> {
        let count = self
            .store
            .increment(&self.key(), 1, Some(self.window))
            .await?;
        info!(scope = %self.scope, count, cap = self.cap, "Allocation recorded");
        Ok(count)
    }

    pub async fn reset(&self) -> Result<(), StoreError> {
        self.store.delete(&self.key()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[tokio::test(start_paused = true)]
    async fn test_cap_and_window() {
        let counter = AllocationCounter::new(
            Arc::new(MemoryStore::new()),
            "venue",
            1,
            Duration::from_secs(15 * 60),
        );
        assert!(!counter.is_exceeded().await.unwrap());
        counter.record().await.unwrap();
        assert!(counter.is_exceeded().await.unwrap());

        tokio::time::advance(Duration::from_secs(15 * 60 + 1)).await;
        assert!(!counter.is_exceeded().await.unwrap());
        assert_eq!(counter.count().await.unwrap(), 0);
    }
}
