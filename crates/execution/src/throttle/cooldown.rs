//! Per-pair cooldown flag.

use crate::store::{KeyValueStore, StoreError};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Suppresses rebalancing of a pair for a fixed period after an action.
pub struct Cooldown {
    store: Arc<dyn KeyValueStore>,
    duration: Duration,
}

impl Cooldown {
    pub fn new(store: Arc<dyn KeyValueStore>, duration: Duration) -> Self {
        Self { store, duration }
    }

    fn key(pair_key: &str) -> String {
        format!("cooldown:{pair_key}")
    }

    /// Starts (or restarts) the cooldown for `pair_key`.
    pub async fn start(&self, pair_key: &str) -> Result<(), StoreError> {
        self.store
            .set(&Self::key(pair_key), Value::Bool(true), Some(self.duration))
            .await?;
        info!(pair = pair_key, duration = ?self.duration, "Cooldown started");
        Ok(())
    }

    pub async fn is_active(&self, pair_key: &str) -> Result<bool, StoreError> {
        Ok(self.store.get(&Self::key(pair_key)).await?.is_some())
    }

    /// Time left on the cooldown, if active.
    pub async fn remaining(&self, pair_key: &str) -> Result<Option<Duration>, StoreError> {
        self.store.ttl(&Self::key(pair_key)).await
    }

    pub async fn clear(&self, pair_key: &str) -> Result<(), StoreError> {
        self.store.delete(&Self::key(pair_key)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[tokio::test(start_paused = true)]
    async fn test_cooldown_expires() {
        let cooldown = Cooldown::new(Arc::new(MemoryStore::new()), Duration::from_secs(300));
        assert!(!cooldown.is_active("p").await.unwrap());

        cooldown.start("p").await.unwrap();
        assert!(cooldown.is_active("p").await.unwrap());
        assert!(!cooldown.is_active("other").await.unwrap());

        tokio::time::advance(Duration::from_secs(299)).await;
        assert!(cooldown.is_active("p").await.unwrap());
        tokio::time::advance(Duration::from_secs(2)).await;
        assert!(!cooldown.is_active("p").await.unwrap());
    }

    #[tokio::test]
    async fn test_clear() {
        let cooldown = Cooldown::new(Arc::new(MemoryStore::new()), Duration::from_secs(300));
        cooldown.start("p").await.unwrap();
        cooldown.clear("p").await.unwrap();
        assert!(!cooldown.is_active("p").await.unwrap());
    }
}
