//! Fixed-window transaction counter.

use super::ThrottleError;
use crate::store::{KeyValueStore, StoreError};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// Remaining budget of a limiter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LimiterStatus {
    pub scope: String,
    pub remaining: i64,
    /// Time until the window resets, `None` when untouched.
    pub resets_in: Option<Duration>,
}

impl LimiterStatus {
    pub fn is_exhausted(&self) -> bool {
        self.remaining <= 0
    }
}

/// Allows `points` consumptions per `window`.
///
/// The window opens on the first consume after a reset and closes when
/// its store key expires.
pub struct RateLimiter {
    store: Arc<dyn KeyValueStore>,
    scope: String,
    points: u32,
    window: Duration,
    /// Serializes read-then-increment sequences.
    guard: Mutex<()>,
}

impl RateLimiter {
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        scope: impl Into<String>,
        points: u32,
        window: Duration,
    ) -> Self {
        Self {
            store,
            scope: scope.into(),
            points,
            window,
            guard: Mutex::new(()),
        }
    }

    pub fn scope(&self) -> &str {
        &self.scope
    }

    fn key(&self) -> String {
        format!("ratelimit:{}", self.scope)
    }

    async fn read_status(&self) -> Result<LimiterStatus, StoreError> {
        let key = self.key();
        let consumed = self
            .store
            .get(&key)
            .await?
            .and_then(|value| value.as_i64())
            .unwrap_or(0);
        Ok(LimiterStatus {
            scope: self.scope.clone(),
            remaining: i64::from(self.points) - consumed,
            resets_in: self.store.ttl(&key).await?,
        })
    }

    /// Current budget.
    pub async fn status(&self) -> Result<LimiterStatus, StoreError> {
        let _lock = self.guard.lock().await;
        self.read_status().await
    }

    /// Points left in the current window.
    pub async fn remaining(&self) -> Result<i64, StoreError> {
        Ok(self.status().await?.remaining)
    }

    /// Consumes `points`, failing without side effects when not enough remain.
    pub async fn consume(&self, points: u32) -> Result<LimiterStatus, ThrottleError> {
        let _lock = self.guard.lock().await;
        let status = self.read_status().await?;
        if status.remaining < i64::from(points) {
            warn!(
                scope = %self.scope,
                remaining = status.remaining,
                resets_in = ?status.resets_in,
                "Rate limit exhausted"
            );
            return Err(ThrottleError::Exhausted {
                scope: self.scope.clone(),
                remaining: status.remaining,
                resets_in: status.resets_in,
            });
        }

        let consumed = self
            .store
            .increment(&self.key(), i64::from(points), Some(self.window))
            .await?;
        let remaining = i64::from(self.points) - consumed;
        debug!(scope = %self.scope, remaining, "Consumed rate limit points");

        Ok(LimiterStatus {
            scope: self.scope.clone(),
            remaining,
            resets_in: self.store.ttl(&self.key()).await?,
        })
    }

    /// Clears the window.
    pub async fn reset(&self) -> Result<(), StoreError> {
        let _lock = self.guard.lock().await;
        self.store.delete(&self.key()).await
    }
}
