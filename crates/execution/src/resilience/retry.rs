//! Bounded retry with exponential backoff and jitter.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

/// Retry policy for remote calls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Retries after the first attempt.
    pub max_retries: u32,
    /// Delay before the first retry in milliseconds.
    pub base_delay_ms: u64,
    /// Multiplier applied per retry.
    pub factor: f64,
    /// Upper bound of the un-jittered delay in milliseconds.
    pub max_delay_ms: u64,
    /// Multiply each delay by a random factor in `[1, 2)`.
    pub jitter: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 5,
            base_delay_ms: 100,
            factor: 2.0,
            max_delay_ms: 1_000, // 10x base
            jitter: true,
        }
    }
}

impl RetryPolicy {
    /// Policy that runs the operation exactly once.
    #[must_use]
    pub fn no_retry() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    /// Delay before retry number `retry` (0-based), before jitter.
    pub fn base_delay(&self, retry: u32) -> Duration {
        let exponent = i32::try_from(retry).unwrap_or(i32::MAX);
        let millis = self.base_delay_ms as f64 * self.factor.powi(exponent);
        let capped = millis.min(self.max_delay_ms as f64).max(0.0);
        Duration::from_millis(capped as u64)
    }

    /// Delay before retry number `retry`, jittered when enabled.
    pub fn delay_for<R: Rng>(&self, retry: u32, rng: &mut R) -> Duration {
        let delay = self.base_delay(retry);
        if self.jitter {
            delay.mul_f64(rng.random_range(1.0..2.0))
        } else {
            delay
        }
    }
}

/// Runs `operation` until it succeeds or `policy.max_retries` retries
/// have failed.
///
/// The closure receives the 1-based attempt number, so at most
/// `max_retries + 1` calls are made. The last error is
/// returned when every attempt fails. Preconditions that can never succeed
/// must be checked by the caller before calling this.
pub async fn retry<T, E, F, Fut>(policy: &RetryPolicy, label: &str, mut operation: F) -> Result<T, E>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    let max_attempts = policy.max_retries.saturating_add(1);
    let mut attempt = 1;
    loop {
        match operation(attempt).await {
            Ok(value) => {
                if attempt > 1 {
                    debug!(operation = label, attempt, "Succeeded after retry");
                }
                return Ok(value);
            }
            Err(e) if attempt >= max_attempts => {
                warn!(operation = label, attempts = attempt, error = %e, "Retries exhausted");
                return Err(e);
            }
            Err(e) => {
                let delay = policy.delay_for(attempt - 1, &mut rand::rng());
                warn!(
                    operation = label,
                    attempt,
                    max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    error = %e,
                    "Attempt failed, retrying"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn test_default_policy() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_retries, 5);
        assert_eq!(policy.base_delay(0), Duration::from_millis(100));
        assert_eq!(policy.base_delay(1), Duration::from_millis(200));
        assert_eq!(policy.base_delay(3), Duration::from_millis(800));
        assert_eq!(policy.base_delay(4), Duration::from_millis(1_000));
        assert_eq!(policy.base_delay(40), Duration::from_millis(1_000));
    }

    #[test]
    fn test_jitter_bounds() {
        let policy = RetryPolicy::default();
        let mut rng = StdRng::seed_from_u64(7);
        for retry in 0..6 {
            let base = policy.base_delay(retry);
            for _ in 0..50 {
                let delay = policy.delay_for(retry, &mut rng);
                assert!(delay >= base && delay < base * 2);
            }
        }
        let fixed = RetryPolicy {
            jitter: false,
            ..Default::default()
        };
        assert_eq!(fixed.delay_for(2, &mut rng), Duration::from_millis(400));
    }

    #[tokio::test(start_paused = true)]
    async fn test_succeeds_after_transient_failures() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();
        let result: Result<&str, String> = retry(&RetryPolicy::default(), "op", |attempt| {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                if attempt < 3 {
                    Err(format!("transient {attempt}"))
                } else {
                    Ok("done")
                }
            }
        })
        .await;
        assert_eq!(result, Ok("done"));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_returns_last_error_after_max_retries() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();
        let start = tokio::time::Instant::now();
        let result: Result<(), String> = retry(&RetryPolicy::default(), "op", |attempt| {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(format!("failure {attempt}"))
            }
        })
        .await;
        assert_eq!(result, Err("failure 6".to_string()));
        assert_eq!(calls.load(Ordering::SeqCst), 6);
        // 100 + 200 + 400 + 800 + 1000 before jitter
        assert!(start.elapsed() >= Duration::from_millis(2_500));
        assert!(start.elapsed() < Duration::from_millis(5_000));
    }

    #[tokio::test]
    async fn test_no_retry_policy() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();
        let result: Result<(), &str> = retry(&RetryPolicy::no_retry(), "op", |_| {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err("nope")
            }
        })
        .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
