//! Key-value store used for throttle counters, cooldown flags and
//! volatility sample windows.
//!
//! Every value is a JSON value with an optional TTL; a missing or expired
//! key is indistinguishable from one that was never written.

mod memory;

pub use memory::MemoryStore;

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

/// Errors returned by a key-value store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Backend is unavailable or rejected the request.
    #[error("store backend error: {0}")]
    Backend(String),
    /// A stored value had an unexpected shape.
    #[error("failed to decode value at {key}: {source}")]
    Decode {
        key: String,
        #[source]
        source: serde_json::Error,
    },
    /// A value could not be encoded.
    #[error("failed to encode value for {key}: {source}")]
    Encode {
        key: String,
        #[source]
        source: serde_json::Error,
    },
    /// `increment` hit a non-integer value.
    #[error("value at {0} is not an integer")]
    NotAnInteger(String),
}

/// TTL-aware key-value store.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Returns the value at `key`, if present and not expired.
    async fn get(&self, key: &str) -> Result<Option<Value>, StoreError>;

    /// Writes `value`, replacing any previous value and expiry.
    async fn set(&self, key: &str, value: Value, ttl: Option<Duration>) -> Result<(), StoreError>;

    /// Removes `key`. Removing a missing key is not an error.
    async fn delete(&self, key: &str) -> Result<(), StoreError>;

    /// Atomically adds `by` to the integer at `key` and returns the new value.
    ///
    /// A missing key starts at zero and receives `ttl`; an existing key
    /// keeps its current expiry.
    async fn increment(&self, key: &str, by: i64, ttl: Option<Duration>)
    -> Result<i64, StoreError>;

    /// Remaining lifetime of `key`. `None` if missing or without expiry.
    async fn ttl(&self, key: &str) -> Result<Option<Duration>, StoreError>;
}

/// Reads and decodes a typed value.
pub async fn get_typed<T: DeserializeOwned>(
    store: &dyn KeyValueStore,
    key: &str,
) -> Result<Option<T>, StoreError> {
    match store.get(key).await? {
        Some(value) => serde_json::from_value(value)
            .map(Some)
            .map_err(|source| StoreError::Decode {
                key: key.to_string(),
                source,
            }),
        None => Ok(None),
    }
}

/// Encodes and writes a typed value.
pub async fn set_typed<T: Serialize>(
    store: &dyn KeyValueStore,
    key: &str,
    value: &T,
    ttl: Option<Duration>,
) -> Result<(), StoreError> {
    let value = serde_json::to_value(value).map_err(|source| StoreError::Encode {
        key: key.to_string(),
        source,
    })?;
    store.set(key, value, ttl).await
}
