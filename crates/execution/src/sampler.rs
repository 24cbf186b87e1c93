//! Pool state samplers.
//!
//! A sampler delivers, once per poll, the snapshot of every managed pair
//! keyed by pair/profile key. A `None` entry means the pair could not be
//! sampled this cycle and is skipped.

use anyhow::Context;
use async_trait::async_trait;
use clmm_rebalancer_domain::entities::{PairConfig, PoolSnapshot, PositionSnapshot};
use clmm_rebalancer_domain::enums::VolatilityPolicy;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::debug;

/// Snapshots for one poll, in pair key order.
pub type SnapshotMap = BTreeMap<String, Option<PairEntry>>;

/// Per-pair strategy parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StrategyProfile {
    /// Profile name.
    pub name: String,
    /// Ticks per second, per 40 ticks of spacing, that count as volatile.
    pub volatility_threshold: f64,
    /// Sample window considered by the volatility check, in seconds.
    pub volatility_window_secs: u64,
    /// Reaction to a volatile verdict.
    pub volatility_policy: VolatilityPolicy,
}

impl Default for StrategyProfile {
    fn default() -> Self {
        Self {
            name: "default".to_string(),
            volatility_threshold: 3.0,
            volatility_window_secs: 60,
            volatility_policy: VolatilityPolicy::Skip,
        }
    }
}

impl StrategyProfile {
    pub fn volatility_window(&self) -> Duration {
        Duration::from_secs(self.volatility_window_secs)
    }
}

/// Sampled state of a managed pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairEntry {
    pub pool: PoolSnapshot,
    #[serde(default)]
    pub position: Option<PositionSnapshot>,
    pub config: PairConfig,
    #[serde(default)]
    pub profile: StrategyProfile,
}

/// Source of per-cycle snapshots.
#[async_trait]
pub trait PoolStateSampler: Send + Sync {
    /// Samples all managed pairs.
    async fn sample(&self) -> anyhow::Result<SnapshotMap>;
}

/// Reads the snapshot map from a JSON file on every poll.
pub struct FileSampler {
    path: PathBuf,
}

impl FileSampler {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl PoolStateSampler for FileSampler {
    async fn sample(&self) -> anyhow::Result<SnapshotMap> {
        let raw = tokio::fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("Failed to read snapshots from {}", self.path.display()))?;
        let snapshots: SnapshotMap = serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse snapshots in {}", self.path.display()))?;
        debug!(path = %self.path.display(), pairs = snapshots.len(), "Loaded snapshots");
        Ok(snapshots)
    }
}

/// Serves a snapshot map held in memory.
#[derive(Default)]
pub struct StaticSampler {
    snapshots: RwLock<SnapshotMap>,
}

impl StaticSampler {
    pub fn new(snapshots: SnapshotMap) -> Self {
        Self {
            snapshots: RwLock::new(snapshots),
        }
    }

    /// Replaces the whole map.
    pub async fn set(&self, snapshots: SnapshotMap) {
        *self.snapshots.write().await = snapshots;
    }

    /// Inserts or replaces one pair's entry.
    pub async fn update(&self, key: impl Into<String>, entry: Option<PairEntry>) {
        self.snapshots.write().await.insert(key.into(), entry);
    }
}

#[async_trait]
impl PoolStateSampler for StaticSampler {
    async fn sample(&self) -> anyhow::Result<SnapshotMap> {
        Ok(self.snapshots.read().await.clone())
    }
}
