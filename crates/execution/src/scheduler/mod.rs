//! Poll loop driving the engine.
//!
//! One task samples all pairs on a fixed interval and hands the snapshot
//! map to the engine. Ticks missed while a cycle runs are skipped, never
//! queued.

use crate::config::RunnerConfig;
use crate::error::EngineError;
use crate::sampler::PoolStateSampler;
use crate::strategy::{CycleReport, RebalanceEngine};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tokio::time::{MissedTickBehavior, interval};
use tracing::{info, warn};

/// Runs engine cycles on a fixed poll interval.
pub struct PollRunner {
    engine: Arc<RebalanceEngine>,
    sampler: Arc<dyn PoolStateSampler>,
    config: RunnerConfig,
    /// Running flag.
    running: Arc<AtomicBool>,
    /// Cycles completed since creation.
    cycles: AtomicU64,
}

impl PollRunner {
    /// Creates a runner.
    pub fn new(
        engine: Arc<RebalanceEngine>,
        sampler: Arc<dyn PoolStateSampler>,
        config: RunnerConfig,
    ) -> Result<Self, EngineError> {
        config.validate()?;
        Ok(Self {
            engine,
            sampler,
            config,
            running: Arc::new(AtomicBool::new(false)),
            cycles: AtomicU64::new(0),
        })
    }

    pub fn engine(&self) -> &Arc<RebalanceEngine> {
        &self.engine
    }

    /// Samples once and runs one cycle.
    ///
    /// Returns `None` when sampling failed and the cycle was skipped.
    pub async fn run_once(&self) -> Option<CycleReport> {
        let snapshots = match self.sampler.sample().await {
            Ok(snapshots) => snapshots,
            Err(e) => {
                warn!(error = %e, "Sampling failed, skipping cycle");
                return None;
            }
        };
        let report = self.engine.run_cycle(&snapshots).await;
        if !report.overlapped {
            self.cycles.fetch_add(1, Ordering::SeqCst);
        }
        Some(report)
    }

    /// Polls until stopped or `max_cycles` is reached.
    ///
    /// Returns the number of ticks processed by this call.
    pub async fn start(&self) -> u64 {
        self.running.store(true, Ordering::SeqCst);

        let mut ticker = interval(self.config.poll_interval());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!(
            interval_secs = self.config.poll_interval_secs,
            max_cycles = ?self.config.max_cycles,
            "Starting poll loop"
        );

        let mut ticks = 0;
        while self.running.load(Ordering::SeqCst) {
            ticker.tick().await;
            if !self.running.load(Ordering::SeqCst) {
                break;
            }

            self.run_once().await;
            ticks += 1;

            if self.config.max_cycles.is_some_and(|max| ticks >= max) {
                info!(ticks, "Reached cycle limit");
                break;
            }
        }

        self.running.store(false, Ordering::SeqCst);
        info!(ticks, "Poll loop stopped");
        ticks
    }

    /// Stops the loop after the current cycle.
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    /// Checks if the loop is running.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Cycles the engine has completed through this runner.
    pub fn cycles(&self) -> u64 {
        self.cycles.load(Ordering::SeqCst)
    }
}
