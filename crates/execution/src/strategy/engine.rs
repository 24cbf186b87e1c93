//! Rebalance engine: gates, decides and executes per pair.

use super::{
    Decision, DecisionInput, ExecutorError, HoldReason, OpenPositionRequest, Step,
    TransactionExecutor, decide,
};
use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::lifecycle::{
    ActionJournal, EventData, PositionClosedData, PositionOpenedData, SwapData,
};
use crate::resilience::retry;
use crate::sampler::{PairEntry, SnapshotMap};
use crate::store::KeyValueStore;
use crate::throttle::{LimiterStatus, ThrottleController, ThrottleGate};
use crate::volatility::VolatilityEstimator;
use chrono::{DateTime, Utc};
use clmm_rebalancer_domain::entities::Token;
use rust_decimal::Decimal;
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Why a pair was not evaluated or acted on.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum SkipReason {
    /// The sampler had no snapshot for the pair.
    Missing,
    /// The pair acted recently.
    Cooldown { remaining: Option<Duration> },
    /// A transaction limiter is exhausted.
    RateLimited(LimiterStatus),
    /// The action could not start, e.g. no balance to deposit.
    Precondition(String),
}

/// A transaction step that completed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepReceipt {
    pub step: Step,
    pub digest: String,
}

/// Result of one pair in one cycle.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum PairOutcome {
    Skipped(SkipReason),
    Hold(HoldReason),
    Executed {
        action: &'static str,
        steps: Vec<StepReceipt>,
    },
    /// A step failed; earlier steps are not rolled back.
    Failed {
        action: &'static str,
        completed: Vec<StepReceipt>,
        error: String,
    },
    /// Snapshot or pair configuration failed validation.
    Invalid(String),
}

#[derive(Debug, Clone, Serialize)]
pub struct PairReport {
    pub pair: String,
    pub outcome: PairOutcome,
}

/// Summary of one engine cycle.
#[derive(Debug, Clone, Serialize)]
pub struct CycleReport {
    pub cycle_id: Uuid,
    pub started_at: DateTime<Utc>,
    /// Another cycle was still running; nothing was evaluated.
    pub overlapped: bool,
    pub pairs: Vec<PairReport>,
}

impl CycleReport {
    pub fn executed(&self) -> usize {
        self.count(|o| matches!(o, PairOutcome::Executed { .. }))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, PairOutcome::Failed { .. }))
    }

    pub fn outcome(&self, pair: &str) -> Option<&PairOutcome> {
        self.pairs
            .iter()
            .find(|report| report.pair == pair)
            .map(|report| &report.outcome)
    }

    fn count(&self, predicate: impl Fn(&PairOutcome) -> bool) -> usize {
        self.pairs.iter().filter(|r| predicate(&r.outcome)).count()
    }
}

#[derive(Default)]
struct ActionRun {
    completed: Vec<StepReceipt>,
    /// At least one transaction was submitted.
    attempted: bool,
}

/// Drives every managed pair through gating, decision and execution.
pub struct RebalanceEngine {
    config: EngineConfig,
    throttle: ThrottleController,
    volatility: VolatilityEstimator,
    executor: Arc<dyn TransactionExecutor>,
    journal: Arc<ActionJournal>,
    cycle_guard: Mutex<()>,
}

impl RebalanceEngine {
    /// Creates an engine over a shared store and executor.
    pub fn new(
        config: EngineConfig,
        store: Arc<dyn KeyValueStore>,
        executor: Arc<dyn TransactionExecutor>,
    ) -> Result<Self, EngineError> {
        config.validate()?;
        Ok(Self {
            throttle: ThrottleController::new(store.clone(), config.throttle.clone()),
            volatility: VolatilityEstimator::new(store, config.sample_ttl()),
            executor,
            journal: Arc::new(ActionJournal::new()),
            cycle_guard: Mutex::new(()),
            config,
        })
    }

    /// Records completed steps into `journal` instead of a private one.
    #[must_use]
    pub fn with_journal(mut self, journal: Arc<ActionJournal>) -> Self {
        self.journal = journal;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn throttle(&self) -> &ThrottleController {
        &self.throttle
    }

    pub fn volatility(&self) -> &VolatilityEstimator {
        &self.volatility
    }

    pub fn journal(&self) -> &Arc<ActionJournal> {
        &self.journal
    }

    /// Runs one cycle stamped with the current time.
    pub async fn run_cycle(&self, snapshots: &SnapshotMap) -> CycleReport {
        self.run_cycle_at(snapshots, Utc::now()).await
    }

    /// Runs one cycle over `snapshots`, sampling ticks at `now`.
    ///
    /// Returns an `overlapped` report without touching any pair if another
    /// cycle is still in progress.
    pub async fn run_cycle_at(&self, snapshots: &SnapshotMap, now: DateTime<Utc>) -> CycleReport {
        let cycle_id = Uuid::new_v4();
        let Ok(_guard) = self.cycle_guard.try_lock() else {
            warn!(cycle = %cycle_id, "Previous cycle still running, skipping");
            return CycleReport {
                cycle_id,
                started_at: now,
                overlapped: true,
                pairs: Vec::new(),
            };
        };

        debug!(cycle = %cycle_id, pairs = snapshots.len(), "Starting cycle");

        let mut pairs = Vec::with_capacity(snapshots.len());
        for (key, entry) in snapshots {
            let outcome = match entry {
                Some(entry) => self.process_pair(key, entry, now).await,
                None => {
                    debug!(pair = %key, "No snapshot, skipping");
                    PairOutcome::Skipped(SkipReason::Missing)
                }
            };
            pairs.push(PairReport {
                pair: key.clone(),
                outcome,
            });
        }

        let report = CycleReport {
            cycle_id,
            started_at: now,
            overlapped: false,
            pairs,
        };
        info!(
            cycle = %cycle_id,
            pairs = report.pairs.len(),
            executed = report.executed(),
            failed = report.failed(),
            "Cycle complete"
        );
        report
    }

    async fn process_pair(&self, key: &str, entry: &PairEntry, now: DateTime<Utc>) -> PairOutcome {
        match self.evaluate(key, entry, now).await {
            Ok(outcome) => outcome,
            Err(EngineError::Domain(e)) => {
                warn!(pair = key, error = %e, "Invalid pair snapshot");
                PairOutcome::Invalid(e.to_string())
            }
            Err(e) => {
                error!(pair = key, error = %e, "Pair evaluation failed");
                PairOutcome::Failed {
                    action: "evaluate",
                    completed: Vec::new(),
                    error: e.to_string(),
                }
            }
        }
    }

    async fn evaluate(
        &self,
        key: &str,
        entry: &PairEntry,
        now: DateTime<Utc>,
    ) -> Result<PairOutcome, EngineError> {
        let pool = &entry.pool;
        let priority = entry.config.validate()?;
        pool.validate()?;
        if let Some(position) = &entry.position {
            position.validate(pool.tick_spacing)?;
        }

        match self.throttle.check(key).await? {
            ThrottleGate::Open => {}
            ThrottleGate::Cooldown { remaining } => {
                debug!(
                    pair = key,
                    remaining_secs = remaining.map(|d| d.as_secs()),
                    "Cooling down, skipping"
                );
                return Ok(PairOutcome::Skipped(SkipReason::Cooldown { remaining }));
            }
            ThrottleGate::RateLimited(status) => {
                warn!(
                    pair = key,
                    scope = %status.scope,
                    resets_in_secs = status.resets_in.map(|d| d.as_secs()),
                    "Rate limited, skipping"
                );
                return Ok(PairOutcome::Skipped(SkipReason::RateLimited(status)));
            }
        }

        let now_ms = now.timestamp_millis();
        self.volatility
            .add_sample(key, pool.current_tick, now_ms)
            .await?;
        let verdict = self
            .volatility
            .check_volatility(
                key,
                pool.tick_spacing,
                entry.profile.volatility_window(),
                entry.profile.volatility_threshold,
                now_ms,
            )
            .await?;

        let allocation_available =
            entry.position.is_some() || self.throttle.allocation_available().await?;

        let decision = decide(&DecisionInput {
            pool,
            position: entry.position.as_ref(),
            priority,
            verdict: &verdict,
            policy: entry.profile.volatility_policy,
            allocation_available,
        });

        if let Decision::Hold(reason) = &decision {
            match reason {
                HoldReason::Volatile { delta, direction } => warn!(
                    pair = key,
                    delta = *delta,
                    direction = ?direction,
                    "Price volatile, holding"
                ),
                _ => debug!(pair = key, tick = pool.current_tick, reason = ?reason, "Holding"),
            }
            return Ok(PairOutcome::Hold(reason.clone()));
        }

        Ok(self.act(key, entry, &decision, now).await)
    }

    async fn act(
        &self,
        key: &str,
        entry: &PairEntry,
        decision: &Decision,
        now: DateTime<Utc>,
    ) -> PairOutcome {
        let action = decision.label();
        info!(
            pair = key,
            action,
            tick = entry.pool.current_tick,
            "Executing action"
        );

        let mut run = ActionRun::default();
        let result = self.run_steps(key, entry, decision, now, &mut run).await;

        let outcome = match result {
            Ok(()) => {
                if matches!(decision, Decision::OpenPosition { .. }) {
                    match self.throttle.record_allocation().await {
                        Ok(count) => debug!(pair = key, allocations = count, "Allocation recorded"),
                        Err(e) => error!(pair = key, error = %e, "Failed to record allocation"),
                    }
                }
                info!(pair = key, action, steps = run.completed.len(), "Action completed");
                PairOutcome::Executed {
                    action,
                    steps: run.completed,
                }
            }
            Err(e) if e.is_precondition() && !run.attempted => {
                warn!(pair = key, action, error = %e, "Action skipped");
                PairOutcome::Skipped(SkipReason::Precondition(e.to_string()))
            }
            Err(e) => {
                let digests: Vec<&str> = run.completed.iter().map(|s| s.digest.as_str()).collect();
                error!(
                    pair = key,
                    action,
                    completed = ?digests,
                    error = %e,
                    "Action failed, remaining steps aborted"
                );
                PairOutcome::Failed {
                    action,
                    completed: run.completed,
                    error: e.to_string(),
                }
            }
        };

        // Failed actions cool down as well; skips do not.
        if !matches!(outcome, PairOutcome::Skipped(_)) {
            if let Err(e) = self.throttle.start_cooldown(key).await {
                error!(pair = key, error = %e, "Failed to start cooldown");
            }
        }
        outcome
    }

    async fn run_steps(
        &self,
        key: &str,
        entry: &PairEntry,
        decision: &Decision,
        now: DateTime<Utc>,
        run: &mut ActionRun,
    ) -> Result<(), EngineError> {
        let pool = &entry.pool;
        let pair = &entry.config;

        for step in decision.steps() {
            let (digest, data) = match step {
                Step::Close => {
                    let position = entry.position.as_ref().ok_or_else(|| {
                        EngineError::Precondition("no position to close".to_string())
                    })?;
                    run.attempted = true;
                    let receipt = self
                        .call("close_position", || {
                            self.executor.close_position(pool, position)
                        })
                        .await?;
                    let data = EventData::PositionClosed(PositionClosedData {
                        position_id: position.position_id.clone(),
                        tick_lower: position.tick_lower,
                        tick_upper: position.tick_upper,
                        liquidity: position.liquidity,
                    });
                    (receipt.digest, data)
                }
                Step::Swap(direction) => {
                    let source = pair.token(direction.source());
                    let amount = pair.allocatable(source, self.balance(source).await?);
                    if amount <= Decimal::ZERO {
                        debug!(pair = key, token = %source.symbol, "Nothing to swap");
                        continue;
                    }
                    run.attempted = true;
                    let receipt = self
                        .call("swap", || self.executor.swap(pair, direction, amount))
                        .await?;
                    (receipt.digest, EventData::Swapped(SwapData { direction, amount }))
                }
                Step::Open { deposit, target } => {
                    let token = pair.token(deposit);
                    let amount = pair.allocatable(token, self.balance(token).await?);
                    if amount <= Decimal::ZERO {
                        return Err(EngineError::Precondition(format!(
                            "no {} balance to deposit",
                            token.symbol
                        )));
                    }
                    let request = OpenPositionRequest {
                        deposit,
                        tick_lower: target.tick_lower,
                        tick_upper: target.tick_upper,
                        amount,
                    };
                    run.attempted = true;
                    let receipt = self
                        .call("open_position", || {
                            self.executor.open_position(pool, &request)
                        })
                        .await?;
                    let data = EventData::PositionOpened(PositionOpenedData {
                        tick_lower: target.tick_lower,
                        tick_upper: target.tick_upper,
                        deposit,
                        amount,
                        tick_at_creation: pool.current_tick,
                    });
                    (receipt.digest, data)
                }
            };

            if let Err(e) = self.throttle.record_transaction().await {
                error!(pair = key, error = %e, "Failed to count transaction");
            }
            self.journal
                .record(key, &pool.pool_id, &digest, data, now)
                .await;
            run.completed.push(StepReceipt { step, digest });
        }
        Ok(())
    }

    async fn balance(&self, token: &Token) -> Result<Decimal, EngineError> {
        self.call("available_balance", || self.executor.available_balance(token))
            .await
    }

    /// Runs one executor call under the retry policy with a per-attempt deadline.
    async fn call<T, F, Fut>(&self, operation: &str, mut op: F) -> Result<T, EngineError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ExecutorError>>,
    {
        let timeout = self.config.call_timeout();
        retry(&self.config.retry, operation, |_| {
            let call = op();
            async move {
                tokio::time::timeout(timeout, call)
                    .await
                    .unwrap_or(Err(ExecutorError::Timeout(timeout)))
            }
        })
        .await
        .map_err(|source| EngineError::Executor {
            operation: operation.to_string(),
            source,
        })
    }
}
