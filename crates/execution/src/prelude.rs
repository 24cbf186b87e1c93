//! Prelude module for convenient imports.
//!
//! This module re-exports the most commonly used types from the crate.
//!
//! # Example
//!
//! ```rust
//! use clmm_rebalancer_execution::prelude::*;
//! ```

// Config
pub use crate::config::{EngineConfig, RunnerConfig};

// Errors
pub use crate::error::EngineError;

// Lifecycle
pub use crate::lifecycle::{
    ActionJournal, EventData, LifecycleEvent, LifecycleEventType, PairActivity,
    PositionClosedData, PositionOpenedData, SwapData,
};

// Resilience
pub use crate::resilience::{RetryPolicy, retry};

// Sampler
pub use crate::sampler::{
    FileSampler, PairEntry, PoolStateSampler, SnapshotMap, StaticSampler, StrategyProfile,
};

// Scheduler
pub use crate::scheduler::PollRunner;

// Store
pub use crate::store::{KeyValueStore, MemoryStore, StoreError};

// Strategy
pub use crate::strategy::{
    CycleReport, Decision, DecisionInput, DryRunExecutor, ExecutorError, HoldReason,
    OpenPositionRequest, PairOutcome, PairReport, RebalanceEngine, SkipReason, Step,
    StepReceipt, TargetRange, TransactionExecutor, TxReceipt, decide,
};

// Throttle
pub use crate::throttle::{
    AllocationCounter, Cooldown, LimiterStatus, RateLimiter, ThrottleConfig, ThrottleController,
    ThrottleError, ThrottleGate, ThrottleState,
};

// Volatility
pub use crate::volatility::{SampleWindow, TickSample, VolatilityEstimator, VolatilityVerdict};
