//! Command Line Interface for the CLMM rebalancer.
use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use clmm_rebalancer_domain::entities::{PoolSnapshot, PositionSnapshot, TokenId};
use clmm_rebalancer_domain::enums::PairToken;
use clmm_rebalancer_domain::math::price_tick::tick_to_display_price;
use clmm_rebalancer_domain::math::tick_range::{
    add_eligible, allowed_deviation, classify, close_eligible, position_range, target_range,
    tick_bounds,
};
use clmm_rebalancer_domain::value_objects::RangeStatus;
use clmm_rebalancer_execution::prelude::*;
use dotenv::dotenv;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

/// Environment variable holding the config file path.
const CONFIG_ENV: &str = "REBALANCER_CONFIG";

#[derive(Parser)]
#[command(name = "clmm-rebalancer")]
#[command(about = "Concentrated-liquidity position rebalancer", long_about = None)]
struct Cli {
    /// JSON config file (falls back to $REBALANCER_CONFIG, then defaults)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the poll loop against a snapshot file with the dry-run executor
    Run {
        /// JSON snapshot map, re-read every poll
        #[arg(short, long)]
        snapshots: Option<PathBuf>,

        /// Poll interval in seconds
        #[arg(short, long)]
        interval: Option<u64>,

        /// Stop after this many cycles
        #[arg(long)]
        cycles: Option<u64>,
    },
    /// Analyze a tick against the bucket grid and an optional position
    Analyze {
        /// Current pool tick
        #[arg(short, long, allow_hyphen_values = true)]
        tick: i32,

        /// Pool tick spacing
        #[arg(short, long, default_value_t = 60)]
        spacing: i32,

        /// Position lower tick
        #[arg(long, allow_hyphen_values = true, requires = "upper")]
        lower: Option<i32>,

        /// Position upper tick
        #[arg(long, allow_hyphen_values = true, requires = "lower")]
        upper: Option<i32>,

        /// Priority token side
        #[arg(short, long, value_enum, default_value_t = PriorityArg::A)]
        priority: PriorityArg,

        /// Token A decimals
        #[arg(long, default_value_t = 9)]
        decimals_a: u8,

        /// Token B decimals
        #[arg(long, default_value_t = 6)]
        decimals_b: u8,
    },
    /// Show the effective throttle configuration
    Throttle,
}

#[derive(Clone, Copy, ValueEnum)]
enum PriorityArg {
    A,
    B,
}

impl From<PriorityArg> for PairToken {
    fn from(arg: PriorityArg) -> Self {
        match arg {
            PriorityArg::A => PairToken::A,
            PriorityArg::B => PairToken::B,
        }
    }
}

/// Top-level config file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
struct AppConfig {
    engine: EngineConfig,
    runner: RunnerConfig,
    /// Snapshot file used by `run` when `--snapshots` is not given.
    snapshots: Option<PathBuf>,
    /// Balances reported by the dry-run executor.
    balances: HashMap<TokenId, Decimal>,
}

impl AppConfig {
    fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse config {}", path.display()))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let config_path = cli
        .config
        .clone()
        .or_else(|| env::var(CONFIG_ENV).ok().map(PathBuf::from));
    let mut config = AppConfig::load(config_path.as_deref())?;

    match cli.command {
        Commands::Run {
            snapshots,
            interval,
            cycles,
        } => {
            if let Some(secs) = interval {
                config.runner.poll_interval_secs = secs;
            }
            if cycles.is_some() {
                config.runner.max_cycles = cycles;
            }
            let snapshots = snapshots
                .or(config.snapshots.clone())
                .context("No snapshot file given (use --snapshots or \"snapshots\" in config)")?;
            run(config, snapshots).await?;
        }
        Commands::Analyze {
            tick,
            spacing,
            lower,
            upper,
            priority,
            decimals_a,
            decimals_b,
        } => {
            let position = lower
                .zip(upper)
                .map(|(lower, upper)| PositionSnapshot::new("cli", lower, upper));
            analyze(
                PoolSnapshot::new("cli", tick, spacing),
                position,
                priority.into(),
                decimals_a,
                decimals_b,
            )?;
        }
        Commands::Throttle => print_throttle(&config.engine)?,
    }

    Ok(())
}

async fn run(config: AppConfig, snapshots: PathBuf) -> Result<()> {
    println!("📡 Starting rebalancer (dry run)...");
    println!("   Snapshots: {}", snapshots.display());
    println!(
        "   Interval:  {}s",
        config.runner.poll_interval_secs
    );

    let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
    let executor = Arc::new(DryRunExecutor::new(config.balances));
    let engine = Arc::new(RebalanceEngine::new(config.engine, store, executor)?);
    let sampler = Arc::new(FileSampler::new(snapshots));
    let runner = PollRunner::new(engine.clone(), sampler, config.runner)?;

    tokio::select! {
        ticks = runner.start() => info!(ticks, "Poll loop finished"),
        signal = tokio::signal::ctrl_c() => {
            if let Err(e) = signal {
                warn!(error = %e, "Failed to listen for shutdown signal");
            }
            runner.stop();
            info!("Shutdown requested");
        }
    }

    println!("\n📊 Session Summary");
    println!("════════════════════════════════════");
    println!("Cycles:          {}", runner.cycles());
    println!("Journal events:  {}", engine.journal().len().await);
    let state = engine.throttle().state().await?;
    println!(
        "Long window:     {} points left",
        state.long_window.remaining
    );
    println!(
        "Short window:    {} points left",
        state.short_window.remaining
    );
    println!("════════════════════════════════════");
    Ok(())
}

fn analyze(
    pool: PoolSnapshot,
    position: Option<PositionSnapshot>,
    priority: PairToken,
    decimals_a: u8,
    decimals_b: u8,
) -> Result<()> {
    pool.validate()?;
    if let Some(position) = &position {
        position.validate(pool.tick_spacing)?;
    }

    let spacing = pool.tick_spacing;
    let (lower, upper) = tick_bounds(&pool);
    let price = tick_to_display_price(pool.current_tick, decimals_a, decimals_b)
        .map_err(anyhow::Error::msg)?;
    let prefer_a = priority == PairToken::A;
    let (target_lower, target_upper) = target_range(&pool, priority);

    println!("\n🔍 Tick Analysis");
    println!("════════════════════════════════════");
    println!("Tick:             {}", pool.current_tick);
    println!("Spacing:          {}", spacing);
    println!("Price (A in B):   {:.6}", price);
    println!("Bucket:           [{}, {})", lower, upper);
    println!("Allowed drift:    {}", allowed_deviation(&pool));
    println!(
        "Add eligible:     {}",
        add_eligible(prefer_a, pool.current_tick, spacing)
    );
    println!(
        "Target range:     [{}, {}) depositing {:?}",
        target_lower, target_upper, priority
    );

    if let Some(position) = &position {
        println!("────────────────────────────────────");
        println!(
            "Position:         [{}, {}]",
            position.tick_lower, position.tick_upper
        );
        match position_range(&pool, position) {
            RangeStatus::InRange => println!("Status:           in range"),
            RangeStatus::OutOfRange { side, distance } => {
                println!("Status:           out of range ({side}, {distance} ticks)");
                println!(
                    "Close eligible:   {}",
                    close_eligible(distance, spacing)
                );
            }
        }
        println!(
            "Outcome:          {:?}",
            classify(&pool, Some(position), priority)
        );
    }
    println!("════════════════════════════════════");
    Ok(())
}

fn print_throttle(config: &EngineConfig) -> Result<()> {
    config.validate()?;
    let throttle = &config.throttle;
    let retry = &config.retry;

    println!("\n⏱  Throttle Configuration");
    println!("════════════════════════════════════");
    println!("Scope:            {}", throttle.scope);
    println!(
        "Long window:      {} tx / {}s",
        throttle.long_window_points, throttle.long_window_secs
    );
    println!(
        "Short window:     {} tx / {}s",
        throttle.short_window_points, throttle.short_window_secs
    );
    println!("Cooldown:         {}s", throttle.cooldown_secs);
    println!(
        "Allocation cap:   {} / {}s",
        throttle.allocation_cap, throttle.allocation_window_secs
    );
    println!("────────────────────────────────────");
    println!(
        "Retry:            {} retries, {}ms x{} (max {}ms, jitter {})",
        retry.max_retries, retry.base_delay_ms, retry.factor, retry.max_delay_ms, retry.jitter
    );
    println!("Call timeout:     {}s", config.call_timeout_secs);
    println!("════════════════════════════════════");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_cli_parses() {
        use clap::CommandFactory;
        Cli::command().debug_assert();

        let cli = Cli::parse_from(["clmm-rebalancer", "analyze", "--tick", "-5", "-s", "10"]);
        let Commands::Analyze { tick, spacing, .. } = cli.command else {
            panic!("expected analyze");
        };
        assert_eq!((tick, spacing), (-5, 10));
    }

    #[test]
    fn test_app_config_defaults() {
        let config: AppConfig = serde_json::from_str(
            r#"{ "runner": { "poll_interval_secs": 5 }, "balances": { "0x2::sui::SUI": "12.5" } }"#,
        )
        .unwrap();
        assert_eq!(config.runner.poll_interval_secs, 5);
        assert_eq!(config.engine, EngineConfig::default());
        assert_eq!(config.balances[&TokenId::new("0x2::sui::SUI")], dec!(12.5));
        assert!(config.snapshots.is_none());
    }

    #[test]
    fn test_load_without_path_uses_defaults() {
        let config = AppConfig::load(None).unwrap();
        assert_eq!(config.runner, RunnerConfig::default());
    }
}
