use std::sync::Arc;
use std::time::Duration;

use anyhow::{Result, anyhow};
use clap::{Parser, ValueEnum};
use tracing::info;

use glowgrid_app::{SharedWorld, Ticker, shared_world};
use glowgrid_core::{GridConfig, ReplacementTarget, ReplicationMethod, World};

/// Headless driver for the GlowGrid simulation.
#[derive(Debug, Parser)]
#[command(name = "glowgrid", about = "Run a GlowGrid population without a renderer")]
struct Args {
    /// RNG seed for a reproducible run.
    #[arg(long)]
    seed: Option<u64>,
    /// Grid width in cells.
    #[arg(long, default_value_t = 15)]
    width: usize,
    /// Grid height in cells.
    #[arg(long, default_value_t = 10)]
    height: usize,
    /// Number of ticks to run before exiting.
    #[arg(long, default_value_t = 1_000)]
    ticks: u64,
    /// Delay between ticks in milliseconds.
    #[arg(long, default_value_t = 20)]
    delay_ms: u64,
    /// Which neighbor a reproducing parent overwrites.
    #[arg(long, value_enum, default_value = "lowest-energy")]
    replacement: ReplacementPolicy,
    /// How energy is handed from parent to offspring.
    #[arg(long, value_enum, default_value = "split-energy")]
    replication: ReplicationPolicy,
    /// Ticks between logged summaries.
    #[arg(long, default_value_t = 50)]
    report_interval: u64,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ReplacementPolicy {
    Oldest,
    LowestEnergy,
}

impl From<ReplacementPolicy> for ReplacementTarget {
    fn from(policy: ReplacementPolicy) -> Self {
        match policy {
            ReplacementPolicy::Oldest => Self::OldestNeighbor,
            ReplacementPolicy::LowestEnergy => Self::LowestEnergyNeighbor,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ReplicationPolicy {
    OnYourOwn,
    SplitEnergy,
}

impl From<ReplicationPolicy> for ReplicationMethod {
    fn from(policy: ReplicationPolicy) -> Self {
        match policy {
            ReplicationPolicy::OnYourOwn => Self::OnYourOwn,
            ReplicationPolicy::SplitEnergy => Self::SplitEnergy,
        }
    }
}

fn main() -> Result<()> {
    init_tracing();
    let args = Args::parse();

    let config = GridConfig {
        grid_width: args.width,
        grid_height: args.height,
        rng_seed: args.seed,
        replacement_target: args.replacement.into(),
        replication_method: args.replication.into(),
        ..GridConfig::default()
    };
    let world = shared_world(World::new(config)?);
    info!(
        width = args.width,
        height = args.height,
        ticks = args.ticks,
        delay_ms = args.delay_ms,
        "starting GlowGrid driver"
    );

    let ticker = Ticker::spawn(Arc::clone(&world), args.delay_ms, args.ticks);
    ticker.resume();

    let mut last_report = 0;
    while !ticker.is_stopped() && ticker.steps() < args.ticks {
        std::thread::sleep(Duration::from_millis(args.delay_ms.max(1)));
        let steps = ticker.steps();
        if args.report_interval > 0 && steps.saturating_sub(last_report) >= args.report_interval {
            last_report = steps;
            report(&world)?;
        }
    }
    ticker.stop();
    report(&world)?;
    info!("run complete");
    Ok(())
}

fn report(world: &SharedWorld) -> Result<()> {
    let world = world
        .lock()
        .map_err(|_| anyhow!("world lock poisoned"))?;
    if let Some(summary) = world.history().last() {
        info!(
            tick = summary.tick.0,
            births = summary.births,
            avg_energy = summary.average_energy,
            avg_age = summary.average_age,
            "tick summary"
        );
    }
    Ok(())
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}
