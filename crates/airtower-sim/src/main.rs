use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};

use airtower::{CancellationToken, StdoutTrace};
use airtower_sim::logging::init_tracing;
use airtower_sim::{COMPLETION_BANNER, PolicyKind, SimulationConfig};

/// Airport simulation: landings and takeoffs sharing a pool of runways.
#[derive(Parser, Debug)]
#[command(name = "airtower-sim")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Number of runways
    #[arg(long, env = "AIRTOWER_RUNWAYS", default_value_t = 2)]
    runways: usize,

    /// Number of landing aircraft
    #[arg(long, env = "AIRTOWER_LANDINGS", default_value_t = 5)]
    landings: usize,

    /// Number of takeoff aircraft
    #[arg(long, env = "AIRTOWER_TAKEOFFS", default_value_t = 10)]
    takeoffs: usize,

    /// How long each aircraft holds its runway, in milliseconds
    #[arg(long, env = "AIRTOWER_HOLD_MS", default_value_t = 5000)]
    hold_ms: u64,

    /// Gate policy for takeoffs
    #[arg(long, env = "AIRTOWER_POLICY", value_enum, default_value_t = PolicyKind::Threshold)]
    policy: PolicyKind,
}

impl Cli {
    fn simulation_config(&self) -> SimulationConfig {
        SimulationConfig {
            runways: self.runways,
            landings: self.landings,
            takeoffs: self.takeoffs,
            hold: Duration::from_millis(self.hold_ms),
            policy: self.policy,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing();

    info!("airtower-sim {}", env!("CARGO_PKG_VERSION"));

    let shutdown = CancellationToken::new();
    let on_signal = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, cancelling all aircraft");
            on_signal.cancel();
        }
    });

    let config = cli.simulation_config();
    let report = airtower_sim::run(&config, Arc::new(StdoutTrace), shutdown)
        .await
        .context("failed to start the control tower")?;

    info!(
        completed = report.completed,
        interrupted = report.interrupted,
        rejected = report.rejected,
        tower = %serde_json::to_string(&report.tower).unwrap_or_default(),
        "Simulation finished"
    );
    println!("{COMPLETION_BANNER}");

    Ok(())
}
