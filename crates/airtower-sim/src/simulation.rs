//! Airport run: spawn every aircraft, join them all, report.
//!
//! Landings get ids `1..=landings`, takeoffs the ids after them.

use std::sync::Arc;
use std::time::Duration;

use airtower::{
    CancellationToken, ControlTower, FlightClass, PolicyConfig, TowerConfig, TowerSnapshot,
    TraceSink,
};

use crate::aircraft::{Aircraft, FlightOutcome};

pub const COMPLETION_BANNER: &str = "No aircraft remain in the simulation.";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum PolicyKind {
    /// Takeoffs wait until every landing of the run has finished.
    #[default]
    Threshold,
    /// Takeoffs wait while any landing is live.
    LiveCount,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimulationConfig {
    pub runways: usize,
    pub landings: usize,
    pub takeoffs: usize,
    pub hold: Duration,
    pub policy: PolicyKind,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            runways: airtower::config::DEFAULT_RUNWAYS,
            landings: 5,
            takeoffs: 10,
            hold: airtower::config::DEFAULT_HOLD,
            policy: PolicyKind::Threshold,
        }
    }
}

impl SimulationConfig {
    pub fn tower_config(&self) -> TowerConfig {
        let policy = match self.policy {
            PolicyKind::Threshold => PolicyConfig::Threshold {
                expected_landings: self.landings,
            },
            PolicyKind::LiveCount => PolicyConfig::LiveCount,
        };
        TowerConfig {
            runways: self.runways,
            hold: self.hold,
            policy,
            expected_operations: self.landings + self.takeoffs,
        }
    }

    pub fn aircraft(&self) -> impl Iterator<Item = Aircraft> {
        let landings = self.landings as u64;
        let takeoffs = self.takeoffs as u64;
        (1..=landings)
            .map(|id| Aircraft::new(id, FlightClass::Landing))
            .chain((landings + 1..=landings + takeoffs).map(|id| Aircraft::new(id, FlightClass::Takeoff)))
    }
}

#[derive(Debug, Clone)]
pub struct SimulationReport {
    pub completed: usize,
    pub interrupted: usize,
    pub rejected: usize,
    pub tower: TowerSnapshot,
}

/// Run the whole airport. Fails only if the tower cannot be built, in which
/// case no aircraft is spawned.
pub async fn run(
    config: &SimulationConfig,
    trace: Arc<dyn TraceSink>,
    shutdown: CancellationToken,
) -> airtower::Result<SimulationReport> {
    let tower = Arc::new(ControlTower::new(config.tower_config(), trace)?);

    let handles: Vec<_> = config
        .aircraft()
        .map(|aircraft| {
            let tower = Arc::clone(&tower);
            let cancel = shutdown.child_token();
            tokio::spawn(aircraft.run(tower, cancel))
        })
        .collect();

    tracing::info!(aircraft = handles.len(), "All aircraft spawned");

    let mut report = SimulationReport {
        completed: 0,
        interrupted: 0,
        rejected: 0,
        tower: tower.snapshot(),
    };
    for result in futures::future::join_all(handles).await {
        match result {
            Ok(FlightOutcome::Completed) => report.completed += 1,
            Ok(FlightOutcome::Interrupted) => report.interrupted += 1,
            Ok(FlightOutcome::Rejected(_)) => report.rejected += 1,
            Err(e) => {
                tracing::error!(error = %e, "Aircraft task failed");
                report.rejected += 1;
            }
        }
    }
    report.tower = tower.snapshot();
    Ok(report)
}
