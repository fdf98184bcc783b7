//! airtower: priority-aware arbitration of a fixed pool of runways.
//!
//! Landings and takeoffs compete for the same runways. Landings always take
//! precedence: no takeoff may hold a runway while the configured gate policy
//! says landings are still pending.

pub mod config;
mod error;
pub mod flight;
pub mod gate;
pub mod report;
pub mod runway;
pub mod trace;
pub mod tower;

pub use config::{PolicyConfig, TowerConfig};
pub use error::{Result, TowerError};
pub use flight::{FlightClass, OperationId, OperationState};
pub use gate::{ClearancePolicy, LiveCountPolicy, PriorityGate, ThresholdPolicy};
pub use report::OccupancyReport;
pub use runway::{RunwayId, RunwayLease, RunwayPool};
pub use tokio_util::sync::CancellationToken;
pub use tower::{ControlTower, TowerCounters, TowerSnapshot};
pub use trace::{MemoryTrace, StdoutTrace, TraceEvent, TraceSink};
