//! airtower-sim: drives a `ControlTower` with one task per aircraft.

pub mod aircraft;
pub mod logging;
pub mod simulation;

pub use aircraft::{Aircraft, FlightOutcome};
pub use simulation::{COMPLETION_BANNER, PolicyKind, SimulationConfig, SimulationReport, run};
