//! Observable trace of runway activity.
//!
//! Events are emitted from inside the tower's critical section, so the order
//! a sink sees is the order the state changed in.

use std::io::Write;
use std::sync::Mutex;

use crate::flight::{FlightClass, OperationId};
use crate::report::{OccupancyReport, SEPARATOR};
use crate::runway::RunwayId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TraceEvent {
    Acquiring {
        id: OperationId,
        class: FlightClass,
        runway: RunwayId,
    },
    Completed {
        id: OperationId,
        class: FlightClass,
    },
    Occupancy(OccupancyReport),
}

impl TraceEvent {
    pub fn id(&self) -> Option<OperationId> {
        match self {
            Self::Acquiring { id, .. } | Self::Completed { id, .. } => Some(*id),
            Self::Occupancy(_) => None,
        }
    }

    pub fn class(&self) -> Option<FlightClass> {
        match self {
            Self::Acquiring { class, .. } | Self::Completed { class, .. } => Some(*class),
            Self::Occupancy(_) => None,
        }
    }
}

/// Renders the console contract. Occupancy spans two lines: the report and
/// the separator.
impl std::fmt::Display for TraceEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Acquiring { id, runway, .. } => write!(f, "OPERATION {id} ACQUIRING {runway}"),
            Self::Completed { id, .. } => write!(f, "OPERATION {id} COMPLETED"),
            Self::Occupancy(report) => write!(f, "{report}\n{SEPARATOR}"),
        }
    }
}

/// Destination for trace events. Called with the tower lock held: keep it quick.
pub trait TraceSink: Send + Sync {
    fn emit(&self, event: &TraceEvent);
}

/// Writes the trace to stdout.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdoutTrace;

impl TraceSink for StdoutTrace {
    fn emit(&self, event: &TraceEvent) {
        let mut out = std::io::stdout().lock();
        if let Err(e) = writeln!(out, "{event}") {
            tracing::warn!(error = %e, "Failed to write trace line");
        }
    }
}

/// Keeps every event in memory.
#[derive(Debug, Default)]
pub struct MemoryTrace {
    events: Mutex<Vec<TraceEvent>>,
}

impl MemoryTrace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<TraceEvent> {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// The trace as it would appear on the console, one entry per line.
    pub fn lines(&self) -> Vec<String> {
        self.events()
            .iter()
            .flat_map(|e| {
                e.to_string()
                    .lines()
                    .map(str::to_string)
                    .collect::<Vec<_>>()
            })
            .collect()
    }
}

impl TraceSink for MemoryTrace {
    fn emit(&self, event: &TraceEvent) {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(event.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_operation_lines() {
        let acquiring = TraceEvent::Acquiring {
            id: OperationId::new(4),
            class: FlightClass::Takeoff,
            runway: RunwayId::new(2),
        };
        insta::assert_snapshot!(acquiring.to_string(), @"OPERATION 4 ACQUIRING RUNWAY-2");

        let completed = TraceEvent::Completed {
            id: OperationId::new(4),
            class: FlightClass::Takeoff,
        };
        insta::assert_snapshot!(completed.to_string(), @"OPERATION 4 COMPLETED");
        assert_eq!(completed.class(), Some(FlightClass::Takeoff));
    }

    #[test]
    fn memory_trace_splits_occupancy_into_two_lines() {
        let trace = MemoryTrace::new();
        trace.emit(&TraceEvent::Occupancy(OccupancyReport::from_entries([(
            RunwayId::new(1),
            OperationId::new(9),
        )])));
        trace.emit(&TraceEvent::Completed {
            id: OperationId::new(9),
            class: FlightClass::Landing,
        });

        let lines = trace.lines();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "OCCUPANCY 1 : RUNWAY-1=9");
        assert_eq!(lines[1], SEPARATOR);
        assert_eq!(lines[2], "OPERATION 9 COMPLETED");
        assert_eq!(trace.events()[0].id(), None);
    }
}
