//! Deterministic occupancy snapshots.

use serde::Serialize;

use crate::flight::OperationId;
use crate::runway::{RunwayId, RunwayPool};

/// Printed after every occupancy line.
pub const SEPARATOR: &str =
    "---------------------------------------------------------------------";

/// Which runway holds which operation, sorted by runway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OccupancyReport {
    entries: Vec<(RunwayId, OperationId)>,
}

impl OccupancyReport {
    pub fn capture(pool: &RunwayPool) -> Self {
        Self {
            entries: pool.occupancy().collect(),
        }
    }

    /// Build from entries in any order; arrival order never leaks into the output.
    pub fn from_entries(entries: impl IntoIterator<Item = (RunwayId, OperationId)>) -> Self {
        let mut entries: Vec<_> = entries.into_iter().collect();
        entries.sort_unstable_by_key(|(runway, _)| *runway);
        Self { entries }
    }

    pub fn entries(&self) -> &[(RunwayId, OperationId)] {
        &self.entries
    }

    pub fn occupied(&self) -> usize {
        self.entries.len()
    }

    /// Report right after an acquisition when every runway is busy, or when a
    /// lone runway is busy with the last operation of the run.
    pub fn should_report(
        occupied: usize,
        capacity: usize,
        processed: usize,
        expected_operations: usize,
    ) -> bool {
        occupied == capacity
            || (occupied == 1 && processed.checked_add(1) == Some(expected_operations))
    }
}

impl std::fmt::Display for OccupancyReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OCCUPANCY {} : ", self.entries.len())?;
        if self.entries.is_empty() {
            return f.write_str("none");
        }
        for (i, (runway, id)) in self.entries.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{runway}={id}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(runway: u16, id: u64) -> (RunwayId, OperationId) {
        (RunwayId::new(runway), OperationId::new(id))
    }

    #[test]
    fn renders_sorted_by_runway() {
        let report = OccupancyReport::from_entries([entry(2, 7), entry(1, 3)]);
        insta::assert_snapshot!(report.to_string(), @"OCCUPANCY 2 : RUNWAY-1=3, RUNWAY-2=7");
    }

    #[test]
    fn output_does_not_depend_on_arrival_order() {
        let a = OccupancyReport::from_entries([entry(1, 4), entry(3, 9), entry(2, 6)]);
        let b = OccupancyReport::from_entries([entry(3, 9), entry(2, 6), entry(1, 4)]);
        assert_eq!(a.to_string(), b.to_string());
        assert_eq!(a, b);
    }

    #[test]
    fn ten_runways_sort_numerically() {
        let report = OccupancyReport::from_entries([entry(10, 1), entry(2, 2)]);
        insta::assert_snapshot!(report.to_string(), @"OCCUPANCY 2 : RUNWAY-2=2, RUNWAY-10=1");
    }

    #[test]
    fn empty_report() {
        let report = OccupancyReport::from_entries([]);
        insta::assert_snapshot!(report.to_string(), @"OCCUPANCY 0 : none");
    }

    #[test]
    fn capture_reads_the_pool() {
        let mut pool = RunwayPool::new(2).unwrap();
        pool.try_acquire(OperationId::new(5)).unwrap();
        let report = OccupancyReport::capture(&pool);
        assert_eq!(report.entries(), &[entry(1, 5)]);
    }

    #[test]
    fn trigger_conditions() {
        // all runways busy
        assert!(OccupancyReport::should_report(2, 2, 0, 15));
        // one busy, not the last operation
        assert!(!OccupancyReport::should_report(1, 2, 3, 15));
        // one busy and it is the last operation
        assert!(OccupancyReport::should_report(1, 2, 14, 15));
        assert!(!OccupancyReport::should_report(0, 2, 14, 15));
        assert!(!OccupancyReport::should_report(1, 2, usize::MAX, 15));
    }

    #[test]
    fn separator_width() {
        assert_eq!(SEPARATOR.len(), 69);
        assert!(SEPARATOR.chars().all(|c| c == '-'));
    }
}
