//! Fixed-capacity pool of interchangeable runways.

use serde::{Deserialize, Serialize};

use crate::error::{Result, TowerError};
use crate::flight::OperationId;

/// 1-based runway ordinal. Ordering is numeric, so `RUNWAY-2 < RUNWAY-10`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunwayId(u16);

impl RunwayId {
    pub const fn new(ordinal: u16) -> Self {
        Self(ordinal)
    }

    pub fn ordinal(&self) -> u16 {
        self.0
    }

    fn index(&self) -> usize {
        usize::from(self.0) - 1
    }
}

impl std::fmt::Display for RunwayId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "RUNWAY-{}", self.0)
    }
}

/// All runways of the airport and who currently occupies each one.
///
/// Runways are created once and never destroyed; only their occupant toggles.
/// The pool does not block: waiting for a free runway is done by the tower,
/// which owns the lock this pool lives behind.
#[derive(Debug)]
pub struct RunwayPool {
    occupants: Vec<Option<OperationId>>,
}

impl RunwayPool {
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(TowerError::invalid("runway capacity must be at least 1"));
        }
        if capacity > usize::from(u16::MAX) {
            return Err(TowerError::invalid(format!(
                "runway capacity {capacity} exceeds {}",
                u16::MAX
            )));
        }
        Ok(Self {
            occupants: vec![None; capacity],
        })
    }

    /// Take the lowest-numbered free runway for `id`, or `None` if all are busy.
    pub fn try_acquire(&mut self, id: OperationId) -> Option<RunwayId> {
        let index = self.occupants.iter().position(Option::is_none)?;
        self.occupants[index] = Some(id);
        // capacity is bounded by u16::MAX in new()
        Some(RunwayId::new((index + 1) as u16))
    }

    /// Free `runway`. Returns false (and leaves the pool untouched) if `id`
    /// is not the operation that holds it.
    pub fn release(&mut self, runway: RunwayId, id: OperationId) -> bool {
        match self.occupants.get_mut(runway.index()) {
            Some(slot) if *slot == Some(id) => {
                *slot = None;
                true
            }
            other => {
                tracing::error!(
                    %runway,
                    %id,
                    occupant = ?other.map(|s| *s),
                    "Release by an operation that does not hold the runway"
                );
                false
            }
        }
    }

    /// Occupied runways in ascending runway order.
    pub fn occupancy(&self) -> impl Iterator<Item = (RunwayId, OperationId)> + '_ {
        self.occupants
            .iter()
            .enumerate()
            .filter_map(|(i, occupant)| occupant.map(|id| (RunwayId::new((i + 1) as u16), id)))
    }

    pub fn capacity(&self) -> usize {
        self.occupants.len()
    }

    pub fn occupied(&self) -> usize {
        self.occupants.iter().filter(|o| o.is_some()).count()
    }

    pub fn available(&self) -> usize {
        self.capacity() - self.occupied()
    }
}
