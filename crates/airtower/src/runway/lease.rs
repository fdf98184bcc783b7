//! RunwayLease - exclusive hold on one runway.

use crate::flight::{FlightClass, OperationId};
use crate::runway::RunwayId;
use crate::tower::ControlTower;

/// Proof that an operation holds a runway.
///
/// On drop without `complete()`/`interrupt()` (e.g. the request future was
/// dropped mid-hold) the runway is still returned and the departure counted,
/// but no completion is traced.
#[must_use = "dropping a lease returns the runway as interrupted"]
pub struct RunwayLease<'a> {
    tower: &'a ControlTower,
    runway: RunwayId,
    id: OperationId,
    class: FlightClass,
    released: bool,
}

impl<'a> RunwayLease<'a> {
    pub(crate) fn new(
        tower: &'a ControlTower,
        runway: RunwayId,
        id: OperationId,
        class: FlightClass,
    ) -> Self {
        Self {
            tower,
            runway,
            id,
            class,
            released: false,
        }
    }

    pub fn runway(&self) -> RunwayId {
        self.runway
    }

    /// Hold ran its full duration.
    pub fn complete(mut self) {
        self.release(true);
    }

    /// Hold was cut short by cancellation.
    pub fn interrupt(mut self) {
        self.release(false);
    }

    fn release(&mut self, completed: bool) {
        if self.released {
            return;
        }
        self.released = true;
        self.tower
            .depart(self.runway, self.id, self.class, completed);
    }
}

impl Drop for RunwayLease<'_> {
    fn drop(&mut self) {
        if !self.released {
            tracing::warn!(
                runway = %self.runway,
                id = %self.id,
                "RunwayLease dropped while held - returning runway"
            );
            self.release(false);
        }
    }
}

impl std::fmt::Debug for RunwayLease<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunwayLease")
            .field("runway", &self.runway)
            .field("id", &self.id)
            .field("class", &self.class)
            .field("released", &self.released)
            .finish()
    }
}
