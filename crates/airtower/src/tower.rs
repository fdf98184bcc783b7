//! ControlTower - the arbitration monitor.
//!
//! Owns the runway pool, the priority gate and every counter behind one
//! mutex. The mutex is held for bookkeeping and trace output only, never
//! across the hold, so up to `runways` operations are in progress at once
//! while every state change stays serialized.
//!
//! Request flow:
//! 1. Track the operation (duplicate ids are rejected)
//! 2. Landing: register the arrival with the gate
//! 3. Takeoff: wait for clearance
//! 4. Wait for a free runway (a takeoff re-checks the gate in the same
//!    critical section and goes back to step 3 if it closed again)
//! 5. Hold the runway, then release it through the `RunwayLease`

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use serde::Serialize;
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;

use crate::config::TowerConfig;
use crate::error::{Result, TowerError};
use crate::flight::{FlightClass, OperationId, OperationState};
use crate::gate::{GateTransition, PriorityGate};
use crate::report::OccupancyReport;
use crate::runway::{RunwayId, RunwayLease, RunwayPool};
use crate::trace::{TraceEvent, TraceSink};

struct TowerState {
    pool: RunwayPool,
    gate: PriorityGate,
    processed: usize,
    expected_operations: usize,
}

/// All counters, read in one critical section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TowerCounters {
    pub completed_landings: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected_landings: Option<usize>,
    pub live_landings: usize,
    pub processed: usize,
    pub expected_operations: usize,
}

/// Consistent view of the tower for diagnostics and tests.
#[derive(Debug, Clone, Serialize)]
pub struct TowerSnapshot {
    pub policy: &'static str,
    pub gate_open: bool,
    pub total_runways: usize,
    pub available_runways: usize,
    pub occupancy: OccupancyReport,
    pub counters: TowerCounters,
}

pub struct ControlTower {
    state: Mutex<TowerState>,
    /// Broadcast when the gate opens.
    clearance: Notify,
    /// Broadcast whenever a runway is returned.
    runway_freed: Notify,
    operations: DashMap<OperationId, OperationState>,
    hold: Duration,
    trace: Arc<dyn TraceSink>,
}

impl ControlTower {
    pub fn new(config: TowerConfig, trace: Arc<dyn TraceSink>) -> Result<Self> {
        config.validate()?;

        let pool = RunwayPool::new(config.runways)?;
        let gate = PriorityGate::from_config(&config.policy);

        tracing::info!(
            runways = config.runways,
            policy = gate.policy_name(),
            hold_ms = config.hold.as_millis() as u64,
            expected_operations = config.expected_operations,
            gate_open = gate.is_open(),
            "Control tower ready"
        );

        Ok(Self {
            state: Mutex::new(TowerState {
                pool,
                gate,
                processed: 0,
                expected_operations: config.expected_operations,
            }),
            clearance: Notify::new(),
            runway_freed: Notify::new(),
            operations: DashMap::new(),
            hold: config.hold,
            trace,
        })
    }

    /// Land on any runway. Never waits behind a takeoff.
    pub async fn land(&self, id: OperationId, cancel: &CancellationToken) -> Result<()> {
        self.request(FlightClass::Landing, id, cancel).await
    }

    /// Take off once the gate allows it.
    pub async fn take_off(&self, id: OperationId, cancel: &CancellationToken) -> Result<()> {
        self.request(FlightClass::Takeoff, id, cancel).await
    }

    /// Run one operation to completion. Blocks until the hold is over or
    /// `cancel` fires; on cancellation only the cleanup owed for what was
    /// actually held is performed.
    pub async fn request(
        &self,
        class: FlightClass,
        id: OperationId,
        cancel: &CancellationToken,
    ) -> Result<()> {
        let op = self.track(id, class)?;

        // Undone on drop unless a lease takes over the departure accounting.
        let mut arrival = self.register_arrival(id, class);

        let lease = loop {
            if !class.is_priority() {
                op.set(OperationState::WaitingForClearance);
                if let Err(e) = self.await_clearance(id, cancel).await {
                    op.set(OperationState::Cancelled);
                    return Err(e);
                }
            }
            match self.acquire_runway(&op, cancel).await {
                Ok(Some(lease)) => break lease,
                Ok(None) => continue,
                Err(e) => {
                    op.set(OperationState::Cancelled);
                    return Err(e);
                }
            }
        };
        arrival.disarm();

        let interrupted = tokio::select! {
            _ = tokio::time::sleep(self.hold) => false,
            _ = cancel.cancelled() => true,
        };

        if interrupted {
            tracing::debug!(%id, %class, runway = %lease.runway(), "Interrupted while holding runway");
            lease.interrupt();
            op.set(OperationState::Cancelled);
            return Err(TowerError::OperationInterrupted { id });
        }

        lease.complete();
        op.set(OperationState::Completed);
        Ok(())
    }

    pub fn operation_state(&self, id: OperationId) -> Option<OperationState> {
        self.operations.get(&id).map(|state| *state)
    }

    pub fn snapshot(&self) -> TowerSnapshot {
        let state = self.lock_state();
        let gate = state.gate.counters();
        TowerSnapshot {
            policy: state.gate.policy_name(),
            gate_open: state.gate.is_open(),
            total_runways: state.pool.capacity(),
            available_runways: state.pool.available(),
            occupancy: OccupancyReport::capture(&state.pool),
            counters: TowerCounters {
                completed_landings: gate.completed_landings,
                expected_landings: state.gate.expected_landings(),
                live_landings: gate.live_landings,
                processed: state.processed,
                expected_operations: state.expected_operations,
            },
        }
    }

    fn track(&self, id: OperationId, class: FlightClass) -> Result<TrackedOperation<'_>> {
        match self.operations.entry(id) {
            Entry::Occupied(_) => return Err(TowerError::DuplicateOperation(id)),
            Entry::Vacant(entry) => {
                entry.insert(OperationState::Requested);
            }
        }
        tracing::debug!(%id, %class, "Operation requested");
        Ok(TrackedOperation {
            operations: &self.operations,
            id,
            class,
        })
    }

    fn register_arrival(&self, id: OperationId, class: FlightClass) -> ArrivalGuard<'_> {
        if class.is_priority() {
            let mut state = self.lock_state();
            if state.gate.register_arrival(class) == GateTransition::Closed {
                tracing::debug!(%id, "Gate closed by landing arrival");
            }
        }
        ArrivalGuard {
            tower: self,
            id,
            class,
            armed: class.is_priority(),
        }
    }

    /// Block a takeoff until the gate is open.
    async fn await_clearance(&self, id: OperationId, cancel: &CancellationToken) -> Result<()> {
        loop {
            if cancel.is_cancelled() {
                return Err(TowerError::OperationInterrupted { id });
            }
            let notified = self.clearance.notified();
            tokio::pin!(notified);
            // Register before checking so an opening between check and wait is not lost.
            notified.as_mut().enable();

            if self.lock_state().gate.is_open() {
                return Ok(());
            }

            tracing::debug!(%id, "Waiting for clearance");
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    tracing::debug!(%id, "Cancelled while waiting for clearance");
                    return Err(TowerError::OperationInterrupted { id });
                }
                _ = notified => {}
            }
        }
    }

    /// Wait for a free runway and take it.
    ///
    /// Returns `Ok(None)` if the operation is a takeoff and the gate has
    /// closed again; the caller goes back to waiting for clearance.
    async fn acquire_runway(
        &self,
        op: &TrackedOperation<'_>,
        cancel: &CancellationToken,
    ) -> Result<Option<RunwayLease<'_>>> {
        let id = op.id;
        let class = op.class;
        loop {
            // A cancelled request never takes a runway, even if one is free.
            if cancel.is_cancelled() {
                return Err(TowerError::OperationInterrupted { id });
            }
            let notified = self.runway_freed.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            {
                let mut state = self.lock_state();
                if !class.is_priority() && !state.gate.is_open() {
                    tracing::debug!(%id, "Gate closed again before a runway was free");
                    return Ok(None);
                }
                if let Some(runway) = state.pool.try_acquire(id) {
                    op.set(OperationState::InProgress);
                    self.on_acquired(&state, id, class, runway);
                    return Ok(Some(RunwayLease::new(self, runway, id, class)));
                }
                op.set(OperationState::WaitingForSlot);
            }

            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    tracing::debug!(%id, %class, "Cancelled while waiting for a runway");
                    return Err(TowerError::OperationInterrupted { id });
                }
                _ = notified => {}
            }
        }
    }

    /// Trace the acquisition and, when due, the occupancy report. Runs in
    /// the same critical section as the pool update it describes.
    fn on_acquired(&self, state: &TowerState, id: OperationId, class: FlightClass, runway: RunwayId) {
        tracing::debug!(%id, %class, %runway, "Runway acquired");
        self.trace.emit(&TraceEvent::Acquiring { id, class, runway });

        if OccupancyReport::should_report(
            state.pool.occupied(),
            state.pool.capacity(),
            state.processed,
            state.expected_operations,
        ) {
            self.trace
                .emit(&TraceEvent::Occupancy(OccupancyReport::capture(&state.pool)));
        }
    }

    /// Return a runway. Called exactly once per lease.
    pub(crate) fn depart(
        &self,
        runway: RunwayId,
        id: OperationId,
        class: FlightClass,
        completed: bool,
    ) {
        let opened = {
            let mut state = self.lock_state();
            state.pool.release(runway, id);
            state.processed += 1;
            let transition = state.gate.signal_departure(class);
            if completed {
                self.trace.emit(&TraceEvent::Completed { id, class });
            }
            tracing::debug!(
                %id,
                %class,
                %runway,
                completed,
                processed = state.processed,
                "Runway released"
            );
            if state.processed == state.expected_operations {
                tracing::info!(processed = state.processed, "All expected operations processed");
            }
            transition == GateTransition::Opened
        };

        if opened {
            tracing::info!(%id, "Gate opened for takeoffs");
            self.clearance.notify_waiters();
        }
        self.runway_freed.notify_waiters();
    }

    fn withdraw_arrival(&self, id: OperationId, class: FlightClass) {
        let opened = {
            let mut state = self.lock_state();
            state.gate.withdraw_arrival(class) == GateTransition::Opened
        };
        tracing::debug!(%id, "Landing withdrawn before acquiring a runway");
        if opened {
            self.clearance.notify_waiters();
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, TowerState> {
        self.state.lock().unwrap_or_else(|poisoned| {
            tracing::error!("Tower state mutex poisoned - recovering");
            poisoned.into_inner()
        })
    }
}

/// Keeps the operation's state visible in `operations` while the request runs.
struct TrackedOperation<'a> {
    operations: &'a DashMap<OperationId, OperationState>,
    id: OperationId,
    class: FlightClass,
}

impl TrackedOperation<'_> {
    fn set(&self, state: OperationState) {
        if let Some(mut entry) = self.operations.get_mut(&self.id) {
            *entry = state;
        }
    }
}

impl Drop for TrackedOperation<'_> {
    fn drop(&mut self) {
        if let Some((_, state)) = self.operations.remove(&self.id) {
            if state.is_terminal() {
                tracing::debug!(id = %self.id, class = %self.class, state = state.as_str(), "Operation finished");
            } else {
                // Request future dropped before it reached a terminal state.
                tracing::debug!(id = %self.id, class = %self.class, state = state.as_str(), "Operation abandoned");
            }
        }
    }
}

/// Rolls back a landing's arrival registration unless disarmed.
struct ArrivalGuard<'a> {
    tower: &'a ControlTower,
    id: OperationId,
    class: FlightClass,
    armed: bool,
}

impl ArrivalGuard<'_> {
    fn disarm(&mut self) {
        self.armed = false;
    }
}

impl Drop for ArrivalGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.tower.withdraw_arrival(self.id, self.class);
        }
    }
}
