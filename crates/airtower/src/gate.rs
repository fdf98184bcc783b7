//! Priority gate deciding when takeoffs may compete for a runway.
//!
//! The gate only keeps counters and answers "is it open". Blocking and
//! wake-ups are done by the tower, which owns the lock the gate lives behind
//! and the `Notify` that waiting takeoffs park on.
//!
//! Two policies are supported, selected at construction:
//!
//! ```text
//! Threshold(n): closed until n landings have left their runway, then open for good
//! LiveCount:    open only while no landing is admitted, waiting or on a runway
//! ```
//!
//! `LiveCount` needs no upfront count but starves takeoffs for as long as
//! landings keep arriving. No aging or alternation is applied.

use serde::Serialize;

use crate::config::PolicyConfig;
use crate::flight::FlightClass;

/// Landing counters the policies interpret.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct GateCounters {
    /// Landings that have left their runway (completed or interrupted mid-hold).
    pub completed_landings: usize,
    /// Landings admitted and not yet departed.
    pub live_landings: usize,
}

/// A gating rule over [`GateCounters`].
pub trait ClearancePolicy: Send + std::fmt::Debug {
    fn name(&self) -> &'static str;

    fn is_open(&self, counters: &GateCounters) -> bool;

    /// Landings expected over the whole run, if the policy needs to know.
    fn expected_landings(&self) -> Option<usize> {
        None
    }
}

/// Opens once `expected_landings` landings have departed. Never recloses.
#[derive(Debug, Clone, Copy)]
pub struct ThresholdPolicy {
    expected_landings: usize,
}

impl ThresholdPolicy {
    pub fn new(expected_landings: usize) -> Self {
        Self { expected_landings }
    }
}

impl ClearancePolicy for ThresholdPolicy {
    fn name(&self) -> &'static str {
        "threshold"
    }

    fn is_open(&self, counters: &GateCounters) -> bool {
        // completed_landings only grows, so once open this stays open
        counters.completed_landings >= self.expected_landings
    }

    fn expected_landings(&self) -> Option<usize> {
        Some(self.expected_landings)
    }
}

/// Open while no landing is live. May close and reopen any number of times.
#[derive(Debug, Clone, Copy, Default)]
pub struct LiveCountPolicy;

impl ClearancePolicy for LiveCountPolicy {
    fn name(&self) -> &'static str {
        "live_count"
    }

    fn is_open(&self, counters: &GateCounters) -> bool {
        counters.live_landings == 0
    }
}

/// Outcome of a counter update, as seen by waiting takeoffs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateTransition {
    Unchanged,
    Opened,
    Closed,
}

#[derive(Debug)]
pub struct PriorityGate {
    policy: Box<dyn ClearancePolicy>,
    counters: GateCounters,
}

impl PriorityGate {
    pub fn new(policy: Box<dyn ClearancePolicy>) -> Self {
        Self {
            policy,
            counters: GateCounters::default(),
        }
    }

    pub fn from_config(config: &PolicyConfig) -> Self {
        match *config {
            PolicyConfig::Threshold { expected_landings } => {
                Self::new(Box::new(ThresholdPolicy::new(expected_landings)))
            }
            PolicyConfig::LiveCount => Self::new(Box::new(LiveCountPolicy)),
        }
    }

    pub fn is_open(&self) -> bool {
        self.policy.is_open(&self.counters)
    }

    pub fn policy_name(&self) -> &'static str {
        self.policy.name()
    }

    pub fn expected_landings(&self) -> Option<usize> {
        self.policy.expected_landings()
    }

    pub fn counters(&self) -> GateCounters {
        self.counters
    }

    /// A landing was admitted, before it looks for a runway.
    pub fn register_arrival(&mut self, class: FlightClass) -> GateTransition {
        if !class.is_priority() {
            return GateTransition::Unchanged;
        }
        self.update(|c| c.live_landings += 1)
    }

    /// A landing gave up before it ever held a runway. Undoes `register_arrival`.
    pub fn withdraw_arrival(&mut self, class: FlightClass) -> GateTransition {
        if !class.is_priority() {
            return GateTransition::Unchanged;
        }
        self.update(|c| c.live_landings = c.live_landings.saturating_sub(1))
    }

    /// An operation left its runway. Only landings move the counters, but
    /// every departure goes through here so the caller has one place to
    /// decide on wake-ups.
    pub fn signal_departure(&mut self, class: FlightClass) -> GateTransition {
        if !class.is_priority() {
            return GateTransition::Unchanged;
        }
        self.update(|c| {
            c.live_landings = c.live_landings.saturating_sub(1);
            c.completed_landings += 1;
        })
    }

    fn update(&mut self, f: impl FnOnce(&mut GateCounters)) -> GateTransition {
        let was_open = self.is_open();
        f(&mut self.counters);
        match (was_open, self.is_open()) {
            (false, true) => GateTransition::Opened,
            (true, false) => GateTransition::Closed,
            _ => GateTransition::Unchanged,
        }
    }
}
