//! Operation identity, class and lifecycle state.

use serde::{Deserialize, Serialize};

/// Identifier of one runway request. Unique among in-flight operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OperationId(u64);

impl OperationId {
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn get(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for OperationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Priority class of an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlightClass {
    /// High priority. Never blocked behind a takeoff.
    Landing,
    /// Low priority. Gated by landing progress.
    Takeoff,
}

impl FlightClass {
    pub fn is_priority(&self) -> bool {
        matches!(self, Self::Landing)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Landing => "landing",
            Self::Takeoff => "takeoff",
        }
    }
}

impl std::fmt::Display for FlightClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle of a single request.
///
/// ```text
/// Requested -> WaitingForClearance (takeoff only) -> WaitingForSlot -> InProgress -> Completed
///          \_________________________________________________________________/
///                                      |
///                                  Cancelled
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationState {
    Requested,
    WaitingForClearance,
    WaitingForSlot,
    InProgress,
    Completed,
    Cancelled,
}

impl OperationState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Requested => "requested",
            Self::WaitingForClearance => "waiting_for_clearance",
            Self::WaitingForSlot => "waiting_for_slot",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_is_terminal() {
        assert!(!OperationState::Requested.is_terminal());
        assert!(!OperationState::WaitingForClearance.is_terminal());
        assert!(!OperationState::WaitingForSlot.is_terminal());
        assert!(!OperationState::InProgress.is_terminal());
        assert!(OperationState::Completed.is_terminal());
        assert!(OperationState::Cancelled.is_terminal());
    }

    #[test]
    fn landing_is_priority() {
        assert!(FlightClass::Landing.is_priority());
        assert!(!FlightClass::Takeoff.is_priority());
    }

    #[test]
    fn serializes_snake_case() {
        insta::assert_json_snapshot!(
            [OperationState::WaitingForClearance, OperationState::InProgress],
            @r#"
        [
          "waiting_for_clearance",
          "in_progress"
        ]
        "#
        );
        assert_eq!(
            serde_json::to_string(&FlightClass::Takeoff).unwrap(),
            "\"takeoff\""
        );
        assert_eq!(serde_json::to_string(&OperationId::new(12)).unwrap(), "12");
    }
}
