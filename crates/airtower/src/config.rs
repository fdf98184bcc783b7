//! Tower configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TowerError};

pub const DEFAULT_RUNWAYS: usize = 2;
pub const DEFAULT_HOLD: Duration = Duration::from_millis(5000);

/// Which gating rule the tower applies to takeoffs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PolicyConfig {
    /// Takeoffs wait until `expected_landings` landings have finished.
    Threshold { expected_landings: usize },
    /// Takeoffs wait while any landing is live.
    LiveCount,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TowerConfig {
    pub runways: usize,
    /// How long an operation keeps its runway.
    #[serde(rename = "hold_ms", with = "millis")]
    pub hold: Duration,
    pub policy: PolicyConfig,
    /// Operations of both classes over the whole run. Used to detect the
    /// last operation for the occupancy report.
    pub expected_operations: usize,
}

impl Default for TowerConfig {
    fn default() -> Self {
        Self {
            runways: DEFAULT_RUNWAYS,
            hold: DEFAULT_HOLD,
            policy: PolicyConfig::Threshold {
                expected_landings: 5,
            },
            expected_operations: 15,
        }
    }
}

impl TowerConfig {
    /// Threshold tower for a run with a known number of each class.
    pub fn threshold(landings: usize, takeoffs: usize) -> Self {
        Self {
            policy: PolicyConfig::Threshold {
                expected_landings: landings,
            },
            expected_operations: landings + takeoffs,
            ..Self::default()
        }
    }

    pub fn live_count(expected_operations: usize) -> Self {
        Self {
            policy: PolicyConfig::LiveCount,
            expected_operations,
            ..Self::default()
        }
    }

    pub fn with_runways(mut self, runways: usize) -> Self {
        self.runways = runways;
        self
    }

    pub fn with_hold(mut self, hold: Duration) -> Self {
        self.hold = hold;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.runways == 0 {
            return Err(TowerError::invalid("runway capacity must be at least 1"));
        }
        if self.expected_operations == 0 {
            return Err(TowerError::invalid(
                "expected_operations must be at least 1",
            ));
        }
        if let PolicyConfig::Threshold { expected_landings } = self.policy
            && expected_landings > self.expected_operations
        {
            return Err(TowerError::invalid(format!(
                "expected_landings ({expected_landings}) exceeds expected_operations ({})",
                self.expected_operations
            )));
        }
        Ok(())
    }
}

mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_millis)
    }
}
