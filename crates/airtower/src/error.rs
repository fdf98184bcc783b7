use thiserror::Error;

use crate::flight::OperationId;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TowerError {
    /// Rejected at construction. Fatal for the tower being built.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// The operation was cancelled while waiting or while holding a runway.
    /// Any runway it held has already been returned.
    #[error("operation {id} was interrupted")]
    OperationInterrupted { id: OperationId },

    #[error("operation {0} is already in flight")]
    DuplicateOperation(OperationId),
}

impl TowerError {
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidConfiguration(message.into())
    }

    pub fn is_interrupted(&self) -> bool {
        matches!(self, Self::OperationInterrupted { .. })
    }
}

pub type Result<T> = std::result::Result<T, TowerError>;
