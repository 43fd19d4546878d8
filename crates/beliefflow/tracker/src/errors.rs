//! Tracker error types

use beliefflow_types::{GroupId, HypothesisId, ModelError, SlotId, TokenId};

/// Errors that can occur during tracker operations
#[derive(Debug, thiserror::Error)]
pub enum TrackerError {
    #[error("Token not tracked: {0}")]
    UnknownToken(TokenId),

    #[error("Token already tracked: {0}")]
    DuplicateToken(TokenId),

    #[error("Hypothesis {hypothesis} has no distribution for slot '{slot}'")]
    MissingSlot {
        hypothesis: HypothesisId,
        slot: SlotId,
    },

    #[error("Group {0} no longer exists")]
    GroupDepleted(GroupId),

    #[error("Model error: {0}")]
    Model(#[from] ModelError),
}

/// Result type alias for tracker operations
pub type TrackerResult<T> = Result<T, TrackerError>;
