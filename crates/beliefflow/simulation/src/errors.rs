//! Simulation error types

use crate::network::StationId;
use beliefflow_tracker::TrackerError;
use beliefflow_types::{ModelError, SlotId, TokenId};

/// Errors that can occur while building or running a simulation
#[derive(Debug, thiserror::Error)]
pub enum SimulationError {
    #[error("Invalid network: {0}")]
    Config(String),

    #[error("Station not found: {0}")]
    StationNotFound(StationId),

    #[error("Station '{0}' is not a source")]
    NotASource(StationId),

    #[error("No source emits slot '{0}'")]
    UnknownSlot(SlotId),

    #[error("Token not found: {0}")]
    TokenNotFound(TokenId),

    #[error("Network still busy after {limit} ticks")]
    TickLimit { limit: u64 },

    #[error("Network parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Tracker error: {0}")]
    Tracker(#[from] TrackerError),

    #[error("Model error: {0}")]
    Model(#[from] ModelError),
}

/// Result type alias for simulation operations
pub type SimulationResult<T> = Result<T, SimulationError>;
