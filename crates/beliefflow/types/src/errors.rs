//! Error types for the core model

use crate::Color;

/// Errors raised by model types
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("Invalid weight {weight} for color '{color}'")]
    InvalidWeight { color: Color, weight: f64 },

    #[error("Distribution has no positive weight")]
    EmptyDistribution,
}

/// Result type alias for model operations
pub type ModelResult<T> = Result<T, ModelError>;
