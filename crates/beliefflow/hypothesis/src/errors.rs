//! Generator and DSL error types

use beliefflow_types::{HypothesisId, ModelError, SlotId};

/// Errors that can occur while parsing or compiling a hypothesis script
#[derive(Debug, thiserror::Error)]
pub enum DslError {
    #[error("Parse error at line {line}, column {col}: {message}")]
    ParseError {
        line: usize,
        col: usize,
        message: String,
    },

    #[error("Unexpected token: expected {expected}, found '{found}'")]
    UnexpectedToken { expected: String, found: String },

    #[error("Unexpected end of input: expected {0}")]
    UnexpectedEof(String),

    #[error("Unknown keyword: '{0}'")]
    UnknownKeyword(String),

    #[error("Unknown distribution: '{0}'")]
    UnknownDistribution(String),

    #[error("Unknown list: '{0}'")]
    UnknownList(String),

    #[error("Unknown bucket: '{0}'")]
    UnknownBucket(String),

    #[error("Duplicate name: '{0}'")]
    DuplicateName(String),

    #[error("List '{0}' is empty")]
    EmptyList(String),

    #[error("Index {index} out of range for list '{list}' of length {len}")]
    IndexOutOfRange {
        list: String,
        index: usize,
        len: usize,
    },

    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },

    #[error("Invalid distribution '{name}': {source}")]
    InvalidDistribution {
        name: String,
        #[source]
        source: ModelError,
    },
}

/// Result type alias for DSL operations
pub type DslResult<T> = Result<T, DslError>;

/// Errors that can occur while generating a hypothesis space
#[derive(Debug, thiserror::Error)]
pub enum GeneratorError {
    #[error("Unknown spec mode: '{0}'")]
    UnknownMode(String),

    #[error("Invalid spec: {0}")]
    InvalidSpec(String),

    #[error("Slot '{0}' has no candidate distributions")]
    EmptyCandidates(SlotId),

    #[error("Duplicate slot: '{0}'")]
    DuplicateSlot(SlotId),

    #[error("Cannot place {distributions} distributions across {slots} slots")]
    TooFewDistributions { slots: usize, distributions: usize },

    #[error("Spec produces more than {limit} hypotheses")]
    TooManyHypotheses { limit: usize },

    #[error("Spec produces no hypotheses")]
    EmptySpace,

    #[error("Hypothesis {hypothesis} has no distribution for slot '{slot}'")]
    MissingSlot {
        hypothesis: HypothesisId,
        slot: SlotId,
    },

    #[error("Model error: {0}")]
    Model(#[from] ModelError),

    #[error("Script error: {0}")]
    Dsl(#[from] DslError),
}

/// Result type alias for generator operations
pub type GeneratorResult<T> = Result<T, GeneratorError>;
