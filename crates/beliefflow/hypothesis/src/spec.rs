//! Declarative hypothesis specs
//!
//! A spec is a tagged object: `{"mode": "independent", ...}`. Scripted
//! specs carry DSL source text and go through the same generator.

use crate::errors::{GeneratorError, GeneratorResult};
use beliefflow_types::{Distribution, SlotId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Modes accepted in the `mode` tag
pub const KNOWN_MODES: [&str; 4] = ["independent", "permutation", "oddOneOut", "scripted"];

/// A candidate distribution with an optional display label
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub distribution: Distribution,
}

impl Candidate {
    pub fn new(distribution: Distribution) -> Self {
        Self {
            label: None,
            distribution,
        }
    }

    pub fn labeled(label: impl Into<String>, distribution: Distribution) -> Self {
        Self {
            label: Some(label.into()),
            distribution,
        }
    }

    /// Label if present, otherwise the rendered distribution
    pub fn display_name(&self) -> String {
        self.label
            .clone()
            .unwrap_or_else(|| self.distribution.to_string())
    }
}

/// All candidate distributions for one slot (independent mode)
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SlotCandidates {
    pub slot: SlotId,
    pub candidates: Vec<Candidate>,
}

/// A hypothesis supplied verbatim by the level author
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ListedHypothesis {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub slots: BTreeMap<SlotId, Distribution>,
}

/// How to build a hypothesis space
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "camelCase")]
pub enum HypothesisSpec {
    /// Cartesian product of each slot's candidates
    Independent { slots: Vec<SlotCandidates> },

    /// Every ordering of `distributions` across `slots`, or, when
    /// `hypotheses` is non-empty, that list passed straight through
    Permutation {
        #[serde(default)]
        slots: Vec<SlotId>,
        #[serde(default)]
        distributions: Vec<Candidate>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        hypotheses: Vec<ListedHypothesis>,
    },

    /// One slot differs from a shared uniform distribution
    OddOneOut {
        slots: Vec<SlotId>,
        uniform: Distribution,
        alternatives: Vec<Candidate>,
    },

    /// DSL source text
    Scripted { source: String },
}

impl HypothesisSpec {
    /// Parse a JSON spec, reporting an unrecognized mode distinctly
    pub fn from_json(json: &str) -> GeneratorResult<Self> {
        let value: serde_json::Value =
            serde_json::from_str(json).map_err(|e| GeneratorError::InvalidSpec(e.to_string()))?;

        let mode = value
            .get("mode")
            .and_then(|m| m.as_str())
            .ok_or_else(|| GeneratorError::InvalidSpec("missing 'mode' field".into()))?;
        if !KNOWN_MODES.contains(&mode) {
            return Err(GeneratorError::UnknownMode(mode.to_string()));
        }

        // Re-read from text: `Value` maps do not keep distribution order
        serde_json::from_str(json).map_err(|e| GeneratorError::InvalidSpec(e.to_string()))
    }

    /// Wrap DSL source text
    pub fn scripted(source: impl Into<String>) -> Self {
        Self::Scripted {
            source: source.into(),
        }
    }

    pub fn mode(&self) -> &'static str {
        match self {
            Self::Independent { .. } => "independent",
            Self::Permutation { .. } => "permutation",
            Self::OddOneOut { .. } => "oddOneOut",
            Self::Scripted { .. } => "scripted",
        }
    }
}
