//! Hypotheses: candidate worlds over which belief is tracked

use crate::{Distribution, HypothesisId, SlotId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One complete candidate assignment of a distribution to every slot.
///
/// Hypotheses are immutable once a generator has produced them.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Hypothesis {
    pub id: HypothesisId,
    pub label: String,
    pub slots: BTreeMap<SlotId, Distribution>,
}

impl Hypothesis {
    pub fn new(id: HypothesisId, label: impl Into<String>) -> Self {
        Self {
            id,
            label: label.into(),
            slots: BTreeMap::new(),
        }
    }

    pub fn with_slot(mut self, slot: impl Into<SlotId>, distribution: Distribution) -> Self {
        self.slots.insert(slot.into(), distribution);
        self
    }

    /// The distribution this hypothesis assigns to `slot`, if any
    pub fn assignment(&self, slot: &SlotId) -> Option<&Distribution> {
        self.slots.get(slot)
    }

    pub fn assigns(&self, slot: &SlotId) -> bool {
        self.slots.contains_key(slot)
    }
}

/// A hypothesis with its current posterior probability
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HypothesisPosterior {
    pub id: HypothesisId,
    pub label: String,
    pub probability: f64,
}

/// Posterior mass on one distinct distribution for a slot
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SlotMarginal {
    pub distribution: Distribution,
    pub probability: f64,
    /// Hypotheses that assign this distribution to the slot
    pub hypotheses: Vec<HypothesisId>,
}
