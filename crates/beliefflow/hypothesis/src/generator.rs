//! Hypothesis-space generation
//!
//! `generate` is a pure function: the same spec always yields the same
//! hypotheses, in the same order, with ids `0..N` and a uniform prior.

use crate::combinatorics::{cartesian, k_permutations, permutation_count, product_count};
use crate::errors::{GeneratorError, GeneratorResult};
use crate::script;
use crate::spec::{Candidate, HypothesisSpec, ListedHypothesis, SlotCandidates};
use beliefflow_types::{Distribution, Hypothesis, HypothesisId, SlotId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashSet};

/// Guards against combinatorial explosion
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GeneratorLimits {
    /// Largest hypothesis space the generator will enumerate
    pub max_hypotheses: usize,
}

impl Default for GeneratorLimits {
    fn default() -> Self {
        Self {
            max_hypotheses: 100_000,
        }
    }
}

/// A hypothesis before it is numbered
#[derive(Clone, Debug, PartialEq)]
pub struct RawHypothesis {
    pub label: String,
    pub slots: BTreeMap<SlotId, Distribution>,
}

// ── Hypothesis Space ─────────────────────────────────────────────────

/// An exhaustive, uniformly weighted hypothesis list
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HypothesisSpace {
    hypotheses: Vec<Hypothesis>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    schedule: Vec<SlotId>,
}

impl HypothesisSpace {
    fn from_raw(raw: Vec<RawHypothesis>, schedule: Vec<SlotId>) -> GeneratorResult<Self> {
        if raw.is_empty() {
            return Err(GeneratorError::EmptySpace);
        }
        let hypotheses = raw
            .into_iter()
            .enumerate()
            .map(|(i, r)| {
                for dist in r.slots.values() {
                    dist.validate()?;
                }
                Ok(Hypothesis {
                    id: HypothesisId(i),
                    label: r.label,
                    slots: r.slots,
                })
            })
            .collect::<GeneratorResult<Vec<_>>>()?;
        Ok(Self {
            hypotheses,
            schedule,
        })
    }

    pub fn len(&self) -> usize {
        self.hypotheses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hypotheses.is_empty()
    }

    pub fn hypotheses(&self) -> &[Hypothesis] {
        &self.hypotheses
    }

    pub fn get(&self, id: HypothesisId) -> Option<&Hypothesis> {
        self.hypotheses.get(id.index())
    }

    /// Prior probability of every hypothesis
    pub fn prior(&self) -> f64 {
        1.0 / self.hypotheses.len() as f64
    }

    /// Every slot assigned by at least one hypothesis
    pub fn slots(&self) -> BTreeSet<SlotId> {
        self.hypotheses
            .iter()
            .flat_map(|h| h.slots.keys().cloned())
            .collect()
    }

    /// Emission order declared by a script's SCHEDULE, empty otherwise
    pub fn schedule(&self) -> &[SlotId] {
        &self.schedule
    }

    /// Fail unless every hypothesis assigns every listed slot
    pub fn require_slots<'a, I>(&self, slots: I) -> GeneratorResult<()>
    where
        I: IntoIterator<Item = &'a SlotId>,
    {
        for slot in slots {
            if let Some(h) = self.hypotheses.iter().find(|h| !h.assigns(slot)) {
                return Err(GeneratorError::MissingSlot {
                    hypothesis: h.id,
                    slot: slot.clone(),
                });
            }
        }
        Ok(())
    }

    pub fn into_hypotheses(self) -> Vec<Hypothesis> {
        self.hypotheses
    }
}

// ── Generator ────────────────────────────────────────────────────────

/// Turns specs into hypothesis spaces
#[derive(Clone, Debug, Default)]
pub struct HypothesisGenerator {
    limits: GeneratorLimits,
}

impl HypothesisGenerator {
    pub fn new(limits: GeneratorLimits) -> Self {
        Self { limits }
    }

    pub fn limits(&self) -> &GeneratorLimits {
        &self.limits
    }

    /// Enumerate every hypothesis `spec` describes
    pub fn generate(&self, spec: &HypothesisSpec) -> GeneratorResult<HypothesisSpace> {
        let (raw, schedule) = match spec {
            HypothesisSpec::Independent { slots } => (self.independent(slots)?, Vec::new()),
            HypothesisSpec::Permutation {
                slots,
                distributions,
                hypotheses,
            } => {
                if hypotheses.is_empty() {
                    (self.permutation(slots, distributions)?, Vec::new())
                } else if slots.is_empty() && distributions.is_empty() {
                    (self.listed(hypotheses)?, Vec::new())
                } else {
                    return Err(GeneratorError::InvalidSpec(
                        "listed hypotheses cannot be combined with slots or distributions".into(),
                    ));
                }
            }
            HypothesisSpec::OddOneOut {
                slots,
                uniform,
                alternatives,
            } => (self.odd_one_out(slots, uniform, alternatives)?, Vec::new()),
            HypothesisSpec::Scripted { source } => {
                let resolved = script::compile(source)?.resolve(&self.limits)?;
                (resolved.hypotheses, resolved.schedule)
            }
        };

        let space = HypothesisSpace::from_raw(raw, schedule)?;
        tracing::info!(
            mode = spec.mode(),
            hypotheses = space.len(),
            "Generated hypothesis space"
        );
        Ok(space)
    }

    fn check_limit(&self, count: Option<usize>) -> GeneratorResult<usize> {
        match count {
            Some(c) if c <= self.limits.max_hypotheses => Ok(c),
            _ => Err(GeneratorError::TooManyHypotheses {
                limit: self.limits.max_hypotheses,
            }),
        }
    }

    fn independent(&self, slots: &[SlotCandidates]) -> GeneratorResult<Vec<RawHypothesis>> {
        ensure_unique(slots.iter().map(|s| &s.slot))?;
        if let Some(empty) = slots.iter().find(|s| s.candidates.is_empty()) {
            return Err(GeneratorError::EmptyCandidates(empty.slot.clone()));
        }

        let axes: Vec<usize> = slots.iter().map(|s| s.candidates.len()).collect();
        let count = self.check_limit(product_count(&axes))?;

        let mut out = Vec::with_capacity(count);
        for combo in cartesian(&axes) {
            let picks = slots
                .iter()
                .zip(combo)
                .map(|(s, i)| (&s.slot, &s.candidates[i]));
            out.push(assemble(picks));
        }
        Ok(out)
    }

    fn permutation(
        &self,
        slots: &[SlotId],
        distributions: &[Candidate],
    ) -> GeneratorResult<Vec<RawHypothesis>> {
        ensure_unique(slots.iter())?;
        if distributions.is_empty() {
            return Err(GeneratorError::EmptySpace);
        }
        if slots.len() > distributions.len() {
            return Err(GeneratorError::TooFewDistributions {
                slots: slots.len(),
                distributions: distributions.len(),
            });
        }

        let count = self.check_limit(permutation_count(distributions.len(), slots.len()))?;

        let mut out = Vec::with_capacity(count);
        for ordering in k_permutations(distributions.len(), slots.len()) {
            let picks = slots
                .iter()
                .zip(ordering)
                .map(|(slot, i)| (slot, &distributions[i]));
            out.push(assemble(picks));
        }
        Ok(out)
    }

    fn listed(&self, hypotheses: &[ListedHypothesis]) -> GeneratorResult<Vec<RawHypothesis>> {
        self.check_limit(Some(hypotheses.len()))?;
        Ok(hypotheses
            .iter()
            .enumerate()
            .map(|(i, h)| RawHypothesis {
                label: h
                    .label
                    .clone()
                    .unwrap_or_else(|| format!("hypothesis {}", i + 1)),
                slots: h.slots.clone(),
            })
            .collect())
    }

    fn odd_one_out(
        &self,
        slots: &[SlotId],
        uniform: &Distribution,
        alternatives: &[Candidate],
    ) -> GeneratorResult<Vec<RawHypothesis>> {
        ensure_unique(slots.iter())?;
        uniform.validate()?;
        let count = self.check_limit(slots.len().checked_mul(alternatives.len()))?;

        let mut out = Vec::with_capacity(count);
        for odd in slots {
            for alternative in alternatives {
                let slots_map = slots
                    .iter()
                    .map(|s| {
                        let dist = if s == odd {
                            alternative.distribution.clone()
                        } else {
                            uniform.clone()
                        };
                        (s.clone(), dist)
                    })
                    .collect();
                out.push(RawHypothesis {
                    label: format!("{}={}", odd, alternative.display_name()),
                    slots: slots_map,
                });
            }
        }
        Ok(out)
    }
}

/// Build a labeled hypothesis from (slot, candidate) picks
fn assemble<'a, I>(picks: I) -> RawHypothesis
where
    I: Iterator<Item = (&'a SlotId, &'a Candidate)>,
{
    let mut slots = BTreeMap::new();
    let mut label_parts = Vec::new();
    for (slot, candidate) in picks {
        label_parts.push(format!("{}={}", slot, candidate.display_name()));
        slots.insert(slot.clone(), candidate.distribution.clone());
    }
    RawHypothesis {
        label: label_parts.join(", "),
        slots,
    }
}

fn ensure_unique<'a, I>(slots: I) -> GeneratorResult<()>
where
    I: Iterator<Item = &'a SlotId>,
{
    let mut seen = HashSet::new();
    for slot in slots {
        if !seen.insert(slot) {
            return Err(GeneratorError::DuplicateSlot(slot.clone()));
        }
    }
    Ok(())
}

/// Generate with default limits
pub fn generate(spec: &HypothesisSpec) -> GeneratorResult<HypothesisSpace> {
    HypothesisGenerator::default().generate(spec)
}

/// Generate from DSL source text with default limits
pub fn generate_from_script(source: &str) -> GeneratorResult<HypothesisSpace> {
    generate(&HypothesisSpec::scripted(source))
}
