//! Belief Tracker: exact posterior over a closed hypothesis set
//!
//! The tracker:
//! 1. Spawns tokens into singleton independence groups
//! 2. Merges groups when tokens are shuffled together
//! 3. Conditions joints and posterior on observations
//! 4. Marginalizes collected tokens out of their groups
//!
//! Every mutation appends one [`LifecycleEvent`] to the event log.

use crate::config::TrackerConfig;
use crate::errors::{TrackerError, TrackerResult};
use crate::group::IndependenceGroup;
use crate::joint::JointTable;
use crate::posterior::Posterior;
use beliefflow_hypothesis::HypothesisSpace;
use beliefflow_types::{
    Color, Distribution, GroupId, Hypothesis, HypothesisId, HypothesisPosterior, LifecycleEvent,
    SlotId, SlotMarginal, TokenId,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Where a live token sits
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenLocation {
    pub group: GroupId,
    pub position: usize,
}

/// What an observation revealed
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ObservationOutcome {
    /// Prior predictive probability of the observed color
    pub evidence: f64,
    /// No hypothesis could explain the observation
    pub contradiction: bool,
}

/// The Belief Tracker
#[derive(Clone, Debug)]
pub struct BeliefTracker {
    hypotheses: Vec<Hypothesis>,
    posterior: Posterior,
    /// Depleted groups leave `None` so ids stay stable
    groups: Vec<Option<IndependenceGroup>>,
    locations: HashMap<TokenId, TokenLocation>,
    events: Vec<LifecycleEvent>,
    anomalies: u64,
    config: TrackerConfig,
}

impl BeliefTracker {
    /// Create a tracker with a uniform posterior over `space`
    pub fn new(space: &HypothesisSpace) -> Self {
        Self::with_config(space, TrackerConfig::default())
    }

    pub fn with_config(space: &HypothesisSpace, config: TrackerConfig) -> Self {
        Self {
            hypotheses: space.hypotheses().to_vec(),
            posterior: Posterior::uniform(space.len()),
            groups: Vec::new(),
            locations: HashMap::new(),
            events: Vec::new(),
            anomalies: 0,
            config,
        }
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    pub fn hypotheses(&self) -> &[Hypothesis] {
        &self.hypotheses
    }

    // ── Lifecycle ────────────────────────────────────────────────────

    /// Start tracking `token`, drawn from `slot`, in a fresh singleton group.
    ///
    /// Every hypothesis must assign `slot`; nothing changes otherwise.
    pub fn spawn(&mut self, token: TokenId, slot: &SlotId) -> TrackerResult<GroupId> {
        if self.locations.contains_key(&token) {
            return Err(TrackerError::DuplicateToken(token));
        }

        let joints = self
            .hypotheses
            .iter()
            .map(|h| -> TrackerResult<JointTable> {
                let dist = h
                    .assignment(slot)
                    .ok_or_else(|| TrackerError::MissingSlot {
                        hypothesis: h.id,
                        slot: slot.clone(),
                    })?;
                Ok(JointTable::singleton(dist)?)
            })
            .collect::<TrackerResult<Vec<_>>>()?;

        let group = GroupId(self.groups.len());
        self.groups
            .push(Some(IndependenceGroup::singleton(group, token, joints)));
        self.locations.insert(token, TokenLocation { group, position: 0 });

        tracing::debug!(token = %token, slot = %slot, group = %group, "Token spawned");
        self.events.push(LifecycleEvent::Spawned {
            token,
            slot: slot.clone(),
            group,
        });
        Ok(group)
    }

    /// Reveal that `token` shows `color` and update the posterior
    pub fn observe(&mut self, token: TokenId, color: &Color) -> TrackerResult<ObservationOutcome> {
        let location = self.location(token)?;
        let group = self.group_mut(location.group)?;
        let likelihoods = group.condition(location.position, color);
        let update = self.posterior.update(&likelihoods);

        if update.collapsed {
            self.anomalies += 1;
            tracing::warn!(
                token = %token,
                color = %color,
                anomalies = self.anomalies,
                "Observation contradicts every hypothesis; posterior reset to uniform"
            );
        } else {
            tracing::debug!(
                token = %token,
                color = %color,
                evidence = update.evidence,
                "Token observed"
            );
        }

        self.events.push(LifecycleEvent::Observed {
            token,
            color: color.clone(),
            evidence: update.evidence,
            contradiction: update.collapsed,
        });
        Ok(ObservationOutcome {
            evidence: update.evidence,
            contradiction: update.collapsed,
        })
    }

    /// Fairly swap two tokens without observing the outcome.
    ///
    /// Tokens in different groups are merged first. Shuffling a token with
    /// itself changes nothing.
    pub fn shuffle(&mut self, a: TokenId, b: TokenId) -> TrackerResult<()> {
        let loc_a = self.location(a)?;
        let loc_b = self.location(b)?;
        if a == b {
            return Ok(());
        }

        let group = self.merge(loc_a.group, loc_b.group)?;
        let pos_a = self.location(a)?.position;
        let pos_b = self.location(b)?.position;
        self.group_mut(group)?.transpose(pos_a, pos_b);

        tracing::debug!(a = %a, b = %b, group = %group, "Tokens shuffled");
        self.events.push(LifecycleEvent::Shuffled {
            tokens: vec![a, b],
            group,
        });
        Ok(())
    }

    /// Fully mix `tokens`: after the call every arrangement of their colors
    /// is equally likely given the multiset of colors.
    pub fn shuffle_all(&mut self, tokens: &[TokenId]) -> TrackerResult<()> {
        let mut unique: Vec<TokenId> = Vec::with_capacity(tokens.len());
        for &token in tokens {
            self.location(token)?;
            if !unique.contains(&token) {
                unique.push(token);
            }
        }
        let Some(&first) = unique.first() else {
            return Ok(());
        };
        if unique.len() < 2 {
            return Ok(());
        }

        let mut group = self.location(first)?.group;
        for &token in &unique[1..] {
            let other = self.location(token)?.group;
            group = self.merge(group, other)?;
        }

        let positions = unique
            .iter()
            .map(|&t| self.location(t).map(|l| l.position))
            .collect::<TrackerResult<Vec<_>>>()?;
        self.group_mut(group)?.symmetrize(&positions);

        tracing::debug!(tokens = unique.len(), group = %group, "Tokens mixed");
        self.events.push(LifecycleEvent::Shuffled {
            tokens: unique,
            group,
        });
        Ok(())
    }

    /// Add `copy` as a perfectly correlated sibling of `original`
    pub fn duplicate(&mut self, original: TokenId, copy: TokenId) -> TrackerResult<()> {
        if self.locations.contains_key(&copy) {
            return Err(TrackerError::DuplicateToken(copy));
        }
        let location = self.location(original)?;
        let group = self.group_mut(location.group)?;
        let position = group.duplicate(location.position, copy);
        let size = group.table_size();

        self.locations.insert(
            copy,
            TokenLocation {
                group: location.group,
                position,
            },
        );
        self.warn_if_oversized(location.group, size);

        tracing::debug!(original = %original, copy = %copy, "Token duplicated");
        self.events
            .push(LifecycleEvent::Duplicated { original, copy });
        Ok(())
    }

    /// Stop tracking `token`, summing its coordinate out of its group
    pub fn collect(&mut self, token: TokenId) -> TrackerResult<()> {
        let location = self.location(token)?;
        let group = self.group_mut(location.group)?;
        group.remove(location.position);
        let shifted: Vec<TokenId> = group.tokens()[location.position..].to_vec();
        let depleted = group.is_empty();

        self.locations.remove(&token);
        for t in shifted {
            if let Some(loc) = self.locations.get_mut(&t) {
                loc.position -= 1;
            }
        }
        if depleted {
            self.groups[location.group.index()] = None;
        }

        tracing::debug!(token = %token, group = %location.group, depleted, "Token collected");
        self.events.push(LifecycleEvent::Collected { token });
        Ok(())
    }

    /// Discard every token and group; posterior back to uniform
    pub fn reset(&mut self) {
        self.groups.clear();
        self.locations.clear();
        self.posterior.reset();
        tracing::debug!("Tracker reset");
        self.events.push(LifecycleEvent::Reset);
    }

    // ── Queries ──────────────────────────────────────────────────────

    /// Current probability of every hypothesis
    pub fn posterior(&self) -> Vec<HypothesisPosterior> {
        self.hypotheses
            .iter()
            .map(|h| HypothesisPosterior {
                id: h.id,
                label: h.label.clone(),
                probability: self.posterior.get(h.id.index()),
            })
            .collect()
    }

    pub fn probability(&self, hypothesis: HypothesisId) -> f64 {
        self.posterior.get(hypothesis.index())
    }

    /// Posterior mass per distinct distribution assigned to `slot`, in
    /// first-seen hypothesis order. Distributions with the same
    /// probabilities count as one, however their weights were written.
    pub fn posterior_for_slot(&self, slot: &SlotId) -> Vec<SlotMarginal> {
        let mut out: Vec<SlotMarginal> = Vec::new();
        for h in &self.hypotheses {
            let Some(dist) = h.assignment(slot) else {
                continue;
            };
            let p = self.posterior.get(h.id.index());
            match out.iter_mut().find(|m| m.distribution.equivalent(dist)) {
                Some(marginal) => {
                    marginal.probability += p;
                    marginal.hypotheses.push(h.id);
                }
                None => out.push(SlotMarginal {
                    distribution: dist.clone(),
                    probability: p,
                    hypotheses: vec![h.id],
                }),
            }
        }
        out
    }

    /// Posterior predictive distribution of a live token's color
    pub fn color_marginal(&self, token: TokenId) -> TrackerResult<Distribution> {
        let location = self.location(token)?;
        let group = self.group(location.group)?;

        let mut mass: BTreeMap<Color, f64> = BTreeMap::new();
        for (index, joint) in group.joints().iter().enumerate() {
            let weight = self.posterior.get(index);
            if weight == 0.0 {
                continue;
            }
            for (color, p) in joint.marginal(location.position) {
                *mass.entry(color).or_insert(0.0) += weight * p;
            }
        }
        Ok(Distribution::from_pairs(
            mass.into_iter().filter(|(_, p)| *p > 0.0),
        ))
    }

    /// The joint table `hypothesis` holds for `token`'s group
    pub fn joint(&self, token: TokenId, hypothesis: HypothesisId) -> TrackerResult<&JointTable> {
        let location = self.location(token)?;
        self.group(location.group)?
            .joint(hypothesis)
            .ok_or(TrackerError::UnknownToken(token))
    }

    pub fn location(&self, token: TokenId) -> TrackerResult<TokenLocation> {
        self.locations
            .get(&token)
            .copied()
            .ok_or(TrackerError::UnknownToken(token))
    }

    pub fn is_live(&self, token: TokenId) -> bool {
        self.locations.contains_key(&token)
    }

    pub fn group_of(&self, token: TokenId) -> Option<GroupId> {
        self.locations.get(&token).map(|l| l.group)
    }

    /// Tokens sharing `token`'s group, in coordinate order
    pub fn group_members(&self, token: TokenId) -> TrackerResult<Vec<TokenId>> {
        let location = self.location(token)?;
        Ok(self.group(location.group)?.tokens().to_vec())
    }

    /// Live tokens in ascending id order
    pub fn live_tokens(&self) -> Vec<TokenId> {
        let mut tokens: Vec<TokenId> = self.locations.keys().copied().collect();
        tokens.sort();
        tokens
    }

    /// Number of non-depleted groups
    pub fn group_count(&self) -> usize {
        self.groups.iter().filter(|g| g.is_some()).count()
    }

    /// Observations that contradicted every hypothesis so far
    pub fn anomaly_count(&self) -> u64 {
        self.anomalies
    }

    pub fn events(&self) -> &[LifecycleEvent] {
        &self.events
    }

    /// Take the event log, leaving it empty
    pub fn drain_events(&mut self) -> Vec<LifecycleEvent> {
        std::mem::take(&mut self.events)
    }

    // ── Internals ────────────────────────────────────────────────────

    fn group(&self, id: GroupId) -> TrackerResult<&IndependenceGroup> {
        self.groups
            .get(id.index())
            .and_then(Option::as_ref)
            .ok_or(TrackerError::GroupDepleted(id))
    }

    fn group_mut(&mut self, id: GroupId) -> TrackerResult<&mut IndependenceGroup> {
        self.groups
            .get_mut(id.index())
            .and_then(Option::as_mut)
            .ok_or(TrackerError::GroupDepleted(id))
    }

    /// Fold group `from` into `into`; returns the surviving group
    fn merge(&mut self, into: GroupId, from: GroupId) -> TrackerResult<GroupId> {
        if into == from {
            return Ok(into);
        }
        let absorbed = self
            .groups
            .get_mut(from.index())
            .and_then(Option::take)
            .ok_or(TrackerError::GroupDepleted(from))?;
        let moved: Vec<TokenId> = absorbed.tokens().to_vec();

        let target = self.group_mut(into)?;
        let offset = target.absorb(absorbed);
        let size = target.table_size();

        for (i, token) in moved.into_iter().enumerate() {
            self.locations.insert(
                token,
                TokenLocation {
                    group: into,
                    position: offset + i,
                },
            );
        }
        self.warn_if_oversized(into, size);

        tracing::debug!(from = %from, into = %into, "Groups merged");
        self.events.push(LifecycleEvent::Merged { from, into });
        Ok(into)
    }

    fn warn_if_oversized(&self, group: GroupId, size: usize) {
        if size > self.config.joint_size_warning {
            tracing::warn!(
                group = %group,
                tuples = size,
                limit = self.config.joint_size_warning,
                "Joint table exceeds size warning"
            );
        }
    }
}
