//! Independence groups
//!
//! A group owns an ordered list of tokens and one joint table per
//! hypothesis. Coordinate `i` of every tuple is the color of `tokens[i]`.
//! Distinct groups are mutually independent.

use crate::joint::JointTable;
use beliefflow_types::{Color, GroupId, HypothesisId, TokenId};

/// Tokens whose colors are tracked jointly
#[derive(Clone, Debug)]
pub struct IndependenceGroup {
    id: GroupId,
    tokens: Vec<TokenId>,
    /// Indexed by hypothesis
    joints: Vec<JointTable>,
}

impl IndependenceGroup {
    pub fn singleton(id: GroupId, token: TokenId, joints: Vec<JointTable>) -> Self {
        Self {
            id,
            tokens: vec![token],
            joints,
        }
    }

    pub fn id(&self) -> GroupId {
        self.id
    }

    pub fn tokens(&self) -> &[TokenId] {
        &self.tokens
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn position(&self, token: TokenId) -> Option<usize> {
        self.tokens.iter().position(|t| *t == token)
    }

    pub fn joint(&self, hypothesis: HypothesisId) -> Option<&JointTable> {
        self.joints.get(hypothesis.index())
    }

    pub fn joints(&self) -> &[JointTable] {
        &self.joints
    }

    /// Largest table across hypotheses
    pub fn table_size(&self) -> usize {
        self.joints.iter().map(JointTable::len).max().unwrap_or(0)
    }

    /// Append `other`'s tokens and take the outer product of every joint.
    /// Returns the position offset of the absorbed tokens.
    pub fn absorb(&mut self, other: IndependenceGroup) -> usize {
        let offset = self.tokens.len();
        self.joints = self
            .joints
            .iter()
            .zip(&other.joints)
            .map(|(mine, theirs)| mine.product(theirs))
            .collect();
        self.tokens.extend(other.tokens);
        offset
    }

    /// Condition every hypothesis's joint; returns per-hypothesis likelihoods
    pub fn condition(&mut self, position: usize, color: &Color) -> Vec<f64> {
        self.joints
            .iter_mut()
            .map(|joint| joint.condition(position, color))
            .collect()
    }

    pub fn transpose(&mut self, a: usize, b: usize) {
        for joint in &mut self.joints {
            joint.transpose(a, b);
        }
    }

    pub fn symmetrize(&mut self, positions: &[usize]) {
        for joint in &mut self.joints {
            joint.symmetrize(positions);
        }
    }

    /// Add `copy` as a perfectly correlated sibling of `position`.
    /// Returns the copy's position.
    pub fn duplicate(&mut self, position: usize, copy: TokenId) -> usize {
        for joint in &mut self.joints {
            joint.duplicate(position);
        }
        self.tokens.push(copy);
        self.tokens.len() - 1
    }

    /// Marginalize the token at `position` out of the group
    pub fn remove(&mut self, position: usize) -> TokenId {
        for joint in &mut self.joints {
            joint.marginalize(position);
        }
        self.tokens.remove(position)
    }
}
