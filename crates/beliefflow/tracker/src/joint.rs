//! Joint distribution over color tuples
//!
//! A [`JointTable`] maps a tuple of colors (one coordinate per token of a
//! group) to its probability under one hypothesis. Tables are kept in
//! linear probability space and sum to 1.

use beliefflow_types::{Color, Distribution, ModelResult};
use std::collections::BTreeMap;

/// Probability table keyed by canonical color tuples
#[derive(Clone, Debug, PartialEq)]
pub struct JointTable {
    entries: BTreeMap<Vec<Color>, f64>,
}

impl JointTable {
    /// Zero-coordinate table: the empty tuple with mass 1
    pub fn unit() -> Self {
        let mut entries = BTreeMap::new();
        entries.insert(Vec::new(), 1.0);
        Self { entries }
    }

    /// One-coordinate table from a normalized distribution
    pub fn singleton(distribution: &Distribution) -> ModelResult<Self> {
        let entries = distribution
            .normalized()?
            .into_iter()
            .map(|(color, p)| (vec![color], p))
            .collect();
        Ok(Self { entries })
    }

    pub fn entries(&self) -> &BTreeMap<Vec<Color>, f64> {
        &self.entries
    }

    /// Probability of an exact tuple
    pub fn get(&self, tuple: &[Color]) -> f64 {
        self.entries.get(tuple).copied().unwrap_or(0.0)
    }

    /// Number of stored tuples
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn total(&self) -> f64 {
        self.entries.values().sum()
    }

    /// Probability that coordinate `position` shows `color`
    pub fn likelihood(&self, position: usize, color: &Color) -> f64 {
        self.entries
            .iter()
            .filter(|(k, _)| k[position] == *color)
            .map(|(_, m)| m)
            .sum()
    }

    /// Condition on coordinate `position` being `color`.
    ///
    /// Returns the likelihood. A zero likelihood leaves the table untouched.
    pub fn condition(&mut self, position: usize, color: &Color) -> f64 {
        let likelihood = self.likelihood(position, color);
        if likelihood > 0.0 {
            self.entries.retain(|k, _| k[position] == *color);
            for mass in self.entries.values_mut() {
                *mass /= likelihood;
            }
        }
        likelihood
    }

    /// Outer product: coordinates of `other` follow those of `self`
    pub fn product(&self, other: &JointTable) -> JointTable {
        let mut entries = BTreeMap::new();
        for (left, ml) in &self.entries {
            for (right, mr) in &other.entries {
                let mut key = Vec::with_capacity(left.len() + right.len());
                key.extend_from_slice(left);
                key.extend_from_slice(right);
                entries.insert(key, ml * mr);
            }
        }
        JointTable { entries }
    }

    /// Fair transposition: half the mass stays, half swaps `a` and `b`
    pub fn transpose(&mut self, a: usize, b: usize) {
        if a == b {
            return;
        }
        let mut entries: BTreeMap<Vec<Color>, f64> = BTreeMap::new();
        for (key, mass) in std::mem::take(&mut self.entries) {
            let mut swapped = key.clone();
            swapped.swap(a, b);
            *entries.entry(key).or_insert(0.0) += mass / 2.0;
            *entries.entry(swapped).or_insert(0.0) += mass / 2.0;
        }
        self.entries = entries;
    }

    /// Full mixing over `positions`: given the multiset of values found at
    /// those positions, every distinct arrangement becomes equally likely.
    pub fn symmetrize(&mut self, positions: &[usize]) {
        if positions.len() < 2 {
            return;
        }

        // Orbit representative: the shuffled values sorted into place
        let mut orbits: BTreeMap<Vec<Color>, f64> = BTreeMap::new();
        for (key, mass) in &self.entries {
            *orbits.entry(canonical(key, positions)).or_insert(0.0) += mass;
        }

        let mut entries = BTreeMap::new();
        for (representative, mass) in orbits {
            let mut values: Vec<Color> = positions
                .iter()
                .map(|&p| representative[p].clone())
                .collect();
            let mut arrangements = Vec::new();
            loop {
                let mut key = representative.clone();
                for (&p, value) in positions.iter().zip(&values) {
                    key[p] = value.clone();
                }
                arrangements.push(key);
                if !next_permutation(&mut values) {
                    break;
                }
            }
            let share = mass / arrangements.len() as f64;
            for key in arrangements {
                *entries.entry(key).or_insert(0.0) += share;
            }
        }
        self.entries = entries;
    }

    /// Append a copy of coordinate `position` as a new last coordinate
    pub fn duplicate(&mut self, position: usize) {
        self.entries = std::mem::take(&mut self.entries)
            .into_iter()
            .map(|(mut key, mass)| {
                let copy = key[position].clone();
                key.push(copy);
                (key, mass)
            })
            .collect();
    }

    /// Sum coordinate `position` out of the table
    pub fn marginalize(&mut self, position: usize) {
        let mut entries: BTreeMap<Vec<Color>, f64> = BTreeMap::new();
        for (mut key, mass) in std::mem::take(&mut self.entries) {
            key.remove(position);
            *entries.entry(key).or_insert(0.0) += mass;
        }
        self.entries = entries;
    }

    /// Distribution of one coordinate
    pub fn marginal(&self, position: usize) -> BTreeMap<Color, f64> {
        let mut out = BTreeMap::new();
        for (key, mass) in &self.entries {
            *out.entry(key[position].clone()).or_insert(0.0) += mass;
        }
        out
    }
}

fn canonical(key: &[Color], positions: &[usize]) -> Vec<Color> {
    let mut values: Vec<&Color> = positions.iter().map(|&p| &key[p]).collect();
    values.sort();
    let mut out = key.to_vec();
    for (&p, value) in positions.iter().zip(values) {
        out[p] = value.clone();
    }
    out
}

/// Advance to the next lexicographic arrangement; false after the last
fn next_permutation<T: Ord>(items: &mut [T]) -> bool {
    if items.len() < 2 {
        return false;
    }
    let mut i = items.len() - 1;
    while i > 0 && items[i - 1] >= items[i] {
        i -= 1;
    }
    if i == 0 {
        return false;
    }
    let mut j = items.len() - 1;
    while items[j] <= items[i - 1] {
        j -= 1;
    }
    items.swap(i - 1, j);
    items[i..].reverse();
    true
}
