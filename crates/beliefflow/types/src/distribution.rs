//! Color distributions
//!
//! A Distribution is an *ordered* mapping from color to non-negative weight.
//! Weights need not sum to one; they are normalized by their total on use.
//! Insertion order is preserved so that labels and displays read the way
//! the level author wrote them.

use crate::{Color, ModelError, ModelResult};
use rand::distributions::{Distribution as _, WeightedIndex};
use rand::Rng;
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Largest per-color difference at which two distributions count as equal
pub const PROBABILITY_TOLERANCE: f64 = 1e-12;

/// Ordered color → weight mapping
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Distribution {
    entries: Vec<(Color, f64)>,
}

impl Distribution {
    /// Create an empty distribution
    pub fn new() -> Self {
        Self::default()
    }

    /// A degenerate distribution that always yields `color`
    pub fn single(color: impl Into<Color>) -> Self {
        Self::new().with(color, 1.0)
    }

    /// Equal weight on every listed color
    pub fn uniform<I, C>(colors: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<Color>,
    {
        colors
            .into_iter()
            .fold(Self::new(), |dist, color| dist.with(color, 1.0))
    }

    /// Build from (color, weight) pairs, keeping their order
    pub fn from_pairs<I, C>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (C, f64)>,
        C: Into<Color>,
    {
        pairs
            .into_iter()
            .fold(Self::new(), |dist, (color, weight)| dist.with(color, weight))
    }

    /// Set the weight of a color. A repeated color keeps its original
    /// position and takes the new weight.
    pub fn with(mut self, color: impl Into<Color>, weight: f64) -> Self {
        self.set(color, weight);
        self
    }

    pub fn set(&mut self, color: impl Into<Color>, weight: f64) {
        let color = color.into();
        match self.entries.iter_mut().find(|(c, _)| *c == color) {
            Some(entry) => entry.1 = weight,
            None => self.entries.push((color, weight)),
        }
    }

    pub fn entries(&self) -> &[(Color, f64)] {
        &self.entries
    }

    pub fn colors(&self) -> impl Iterator<Item = &Color> {
        self.entries.iter().map(|(c, _)| c)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Raw weight of a color (0 when absent)
    pub fn weight(&self, color: &Color) -> f64 {
        self.entries
            .iter()
            .find(|(c, _)| c == color)
            .map(|(_, w)| *w)
            .unwrap_or(0.0)
    }

    /// Sum of all weights
    pub fn total(&self) -> f64 {
        self.entries.iter().map(|(_, w)| w).sum()
    }

    /// Check that every weight is finite and non-negative and that the
    /// total is positive.
    pub fn validate(&self) -> ModelResult<()> {
        for (color, weight) in &self.entries {
            if !weight.is_finite() || *weight < 0.0 {
                return Err(ModelError::InvalidWeight {
                    color: color.clone(),
                    weight: *weight,
                });
            }
        }
        if self.total() <= 0.0 {
            return Err(ModelError::EmptyDistribution);
        }
        Ok(())
    }

    /// Normalized probabilities, in order, with zero-weight colors dropped
    pub fn normalized(&self) -> ModelResult<Vec<(Color, f64)>> {
        self.validate()?;
        let total = self.total();
        Ok(self
            .entries
            .iter()
            .filter(|(_, w)| *w > 0.0)
            .map(|(c, w)| (c.clone(), w / total))
            .collect())
    }

    /// Normalized probability of a single color (0 for an invalid distribution)
    pub fn probability(&self, color: &Color) -> f64 {
        let total = self.total();
        if total > 0.0 {
            self.weight(color) / total
        } else {
            0.0
        }
    }

    /// Same probabilities per color, regardless of entry order or scale.
    ///
    /// Zero-weight colors are ignored; invalid distributions never match.
    pub fn equivalent(&self, other: &Distribution) -> bool {
        let (Ok(mut a), Ok(mut b)) = (self.normalized(), other.normalized()) else {
            return false;
        };
        if a.len() != b.len() {
            return false;
        }
        a.sort_by(|x, y| x.0.cmp(&y.0));
        b.sort_by(|x, y| x.0.cmp(&y.0));
        a.iter()
            .zip(&b)
            .all(|((ca, pa), (cb, pb))| ca == cb && (pa - pb).abs() < PROBABILITY_TOLERANCE)
    }

    /// Weighted random choice of a color
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> ModelResult<&Color> {
        self.validate()?;
        let index = WeightedIndex::new(self.entries.iter().map(|(_, w)| *w))
            .map_err(|_| ModelError::EmptyDistribution)?;
        Ok(&self.entries[index.sample(rng)].0)
    }
}

impl std::fmt::Display for Distribution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let parts: Vec<String> = self
            .entries
            .iter()
            .map(|(c, w)| format!("{}:{}", c, w))
            .collect();
        write!(f, "{{{}}}", parts.join(" "))
    }
}

// ── Serde: JSON object in author order ──────────────────────────────

impl Serialize for Distribution {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (color, weight) in &self.entries {
            map.serialize_entry(color, weight)?;
        }
        map.end()
    }
}

struct DistributionVisitor;

impl<'de> Visitor<'de> for DistributionVisitor {
    type Value = Distribution;

    fn expecting(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "a map of color names to non-negative weights")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Distribution, A::Error> {
        let mut dist = Distribution::new();
        while let Some((color, weight)) = access.next_entry::<Color, f64>()? {
            dist.set(color, weight);
        }
        Ok(dist)
    }
}

impl<'de> Deserialize<'de> for Distribution {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(DistributionVisitor)
    }
}
