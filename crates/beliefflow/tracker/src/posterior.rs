//! Posterior weights over hypotheses

/// Result of folding one observation into the posterior
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PosteriorUpdate {
    /// Prior predictive probability of the evidence
    pub evidence: f64,
    /// All mass vanished and the posterior fell back to uniform
    pub collapsed: bool,
}

/// Probability per hypothesis, indexed by hypothesis id
#[derive(Clone, Debug, PartialEq)]
pub struct Posterior {
    weights: Vec<f64>,
}

impl Posterior {
    pub fn uniform(n: usize) -> Self {
        let p = if n == 0 { 0.0 } else { 1.0 / n as f64 };
        Self { weights: vec![p; n] }
    }

    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    pub fn get(&self, index: usize) -> f64 {
        self.weights.get(index).copied().unwrap_or(0.0)
    }

    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    pub fn total(&self) -> f64 {
        self.weights.iter().sum()
    }

    pub fn reset(&mut self) {
        *self = Self::uniform(self.weights.len());
    }

    /// Multiply by per-hypothesis likelihoods and renormalize
    pub fn update(&mut self, likelihoods: &[f64]) -> PosteriorUpdate {
        for (w, l) in self.weights.iter_mut().zip(likelihoods) {
            *w *= l;
        }
        let evidence = self.total();
        if evidence > 0.0 && evidence.is_finite() {
            for w in &mut self.weights {
                *w /= evidence;
            }
            PosteriorUpdate {
                evidence,
                collapsed: false,
            }
        } else {
            self.reset();
            PosteriorUpdate {
                evidence: 0.0,
                collapsed: true,
            }
        }
    }
}
