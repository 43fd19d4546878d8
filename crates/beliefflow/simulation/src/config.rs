//! Simulation configuration

use beliefflow_tracker::TrackerConfig;
use serde::{Deserialize, Serialize};

/// Configuration for a token-flow simulation
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Seed for display-color sampling and cosmetic shuffles
    pub seed: u64,
    /// Ticks a released token spends on a connection
    pub travel_ticks: u64,
    /// Upper bound for `run_until_idle`
    pub max_ticks: u64,
    pub tracker: TrackerConfig,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            travel_ticks: 1,
            max_ticks: 10_000,
            tracker: TrackerConfig::default(),
        }
    }
}

impl SimulationConfig {
    /// Short, fixed-seed runs for demos
    pub fn demo() -> Self {
        Self {
            seed: 42,
            max_ticks: 500,
            ..Self::default()
        }
    }

    /// Slower token travel and a tighter joint-size warning for teaching
    pub fn classroom() -> Self {
        Self {
            seed: 7,
            travel_ticks: 2,
            max_ticks: 2_000,
            tracker: TrackerConfig::default().with_joint_size_warning(1024),
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_travel_ticks(mut self, ticks: u64) -> Self {
        self.travel_ticks = ticks;
        self
    }
}
