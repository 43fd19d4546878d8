//! Tracker configuration

use serde::{Deserialize, Serialize};

/// Tunables for the belief tracker
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Log a warning once any hypothesis's joint table holds more tuples
    /// than this. Tables grow as (colors)^(group size).
    pub joint_size_warning: usize,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            joint_size_warning: 4096,
        }
    }
}

impl TrackerConfig {
    pub fn with_joint_size_warning(mut self, limit: usize) -> Self {
        self.joint_size_warning = limit;
        self
    }
}
