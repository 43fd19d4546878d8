//! Token colors

use serde::{Deserialize, Serialize};

/// A token color.
///
/// Colors are compared by name only. Ordering is lexicographic, which gives
/// joint tables a stable canonical key order.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Color(pub String);

impl Color {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Color {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Color {
    fn from(name: &str) -> Self {
        Self(name.to_string())
    }
}

impl From<String> for Color {
    fn from(name: String) -> Self {
        Self(name)
    }
}
