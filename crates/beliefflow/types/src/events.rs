//! Token lifecycle events
//!
//! Every tracker mutation records exactly one event. Presentation layers
//! consume the stream to animate tokens and explain belief changes.

use crate::{Color, GroupId, SlotId, TokenId};
use serde::{Deserialize, Serialize};

/// What happened to one or more tokens
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LifecycleEvent {
    /// A token entered tracking in a fresh singleton group
    Spawned { token: TokenId, slot: SlotId, group: GroupId },

    /// A token's color was revealed
    Observed {
        token: TokenId,
        color: Color,
        /// Prior predictive probability of the observed color
        evidence: f64,
        /// True when no hypothesis could explain the observation
        contradiction: bool,
    },

    /// Two groups were joined into one
    Merged { from: GroupId, into: GroupId },

    /// Tokens were mixed without the outcome being observed
    Shuffled { tokens: Vec<TokenId>, group: GroupId },

    /// A perfectly correlated copy of a token was created
    Duplicated { original: TokenId, copy: TokenId },

    /// A token left tracking
    Collected { token: TokenId },

    /// All tokens discarded, posterior back to uniform
    Reset,
}

impl LifecycleEvent {
    /// Tokens this event concerns
    pub fn tokens(&self) -> Vec<TokenId> {
        match self {
            Self::Spawned { token, .. }
            | Self::Observed { token, .. }
            | Self::Collected { token } => vec![*token],
            Self::Shuffled { tokens, .. } => tokens.clone(),
            Self::Duplicated { original, copy } => vec![*original, *copy],
            Self::Merged { .. } | Self::Reset => Vec::new(),
        }
    }
}
