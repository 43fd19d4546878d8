//! Belief Tracker for beliefflow
//!
//! Keeps an exact posterior over a closed hypothesis set while colored
//! tokens move through a simulation. Token colors are latent: the tracker
//! factorizes their uncertainty into mutually independent **groups**, each
//! holding one joint table per hypothesis.
//!
//! # Operations
//!
//! - `spawn`: a token enters in a singleton group
//! - `observe`: condition on a revealed color, update the posterior
//! - `shuffle` / `shuffle_all`: merge groups and mix coordinates
//! - `duplicate`: perfectly correlated copy
//! - `collect`: marginalize a token out
//!
//! Table size per hypothesis is (colors)^(group size); large shuffles are
//! the scaling limit.

#![deny(unsafe_code)]

pub mod config;
pub mod errors;
pub mod group;
pub mod joint;
pub mod posterior;
pub mod tracker;

pub use config::TrackerConfig;
pub use errors::{TrackerError, TrackerResult};
pub use group::IndependenceGroup;
pub use joint::JointTable;
pub use posterior::{Posterior, PosteriorUpdate};
pub use tracker::{BeliefTracker, ObservationOutcome, TokenLocation};
