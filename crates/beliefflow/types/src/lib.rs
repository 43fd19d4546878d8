//! Core Domain Types for beliefflow
//!
//! beliefflow teaches Bayesian reasoning with colored tokens. Tokens are
//! drawn from named **slots**; each **hypothesis** is one candidate world
//! assigning a concrete color **distribution** to every slot. A belief
//! tracker keeps an exact posterior over hypotheses while a token-flow
//! simulation moves the tokens around.
//!
//! # Key Concepts
//!
//! - **Color**: an opaque, ordered color name.
//! - **Distribution**: ordered color → weight mapping, normalizable by sum.
//! - **Hypothesis**: immutable slot → distribution assignment, the unit of
//!   inference.
//! - **LifecycleEvent**: what happened to a token (spawned, observed,
//!   shuffled, duplicated, collected), exported to presentation layers.
//!
//! These types carry no inference logic of their own.

#![deny(unsafe_code)]

mod color;
mod distribution;
mod errors;
mod events;
mod hypothesis;
mod ids;

pub use color::*;
pub use distribution::*;
pub use errors::*;
pub use events::*;
pub use hypothesis::*;
pub use ids::*;
