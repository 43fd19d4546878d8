//! Hypothesis-Space Generator
//!
//! Turns a declarative [`HypothesisSpec`] or a script in the hypothesis DSL
//! into an exhaustive, uniformly weighted [`HypothesisSpace`].
//!
//! # Modes
//!
//! - `independent`: Cartesian product of per-slot candidates
//! - `permutation`: orderings of a distribution list across slots, or a
//!   listed set passed through
//! - `oddOneOut`: one slot differs from a shared uniform
//! - `scripted`: `DIST` / `LIST` / `PERMUTE` / `BUCKET` / `SCHEDULE` source
//!
//! # Example
//!
//! ```
//! use beliefflow_hypothesis::generate_from_script;
//!
//! let space = generate_from_script(
//!     "DIST a { red 9 blue 1 }\n\
//!      DIST b { red 1 blue 9 }\n\
//!      LIST urns [a b]\n\
//!      PERMUTE urns\n\
//!      BUCKET left = urns[0]",
//! )
//! .unwrap();
//! assert_eq!(space.len(), 2);
//! ```

#![deny(unsafe_code)]

pub mod combinatorics;
pub mod errors;
pub mod generator;
pub mod script;
pub mod spec;

pub use errors::{DslError, DslResult, GeneratorError, GeneratorResult};
pub use generator::{
    generate, generate_from_script, GeneratorLimits, HypothesisGenerator, HypothesisSpace,
    RawHypothesis,
};
pub use script::{ScriptBuilder, Selection};
pub use spec::{Candidate, HypothesisSpec, ListedHypothesis, SlotCandidates};
