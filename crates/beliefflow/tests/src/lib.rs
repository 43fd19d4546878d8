//! Cross-crate scenario and property tests for beliefflow.
//!
//! Everything lives under `tests/`:
//! - `e2e_tests.rs`: generator, tracker and simulation end to end
//! - `property_tests.rs`: closed-form counts and probability conservation
