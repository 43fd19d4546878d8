//! Token-Flow Simulation for beliefflow
//!
//! A discrete-event network of typed stations moves tokens and drives the
//! belief tracker: sources spawn, duplicators copy, shufflers mix, filters
//! and sinks observe, sinks collect. The simulation is the tracker's only
//! caller inside the tool.
//!
//! Runs are single-threaded and tick-driven. With a fixed seed, a run is
//! exactly reproducible: arrivals are processed in (station, port, token)
//! order and stations tick in definition order.

#![deny(unsafe_code)]

pub mod config;
pub mod engine;
pub mod errors;
pub mod network;
pub mod station;

pub use config::SimulationConfig;
pub use engine::{Simulation, TimedEvent};
pub use errors::{SimulationError, SimulationResult};
pub use network::{
    Connection, NetworkDefinition, Position, ShufflePattern, StationDefinition, StationId,
    StationKind, MAX_SHUFFLER_INPUTS,
};
pub use station::{SinkArrival, StationState, TokenRecord};
