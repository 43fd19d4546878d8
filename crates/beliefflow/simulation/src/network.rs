//! Network definitions: stations and the connections between them
//!
//! A definition is static. Every output port feeds exactly one input port;
//! released tokens always travel that connection.

use crate::errors::{SimulationError, SimulationResult};
use beliefflow_types::{Color, Distribution, SlotId};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Largest number of shuffler inputs
pub const MAX_SHUFFLER_INPUTS: usize = 3;

/// Station identifier, unique within a network
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StationId(pub String);

impl StationId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl std::fmt::Display for StationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for StationId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Layout position, carried through for presentation layers
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

/// How a shuffler splits its buffer each cycle
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ShufflePattern {
    /// Tokens released per output channel
    pub channels: Vec<usize>,
    /// Tokens kept in the carry-over buffer
    #[serde(default)]
    pub retain: usize,
}

impl ShufflePattern {
    pub fn released(&self) -> usize {
        self.channels.iter().sum()
    }
}

fn one() -> u64 {
    1
}

/// Station behavior and parameters
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StationKind {
    /// Emits tokens drawn from `slot`
    Source {
        slot: SlotId,
        /// Weights for the sampled display color
        display: Distribution,
        /// Emit automatically every N ticks
        #[serde(default, skip_serializing_if = "Option::is_none")]
        emit_every: Option<u64>,
        /// Total emissions allowed
        #[serde(default, skip_serializing_if = "Option::is_none")]
        limit: Option<u64>,
    },

    /// Turns each arrival into `copies` correlated tokens
    Duplicator {
        copies: usize,
        /// Tokens routed to each output channel, in order
        channels: Vec<usize>,
        #[serde(default)]
        transition_ticks: u64,
        #[serde(default = "one")]
        release_delay: u64,
        #[serde(default)]
        shielded: bool,
    },

    /// Mixes a buffer of tokens and releases part of it
    Shuffler {
        inputs: usize,
        min_buffer: usize,
        pattern: ShufflePattern,
        #[serde(default = "one")]
        release_delay: u64,
    },

    /// Routes by color: port 0 on `target`, port 1 otherwise
    Filter {
        target: Color,
        capacity: usize,
        #[serde(default)]
        shielded: bool,
    },

    /// Joins several inputs into one output
    Merger { inputs: usize },

    /// Observes and retires tokens
    Sink,
}

impl StationKind {
    pub fn input_ports(&self) -> usize {
        match self {
            Self::Source { .. } => 0,
            Self::Duplicator { .. } | Self::Filter { .. } | Self::Sink => 1,
            Self::Shuffler { inputs, .. } | Self::Merger { inputs } => *inputs,
        }
    }

    pub fn output_ports(&self) -> usize {
        match self {
            Self::Source { .. } | Self::Merger { .. } => 1,
            Self::Duplicator { channels, .. } => channels.len(),
            Self::Shuffler { pattern, .. } => pattern.channels.len(),
            Self::Filter { .. } => 2,
            Self::Sink => 0,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Source { .. } => "source",
            Self::Duplicator { .. } => "duplicator",
            Self::Shuffler { .. } => "shuffler",
            Self::Filter { .. } => "filter",
            Self::Merger { .. } => "merger",
            Self::Sink => "sink",
        }
    }

    fn validate(&self, id: &StationId) -> SimulationResult<()> {
        let invalid = |message: String| -> SimulationResult<()> {
            Err(SimulationError::Config(format!("{}: {}", id, message)))
        };
        match self {
            Self::Source {
                display,
                emit_every,
                ..
            } => {
                if let Err(e) = display.validate() {
                    return invalid(format!("display distribution: {}", e));
                }
                if *emit_every == Some(0) {
                    return invalid("emit_every must be positive".into());
                }
            }
            Self::Duplicator {
                copies,
                channels,
                release_delay,
                ..
            } => {
                if *copies == 0 {
                    return invalid("copies must be positive".into());
                }
                if channels.is_empty() {
                    return invalid("duplicator needs at least one channel".into());
                }
                let total: usize = channels.iter().sum();
                if total != *copies {
                    return invalid(format!(
                        "channel counts sum to {} but copies is {}",
                        total, copies
                    ));
                }
                if *release_delay == 0 {
                    return invalid("release_delay must be positive".into());
                }
            }
            Self::Shuffler {
                inputs,
                min_buffer,
                pattern,
                release_delay,
            } => {
                if *inputs == 0 || *inputs > MAX_SHUFFLER_INPUTS {
                    return invalid(format!(
                        "shuffler takes 1 to {} inputs, got {}",
                        MAX_SHUFFLER_INPUTS, inputs
                    ));
                }
                if pattern.released() == 0 {
                    return invalid("pattern releases no tokens".into());
                }
                if pattern.released() + pattern.retain != *min_buffer {
                    return invalid(format!(
                        "pattern covers {} tokens but min_buffer is {}",
                        pattern.released() + pattern.retain,
                        min_buffer
                    ));
                }
                if *release_delay == 0 {
                    return invalid("release_delay must be positive".into());
                }
            }
            Self::Filter { capacity, .. } => {
                if *capacity == 0 {
                    return invalid("capacity must be positive".into());
                }
            }
            Self::Merger { inputs } => {
                if *inputs == 0 {
                    return invalid("merger needs at least one input".into());
                }
            }
            Self::Sink => {}
        }
        Ok(())
    }
}

/// A station placed in a network
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StationDefinition {
    pub id: StationId,
    #[serde(default)]
    pub position: Position,
    pub kind: StationKind,
}

/// Directed link from an output port to an input port
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Connection {
    pub from: StationId,
    #[serde(default)]
    pub from_port: usize,
    pub to: StationId,
    #[serde(default)]
    pub to_port: usize,
}

/// A complete token-flow network
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NetworkDefinition {
    pub name: String,
    pub stations: Vec<StationDefinition>,
    #[serde(default)]
    pub connections: Vec<Connection>,
}

impl NetworkDefinition {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            stations: Vec::new(),
            connections: Vec::new(),
        }
    }

    /// Parse a JSON network (not yet validated)
    pub fn from_json(json: &str) -> SimulationResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn with_station(self, id: impl Into<StationId>, kind: StationKind) -> Self {
        self.with_station_at(id, Position::default(), kind)
    }

    pub fn with_station_at(
        mut self,
        id: impl Into<StationId>,
        position: Position,
        kind: StationKind,
    ) -> Self {
        self.stations.push(StationDefinition {
            id: id.into(),
            position,
            kind,
        });
        self
    }

    pub fn connect(
        mut self,
        from: impl Into<StationId>,
        from_port: usize,
        to: impl Into<StationId>,
        to_port: usize,
    ) -> Self {
        self.connections.push(Connection {
            from: from.into(),
            from_port,
            to: to.into(),
            to_port,
        });
        self
    }

    pub fn station(&self, id: &StationId) -> Option<&StationDefinition> {
        self.stations.iter().find(|s| s.id == *id)
    }

    /// Definition-order index of a station
    pub fn station_index(&self, id: &StationId) -> Option<usize> {
        self.stations.iter().position(|s| s.id == *id)
    }

    /// Slots of every source station, in definition order
    pub fn source_slots(&self) -> Vec<SlotId> {
        let mut slots = Vec::new();
        for station in &self.stations {
            if let StationKind::Source { slot, .. } = &station.kind {
                if !slots.contains(slot) {
                    slots.push(slot.clone());
                }
            }
        }
        slots
    }

    /// Validate the network structure
    pub fn validate(&self) -> SimulationResult<()> {
        if self.stations.is_empty() {
            return Err(SimulationError::Config(
                "network must have at least one station".into(),
            ));
        }

        // Station ids are unique
        let mut seen = HashSet::new();
        for station in &self.stations {
            if !seen.insert(&station.id) {
                return Err(SimulationError::Config(format!(
                    "duplicate station id '{}'",
                    station.id
                )));
            }
            station.kind.validate(&station.id)?;
        }

        // Connections reference existing stations and ports
        let mut fan_out: HashMap<(&StationId, usize), usize> = HashMap::new();
        for conn in &self.connections {
            let from = self
                .station(&conn.from)
                .ok_or_else(|| SimulationError::StationNotFound(conn.from.clone()))?;
            let to = self
                .station(&conn.to)
                .ok_or_else(|| SimulationError::StationNotFound(conn.to.clone()))?;
            if conn.from_port >= from.kind.output_ports() {
                return Err(SimulationError::Config(format!(
                    "{} has no output port {}",
                    conn.from, conn.from_port
                )));
            }
            if conn.to_port >= to.kind.input_ports() {
                return Err(SimulationError::Config(format!(
                    "{} has no input port {}",
                    conn.to, conn.to_port
                )));
            }
            *fan_out.entry((&conn.from, conn.from_port)).or_insert(0) += 1;
        }

        // Every output port has exactly one connection
        for station in &self.stations {
            for port in 0..station.kind.output_ports() {
                match fan_out.get(&(&station.id, port)).copied().unwrap_or(0) {
                    1 => {}
                    0 => {
                        return Err(SimulationError::Config(format!(
                            "{} output port {} is not connected",
                            station.id, port
                        )))
                    }
                    n => {
                        return Err(SimulationError::Config(format!(
                            "{} output port {} has {} connections",
                            station.id, port, n
                        )))
                    }
                }
            }
        }

        Ok(())
    }
}
