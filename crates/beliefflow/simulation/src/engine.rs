//! Simulation engine: the tick loop
//!
//! Each `tick`:
//! 1. Advances the clock
//! 2. Delivers due in-flight tokens, sorted by (station order, input port,
//!    token id)
//! 3. Feeds one scheduled emission to its source
//! 4. Runs every station's on-tick in definition order
//!
//! Tracker events are drained after every station callback and stamped
//! with the tick and station.

use crate::config::SimulationConfig;
use crate::errors::{SimulationError, SimulationResult};
use crate::network::{NetworkDefinition, StationId, StationKind};
use crate::station::{Arrival, SinkArrival, StationContext, StationState, TokenRecord};
use beliefflow_hypothesis::HypothesisSpace;
use beliefflow_tracker::BeliefTracker;
use beliefflow_types::{HypothesisPosterior, LifecycleEvent, SlotId, SlotMarginal, TokenId};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};

/// A lifecycle event stamped with when and where it happened
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TimedEvent {
    pub tick: u64,
    /// `None` for engine-level events such as a reset
    pub station: Option<StationId>,
    pub event: LifecycleEvent,
}

/// A token travelling along a connection
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct InFlight {
    token: TokenId,
    station: usize,
    port: usize,
    arrives_at: u64,
}

/// A running token-flow simulation
pub struct Simulation {
    network: NetworkDefinition,
    config: SimulationConfig,
    tracker: BeliefTracker,
    stations: Vec<StationState>,
    /// (station, output port) → (station, input port)
    routes: HashMap<(usize, usize), (usize, usize)>,
    in_flight: Vec<InFlight>,
    /// Every token emitted since the last reset, collected ones included
    tokens: HashMap<TokenId, TokenRecord>,
    schedule: VecDeque<SlotId>,
    clock: u64,
    next_token: u64,
    rng: StdRng,
    events: Vec<TimedEvent>,
}

impl Simulation {
    /// Validate `network` against `space` and build a fresh simulation
    pub fn new(
        network: NetworkDefinition,
        space: &HypothesisSpace,
        config: SimulationConfig,
    ) -> SimulationResult<Self> {
        network.validate()?;
        space
            .require_slots(&network.source_slots())
            .map_err(|e| SimulationError::Config(e.to_string()))?;

        let mut routes = HashMap::new();
        for conn in &network.connections {
            let from = network
                .station_index(&conn.from)
                .ok_or_else(|| SimulationError::StationNotFound(conn.from.clone()))?;
            let to = network
                .station_index(&conn.to)
                .ok_or_else(|| SimulationError::StationNotFound(conn.to.clone()))?;
            routes.insert((from, conn.from_port), (to, conn.to_port));
        }

        let stations = network
            .stations
            .iter()
            .map(|s| StationState::new(&s.kind))
            .collect();

        tracing::info!(
            network = %network.name,
            stations = network.stations.len(),
            hypotheses = space.len(),
            seed = config.seed,
            "Simulation created"
        );

        Ok(Self {
            tracker: BeliefTracker::with_config(space, config.tracker.clone()),
            rng: StdRng::seed_from_u64(config.seed),
            network,
            config,
            stations,
            routes,
            in_flight: Vec::new(),
            tokens: HashMap::new(),
            schedule: VecDeque::new(),
            clock: 0,
            next_token: 0,
            events: Vec::new(),
        })
    }

    pub fn network(&self) -> &NetworkDefinition {
        &self.network
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn tracker(&self) -> &BeliefTracker {
        &self.tracker
    }

    pub fn clock(&self) -> u64 {
        self.clock
    }

    // ── Control ──────────────────────────────────────────────────────

    /// Ask a source to emit one token on its next tick
    pub fn trigger_source(&mut self, station: &StationId) -> SimulationResult<()> {
        let index = self.station_index(station)?;
        match &mut self.stations[index] {
            StationState::Source(s) => {
                s.pending += 1;
                Ok(())
            }
            _ => Err(SimulationError::NotASource(station.clone())),
        }
    }

    /// Queue emissions by slot, one per tick, in order
    pub fn queue_schedule<I>(&mut self, slots: I) -> SimulationResult<()>
    where
        I: IntoIterator<Item = SlotId>,
    {
        let slots: Vec<SlotId> = slots.into_iter().collect();
        if let Some(missing) = slots.iter().find(|s| self.source_for(s).is_none()) {
            return Err(SimulationError::UnknownSlot(missing.clone()));
        }
        self.schedule.extend(slots);
        Ok(())
    }

    /// Advance one tick
    pub fn tick(&mut self) -> SimulationResult<()> {
        self.clock += 1;
        let now = self.clock;

        // Deliveries
        let (mut due, mut waiting): (Vec<InFlight>, Vec<InFlight>) = self
            .in_flight
            .drain(..)
            .partition(|f| f.arrives_at <= now);
        due.sort_by_key(|f| (f.station, f.port, f.token));

        let mut due = due.into_iter();
        while let Some(flight) = due.next() {
            let kind = &self.network.stations[flight.station].kind;
            let mut ctx = StationContext {
                tick: now,
                tracker: &mut self.tracker,
                rng: &mut self.rng,
                tokens: &mut self.tokens,
                next_token: &mut self.next_token,
            };
            let delivered =
                self.stations[flight.station].on_arrival(kind, &mut ctx, flight.token, flight.port);
            let arrival = match delivered {
                Ok(arrival) => arrival,
                Err(e) => {
                    // Undelivered tokens stay in transit
                    waiting.push(flight);
                    waiting.extend(due);
                    self.in_flight = waiting;
                    self.stamp_events(Some(flight.station));
                    return Err(e);
                }
            };
            if arrival == Arrival::Deferred {
                waiting.push(InFlight {
                    arrives_at: now + 1,
                    ..flight
                });
            }
            self.stamp_events(Some(flight.station));
        }
        self.in_flight = waiting;

        // Schedule
        if let Some(slot) = self.schedule.pop_front() {
            if let Some(index) = self.source_for(&slot) {
                if let StationState::Source(s) = &mut self.stations[index] {
                    s.pending += 1;
                }
            }
        }

        // Station ticks
        for index in 0..self.stations.len() {
            let kind = &self.network.stations[index].kind;
            let mut ctx = StationContext {
                tick: now,
                tracker: &mut self.tracker,
                rng: &mut self.rng,
                tokens: &mut self.tokens,
                next_token: &mut self.next_token,
            };
            let releases = self.stations[index].on_tick(kind, &mut ctx)?;
            for release in releases {
                let (station, port) = self
                    .routes
                    .get(&(index, release.port))
                    .copied()
                    .ok_or_else(|| {
                        SimulationError::Config(format!(
                            "{} output port {} is not connected",
                            self.network.stations[index].id, release.port
                        ))
                    })?;
                self.in_flight.push(InFlight {
                    token: release.token,
                    station,
                    port,
                    arrives_at: now + self.config.travel_ticks,
                });
            }
            self.stamp_events(Some(index));
        }

        Ok(())
    }

    /// Advance `ticks` ticks
    pub fn run(&mut self, ticks: u64) -> SimulationResult<()> {
        for _ in 0..ticks {
            self.tick()?;
        }
        Ok(())
    }

    /// Tick until nothing is queued or travelling; returns ticks taken
    pub fn run_until_idle(&mut self) -> SimulationResult<u64> {
        let start = self.clock;
        while !self.is_idle() {
            if self.clock - start >= self.config.max_ticks {
                tracing::warn!(limit = self.config.max_ticks, "Simulation did not settle");
                return Err(SimulationError::TickLimit {
                    limit: self.config.max_ticks,
                });
            }
            self.tick()?;
        }
        Ok(self.clock - start)
    }

    /// No token in transit, no scheduled emission, no station with work
    pub fn is_idle(&self) -> bool {
        self.in_flight.is_empty()
            && self.schedule.is_empty()
            && self
                .stations
                .iter()
                .zip(&self.network.stations)
                .all(|(state, def)| state.is_idle(&def.kind))
    }

    /// Discard all tokens and station state, clock to zero, RNG reseeded
    pub fn reset(&mut self) {
        self.tracker.reset();
        self.stations = self
            .network
            .stations
            .iter()
            .map(|s| StationState::new(&s.kind))
            .collect();
        self.in_flight.clear();
        self.tokens.clear();
        self.schedule.clear();
        self.clock = 0;
        self.next_token = 0;
        self.rng = StdRng::seed_from_u64(self.config.seed);
        self.events.clear();
        self.stamp_events(None);
        tracing::info!(network = %self.network.name, "Simulation reset");
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn posterior(&self) -> Vec<HypothesisPosterior> {
        self.tracker.posterior()
    }

    pub fn slot_posterior(&self, slot: &SlotId) -> Vec<SlotMarginal> {
        self.tracker.posterior_for_slot(slot)
    }

    /// Take the stamped event log, leaving it empty
    pub fn drain_events(&mut self) -> Vec<TimedEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn sink_arrivals(&self, station: &StationId) -> SimulationResult<&[SinkArrival]> {
        let index = self.station_index(station)?;
        Ok(self.stations[index].sink_arrivals().unwrap_or(&[]))
    }

    /// Tokens held by a station; a shuffler reports its carry-over buffer
    pub fn station_buffer(&self, station: &StationId) -> SimulationResult<Vec<TokenId>> {
        let index = self.station_index(station)?;
        Ok(self.stations[index].buffer())
    }

    /// Record of any token emitted since the last reset.
    ///
    /// Collected tokens stay in the history with `collected_at` set; only
    /// `reset` clears it.
    pub fn token(&self, id: TokenId) -> Option<&TokenRecord> {
        self.tokens.get(&id)
    }

    /// Tokens currently on a connection
    pub fn in_flight(&self) -> Vec<TokenId> {
        self.in_flight.iter().map(|f| f.token).collect()
    }

    // ── Internals ────────────────────────────────────────────────────

    fn station_index(&self, station: &StationId) -> SimulationResult<usize> {
        self.network
            .station_index(station)
            .ok_or_else(|| SimulationError::StationNotFound(station.clone()))
    }

    fn source_for(&self, slot: &SlotId) -> Option<usize> {
        self.network.stations.iter().position(
            |s| matches!(&s.kind, StationKind::Source { slot: source_slot, .. } if source_slot == slot),
        )
    }

    fn stamp_events(&mut self, station: Option<usize>) {
        let tick = self.clock;
        let station = station.map(|i| self.network.stations[i].id.clone());
        for event in self.tracker.drain_events() {
            self.events.push(TimedEvent {
                tick,
                station: station.clone(),
                event,
            });
        }
    }
}
