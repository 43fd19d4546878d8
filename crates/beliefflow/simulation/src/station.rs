//! Runtime station state and per-variant behavior
//!
//! Each variant reacts to arrivals and to the tick. Tracker lifecycle calls
//! happen here, once per logical event; the engine drains the resulting
//! tracker events after every callback.

use crate::errors::{SimulationError, SimulationResult};
use crate::network::{ShufflePattern, StationKind};
use beliefflow_tracker::BeliefTracker;
use beliefflow_types::{Color, SlotId, TokenId};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};

/// Simulation-side facts about a token
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TokenRecord {
    pub id: TokenId,
    pub slot: SlotId,
    /// Sampled color shown to the player; reaches the tracker only on observe
    pub display: Color,
    pub spawned_at: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collected_at: Option<u64>,
}

/// One token retired by a sink
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SinkArrival {
    /// Monotonic per sink
    pub index: u64,
    pub token: TokenId,
    pub color: Color,
    pub tick: u64,
}

/// A token leaving a station on an output port
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Release {
    pub port: usize,
    pub token: TokenId,
}

/// Whether a station took an arriving token
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Arrival {
    Accepted,
    /// Station full; the token stays in transit and retries next tick
    Deferred,
}

/// Shared mutable state handed to station callbacks
pub struct StationContext<'a> {
    pub tick: u64,
    pub tracker: &'a mut BeliefTracker,
    pub rng: &'a mut StdRng,
    pub tokens: &'a mut HashMap<TokenId, TokenRecord>,
    pub next_token: &'a mut u64,
}

impl StationContext<'_> {
    fn fresh_token(&mut self) -> TokenId {
        let id = TokenId(*self.next_token);
        *self.next_token += 1;
        id
    }

    fn display(&self, token: TokenId) -> SimulationResult<Color> {
        self.tokens
            .get(&token)
            .map(|r| r.display.clone())
            .ok_or(SimulationError::TokenNotFound(token))
    }

    /// Reveal the token's display color to the tracker
    fn observe(&mut self, token: TokenId) -> SimulationResult<()> {
        let color = self.display(token)?;
        self.tracker.observe(token, &color)?;
        Ok(())
    }
}

/// A release queue paced by `release_delay`
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ReleaseChannel {
    queue: VecDeque<TokenId>,
    next_release: u64,
}

impl ReleaseChannel {
    fn release(&mut self, tick: u64, delay: u64) -> Option<TokenId> {
        if tick < self.next_release {
            return None;
        }
        let token = self.queue.pop_front()?;
        self.next_release = tick + delay;
        Some(token)
    }

    pub fn queued(&self) -> &VecDeque<TokenId> {
        &self.queue
    }
}

fn release_all(channels: &mut [ReleaseChannel], tick: u64, delay: u64) -> Vec<Release> {
    channels
        .iter_mut()
        .enumerate()
        .filter_map(|(port, ch)| ch.release(tick, delay).map(|token| Release { port, token }))
        .collect()
}

/// Distribute `tokens` over channels by fixed counts, in order
fn fill_channels(channels: &mut [ReleaseChannel], counts: &[usize], tokens: Vec<TokenId>) {
    let mut tokens = tokens.into_iter();
    for (channel, &count) in channels.iter_mut().zip(counts) {
        channel.queue.extend(tokens.by_ref().take(count));
    }
}

// ── Station State ────────────────────────────────────────────────────

#[derive(Clone, Debug, Default, PartialEq)]
pub struct SourceState {
    pub pending: usize,
    pub emitted: u64,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct DuplicatorState {
    /// Arrivals waiting out `transition_ticks`, with their ready tick
    pub transitioning: VecDeque<(TokenId, u64)>,
    pub channels: Vec<ReleaseChannel>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ShufflerState {
    /// Arrivals plus tokens retained from earlier cycles
    pub carry_over: Vec<TokenId>,
    pub channels: Vec<ReleaseChannel>,
    pub cycles: u64,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct QueueState {
    pub queue: VecDeque<TokenId>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct SinkState {
    pub arrivals: Vec<SinkArrival>,
}

/// Mutable runtime state of one station
#[derive(Clone, Debug, PartialEq)]
pub enum StationState {
    Source(SourceState),
    Duplicator(DuplicatorState),
    Shuffler(ShufflerState),
    Filter(QueueState),
    Merger(QueueState),
    Sink(SinkState),
}

impl StationState {
    /// Fresh state for a station kind
    pub fn new(kind: &StationKind) -> Self {
        let channels = |n: usize| vec![ReleaseChannel::default(); n];
        match kind {
            StationKind::Source { .. } => Self::Source(SourceState::default()),
            StationKind::Duplicator { channels: c, .. } => Self::Duplicator(DuplicatorState {
                transitioning: VecDeque::new(),
                channels: channels(c.len()),
            }),
            StationKind::Shuffler { pattern, .. } => Self::Shuffler(ShufflerState {
                carry_over: Vec::new(),
                channels: channels(pattern.channels.len()),
                cycles: 0,
            }),
            StationKind::Filter { .. } => Self::Filter(QueueState::default()),
            StationKind::Merger { .. } => Self::Merger(QueueState::default()),
            StationKind::Sink => Self::Sink(SinkState::default()),
        }
    }

    /// Tokens currently held; a shuffler reports its carry-over buffer
    pub fn buffer(&self) -> Vec<TokenId> {
        match self {
            Self::Source(_) => Vec::new(),
            Self::Duplicator(s) => s
                .transitioning
                .iter()
                .map(|(t, _)| *t)
                .chain(s.channels.iter().flat_map(|c| c.queue.iter().copied()))
                .collect(),
            Self::Shuffler(s) => s.carry_over.clone(),
            Self::Filter(s) | Self::Merger(s) => s.queue.iter().copied().collect(),
            Self::Sink(_) => Vec::new(),
        }
    }

    /// No queued work remains
    pub fn is_idle(&self, kind: &StationKind) -> bool {
        match (self, kind) {
            (Self::Source(s), StationKind::Source {
                emit_every, limit, ..
            }) => {
                let exhausted = limit.is_some_and(|l| s.emitted >= l);
                (s.pending == 0 && emit_every.is_none()) || exhausted
            }
            (Self::Duplicator(s), _) => {
                s.transitioning.is_empty() && s.channels.iter().all(|c| c.queue.is_empty())
            }
            (Self::Shuffler(s), StationKind::Shuffler { min_buffer, .. }) => {
                s.carry_over.len() < *min_buffer && s.channels.iter().all(|c| c.queue.is_empty())
            }
            (Self::Filter(s), _) | (Self::Merger(s), _) => s.queue.is_empty(),
            _ => true,
        }
    }

    pub fn sink_arrivals(&self) -> Option<&[SinkArrival]> {
        match self {
            Self::Sink(s) => Some(&s.arrivals),
            _ => None,
        }
    }

    // ── Callbacks ────────────────────────────────────────────────────

    /// A token reached input `port`
    pub fn on_arrival(
        &mut self,
        kind: &StationKind,
        ctx: &mut StationContext<'_>,
        token: TokenId,
        _port: usize,
    ) -> SimulationResult<Arrival> {
        match (self, kind) {
            (
                Self::Duplicator(s),
                StationKind::Duplicator {
                    transition_ticks,
                    shielded,
                    ..
                },
            ) => {
                if !*shielded {
                    ctx.observe(token)?;
                }
                s.transitioning.push_back((token, ctx.tick + transition_ticks));
            }
            (Self::Shuffler(s), StationKind::Shuffler { .. }) => {
                s.carry_over.push(token);
            }
            (Self::Filter(s), StationKind::Filter {
                capacity, shielded, ..
            }) => {
                if s.queue.len() >= *capacity {
                    return Ok(Arrival::Deferred);
                }
                if !*shielded {
                    ctx.observe(token)?;
                }
                s.queue.push_back(token);
            }
            (Self::Merger(s), StationKind::Merger { .. }) => {
                s.queue.push_back(token);
            }
            (Self::Sink(s), StationKind::Sink) => {
                let color = ctx.display(token)?;
                ctx.tracker.observe(token, &color)?;
                ctx.tracker.collect(token)?;
                if let Some(record) = ctx.tokens.get_mut(&token) {
                    record.collected_at = Some(ctx.tick);
                }
                let index = s.arrivals.len() as u64;
                s.arrivals.push(SinkArrival {
                    index,
                    token,
                    color,
                    tick: ctx.tick,
                });
            }
            (_, kind) => {
                return Err(SimulationError::Config(format!(
                    "{} station cannot accept tokens",
                    kind.name()
                )))
            }
        }
        Ok(Arrival::Accepted)
    }

    /// Advance one tick; returns tokens leaving the station
    pub fn on_tick(
        &mut self,
        kind: &StationKind,
        ctx: &mut StationContext<'_>,
    ) -> SimulationResult<Vec<Release>> {
        match (self, kind) {
            (
                Self::Source(s),
                StationKind::Source {
                    slot,
                    display,
                    emit_every,
                    limit,
                },
            ) => {
                if emit_every.is_some_and(|every| ctx.tick % every == 0) {
                    s.pending += 1;
                }
                if s.pending == 0 {
                    return Ok(Vec::new());
                }
                s.pending -= 1;
                if limit.is_some_and(|l| s.emitted >= l) {
                    s.pending = 0;
                    return Ok(Vec::new());
                }

                let token = ctx.fresh_token();
                let color = display.sample(&mut *ctx.rng)?.clone();
                ctx.tracker.spawn(token, slot)?;
                ctx.tokens.insert(
                    token,
                    TokenRecord {
                        id: token,
                        slot: slot.clone(),
                        display: color,
                        spawned_at: ctx.tick,
                        collected_at: None,
                    },
                );
                s.emitted += 1;
                Ok(vec![Release { port: 0, token }])
            }
            (
                Self::Duplicator(s),
                StationKind::Duplicator {
                    copies,
                    channels,
                    release_delay,
                    ..
                },
            ) => {
                while let Some(&(original, ready_at)) = s.transitioning.front() {
                    if ready_at > ctx.tick {
                        break;
                    }
                    s.transitioning.pop_front();

                    let mut batch = Vec::with_capacity(*copies);
                    batch.push(original);
                    for _ in 1..*copies {
                        let copy = ctx.fresh_token();
                        ctx.tracker.duplicate(original, copy)?;
                        if let Some(record) = ctx.tokens.get(&original).cloned() {
                            ctx.tokens.insert(
                                copy,
                                TokenRecord {
                                    id: copy,
                                    spawned_at: ctx.tick,
                                    ..record
                                },
                            );
                        }
                        batch.push(copy);
                    }
                    fill_channels(&mut s.channels, channels, batch);
                }
                Ok(release_all(&mut s.channels, ctx.tick, *release_delay))
            }
            (
                Self::Shuffler(s),
                StationKind::Shuffler {
                    min_buffer,
                    pattern,
                    release_delay,
                    ..
                },
            ) => {
                if s.carry_over.len() >= *min_buffer {
                    shuffle_cycle(s, *min_buffer, pattern, ctx)?;
                }
                Ok(release_all(&mut s.channels, ctx.tick, *release_delay))
            }
            (Self::Filter(s), StationKind::Filter { target, .. }) => {
                let Some(token) = s.queue.pop_front() else {
                    return Ok(Vec::new());
                };
                let port = if ctx.display(token)? == *target { 0 } else { 1 };
                Ok(vec![Release { port, token }])
            }
            (Self::Merger(s), StationKind::Merger { .. }) => Ok(s
                .queue
                .pop_front()
                .map(|token| vec![Release { port: 0, token }])
                .unwrap_or_default()),
            (Self::Sink(_), StationKind::Sink) => Ok(Vec::new()),
            (_, kind) => Err(SimulationError::Config(format!(
                "state does not match {} station",
                kind.name()
            ))),
        }
    }
}

/// Mix the whole buffer and split it.
///
/// The carry-over keeps exactly `retain` tokens plus whatever arrived beyond
/// `min_buffer`; everything else goes to the channels by pattern counts.
fn shuffle_cycle(
    s: &mut ShufflerState,
    min_buffer: usize,
    pattern: &ShufflePattern,
    ctx: &mut StationContext<'_>,
) -> SimulationResult<()> {
    ctx.tracker.shuffle_all(&s.carry_over)?;
    s.carry_over.shuffle(&mut *ctx.rng);

    let overflow = s.carry_over.len().saturating_sub(min_buffer);
    let keep = pattern.retain + overflow;
    let release = s.carry_over.len().saturating_sub(keep);
    let released: Vec<TokenId> = s.carry_over.drain(..release).collect();
    fill_channels(&mut s.channels, &pattern.channels, released);
    s.cycles += 1;

    tracing::info!(
        cycle = s.cycles,
        released = release,
        carried = s.carry_over.len(),
        "Shuffler cycle"
    );
    Ok(())
}
