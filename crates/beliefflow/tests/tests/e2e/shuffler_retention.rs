//! E2E: a shuffler with retention keeps carried tokens correlated with
//! everything they were mixed with.

use beliefflow_hypothesis::generate_from_script;
use beliefflow_simulation::{
    NetworkDefinition, ShufflePattern, Simulation, SimulationConfig, SimulationError, StationId,
    StationKind,
};
use beliefflow_types::{Distribution, HypothesisId, SlotId, TokenId};

const URNS: &str = "DIST mostly_red { red 9 blue 1 }\nDIST mostly_blue { red 1 blue 9 }\n\
                    LIST urns [mostly_red mostly_blue]\nPERMUTE urns\nBUCKET urn = urns[0]";

// src emits one red-looking token per tick; the mixer shuffles four,
// releases two and carries two into the next cycle
fn retention_network() -> NetworkDefinition {
    mixer_network(vec![2], 2, 6)
}

fn mixer_network(channels: Vec<usize>, retain: usize, limit: u64) -> NetworkDefinition {
    NetworkDefinition::new("retention")
        .with_station(
            "src",
            StationKind::Source {
                slot: SlotId::new("urn"),
                display: Distribution::single("red"),
                emit_every: Some(1),
                limit: Some(limit),
            },
        )
        .with_station(
            "mixer",
            StationKind::Shuffler {
                inputs: 1,
                min_buffer: 4,
                pattern: ShufflePattern { channels, retain },
                release_delay: 1,
            },
        )
        .with_station("sink", StationKind::Sink)
        .connect("src", 0, "mixer", 0)
        .connect("mixer", 0, "sink", 0)
}

fn simulation() -> Simulation {
    let space = generate_from_script(URNS).unwrap();
    Simulation::new(retention_network(), &space, SimulationConfig::default()).unwrap()
}

#[test]
fn first_cycle_mixes_and_carries_two() {
    let mut sim = simulation();
    sim.run(5).unwrap();

    let retained = sim.station_buffer(&StationId::new("mixer")).unwrap();
    assert_eq!(retained.len(), 2);

    let tracker = sim.tracker();
    assert_eq!(tracker.group_of(retained[0]), tracker.group_of(retained[1]));
    assert_eq!(tracker.group_members(retained[0]).unwrap().len(), 4);

    // Nothing observed yet
    assert!((sim.tracker().probability(HypothesisId(0)) - 0.5).abs() < 1e-12);
}

#[test]
fn first_release_updates_the_posterior() {
    let mut sim = simulation();
    sim.run(6).unwrap();

    assert_eq!(sim.sink_arrivals(&StationId::new("sink")).unwrap().len(), 1);
    assert!((sim.tracker().probability(HypothesisId(0)) - 0.9).abs() < 1e-12);
}

#[test]
fn second_cycle_joins_the_carried_tokens() {
    let mut sim = simulation();
    sim.run(5).unwrap();
    let retained = sim.station_buffer(&StationId::new("mixer")).unwrap();
    sim.run(2).unwrap();

    let members = sim.tracker().group_members(TokenId(4)).unwrap();
    assert!(members.contains(&TokenId(5)));
    for token in &retained {
        assert!(members.contains(token));
    }
    assert_eq!(sim.station_buffer(&StationId::new("mixer")).unwrap().len(), 2);
}

#[test]
fn runs_to_idle_with_two_left_behind() {
    let mut sim = simulation();
    sim.run_until_idle().unwrap();

    // Six emitted, two per cycle released, two stranded below min_buffer
    assert_eq!(sim.sink_arrivals(&StationId::new("sink")).unwrap().len(), 4);
    assert_eq!(sim.station_buffer(&StationId::new("mixer")).unwrap().len(), 2);
    assert_eq!(sim.tracker().live_tokens().len(), 2);

    // Every observation was red: 0.9^4 against 0.1^4
    let expected = 0.9f64.powi(4) / (0.9f64.powi(4) + 0.1f64.powi(4));
    assert!((sim.tracker().probability(HypothesisId(0)) - expected).abs() < 1e-9);
}

#[test]
fn zero_retention_releases_the_whole_buffer() {
    let space = generate_from_script(URNS).unwrap();
    let mut sim =
        Simulation::new(mixer_network(vec![4], 0, 4), &space, SimulationConfig::default()).unwrap();
    sim.run_until_idle().unwrap();

    assert_eq!(sim.sink_arrivals(&StationId::new("sink")).unwrap().len(), 4);
    assert!(sim.station_buffer(&StationId::new("mixer")).unwrap().is_empty());
    assert!(sim.tracker().live_tokens().is_empty());
}

#[test]
fn pattern_short_of_min_buffer_is_rejected() {
    let space = generate_from_script(URNS).unwrap();
    let result = Simulation::new(mixer_network(vec![2], 0, 6), &space, SimulationConfig::default());
    assert!(matches!(result, Err(SimulationError::Config(_))));
}
