//! E2E: a script's schedule drives the sources of a network.

use beliefflow_hypothesis::{generate, generate_from_script, HypothesisSpec};
use beliefflow_simulation::{NetworkDefinition, Simulation, SimulationConfig, StationId, StationKind};
use beliefflow_types::{Distribution, LifecycleEvent, SlotId};

const SCRIPT: &str = r#"
DIST a { red 9 blue 1 }
DIST b { red 1 blue 9 }
LIST urns [a b]
PERMUTE urns
BUCKET left = urns[0]
BUCKET right = urns[1]
SCHEDULE { left right left }
"#;

fn merge_network() -> NetworkDefinition {
    let source = |slot: &str| StationKind::Source {
        slot: SlotId::new(slot),
        display: Distribution::new().with("red", 1.0).with("blue", 1.0),
        emit_every: None,
        limit: None,
    };
    NetworkDefinition::new("merge")
        .with_station("left", source("left"))
        .with_station("right", source("right"))
        .with_station("join", StationKind::Merger { inputs: 2 })
        .with_station("sink", StationKind::Sink)
        .connect("left", 0, "join", 0)
        .connect("right", 0, "join", 1)
        .connect("join", 0, "sink", 0)
}

#[test]
fn schedule_emits_in_declared_order() {
    let space = generate_from_script(SCRIPT).unwrap();
    assert_eq!(space.len(), 2);

    let mut sim = Simulation::new(merge_network(), &space, SimulationConfig::default()).unwrap();
    sim.queue_schedule(space.schedule().iter().cloned()).unwrap();
    sim.run_until_idle().unwrap();

    assert_eq!(sim.sink_arrivals(&StationId::new("sink")).unwrap().len(), 3);

    let spawned: Vec<SlotId> = sim
        .drain_events()
        .into_iter()
        .filter_map(|e| match e.event {
            LifecycleEvent::Spawned { slot, .. } => Some(slot),
            _ => None,
        })
        .collect();
    assert_eq!(
        spawned,
        vec![SlotId::new("left"), SlotId::new("right"), SlotId::new("left")]
    );

    let total: f64 = sim.posterior().iter().map(|p| p.probability).sum();
    assert!((total - 1.0).abs() < 1e-9);
    assert!(sim.tracker().live_tokens().is_empty());
}

#[test]
fn schedule_rejects_slots_without_a_source() {
    let space = generate_from_script(SCRIPT).unwrap();
    let network = NetworkDefinition::new("left-only")
        .with_station(
            "left",
            StationKind::Source {
                slot: SlotId::new("left"),
                display: Distribution::single("red"),
                emit_every: None,
                limit: None,
            },
        )
        .with_station("sink", StationKind::Sink)
        .connect("left", 0, "sink", 0);

    let mut sim = Simulation::new(network, &space, SimulationConfig::default()).unwrap();
    assert!(sim.queue_schedule([SlotId::new("right")]).is_err());
}

#[test]
fn json_permutation_spec_enumerates_orderings() {
    let json = r#"{
        "mode": "permutation",
        "slots": ["x", "y", "z"],
        "distributions": [
            {"label": "reds", "distribution": {"red": 1}},
            {"label": "blues", "distribution": {"blue": 1}},
            {"label": "mixed", "distribution": {"red": 1, "blue": 1}}
        ]
    }"#;
    let space = generate(&HypothesisSpec::from_json(json).unwrap()).unwrap();

    assert_eq!(space.len(), 6);
    assert!((space.prior() - 1.0 / 6.0).abs() < 1e-12);
    assert_eq!(space.hypotheses()[0].label, "x=reds, y=blues, z=mixed");
}
