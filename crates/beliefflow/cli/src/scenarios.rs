//! Built-in scenarios

use beliefflow_hypothesis::{generate_from_script, GeneratorResult, HypothesisSpace};
use beliefflow_simulation::{NetworkDefinition, Position, ShufflePattern, StationKind};
use beliefflow_types::{Distribution, SlotId};

/// Two urns, one mostly red and one mostly blue; which is which is unknown
pub const DEMO_SCRIPT: &str = r#"
# Which urn feeds which source?
DIST mostly_red { red 9 blue 1 }
DIST mostly_blue { red 1 blue 9 }
LIST urns [mostly_red mostly_blue]
PERMUTE urns
BUCKET left = urns[0]
BUCKET right = urns[1]
"#;

pub fn demo_space() -> GeneratorResult<HypothesisSpace> {
    generate_from_script(DEMO_SCRIPT)
}

/// Shuffler with retention: buffer of four, two released, two carried over
pub fn demo_network() -> NetworkDefinition {
    let source = |slot: &str, red: f64, blue: f64| StationKind::Source {
        slot: SlotId::new(slot),
        display: Distribution::new().with("red", red).with("blue", blue),
        emit_every: Some(2),
        limit: Some(4),
    };

    NetworkDefinition::new("shuffler-with-retention")
        .with_station_at("left", Position { x: 0.0, y: 0.0 }, source("left", 9.0, 1.0))
        .with_station_at("right", Position { x: 0.0, y: 2.0 }, source("right", 1.0, 9.0))
        .with_station_at(
            "mixer",
            Position { x: 2.0, y: 1.0 },
            StationKind::Shuffler {
                inputs: 2,
                min_buffer: 4,
                pattern: ShufflePattern {
                    channels: vec![1, 1],
                    retain: 2,
                },
                release_delay: 1,
            },
        )
        .with_station_at("top", Position { x: 4.0, y: 0.0 }, StationKind::Sink)
        .with_station_at("bottom", Position { x: 4.0, y: 2.0 }, StationKind::Sink)
        .connect("left", 0, "mixer", 0)
        .connect("right", 0, "mixer", 1)
        .connect("mixer", 0, "top", 0)
        .connect("mixer", 1, "bottom", 0)
}
