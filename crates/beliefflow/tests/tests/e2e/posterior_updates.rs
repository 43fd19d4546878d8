//! E2E: observations move the posterior exactly as Bayes' rule says.

use beliefflow_hypothesis::{generate, generate_from_script, Candidate, HypothesisSpec, SlotCandidates};
use beliefflow_tracker::BeliefTracker;
use beliefflow_types::{Color, Distribution, HypothesisId, SlotId, TokenId};

const URNS: &str = r#"
DIST mostly_red { red 9 blue 1 }
DIST mostly_blue { red 1 blue 9 }
LIST urns [mostly_red mostly_blue]
PERMUTE urns
BUCKET urn = urns[0]
"#;

fn red() -> Color {
    Color::new("red")
}

fn urn_tracker() -> BeliefTracker {
    BeliefTracker::new(&generate_from_script(URNS).unwrap())
}

#[test]
fn observing_red_favors_the_red_urn() {
    let mut tracker = urn_tracker();
    tracker.spawn(TokenId(1), &SlotId::new("urn")).unwrap();
    tracker.observe(TokenId(1), &red()).unwrap();

    let posterior = tracker.posterior();
    assert_eq!(posterior[0].label, "urn=mostly_red");
    assert!((posterior[0].probability - 0.9).abs() < 1e-12);
    assert!((posterior[1].probability - 0.1).abs() < 1e-12);
}

#[test]
fn repeated_observations_compound() {
    let mut tracker = urn_tracker();
    for id in 1..=2 {
        tracker.spawn(TokenId(id), &SlotId::new("urn")).unwrap();
        tracker.observe(TokenId(id), &red()).unwrap();
    }
    // 0.81 / (0.81 + 0.01)
    assert!((tracker.probability(HypothesisId(0)) - 0.81 / 0.82).abs() < 1e-12);
}

#[test]
fn degenerate_spawn_with_matching_observation_changes_nothing() {
    let spec = HypothesisSpec::Independent {
        slots: vec![
            SlotCandidates {
                slot: SlotId::new("fixed"),
                candidates: vec![Candidate::new(Distribution::single("red"))],
            },
            SlotCandidates {
                slot: SlotId::new("unknown"),
                candidates: vec![
                    Candidate::new(Distribution::new().with("red", 9.0).with("blue", 1.0)),
                    Candidate::new(Distribution::new().with("red", 1.0).with("blue", 9.0)),
                ],
            },
        ],
    };
    let mut tracker = BeliefTracker::new(&generate(&spec).unwrap());
    tracker.spawn(TokenId(1), &SlotId::new("fixed")).unwrap();
    let outcome = tracker.observe(TokenId(1), &red()).unwrap();

    assert!((outcome.evidence - 1.0).abs() < 1e-12);
    for p in tracker.posterior() {
        assert!((p.probability - 0.5).abs() < 1e-12);
    }
}

#[test]
fn observing_a_duplicate_equals_observing_the_original() {
    let mut via_copy = urn_tracker();
    via_copy.spawn(TokenId(1), &SlotId::new("urn")).unwrap();
    via_copy.duplicate(TokenId(1), TokenId(2)).unwrap();
    via_copy.observe(TokenId(2), &red()).unwrap();

    let mut direct = urn_tracker();
    direct.spawn(TokenId(1), &SlotId::new("urn")).unwrap();
    direct.observe(TokenId(1), &red()).unwrap();

    for (a, b) in via_copy.posterior().iter().zip(direct.posterior()) {
        assert!((a.probability - b.probability).abs() < 1e-12);
    }

    // The original is now known to be red as well
    let original = via_copy.color_marginal(TokenId(1)).unwrap();
    assert!((original.probability(&red()) - 1.0).abs() < 1e-12);
}

#[test]
fn contradiction_falls_back_to_uniform() {
    let mut tracker = urn_tracker();
    tracker.spawn(TokenId(1), &SlotId::new("urn")).unwrap();
    tracker.observe(TokenId(1), &red()).unwrap();

    let outcome = tracker.observe(TokenId(1), &Color::new("green")).unwrap();
    assert!(outcome.contradiction);
    assert_eq!(outcome.evidence, 0.0);
    assert_eq!(tracker.anomaly_count(), 1);
    assert!((tracker.probability(HypothesisId(0)) - 0.5).abs() < 1e-12);
}

#[test]
fn slot_marginals_follow_the_posterior() {
    let mut tracker = urn_tracker();
    tracker.spawn(TokenId(1), &SlotId::new("urn")).unwrap();
    tracker.observe(TokenId(1), &red()).unwrap();

    let marginals = tracker.posterior_for_slot(&SlotId::new("urn"));
    assert_eq!(marginals.len(), 2);
    assert_eq!(
        marginals[0].distribution,
        Distribution::new().with("red", 9.0).with("blue", 1.0)
    );
    assert!((marginals[0].probability - 0.9).abs() < 1e-12);
    assert!(tracker.posterior_for_slot(&SlotId::new("nowhere")).is_empty());
}
