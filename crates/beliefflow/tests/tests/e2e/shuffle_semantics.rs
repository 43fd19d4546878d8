//! E2E: shuffles merge groups and mix coordinates without touching the posterior.

use beliefflow_hypothesis::{generate, generate_from_script, Candidate, HypothesisSpec, SlotCandidates};
use beliefflow_tracker::BeliefTracker;
use beliefflow_types::{Color, Distribution, HypothesisId, LifecycleEvent, SlotId, TokenId};

fn c(name: &str) -> Color {
    Color::new(name)
}

/// One world: slot `r` always red, slot `b` always blue
fn fixed_tracker() -> BeliefTracker {
    let fixed = |slot: &str, color: &str| SlotCandidates {
        slot: SlotId::new(slot),
        candidates: vec![Candidate::new(Distribution::single(color))],
    };
    let spec = HypothesisSpec::Independent {
        slots: vec![fixed("r", "red"), fixed("b", "blue")],
    };
    BeliefTracker::new(&generate(&spec).unwrap())
}

#[test]
fn two_shuffles_of_the_same_pair_stay_mixed() {
    let mut tracker = fixed_tracker();
    tracker.spawn(TokenId(1), &SlotId::new("r")).unwrap();
    tracker.spawn(TokenId(2), &SlotId::new("b")).unwrap();

    tracker.shuffle(TokenId(1), TokenId(2)).unwrap();
    tracker.shuffle(TokenId(1), TokenId(2)).unwrap();

    let joint = tracker.joint(TokenId(1), HypothesisId(0)).unwrap();
    assert_eq!(joint.len(), 2);
    assert!((joint.get(&[c("red"), c("blue")]) - 0.5).abs() < 1e-12);
    assert!((joint.get(&[c("blue"), c("red")]) - 0.5).abs() < 1e-12);
}

#[test]
fn observing_one_shuffled_token_pins_its_partner() {
    let mut tracker = fixed_tracker();
    tracker.spawn(TokenId(1), &SlotId::new("r")).unwrap();
    tracker.spawn(TokenId(2), &SlotId::new("b")).unwrap();
    tracker.shuffle(TokenId(1), TokenId(2)).unwrap();

    let before = tracker.color_marginal(TokenId(2)).unwrap();
    assert!((before.probability(&c("red")) - 0.5).abs() < 1e-12);

    tracker.observe(TokenId(1), &c("red")).unwrap();
    let after = tracker.color_marginal(TokenId(2)).unwrap();
    assert!((after.probability(&c("blue")) - 1.0).abs() < 1e-12);
}

#[test]
fn full_mix_spreads_over_distinct_arrangements() {
    let mut tracker = fixed_tracker();
    tracker.spawn(TokenId(1), &SlotId::new("r")).unwrap();
    tracker.spawn(TokenId(2), &SlotId::new("r")).unwrap();
    tracker.spawn(TokenId(3), &SlotId::new("b")).unwrap();
    tracker
        .shuffle_all(&[TokenId(1), TokenId(2), TokenId(3)])
        .unwrap();

    assert_eq!(tracker.group_count(), 1);
    let joint = tracker.joint(TokenId(1), HypothesisId(0)).unwrap();
    assert_eq!(joint.len(), 3);
    for token in [TokenId(1), TokenId(2), TokenId(3)] {
        let marginal = tracker.color_marginal(token).unwrap();
        assert!((marginal.probability(&c("red")) - 2.0 / 3.0).abs() < 1e-12);
    }

    let events = tracker.drain_events();
    let merges = events
        .iter()
        .filter(|e| matches!(e, LifecycleEvent::Merged { .. }))
        .count();
    assert_eq!(merges, 2);
    assert!(matches!(
        events.last(),
        Some(LifecycleEvent::Shuffled { tokens, .. }) if tokens.len() == 3
    ));
}

#[test]
fn shuffling_leaves_the_posterior_alone() {
    let space = generate_from_script(
        "DIST a { red 9 blue 1 }\nDIST b { red 1 blue 9 }\nLIST urns [a b]\nPERMUTE urns\n\
         BUCKET left = urns[0]\nBUCKET right = urns[1]",
    )
    .unwrap();
    let mut tracker = BeliefTracker::new(&space);
    tracker.spawn(TokenId(1), &SlotId::new("left")).unwrap();
    tracker.spawn(TokenId(2), &SlotId::new("right")).unwrap();
    tracker.shuffle(TokenId(1), TokenId(2)).unwrap();

    for p in tracker.posterior() {
        assert!((p.probability - 0.5).abs() < 1e-12);
    }

    // After a fair swap each token is equally likely to be from either urn
    tracker.observe(TokenId(1), &c("red")).unwrap();
    assert!((tracker.probability(HypothesisId(0)) - 0.5).abs() < 1e-12);
}

#[test]
fn collect_then_spawn_keeps_group_masses_consistent() {
    let space = generate_from_script(
        "DIST a { red 3 blue 1 }\nDIST b { red 1 blue 3 }\nLIST urns [a b]\nPERMUTE urns\n\
         BUCKET left = urns[0]\nBUCKET right = urns[1]",
    )
    .unwrap();
    let mut tracker = BeliefTracker::new(&space);
    for (id, slot) in [(1, "left"), (2, "right"), (3, "left")] {
        tracker.spawn(TokenId(id), &SlotId::new(slot)).unwrap();
    }
    tracker
        .shuffle_all(&[TokenId(1), TokenId(2), TokenId(3)])
        .unwrap();
    tracker.observe(TokenId(2), &c("blue")).unwrap();

    tracker.collect(TokenId(1)).unwrap();
    tracker.spawn(TokenId(4), &SlotId::new("right")).unwrap();
    tracker.shuffle(TokenId(3), TokenId(4)).unwrap();

    assert_eq!(
        tracker.group_members(TokenId(4)).unwrap(),
        vec![TokenId(2), TokenId(3), TokenId(4)]
    );
    for h in 0..space.len() {
        let joint = tracker.joint(TokenId(4), HypothesisId(h)).unwrap();
        assert!((joint.total() - 1.0).abs() < 1e-12);
    }
    let total: f64 = tracker.posterior().iter().map(|p| p.probability).sum();
    assert!((total - 1.0).abs() < 1e-12);
}
