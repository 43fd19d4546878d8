//! Property tests: any sequence of tracker operations keeps every joint
//! table normalized, the posterior a distribution, and token locations in
//! agreement with group membership.

use beliefflow_hypothesis::{generate_from_script, HypothesisSpace};
use beliefflow_tracker::BeliefTracker;
use beliefflow_types::{Color, HypothesisId, SlotId, TokenId};
use proptest::prelude::*;

const SCRIPT: &str = r#"
DIST a { red 3 blue 1 }
DIST b { red 1 blue 3 }
DIST c { red 1 }
LIST urns [a b c]
PERMUTE urns
BUCKET x = urns[0]
BUCKET y = urns[1]
"#;

const MAX_LIVE: usize = 6;

// ---------------------------------------------------------------------------
// Helpers / Strategies
// ---------------------------------------------------------------------------

/// Token arguments are indices into the live set, taken modulo its size.
#[derive(Clone, Debug)]
enum Op {
    Spawn { second_slot: bool },
    Observe { token: usize, red: bool },
    Shuffle { a: usize, b: usize },
    ShuffleAll { tokens: Vec<usize> },
    Duplicate { token: usize },
    Collect { token: usize },
}

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => any::<bool>().prop_map(|second_slot| Op::Spawn { second_slot }),
        2 => (any::<usize>(), any::<bool>()).prop_map(|(token, red)| Op::Observe { token, red }),
        2 => (any::<usize>(), any::<usize>()).prop_map(|(a, b)| Op::Shuffle { a, b }),
        1 => prop::collection::vec(any::<usize>(), 1..5)
            .prop_map(|tokens| Op::ShuffleAll { tokens }),
        1 => any::<usize>().prop_map(|token| Op::Duplicate { token }),
        1 => any::<usize>().prop_map(|token| Op::Collect { token }),
    ]
}

fn space() -> HypothesisSpace {
    generate_from_script(SCRIPT).unwrap()
}

fn pick(live: &[TokenId], index: usize) -> Option<TokenId> {
    if live.is_empty() {
        None
    } else {
        Some(live[index % live.len()])
    }
}

fn apply(tracker: &mut BeliefTracker, op: &Op, next: &mut u64) {
    let live = tracker.live_tokens();
    let mut fresh = || {
        *next += 1;
        TokenId(*next)
    };
    match op {
        Op::Spawn { second_slot } => {
            if live.len() < MAX_LIVE {
                let slot = if *second_slot { "y" } else { "x" };
                tracker.spawn(fresh(), &SlotId::new(slot)).unwrap();
            }
        }
        Op::Observe { token, red } => {
            if let Some(t) = pick(&live, *token) {
                let color = Color::new(if *red { "red" } else { "blue" });
                tracker.observe(t, &color).unwrap();
            }
        }
        Op::Shuffle { a, b } => {
            if let (Some(a), Some(b)) = (pick(&live, *a), pick(&live, *b)) {
                tracker.shuffle(a, b).unwrap();
            }
        }
        Op::ShuffleAll { tokens } => {
            let picked: Vec<TokenId> = tokens.iter().filter_map(|&i| pick(&live, i)).collect();
            tracker.shuffle_all(&picked).unwrap();
        }
        Op::Duplicate { token } => {
            if live.len() < MAX_LIVE {
                if let Some(t) = pick(&live, *token) {
                    tracker.duplicate(t, fresh()).unwrap();
                }
            }
        }
        Op::Collect { token } => {
            if let Some(t) = pick(&live, *token) {
                tracker.collect(t).unwrap();
            }
        }
    }
}

fn check_invariants(tracker: &BeliefTracker, hypotheses: usize) -> Result<(), TestCaseError> {
    let total: f64 = tracker.posterior().iter().map(|p| p.probability).sum();
    prop_assert!((total - 1.0).abs() < 1e-9, "posterior sums to {}", total);

    for token in tracker.live_tokens() {
        let location = tracker.location(token).unwrap();
        let members = tracker.group_members(token).unwrap();
        prop_assert_eq!(members.get(location.position), Some(&token));
        for member in &members {
            prop_assert_eq!(tracker.group_of(*member), Some(location.group));
        }

        for h in 0..hypotheses {
            let joint = tracker.joint(token, HypothesisId(h)).unwrap();
            prop_assert!(
                (joint.total() - 1.0).abs() < 1e-9,
                "joint for {} under h{} sums to {}",
                token,
                h,
                joint.total()
            );
            prop_assert!(joint.entries().keys().all(|k| k.len() == members.len()));
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Property Tests
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Random operation sequences never leak or create probability mass.
    #[test]
    fn operations_conserve_mass(ops in prop::collection::vec(arb_op(), 1..40)) {
        let space = space();
        prop_assert_eq!(space.len(), 6);
        let mut tracker = BeliefTracker::new(&space);
        let mut next = 0u64;

        for op in &ops {
            apply(&mut tracker, op, &mut next);
            check_invariants(&tracker, space.len())?;
        }
    }

    /// Shuffles never move the posterior.
    #[test]
    fn shuffles_leave_posterior_unchanged(
        setup in prop::collection::vec(arb_op(), 1..20),
        a in any::<usize>(),
        b in any::<usize>(),
    ) {
        let space = space();
        let mut tracker = BeliefTracker::new(&space);
        let mut next = 0u64;
        for op in &setup {
            apply(&mut tracker, op, &mut next);
        }

        let before = tracker.posterior();
        apply(&mut tracker, &Op::Shuffle { a, b }, &mut next);
        let all = tracker.live_tokens().iter().enumerate().map(|(i, _)| i).collect();
        apply(&mut tracker, &Op::ShuffleAll { tokens: all }, &mut next);

        for (x, y) in before.iter().zip(tracker.posterior()) {
            prop_assert!((x.probability - y.probability).abs() < 1e-12);
        }
    }
}
