//! Property tests: hypothesis spaces have exactly the size their mode
//! implies, and start from a uniform prior.

use beliefflow_hypothesis::{
    generate, generate_from_script, Candidate, HypothesisSpec, SlotCandidates,
};
use beliefflow_types::{Distribution, SlotId};
use proptest::prelude::*;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn falling_factorial(n: usize, k: usize) -> usize {
    ((n - k + 1)..=n).product()
}

/// `n` pairwise distinct distributions
fn candidates(n: usize) -> Vec<Candidate> {
    (0..n)
        .map(|i| {
            Candidate::labeled(
                format!("d{}", i),
                Distribution::new().with("red", (i + 1) as f64).with("blue", 1.0),
            )
        })
        .collect()
}

/// A script permuting `n` distributions and binding the first `k` positions
fn permutation_script(n: usize, k: usize) -> String {
    let mut source = String::new();
    for i in 0..n {
        source.push_str(&format!("DIST d{} {{ red {} blue 1 }}\n", i, i + 1));
    }
    let names: Vec<String> = (0..n).map(|i| format!("d{}", i)).collect();
    source.push_str(&format!("LIST pool [{}]\nPERMUTE pool\n", names.join(" ")));
    for i in 0..k {
        source.push_str(&format!("BUCKET s{} = pool[{}]\n", i, i));
    }
    source
}

// ---------------------------------------------------------------------------
// Property Tests
// ---------------------------------------------------------------------------

proptest! {
    /// Independent mode is the Cartesian product of every slot's candidates.
    #[test]
    fn independent_count_is_product(sizes in prop::collection::vec(1usize..4, 1..4)) {
        let spec = HypothesisSpec::Independent {
            slots: sizes
                .iter()
                .enumerate()
                .map(|(i, &n)| SlotCandidates {
                    slot: SlotId::new(format!("slot{}", i)),
                    candidates: candidates(n),
                })
                .collect(),
        };
        let space = generate(&spec).unwrap();
        prop_assert_eq!(space.len(), sizes.iter().product::<usize>());
    }

    /// Permutation mode places distinct distributions: n!/(n-k)! worlds.
    #[test]
    fn permutation_count_is_falling_factorial(
        (n, k) in (1usize..6).prop_flat_map(|n| (Just(n), 1..=n))
    ) {
        let spec = HypothesisSpec::Permutation {
            slots: (0..k).map(|i| SlotId::new(format!("s{}", i))).collect(),
            distributions: candidates(n),
            hypotheses: Vec::new(),
        };
        let space = generate(&spec).unwrap();
        prop_assert_eq!(space.len(), falling_factorial(n, k));

        // No world assigns the same distribution twice
        for h in space.hypotheses() {
            let placed: Vec<&Distribution> = h.slots.values().collect();
            prop_assert_eq!(placed.len(), k);
            for (i, a) in placed.iter().enumerate() {
                prop_assert!(placed[i + 1..].iter().all(|b| b != a));
            }
        }
    }

    /// Scripted k-selection from a permuted list counts like permutation mode.
    #[test]
    fn scripted_selection_count(
        (n, k) in (1usize..6).prop_flat_map(|n| (Just(n), 1..=n))
    ) {
        let space = generate_from_script(&permutation_script(n, k)).unwrap();
        prop_assert_eq!(space.len(), falling_factorial(n, k));
        prop_assert_eq!(space.slots().len(), k);
    }

    /// Every generated space starts uniform.
    #[test]
    fn priors_sum_to_one(sizes in prop::collection::vec(1usize..4, 1..4)) {
        let spec = HypothesisSpec::Independent {
            slots: sizes
                .iter()
                .enumerate()
                .map(|(i, &n)| SlotCandidates {
                    slot: SlotId::new(format!("slot{}", i)),
                    candidates: candidates(n),
                })
                .collect(),
        };
        let space = generate(&spec).unwrap();
        let total = space.prior() * space.len() as f64;
        prop_assert!((total - 1.0).abs() < 1e-12);
    }
}
