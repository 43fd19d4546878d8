//! Enumeration helpers: k-permutations and Cartesian products
//!
//! Enumeration order is lexicographic so generated hypothesis ids are
//! stable across runs.

/// Number of ordered selections of `k` distinct items out of `n`,
/// i.e. n!/(n−k)!. `None` on overflow; zero when `k > n`.
pub fn permutation_count(n: usize, k: usize) -> Option<usize> {
    if k > n {
        return Some(0);
    }
    ((n - k + 1)..=n).try_fold(1usize, |acc, x| acc.checked_mul(x))
}

/// Product of lengths, `None` on overflow
pub fn product_count(lens: &[usize]) -> Option<usize> {
    lens.iter().try_fold(1usize, |acc, &x| acc.checked_mul(x))
}

/// All ordered selections of `k` distinct indices from `0..n`.
///
/// `k_permutations(3, 2)` yields `[0,1] [0,2] [1,0] [1,2] [2,0] [2,1]`.
pub fn k_permutations(n: usize, k: usize) -> Vec<Vec<usize>> {
    let mut out = Vec::new();
    if k > n {
        return out;
    }
    let mut used = vec![false; n];
    let mut current = Vec::with_capacity(k);
    extend_permutation(n, k, &mut used, &mut current, &mut out);
    out
}

fn extend_permutation(
    n: usize,
    k: usize,
    used: &mut [bool],
    current: &mut Vec<usize>,
    out: &mut Vec<Vec<usize>>,
) {
    if current.len() == k {
        out.push(current.clone());
        return;
    }
    for i in 0..n {
        if used[i] {
            continue;
        }
        used[i] = true;
        current.push(i);
        extend_permutation(n, k, used, current, out);
        current.pop();
        used[i] = false;
    }
}

/// Every index combination for the given axis lengths; the first axis
/// varies slowest. An empty axis list yields one empty combination.
pub fn cartesian(lens: &[usize]) -> Vec<Vec<usize>> {
    if lens.iter().any(|&l| l == 0) {
        return Vec::new();
    }
    let mut out = Vec::new();
    let mut odometer = vec![0usize; lens.len()];
    loop {
        out.push(odometer.clone());

        let mut axis = lens.len();
        loop {
            if axis == 0 {
                return out;
            }
            axis -= 1;
            odometer[axis] += 1;
            if odometer[axis] < lens[axis] {
                break;
            }
            odometer[axis] = 0;
        }
    }
}
