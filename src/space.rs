//! Upper bound on the number of prefixes the search may still evaluate.
//!
//! A queued prefix of depth `d` with lower bound `b` can only grow by `k`
//! rules while `b + c*k` beats the incumbent, and each extension draws from
//! the `m = nrules - d` unused rules, so its subtree holds at most
//! `sum_{j=0..=K} m! / (m-j)!` prefixes. The counts overflow any fixed width
//! quickly, hence [`BigUint`].

use num_bigint::BigUint;

use crate::queue::Frontier;
use crate::trie::Trie;

/// Longest extension (in rules) of a prefix with `lower_bound` that can
/// still beat `best`, capped at `available` unused rules.
pub fn max_extension(lower_bound: f64, best: f64, c: f64, available: usize) -> usize {
    if lower_bound >= best {
        return 0;
    }
    if c <= 0.0 {
        return available;
    }
    let k = ((best - lower_bound) / c).floor();
    if k >= available as f64 {
        available
    } else {
        k as usize
    }
}

/// Number of ordered selections of `0..=k` items out of `m`.
pub fn partial_permutations(m: usize, k: usize) -> BigUint {
    let mut total = BigUint::from(1u32);
    let mut term = BigUint::from(1u32);
    for j in 0..k.min(m) {
        term *= BigUint::from(m - j);
        total += &term;
    }
    total
}

/// Sums the subtree bounds of every live, non-superseded frontier entry.
pub fn remaining_search_space(trie: &Trie, frontier: &Frontier, nrules: usize, c: f64, best: f64) -> BigUint {
    let mut total = BigUint::default();
    for id in frontier.iter() {
        let Some(node) = trie.get(id) else {
            continue;
        };
        if node.lower_bound >= best || trie.is_superseded(id) {
            continue;
        }
        let available = nrules.saturating_sub(node.depth);
        let k = max_extension(node.lower_bound, best, c, available);
        total += partial_permutations(available, k);
    }
    total
}
