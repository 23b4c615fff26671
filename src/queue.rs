//! Frontier of the search: prefixes awaiting expansion.
//!
//! Entries are ordered by a per-policy metric, smallest first. Equal metrics
//! are broken by insertion sequence, so the order is total and repeated runs
//! pop entries in exactly the same order.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::mem::size_of;

use crate::config::Policy;
use crate::error::{Error, Result};
use crate::trie::{Node, NodeId};

#[derive(Debug, Clone, Copy)]
struct Entry {
    key: f64,
    seq: u64,
    id: NodeId,
}

impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Entry {}

impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Entry {
    // Reversed: `BinaryHeap` is a max-heap and we pop the smallest key first.
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .key
            .total_cmp(&self.key)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

/// Curiosity of a prefix: its lower bound without the length penalty of all
/// but one rule, scaled by the inverse fraction of samples it captures.
pub fn curiosity(node: &Node, c: f64, nsamples: usize) -> f64 {
    if node.num_captured == 0 {
        return f64::INFINITY;
    }
    (node.lower_bound - c * node.depth as f64 + c) * nsamples as f64 / node.num_captured as f64
}

pub struct Frontier {
    heap: BinaryHeap<Entry>,
    policy: Policy,
    c: f64,
    nsamples: usize,
    next_seq: u64,
}

impl Frontier {
    pub fn with_capacity(policy: Policy, c: f64, nsamples: usize, capacity: usize) -> Result<Self> {
        let mut heap = BinaryHeap::new();
        heap.try_reserve(capacity).map_err(|source| Error::Allocation {
            what: "frontier",
            requested: capacity,
            source,
        })?;
        Ok(Self {
            heap,
            policy,
            c,
            nsamples,
            next_seq: 0,
        })
    }

    pub fn policy(&self) -> Policy {
        self.policy
    }

    fn key(&self, node: &Node) -> f64 {
        match self.policy {
            Policy::Bfs => node.depth as f64,
            Policy::Dfs => -(node.depth as f64),
            Policy::LowerBound => node.lower_bound,
            Policy::Objective => node.objective,
            Policy::Curious => curiosity(node, self.c, self.nsamples),
        }
    }

    pub fn push(&mut self, id: NodeId, node: &Node) {
        let entry = Entry {
            key: self.key(node),
            seq: self.next_seq,
            id,
        };
        self.next_seq += 1;
        self.heap.push(entry);
    }

    pub fn pop(&mut self) -> Option<NodeId> {
        self.heap.pop().map(|e| e.id)
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Iterates over queued nodes in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.heap.iter().map(|e| e.id)
    }

    /// Approximate heap bytes held by the frontier.
    pub fn heap_size(&self) -> usize {
        self.heap.capacity() * size_of::<Entry>()
    }
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;
    use crate::trie::Trie;
    use crate::types::{Class, RuleId};

    fn node(depth: usize, lower_bound: f64, objective: f64, num_captured: usize) -> Node {
        Node::new(
            Some(RuleId::new(0)),
            Class::One,
            Class::Zero,
            depth,
            0,
            num_captured,
            lower_bound,
            objective,
        )
    }

    /// Pushes the nodes in order and returns the pop order as input positions.
    fn pop_order(policy: Policy, nodes: &[Node]) -> Vec<usize> {
        let mut trie = Trie::with_capacity(nodes.len() + 1).unwrap();
        let root = trie.insert_root(node(0, 0.0, 1.0, 0));
        let ids: Vec<_> = nodes.iter().map(|n| trie.insert(root, n.clone())).collect();
        let mut frontier = Frontier::with_capacity(policy, 0.01, 10, nodes.len()).unwrap();
        for (&id, n) in ids.iter().zip(nodes) {
            frontier.push(id, n);
        }
        let mut order = Vec::new();
        while let Some(id) = frontier.pop() {
            order.push(ids.iter().position(|&x| x == id).unwrap());
        }
        order
    }

    #[test]
    fn test_lower_bound_order() {
        let nodes = [node(1, 0.3, 0.5, 5), node(1, 0.1, 0.9, 5), node(2, 0.2, 0.4, 5)];
        assert_eq!(pop_order(Policy::LowerBound, &nodes), vec![1, 2, 0]);
    }

    #[test]
    fn test_objective_order() {
        let nodes = [node(1, 0.3, 0.5, 5), node(1, 0.1, 0.9, 5), node(2, 0.2, 0.4, 5)];
        assert_eq!(pop_order(Policy::Objective, &nodes), vec![2, 0, 1]);
    }

    #[test]
    fn test_bfs_dfs_order() {
        let nodes = [node(2, 0.0, 0.0, 5), node(1, 0.0, 0.0, 5), node(3, 0.0, 0.0, 5), node(1, 0.0, 0.0, 5)];
        assert_eq!(pop_order(Policy::Bfs, &nodes), vec![1, 3, 0, 2]);
        assert_eq!(pop_order(Policy::Dfs, &nodes), vec![2, 0, 1, 3]);
    }

    #[test]
    fn test_ties_break_by_insertion() {
        let nodes: Vec<_> = (0..6).map(|_| node(1, 0.25, 0.5, 5)).collect();
        for policy in Policy::ALL {
            assert_eq!(pop_order(policy, &nodes), vec![0, 1, 2, 3, 4, 5]);
        }
    }

    #[test]
    fn test_curiosity() {
        // (0.2 - 0.01 * 2 + 0.01) * 10 / 4
        let n = node(2, 0.2, 0.5, 4);
        assert!((curiosity(&n, 0.01, 10) - 0.475).abs() < 1e-12);
        assert_eq!(curiosity(&node(0, 0.0, 0.5, 0), 0.01, 10), f64::INFINITY);

        let nodes = [node(1, 0.2, 0.5, 2), node(1, 0.2, 0.5, 8)];
        assert_eq!(pop_order(Policy::Curious, &nodes), vec![1, 0]);
    }
}
