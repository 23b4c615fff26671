//! Symmetry-aware deduplication of prefixes.
//!
//! Two prefixes with the same key leave the same samples uncaptured, so any
//! completion of one is matched by the same completion of the other, and the
//! prefix with the smaller lower bound dominates. The map keeps, per key, the
//! best lower bound seen and the node holding it.
//!
//! | Map type | Key | Merges |
//! |----------|-----|--------|
//! | [`MapType::None`] | - | nothing |
//! | [`MapType::Prefix`] | sorted antecedent ids | permutations of one antecedent set |
//! | [`MapType::Captured`] | not-captured sample vector | prefixes capturing the same samples |

use std::collections::HashMap;
use std::mem::size_of;

use crate::bitvec::BitVec;
use crate::config::MapType;
use crate::error::{Error, Result};
use crate::trie::NodeId;
use crate::types::RuleId;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PrefixKey {
    Prefix(Box<[u32]>),
    Captured(BitVec),
}

impl PrefixKey {
    fn heap_size(&self) -> usize {
        match self {
            PrefixKey::Prefix(ids) => ids.len() * size_of::<u32>(),
            PrefixKey::Captured(bits) => bits.heap_size(),
        }
    }
}

#[derive(Debug, Copy, Clone)]
struct Entry {
    lower_bound: f64,
    node: NodeId,
}

/// Outcome of offering a new prefix to the map.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Admission {
    /// An equivalent prefix with a lower bound at most as large is known.
    Rejected,
    /// No equivalent prefix is known.
    Fresh,
    /// The new prefix beats the stored one, which should be superseded.
    Replaces(NodeId),
}

/// Dedup map from prefix keys to the best lower bound seen for them.
///
/// Entries live for the whole session: a released node's stored bound still
/// dominates later prefixes with the same key.
pub struct PermutationMap {
    map_type: MapType,
    map: HashMap<PrefixKey, Entry>,
    key_bytes: usize,
    hits: usize,
    misses: usize,
}

impl PermutationMap {
    pub fn with_capacity(map_type: MapType, capacity: usize) -> Result<Self> {
        let mut map = HashMap::new();
        if map_type != MapType::None {
            map.try_reserve(capacity).map_err(|source| Error::Allocation {
                what: "permutation map",
                requested: capacity,
                source,
            })?;
        }
        Ok(Self {
            map_type,
            map,
            key_bytes: 0,
            hits: 0,
            misses: 0,
        })
    }

    pub fn map_type(&self) -> MapType {
        self.map_type
    }

    /// Builds the key of the prefix `parent_rules + [rule]` leaving
    /// `not_captured` uncaptured, or `None` when the map is off.
    pub fn key(&self, parent_rules: &[RuleId], rule: RuleId, not_captured: &BitVec) -> Option<PrefixKey> {
        match self.map_type {
            MapType::None => None,
            MapType::Prefix => {
                let mut ids: Vec<u32> = parent_rules
                    .iter()
                    .chain(std::iter::once(&rule))
                    .map(|r| r.index() as u32)
                    .collect();
                ids.sort_unstable();
                Some(PrefixKey::Prefix(ids.into_boxed_slice()))
            }
            MapType::Captured => Some(PrefixKey::Captured(not_captured.clone())),
        }
    }

    /// Decides whether a prefix with `key` and `lower_bound` is worth keeping.
    pub fn admit(&mut self, key: Option<&PrefixKey>, lower_bound: f64) -> Admission {
        let Some(key) = key else {
            return Admission::Fresh;
        };
        match self.map.get(key) {
            Some(entry) => {
                self.hits += 1;
                if lower_bound < entry.lower_bound {
                    Admission::Replaces(entry.node)
                } else {
                    Admission::Rejected
                }
            }
            None => {
                self.misses += 1;
                Admission::Fresh
            }
        }
    }

    /// Records `node` as the holder of `key`.
    pub fn insert(&mut self, key: Option<PrefixKey>, lower_bound: f64, node: NodeId) {
        let Some(key) = key else {
            return;
        };
        let bytes = key.heap_size();
        if self.map.insert(key, Entry { lower_bound, node }).is_none() {
            self.key_bytes += bytes;
        }
    }

    /// Returns the number of keys.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Returns the number of lookups that found an equivalent prefix.
    pub fn hits(&self) -> usize {
        self.hits
    }

    /// Returns the number of lookups that found nothing.
    pub fn misses(&self) -> usize {
        self.misses
    }

    /// Approximate heap bytes held by the map.
    pub fn heap_size(&self) -> usize {
        self.map.capacity() * (size_of::<PrefixKey>() + size_of::<Entry>()) + self.key_bytes
    }
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;
    use crate::trie::{Node, Trie};
    use crate::types::Class;

    fn ids(n: usize) -> Vec<NodeId> {
        let mut trie = Trie::with_capacity(n + 1).unwrap();
        let root = trie.insert_root(Node::new(None, Class::Zero, Class::Zero, 0, 0, 0, 0.0, 0.0));
        (0..n)
            .map(|_| trie.insert(root, Node::new(None, Class::Zero, Class::Zero, 1, 0, 0, 0.0, 0.0)))
            .collect()
    }

    fn rules(xs: &[usize]) -> Vec<RuleId> {
        xs.iter().map(|&x| RuleId::new(x)).collect()
    }

    #[test]
    fn test_prefix_key_ignores_order() {
        let map = PermutationMap::with_capacity(MapType::Prefix, 4).unwrap();
        let nc = BitVec::zeros(3);
        let k1 = map.key(&rules(&[3, 1]), RuleId::new(2), &nc);
        let k2 = map.key(&rules(&[2, 3]), RuleId::new(1), &nc);
        assert_eq!(k1, k2);
        assert_eq!(k1, Some(PrefixKey::Prefix(vec![1, 2, 3].into_boxed_slice())));
    }

    #[test]
    fn test_captured_key() {
        let map = PermutationMap::with_capacity(MapType::Captured, 4).unwrap();
        let nc = BitVec::from_bools([true, false]);
        let k = map.key(&rules(&[0]), RuleId::new(5), &nc);
        assert_eq!(k, Some(PrefixKey::Captured(nc)));
    }

    #[test]
    fn test_no_map_admits_everything() {
        let mut map = PermutationMap::with_capacity(MapType::None, 4).unwrap();
        let key = map.key(&rules(&[0]), RuleId::new(1), &BitVec::zeros(2));
        assert_eq!(key, None);
        assert_eq!(map.admit(key.as_ref(), 0.5), Admission::Fresh);
        map.insert(key, 0.5, ids(1)[0]);
        assert!(map.is_empty());
    }

    #[test]
    fn test_admission() {
        let node = ids(2);
        let mut map = PermutationMap::with_capacity(MapType::Prefix, 4).unwrap();
        let nc = BitVec::zeros(2);
        let key = map.key(&rules(&[0]), RuleId::new(1), &nc);

        assert_eq!(map.admit(key.as_ref(), 0.3), Admission::Fresh);
        map.insert(key.clone(), 0.3, node[0]);

        // Not strictly better: rejected, ties keep the first.
        assert_eq!(map.admit(key.as_ref(), 0.3), Admission::Rejected);
        assert_eq!(map.admit(key.as_ref(), 0.4), Admission::Rejected);

        // Strictly better: replaces the stored node.
        assert_eq!(map.admit(key.as_ref(), 0.2), Admission::Replaces(node[0]));
        map.insert(key.clone(), 0.2, node[1]);
        assert_eq!(map.admit(key.as_ref(), 0.1), Admission::Replaces(node[1]));

        assert_eq!(map.len(), 1);
        assert_eq!(map.hits(), 4);
        assert_eq!(map.misses(), 1);
        assert!(map.heap_size() > 0);
    }
}
