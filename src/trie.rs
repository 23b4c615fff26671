//! Prefix tree of the branch-and-bound search.
//!
//! Nodes live in an arena of slots. A [`NodeId`] carries the generation of its
//! slot, so a handle to a released node is detected instead of silently
//! reading whatever reused the slot. Released slots go onto a free list and
//! are reused most-recently-released first.

use std::mem::size_of;

use crate::error::{Error, Result};
use crate::types::{Class, RuleId};

/// Generation-checked handle to a tree node.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct NodeId {
    index: u32,
    generation: u32,
}

/// One prefix of the search: the rule list formed by the path from the root.
#[derive(Debug, Clone)]
pub struct Node {
    /// Last antecedent of the prefix (`None` for the empty prefix).
    pub(crate) rule: Option<RuleId>,
    /// Class predicted by `rule`.
    pub(crate) prediction: Class,
    /// Class predicted for the samples the prefix does not capture.
    pub(crate) default_prediction: Class,
    pub(crate) depth: usize,
    /// Samples misclassified by the rules of the prefix.
    pub(crate) prefix_errors: usize,
    /// Samples captured by the prefix.
    pub(crate) num_captured: usize,
    pub(crate) lower_bound: f64,
    pub(crate) objective: f64,
    pub(crate) parent: Option<NodeId>,
    live_children: usize,
    done: bool,
    deleted: bool,
}

impl Node {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        rule: Option<RuleId>,
        prediction: Class,
        default_prediction: Class,
        depth: usize,
        prefix_errors: usize,
        num_captured: usize,
        lower_bound: f64,
        objective: f64,
    ) -> Self {
        Self {
            rule,
            prediction,
            default_prediction,
            depth,
            prefix_errors,
            num_captured,
            lower_bound,
            objective,
            parent: None,
            live_children: 0,
            done: false,
            deleted: false,
        }
    }

    pub fn rule(&self) -> Option<RuleId> {
        self.rule
    }
    pub fn prediction(&self) -> Class {
        self.prediction
    }
    pub fn default_prediction(&self) -> Class {
        self.default_prediction
    }
    pub fn depth(&self) -> usize {
        self.depth
    }
    pub fn lower_bound(&self) -> f64 {
        self.lower_bound
    }
    pub fn objective(&self) -> f64 {
        self.objective
    }
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }
    pub fn is_done(&self) -> bool {
        self.done
    }
    pub fn is_deleted(&self) -> bool {
        self.deleted
    }
}

struct Slot {
    generation: u32,
    node: Option<Node>,
}

pub struct Trie {
    slots: Vec<Slot>,
    free: Vec<u32>,
    /// Number of live nodes.
    size: usize,
    root: Option<NodeId>,
}

impl Trie {
    /// Creates an empty tree with room for `capacity` nodes.
    pub fn with_capacity(capacity: usize) -> Result<Self> {
        let mut slots = Vec::new();
        slots.try_reserve(capacity).map_err(|source| Error::Allocation {
            what: "search tree",
            requested: capacity,
            source,
        })?;
        Ok(Self {
            slots,
            free: Vec::new(),
            size: 0,
            root: None,
        })
    }

    /// Number of live nodes.
    pub fn num_nodes(&self) -> usize {
        self.size
    }

    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    /// Returns the node behind `id`, or `None` if it has been released.
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        let slot = self.slots.get(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        slot.node.as_ref()
    }

    /// Returns the node behind `id`.
    ///
    /// # Panics
    ///
    /// Panics if the node has been released.
    pub fn node(&self, id: NodeId) -> &Node {
        self.get(id)
            .unwrap_or_else(|| panic!("Node {:?} has been released", id))
    }

    fn node_mut(&mut self, id: NodeId) -> &mut Node {
        let slot = &mut self.slots[id.index as usize];
        assert_eq!(slot.generation, id.generation, "Node {:?} has been released", id);
        slot.node
            .as_mut()
            .unwrap_or_else(|| panic!("Node {:?} has been released", id))
    }

    fn alloc(&mut self, node: Node) -> NodeId {
        self.size += 1;
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.node = Some(node);
            return NodeId {
                index,
                generation: slot.generation,
            };
        }
        let index = self.slots.len();
        assert!(index < u32::MAX as usize, "Search tree is full");
        self.slots.push(Slot {
            generation: 0,
            node: Some(node),
        });
        NodeId {
            index: index as u32,
            generation: 0,
        }
    }

    /// Inserts the root (empty prefix).
    ///
    /// # Panics
    ///
    /// Panics if the tree already has a root.
    pub fn insert_root(&mut self, node: Node) -> NodeId {
        assert!(self.root.is_none(), "Root already exists");
        let id = self.alloc(node);
        self.root = Some(id);
        id
    }

    /// Inserts `node` as a child of `parent`.
    pub fn insert(&mut self, parent: NodeId, mut node: Node) -> NodeId {
        node.parent = Some(parent);
        self.node_mut(parent).live_children += 1;
        self.alloc(node)
    }

    pub fn mark_done(&mut self, id: NodeId) {
        self.node_mut(id).done = true;
    }

    /// Marks a node as superseded. Its frontier entry, and those of its
    /// descendants, are discarded when popped.
    pub fn mark_deleted(&mut self, id: NodeId) {
        self.node_mut(id).deleted = true;
    }

    /// Returns the number of live children of a node.
    pub fn live_children(&self, id: NodeId) -> usize {
        self.node(id).live_children
    }

    /// Releases a node, then every ancestor left as an expanded node with no
    /// live children. The root is never released. Returns the number of
    /// released nodes.
    pub fn release(&mut self, id: NodeId) -> usize {
        let mut released = 0;
        let mut current = Some(id);
        while let Some(id) = current {
            if Some(id) == self.root {
                break;
            }
            let slot = &mut self.slots[id.index as usize];
            assert_eq!(slot.generation, id.generation, "Node {:?} released twice", id);
            let node = slot
                .node
                .take()
                .unwrap_or_else(|| panic!("Node {:?} released twice", id));
            slot.generation = slot.generation.wrapping_add(1);
            self.free.push(id.index);
            self.size -= 1;
            released += 1;

            current = node.parent.and_then(|parent| {
                let p = self.node_mut(parent);
                p.live_children -= 1;
                (p.done && p.live_children == 0).then_some(parent)
            });
        }
        released
    }

    /// Returns the path from the first rule of the prefix down to `id`
    /// (the root excluded).
    pub fn ancestry(&self, id: NodeId) -> Vec<NodeId> {
        let mut path = Vec::with_capacity(self.node(id).depth);
        let mut current = id;
        while let Some(parent) = self.node(current).parent {
            path.push(current);
            current = parent;
        }
        path.reverse();
        path
    }

    /// Returns true if `id` or one of its ancestors has been superseded.
    pub fn is_superseded(&self, id: NodeId) -> bool {
        let mut current = Some(id);
        while let Some(id) = current {
            let node = self.node(id);
            if node.deleted {
                return true;
            }
            current = node.parent;
        }
        false
    }

    /// Approximate heap bytes held by the tree.
    pub fn heap_size(&self) -> usize {
        self.slots.capacity() * size_of::<Slot>() + self.free.capacity() * size_of::<u32>()
    }
}
