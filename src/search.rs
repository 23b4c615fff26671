//! Resumable branch-and-bound search over rule-list prefixes.
//!
//! A [`Search`] owns at most one session. `begin` builds the session from a
//! [`CandidatePool`] and a [`SearchConfig`], `advance` expands a budgeted
//! number of prefixes, and `end` extracts the best rule list found so far and
//! drops the session with everything it owns.
//!
//! ```text
//! Uninitialized --begin--> Active --advance--> Active --end--> Uninitialized
//! ```
//!
//! The objective of a rule list `d` over `n` samples is
//! `errors(d) / n + c * len(d)`. Every score is derived from integer counts,
//! so repeated runs on the same inputs take identical decisions.

use std::mem::size_of;
use std::sync::{Mutex, PoisonError};

use log::{debug, info, warn};
use num_bigint::BigUint;

use crate::bitvec::BitVec;
use crate::config::{Ablation, SearchConfig};
use crate::error::{Error, Result};
use crate::extract::extract;
use crate::map::{Admission, PermutationMap};
use crate::pool::CandidatePool;
use crate::queue::Frontier;
use crate::rulelist::RuleList;
use crate::space::remaining_search_space;
use crate::trie::{Node, NodeId, Trie};
use crate::types::{Class, RuleId};

/// Counters describing the work done by a session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchStats {
    /// Prefixes popped from the frontier and expanded.
    pub nodes_expanded: usize,
    /// Prefixes inserted into the tree, the root included.
    pub nodes_inserted: usize,
    /// Children skipped because they capture too few samples.
    pub pruned_support: usize,
    /// Children skipped because they classify too few captured samples correctly.
    pub pruned_accurate_support: usize,
    /// Children whose lower bound cannot beat the incumbent.
    pub pruned_lookahead: usize,
    /// Children dominated by an equivalent prefix.
    pub pruned_dedup: usize,
    /// Popped entries under a superseded prefix.
    pub discarded_stale: usize,
    /// Popped entries whose bound no longer beats the incumbent.
    pub discarded_bound: usize,
    pub incumbent_updates: usize,
    pub max_tree_nodes: usize,
    pub max_frontier: usize,
    pub map_hits: usize,
    pub map_misses: usize,
    /// Peak tracked memory in bytes, when size tracking is on.
    pub peak_memory: Option<usize>,
}

#[derive(Debug, Clone)]
struct Incumbent {
    objective: f64,
    path: Vec<(RuleId, Class)>,
    default: Class,
}

/// Everything a prefix expansion needs to know about the prefix.
struct Prefix {
    rules: Vec<RuleId>,
    path: Vec<(RuleId, Class)>,
    not_captured: BitVec,
}

struct Session {
    config: SearchConfig,
    pool: CandidatePool,
    trie: Trie,
    frontier: Frontier,
    map: PermutationMap,
    incumbent: Incumbent,
    stats: SearchStats,
}

fn class_counts(set: &BitVec, total: usize, ones: &BitVec) -> (usize, usize) {
    let n1 = set.count_and(ones);
    (total - n1, n1)
}

fn correct(class: Class, zeros: usize, ones: usize) -> usize {
    match class {
        Class::Zero => zeros,
        Class::One => ones,
    }
}

impl Session {
    fn new(config: SearchConfig, pool: CandidatePool) -> Result<Self> {
        config.validate()?;
        let n = pool.num_samples();
        if n == 0 {
            return Err(Error::Validation("candidate pool covers no samples".to_string()));
        }
        let nrules = pool.num_rules();

        let mut trie = Trie::with_capacity(nrules + 1)?;
        let mut frontier = Frontier::with_capacity(config.policy, config.c, n, nrules + 1)?;
        let map = PermutationMap::with_capacity(config.map_type, nrules)?;

        let ones = pool.label(Class::One).support();
        let zeros = n - ones;
        let default = Class::majority(zeros, ones);
        let errors = n - correct(default, zeros, ones);
        let objective = errors as f64 / n as f64;
        let minority = if config.ablation.contains(Ablation::EQUIVALENT_POINTS) {
            0
        } else {
            pool.minority().support()
        };
        let lower_bound = minority as f64 / n as f64;

        let root = Node::new(None, default, default, 0, 0, 0, lower_bound, objective);
        let id = trie.insert_root(root);
        frontier.push(id, trie.node(id));

        let stats = SearchStats {
            nodes_inserted: 1,
            max_tree_nodes: 1,
            max_frontier: 1,
            ..SearchStats::default()
        };
        let mut session = Self {
            config,
            pool,
            trie,
            frontier,
            map,
            incumbent: Incumbent {
                objective,
                path: Vec::new(),
                default,
            },
            stats,
        };
        session.track_memory();
        Ok(session)
    }

    fn nsamples(&self) -> usize {
        self.pool.num_samples()
    }

    /// The bound a prefix must stay below for its subtree to matter.
    fn pruning_bound(&self, lower_bound: f64) -> f64 {
        if self.config.ablation.contains(Ablation::LOOKAHEAD) {
            lower_bound
        } else {
            lower_bound + self.config.c
        }
    }

    fn memory_usage(&self) -> usize {
        size_of::<Self>()
            + self.pool.heap_size()
            + self.trie.heap_size()
            + self.frontier.heap_size()
            + self.map.heap_size()
            + self.incumbent.path.capacity() * size_of::<(RuleId, Class)>()
    }

    fn track_memory(&mut self) {
        if self.config.size_tracking {
            let usage = self.memory_usage();
            self.stats.peak_memory = Some(self.stats.peak_memory.map_or(usage, |p| p.max(usage)));
        }
    }

    fn prefix(&self, id: NodeId) -> Prefix {
        let ancestry = self.trie.ancestry(id);
        let mut rules = Vec::with_capacity(ancestry.len());
        let mut path = Vec::with_capacity(ancestry.len());
        let mut not_captured = BitVec::ones(self.nsamples());
        for a in ancestry {
            let node = self.trie.node(a);
            let rule = node
                .rule
                .unwrap_or_else(|| panic!("Non-root node {:?} has no rule", a));
            not_captured = not_captured.and_not(self.pool.rule(rule).truth());
            rules.push(rule);
            path.push((rule, node.prediction));
        }
        Prefix {
            rules,
            path,
            not_captured,
        }
    }

    /// Pops entries until one worth expanding turns up.
    fn pop(&mut self) -> Option<NodeId> {
        while let Some(id) = self.frontier.pop() {
            let node = self
                .trie
                .get(id)
                .unwrap_or_else(|| panic!("Frontier entry {:?} points at a released node", id));
            let lower_bound = node.lower_bound;
            if self.trie.is_superseded(id) {
                self.stats.discarded_stale += 1;
                self.trie.release(id);
            } else if self.pruning_bound(lower_bound) >= self.incumbent.objective {
                self.stats.discarded_bound += 1;
                self.trie.release(id);
            } else {
                return Some(id);
            }
        }
        None
    }

    fn expand(&mut self, id: NodeId) {
        let parent = self.trie.node(id).clone();
        let prefix = self.prefix(id);
        let n = self.nsamples();
        let c = self.config.c;
        let support_floor = c * n as f64;
        let check_support = !self.config.ablation.contains(Ablation::SUPPORT);
        let use_minority = !self.config.ablation.contains(Ablation::EQUIVALENT_POINTS);
        let depth = parent.depth + 1;
        let penalty = c * depth as f64;
        let uncaptured = prefix.not_captured.count_ones();

        for r in 0..self.pool.num_rules() {
            let rule = RuleId::new(r);
            if prefix.rules.contains(&rule) {
                continue;
            }
            let truth = self.pool.rule(rule).truth();
            let num_captured = prefix.not_captured.count_and(truth);
            if check_support && (num_captured as f64) < support_floor {
                self.stats.pruned_support += 1;
                continue;
            }

            let captured = prefix.not_captured.and(truth);
            let (cap_zeros, cap_ones) = class_counts(&captured, num_captured, self.pool.label(Class::One).truth());
            let prediction = Class::majority(cap_zeros, cap_ones);
            let cap_correct = correct(prediction, cap_zeros, cap_ones);
            if check_support && (cap_correct as f64) < support_floor {
                self.stats.pruned_accurate_support += 1;
                continue;
            }
            let prefix_errors = parent.prefix_errors + (num_captured - cap_correct);

            let not_captured = prefix.not_captured.and_not(truth);
            let remaining = uncaptured - num_captured;
            let (nc_zeros, nc_ones) = class_counts(&not_captured, remaining, self.pool.label(Class::One).truth());
            let default = Class::majority(nc_zeros, nc_ones);
            let default_errors = remaining - correct(default, nc_zeros, nc_ones);

            let objective = (prefix_errors + default_errors) as f64 / n as f64 + penalty;
            let minority = if use_minority {
                not_captured.count_and(self.pool.minority().truth())
            } else {
                0
            };
            let lower_bound = (prefix_errors + minority) as f64 / n as f64 + penalty;

            if objective < self.incumbent.objective {
                let mut path = prefix.path.clone();
                path.push((rule, prediction));
                debug!(
                    "new incumbent: objective {:.6} -> {:.6}, {} rules",
                    self.incumbent.objective,
                    objective,
                    path.len()
                );
                self.incumbent = Incumbent {
                    objective,
                    path,
                    default,
                };
                self.stats.incumbent_updates += 1;
            }

            if self.pruning_bound(lower_bound) >= self.incumbent.objective {
                self.stats.pruned_lookahead += 1;
                continue;
            }

            let key = self.map.key(&prefix.rules, rule, &not_captured);
            match self.map.admit(key.as_ref(), lower_bound) {
                Admission::Rejected => {
                    self.stats.pruned_dedup += 1;
                    continue;
                }
                Admission::Replaces(old) => {
                    if self.trie.get(old).is_some() {
                        self.trie.mark_deleted(old);
                    }
                }
                Admission::Fresh => {}
            }

            let child = Node::new(
                Some(rule),
                prediction,
                default,
                depth,
                prefix_errors,
                n - remaining,
                lower_bound,
                objective,
            );
            let child_id = self.trie.insert(id, child);
            self.frontier.push(child_id, self.trie.node(child_id));
            self.map.insert(key, lower_bound, child_id);
            self.stats.nodes_inserted += 1;
        }

        self.trie.mark_done(id);
        if Some(id) != self.trie.root() && self.trie.live_children(id) == 0 {
            self.trie.release(id);
        }
    }

    fn advance(&mut self, max_new_nodes: usize) -> bool {
        let mut expanded = 0;
        while expanded < max_new_nodes {
            let Some(id) = self.pop() else {
                break;
            };
            self.expand(id);
            expanded += 1;
            self.stats.nodes_expanded += 1;
            self.stats.max_tree_nodes = self.stats.max_tree_nodes.max(self.trie.num_nodes());
            self.stats.max_frontier = self.stats.max_frontier.max(self.frontier.len());
            self.track_memory();

            let freq = self.config.log_frequency;
            if freq > 0 && self.stats.nodes_expanded % freq == 0 {
                self.log_progress();
            }
        }
        self.stats.map_hits = self.map.hits();
        self.stats.map_misses = self.map.misses();
        !self.frontier.is_empty()
    }

    fn remaining_search_space(&self) -> BigUint {
        remaining_search_space(
            &self.trie,
            &self.frontier,
            self.pool.num_rules(),
            self.config.c,
            self.incumbent.objective,
        )
    }

    fn log_progress(&self) {
        if self.config.size_tracking {
            info!(
                "expanded {}, tree {}, frontier {}, best {:.6} ({} rules), memory {} bytes, log2(remaining) {}",
                self.stats.nodes_expanded,
                self.trie.num_nodes(),
                self.frontier.len(),
                self.incumbent.objective,
                self.incumbent.path.len(),
                self.memory_usage(),
                self.remaining_search_space().bits(),
            );
        } else {
            info!(
                "expanded {}, tree {}, frontier {}, best {:.6} ({} rules)",
                self.stats.nodes_expanded,
                self.trie.num_nodes(),
                self.frontier.len(),
                self.incumbent.objective,
                self.incumbent.path.len(),
            );
        }
    }

    fn finish(mut self) -> (f64, RuleList) {
        self.stats.map_hits = self.map.hits();
        self.stats.map_misses = self.map.misses();
        info!(
            "search finished: objective {:.6}, {} rules, {} nodes expanded, frontier {}",
            self.incumbent.objective,
            self.incumbent.path.len(),
            self.stats.nodes_expanded,
            self.frontier.len(),
        );
        debug!("search stats: {:?}", self.stats);
        let rule_list = extract(&self.pool, &self.incumbent.path, self.incumbent.default);
        (self.incumbent.objective, rule_list)
    }
}

/// Owner of at most one search session.
#[derive(Default)]
pub struct Search {
    session: Option<Session>,
}

impl Search {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a session over `pool`.
    ///
    /// The new session is fully built before anything is replaced: on error an
    /// active session is left untouched. An active session is otherwise
    /// discarded together with its unfinished progress.
    pub fn begin(&mut self, config: SearchConfig, pool: CandidatePool) -> Result<()> {
        debug!(
            "begin: {} rules, {} samples, {:?}",
            pool.num_rules(),
            pool.num_samples(),
            config
        );
        let session = Session::new(config, pool)?;
        if let Some(old) = self.session.replace(session) {
            warn!(
                "discarding active search session after {} expanded nodes",
                old.stats.nodes_expanded
            );
        }
        Ok(())
    }

    /// Expands at most `max_new_nodes` prefixes.
    ///
    /// Returns `true` while the frontier still holds prefixes, `false` once the
    /// search is complete and the incumbent is optimal.
    pub fn advance(&mut self, max_new_nodes: usize) -> Result<bool> {
        let session = self.session.as_mut().ok_or(Error::InactiveSession)?;
        Ok(session.advance(max_new_nodes))
    }

    /// Ends the session, returning the objective and the best rule list found.
    pub fn end(&mut self) -> Result<(f64, RuleList)> {
        let session = self.session.take().ok_or(Error::InactiveSession)?;
        Ok(session.finish())
    }

    pub fn is_active(&self) -> bool {
        self.session.is_some()
    }

    /// Number of live nodes in the search tree.
    pub fn num_nodes(&self) -> Option<usize> {
        self.session.as_ref().map(|s| s.trie.num_nodes())
    }

    pub fn frontier_len(&self) -> Option<usize> {
        self.session.as_ref().map(|s| s.frontier.len())
    }

    pub fn best_objective(&self) -> Option<f64> {
        self.session.as_ref().map(|s| s.incumbent.objective)
    }

    pub fn stats(&self) -> Option<&SearchStats> {
        self.session.as_ref().map(|s| &s.stats)
    }

    /// Approximate heap bytes held by the session.
    pub fn memory_usage(&self) -> Option<usize> {
        self.session.as_ref().map(Session::memory_usage)
    }

    /// Upper bound on the prefixes the session may still evaluate.
    pub fn remaining_search_space(&self) -> Option<BigUint> {
        self.session.as_ref().map(Session::remaining_search_space)
    }
}

/// A [`Search`] behind a mutex, for trainers shared across threads.
///
/// Lifecycle transitions are serialized; a `begin` while another caller's
/// session is active resets it.
#[derive(Default)]
pub struct SessionSlot {
    inner: Mutex<Search>,
}

impl SessionSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `f` with exclusive access to the search.
    pub fn with<T>(&self, f: impl FnOnce(&mut Search) -> T) -> T {
        let mut guard = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut guard)
    }

    pub fn begin(&self, config: SearchConfig, pool: CandidatePool) -> Result<()> {
        self.with(|s| s.begin(config, pool))
    }

    pub fn advance(&self, max_new_nodes: usize) -> Result<bool> {
        self.with(|s| s.advance(max_new_nodes))
    }

    pub fn end(&self) -> Result<(f64, RuleList)> {
        self.with(Search::end)
    }

    pub fn is_active(&self) -> bool {
        self.with(|s| s.is_active())
    }
}
