//! Conversion of a search path into a portable rule list.

use crate::pool::CandidatePool;
use crate::rulelist::{Rule, RuleList};
use crate::types::{Class, RuleId};

/// Resolves every step of `path` to the literals of its antecedent and
/// appends the default rule.
///
/// # Panics
///
/// Panics if a step refers to a rule outside the pool.
pub fn extract(pool: &CandidatePool, path: &[(RuleId, Class)], default: Class) -> RuleList {
    let rules = path
        .iter()
        .enumerate()
        .map(|(step, &(id, prediction))| {
            assert!(
                id.index() < pool.num_rules(),
                "Path step {} refers to rule {} but the pool has {} rules",
                step,
                id.index(),
                pool.num_rules()
            );
            Rule::new(pool.rule(id).members().to_vec(), prediction)
        })
        .collect();
    RuleList::assemble(rules, default, pool.num_features())
}
