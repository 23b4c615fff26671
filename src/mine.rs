//! Antecedent mining and the minority bound.
//!
//! Both are collaborators of the candidate pool builder, reached through the
//! [`Miner`] and [`BoundEstimator`] traits. The defaults shipped here are a
//! levelwise frequent-conjunction miner and the equivalent-points minority
//! estimator.

use std::collections::{HashMap, HashSet};

use log::debug;

use crate::bitvec::BitVec;
use crate::encode::columns;
use crate::error::{Error, Result};
use crate::record::Record;
use crate::types::{Class, Literal};

/// Enumerates candidate antecedents.
pub trait Miner {
    /// Returns conjunctions of at most `max_cardinality` literals whose support
    /// fraction over `samples` is at least `min_support`.
    ///
    /// Returned records have truth vectors of length `samples.len()`.
    fn mine(
        &self,
        samples: &[Record],
        labels: &[Record; 2],
        features: &[String],
        max_cardinality: usize,
        min_support: f64,
    ) -> Result<Vec<Record>>;
}

/// Computes the minority-bound record used to seed the lower bound.
pub trait BoundEstimator {
    /// Returns a record over samples marking the samples that any rule list
    /// must misclassify.
    fn minority(&self, samples: &[Record], labels: &[Record; 2]) -> Result<Record>;
}

/// Levelwise miner over distinct features, both polarities.
///
/// Level `k` extends the surviving conjunctions of level `k-1` by one literal
/// on a later feature; support is anti-monotone under conjunction, so a
/// conjunction below the minimum support is never extended. Conjunctions are
/// emitted when their support also stays at or below `1 - min_support`.
/// Truth vectors equal to an earlier emitted one are skipped.
#[derive(Debug, Default, Clone, Copy)]
pub struct LevelwiseMiner;

struct Candidate {
    last_feature: usize,
    members: Vec<Literal>,
    truth: BitVec,
}

fn rule_label(members: &[Literal], features: &[String]) -> String {
    members
        .iter()
        .map(|lit| {
            let name = &features[lit.feature()];
            if lit.is_positive() {
                name.clone()
            } else {
                format!("not {}", name)
            }
        })
        .collect::<Vec<_>>()
        .join(" && ")
}

impl Miner for LevelwiseMiner {
    fn mine(
        &self,
        samples: &[Record],
        _labels: &[Record; 2],
        features: &[String],
        max_cardinality: usize,
        min_support: f64,
    ) -> Result<Vec<Record>> {
        let nsamples = samples.len();
        let nfeatures = samples.first().map_or(0, |s| s.len());
        if features.len() < nfeatures {
            return Err(Error::Mining(format!(
                "{} feature names for {} features",
                features.len(),
                nfeatures
            )));
        }

        let min_count = min_support * nsamples as f64;
        let max_count = (1.0 - min_support) * nsamples as f64;
        let frequent = |count: usize| count as f64 >= min_count;
        let emit = |count: usize| count as f64 >= min_count && count as f64 <= max_count;

        let cols = columns(samples, nfeatures);
        let literals: Vec<(Literal, BitVec)> = cols
            .into_iter()
            .enumerate()
            .flat_map(|(j, col)| {
                let neg = col.not();
                [(Literal::positive(j as u32), col), (Literal::negative(j as u32), neg)]
            })
            .collect();

        let mut rules: Vec<Record> = Vec::new();
        let mut seen: HashSet<BitVec> = HashSet::new();

        let mut level: Vec<Candidate> = Vec::new();
        for (lit, truth) in &literals {
            if frequent(truth.count_ones()) {
                level.push(Candidate {
                    last_feature: lit.feature(),
                    members: vec![*lit],
                    truth: truth.clone(),
                });
            }
        }

        for cardinality in 1..=max_cardinality {
            debug!("mining level {}: {} frequent conjunctions", cardinality, level.len());

            rules.try_reserve(level.len()).map_err(|e| {
                Error::Mining(format!(
                    "cannot allocate {} rules of cardinality {}: {}",
                    level.len(),
                    cardinality,
                    e
                ))
            })?;
            for cand in &level {
                let count = cand.truth.count_ones();
                if emit(count) && seen.insert(cand.truth.clone()) {
                    rules.push(Record::antecedent(
                        cand.truth.clone(),
                        cand.members.clone(),
                        Some(rule_label(&cand.members, features)),
                    ));
                }
            }

            if cardinality == max_cardinality {
                break;
            }

            let mut next = Vec::new();
            for cand in &level {
                for (lit, truth) in &literals[2 * (cand.last_feature + 1)..] {
                    let conj = cand.truth.and(truth);
                    if frequent(conj.count_ones()) {
                        let mut members = cand.members.clone();
                        members.push(*lit);
                        next.push(Candidate {
                            last_feature: lit.feature(),
                            members,
                            truth: conj,
                        });
                    }
                }
            }
            if next.is_empty() {
                break;
            }
            level = next;
        }

        if rules.len() > u32::MAX as usize {
            return Err(Error::Mining(format!("{} rules exceed the index range", rules.len())));
        }

        debug!("mined {} rules from {} features", rules.len(), nfeatures);
        Ok(rules)
    }
}

/// Equivalent-points minority estimator.
///
/// Samples with identical feature rows are captured by exactly the same
/// antecedents, so no rule list can separate them: within each such group the
/// samples of the smaller class (class one on ties) are misclassified by every
/// rule list. The returned record marks those samples.
#[derive(Debug, Default, Clone, Copy)]
pub struct EquivalentPoints;

impl BoundEstimator for EquivalentPoints {
    fn minority(&self, samples: &[Record], labels: &[Record; 2]) -> Result<Record> {
        let nsamples = samples.len();
        for (k, label) in labels.iter().enumerate() {
            if label.len() != nsamples {
                return Err(Error::Bound(format!(
                    "label {} covers {} samples, expected {}",
                    k,
                    label.len(),
                    nsamples
                )));
            }
        }

        // Group sample indices by feature row, keeping first-seen order.
        let mut groups: HashMap<&BitVec, usize> = HashMap::new();
        let mut members: Vec<Vec<usize>> = Vec::new();
        for (i, sample) in samples.iter().enumerate() {
            let g = *groups.entry(sample.truth()).or_insert_with(|| {
                members.push(Vec::new());
                members.len() - 1
            });
            members[g].push(i);
        }

        let ones = labels[Class::One.index()].truth();
        let mut minority = BitVec::zeros(nsamples);
        for group in &members {
            let num_ones = group.iter().filter(|&&i| ones.get(i)).count();
            let num_zeros = group.len() - num_ones;
            let minority_class = match Class::majority(num_zeros, num_ones) {
                Class::Zero => Class::One,
                Class::One => Class::Zero,
            };
            for &i in group {
                if Class::from(ones.get(i)) == minority_class {
                    minority.set(i, true);
                }
            }
        }

        debug!(
            "equivalent points: {} groups, {} minority samples",
            members.len(),
            minority.count_ones()
        );
        Ok(Record::raw(minority))
    }
}
