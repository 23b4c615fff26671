//! Candidate pool construction.
//!
//! A [`CandidatePool`] bundles everything a search session reads: the mined
//! antecedents, the two label records and the minority-bound record. It is
//! built once per training run and moved into the session, which owns it
//! until `end`.

use log::debug;

use crate::config::MineConfig;
use crate::error::{Error, Result};
use crate::mine::{BoundEstimator, EquivalentPoints, LevelwiseMiner, Miner};
use crate::record::Record;
use crate::types::{Class, RuleId};

#[derive(Debug, Clone)]
pub struct CandidatePool {
    rules: Vec<Record>,
    labels: [Record; 2],
    minority: Record,
    nfeatures: usize,
}

impl CandidatePool {
    /// Assembles a pool from already-built parts.
    ///
    /// Fails if any record does not cover the same samples as the labels.
    pub fn new(rules: Vec<Record>, labels: [Record; 2], minority: Record, nfeatures: usize) -> Result<Self> {
        let nsamples = labels[0].len();
        if labels[1].len() != nsamples {
            return Err(Error::Validation(format!(
                "label records cover {} and {} samples",
                nsamples,
                labels[1].len()
            )));
        }
        if minority.len() != nsamples {
            return Err(Error::Validation(format!(
                "minority record covers {} samples, labels cover {}",
                minority.len(),
                nsamples
            )));
        }
        if let Some((i, r)) = rules.iter().enumerate().find(|(_, r)| r.len() != nsamples) {
            return Err(Error::Validation(format!(
                "rule {} covers {} samples, labels cover {}",
                i,
                r.len(),
                nsamples
            )));
        }
        if let Some((i, r)) = rules.iter().enumerate().find(|(_, r)| r.members().is_empty()) {
            return Err(Error::Validation(format!("rule {} ({}) has no literals", i, r)));
        }
        Ok(Self {
            rules,
            labels,
            minority,
            nfeatures,
        })
    }

    pub fn rules(&self) -> &[Record] {
        &self.rules
    }

    pub fn rule(&self, id: RuleId) -> &Record {
        &self.rules[id.index()]
    }

    pub fn num_rules(&self) -> usize {
        self.rules.len()
    }

    pub fn label(&self, class: Class) -> &Record {
        &self.labels[class.index()]
    }

    pub fn labels(&self) -> &[Record; 2] {
        &self.labels
    }

    pub fn minority(&self) -> &Record {
        &self.minority
    }

    pub fn num_samples(&self) -> usize {
        self.labels[0].len()
    }

    pub fn num_features(&self) -> usize {
        self.nfeatures
    }

    /// Approximate heap bytes held by the pool.
    pub fn heap_size(&self) -> usize {
        self.rules.iter().map(Record::heap_size).sum::<usize>()
            + self.labels.iter().map(Record::heap_size).sum::<usize>()
            + self.minority.heap_size()
    }
}

/// Builds candidate pools through a [`Miner`] and a [`BoundEstimator`].
#[derive(Debug, Default, Clone)]
pub struct PoolBuilder<M = LevelwiseMiner, B = EquivalentPoints> {
    miner: M,
    bound: B,
}

impl PoolBuilder {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<M: Miner, B: BoundEstimator> PoolBuilder<M, B> {
    pub fn with(miner: M, bound: B) -> Self {
        Self { miner, bound }
    }

    /// Mines the antecedents and computes the minority bound.
    ///
    /// `nfeatures` is the width reported by the sample encoder; it must not
    /// exceed the number of feature names.
    pub fn build(
        &self,
        samples: &[Record],
        labels: [Record; 2],
        features: &[String],
        nfeatures: usize,
        config: &MineConfig,
    ) -> Result<CandidatePool> {
        config.validate()?;
        if nfeatures > features.len() {
            return Err(Error::Validation(format!(
                "{} features in the samples but only {} feature names",
                nfeatures,
                features.len()
            )));
        }
        if samples.is_empty() {
            return Err(Error::Validation("no samples to learn from".to_string()));
        }
        if let Some((i, s)) = samples.iter().enumerate().find(|(_, s)| s.len() != nfeatures) {
            return Err(Error::Validation(format!(
                "sample {} has {} features, expected {}",
                i,
                s.len(),
                nfeatures
            )));
        }

        let rules = self.miner.mine(
            samples,
            &labels,
            features,
            config.max_cardinality,
            config.min_support,
        )?;
        let minority = self.bound.minority(samples, &labels)?;
        debug!(
            "candidate pool: {} rules, {} samples, {} minority samples",
            rules.len(),
            samples.len(),
            minority.support()
        );

        CandidatePool::new(rules, labels, minority, nfeatures)
    }
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;
    use crate::bitvec::BitVec;
    use crate::encode::{encode_labels, encode_samples, one_hot};

    struct FailingMiner;

    impl Miner for FailingMiner {
        fn mine(&self, _: &[Record], _: &[Record; 2], _: &[String], _: usize, _: f64) -> Result<Vec<Record>> {
            Err(Error::Mining("out of memory".to_string()))
        }
    }

    struct FailingBound;

    impl BoundEstimator for FailingBound {
        fn minority(&self, _: &[Record], _: &[Record; 2]) -> Result<Record> {
            Err(Error::Bound("cannot group samples".to_string()))
        }
    }

    fn inputs() -> (Vec<Record>, [Record; 2], usize) {
        let x: Vec<Vec<u8>> = vec![vec![0, 0], vec![0, 1], vec![1, 0], vec![1, 1]];
        let (samples, nfeatures) = encode_samples(&x).unwrap();
        let labels = encode_labels(&one_hot(&[0, 1, 0, 1]).unwrap(), 4).unwrap();
        (samples, labels, nfeatures)
    }

    fn names(n: usize) -> Vec<String> {
        (1..=n).map(|i| format!("feature{}", i)).collect()
    }

    #[test]
    fn test_build() {
        let (samples, labels, nfeatures) = inputs();
        let config = MineConfig {
            max_cardinality: 1,
            min_support: 0.1,
        };
        let pool = PoolBuilder::new()
            .build(&samples, labels, &names(2), nfeatures, &config)
            .unwrap();
        assert_eq!(pool.num_rules(), 4);
        assert_eq!(pool.num_samples(), 4);
        assert_eq!(pool.num_features(), 2);
        assert_eq!(pool.label(Class::One).support(), 2);
        assert_eq!(pool.minority().support(), 0);
        assert_eq!(pool.rule(RuleId::new(2)).member_ids(), vec![2]);
    }

    #[test]
    fn test_build_too_few_names() {
        let (samples, labels, nfeatures) = inputs();
        let err = PoolBuilder::new()
            .build(&samples, labels, &names(1), nfeatures, &MineConfig::default())
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert!(err.to_string().contains("2 features in the samples but only 1"));
    }

    #[test]
    fn test_build_mining_failure() {
        let (samples, labels, nfeatures) = inputs();
        let err = PoolBuilder::with(FailingMiner, EquivalentPoints)
            .build(&samples, labels, &names(2), nfeatures, &MineConfig::default())
            .unwrap_err();
        assert!(matches!(err, Error::Mining(_)));
    }

    #[test]
    fn test_build_bound_failure() {
        let (samples, labels, nfeatures) = inputs();
        let err = PoolBuilder::with(LevelwiseMiner, FailingBound)
            .build(&samples, labels, &names(2), nfeatures, &MineConfig::default())
            .unwrap_err();
        assert!(matches!(err, Error::Bound(_)));
    }

    #[test]
    fn test_new_rejects_length_mismatch() {
        let labels = [Record::raw(BitVec::ones(2)), Record::raw(BitVec::zeros(2))];
        let rule = Record::antecedent(BitVec::ones(3), vec![crate::types::Literal::positive(0)], None);
        let err = CandidatePool::new(vec![rule], labels, Record::raw(BitVec::zeros(2)), 1).unwrap_err();
        assert!(err.to_string().contains("rule 0 covers 3 samples"));
    }
}
