//! Bit-vector rule records.
//!
//! A [`Record`] is the atomic data unit shared by the encoder, the miner and
//! the search: a truth vector plus the metadata needed to name it. Raw sample
//! rows and label columns are records without members; mined antecedents also
//! carry the literals they are made of.

use std::fmt;

use crate::bitvec::BitVec;
use crate::types::Literal;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    truth: BitVec,
    label: Option<String>,
    cardinality: usize,
    members: Vec<Literal>,
    support: usize,
}

impl Record {
    /// A raw record (an encoded row or label column) with no member literals.
    pub fn raw(truth: BitVec) -> Self {
        let support = truth.count_ones();
        Self {
            truth,
            label: None,
            cardinality: 1,
            members: Vec::new(),
            support,
        }
    }

    /// A mined antecedent: the conjunction of `members`, true on `truth`.
    ///
    /// # Panics
    ///
    /// Panics if `members` is empty.
    pub fn antecedent(truth: BitVec, members: Vec<Literal>, label: Option<String>) -> Self {
        assert!(!members.is_empty(), "Antecedent must have at least one literal");
        let support = truth.count_ones();
        Self {
            truth,
            label,
            cardinality: members.len(),
            members,
            support,
        }
    }

    pub fn truth(&self) -> &BitVec {
        &self.truth
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    pub fn cardinality(&self) -> usize {
        self.cardinality
    }

    /// Literals conjoined into this record, in mining order.
    pub fn members(&self) -> &[Literal] {
        &self.members
    }

    /// Signed 1-based ids of the member literals.
    pub fn member_ids(&self) -> Vec<i32> {
        self.members.iter().map(|l| l.to_signed()).collect()
    }

    /// Number of set bits in the truth vector.
    pub fn support(&self) -> usize {
        self.support
    }

    /// Length of the truth vector.
    pub fn len(&self) -> usize {
        self.truth.len()
    }

    pub fn is_empty(&self) -> bool {
        self.truth.is_empty()
    }

    /// Approximate heap bytes held by the record.
    pub fn heap_size(&self) -> usize {
        self.truth.heap_size()
            + self.label.as_ref().map_or(0, |l| l.capacity())
            + self.members.capacity() * std::mem::size_of::<Literal>()
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (card={}, support={}/{})",
            self.label.as_deref().unwrap_or("<raw>"),
            self.cardinality,
            self.support,
            self.truth.len()
        )
    }
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;

    #[test]
    fn test_raw_record() {
        let r = Record::raw(BitVec::from_bools([true, false, true]));
        assert_eq!(r.support(), 2);
        assert_eq!(r.cardinality(), 1);
        assert!(r.members().is_empty());
        assert_eq!(r.label(), None);
        assert_eq!(r.len(), 3);
    }

    #[test]
    fn test_antecedent_record() {
        let r = Record::antecedent(
            BitVec::from_bools([false, true]),
            vec![Literal::positive(0), Literal::negative(2)],
            Some("a=1 && c=0".to_string()),
        );
        assert_eq!(r.cardinality(), 2);
        assert_eq!(r.member_ids(), vec![1, -3]);
        assert_eq!(r.support(), 1);
        assert_eq!(r.to_string(), "a=1 && c=0 (card=2, support=1/2)");
    }

    #[test]
    #[should_panic(expected = "at least one literal")]
    fn test_empty_antecedent_panics() {
        Record::antecedent(BitVec::zeros(2), vec![], None);
    }
}
