//! Type-safe wrappers for literals, classes and rule indices.
//!
//! Literals travel on the wire as signed 1-based ids (`k` asserts feature
//! `k-1`, `-k` negates it), but are kept internally as an explicit
//! `(feature, polarity)` pair so that the zero boundary never needs special
//! casing.

use std::fmt;
use std::ops::Neg;

/// A feature literal: a 0-based feature index plus a polarity.
///
/// # Invariants
///
/// - The signed id of a literal is never 0
/// - `Literal::from_signed(l.to_signed()) == Some(l)`
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Literal {
    feature: u32,
    positive: bool,
}

impl Literal {
    /// Largest feature index whose signed id fits in an `i32`.
    pub const MAX_FEATURE: u32 = i32::MAX as u32 - 1;

    /// Literal asserting that `feature` is 1.
    ///
    /// Panics if `feature` exceeds [`Literal::MAX_FEATURE`].
    pub const fn positive(feature: u32) -> Self {
        assert!(feature <= Self::MAX_FEATURE, "feature index out of range");
        Self { feature, positive: true }
    }

    /// Literal asserting that `feature` is 0.
    ///
    /// Panics if `feature` exceeds [`Literal::MAX_FEATURE`].
    pub const fn negative(feature: u32) -> Self {
        assert!(feature <= Self::MAX_FEATURE, "feature index out of range");
        Self { feature, positive: false }
    }

    /// Creates a literal from its signed 1-based id.
    ///
    /// Returns `None` for 0 and for `i32::MIN`, whose magnitude has no
    /// positive counterpart.
    pub fn from_signed(id: i32) -> Option<Self> {
        if id == 0 || id == i32::MIN {
            return None;
        }
        let feature = id.unsigned_abs() - 1;
        Some(Self {
            feature,
            positive: id > 0,
        })
    }

    /// Returns the signed 1-based id.
    pub fn to_signed(self) -> i32 {
        let id = self.feature as i32 + 1;
        if self.positive {
            id
        } else {
            -id
        }
    }

    /// Returns the 0-based feature index.
    pub const fn feature(self) -> usize {
        self.feature as usize
    }

    pub const fn is_positive(self) -> bool {
        self.positive
    }

    /// Evaluates the literal against one feature value.
    #[inline]
    pub fn holds(self, value: bool) -> bool {
        value == self.positive
    }
}

impl Neg for Literal {
    type Output = Self;

    fn neg(self) -> Self::Output {
        Self {
            feature: self.feature,
            positive: !self.positive,
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_signed())
    }
}

/// A binary class label.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Default)]
pub enum Class {
    #[default]
    Zero,
    One,
}

impl Class {
    /// Both classes, in index order.
    pub const ALL: [Class; 2] = [Class::Zero, Class::One];

    pub const fn index(self) -> usize {
        match self {
            Class::Zero => 0,
            Class::One => 1,
        }
    }

    /// Creates a class from `0` or `1`.
    pub fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(Class::Zero),
            1 => Some(Class::One),
            _ => None,
        }
    }

    /// Picks the majority class given per-class counts. Ties go to [`Class::Zero`].
    pub fn majority(zeros: usize, ones: usize) -> Self {
        if ones > zeros {
            Class::One
        } else {
            Class::Zero
        }
    }
}

impl From<bool> for Class {
    fn from(value: bool) -> Self {
        if value {
            Class::One
        } else {
            Class::Zero
        }
    }
}

impl From<Class> for bool {
    fn from(class: Class) -> Self {
        class == Class::One
    }
}

impl fmt::Display for Class {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.index())
    }
}

/// Index of an antecedent in a candidate pool (0-based).
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct RuleId(u32);

impl RuleId {
    pub fn new(index: usize) -> Self {
        assert!(index <= u32::MAX as usize, "Rule index {} does not fit in u32", index);
        RuleId(index as u32)
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for RuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "r{}", self.0)
    }
}
