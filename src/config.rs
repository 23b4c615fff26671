//! Search and mining configuration.

use std::fmt;
use std::ops::BitOr;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Frontier expansion order.
///
/// Every policy is a total order over frontier entries: ties on the policy
/// metric are broken by insertion order, earliest first.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Default)]
pub enum Policy {
    /// Shallowest prefix first.
    Bfs,
    /// Smallest curiosity first.
    Curious,
    /// Smallest lower bound first.
    #[default]
    LowerBound,
    /// Smallest objective first.
    Objective,
    /// Deepest prefix first.
    Dfs,
}

impl Policy {
    pub const ALL: [Policy; 5] = [
        Policy::Bfs,
        Policy::Curious,
        Policy::LowerBound,
        Policy::Objective,
        Policy::Dfs,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Policy::Bfs => "bfs",
            Policy::Curious => "curious",
            Policy::LowerBound => "lower_bound",
            Policy::Objective => "objective",
            Policy::Dfs => "dfs",
        }
    }
}

impl fmt::Display for Policy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Policy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Policy::ALL
            .into_iter()
            .find(|p| p.name() == s)
            .ok_or_else(|| {
                Error::Validation(format!(
                    "search policy must be one of [bfs, curious, lower_bound, objective, dfs], got: {}",
                    s
                ))
            })
    }
}

/// Symmetry-aware deduplication of prefixes.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Default)]
pub enum MapType {
    /// No deduplication.
    None,
    /// Prefixes with the same antecedent set are merged.
    #[default]
    Prefix,
    /// Prefixes capturing the same samples are merged.
    Captured,
}

impl MapType {
    pub const ALL: [MapType; 3] = [MapType::None, MapType::Prefix, MapType::Captured];

    pub fn name(self) -> &'static str {
        match self {
            MapType::None => "none",
            MapType::Prefix => "prefix",
            MapType::Captured => "captured",
        }
    }
}

impl fmt::Display for MapType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for MapType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        MapType::ALL
            .into_iter()
            .find(|m| m.name() == s)
            .ok_or_else(|| {
                Error::Validation(format!(
                    "map type must be one of [none, prefix, captured], got: {}",
                    s
                ))
            })
    }
}

/// Set of pruning bounds switched off for ablation runs.
///
/// Switching a bound off only changes how much of the tree is explored, never
/// the optimal objective.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Default)]
pub struct Ablation(u8);

impl Ablation {
    /// All bounds enabled.
    pub const NONE: Ablation = Ablation(0);
    /// Antecedent support and accurate antecedent support bounds.
    pub const SUPPORT: Ablation = Ablation(1);
    /// One-step lookahead bound.
    pub const LOOKAHEAD: Ablation = Ablation(2);
    /// Equivalent-points (minority) bound.
    pub const EQUIVALENT_POINTS: Ablation = Ablation(4);

    const MASK: u8 = 0b111;

    /// Creates an ablation set from raw bits.
    pub fn from_bits(bits: u8) -> Result<Self> {
        if bits & !Self::MASK != 0 {
            return Err(Error::Validation(format!(
                "ablation bits must be a subset of {:#05b}, got: {:#b}",
                Self::MASK,
                bits
            )));
        }
        Ok(Ablation(bits))
    }

    pub fn bits(self) -> u8 {
        self.0
    }

    /// Returns true if every bound in `other` is switched off.
    pub fn contains(self, other: Ablation) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for Ablation {
    type Output = Ablation;

    fn bitor(self, rhs: Self) -> Self::Output {
        Ablation(self.0 | rhs.0)
    }
}

/// Options of a search session.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchConfig {
    /// Regularization: the objective charges `c` per rule.
    pub c: f64,
    pub policy: Policy,
    pub map_type: MapType,
    /// Expanded nodes between progress lines; 0 disables them.
    pub log_frequency: usize,
    pub ablation: Ablation,
    /// Track memory usage of the search structures.
    pub size_tracking: bool,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            c: 0.01,
            policy: Policy::default(),
            map_type: MapType::default(),
            log_frequency: 0,
            ablation: Ablation::NONE,
            size_tracking: false,
        }
    }
}

impl SearchConfig {
    pub fn validate(&self) -> Result<()> {
        if !self.c.is_finite() || self.c < 0.0 {
            return Err(Error::Validation(format!(
                "regularization constant (c) must be finite and non-negative, got: {}",
                self.c
            )));
        }
        Ok(())
    }
}

/// Options of the antecedent miner.
#[derive(Debug, Clone, PartialEq)]
pub struct MineConfig {
    pub max_cardinality: usize,
    /// Minimum fraction of samples an antecedent must capture; `1 - min_support`
    /// is also the maximum.
    pub min_support: f64,
}

impl Default for MineConfig {
    fn default() -> Self {
        Self {
            max_cardinality: 2,
            min_support: 0.01,
        }
    }
}

impl MineConfig {
    pub fn validate(&self) -> Result<()> {
        if self.max_cardinality < 1 {
            return Err(Error::Validation(format!(
                "max cardinality must be at least 1, got: {}",
                self.max_cardinality
            )));
        }
        if !(0.0..=1.0).contains(&self.min_support) {
            return Err(Error::Validation(format!(
                "minimum support must be between 0.0 and 1.0, got: {}",
                self.min_support
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;

    #[test]
    fn test_policy_names() {
        for p in Policy::ALL {
            assert_eq!(p.name().parse::<Policy>().unwrap(), p);
        }
        assert!("best".parse::<Policy>().is_err());
        assert_eq!(Policy::default(), Policy::LowerBound);
    }

    #[test]
    fn test_map_type_names() {
        for m in MapType::ALL {
            assert_eq!(m.to_string().parse::<MapType>().unwrap(), m);
        }
        assert!("suffix".parse::<MapType>().is_err());
    }

    #[test]
    fn test_ablation_bits() {
        let a = Ablation::SUPPORT | Ablation::LOOKAHEAD;
        assert!(a.contains(Ablation::SUPPORT));
        assert!(a.contains(Ablation::LOOKAHEAD));
        assert!(!a.contains(Ablation::EQUIVALENT_POINTS));
        assert_eq!(Ablation::from_bits(2).unwrap(), Ablation::LOOKAHEAD);
        assert!(Ablation::from_bits(8).is_err());
        assert!(Ablation::NONE.contains(Ablation::NONE));
    }

    #[test]
    fn test_search_config_validate() {
        assert!(SearchConfig::default().validate().is_ok());
        for c in [-0.1, f64::NAN, f64::INFINITY] {
            let config = SearchConfig { c, ..Default::default() };
            assert!(matches!(config.validate(), Err(Error::Validation(_))));
        }
    }

    #[test]
    fn test_mine_config_validate() {
        assert!(MineConfig::default().validate().is_ok());
        let config = MineConfig { max_cardinality: 0, ..Default::default() };
        assert!(config.validate().is_err());
        let config = MineConfig { min_support: 1.5, ..Default::default() };
        assert!(config.validate().is_err());
        let config = MineConfig { min_support: f64::NAN, ..Default::default() };
        assert!(config.validate().is_err());
    }
}
