//! Extracted rule lists and their text format.
//!
//! A [`RuleList`] is the only artifact that outlives a search session. It is
//! self-contained: every antecedent is a copy of the literals that formed the
//! mined rule.
//!
//! # Text Format
//!
//! ```text
//! rulelist <nfeatures> <nrules>
//! <k> <lit_1> ... <lit_k> <class>   # one line per rule, signed 1-based literal ids
//! ...
//! default <class>
//! ```
//!
//! Blank lines and lines starting with `#` are ignored.

use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::types::{Class, Literal};

/// One `if antecedent then class` rule.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Rule {
    antecedent: Vec<Literal>,
    prediction: Class,
}

impl Rule {
    pub fn new(antecedent: Vec<Literal>, prediction: Class) -> Self {
        Self { antecedent, prediction }
    }

    /// Literals that must all hold for the rule to fire. Empty for the
    /// default rule.
    pub fn antecedent(&self) -> &[Literal] {
        &self.antecedent
    }

    pub fn antecedent_ids(&self) -> Vec<i32> {
        self.antecedent.iter().map(|l| l.to_signed()).collect()
    }

    pub fn prediction(&self) -> Class {
        self.prediction
    }

    pub fn is_default(&self) -> bool {
        self.antecedent.is_empty()
    }

    /// Returns true if every literal holds on `row`.
    ///
    /// A literal over a feature the row does not have never holds, so the rule
    /// does not fire.
    pub fn matches(&self, row: &[u8]) -> bool {
        self.antecedent.iter().all(|lit| match row.get(lit.feature()) {
            Some(&value) => lit.holds(value == 1),
            None => false,
        })
    }
}

/// An ordered first-match-wins rule list, terminated by a default rule.
///
/// # Invariants
///
/// - The last rule is the default rule (empty antecedent)
/// - Every other rule has a non-empty antecedent
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RuleList {
    rules: Vec<Rule>,
    nfeatures: usize,
}

impl RuleList {
    /// Builds a rule list from non-default rules and the default class.
    pub fn new(rules: Vec<Rule>, default: Class, nfeatures: usize) -> Result<Self> {
        if let Some(i) = rules.iter().position(Rule::is_default) {
            return Err(Error::Validation(format!("rule {} has an empty antecedent", i)));
        }
        let mut rules = rules;
        rules.push(Rule::new(Vec::new(), default));
        Ok(Self { rules, nfeatures })
    }

    /// Appends the default rule to `rules`, which must all be non-default.
    pub(crate) fn assemble(mut rules: Vec<Rule>, default: Class, nfeatures: usize) -> Self {
        debug_assert!(rules.iter().all(|r| !r.is_default()));
        rules.push(Rule::new(Vec::new(), default));
        Self { rules, nfeatures }
    }

    /// A list with only the default rule.
    pub fn trivial(default: Class, nfeatures: usize) -> Self {
        Self {
            rules: vec![Rule::new(Vec::new(), default)],
            nfeatures,
        }
    }

    /// All rules, the default rule last.
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Rules before the default rule.
    pub fn antecedent_rules(&self) -> &[Rule] {
        &self.rules[..self.rules.len() - 1]
    }

    pub fn default_class(&self) -> Class {
        self.rules[self.rules.len() - 1].prediction
    }

    /// Number of non-default rules.
    pub fn len(&self) -> usize {
        self.rules.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of features the list was learned on.
    pub fn feature_count(&self) -> usize {
        self.nfeatures
    }

    /// Stored feature length: one slot per feature plus one for the default
    /// rule placeholder.
    pub fn feature_slots(&self) -> usize {
        self.nfeatures + 1
    }

    /// Classifies one sample row: the first matching rule wins.
    pub fn predict_row(&self, row: &[u8]) -> Class {
        self.rules
            .iter()
            .find(|rule| rule.matches(row))
            .map_or_else(|| self.default_class(), |rule| rule.prediction)
    }
}

impl fmt::Display for RuleList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "rulelist {} {}", self.nfeatures, self.len())?;
        for rule in self.antecedent_rules() {
            write!(f, "{}", rule.antecedent.len())?;
            for lit in &rule.antecedent {
                write!(f, " {}", lit)?;
            }
            writeln!(f, " {}", rule.prediction)?;
        }
        writeln!(f, "default {}", self.default_class())
    }
}

fn parse_error(line: usize, message: impl Into<String>) -> Error {
    Error::Format {
        line,
        message: message.into(),
    }
}

fn parse_num<T: FromStr>(line: usize, token: Option<&str>, what: &str) -> Result<T> {
    let token = token.ok_or_else(|| parse_error(line, format!("missing {}", what)))?;
    token
        .parse()
        .map_err(|_| parse_error(line, format!("invalid {}: {:?}", what, token)))
}

fn parse_class(line: usize, token: Option<&str>) -> Result<Class> {
    let index: usize = parse_num(line, token, "class")?;
    Class::from_index(index).ok_or_else(|| parse_error(line, format!("class must be 0 or 1, got {}", index)))
}

impl FromStr for RuleList {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let mut lines = s
            .lines()
            .enumerate()
            .map(|(i, l)| (i + 1, l.trim()))
            .filter(|(_, l)| !l.is_empty() && !l.starts_with('#'));

        let (lineno, header) = lines.next().ok_or_else(|| parse_error(0, "empty input"))?;
        let mut tokens = header.split_whitespace();
        if tokens.next() != Some("rulelist") {
            return Err(parse_error(lineno, "expected 'rulelist' header"));
        }
        let nfeatures: usize = parse_num(lineno, tokens.next(), "feature count")?;
        let nrules: usize = parse_num(lineno, tokens.next(), "rule count")?;

        let mut rules = Vec::new();
        for _ in 0..nrules {
            let (lineno, line) = lines
                .next()
                .ok_or_else(|| parse_error(0, format!("expected {} rules, got {}", nrules, rules.len())))?;
            let mut tokens = line.split_whitespace();
            let k: usize = parse_num(lineno, tokens.next(), "literal count")?;
            if k == 0 {
                return Err(parse_error(lineno, "rule with no literals"));
            }
            let antecedent = (0..k)
                .map(|_| {
                    let id: i32 = parse_num(lineno, tokens.next(), "literal")?;
                    Literal::from_signed(id)
                        .ok_or_else(|| parse_error(lineno, format!("invalid literal id {}", id)))
                })
                .collect::<Result<Vec<_>>>()?;
            let prediction = parse_class(lineno, tokens.next())?;
            if tokens.next().is_some() {
                return Err(parse_error(lineno, "trailing tokens after rule"));
            }
            rules.push(Rule::new(antecedent, prediction));
        }

        let (lineno, line) = lines.next().ok_or_else(|| parse_error(0, "missing default rule"))?;
        let mut tokens = line.split_whitespace();
        if tokens.next() != Some("default") {
            return Err(parse_error(lineno, "expected 'default' line"));
        }
        let default = parse_class(lineno, tokens.next())?;
        if let Some((lineno, _)) = lines.next() {
            return Err(parse_error(lineno, "unexpected content after default rule"));
        }

        RuleList::new(rules, default, nfeatures)
    }
}
