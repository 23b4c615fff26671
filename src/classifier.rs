//! High-level estimator: fit a rule list on a 0/1 matrix, predict, score,
//! save and load.
//!
//! ```
//! use corels_rs::classifier::Corels;
//!
//! let x = vec![vec![0u8, 0], vec![0, 1], vec![1, 0], vec![1, 1]];
//! let y = vec![0u8, 1, 0, 1];
//! let corels = Corels {
//!     max_card: 1,
//!     min_support: 0.1,
//!     verbosity: vec![],
//!     ..Corels::default()
//! };
//! let model = corels.fit(&x, &y, &[], "prediction").unwrap();
//! assert_eq!(model.rule_list().rules()[0].antecedent_ids(), vec![2]);
//! assert_eq!(model.score(&x, &y).unwrap(), 1.0);
//! ```

use std::fmt;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;
use std::str::FromStr;

use log::{debug, info};

use crate::config::{Ablation, MapType, MineConfig, Policy, SearchConfig};
use crate::encode::{encode_labels, encode_samples, one_hot};
use crate::error::{Error, Result};
use crate::pool::{CandidatePool, PoolBuilder};
use crate::predict::{accuracy, predict};
use crate::rulelist::RuleList;
use crate::search::{Search, SearchStats};
use crate::types::{Class, Literal};

/// Expanded nodes between progress lines under [`Verbosity::Progress`].
pub const PROGRESS_FREQUENCY: usize = 1000;

/// What `fit` reports through the log.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Verbosity {
    /// A summary line per mined rule.
    Rule,
    /// A summary line per class label.
    Label,
    /// Full truth vectors of the rules and/or labels.
    Samples,
    /// Periodic search progress.
    Progress,
    /// Run configuration and final statistics.
    Log,
    /// `Progress`, `Log`, `Label` and `Rule` together.
    Loud,
}

impl Verbosity {
    pub const ALL: [Verbosity; 6] = [
        Verbosity::Rule,
        Verbosity::Label,
        Verbosity::Samples,
        Verbosity::Progress,
        Verbosity::Log,
        Verbosity::Loud,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Verbosity::Rule => "rule",
            Verbosity::Label => "label",
            Verbosity::Samples => "samples",
            Verbosity::Progress => "progress",
            Verbosity::Log => "log",
            Verbosity::Loud => "loud",
        }
    }
}

impl fmt::Display for Verbosity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Verbosity {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Verbosity::ALL
            .into_iter()
            .find(|v| v.name() == s)
            .ok_or_else(|| {
                let names: Vec<_> = Verbosity::ALL.iter().map(|v| v.name()).collect();
                Error::Validation(format!("unknown verbosity {:?}, expected one of: {}", s, names.join(", ")))
            })
    }
}

/// Options of a training run.
#[derive(Debug, Clone, PartialEq)]
pub struct Corels {
    /// Regularization, in `[0, 1]`: the objective charges `c` per rule.
    pub c: f64,
    /// Cap on live search-tree nodes before the search stops early.
    pub n_iter: usize,
    pub map_type: MapType,
    pub policy: Policy,
    pub verbosity: Vec<Verbosity>,
    pub ablation: Ablation,
    /// Maximum number of literals per mined antecedent.
    pub max_card: usize,
    /// Minimum fraction of samples a mined antecedent must capture;
    /// `1 - min_support` is the maximum.
    pub min_support: f64,
}

impl Default for Corels {
    fn default() -> Self {
        Self {
            c: 0.01,
            n_iter: 10000,
            map_type: MapType::Prefix,
            policy: Policy::LowerBound,
            verbosity: vec![Verbosity::Progress],
            ablation: Ablation::NONE,
            max_card: 2,
            min_support: 0.01,
        }
    }
}

impl Corels {
    fn verbose(&self, v: Verbosity) -> bool {
        self.verbosity.contains(&v)
            || (self.verbosity.contains(&Verbosity::Loud) && v != Verbosity::Samples)
    }

    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.c) {
            return Err(Error::Validation(format!(
                "regularization constant (c) must be between 0.0 and 1.0, got: {}",
                self.c
            )));
        }
        if self.verbosity.contains(&Verbosity::Samples)
            && !self.verbose(Verbosity::Rule)
            && !self.verbose(Verbosity::Label)
        {
            return Err(Error::Validation(
                "'samples' verbosity must be combined with 'rule' or 'label'".to_string(),
            ));
        }
        self.mine_config().validate()?;
        self.search_config().validate()
    }

    fn mine_config(&self) -> MineConfig {
        MineConfig {
            max_cardinality: self.max_card,
            min_support: self.min_support,
        }
    }

    fn search_config(&self) -> SearchConfig {
        SearchConfig {
            c: self.c,
            policy: self.policy,
            map_type: self.map_type,
            log_frequency: if self.verbose(Verbosity::Progress) {
                PROGRESS_FREQUENCY
            } else {
                0
            },
            ablation: self.ablation,
            size_tracking: false,
        }
    }

    fn log_pool(&self, pool: &CandidatePool) {
        let samples = self.verbosity.contains(&Verbosity::Samples);
        if self.verbose(Verbosity::Label) {
            for class in Class::ALL {
                let label = pool.label(class);
                debug!("label {}: support {}/{}", class, label.support(), label.len());
                if samples {
                    debug!("label {} samples: {:?}", class, label.truth());
                }
            }
            debug!("minority: support {}/{}", pool.minority().support(), pool.minority().len());
        }
        if self.verbose(Verbosity::Rule) {
            for (i, rule) in pool.rules().iter().enumerate() {
                debug!("rule {}: {}", i, rule);
                if samples {
                    debug!("rule {} samples: {:?}", i, rule.truth());
                }
            }
        }
    }

    /// Learns a rule list from `samples` and 0/1 `labels`.
    ///
    /// An empty `features` list names the features `feature1..featureN`;
    /// otherwise it must name every column.
    pub fn fit<R: AsRef<[u8]>>(
        &self,
        samples: &[R],
        labels: &[u8],
        features: &[String],
        prediction_name: &str,
    ) -> Result<Model> {
        self.validate()?;
        if samples.len() != labels.len() {
            return Err(Error::Validation(format!(
                "{} samples but {} labels",
                samples.len(),
                labels.len()
            )));
        }

        let (records, nfeatures) = encode_samples(samples)?;
        let label_records = encode_labels(&one_hot(labels)?, records.len())?;

        let features: Vec<String> = if features.is_empty() {
            (1..=nfeatures).map(|i| format!("feature{}", i)).collect()
        } else if features.len() != nfeatures {
            return Err(Error::Validation(format!(
                "feature count mismatch between sample data ({}) and feature names ({})",
                nfeatures,
                features.len()
            )));
        } else {
            features.to_vec()
        };

        let pool = PoolBuilder::new().build(&records, label_records, &features, nfeatures, &self.mine_config())?;
        self.log_pool(&pool);
        if self.verbose(Verbosity::Log) {
            info!(
                "fitting: {} samples, {} features, {} rules, {:?}",
                pool.num_samples(),
                nfeatures,
                pool.num_rules(),
                self
            );
        }

        let mut search = Search::new();
        search.begin(self.search_config(), pool)?;
        while search.num_nodes().is_some_and(|n| n < self.n_iter) && search.advance(1)? {}
        let stats = search.stats().cloned().unwrap_or_default();
        let (objective, rule_list) = search.end()?;
        if self.verbose(Verbosity::Log) {
            info!("final objective {:.6}, {:?}", objective, stats);
        }

        Ok(Model {
            rule_list,
            features,
            prediction_name: prediction_name.to_string(),
            objective: Some(objective),
            stats: Some(stats),
        })
    }
}

/// A fitted rule list with the names needed to read it.
#[derive(Debug, Clone, PartialEq)]
pub struct Model {
    rule_list: RuleList,
    features: Vec<String>,
    prediction_name: String,
    objective: Option<f64>,
    stats: Option<SearchStats>,
}

impl Model {
    /// Wraps an existing rule list.
    ///
    /// Fails if the names do not match the list's features.
    pub fn new(rule_list: RuleList, features: Vec<String>, prediction_name: String) -> Result<Self> {
        if features.len() != rule_list.feature_count() {
            return Err(Error::Validation(format!(
                "rule list has {} features but {} feature names were given",
                rule_list.feature_count(),
                features.len()
            )));
        }
        for (i, rule) in rule_list.antecedent_rules().iter().enumerate() {
            if let Some(lit) = rule.antecedent().iter().find(|l| l.feature() >= features.len()) {
                return Err(Error::Validation(format!(
                    "rule {} uses literal {} but there are only {} features",
                    i,
                    lit,
                    features.len()
                )));
            }
        }
        Ok(Self {
            rule_list,
            features,
            prediction_name,
            objective: None,
            stats: None,
        })
    }

    pub fn rule_list(&self) -> &RuleList {
        &self.rule_list
    }

    pub fn features(&self) -> &[String] {
        &self.features
    }

    pub fn prediction_name(&self) -> &str {
        &self.prediction_name
    }

    /// Training objective, for models produced by `fit`.
    pub fn objective(&self) -> Option<f64> {
        self.objective
    }

    pub fn stats(&self) -> Option<&SearchStats> {
        self.stats.as_ref()
    }

    pub fn predict<R: AsRef<[u8]> + Sync>(&self, samples: &[R]) -> Result<Vec<Class>> {
        if let Some(row) = samples.first() {
            let width = row.as_ref().len();
            if width != self.features.len() {
                return Err(Error::Validation(format!(
                    "feature count mismatch between eval data ({}) and feature names ({})",
                    width,
                    self.features.len()
                )));
            }
        }
        predict(samples, self.features.len(), &self.rule_list)
    }

    /// Accuracy of the model on `samples` against 0/1 `labels`.
    pub fn score<R: AsRef<[u8]> + Sync>(&self, samples: &[R], labels: &[u8]) -> Result<f64> {
        if samples.len() != labels.len() {
            return Err(Error::Validation(format!(
                "{} samples but {} labels",
                samples.len(),
                labels.len()
            )));
        }
        let labels = labels
            .iter()
            .enumerate()
            .map(|(i, &y)| {
                Class::from_index(y as usize)
                    .ok_or_else(|| Error::Validation(format!("label {}: value {} is not binary", i, y)))
            })
            .collect::<Result<Vec<_>>>()?;
        accuracy(&self.predict(samples)?, &labels)
    }

    /// Writes the model as text: the prediction name, one line per feature
    /// name, then the rule list.
    pub fn write_to<W: Write>(&self, mut w: W) -> Result<()> {
        writeln!(w, "prediction {}", self.prediction_name)?;
        for name in &self.features {
            writeln!(w, "feature {}", name)?;
        }
        write!(w, "{}", self.rule_list)?;
        w.flush()?;
        Ok(())
    }

    pub fn read_from<R: Read>(mut r: R) -> Result<Self> {
        let mut text = String::new();
        r.read_to_string(&mut text)?;

        let mut prediction_name = None;
        let mut features = Vec::new();
        let mut offset = text.lines().count();
        for (i, line) in text.lines().enumerate() {
            if let Some(name) = line.strip_prefix("prediction ") {
                if prediction_name.replace(name.to_string()).is_some() {
                    return Err(Error::Format {
                        line: i + 1,
                        message: "duplicate prediction name".to_string(),
                    });
                }
            } else if let Some(name) = line.strip_prefix("feature ") {
                features.push(name.to_string());
            } else if line.trim().is_empty() || line.starts_with('#') {
                // skip
            } else {
                offset = i;
                break;
            }
        }
        let prediction_name = prediction_name.ok_or_else(|| Error::Format {
            line: 0,
            message: "missing prediction name".to_string(),
        })?;

        let rest: String = text.lines().skip(offset).map(|l| format!("{}\n", l)).collect();
        let rule_list = rest.parse::<RuleList>().map_err(|e| match e {
            Error::Format { line, message } if line > 0 => Error::Format {
                line: line + offset,
                message,
            },
            e => e,
        })?;
        Model::new(rule_list, features, prediction_name)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = File::create(path)?;
        self.write_to(BufWriter::new(file))
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        Self::read_from(BufReader::new(file))
    }

    fn literal_name(&self, lit: Literal) -> String {
        let name = self
            .features
            .get(lit.feature())
            .cloned()
            .unwrap_or_else(|| format!("feature{}", lit.feature() + 1));
        if lit.is_positive() {
            name
        } else {
            format!("not {}", name)
        }
    }
}

impl fmt::Display for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "RULELIST:")?;
        for (i, rule) in self.rule_list.antecedent_rules().iter().enumerate() {
            let condition: Vec<_> = rule.antecedent().iter().map(|&l| self.literal_name(l)).collect();
            let keyword = if i == 0 { "if" } else { "else if" };
            writeln!(f, "{} [{}]:", keyword, condition.join(" && "))?;
            writeln!(f, "  {} = {}", self.prediction_name, bool::from(rule.prediction()))?;
        }
        if self.rule_list.is_empty() {
            write!(f, "{} = {}", self.prediction_name, bool::from(self.rule_list.default_class()))
        } else {
            writeln!(f, "else")?;
            write!(f, "  {} = {}", self.prediction_name, bool::from(self.rule_list.default_class()))
        }
    }
}
