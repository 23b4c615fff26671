//! # corels-rs: Certifiably Optimal Rule Lists in Rust
//!
//! **`corels-rs`** learns ordered rule lists for binary classification over binary features,
//! with a branch-and-bound search that proves the returned list optimal for a regularized objective.
//!
//! ## What is a Rule List?
//!
//! A rule list is an `if / else if / ... / else` chain: each rule pairs an antecedent (a conjunction
//! of feature literals) with a predicted class, and the first rule whose antecedent holds decides.
//! A trailing default rule catches everything else.
//!
//! ```text
//! if [feature2]:               prediction = true
//! else if [not feature1 && feature3]: prediction = false
//! else:                        prediction = false
//! ```
//!
//! The search minimizes `errors / n + c * rules`, so `c` trades accuracy for brevity.
//!
//! ## Key Features
//!
//! - **Resumable Search**: [`Search`][crate::search::Search] runs in explicit `begin` / `advance` / `end` steps,
//!   so callers can budget the work and stop early with the best list found so far.
//! - **Packed Bit Vectors**: Support counting over samples is a popcount over 64-bit words ([`bitvec`]).
//! - **Sound Pruning**: Equivalent-points lower bound, antecedent support bounds, lookahead bound and
//!   symmetry-aware deduplication, each of which can be switched off for ablation runs.
//! - **Deterministic**: Ties are broken by insertion order and scores come from integer counts,
//!   so repeated runs return identical lists.
//!
//! ## Basic Usage
//!
//! ```rust
//! use corels_rs::classifier::Corels;
//! use corels_rs::types::Class;
//!
//! // Label equals the second feature.
//! let x = vec![vec![0u8, 0], vec![0, 1], vec![1, 0], vec![1, 1]];
//! let y = vec![0u8, 1, 0, 1];
//!
//! let corels = Corels {
//!     max_card: 1,
//!     min_support: 0.1,
//!     ..Corels::default()
//! };
//! let model = corels.fit(&x, &y, &[], "prediction").unwrap();
//!
//! // One rule on literal 2 (feature2 = 1) predicting 1, default 0.
//! println!("{}", model);
//! assert_eq!(model.predict(&x).unwrap(), vec![Class::Zero, Class::One, Class::Zero, Class::One]);
//! ```
//!
//! ## Core Components
//!
//! - **[`encode`]**, **[`pool`]**: Turn 0/1 matrices into records and mine the candidate antecedents.
//! - **[`search`]**: The branch-and-bound session.
//! - **[`rulelist`]**, **[`predict`]**: The extracted rule list, its text format and its evaluation.
//! - **[`classifier`]**: The high-level [`Corels`][crate::classifier::Corels] estimator.

pub mod bitvec;
pub mod classifier;
pub mod config;
pub mod encode;
pub mod error;
pub mod extract;
pub mod map;
pub mod mine;
pub mod pool;
pub mod predict;
pub mod queue;
pub mod record;
pub mod rulelist;
pub mod search;
pub mod space;
pub mod trie;
pub mod types;
