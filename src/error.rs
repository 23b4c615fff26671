//! Error types for rule-list learning.

use std::collections::TryReserveError;
use std::io;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// Shape, type or range mismatch detected before any work begins.
    #[error("Validation error: {0}")]
    Validation(String),

    /// A matrix row could not be packed into a bit vector.
    #[error("Encoding error: {0}")]
    Encoding(String),

    /// The antecedent miner failed.
    #[error("Mining error: {0}")]
    Mining(String),

    /// The minority-bound estimator failed.
    #[error("Bound error: {0}")]
    Bound(String),

    /// Search structures could not be sized.
    #[error("Allocation error: cannot reserve {what} for {requested} entries")]
    Allocation {
        what: &'static str,
        requested: usize,
        #[source]
        source: TryReserveError,
    },

    /// Malformed serialized rule list or model.
    #[error("Format error at line {line}: {message}")]
    Format { line: usize, message: String },

    /// `advance` or `end` called with no session open.
    #[error("No active search session")]
    InactiveSession,

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
