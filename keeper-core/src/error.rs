//! Error types shared by every keeper crate.

use std::path::PathBuf;

use thiserror::Error;

use crate::ledger::TransactionId;

/// Errors surfaced by the ledger store, the processor and the reports
#[derive(Error, Debug)]
pub enum KeeperError {
    /// A field could not be parsed; `line` is the 1-based CSV line when known
    #[error("parse error{}: {field} = {value:?}: {reason}", line_suffix(.line))]
    Parse {
        line: Option<u64>,
        field: &'static str,
        value: String,
        reason: String,
    },

    /// The categorization oracle failed
    #[error("oracle error: {0}")]
    Oracle(String),

    /// No processed row carries the requested id
    #[error("transaction not found: {id}")]
    NotFound { id: TransactionId },

    /// A report or view was requested before anything was processed
    #[error("nothing recorded yet: {} does not exist", .0.display())]
    StoreMissing(PathBuf),

    /// Invalid input from the caller
    #[error("validation error: {0}")]
    Validation(String),

    /// A running total or id left its representable range
    #[error("overflow: {0}")]
    Overflow(String),

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl KeeperError {
    pub fn parse(
        line: Option<u64>,
        field: &'static str,
        value: impl Into<String>,
        reason: impl ToString,
    ) -> Self {
        KeeperError::Parse {
            line,
            field,
            value: value.into(),
            reason: reason.to_string(),
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        KeeperError::Io {
            path: path.into(),
            source,
        }
    }

    /// True for the "nothing processed yet" condition callers render as an empty result
    pub fn is_store_missing(&self) -> bool {
        matches!(self, KeeperError::StoreMissing(_))
    }
}

pub type KeeperResult<T> = Result<T, KeeperError>;

fn line_suffix(line: &Option<u64>) -> String {
    match line {
        Some(l) => format!(" on line {l}"),
        None => String::new(),
    }
}
