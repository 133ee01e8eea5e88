//! keeper-store: the CSV-backed ledger store.
//!
//! Three files live in one data directory:
//! - `transactions.csv`: raw entries, appended by `add`
//! - `processed_transactions.csv`: categorized entries, appended by processing runs
//! - `monthly_summary.csv`: one row per month, rewritten atomically after each run
//!
//! Older files without `transaction_id`, `due_date` or `payment_status` columns are
//! migrated the first time they are read.

pub mod file_io;
pub mod payment;
pub mod processed;
pub mod raw;
pub mod rows;
pub mod summary;

use std::path::{Path, PathBuf};

pub use file_io::{CsvTable, TableRow};
pub use payment::MarkPaidOutcome;
pub use processed::{ReportLedger, SkippedRow};

pub const RAW_FILE: &str = "transactions.csv";
pub const PROCESSED_FILE: &str = "processed_transactions.csv";
pub const SUMMARY_FILE: &str = "monthly_summary.csv";

/// Locations of the three ledger files
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorePaths {
    pub raw: PathBuf,
    pub processed: PathBuf,
    pub summary: PathBuf,
}

impl StorePaths {
    /// Default file names inside `dir`
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            raw: dir.join(RAW_FILE),
            processed: dir.join(PROCESSED_FILE),
            summary: dir.join(SUMMARY_FILE),
        }
    }
}

/// Read/append access to the ledger files.
///
/// Holds no cached records; every call re-reads from disk.
#[derive(Debug, Clone)]
pub struct LedgerStore {
    paths: StorePaths,
}

impl LedgerStore {
    pub fn new(paths: StorePaths) -> Self {
        Self { paths }
    }

    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        Self::new(StorePaths::in_dir(dir))
    }

    pub fn paths(&self) -> &StorePaths {
        &self.paths
    }
}
