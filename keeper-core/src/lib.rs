//! keeper-core: ledger types, money and month helpers, and the classification policy

pub mod aging;
pub mod classify;
pub mod error;
pub mod ledger;
pub mod money;
pub mod month;
pub mod summary;

pub use aging::AgingBucket;
pub use classify::{sanitize_label, title_case, ClassificationPolicy, UNCATEGORIZED};
pub use error::{KeeperError, KeeperResult};
pub use ledger::{
    LedgerType, PaymentStatus, ProcessedTransaction, RawTransaction, TransactionId,
};
pub use money::{format_amount, parse_amount};
pub use month::Month;
pub use summary::{MonthTotals, MonthlySummary, Summary};

/// Date format used by every ledger file.
pub const DATE_FORMAT: &str = "%Y-%m-%d";
