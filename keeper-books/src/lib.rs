//! keeper-books: categorization oracle seam, transaction processor, aging reports and
//! payment updates on top of the ledger store

pub mod aging;
pub mod entry;
pub mod oracle;
pub mod payments;
pub mod processor;
pub mod rules;
pub mod status;

pub use aging::{aging_report, generate_aging, AgingEntry, AgingReport};
pub use entry::add_transaction;
pub use oracle::{categorization_prompt, Completion, Oracle, PromptOracle};
pub use payments::{list_unpaid, mark_paid, select_unpaid, UpdateResult};
pub use processor::{process, run_processing, ProcessingResult};
pub use rules::RuleOracle;
pub use status::{view_status, StatusView};
