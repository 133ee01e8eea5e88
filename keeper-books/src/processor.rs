//! The transaction processor: categorize unseen raw transactions, classify them into
//! ledger types and fold the per-month totals into the running summary.

use keeper_core::{
    format_amount, sanitize_label, ClassificationPolicy, KeeperError, KeeperResult, Month,
    MonthTotals, ProcessedTransaction, RawTransaction, Summary, TransactionId,
};
use keeper_store::LedgerStore;
use log::{debug, info};
use std::collections::{BTreeMap, HashSet};
use std::fmt;

use crate::oracle::Oracle;

/// Outcome of one processing run
#[derive(Debug, Clone, Default)]
pub struct ProcessingResult {
    /// Newly processed rows, in raw ledger order
    pub processed: Vec<ProcessedTransaction>,
    /// Raw rows skipped because their id was already processed
    pub skipped: usize,
    /// Totals contributed by this run, per month
    pub deltas: BTreeMap<Month, MonthTotals>,
    /// Summary after merging `deltas`
    pub summary: Summary,
}

impl ProcessingResult {
    pub fn is_noop(&self) -> bool {
        self.processed.is_empty()
    }
}

/// Categorize every raw transaction not yet in `processed` and merge the totals.
///
/// Pure apart from the oracle calls; the caller persists the result. Any oracle
/// failure aborts the run before anything is returned.
pub fn process<O: Oracle + ?Sized>(
    raw: &[RawTransaction],
    processed: &[ProcessedTransaction],
    summary: &Summary,
    oracle: &O,
    policy: &ClassificationPolicy,
) -> KeeperResult<ProcessingResult> {
    let mut seen: HashSet<TransactionId> = processed.iter().map(|t| t.id).collect();
    let mut result = ProcessingResult {
        summary: summary.clone(),
        ..Default::default()
    };

    for txn in raw {
        if !seen.insert(txn.id) {
            result.skipped += 1;
            continue;
        }

        let response = oracle.classify(&txn.description, txn.amount)?;
        let category = sanitize_label(&response);
        let ledger_type = policy.classify(&category, txn.amount);
        debug!(
            "txn {} {:?} {} -> {category} ({ledger_type})",
            txn.id,
            txn.description,
            format_amount(txn.amount)
        );

        result
            .deltas
            .entry(txn.month())
            .or_default()
            .add(ledger_type, txn.amount)?;
        result
            .processed
            .push(ProcessedTransaction::from_raw(txn, category, ledger_type));
    }

    for (month, delta) in &result.deltas {
        if delta.net_income().is_none() {
            return Err(KeeperError::Overflow(format!("{month} net income")));
        }
    }
    result.summary.merge(&result.deltas)?;
    Ok(result)
}

/// Load the store, process, append the new rows and rewrite the summary
pub fn run_processing<O: Oracle + ?Sized>(
    store: &LedgerStore,
    oracle: &O,
    policy: &ClassificationPolicy,
) -> KeeperResult<ProcessingResult> {
    let raw = store.raw_transactions()?;
    let processed = store.processed_transactions()?;
    let summary = store.summary()?;

    let result = process(&raw, &processed, &summary, oracle, policy)?;

    store.append_processed(&result.processed)?;
    if !result.deltas.is_empty() || !store.paths().summary.exists() {
        store.write_summary(&result.summary)?;
    }
    info!(
        "processed {} new transaction(s), {} already processed",
        result.processed.len(),
        result.skipped
    );
    Ok(result)
}

impl fmt::Display for ProcessingResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Processed {} new transaction(s) ({} already processed).",
            self.processed.len(),
            self.skipped
        )?;
        if self.deltas.is_empty() {
            return Ok(());
        }
        writeln!(f, "\n====== Monthly Totals (this run) ======")?;
        for (month, t) in &self.deltas {
            writeln!(f, "\n{month}:")?;
            writeln!(f, "  Accounts Payable:    {:>12}", format_amount(t.accounts_payable))?;
            writeln!(f, "  Accounts Receivable: {:>12}", format_amount(t.accounts_receivable))?;
            writeln!(f, "  Revenue:             {:>12}", format_amount(t.revenue))?;
            writeln!(f, "  Expenses:            {:>12}", format_amount(t.expenses))?;
            writeln!(f, "  Net Income:          {:>12}", t.net_income().map(format_amount).unwrap_or_default())?;
        }
        Ok(())
    }
}
