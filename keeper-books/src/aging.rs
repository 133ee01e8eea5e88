//! Accounts payable / receivable aging.

use chrono::NaiveDate;
use keeper_core::{
    format_amount, AgingBucket, KeeperError, KeeperResult, LedgerType, ProcessedTransaction,
    DATE_FORMAT,
};
use keeper_store::{LedgerStore, SkippedRow};
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::fmt;

/// One open item in an aging report
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgingEntry {
    pub days_outstanding: i64,
    pub transaction: ProcessedTransaction,
}

#[derive(Debug, Clone)]
pub struct AgingReport {
    pub ledger_type: LedgerType,
    pub as_of: NaiveDate,
    /// Every bucket is present, possibly empty; entries keep ledger order
    pub buckets: BTreeMap<AgingBucket, Vec<AgingEntry>>,
    /// Rows left out because they could not be read
    pub skipped: Vec<SkippedRow>,
}

impl AgingReport {
    pub fn entries(&self, bucket: AgingBucket) -> &[AgingEntry] {
        self.buckets.get(&bucket).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn count(&self, bucket: AgingBucket) -> usize {
        self.entries(bucket).len()
    }

    /// Sum of the bucket's amounts, `None` when it leaves the decimal range
    pub fn total(&self, bucket: AgingBucket) -> Option<Decimal> {
        self.entries(bucket)
            .iter()
            .try_fold(Decimal::ZERO, |acc, e| acc.checked_add(e.transaction.amount))
    }

    pub fn open_items(&self) -> usize {
        self.buckets.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.open_items() == 0
    }
}

/// Bucket unpaid rows of `ledger_type` by days elapsed since their due date
pub fn generate_aging(
    processed: &[ProcessedTransaction],
    as_of: NaiveDate,
    ledger_type: LedgerType,
) -> KeeperResult<AgingReport> {
    if !ledger_type.is_open_item() {
        return Err(KeeperError::Validation(format!(
            "aging applies to payables and receivables, not {ledger_type}"
        )));
    }

    let mut buckets: BTreeMap<AgingBucket, Vec<AgingEntry>> =
        AgingBucket::ALL.iter().map(|b| (*b, Vec::new())).collect();

    for txn in processed
        .iter()
        .filter(|t| t.ledger_type == ledger_type && !t.is_paid())
    {
        let days = (as_of - txn.effective_due_date()).num_days();
        buckets
            .entry(AgingBucket::for_days(days))
            .or_default()
            .push(AgingEntry {
                days_outstanding: days,
                transaction: txn.clone(),
            });
    }

    Ok(AgingReport {
        ledger_type,
        as_of,
        buckets,
        skipped: Vec::new(),
    })
}

/// Aging report over the stored processed ledger; unreadable rows are skipped
pub fn aging_report(
    store: &LedgerStore,
    as_of: NaiveDate,
    ledger_type: LedgerType,
) -> KeeperResult<AgingReport> {
    let ledger = store.processed_for_report()?;
    let mut report = generate_aging(&ledger.rows, as_of, ledger_type)?;
    report.skipped = ledger.skipped;
    Ok(report)
}

impl fmt::Display for AgingReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "====== {} Aging Report (as of {}) ======",
            self.ledger_type,
            self.as_of.format(DATE_FORMAT)
        )?;
        for bucket in AgingBucket::ALL {
            let entries = self.entries(bucket);
            writeln!(
                f,
                "\n{bucket}: {} transaction(s), total {}",
                entries.len(),
                self.total(bucket)
                    .map(format_amount)
                    .unwrap_or_else(|| "out of range".to_string())
            )?;
            for e in entries {
                let t = &e.transaction;
                writeln!(
                    f,
                    "- [{}] {} | Due: {} | Amount: {} | {} day(s)",
                    t.id,
                    t.description,
                    t.effective_due_date().format(DATE_FORMAT),
                    format_amount(t.amount),
                    e.days_outstanding
                )?;
            }
        }
        if !self.skipped.is_empty() {
            writeln!(f, "\n{} unreadable row(s) skipped.", self.skipped.len())?;
        }
        Ok(())
    }
}
