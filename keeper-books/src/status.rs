//! Status view: the monthly summary plus ledger counts.

use keeper_core::{format_amount, KeeperResult, LedgerType, Summary, TransactionId};
use keeper_store::LedgerStore;
use std::collections::HashSet;
use std::fmt;

#[derive(Debug, Clone)]
pub struct StatusView {
    pub summary: Summary,
    pub raw_count: usize,
    pub processed_count: usize,
    /// Raw transactions not yet processed
    pub pending: usize,
    pub unpaid_payables: usize,
    pub unpaid_receivables: usize,
}

/// Build the status view; `StoreMissing` before the first processing run
pub fn view_status(store: &LedgerStore) -> KeeperResult<StatusView> {
    let summary = store.require_summary()?;
    let raw = store.raw_transactions()?;
    let processed = store.processed_transactions()?;

    let done: HashSet<TransactionId> = processed.iter().map(|t| t.id).collect();
    let pending = raw
        .iter()
        .map(|t| t.id)
        .collect::<HashSet<_>>()
        .difference(&done)
        .count();
    let unpaid = |ty: LedgerType| {
        processed
            .iter()
            .filter(|t| t.ledger_type == ty && !t.is_paid())
            .count()
    };

    Ok(StatusView {
        raw_count: raw.len(),
        processed_count: processed.len(),
        pending,
        unpaid_payables: unpaid(LedgerType::AccountsPayable),
        unpaid_receivables: unpaid(LedgerType::AccountsReceivable),
        summary,
    })
}

impl fmt::Display for StatusView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "====== Monthly Financial Summary ======")?;
        if self.summary.is_empty() {
            writeln!(f, "\n(no months yet)")?;
        }
        for row in self.summary.rows() {
            writeln!(f, "\n{}:", row.month)?;
            writeln!(f, "  Total Accounts Payable:    {:>12}", format_amount(row.accounts_payable))?;
            writeln!(f, "  Total Accounts Receivable: {:>12}", format_amount(row.accounts_receivable))?;
            writeln!(f, "  Total Revenue:             {:>12}", format_amount(row.revenue))?;
            writeln!(f, "  Total Expenses:            {:>12}", format_amount(row.expenses))?;
            writeln!(f, "  Net Income:                {:>12}", format_amount(row.net_income))?;
        }
        writeln!(
            f,
            "\nTransactions: {} recorded, {} processed, {} pending",
            self.raw_count, self.processed_count, self.pending
        )?;
        writeln!(
            f,
            "Open items: {} payable, {} receivable",
            self.unpaid_payables, self.unpaid_receivables
        )
    }
}
