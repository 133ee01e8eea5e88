//! Payment status updates on the processed ledger.

use keeper_core::{
    KeeperError, KeeperResult, PaymentStatus, ProcessedTransaction, TransactionId,
};
use log::info;

use crate::processed::Layout;
use crate::rows::COL_PAYMENT_STATUS;
use crate::LedgerStore;

/// Result of a mark-paid request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkPaidOutcome {
    /// The row as it reads after the update
    pub transaction: ProcessedTransaction,
    /// The row was already paid; nothing was rewritten
    pub already_paid: bool,
}

impl LedgerStore {
    /// Set `payment_status = Paid` on the row with `id`.
    ///
    /// Only that cell changes; the file is replaced through a scratch copy so a failed
    /// write leaves the ledger as it was.
    pub fn mark_paid(&self, id: TransactionId) -> KeeperResult<MarkPaidOutcome> {
        let path = self.paths().processed.clone();
        let mut table = self
            .processed_table()?
            .ok_or_else(|| KeeperError::StoreMissing(path.clone()))?;
        let layout = Layout::resolve(&table)?;
        let status_idx = layout
            .payment_status_column()
            .ok_or_else(|| KeeperError::Validation(format!("{} has no {COL_PAYMENT_STATUS:?} column", path.display())))?;

        let pos = table
            .rows
            .iter()
            .position(|row| layout.id(row).is_ok_and(|row_id| row_id == id))
            .ok_or(KeeperError::NotFound { id })?;

        let current = layout.parse(&table.rows[pos])?;
        if current.is_paid() {
            return Ok(MarkPaidOutcome {
                transaction: current,
                already_paid: true,
            });
        }

        table.rows[pos].cells[status_idx] = PaymentStatus::Paid.to_string();
        table.write_atomic(&path)?;
        info!("marked transaction {id} as paid");

        Ok(MarkPaidOutcome {
            transaction: ProcessedTransaction {
                payment_status: PaymentStatus::Paid,
                ..current
            },
            already_paid: false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const LEDGER: &str = "transaction_id,date,description,amount,category,type,month,due_date,payment_status\n\
1,2024-01-05,AWS,-50.00,Hosting Expenses,Accounts Payable,2024-01,2024-01-05,Unpaid\n\
2,2024-01-05,AWS,-50.00,Hosting Expenses,Accounts Payable,2024-01,2024-01-05,Unpaid\n\
3,2024-01-06,\"Stripe, payout\",200.0,Consulting,Accounts Receivable,2024-01,2024-01-06,Unpaid\n";

    fn store_with(contents: &str) -> (TempDir, LedgerStore) {
        let dir = TempDir::new().unwrap();
        let store = LedgerStore::in_dir(dir.path());
        fs::write(&store.paths().processed, contents).unwrap();
        (dir, store)
    }

    #[test]
    fn test_marks_only_the_selected_row() {
        let (_dir, store) = store_with(LEDGER);
        let outcome = store.mark_paid(TransactionId(2)).unwrap();
        assert!(!outcome.already_paid);
        assert_eq!(outcome.transaction.payment_status, PaymentStatus::Paid);

        let text = fs::read_to_string(&store.paths().processed).unwrap();
        let expected = LEDGER.replacen(
            "2,2024-01-05,AWS,-50.00,Hosting Expenses,Accounts Payable,2024-01,2024-01-05,Unpaid",
            "2,2024-01-05,AWS,-50.00,Hosting Expenses,Accounts Payable,2024-01,2024-01-05,Paid",
            1,
        );
        assert_eq!(text, expected);
    }

    #[test]
    fn test_unknown_id_is_not_found_and_file_untouched() {
        let (_dir, store) = store_with(LEDGER);
        let err = store.mark_paid(TransactionId(99)).unwrap_err();
        assert!(matches!(err, KeeperError::NotFound { id: TransactionId(99) }));
        assert_eq!(fs::read_to_string(&store.paths().processed).unwrap(), LEDGER);
    }

    #[test]
    fn test_already_paid_is_reported() {
        let (_dir, store) = store_with(LEDGER);
        store.mark_paid(TransactionId(1)).unwrap();
        let again = store.mark_paid(TransactionId(1)).unwrap();
        assert!(again.already_paid);
    }

    #[test]
    fn test_missing_ledger_is_store_missing() {
        let dir = TempDir::new().unwrap();
        let store = LedgerStore::in_dir(dir.path());
        assert!(store.mark_paid(TransactionId(1)).unwrap_err().is_store_missing());
    }

    #[test]
    fn test_backfills_status_and_due_date_columns() {
        let (_dir, store) = store_with(
            "transaction_id,date,description,amount,category,type,month\n\
             1,2024-01-05,AWS,-50.00,Hosting Expenses,Accounts Payable,2024-01\n\
             2,2024-01-09,Figma,-15.00,Software,Expense,2024-01\n",
        );
        store.mark_paid(TransactionId(1)).unwrap();
        let text = fs::read_to_string(&store.paths().processed).unwrap();
        assert_eq!(
            text,
            "transaction_id,date,description,amount,category,type,month,due_date,payment_status\n\
             1,2024-01-05,AWS,-50.00,Hosting Expenses,Accounts Payable,2024-01,2024-01-05,Paid\n\
             2,2024-01-09,Figma,-15.00,Software,Expense,2024-01,2024-01-09,Unpaid\n"
        );
    }
}
