//! Marking processed transactions as paid.

use keeper_core::{KeeperError, KeeperResult, ProcessedTransaction, TransactionId};
use keeper_store::LedgerStore;

/// Result of a payment status update
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateResult {
    pub transaction: ProcessedTransaction,
    pub already_paid: bool,
}

/// Rows still awaiting payment, in ledger order
pub fn list_unpaid(processed: &[ProcessedTransaction]) -> Vec<&ProcessedTransaction> {
    processed.iter().filter(|t| !t.is_paid()).collect()
}

/// Resolve a 1-based position in [`list_unpaid`] to its row
pub fn select_unpaid(
    processed: &[ProcessedTransaction],
    ordinal: usize,
) -> KeeperResult<&ProcessedTransaction> {
    let unpaid = list_unpaid(processed);
    ordinal
        .checked_sub(1)
        .and_then(|i| unpaid.get(i).copied())
        .ok_or_else(|| {
            KeeperError::Validation(format!(
                "choose a number between 1 and {} (got {ordinal})",
                unpaid.len()
            ))
        })
}

/// Mark the row with `id` paid; `NotFound` when no row carries it
pub fn mark_paid(store: &LedgerStore, id: TransactionId) -> KeeperResult<UpdateResult> {
    let outcome = store.mark_paid(id)?;
    Ok(UpdateResult {
        transaction: outcome.transaction,
        already_paid: outcome.already_paid,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use keeper_core::{LedgerType, PaymentStatus, RawTransaction};
    use rust_decimal::Decimal;

    fn rows() -> Vec<ProcessedTransaction> {
        (1..=3)
            .map(|i| {
                let raw = RawTransaction {
                    id: TransactionId(i),
                    date: NaiveDate::from_ymd_opt(2024, 1, i as u32).unwrap(),
                    description: format!("row {i}"),
                    amount: Decimal::new(-100, 0),
                };
                let mut t = ProcessedTransaction::from_raw(&raw, "Supplies".into(), LedgerType::AccountsPayable);
                if i == 2 {
                    t.payment_status = PaymentStatus::Paid;
                }
                t
            })
            .collect()
    }

    #[test]
    fn test_list_unpaid_skips_paid() {
        let rows = rows();
        let ids: Vec<u64> = list_unpaid(&rows).iter().map(|t| t.id.0).collect();
        assert_eq!(ids, vec![1, 3]);
    }

    #[test]
    fn test_select_by_ordinal() {
        let rows = rows();
        assert_eq!(select_unpaid(&rows, 2).unwrap().id, TransactionId(3));
        assert!(matches!(select_unpaid(&rows, 0), Err(KeeperError::Validation(_))));
        assert!(matches!(select_unpaid(&rows, 3), Err(KeeperError::Validation(_))));
    }
}
