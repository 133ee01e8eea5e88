//! Ledger record types: raw entries and their processed counterparts

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{KeeperError, KeeperResult};
use crate::month::Month;

/// Stable identifier assigned when a raw transaction is written.
///
/// Ids grow monotonically within a ledger and are never derived from content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransactionId(pub u64);

impl TransactionId {
    /// The following id, or `None` once the id space is used up
    pub fn checked_next(self) -> Option<Self> {
        self.0.checked_add(1).map(TransactionId)
    }

    /// First of `count` consecutive fresh ids after `ceiling`, the highest id in use.
    ///
    /// Fails when the block would run past `u64::MAX`.
    pub fn first_free(ceiling: Option<Self>, count: usize) -> KeeperResult<Self> {
        let first = match ceiling {
            Some(id) => id.0.checked_add(1),
            None => Some(1),
        };
        let span = u64::try_from(count.saturating_sub(1)).ok();
        first
            .filter(|f| span.and_then(|s| f.checked_add(s)).is_some())
            .map(TransactionId)
            .ok_or_else(|| {
                KeeperError::Overflow(format!(
                    "no room for {count} new transaction id(s) after {}",
                    ceiling.map_or(0, |c| c.0)
                ))
            })
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for TransactionId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(TransactionId)
    }
}

/// A transaction as entered, before categorization
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawTransaction {
    pub id: TransactionId,
    pub date: NaiveDate,
    pub description: String,
    /// Negative = money out, positive = money in
    pub amount: Decimal,
}

impl RawTransaction {
    pub fn month(&self) -> Month {
        Month::of(self.date)
    }
}

/// Ledger classification derived from the amount sign and the category label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LedgerType {
    #[serde(rename = "Revenue")]
    Revenue,
    #[serde(rename = "Expense")]
    Expense,
    #[serde(rename = "Accounts Receivable")]
    AccountsReceivable,
    #[serde(rename = "Accounts Payable")]
    AccountsPayable,
}

impl LedgerType {
    pub const ALL: [LedgerType; 4] = [
        LedgerType::AccountsPayable,
        LedgerType::AccountsReceivable,
        LedgerType::Revenue,
        LedgerType::Expense,
    ];

    /// Label written to the processed ledger
    pub fn label(&self) -> &'static str {
        match self {
            LedgerType::Revenue => "Revenue",
            LedgerType::Expense => "Expense",
            LedgerType::AccountsReceivable => "Accounts Receivable",
            LedgerType::AccountsPayable => "Accounts Payable",
        }
    }

    /// Open items that can age and be marked paid
    pub fn is_open_item(&self) -> bool {
        matches!(
            self,
            LedgerType::AccountsReceivable | LedgerType::AccountsPayable
        )
    }
}

impl fmt::Display for LedgerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for LedgerType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key: String = s
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_ascii_lowercase();
        match key.as_str() {
            "revenue" => Ok(LedgerType::Revenue),
            "expense" | "expenses" => Ok(LedgerType::Expense),
            "accountsreceivable" | "ar" => Ok(LedgerType::AccountsReceivable),
            "accountspayable" | "ap" => Ok(LedgerType::AccountsPayable),
            _ => Err(format!("unknown ledger type {s:?}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PaymentStatus {
    #[default]
    Unpaid,
    Paid,
}

impl PaymentStatus {
    pub fn label(&self) -> &'static str {
        match self {
            PaymentStatus::Unpaid => "Unpaid",
            PaymentStatus::Paid => "Paid",
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for PaymentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "unpaid" => Ok(PaymentStatus::Unpaid),
            "paid" => Ok(PaymentStatus::Paid),
            other => Err(format!("unknown payment status {other:?}")),
        }
    }
}

/// A categorized transaction as stored in the processed ledger
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessedTransaction {
    /// Id of the raw transaction this row was derived from
    pub id: TransactionId,
    pub date: NaiveDate,
    pub description: String,
    pub amount: Decimal,
    /// Sanitized, title-cased oracle label
    pub category: String,
    pub ledger_type: LedgerType,
    pub month: Month,
    /// Absent only in rows written before due dates were tracked
    pub due_date: Option<NaiveDate>,
    pub payment_status: PaymentStatus,
}

impl ProcessedTransaction {
    /// Build the processed row for a raw transaction; due on the transaction date, unpaid
    pub fn from_raw(raw: &RawTransaction, category: String, ledger_type: LedgerType) -> Self {
        Self {
            id: raw.id,
            date: raw.date,
            description: raw.description.clone(),
            amount: raw.amount,
            category,
            ledger_type,
            month: raw.month(),
            due_date: Some(raw.date),
            payment_status: PaymentStatus::Unpaid,
        }
    }

    /// Due date used for aging; falls back to the transaction date
    pub fn effective_due_date(&self) -> NaiveDate {
        self.due_date.unwrap_or(self.date)
    }

    pub fn is_paid(&self) -> bool {
        self.payment_status == PaymentStatus::Paid
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw() -> RawTransaction {
        RawTransaction {
            id: TransactionId(7),
            date: NaiveDate::from_ymd_opt(2024, 1, 5).unwrap(),
            description: "Payment to AWS for cloud hosting".to_string(),
            amount: Decimal::new(-5000, 2),
        }
    }

    #[test]
    fn test_from_raw_defaults() {
        let p = ProcessedTransaction::from_raw(&raw(), "Hosting".into(), LedgerType::Expense);
        assert_eq!(p.id, TransactionId(7));
        assert_eq!(p.month.to_string(), "2024-01");
        assert_eq!(p.due_date, Some(p.date));
        assert_eq!(p.payment_status, PaymentStatus::Unpaid);
        assert!(!p.is_paid());
    }

    #[test]
    fn test_effective_due_date_falls_back() {
        let mut p = ProcessedTransaction::from_raw(&raw(), "Hosting".into(), LedgerType::Expense);
        p.due_date = None;
        assert_eq!(p.effective_due_date(), p.date);
    }

    #[test]
    fn test_ledger_type_labels_roundtrip() {
        for t in LedgerType::ALL {
            assert_eq!(t.label().parse::<LedgerType>().unwrap(), t);
        }
        assert_eq!("AR".parse::<LedgerType>().unwrap(), LedgerType::AccountsReceivable);
        assert!("Equity".parse::<LedgerType>().is_err());
    }

    #[test]
    fn test_ledger_type_serde_names() {
        let json = serde_json::to_string(&LedgerType::AccountsPayable).unwrap();
        assert_eq!(json, "\"Accounts Payable\"");
    }

    #[test]
    fn test_payment_status_blank_is_unpaid() {
        assert_eq!("".parse::<PaymentStatus>().unwrap(), PaymentStatus::Unpaid);
        assert_eq!("Paid".parse::<PaymentStatus>().unwrap(), PaymentStatus::Paid);
        assert!("Overdue".parse::<PaymentStatus>().is_err());
    }

    #[test]
    fn test_id_parse() {
        assert_eq!(" 12 ".parse::<TransactionId>().unwrap(), TransactionId(12));
        assert_eq!(TransactionId(41).checked_next(), Some(TransactionId(42)));
        assert_eq!(TransactionId(u64::MAX).checked_next(), None);
    }

    #[test]
    fn test_first_free_id() {
        assert_eq!(TransactionId::first_free(None, 1).unwrap(), TransactionId(1));
        assert_eq!(
            TransactionId::first_free(Some(TransactionId(9)), 3).unwrap(),
            TransactionId(10)
        );
        assert_eq!(
            TransactionId::first_free(Some(TransactionId(u64::MAX - 2)), 2).unwrap(),
            TransactionId(u64::MAX - 1)
        );
    }

    #[test]
    fn test_first_free_id_exhausted() {
        let err = TransactionId::first_free(Some(TransactionId(u64::MAX)), 1).unwrap_err();
        assert!(matches!(err, KeeperError::Overflow(_)));
        assert!(TransactionId::first_free(Some(TransactionId(u64::MAX - 1)), 2).is_err());
    }
}
