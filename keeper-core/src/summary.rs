//! Monthly summary rows and the incremental merge of per-month deltas.

use rust_decimal::Decimal;
use std::collections::BTreeMap;

use crate::error::{KeeperError, KeeperResult};
use crate::ledger::LedgerType;
use crate::month::Month;

/// Per-month signed totals accumulated during one processing run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MonthTotals {
    pub accounts_payable: Decimal,
    pub accounts_receivable: Decimal,
    pub revenue: Decimal,
    pub expenses: Decimal,
}

impl MonthTotals {
    pub fn add(&mut self, ledger_type: LedgerType, amount: Decimal) -> KeeperResult<()> {
        let slot = match ledger_type {
            LedgerType::AccountsPayable => &mut self.accounts_payable,
            LedgerType::AccountsReceivable => &mut self.accounts_receivable,
            LedgerType::Revenue => &mut self.revenue,
            LedgerType::Expense => &mut self.expenses,
        };
        *slot = slot
            .checked_add(amount)
            .ok_or_else(|| KeeperError::Overflow(format!("{ledger_type} total")))?;
        Ok(())
    }

    /// Signed sum; expenses and payables are already negative. `None` on overflow
    pub fn net_income(&self) -> Option<Decimal> {
        self.revenue
            .checked_add(self.accounts_receivable)?
            .checked_add(self.expenses)?
            .checked_add(self.accounts_payable)
    }

    fn checked_sum(&self, other: &MonthTotals) -> Option<MonthTotals> {
        Some(MonthTotals {
            accounts_payable: self.accounts_payable.checked_add(other.accounts_payable)?,
            accounts_receivable: self
                .accounts_receivable
                .checked_add(other.accounts_receivable)?,
            revenue: self.revenue.checked_add(other.revenue)?,
            expenses: self.expenses.checked_add(other.expenses)?,
        })
    }
}

/// One row of the monthly summary file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthlySummary {
    pub month: Month,
    pub accounts_payable: Decimal,
    pub accounts_receivable: Decimal,
    pub revenue: Decimal,
    pub expenses: Decimal,
    pub net_income: Decimal,
}

impl MonthlySummary {
    pub fn zero(month: Month) -> Self {
        Self {
            month,
            accounts_payable: Decimal::ZERO,
            accounts_receivable: Decimal::ZERO,
            revenue: Decimal::ZERO,
            expenses: Decimal::ZERO,
            net_income: Decimal::ZERO,
        }
    }

    pub fn totals(&self) -> MonthTotals {
        MonthTotals {
            accounts_payable: self.accounts_payable,
            accounts_receivable: self.accounts_receivable,
            revenue: self.revenue,
            expenses: self.expenses,
        }
    }

    /// Add a delta and recompute net income from the merged totals.
    ///
    /// The row is left unchanged when any total would overflow.
    pub fn absorb(&mut self, delta: &MonthTotals) -> KeeperResult<()> {
        let month = self.month;
        let overflow = || KeeperError::Overflow(format!("{month} summary totals"));
        let merged = self.totals().checked_sum(delta).ok_or_else(overflow)?;
        let net_income = merged.net_income().ok_or_else(overflow)?;

        self.accounts_payable = merged.accounts_payable;
        self.accounts_receivable = merged.accounts_receivable;
        self.revenue = merged.revenue;
        self.expenses = merged.expenses;
        self.net_income = net_income;
        Ok(())
    }

    pub fn is_reconciled(&self) -> bool {
        self.totals().net_income() == Some(self.net_income)
    }
}

/// The whole summary, keyed and ordered by month
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Summary {
    rows: BTreeMap<Month, MonthlySummary>,
}

impl Summary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_rows(rows: impl IntoIterator<Item = MonthlySummary>) -> Self {
        let mut summary = Self::new();
        for row in rows {
            summary.rows.insert(row.month, row);
        }
        summary
    }

    pub fn get(&self, month: Month) -> Option<&MonthlySummary> {
        self.rows.get(&month)
    }

    /// Rows in ascending month order
    pub fn rows(&self) -> impl Iterator<Item = &MonthlySummary> {
        self.rows.values()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Merge per-month deltas; untouched months keep their stored values
    pub fn merge(&mut self, deltas: &BTreeMap<Month, MonthTotals>) -> KeeperResult<()> {
        for (month, delta) in deltas {
            let mut row = self
                .rows
                .get(month)
                .cloned()
                .unwrap_or_else(|| MonthlySummary::zero(*month));
            row.absorb(delta)?;
            self.rows.insert(*month, row);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn month(s: &str) -> Month {
        s.parse().unwrap()
    }

    fn d(units: i64) -> Decimal {
        Decimal::new(units, 0)
    }

    #[test]
    fn test_totals_accumulate_independently() {
        let mut t = MonthTotals::default();
        t.add(LedgerType::Expense, d(-50)).unwrap();
        t.add(LedgerType::Revenue, d(200)).unwrap();
        t.add(LedgerType::AccountsPayable, d(-20)).unwrap();
        t.add(LedgerType::AccountsReceivable, d(30)).unwrap();
        t.add(LedgerType::Expense, d(-5)).unwrap();
        assert_eq!(t.expenses, d(-55));
        assert_eq!(t.net_income(), Some(d(155)));
    }

    #[test]
    fn test_merge_into_existing_row() {
        let jan = month("2024-01");
        let mut existing = MonthlySummary::zero(jan);
        existing.revenue = d(50);
        existing.net_income = d(50);
        let mut summary = Summary::from_rows([existing]);

        let mut delta = MonthTotals::default();
        delta.add(LedgerType::Revenue, d(100)).unwrap();
        summary.merge(&BTreeMap::from([(jan, delta)])).unwrap();

        let row = summary.get(jan).unwrap();
        assert_eq!(row.revenue, d(150));
        assert_eq!(row.net_income, d(150));
    }

    #[test]
    fn test_merge_creates_missing_month_and_keeps_order() {
        let mut summary = Summary::from_rows([MonthlySummary::zero(month("2024-03"))]);
        let mut delta = MonthTotals::default();
        delta.add(LedgerType::Expense, d(-10)).unwrap();
        summary.merge(&BTreeMap::from([(month("2024-01"), delta)])).unwrap();

        let months: Vec<String> = summary.rows().map(|r| r.month.to_string()).collect();
        assert_eq!(months, vec!["2024-01", "2024-03"]);
        assert_eq!(summary.get(month("2024-01")).unwrap().net_income, d(-10));
    }

    #[test]
    fn test_merge_leaves_untouched_months_alone() {
        let feb = month("2024-02");
        let mut stale = MonthlySummary::zero(feb);
        stale.revenue = d(10);
        stale.net_income = d(999);
        let mut summary = Summary::from_rows([stale.clone()]);
        summary.merge(&BTreeMap::new()).unwrap();
        assert_eq!(summary.get(feb), Some(&stale));
    }

    #[test]
    fn test_merge_reconciles_after_each_step() {
        let jan = month("2024-01");
        let mut summary = Summary::new();
        for (ty, amount) in [
            (LedgerType::Revenue, d(100)),
            (LedgerType::AccountsPayable, d(-40)),
            (LedgerType::Expense, d(-15)),
            (LedgerType::AccountsReceivable, d(25)),
        ] {
            let mut delta = MonthTotals::default();
            delta.add(ty, amount).unwrap();
            summary.merge(&BTreeMap::from([(jan, delta)])).unwrap();
            assert!(summary.rows().all(MonthlySummary::is_reconciled));
        }
        assert_eq!(summary.get(jan).unwrap().net_income, d(70));
    }

    #[test]
    fn test_merge_order_does_not_matter() {
        let jan = month("2024-01");
        let mut a = MonthTotals::default();
        a.add(LedgerType::Revenue, d(100)).unwrap();
        let mut b = MonthTotals::default();
        b.add(LedgerType::Expense, d(-30)).unwrap();

        let mut left = Summary::new();
        left.merge(&BTreeMap::from([(jan, a)])).unwrap();
        left.merge(&BTreeMap::from([(jan, b)])).unwrap();

        let mut right = Summary::new();
        right.merge(&BTreeMap::from([(jan, b)])).unwrap();
        right.merge(&BTreeMap::from([(jan, a)])).unwrap();

        assert_eq!(left, right);
    }

    #[test]
    fn test_total_overflow_is_an_error() {
        let mut t = MonthTotals::default();
        t.add(LedgerType::Revenue, Decimal::MAX).unwrap();
        let err = t.add(LedgerType::Revenue, Decimal::MAX).unwrap_err();
        assert!(matches!(err, KeeperError::Overflow(_)));
        assert_eq!(t.revenue, Decimal::MAX);
    }

    #[test]
    fn test_overflowing_merge_keeps_row() {
        let jan = month("2024-01");
        let mut existing = MonthlySummary::zero(jan);
        existing.revenue = Decimal::MAX;
        existing.net_income = Decimal::MAX;
        let mut summary = Summary::from_rows([existing.clone()]);

        let mut delta = MonthTotals::default();
        delta.add(LedgerType::AccountsReceivable, d(1)).unwrap();
        let err = summary.merge(&BTreeMap::from([(jan, delta)])).unwrap_err();
        assert!(matches!(err, KeeperError::Overflow(_)));
        assert_eq!(summary.get(jan), Some(&existing));
    }
}
