//! Monthly summary: `month,accounts_payable,accounts_receivable,revenue,expenses,net_income`

use keeper_core::{format_amount, KeeperError, KeeperResult, Month, MonthlySummary, Summary};
use log::info;

use crate::file_io::{CsvTable, TableRow};
use crate::rows::{cell, parse_money, Columns};
use crate::LedgerStore;

pub const SUMMARY_HEADERS: [&str; 6] = [
    "month",
    "accounts_payable",
    "accounts_receivable",
    "revenue",
    "expenses",
    "net_income",
];

impl LedgerStore {
    /// The stored summary; empty before the first processing run
    pub fn summary(&self) -> KeeperResult<Summary> {
        match CsvTable::read(&self.paths().summary)? {
            Some(table) => parse_summary_table(&table),
            None => Ok(Summary::new()),
        }
    }

    pub fn require_summary(&self) -> KeeperResult<Summary> {
        let table = CsvTable::read(&self.paths().summary)?
            .ok_or_else(|| KeeperError::StoreMissing(self.paths().summary.clone()))?;
        parse_summary_table(&table)
    }

    /// Replace the summary file with `summary`, sorted by month
    pub fn write_summary(&self, summary: &Summary) -> KeeperResult<()> {
        let mut table = CsvTable::with_headers(&SUMMARY_HEADERS);
        for row in summary.rows() {
            table.rows.push(TableRow {
                line: None,
                cells: vec![
                    row.month.to_string(),
                    format_amount(row.accounts_payable),
                    format_amount(row.accounts_receivable),
                    format_amount(row.revenue),
                    format_amount(row.expenses),
                    format_amount(row.net_income),
                ],
            });
        }
        table.write_atomic(&self.paths().summary)?;
        info!("wrote {} month(s) to {}", summary.len(), self.paths().summary.display());
        Ok(())
    }
}

fn parse_summary_table(table: &CsvTable) -> KeeperResult<Summary> {
    if table.headers.is_empty() {
        return Ok(Summary::new());
    }
    let cols = Columns::new(table);
    let file = crate::SUMMARY_FILE;
    let idx: Vec<usize> = SUMMARY_HEADERS
        .iter()
        .map(|name| cols.require(*name, file))
        .collect::<KeeperResult<_>>()?;

    let mut rows = Vec::with_capacity(table.rows.len());
    for row in &table.rows {
        let line = row.line;
        let month_cell = cell(row, idx[0]);
        let month: Month = month_cell
            .parse()
            .map_err(|e| KeeperError::parse(line, "month", month_cell, e))?;
        rows.push(MonthlySummary {
            month,
            accounts_payable: parse_money(line, "accounts_payable", cell(row, idx[1]))?,
            accounts_receivable: parse_money(line, "accounts_receivable", cell(row, idx[2]))?,
            revenue: parse_money(line, "revenue", cell(row, idx[3]))?,
            expenses: parse_money(line, "expenses", cell(row, idx[4]))?,
            net_income: parse_money(line, "net_income", cell(row, idx[5]))?,
        });
    }
    Ok(Summary::from_rows(rows))
}

#[cfg(test)]
mod tests {
    use super::*;
    use keeper_core::{LedgerType, MonthTotals};
    use rust_decimal::Decimal;
    use std::collections::BTreeMap;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_missing_summary() {
        let dir = TempDir::new().unwrap();
        let store = LedgerStore::in_dir(dir.path());
        assert!(store.summary().unwrap().is_empty());
        assert!(store.require_summary().unwrap_err().is_store_missing());
    }

    #[test]
    fn test_write_sorted_two_places_and_reload() {
        let dir = TempDir::new().unwrap();
        let store = LedgerStore::in_dir(dir.path());

        let mut deltas = BTreeMap::new();
        let mut feb = MonthTotals::default();
        feb.add(LedgerType::Revenue, Decimal::new(200, 0)).unwrap();
        let mut jan = MonthTotals::default();
        jan.add(LedgerType::AccountsPayable, Decimal::new(-5000, 2)).unwrap();
        deltas.insert("2024-02".parse().unwrap(), feb);
        deltas.insert("2024-01".parse().unwrap(), jan);

        let mut summary = Summary::new();
        summary.merge(&deltas).unwrap();
        store.write_summary(&summary).unwrap();

        let text = fs::read_to_string(&store.paths().summary).unwrap();
        assert_eq!(
            text,
            "month,accounts_payable,accounts_receivable,revenue,expenses,net_income\n\
             2024-01,-50.00,0.00,0.00,0.00,-50.00\n\
             2024-02,0.00,0.00,200.00,0.00,200.00\n"
        );
        assert_eq!(store.summary().unwrap(), summary);
    }

    #[test]
    fn test_reads_float_style_values() {
        let dir = TempDir::new().unwrap();
        let store = LedgerStore::in_dir(dir.path());
        fs::write(
            &store.paths().summary,
            "month,accounts_payable,accounts_receivable,revenue,expenses,net_income\n\
             2024-01,-50.0,0.0,200.0,0.0,150.0\n",
        )
        .unwrap();
        let summary = store.summary().unwrap();
        let row = summary.get("2024-01".parse().unwrap()).unwrap();
        assert_eq!(row.net_income, Decimal::new(150, 0));
        assert!(row.is_reconciled());
    }
}
