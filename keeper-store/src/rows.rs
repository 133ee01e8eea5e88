//! Cell-level parsing shared by the ledger readers.

use chrono::NaiveDate;
use keeper_core::{parse_amount, KeeperError, KeeperResult, TransactionId, DATE_FORMAT};
use rust_decimal::Decimal;

use crate::file_io::{CsvTable, TableRow};

pub const COL_ID: &str = "transaction_id";
pub const COL_DATE: &str = "date";
pub const COL_DESCRIPTION: &str = "description";
pub const COL_AMOUNT: &str = "amount";
pub const COL_CATEGORY: &str = "category";
pub const COL_TYPE: &str = "type";
pub const COL_MONTH: &str = "month";
pub const COL_DUE_DATE: &str = "due_date";
pub const COL_PAYMENT_STATUS: &str = "payment_status";

/// Resolved column positions for one table
pub(crate) struct Columns<'a> {
    table: &'a CsvTable,
}

impl<'a> Columns<'a> {
    pub fn new(table: &'a CsvTable) -> Self {
        Self { table }
    }

    pub fn require(&self, name: &'static str, file: &str) -> KeeperResult<usize> {
        self.table
            .column(name)
            .ok_or_else(|| KeeperError::Validation(format!("{file} has no {name:?} column")))
    }

    pub fn optional(&self, name: &str) -> Option<usize> {
        self.table.column(name)
    }
}

pub(crate) fn cell(row: &TableRow, idx: usize) -> &str {
    row.cells.get(idx).map(|s| s.trim()).unwrap_or("")
}

pub fn parse_date(line: Option<u64>, field: &'static str, value: &str) -> KeeperResult<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT)
        .map_err(|e| KeeperError::parse(line, field, value, e))
}

pub fn parse_money(line: Option<u64>, field: &'static str, value: &str) -> KeeperResult<Decimal> {
    parse_amount(value).map_err(|reason| KeeperError::parse(line, field, value, reason))
}

pub fn parse_id(line: Option<u64>, value: &str) -> KeeperResult<TransactionId> {
    value
        .parse()
        .map_err(|e| KeeperError::parse(line, COL_ID, value, e))
}

/// Lay out `(column, value)` pairs in the table's header order
pub(crate) fn record_for_headers(headers: &[String], values: &[(&str, String)]) -> Vec<String> {
    headers
        .iter()
        .map(|h| {
            values
                .iter()
                .find(|(name, _)| h.eq_ignore_ascii_case(name))
                .map(|(_, v)| v.clone())
                .unwrap_or_default()
        })
        .collect()
}

/// Highest id that parses in the table's id column
pub(crate) fn max_id(table: &CsvTable) -> Option<TransactionId> {
    let idx = table.column(COL_ID)?;
    table
        .rows
        .iter()
        .filter_map(|r| cell(r, idx).parse::<TransactionId>().ok())
        .max()
}
