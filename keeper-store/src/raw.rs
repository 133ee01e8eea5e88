//! Raw ledger: `transaction_id,date,description,amount`

use chrono::NaiveDate;
use keeper_core::{
    format_amount, KeeperError, KeeperResult, RawTransaction, TransactionId, DATE_FORMAT,
};
use log::{info, warn};
use rust_decimal::Decimal;
use std::collections::HashSet;

use crate::file_io::{append_records, CsvTable};
use crate::rows::{
    cell, max_id, parse_date, parse_id, parse_money, record_for_headers, Columns, COL_AMOUNT,
    COL_DATE, COL_DESCRIPTION, COL_ID,
};
use crate::LedgerStore;

pub const RAW_HEADERS: [&str; 4] = [COL_ID, COL_DATE, COL_DESCRIPTION, COL_AMOUNT];

impl LedgerStore {
    /// Load every raw transaction in ledger order.
    ///
    /// Rows without an id get one (continuing after the highest known id) and the
    /// file is rewritten once so the ids stick.
    pub fn raw_transactions(&self) -> KeeperResult<Vec<RawTransaction>> {
        let Some(table) = self.raw_table()? else {
            return Ok(Vec::new());
        };
        parse_raw_table(&table)
    }

    /// Append a new raw transaction with the next free id
    pub fn append_raw(
        &self,
        date: NaiveDate,
        description: &str,
        amount: Decimal,
    ) -> KeeperResult<RawTransaction> {
        let description = description.trim();
        if description.is_empty() {
            return Err(KeeperError::Validation(
                "description must not be empty".to_string(),
            ));
        }

        let table = self.raw_table()?;
        let id = TransactionId::first_free(self.id_ceiling(table.as_ref())?, 1)?;
        let amount = keeper_core::money::round_cents(amount);

        let headers: Vec<String> = match &table {
            Some(t) if !t.headers.is_empty() => t.headers.clone(),
            _ => RAW_HEADERS.iter().map(|h| h.to_string()).collect(),
        };
        let record = record_for_headers(
            &headers,
            &[
                (COL_ID, id.to_string()),
                (COL_DATE, date.format(DATE_FORMAT).to_string()),
                (COL_DESCRIPTION, description.to_string()),
                (COL_AMOUNT, format_amount(amount)),
            ],
        );
        append_records(&self.paths().raw, &headers, &[record])?;
        info!("recorded transaction {id}: {date} {description} {}", format_amount(amount));

        Ok(RawTransaction {
            id,
            date,
            description: description.to_string(),
            amount,
        })
    }

    /// Raw table with ids guaranteed, or `None` when the ledger does not exist yet
    fn raw_table(&self) -> KeeperResult<Option<CsvTable>> {
        let path = &self.paths().raw;
        let Some(mut table) = CsvTable::read(path)? else {
            return Ok(None);
        };
        if table.headers.is_empty() {
            return Ok(Some(table));
        }

        let blank = match table.column(COL_ID) {
            Some(idx) => table.rows.iter().filter(|r| cell(r, idx).is_empty()).count(),
            None => table.rows.len(),
        };
        if blank == 0 && table.column(COL_ID).is_some() {
            return Ok(Some(table));
        }

        let mut next = TransactionId::first_free(self.id_ceiling(Some(&table))?, blank)?;
        let idx = table.ensure_column(COL_ID, |_| {
            let id = next;
            next = next.checked_next().unwrap_or(next);
            id.to_string()
        });
        table.move_column_first(idx);
        table.write_atomic(path)?;
        warn!(
            "assigned ids to {blank} raw transaction(s) without one in {}",
            path.display()
        );
        Ok(Some(table))
    }

    /// Highest id known to either ledger
    fn id_ceiling(&self, raw: Option<&CsvTable>) -> KeeperResult<Option<TransactionId>> {
        let raw_max = raw.and_then(max_id);
        let processed_max = CsvTable::read(&self.paths().processed)?
            .as_ref()
            .and_then(max_id);
        Ok(raw_max.max(processed_max))
    }
}

fn parse_raw_table(table: &CsvTable) -> KeeperResult<Vec<RawTransaction>> {
    if table.headers.is_empty() {
        return Ok(Vec::new());
    }
    let cols = Columns::new(table);
    let file = crate::RAW_FILE;
    let id_idx = cols.require(COL_ID, file)?;
    let date_idx = cols.require(COL_DATE, file)?;
    let desc_idx = cols.require(COL_DESCRIPTION, file)?;
    let amount_idx = cols.require(COL_AMOUNT, file)?;

    let mut seen = HashSet::new();
    let mut out = Vec::with_capacity(table.rows.len());
    for row in &table.rows {
        let txn = RawTransaction {
            id: parse_id(row.line, cell(row, id_idx))?,
            date: parse_date(row.line, COL_DATE, cell(row, date_idx))?,
            description: cell(row, desc_idx).to_string(),
            amount: parse_money(row.line, COL_AMOUNT, cell(row, amount_idx))?,
        };
        if !seen.insert(txn.id) {
            warn!(
                "raw ledger repeats transaction id {} on line {}; ignoring this copy",
                txn.id,
                row.line.unwrap_or_default()
            );
            continue;
        }
        out.push(txn);
    }
    Ok(out)
}
