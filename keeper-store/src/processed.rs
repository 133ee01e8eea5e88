//! Processed ledger:
//! `transaction_id,date,description,amount,category,type,month,due_date,payment_status`

use keeper_core::{
    format_amount, KeeperError, KeeperResult, LedgerType, Month, PaymentStatus,
    ProcessedTransaction, TransactionId, DATE_FORMAT,
};
use log::{debug, warn};
use std::collections::{HashMap, HashSet, VecDeque};

use crate::file_io::{append_records, CsvTable, TableRow};
use crate::rows::{
    cell, max_id, parse_date, parse_id, parse_money, record_for_headers, Columns, COL_AMOUNT,
    COL_CATEGORY, COL_DATE, COL_DESCRIPTION, COL_DUE_DATE, COL_ID, COL_MONTH,
    COL_PAYMENT_STATUS, COL_TYPE,
};
use crate::LedgerStore;

pub const PROCESSED_HEADERS: [&str; 9] = [
    COL_ID,
    COL_DATE,
    COL_DESCRIPTION,
    COL_AMOUNT,
    COL_CATEGORY,
    COL_TYPE,
    COL_MONTH,
    COL_DUE_DATE,
    COL_PAYMENT_STATUS,
];

/// A processed row left out of a report
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedRow {
    pub line: Option<u64>,
    pub reason: String,
}

/// Processed ledger loaded for reporting: unreadable rows are skipped, not fatal
#[derive(Debug, Clone, Default)]
pub struct ReportLedger {
    pub rows: Vec<ProcessedTransaction>,
    pub skipped: Vec<SkippedRow>,
}

impl LedgerStore {
    /// Every processed transaction; empty before the first processing run
    pub fn processed_transactions(&self) -> KeeperResult<Vec<ProcessedTransaction>> {
        match self.processed_table()? {
            Some(table) => parse_processed_table(&table),
            None => Ok(Vec::new()),
        }
    }

    /// Like [`processed_transactions`](Self::processed_transactions), but a missing
    /// ledger is `StoreMissing`
    pub fn require_processed(&self) -> KeeperResult<Vec<ProcessedTransaction>> {
        let table = self
            .processed_table()?
            .ok_or_else(|| KeeperError::StoreMissing(self.paths().processed.clone()))?;
        parse_processed_table(&table)
    }

    /// Processed ledger for reports: rows that fail to parse are skipped and listed
    pub fn processed_for_report(&self) -> KeeperResult<ReportLedger> {
        let table = self
            .processed_table()?
            .ok_or_else(|| KeeperError::StoreMissing(self.paths().processed.clone()))?;
        let layout = Layout::resolve(&table)?;

        let mut ledger = ReportLedger::default();
        for row in &table.rows {
            match layout.parse(row) {
                Ok(txn) => ledger.rows.push(txn),
                Err(e) => {
                    warn!("skipping processed row: {e}");
                    ledger.skipped.push(SkippedRow {
                        line: row.line,
                        reason: e.to_string(),
                    });
                }
            }
        }
        Ok(ledger)
    }

    /// Append newly processed rows; existing rows are never rewritten here
    pub fn append_processed(&self, txns: &[ProcessedTransaction]) -> KeeperResult<()> {
        if txns.is_empty() {
            return Ok(());
        }
        let headers: Vec<String> = match self.processed_table()? {
            Some(table) if !table.headers.is_empty() => table.headers,
            _ => PROCESSED_HEADERS.iter().map(|h| h.to_string()).collect(),
        };
        let records: Vec<Vec<String>> = txns
            .iter()
            .map(|t| record_for_headers(&headers, &processed_values(t)))
            .collect();
        append_records(&self.paths().processed, &headers, &records)?;
        debug!("appended {} processed row(s)", records.len());
        Ok(())
    }

    /// Processed table with the current schema, migrating older files in place.
    ///
    /// Missing ids are matched to raw transactions by date, description and amount
    /// (first unclaimed match); rows with no match get fresh ids. Blank due dates
    /// take the transaction date and blank statuses become `Unpaid`.
    pub(crate) fn processed_table(&self) -> KeeperResult<Option<CsvTable>> {
        let path = &self.paths().processed;
        let Some(mut table) = CsvTable::read(path)? else {
            return Ok(None);
        };
        if table.headers.is_empty() || is_current(&table) {
            return Ok(Some(table));
        }

        let missing_ids = self.backfill_processed_ids(&mut table)?;
        // resolved after the id backfill, which moves the id column to the front
        let date_idx = Columns::new(&table).require(COL_DATE, crate::PROCESSED_FILE)?;
        table.ensure_column(COL_DUE_DATE, |row| cell(row, date_idx).to_string());
        table.ensure_column(COL_PAYMENT_STATUS, |_| PaymentStatus::Unpaid.to_string());

        match parse_processed_table(&table) {
            Ok(_) => {
                table.write_atomic(path)?;
                warn!(
                    "migrated {} ({missing_ids} row(s) without ids)",
                    path.display()
                );
            }
            Err(e) => warn!(
                "left {} as it was: migrated rows do not parse ({e})",
                path.display()
            ),
        }
        Ok(Some(table))
    }

    fn backfill_processed_ids(&self, table: &mut CsvTable) -> KeeperResult<usize> {
        let id_idx = table.column(COL_ID);
        let missing = match id_idx {
            Some(idx) => table.rows.iter().filter(|r| cell(r, idx).is_empty()).count(),
            None => table.rows.len(),
        };
        if missing == 0 {
            return Ok(0);
        }

        let date_idx = Columns::new(table).require(COL_DATE, crate::PROCESSED_FILE)?;
        let raw = self.raw_transactions()?;
        let taken: HashSet<TransactionId> = id_idx
            .map(|idx| {
                table
                    .rows
                    .iter()
                    .filter_map(|r| cell(r, idx).parse().ok())
                    .collect()
            })
            .unwrap_or_default();

        let mut by_key: HashMap<(String, String, String), VecDeque<TransactionId>> = HashMap::new();
        for t in raw.iter().filter(|t| !taken.contains(&t.id)) {
            by_key
                .entry((
                    t.date.format(DATE_FORMAT).to_string(),
                    t.description.clone(),
                    format_amount(t.amount),
                ))
                .or_default()
                .push_back(t.id);
        }

        let desc_idx = table.column(COL_DESCRIPTION);
        let amount_idx = table.column(COL_AMOUNT);
        let ceiling = raw.iter().map(|t| t.id).max().max(max_id(table));
        let mut fresh = TransactionId::first_free(ceiling, missing)?;

        let idx = table.ensure_column(COL_ID, |row| {
            let key = natural_key(row, date_idx, desc_idx, amount_idx);
            if let Some(id) = key.and_then(|k| by_key.get_mut(&k)).and_then(VecDeque::pop_front) {
                return id.to_string();
            }
            let id = fresh;
            fresh = fresh.checked_next().unwrap_or(fresh);
            id.to_string()
        });
        table.move_column_first(idx);
        Ok(missing)
    }
}

fn natural_key(
    row: &TableRow,
    date_idx: usize,
    desc_idx: Option<usize>,
    amount_idx: Option<usize>,
) -> Option<(String, String, String)> {
    let date = parse_date(row.line, COL_DATE, cell(row, date_idx)).ok()?;
    let amount = parse_money(row.line, COL_AMOUNT, cell(row, amount_idx?)).ok()?;
    Some((
        date.format(DATE_FORMAT).to_string(),
        cell(row, desc_idx?).to_string(),
        format_amount(amount),
    ))
}

fn is_current(table: &CsvTable) -> bool {
    [COL_ID, COL_DUE_DATE, COL_PAYMENT_STATUS].iter().all(|name| {
        table
            .column(name)
            .is_some_and(|idx| table.rows.iter().all(|r| !cell(r, idx).is_empty()))
    })
}

fn processed_values(t: &ProcessedTransaction) -> Vec<(&'static str, String)> {
    vec![
        (COL_ID, t.id.to_string()),
        (COL_DATE, t.date.format(DATE_FORMAT).to_string()),
        (COL_DESCRIPTION, t.description.clone()),
        (COL_AMOUNT, format_amount(t.amount)),
        (COL_CATEGORY, t.category.clone()),
        (COL_TYPE, t.ledger_type.label().to_string()),
        (COL_MONTH, t.month.to_string()),
        (
            COL_DUE_DATE,
            t.effective_due_date().format(DATE_FORMAT).to_string(),
        ),
        (COL_PAYMENT_STATUS, t.payment_status.label().to_string()),
    ]
}

pub(crate) fn parse_processed_table(table: &CsvTable) -> KeeperResult<Vec<ProcessedTransaction>> {
    if table.headers.is_empty() {
        return Ok(Vec::new());
    }
    let layout = Layout::resolve(table)?;
    table.rows.iter().map(|row| layout.parse(row)).collect()
}

/// Column positions of a processed table
pub(crate) struct Layout {
    id: usize,
    date: usize,
    description: usize,
    amount: usize,
    category: usize,
    ledger_type: usize,
    month: Option<usize>,
    due_date: Option<usize>,
    payment_status: Option<usize>,
}

impl Layout {
    pub fn resolve(table: &CsvTable) -> KeeperResult<Self> {
        let cols = Columns::new(table);
        let file = crate::PROCESSED_FILE;
        Ok(Self {
            id: cols.require(COL_ID, file)?,
            date: cols.require(COL_DATE, file)?,
            description: cols.require(COL_DESCRIPTION, file)?,
            amount: cols.require(COL_AMOUNT, file)?,
            category: cols.require(COL_CATEGORY, file)?,
            ledger_type: cols.require(COL_TYPE, file)?,
            month: cols.optional(COL_MONTH),
            due_date: cols.optional(COL_DUE_DATE),
            payment_status: cols.optional(COL_PAYMENT_STATUS),
        })
    }

    pub fn id(&self, row: &TableRow) -> KeeperResult<TransactionId> {
        parse_id(row.line, cell(row, self.id))
    }

    pub fn payment_status_column(&self) -> Option<usize> {
        self.payment_status
    }

    pub fn parse(&self, row: &TableRow) -> KeeperResult<ProcessedTransaction> {
        let line = row.line;
        let date = parse_date(line, COL_DATE, cell(row, self.date))?;

        let month = match self.month.map(|idx| cell(row, idx)).filter(|s| !s.is_empty()) {
            Some(s) => s
                .parse::<Month>()
                .map_err(|e| KeeperError::parse(line, COL_MONTH, s, e))?,
            None => Month::of(date),
        };
        let due_date = match self.due_date.map(|idx| cell(row, idx)).filter(|s| !s.is_empty()) {
            Some(s) => Some(parse_date(line, COL_DUE_DATE, s)?),
            None => None,
        };
        let type_cell = cell(row, self.ledger_type);
        let ledger_type = type_cell
            .parse::<LedgerType>()
            .map_err(|e| KeeperError::parse(line, COL_TYPE, type_cell, e))?;
        let status_cell = self.payment_status.map(|idx| cell(row, idx)).unwrap_or("");
        let payment_status = status_cell
            .parse::<PaymentStatus>()
            .map_err(|e| KeeperError::parse(line, COL_PAYMENT_STATUS, status_cell, e))?;

        Ok(ProcessedTransaction {
            id: self.id(row)?,
            date,
            description: cell(row, self.description).to_string(),
            amount: parse_money(line, COL_AMOUNT, cell(row, self.amount))?,
            category: cell(row, self.category).to_string(),
            ledger_type,
            month,
            due_date,
            payment_status,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use keeper_core::RawTransaction;
    use rust_decimal::Decimal;
    use std::fs;
    use tempfile::TempDir;

    fn store() -> (TempDir, LedgerStore) {
        let dir = TempDir::new().unwrap();
        let store = LedgerStore::in_dir(dir.path());
        (dir, store)
    }

    fn processed(id: u64, day: u32, amount: i64, ty: LedgerType) -> ProcessedTransaction {
        let raw = RawTransaction {
            id: TransactionId(id),
            date: NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
            description: format!("txn {id}"),
            amount: Decimal::new(amount, 2),
        };
        ProcessedTransaction::from_raw(&raw, "Hosting Expenses".into(), ty)
    }

    #[test]
    fn test_missing_ledger() {
        let (_dir, store) = store();
        assert!(store.processed_transactions().unwrap().is_empty());
        assert!(store.require_processed().unwrap_err().is_store_missing());
        assert!(store.processed_for_report().unwrap_err().is_store_missing());
    }

    #[test]
    fn test_append_and_reload() {
        let (_dir, store) = store();
        let rows = vec![
            processed(1, 5, -5000, LedgerType::AccountsPayable),
            processed(2, 6, 20000, LedgerType::Revenue),
        ];
        store.append_processed(&rows[..1]).unwrap();
        store.append_processed(&rows[1..]).unwrap();
        assert_eq!(store.processed_transactions().unwrap(), rows);

        let text = fs::read_to_string(&store.paths().processed).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some(PROCESSED_HEADERS.join(",").as_str()));
        assert_eq!(
            lines.next(),
            Some("1,2024-01-05,txn 1,-50.00,Hosting Expenses,Accounts Payable,2024-01,2024-01-05,Unpaid")
        );
    }

    #[test]
    fn test_legacy_file_is_migrated_against_raw_ids() {
        let (_dir, store) = store();
        fs::write(
            &store.paths().raw,
            "date,description,amount\n\
             2024-01-05,Payment to AWS for cloud hosting,-50.0\n\
             2024-01-06,Customer payment via Stripe,200.0\n\
             2024-01-07,Figma,-15.0\n",
        )
        .unwrap();
        fs::write(
            &store.paths().processed,
            "date,description,amount,category,type,month\n\
             2024-01-06,Customer payment via Stripe,200.0,Revenue,Revenue,2024-01\n\
             2024-01-05,Payment to AWS for cloud hosting,-50.0,Hosting Expenses,Accounts Payable,2024-01\n",
        )
        .unwrap();

        let rows = store.processed_transactions().unwrap();
        assert_eq!(rows[0].id, TransactionId(2));
        assert_eq!(rows[1].id, TransactionId(1));
        assert_eq!(rows[1].due_date, Some(rows[1].date));
        assert_eq!(rows[1].payment_status, PaymentStatus::Unpaid);

        let text = fs::read_to_string(&store.paths().processed).unwrap();
        assert!(text.starts_with(
            "transaction_id,date,description,amount,category,type,month,due_date,payment_status\n\
             2,2024-01-06,Customer payment via Stripe,200.0,Revenue,Revenue,2024-01,2024-01-06,Unpaid\n"
        ));
    }

    #[test]
    fn test_unmatched_legacy_rows_get_fresh_ids() {
        let (_dir, store) = store();
        fs::write(
            &store.paths().raw,
            "transaction_id,date,description,amount\n1,2024-01-05,AWS,-50.00\n",
        )
        .unwrap();
        fs::write(
            &store.paths().processed,
            "date,description,amount,category,type,month\n\
             2024-01-05,AWS,-50.00,Hosting,Expense,2024-01\n\
             2024-01-05,AWS,-50.00,Hosting,Expense,2024-01\n",
        )
        .unwrap();
        let ids: Vec<u64> = store
            .processed_transactions()
            .unwrap()
            .iter()
            .map(|t| t.id.0)
            .collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[test]
    fn test_report_load_skips_unusable_dates() {
        let (_dir, store) = store();
        fs::write(
            &store.paths().processed,
            "transaction_id,date,description,amount,category,type,month,due_date,payment_status\n\
             1,2024-01-05,ok,-5.00,Office Supplies,Accounts Payable,2024-01,2024-01-05,Unpaid\n\
             2,someday,bad,-5.00,Office Supplies,Accounts Payable,2024-01,later,Unpaid\n",
        )
        .unwrap();

        let report = store.processed_for_report().unwrap();
        assert_eq!(report.rows.len(), 1);
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].line, Some(3));

        assert!(matches!(
            store.processed_transactions().unwrap_err(),
            KeeperError::Parse { .. }
        ));
    }

    #[test]
    fn test_legacy_due_dates_come_from_the_date_column() {
        let (_dir, store) = store();
        fs::write(
            &store.paths().raw,
            "date,description,amount\n2024-01-05,Payment to AWS for cloud hosting,-50.0\n",
        )
        .unwrap();
        fs::write(
            &store.paths().processed,
            "date,description,amount,category,type,month\n\
             2024-01-05,Payment to AWS for cloud hosting,-50.0,Hosting Expenses,Accounts Payable,2024-01\n",
        )
        .unwrap();

        let rows = store.processed_transactions().unwrap();
        assert_eq!(rows[0].id, TransactionId(1));
        assert_eq!(rows[0].due_date, NaiveDate::from_ymd_opt(2024, 1, 5));

        let expected = "transaction_id,date,description,amount,category,type,month,due_date,payment_status\n\
                        1,2024-01-05,Payment to AWS for cloud hosting,-50.0,Hosting Expenses,Accounts Payable,2024-01,2024-01-05,Unpaid\n";
        assert_eq!(fs::read_to_string(&store.paths().processed).unwrap(), expected);

        // Already migrated: reading again leaves the file alone
        assert_eq!(store.processed_transactions().unwrap(), rows);
        assert_eq!(fs::read_to_string(&store.paths().processed).unwrap(), expected);
    }

    #[test]
    fn test_migration_with_unreadable_row_is_not_written() {
        let (_dir, store) = store();
        let legacy = "date,description,amount,category,type,month\n\
                      2024-01-05,ok,-5.00,Office Supplies,Accounts Payable,2024-01\n\
                      someday,bad,-5.00,Office Supplies,Accounts Payable,2024-01\n";
        fs::write(&store.paths().processed, legacy).unwrap();

        assert!(matches!(
            store.processed_transactions().unwrap_err(),
            KeeperError::Parse { .. }
        ));
        assert_eq!(fs::read_to_string(&store.paths().processed).unwrap(), legacy);

        let report = store.processed_for_report().unwrap();
        assert_eq!(report.rows.len(), 1);
        assert_eq!(report.rows[0].due_date, NaiveDate::from_ymd_opt(2024, 1, 5));
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].line, Some(3));
    }
}
