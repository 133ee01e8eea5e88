//! Command handlers shared by the subcommands and the interactive menu.

use anyhow::{anyhow, Context, Result};
use chrono::NaiveDate;
use keeper_books::{
    add_transaction, aging_report, list_unpaid, mark_paid, run_processing, select_unpaid,
    view_status,
};
use keeper_core::{
    format_amount, parse_amount, ClassificationPolicy, KeeperError, LedgerType, TransactionId,
    DATE_FORMAT,
};
use keeper_store::LedgerStore;
use log::debug;
use std::fs;
use std::io::{BufRead, Write};
use std::path::Path;

use crate::config::{Config, LlmSection};
use crate::llm::build_oracle;

pub const NOTHING_YET: &str = "Nothing processed yet. Run `keeper process` first.";

/// Everything a command needs: the store, the policy and the oracle settings
pub struct App {
    pub store: LedgerStore,
    pub policy: ClassificationPolicy,
    pub llm: LlmSection,
}

impl App {
    pub fn from_config(cfg: &Config, home: &Path) -> Result<Self> {
        let dir = cfg.data_dir(home);
        fs::create_dir_all(&dir).with_context(|| format!("create {}", dir.display()))?;
        Ok(Self {
            store: LedgerStore::new(cfg.store_paths(home)),
            policy: cfg.classification.clone(),
            llm: cfg.llm.clone(),
        })
    }
}

pub fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

pub fn add(
    app: &App,
    date: NaiveDate,
    description: &str,
    amount: &str,
    out: &mut dyn Write,
) -> Result<()> {
    let amount = parse_amount(amount).map_err(|e| anyhow!("amount {amount:?}: {e}"))?;
    let txn = add_transaction(&app.store, date, description, amount)?;
    writeln!(
        out,
        "Added transaction {}: {} | {} | {}",
        txn.id,
        txn.date.format(DATE_FORMAT),
        txn.description,
        format_amount(txn.amount)
    )?;
    Ok(())
}

pub fn process(app: &App, out: &mut dyn Write) -> Result<()> {
    let oracle = build_oracle(&app.llm)?;
    debug!("classifying with provider {}", app.llm.provider);
    let result = run_processing(&app.store, &oracle, &app.policy).context("process transactions")?;
    write!(out, "{result}")?;
    Ok(())
}

pub fn status(app: &App, out: &mut dyn Write) -> Result<()> {
    match view_status(&app.store) {
        Ok(view) => write!(out, "{view}")?,
        Err(e) if e.is_store_missing() => writeln!(out, "{NOTHING_YET}")?,
        Err(e) => return Err(e).context("view status"),
    }
    Ok(())
}

pub fn aging(app: &App, ledger_type: LedgerType, as_of: NaiveDate, out: &mut dyn Write) -> Result<()> {
    match aging_report(&app.store, as_of, ledger_type) {
        Ok(report) => write!(out, "{report}")?,
        Err(e) if e.is_store_missing() => writeln!(out, "{NOTHING_YET}")?,
        Err(e) => return Err(e).with_context(|| format!("{ledger_type} aging")),
    }
    Ok(())
}

pub fn mark_paid_by_id(app: &App, id: TransactionId, out: &mut dyn Write) -> Result<()> {
    let result = match mark_paid(&app.store, id) {
        Ok(result) => result,
        Err(e) if e.is_store_missing() => {
            writeln!(out, "{NOTHING_YET}")?;
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };
    let t = &result.transaction;
    if result.already_paid {
        writeln!(out, "Transaction {} was already paid.", t.id)?;
    } else {
        writeln!(
            out,
            "Marked transaction {} as paid: {} | {}",
            t.id,
            t.description,
            format_amount(t.amount)
        )?;
    }
    Ok(())
}

/// List unpaid rows, ask for one by number and mark it paid
pub fn mark_paid_interactive(app: &App, input: &mut dyn BufRead, out: &mut dyn Write) -> Result<()> {
    let rows = match app.store.require_processed() {
        Ok(rows) => rows,
        Err(KeeperError::StoreMissing(_)) => {
            writeln!(out, "{NOTHING_YET}")?;
            return Ok(());
        }
        Err(e) => return Err(e).context("load processed transactions"),
    };

    let unpaid = list_unpaid(&rows);
    if unpaid.is_empty() {
        writeln!(out, "No unpaid transactions.")?;
        return Ok(());
    }

    writeln!(out, "Unpaid transactions:")?;
    for (i, t) in unpaid.iter().enumerate() {
        writeln!(
            out,
            "{:>3}. {} | {} | {} | {}",
            i + 1,
            t.date.format(DATE_FORMAT),
            t.description,
            format_amount(t.amount),
            t.ledger_type
        )?;
    }

    let Some(choice) = prompt(input, out, "Number to mark as paid")? else {
        return Ok(());
    };
    let ordinal: usize = choice
        .parse()
        .map_err(|_| anyhow!("not a number: {choice:?}"))?;
    let id = select_unpaid(&rows, ordinal)?.id;
    mark_paid_by_id(app, id, out)
}

/// Print `label` and read one trimmed line; `None` at end of input
pub fn prompt(input: &mut dyn BufRead, out: &mut dyn Write, label: &str) -> Result<Option<String>> {
    write!(out, "{}: ", label)?;
    out.flush().ok();
    let mut s = String::new();
    if input.read_line(&mut s)? == 0 {
        return Ok(None);
    }
    Ok(Some(s.trim().to_string()))
}
