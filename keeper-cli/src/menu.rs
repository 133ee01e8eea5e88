//! Interactive menu: a static table of `(key, label, action)` dispatched to plain handlers.

use anyhow::{anyhow, Result};
use chrono::NaiveDate;
use keeper_core::{LedgerType, DATE_FORMAT};
use std::io::{BufRead, Write};

use crate::commands::{self, prompt, today, App};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuAction {
    AddTransaction,
    ProcessTransactions,
    ViewStatus,
    ReceivablesAging,
    PayablesAging,
    MarkPaid,
    Exit,
}

pub const MENU: [(&str, &str, MenuAction); 7] = [
    ("1", "Add transaction", MenuAction::AddTransaction),
    ("2", "Process transactions", MenuAction::ProcessTransactions),
    ("3", "View status", MenuAction::ViewStatus),
    ("4", "Generate AR aging report", MenuAction::ReceivablesAging),
    ("5", "Generate AP aging report", MenuAction::PayablesAging),
    ("6", "Mark transaction as paid", MenuAction::MarkPaid),
    ("7", "Exit", MenuAction::Exit),
];

pub fn lookup(key: &str) -> Option<MenuAction> {
    MENU.iter()
        .find(|(k, _, _)| *k == key.trim())
        .map(|(_, _, action)| *action)
}

/// Run the menu until Exit or end of input. Handler errors are printed and the
/// menu continues.
pub fn run_menu(app: &App, input: &mut dyn BufRead, out: &mut dyn Write) -> Result<()> {
    loop {
        writeln!(out, "\n====== Bookkeeper ======")?;
        for (key, label, _) in MENU {
            writeln!(out, "{key}. {label}")?;
        }
        let Some(choice) = prompt(input, out, "Choose an option")? else {
            break;
        };
        let Some(action) = lookup(&choice) else {
            writeln!(out, "Invalid choice: {choice:?}")?;
            continue;
        };
        if action == MenuAction::Exit {
            writeln!(out, "Goodbye.")?;
            break;
        }
        if let Err(e) = dispatch(app, action, input, out) {
            writeln!(out, "Error: {e:#}")?;
        }
    }
    Ok(())
}

fn dispatch(app: &App, action: MenuAction, input: &mut dyn BufRead, out: &mut dyn Write) -> Result<()> {
    match action {
        MenuAction::AddTransaction => add_transaction(app, input, out),
        MenuAction::ProcessTransactions => commands::process(app, out),
        MenuAction::ViewStatus => commands::status(app, out),
        MenuAction::ReceivablesAging => commands::aging(app, LedgerType::AccountsReceivable, today(), out),
        MenuAction::PayablesAging => commands::aging(app, LedgerType::AccountsPayable, today(), out),
        MenuAction::MarkPaid => commands::mark_paid_interactive(app, input, out),
        MenuAction::Exit => Ok(()),
    }
}

fn add_transaction(app: &App, input: &mut dyn BufRead, out: &mut dyn Write) -> Result<()> {
    let Some(date) = prompt(input, out, "Date (YYYY-MM-DD, blank for today)")? else {
        return Ok(());
    };
    let date = if date.is_empty() {
        today()
    } else {
        NaiveDate::parse_from_str(&date, DATE_FORMAT).map_err(|e| anyhow!("date {date:?}: {e}"))?
    };
    let Some(description) = prompt(input, out, "Description")? else {
        return Ok(());
    };
    let Some(amount) = prompt(input, out, "Amount (negative for money out)")? else {
        return Ok(());
    };
    commands::add(app, date, &description, &amount, out)
}
