use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use keeper_core::{LedgerType, TransactionId};
use log::info;
use std::io;

mod commands;
mod config;
mod llm;
mod menu;
mod state;

use commands::App;

#[derive(Parser, Debug)]
#[command(
    name = "keeper",
    version = concat!(env!("CARGO_PKG_VERSION"), " (", env!("KEEPER_BUILD_SHA"), ")"),
    about = "Bookkeeping assistant: categorize transactions, monthly summaries, AP/AR aging"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Record a raw transaction (categorized on the next `process`)
    Add {
        description: String,

        /// Signed amount; negative for money out
        #[arg(allow_negative_numbers = true)]
        amount: String,

        /// Transaction date, YYYY-MM-DD (default: today)
        #[arg(long)]
        date: Option<NaiveDate>,
    },

    /// Categorize new transactions and update the monthly summary
    Process,

    /// Show the monthly summary and ledger counts
    Status,

    /// Accounts receivable or payable aging report
    Aging {
        #[arg(value_enum)]
        kind: AgingKind,

        /// Age items as of this date, YYYY-MM-DD (default: today)
        #[arg(long)]
        as_of: Option<NaiveDate>,
    },

    /// Mark a processed transaction as paid (prompts when --id is omitted)
    MarkPaid {
        #[arg(long)]
        id: Option<u64>,
    },

    /// Interactive menu (default)
    Menu,

    /// Manage ~/.keeper/config.toml
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum AgingKind {
    /// Accounts receivable
    Ar,
    /// Accounts payable
    Ap,
}

impl From<AgingKind> for LedgerType {
    fn from(kind: AgingKind) -> Self {
        match kind {
            AgingKind::Ar => LedgerType::AccountsReceivable,
            AgingKind::Ap => LedgerType::AccountsPayable,
        }
    }
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Write a default config.toml if none exists
    Init,
    /// Print the effective configuration (file plus environment)
    Show,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    if let Some(Command::Config { command }) = &cli.command {
        return match command {
            ConfigCommand::Init => config::init_config(),
            ConfigCommand::Show => show_config(),
        };
    }

    let home = state::ensure_keeper_home()?;
    let cfg = config::load_config()?;
    let app = App::from_config(&cfg, &home)?;
    info!("ledger directory {}", cfg.data_dir(&home).display());

    let stdout = io::stdout();
    let mut out = stdout.lock();

    match cli.command.unwrap_or(Command::Menu) {
        Command::Add {
            description,
            amount,
            date,
        } => {
            let date = date.unwrap_or_else(commands::today);
            commands::add(&app, date, &description, &amount, &mut out)?;
        }
        Command::Process => commands::process(&app, &mut out)?,
        Command::Status => commands::status(&app, &mut out)?,
        Command::Aging { kind, as_of } => {
            let as_of = as_of.unwrap_or_else(commands::today);
            commands::aging(&app, kind.into(), as_of, &mut out)?;
        }
        Command::MarkPaid { id: Some(id) } => {
            commands::mark_paid_by_id(&app, TransactionId(id), &mut out)?;
        }
        Command::MarkPaid { id: None } => {
            let stdin = io::stdin();
            commands::mark_paid_interactive(&app, &mut stdin.lock(), &mut out)?;
        }
        Command::Menu => {
            let stdin = io::stdin();
            menu::run_menu(&app, &mut stdin.lock(), &mut out)?;
        }
        Command::Config { .. } => {}
    }

    Ok(())
}

fn show_config() -> Result<()> {
    let home = state::ensure_keeper_home()?;
    let cfg = config::load_config()?;
    let text = toml::to_string_pretty(&cfg).context("serialize config")?;
    println!("# {}", config::config_path()?.display());
    println!("{}", text.trim_end());
    println!("\n# ledger directory: {}", cfg.data_dir(&home).display());
    for var in ["OPENAI_API_KEY", "ANTHROPIC_API_KEY"] {
        let set = std::env::var(var).is_ok_and(|v| !v.trim().is_empty());
        println!("# {var}: {}", if set { "set" } else { "not set" });
    }
    Ok(())
}
