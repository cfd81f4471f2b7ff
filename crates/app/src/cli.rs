use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(name = "shopkeep")]
#[command(about = "Store management: clients, stock, sales, cash flow and receivables")]
pub struct Cli {
    /// Optional config file path (TOML, extension optional).
    #[arg(long, global = true)]
    pub config: Option<String>,
    /// Override database (`memory` or a sqlite file path).
    #[arg(long, global = true)]
    pub database: Option<String>,
    /// Override the key the store document is saved under.
    #[arg(long, global = true)]
    pub storage_key: Option<String>,
    /// Override log level (error, warn, info, debug, trace).
    #[arg(long, global = true)]
    pub level: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Dashboard figures.
    Stats,
    /// List (or search) the records of a collection.
    List(ListArgs),
    /// Period report.
    Report(ReportArgs),
    /// Copy recurring expenses into a given day.
    Recurring {
        #[arg(long)]
        date: NaiveDate,
    },
    /// Mark a receivable as paid.
    Pay { receivable_id: String },
    /// Write a backup snapshot to a file, or stdout.
    Export {
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Replace all data with a backup snapshot.
    Import { input: PathBuf },
    /// Delete all data.
    Clear,
    /// Print the stored settings.
    Settings,
    /// Restore default settings.
    ResetSettings,
    /// Size in bytes of the stored document.
    Size,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum CollectionName {
    Clients,
    Products,
    Sales,
    CashFlow,
    Expenses,
    Receivables,
}

#[derive(Args, Debug)]
pub struct ListArgs {
    pub collection: CollectionName,
    /// Accent-insensitive text filter.
    #[arg(long)]
    pub search: Option<String>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum ReportKind {
    Sales,
    Receivables,
    Profitability,
    Ranking,
    Inventory,
    CashFlow,
}

#[derive(Args, Debug)]
pub struct ReportArgs {
    pub kind: ReportKind,
    /// First day included (YYYY-MM-DD).
    #[arg(long)]
    pub from: Option<NaiveDate>,
    /// Last day included (YYYY-MM-DD).
    #[arg(long)]
    pub to: Option<NaiveDate>,
    /// Receivables report: only this client.
    #[arg(long)]
    pub client: Option<String>,
    /// Receivables report: pending, paid or overdue.
    #[arg(long)]
    pub status: Option<String>,
    /// Inventory report: only this category.
    #[arg(long)]
    pub category: Option<String>,
}
