use clap::Parser;
use engine::{
    Engine, InventoryFilter, Period, ReceivableStatusFilter, ReceivablesFilter, StockStatus,
    search,
};
use migration::{Migrator, MigratorTrait};
use serde::Serialize;

use crate::{
    cli::{Cli, CollectionName, Command, ListArgs, ReportArgs, ReportKind},
    error::{AppError, Result},
    settings::AppConfig,
};

mod cli;
mod error;
mod settings;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let settings = settings::load(&cli)?;

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "shopkeep={level},engine={level}",
            level = settings.level
        ))
        .with_writer(std::io::stderr)
        .init();

    let engine = build_engine(&settings).await?;
    run(&engine, cli.command).await
}

async fn build_engine(settings: &AppConfig) -> Result<Engine> {
    let url = settings.database().url();
    tracing::debug!("connecting to {url}");
    let database = sea_orm::Database::connect(url).await?;
    Migrator::up(&database, None).await?;

    Ok(Engine::builder()
        .database(database)
        .storage_key(&settings.storage_key)
        .build()
        .await?)
}

async fn run(engine: &Engine, command: Command) -> Result<()> {
    match command {
        Command::Stats => {
            let stats = engine.statistics().await;
            let currency = engine.settings().await.currency;
            tracing::info!(
                "balance {}, receivables {}",
                currency.format(stats.current_balance),
                currency.format(stats.total_receivables)
            );
            print_json(&stats)
        }
        Command::List(args) => list(engine, args).await,
        Command::Report(args) => report(engine, args).await,
        Command::Recurring { date } => {
            let at = date
                .and_hms_opt(12, 0, 0)
                .ok_or_else(|| AppError::Argument(format!("invalid date {date}")))?
                .and_utc();
            let created = engine.create_recurring_expenses(at).await?;
            tracing::info!("created {} expenses", created.len());
            print_json(&created)
        }
        Command::Pay { receivable_id } => {
            print_json(&engine.mark_receivable_paid(&receivable_id).await?)
        }
        Command::Export { output } => {
            let snapshot = engine.export_snapshot().await?;
            match output {
                Some(path) => {
                    tokio::fs::write(&path, snapshot).await?;
                    tracing::info!("snapshot written to {}", path.display());
                }
                None => println!("{snapshot}"),
            }
            Ok(())
        }
        Command::Import { input } => {
            let snapshot = tokio::fs::read_to_string(&input).await?;
            let doc = engine.import_snapshot(&snapshot).await?;
            tracing::info!(
                "imported {} clients, {} products, {} sales",
                doc.clients.len(),
                doc.products.len(),
                doc.sales.len()
            );
            Ok(())
        }
        Command::Clear => Ok(engine.clear_all_data().await?),
        Command::Settings => print_json(&engine.settings().await),
        Command::ResetSettings => print_json(&engine.reset_settings().await?),
        Command::Size => {
            println!("{}", engine.storage_size().await?);
            Ok(())
        }
    }
}

async fn list(engine: &Engine, args: ListArgs) -> Result<()> {
    let term = args.search.unwrap_or_default();
    match args.collection {
        CollectionName::Clients => print_json(&engine.search_clients(&term).await),
        CollectionName::Products => print_json(&engine.search_products(&term).await),
        CollectionName::Sales => {
            let sales = engine.sales().await;
            print_json(&search(&sales, &term))
        }
        CollectionName::CashFlow => print_json(&engine.search_cash_flow_entries(&term).await),
        CollectionName::Expenses => print_json(&engine.search_expenses(&term).await),
        CollectionName::Receivables => {
            let receivables = engine.receivables().await;
            print_json(&search(&receivables, &term))
        }
    }
}

async fn report(engine: &Engine, args: ReportArgs) -> Result<()> {
    let period = Period::new(args.from, args.to);
    match args.kind {
        ReportKind::Sales => print_json(&engine.sales_report(period).await),
        ReportKind::Receivables => {
            let status = args
                .status
                .as_deref()
                .map(parse_receivable_status)
                .transpose()?;
            let filter = ReceivablesFilter {
                client_id: args.client,
                status,
            };
            print_json(&engine.receivables_report(period, &filter).await)
        }
        ReportKind::Profitability => print_json(&engine.profitability_report(period).await),
        ReportKind::Ranking => print_json(&engine.product_ranking(period).await),
        ReportKind::Inventory => {
            let status = args
                .status
                .as_deref()
                .map(parse_stock_status)
                .transpose()?;
            let filter = InventoryFilter {
                category: args.category,
                status,
            };
            print_json(&engine.inventory_report(&filter).await)
        }
        ReportKind::CashFlow => print_json(&engine.cash_flow_report(period).await),
    }
}

fn parse_receivable_status(raw: &str) -> Result<ReceivableStatusFilter> {
    match raw {
        "pending" => Ok(ReceivableStatusFilter::Pending),
        "paid" => Ok(ReceivableStatusFilter::Paid),
        "overdue" => Ok(ReceivableStatusFilter::Overdue),
        other => Err(AppError::Argument(format!(
            "unknown receivable status: {other}"
        ))),
    }
}

fn parse_stock_status(raw: &str) -> Result<StockStatus> {
    match raw {
        "available" => Ok(StockStatus::Available),
        "low" => Ok(StockStatus::Low),
        "out" => Ok(StockStatus::Out),
        other => Err(AppError::Argument(format!("unknown stock status: {other}"))),
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
