use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use orioz_db::{MemoryStore, Store};
use orioz_kernel::settings::{SeedStrategy, Settings};
use orioz_kernel::Report;

/// Bootstrap the Orioz community database.
#[derive(Debug, Parser)]
#[command(name = "orioz-cli", version, about)]
struct Cli {
    /// Directory holding base.toml and <env>.toml (overrides ORIOZ_CONFIG_DIR)
    #[arg(long, global = true)]
    config_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Create the application user, the collections and the default admin
    Run {
        /// Target database, overriding database.name
        #[arg(long)]
        database: Option<String>,
        #[arg(long, value_enum)]
        strategy: Option<Strategy>,
        /// Leave database users untouched
        #[arg(long)]
        skip_user: bool,
        #[arg(long)]
        json: bool,
    },
    /// Show what a first run would do, without touching any database
    Plan {
        #[arg(long)]
        json: bool,
    },
    /// Report collections present and ADMIN members found
    Status {
        #[arg(long)]
        json: bool,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Strategy {
    CheckThenInsert,
    InsertIfAbsent,
}

impl From<Strategy> for SeedStrategy {
    fn from(strategy: Strategy) -> Self {
        match strategy {
            Strategy::CheckThenInsert => SeedStrategy::CheckThenInsert,
            Strategy::InsertIfAbsent => SeedStrategy::InsertIfAbsent,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let settings = match &cli.config_dir {
        Some(dir) => Settings::load_from(dir),
        None => Settings::load(),
    }
    .with_context(|| "failed to load Orioz settings")?;

    orioz_telemetry::init(&settings.telemetry).ok();
    tracing::debug!(env = ?settings.environment, command = ?cli.command, "orioz-cli starting");

    match cli.command {
        Command::Run {
            database,
            strategy,
            skip_user,
            json,
        } => {
            let settings = apply_overrides(settings, database, strategy, skip_user);
            let store = orioz_seed::connect(&settings).await?;
            let mut report = Report::new(store.database());
            let result = orioz_seed::run_into(&settings, &store, &mut report).await;
            print_report(&report, json)?;
            result
        }
        Command::Plan { json } => {
            let store = MemoryStore::new(settings.database.name.clone());
            let mut report = Report::new(store.database());
            let result = orioz_seed::run_into(&settings, &store, &mut report)
                .await
                .with_context(|| "dry run failed");
            print_report(&report, json)?;
            result
        }
        Command::Status { json } => {
            let store = orioz_seed::connect(&settings).await?;
            let status = orioz_seed::status(&store).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&status)?);
            } else {
                println!("Database '{}'", status.database);
                println!("Collections: {}", status.collections.join(", "));
                if !status.missing.is_empty() {
                    println!("Missing collections: {}", status.missing.join(", "));
                }
                println!("ADMIN members: {}", status.admin_count);
            }
            Ok(())
        }
    }
}

fn apply_overrides(
    mut settings: Settings,
    database: Option<String>,
    strategy: Option<Strategy>,
    skip_user: bool,
) -> Settings {
    if let Some(database) = database {
        settings.database.name = database;
    }
    if let Some(strategy) = strategy {
        settings.admin.strategy = strategy.into();
    }
    if skip_user {
        settings.app_user.enabled = false;
    }
    settings
}

fn print_report(report: &Report, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
    } else {
        print!("{report}");
    }
    Ok(())
}
