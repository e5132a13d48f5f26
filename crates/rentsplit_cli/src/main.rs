//! Batch entry point for periodic payout distribution.
//!
//! # Responsibility
//! - Parse tenant/period/database parameters from arguments or
//!   environment.
//! - Run one distribution and print the structured JSON result payload.
//! - Map run outcomes to exit codes for the external scheduler.

use anyhow::Context;
use chrono::Utc;
use clap::Parser;
use rentsplit_core::db::open_db;
use rentsplit_core::{
    default_log_level, init_logging, DistributionEngine, EngineConfig, LockManager, Period,
    RunReport, SqliteAssetRepository, SqliteDistributionRepository, SqliteLockRepository,
};
use serde_json::json;
use std::path::PathBuf;
use std::process::ExitCode;

const EXIT_OK: u8 = 0;
const EXIT_FAILURE: u8 = 1;
const EXIT_ALREADY_RUNNING: u8 = 2;

#[derive(Parser, Debug)]
#[command(
    name = "rentsplit",
    version,
    about = "Distributes periodic payouts to fractional owners"
)]
struct Cli {
    #[arg(env = "TENANT_ID", help = "Tenant whose assets are distributed")]
    tenant_id: String,

    #[arg(
        long,
        env = "PERIOD",
        help = "Distribution period (YYYY-MM); defaults to the current month"
    )]
    period: Option<String>,

    #[arg(long, env = "RENTSPLIT_DB", help = "Path to the SQLite database file")]
    db: PathBuf,

    #[arg(
        long,
        env = "RENTSPLIT_LOG_DIR",
        help = "Enable file logging into this directory"
    )]
    log_dir: Option<PathBuf>,

    #[arg(long, help = "Pretty-print the JSON result payload")]
    pretty: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(code) => ExitCode::from(code),
        Err(err) => {
            // The orchestration boundary reports structured output, not
            // a raw error trace.
            let payload = json!({
                "success": false,
                "reason": "fatal_error",
                "error": format!("{err:#}"),
            });
            println!("{payload}");
            ExitCode::from(EXIT_FAILURE)
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<u8> {
    if let Some(log_dir) = &cli.log_dir {
        let log_dir = log_dir
            .to_str()
            .context("log directory path is not valid UTF-8")?;
        init_logging(default_log_level(), log_dir).map_err(anyhow::Error::msg)?;
    }

    let period = match &cli.period {
        Some(raw) => Period::parse(raw)?,
        None => current_period()?,
    };

    let conn = open_db(&cli.db)
        .with_context(|| format!("failed to open database at {}", cli.db.display()))?;

    let engine = DistributionEngine::new(
        SqliteAssetRepository::new(&conn),
        SqliteDistributionRepository::new(&conn),
        LockManager::new(SqliteLockRepository::new(&conn)),
        EngineConfig::default(),
    );

    let report = engine.run(&cli.tenant_id, &period)?;
    print_report(&report, cli.pretty)?;

    Ok(if report.is_already_running() {
        EXIT_ALREADY_RUNNING
    } else if !report.success || report.has_failures() {
        EXIT_FAILURE
    } else {
        EXIT_OK
    })
}

fn print_report(report: &RunReport, pretty: bool) -> anyhow::Result<()> {
    let payload = if pretty {
        serde_json::to_string_pretty(report)?
    } else {
        serde_json::to_string(report)?
    };
    println!("{payload}");
    Ok(())
}

fn current_period() -> anyhow::Result<Period> {
    let token = Utc::now().format("%Y-%m").to_string();
    Period::parse(&token).context("current month is not a valid period")
}
