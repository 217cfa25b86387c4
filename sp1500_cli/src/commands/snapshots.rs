//! `snapshots`: fetch four years of daily bars per symbol and write the
//! six anchor snapshots back into the company table.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use clap::Args;
use indicatif::ProgressBar;
use sp1500_lib::config::{DEFAULT_SYMBOL_COLUMN, DEFAULT_TABLE_PATH};
use sp1500_lib::massive_api::Client;
use sp1500_lib::validation::{validate_date, validate_workers};
use sp1500_lib::{
    output_columns, run_snapshot_jobs, MassiveBarSource, MassiveConfig, RetryPolicy, Table,
    DEFAULT_WORKERS,
};

#[derive(Args)]
pub struct SnapshotsArgs {
    /// Company table to enrich in place
    #[arg(long, default_value = DEFAULT_TABLE_PATH)]
    pub csv: PathBuf,

    /// Column holding ticker symbols (matched case-insensitively)
    #[arg(long, default_value = DEFAULT_SYMBOL_COLUMN)]
    pub symbol_col: String,

    /// Maximum concurrent symbol jobs (1-256)
    #[arg(long, default_value_t = DEFAULT_WORKERS)]
    pub workers: usize,

    /// Reference date (YYYY-MM-DD), defaults to today in UTC
    #[arg(long)]
    pub ref_date: Option<String>,
}

fn reference_date(arg: Option<&str>) -> Result<NaiveDate> {
    match arg {
        Some(s) => Ok(validate_date(s)?),
        None => Ok(Utc::now().date_naive()),
    }
}

pub async fn run(args: &SnapshotsArgs, verbose: bool) -> Result<()> {
    let workers = validate_workers(args.workers)?;
    let reference = reference_date(args.ref_date.as_deref())?;
    let config = MassiveConfig::from_env()?;

    let mut table = Table::read_path(&args.csv)?;
    let symbol_col = table.resolve_column(&args.symbol_col)?;
    let symbols = table.unique_symbols(&symbol_col)?;

    if symbols.is_empty() {
        table.ensure_columns(&output_columns());
        table
            .write_path(&args.csv)
            .with_context(|| format!("failed to write {}", args.csv.display()))?;
        println!("Wrote {} (no symbols found)", args.csv.display());
        return Ok(());
    }

    tracing::info!(
        "{} symbols, reference date {}, {} workers",
        symbols.len(),
        reference,
        workers
    );

    let client = Client::with_base_url(&config.base_url, config.api_key)?;
    let source = Arc::new(MassiveBarSource::new(client, RetryPolicy::from_env()));

    let pb = if verbose {
        super::progress_bar(symbols.len(), "fetching bars...")?
    } else {
        ProgressBar::hidden()
    };
    let mut failed = 0usize;
    let results = run_snapshot_jobs(source, &symbols, reference, workers, |row| {
        if row.is_error() {
            failed += 1;
        }
        pb.set_message(format!("{} ({} failed)", row.symbol, failed));
        pb.inc(1);
    })
    .await;
    pb.finish_and_clear();

    // Jobs that died without reporting are counted here too.
    let failed = results.values().filter(|r| r.is_error()).count();
    let stats = table.merge_snapshots(&symbol_col, &results)?;
    tracing::debug!(
        "merged {} rows, cleared {} rows",
        stats.matched,
        stats.cleared
    );
    table
        .write_path(&args.csv)
        .with_context(|| format!("failed to write {}", args.csv.display()))?;

    println!(
        "Wrote {}: {} symbols, {} failed",
        args.csv.display(),
        symbols.len(),
        failed
    );
    Ok(())
}
