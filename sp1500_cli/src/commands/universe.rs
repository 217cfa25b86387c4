//! `universe`: scrape the S&P 500/400/600 constituents, look up each
//! company's metadata, and write the company table.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Args;
use sp1500_lib::config::{UniverseConfig, DEFAULT_TABLE_PATH};
use sp1500_lib::metadata::{DEFAULT_COOKIE_URL, DEFAULT_YAHOO_BASE_URL};
use sp1500_lib::{build_universe, IndexScraper, MetadataClient, RetryPolicy};

#[derive(Args)]
pub struct UniverseArgs {
    /// Output CSV path
    #[arg(long, default_value = DEFAULT_TABLE_PATH)]
    pub output: PathBuf,

    /// Pause between metadata lookups in milliseconds
    #[arg(long, default_value_t = 200)]
    pub delay_ms: u64,
}

pub async fn run(args: &UniverseArgs) -> Result<()> {
    let config = UniverseConfig::from_env();
    let scraper = IndexScraper::with_base_url(&config.wiki_base_url)?;
    let yahoo_base = config
        .yahoo_base_url
        .as_deref()
        .unwrap_or(DEFAULT_YAHOO_BASE_URL);
    let metadata = MetadataClient::with_urls(yahoo_base, DEFAULT_COOKIE_URL, RetryPolicy::default())?;

    let tickers = scraper
        .fetch_universe()
        .await
        .context("failed to fetch index constituents")?;
    eprintln!("Fetching company info for {} tickers", tickers.len());

    let pb = super::progress_bar(tickers.len(), "fetching company info...")?;
    let (table, stats) = build_universe(
        &metadata,
        &tickers,
        Duration::from_millis(args.delay_ms),
        |ticker| {
            pb.set_message(ticker.to_string());
            pb.inc(1);
        },
    )
    .await;
    pb.finish_with_message(format!(
        "{} found, {} empty, {} failed",
        stats.found, stats.empty, stats.failed
    ));

    if table.is_empty() {
        tracing::warn!("no company info retrieved; writing header only");
    }
    table
        .write_path(&args.output)
        .with_context(|| format!("failed to write {}", args.output.display()))?;

    println!(
        "Wrote {} ({} companies, {} columns)",
        args.output.display(),
        table.len(),
        table.headers().len()
    );
    Ok(())
}
