mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "sp1500")]
#[command(about = "Build the S&P 1500 company table and enrich it with price snapshots")]
struct Cli {
    /// Debug logging and per-symbol progress
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scrape the index constituents and write one metadata row per company
    Universe(commands::universe::UniverseArgs),
    /// Add historical price snapshots to an existing company table
    Snapshots(commands::snapshots::SnapshotsArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(format!("sp1500={}", level).parse()?),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match &cli.command {
        Commands::Universe(args) => commands::universe::run(args).await?,
        Commands::Snapshots(args) => commands::snapshots::run(args, cli.verbose).await?,
    }

    Ok(())
}
