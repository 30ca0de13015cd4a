//! BankQA CLI - Main Entry Point
//!
//! Runs the online banking end-to-end suite, records every outcome and
//! answers questions about run history: pass rates, flaky tests and the
//! slowest passing tests.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::debug;

mod commands;
mod config;
mod output;

use bankqa_metrics::RunRecorder;
use commands::{metrics, suite};

/// BankQA - E2E suite driver and test metrics
#[derive(Parser, Debug)]
#[command(name = "bankqa")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Configuration file
    #[arg(long, default_value = "bankqa.toml", env = "BANKQA_CONFIG", global = true)]
    config: PathBuf,

    /// Metrics directory (overrides the configuration file)
    #[arg(long, env = "BANKQA_METRICS_DIR", global = true)]
    metrics_dir: Option<PathBuf>,

    /// Output format
    #[arg(long, default_value = "table", global = true)]
    format: output::OutputFormat,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the Playwright suite and record its outcomes
    Run(suite::RunArgs),

    /// Record outcomes from saved Playwright JSON reports
    Ingest(suite::IngestArgs),

    /// Record a single outcome
    Record(metrics::RecordArgs),

    /// Show pass/fail/skip counts and average duration
    Stats,

    /// List flaky tests by failure rate
    Flaky(metrics::FlakyArgs),

    /// List the slowest passing tests
    Slowest(metrics::CountArgs),

    /// List the most recent outcomes
    Recent(metrics::CountArgs),

    /// Render the HTML metrics dashboard
    Report,

    /// Delete all recorded outcomes and counters
    Clear(metrics::ClearArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let mut config = config::Config::load(&cli.config)?;
    if let Some(dir) = cli.metrics_dir {
        config.metrics.dir = dir;
    }
    debug!("Metrics directory: {}", config.metrics.dir.display());

    let mut recorder = RunRecorder::open(config.metrics.clone());
    let format = cli.format;

    let passed = match cli.command {
        Commands::Run(args) => suite::run(args, &config.suite, &mut recorder, format).await?,
        Commands::Ingest(args) => suite::ingest(args, &config.suite, &mut recorder, format)?,
        Commands::Record(args) => {
            metrics::record(args, &mut recorder)?;
            true
        }
        Commands::Stats => {
            metrics::stats(&recorder, format)?;
            true
        }
        Commands::Flaky(args) => {
            metrics::flaky(args, &recorder, format)?;
            true
        }
        Commands::Slowest(args) => {
            metrics::slowest(args, &recorder, format)?;
            true
        }
        Commands::Recent(args) => {
            metrics::recent(args, &recorder, format)?;
            true
        }
        Commands::Report => {
            metrics::report(&recorder, format)?;
            true
        }
        Commands::Clear(args) => {
            metrics::clear(args, &mut recorder)?;
            true
        }
    };

    if !passed {
        std::process::exit(1);
    }
    Ok(())
}
