//! CLI tool reconciling a CSV snapshot feed against a structured log feed.
//!
//! # Usage
//!
//! ```bash
//! # Run from a JSON configuration
//! cargo run --release --bin feed-recon -- --config recon.json
//!
//! # Or give the feeds directly
//! cargo run --release --bin feed-recon -- \
//!     --csv data/feeds.csv \
//!     --log data/feeds.log \
//!     --levels 5 \
//!     --report orderbook.htm \
//!     --json recon.json
//!
//! # Write the effective configuration and exit
//! cargo run --release --bin feed-recon -- --csv a.csv --log b.log --write-config recon.json
//! ```

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

use clap::Parser;

use feed_lob_reconciler::{pipeline, ReconConfig, Result};

/// Command-line arguments
#[derive(Parser, Debug)]
#[command(name = "feed-recon", version, about = "Reconcile two order-book feed captures")]
struct Args {
    /// JSON configuration file; other flags override its values
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,

    /// CSV snapshot feed
    #[arg(long)]
    csv: Option<PathBuf>,

    /// Structured log feed
    #[arg(long)]
    log: Option<PathBuf>,

    /// Maximum book depth read per record
    #[arg(long)]
    levels: Option<usize>,

    /// Number of best spreads shown per book
    #[arg(long)]
    best_spreads: Option<usize>,

    /// HTML report template to inject the summary into
    #[arg(long)]
    report: Option<PathBuf>,

    /// Write summaries and differences as JSON
    #[arg(long)]
    json: Option<PathBuf>,

    /// Export ingestion warnings as JSON
    #[arg(long)]
    warnings: Option<PathBuf>,

    /// Save the effective configuration and exit
    #[arg(long)]
    write_config: Option<PathBuf>,
}

impl Args {
    fn into_config(self) -> Result<(ReconConfig, Option<PathBuf>)> {
        let mut config = match &self.config {
            Some(path) => ReconConfig::load_json(path)?,
            None => ReconConfig::default(),
        };

        if let Some(csv) = self.csv {
            config.csv_feed = csv;
        }
        if let Some(log) = self.log {
            config.log_feed = log;
        }
        if let Some(levels) = self.levels {
            config.book_levels = levels;
        }
        if let Some(n) = self.best_spreads {
            config.best_spreads = n;
        }
        if let Some(report) = self.report {
            config.report.file = report;
        }
        if self.json.is_some() {
            config.report.json_file = self.json;
        }
        if self.warnings.is_some() {
            config.report.warnings_file = self.warnings;
        }

        config.validate()?;
        Ok((config, self.write_config))
    }
}

fn run(args: Args) -> Result<()> {
    let (config, write_config) = args.into_config()?;

    if let Some(path) = write_config {
        config.save_json(&path)?;
        log::info!("Configuration written to {}", path.display());
        return Ok(());
    }

    let start = Instant::now();
    let outcome = pipeline::run(&config)?;

    for summary in &outcome.summaries {
        log::info!(
            "{}: {} feeds, {} bid / {} ask levels, {} best spreads",
            summary.source,
            summary.record_count,
            summary.bid_levels,
            summary.ask_levels,
            summary.best_spreads.len()
        );
    }
    log::info!(
        "{} level differences, {} warnings, done in {:.2}s",
        outcome.reconciliation.difference_count(),
        outcome.ingested.warnings.total_count(),
        start.elapsed().as_secs_f64()
    );

    Ok(())
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match run(Args::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("{err}");
            ExitCode::FAILURE
        }
    }
}
