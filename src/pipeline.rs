//! End-to-end run: ingest both feeds in parallel, reconcile, report.
//!
//! The two feeds share no state while they are read; each worker owns its
//! `OrderBook` until it returns. Both workers are joined before anything is
//! reconciled, and the completed books are handed out as `Arc<OrderBook>`
//! so reconciliation and reporting share them read-only.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;

use crate::book::{BookConfig, OrderBook};
use crate::config::ReconConfig;
use crate::error::{ReconError, Result};
use crate::feed::{FeedFormat, FeedReader, FeedStats, IngestedFeed};
use crate::reconcile::Reconciliation;
use crate::report::{self, ReconReport};
use crate::statistics::BookSummary;
use crate::warnings::{WarningTracker, WarningTrackerConfig};

/// One feed to ingest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedJob {
    pub format: FeedFormat,
    pub path: PathBuf,
}

impl FeedJob {
    pub fn new(format: FeedFormat, path: impl Into<PathBuf>) -> Self {
        Self {
            format,
            path: path.into(),
        }
    }

    /// Name of the book built from this job.
    pub fn source_name(&self) -> String {
        self.path.display().to_string()
    }

    /// Read the feed on the current thread.
    pub fn run(&self, config: BookConfig) -> Result<IngestedFeed> {
        FeedReader::new(self.format, self.source_name(), config).read_path(&self.path)
    }
}

/// A completed, immutable book with the statistics of its feed.
#[derive(Debug, Clone)]
pub struct CompletedFeed {
    pub book: Arc<OrderBook>,
    pub stats: FeedStats,
}

/// Both books after a successful parallel ingestion.
#[derive(Debug)]
pub struct IngestedPair {
    pub a: CompletedFeed,
    pub b: CompletedFeed,
    /// Warnings of both feeds
    pub warnings: WarningTracker,
}

/// Read two feeds on two threads and join both.
///
/// A failure in one feed does not interrupt the other. When either fails the
/// error is returned tagged with its source once both have finished; if both
/// fail, the first job's error is returned and the second is logged.
pub fn ingest_pair(a: &FeedJob, b: &FeedJob, config: &BookConfig) -> Result<IngestedPair> {
    config.validate()?;

    let (result_a, result_b) = thread::scope(|scope| {
        let worker_a = scope.spawn(|| a.run(config.clone()));
        let worker_b = scope.spawn(|| b.run(config.clone()));
        (
            join_worker(worker_a.join(), a),
            join_worker(worker_b.join(), b),
        )
    });

    let (feed_a, feed_b) = match (result_a, result_b) {
        (Ok(feed_a), Ok(feed_b)) => (feed_a, feed_b),
        (Err(err), Ok(_)) | (Ok(_), Err(err)) => {
            log::error!("{err}");
            return Err(err);
        }
        (Err(err_a), Err(err_b)) => {
            log::error!("{err_a}");
            log::error!("{err_b}");
            return Err(err_a);
        }
    };

    let mut warnings = WarningTracker::with_config(WarningTrackerConfig {
        log_warnings: false,
        ..Default::default()
    });
    warnings.absorb(feed_a.warnings);
    warnings.absorb(feed_b.warnings);

    Ok(IngestedPair {
        a: CompletedFeed {
            book: Arc::new(feed_a.book),
            stats: feed_a.stats,
        },
        b: CompletedFeed {
            book: Arc::new(feed_b.book),
            stats: feed_b.stats,
        },
        warnings,
    })
}

fn join_worker(
    joined: thread::Result<Result<IngestedFeed>>,
    job: &FeedJob,
) -> Result<IngestedFeed> {
    match joined {
        Ok(result) => result.map_err(|e| e.in_source(job.source_name())),
        Err(_) => Err(ReconError::WorkerPanicked(job.source_name())),
    }
}

/// Everything computed by a run, before any output is written.
#[derive(Debug)]
pub struct ReconOutcome {
    pub ingested: IngestedPair,
    pub reconciliation: Reconciliation,
    pub summaries: [BookSummary; 2],
}

impl ReconOutcome {
    /// Serializable view of the run.
    pub fn report(&self) -> ReconReport {
        ReconReport {
            summaries: self.summaries.to_vec(),
            feed_stats: vec![self.ingested.a.stats.clone(), self.ingested.b.stats.clone()],
            warnings: self.ingested.warnings.summary(),
            reconciliation: self.reconciliation.clone(),
        }
    }
}

/// Ingest the configured CSV and log feeds and reconcile them.
pub fn analyze(config: &ReconConfig) -> Result<ReconOutcome> {
    config.validate()?;

    let csv = FeedJob::new(FeedFormat::CsvSnapshot, &config.csv_feed);
    let log = FeedJob::new(FeedFormat::StructuredLog, &config.log_feed);
    let ingested = ingest_pair(&csv, &log, &config.book_config())?;

    let reconciliation = Reconciliation::between(&ingested.a.book, &ingested.b.book);
    let summaries = [
        BookSummary::from_book(&ingested.a.book, config.best_spreads),
        BookSummary::from_book(&ingested.b.book, config.best_spreads),
    ];

    Ok(ReconOutcome {
        ingested,
        reconciliation,
        summaries,
    })
}

/// Full run: analyze, inject the HTML summary and write optional JSON files.
pub fn run(config: &ReconConfig) -> Result<ReconOutcome> {
    let outcome = analyze(config)?;

    let fragment = report::HtmlReport::new(&config.report.summary_title)
        .render(&outcome.summaries, &outcome.reconciliation);
    report::inject_into_file(
        &config.report.file,
        &fragment,
        &config.report.marker_begin,
        &config.report.marker_end,
    )?;
    log::info!("Report written to {}", config.report.file.display());

    if let Some(path) = &config.report.json_file {
        report::write_json(path, &outcome.report())?;
        log::info!("JSON report written to {}", path.display());
    }
    if let Some(path) = &config.report.warnings_file {
        outcome.ingested.warnings.export_to_file(path)?;
    }

    Ok(outcome)
}

/// Convenience: ingest a single feed file, guessing its format from the extension.
pub fn ingest_file(path: impl AsRef<Path>, config: BookConfig) -> Result<IngestedFeed> {
    let path = path.as_ref();
    let format = FeedFormat::from_path(path).ok_or_else(|| {
        ReconError::InvalidConfig(format!("unknown feed format for {}", path.display()))
    })?;
    FeedJob::new(format, path).run(config)
}
