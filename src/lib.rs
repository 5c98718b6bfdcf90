//! # Feed-LOB-Reconciler
//!
//! Leveled order-book reconstruction and reconciliation for two independently
//! formatted market-data captures: a quoted CSV snapshot feed and a
//! brace-delimited structured log feed.
//!
//! Each feed is reduced to an [`OrderBook`]: per-depth price → quantity-set
//! levels for bids and asks, per-depth feed totals and an index of the best
//! (smallest-spread) inside markets. The two books are then compared level by
//! level to show which prices and quantities one source saw and the other did
//! not.
//!
//! ## Features
//!
//! - **Depth-bounded aggregation**: tokens past the configured depth are ignored
//! - **Set semantics**: duplicate (price, quantity) pairs collapse per level
//! - **Best-spread index**: ordered by `(spread, top bid)` for top-N extraction
//! - **Tagged differences**: price-only vs. quantity-at-shared-price vs. unmatched level
//! - **Parallel ingestion**: both feeds read on their own thread, joined before diffing
//! - **Reports**: HTML summary injected between template markers, JSON dump
//!
//! ## Quick Start
//!
//! ```rust
//! use feed_lob_reconciler::{BookConfig, OrderBook, PriceQty, Reconciliation};
//!
//! let mut csv = OrderBook::with_config("feeds.csv", BookConfig::new(5));
//! csv.ingest(
//!     vec![PriceQty::new(10, 100), PriceQty::new(9, 50)],
//!     vec![PriceQty::new(11, 80)],
//! );
//!
//! let mut log = OrderBook::with_config("feeds.log", BookConfig::new(5));
//! log.ingest(vec![PriceQty::new(10, 100)], vec![PriceQty::new(11, 80)]);
//!
//! let recon = Reconciliation::between(&csv, &log);
//! // Level 2 of the bids exists only in the CSV book
//! assert_eq!(recon.bids.len(), 2);
//! assert!(recon.bids[0].is_empty());
//! assert_eq!(recon.bids[1].only_in_a.len(), 1);
//! ```
//!
//! ### Full Run
//!
//! ```ignore
//! use feed_lob_reconciler::{pipeline, ReconConfig};
//!
//! let config = ReconConfig::load_json("recon.json")?;
//! let outcome = pipeline::run(&config)?;
//! println!("{} differences", outcome.reconciliation.difference_count());
//! ```
//!
//! ## Module Overview
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`types`] | Core types: `PriceQty`, `BidAskSnapshot`, `Side` |
//! | [`book`] | Aggregation: `OrderBook`, `LeveledBook`, `PriceLevel`, `BestSpreadIndex` |
//! | [`tokenizer`] | `LevelTokenizer`: regex extraction of (price, quantity) pairs |
//! | [`feed`] | `FeedReader`: line-by-line ingestion of CSV and log feeds |
//! | [`reconcile`] | `diff_levels`, `Reconciliation`: level-by-level set differences |
//! | [`statistics`] | `BookSummary`, `RunningStats` |
//! | [`report`] | HTML rendering, marker injection, JSON export |
//! | [`pipeline`] | Parallel ingestion and end-to-end runs |
//! | [`config`] | `ReconConfig` JSON configuration |
//! | [`warnings`] | `WarningTracker` for non-fatal data-quality issues |

pub mod book;
pub mod config;
pub mod error;
pub mod feed;
pub mod pipeline;
pub mod reconcile;
pub mod report;
pub mod statistics;
pub mod tokenizer;
pub mod types;
pub mod warnings;

// Re-exports - Core types
pub use error::{ReconError, Result};
pub use types::{
    BidAskSnapshot, Price, PriceQty, Quantity, Side, DEFAULT_BEST_SPREADS, DEFAULT_BOOK_LEVELS,
};

// Re-exports - Aggregation
pub use book::{BestSpreadIndex, BookConfig, IngestOutcome, LeveledBook, OrderBook, PriceLevel, SpreadKey};

// Re-exports - Ingestion
pub use feed::{FeedFormat, FeedReader, FeedStats, IngestedFeed};
pub use tokenizer::{LevelTokenizer, CSV_LEVEL_PATTERN, LOG_LEVEL_PATTERN};

// Re-exports - Reconciliation
pub use reconcile::{diff_levels, DiffEntry, LevelCoverage, LevelDiff, Reconciliation};

// Re-exports - Statistics and reporting
pub use report::{HtmlReport, ReconReport};
pub use statistics::{BookSummary, RunningStats, SpreadSummary};

// Re-exports - Configuration
pub use config::{ReconConfig, ReportConfig};

// Re-exports - Warnings
pub use warnings::{
    Warning, WarningCategory, WarningSummary, WarningTracker, WarningTrackerConfig,
};
