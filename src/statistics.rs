//! Summary statistics for reconstructed books.
//!
//! # Key Features
//!
//! - **RunningStats**: Online mean/std of spreads (Welford's algorithm)
//! - **BookSummary**: Record count, populated levels, per-depth totals and
//!   the best (smallest-spread) inside markets of one book
//!
//! # Usage
//!
//! ```
//! use feed_lob_reconciler::{BookSummary, OrderBook, PriceQty};
//!
//! let mut book = OrderBook::new("feeds.csv");
//! book.ingest(vec![PriceQty::new(10, 100)], vec![PriceQty::new(11, 80)]);
//!
//! let summary = BookSummary::from_book(&book, 5);
//! assert_eq!(summary.record_count, 1);
//! assert_eq!(summary.best_spreads[0].mid_point, 10.5);
//! ```

use serde::{Deserialize, Serialize};

use crate::book::OrderBook;
use crate::types::{Price, PriceQty};

// ============================================================================
// Running Statistics (Welford's Algorithm)
// ============================================================================

/// Online algorithm for computing running mean and standard deviation.
///
/// Uses Welford's algorithm for numerical stability with large datasets.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunningStats {
    /// Number of observations
    pub count: u64,
    /// Running mean
    pub mean: f64,
    /// Running M2 (sum of squared differences from mean)
    m2: f64,
    /// Minimum value observed
    pub min: f64,
    /// Maximum value observed
    pub max: f64,
}

impl Default for RunningStats {
    fn default() -> Self {
        Self::new()
    }
}

impl RunningStats {
    /// Create a new running statistics tracker.
    pub fn new() -> Self {
        Self {
            count: 0,
            mean: 0.0,
            m2: 0.0,
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
        }
    }

    /// Update statistics with a new value.
    #[inline]
    pub fn update(&mut self, value: f64) {
        if !value.is_finite() {
            return;
        }

        self.count += 1;
        let delta = value - self.mean;
        self.mean += delta / self.count as f64;
        let delta2 = value - self.mean;
        self.m2 += delta * delta2;

        self.min = self.min.min(value);
        self.max = self.max.max(value);
    }

    /// Get the population variance.
    #[inline]
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / self.count as f64
        }
    }

    /// Get the population standard deviation.
    #[inline]
    pub fn std(&self) -> f64 {
        self.variance().sqrt()
    }

    /// Check if any values have been recorded.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
}

/// Serializable view of spread statistics (`None` fields when empty).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpreadStatsSummary {
    pub count: u64,
    pub mean: Option<f64>,
    pub std: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl From<&RunningStats> for SpreadStatsSummary {
    fn from(stats: &RunningStats) -> Self {
        let present = |v: f64| (!stats.is_empty()).then_some(v);
        Self {
            count: stats.count,
            mean: present(stats.mean),
            std: present(stats.std()),
            min: present(stats.min),
            max: present(stats.max),
        }
    }
}

// ============================================================================
// Book Summary
// ============================================================================

/// One of the best inside markets of a book.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpreadSummary {
    /// 1-based rank (1 = smallest spread)
    pub rank: usize,
    /// `ask_top - bid_top`
    pub spread: Price,
    /// Top bid price the entry is keyed by
    pub bid_price: Price,
    /// `(bid_top + ask_top) / 2`
    pub mid_point: f64,
    /// Bid tokens of the stored record, top first
    pub bids: Vec<PriceQty>,
    /// Ask tokens of the stored record, top first
    pub asks: Vec<PriceQty>,
}

/// Read-only summary of one reconstructed book.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookSummary {
    /// Source feed name
    pub source: String,
    /// Records processed, degenerate ones included
    pub record_count: u64,
    /// Records without usable bid or ask levels
    pub degenerate_records: u64,
    /// Populated bid levels
    pub bid_levels: usize,
    /// Populated ask levels
    pub ask_levels: usize,
    /// Records reaching each bid depth
    pub bid_totals: Vec<u64>,
    /// Records reaching each ask depth
    pub ask_totals: Vec<u64>,
    /// Best spreads, ascending (spread, bid price)
    pub best_spreads: Vec<SpreadSummary>,
    /// Spread statistics over non-degenerate records
    pub spread_stats: SpreadStatsSummary,
}

impl BookSummary {
    /// Summarize `book`, keeping at most `best_spreads` spread entries.
    pub fn from_book(book: &OrderBook, best_spreads: usize) -> Self {
        let best_spreads = book
            .best_spreads()
            .best(best_spreads)
            .enumerate()
            .map(|(i, (key, snapshot))| SpreadSummary {
                rank: i + 1,
                spread: key.spread,
                bid_price: key.bid_price,
                mid_point: key.mid_point(),
                bids: snapshot.bids.clone(),
                asks: snapshot.asks.clone(),
            })
            .collect();

        Self {
            source: book.source().to_string(),
            record_count: book.record_count(),
            degenerate_records: book.degenerate_count(),
            bid_levels: book.bid_levels(),
            ask_levels: book.ask_levels(),
            bid_totals: book.bid_totals().to_vec(),
            ask_totals: book.ask_totals().to_vec(),
            best_spreads,
            spread_stats: SpreadStatsSummary::from(book.spread_stats()),
        }
    }

    /// Bid and ask levels combined.
    #[inline]
    pub fn total_levels(&self) -> usize {
        self.bid_levels + self.ask_levels
    }
}
