//! Per-source order book aggregate.
//!
//! One `OrderBook` is built per feed, one record at a time in file order:
//! - `LeveledBook` per side for price → quantity-set maps by depth
//! - Per-depth feed totals (records reaching at least that depth)
//! - Best-spread index of inside-market snapshots
//! - Running spread statistics
//!
//! Once the feed is exhausted the book is frozen behind an `Arc` and only
//! read by reconciliation and reporting.

use crate::error::{ReconError, Result};
use crate::statistics::RunningStats;
use crate::types::{BidAskSnapshot, PriceQty, Side, DEFAULT_BOOK_LEVELS};

use super::leveled::LeveledBook;
use super::spread_index::{BestSpreadIndex, SpreadKey};

/// Configuration for book aggregation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookConfig {
    /// Maximum depth read per record
    pub levels: usize,
}

impl Default for BookConfig {
    fn default() -> Self {
        Self {
            levels: DEFAULT_BOOK_LEVELS,
        }
    }
}

impl BookConfig {
    /// Create a new config with the specified depth cap.
    pub fn new(levels: usize) -> Self {
        Self { levels }
    }

    /// Reject a zero depth cap.
    pub fn validate(&self) -> Result<()> {
        if self.levels == 0 {
            return Err(ReconError::InvalidConfig(
                "book levels must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Depths reached by one ingested record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct IngestOutcome {
    /// Bid levels populated by the record
    pub bid_depth: usize,
    /// Ask levels populated by the record
    pub ask_depth: usize,
    /// Spread key the record was indexed under (`None` when degenerate)
    pub spread_key: Option<SpreadKey>,
}

impl IngestOutcome {
    /// A record missing either side contributes no totals or spread.
    #[inline]
    pub fn is_degenerate(&self) -> bool {
        self.bid_depth == 0 || self.ask_depth == 0
    }
}

/// Leveled order book reconstructed from one source feed.
#[derive(Debug, Clone)]
pub struct OrderBook {
    /// Feed name (usually the file path)
    source: String,

    /// Configuration
    config: BookConfig,

    /// Bid levels, top of book first
    bids: LeveledBook,

    /// Ask levels, top of book first
    asks: LeveledBook,

    /// `bid_totals[d]`: records whose bids reached depth > d
    bid_totals: Vec<u64>,

    /// `ask_totals[d]`: records whose asks reached depth > d
    ask_totals: Vec<u64>,

    /// Inside-market snapshots keyed by (spread, top bid)
    best_spreads: BestSpreadIndex,

    /// Records processed, degenerate ones included
    record_count: u64,

    /// Records missing either bid or ask levels
    degenerate_count: u64,

    /// Spread statistics over non-degenerate records
    spread_stats: RunningStats,
}

impl OrderBook {
    /// Create an empty book for `source` with the default depth cap.
    ///
    /// # Example
    /// ```
    /// use feed_lob_reconciler::OrderBook;
    ///
    /// let book = OrderBook::new("feeds.csv");
    /// assert_eq!(book.record_count(), 0);
    /// ```
    pub fn new(source: impl Into<String>) -> Self {
        Self::with_config(source, BookConfig::default())
    }

    /// Create an empty book with a custom configuration.
    ///
    /// # Example
    /// ```
    /// use feed_lob_reconciler::{BookConfig, OrderBook};
    ///
    /// let book = OrderBook::with_config("feeds.log", BookConfig::new(10));
    /// assert_eq!(book.bid_totals().len(), 10);
    /// ```
    pub fn with_config(source: impl Into<String>, config: BookConfig) -> Self {
        let levels = config.levels;
        Self {
            source: source.into(),
            config,
            bids: LeveledBook::new(levels),
            asks: LeveledBook::new(levels),
            bid_totals: vec![0; levels],
            ask_totals: vec![0; levels],
            best_spreads: BestSpreadIndex::new(),
            record_count: 0,
            degenerate_count: 0,
            spread_stats: RunningStats::new(),
        }
    }

    /// Ingest one record's bid and ask tokens, top of book first.
    ///
    /// Tokens past the depth cap are ignored. The record is always counted;
    /// totals, spread index and spread statistics are only updated when both
    /// sides reached at least one level.
    ///
    /// # Example
    /// ```
    /// use feed_lob_reconciler::{OrderBook, PriceQty};
    ///
    /// let mut book = OrderBook::new("feeds.csv");
    /// let outcome = book.ingest(
    ///     vec![PriceQty::new(10, 100), PriceQty::new(9, 50)],
    ///     vec![PriceQty::new(11, 80)],
    /// );
    /// assert_eq!((outcome.bid_depth, outcome.ask_depth), (2, 1));
    /// assert_eq!(book.bid_totals()[1], 1);
    /// ```
    pub fn ingest<B, A>(&mut self, bid_tokens: B, ask_tokens: A) -> IngestOutcome
    where
        B: IntoIterator<Item = PriceQty>,
        A: IntoIterator<Item = PriceQty>,
    {
        let bids = self.bids.add_record(bid_tokens);
        let asks = self.asks.add_record(ask_tokens);

        self.record_count += 1;

        let mut outcome = IngestOutcome {
            bid_depth: bids.len(),
            ask_depth: asks.len(),
            spread_key: None,
        };

        if outcome.is_degenerate() {
            self.degenerate_count += 1;
            log::debug!(
                "{}: record {} is degenerate (bid depth {}, ask depth {})",
                self.source,
                self.record_count,
                outcome.bid_depth,
                outcome.ask_depth
            );
            return outcome;
        }

        for total in self.bid_totals.iter_mut().take(outcome.bid_depth) {
            *total += 1;
        }
        for total in self.ask_totals.iter_mut().take(outcome.ask_depth) {
            *total += 1;
        }

        outcome.spread_key = self.best_spreads.record(BidAskSnapshot { bids, asks });
        if let Some(key) = outcome.spread_key {
            self.spread_stats.update(key.spread as f64);
        }

        outcome
    }

    /// Feed name.
    #[inline]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Configured depth cap.
    #[inline]
    pub fn max_levels(&self) -> usize {
        self.config.levels
    }

    /// Get the configuration.
    #[inline]
    pub fn config(&self) -> &BookConfig {
        &self.config
    }

    /// Leveled bids.
    #[inline]
    pub fn bids(&self) -> &LeveledBook {
        &self.bids
    }

    /// Leveled asks.
    #[inline]
    pub fn asks(&self) -> &LeveledBook {
        &self.asks
    }

    /// Leveled book for one side.
    #[inline]
    pub fn side(&self, side: Side) -> &LeveledBook {
        match side {
            Side::Bid => &self.bids,
            Side::Ask => &self.asks,
        }
    }

    /// Per-depth bid totals (length == depth cap).
    #[inline]
    pub fn bid_totals(&self) -> &[u64] {
        &self.bid_totals
    }

    /// Per-depth ask totals (length == depth cap).
    #[inline]
    pub fn ask_totals(&self) -> &[u64] {
        &self.ask_totals
    }

    /// Best-spread index.
    #[inline]
    pub fn best_spreads(&self) -> &BestSpreadIndex {
        &self.best_spreads
    }

    /// Total records processed.
    #[inline]
    pub fn record_count(&self) -> u64 {
        self.record_count
    }

    /// Records that contributed no totals or spread.
    #[inline]
    pub fn degenerate_count(&self) -> u64 {
        self.degenerate_count
    }

    /// Spread statistics over non-degenerate records.
    #[inline]
    pub fn spread_stats(&self) -> &RunningStats {
        &self.spread_stats
    }

    /// Number of populated bid levels.
    #[inline]
    pub fn bid_levels(&self) -> usize {
        self.bids.len()
    }

    /// Number of populated ask levels.
    #[inline]
    pub fn ask_levels(&self) -> usize {
        self.asks.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pq(pairs: &[(i64, u64)]) -> Vec<PriceQty> {
        pairs.iter().copied().map(PriceQty::from).collect()
    }

    #[test]
    fn test_new_book_is_empty() {
        let book = OrderBook::with_config("a", BookConfig::new(3));
        assert_eq!(book.record_count(), 0);
        assert_eq!(book.bid_totals(), &[0, 0, 0]);
        assert_eq!(book.ask_totals(), &[0, 0, 0]);
        assert!(book.best_spreads().is_empty());
        assert!(book.bids().is_empty());
    }

    #[test]
    fn test_ingest_populates_levels_totals_and_spread() {
        let mut book = OrderBook::with_config("a", BookConfig::new(5));
        let outcome = book.ingest(pq(&[(10, 100), (9, 50)]), pq(&[(11, 80)]));

        assert_eq!(outcome.bid_depth, 2);
        assert_eq!(outcome.ask_depth, 1);
        assert_eq!(book.bid_levels(), 2);
        assert_eq!(book.ask_levels(), 1);
        assert_eq!(book.bid_totals(), &[1, 1, 0, 0, 0]);
        assert_eq!(book.ask_totals(), &[1, 0, 0, 0, 0]);

        let key = SpreadKey::new(1, 10);
        assert_eq!(outcome.spread_key, Some(key));
        let snapshot = book.best_spreads().get(&key).unwrap();
        assert_eq!(snapshot.bids, pq(&[(10, 100), (9, 50)]));
        assert_eq!(snapshot.asks, pq(&[(11, 80)]));
    }

    #[test]
    fn test_degenerate_record_is_counted_only() {
        let mut book = OrderBook::new("a");
        let outcome = book.ingest(Vec::new(), pq(&[(11, 80)]));

        assert!(outcome.is_degenerate());
        assert_eq!(book.record_count(), 1);
        assert_eq!(book.degenerate_count(), 1);
        assert!(book.ask_totals().iter().all(|&t| t == 0));
        assert!(book.best_spreads().is_empty());
        // Ask level is still populated
        assert!(book.asks().level(0).unwrap().contains(11, 80));
    }

    #[test]
    fn test_depth_cap_truncates_tokens() {
        let mut book = OrderBook::with_config("a", BookConfig::new(2));
        let outcome = book.ingest(pq(&[(10, 1), (9, 1), (8, 1)]), pq(&[(11, 1)]));

        assert_eq!(outcome.bid_depth, 2);
        assert_eq!(book.bid_levels(), 2);
        let snapshot = book.best_spreads().get(&SpreadKey::new(1, 10)).unwrap();
        assert_eq!(snapshot.bids.len(), 2);
    }

    #[test]
    fn test_spread_stats_skip_degenerate_records() {
        let mut book = OrderBook::new("a");
        book.ingest(pq(&[(10, 1)]), pq(&[(11, 1)]));
        book.ingest(pq(&[(10, 1)]), pq(&[(13, 1)]));
        book.ingest(pq(&[(10, 1)]), Vec::new());

        assert_eq!(book.spread_stats().count, 2);
        assert!((book.spread_stats().mean - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_side_accessor() {
        let mut book = OrderBook::new("a");
        book.ingest(pq(&[(10, 1)]), pq(&[(11, 2)]));
        assert!(book.side(Side::Bid).level(0).unwrap().contains(10, 1));
        assert!(book.side(Side::Ask).level(0).unwrap().contains(11, 2));
    }

    #[test]
    fn test_zero_levels_config_is_invalid() {
        assert!(BookConfig::new(0).validate().is_err());
        assert!(BookConfig::new(1).validate().is_ok());
    }
}
