//! Best-spread index keyed by `(spread, top bid price)`.
//!
//! A single `BTreeMap` with a composite key replaces a map of maps; ordered
//! iteration yields the smallest spreads first, ties broken by the lower bid.

use std::collections::BTreeMap;

use crate::types::{BidAskSnapshot, Price};

/// Composite key of the spread index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SpreadKey {
    /// `ask_top - bid_top` (negative when the record is inverted)
    pub spread: Price,
    /// Top-of-book bid price
    pub bid_price: Price,
}

impl SpreadKey {
    #[inline]
    pub fn new(spread: Price, bid_price: Price) -> Self {
        Self { spread, bid_price }
    }

    /// `ask_top` recovered from the key.
    #[inline]
    pub fn ask_price(&self) -> Price {
        self.bid_price + self.spread
    }

    /// Midpoint between top bid and top ask.
    #[inline]
    pub fn mid_point(&self) -> f64 {
        (2 * self.bid_price as i128 + self.spread as i128) as f64 / 2.0
    }
}

/// Snapshots of the inside market, one per distinct `(spread, bid)` key.
///
/// Later records with the same key overwrite earlier ones.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BestSpreadIndex {
    entries: BTreeMap<SpreadKey, BidAskSnapshot>,
}

impl BestSpreadIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `snapshot` under its top-of-book spread.
    ///
    /// Returns the key used, or `None` when either side is empty or the
    /// spread does not fit a `Price`.
    pub fn record(&mut self, snapshot: BidAskSnapshot) -> Option<SpreadKey> {
        let bid = snapshot.top_bid()?;
        let spread = snapshot.spread()?;
        let key = SpreadKey::new(spread, bid.price);
        self.entries.insert(key, snapshot);
        Some(key)
    }

    /// Snapshot stored for a key.
    #[inline]
    pub fn get(&self, key: &SpreadKey) -> Option<&BidAskSnapshot> {
        self.entries.get(key)
    }

    /// Entries in ascending `(spread, bid_price)` order.
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = (&SpreadKey, &BidAskSnapshot)> {
        self.entries.iter()
    }

    /// The `n` best (smallest-spread) entries.
    #[inline]
    pub fn best(&self, n: usize) -> impl Iterator<Item = (&SpreadKey, &BidAskSnapshot)> {
        self.entries.iter().take(n)
    }

    /// Number of distinct keys.
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
