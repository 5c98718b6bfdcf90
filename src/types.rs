//! Core data types shared by ingestion, reconciliation and reporting.
//!
//! Prices are `i64` so that spreads of inverted (crossed) records stay
//! representable; quantities are `u64`.

use serde::{Deserialize, Serialize};

/// Default maximum number of levels read per record.
pub const DEFAULT_BOOK_LEVELS: usize = 5;

/// Default number of best-spread entries exposed in summaries.
pub const DEFAULT_BEST_SPREADS: usize = 5;

/// Price of a level (integer ticks as they appear in the feed).
pub type Price = i64;

/// Quantity offered at a price.
pub type Quantity = u64;

/// Book side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    /// Buy side
    Bid,
    /// Sell side
    Ask,
}

impl Side {
    /// Human-readable label used in reports.
    pub fn label(self) -> &'static str {
        match self {
            Side::Bid => "Bid",
            Side::Ask => "Ask",
        }
    }

    /// Check if this is a bid.
    #[inline(always)]
    pub fn is_bid(self) -> bool {
        matches!(self, Side::Bid)
    }

    /// Check if this is an ask.
    #[inline(always)]
    pub fn is_ask(self) -> bool {
        matches!(self, Side::Ask)
    }
}

/// A single (price, quantity) token extracted from a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PriceQty {
    pub price: Price,
    pub quantity: Quantity,
}

impl PriceQty {
    #[inline]
    pub fn new(price: Price, quantity: Quantity) -> Self {
        Self { price, quantity }
    }
}

impl From<(Price, Quantity)> for PriceQty {
    fn from((price, quantity): (Price, Quantity)) -> Self {
        Self { price, quantity }
    }
}

/// The bid and ask token lists of one record, as ingested (depth-truncated).
///
/// Stored in the best-spread index so the inside market of the record can
/// be shown later.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BidAskSnapshot {
    /// Bid tokens from top of book outward
    pub bids: Vec<PriceQty>,
    /// Ask tokens from top of book outward
    pub asks: Vec<PriceQty>,
}

impl BidAskSnapshot {
    /// Top-of-book bid, if any.
    pub fn top_bid(&self) -> Option<PriceQty> {
        self.bids.first().copied()
    }

    /// Top-of-book ask, if any.
    pub fn top_ask(&self) -> Option<PriceQty> {
        self.asks.first().copied()
    }

    /// `ask_top - bid_top`, if both sides are present and the difference fits a `Price`.
    pub fn spread(&self) -> Option<Price> {
        match (self.top_bid(), self.top_ask()) {
            (Some(bid), Some(ask)) => ask.price.checked_sub(bid.price),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_side_labels() {
        assert_eq!(Side::Bid.label(), "Bid");
        assert_eq!(Side::Ask.label(), "Ask");
        assert!(Side::Bid.is_bid());
        assert!(Side::Ask.is_ask());
    }

    #[test]
    fn test_snapshot_spread() {
        let snapshot = BidAskSnapshot {
            bids: vec![PriceQty::new(10, 100), PriceQty::new(9, 50)],
            asks: vec![PriceQty::new(11, 80)],
        };
        assert_eq!(snapshot.spread(), Some(1));
        assert_eq!(snapshot.top_bid(), Some(PriceQty::new(10, 100)));
    }

    #[test]
    fn test_inverted_spread_is_negative() {
        let snapshot = BidAskSnapshot {
            bids: vec![PriceQty::new(12, 1)],
            asks: vec![PriceQty::new(11, 1)],
        };
        assert_eq!(snapshot.spread(), Some(-1));
    }

    #[test]
    fn test_spread_at_extreme_prices() {
        let snapshot = BidAskSnapshot {
            bids: vec![PriceQty::new(i64::MAX - 1, 1)],
            asks: vec![PriceQty::new(i64::MAX, 1)],
        };
        assert_eq!(snapshot.spread(), Some(1));

        let unrepresentable = BidAskSnapshot {
            bids: vec![PriceQty::new(i64::MIN, 1)],
            asks: vec![PriceQty::new(i64::MAX, 1)],
        };
        assert_eq!(unrepresentable.spread(), None);
    }

    #[test]
    fn test_empty_snapshot_has_no_spread() {
        assert_eq!(BidAskSnapshot::default().spread(), None);
    }
}
