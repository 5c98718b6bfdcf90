//! Level-by-level reconciliation of two reconstructed books.
//!
//! For every depth present in both books the two price levels are compared
//! with set algebra:
//!
//! | Case | Entry |
//! |------|-------|
//! | price only in one source's level | every quantity at that price, [`DiffEntry::PriceOnly`] |
//! | shared price, quantity only in one source | [`DiffEntry::QuantityAtSharedPrice`] |
//! | depth only in one book | every pair of the level, [`DiffEntry::UnmatchedLevel`] |
//!
//! Quantities present on both sides at a shared price never appear in the
//! output. Unequal book depth is an ordinary branch, not an error.
//!
//! # Example
//!
//! ```
//! use feed_lob_reconciler::{diff_levels, DiffEntry, OrderBook, PriceQty};
//!
//! let mut a = OrderBook::new("a");
//! a.ingest(vec![PriceQty::new(100, 5)], vec![PriceQty::new(101, 1)]);
//! let mut b = OrderBook::new("b");
//! b.ingest(vec![PriceQty::new(100, 7)], vec![PriceQty::new(101, 1)]);
//!
//! let diffs = diff_levels(a.bids(), b.bids());
//! assert_eq!(diffs[0].only_in_a, vec![DiffEntry::QuantityAtSharedPrice(PriceQty::new(100, 5))]);
//! assert_eq!(diffs[0].only_in_b, vec![DiffEntry::QuantityAtSharedPrice(PriceQty::new(100, 7))]);
//! ```

use serde::{Deserialize, Serialize};

use crate::book::{LeveledBook, OrderBook, PriceLevel};
use crate::types::{PriceQty, Side};

/// One price/quantity difference reported for one source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DiffEntry {
    /// The price is absent from the other source's level
    PriceOnly(PriceQty),
    /// The price exists in both levels but this quantity only in one
    QuantityAtSharedPrice(PriceQty),
    /// The other source has no level at this depth
    UnmatchedLevel(PriceQty),
}

impl DiffEntry {
    /// The (price, quantity) pair carried by the entry.
    #[inline]
    pub fn pair(&self) -> PriceQty {
        match *self {
            DiffEntry::PriceOnly(pair)
            | DiffEntry::QuantityAtSharedPrice(pair)
            | DiffEntry::UnmatchedLevel(pair) => pair,
        }
    }

    /// Whether the difference is about the price rather than the quantity.
    #[inline]
    pub fn is_price_difference(&self) -> bool {
        !matches!(self, DiffEntry::QuantityAtSharedPrice(_))
    }
}

/// Which books have a level at a given depth.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LevelCoverage {
    /// Both books reached this depth; entries are set differences
    Both,
    /// Only book A reached this depth
    OnlyA,
    /// Only book B reached this depth
    OnlyB,
}

/// Differences between two books at one depth.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelDiff {
    /// 0-based depth (0 = top of book)
    pub depth: usize,
    /// Which books have a level here
    pub coverage: LevelCoverage,
    /// Entries found in A but not in B: price-only first, then quantity-only
    pub only_in_a: Vec<DiffEntry>,
    /// Entries found in B but not in A: price-only first, then quantity-only
    pub only_in_b: Vec<DiffEntry>,
}

impl LevelDiff {
    /// Check if the two sources agree at this depth.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.only_in_a.is_empty() && self.only_in_b.is_empty()
    }

    /// Total number of entries on both sides.
    #[inline]
    pub fn len(&self) -> usize {
        self.only_in_a.len() + self.only_in_b.len()
    }

    /// Compare two levels present in both books.
    fn compare(depth: usize, a: &PriceLevel, b: &PriceLevel) -> Self {
        let mut only_in_a = price_only(a, b);
        let mut only_in_b = price_only(b, a);

        for (price, quantities_a) in a.iter() {
            let Some(quantities_b) = b.quantities(price) else {
                continue;
            };
            only_in_a.extend(
                quantities_a
                    .difference(quantities_b)
                    .map(|&q| DiffEntry::QuantityAtSharedPrice(PriceQty::new(price, q))),
            );
            only_in_b.extend(
                quantities_b
                    .difference(quantities_a)
                    .map(|&q| DiffEntry::QuantityAtSharedPrice(PriceQty::new(price, q))),
            );
        }

        Self {
            depth,
            coverage: LevelCoverage::Both,
            only_in_a,
            only_in_b,
        }
    }

    /// A level present in one book only.
    fn one_sided(depth: usize, level: &PriceLevel, coverage: LevelCoverage) -> Self {
        let entries: Vec<_> = level.pairs().map(DiffEntry::UnmatchedLevel).collect();
        let (only_in_a, only_in_b) = match coverage {
            LevelCoverage::OnlyB => (Vec::new(), entries),
            _ => (entries, Vec::new()),
        };
        Self {
            depth,
            coverage,
            only_in_a,
            only_in_b,
        }
    }
}

/// Every quantity of prices in `level` that `other` does not have.
fn price_only(level: &PriceLevel, other: &PriceLevel) -> Vec<DiffEntry> {
    level
        .iter()
        .filter(|(price, _)| !other.contains_price(*price))
        .flat_map(|(price, quantities)| {
            quantities
                .iter()
                .map(move |&q| DiffEntry::PriceOnly(PriceQty::new(price, q)))
        })
        .collect()
}

/// Compare two leveled book sides depth by depth.
///
/// Produces one `LevelDiff` per depth in `0..max(a.len(), b.len())`.
pub fn diff_levels(a: &LeveledBook, b: &LeveledBook) -> Vec<LevelDiff> {
    let depth = a.len().max(b.len());
    (0..depth)
        .filter_map(|d| match (a.level(d), b.level(d)) {
            (Some(la), Some(lb)) => Some(LevelDiff::compare(d, la, lb)),
            (Some(la), None) => Some(LevelDiff::one_sided(d, la, LevelCoverage::OnlyA)),
            (None, Some(lb)) => Some(LevelDiff::one_sided(d, lb, LevelCoverage::OnlyB)),
            (None, None) => None,
        })
        .collect()
}

/// Bid and ask differences between two completed books.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reconciliation {
    /// Name of book A
    pub source_a: String,
    /// Name of book B
    pub source_b: String,
    /// Bid-side differences by depth
    pub bids: Vec<LevelDiff>,
    /// Ask-side differences by depth
    pub asks: Vec<LevelDiff>,
}

impl Reconciliation {
    /// Reconcile book `a` against book `b`, bids and asks independently.
    pub fn between(a: &OrderBook, b: &OrderBook) -> Self {
        let bids = diff_levels(a.bids(), b.bids());
        let asks = diff_levels(a.asks(), b.asks());
        log::info!(
            "Reconciled {} vs {}: {} bid and {} ask differences",
            a.source(),
            b.source(),
            bids.iter().map(LevelDiff::len).sum::<usize>(),
            asks.iter().map(LevelDiff::len).sum::<usize>()
        );
        Self {
            source_a: a.source().to_string(),
            source_b: b.source().to_string(),
            bids,
            asks,
        }
    }

    /// Differences for one side.
    #[inline]
    pub fn side(&self, side: Side) -> &[LevelDiff] {
        match side {
            Side::Bid => &self.bids,
            Side::Ask => &self.asks,
        }
    }

    /// Total number of entries across both sides and all depths.
    pub fn difference_count(&self) -> usize {
        self.bids
            .iter()
            .chain(self.asks.iter())
            .map(LevelDiff::len)
            .sum()
    }

    /// Check if both books hold exactly the same levels.
    pub fn is_consistent(&self) -> bool {
        self.bids.iter().chain(self.asks.iter()).all(LevelDiff::is_empty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn book(max_depth: usize, records: &[&[(i64, u64)]]) -> LeveledBook {
        let mut book = LeveledBook::new(max_depth);
        for record in records {
            book.add_record(record.iter().copied().map(PriceQty::from));
        }
        book
    }

    #[test]
    fn test_price_and_quantity_differences() {
        let a = book(5, &[&[(100, 5)]]);
        let b = book(5, &[&[(100, 5)], &[(100, 7)], &[(101, 3)]]);

        let diffs = diff_levels(&a, &b);
        assert_eq!(diffs.len(), 1);
        assert_eq!(diffs[0].coverage, LevelCoverage::Both);
        assert!(diffs[0].only_in_a.is_empty());
        assert_eq!(
            diffs[0].only_in_b,
            vec![
                DiffEntry::PriceOnly(PriceQty::new(101, 3)),
                DiffEntry::QuantityAtSharedPrice(PriceQty::new(100, 7)),
            ]
        );
    }

    #[test]
    fn test_identical_levels_have_no_differences() {
        let a = book(5, &[&[(10, 1), (9, 2)]]);
        let b = book(5, &[&[(10, 1), (9, 2)]]);
        assert!(diff_levels(&a, &b).iter().all(LevelDiff::is_empty));
    }

    #[test]
    fn test_unequal_depth_emits_one_sided_levels() {
        let a = book(5, &[&[(10, 1), (9, 2), (8, 3)]]);
        let b = book(5, &[&[(10, 1)]]);

        let diffs = diff_levels(&a, &b);
        assert_eq!(diffs.len(), 3);
        assert!(diffs[0].is_empty());
        assert_eq!(diffs[1].coverage, LevelCoverage::OnlyA);
        assert_eq!(
            diffs[1].only_in_a,
            vec![DiffEntry::UnmatchedLevel(PriceQty::new(9, 2))]
        );
        assert!(diffs[1].only_in_b.is_empty());
        assert_eq!(diffs[2].depth, 2);

        let swapped = diff_levels(&b, &a);
        assert_eq!(swapped[2].coverage, LevelCoverage::OnlyB);
        assert_eq!(
            swapped[2].only_in_b,
            vec![DiffEntry::UnmatchedLevel(PriceQty::new(8, 3))]
        );
    }

    #[test]
    fn test_price_zero_is_reported_as_price_difference() {
        let a = book(5, &[&[(0, 4)]]);
        let b = book(5, &[&[(1, 4)]]);

        let diffs = diff_levels(&a, &b);
        assert_eq!(
            diffs[0].only_in_a,
            vec![DiffEntry::PriceOnly(PriceQty::new(0, 4))]
        );
        assert!(diffs[0].only_in_a[0].is_price_difference());
    }

    #[test]
    fn test_empty_books() {
        let a = LeveledBook::new(5);
        let b = LeveledBook::new(5);
        assert!(diff_levels(&a, &b).is_empty());
    }

    #[test]
    fn test_reconciliation_between_books() {
        let mut a = OrderBook::new("csv");
        a.ingest(vec![PriceQty::new(10, 1)], vec![PriceQty::new(11, 1)]);
        let mut b = OrderBook::new("log");
        b.ingest(vec![PriceQty::new(10, 1)], vec![PriceQty::new(12, 1)]);

        let recon = Reconciliation::between(&a, &b);
        assert_eq!(recon.source_a, "csv");
        assert!(recon.side(Side::Bid).iter().all(LevelDiff::is_empty));
        assert_eq!(recon.side(Side::Ask)[0].len(), 2);
        assert_eq!(recon.difference_count(), 2);
        assert!(!recon.is_consistent());
    }
}
