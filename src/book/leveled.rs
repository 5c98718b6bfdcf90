//! Depth-indexed sequence of price levels for one book side.

use crate::types::{Price, PriceQty, Quantity};

use super::price_level::PriceLevel;

/// One side of a leveled book: `levels[0]` is the top of book.
///
/// The sequence only grows. A record reaching depth `k` for the first time
/// appends empty levels up to `k`; existing levels are never removed.
/// Insertions at or beyond `max_depth` are rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeveledBook {
    max_depth: usize,
    levels: Vec<PriceLevel>,
}

impl LeveledBook {
    /// Create an empty side capped at `max_depth` levels.
    pub fn new(max_depth: usize) -> Self {
        Self {
            max_depth,
            levels: Vec::with_capacity(max_depth),
        }
    }

    /// Configured depth cap.
    #[inline]
    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Insert a quantity at `price` on level `depth`.
    ///
    /// Returns `false` without touching the book when `depth` is beyond the cap.
    pub fn insert(&mut self, depth: usize, price: Price, quantity: Quantity) -> bool {
        if depth >= self.max_depth {
            return false;
        }
        if depth >= self.levels.len() {
            self.levels.resize_with(depth + 1, PriceLevel::new);
        }
        self.levels[depth].insert(price, quantity);
        true
    }

    /// Add one record's tokens, top of book first.
    ///
    /// Tokens past the depth cap are ignored. Returns the tokens actually
    /// ingested; their count is the depth the record reached.
    pub fn add_record<I>(&mut self, tokens: I) -> Vec<PriceQty>
    where
        I: IntoIterator<Item = PriceQty>,
    {
        let mut kept = Vec::new();
        for (depth, token) in tokens.into_iter().take(self.max_depth).enumerate() {
            if self.insert(depth, token.price, token.quantity) {
                kept.push(token);
            }
        }
        kept
    }

    /// Number of populated levels.
    #[inline]
    pub fn len(&self) -> usize {
        self.levels.len()
    }

    /// Check if no level has been populated.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// Level at `depth`, if populated.
    #[inline]
    pub fn level(&self, depth: usize) -> Option<&PriceLevel> {
        self.levels.get(depth)
    }

    /// All populated levels, top of book first.
    #[inline]
    pub fn levels(&self) -> &[PriceLevel] {
        &self.levels
    }

    /// Iterate over levels, top of book first.
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &PriceLevel> {
        self.levels.iter()
    }
}
