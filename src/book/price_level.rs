//! Price level: price → set of quantities observed at one depth.
//!
//! # Invariant
//!
//! Quantities are kept with set semantics: inserting the same
//! (price, quantity) pair twice leaves the level unchanged. Distinct
//! quantities seen at the same price across records accumulate.
//!
//! Both maps are ordered so that diffing and rendering iterate prices and
//! quantities in ascending order without extra sorting.

use std::collections::{BTreeMap, BTreeSet};

use crate::types::{Price, PriceQty, Quantity};

/// All prices seen at one depth of one book side, with their quantities.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PriceLevel {
    /// price → distinct quantities observed at that price
    prices: BTreeMap<Price, BTreeSet<Quantity>>,
}

impl PriceLevel {
    /// Create a new empty price level.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a quantity at a price.
    ///
    /// Returns `true` if the pair was not present yet.
    #[inline]
    pub fn insert(&mut self, price: Price, quantity: Quantity) -> bool {
        self.prices.entry(price).or_default().insert(quantity)
    }

    /// Check whether a price is present at this level.
    #[inline]
    pub fn contains_price(&self, price: Price) -> bool {
        self.prices.contains_key(&price)
    }

    /// Check whether a (price, quantity) pair is present.
    #[inline]
    pub fn contains(&self, price: Price, quantity: Quantity) -> bool {
        self.prices
            .get(&price)
            .is_some_and(|quantities| quantities.contains(&quantity))
    }

    /// Quantities observed at a price.
    #[inline]
    pub fn quantities(&self, price: Price) -> Option<&BTreeSet<Quantity>> {
        self.prices.get(&price)
    }

    /// Prices at this level, ascending.
    #[inline]
    pub fn prices(&self) -> impl Iterator<Item = Price> + '_ {
        self.prices.keys().copied()
    }

    /// Number of distinct prices.
    #[inline]
    pub fn price_count(&self) -> usize {
        self.prices.len()
    }

    /// Number of distinct (price, quantity) pairs.
    pub fn pair_count(&self) -> usize {
        self.prices.values().map(BTreeSet::len).sum()
    }

    /// Check if the level holds no prices.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }

    /// Iterate over (price, quantities), prices ascending.
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = (Price, &BTreeSet<Quantity>)> {
        self.prices.iter().map(|(price, qtys)| (*price, qtys))
    }

    /// Flatten the level into (price, quantity) pairs, price then quantity ascending.
    pub fn pairs(&self) -> impl Iterator<Item = PriceQty> + '_ {
        self.prices.iter().flat_map(|(price, quantities)| {
            quantities
                .iter()
                .map(move |quantity| PriceQty::new(*price, *quantity))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_price_level_is_empty() {
        let level = PriceLevel::new();
        assert!(level.is_empty());
        assert_eq!(level.price_count(), 0);
        assert_eq!(level.pair_count(), 0);
    }

    #[test]
    fn test_duplicate_pair_is_collapsed() {
        let mut level = PriceLevel::new();
        assert!(level.insert(100, 5));
        assert!(!level.insert(100, 5));
        assert_eq!(level.pair_count(), 1);
        assert!(level.contains(100, 5));
    }

    #[test]
    fn test_distinct_quantities_accumulate() {
        let mut level = PriceLevel::new();
        level.insert(100, 5);
        level.insert(100, 7);
        level.insert(101, 3);

        assert_eq!(level.price_count(), 2);
        assert_eq!(level.pair_count(), 3);
        let quantities: Vec<_> = level.quantities(100).unwrap().iter().copied().collect();
        assert_eq!(quantities, vec![5, 7]);
    }

    #[test]
    fn test_pairs_are_ordered() {
        let mut level = PriceLevel::new();
        level.insert(101, 3);
        level.insert(100, 7);
        level.insert(100, 5);

        let pairs: Vec<_> = level.pairs().collect();
        assert_eq!(
            pairs,
            vec![
                PriceQty::new(100, 5),
                PriceQty::new(100, 7),
                PriceQty::new(101, 3)
            ]
        );
    }

    #[test]
    fn test_zero_price_is_an_ordinary_key() {
        let mut level = PriceLevel::new();
        level.insert(0, 10);
        assert!(level.contains_price(0));
        assert!(!level.contains(0, 11));
    }
}
