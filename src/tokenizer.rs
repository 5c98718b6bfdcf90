//! Price/quantity tokenization of a bid or ask field.
//!
//! A `LevelTokenizer` wraps a regular expression with two capture groups,
//! price then quantity. Matches are yielded lazily in source order, top of
//! book first. A match whose captures are empty or overflow the integer
//! types is skipped and logged; it never aborts the record.

use regex::Regex;

use crate::error::Result;
use crate::types::{Price, PriceQty, Quantity};

/// Pattern of the level columns of the CSV snapshot feed.
pub const CSV_LEVEL_PATTERN: &str = r"Price:\s+([0-9]+)\s+Quantity:\s+([0-9]+)";

/// Pattern of the book columns of the structured log feed.
pub const LOG_LEVEL_PATTERN: &str = r"([0-9]+),([0-9]+)";

/// Extracts (price, quantity) pairs from a level field.
#[derive(Debug, Clone)]
pub struct LevelTokenizer {
    pattern: Regex,
}

impl LevelTokenizer {
    /// Compile a tokenizer from a pattern with two capture groups.
    pub fn new(pattern: &str) -> Result<Self> {
        Ok(Self {
            pattern: Regex::new(pattern)?,
        })
    }

    /// Wrap an already compiled pattern.
    pub fn from_regex(pattern: Regex) -> Self {
        Self { pattern }
    }

    /// Tokenizer for the CSV snapshot feed.
    pub fn csv() -> Self {
        Self::from_regex(Regex::new(CSV_LEVEL_PATTERN).expect("CSV level pattern is valid"))
    }

    /// Tokenizer for the structured log feed.
    pub fn log() -> Self {
        Self::from_regex(Regex::new(LOG_LEVEL_PATTERN).expect("log level pattern is valid"))
    }

    /// The underlying pattern.
    pub fn pattern(&self) -> &Regex {
        &self.pattern
    }

    /// Lazily tokenize `field`, skipping unparsable matches.
    ///
    /// # Example
    /// ```
    /// use feed_lob_reconciler::{LevelTokenizer, PriceQty};
    ///
    /// let tokens: Vec<_> = LevelTokenizer::log().tokenize("10,100 9,50").collect();
    /// assert_eq!(tokens, vec![PriceQty::new(10, 100), PriceQty::new(9, 50)]);
    /// ```
    pub fn tokenize<'t>(&'t self, field: &'t str) -> impl Iterator<Item = PriceQty> + 't {
        self.tokenize_checked(field).filter_map(|token| match token {
            Ok(pair) => Some(pair),
            Err(text) => {
                log::warn!("Skipping unparsable level token '{text}'");
                None
            }
        })
    }

    /// Lazily tokenize `field`, yielding the matched text of unparsable matches as `Err`.
    pub fn tokenize_checked<'t>(
        &'t self,
        field: &'t str,
    ) -> impl Iterator<Item = std::result::Result<PriceQty, &'t str>> + 't {
        self.pattern.captures_iter(field).map(|caps| {
            let whole = caps.get(0).map_or("", |m| m.as_str());
            let price = caps.get(1).and_then(|m| m.as_str().parse::<Price>().ok());
            let quantity = caps.get(2).and_then(|m| m.as_str().parse::<Quantity>().ok());
            match (price, quantity) {
                (Some(price), Some(quantity)) => Ok(PriceQty::new(price, quantity)),
                _ => Err(whole),
            }
        })
    }
}
