//! Leveled order book aggregation.
//!
//! This module turns per-record price/quantity tokens into a depth-bounded,
//! deduplicated book per source feed.

mod leveled;
mod order_book;
mod price_level;
mod spread_index;

pub use leveled::LeveledBook;
pub use order_book::{BookConfig, IngestOutcome, OrderBook};
pub use price_level::PriceLevel;
pub use spread_index::{BestSpreadIndex, SpreadKey};
