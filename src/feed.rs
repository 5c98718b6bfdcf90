//! Feed driver: reads a captured feed line by line into an `OrderBook`.
//!
//! Two input formats are supported:
//!
//! | Format | Header | Field delimiter | Bid column | Ask column | Level pattern |
//! |--------|--------|-----------------|------------|------------|---------------|
//! | CSV snapshot | skipped | `"…"` | 11 | 12 | `Price: p Quantity: q` |
//! | Structured log | none | `{…}` | 5 | 6 | `p,q` |
//!
//! Each line is one record. The bid and ask fields are isolated, tokenized
//! and handed to [`OrderBook::ingest`]. A record missing its bid or ask
//! column stops the feed with [`ReconError::MissingColumn`]; a record whose
//! fields tokenize to nothing is counted and recorded as a warning.
//!
//! # Example
//!
//! ```
//! use feed_lob_reconciler::{BookConfig, FeedFormat, FeedReader};
//!
//! let log = "{ES}{OK}{GOOD}{10,100}{11,80}{10,100 9,50}{11,80}\n";
//! let feed = FeedReader::new(FeedFormat::StructuredLog, "inline.log", BookConfig::new(5))
//!     .read(log.as_bytes())
//!     .unwrap();
//!
//! assert_eq!(feed.book.record_count(), 1);
//! assert_eq!(feed.book.bid_levels(), 2);
//! ```

use std::borrow::Cow;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::book::{BookConfig, OrderBook};
use crate::error::{ReconError, Result};
use crate::tokenizer::LevelTokenizer;
use crate::types::PriceQty;
use crate::warnings::{WarningCategory, WarningTracker, WarningTrackerConfig};

/// I/O buffer size for feed files.
pub const IO_BUFFER_SIZE: usize = 256 * 1024;

/// Layout of a source feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FeedFormat {
    /// Quoted CSV snapshots with a header line.
    ///
    /// Columns: instrument, datetime, flags, accumulated volume, status,
    /// latest price, latest size, ask price, ask size, bid price, bid size,
    /// bid levels, ask levels.
    CsvSnapshot,

    /// Brace-delimited log lines without header.
    ///
    /// Columns: instrument, status, data quality, bid price/size,
    /// ask price/size, bid book, ask book.
    StructuredLog,
}

impl FeedFormat {
    /// Short name used in errors and logs.
    pub fn name(self) -> &'static str {
        match self {
            FeedFormat::CsvSnapshot => "csv",
            FeedFormat::StructuredLog => "log",
        }
    }

    /// Pattern isolating the fields of a line (first capture group).
    pub fn field_pattern(self) -> &'static str {
        match self {
            FeedFormat::CsvSnapshot => r#""(.*?)""#,
            FeedFormat::StructuredLog => r"\{(.*?)\}",
        }
    }

    /// Whether the first line is a header.
    pub fn has_header(self) -> bool {
        matches!(self, FeedFormat::CsvSnapshot)
    }

    /// Column holding the bid levels.
    pub fn bid_column(self) -> usize {
        match self {
            FeedFormat::CsvSnapshot => 11,
            FeedFormat::StructuredLog => 5,
        }
    }

    /// Column holding the ask levels.
    pub fn ask_column(self) -> usize {
        match self {
            FeedFormat::CsvSnapshot => 12,
            FeedFormat::StructuredLog => 6,
        }
    }

    /// Default level tokenizer for the format.
    pub fn tokenizer(self) -> LevelTokenizer {
        match self {
            FeedFormat::CsvSnapshot => LevelTokenizer::csv(),
            FeedFormat::StructuredLog => LevelTokenizer::log(),
        }
    }

    /// Guess the format from a file extension (`.csv` or `.log`).
    pub fn from_path(path: impl AsRef<Path>) -> Option<Self> {
        match path.as_ref().extension()?.to_str()? {
            ext if ext.eq_ignore_ascii_case("csv") => Some(FeedFormat::CsvSnapshot),
            ext if ext.eq_ignore_ascii_case("log") => Some(FeedFormat::StructuredLog),
            _ => None,
        }
    }
}

/// Statistics for one feed ingestion.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedStats {
    /// Lines read, header and blank lines included
    pub lines_read: u64,

    /// Records handed to the book
    pub records: u64,

    /// Records without usable bid or ask levels
    pub degenerate_records: u64,

    /// Records with more levels than the depth cap
    pub truncated_records: u64,

    /// Level matches skipped because they did not parse
    pub skipped_tokens: u64,

    /// Blank lines skipped
    pub blank_lines: u64,

    /// Lines with invalid UTF-8, decoded with replacement characters
    pub invalid_utf8_lines: u64,

    /// Bytes read, line terminators included
    pub bytes_read: u64,
}

/// Result of reading one feed to the end.
#[derive(Debug)]
pub struct IngestedFeed {
    /// The completed book
    pub book: OrderBook,
    /// Reading statistics
    pub stats: FeedStats,
    /// Non-fatal anomalies
    pub warnings: WarningTracker,
}

/// Reads a feed into a fresh `OrderBook`.
pub struct FeedReader {
    format: FeedFormat,
    source: String,
    fields: Regex,
    tokenizer: LevelTokenizer,
    book: OrderBook,
    stats: FeedStats,
    warnings: WarningTracker,
}

impl FeedReader {
    /// Create a reader for `format`, naming the book `source`.
    pub fn new(format: FeedFormat, source: impl Into<String>, config: BookConfig) -> Self {
        let source = source.into();
        Self {
            format,
            fields: Regex::new(format.field_pattern()).expect("field pattern is valid"),
            tokenizer: format.tokenizer(),
            book: OrderBook::with_config(source.clone(), config),
            source,
            stats: FeedStats::default(),
            warnings: WarningTracker::with_config(WarningTrackerConfig::default()),
        }
    }

    /// Replace the level tokenizer.
    pub fn with_tokenizer(mut self, tokenizer: LevelTokenizer) -> Self {
        self.tokenizer = tokenizer;
        self
    }

    /// Replace the warning tracker configuration.
    pub fn with_warning_config(mut self, config: WarningTrackerConfig) -> Self {
        self.warnings = WarningTracker::with_config(config);
        self
    }

    /// Open `path` and read it to the end.
    pub fn read_path(self, path: impl AsRef<Path>) -> Result<IngestedFeed> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| ReconError::io(path, e))?;
        self.read(BufReader::with_capacity(IO_BUFFER_SIZE, file))
    }

    /// Read every line of `reader` into the book.
    ///
    /// Lines are split on `\n` as raw bytes; a trailing `\r` is dropped.
    /// Invalid UTF-8 is replaced and recorded as a warning.
    pub fn read<R: BufRead>(mut self, mut reader: R) -> Result<IngestedFeed> {
        log::info!("Reading {} feed {}", self.format.name(), self.source);

        let mut buf = Vec::new();
        let mut line_no = 0u64;
        loop {
            buf.clear();
            let n = reader.read_until(b'\n', &mut buf)?;
            if n == 0 {
                break;
            }
            line_no += 1;
            self.stats.lines_read += 1;
            self.stats.bytes_read += n as u64;

            if line_no == 1 && self.format.has_header() {
                continue;
            }

            let line = self.decode(&buf, line_no);
            if line.trim().is_empty() {
                self.stats.blank_lines += 1;
                self.warnings.record_line_warning(
                    WarningCategory::BlankLine,
                    "blank line skipped",
                    &self.source,
                    line_no,
                );
                continue;
            }

            self.process_line(&line, line_no)?;
        }

        log::info!(
            "Finished {}: {} records ({} degenerate), {} bid / {} ask levels",
            self.source,
            self.stats.records,
            self.stats.degenerate_records,
            self.book.bid_levels(),
            self.book.ask_levels()
        );

        Ok(IngestedFeed {
            book: self.book,
            stats: self.stats,
            warnings: self.warnings,
        })
    }

    fn decode<'b>(&mut self, bytes: &'b [u8], line_no: u64) -> Cow<'b, str> {
        let bytes = bytes.strip_suffix(b"\n").unwrap_or(bytes);
        let bytes = bytes.strip_suffix(b"\r").unwrap_or(bytes);

        match std::str::from_utf8(bytes) {
            Ok(text) => Cow::Borrowed(text),
            Err(err) => {
                self.stats.invalid_utf8_lines += 1;
                let warning = self
                    .warnings
                    .line_warning(
                        WarningCategory::InvalidUtf8,
                        "invalid UTF-8 replaced",
                        &self.source,
                        line_no,
                    )
                    .with_context("valid_up_to", err.valid_up_to().to_string());
                self.warnings.record(warning);
                String::from_utf8_lossy(bytes)
            }
        }
    }

    fn process_line(&mut self, line: &str, line_no: u64) -> Result<()> {
        let (bid_field, ask_field) = self.split_record(line, line_no)?;

        let bids = self.tokenize(bid_field, line_no);
        let asks = self.tokenize(ask_field, line_no);

        let levels = self.book.max_levels();
        if bids.len() > levels || asks.len() > levels {
            self.stats.truncated_records += 1;
            self.warnings.record_line_warning(
                WarningCategory::DepthTruncated,
                format!(
                    "{} bid / {} ask levels truncated to {levels}",
                    bids.len(),
                    asks.len()
                ),
                &self.source,
                line_no,
            );
        }

        let outcome = self.book.ingest(bids, asks);
        self.stats.records += 1;

        if outcome.is_degenerate() {
            self.stats.degenerate_records += 1;
            self.warnings.record_line_warning(
                WarningCategory::DegenerateRecord,
                format!(
                    "record has {} bid and {} ask levels",
                    outcome.bid_depth, outcome.ask_depth
                ),
                &self.source,
                line_no,
            );
        }
        Ok(())
    }

    /// Isolate the bid and ask fields of a record.
    fn split_record<'l>(&self, line: &'l str, line_no: u64) -> Result<(&'l str, &'l str)> {
        let fields: Vec<&'l str> = self
            .fields
            .captures_iter(line)
            .map(|caps| caps.get(1).map_or("", |m| m.as_str()))
            .collect();

        let column = |index: usize| {
            fields.get(index).copied().ok_or_else(|| ReconError::MissingColumn {
                feed: self.format.name(),
                line: line_no,
                column: index,
                found: fields.len(),
            })
        };

        Ok((
            column(self.format.bid_column())?,
            column(self.format.ask_column())?,
        ))
    }

    fn tokenize(&mut self, field: &str, line_no: u64) -> Vec<PriceQty> {
        let mut tokens = Vec::new();
        for token in self.tokenizer.tokenize_checked(field) {
            match token {
                Ok(pair) => tokens.push(pair),
                Err(text) => {
                    self.stats.skipped_tokens += 1;
                    let warning = self
                        .warnings
                        .line_warning(
                            WarningCategory::UnparsableToken,
                            "unparsable level skipped",
                            &self.source,
                            line_no,
                        )
                        .with_context("token", text);
                    self.warnings.record(warning);
                }
            }
        }
        tokens
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CSV_HEADER: &str = "\"Instrument\",\"DateTime\",\"Flags\",\"VolumeAcc\",\"Status\",\"LatestPrice\",\"LatestSize\",\"AskPrice\",\"AskSize\",\"BidPrice\",\"BidSize\",\"BidLevels\",\"AskLevels\"";

    fn csv_row(bids: &str, asks: &str) -> String {
        format!(
            "\"ES\",\"2018-01-01 10:00:00\",\"0\",\"100\",\"OK\",\"10\",\"1\",\"11\",\"80\",\"10\",\"100\",\"{bids}\",\"{asks}\""
        )
    }

    fn quiet(reader: FeedReader) -> FeedReader {
        reader.with_warning_config(WarningTrackerConfig {
            log_warnings: false,
            ..Default::default()
        })
    }

    #[test]
    fn test_csv_feed() {
        let input = format!(
            "{CSV_HEADER}\n{}\n{}\n",
            csv_row("Price: 10 Quantity: 100 Price: 9 Quantity: 50", "Price: 11 Quantity: 80"),
            csv_row("Price: 10 Quantity: 120", "Price: 12 Quantity: 30"),
        );
        let feed = quiet(FeedReader::new(FeedFormat::CsvSnapshot, "a.csv", BookConfig::new(5)))
            .read(input.as_bytes())
            .unwrap();

        assert_eq!(feed.stats.lines_read, 3);
        assert_eq!(feed.stats.records, 2);
        assert_eq!(feed.book.record_count(), 2);
        assert_eq!(feed.book.bid_totals()[0], 2);
        assert_eq!(feed.book.bid_totals()[1], 1);
        let top = feed.book.bids().level(0).unwrap();
        assert_eq!(top.quantities(10).unwrap().len(), 2);
    }

    #[test]
    fn test_log_feed() {
        let input = "{ES}{OK}{GOOD}{10,100}{11,80}{10,100 9,50 8,10}{11,80 12,5}\n\
                     {ES}{OK}{GOOD}{10,100}{11,80}{}{11,80}\n";
        let feed = quiet(FeedReader::new(FeedFormat::StructuredLog, "a.log", BookConfig::new(2)))
            .read(input.as_bytes())
            .unwrap();

        assert_eq!(feed.stats.records, 2);
        assert_eq!(feed.stats.degenerate_records, 1);
        assert_eq!(feed.stats.truncated_records, 1);
        assert_eq!(feed.book.record_count(), 2);
        assert_eq!(feed.book.bid_levels(), 2);
        assert_eq!(feed.book.ask_totals(), &[1, 1]);
        assert_eq!(
            feed.warnings.count_by_category(WarningCategory::DegenerateRecord),
            1
        );
    }

    #[test]
    fn test_missing_column_is_fatal() {
        let input = "{ES}{OK}{GOOD}{10,100}{11,80}{10,100 9,50}{11,80}\n{ES}{OK}\n";
        let err = quiet(FeedReader::new(FeedFormat::StructuredLog, "a.log", BookConfig::new(5)))
            .read(input.as_bytes())
            .unwrap_err();

        match err {
            ReconError::MissingColumn {
                feed,
                line,
                column,
                found,
            } => {
                assert_eq!(feed, "log");
                assert_eq!(line, 2);
                assert_eq!(column, 5);
                assert_eq!(found, 2);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_blank_lines_are_skipped() {
        let input = "\n{ES}{OK}{GOOD}{1,1}{2,1}{1,1}{2,1}\n   \n";
        let feed = quiet(FeedReader::new(FeedFormat::StructuredLog, "a.log", BookConfig::new(5)))
            .read(input.as_bytes())
            .unwrap();

        assert_eq!(feed.stats.blank_lines, 2);
        assert_eq!(feed.book.record_count(), 1);
    }

    #[test]
    fn test_invalid_utf8_line_is_decoded_not_fatal() {
        let mut input = b"{ES}{OK}{GOOD}{}{}{10,1}{11,1}\n".to_vec();
        input.extend_from_slice(b"{Caf\xe9}{OK}{GOOD}{}{}{9,2}{12,2}\n");
        input.extend_from_slice(b"{ES}{OK}{GOOD}{}{}{10,3}{11,3}\n");

        let feed = quiet(FeedReader::new(FeedFormat::StructuredLog, "a.log", BookConfig::new(5)))
            .read(&input[..])
            .unwrap();

        assert_eq!(feed.stats.records, 3);
        assert_eq!(feed.stats.invalid_utf8_lines, 1);
        assert!(feed.book.bids().level(0).unwrap().contains(9, 2));
        assert_eq!(feed.book.bid_totals()[0], 3);

        let warning = &feed.warnings.warnings()[0];
        assert_eq!(warning.category, WarningCategory::InvalidUtf8);
        assert_eq!(warning.line, Some(2));
        assert_eq!(warning.context["valid_up_to"], "4");
    }

    #[test]
    fn test_bytes_read_matches_input() {
        let crlf = "{ES}{OK}{GOOD}{}{}{10,1}{11,1}\r\n{ES}{OK}{GOOD}{}{}{10,2}{11,2}";
        let feed = quiet(FeedReader::new(FeedFormat::StructuredLog, "a.log", BookConfig::new(5)))
            .read(crlf.as_bytes())
            .unwrap();

        assert_eq!(feed.stats.bytes_read, crlf.len() as u64);
        assert_eq!(feed.stats.lines_read, 2);
        assert_eq!(feed.stats.records, 2);
        // CR is not part of the ask field
        assert!(feed.book.asks().level(0).unwrap().contains(11, 1));
    }

    #[test]
    fn test_unparsable_token_keeps_text() {
        let input = "{ES}{OK}{GOOD}{}{}{99999999999999999999,1 10,2}{11,1}\n";
        let feed = quiet(FeedReader::new(FeedFormat::StructuredLog, "a.log", BookConfig::new(5)))
            .read(input.as_bytes())
            .unwrap();

        assert_eq!(feed.stats.skipped_tokens, 1);
        assert!(feed.book.bids().level(0).unwrap().contains(10, 2));
        let warning = &feed.warnings.warnings()[0];
        assert_eq!(warning.category, WarningCategory::UnparsableToken);
        assert_eq!(warning.context["token"], "99999999999999999999,1");
    }

    #[test]
    fn test_custom_tokenizer() {
        let input = "{ES}{OK}{GOOD}{}{}{10@100}{11@80}\n";
        let feed = quiet(
            FeedReader::new(FeedFormat::StructuredLog, "a.log", BookConfig::new(5))
                .with_tokenizer(LevelTokenizer::new(r"(\d+)@(\d+)").unwrap()),
        )
        .read(input.as_bytes())
        .unwrap();

        assert!(feed.book.bids().level(0).unwrap().contains(10, 100));
        assert_eq!(feed.book.best_spreads().len(), 1);
    }

    #[test]
    fn test_missing_file() {
        let err = FeedReader::new(FeedFormat::CsvSnapshot, "x", BookConfig::default())
            .read_path("/nonexistent/feeds.csv")
            .unwrap_err();
        assert!(matches!(err, ReconError::Io { .. }));
    }

    #[test]
    fn test_format_from_path() {
        assert_eq!(FeedFormat::from_path("a/b.CSV"), Some(FeedFormat::CsvSnapshot));
        assert_eq!(FeedFormat::from_path("b.log"), Some(FeedFormat::StructuredLog));
        assert_eq!(FeedFormat::from_path("b.txt"), None);
    }
}
