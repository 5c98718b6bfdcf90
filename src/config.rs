//! Run configuration: feed paths, book depth and report settings.
//!
//! Stored as JSON. Every field has a default so partial files are accepted.
//!
//! ```json
//! {
//!   "csv_feed": "data/feeds.csv",
//!   "log_feed": "data/feeds.log",
//!   "book_levels": 5,
//!   "best_spreads": 5,
//!   "report": { "file": "orderbook.htm" }
//! }
//! ```

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::book::BookConfig;
use crate::error::{ReconError, Result};
use crate::types::{DEFAULT_BEST_SPREADS, DEFAULT_BOOK_LEVELS};

/// Report output settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// HTML template the summary is injected into
    pub file: PathBuf,

    /// Title of the summary section
    pub summary_title: String,

    /// Pattern of the line after which the summary is injected
    pub marker_begin: String,

    /// Pattern of the line where injected content ends
    pub marker_end: String,

    /// Optional JSON dump of summaries and differences
    pub json_file: Option<PathBuf>,

    /// Optional JSON export of ingestion warnings
    pub warnings_file: Option<PathBuf>,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            file: PathBuf::from("orderbook.htm"),
            summary_title: "Order Books Summary".to_string(),
            marker_begin: "begin summary".to_string(),
            marker_end: "end summary".to_string(),
            json_file: None,
            warnings_file: None,
        }
    }
}

/// Configuration of a reconciliation run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconConfig {
    /// CSV snapshot feed
    pub csv_feed: PathBuf,

    /// Structured log feed
    pub log_feed: PathBuf,

    /// Maximum depth read per record
    pub book_levels: usize,

    /// Number of best-spread entries in each summary
    pub best_spreads: usize,

    /// Report settings
    pub report: ReportConfig,
}

impl Default for ReconConfig {
    fn default() -> Self {
        Self {
            csv_feed: PathBuf::from("feeds.csv"),
            log_feed: PathBuf::from("feeds.log"),
            book_levels: DEFAULT_BOOK_LEVELS,
            best_spreads: DEFAULT_BEST_SPREADS,
            report: ReportConfig::default(),
        }
    }
}

impl ReconConfig {
    /// Create a config for the two feeds with default settings.
    pub fn new(csv_feed: impl Into<PathBuf>, log_feed: impl Into<PathBuf>) -> Self {
        Self {
            csv_feed: csv_feed.into(),
            log_feed: log_feed.into(),
            ..Default::default()
        }
    }

    /// Set the depth cap.
    pub fn with_book_levels(mut self, levels: usize) -> Self {
        self.book_levels = levels;
        self
    }

    /// Set the number of best spreads to summarize.
    pub fn with_best_spreads(mut self, n: usize) -> Self {
        self.best_spreads = n;
        self
    }

    /// Set the HTML report template.
    pub fn with_report_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.report.file = path.into();
        self
    }

    /// Set the JSON output file.
    pub fn with_json_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.report.json_file = Some(path.into());
        self
    }

    /// Book configuration derived from this run configuration.
    pub fn book_config(&self) -> BookConfig {
        BookConfig::new(self.book_levels)
    }

    /// Check value ranges.
    pub fn validate(&self) -> Result<()> {
        self.book_config().validate()?;
        if self.report.marker_begin.is_empty() || self.report.marker_end.is_empty() {
            return Err(ReconError::InvalidConfig(
                "report markers must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Load from a JSON file.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| ReconError::io(path, e))?;
        let config: Self = serde_json::from_reader(BufReader::new(file))?;
        config.validate()?;
        log::info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Save to a JSON file.
    pub fn save_json(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let file = File::create(path).map_err(|e| ReconError::io(path, e))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, self)?;
        writer.flush().map_err(|e| ReconError::io(path, e))?;
        Ok(())
    }
}
