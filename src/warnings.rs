//! Warning tracking for feed ingestion.
//!
//! Malformed or empty records do not abort ingestion, but they must not go
//! unnoticed either. Each anomaly is recorded here with its feed and line so
//! it can be summarized and exported next to the report.
//!
//! # Example
//!
//! ```
//! use feed_lob_reconciler::warnings::{WarningCategory, WarningTracker};
//!
//! let mut tracker = WarningTracker::new();
//! tracker.record_line_warning(
//!     WarningCategory::DegenerateRecord,
//!     "no bid levels",
//!     "feeds.csv",
//!     42,
//! );
//! assert_eq!(tracker.summary().total, 1);
//! ```

use ahash::{AHashMap, AHashSet};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Category of warning for classification and filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WarningCategory {
    /// Record without usable bid or ask levels
    DegenerateRecord,

    /// Level match whose price or quantity could not be parsed
    UnparsableToken,

    /// Record with more levels than the configured depth
    DepthTruncated,

    /// Blank line skipped
    BlankLine,

    /// Line with bytes that are not valid UTF-8, decoded lossily
    InvalidUtf8,
}

impl WarningCategory {
    /// Get a human-readable name for the category.
    pub fn name(&self) -> &'static str {
        match self {
            WarningCategory::DegenerateRecord => "DEGENERATE_RECORD",
            WarningCategory::UnparsableToken => "UNPARSABLE_TOKEN",
            WarningCategory::DepthTruncated => "DEPTH_TRUNCATED",
            WarningCategory::BlankLine => "BLANK_LINE",
            WarningCategory::InvalidUtf8 => "INVALID_UTF8",
        }
    }

    /// Get severity level (1=low, 2=medium, 3=high).
    pub fn severity(&self) -> u8 {
        match self {
            WarningCategory::DegenerateRecord => 2,
            WarningCategory::UnparsableToken => 3,
            WarningCategory::DepthTruncated => 1,
            WarningCategory::BlankLine => 1,
            WarningCategory::InvalidUtf8 => 2,
        }
    }
}

/// A single warning record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Warning {
    /// Unique warning ID (auto-incremented)
    pub id: u64,

    /// Warning category
    pub category: WarningCategory,

    /// Human-readable message
    pub message: String,

    /// Feed the warning came from
    pub source: Option<String>,

    /// 1-based line number in the feed
    pub line: Option<u64>,

    /// Additional context as key-value pairs
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    pub context: HashMap<String, String>,
}

impl Warning {
    /// Create a new warning with minimal information.
    pub fn new(id: u64, category: WarningCategory, message: impl Into<String>) -> Self {
        Self {
            id,
            category,
            message: message.into(),
            source: None,
            line: None,
            context: HashMap::new(),
        }
    }

    /// Set the feed name.
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Set the line number.
    pub fn with_line(mut self, line: u64) -> Self {
        self.line = Some(line);
        self
    }

    /// Add context key-value pair.
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }
}

/// Summary statistics for warnings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WarningSummary {
    /// Total number of warnings
    pub total: u64,

    /// Count by category
    pub by_category: HashMap<String, u64>,

    /// Count by severity
    pub by_severity: HashMap<u8, u64>,

    /// Number of distinct lines involved
    pub unique_lines: u64,
}

/// Configuration for warning tracker.
#[derive(Debug, Clone)]
pub struct WarningTrackerConfig {
    /// Maximum number of warnings to keep in memory (counts are never capped)
    pub max_warnings: usize,

    /// Whether to forward warnings to the `log` facade
    pub log_warnings: bool,

    /// Minimum severity to log (1=all, 2=medium+, 3=high only)
    pub min_log_severity: u8,

    /// Whether to drop a repeated message on the same feed line
    pub deduplicate: bool,
}

impl Default for WarningTrackerConfig {
    fn default() -> Self {
        Self {
            max_warnings: 100_000,
            log_warnings: true,
            min_log_severity: 2,
            deduplicate: true,
        }
    }
}

/// Messages already recorded for the line a source is currently on.
#[derive(Debug, Default)]
struct LineCursor {
    line: Option<u64>,
    messages: AHashSet<(WarningCategory, String)>,
}

/// Warning tracker owned by one feed ingestion.
///
/// Warnings of one source are expected in ascending line order, as a feed
/// is read. Deduplication and the distinct-line count only look at the
/// line each source is currently on, so bookkeeping stays bounded by the
/// warnings of a single line.
#[derive(Debug)]
pub struct WarningTracker {
    /// Configuration
    config: WarningTrackerConfig,

    /// Stored warnings, at most `max_warnings`
    warnings: Vec<Warning>,

    /// Counter for unique IDs
    next_id: u64,

    /// Count by category, including warnings not stored
    category_counts: AHashMap<WarningCategory, u64>,

    /// Current line per source
    cursors: AHashMap<Option<String>, LineCursor>,

    /// Distinct (source, line) pairs seen
    unique_lines: u64,
}

impl WarningTracker {
    /// Create a new warning tracker with default configuration.
    pub fn new() -> Self {
        Self::with_config(WarningTrackerConfig::default())
    }

    /// Create a new warning tracker with custom configuration.
    pub fn with_config(config: WarningTrackerConfig) -> Self {
        Self {
            config,
            warnings: Vec::new(),
            next_id: 1,
            category_counts: AHashMap::new(),
            cursors: AHashMap::new(),
            unique_lines: 0,
        }
    }

    /// Record a warning.
    ///
    /// Returns the warning ID if recorded, or None if deduplicated.
    pub fn record(&mut self, warning: Warning) -> Option<u64> {
        let cursor = self.cursors.entry(warning.source.clone()).or_default();
        if cursor.line != warning.line {
            if warning.line.is_some() {
                self.unique_lines += 1;
            }
            cursor.line = warning.line;
            cursor.messages.clear();
        }
        if self.config.deduplicate
            && !cursor
                .messages
                .insert((warning.category, warning.message.clone()))
        {
            return None;
        }

        if self.config.log_warnings && warning.category.severity() >= self.config.min_log_severity
        {
            log::warn!(
                "[{}] {}{}: {}",
                warning.category.name(),
                warning.source.as_deref().unwrap_or("-"),
                warning.line.map(|l| format!(":{l}")).unwrap_or_default(),
                warning.message
            );
        }

        *self.category_counts.entry(warning.category).or_insert(0) += 1;

        let id = warning.id;
        if self.warnings.len() < self.config.max_warnings {
            self.warnings.push(warning);
        }

        Some(id)
    }

    /// Build a warning tied to a feed line, with a fresh ID, without recording it.
    pub fn line_warning(
        &mut self,
        category: WarningCategory,
        message: impl Into<String>,
        source: &str,
        line: u64,
    ) -> Warning {
        Warning::new(self.allocate_id(), category, message)
            .with_source(source)
            .with_line(line)
    }

    /// Record a warning tied to a feed line.
    pub fn record_line_warning(
        &mut self,
        category: WarningCategory,
        message: impl Into<String>,
        source: &str,
        line: u64,
    ) -> Option<u64> {
        let warning = self.line_warning(category, message, source, line);
        self.record(warning)
    }

    /// Get the number of warnings stored.
    pub fn len(&self) -> usize {
        self.warnings.len()
    }

    /// Check if no warnings have been recorded.
    pub fn is_empty(&self) -> bool {
        self.warnings.is_empty()
    }

    /// Get total count of recorded warnings.
    pub fn total_count(&self) -> u64 {
        self.category_counts.values().sum()
    }

    /// Get count for a specific category.
    pub fn count_by_category(&self, category: WarningCategory) -> u64 {
        self.category_counts.get(&category).copied().unwrap_or(0)
    }

    /// Get all warnings.
    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    /// Merge the tracker of another source into this one.
    ///
    /// Counts are added as they are, stored warnings are renumbered and kept
    /// up to this tracker's cap. Both trackers are expected to cover
    /// different sources.
    pub fn absorb(&mut self, other: WarningTracker) {
        for (category, count) in other.category_counts {
            *self.category_counts.entry(category).or_insert(0) += count;
        }
        self.unique_lines += other.unique_lines;

        let room = self.config.max_warnings.saturating_sub(self.warnings.len());
        for mut warning in other.warnings.into_iter().take(room) {
            warning.id = self.allocate_id();
            self.warnings.push(warning);
        }
    }

    /// Get summary statistics.
    pub fn summary(&self) -> WarningSummary {
        let mut by_category = HashMap::new();
        let mut by_severity = HashMap::new();

        for (cat, count) in &self.category_counts {
            by_category.insert(cat.name().to_string(), *count);
            *by_severity.entry(cat.severity()).or_insert(0) += *count;
        }

        WarningSummary {
            total: self.total_count(),
            by_category,
            by_severity,
            unique_lines: self.unique_lines,
        }
    }

    /// Export summary and warnings to a JSON file.
    pub fn export_to_file(&self, path: impl AsRef<Path>) -> crate::Result<()> {
        let path = path.as_ref();
        let file = File::create(path).map_err(|e| crate::ReconError::io(path, e))?;
        let mut writer = BufWriter::new(file);

        let export = serde_json::json!({
            "summary": self.summary(),
            "warnings": self.warnings,
        });
        serde_json::to_writer_pretty(&mut writer, &export)?;
        writer.flush().map_err(|e| crate::ReconError::io(path, e))?;
        Ok(())
    }

    fn allocate_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }
}

impl Default for WarningTracker {
    fn default() -> Self {
        Self::new()
    }
}
