//! Error types for feed ingestion and reconciliation.
//!
//! Clean error handling using `thiserror` for ergonomic error definitions.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for reconciliation operations.
pub type Result<T> = std::result::Result<T, ReconError>;

/// Main error type for ingestion, reconciliation and reporting.
#[derive(Error, Debug)]
pub enum ReconError {
    /// I/O failure on a specific file
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// I/O failure without a known path (e.g. in-memory readers)
    #[error("I/O error: {0}")]
    Stream(#[from] std::io::Error),

    /// A record is missing the column holding its bid or ask levels
    #[error("{feed} line {line}: expected column {column} but found only {found} fields")]
    MissingColumn {
        feed: &'static str,
        line: u64,
        column: usize,
        found: usize,
    },

    /// Invalid configuration value
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// JSON (de)serialization failure
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid tokenizer or marker pattern
    #[error("Invalid pattern: {0}")]
    Pattern(#[from] regex::Error),

    /// Report template does not contain the begin marker
    #[error("Report template {path} has no line matching marker '{marker}'")]
    MarkerNotFound { path: PathBuf, marker: String },

    /// Ingestion of one named source failed
    #[error("Source '{source_name}' failed: {error}")]
    Source {
        source_name: String,
        #[source]
        error: Box<ReconError>,
    },

    /// An ingestion worker panicked before returning
    #[error("Ingestion worker for '{0}' panicked")]
    WorkerPanicked(String),
}

impl ReconError {
    /// Attach the offending path to an I/O error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ReconError::Io {
            path: path.into(),
            source,
        }
    }

    /// Tag an error with the source feed it came from.
    pub fn in_source(self, source_name: impl Into<String>) -> Self {
        ReconError::Source {
            source_name: source_name.into(),
            error: Box::new(self),
        }
    }

    /// Whether this error is a malformed-record failure.
    pub fn is_malformed_record(&self) -> bool {
        match self {
            ReconError::MissingColumn { .. } => true,
            ReconError::Source { error, .. } => error.is_malformed_record(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ReconError::MissingColumn {
            feed: "csv",
            line: 7,
            column: 11,
            found: 4,
        };
        assert_eq!(
            err.to_string(),
            "csv line 7: expected column 11 but found only 4 fields"
        );
    }

    #[test]
    fn test_source_wrapping_keeps_kind() {
        let err = ReconError::MissingColumn {
            feed: "log",
            line: 1,
            column: 5,
            found: 0,
        }
        .in_source("feeds.log");

        assert!(err.is_malformed_record());
        assert!(err.to_string().starts_with("Source 'feeds.log' failed"));
    }

    #[test]
    fn test_result_type() {
        let result: Result<i32> = Err(ReconError::InvalidConfig("book_levels".into()));
        assert!(result.is_err());
    }
}
