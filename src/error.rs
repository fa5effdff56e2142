//! Error types for the payroll report pipeline.
//!
//! Fatal problems (bad configuration, unreadable or malformed files) are
//! variants of [`Error`] and abort a run. Problems confined to a single CSV
//! row are not errors at all: they become [`RowError`] diagnostics and the
//! row is skipped.

use std::{fmt::Display, io, path::PathBuf};

use thiserror::Error;

/// Everything that can abort a report run.
#[derive(Debug, Error)]
pub enum Error {
    /// A CSV file's header row does not describe a usable work record.
    #[error("{}: {problem}", .path.display())]
    Schema {
        /// The offending file.
        path: PathBuf,
        /// What is wrong with its header.
        problem: SchemaProblem,
    },

    /// No report strategy is registered under the requested name.
    #[error("unknown report type {kind:?} (available: {})", .available.join(", "))]
    UnknownReport {
        kind: String,
        available: Vec<&'static str>,
    },

    /// The requested output format cannot be written.
    #[error("unsupported output format {format:?} (available: {})", .available.join(", "))]
    UnsupportedFormat {
        format: String,
        available: Vec<&'static str>,
    },

    /// A file could not be opened, read or written.
    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A CSV file could not be decoded outside of any single row.
    #[error("reading {}: {source}", .path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// A group's totals, or the grand totals, are too large to represent.
    #[error("totals for {group:?} are too large to represent")]
    Overflow { group: String },

    /// Writing the report to the console failed.
    #[error("writing report to console: {0}")]
    Console(#[source] io::Error),

    /// The report could not be encoded as JSON.
    #[error("encoding report as JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// The ways a CSV header can fail validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaProblem {
    #[error("missing required column(s): {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    #[error("expected exactly one rate column, found {}", .0.join(", "))]
    MultipleRateColumns(Vec<String>),

    #[error("column {0:?} appears more than once")]
    DuplicateColumn(String),
}

/// A data row that was skipped because it failed validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}:{line}: {message}", .path.display())]
pub struct RowError {
    /// The file the row came from.
    pub path: PathBuf,
    /// 1-based line number within that file.
    pub line: u64,
    pub message: String,
}

impl RowError {
    pub(crate) fn new(path: impl Into<PathBuf>, line: u64, message: impl Display) -> Self {
        Self {
            path: path.into(),
            line,
            message: message.to_string(),
        }
    }
}

/// A type alias for Results that return [`Error`].
pub type Result<T> = std::result::Result<T, Error>;
