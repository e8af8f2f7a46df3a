use std::path::PathBuf;

use chrono::NaiveDate;
use thiserror::Error;

// ---------------------------------------------------------------------------
// Errors raised by the data layer
// ---------------------------------------------------------------------------

/// Failure to turn a file into a [`Dataset`](super::model::Dataset).
///
/// Loading is all-or-nothing: any of these aborts the whole load.  Row
/// numbers are 1-based data rows, not counting the CSV header.
#[derive(Debug, Error)]
pub enum DataLoadError {
    #[error("reading {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parsing CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("parsing JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("expected a top-level JSON array of records")]
    NotAnArray,

    #[error("data row {row} is not a JSON object")]
    NotAnObject { row: usize },

    #[error("missing required column '{0}'")]
    MissingColumn(String),

    #[error("data row {row}: required column '{column}' is empty")]
    MissingValue { row: usize, column: &'static str },

    #[error("data row {row}: cannot parse {column} timestamp '{value}'")]
    InvalidTimestamp {
        row: usize,
        column: &'static str,
        value: String,
    },

    #[error("unsupported file extension: .{0}")]
    UnsupportedFormat(String),
}

/// A filter that cannot be applied as given.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidFilterError {
    #[error("date range start {start} is after end {end}")]
    InvertedDateRange { start: NaiveDate, end: NaiveDate },
}

/// Column name that is not one of the categorical dimensions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown dimension '{0}'")]
pub struct UnknownDimension(pub String);
