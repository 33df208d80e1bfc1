use std::path::PathBuf;
use thiserror::Error;
use crate::timing::TimingKey;

/// A failed timing table lookup. The table must hold exactly one row per key
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LookupError {
    #[error("no timing row for {0}")]
    Missing(TimingKey),
    #[error("{matches} timing rows for {key}, expected exactly one")]
    Ambiguous { key: TimingKey, matches: usize },
}

/// Every way a run can fail. None of them are recoverable; the run aborts before any chart is
/// written
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("couldn't open {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("couldn't parse the timing table {}: {source}", .path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("couldn't read the timing spreadsheet {}: {source}", .path.display())]
    Workbook {
        path: PathBuf,
        #[source]
        source: calamine::Error,
    },

    #[error("timing spreadsheet {}: {reason}", .path.display())]
    Spreadsheet { path: PathBuf, reason: String },

    #[error("timing table row {row}: associativity {value:?} is neither a way count nor FA")]
    BadAssociativity { row: usize, value: String },

    #[error("missing result file {}: {source}", .path.display())]
    MissingResult {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed result file {}: {reason}", .path.display())]
    MalformedResult { path: PathBuf, reason: String },

    #[error("hit time lookup failed for {variant} at {size} bytes: {source}")]
    Lookup {
        variant: String,
        size: u64,
        #[source]
        source: LookupError,
    },

    #[error("couldn't load the config file {}: {source}", .path.display())]
    Config {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("couldn't draw the chart: {0}")]
    Chart(String),
}

pub type Result<T> = std::result::Result<T, AnalysisError>;
