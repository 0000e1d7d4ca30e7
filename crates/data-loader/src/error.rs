//! Error types for the data-loader crate.
//!
//! Two layers:
//! - `DataIntegrityError` covers catalog content that cannot be turned into a
//!   valid catalog (missing titles, duplicates that survive date-suffixing).
//! - `DataLoadError` wraps it together with the file-level failures
//!   (I/O, CSV framing, malformed lines).

use thiserror::Error;

/// Malformed or irreconcilably duplicate catalog data.
///
/// Always fatal for the load in progress: no partial catalog is returned.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DataIntegrityError {
    /// A required field was missing or blank on a record
    #[error("Record {row} is missing required field '{field}'")]
    MissingField { row: usize, field: String },

    /// A required column is absent from the dataset header
    #[error("Dataset has no '{column}' column")]
    MissingColumn { column: String },

    /// An item's recorded index disagrees with its position in the catalog
    #[error("Item at position {position} records index {index}")]
    IndexMismatch { position: usize, index: usize },

    /// Two records still share a title after deduplication
    /// (same title AND same release date)
    #[error("Duplicate title '{title}' at indices {first} and {second}")]
    DuplicateTitle {
        title: String,
        first: usize,
        second: usize,
    },
}

/// Errors that can occur while reading a dataset snapshot
#[derive(Error, Debug)]
pub enum DataLoadError {
    /// I/O error occurred while reading file
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// The CSV reader rejected the input (bad quoting, ragged rows, ...)
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    /// Line in data file couldn't be parsed
    #[error("Parse error at line {line}: {reason}")]
    ParseError { line: u64, reason: String },

    /// The parsed rows do not form a valid catalog
    #[error("Data integrity error: {0}")]
    Integrity(#[from] DataIntegrityError),
}

/// Convenience type alias for Results in this crate
pub type Result<T> = std::result::Result<T, DataLoadError>;
