//! Error type shared by the reader, the slice extractor and the doping calculator.

use thiserror::Error;

/// Convenience alias used across the crate.
pub type Result<T> = std::result::Result<T, AdmError>;

#[derive(Debug, Error)]
pub enum AdmError {
    /// The input ended before a `#Temp` column-header line was seen.
    #[error("header line not found: end of file reached after {lines} lines")]
    HeaderNotFound { lines: usize },

    /// Fewer than two of frequency / voltage / temperature are fixed.
    #[error("at least two of frequency, voltage and temperature should be specified")]
    InsufficientSelectors,

    /// All three selectors were given explicitly, so no axis is left to sweep.
    #[error("frequency, voltage and temperature are all fixed; leave one unspecified")]
    OverSpecified,

    #[error("invalid capacitance model '{0}' (expected 'parallel' or 'series')")]
    InvalidModel(String),

    #[error("line {line}: malformed header field '{field}'")]
    MalformedHeader { line: usize, field: String },

    #[error("line {line}: '{token}' is not a number")]
    InvalidNumber { line: usize, token: String },

    #[error("line {line}: expected {expected} columns, found {found}")]
    RaggedRow {
        line: usize,
        expected: usize,
        found: usize,
    },

    #[error("no numeric data after the header line")]
    EmptyTable,

    #[error("table has {found} columns but {frequencies} frequencies need {expected}")]
    ColumnMismatch {
        found: usize,
        frequencies: usize,
        expected: usize,
    },

    /// Temperature blocks do not share the first block's voltage sequence.
    #[error("irregular measurement grid: {0}")]
    IrregularGrid(String),

    #[error("invalid C-V sweep: {0}")]
    InvalidSweep(String),

    #[error("file header does not provide {0}")]
    MissingMetadata(&'static str),

    #[error(transparent)]
    Shape(#[from] ndarray::ShapeError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
