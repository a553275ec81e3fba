use std::fmt;

use thiserror::Error;

/// Which model-grid store a parameter was looked up in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKind {
    Physics,
    Noise,
}

impl fmt::Display for StoreKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreKind::Physics => write!(f, "physics grid"),
            StoreKind::Noise => write!(f, "noise grid"),
        }
    }
}

/// Errors raised while loading sparse likelihoods, reading the model grid or gathering.
#[derive(Debug, Error)]
pub enum GridError {
    #[error("sample store holds {actual} objects, expected {expected}")]
    CountMismatch { expected: usize, actual: usize },

    #[error("object '{key}' has {actual} samples, expected {expected} (set by the first object)")]
    ShapeMismatch {
        key: String,
        expected: usize,
        actual: usize,
    },

    #[error("object '{key}': {n_index} indices but {n_value} values")]
    EntryLengthMismatch {
        key: String,
        n_index: usize,
        n_value: usize,
    },

    #[error("object '{key}', sample {sample}: negative grid index {index}")]
    NegativeIndex {
        key: String,
        sample: usize,
        index: i64,
    },

    #[error("object '{0}' not found in sample store")]
    MissingObject(String),

    #[error("object '{0}' listed more than once")]
    DuplicateObject(String),

    #[error("parameter '{name}' not found in {store}")]
    MissingParameter { name: String, store: StoreKind },

    #[error("noise parameter '{0}' has no realizations")]
    EmptyRealizations(String),

    #[error(
        "parameter '{parameter}': grid index {index} at sample {sample} of object {object} ('{key}') \
         outside grid of {len} rows"
    )]
    GridIndexOutOfRange {
        parameter: String,
        sample: usize,
        object: usize,
        key: String,
        index: usize,
        len: usize,
    },

    #[error("log-likelihood maximum is {0}, cannot normalise")]
    NonFiniteMaximum(f64),

    #[error("{0}")]
    Format(String),

    #[error("unsupported file extension: .{0}")]
    UnsupportedFormat(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

pub type Result<T> = std::result::Result<T, GridError>;
