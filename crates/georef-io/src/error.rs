use georef_core::{FitError, TableError};

/// Errors raised while reading inputs or writing results.
#[derive(thiserror::Error, Debug)]
pub enum IoError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Csv(#[from] csv::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Table(#[from] TableError),
    #[error(transparent)]
    Fit(#[from] FitError),
    #[error("line {line}: column {column:?} has non-numeric value {value:?}")]
    BadCell {
        line: u64,
        column: String,
        value: String,
    },
    #[error("point {row}: uid {value:?} is missing or not an integer")]
    InvalidUid { row: usize, value: String },
    #[error("no column named {name:?} in the unprojected points header")]
    MissingField { name: String },
}
