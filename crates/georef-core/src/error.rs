/// The precise reason a control-point set was rejected before fitting.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum InvalidInput {
    #[error("at least 3 control points are required, got {got}")]
    TooFewPoints { got: usize },
    #[error("control point {index} has a non-finite coordinate")]
    NonFinite { index: usize },
    #[error("control point {index} has a negative or non-finite standard error")]
    InvalidStderr { index: usize },
    #[error("control point {index} mixes rows with and without standard errors")]
    MixedUncertainty { index: usize },
    #[error("control point table has no column named {name:?}")]
    MissingColumn { name: String },
}

/// Errors returned by the fitting and simulation core.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum FitError {
    #[error("invalid control points: {0}")]
    InvalidInput(#[from] InvalidInput),
    #[error("{}", singular_message(.iteration))]
    Singular { iteration: Option<usize> },
    #[error("simulation requested but control points carry no standard errors")]
    NoUncertaintyData,
    #[error("control point table has {columns} columns, expected 4 (no uncertainty) or 6 (with uncertainty)")]
    DimensionMismatch { columns: usize },
    #[error("estimator was built from {expected} control points but got {got} targets")]
    TargetCountMismatch { expected: usize, got: usize },
}

fn singular_message(iteration: &Option<usize>) -> String {
    match iteration {
        Some(i) => format!("design matrix is singular in simulation iteration {i}"),
        None => "design matrix is singular".to_string(),
    }
}

impl FitError {
    /// Attach a simulation iteration index to a singular-fit failure.
    pub(crate) fn at_iteration(self, iteration: usize) -> Self {
        match self {
            FitError::Singular { .. } => FitError::Singular {
                iteration: Some(iteration),
            },
            other => other,
        }
    }
}

/// Errors raised while building a [`crate::PointTable`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum TableError {
    #[error("row {row} has {got} cells, header has {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        got: usize,
    },
    #[error("duplicate column name {name:?}")]
    DuplicateColumn { name: String },
}
