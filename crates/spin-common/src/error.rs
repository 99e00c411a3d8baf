//! Error types for grid construction.

use thiserror::Error;

/// Result type alias using GridError.
pub type GridResult<T> = Result<T, GridError>;

/// Errors raised when assembling a lat/lon grid.
#[derive(Debug, Error, PartialEq)]
pub enum GridError {
    #[error("Grid has no {0} coordinates")]
    EmptyAxis(&'static str),

    #[error("Grid value count mismatch: expected {expected} ({rows}x{cols}), got {actual}")]
    ShapeMismatch {
        rows: usize,
        cols: usize,
        expected: usize,
        actual: usize,
    },

    #[error("Cannot average zero grids")]
    NothingToAverage,
}
