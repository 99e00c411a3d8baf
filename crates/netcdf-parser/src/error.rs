//! Error types for NetCDF parsing operations.

use spin_common::{GridError, TimeParseError, YearMonth};
use thiserror::Error;

/// Result type for NetCDF parser operations.
pub type NetCdfResult<T> = Result<T, NetCdfError>;

/// Error types for NetCDF parsing.
#[derive(Error, Debug)]
pub enum NetCdfError {
    /// File I/O error
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Missing required variable or attribute
    #[error("Missing required data: {0}")]
    MissingData(String),

    /// Invalid data format
    #[error("Invalid data format: {0}")]
    InvalidFormat(String),

    /// Time axis could not be decoded
    #[error("Invalid time axis: {0}")]
    Time(#[from] TimeParseError),

    /// Data did not form a valid lat/lon grid
    #[error("Invalid grid: {0}")]
    Grid(#[from] GridError),

    /// No time step falls inside the requested month
    #[error("No data for period {0}")]
    NoDataForPeriod(YearMonth),
}
