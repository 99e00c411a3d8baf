//! Common types and utilities shared across the anomaly-spin workspace.

pub mod error;
pub mod grid;
pub mod time;

pub use error::{GridError, GridResult};
pub use grid::LatLonGrid;
pub use time::{CfTimeUnits, MonthRange, TimeParseError, YearMonth};
