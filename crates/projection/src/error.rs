//! Error types for projection setup.

use thiserror::Error;

/// Errors raised while configuring a projection or its spin.
#[derive(Debug, Error, PartialEq)]
pub enum ProjectionError {
    #[error("Invalid central longitude: {0}")]
    InvalidCentralLongitude(f64),

    #[error("Invalid longitude range [{start}, {stop})")]
    InvalidRange { start: i32, stop: i32 },

    #[error("Longitude step {step} must be in (0, {span})")]
    InvalidStep { step: i32, span: i32 },

    #[error("Initial longitude {initial} outside [{start}, {stop})")]
    InitialOutOfRange { initial: i32, start: i32, stop: i32 },
}
