//! Error types for frame rendering.

use projection::ProjectionError;
use thiserror::Error;

pub type RenderResult<T> = Result<T, RenderError>;

/// A frame could not be laid out on the globe.
///
/// These are the only render failures a caller may recover from by
/// dropping the frame; everything else in [`RenderError`] is fatal.
#[derive(Debug, Error, PartialEq)]
pub enum GeometryError {
    #[error("{0}")]
    Projection(#[from] ProjectionError),

    #[error("{axis} coordinates are empty")]
    EmptyAxis { axis: &'static str },

    #[error("{axis} coordinate at index {index} is not finite")]
    NonFiniteCoordinate { axis: &'static str, index: usize },

    #[error("{axis} coordinates are not strictly monotonic at index {index}")]
    NonMonotonic { axis: &'static str, index: usize },

    #[error("longitude coordinates span {span} degrees")]
    LongitudeSpan { span: f64 },

    #[error("coastline vertex ({lon}, {lat}) cannot be projected")]
    UnprojectableVertex { lon: f64, lat: f64 },
}

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Geometry error: {0}")]
    Geometry(#[from] GeometryError),

    #[error("Invalid frame layout: {0}")]
    Layout(String),

    #[error("Invalid style: {0}")]
    Style(String),

    #[error("Font error: {0}")]
    Font(String),

    #[error("Invalid coastline data: {0}")]
    Coastline(String),

    #[error("PNG encoding failed: {0}")]
    Png(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl RenderError {
    /// Whether this error only affects the frame being drawn.
    pub fn is_geometry(&self) -> bool {
        matches!(self, RenderError::Geometry(_))
    }
}
