//! Map projection for the rotating globe.
//!
//! Implements the Mollweide projection from scratch without external
//! dependencies, plus the cursor that picks each frame's central meridian.

pub mod error;
pub mod mollweide;
pub mod spin;

pub use error::ProjectionError;
pub use mollweide::{normalize_longitude, Mollweide};
pub use spin::LongitudeCursor;
