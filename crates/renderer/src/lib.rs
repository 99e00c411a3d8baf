//! Frame rendering for the spinning anomaly globe.
//!
//! A frame is a fixed-size RGB image holding:
//! - the anomaly field rasterized onto a Mollweide ellipse
//! - optional coastlines
//! - a vertical colorbar with its label
//! - a title naming the month
//!
//! [`FrameRenderer`] composes these; the modules below hold the pieces.

pub mod coastline;
pub mod error;
pub mod frame;
pub mod gradient;
pub mod layout;
pub mod legend;
pub mod png;
pub mod raster;
pub mod style;
pub mod text;

pub use coastline::Coastlines;
pub use error::{GeometryError, RenderError, RenderResult};
pub use frame::{frame_title, FrameOptions, FrameRenderer};
pub use gradient::{Color, ColorScale};
pub use layout::{BarRect, FrameLayout, MapEllipse};
pub use raster::CellIndex;
pub use style::{StyleConfig, StyleDefinition};
pub use text::TextRenderer;
