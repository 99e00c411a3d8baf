//! Spinning-globe anomaly video service.
//!
//! Downloads a gridded temperature-anomaly dataset, renders one Mollweide
//! frame per month with the central meridian advancing between frames, and
//! encodes the frames into a video.

pub mod config;
pub mod download;
pub mod encoder;
pub mod pipeline;

pub use config::{ConfigError, SpinConfig};
pub use download::{DatasetSource, Fetcher};
pub use encoder::{
    EncoderError, EncoderSettings, FfmpegEncoder, FrameSink, PngSequenceWriter, SinkSummary,
    TeeSink,
};
pub use pipeline::{RunSummary, SpinPipeline};
