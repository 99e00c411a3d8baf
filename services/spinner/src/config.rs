//! Run configuration for the spinning-globe video.
//!
//! Values are layered: built-in defaults, then an optional YAML file, then
//! command-line flags (applied by the binary).

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use projection::{LongitudeCursor, ProjectionError};
use renderer::layout::figure_pixels;
use renderer::FrameOptions;
use serde::Deserialize;
use spin_common::MonthRange;
use thiserror::Error;
use tracing::debug;

/// NOAAGlobalTemp v5 gridded monthly anomalies (HTTP file server endpoint).
pub const DEFAULT_DATASET_URL: &str = "https://www.ncei.noaa.gov/thredds/fileServer/noaa-global-temp-v5/NOAAGlobalTemp_v5.0.0_gridded_s188001_e202212_c20230108T133308.nc";

/// Natural Earth 1:110m coastlines.
pub const DEFAULT_COASTLINES_URL: &str =
    "https://raw.githubusercontent.com/nvkelso/natural-earth-vector/master/geojson/ne_110m_coastline.geojson";

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("start_year {start} is after end_year {end}")]
    YearRange { start: i32, end: i32 },

    #[error("fps must be positive")]
    ZeroFps,

    #[error("color range is empty: vmin {vmin} >= vmax {vmax}")]
    ColorRange { vmin: f32, vmax: f32 },

    #[error("figure size {width}x{height} in at {dpi} dpi has no pixels")]
    EmptyFrame { width: f32, height: f32, dpi: u32 },

    #[error("invalid longitude sequence: {0}")]
    Longitude(#[from] ProjectionError),

    #[error("{field} must not be empty")]
    Empty { field: &'static str },
}

/// Everything a run needs, with defaults reproducing the classic
/// 2000-2020 video.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SpinConfig {
    /// URL or local path of the netCDF dataset
    pub dataset_url: String,
    /// Name of the anomaly variable
    pub variable: String,
    /// Directory downloaded files are cached in
    pub cache_dir: PathBuf,
    /// URL or local path of a GeoJSON coastline file; None draws no coastlines
    pub coastlines_url: Option<String>,

    pub output: PathBuf,
    /// ffmpeg codec name or FourCC (`mp4v` maps to `mpeg4`)
    pub codec: String,
    pub fps: u32,
    pub fig_width: f32,
    pub fig_height: f32,
    pub dpi: u32,

    pub start_year: i32,
    pub end_year: i32,
    pub start_longitude: i32,
    pub longitude_step: i32,

    pub vmin: f32,
    pub vmax: f32,
    /// Built-in color style
    pub style: String,
    pub font_path: Option<PathBuf>,
    /// Also write every frame as PNG into this directory
    pub frames_dir: Option<PathBuf>,

    pub log_level: String,
    pub json_logs: bool,
}

impl Default for SpinConfig {
    fn default() -> Self {
        let frame = FrameOptions::default();
        Self {
            dataset_url: DEFAULT_DATASET_URL.to_string(),
            variable: netcdf_parser::DEFAULT_VARIABLE.to_string(),
            cache_dir: PathBuf::from("data"),
            coastlines_url: Some(DEFAULT_COASTLINES_URL.to_string()),
            output: PathBuf::from("output_spin_vid_v3.mp4"),
            codec: "mp4v".to_string(),
            fps: 6,
            fig_width: frame.fig_width,
            fig_height: frame.fig_height,
            dpi: frame.dpi,
            start_year: 2000,
            end_year: 2020,
            start_longitude: projection::spin::DEFAULT_INITIAL_LONGITUDE,
            longitude_step: projection::spin::DEFAULT_LONGITUDE_STEP,
            vmin: frame.vmin,
            vmax: frame.vmax,
            style: frame.style,
            font_path: None,
            frames_dir: None,
            log_level: "info".to_string(),
            json_logs: false,
        }
    }
}

impl SpinConfig {
    /// Parse a YAML document; missing keys keep their defaults.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).context("Failed to parse configuration YAML")
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config = Self::from_yaml(&content)
            .with_context(|| format!("Invalid config file: {}", path.display()))?;
        debug!(path = %path.display(), "Loaded configuration file");
        Ok(config)
    }

    /// Check the settings that would otherwise fail halfway through a run.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.dataset_url.trim().is_empty() {
            return Err(ConfigError::Empty {
                field: "dataset_url",
            });
        }
        if self.variable.trim().is_empty() {
            return Err(ConfigError::Empty { field: "variable" });
        }
        if self.start_year > self.end_year {
            return Err(ConfigError::YearRange {
                start: self.start_year,
                end: self.end_year,
            });
        }
        if self.fps == 0 {
            return Err(ConfigError::ZeroFps);
        }
        if self.vmin.is_nan() || self.vmax.is_nan() || self.vmin >= self.vmax {
            return Err(ConfigError::ColorRange {
                vmin: self.vmin,
                vmax: self.vmax,
            });
        }
        let (width, height) = self.frame_size();
        if width == 0 || height == 0 {
            return Err(ConfigError::EmptyFrame {
                width: self.fig_width,
                height: self.fig_height,
                dpi: self.dpi,
            });
        }
        self.cursor()?;
        Ok(())
    }

    /// Pixel size of every frame; the renderer lays frames out at this size.
    pub fn frame_size(&self) -> (u32, u32) {
        figure_pixels(self.fig_width, self.fig_height, self.dpi)
    }

    pub fn frame_options(&self) -> FrameOptions {
        FrameOptions {
            fig_width: self.fig_width,
            fig_height: self.fig_height,
            dpi: self.dpi,
            vmin: self.vmin,
            vmax: self.vmax,
            style: self.style.clone(),
        }
    }

    pub fn cursor(&self) -> Result<LongitudeCursor, ProjectionError> {
        LongitudeCursor::with_start(self.start_longitude, self.longitude_step)
    }

    pub fn months(&self) -> MonthRange {
        MonthRange::years(self.start_year, self.end_year)
    }
}
