//! Spinning-globe anomaly video generator.
//!
//! Renders monthly NOAAGlobalTemp anomalies on a rotating Mollweide globe:
//! - Downloads (and caches) the dataset and coastlines
//! - One frame per month, central longitude advancing 6° per frame
//! - Frames skipped on geometry errors, everything else is fatal
//! - Encodes to MP4 through ffmpeg, optionally dumping PNG frames

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use netcdf_parser::AnomalyDataset;
use renderer::{Coastlines, FrameRenderer, TextRenderer};
use spinner::{
    DatasetSource, EncoderSettings, FfmpegEncoder, Fetcher, PngSequenceWriter, SpinConfig,
    SpinPipeline, TeeSink,
};

#[derive(Parser, Debug)]
#[command(name = "anomaly-spin")]
#[command(about = "Render a spinning-globe video of monthly temperature anomalies")]
struct Args {
    /// YAML configuration file
    #[arg(short, long, env = "SPIN_CONFIG")]
    config: Option<PathBuf>,

    /// Dataset URL or local netCDF path
    #[arg(long, env = "DATASET_URL")]
    dataset: Option<String>,

    /// Anomaly variable name
    #[arg(long)]
    variable: Option<String>,

    /// Directory for downloaded files
    #[arg(long, env = "CACHE_DIR")]
    cache_dir: Option<PathBuf>,

    /// Coastline GeoJSON URL or path
    #[arg(long, env = "COASTLINES_URL")]
    coastlines: Option<String>,

    /// Do not draw coastlines
    #[arg(long)]
    no_coastlines: bool,

    /// Output video file
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Codec name or FourCC
    #[arg(long)]
    codec: Option<String>,

    #[arg(long)]
    fps: Option<u32>,

    #[arg(long)]
    start_year: Option<i32>,

    #[arg(long)]
    end_year: Option<i32>,

    /// Central longitude of the first frame
    #[arg(long, allow_hyphen_values = true)]
    start_longitude: Option<i32>,

    /// Degrees of rotation per frame
    #[arg(long)]
    longitude_step: Option<i32>,

    /// Built-in color style
    #[arg(long)]
    style: Option<String>,

    /// TrueType font for titles and labels
    #[arg(long, env = "SPIN_FONT")]
    font: Option<PathBuf>,

    /// Also write each frame as PNG into this directory
    #[arg(long)]
    frames_dir: Option<PathBuf>,

    /// Log level
    #[arg(long, env = "LOG_LEVEL")]
    log_level: Option<String>,

    /// Emit JSON log lines
    #[arg(long)]
    json_logs: bool,
}

impl Args {
    fn apply(self, config: &mut SpinConfig) {
        if let Some(v) = self.dataset {
            config.dataset_url = v;
        }
        if let Some(v) = self.variable {
            config.variable = v;
        }
        if let Some(v) = self.cache_dir {
            config.cache_dir = v;
        }
        if let Some(v) = self.coastlines {
            config.coastlines_url = Some(v);
        }
        if self.no_coastlines {
            config.coastlines_url = None;
        }
        if let Some(v) = self.output {
            config.output = v;
        }
        if let Some(v) = self.codec {
            config.codec = v;
        }
        if let Some(v) = self.fps {
            config.fps = v;
        }
        if let Some(v) = self.start_year {
            config.start_year = v;
        }
        if let Some(v) = self.end_year {
            config.end_year = v;
        }
        if let Some(v) = self.start_longitude {
            config.start_longitude = v;
        }
        if let Some(v) = self.longitude_step {
            config.longitude_step = v;
        }
        if let Some(v) = self.style {
            config.style = v;
        }
        if let Some(v) = self.font {
            config.font_path = Some(v);
        }
        if let Some(v) = self.frames_dir {
            config.frames_dir = Some(v);
        }
        if let Some(v) = self.log_level {
            config.log_level = v;
        }
        if self.json_logs {
            config.json_logs = true;
        }
    }
}

fn init_tracing(config: &SpinConfig) -> Result<()> {
    let level = match config.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let builder = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true);

    if config.json_logs {
        tracing::subscriber::set_global_default(builder.with_thread_ids(true).json().finish())?;
    } else {
        tracing::subscriber::set_global_default(builder.finish())?;
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment from .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => SpinConfig::from_file(path)?,
        None => SpinConfig::default(),
    };
    args.apply(&mut config);

    init_tracing(&config)?;
    config.validate().context("Invalid configuration")?;

    info!(
        dataset = %config.dataset_url,
        output = %config.output.display(),
        start_year = config.start_year,
        end_year = config.end_year,
        "Starting anomaly spin"
    );

    let fetcher = Fetcher::new(&config.cache_dir)?;
    let dataset_path = fetcher
        .fetch(&DatasetSource::parse(&config.dataset_url))
        .await
        .context("Failed to fetch dataset")?;

    let coastlines_path = match &config.coastlines_url {
        Some(locator) => Some(
            fetcher
                .fetch(&DatasetSource::parse(locator))
                .await
                .context("Failed to fetch coastlines")?,
        ),
        None => None,
    };

    // Rendering and encoding are synchronous and strictly ordered
    tokio::task::spawn_blocking(move || render_video(&config, dataset_path, coastlines_path))
        .await
        .context("Render task panicked")??;

    Ok(())
}

fn render_video(
    config: &SpinConfig,
    dataset_path: PathBuf,
    coastlines_path: Option<PathBuf>,
) -> Result<()> {
    let dataset = AnomalyDataset::open(&dataset_path, &config.variable)
        .with_context(|| format!("Failed to open dataset: {}", dataset_path.display()))?;

    if let Some((first, last)) = dataset.time_coverage() {
        info!(
            variable = dataset.variable(),
            units = ?dataset.units(),
            first = %first,
            last = %last,
            "Dataset time coverage"
        );
    }

    let mut renderer = FrameRenderer::new(&config.frame_options())
        .context("Failed to set up frame renderer")?
        .with_text(TextRenderer::discover(config.font_path.as_deref()));

    if let Some(path) = coastlines_path {
        let coastlines = Coastlines::from_file(&path)
            .with_context(|| format!("Failed to load coastlines: {}", path.display()))?;
        info!(lines = coastlines.len(), vertices = coastlines.vertex_count(), "Coastlines loaded");
        renderer = renderer.with_coastlines(coastlines);
    } else {
        warn!("No coastline source configured; drawing without coastlines");
    }

    let size = renderer.frame_size();
    let video = FfmpegEncoder::open(EncoderSettings::new(
        &config.output,
        &config.codec,
        config.fps,
        size,
    ))?;
    let frames = config
        .frames_dir
        .as_ref()
        .map(|dir| PngSequenceWriter::create(dir, size))
        .transpose()?;
    let sink = TeeSink::new(video, frames)?;

    let pipeline = SpinPipeline::new(&dataset, &renderer, config.cursor()?, config.months());
    pipeline.run(sink)?;

    Ok(())
}
