//! The month-by-month render loop.
//!
//! For each month in order: average the month's records, take the next
//! central longitude, render, append. A frame that fails with a geometry
//! error is logged and skipped; every other failure ends the run.

use anyhow::{Context, Result};
use image::RgbImage;
use netcdf_parser::AnomalyDataset;
use projection::LongitudeCursor;
use renderer::{frame_title, FrameRenderer, RenderError};
use spin_common::{MonthRange, YearMonth};
use tracing::{debug, info, warn};

use crate::encoder::{FrameSink, SinkSummary};

/// Outcome of a completed run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub months: usize,
    pub frames_written: usize,
    pub skipped: Vec<YearMonth>,
    /// Longitude the next frame would have used
    pub next_longitude: i32,
    pub sink: SinkSummary,
}

/// Drives rendering of one month range into a sink.
pub struct SpinPipeline<'a> {
    dataset: &'a AnomalyDataset,
    renderer: &'a FrameRenderer,
    cursor: LongitudeCursor,
    months: MonthRange,
}

impl<'a> SpinPipeline<'a> {
    pub fn new(
        dataset: &'a AnomalyDataset,
        renderer: &'a FrameRenderer,
        cursor: LongitudeCursor,
        months: MonthRange,
    ) -> Self {
        Self {
            dataset,
            renderer,
            cursor,
            months,
        }
    }

    /// Render one month. Returns None when the frame was skipped.
    ///
    /// The cursor advances even for skipped frames.
    pub fn render_month(&mut self, period: YearMonth) -> Result<Option<RgbImage>> {
        let grid = self
            .dataset
            .monthly_mean(period)
            .with_context(|| format!("Failed to select data for {}", period))?;
        let longitude = self.cursor.next();

        match self
            .renderer
            .render(&grid, longitude as f64, &frame_title(period))
        {
            Ok(frame) => {
                debug!(period = %period, longitude = longitude, "Frame rendered");
                Ok(Some(frame))
            }
            Err(RenderError::Geometry(e)) => {
                warn!(
                    period = %period,
                    longitude = longitude,
                    "Skipping frame for {} due to geometry error: {}",
                    period,
                    e
                );
                Ok(None)
            }
            Err(e) => Err(e).with_context(|| format!("Failed to render frame for {}", period)),
        }
    }

    /// Render every month into `sink` and finalize it.
    ///
    /// On error the sink is dropped unfinalized.
    pub fn run<S: FrameSink>(mut self, mut sink: S) -> Result<RunSummary> {
        let renderer_size = self.renderer.frame_size();
        if renderer_size != sink.frame_size() {
            anyhow::bail!(
                "Renderer produces {}x{} frames but the sink expects {}x{}",
                renderer_size.0,
                renderer_size.1,
                sink.frame_size().0,
                sink.frame_size().1
            );
        }

        let months = self.months;
        let mut frames_written = 0;
        let mut skipped = Vec::new();

        info!(
            start = %months.start,
            end = %months.end,
            months = months.len(),
            first_longitude = self.cursor.peek(),
            "Rendering frames"
        );

        for period in months.iter() {
            if let Some(frame) = self.render_month(period)? {
                sink.append(&frame)
                    .with_context(|| format!("Failed to write frame for {}", period))?;
                frames_written += 1;
            } else {
                skipped.push(period);
            }

            if period.month == 12 || period == months.end {
                info!(year = period.year, "Year {} finished.", period.year);
            }
        }

        let sink_summary = sink.finalize().context("Failed to finalize output")?;

        let summary = RunSummary {
            months: months.len(),
            frames_written,
            skipped,
            next_longitude: self.cursor.peek(),
            sink: sink_summary,
        };

        info!(
            frames = summary.frames_written,
            skipped = summary.skipped.len(),
            outputs = ?summary.sink.outputs,
            "Finished creating video!"
        );

        Ok(summary)
    }
}
