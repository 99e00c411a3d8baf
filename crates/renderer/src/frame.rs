//! Composition of a complete frame: globe, coastlines, colorbar and title.

use image::{Rgb, RgbImage};
use imageproc::drawing::draw_hollow_ellipse_mut;
use projection::Mollweide;
use spin_common::{LatLonGrid, YearMonth};
use tracing::debug;

use crate::coastline::Coastlines;
use crate::error::{GeometryError, RenderResult};
use crate::gradient::ColorScale;
use crate::layout::FrameLayout;
use crate::legend::{default_ticks, Colorbar};
use crate::raster::{render_globe, CellIndex};
use crate::style::{StyleConfig, StyleDefinition, DEFAULT_STYLE};
use crate::text::TextRenderer;

/// Figure background outside the globe.
pub const BACKGROUND: Rgb<u8> = Rgb([255, 255, 255]);
const INK: Rgb<u8> = Rgb([0, 0, 0]);

/// Size and color-scale settings for a frame.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameOptions {
    /// Figure width in inches
    pub fig_width: f32,
    /// Figure height in inches
    pub fig_height: f32,
    pub dpi: u32,
    pub vmin: f32,
    pub vmax: f32,
    /// Name of a built-in style
    pub style: String,
}

impl Default for FrameOptions {
    fn default() -> Self {
        Self {
            fig_width: 16.0,
            fig_height: 8.0,
            dpi: 100,
            vmin: -3.0,
            vmax: 3.0,
            style: DEFAULT_STYLE.to_string(),
        }
    }
}

/// Title shown above a month's frame, e.g. `2000 - 01`.
pub fn frame_title(period: YearMonth) -> String {
    format!("{} - {:02}", period.year, period.month)
}

/// Renders anomaly grids into fixed-size frames.
#[derive(Debug, Clone)]
pub struct FrameRenderer {
    layout: FrameLayout,
    scale: ColorScale,
    ticks: Vec<f32>,
    label: String,
    coastlines: Option<Coastlines>,
    text: Option<TextRenderer>,
}

impl FrameRenderer {
    /// Renderer using one of the built-in styles.
    pub fn new(options: &FrameOptions) -> RenderResult<Self> {
        let styles = StyleConfig::builtin()?;
        Self::with_style(options, styles.require_style(&options.style)?)
    }

    pub fn with_style(options: &FrameOptions, style: &StyleDefinition) -> RenderResult<Self> {
        let layout = FrameLayout::from_figure(options.fig_width, options.fig_height, options.dpi)?;
        let scale = ColorScale::from_style(style, options.vmin, options.vmax)?;

        let ticks = style
            .legend
            .as_ref()
            .and_then(|l| l.ticks.clone())
            .unwrap_or_else(|| default_ticks(options.vmin, options.vmax));

        Ok(Self {
            layout,
            scale,
            ticks,
            label: style.legend_title().unwrap_or_default().to_string(),
            coastlines: None,
            text: None,
        })
    }

    pub fn with_coastlines(mut self, coastlines: Coastlines) -> Self {
        self.coastlines = Some(coastlines);
        self
    }

    /// Font for the title and colorbar labels; None draws no text.
    pub fn with_text(mut self, text: Option<TextRenderer>) -> Self {
        self.text = text;
        self
    }

    pub fn layout(&self) -> &FrameLayout {
        &self.layout
    }

    pub fn scale(&self) -> &ColorScale {
        &self.scale
    }

    /// (width, height) of every frame this renderer produces.
    pub fn frame_size(&self) -> (u32, u32) {
        (self.layout.width, self.layout.height)
    }

    pub fn has_text(&self) -> bool {
        self.text.is_some()
    }

    /// Render one frame of `grid` centered on `central_longitude`.
    ///
    /// Fails with [`RenderError::Geometry`](crate::RenderError::Geometry) when
    /// the projection or the grid's coordinates cannot be laid out.
    pub fn render(
        &self,
        grid: &LatLonGrid,
        central_longitude: f64,
        title: &str,
    ) -> RenderResult<RgbImage> {
        let projection = Mollweide::new(central_longitude).map_err(GeometryError::from)?;
        let index = CellIndex::new(grid.lats(), grid.lons())?;

        let layout = &self.layout;
        let mut canvas = RgbImage::from_pixel(layout.width, layout.height, BACKGROUND);

        render_globe(&mut canvas, &layout.map, &projection, &index, grid, &self.scale);

        if let Some(coastlines) = &self.coastlines {
            coastlines.draw(&mut canvas, &layout.map, &projection, INK)?;
        }

        let map = layout.map;
        draw_hollow_ellipse_mut(
            &mut canvas,
            (map.cx.round() as i32, map.cy.round() as i32),
            map.rx.round() as i32,
            map.ry.round() as i32,
            INK,
        );

        Colorbar {
            rect: layout.colorbar,
            scale: &self.scale,
            ticks: &self.ticks,
            label: &self.label,
            font_size: layout.tick_size,
        }
        .draw(&mut canvas, self.text.as_ref());

        if let Some(text) = &self.text {
            text.draw_centered(
                &mut canvas,
                title,
                map.cx.round() as i32,
                layout.title_top.round() as i32,
                layout.title_size,
                INK,
            );
        }

        debug!(
            title = title,
            central_longitude = projection.central_longitude(),
            width = layout.width,
            height = layout.height,
            "Rendered frame"
        );

        Ok(canvas)
    }
}
