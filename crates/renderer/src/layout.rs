//! Placement of the globe, colorbar and title inside a frame.
//!
//! Proportions follow a default plotting figure: a central axes box with
//! the colorbar stealing a strip on its right, and the 2:1 map ellipse
//! fitted into what is left.

use projection::Mollweide;

use crate::error::{RenderError, RenderResult};

const AXES_LEFT: f64 = 0.125;
const AXES_RIGHT: f64 = 0.85;
const AXES_TOP: f64 = 0.12;
const AXES_BOTTOM: f64 = 0.89;
const COLORBAR_WIDTH: f64 = 0.0125;
const COLORBAR_GAP: f64 = 0.03;

/// Title size in points.
const TITLE_POINTS: f32 = 14.4;
/// Tick label size in points.
const TICK_POINTS: f32 = 10.0;

/// Pixel placement of the map ellipse.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapEllipse {
    pub cx: f64,
    pub cy: f64,
    pub rx: f64,
    pub ry: f64,
}

impl MapEllipse {
    /// Pixel position to projected map coordinates.
    pub fn to_map(&self, px: f64, py: f64, projection: &Mollweide) -> (f64, f64) {
        (
            (px - self.cx) / self.rx * projection.x_extent(),
            (self.cy - py) / self.ry * projection.y_extent(),
        )
    }

    /// Projected map coordinates to a pixel position.
    pub fn to_pixel(&self, x: f64, y: f64, projection: &Mollweide) -> (f32, f32) {
        (
            (self.cx + x / projection.x_extent() * self.rx) as f32,
            (self.cy - y / projection.y_extent() * self.ry) as f32,
        )
    }

    /// Pixel rows touched by the ellipse, clipped to `height`.
    pub fn rows(&self, height: u32) -> std::ops::Range<u32> {
        let top = (self.cy - self.ry).floor().max(0.0) as u32;
        let bottom = ((self.cy + self.ry).ceil().max(0.0) as u32).min(height);
        top.min(bottom)..bottom
    }

    pub fn top(&self) -> f64 {
        self.cy - self.ry
    }
}

/// An axis-aligned pixel rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BarRect {
    pub left: i32,
    pub top: i32,
    pub width: u32,
    pub height: u32,
}

impl BarRect {
    pub fn right(&self) -> i32 {
        self.left + self.width as i32
    }

    pub fn bottom(&self) -> i32 {
        self.top + self.height as i32
    }
}

/// Pixel size of a `fig_width x fig_height` inch figure at `dpi`, truncated.
pub fn figure_pixels(fig_width: f32, fig_height: f32, dpi: u32) -> (u32, u32) {
    let px = |inches: f32| (inches.max(0.0) * dpi as f32) as u32;
    (px(fig_width), px(fig_height))
}

/// Everything a frame needs to know about where things go.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameLayout {
    pub width: u32,
    pub height: u32,
    pub map: MapEllipse,
    pub colorbar: BarRect,
    /// Baseline-free top edge of the title text
    pub title_top: f32,
    pub title_size: f32,
    pub tick_size: f32,
}

impl FrameLayout {
    /// Layout for a figure of `fig_width x fig_height` inches at `dpi`.
    pub fn from_figure(fig_width: f32, fig_height: f32, dpi: u32) -> RenderResult<Self> {
        if !(fig_width > 0.0 && fig_height > 0.0) || dpi == 0 {
            return Err(RenderError::Layout(format!(
                "figure {}x{} in at {} dpi has no area",
                fig_width, fig_height, dpi
            )));
        }
        let (width, height) = figure_pixels(fig_width, fig_height, dpi);
        Self::new(width, height, dpi)
    }

    /// Layout for a `width x height` pixel frame; `dpi` scales text.
    pub fn new(width: u32, height: u32, dpi: u32) -> RenderResult<Self> {
        if width < 16 || height < 8 {
            return Err(RenderError::Layout(format!(
                "frame {}x{} is too small",
                width, height
            )));
        }

        let w = width as f64;
        let h = height as f64;

        let bar_right = AXES_RIGHT * w;
        let bar_width = (COLORBAR_WIDTH * w).max(2.0);
        let bar_left = bar_right - bar_width;

        let map_left = AXES_LEFT * w;
        let map_right = bar_left - COLORBAR_GAP * w;
        let map_top = AXES_TOP * h;
        let map_bottom = AXES_BOTTOM * h;

        // Fit a 2:1 ellipse into the map box
        let box_width = map_right - map_left;
        let box_height = map_bottom - map_top;
        let rx = (box_width / 2.0).min(box_height);
        let ry = rx / 2.0;
        if rx < 2.0 {
            return Err(RenderError::Layout(format!(
                "frame {}x{} leaves no room for the map",
                width, height
            )));
        }

        let map = MapEllipse {
            cx: map_left + box_width / 2.0,
            cy: map_top + box_height / 2.0,
            rx,
            ry,
        };

        let colorbar = BarRect {
            left: bar_left.round() as i32,
            top: map.top().round() as i32,
            width: bar_width.round() as u32,
            height: (2.0 * ry).round().max(1.0) as u32,
        };

        let px_per_point = dpi as f32 / 72.0;
        let title_size = TITLE_POINTS * px_per_point;

        Ok(Self {
            width,
            height,
            map,
            colorbar,
            title_top: (map.top() as f32 - 1.6 * title_size).max(0.0),
            title_size,
            tick_size: TICK_POINTS * px_per_point,
        })
    }
}
