//! Vertical colorbar with ticks and a rotated label.

use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_hollow_rect_mut, draw_line_segment_mut};
use imageproc::rect::Rect;

use crate::gradient::ColorScale;
use crate::layout::BarRect;
use crate::text::TextRenderer;

const TICK_LENGTH: f32 = 4.0;
const NICE_STEPS: [f32; 5] = [1.0, 2.0, 2.5, 5.0, 10.0];

/// Evenly spaced round tick values covering `[vmin, vmax]`, at most 9 of them.
pub fn default_ticks(vmin: f32, vmax: f32) -> Vec<f32> {
    let span = vmax - vmin;
    if !span.is_finite() || span <= 0.0 {
        return Vec::new();
    }

    let raw = span / 8.0;
    let magnitude = 10f32.powi(raw.log10().floor() as i32);
    let step = NICE_STEPS
        .iter()
        .map(|s| s * magnitude)
        .find(|&s| s >= raw)
        .unwrap_or(10.0 * magnitude);

    let first = (vmin / step).ceil() as i64;
    let last = (vmax / step + 1e-4).floor() as i64;
    (first..=last).map(|k| k as f32 * step).collect()
}

/// Tick label text: integers without a decimal point.
pub fn format_tick(value: f32) -> String {
    if (value - value.round()).abs() < 1e-4 {
        format!("{}", value.round() as i64)
    } else {
        format!("{}", value)
    }
}

/// Everything drawn next to the map besides the map itself.
#[derive(Debug, Clone)]
pub struct Colorbar<'a> {
    pub rect: BarRect,
    pub scale: &'a ColorScale,
    pub ticks: &'a [f32],
    pub label: &'a str,
    pub font_size: f32,
}

impl Colorbar<'_> {
    /// Vertical pixel offset (from the bar top) of a data value.
    fn offset_of(&self, value: f32) -> f32 {
        let t = (value - self.scale.vmin()) / (self.scale.vmax() - self.scale.vmin());
        (1.0 - t.clamp(0.0, 1.0)) * (self.rect.height as f32 - 1.0)
    }

    /// Draw the bar, its outline and tick marks; labels only when a font is
    /// available.
    pub fn draw(&self, canvas: &mut RgbImage, text: Option<&TextRenderer>) {
        let black = Rgb([0, 0, 0]);
        let rect = self.rect;
        let height = rect.height.max(1);

        for i in 0..height {
            let t = 1.0 - (i as f32 + 0.5) / height as f32;
            let color = self.scale.color_at_fraction(t).to_rgb();
            draw_filled_rect_mut(
                canvas,
                Rect::at(rect.left, rect.top + i as i32).of_size(rect.width.max(1), 1),
                color,
            );
        }
        draw_hollow_rect_mut(
            canvas,
            Rect::at(rect.left, rect.top).of_size(rect.width.max(1), height),
            black,
        );

        let right = rect.right() as f32;
        let mut label_extent = 0;
        for &tick in self.ticks {
            let y = rect.top as f32 + self.offset_of(tick);
            draw_line_segment_mut(canvas, (right, y), (right + TICK_LENGTH, y), black);

            if let Some(text) = text {
                let label = format_tick(tick);
                let (w, h) = text.measure(&label, self.font_size);
                let x = (right + TICK_LENGTH + 3.0) as i32;
                text.draw(canvas, &label, x, y as i32 - h / 2, self.font_size, black);
                label_extent = label_extent.max(w);
            }
        }

        if let Some(text) = text {
            let x = rect.right() + TICK_LENGTH as i32 + 3 + label_extent + (self.font_size * 0.6) as i32;
            let cy = rect.top + rect.height as i32 / 2;
            text.draw_vertical(canvas, self.label, x, cy, self.font_size, black);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_ticks_anomaly_range() {
        assert_eq!(
            default_ticks(-3.0, 3.0),
            vec![-3.0, -2.0, -1.0, 0.0, 1.0, 2.0, 3.0]
        );
    }

    #[test]
    fn test_default_ticks_other_ranges() {
        assert_eq!(default_ticks(-1.0, 1.0), vec![-1.0, -0.75, -0.5, -0.25, 0.0, 0.25, 0.5, 0.75, 1.0]);
        assert_eq!(default_ticks(0.0, 40.0), vec![0.0, 5.0, 10.0, 15.0, 20.0, 25.0, 30.0, 35.0, 40.0]);
        assert!(default_ticks(1.0, 1.0).is_empty());
    }

    #[test]
    fn test_format_tick() {
        assert_eq!(format_tick(-3.0), "-3");
        assert_eq!(format_tick(-0.0), "0");
        assert_eq!(format_tick(2.5), "2.5");
        assert_eq!(format_tick(-0.75), "-0.75");
    }

    #[test]
    fn test_bar_gradient_runs_bottom_to_top() {
        let scale = ColorScale::seismic(-3.0, 3.0).unwrap();
        let ticks = default_ticks(-3.0, 3.0);
        let bar = Colorbar {
            rect: BarRect {
                left: 10,
                top: 10,
                width: 8,
                height: 100,
            },
            scale: &scale,
            ticks: &ticks,
            label: "Anomaly (°C)",
            font_size: 12.0,
        };
        let mut canvas = RgbImage::from_pixel(60, 130, Rgb([255, 255, 255]));
        bar.draw(&mut canvas, None);

        let top = canvas.get_pixel(14, 12);
        let bottom = canvas.get_pixel(14, 107);
        assert!(top[0] > 100 && top[2] < 10, "top should be red, got {:?}", top);
        assert!(bottom[2] > 60 && bottom[0] < 10, "bottom should be blue, got {:?}", bottom);

        // Outline and tick marks
        assert_eq!(canvas.get_pixel(10, 50), &Rgb([0, 0, 0]));
        assert_eq!(canvas.get_pixel(20, 10), &Rgb([0, 0, 0]));
    }
}
