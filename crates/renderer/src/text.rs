//! Text drawing for titles and colorbar labels.
//!
//! No font is bundled; one is loaded from a configured path or from the usual
//! system locations. Callers treat a missing font as "draw no text".

use std::path::{Path, PathBuf};

use image::{imageops, Rgb, RgbImage, Rgba, RgbaImage};
use imageproc::drawing::{draw_text_mut, text_size};
use rusttype::{Font, Scale};
use tracing::{debug, warn};

use crate::error::{RenderError, RenderResult};

/// Fonts tried, in order, when no path is configured.
pub const SYSTEM_FONT_PATHS: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu-sans-fonts/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "/Library/Fonts/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

/// A loaded TrueType font.
#[derive(Clone)]
pub struct TextRenderer {
    font: Font<'static>,
    source: Option<PathBuf>,
}

impl std::fmt::Debug for TextRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextRenderer")
            .field("source", &self.source)
            .finish_non_exhaustive()
    }
}

impl TextRenderer {
    pub fn from_bytes(data: Vec<u8>) -> RenderResult<Self> {
        let font = Font::try_from_vec(data)
            .ok_or_else(|| RenderError::Font("not a TrueType/OpenType font".to_string()))?;
        Ok(Self { font, source: None })
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> RenderResult<Self> {
        let path = path.as_ref();
        let data = std::fs::read(path)
            .map_err(|e| RenderError::Font(format!("{}: {}", path.display(), e)))?;
        let mut renderer = Self::from_bytes(data)
            .map_err(|e| RenderError::Font(format!("{}: {}", path.display(), e)))?;
        renderer.source = Some(path.to_path_buf());
        Ok(renderer)
    }

    /// Load `preferred` if given, else the first usable system font.
    ///
    /// Returns None (with a warning) when nothing loads.
    pub fn discover(preferred: Option<&Path>) -> Option<Self> {
        if let Some(path) = preferred {
            match Self::from_file(path) {
                Ok(renderer) => return Some(renderer),
                Err(e) => warn!(error = %e, "Configured font unusable, trying system fonts"),
            }
        }

        let found = SYSTEM_FONT_PATHS
            .iter()
            .map(Path::new)
            .filter(|p| p.exists())
            .find_map(|p| Self::from_file(p).ok());

        match &found {
            Some(renderer) => debug!(font = ?renderer.source, "Loaded font"),
            None => warn!("No usable font found; frames will be rendered without text"),
        }
        found
    }

    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    /// Width and height of `text` in pixels.
    pub fn measure(&self, text: &str, size: f32) -> (i32, i32) {
        text_size(Scale::uniform(size), &self.font, text)
    }

    /// Draw `text` with its top-left corner at (x, y).
    pub fn draw(&self, canvas: &mut RgbImage, text: &str, x: i32, y: i32, size: f32, color: Rgb<u8>) {
        draw_text_mut(canvas, color, x, y, Scale::uniform(size), &self.font, text);
    }

    /// Draw `text` horizontally centered on `cx`.
    pub fn draw_centered(
        &self,
        canvas: &mut RgbImage,
        text: &str,
        cx: i32,
        y: i32,
        size: f32,
        color: Rgb<u8>,
    ) {
        let (w, _) = self.measure(text, size);
        self.draw(canvas, text, cx - w / 2, y, size, color);
    }

    /// Draw `text` rotated a quarter turn counter-clockwise, reading bottom
    /// to top, with its left edge at `x` and vertically centered on `cy`.
    pub fn draw_vertical(
        &self,
        canvas: &mut RgbImage,
        text: &str,
        x: i32,
        cy: i32,
        size: f32,
        color: Rgb<u8>,
    ) {
        let (w, h) = self.measure(text, size);
        if w <= 0 || h <= 0 {
            return;
        }

        let mut label = RgbaImage::new(w as u32 + 2, h as u32 + 2);
        let ink = Rgba([color[0], color[1], color[2], 255]);
        draw_text_mut(&mut label, ink, 1, 1, Scale::uniform(size), &self.font, text);
        let rotated = imageops::rotate270(&label);

        let top = cy - rotated.height() as i32 / 2;
        blend_onto(canvas, &rotated, x, top);
    }
}

/// Alpha-blend an RGBA stamp onto an RGB canvas, clipping at the edges.
fn blend_onto(canvas: &mut RgbImage, stamp: &RgbaImage, left: i32, top: i32) {
    for (sx, sy, pixel) in stamp.enumerate_pixels() {
        let alpha = pixel[3] as f32 / 255.0;
        if alpha <= 0.0 {
            continue;
        }
        let (Ok(x), Ok(y)) = (u32::try_from(left + sx as i32), u32::try_from(top + sy as i32)) else {
            continue;
        };
        if x >= canvas.width() || y >= canvas.height() {
            continue;
        }
        let dst = canvas.get_pixel_mut(x, y);
        for c in 0..3 {
            dst[c] = (dst[c] as f32 * (1.0 - alpha) + pixel[c] as f32 * alpha).round() as u8;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_garbage_bytes_rejected() {
        let err = TextRenderer::from_bytes(vec![0u8; 64]).unwrap_err();
        assert!(matches!(err, RenderError::Font(_)));
    }

    #[test]
    fn test_missing_file_rejected() {
        let err = TextRenderer::from_file("/nonexistent/font.ttf").unwrap_err();
        assert!(err.to_string().contains("/nonexistent/font.ttf"));
    }

    #[test]
    fn test_blend_clips_to_canvas() {
        let mut canvas = RgbImage::from_pixel(4, 4, Rgb([255, 255, 255]));
        let stamp = RgbaImage::from_pixel(3, 3, Rgba([0, 0, 0, 255]));
        blend_onto(&mut canvas, &stamp, 2, -1);

        assert_eq!(canvas.get_pixel(3, 1), &Rgb([0, 0, 0]));
        assert_eq!(canvas.get_pixel(2, 0), &Rgb([0, 0, 0]));
        assert_eq!(canvas.get_pixel(1, 1), &Rgb([255, 255, 255]));
        assert_eq!(canvas.get_pixel(3, 2), &Rgb([255, 255, 255]));
    }
}
