//! PNG encoding for rendered frames.
//!
//! Frames are written as 8-bit indexed PNGs when they use at most 256
//! distinct colors, which is common for frames without anti-aliased text,
//! and as 24-bit RGB otherwise.

use std::collections::{HashMap, HashSet};
use std::io::Write;

use image::RgbImage;
use rayon::prelude::*;

use crate::error::{RenderError, RenderResult};

const PNG_SIGNATURE: [u8; 8] = [137, 80, 78, 71, 13, 10, 26, 10];
const COLOR_TYPE_RGB: u8 = 2;
const COLOR_TYPE_INDEXED: u8 = 3;

/// Rows handed to each rayon task during palette extraction.
const PALETTE_CHUNK_ROWS: usize = 64;

/// Encode a frame, choosing indexed or RGB output automatically.
pub fn encode_frame(image: &RgbImage) -> RenderResult<Vec<u8>> {
    match extract_palette(image) {
        Some((palette, indices)) => {
            create_png_indexed(&indices, image.width(), image.height(), &palette)
        }
        None => create_png_rgb(image),
    }
}

/// Encode a frame as 24-bit RGB.
pub fn create_png_rgb(image: &RgbImage) -> RenderResult<Vec<u8>> {
    let width = image.width();
    let height = image.height();
    let row_bytes = width as usize * 3;

    let mut png = Vec::new();
    png.extend_from_slice(&PNG_SIGNATURE);
    write_chunk(&mut png, b"IHDR", &ihdr(width, height, COLOR_TYPE_RGB));

    let idat = deflate_scanlines(image.as_raw(), row_bytes, height as usize)?;
    write_chunk(&mut png, b"IDAT", &idat);
    write_chunk(&mut png, b"IEND", &[]);

    Ok(png)
}

/// Encode palette indices as an 8-bit indexed PNG.
pub fn create_png_indexed(
    indices: &[u8],
    width: u32,
    height: u32,
    palette: &[[u8; 3]],
) -> RenderResult<Vec<u8>> {
    if palette.is_empty() || palette.len() > 256 {
        return Err(RenderError::Png(format!(
            "palette must hold 1-256 colors, got {}",
            palette.len()
        )));
    }
    if indices.len() != width as usize * height as usize {
        return Err(RenderError::Png(format!(
            "expected {} indices for {}x{}, got {}",
            width as usize * height as usize,
            width,
            height,
            indices.len()
        )));
    }

    let mut png = Vec::new();
    png.extend_from_slice(&PNG_SIGNATURE);
    write_chunk(&mut png, b"IHDR", &ihdr(width, height, COLOR_TYPE_INDEXED));

    let plte: Vec<u8> = palette.iter().flatten().copied().collect();
    write_chunk(&mut png, b"PLTE", &plte);

    let idat = deflate_scanlines(indices, width as usize, height as usize)?;
    write_chunk(&mut png, b"IDAT", &idat);
    write_chunk(&mut png, b"IEND", &[]);

    Ok(png)
}

/// Collect the distinct colors of an image and map each pixel to its index.
///
/// Returns None if the image has more than 256 colors. Rows are scanned in
/// parallel chunks and merged in order, so palette order follows first
/// appearance in the image.
pub fn extract_palette(image: &RgbImage) -> Option<(Vec<[u8; 3]>, Vec<u8>)> {
    let row_bytes = image.width() as usize * 3;
    if row_bytes == 0 {
        return Some((vec![[0, 0, 0]], Vec::new()));
    }

    let chunk_bytes = row_bytes * PALETTE_CHUNK_ROWS;
    let chunk_colors: Vec<Vec<[u8; 3]>> = image
        .as_raw()
        .par_chunks(chunk_bytes)
        .map(|chunk| {
            let mut seen: Vec<[u8; 3]> = Vec::new();
            let mut set: HashSet<[u8; 3]> = HashSet::new();
            for px in chunk.chunks_exact(3) {
                let color = [px[0], px[1], px[2]];
                // One past 256 is enough to fail the merge below
                if set.insert(color) {
                    seen.push(color);
                    if seen.len() > 256 {
                        break;
                    }
                }
            }
            seen
        })
        .collect();

    let mut palette: Vec<[u8; 3]> = Vec::new();
    let mut lookup: HashMap<[u8; 3], u8> = HashMap::new();
    for color in chunk_colors.into_iter().flatten() {
        if lookup.contains_key(&color) {
            continue;
        }
        if palette.len() == 256 {
            return None;
        }
        lookup.insert(color, palette.len() as u8);
        palette.push(color);
    }

    let indices = image
        .as_raw()
        .par_chunks_exact(3)
        .map(|px| lookup.get(&[px[0], px[1], px[2]]).copied().unwrap_or(0))
        .collect();

    Some((palette, indices))
}

fn ihdr(width: u32, height: u32, color_type: u8) -> Vec<u8> {
    let mut data = Vec::with_capacity(13);
    data.extend_from_slice(&width.to_be_bytes());
    data.extend_from_slice(&height.to_be_bytes());
    data.push(8); // bit depth
    data.push(color_type);
    data.push(0); // compression method
    data.push(0); // filter method
    data.push(0); // interlace method
    data
}

fn write_chunk(png: &mut Vec<u8>, chunk_type: &[u8; 4], data: &[u8]) {
    png.extend_from_slice(&(data.len() as u32).to_be_bytes());
    png.extend_from_slice(chunk_type);
    png.extend_from_slice(data);

    let mut hasher = crc32fast::Hasher::new();
    hasher.update(chunk_type);
    hasher.update(data);
    png.extend_from_slice(&hasher.finalize().to_be_bytes());
}

/// Prefix each scanline with filter type 0 and zlib-compress.
fn deflate_scanlines(data: &[u8], row_bytes: usize, height: usize) -> RenderResult<Vec<u8>> {
    let mut uncompressed = Vec::with_capacity(height * (1 + row_bytes));
    for row in data.chunks(row_bytes.max(1)).take(height) {
        uncompressed.push(0);
        uncompressed.extend_from_slice(row);
    }

    let mut encoder = flate2::write::ZlibEncoder::new(Vec::new(), flate2::Compression::fast());
    encoder
        .write_all(&uncompressed)
        .map_err(|e| RenderError::Png(format!("IDAT compression failed: {}", e)))?;
    encoder
        .finish()
        .map_err(|e| RenderError::Png(format!("IDAT compression failed: {}", e)))
}
