//! PNG encoding for RGBA frames.
//!
//! Frames with at most 256 distinct colors (the usual case for barbs on a
//! flat background) are written as indexed PNG (color type 3) with a tRNS
//! chunk when needed; anything richer falls back to RGBA (color type 6).

use std::collections::HashMap;
use std::io::Write;

use flate2::write::ZlibEncoder;
use flate2::Compression;

use crate::error::{RenderError, Result};

const SIGNATURE: [u8; 8] = [137, 80, 78, 71, 13, 10, 26, 10];
const MAX_PALETTE_SIZE: usize = 256;

enum Encoding {
    Indexed { palette: Vec<[u8; 4]>, indices: Vec<u8> },
    Rgba,
}

/// Try to map every pixel to a palette slot.
fn palettize(pixels: &[u8]) -> Option<(Vec<[u8; 4]>, Vec<u8>)> {
    let mut slots: HashMap<[u8; 4], u8> = HashMap::with_capacity(MAX_PALETTE_SIZE);
    let mut palette = Vec::with_capacity(MAX_PALETTE_SIZE);
    let mut indices = Vec::with_capacity(pixels.len() / 4);

    for px in pixels.chunks_exact(4) {
        let color = [px[0], px[1], px[2], px[3]];
        let slot = match slots.get(&color) {
            Some(&slot) => slot,
            None => {
                if palette.len() == MAX_PALETTE_SIZE {
                    return None;
                }
                let slot = palette.len() as u8;
                slots.insert(color, slot);
                palette.push(color);
                slot
            }
        };
        indices.push(slot);
    }

    Some((palette, indices))
}

/// Encode straight-alpha RGBA pixels (4 bytes per pixel, row-major).
pub fn encode_png(pixels: &[u8], width: usize, height: usize) -> Result<Vec<u8>> {
    let expected = width * height * 4;
    if pixels.len() != expected {
        return Err(RenderError::BufferSize {
            expected,
            actual: pixels.len(),
        });
    }

    let encoding = match palettize(pixels) {
        Some((palette, indices)) => Encoding::Indexed { palette, indices },
        None => Encoding::Rgba,
    };

    let mut png = Vec::with_capacity(expected / 4 + 1024);
    png.extend_from_slice(&SIGNATURE);

    let color_type = match encoding {
        Encoding::Indexed { .. } => 3,
        Encoding::Rgba => 6,
    };
    let mut ihdr = Vec::with_capacity(13);
    ihdr.extend_from_slice(&(width as u32).to_be_bytes());
    ihdr.extend_from_slice(&(height as u32).to_be_bytes());
    // bit depth, color type, compression, filter, interlace
    ihdr.extend_from_slice(&[8, color_type, 0, 0, 0]);
    write_chunk(&mut png, b"IHDR", &ihdr);

    let idat = match &encoding {
        Encoding::Indexed { palette, indices } => {
            let plte: Vec<u8> = palette.iter().flat_map(|c| [c[0], c[1], c[2]]).collect();
            write_chunk(&mut png, b"PLTE", &plte);

            if palette.iter().any(|c| c[3] < 255) {
                let trns: Vec<u8> = palette.iter().map(|c| c[3]).collect();
                write_chunk(&mut png, b"tRNS", &trns);
            }
            deflate_scanlines(indices, width, height)?
        }
        Encoding::Rgba => deflate_scanlines(pixels, width * 4, height)?,
    };
    write_chunk(&mut png, b"IDAT", &idat);
    write_chunk(&mut png, b"IEND", &[]);

    Ok(png)
}

/// Prefix each row with filter type 0 and zlib-compress.
fn deflate_scanlines(data: &[u8], row_bytes: usize, height: usize) -> Result<Vec<u8>> {
    let mut raw = Vec::with_capacity(height * (row_bytes + 1));
    if row_bytes > 0 {
        for row in data.chunks_exact(row_bytes).take(height) {
            raw.push(0);
            raw.extend_from_slice(row);
        }
    }

    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::fast());
    encoder.write_all(&raw)?;
    Ok(encoder.finish()?)
}

fn write_chunk(png: &mut Vec<u8>, kind: &[u8; 4], data: &[u8]) {
    png.extend_from_slice(&(data.len() as u32).to_be_bytes());
    png.extend_from_slice(kind);
    png.extend_from_slice(data);

    let mut hasher = crc32fast::Hasher::new();
    hasher.update(kind);
    hasher.update(data);
    png.extend_from_slice(&hasher.finalize().to_be_bytes());
}
