// src/charts/mod.rs
//! Static PNG charts for the report: brand-vs-others pie and per-channel sentiment bars.
//! Every render owns its canvas; the pixel buffer is dropped once the PNG is encoded.

mod bar;
mod font;
mod pie;

pub use bar::{render_bar, BarDatum};
pub use pie::render_pie;

use std::io::Cursor;

use base64::engine::general_purpose::STANDARD as base64_engine;
use base64::Engine;
use image::{ImageFormat, Rgba, RgbaImage};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChartError {
    #[error("failed to encode chart: {0}")]
    Encode(#[from] image::ImageError),
}

pub(crate) const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);
pub(crate) const INK: Rgba<u8> = Rgba([33, 33, 33, 255]);
pub(crate) const GRID: Rgba<u8> = Rgba([210, 210, 210, 255]);
pub(crate) const BLUE: Rgba<u8> = Rgba([31, 119, 180, 255]);
pub(crate) const ORANGE: Rgba<u8> = Rgba([255, 127, 14, 255]);
pub(crate) const SKYBLUE: Rgba<u8> = Rgba([135, 206, 235, 255]);

/// Encoded PNG bytes of one chart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Png(pub Vec<u8>);

impl Png {
    pub fn to_base64(&self) -> String {
        base64_engine.encode(&self.0)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

/// Consumes the canvas so nothing outlives the encode.
pub(crate) fn encode_png(img: RgbaImage) -> Result<Png, ChartError> {
    let mut buffer = Vec::new();
    let mut cursor = Cursor::new(&mut buffer);
    img.write_to(&mut cursor, ImageFormat::Png)?;
    Ok(Png(buffer))
}

pub(crate) fn fill_rect(img: &mut RgbaImage, x0: i64, y0: i64, x1: i64, y1: i64, color: Rgba<u8>) {
    let (xa, xb) = (x0.min(x1), x0.max(x1));
    let (ya, yb) = (y0.min(y1), y0.max(y1));
    for y in ya..yb {
        for x in xa..xb {
            font::put_clipped(img, x, y, color);
        }
    }
}

pub(crate) fn hline(img: &mut RgbaImage, x0: i64, x1: i64, y: i64, color: Rgba<u8>) {
    fill_rect(img, x0, y, x1, y + 1, color);
}

pub(crate) fn vline(img: &mut RgbaImage, x: i64, y0: i64, y1: i64, color: Rgba<u8>) {
    fill_rect(img, x, y0, x + 1, y1, color);
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_MAGIC: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

    #[test]
    fn encodes_a_png_and_base64() {
        let png = encode_png(RgbaImage::from_pixel(3, 2, WHITE)).unwrap();
        assert_eq!(&png.as_bytes()[..8], &PNG_MAGIC);
        assert!(png.to_base64().starts_with("iVBORw0KGgo"));
    }

    #[test]
    fn rects_are_normalised_and_clipped() {
        let mut img = RgbaImage::from_pixel(10, 10, WHITE);
        fill_rect(&mut img, 8, 8, 2, 2, INK);
        assert_eq!(*img.get_pixel(5, 5), INK);
        assert_eq!(*img.get_pixel(8, 8), WHITE);
        fill_rect(&mut img, -5, -5, 50, 1, INK);
        assert_eq!(*img.get_pixel(9, 0), INK);
    }
}
