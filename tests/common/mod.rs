//! Shared fixtures for integration tests.

#![allow(dead_code)]

use image::{Rgba, RgbaImage};
use nametag::canvas::{FontSpec, GlyphRasterizer};

/// Deterministic stand-in for a real font.
///
/// Every character is a solid block. Widths differ per character and the
/// measured string width is rounded up to whole pixels, so width is not
/// exactly linear in font size.
pub struct BlockGlyphs;

impl BlockGlyphs {
    fn advance(ch: char, size: f32) -> f32 {
        size * (0.45 + (ch as u32 % 4) as f32 * 0.05)
    }
}

impl GlyphRasterizer for BlockGlyphs {
    fn measure(&self, font: &FontSpec, text: &str) -> Option<f32> {
        Some(
            text.chars()
                .map(|ch| Self::advance(ch, font.size))
                .sum::<f32>()
                .ceil(),
        )
    }

    fn vertical_metrics(&self, font: &FontSpec) -> Option<(f32, f32)> {
        Some((font.size * 0.8, -font.size * 0.2))
    }

    fn rasterize(
        &self,
        font: &FontSpec,
        text: &str,
        x: f32,
        baseline: f32,
        plot: &mut dyn FnMut(i32, i32, f32),
    ) {
        let top = (baseline - font.size * 0.8).round() as i32;
        let bottom = baseline.round() as i32;
        let mut cursor = x;
        for ch in text.chars() {
            let advance = Self::advance(ch, font.size);
            for py in top..bottom {
                for px in cursor.round() as i32..(cursor + advance).round() as i32 {
                    plot(px, py, 1.0);
                }
            }
            cursor += advance;
        }
    }
}

/// A rasterizer with no faces at all.
pub struct NoGlyphs;

impl GlyphRasterizer for NoGlyphs {
    fn measure(&self, _: &FontSpec, _: &str) -> Option<f32> {
        None
    }

    fn vertical_metrics(&self, _: &FontSpec) -> Option<(f32, f32)> {
        None
    }

    fn rasterize(&self, _: &FontSpec, _: &str, _: f32, _: f32, _: &mut dyn FnMut(i32, i32, f32)) {}
}

pub const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);

pub fn blank(width: u32, height: u32) -> RgbaImage {
    RgbaImage::from_pixel(width, height, WHITE)
}
