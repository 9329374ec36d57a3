//! Canvas implementation over an in-memory RGBA image.

use image::RgbaImage;

use super::mask::CoverageMask;
use super::{Canvas, GlyphRasterizer, StateStack, TextAlign, TextBaseline};
use crate::render::RenderError;

/// A [`Canvas`] that paints into an owned `RgbaImage`.
///
/// Glyph measurement and coverage come from the injected [`GlyphRasterizer`],
/// normally the session's [`FontRegistry`](crate::fonts::FontRegistry).
pub struct RasterCanvas<'g, G: GlyphRasterizer + ?Sized> {
    image: RgbaImage,
    glyphs: &'g G,
    stack: StateStack,
}

impl<'g, G: GlyphRasterizer + ?Sized> RasterCanvas<'g, G> {
    pub fn new(image: RgbaImage, glyphs: &'g G) -> Self {
        Self {
            image,
            glyphs,
            stack: StateStack::default(),
        }
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn into_image(self) -> RgbaImage {
        self.image
    }

    /// Paint a coverage mask: shadow first (if any), then the mask itself.
    fn paint_mask(&mut self, mask: &CoverageMask, color: image::Rgba<u8>) {
        if mask.is_empty() {
            return;
        }
        let state = self.state();
        let alpha = state.global_alpha;
        let shadow = state.shadow;

        if shadow.is_visible() {
            let (dx, dy) = (shadow.offset_x.round() as i32, shadow.offset_y.round() as i32);
            let (width, height) = (self.image.width() as i32, self.image.height() as i32);
            // Only the part that lands on the image after the offset is kept
            let clip = (
                0i32.saturating_sub(dx),
                0i32.saturating_sub(dy),
                width.saturating_sub(dx),
                height.saturating_sub(dy),
            );
            let sigma = (shadow.blur / 2.0).min((width as f32).hypot(height as f32));
            let blurred = mask.blurred(sigma, clip);
            blurred.composite(&mut self.image, shadow.color, alpha, dx, dy);
        }
        mask.composite(&mut self.image, color, alpha, 0, 0);
    }
}

impl<G: GlyphRasterizer + ?Sized> Canvas for RasterCanvas<'_, G> {
    fn state_stack(&self) -> &StateStack {
        &self.stack
    }

    fn state_stack_mut(&mut self) -> &mut StateStack {
        &mut self.stack
    }

    fn measure_text(&mut self, text: &str) -> Result<f32, RenderError> {
        self.glyphs
            .measure(&self.state().font, text)
            .ok_or(RenderError::MeasurementUnavailable)
    }

    fn fill_text(&mut self, text: &str, x: f32, y: f32) {
        if text.is_empty() {
            return;
        }
        let state = self.state();
        let font = state.font.clone();
        let (align, baseline_mode, fill) = (state.text_align, state.text_baseline, state.fill);

        let (Some(width), Some((ascent, descent))) = (
            self.glyphs.measure(&font, text),
            self.glyphs.vertical_metrics(&font),
        ) else {
            return;
        };

        let start_x = match align {
            TextAlign::Left => x,
            TextAlign::Center => x - width / 2.0,
            TextAlign::Right => x - width,
        };
        let baseline = match baseline_mode {
            TextBaseline::Alphabetic => y,
            TextBaseline::Middle => y + (ascent + descent) / 2.0,
        };

        // Room for overhanging glyphs (accents, italics, swashes)
        let pad = font.size * 0.5 + 2.0;
        let mut mask = CoverageMask::new(
            (start_x - pad).floor() as i32,
            (baseline - ascent - pad).floor() as i32,
            (start_x + width + pad).ceil() as i32,
            (baseline - descent + pad).ceil() as i32,
        );
        self.glyphs
            .rasterize(&font, text, start_x, baseline, &mut |px, py, coverage| {
                mask.add(px, py, coverage)
            });

        self.paint_mask(&mask, fill);
    }

    fn stroke_line(&mut self, from: (f32, f32), to: (f32, f32)) {
        let state = self.state();
        let half = state.line_width.max(0.0) / 2.0;
        let stroke = state.stroke;

        let (dx, dy) = (to.0 - from.0, to.1 - from.1);
        let length = (dx * dx + dy * dy).sqrt();
        if length <= 0.0 || half <= 0.0 {
            return;
        }

        let mut mask = CoverageMask::new(
            (from.0.min(to.0) - half - 1.0).floor() as i32,
            (from.1.min(to.1) - half - 1.0).floor() as i32,
            (from.0.max(to.0) + half + 1.0).ceil() as i32,
            (from.1.max(to.1) + half + 1.0).ceil() as i32,
        );

        if dy == 0.0 {
            let (left, right) = (from.0.min(to.0), from.0.max(to.0));
            mask.fill_rect(left, from.1 - half, right, from.1 + half);
        } else if dx == 0.0 {
            let (top, bottom) = (from.1.min(to.1), from.1.max(to.1));
            mask.fill_rect(from.0 - half, top, from.0 + half, bottom);
        } else {
            // Distance-to-segment coverage with butt caps
            let (ux, uy) = (dx / length, dy / length);
            let (x0, y0) = mask.origin();
            for ly in 0..mask.height() as i32 {
                for lx in 0..mask.width() as i32 {
                    let (px, py) = ((x0 + lx) as f32 + 0.5, (y0 + ly) as f32 + 0.5);
                    let (rx, ry) = (px - from.0, py - from.1);
                    let along = rx * ux + ry * uy;
                    let across = (rx * uy - ry * ux).abs();
                    let cover_across = (half + 0.5 - across).clamp(0.0, 1.0);
                    let cover_along = (along.min(length - along) + 0.5).clamp(0.0, 1.0);
                    mask.add(x0 + lx, y0 + ly, cover_across * cover_along);
                }
            }
        }

        self.paint_mask(&mask, stroke);
    }
}
