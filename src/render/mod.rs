//! # Fit-and-Paint Engine
//!
//! Paints one string into one rectangle: picks the largest font size that
//! fits, then draws the text centered, with letter spacing, decoration,
//! shadow and opacity.
//!
//! ## Pipeline
//!
//! ```text
//! text ─▶ transform ─▶ fit_font_size ─▶ graphics state ─▶ fill ─▶ decoration
//!          (case)       (binary search)   (font, color,     (whole string or
//!                                          alpha, shadow)    glyph by glyph)
//! ```
//!
//! The rectangle is given in image pixels together with independent
//! `scale_x`/`scale_y` factors, so an interactive preview at reduced scale
//! and the full-resolution batch output (both scales 1) share this code.
//!
//! ## Example
//!
//! ```no_run
//! use image::{Rgba, RgbaImage};
//! use nametag::canvas::RasterCanvas;
//! use nametag::document::Rect;
//! use nametag::fonts::FontRegistry;
//! use nametag::render;
//! use nametag::style::TextStyle;
//!
//! let fonts = FontRegistry::new();
//! fonts.load_system_fonts(&[]);
//!
//! let image = RgbaImage::from_pixel(800, 200, Rgba([255, 255, 255, 255]));
//! let mut canvas = RasterCanvas::new(image, &fonts);
//! let area = Rect::new(50.0, 50.0, 700.0, 100.0);
//! render::render(&mut canvas, "Ada Lovelace", &area, &TextStyle::default(), 1.0, 1.0)?;
//! # Ok::<(), nametag::render::RenderError>(())
//! ```

pub mod fit;

use thiserror::Error;
use tracing::debug;

use crate::canvas::{Canvas, StateGuard, TextAlign, TextBaseline};
use crate::document::Rect;
use crate::style::{TextStyle, color};

pub use fit::{FIT_PADDING, MIN_FONT_SIZE, effective_width, fit_font_size, font_for};

/// The engine's only failure: it will not paint with guessed metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RenderError {
    #[error("Text measurement unavailable: no font face could be resolved")]
    MeasurementUnavailable,
}

/// Character positions for letter-spaced painting.
#[derive(Debug, Clone, PartialEq)]
pub struct SpacedLayout {
    /// Each character with the x of its center and its measured width.
    pub glyphs: Vec<(char, f32, f32)>,
    /// `Σ widths + spacing × (n − 1)`.
    pub total_width: f32,
}

/// Lay out `text` character by character around `center_x`.
///
/// The cursor starts at `center_x − total/2`; each character is centered at
/// `cursor + width/2`, then the cursor advances by `width + spacing`.
pub fn spaced_layout<C: Canvas + ?Sized>(
    canvas: &mut C,
    text: &str,
    letter_spacing: f32,
    center_x: f32,
) -> Result<SpacedLayout, RenderError> {
    let mut buf = [0u8; 4];
    let mut widths = Vec::new();
    for ch in text.chars() {
        widths.push((ch, canvas.measure_text(ch.encode_utf8(&mut buf))?));
    }

    let gaps = widths.len().saturating_sub(1) as f32;
    let total_width = widths.iter().map(|(_, w)| w).sum::<f32>() + letter_spacing * gaps;

    // Glyphs are filled center-aligned, so each sits at the middle of its cell
    let mut cursor = center_x - total_width / 2.0;
    let glyphs = widths
        .into_iter()
        .map(|(ch, width)| {
            let placed = (ch, cursor + width / 2.0, width);
            cursor += width + letter_spacing;
            placed
        })
        .collect();

    Ok(SpacedLayout {
        glyphs,
        total_width,
    })
}

/// Paint `text` into `area` scaled by `(scale_x, scale_y)`.
///
/// Never fails for well-formed input except when the canvas cannot measure
/// text at all. An empty string paints nothing. The canvas state is
/// restored on every exit path.
pub fn render<C: Canvas + ?Sized>(
    canvas: &mut C,
    text: &str,
    area: &Rect,
    style: &TextStyle,
    scale_x: f32,
    scale_y: f32,
) -> Result<(), RenderError> {
    let text = style.text_transform.apply(text);
    let rect = area.scaled(scale_x, scale_y);

    let mut canvas = StateGuard::new(canvas);
    if text.is_empty() {
        return Ok(());
    }

    let size = fit_font_size(&mut *canvas, &text, rect.width, rect.height, style)? as f32;
    apply_style(&mut *canvas, style, size);

    let (center_x, center_y) = rect.center();
    if style.letter_spacing == 0.0 {
        canvas.fill_text(&text, center_x, center_y);
    } else {
        let layout = spaced_layout(&mut *canvas, &text, style.letter_spacing, center_x)?;
        let mut buf = [0u8; 4];
        for (ch, x, _) in layout.glyphs {
            canvas.fill_text(ch.encode_utf8(&mut buf), x, center_y);
        }
    }

    if let Some(offset) = style.text_decoration.offset(size) {
        let width = effective_width(&mut *canvas, &text, style.letter_spacing)?;
        canvas.state_mut().line_width = (size / 15.0).max(1.0);
        let y = center_y + offset;
        canvas.stroke_line(
            (center_x - width / 2.0, y),
            (center_x + width / 2.0, y),
        );
    }

    Ok(())
}

/// Graphics state for painting `style` at `size`.
///
/// Unparseable colors leave the previous color in place; a malformed shadow
/// simply means no shadow.
fn apply_style<C: Canvas + ?Sized>(canvas: &mut C, style: &TextStyle, size: f32) {
    let state = canvas.state_mut();
    state.global_alpha = style.opacity.clamp(0.0, 1.0);
    state.font = font_for(style, size);
    if let Some(fill) = color::parse(&style.color) {
        state.fill = fill;
        state.stroke = fill;
    }
    state.text_align = TextAlign::Center;
    state.text_baseline = TextBaseline::Middle;

    match style.shadow() {
        Some(shadow) => {
            state.shadow.offset_x = shadow.offset_x as f32;
            state.shadow.offset_y = shadow.offset_y as f32;
            state.shadow.blur = shadow.blur as f32;
            if let Some(shadow_color) = color::parse(&shadow.color) {
                state.shadow.color = shadow_color;
            }
        }
        None if style.text_shadow.trim() != "none" => {
            debug!(shadow = %style.text_shadow, "ignoring malformed text shadow");
        }
        None => {}
    }
}
