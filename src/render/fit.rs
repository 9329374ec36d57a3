//! Optimal font size search.
//!
//! Binary search over integer sizes rather than scaling from one
//! measurement: width is close to linear in font size but not exactly
//! (hinting, kerning), and the search guarantees the chosen size never
//! overflows the box.

use tracing::trace;

use super::RenderError;
use crate::canvas::{Canvas, FontSpec, StateGuard};
use crate::style::TextStyle;

/// Smallest size ever chosen; degenerate boxes still get this.
pub const MIN_FONT_SIZE: u32 = 4;

/// Reserved space subtracted from both box dimensions.
pub const FIT_PADDING: f32 = 4.0;

/// The font request for `style` at `size` pixels.
pub fn font_for(style: &TextStyle, size: f32) -> FontSpec {
    FontSpec {
        family: style.font_family.clone(),
        size,
        weight: style.font_weight,
        style: style.font_style,
    }
}

/// Measured width plus `letter_spacing` for each gap between characters.
///
/// A single character has no gaps, so spacing never applies to it.
pub fn effective_width<C: Canvas + ?Sized>(
    canvas: &mut C,
    text: &str,
    letter_spacing: f32,
) -> Result<f32, RenderError> {
    let measured = canvas.measure_text(text)?;
    let gaps = text.chars().count().saturating_sub(1) as f32;
    Ok(measured + letter_spacing * gaps)
}

/// Largest integer size in `[4, max(width, height)]` at which `text` fits a
/// `width × height` box (already scaled), or 4 if none does.
///
/// A size fits when `effective_width ≤ width − 4` and
/// `size × line_height ≤ height − 4`. The canvas font is restored afterwards.
pub fn fit_font_size<C: Canvas + ?Sized>(
    canvas: &mut C,
    text: &str,
    width: f32,
    height: f32,
    style: &TextStyle,
) -> Result<u32, RenderError> {
    let mut canvas = StateGuard::new(canvas);

    let max_width = width - FIT_PADDING;
    let max_height = height - FIT_PADDING;

    let mut low = MIN_FONT_SIZE as i64;
    let mut high = width.max(height).floor() as i64;
    let mut best = MIN_FONT_SIZE;

    while low <= high {
        let mid = low + (high - low) / 2;
        let size = mid as f32;
        canvas.state_mut().font = font_for(style, size);

        let text_width = effective_width(&mut *canvas, text, style.letter_spacing)?;
        let text_height = size * style.line_height;

        if text_width <= max_width && text_height <= max_height {
            best = mid as u32;
            low = mid + 1;
        } else {
            high = mid - 1;
        }
    }

    trace!(size = best, width, height, "fit font size");
    Ok(best)
}
