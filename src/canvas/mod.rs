//! # Canvas Abstraction
//!
//! A small immediate-mode drawing surface modelled on the 2D canvas API:
//! a graphics state (font, colors, alpha, alignment, shadow), a save/restore
//! stack, text measurement, text fill and line stroke.
//!
//! ## Architecture
//!
//! ```text
//! render::render ──▶ Canvas (trait)
//!                      ├── RasterCanvas ──▶ RgbaImage
//!                      │        └── GlyphRasterizer (trait) ──▶ FontRegistry
//!                      └── test doubles (recording canvases)
//! ```
//!
//! State changes are scoped with [`StateGuard`]: it saves on creation and
//! restores on drop, so every exit path of a paint routine leaves the
//! canvas as it found it.

pub mod mask;
pub mod raster;

use image::Rgba;
use std::fmt;
use std::ops::{Deref, DerefMut};

use crate::render::RenderError;
use crate::style::{FontStyle, FontWeight};

pub use raster::RasterCanvas;

/// Generic family the availability check compares against.
pub const GENERIC_FALLBACK: &str = "monospace";

/// A resolved CSS-style font request.
#[derive(Debug, Clone, PartialEq)]
pub struct FontSpec {
    /// Family name or comma separated stack (`"Foo", Bar, monospace`).
    pub family: String,
    /// Em size in pixels.
    pub size: f32,
    pub weight: FontWeight,
    pub style: FontStyle,
}

impl Default for FontSpec {
    fn default() -> Self {
        Self {
            family: "sans-serif".to_string(),
            size: 10.0,
            weight: FontWeight::Normal,
            style: FontStyle::Normal,
        }
    }
}

impl FontSpec {
    /// Family names of the stack, unquoted, in priority order.
    pub fn families(&self) -> impl Iterator<Item = &str> {
        self.family
            .split(',')
            .map(|s| s.trim().trim_matches('"').trim_matches('\'').trim())
            .filter(|s| !s.is_empty())
    }
}

/// CSS font shorthand, e.g. `italic bold 32px Georgia`.
impl fmt::Display for FontSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {}px {}",
            self.style.as_str(),
            self.weight,
            self.size,
            self.family
        )
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TextBaseline {
    #[default]
    Alphabetic,
    /// Vertical center of the ascent/descent box sits on the anchor.
    Middle,
}

/// Drop shadow applied to fills and strokes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShadowState {
    pub offset_x: f32,
    pub offset_y: f32,
    pub blur: f32,
    pub color: Rgba<u8>,
}

impl Default for ShadowState {
    fn default() -> Self {
        Self {
            offset_x: 0.0,
            offset_y: 0.0,
            blur: 0.0,
            color: Rgba([0, 0, 0, 0]),
        }
    }
}

impl ShadowState {
    /// Whether drawing this shadow would change any pixel.
    pub fn is_visible(&self) -> bool {
        self.color[3] > 0 && (self.offset_x != 0.0 || self.offset_y != 0.0 || self.blur > 0.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GraphicsState {
    pub font: FontSpec,
    pub fill: Rgba<u8>,
    pub stroke: Rgba<u8>,
    pub line_width: f32,
    pub global_alpha: f32,
    pub text_align: TextAlign,
    pub text_baseline: TextBaseline,
    pub shadow: ShadowState,
}

impl Default for GraphicsState {
    fn default() -> Self {
        Self {
            font: FontSpec::default(),
            fill: Rgba([0, 0, 0, 255]),
            stroke: Rgba([0, 0, 0, 255]),
            line_width: 1.0,
            global_alpha: 1.0,
            text_align: TextAlign::Left,
            text_baseline: TextBaseline::Alphabetic,
            shadow: ShadowState::default(),
        }
    }
}

/// Current graphics state plus the saved copies.
#[derive(Debug, Clone, Default)]
pub struct StateStack {
    current: GraphicsState,
    saved: Vec<GraphicsState>,
}

impl StateStack {
    pub fn depth(&self) -> usize {
        self.saved.len()
    }
}

/// A drawing surface.
///
/// Implementors provide storage for the state stack and the three drawing
/// primitives; save/restore come for free.
pub trait Canvas {
    fn state_stack(&self) -> &StateStack;
    fn state_stack_mut(&mut self) -> &mut StateStack;

    /// Advance width of `text` in the current font.
    fn measure_text(&mut self, text: &str) -> Result<f32, RenderError>;

    /// Fill `text` anchored at `(x, y)` per the current align and baseline.
    fn fill_text(&mut self, text: &str, x: f32, y: f32);

    /// Stroke a straight line with the current stroke color and line width.
    fn stroke_line(&mut self, from: (f32, f32), to: (f32, f32));

    fn state(&self) -> &GraphicsState {
        &self.state_stack().current
    }

    fn state_mut(&mut self) -> &mut GraphicsState {
        &mut self.state_stack_mut().current
    }

    fn save(&mut self) {
        let stack = self.state_stack_mut();
        stack.saved.push(stack.current.clone());
    }

    /// Pop the last saved state. An unbalanced restore is a no-op.
    fn restore(&mut self) {
        let stack = self.state_stack_mut();
        if let Some(state) = stack.saved.pop() {
            stack.current = state;
        }
    }
}

/// Saves the canvas state on creation and restores it when dropped.
pub struct StateGuard<'a, C: Canvas + ?Sized> {
    canvas: &'a mut C,
}

impl<'a, C: Canvas + ?Sized> StateGuard<'a, C> {
    pub fn new(canvas: &'a mut C) -> Self {
        canvas.save();
        Self { canvas }
    }
}

impl<C: Canvas + ?Sized> Deref for StateGuard<'_, C> {
    type Target = C;

    fn deref(&self) -> &C {
        self.canvas
    }
}

impl<C: Canvas + ?Sized> DerefMut for StateGuard<'_, C> {
    fn deref_mut(&mut self) -> &mut C {
        self.canvas
    }
}

impl<C: Canvas + ?Sized> Drop for StateGuard<'_, C> {
    fn drop(&mut self) {
        self.canvas.restore();
    }
}

/// Glyph measurement and coverage, the capability a [`RasterCanvas`] draws with.
///
/// `None` means no face could be resolved for the request at all.
pub trait GlyphRasterizer {
    /// Advance width of `text` in pixels, kerning included.
    fn measure(&self, font: &FontSpec, text: &str) -> Option<f32>;

    /// `(ascent, descent)` in pixels; descent is negative.
    fn vertical_metrics(&self, font: &FontSpec) -> Option<(f32, f32)>;

    /// Lay out `text` from `x` on `baseline` and report each covered pixel.
    fn rasterize(
        &self,
        font: &FontSpec,
        text: &str,
        x: f32,
        baseline: f32,
        plot: &mut dyn FnMut(i32, i32, f32),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NullCanvas {
        stack: StateStack,
    }

    impl Canvas for NullCanvas {
        fn state_stack(&self) -> &StateStack {
            &self.stack
        }
        fn state_stack_mut(&mut self) -> &mut StateStack {
            &mut self.stack
        }
        fn measure_text(&mut self, text: &str) -> Result<f32, RenderError> {
            Ok(text.len() as f32)
        }
        fn fill_text(&mut self, _text: &str, _x: f32, _y: f32) {}
        fn stroke_line(&mut self, _from: (f32, f32), _to: (f32, f32)) {}
    }

    #[test]
    fn test_guard_restores_on_drop() {
        let mut canvas = NullCanvas {
            stack: StateStack::default(),
        };
        {
            let mut guard = StateGuard::new(&mut canvas);
            guard.state_mut().global_alpha = 0.25;
            guard.state_mut().text_align = TextAlign::Center;
            assert_eq!(guard.state_stack().depth(), 1);
        }
        assert_eq!(canvas.state_stack().depth(), 0);
        assert_eq!(canvas.state().global_alpha, 1.0);
        assert_eq!(canvas.state().text_align, TextAlign::Left);
    }

    #[test]
    fn test_unbalanced_restore_is_noop() {
        let mut canvas = NullCanvas {
            stack: StateStack::default(),
        };
        canvas.state_mut().line_width = 3.0;
        canvas.restore();
        assert_eq!(canvas.state().line_width, 3.0);
    }

    #[test]
    fn test_font_spec_display_and_stack() {
        let spec = FontSpec {
            family: "\"Open Sans\", 'Roboto', monospace".to_string(),
            size: 32.0,
            weight: FontWeight::Bold,
            style: FontStyle::Italic,
        };
        assert_eq!(
            spec.to_string(),
            "italic bold 32px \"Open Sans\", 'Roboto', monospace"
        );
        let families: Vec<&str> = spec.families().collect();
        assert_eq!(families, vec!["Open Sans", "Roboto", "monospace"]);
    }

    #[test]
    fn test_shadow_visibility() {
        let mut shadow = ShadowState::default();
        assert!(!shadow.is_visible());
        shadow.color = Rgba([0, 0, 0, 255]);
        assert!(!shadow.is_visible());
        shadow.blur = 2.0;
        assert!(shadow.is_visible());
    }
}
