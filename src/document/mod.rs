//! # Text Areas
//!
//! Named rectangles on the source image, each owning its own [`TextStyle`].
//!
//! Coordinates are in the pixel space of the original, unscaled image.
//! Areas are independent: overlap is allowed, and later areas in a list
//! paint over earlier ones.
//!
//! ```
//! use nametag::document::{Rect, TextArea};
//! use nametag::style::TextStyle;
//!
//! // A drag from bottom-right to top-left still yields a positive rect
//! let rect = Rect::from_corners((300.0, 200.0), (100.0, 150.0));
//! let area = TextArea::commit("title", rect, TextStyle::default()).unwrap();
//! assert_eq!(area.rect.width, 200.0);
//! ```

use serde::{Deserialize, Serialize};

use crate::style::TextStyle;

/// Smallest committed width or height, in image pixels.
pub const MIN_AREA_SIZE: f32 = 20.0;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Rectangle spanning two drag points, in any order.
    pub fn from_corners(a: (f32, f32), b: (f32, f32)) -> Self {
        Self {
            x: a.0.min(b.0),
            y: a.1.min(b.1),
            width: (a.0 - b.0).abs(),
            height: (a.1 - b.1).abs(),
        }
    }

    /// The same rectangle with each axis multiplied by its scale factor.
    pub fn scaled(&self, scale_x: f32, scale_y: f32) -> Rect {
        Rect {
            x: self.x * scale_x,
            y: self.y * scale_y,
            width: self.width * scale_x,
            height: self.height * scale_y,
        }
    }

    pub fn center(&self) -> (f32, f32) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Whether the rectangle is large enough to commit as a text area.
    pub fn is_usable(&self) -> bool {
        self.width >= MIN_AREA_SIZE && self.height >= MIN_AREA_SIZE
    }
}

/// A committed rectangle plus its style.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextArea {
    pub id: String,
    #[serde(flatten)]
    pub rect: Rect,
    #[serde(default)]
    pub style: TextStyle,
}

impl TextArea {
    /// Commit a candidate rectangle. Returns `None` if it is smaller than
    /// [`MIN_AREA_SIZE`] in either dimension.
    ///
    /// The style is copied in; areas never share a style.
    pub fn commit(id: impl Into<String>, rect: Rect, style: TextStyle) -> Option<TextArea> {
        if !rect.is_usable() {
            return None;
        }
        Some(TextArea {
            id: id.into(),
            rect,
            style,
        })
    }
}
