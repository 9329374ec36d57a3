//! Text shadow parsing.
//!
//! Only the single-shadow form `<x>px <y>px <blur>px <color>` is understood.
//! Anything else, including the literal `none`, means "no shadow"; a bad
//! value never fails a render.

/// A parsed text shadow. `color` is the raw CSS color text.
#[derive(Debug, Clone, PartialEq)]
pub struct Shadow {
    pub offset_x: i32,
    pub offset_y: i32,
    pub blur: u32,
    pub color: String,
}

impl Shadow {
    /// Parse a `text-shadow` value. Offsets may be negative, blur may not.
    pub fn parse(value: &str) -> Option<Shadow> {
        let value = value.trim();
        if value == "none" {
            return None;
        }

        let (x, rest) = value.split_once(' ')?;
        let (y, rest) = rest.split_once(' ')?;
        let (blur, color) = rest.split_once(' ')?;

        let offset_x = px_value(x)?;
        let offset_y = px_value(y)?;
        let blur = blur.strip_suffix("px")?;
        if !blur.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let blur = blur.parse::<u32>().ok()?;
        let color = color.trim();
        if color.is_empty() {
            return None;
        }

        Some(Shadow {
            offset_x,
            offset_y,
            blur,
            color: color.to_string(),
        })
    }
}

/// `-?\d+px` → integer.
fn px_value(token: &str) -> Option<i32> {
    let digits = token.strip_suffix("px")?;
    let unsigned = digits.strip_prefix('-').unwrap_or(digits);
    if unsigned.is_empty() || !unsigned.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}
