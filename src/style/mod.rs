//! # Text Style Model
//!
//! A fixed-shape descriptor of the visual properties used when painting a
//! name into a text area. Styles are plain values: each [`TextArea`] owns its
//! own copy, and nothing in here has behaviour beyond parsing and the text
//! transform.
//!
//! All types derive `Serialize + Deserialize` with the camelCase field names
//! used by the persisted session state and job files.
//!
//! [`TextArea`]: crate::document::TextArea

pub mod color;
pub mod shadow;

use serde::{Deserialize, Serialize};
use std::fmt;

pub use shadow::Shadow;

/// Font weight: `normal`, `bold`, or a numeric weight from 100 to 900 in steps of 100.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum FontWeight {
    #[default]
    Normal,
    Bold,
    Numeric(u16),
}

impl FontWeight {
    /// Build a numeric weight. Returns `None` outside 100..=900 or off the 100 grid.
    pub fn numeric(value: u16) -> Option<Self> {
        if (100..=900).contains(&value) && value % 100 == 0 {
            Some(FontWeight::Numeric(value))
        } else {
            None
        }
    }

    /// Numeric weight used for face matching (normal = 400, bold = 700).
    pub fn to_number(self) -> u16 {
        match self {
            FontWeight::Normal => 400,
            FontWeight::Bold => 700,
            FontWeight::Numeric(n) => n,
        }
    }

    /// Parse the CSS keyword or number form.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "normal" => Some(FontWeight::Normal),
            "bold" => Some(FontWeight::Bold),
            other => other.parse::<u16>().ok().and_then(FontWeight::numeric),
        }
    }
}

impl fmt::Display for FontWeight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FontWeight::Normal => f.write_str("normal"),
            FontWeight::Bold => f.write_str("bold"),
            FontWeight::Numeric(n) => write!(f, "{}", n),
        }
    }
}

impl Serialize for FontWeight {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Accepts `"bold"`, `"700"` or `700`.
impl<'de> Deserialize<'de> for FontWeight {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum WeightValue {
            Number(u16),
            Text(String),
        }

        let parsed = match WeightValue::deserialize(deserializer)? {
            WeightValue::Number(n) => FontWeight::numeric(n),
            WeightValue::Text(s) => FontWeight::parse(&s),
        };
        parsed.ok_or_else(|| serde::de::Error::custom("invalid font weight"))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontStyle {
    #[default]
    Normal,
    Italic,
    Oblique,
}

impl FontStyle {
    pub fn as_str(self) -> &'static str {
        match self {
            FontStyle::Normal => "normal",
            FontStyle::Italic => "italic",
            FontStyle::Oblique => "oblique",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TextDecoration {
    #[default]
    None,
    Underline,
    LineThrough,
    Overline,
}

impl TextDecoration {
    /// Vertical offset of the decoration line from a middle-baseline anchor.
    ///
    /// Fixed approximations of CSS placement, not read from font metrics.
    pub fn offset(self, font_size: f32) -> Option<f32> {
        match self {
            TextDecoration::None => None,
            TextDecoration::Underline => Some(font_size / 4.0),
            TextDecoration::LineThrough => Some(0.0),
            TextDecoration::Overline => Some(-font_size / 2.0),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextTransform {
    #[default]
    None,
    Uppercase,
    Lowercase,
    Capitalize,
}

impl TextTransform {
    /// Apply the transform to `text`.
    ///
    /// `Capitalize` upper-cases the first character of every run of word
    /// characters (alphanumerics and `_`), leaving the rest untouched:
    /// `"mary-anne o'connor"` becomes `"Mary-Anne O'Connor"`.
    pub fn apply(self, text: &str) -> String {
        match self {
            TextTransform::None => text.to_string(),
            TextTransform::Uppercase => text.to_uppercase(),
            TextTransform::Lowercase => text.to_lowercase(),
            TextTransform::Capitalize => {
                let mut out = String::with_capacity(text.len());
                let mut in_word = false;
                for ch in text.chars() {
                    let is_word = ch.is_alphanumeric() || ch == '_';
                    if is_word && !in_word {
                        out.extend(ch.to_uppercase());
                    } else {
                        out.push(ch);
                    }
                    in_word = is_word;
                }
                out
            }
        }
    }
}

/// Visual text properties for one text area.
///
/// `font_size` is only a hint: the engine replaces it with the largest size
/// that fits the area.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TextStyle {
    pub font_family: String,
    pub font_size: f32,
    pub font_weight: FontWeight,
    pub font_style: FontStyle,
    pub color: String,
    pub text_decoration: TextDecoration,
    pub text_transform: TextTransform,
    /// Extra pixels between consecutive characters. May be negative.
    pub letter_spacing: f32,
    /// Multiplier applied to the font size when checking the vertical fit.
    pub line_height: f32,
    /// `none`, or `<x>px <y>px <blur>px <color>`.
    pub text_shadow: String,
    pub opacity: f32,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            font_family: "Arial".to_string(),
            font_size: 24.0,
            font_weight: FontWeight::Normal,
            font_style: FontStyle::Normal,
            color: "#000000".to_string(),
            text_decoration: TextDecoration::None,
            text_transform: TextTransform::None,
            letter_spacing: 0.0,
            line_height: 1.2,
            text_shadow: "none".to_string(),
            opacity: 1.0,
        }
    }
}

impl TextStyle {
    /// Parsed shadow, or `None` for `none` and malformed values.
    pub fn shadow(&self) -> Option<Shadow> {
        Shadow::parse(&self.text_shadow)
    }
}
