//! # Batch Generator
//!
//! Renders one output image per name: the source image with every text
//! area painted on top, each area auto-fitting the name.
//!
//! ## Flow
//!
//! ```text
//! UploadedImage ──decode once──▶ base RgbaImage
//!                                     │
//!   for each name (in order)          ▼
//!     blank? ──yes──▶ skip      clone base ─▶ render every TextArea ─▶ PNG
//!       │                                     (list order, scale 1)      │
//!       └────────────── on_progress(i + 1, total) ◀──────────────────────┘
//! ```
//!
//! Iterations are strictly sequential, so at most one full-resolution
//! output surface is alive at a time. Decoding and PNG encoding run on the
//! blocking pool and are the only suspension points. Any failure aborts
//! the whole batch and discards what was already produced.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use image::{ImageEncoder, RgbaImage};
use std::collections::BTreeSet;
use std::io::Cursor;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::canvas::{FontSpec, GlyphRasterizer, RasterCanvas};
use crate::document::TextArea;
use crate::fonts::{FontLoadError, FontRegistry};
use crate::render::{self, RenderError};

/// Errors that abort a batch.
#[derive(Debug, Error)]
pub enum BatchError {
    #[error("Source image could not be decoded: {0}")]
    Decode(String),

    #[error("Image encoding error: {0}")]
    Encoding(String),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error("Background task failed: {0}")]
    Task(String),
}

/// The uploaded source image.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadedImage {
    pub width: u32,
    pub height: u32,
    /// Self-contained `data:<mime>;base64,...` representation.
    pub data_url: String,
}

impl UploadedImage {
    /// Wrap encoded image bytes (PNG, JPEG, ...), reading only the header.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, BatchError> {
        let format = image::guess_format(bytes).map_err(|e| BatchError::Decode(e.to_string()))?;
        let (width, height) = image::ImageReader::with_format(Cursor::new(bytes), format)
            .into_dimensions()
            .map_err(|e| BatchError::Decode(e.to_string()))?;
        Ok(Self {
            width,
            height,
            data_url: format!("data:{};base64,{}", format.to_mime_type(), BASE64.encode(bytes)),
        })
    }

    /// Parse a base64 data URL.
    pub fn from_data_url(data_url: &str) -> Result<Self, BatchError> {
        Self::from_bytes(&decode_data_url(data_url)?)
    }

    /// The encoded image bytes.
    pub fn bytes(&self) -> Result<Vec<u8>, BatchError> {
        decode_data_url(&self.data_url)
    }
}

fn decode_data_url(data_url: &str) -> Result<Vec<u8>, BatchError> {
    let payload = data_url
        .strip_prefix("data:")
        .and_then(|rest| rest.split_once(','))
        .filter(|(header, _)| header.ends_with(";base64"))
        .map(|(_, payload)| payload)
        .ok_or_else(|| BatchError::Decode("not a base64 data URL".to_string()))?;
    BASE64
        .decode(payload.trim())
        .map_err(|e| BatchError::Decode(e.to_string()))
}

/// One rendered output.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedImage {
    /// The trimmed name that was rendered.
    pub name: String,
    /// `data:image/png;base64,...`, ready for display.
    pub data_url: String,
    /// The PNG bytes, ready to save.
    pub blob: Vec<u8>,
}

/// Paint `name` into every area on a copy of `base`, in list order.
pub fn compose<G: GlyphRasterizer + ?Sized>(
    base: &RgbaImage,
    name: &str,
    areas: &[TextArea],
    glyphs: &G,
) -> Result<RgbaImage, RenderError> {
    let mut canvas = RasterCanvas::new(base.clone(), glyphs);
    for area in areas {
        render::render(&mut canvas, name, &area.rect, &area.style, 1.0, 1.0)?;
    }
    Ok(canvas.into_image())
}

/// Encode an RGBA image as PNG.
pub fn encode_png(image: &RgbaImage) -> Result<Vec<u8>, BatchError> {
    let mut png_bytes = Vec::new();
    let encoder = image::codecs::png::PngEncoder::new(&mut png_bytes);
    encoder
        .write_image(
            image.as_raw(),
            image.width(),
            image.height(),
            image::ExtendedColorType::Rgba8,
        )
        .map_err(|e: image::ImageError| BatchError::Encoding(e.to_string()))?;
    Ok(png_bytes)
}

/// Await remote loads for every family the areas reference.
///
/// Failures are logged and otherwise ignored: an unloadable family simply
/// renders in the fallback face.
pub async fn preload_fonts(registry: &FontRegistry, areas: &[TextArea]) {
    let mut families = BTreeSet::new();
    for area in areas {
        let spec = FontSpec {
            family: area.style.font_family.clone(),
            ..Default::default()
        };
        families.extend(spec.families().map(str::to_string));
    }

    for family in families {
        match registry.ensure_loaded(&family).await {
            Ok(()) => {}
            Err(FontLoadError::NoRemoteSource(_)) => {
                debug!(family = %family, "family not installed, using fallback")
            }
            Err(e) => warn!(family = %family, error = %e, "font load failed, using fallback"),
        }
    }
}

/// Render every non-blank name onto the source image.
///
/// Blank or whitespace-only names produce no output but still count for
/// progress: `on_progress(index + 1, names.len())` runs after every name.
/// The full result set is returned only once all names are done.
pub async fn generate<G: GlyphRasterizer + ?Sized>(
    source: &UploadedImage,
    names: &[String],
    areas: &[TextArea],
    glyphs: &G,
    mut on_progress: Option<&mut dyn FnMut(usize, usize)>,
) -> Result<Vec<GeneratedImage>, BatchError> {
    let total = names.len();
    info!(names = total, areas = areas.len(), "starting batch");

    let bytes = source.bytes()?;
    let base = tokio::task::spawn_blocking(move || image::load_from_memory(&bytes))
        .await
        .map_err(|e| BatchError::Task(e.to_string()))?
        .map_err(|e| BatchError::Decode(e.to_string()))?
        .to_rgba8();

    let mut results = Vec::new();
    for (index, name) in names.iter().enumerate() {
        let trimmed = name.trim();
        if !trimmed.is_empty() {
            let composed = compose(&base, trimmed, areas, glyphs)?;
            let blob = tokio::task::spawn_blocking(move || encode_png(&composed))
                .await
                .map_err(|e| BatchError::Task(e.to_string()))??;

            debug!(name = %trimmed, bytes = blob.len(), "rendered");
            results.push(GeneratedImage {
                name: trimmed.to_string(),
                data_url: format!("data:image/png;base64,{}", BASE64.encode(&blob)),
                blob,
            });
        }
        if let Some(report) = on_progress.as_deref_mut() {
            report(index + 1, total);
        }
    }

    info!(generated = results.len(), skipped = total - results.len(), "batch finished");
    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let image = RgbaImage::from_pixel(width, height, Rgba([10, 20, 30, 255]));
        encode_png(&image).unwrap()
    }

    #[test]
    fn test_uploaded_image_from_bytes() {
        let upload = UploadedImage::from_bytes(&png_bytes(7, 3)).unwrap();
        assert_eq!((upload.width, upload.height), (7, 3));
        assert!(upload.data_url.starts_with("data:image/png;base64,"));
        assert_eq!(upload.bytes().unwrap(), png_bytes(7, 3));
    }

    #[test]
    fn test_uploaded_image_data_url_round_trip() {
        let upload = UploadedImage::from_bytes(&png_bytes(4, 4)).unwrap();
        let again = UploadedImage::from_data_url(&upload.data_url).unwrap();
        assert_eq!(upload, again);
    }

    #[test]
    fn test_rejects_non_image() {
        assert!(matches!(
            UploadedImage::from_bytes(b"hello world"),
            Err(BatchError::Decode(_))
        ));
        assert!(matches!(
            UploadedImage::from_data_url("data:text/plain,hello"),
            Err(BatchError::Decode(_))
        ));
        assert!(matches!(
            UploadedImage::from_data_url("https://example.com/a.png"),
            Err(BatchError::Decode(_))
        ));
    }

    #[test]
    fn test_encode_png_decodes_back() {
        let image = RgbaImage::from_pixel(5, 2, Rgba([1, 2, 3, 4]));
        let png = encode_png(&image).unwrap();
        let decoded = image::load_from_memory(&png).unwrap().to_rgba8();
        assert_eq!(decoded, image);
    }
}
