//! Font container detection and WOFF/WOFF2 unwrapping.
//!
//! `ab_glyph` and `fontdb` only read raw sfnt data (TrueType or
//! CFF-flavoured OpenType). Web font containers are decoded back into a
//! plain sfnt with `allsorts` before anything else sees them: WOFF tables
//! are inflated, WOFF2 tables are Brotli-decompressed and their `glyf`/`loca`
//! transforms reversed.

use allsorts::binary::read::ReadScope;
use allsorts::font_data::FontData;
use allsorts::subset::whole_font;
use allsorts::tables::FontTableProvider;

use super::FontLoadError;

/// Largest decoded font accepted from a web font header.
pub const MAX_SFNT_LEN: usize = 64 * 1024 * 1024;

/// `totalSfntSize` sits at the same offset in WOFF and WOFF2 headers.
const TOTAL_SFNT_SIZE_OFFSET: usize = 16;

/// Binary font container kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Container {
    TrueType,
    OpenType,
    Collection,
    Woff,
    Woff2,
}

/// Identify a container from its leading signature.
pub fn detect(data: &[u8]) -> Option<Container> {
    match data.get(..4)? {
        [0x00, 0x01, 0x00, 0x00] => Some(Container::TrueType),
        b"true" => Some(Container::TrueType),
        b"OTTO" => Some(Container::OpenType),
        b"ttcf" => Some(Container::Collection),
        b"wOFF" => Some(Container::Woff),
        b"wOF2" => Some(Container::Woff2),
        _ => None,
    }
}

/// Convert any supported container to raw sfnt bytes.
///
/// TrueType, OpenType and collections pass through untouched.
pub fn to_sfnt(data: Vec<u8>) -> Result<Vec<u8>, FontLoadError> {
    match detect(&data) {
        Some(Container::TrueType | Container::OpenType | Container::Collection) => Ok(data),
        Some(Container::Woff | Container::Woff2) => decode_web_font(&data),
        None => Err(FontLoadError::UnknownContainer),
    }
}

/// Rebuild a WOFF or WOFF2 file into an sfnt holding every table.
fn decode_web_font(data: &[u8]) -> Result<Vec<u8>, FontLoadError> {
    let declared = total_sfnt_size(data)?;
    if declared > MAX_SFNT_LEN {
        return Err(FontLoadError::Woff(format!(
            "declared size {} exceeds {} bytes",
            declared, MAX_SFNT_LEN
        )));
    }

    let font = ReadScope::new(data)
        .read::<FontData<'_>>()
        .map_err(|e| FontLoadError::Woff(e.to_string()))?;
    let provider = font
        .table_provider(0)
        .map_err(|e| FontLoadError::Woff(e.to_string()))?;
    let tags = provider
        .table_tags()
        .ok_or_else(|| FontLoadError::Woff("table directory unavailable".to_string()))?;

    let sfnt = whole_font(&provider, &tags).map_err(|e| FontLoadError::Woff(e.to_string()))?;
    if sfnt.len() > MAX_SFNT_LEN {
        return Err(FontLoadError::Woff(format!(
            "decoded size {} exceeds {} bytes",
            sfnt.len(),
            MAX_SFNT_LEN
        )));
    }
    Ok(sfnt)
}

fn total_sfnt_size(data: &[u8]) -> Result<usize, FontLoadError> {
    let bytes = data
        .get(TOTAL_SFNT_SIZE_OFFSET..TOTAL_SFNT_SIZE_OFFSET + 4)
        .ok_or_else(|| FontLoadError::Woff("truncated header".to_string()))?;
    Ok(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as usize)
}
