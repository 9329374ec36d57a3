//! # Font Resolution
//!
//! Maps CSS font-family names to renderable `ab_glyph` faces.
//!
//! ## Architecture
//!
//! ```text
//! FontRegistry
//!   ├── db:       fontdb::Database              every loaded face, queried CSS-style
//!   ├── fonts:    face id → FontArc             parsed lazily, cached
//!   ├── aliases:  name (lowercase) → [face ids] uploaded and remote families
//!   ├── fallback: face id                       used when nothing else matches
//!   └── remote:   family → OnceCell<Result>     one shared download per family
//! ```
//!
//! The registry is an explicit object owned by the session and passed to
//! whatever needs fonts; there is no process-wide font state. It implements
//! [`GlyphRasterizer`], so a [`RasterCanvas`](crate::canvas::RasterCanvas)
//! can draw with it directly.
//!
//! Family lookup is case-insensitive. Within a family, `fontdb` picks the
//! face closest to the requested weight and slant at normal stretch, so
//! condensed or expanded cuts only win when nothing else exists. The CSS
//! generic keywords map to the first installed family of a preference list.
//!
//! Unknown families are never an error: they resolve to the fallback face,
//! exactly like a browser silently substituting a default font.
//! [`FontRegistry::is_available`] is the only way to detect that beforehand.

pub mod container;
pub mod remote;

use ab_glyph::{Font, FontArc, FontVec, GlyphId, PxScale, ScaleFont};
use fontdb::{Database, Family, ID, Query, Source, Stretch, Weight};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use thiserror::Error;
use tokio::sync::OnceCell;
use tracing::{debug, info};

use crate::canvas::{FontSpec, GENERIC_FALLBACK, GlyphRasterizer};
use crate::style::{FontStyle, FontWeight};

pub use remote::RemoteFontSource;

/// Reference string and size for the availability check.
const SAMPLE_TEXT: &str = "abcdefghijklmnopqrstuvwxyz0123456789";
const SAMPLE_SIZE: f32 = 72.0;

/// File extensions accepted for uploaded fonts.
pub const FONT_EXTENSIONS: &[&str] = &["ttf", "otf", "woff", "woff2"];

/// CSS generic family keywords.
const GENERIC_FAMILIES: &[&str] = &[
    "serif",
    "sans-serif",
    "monospace",
    "cursive",
    "fantasy",
    "system-ui",
];

/// Installed families tried, in order, for `sans-serif` and the fallback face.
const SANS_SERIF_PREFERENCE: &[&str] = &[
    "DejaVu Sans",
    "Liberation Sans",
    "Arial",
    "Helvetica",
    "Noto Sans",
    "FreeSans",
];

const SERIF_PREFERENCE: &[&str] = &[
    "DejaVu Serif",
    "Liberation Serif",
    "Times New Roman",
    "Times",
    "Noto Serif",
    "FreeSerif",
];

const MONOSPACE_PREFERENCE: &[&str] = &[
    "DejaVu Sans Mono",
    "Liberation Mono",
    "Courier New",
    "Menlo",
    "Noto Sans Mono",
    "FreeMono",
];

/// Common system-safe families offered in the style picker.
const BUILTIN_FAMILIES: &[&str] = &[
    "Arial",
    "Helvetica",
    "Times New Roman",
    "Georgia",
    "Verdana",
    "Tahoma",
    "Trebuchet MS",
    "Courier New",
    "Palatino",
    "Garamond",
    "Bookman",
    "Comic Sans MS",
    "Impact",
    "Arial Black",
];

/// Errors from loading or registering a font.
#[derive(Debug, Clone, Error)]
pub enum FontLoadError {
    #[error("Unrecognized font data (expected TrueType, OpenType, WOFF or WOFF2)")]
    UnknownContainer,

    #[error("Malformed web font: {0}")]
    Woff(String),

    #[error("Font parse error: {0}")]
    Parse(String),

    #[error("Failed to read font {path}: {reason}")]
    Io { path: String, reason: String },

    #[error("Remote font '{family}' failed: {reason}")]
    Remote { family: String, reason: String },

    #[error("No remote font source configured for '{0}'")]
    NoRemoteSource(String),
}

/// Registry configuration, usually assembled from CLI flags.
#[derive(Debug, Clone, Default)]
pub struct RegistryConfig {
    /// Directories scanned for fonts; empty means the platform's system
    /// font locations.
    pub font_dirs: Vec<PathBuf>,
    /// Explicit fallback face; overrides the preference list.
    pub fallback_font: Option<PathBuf>,
    /// Remote font URL template containing `{family}`.
    pub remote_url_template: Option<String>,
}

/// Opaque handle for an uploaded font, used to unregister it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FontHandle {
    id: u64,
    family: String,
}

impl FontHandle {
    pub fn family(&self) -> &str {
        &self.family
    }
}

/// A registered upload: display name, original bytes and its handle.
#[derive(Debug, Clone)]
pub struct CustomFont {
    pub name: String,
    pub data: Arc<[u8]>,
    pub handle: FontHandle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FaceSource {
    Custom(u64),
    Remote,
}

/// Faces loaded from one upload or download, first face first.
#[derive(Debug, Clone)]
struct AliasedFont {
    faces: Vec<ID>,
    source: FaceSource,
}

type RemoteLoad = Arc<OnceCell<Result<(), FontLoadError>>>;

/// Session-owned font registry.
pub struct FontRegistry {
    db: RwLock<Database>,
    fonts: RwLock<HashMap<ID, FontArc>>,
    aliases: RwLock<HashMap<String, Vec<AliasedFont>>>,
    custom: RwLock<Vec<CustomFont>>,
    fallback: RwLock<Option<ID>>,
    remote: Option<RemoteFontSource>,
    remote_loads: Mutex<HashMap<String, RemoteLoad>>,
    next_id: AtomicU64,
}

impl Default for FontRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl FontRegistry {
    /// An empty registry: no faces, no fallback, no remote source.
    pub fn new() -> Self {
        Self {
            db: RwLock::new(Database::new()),
            fonts: RwLock::new(HashMap::new()),
            aliases: RwLock::new(HashMap::new()),
            custom: RwLock::new(Vec::new()),
            fallback: RwLock::new(None),
            remote: None,
            remote_loads: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Build a registry from configuration: load fonts, pick a fallback,
    /// attach the remote source.
    pub fn from_config(config: &RegistryConfig) -> Result<Self, FontLoadError> {
        let mut registry = Self::new();
        if let Some(template) = &config.remote_url_template {
            registry.remote = Some(RemoteFontSource::new(template.clone())?);
        }

        let loaded = registry.load_system_fonts(&config.font_dirs);
        info!(faces = loaded, dirs = config.font_dirs.len(), "loaded system fonts");

        if let Some(path) = &config.fallback_font {
            let data = read_font_file(path)?;
            registry.set_fallback(data)?;
        }
        Ok(registry)
    }

    /// Attach a remote font source.
    pub fn with_remote(mut self, source: RemoteFontSource) -> Self {
        self.remote = Some(source);
        self
    }

    /// Load every font under `dirs`, recursively, or the platform's system
    /// fonts when `dirs` is empty. Returns the number of faces added.
    ///
    /// Unreadable files are skipped. Afterwards the generic families point
    /// at installed faces and, if no fallback is set yet, one is chosen.
    pub fn load_system_fonts(&self, dirs: &[PathBuf]) -> usize {
        let added = {
            let mut db = write(&self.db);
            let before = db.len();
            if dirs.is_empty() {
                db.load_system_fonts();
            } else {
                for dir in dirs {
                    db.load_fonts_dir(dir);
                }
            }
            assign_generic_families(&mut db);
            db.len().saturating_sub(before)
        };

        if read(&self.fallback).is_none() {
            let chosen = self.pick_system_fallback();
            if let Some(id) = chosen {
                *write(&self.fallback) = Some(id);
            }
        }
        added
    }

    fn pick_system_fallback(&self) -> Option<ID> {
        let db = read(&self.db);
        SANS_SERIF_PREFERENCE
            .iter()
            .find_map(|name| {
                let family = canonical_family(&db, name)?;
                db.query(&query(&[Family::Name(&family)], 400, FontStyle::Normal))
            })
            .or_else(|| {
                // Deterministic pick among whatever was loaded
                db.faces()
                    .filter(|face| face.style == fontdb::Style::Normal)
                    .min_by(|a, b| {
                        primary_family(a)
                            .cmp(primary_family(b))
                            .then(a.weight.0.abs_diff(400).cmp(&b.weight.0.abs_diff(400)))
                    })
                    .map(|face| face.id)
            })
    }

    /// Use the given font data as the fallback face.
    pub fn set_fallback(&self, data: Vec<u8>) -> Result<(), FontLoadError> {
        let faces = self.load_face_data(data)?;
        *write(&self.fallback) = Some(faces[0]);
        Ok(())
    }

    /// Register uploaded font bytes under a name derived from `filename`.
    ///
    /// A later registration with the same family takes precedence over an
    /// earlier one until it is unregistered.
    pub fn register(&self, data: Vec<u8>, filename: &str) -> Result<FontHandle, FontLoadError> {
        let original: Arc<[u8]> = Arc::from(data.as_slice());
        let byte_len = original.len();
        let faces = self.load_face_data(data)?;
        let family = derive_family_name(filename);
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let handle = FontHandle {
            id,
            family: family.clone(),
        };

        write(&self.aliases)
            .entry(family.to_lowercase())
            .or_default()
            .push(AliasedFont {
                faces,
                source: FaceSource::Custom(id),
            });
        write(&self.custom).push(CustomFont {
            name: family.clone(),
            data: original,
            handle: handle.clone(),
        });

        info!(family = %family, bytes = byte_len, "registered custom font");
        Ok(handle)
    }

    /// Read and register a font file; the family comes from the file name.
    pub fn register_file(&self, path: &Path) -> Result<FontHandle, FontLoadError> {
        let data = read_font_file(path)?;
        let filename = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default();
        self.register(data, filename)
    }

    /// Remove an uploaded font. Returns `false` if the handle is unknown.
    ///
    /// Afterwards the family falls back like any unknown name.
    pub fn unregister(&self, handle: &FontHandle) -> bool {
        let removed = {
            let mut custom = write(&self.custom);
            let before = custom.len();
            custom.retain(|c| c.handle.id != handle.id);
            custom.len() != before
        };
        if !removed {
            return false;
        }

        let key = handle.family.to_lowercase();
        let mut dropped = Vec::new();
        {
            let mut aliases = write(&self.aliases);
            if let Some(list) = aliases.get_mut(&key) {
                list.retain(|font| {
                    let keep = font.source != FaceSource::Custom(handle.id);
                    if !keep {
                        dropped.extend_from_slice(&font.faces);
                    }
                    keep
                });
                if list.is_empty() {
                    aliases.remove(&key);
                }
            }
        }

        let mut db = write(&self.db);
        let mut fonts = write(&self.fonts);
        for id in dropped {
            db.remove_face(id);
            fonts.remove(&id);
        }
        info!(family = %handle.family, "unregistered custom font");
        true
    }

    /// Uploaded fonts in registration order.
    pub fn custom_fonts(&self) -> Vec<CustomFont> {
        read(&self.custom).clone()
    }

    /// The fixed catalog of common families, in display order.
    pub fn list_builtins() -> &'static [&'static str] {
        BUILTIN_FAMILIES
    }

    /// Whether `family` has at least one loaded face (no fallback).
    pub fn has_family(&self, family: &str) -> bool {
        let family = family.trim();
        read(&self.aliases).contains_key(&family.to_lowercase())
            || canonical_family(&read(&self.db), family).is_some()
    }

    /// Heuristic availability check.
    ///
    /// Measures a reference string in `"<family>", monospace` and in
    /// `monospace` alone. Identical widths mean the family silently fell back
    /// and is reported unavailable. This is best effort: a real font whose
    /// sample width happens to equal the monospace face's is a false negative.
    pub fn is_available(&self, family: &str) -> bool {
        let sample = |stack: String| FontSpec {
            family: stack,
            size: SAMPLE_SIZE,
            weight: FontWeight::Normal,
            style: FontStyle::Normal,
        };
        let candidate = self.measure(
            &sample(format!("\"{}\", {}", family.trim(), GENERIC_FALLBACK)),
            SAMPLE_TEXT,
        );
        let fallback = self.measure(&sample(GENERIC_FALLBACK.to_string()), SAMPLE_TEXT);

        match (candidate, fallback) {
            (Some(a), Some(b)) => a.to_bits() != b.to_bits(),
            (Some(_), None) => true,
            (None, _) => false,
        }
    }

    /// Make a remote family usable, downloading it at most once.
    ///
    /// Concurrent callers for the same family await the same download. The
    /// outcome, success or failure, is cached for the registry's lifetime.
    pub async fn ensure_loaded(&self, family: &str) -> Result<(), FontLoadError> {
        let family = family.trim();
        if self.has_family(family) || is_generic(family) {
            return Ok(());
        }
        let Some(source) = &self.remote else {
            return Err(FontLoadError::NoRemoteSource(family.to_string()));
        };

        let cell = {
            let mut loads = self
                .remote_loads
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            loads.entry(family.to_lowercase()).or_default().clone()
        };

        cell.get_or_init(|| async {
            debug!(family = %family, url = %source.url_for(family), "fetching remote font");
            let data = source.fetch(family).await?;
            let faces = self.load_face_data(data)?;
            write(&self.aliases)
                .entry(family.to_lowercase())
                .or_default()
                .push(AliasedFont {
                    faces,
                    source: FaceSource::Remote,
                });
            info!(family = %family, "loaded remote font");
            Ok::<(), FontLoadError>(())
        })
        .await
        .clone()
    }

    /// Unwrap, parse and add font bytes to the database. The returned list
    /// is never empty; its first face is the one `ab_glyph` validated.
    fn load_face_data(&self, data: Vec<u8>) -> Result<Vec<ID>, FontLoadError> {
        let sfnt = container::to_sfnt(data)?;
        let font = FontVec::try_from_vec(sfnt.clone())
            .map_err(|e| FontLoadError::Parse(e.to_string()))?;
        let faces = write(&self.db)
            .load_font_source(Source::Binary(Arc::new(sfnt)))
            .to_vec();
        let Some(&first) = faces.first() else {
            return Err(FontLoadError::Parse("no usable face in font data".to_string()));
        };
        write(&self.fonts).insert(first, FontArc::new(font));
        Ok(faces)
    }

    /// Parsed face for a database id, cached after the first use.
    fn font(&self, id: ID) -> Option<FontArc> {
        if let Some(font) = read(&self.fonts).get(&id) {
            return Some(font.clone());
        }
        let parsed = read(&self.db).with_face_data(id, |data, index| {
            FontVec::try_from_vec_and_index(data.to_vec(), index)
        })?;
        match parsed {
            Ok(font) => {
                let font = FontArc::new(font);
                write(&self.fonts).insert(id, font.clone());
                Some(font)
            }
            Err(e) => {
                debug!(face = ?id, error = %e, "skipping unparsable face");
                None
            }
        }
    }

    /// Best face of one family: uploads and downloads first, most recent
    /// winning, then the database.
    fn resolve_family(&self, family: &str, weight: u16, style: FontStyle) -> Option<ID> {
        if let Some(font) = read(&self.aliases)
            .get(&family.to_lowercase())
            .and_then(|list| list.last())
        {
            return font.faces.first().copied();
        }

        let db = read(&self.db);
        if let Some(generic) = generic_family(family) {
            return db.query(&query(&[generic], weight, style));
        }
        let name = canonical_family(&db, family)?;
        db.query(&query(&[Family::Name(&name)], weight, style))
    }

    /// Resolve a font request to a face: first matching family in the
    /// stack, else the fallback. A generic keyword ends the stack.
    fn resolve(&self, spec: &FontSpec) -> Option<FontArc> {
        let weight = spec.weight.to_number();
        for family in spec.families() {
            if let Some(font) = self
                .resolve_family(family, weight, spec.style)
                .and_then(|id| self.font(id))
            {
                return Some(font);
            }
            if is_generic(family) {
                break;
            }
        }
        let fallback = *read(&self.fallback);
        fallback.and_then(|id| self.font(id))
    }
}

impl GlyphRasterizer for FontRegistry {
    fn measure(&self, font: &FontSpec, text: &str) -> Option<f32> {
        let face = self.resolve(font)?;
        let scaled = face.as_scaled(px_scale(&face, font.size));
        let mut width = 0.0;
        let mut previous: Option<GlyphId> = None;
        for ch in text.chars() {
            let id = scaled.glyph_id(ch);
            if let Some(prev) = previous {
                width += scaled.kern(prev, id);
            }
            width += scaled.h_advance(id);
            previous = Some(id);
        }
        Some(width)
    }

    fn vertical_metrics(&self, font: &FontSpec) -> Option<(f32, f32)> {
        let face = self.resolve(font)?;
        let scaled = face.as_scaled(px_scale(&face, font.size));
        Some((scaled.ascent(), scaled.descent()))
    }

    fn rasterize(
        &self,
        font: &FontSpec,
        text: &str,
        x: f32,
        baseline: f32,
        plot: &mut dyn FnMut(i32, i32, f32),
    ) {
        let Some(face) = self.resolve(font) else {
            return;
        };
        let scale = px_scale(&face, font.size);
        let scaled = face.as_scaled(scale);

        let mut caret = x;
        let mut previous: Option<GlyphId> = None;
        for ch in text.chars() {
            let id = scaled.glyph_id(ch);
            if let Some(prev) = previous {
                caret += scaled.kern(prev, id);
            }
            let glyph = id.with_scale_and_position(scale, ab_glyph::point(caret, baseline));
            if let Some(outlined) = face.outline_glyph(glyph) {
                let bounds = outlined.px_bounds();
                outlined.draw(|px, py, coverage| {
                    plot(
                        px as i32 + bounds.min.x as i32,
                        py as i32 + bounds.min.y as i32,
                        coverage,
                    );
                });
            }
            caret += scaled.h_advance(id);
            previous = Some(id);
        }
    }
}

/// Strip a recognised font extension (case-insensitive) from a file name.
///
/// `"Lobster-Regular.TTF"` → `"Lobster-Regular"`; other names pass through.
pub fn derive_family_name(filename: &str) -> String {
    if let Some((stem, ext)) = filename.rsplit_once('.') {
        let ext = ext.to_ascii_lowercase();
        if FONT_EXTENSIONS.contains(&ext.as_str()) && !stem.is_empty() {
            return stem.to_string();
        }
    }
    filename.to_string()
}

fn is_generic(family: &str) -> bool {
    GENERIC_FAMILIES
        .iter()
        .any(|g| g.eq_ignore_ascii_case(family))
}

fn generic_family(family: &str) -> Option<Family<'static>> {
    match family.to_ascii_lowercase().as_str() {
        "serif" => Some(Family::Serif),
        "sans-serif" | "system-ui" => Some(Family::SansSerif),
        "monospace" => Some(Family::Monospace),
        "cursive" => Some(Family::Cursive),
        "fantasy" => Some(Family::Fantasy),
        _ => None,
    }
}

/// Point the generic families at the first installed preference.
fn assign_generic_families(db: &mut Database) {
    if let Some(name) = first_installed(db, SANS_SERIF_PREFERENCE) {
        db.set_sans_serif_family(name);
    }
    if let Some(name) = first_installed(db, SERIF_PREFERENCE) {
        db.set_serif_family(name);
    }
    if let Some(name) = first_installed(db, MONOSPACE_PREFERENCE) {
        db.set_monospace_family(name);
    }
}

fn first_installed(db: &Database, preference: &[&str]) -> Option<String> {
    preference
        .iter()
        .find_map(|name| canonical_family(db, name))
}

/// The database's spelling of `name`, matched case-insensitively.
fn canonical_family(db: &Database, name: &str) -> Option<String> {
    db.faces()
        .flat_map(|face| face.families.iter())
        .find(|(family, _)| family.eq_ignore_ascii_case(name))
        .map(|(family, _)| family.clone())
}

fn primary_family(face: &fontdb::FaceInfo) -> &str {
    face.families
        .first()
        .map(|(name, _)| name.as_str())
        .unwrap_or_default()
}

fn query<'a>(families: &'a [Family<'a>], weight: u16, style: FontStyle) -> Query<'a> {
    Query {
        families,
        weight: Weight(weight),
        stretch: Stretch::Normal,
        style: match style {
            FontStyle::Normal => fontdb::Style::Normal,
            FontStyle::Italic => fontdb::Style::Italic,
            FontStyle::Oblique => fontdb::Style::Oblique,
        },
    }
}

/// Pixel scale whose em square is `size` pixels tall.
fn px_scale(font: &FontArc, size: f32) -> PxScale {
    font.pt_to_px_scale(size)
        .unwrap_or_else(|| PxScale::from(size))
}

fn read_font_file(path: &Path) -> Result<Vec<u8>, FontLoadError> {
    std::fs::read(path).map_err(|e| FontLoadError::Io {
        path: path.display().to_string(),
        reason: e.to_string(),
    })
}

fn read<T>(lock: &RwLock<T>) -> std::sync::RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write<T>(lock: &RwLock<T>) -> std::sync::RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}
