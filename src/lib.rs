//! # Nametag - Batch Name Badge Renderer
//!
//! Nametag paints names onto a source image, one output per name. Each
//! rectangular text area auto-fits the name to the largest font size that
//! stays inside it. It provides:
//!
//! - **Style model**: CSS-like text styles with shadows, decorations and transforms
//! - **Font resolution**: system, uploaded (TTF/OTF/WOFF/WOFF2) and remote fonts
//! - **Fit-and-paint engine**: binary-searched font size, centered painting
//! - **Batch generation**: PNG output per name with progress reporting
//!
//! ## Quick Start
//!
//! ```no_run
//! use nametag::{
//!     batch::{self, UploadedImage},
//!     document::{Rect, TextArea},
//!     fonts::{FontRegistry, RegistryConfig},
//!     style::TextStyle,
//! };
//!
//! # async fn demo() -> Result<(), nametag::NametagError> {
//! // No font directories: load the platform's system fonts
//! let registry = FontRegistry::from_config(&RegistryConfig::default())?;
//! let source = UploadedImage::from_bytes(&std::fs::read("badge.png")?)?;
//!
//! let area = TextArea::commit("name", Rect::new(40.0, 120.0, 520.0, 90.0), TextStyle::default())
//!     .expect("area is large enough");
//! let areas = vec![area];
//! let names = vec!["Ada Lovelace".to_string(), "Alan Turing".to_string()];
//!
//! batch::preload_fonts(&registry, &areas).await;
//! let outputs = batch::generate(&source, &names, &areas, &registry, None).await?;
//! for output in outputs {
//!     std::fs::write(format!("{}.png", output.name), &output.blob)?;
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Module Overview
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`style`] | Text style record, colors, shadows |
//! | [`fonts`] | Font registry and loaders |
//! | [`canvas`] | Raster surface and graphics state |
//! | [`render`] | Font size fitting and text painting |
//! | [`document`] | Text area geometry |
//! | [`batch`] | One image per name |
//! | [`session`] | Persisted names and last style |
//! | [`job`] | JSON job files for the CLI |
//! | [`error`] | Error types |

pub mod batch;
pub mod canvas;
pub mod document;
pub mod error;
pub mod fonts;
pub mod job;
pub mod logging;
pub mod render;
pub mod session;
pub mod style;

// Re-exports for convenience
pub use error::NametagError;
pub use fonts::FontRegistry;
pub use style::TextStyle;
