//! # Error Types
//!
//! Each module has its own error enum; [`NametagError`] wraps them for
//! callers (like the CLI) that drive several modules at once.

use thiserror::Error;

use crate::batch::BatchError;
use crate::fonts::FontLoadError;
use crate::job::JobError;
use crate::render::RenderError;
use crate::session::SessionError;

/// Main error type for nametag operations
#[derive(Debug, Error)]
pub enum NametagError {
    /// Font registration or loading failed
    #[error(transparent)]
    Font(#[from] FontLoadError),

    /// Text could not be measured
    #[error(transparent)]
    Render(#[from] RenderError),

    /// A batch run aborted
    #[error(transparent)]
    Batch(#[from] BatchError),

    /// Invalid job file
    #[error(transparent)]
    Job(#[from] JobError),

    /// Session state could not be read or written
    #[error(transparent)]
    Session(#[from] SessionError),

    /// I/O error wrapper
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error wrapper
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
