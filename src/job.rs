//! Batch job files.
//!
//! A job is a JSON document naming the source image, the names to render,
//! the text areas and any fonts to upload before rendering:
//!
//! ```json
//! {
//!   "image": "badge.png",
//!   "namesFile": "attendees.txt",
//!   "fonts": ["fonts/Lobster.woff"],
//!   "areas": [
//!     { "id": "name", "x": 40, "y": 120, "width": 520, "height": 90,
//!       "style": { "fontFamily": "Lobster", "color": "#1d3557" } }
//!   ]
//! }
//! ```
//!
//! Relative paths are resolved against the directory holding the job file.

use serde::Deserialize;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::document::{MIN_AREA_SIZE, TextArea};

#[derive(Debug, Error)]
pub enum JobError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid job file: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Text area '{id}' is smaller than {min}x{min}")]
    AreaTooSmall { id: String, min: f32 },

    #[error("Duplicate text area id '{0}'")]
    DuplicateArea(String),
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub image: PathBuf,
    #[serde(default)]
    pub names: Vec<String>,
    #[serde(default)]
    pub names_file: Option<PathBuf>,
    #[serde(default)]
    pub areas: Vec<TextArea>,
    #[serde(default)]
    pub fonts: Vec<PathBuf>,
}

impl Job {
    /// Parse and validate a job file, resolving its relative paths.
    pub fn from_file(path: &Path) -> Result<Self, JobError> {
        let text = fs::read_to_string(path).map_err(|source| JobError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let mut job = Self::from_json(&text)?;
        if let Some(base) = path.parent() {
            job.resolve_paths(base);
        }
        Ok(job)
    }

    pub fn from_json(text: &str) -> Result<Self, JobError> {
        let job: Job = serde_json::from_str(text)?;
        job.validate()?;
        Ok(job)
    }

    /// Every area must be committable and ids must be unique.
    pub fn validate(&self) -> Result<(), JobError> {
        let mut seen = HashSet::new();
        for area in &self.areas {
            if !area.rect.is_usable() {
                return Err(JobError::AreaTooSmall {
                    id: area.id.clone(),
                    min: MIN_AREA_SIZE,
                });
            }
            if !seen.insert(area.id.as_str()) {
                return Err(JobError::DuplicateArea(area.id.clone()));
            }
        }
        Ok(())
    }

    /// Inline names followed by the lines of `names_file`, if any.
    pub fn load_names(&self) -> Result<Vec<String>, JobError> {
        let mut names = self.names.clone();
        if let Some(path) = &self.names_file {
            names.extend(read_names(path)?);
        }
        Ok(names)
    }

    fn resolve_paths(&mut self, base: &Path) {
        self.image = resolve(base, &self.image);
        self.names_file = self.names_file.as_deref().map(|p| resolve(base, p));
        for font in &mut self.fonts {
            *font = resolve(base, font);
        }
    }
}

/// One name per line. Blank lines are kept; the batch skips them.
pub fn read_names(path: &Path) -> Result<Vec<String>, JobError> {
    let text = fs::read_to_string(path).map_err(|source| JobError::Io {
        path: path.display().to_string(),
        source,
    })?;
    Ok(text.lines().map(str::to_string).collect())
}

fn resolve(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}
