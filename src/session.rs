//! Persisted session state.
//!
//! One JSON record, `{ "names": [...], "lastTextStyle": {...} }`, stored
//! under a single fixed file name inside a state directory. Writes go to a
//! temporary file which is then renamed over the old one, so readers never
//! see a half-written record.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

use crate::style::TextStyle;

/// File name of the persisted record.
pub const STATE_FILE: &str = "nametag-state.json";

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Failed to access session state {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Corrupt session state: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionState {
    #[serde(default)]
    pub names: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_text_style: Option<TextStyle>,
}

/// File-backed store for [`SessionState`].
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            path: dir.as_ref().join(STATE_FILE),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The stored record, or the empty default if nothing was saved yet.
    pub fn load(&self) -> Result<SessionState, SessionError> {
        match fs::read(&self.path) {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(SessionState::default()),
            Err(e) => Err(self.io_error(e)),
        }
    }

    /// Replace the stored record.
    pub fn save(&self, state: &SessionState) -> Result<(), SessionError> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir).map_err(|e| self.io_error(e))?;
        }
        let json = serde_json::to_vec_pretty(state)?;
        let tmp = self.path.with_extension("json.part");
        fs::write(&tmp, json).map_err(|e| self.io_error(e))?;
        fs::rename(&tmp, &self.path).map_err(|e| self.io_error(e))?;
        debug!(path = %self.path.display(), names = state.names.len(), "session saved");
        Ok(())
    }

    /// Read, modify and write back in one synchronous step.
    pub fn update<F>(&self, f: F) -> Result<SessionState, SessionError>
    where
        F: FnOnce(&mut SessionState),
    {
        let mut state = self.load()?;
        f(&mut state);
        self.save(&state)?;
        Ok(state)
    }

    fn io_error(&self, source: std::io::Error) -> SessionError {
        SessionError::Io {
            path: self.path.display().to_string(),
            source,
        }
    }
}
