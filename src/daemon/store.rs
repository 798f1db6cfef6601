//! JSON state store.
//!
//! The persisted document is written to a temporary file next to the
//! target and renamed over it, so a crash never leaves a half-written file.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, warn};

use crate::settings::APP_DIR;
use crate::types::{PersistedTools, PERSISTED_VERSION};

/// State file name.
pub const STATE_FILE: &str = "state.json";

// ============================================================================
// StoreError
// ============================================================================

/// Errors that can occur while reading or writing the state file.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to read state file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write state file {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize state: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("home directory is not available")]
    NoHomeDir,
}

// ============================================================================
// StateStore
// ============================================================================

/// Reads and writes the persisted tool state.
#[derive(Debug, Clone)]
pub struct StateStore {
    path: PathBuf,
}

impl StateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Returns the default state path (`~/.polar-clock/state.json`).
    pub fn default_path() -> Result<PathBuf, StoreError> {
        let home = dirs::home_dir().ok_or(StoreError::NoHomeDir)?;
        Ok(home.join(APP_DIR).join(STATE_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the persisted document.
    ///
    /// Returns `Ok(None)` when no file exists or the file is malformed;
    /// the tools then start fresh.
    pub fn load(&self) -> Result<Option<PersistedTools>, StoreError> {
        let text = match std::fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No state file at {}", self.path.display());
                return Ok(None);
            }
            Err(source) => {
                return Err(StoreError::Read {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        match serde_json::from_str::<PersistedTools>(&text) {
            Ok(state) => {
                if state.version > PERSISTED_VERSION {
                    warn!(
                        "State file version {} is newer than {}, reading known fields only",
                        state.version, PERSISTED_VERSION
                    );
                }
                Ok(Some(state))
            }
            Err(e) => {
                warn!(
                    "Ignoring malformed state file {}: {}",
                    self.path.display(),
                    e
                );
                Ok(None)
            }
        }
    }

    /// Writes the persisted document.
    pub fn save(&self, state: &PersistedTools) -> Result<(), StoreError> {
        let json = serde_json::to_vec_pretty(state)?;
        let write_error = |source| StoreError::Write {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(write_error)?;
        }

        let tmp_path = self.path.with_extension("json.tmp");
        std::fs::write(&tmp_path, json).map_err(write_error)?;
        std::fs::rename(&tmp_path, &self.path).map_err(write_error)?;

        debug!("Saved state to {}", self.path.display());
        Ok(())
    }
}
