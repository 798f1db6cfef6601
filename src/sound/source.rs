//! Sound source resolution.
//!
//! Cues name their sound by identifier (e.g. `bell01.mp3`). The identifier
//! is looked up in the sounds directory; when no such file exists a
//! generated tone is played instead.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::settings::APP_DIR;

/// Directory name (under the app directory) holding sound files.
pub const SOUNDS_DIR: &str = "sounds";

/// Supported audio file extensions.
pub const SUPPORTED_EXTENSIONS: &[&str] = &["mp3", "wav", "ogg", "flac", "m4a", "aiff"];

/// Represents the source of a sound to be played.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SoundSource {
    /// A sound file on disk.
    File {
        /// The sound identifier (e.g., "bell01.mp3").
        name: String,
        /// The full path to the sound file.
        path: PathBuf,
    },
    /// A generated tone standing in for a missing file.
    Tone {
        /// The sound identifier the tone replaces.
        name: String,
    },
}

impl SoundSource {
    #[must_use]
    pub fn file(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self::File {
            name: name.into(),
            path: path.into(),
        }
    }

    #[must_use]
    pub fn tone(name: impl Into<String>) -> Self {
        Self::Tone { name: name.into() }
    }

    /// Returns the sound identifier.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::File { name, .. } | Self::Tone { name } => name,
        }
    }

    #[must_use]
    pub fn is_file(&self) -> bool {
        matches!(self, Self::File { .. })
    }

    #[must_use]
    pub fn is_tone(&self) -> bool {
        matches!(self, Self::Tone { .. })
    }

    /// Returns the file path if this is a file sound.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::File { path, .. } => Some(path),
            Self::Tone { .. } => None,
        }
    }

    /// Frequency of the tone used when no file is available.
    #[must_use]
    pub fn tone_frequency(&self) -> f32 {
        match self.name() {
            "work_end.mp3" => 660.0,
            "short_break_end.mp3" => 784.0,
            "long_break_end.mp3" => 988.0,
            _ => 880.0,
        }
    }
}

/// Returns the default sounds directory (`~/.polar-clock/sounds`).
#[must_use]
pub fn default_sounds_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(APP_DIR).join(SOUNDS_DIR))
}

/// Returns true if `name` is a bare file name with a supported extension.
fn is_plain_sound_name(name: &str) -> bool {
    let path = Path::new(name);
    let bare = path.file_name().is_some_and(|file_name| file_name == name);
    let supported = path
        .extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .is_some_and(|ext| SUPPORTED_EXTENSIONS.contains(&ext.as_str()));
    bare && supported
}

/// Resolves a sound identifier to a playable source.
///
/// Identifiers that are not bare file names never leave `dir`.
#[must_use]
pub fn resolve_sound(dir: Option<&Path>, name: &str) -> SoundSource {
    if let Some(dir) = dir {
        if is_plain_sound_name(name) {
            let path = dir.join(name);
            if path.is_file() {
                return SoundSource::file(name, path);
            }
            debug!("Sound file {} not found, using tone", path.display());
        } else {
            debug!("Sound name {:?} is not a plain file name, using tone", name);
        }
    }
    SoundSource::tone(name)
}
