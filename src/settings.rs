//! Settings for the Polar Clock tools.
//!
//! Settings are a versioned JSON document. Every field carries its own
//! serde default, and `Settings::validated` replaces out-of-range values
//! with the defaults, so partial or stale documents always load.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::types::{PomodoroConfig, PomodoroPhase};

/// Current settings document version.
pub const SETTINGS_VERSION: u32 = 1;

/// Directory (under the home directory) holding settings, state and socket.
pub const APP_DIR: &str = ".polar-clock";

/// Settings file name.
pub const SETTINGS_FILE: &str = "settings.json";

/// Smallest accepted tick interval.
const MIN_TICK_INTERVAL_MS: u64 = 10;

// ============================================================================
// SettingsError
// ============================================================================

/// Errors that can occur while loading settings.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// The settings file could not be read.
    #[error("failed to read settings file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The settings file is not valid JSON for this document.
    #[error("failed to parse settings file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The home directory could not be determined.
    #[error("home directory is not available")]
    NoHomeDir,
}

// ============================================================================
// Defaults
// ============================================================================

fn default_version() -> u32 {
    SETTINGS_VERSION
}

fn default_alarm_sound() -> String {
    "bell01.mp3".to_string()
}

fn default_countdown_ending_sound() -> String {
    "long_break_end.mp3".to_string()
}

fn default_volume() -> f32 {
    1.0
}

fn default_snooze_seconds() -> f64 {
    300.0
}

fn default_last_minute_seconds() -> f64 {
    60.0
}

fn default_ending_cue_seconds() -> f64 {
    58.0
}

fn default_tick_interval_ms() -> u64 {
    100
}

fn default_work_end_sound() -> String {
    "work_end.mp3".to_string()
}

fn default_short_break_end_sound() -> String {
    "short_break_end.mp3".to_string()
}

fn default_long_break_end_sound() -> String {
    "long_break_end.mp3".to_string()
}

// ============================================================================
// PhaseSounds
// ============================================================================

/// Sounds played shortly before a Pomodoro phase ends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseSounds {
    #[serde(default = "default_work_end_sound")]
    pub work: String,
    #[serde(default = "default_short_break_end_sound")]
    pub short_break: String,
    #[serde(default = "default_long_break_end_sound")]
    pub long_break: String,
}

impl Default for PhaseSounds {
    fn default() -> Self {
        Self {
            work: default_work_end_sound(),
            short_break: default_short_break_end_sound(),
            long_break: default_long_break_end_sound(),
        }
    }
}

impl PhaseSounds {
    /// Returns the ending sound of `phase`.
    pub fn for_phase(&self, phase: PomodoroPhase) -> &str {
        match phase {
            PomodoroPhase::Work => &self.work,
            PomodoroPhase::ShortBreak => &self.short_break,
            PomodoroPhase::LongBreak => &self.long_break,
        }
    }
}

// ============================================================================
// Settings
// ============================================================================

/// Tool settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Document version
    #[serde(default = "default_version")]
    pub version: u32,

    /// Sound identifier of the alarm (countdown end, Pomodoro phase end)
    #[serde(default = "default_alarm_sound")]
    pub alarm_sound: String,

    /// Sound identifier of the countdown "ending soon" cue
    #[serde(default = "default_countdown_ending_sound")]
    pub countdown_ending_sound: String,

    /// Phase-specific "ending soon" sounds of the Pomodoro cycle
    #[serde(default)]
    pub phase_end_sounds: PhaseSounds,

    /// Playback volume (0.0 - 1.0)
    #[serde(default = "default_volume")]
    pub volume: f32,

    /// Directory containing the sound files
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sounds_dir: Option<PathBuf>,

    /// Extra time granted by snooze, in seconds
    #[serde(default = "default_snooze_seconds")]
    pub snooze_seconds: f64,

    /// Remaining time at which the Pomodoro last-minute cue fires
    #[serde(default = "default_last_minute_seconds")]
    pub last_minute_seconds: f64,

    /// Remaining time at which the "ending soon" cues fire
    #[serde(default = "default_ending_cue_seconds")]
    pub ending_cue_seconds: f64,

    /// Tick driver period in milliseconds
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,

    /// Default Pomodoro durations
    #[serde(default)]
    pub pomodoro: PomodoroConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: SETTINGS_VERSION,
            alarm_sound: default_alarm_sound(),
            countdown_ending_sound: default_countdown_ending_sound(),
            phase_end_sounds: PhaseSounds::default(),
            volume: default_volume(),
            sounds_dir: None,
            snooze_seconds: default_snooze_seconds(),
            last_minute_seconds: default_last_minute_seconds(),
            ending_cue_seconds: default_ending_cue_seconds(),
            tick_interval_ms: default_tick_interval_ms(),
            pomodoro: PomodoroConfig::default(),
        }
    }
}

impl Settings {
    /// Returns the default settings path (`~/.polar-clock/settings.json`).
    pub fn default_path() -> Result<PathBuf, SettingsError> {
        let home = dirs::home_dir().ok_or(SettingsError::NoHomeDir)?;
        Ok(home.join(APP_DIR).join(SETTINGS_FILE))
    }

    /// Loads settings from `path`.
    ///
    /// A missing file yields the defaults; any other read or parse failure
    /// is returned.
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No settings file at {}, using defaults", path.display());
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(SettingsError::Read {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        Self::from_json(&text).map_err(|source| SettingsError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Parses a settings document and fills invalid fields with defaults.
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        let settings: Settings = serde_json::from_str(text)?;
        Ok(settings.validated())
    }

    /// Returns a copy with every out-of-range field replaced by its default.
    pub fn validated(mut self) -> Self {
        let defaults = Settings::default();

        if self.version != SETTINGS_VERSION {
            debug!(
                "Settings version {} differs from {}, upgrading",
                self.version, SETTINGS_VERSION
            );
            self.version = SETTINGS_VERSION;
        }
        if !self.volume.is_finite() {
            warn!("Invalid volume in settings, using {}", defaults.volume);
            self.volume = defaults.volume;
        }
        self.volume = self.volume.clamp(0.0, 1.0);
        if !(self.snooze_seconds.is_finite() && self.snooze_seconds > 0.0) {
            self.snooze_seconds = defaults.snooze_seconds;
        }
        if !(self.last_minute_seconds.is_finite() && self.last_minute_seconds >= 0.0) {
            self.last_minute_seconds = defaults.last_minute_seconds;
        }
        if !(self.ending_cue_seconds.is_finite() && self.ending_cue_seconds >= 0.0) {
            self.ending_cue_seconds = defaults.ending_cue_seconds;
        }
        self.tick_interval_ms = self.tick_interval_ms.max(MIN_TICK_INTERVAL_MS);
        self.pomodoro = self.pomodoro.sanitized(&defaults.pomodoro);
        self
    }
}

/// Parses a duration in minutes as typed by a user.
///
/// Returns `None` for non-numeric, non-finite, zero or negative input.
pub fn parse_minutes(input: &str) -> Option<f64> {
    input
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|minutes| crate::types::is_valid_minutes(*minutes))
}

// ============================================================================
// Tests
// ============================================================================
