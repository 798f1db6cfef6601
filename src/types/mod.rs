//! Core data types for the Polar Clock tools.
//!
//! This module defines the data structures used for:
//! - Identifying the three tool machines
//! - Pomodoro phases and configuration
//! - Read-only snapshots handed to collaborators
//! - Persisted documents (restored on startup)
//! - IPC request/response serialization

use serde::{Deserialize, Serialize};

// ============================================================================
// Machine
// ============================================================================

/// Identifies one of the tool state machines.
///
/// Each machine owns its own audio cue slot, so this is also the key the
/// sound player uses to keep cues from overlapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Machine {
    /// Countdown timer
    Timer,
    /// Stopwatch
    Stopwatch,
    /// Pomodoro cycle
    Pomodoro,
}

impl Machine {
    /// Returns the string representation of the machine.
    pub fn as_str(&self) -> &'static str {
        match self {
            Machine::Timer => "timer",
            Machine::Stopwatch => "stopwatch",
            Machine::Pomodoro => "pomodoro",
        }
    }
}

// ============================================================================
// PomodoroPhase
// ============================================================================

/// Represents the current phase of the Pomodoro cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PomodoroPhase {
    /// Focused work
    #[default]
    Work,
    /// Short break after a work phase
    ShortBreak,
    /// Long break after every fourth work phase
    LongBreak,
}

impl PomodoroPhase {
    /// Returns the string representation of the phase.
    pub fn as_str(&self) -> &'static str {
        match self {
            PomodoroPhase::Work => "work",
            PomodoroPhase::ShortBreak => "shortBreak",
            PomodoroPhase::LongBreak => "longBreak",
        }
    }

    /// Returns true for either break phase.
    pub fn is_break(&self) -> bool {
        matches!(self, PomodoroPhase::ShortBreak | PomodoroPhase::LongBreak)
    }
}

// ============================================================================
// PomodoroConfig
// ============================================================================

fn default_work_minutes() -> f64 {
    25.0
}

fn default_short_break_minutes() -> f64 {
    5.0
}

fn default_long_break_minutes() -> f64 {
    15.0
}

/// Durations (in minutes) and the continuous flag of the Pomodoro cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PomodoroConfig {
    /// Work duration in minutes
    #[serde(default = "default_work_minutes")]
    pub work_minutes: f64,
    /// Short break duration in minutes
    #[serde(default = "default_short_break_minutes")]
    pub short_break_minutes: f64,
    /// Long break duration in minutes
    #[serde(default = "default_long_break_minutes")]
    pub long_break_minutes: f64,
    /// Whether an elapsed phase advances on its own instead of raising the alarm
    #[serde(default)]
    pub continuous: bool,
}

impl Default for PomodoroConfig {
    fn default() -> Self {
        Self {
            work_minutes: default_work_minutes(),
            short_break_minutes: default_short_break_minutes(),
            long_break_minutes: default_long_break_minutes(),
            continuous: false,
        }
    }
}

impl PomodoroConfig {
    /// Creates a new configuration with the specified work duration.
    pub fn with_work_minutes(mut self, minutes: f64) -> Self {
        self.work_minutes = minutes;
        self
    }

    /// Creates a new configuration with the specified short break duration.
    pub fn with_short_break_minutes(mut self, minutes: f64) -> Self {
        self.short_break_minutes = minutes;
        self
    }

    /// Creates a new configuration with the specified long break duration.
    pub fn with_long_break_minutes(mut self, minutes: f64) -> Self {
        self.long_break_minutes = minutes;
        self
    }

    /// Creates a new configuration with the continuous flag set.
    pub fn with_continuous(mut self, continuous: bool) -> Self {
        self.continuous = continuous;
        self
    }

    /// Returns the configured duration of `phase` in seconds.
    pub fn phase_seconds(&self, phase: PomodoroPhase) -> f64 {
        let minutes = match phase {
            PomodoroPhase::Work => self.work_minutes,
            PomodoroPhase::ShortBreak => self.short_break_minutes,
            PomodoroPhase::LongBreak => self.long_break_minutes,
        };
        minutes * 60.0
    }

    /// Replaces every invalid duration with the matching value of `fallback`.
    ///
    /// A duration is valid when it is finite and strictly positive.
    pub fn sanitized(&self, fallback: &PomodoroConfig) -> Self {
        let pick = |value: f64, previous: f64| {
            if is_valid_minutes(value) {
                value
            } else {
                previous
            }
        };
        Self {
            work_minutes: pick(self.work_minutes, fallback.work_minutes),
            short_break_minutes: pick(self.short_break_minutes, fallback.short_break_minutes),
            long_break_minutes: pick(self.long_break_minutes, fallback.long_break_minutes),
            continuous: self.continuous,
        }
    }
}

/// Returns true if `minutes` can be used as a phase duration.
pub fn is_valid_minutes(minutes: f64) -> bool {
    minutes.is_finite() && minutes > 0.0
}

/// Raw Pomodoro settings as entered by a user.
///
/// Fields are kept as text so that non-numeric input reaches the cycle,
/// which falls back to the previous value instead of failing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PomodoroInput {
    /// Work duration in minutes
    #[serde(rename = "workMinutes", skip_serializing_if = "Option::is_none")]
    pub work_minutes: Option<String>,
    /// Short break duration in minutes
    #[serde(rename = "shortBreakMinutes", skip_serializing_if = "Option::is_none")]
    pub short_break_minutes: Option<String>,
    /// Long break duration in minutes
    #[serde(rename = "longBreakMinutes", skip_serializing_if = "Option::is_none")]
    pub long_break_minutes: Option<String>,
    /// Continuous flag
    #[serde(skip_serializing_if = "Option::is_none")]
    pub continuous: Option<bool>,
}

// ============================================================================
// Lap
// ============================================================================

/// A recorded stopwatch lap.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Lap {
    /// Elapsed stopwatch time (ms) at the moment of the lap
    #[serde(default)]
    pub time: f64,
    /// User-provided label
    #[serde(default)]
    pub label: String,
}

impl Lap {
    /// Creates an unlabeled lap at `time` milliseconds.
    pub fn at(time: f64) -> Self {
        Self {
            time,
            label: String::new(),
        }
    }
}

// ============================================================================
// Snapshots
// ============================================================================

/// Read-only copy of the countdown timer state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CountdownSnapshot {
    pub total_seconds: f64,
    pub remaining_seconds: f64,
    pub is_running: bool,
    pub is_interval: bool,
    pub alarm_playing: bool,
    pub is_muted: bool,
    pub is_snoozing: bool,
    /// Number of interval repeats since the last configuration
    pub completed_cycles: u32,
}

/// Read-only copy of the stopwatch state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StopwatchSnapshot {
    /// Accumulated time in milliseconds
    pub elapsed_time: f64,
    pub is_running: bool,
    /// Laps in chronological order
    pub laps: Vec<Lap>,
}

/// Read-only copy of the Pomodoro cycle state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PomodoroSnapshot {
    pub phase: PomodoroPhase,
    pub remaining_seconds: f64,
    pub cycles: u32,
    pub is_running: bool,
    pub alarm_playing: bool,
    pub is_muted: bool,
    pub is_snoozing: bool,
    pub continuous: bool,
    pub has_started: bool,
    /// Work duration in minutes
    pub work_duration: f64,
    /// Short break duration in minutes
    pub short_break_duration: f64,
    /// Long break duration in minutes
    pub long_break_duration: f64,
}

/// Snapshot of all three machines, as returned by `Tools::get_state`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolsSnapshot {
    pub timer: CountdownSnapshot,
    pub pomodoro: PomodoroSnapshot,
    pub stopwatch: StopwatchSnapshot,
}

impl ToolsSnapshot {
    /// Returns the subset of this snapshot that survives a reload.
    pub fn to_persisted(&self) -> PersistedTools {
        PersistedTools {
            version: PERSISTED_VERSION,
            timer: Some(PersistedCountdown {
                total_seconds: self.timer.total_seconds,
                remaining_seconds: self.timer.remaining_seconds,
                is_interval: self.timer.is_interval,
            }),
            stopwatch: Some(PersistedStopwatch {
                elapsed_time: self.stopwatch.elapsed_time,
                laps: self.stopwatch.laps.clone(),
            }),
            pomodoro: Some(PersistedPomodoro {
                phase: self.pomodoro.phase,
                cycles: self.pomodoro.cycles,
                remaining_seconds: Some(self.pomodoro.remaining_seconds),
                work_duration: Some(self.pomodoro.work_duration),
                short_break_duration: Some(self.pomodoro.short_break_duration),
                long_break_duration: Some(self.pomodoro.long_break_duration),
                continuous: self.pomodoro.continuous,
            }),
        }
    }
}

// ============================================================================
// Persisted documents
// ============================================================================

/// Current version of the persisted document.
pub const PERSISTED_VERSION: u32 = 1;

fn default_persisted_version() -> u32 {
    PERSISTED_VERSION
}

/// Persisted countdown timer fields. Running state is never stored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PersistedCountdown {
    pub total_seconds: f64,
    pub remaining_seconds: f64,
    pub is_interval: bool,
}

/// Persisted stopwatch fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PersistedStopwatch {
    pub elapsed_time: f64,
    pub laps: Vec<Lap>,
}

/// Persisted Pomodoro fields.
///
/// Missing durations fall back to the configured ones on restore.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PersistedPomodoro {
    pub phase: PomodoroPhase,
    pub cycles: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remaining_seconds: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub work_duration: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub short_break_duration: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub long_break_duration: Option<f64>,
    pub continuous: bool,
}

/// The whole persisted document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedTools {
    #[serde(default = "default_persisted_version")]
    pub version: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timer: Option<PersistedCountdown>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stopwatch: Option<PersistedStopwatch>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pomodoro: Option<PersistedPomodoro>,
}

impl Default for PersistedTools {
    fn default() -> Self {
        Self {
            version: PERSISTED_VERSION,
            timer: None,
            stopwatch: None,
            pomodoro: None,
        }
    }
}

// ============================================================================
// IPC Types
// ============================================================================

/// Countdown timer actions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TimerAction {
    /// Set the duration (ignored while running)
    Configure {
        hours: u32,
        minutes: u32,
        seconds: u32,
    },
    Start,
    Pause,
    Toggle,
    Reset,
    Snooze,
    Mute,
    StopAlarm,
    Restart,
    /// Enable or disable interval repeat
    Interval { enabled: bool },
}

/// Stopwatch actions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StopwatchAction {
    Start,
    Pause,
    Toggle,
    Reset,
    Lap,
    /// Label a lap by its display index (0 = most recent)
    Label {
        #[serde(rename = "displayIndex")]
        display_index: usize,
        text: String,
    },
    /// Add manual catch-up time
    CatchUp { minutes: u32, seconds: u32 },
}

/// Pomodoro actions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PomodoroAction {
    /// Toggle running, or acknowledge and advance while the alarm sounds
    Start,
    Pause,
    Reset,
    Snooze,
    Mute,
    /// Skip to the next phase
    Next,
    /// Change durations / continuous flag
    Configure { input: PomodoroInput },
}

/// IPC request from client to daemon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "lowercase")]
pub enum IpcRequest {
    /// Countdown timer action
    Timer { action: TimerAction },
    /// Stopwatch action
    Stopwatch { action: StopwatchAction },
    /// Pomodoro action
    Pomodoro { action: PomodoroAction },
    /// Query the current state
    Status,
}

/// IPC response from daemon to client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IpcResponse {
    /// Response status ("success" or "error")
    pub status: String,
    /// Human-readable message
    pub message: String,
    /// Snapshot after the request was applied
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<ToolsSnapshot>,
}

impl IpcResponse {
    /// Creates a success response.
    pub fn success(message: impl Into<String>, data: Option<ToolsSnapshot>) -> Self {
        Self {
            status: "success".to_string(),
            message: message.into(),
            data,
        }
    }

    /// Creates an error response.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: "error".to_string(),
            message: message.into(),
            data: None,
        }
    }

    /// Returns true if this is an error response.
    pub fn is_error(&self) -> bool {
        self.status == "error"
    }
}

// ============================================================================
// Tests
// ============================================================================
