//! Polar Clock Library
//!
//! This library provides the core functionality for the Polar Clock CLI.
//! It includes:
//! - Countdown timer, stopwatch and Pomodoro cycle state machines
//! - A facade driving all three from a single update loop
//! - Sound playback for alarm and phase cues
//! - Daemon with tick driver, state persistence and IPC server
//! - CLI command parsing, IPC client and display utilities
//! - Type definitions for settings, snapshots and IPC messages

pub mod cli;
pub mod daemon;
pub mod settings;
pub mod sound;
pub mod tools;
pub mod types;

// Re-export commonly used types for convenience
pub use types::{
    IpcRequest, IpcResponse, Lap, Machine, PersistedTools, PomodoroAction, PomodoroConfig,
    PomodoroInput, PomodoroPhase, StopwatchAction, TimerAction, ToolsSnapshot,
};

// Re-export settings
pub use settings::{parse_minutes, Settings, SettingsError};

// Re-export the tools
pub use tools::{
    Clock, CountdownTimer, CueKind, ManualClock, PomodoroCycle, Stopwatch, SystemClock,
    ToolEvent, Tools,
};

// Re-export sound types
pub use sound::{
    resolve_sound, AudioThread, MockSoundPlayer, RodioSoundPlayer, SoundError, SoundPlayer,
    SoundSource,
};

// Re-export daemon types
pub use daemon::{DaemonOptions, IpcServer, RequestHandler, StateStore};
