//! Command definitions for the Polar Clock CLI.
//!
//! Uses clap derive macro for argument parsing.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::types::{IpcRequest, PomodoroAction, PomodoroInput, StopwatchAction, TimerAction};

// ============================================================================
// CLI Structure
// ============================================================================

/// Polar Clock - countdown timer, stopwatch and Pomodoro cycle
#[derive(Parser, Debug)]
#[command(
    name = "polar-clock",
    version,
    about = "Countdown timer, stopwatch and Pomodoro cycle in the terminal",
    long_about = "Countdown timer, stopwatch and Pomodoro cycle driven by a background daemon.\n\
                  Start the daemon with 'polar-clock daemon', then control the tools from any shell.",
    propagate_version = true
)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Enable verbose output for debugging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Daemon socket path (defaults to ~/.polar-clock/polar-clock.sock)
    #[arg(long, global = true, value_name = "PATH")]
    pub socket: Option<PathBuf>,
}

// ============================================================================
// Subcommands
// ============================================================================

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Control the countdown timer
    Timer {
        #[command(subcommand)]
        command: TimerCommand,
    },

    /// Control the stopwatch
    Stopwatch {
        #[command(subcommand)]
        command: StopwatchCommand,
    },

    /// Control the Pomodoro cycle
    Pomodoro {
        #[command(subcommand)]
        command: PomodoroCommand,
    },

    /// Show the state of all tools
    Status,

    /// Run the daemon in the foreground
    Daemon(DaemonArgs),

    /// Generate shell completion scripts
    Completions {
        /// Shell type for completion script
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

impl Commands {
    /// Returns the IPC request for commands handled by the daemon.
    pub fn to_request(&self) -> Option<IpcRequest> {
        match self {
            Commands::Timer { command } => Some(IpcRequest::Timer {
                action: command.to_action(),
            }),
            Commands::Stopwatch { command } => Some(IpcRequest::Stopwatch {
                action: command.to_action(),
            }),
            Commands::Pomodoro { command } => Some(IpcRequest::Pomodoro {
                action: command.to_action(),
            }),
            Commands::Status => Some(IpcRequest::Status),
            Commands::Daemon(_) | Commands::Completions { .. } => None,
        }
    }
}

// ============================================================================
// Timer
// ============================================================================

/// Countdown timer commands
#[derive(Subcommand, Debug, Clone)]
pub enum TimerCommand {
    /// Set the duration (ignored while running)
    Set(SetArgs),
    /// Start counting down
    Start,
    /// Pause the countdown
    Pause,
    /// Start or pause
    Toggle,
    /// Stop and restore the configured duration
    Reset,
    /// Add snooze time and keep running
    Snooze,
    /// Mute or unmute the alarm
    Mute,
    /// Silence the alarm
    StopAlarm,
    /// Reload the configured duration and start again
    Restart,
    /// Turn interval repeat on or off
    Interval {
        #[arg(value_enum)]
        mode: Switch,
    },
}

impl TimerCommand {
    pub fn to_action(&self) -> TimerAction {
        match self {
            TimerCommand::Set(args) => TimerAction::Configure {
                hours: args.hours,
                minutes: args.minutes,
                seconds: args.seconds,
            },
            TimerCommand::Start => TimerAction::Start,
            TimerCommand::Pause => TimerAction::Pause,
            TimerCommand::Toggle => TimerAction::Toggle,
            TimerCommand::Reset => TimerAction::Reset,
            TimerCommand::Snooze => TimerAction::Snooze,
            TimerCommand::Mute => TimerAction::Mute,
            TimerCommand::StopAlarm => TimerAction::StopAlarm,
            TimerCommand::Restart => TimerAction::Restart,
            TimerCommand::Interval { mode } => TimerAction::Interval {
                enabled: *mode == Switch::On,
            },
        }
    }
}

/// Arguments for `timer set`. Overflowing fields carry into the next unit.
#[derive(Args, Debug, Clone, Default)]
pub struct SetArgs {
    /// Hours
    #[arg(short = 'H', long, default_value_t = 0)]
    pub hours: u32,

    /// Minutes
    #[arg(short, long, default_value_t = 0)]
    pub minutes: u32,

    /// Seconds
    #[arg(short, long, default_value_t = 0)]
    pub seconds: u32,
}

/// On/off switch
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Switch {
    On,
    Off,
}

// ============================================================================
// Stopwatch
// ============================================================================

/// Stopwatch commands
#[derive(Subcommand, Debug, Clone)]
pub enum StopwatchCommand {
    /// Start measuring
    Start,
    /// Pause measuring
    Pause,
    /// Start or pause
    Toggle,
    /// Clear elapsed time and laps
    Reset,
    /// Record a lap
    Lap,
    /// Label a lap by its row in `status` (1 = most recent)
    Label {
        #[arg(value_parser = clap::value_parser!(u32).range(1..))]
        row: u32,
        /// Label text
        text: String,
    },
    /// Add time measured elsewhere
    CatchUp {
        /// Minutes to add
        #[arg(short, long, default_value_t = 0)]
        minutes: u32,
        /// Seconds to add
        #[arg(short, long, default_value_t = 0)]
        seconds: u32,
    },
}

impl StopwatchCommand {
    pub fn to_action(&self) -> StopwatchAction {
        match self {
            StopwatchCommand::Start => StopwatchAction::Start,
            StopwatchCommand::Pause => StopwatchAction::Pause,
            StopwatchCommand::Toggle => StopwatchAction::Toggle,
            StopwatchCommand::Reset => StopwatchAction::Reset,
            StopwatchCommand::Lap => StopwatchAction::Lap,
            StopwatchCommand::Label { row, text } => StopwatchAction::Label {
                display_index: row.saturating_sub(1) as usize,
                text: text.clone(),
            },
            StopwatchCommand::CatchUp { minutes, seconds } => StopwatchAction::CatchUp {
                minutes: *minutes,
                seconds: *seconds,
            },
        }
    }
}

// ============================================================================
// Pomodoro
// ============================================================================

/// Pomodoro commands
#[derive(Subcommand, Debug, Clone)]
pub enum PomodoroCommand {
    /// Start or pause; acknowledges a ringing alarm
    Start,
    /// Pause the phase
    Pause,
    /// Return to the first work phase
    Reset,
    /// Extend the current phase
    Snooze,
    /// Mute or unmute the alarm
    Mute,
    /// Skip to the next phase
    Next,
    /// Change durations or continuous mode
    Config(PomodoroConfigArgs),
}

impl PomodoroCommand {
    pub fn to_action(&self) -> PomodoroAction {
        match self {
            PomodoroCommand::Start => PomodoroAction::Start,
            PomodoroCommand::Pause => PomodoroAction::Pause,
            PomodoroCommand::Reset => PomodoroAction::Reset,
            PomodoroCommand::Snooze => PomodoroAction::Snooze,
            PomodoroCommand::Mute => PomodoroAction::Mute,
            PomodoroCommand::Next => PomodoroAction::Next,
            PomodoroCommand::Config(args) => PomodoroAction::Configure {
                input: args.to_input(),
            },
        }
    }
}

/// Arguments for `pomodoro config`.
///
/// Durations are passed through as text; values that are not positive
/// numbers keep the previous setting.
#[derive(Args, Debug, Clone, Default)]
pub struct PomodoroConfigArgs {
    /// Work duration in minutes
    #[arg(short, long)]
    pub work: Option<String>,

    /// Short break duration in minutes
    #[arg(short, long)]
    pub short_break: Option<String>,

    /// Long break duration in minutes
    #[arg(short, long)]
    pub long_break: Option<String>,

    /// Move to the next phase automatically when one ends
    #[arg(short, long)]
    pub continuous: Option<bool>,
}

impl PomodoroConfigArgs {
    pub fn to_input(&self) -> PomodoroInput {
        PomodoroInput {
            work_minutes: self.work.clone(),
            short_break_minutes: self.short_break.clone(),
            long_break_minutes: self.long_break.clone(),
            continuous: self.continuous,
        }
    }
}

// ============================================================================
// Daemon
// ============================================================================

/// Arguments for `daemon`.
#[derive(Args, Debug, Clone, Default)]
pub struct DaemonArgs {
    /// Settings file (defaults to ~/.polar-clock/settings.json)
    #[arg(long, value_name = "PATH")]
    pub settings: Option<PathBuf>,

    /// State file (defaults to ~/.polar-clock/state.json)
    #[arg(long, value_name = "PATH")]
    pub state: Option<PathBuf>,
}

// ============================================================================
// Tests
// ============================================================================
