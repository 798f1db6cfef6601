//! Display utilities for the Polar Clock CLI.
//!
//! This module provides formatted output for:
//! - Action results
//! - Error messages
//! - Status of the timer, stopwatch and Pomodoro cycle

use crate::tools::Components;
use crate::types::{
    CountdownSnapshot, IpcRequest, IpcResponse, PomodoroPhase, PomodoroSnapshot,
    StopwatchSnapshot, ToolsSnapshot,
};

// ============================================================================
// Display
// ============================================================================

/// Display utilities for CLI output.
pub struct Display;

impl Display {
    /// Shows the result of a request.
    ///
    /// Action requests print the daemon's message and the affected tool;
    /// status prints every tool.
    pub fn show_response(request: &IpcRequest, response: &IpcResponse) {
        if !response.message.is_empty() {
            println!("{}", response.message);
        }

        let Some(data) = &response.data else {
            return;
        };

        match request {
            IpcRequest::Timer { .. } => println!("{}", Self::render_timer(&data.timer)),
            IpcRequest::Stopwatch { .. } => {
                println!("{}", Self::render_stopwatch(&data.stopwatch))
            }
            IpcRequest::Pomodoro { .. } => println!("{}", Self::render_pomodoro(&data.pomodoro)),
            IpcRequest::Status => Self::show_status(data),
        }
    }

    /// Shows the state of all tools.
    pub fn show_status(data: &ToolsSnapshot) {
        println!("Polar Clock status");
        println!("─────────────────────────────");
        println!("{}", Self::render_timer(&data.timer));
        println!("{}", Self::render_pomodoro(&data.pomodoro));
        println!("{}", Self::render_stopwatch(&data.stopwatch));
    }

    /// Shows an error message.
    pub fn show_error(message: &str) {
        eprintln!("Error: {}", message);
    }

    /// Renders the countdown timer as one line.
    pub fn render_timer(timer: &CountdownSnapshot) -> String {
        let mut line = format!(
            "Timer     {}  {}",
            Self::format_clock(timer.remaining_seconds),
            Self::run_state(timer.is_running)
        );
        if timer.is_interval {
            line.push_str(&format!("  interval (cycles: {})", timer.completed_cycles));
        }
        Self::push_flags(&mut line, timer.alarm_playing, timer.is_muted, timer.is_snoozing);
        line
    }

    /// Renders the Pomodoro cycle as two lines.
    pub fn render_pomodoro(pomodoro: &PomodoroSnapshot) -> String {
        let mut line = format!(
            "Pomodoro  {}  {}  {} (cycles: {})",
            Self::format_clock(pomodoro.remaining_seconds),
            Self::run_state(pomodoro.is_running),
            Self::phase_label(pomodoro),
            pomodoro.cycles
        );
        Self::push_flags(
            &mut line,
            pomodoro.alarm_playing,
            pomodoro.is_muted,
            pomodoro.is_snoozing,
        );
        line.push_str(&format!(
            "\n          work {}m / short {}m / long {}m{}",
            pomodoro.work_duration,
            pomodoro.short_break_duration,
            pomodoro.long_break_duration,
            if pomodoro.continuous { " / continuous" } else { "" }
        ));
        line
    }

    /// Renders the stopwatch with its laps, most recent first.
    ///
    /// Rows are numbered for `stopwatch label`; laps keep their
    /// chronological number.
    pub fn render_stopwatch(stopwatch: &StopwatchSnapshot) -> String {
        let mut text = format!(
            "Stopwatch {}  {}",
            Self::format_lap_time(stopwatch.elapsed_time),
            Self::run_state(stopwatch.is_running)
        );
        let count = stopwatch.laps.len();
        for (row, lap) in stopwatch.laps.iter().rev().enumerate() {
            text.push_str(&format!(
                "\n  {:>3}. Lap {:<3} {}",
                row + 1,
                count - row,
                Self::format_lap_time(lap.time)
            ));
            if !lap.label.is_empty() {
                text.push_str(&format!("  {}", lap.label));
            }
        }
        text
    }

    /// Formats seconds as `HH:MM:SS`, rounding partial seconds up.
    pub fn format_clock(seconds: f64) -> String {
        Components::from_seconds(seconds).to_clock()
    }

    /// Formats milliseconds as `MM:SS.mmm`. Minutes keep counting past 59.
    pub fn format_lap_time(ms: f64) -> String {
        let total = if ms.is_finite() && ms > 0.0 {
            ms.floor() as u64
        } else {
            0
        };
        format!(
            "{:02}:{:02}.{:03}",
            total / 60_000,
            (total % 60_000) / 1000,
            total % 1000
        )
    }

    fn run_state(is_running: bool) -> &'static str {
        if is_running {
            "running"
        } else {
            "paused"
        }
    }

    fn phase_label(pomodoro: &PomodoroSnapshot) -> &'static str {
        match pomodoro.phase {
            PomodoroPhase::Work => "work",
            PomodoroPhase::ShortBreak => "short break",
            PomodoroPhase::LongBreak => "long break",
        }
    }

    fn push_flags(line: &mut String, alarm: bool, muted: bool, snoozing: bool) {
        if alarm {
            line.push_str("  [ALARM]");
        }
        if muted {
            line.push_str("  [muted]");
        }
        if snoozing {
            line.push_str("  [snoozed]");
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
