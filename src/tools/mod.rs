//! Tool state machines: countdown timer, stopwatch and Pomodoro cycle.
//!
//! `Tools` owns the three machines. A tick driver calls `update` with the
//! wall-clock time elapsed since the previous call, user actions call the
//! `timer_*`, `stopwatch_*` and `pomodoro_*` methods, and collaborators
//! read owned snapshots through `get_state`. Events produced by the
//! machines are forwarded over an unbounded channel after each call.

pub mod clock;
pub mod countdown;
pub mod pomodoro;
pub mod signal;
pub mod stopwatch;

use tokio::sync::mpsc;
use tracing::debug;

use crate::settings::Settings;
use crate::types::{
    PersistedTools, PomodoroAction, PomodoroInput, StopwatchAction, TimerAction, ToolsSnapshot,
};

pub use clock::{Clock, ManualClock, SystemClock};
pub use countdown::{Components, CountdownTimer};
pub use pomodoro::{PomodoroCycle, CYCLES_PER_LONG_BREAK};
pub use signal::{CueKind, ToolEvent};
pub use stopwatch::Stopwatch;

// ============================================================================
// Tools
// ============================================================================

/// Facade over the three tool machines.
pub struct Tools {
    timer: CountdownTimer,
    stopwatch: Stopwatch,
    pomodoro: PomodoroCycle,
    clock: Box<dyn Clock>,
    event_tx: mpsc::UnboundedSender<ToolEvent>,
}

impl Tools {
    /// Builds the machines from settings and an optional persisted document.
    ///
    /// Restored machines are never running and never alarming.
    pub fn init(
        settings: &Settings,
        initial_state: Option<&PersistedTools>,
        clock: Box<dyn Clock>,
        event_tx: mpsc::UnboundedSender<ToolEvent>,
    ) -> Self {
        let mut tools = Self {
            timer: CountdownTimer::new(settings),
            stopwatch: Stopwatch::new(),
            pomodoro: PomodoroCycle::new(settings),
            clock,
            event_tx,
        };

        if let Some(state) = initial_state {
            if let Some(timer) = &state.timer {
                tools.timer.restore(timer);
            }
            if let Some(stopwatch) = &state.stopwatch {
                tools.stopwatch.restore(stopwatch);
            }
            if let Some(pomodoro) = &state.pomodoro {
                tools.pomodoro.restore(pomodoro);
            }
            debug!("Restored tool state (version {})", state.version);
        }

        tools
    }

    /// Advances all machines by one frame.
    ///
    /// Negative or non-finite deltas are treated as zero.
    pub fn update(&mut self, delta_seconds: f64) {
        let delta = if delta_seconds.is_finite() && delta_seconds > 0.0 {
            delta_seconds
        } else {
            0.0
        };
        let now = self.clock.now_ms();

        self.timer.tick(delta);
        self.stopwatch.tick(now);
        self.pomodoro.tick(delta);
        self.flush();
    }

    /// Returns an owned snapshot of all machines.
    pub fn get_state(&self) -> ToolsSnapshot {
        ToolsSnapshot {
            timer: self.timer.snapshot(),
            pomodoro: self.pomodoro.snapshot(),
            stopwatch: self.stopwatch.snapshot(),
        }
    }

    /// Returns the document to persist.
    pub fn persisted(&self) -> PersistedTools {
        self.get_state().to_persisted()
    }

    /// Remaining countdown time split for display.
    pub fn timer_components(&self) -> Components {
        self.timer.components()
    }

    // ------------------------------------------------------------------------
    // Countdown timer
    // ------------------------------------------------------------------------

    pub fn timer_configure(&mut self, hours: u32, minutes: u32, seconds: u32) {
        self.timer.configure(hours, minutes, seconds);
        self.flush();
    }

    pub fn timer_start(&mut self) {
        self.timer.start();
        self.flush();
    }

    pub fn timer_pause(&mut self) {
        self.timer.pause();
        self.flush();
    }

    pub fn timer_toggle(&mut self) {
        self.timer.toggle();
        self.flush();
    }

    pub fn timer_reset(&mut self) {
        self.timer.reset();
        self.flush();
    }

    pub fn timer_mute(&mut self) {
        self.timer.mute();
        self.flush();
    }

    pub fn timer_snooze(&mut self) {
        self.timer.snooze();
        self.flush();
    }

    pub fn timer_stop_alarm(&mut self) {
        self.timer.stop_alarm();
        self.flush();
    }

    pub fn timer_restart(&mut self) {
        self.timer.restart();
        self.flush();
    }

    pub fn timer_set_interval(&mut self, enabled: bool) {
        self.timer.set_interval(enabled);
        self.flush();
    }

    // ------------------------------------------------------------------------
    // Stopwatch
    // ------------------------------------------------------------------------

    pub fn stopwatch_start(&mut self) {
        let now = self.clock.now_ms();
        self.stopwatch.start(now);
        self.flush();
    }

    pub fn stopwatch_pause(&mut self) {
        let now = self.clock.now_ms();
        self.stopwatch.pause(now);
        self.flush();
    }

    pub fn stopwatch_toggle(&mut self) {
        let now = self.clock.now_ms();
        self.stopwatch.toggle(now);
        self.flush();
    }

    pub fn stopwatch_reset(&mut self) {
        self.stopwatch.reset();
        self.flush();
    }

    /// Records a lap at the current time. Returns `false` if ignored.
    pub fn stopwatch_lap(&mut self) -> bool {
        let now = self.clock.now_ms();
        self.stopwatch.tick(now);
        let recorded = self.stopwatch.lap();
        self.flush();
        recorded
    }

    /// Labels a lap by chronological index. Returns `false` if out of range.
    pub fn stopwatch_set_lap_label(&mut self, index: usize, text: &str) -> bool {
        let labeled = self.stopwatch.set_lap_label(index, text);
        self.flush();
        labeled
    }

    /// Labels a lap by display index (0 = most recent).
    pub fn stopwatch_set_lap_label_by_display(&mut self, display_index: usize, text: &str) -> bool {
        let labeled = self.stopwatch.set_lap_label_by_display(display_index, text);
        self.flush();
        labeled
    }

    /// Adds catch-up time in milliseconds. Returns `false` if ignored.
    pub fn stopwatch_add_catch_up(&mut self, ms: f64) -> bool {
        let now = self.clock.now_ms();
        self.stopwatch.tick(now);
        let added = self.stopwatch.add_catch_up(ms);
        self.flush();
        added
    }

    // ------------------------------------------------------------------------
    // Pomodoro
    // ------------------------------------------------------------------------

    pub fn pomodoro_start(&mut self) {
        self.pomodoro.start();
        self.flush();
    }

    pub fn pomodoro_pause(&mut self) {
        self.pomodoro.pause();
        self.flush();
    }

    pub fn pomodoro_reset(&mut self) {
        self.pomodoro.reset();
        self.flush();
    }

    pub fn pomodoro_mute(&mut self) {
        self.pomodoro.mute();
        self.flush();
    }

    pub fn pomodoro_snooze(&mut self) {
        self.pomodoro.snooze();
        self.flush();
    }

    pub fn pomodoro_end_cycle(&mut self) {
        self.pomodoro.end_cycle();
        self.flush();
    }

    pub fn pomodoro_set_work_duration(&mut self, minutes: f64) -> bool {
        let applied = self.pomodoro.set_work_duration(minutes);
        self.flush();
        applied
    }

    pub fn pomodoro_set_short_break_duration(&mut self, minutes: f64) -> bool {
        let applied = self.pomodoro.set_short_break_duration(minutes);
        self.flush();
        applied
    }

    pub fn pomodoro_set_long_break_duration(&mut self, minutes: f64) -> bool {
        let applied = self.pomodoro.set_long_break_duration(minutes);
        self.flush();
        applied
    }

    pub fn pomodoro_set_continuous(&mut self, continuous: bool) {
        self.pomodoro.set_continuous(continuous);
        self.flush();
    }

    pub fn pomodoro_apply_input(&mut self, input: &PomodoroInput) {
        self.pomodoro.apply_input(input);
        self.flush();
    }

    /// Whether duration changes wait for the next Pomodoro reset.
    pub fn pomodoro_has_pending_config(&self) -> bool {
        self.pomodoro.has_pending_config()
    }

    // ------------------------------------------------------------------------
    // Actions
    // ------------------------------------------------------------------------

    /// Applies a countdown action and returns a short description.
    pub fn apply_timer_action(&mut self, action: &TimerAction) -> String {
        match action {
            TimerAction::Configure {
                hours,
                minutes,
                seconds,
            } => {
                let was_running = self.timer.is_running();
                self.timer_configure(*hours, *minutes, *seconds);
                if was_running {
                    "Timer is running; pause it before changing the duration".to_string()
                } else {
                    let total = Components::from_seconds(self.timer.snapshot().total_seconds);
                    format!("Timer set to {}", total.to_clock())
                }
            }
            TimerAction::Start => {
                self.timer_start();
                if self.timer.is_running() {
                    "Timer started".to_string()
                } else {
                    "Timer has no duration".to_string()
                }
            }
            TimerAction::Pause => {
                self.timer_pause();
                "Timer paused".to_string()
            }
            TimerAction::Toggle => {
                self.timer_toggle();
                if self.timer.is_running() {
                    "Timer running".to_string()
                } else {
                    "Timer stopped".to_string()
                }
            }
            TimerAction::Reset => {
                self.timer_reset();
                "Timer reset".to_string()
            }
            TimerAction::Snooze => {
                self.timer_snooze();
                "Timer snoozed".to_string()
            }
            TimerAction::Mute => {
                self.timer_mute();
                if self.timer.snapshot().is_muted {
                    "Timer muted".to_string()
                } else {
                    "Timer unmuted".to_string()
                }
            }
            TimerAction::StopAlarm => {
                self.timer_stop_alarm();
                "Timer alarm stopped".to_string()
            }
            TimerAction::Restart => {
                self.timer_restart();
                "Timer restarted".to_string()
            }
            TimerAction::Interval { enabled } => {
                self.timer_set_interval(*enabled);
                if *enabled {
                    "Interval mode on".to_string()
                } else {
                    "Interval mode off".to_string()
                }
            }
        }
    }

    /// Applies a stopwatch action and returns a short description.
    pub fn apply_stopwatch_action(&mut self, action: &StopwatchAction) -> String {
        match action {
            StopwatchAction::Start => {
                self.stopwatch_start();
                "Stopwatch started".to_string()
            }
            StopwatchAction::Pause => {
                self.stopwatch_pause();
                "Stopwatch paused".to_string()
            }
            StopwatchAction::Toggle => {
                self.stopwatch_toggle();
                if self.stopwatch.is_running() {
                    "Stopwatch running".to_string()
                } else {
                    "Stopwatch paused".to_string()
                }
            }
            StopwatchAction::Reset => {
                self.stopwatch_reset();
                "Stopwatch reset".to_string()
            }
            StopwatchAction::Lap => {
                if self.stopwatch_lap() {
                    format!("Lap {} recorded", self.stopwatch.laps().len())
                } else {
                    "Stopwatch has not started".to_string()
                }
            }
            StopwatchAction::Label {
                display_index,
                text,
            } => {
                if self.stopwatch_set_lap_label_by_display(*display_index, text) {
                    "Lap labeled".to_string()
                } else {
                    format!("No lap at position {}", display_index)
                }
            }
            StopwatchAction::CatchUp { minutes, seconds } => {
                let ms = (f64::from(*minutes) * 60.0 + f64::from(*seconds)) * 1000.0;
                if self.stopwatch_add_catch_up(ms) {
                    format!("Added {}m {}s", minutes, seconds)
                } else {
                    "Catch-up time must be positive".to_string()
                }
            }
        }
    }

    /// Applies a Pomodoro action and returns a short description.
    pub fn apply_pomodoro_action(&mut self, action: &PomodoroAction) -> String {
        match action {
            PomodoroAction::Start => {
                self.pomodoro_start();
                if self.pomodoro.is_running() {
                    format!("Pomodoro running ({})", self.pomodoro.phase().as_str())
                } else {
                    "Pomodoro paused".to_string()
                }
            }
            PomodoroAction::Pause => {
                self.pomodoro_pause();
                "Pomodoro paused".to_string()
            }
            PomodoroAction::Reset => {
                self.pomodoro_reset();
                "Pomodoro reset".to_string()
            }
            PomodoroAction::Snooze => {
                self.pomodoro_snooze();
                "Pomodoro snoozed".to_string()
            }
            PomodoroAction::Mute => {
                self.pomodoro_mute();
                if self.pomodoro.snapshot().is_muted {
                    "Pomodoro muted".to_string()
                } else {
                    "Pomodoro unmuted".to_string()
                }
            }
            PomodoroAction::Next => {
                self.pomodoro_end_cycle();
                format!("Pomodoro moved to {}", self.pomodoro.phase().as_str())
            }
            PomodoroAction::Configure { input } => {
                self.pomodoro_apply_input(input);
                if self.pomodoro.has_pending_config() {
                    "Pomodoro settings saved; durations apply after reset".to_string()
                } else {
                    "Pomodoro settings updated".to_string()
                }
            }
        }
    }

    /// Forwards pending machine events to the channel.
    fn flush(&mut self) {
        let events = self
            .timer
            .drain_events()
            .into_iter()
            .chain(self.stopwatch.drain_events())
            .chain(self.pomodoro.drain_events());

        for event in events {
            if self.event_tx.send(event).is_err() {
                debug!("Tool event receiver dropped");
                break;
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
