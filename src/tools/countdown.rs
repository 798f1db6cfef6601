//! Countdown timer with optional interval repeat.
//!
//! The timer counts `remaining_seconds` down to zero. In interval mode it
//! reloads `total_seconds` and keeps running; otherwise it stops and raises
//! an alarm that stays up until acknowledged by `stop_alarm`, `snooze`,
//! `restart` or `reset`.

use tracing::debug;

use crate::settings::Settings;
use crate::types::{CountdownSnapshot, Machine, PersistedCountdown};

use super::signal::{CueKind, Signals, ToolEvent};

/// Sound and threshold settings used by the countdown.
#[derive(Debug, Clone)]
struct CountdownCues {
    alarm_sound: String,
    ending_sound: String,
    ending_threshold: f64,
    snooze_seconds: f64,
}

impl CountdownCues {
    fn from_settings(settings: &Settings) -> Self {
        Self {
            alarm_sound: settings.alarm_sound.clone(),
            ending_sound: settings.countdown_ending_sound.clone(),
            ending_threshold: settings.ending_cue_seconds,
            snooze_seconds: settings.snooze_seconds,
        }
    }
}

/// Remaining time split for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Components {
    pub days: u64,
    pub hours: u64,
    pub minutes: u64,
    pub seconds: u64,
}

impl Components {
    /// Splits `seconds`, rounding a partial second up. Negative and NaN are zero.
    pub fn from_seconds(seconds: f64) -> Self {
        let total = if seconds.is_finite() && seconds > 0.0 {
            seconds.ceil() as u64
        } else {
            0
        };
        Self {
            days: total / 86_400,
            hours: total % 86_400 / 3600,
            minutes: total % 3600 / 60,
            seconds: total % 60,
        }
    }

    /// Hours including whole days.
    pub fn total_hours(&self) -> u64 {
        self.days * 24 + self.hours
    }

    /// Formats as `HH:MM:SS`, with hours counting past 23.
    pub fn to_clock(&self) -> String {
        format!(
            "{:02}:{:02}:{:02}",
            self.total_hours(),
            self.minutes,
            self.seconds
        )
    }
}

// ============================================================================
// CountdownTimer
// ============================================================================

/// Single-phase countdown timer.
#[derive(Debug)]
pub struct CountdownTimer {
    total_seconds: f64,
    remaining_seconds: f64,
    /// Last configured duration, reloaded by `start` at zero
    configured_seconds: f64,
    is_running: bool,
    is_interval: bool,
    alarm_playing: bool,
    is_muted: bool,
    is_snoozing: bool,
    completed_cycles: u32,
    alarm_sounded: bool,
    ending_cue_played: bool,
    cues: CountdownCues,
    signals: Signals,
}

impl CountdownTimer {
    /// Creates an empty timer (`total_seconds == 0`).
    pub fn new(settings: &Settings) -> Self {
        Self {
            total_seconds: 0.0,
            remaining_seconds: 0.0,
            configured_seconds: 0.0,
            is_running: false,
            is_interval: false,
            alarm_playing: false,
            is_muted: false,
            is_snoozing: false,
            completed_cycles: 0,
            alarm_sounded: false,
            ending_cue_played: false,
            cues: CountdownCues::from_settings(settings),
            signals: Signals::new(Machine::Timer),
        }
    }

    /// Restores persisted fields. The restored timer is never running.
    pub fn restore(&mut self, persisted: &PersistedCountdown) {
        let total = if persisted.total_seconds.is_finite() {
            persisted.total_seconds.max(0.0)
        } else {
            0.0
        };
        // A snoozed timer keeps more than its total.
        let remaining = if total <= 0.0 {
            0.0
        } else if persisted.remaining_seconds.is_finite() {
            persisted.remaining_seconds.max(0.0)
        } else {
            total
        };

        self.total_seconds = total;
        self.configured_seconds = total;
        self.remaining_seconds = remaining;
        self.is_interval = persisted.is_interval;
        self.is_running = false;
        self.alarm_playing = false;
        self.is_snoozing = false;
        self.ending_cue_played = remaining <= self.cues.ending_threshold;
    }

    /// Sets the duration from components. Ignored while running.
    pub fn configure(&mut self, hours: u32, minutes: u32, seconds: u32) {
        if self.is_running {
            debug!("Timer is running, ignoring configure");
            return;
        }
        if self.alarm_playing || self.is_snoozing {
            self.acknowledge();
        }

        let total = u64::from(hours) * 3600 + u64::from(minutes) * 60 + u64::from(seconds);
        let total = total as f64;
        self.configured_seconds = total;
        self.total_seconds = total;
        self.remaining_seconds = total;
        self.completed_cycles = 0;
        self.signals.state_changed();
    }

    /// Starts counting down. No-op when already running or nothing is configured.
    pub fn start(&mut self) {
        if self.is_running {
            return;
        }
        if self.alarm_playing || self.is_snoozing {
            self.acknowledge();
        }
        if self.remaining_seconds <= 0.0 {
            self.total_seconds = self.configured_seconds;
            self.remaining_seconds = self.total_seconds;
            self.completed_cycles = 0;
        }
        if self.total_seconds <= 0.0 || self.remaining_seconds <= 0.0 {
            debug!("Timer has no duration, ignoring start");
            return;
        }

        if self.remaining_seconds > self.cues.ending_threshold {
            self.ending_cue_played = false;
        }
        self.alarm_sounded = false;
        self.is_running = true;
    }

    pub fn pause(&mut self) {
        self.is_running = false;
    }

    /// Alarm sounding acknowledges it, running pauses, otherwise starts.
    pub fn toggle(&mut self) {
        if self.alarm_playing {
            self.stop_alarm();
        } else if self.is_running {
            self.pause();
        } else {
            self.start();
        }
    }

    /// Clears the configuration and every flag.
    pub fn reset(&mut self) {
        self.signals.stop_cue();
        if self.is_muted {
            self.signals.mute_changed(false);
        }
        self.is_running = false;
        self.total_seconds = 0.0;
        self.remaining_seconds = 0.0;
        self.configured_seconds = 0.0;
        self.alarm_playing = false;
        self.is_muted = false;
        self.is_snoozing = false;
        self.completed_cycles = 0;
        self.alarm_sounded = false;
        self.ending_cue_played = false;
        self.signals.state_changed();
    }

    /// Advances the timer by `delta_seconds`.
    pub fn tick(&mut self, delta_seconds: f64) {
        if !self.is_running {
            return;
        }

        let previous = self.remaining_seconds;
        self.remaining_seconds -= delta_seconds;

        let threshold = self.cues.ending_threshold;
        if !self.ending_cue_played
            && previous > threshold
            && self.remaining_seconds <= threshold
            && self.remaining_seconds > 0.0
        {
            self.ending_cue_played = true;
            let sound = self.cues.ending_sound.clone();
            self.signals
                .play_cue(CueKind::EndingSoon, &sound, self.is_muted);
        }

        if self.remaining_seconds > 0.0 {
            return;
        }

        if self.is_interval && self.total_seconds > 0.0 {
            while self.remaining_seconds <= 0.0 {
                self.remaining_seconds += self.total_seconds;
                self.completed_cycles += 1;
            }
            self.ending_cue_played = self.remaining_seconds <= threshold;
            debug!("Interval timer repeated ({} cycles)", self.completed_cycles);
            let sound = self.cues.alarm_sound.clone();
            self.signals
                .play_cue(CueKind::IntervalRepeat, &sound, self.is_muted);
            return;
        }

        self.is_running = false;
        self.remaining_seconds = 0.0;
        self.alarm_playing = true;
        if !self.alarm_sounded {
            self.alarm_sounded = true;
            let sound = self.cues.alarm_sound.clone();
            self.signals.play_cue(CueKind::Alarm, &sound, self.is_muted);
            self.signals.alarm_raised();
        }
    }

    pub fn mute(&mut self) {
        self.is_muted = !self.is_muted;
        self.signals.mute_changed(self.is_muted);
    }

    /// Grants the snooze extension and resumes running.
    pub fn snooze(&mut self) {
        if self.total_seconds <= 0.0 {
            debug!("Timer has no duration, ignoring snooze");
            return;
        }

        self.signals.stop_cue();
        self.remaining_seconds = self.remaining_seconds.max(0.0) + self.cues.snooze_seconds;
        self.is_snoozing = true;
        self.alarm_playing = false;
        self.alarm_sounded = false;
        self.ending_cue_played = self.remaining_seconds <= self.cues.ending_threshold;
        self.is_running = true;
        self.signals.state_changed();
    }

    /// Acknowledges the alarm. The configuration is kept.
    pub fn stop_alarm(&mut self) {
        self.acknowledge();
    }

    /// Reloads the full duration and runs again.
    pub fn restart(&mut self) {
        if self.configured_seconds <= 0.0 && self.total_seconds <= 0.0 {
            debug!("Timer has no duration, ignoring restart");
            return;
        }

        self.acknowledge();
        if self.total_seconds <= 0.0 {
            self.total_seconds = self.configured_seconds;
        }
        if self.is_muted {
            self.is_muted = false;
            self.signals.mute_changed(false);
        }
        self.remaining_seconds = self.total_seconds;
        self.completed_cycles = 0;
        self.alarm_sounded = false;
        self.ending_cue_played = self.remaining_seconds <= self.cues.ending_threshold;
        self.is_running = true;
        self.signals.state_changed();
    }

    pub fn set_interval(&mut self, enabled: bool) {
        if self.is_interval != enabled {
            self.is_interval = enabled;
            self.signals.state_changed();
        }
    }

    fn acknowledge(&mut self) {
        self.signals.stop_cue();
        self.alarm_playing = false;
        self.is_snoozing = false;
    }

    /// Splits the remaining time into days, hours, minutes and seconds.
    pub fn components(&self) -> Components {
        Components::from_seconds(self.remaining_seconds)
    }

    pub fn is_running(&self) -> bool {
        self.is_running
    }

    pub fn alarm_playing(&self) -> bool {
        self.alarm_playing
    }

    pub fn remaining_seconds(&self) -> f64 {
        self.remaining_seconds
    }

    pub fn snapshot(&self) -> CountdownSnapshot {
        CountdownSnapshot {
            total_seconds: self.total_seconds,
            remaining_seconds: self.remaining_seconds,
            is_running: self.is_running,
            is_interval: self.is_interval,
            alarm_playing: self.alarm_playing,
            is_muted: self.is_muted,
            is_snoozing: self.is_snoozing,
            completed_cycles: self.completed_cycles,
        }
    }

    pub(crate) fn drain_events(&mut self) -> Vec<ToolEvent> {
        self.signals.drain()
    }
}

// ============================================================================
// Tests
// ============================================================================
