//! Pomodoro cycle.
//!
//! Phases advance `work → short break → work → ... → long break` with a
//! long break after every fourth completed work phase. When a phase elapses
//! the cycle either raises an alarm and waits for acknowledgement, or, in
//! continuous mode, moves on by itself.

use tracing::{debug, info};

use crate::settings::{parse_minutes, PhaseSounds, Settings};
use crate::types::{
    is_valid_minutes, Machine, PersistedPomodoro, PomodoroConfig, PomodoroInput, PomodoroPhase,
    PomodoroSnapshot,
};

use super::signal::{CueKind, Signals, ToolEvent};

/// Completed work phases between long breaks.
pub const CYCLES_PER_LONG_BREAK: u32 = 4;

/// Sound and threshold settings used by the cycle.
#[derive(Debug, Clone)]
struct PomodoroCues {
    alarm_sound: String,
    phase_sounds: PhaseSounds,
    last_minute_threshold: f64,
    ending_threshold: f64,
    snooze_seconds: f64,
}

impl PomodoroCues {
    fn from_settings(settings: &Settings) -> Self {
        Self {
            alarm_sound: settings.alarm_sound.clone(),
            phase_sounds: settings.phase_end_sounds.clone(),
            last_minute_threshold: settings.last_minute_seconds,
            ending_threshold: settings.ending_cue_seconds,
            snooze_seconds: settings.snooze_seconds,
        }
    }
}

/// Returns the phase following `phase` given the updated cycle count.
fn next_phase(phase: PomodoroPhase, cycles: u32) -> PomodoroPhase {
    match phase {
        PomodoroPhase::Work if cycles % CYCLES_PER_LONG_BREAK == 0 => PomodoroPhase::LongBreak,
        PomodoroPhase::Work => PomodoroPhase::ShortBreak,
        PomodoroPhase::ShortBreak | PomodoroPhase::LongBreak => PomodoroPhase::Work,
    }
}

// ============================================================================
// PomodoroCycle
// ============================================================================

/// Multi-phase duration sequencer.
#[derive(Debug)]
pub struct PomodoroCycle {
    phase: PomodoroPhase,
    remaining_seconds: f64,
    /// Completed work phases
    cycles: u32,
    is_running: bool,
    alarm_playing: bool,
    is_muted: bool,
    is_snoozing: bool,
    has_started: bool,
    config: PomodoroConfig,
    /// Durations changed while started, applied on `reset`
    pending: Option<PomodoroConfig>,
    last_minute_played: bool,
    ending_cue_played: bool,
    cues: PomodoroCues,
    signals: Signals,
}

impl PomodoroCycle {
    /// Creates a cycle at the start of a work phase.
    pub fn new(settings: &Settings) -> Self {
        let config = settings.pomodoro.clone();
        Self {
            phase: PomodoroPhase::Work,
            remaining_seconds: config.phase_seconds(PomodoroPhase::Work),
            cycles: 0,
            is_running: false,
            alarm_playing: false,
            is_muted: false,
            is_snoozing: false,
            has_started: false,
            config,
            pending: None,
            last_minute_played: false,
            ending_cue_played: false,
            cues: PomodoroCues::from_settings(settings),
            signals: Signals::new(Machine::Pomodoro),
        }
    }

    /// Restores persisted fields. The restored cycle is neither running nor alarming.
    pub fn restore(&mut self, persisted: &PersistedPomodoro) {
        let valid = |value: Option<f64>, fallback: f64| {
            value.filter(|minutes| is_valid_minutes(*minutes)).unwrap_or(fallback)
        };
        self.config = PomodoroConfig {
            work_minutes: valid(persisted.work_duration, self.config.work_minutes),
            short_break_minutes: valid(
                persisted.short_break_duration,
                self.config.short_break_minutes,
            ),
            long_break_minutes: valid(persisted.long_break_duration, self.config.long_break_minutes),
            continuous: persisted.continuous,
        };
        self.phase = persisted.phase;
        self.cycles = persisted.cycles;

        let full = self.config.phase_seconds(self.phase);
        self.remaining_seconds = persisted
            .remaining_seconds
            .filter(|seconds| seconds.is_finite())
            .map_or(full, |seconds| seconds.max(0.0));

        self.is_running = false;
        self.alarm_playing = false;
        self.is_snoozing = false;
        self.has_started = false;
        self.pending = None;
        self.last_minute_played = self.remaining_seconds <= self.cues.last_minute_threshold;
        self.ending_cue_played = self.remaining_seconds <= self.cues.ending_threshold;
    }

    /// Toggles running, or acknowledges and advances while the alarm sounds.
    pub fn start(&mut self) {
        if self.alarm_playing {
            self.end_cycle();
            return;
        }

        self.is_running = !self.is_running;
        if self.is_running {
            self.has_started = true;
            if self.remaining_seconds <= 0.0 {
                self.start_next_phase(false);
            }
        }
    }

    pub fn pause(&mut self) {
        self.is_running = false;
    }

    /// Returns to the start of a work phase and applies deferred configuration.
    pub fn reset(&mut self) {
        if let Some(pending) = self.pending.take() {
            debug!("Applying deferred Pomodoro configuration");
            self.config = PomodoroConfig {
                continuous: self.config.continuous,
                ..pending
            };
        }

        self.signals.stop_cue();
        if self.is_muted {
            self.signals.mute_changed(false);
        }
        self.phase = PomodoroPhase::Work;
        self.cycles = 0;
        self.remaining_seconds = self.config.phase_seconds(PomodoroPhase::Work);
        self.is_running = false;
        self.alarm_playing = false;
        self.is_muted = false;
        self.is_snoozing = false;
        self.has_started = false;
        self.last_minute_played = false;
        self.ending_cue_played = false;
        self.signals.state_changed();
    }

    /// Advances the current phase by `delta_seconds`.
    pub fn tick(&mut self, delta_seconds: f64) {
        if !self.is_running || self.alarm_playing {
            return;
        }

        let previous = self.remaining_seconds;
        self.remaining_seconds -= delta_seconds;

        let ending = self.cues.ending_threshold;
        if !self.ending_cue_played
            && previous > ending
            && self.remaining_seconds <= ending
            && self.remaining_seconds > 0.0
        {
            self.ending_cue_played = true;
            let sound = self.cues.phase_sounds.for_phase(self.phase).to_string();
            self.signals
                .play_cue(CueKind::EndingSoon, &sound, self.is_muted);
        }

        if !self.last_minute_played
            && self.remaining_seconds >= 0.0
            && self.remaining_seconds <= self.cues.last_minute_threshold
        {
            self.last_minute_played = true;
            let sound = self.cues.alarm_sound.clone();
            self.signals
                .play_cue(CueKind::LastMinute, &sound, self.is_muted);
        }

        if self.remaining_seconds > 0.0 {
            return;
        }

        if self.config.continuous {
            self.start_next_phase(true);
        } else {
            info!("Pomodoro {} phase elapsed", self.phase.as_str());
            self.is_running = false;
            self.remaining_seconds = 0.0;
            self.alarm_playing = true;
            let sound = self.cues.alarm_sound.clone();
            self.signals.play_cue(CueKind::Alarm, &sound, self.is_muted);
            self.signals.alarm_raised();
        }
    }

    /// Moves to the next phase, or extends the current one when snoozing.
    fn start_next_phase(&mut self, play_sound: bool) {
        if self.is_snoozing {
            debug!(
                "Snoozed {} phase elapsed, reloading it",
                self.phase.as_str()
            );
        } else {
            if self.phase == PomodoroPhase::Work {
                self.cycles += 1;
            }
            self.phase = next_phase(self.phase, self.cycles);
            info!(
                "Pomodoro entered {} phase (cycles: {})",
                self.phase.as_str(),
                self.cycles
            );
        }

        self.remaining_seconds = self.config.phase_seconds(self.phase);
        self.is_snoozing = false;
        self.last_minute_played = false;
        self.ending_cue_played = false;
        self.signals.stop_cue();
        if play_sound {
            let sound = self.cues.alarm_sound.clone();
            self.signals
                .play_cue(CueKind::PhaseStart, &sound, self.is_muted);
        }
        self.is_running = true;
        self.has_started = true;
        self.signals.push(ToolEvent::PhaseChanged {
            phase: self.phase,
            cycles: self.cycles,
        });
        self.signals.state_changed();
    }

    /// Acknowledges the alarm and forces the next phase.
    pub fn end_cycle(&mut self) {
        self.is_snoozing = false;
        self.alarm_playing = false;
        self.start_next_phase(true);
    }

    pub fn mute(&mut self) {
        self.is_muted = !self.is_muted;
        self.signals.mute_changed(self.is_muted);
    }

    /// Adds the snooze extension to the current phase and keeps it running.
    pub fn snooze(&mut self) {
        self.signals.stop_cue();
        self.remaining_seconds = self.remaining_seconds.max(0.0) + self.cues.snooze_seconds;
        self.is_snoozing = true;
        self.alarm_playing = false;
        self.ending_cue_played = self.remaining_seconds <= self.cues.ending_threshold;
        self.is_running = true;
        self.has_started = true;
        self.signals.state_changed();
    }

    // ------------------------------------------------------------------------
    // Configuration
    // ------------------------------------------------------------------------

    /// Sets the work duration in minutes. Returns `false` for invalid input.
    pub fn set_work_duration(&mut self, minutes: f64) -> bool {
        self.update_config(minutes, |config, minutes| config.work_minutes = minutes)
    }

    /// Sets the short break duration in minutes. Returns `false` for invalid input.
    pub fn set_short_break_duration(&mut self, minutes: f64) -> bool {
        self.update_config(minutes, |config, minutes| {
            config.short_break_minutes = minutes
        })
    }

    /// Sets the long break duration in minutes. Returns `false` for invalid input.
    pub fn set_long_break_duration(&mut self, minutes: f64) -> bool {
        self.update_config(minutes, |config, minutes| {
            config.long_break_minutes = minutes
        })
    }

    /// Sets continuous mode. Takes effect at the next transition.
    pub fn set_continuous(&mut self, continuous: bool) {
        self.config.continuous = continuous;
        if let Some(pending) = self.pending.as_mut() {
            pending.continuous = continuous;
        }
        self.signals.state_changed();
    }

    /// Applies raw user input, keeping the previous value of every invalid field.
    pub fn apply_input(&mut self, input: &PomodoroInput) {
        let fields: [(&Option<String>, fn(&mut Self, f64) -> bool, &str); 3] = [
            (&input.work_minutes, Self::set_work_duration, "work"),
            (
                &input.short_break_minutes,
                Self::set_short_break_duration,
                "short break",
            ),
            (
                &input.long_break_minutes,
                Self::set_long_break_duration,
                "long break",
            ),
        ];
        for (raw, setter, name) in fields {
            let Some(raw) = raw else { continue };
            match parse_minutes(raw) {
                Some(minutes) => {
                    setter(self, minutes);
                }
                None => debug!("Invalid {} duration {:?}, keeping previous value", name, raw),
            }
        }

        if let Some(continuous) = input.continuous {
            self.set_continuous(continuous);
        }
    }

    fn update_config(&mut self, minutes: f64, apply: impl FnOnce(&mut PomodoroConfig, f64)) -> bool {
        if !is_valid_minutes(minutes) {
            debug!("Invalid Pomodoro duration {}, keeping previous value", minutes);
            return false;
        }

        if self.is_running || self.has_started {
            let mut pending = self.pending.take().unwrap_or_else(|| self.config.clone());
            apply(&mut pending, minutes);
            debug!("Pomodoro has started, deferring configuration until reset");
            self.pending = Some(pending);
        } else {
            let previous_full = self.config.phase_seconds(self.phase);
            apply(&mut self.config, minutes);
            // Restored progress in the current phase is kept.
            if self.remaining_seconds == previous_full {
                self.remaining_seconds = self.config.phase_seconds(self.phase);
                self.last_minute_played = false;
                self.ending_cue_played = false;
            }
            self.signals.state_changed();
        }
        true
    }

    // ------------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------------

    pub fn phase(&self) -> PomodoroPhase {
        self.phase
    }

    pub fn cycles(&self) -> u32 {
        self.cycles
    }

    pub fn remaining_seconds(&self) -> f64 {
        self.remaining_seconds
    }

    pub fn is_running(&self) -> bool {
        self.is_running
    }

    pub fn alarm_playing(&self) -> bool {
        self.alarm_playing
    }

    pub fn config(&self) -> &PomodoroConfig {
        &self.config
    }

    pub fn has_pending_config(&self) -> bool {
        self.pending.is_some()
    }

    pub fn snapshot(&self) -> PomodoroSnapshot {
        PomodoroSnapshot {
            phase: self.phase,
            remaining_seconds: self.remaining_seconds,
            cycles: self.cycles,
            is_running: self.is_running,
            alarm_playing: self.alarm_playing,
            is_muted: self.is_muted,
            is_snoozing: self.is_snoozing,
            continuous: self.config.continuous,
            has_started: self.has_started,
            work_duration: self.config.work_minutes,
            short_break_duration: self.config.short_break_minutes,
            long_break_duration: self.config.long_break_minutes,
        }
    }

    pub(crate) fn drain_events(&mut self) -> Vec<ToolEvent> {
        self.signals.drain()
    }
}

// ============================================================================
// Tests
// ============================================================================
