//! Stopwatch with laps and catch-up time.
//!
//! Elapsed time is derived from a wall-clock anchor (`start_time`) rather
//! than summed deltas, so irregular ticks never drift. All times are in
//! milliseconds.

use tracing::debug;

use crate::types::{Lap, Machine, PersistedStopwatch, StopwatchSnapshot};

use super::signal::{Signals, ToolEvent};

/// Maps a display index (most recent first) to a storage index.
pub fn display_to_storage(len: usize, display_index: usize) -> Option<usize> {
    (display_index < len).then(|| len - 1 - display_index)
}

// ============================================================================
// Stopwatch
// ============================================================================

/// Open-ended elapsed-time accumulator.
#[derive(Debug)]
pub struct Stopwatch {
    /// Wall-clock anchor: `elapsed_time == now - start_time` while running
    start_time: f64,
    elapsed_time: f64,
    is_running: bool,
    /// Chronological order
    laps: Vec<Lap>,
    signals: Signals,
}

impl Default for Stopwatch {
    fn default() -> Self {
        Self::new()
    }
}

impl Stopwatch {
    pub fn new() -> Self {
        Self {
            start_time: 0.0,
            elapsed_time: 0.0,
            is_running: false,
            laps: Vec::new(),
            signals: Signals::new(Machine::Stopwatch),
        }
    }

    /// Restores persisted fields. The restored stopwatch is never running.
    pub fn restore(&mut self, persisted: &PersistedStopwatch) {
        self.elapsed_time = if persisted.elapsed_time.is_finite() {
            persisted.elapsed_time.max(0.0)
        } else {
            0.0
        };
        self.laps = persisted.laps.clone();
        self.is_running = false;
    }

    pub fn start(&mut self, now_ms: f64) {
        if self.is_running {
            return;
        }
        self.is_running = true;
        self.start_time = now_ms - self.elapsed_time;
    }

    /// Freezes the elapsed time at `now_ms`.
    pub fn pause(&mut self, now_ms: f64) {
        if !self.is_running {
            return;
        }
        self.tick(now_ms);
        self.is_running = false;
        self.signals.state_changed();
    }

    pub fn toggle(&mut self, now_ms: f64) {
        if self.is_running {
            self.pause(now_ms);
        } else {
            self.start(now_ms);
        }
    }

    pub fn reset(&mut self) {
        self.is_running = false;
        self.elapsed_time = 0.0;
        self.start_time = 0.0;
        self.laps.clear();
        self.signals.state_changed();
    }

    pub fn tick(&mut self, now_ms: f64) {
        if self.is_running {
            self.elapsed_time = (now_ms - self.start_time).max(0.0);
        }
    }

    /// Records a lap at the current elapsed time.
    ///
    /// Returns `false` for a stopwatch that never started.
    pub fn lap(&mut self) -> bool {
        if !self.is_running && self.elapsed_time == 0.0 {
            debug!("Stopwatch never started, ignoring lap");
            return false;
        }
        self.laps.push(Lap::at(self.elapsed_time));
        self.signals.state_changed();
        true
    }

    /// Sets the label of the lap at `index` (chronological order).
    pub fn set_lap_label(&mut self, index: usize, text: &str) -> bool {
        match self.laps.get_mut(index) {
            Some(lap) => {
                lap.label = text.to_string();
                self.signals.state_changed();
                true
            }
            None => {
                debug!("No lap at index {}, ignoring label", index);
                false
            }
        }
    }

    /// Sets the label of the lap at `display_index` (most recent first).
    pub fn set_lap_label_by_display(&mut self, display_index: usize, text: &str) -> bool {
        match display_to_storage(self.laps.len(), display_index) {
            Some(index) => self.set_lap_label(index, text),
            None => {
                debug!("No lap at display index {}, ignoring label", display_index);
                false
            }
        }
    }

    /// Adds `ms` to the elapsed time. Rejects non-finite and non-positive values.
    pub fn add_catch_up(&mut self, ms: f64) -> bool {
        if !(ms.is_finite() && ms > 0.0) {
            debug!("Invalid catch-up time {}, ignoring", ms);
            return false;
        }
        self.elapsed_time += ms;
        if self.is_running {
            self.start_time -= ms;
        }
        self.signals.state_changed();
        true
    }

    pub fn laps(&self) -> &[Lap] {
        &self.laps
    }

    pub fn laps_most_recent_first(&self) -> impl Iterator<Item = &Lap> {
        self.laps.iter().rev()
    }

    pub fn elapsed_time(&self) -> f64 {
        self.elapsed_time
    }

    pub fn is_running(&self) -> bool {
        self.is_running
    }

    pub fn snapshot(&self) -> StopwatchSnapshot {
        StopwatchSnapshot {
            elapsed_time: self.elapsed_time,
            is_running: self.is_running,
            laps: self.laps.clone(),
        }
    }

    pub(crate) fn drain_events(&mut self) -> Vec<ToolEvent> {
        self.signals.drain()
    }
}

// ============================================================================
// Tests
// ============================================================================
