//! Events produced by the tool machines.
//!
//! Machines never touch audio or storage. They push `ToolEvent`s into
//! their own `Signals` outbox, which the `Tools` facade drains after every
//! operation and forwards to collaborators.

use tracing::debug;

use crate::types::{Machine, PomodoroPhase};

// ============================================================================
// CueKind
// ============================================================================

/// Why an audio cue is requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CueKind {
    /// Countdown reached zero or a Pomodoro phase elapsed
    Alarm,
    /// Interval countdown reloaded
    IntervalRepeat,
    /// Remaining time crossed the ending-cue threshold
    EndingSoon,
    /// Pomodoro entered its last minute
    LastMinute,
    /// A Pomodoro phase started
    PhaseStart,
}

// ============================================================================
// ToolEvent
// ============================================================================

/// Events for audio playback, persistence and other integrations.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolEvent {
    /// Play `sound` in the machine's cue slot
    PlayCue {
        machine: Machine,
        cue: CueKind,
        sound: String,
        /// Render silently; the cue still counts as played
        muted: bool,
    },
    /// Stop whatever plays in the machine's cue slot
    StopCue { machine: Machine },
    /// Mute toggled for the machine's cue slot
    MuteChanged { machine: Machine, muted: bool },
    /// Pomodoro moved to a new phase (or extended a snoozed one)
    PhaseChanged { phase: PomodoroPhase, cycles: u32 },
    /// An alarm started sounding and waits for acknowledgement
    AlarmRaised { machine: Machine },
    /// State worth persisting changed
    StateChanged { machine: Machine },
}

// ============================================================================
// Signals
// ============================================================================

/// Per-machine outbox with the machine's single cue slot.
#[derive(Debug)]
pub struct Signals {
    machine: Machine,
    current_cue: Option<CueKind>,
    events: Vec<ToolEvent>,
}

impl Signals {
    /// Creates an empty outbox for `machine`.
    pub fn new(machine: Machine) -> Self {
        Self {
            machine,
            current_cue: None,
            events: Vec::new(),
        }
    }

    /// Requests a cue, stopping the one in the slot first.
    pub fn play_cue(&mut self, cue: CueKind, sound: &str, muted: bool) {
        if self.current_cue.is_some() {
            self.events.push(ToolEvent::StopCue {
                machine: self.machine,
            });
        }
        debug!(
            "{} cue {:?} ({}, muted: {})",
            self.machine.as_str(),
            cue,
            sound,
            muted
        );
        self.events.push(ToolEvent::PlayCue {
            machine: self.machine,
            cue,
            sound: sound.to_string(),
            muted,
        });
        self.current_cue = Some(cue);
    }

    /// Stops the cue in the slot, if any.
    pub fn stop_cue(&mut self) {
        if self.current_cue.take().is_some() {
            self.events.push(ToolEvent::StopCue {
                machine: self.machine,
            });
        }
    }

    pub fn mute_changed(&mut self, muted: bool) {
        self.events.push(ToolEvent::MuteChanged {
            machine: self.machine,
            muted,
        });
    }

    pub fn alarm_raised(&mut self) {
        self.events.push(ToolEvent::AlarmRaised {
            machine: self.machine,
        });
    }

    pub fn state_changed(&mut self) {
        self.events.push(ToolEvent::StateChanged {
            machine: self.machine,
        });
    }

    pub fn push(&mut self, event: ToolEvent) {
        self.events.push(event);
    }

    /// Returns the cue the slot currently holds.
    pub fn current_cue(&self) -> Option<CueKind> {
        self.current_cue
    }

    /// Takes all pending events.
    pub fn drain(&mut self) -> Vec<ToolEvent> {
        std::mem::take(&mut self.events)
    }
}
