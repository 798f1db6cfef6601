//! Audio cue playback for the tools.
//!
//! The tool machines only decide when a cue should start or stop. This
//! module decides how: it resolves sound identifiers to files, plays them
//! with rodio, and keeps one stoppable slot per machine.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐  commands   ┌──────────────────┐
//! │   AudioThread    │────────────▶│ RodioSoundPlayer │
//! │ (SoundPlayer)    │  crossbeam  │  one Sink per    │
//! └──────────────────┘             │  machine         │
//!                                  └────────┬─────────┘
//!                                           │
//!                                           ▼
//!                                  ┌──────────────────┐
//!                                  │   SoundSource    │
//!                                  │  file or tone    │
//!                                  └──────────────────┘
//! ```
//!
//! Playback failures never reach the tools: a cue counts as played
//! whether or not it was audible.

mod error;
mod player;
mod source;
mod thread;

pub use error::SoundError;
pub use player::RodioSoundPlayer;
pub use source::{default_sounds_dir, resolve_sound, SoundSource, SOUNDS_DIR, SUPPORTED_EXTENSIONS};
pub use thread::{AudioCommand, AudioThread};

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use crate::types::Machine;

/// Trait for sound playback implementations.
///
/// Each machine owns one slot: `play` replaces whatever the slot holds.
pub trait SoundPlayer {
    /// Plays `source` in the slot of `machine`.
    ///
    /// A muted cue is rendered silently but still occupies the slot.
    ///
    /// # Errors
    ///
    /// Returns an error if playback cannot be started.
    fn play(&self, machine: Machine, source: &SoundSource, muted: bool) -> Result<(), SoundError>;

    /// Stops the slot of `machine`.
    fn stop(&self, machine: Machine) -> Result<(), SoundError>;

    /// Mutes or unmutes the cue currently in the slot of `machine`.
    fn set_muted(&self, machine: Machine, muted: bool) -> Result<(), SoundError>;

    /// Returns true if the audio system is available.
    fn is_available(&self) -> bool;
}

/// A call recorded by `MockSoundPlayer`.
#[derive(Debug, Clone, PartialEq)]
pub enum MockCall {
    Play {
        machine: Machine,
        source: SoundSource,
        muted: bool,
    },
    Stop {
        machine: Machine,
    },
    SetMuted {
        machine: Machine,
        muted: bool,
    },
}

/// Mock sound player for testing.
#[derive(Debug)]
pub struct MockSoundPlayer {
    calls: Mutex<Vec<MockCall>>,
    available: AtomicBool,
    should_fail: AtomicBool,
}

impl Default for MockSoundPlayer {
    fn default() -> Self {
        Self::new()
    }
}

impl MockSoundPlayer {
    #[must_use]
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            available: AtomicBool::new(true),
            should_fail: AtomicBool::new(false),
        }
    }

    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    pub fn set_should_fail(&self, should_fail: bool) {
        self.should_fail.store(should_fail, Ordering::SeqCst);
    }

    #[must_use]
    pub fn calls(&self) -> Vec<MockCall> {
        self.calls.lock().unwrap().clone()
    }

    #[must_use]
    pub fn play_count(&self) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|call| matches!(call, MockCall::Play { .. }))
            .count()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    fn record(&self, call: MockCall) -> Result<(), SoundError> {
        if self.should_fail.load(Ordering::SeqCst) {
            return Err(SoundError::PlaybackError("Mock failure".to_string()));
        }
        self.calls.lock().unwrap().push(call);
        Ok(())
    }
}

impl SoundPlayer for MockSoundPlayer {
    fn play(&self, machine: Machine, source: &SoundSource, muted: bool) -> Result<(), SoundError> {
        self.record(MockCall::Play {
            machine,
            source: source.clone(),
            muted,
        })
    }

    fn stop(&self, machine: Machine) -> Result<(), SoundError> {
        self.record(MockCall::Stop { machine })
    }

    fn set_muted(&self, machine: Machine, muted: bool) -> Result<(), SoundError> {
        self.record(MockCall::SetMuted { machine, muted })
    }

    fn is_available(&self) -> bool {
        self.available.load(Ordering::SeqCst)
    }
}
