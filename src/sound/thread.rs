//! Audio thread.
//!
//! rodio's output stream cannot move between threads, so the player lives
//! on a dedicated thread. `AudioThread` is the `Send + Sync` handle the
//! daemon uses; commands travel over a crossbeam channel.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

use crossbeam_channel::{unbounded, Receiver, Sender};
use tracing::{debug, info, warn};

use crate::types::Machine;

use super::error::SoundError;
use super::player::RodioSoundPlayer;
use super::source::SoundSource;
use super::SoundPlayer;

/// Commands understood by the audio thread.
#[derive(Debug, Clone, PartialEq)]
pub enum AudioCommand {
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
    Shutdown,
}

/// Handle to the audio thread.
#[derive(Debug)]
pub struct AudioThread {
    command_tx: Sender<AudioCommand>,
    available: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl AudioThread {
    /// Spawns the audio thread.
    ///
    /// Opening the output device happens on the new thread. When no device
    /// exists the thread logs a warning and discards every command.
    ///
    /// # Errors
    ///
    /// Returns an error if the thread cannot be spawned.
    pub fn spawn(volume: f32) -> Result<Self, SoundError> {
        let (command_tx, command_rx) = unbounded();
        let available = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&available);

        let handle = std::thread::Builder::new()
            .name("polar-clock-audio".to_string())
            .spawn(move || run(command_rx, volume, flag))
            .map_err(|e| SoundError::PlaybackError(e.to_string()))?;

        Ok(Self {
            command_tx,
            available,
            handle: Some(handle),
        })
    }

    fn send(&self, command: AudioCommand) -> Result<(), SoundError> {
        self.command_tx
            .send(command)
            .map_err(|_| SoundError::PlaybackError("audio thread stopped".to_string()))
    }

    /// Stops the thread and waits for it to exit.
    pub fn shutdown(mut self) {
        self.stop_thread();
    }

    fn stop_thread(&mut self) {
        if let Some(handle) = self.handle.take() {
            let _ = self.command_tx.send(AudioCommand::Shutdown);
            if handle.join().is_err() {
                warn!("Audio thread panicked");
            }
        }
    }
}

impl Drop for AudioThread {
    fn drop(&mut self) {
        self.stop_thread();
    }
}

impl SoundPlayer for AudioThread {
    fn play(&self, machine: Machine, source: &SoundSource, muted: bool) -> Result<(), SoundError> {
        self.send(AudioCommand::Play {
            machine,
            source: source.clone(),
            muted,
        })
    }

    fn stop(&self, machine: Machine) -> Result<(), SoundError> {
        self.send(AudioCommand::Stop { machine })
    }

    fn set_muted(&self, machine: Machine, muted: bool) -> Result<(), SoundError> {
        self.send(AudioCommand::SetMuted { machine, muted })
    }

    fn is_available(&self) -> bool {
        self.available.load(Ordering::SeqCst)
    }
}

/// Audio thread body.
fn run(command_rx: Receiver<AudioCommand>, volume: f32, available: Arc<AtomicBool>) {
    let player = match RodioSoundPlayer::new(volume) {
        Ok(player) => {
            available.store(true, Ordering::SeqCst);
            info!("Audio output ready");
            Some(player)
        }
        Err(e) => {
            warn!("Audio not available, cues will be silent: {}", e);
            None
        }
    };

    for command in command_rx.iter() {
        match command {
            AudioCommand::Shutdown => break,
            command => match &player {
                Some(player) => execute(player, command),
                None => debug!("Discarding {:?} without audio device", command),
            },
        }
    }

    debug!("Audio thread stopped");
}

fn execute(player: &RodioSoundPlayer, command: AudioCommand) {
    match command {
        AudioCommand::Play {
            machine,
            source,
            muted,
        } => {
            if let Err(e) = player.play(machine, &source, muted) {
                warn!("Failed to play {}: {}", source.name(), e);
            }
        }
        AudioCommand::Stop { machine } => player.stop(machine),
        AudioCommand::SetMuted { machine, muted } => player.set_muted(machine, muted),
        AudioCommand::Shutdown => {}
    }
}
