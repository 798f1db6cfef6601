//! Sound player implementation using rodio.
//!
//! `RodioSoundPlayer` keeps one `Sink` per machine. Starting a cue stops
//! whatever plays in that machine's slot, so cues of one machine never
//! overlap while different machines play independently.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::time::Duration;

use rodio::source::SineWave;
use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink, Source};
use tracing::{debug, warn};

use crate::types::Machine;

use super::error::SoundError;
use super::source::SoundSource;

/// Length of the generated fallback tone.
const TONE_DURATION: Duration = Duration::from_millis(800);

/// Amplitude of the generated fallback tone.
const TONE_AMPLITUDE: f32 = 0.25;

/// A sound player that uses rodio for audio playback.
///
/// The output stream is tied to the thread that created it, so the player
/// lives on the audio thread (see `AudioThread`).
pub struct RodioSoundPlayer {
    /// The audio output stream (must be kept alive for playback).
    _stream: OutputStream,
    /// Handle to the output stream for creating sinks.
    stream_handle: OutputStreamHandle,
    /// Playback volume (0.0 - 1.0).
    volume: f32,
    /// One cue slot per machine.
    slots: RefCell<HashMap<Machine, Sink>>,
}

impl RodioSoundPlayer {
    /// Creates a player on the default output device.
    ///
    /// # Errors
    ///
    /// Returns `SoundError::DeviceNotAvailable` if no audio output device
    /// is available.
    pub fn new(volume: f32) -> Result<Self, SoundError> {
        let (stream, stream_handle) = OutputStream::try_default()
            .map_err(|e| SoundError::DeviceNotAvailable(e.to_string()))?;

        debug!("Audio output stream initialized");

        Ok(Self {
            _stream: stream,
            stream_handle,
            volume: volume.clamp(0.0, 1.0),
            slots: RefCell::new(HashMap::new()),
        })
    }

    /// Plays `source` in the slot of `machine`, replacing the current cue.
    ///
    /// A file that cannot be opened or decoded is replaced by a tone.
    ///
    /// # Errors
    ///
    /// Returns an error if no sink can be created on the output stream.
    pub fn play(&self, machine: Machine, source: &SoundSource, muted: bool) -> Result<(), SoundError> {
        self.stop(machine);

        let sink = Sink::try_new(&self.stream_handle)
            .map_err(|e| SoundError::StreamError(e.to_string()))?;
        sink.set_volume(self.effective_volume(muted));

        match source {
            SoundSource::File { name, path } => match open_decoder(path) {
                Ok(decoder) => {
                    debug!("Playing {} for {}", name, machine.as_str());
                    sink.append(decoder);
                }
                Err(e) if e.should_fallback_to_tone() => {
                    warn!("Failed to play '{}': {}, falling back to tone", name, e);
                    sink.append(tone(source.tone_frequency()));
                }
                Err(e) => return Err(e),
            },
            SoundSource::Tone { name } => {
                debug!("Playing tone for {} ({})", name, machine.as_str());
                sink.append(tone(source.tone_frequency()));
            }
        }

        self.slots.borrow_mut().insert(machine, sink);
        Ok(())
    }

    /// Stops the cue in the slot of `machine`.
    pub fn stop(&self, machine: Machine) {
        if let Some(sink) = self.slots.borrow_mut().remove(&machine) {
            sink.stop();
            debug!("Stopped cue for {}", machine.as_str());
        }
    }

    /// Silences or restores the cue currently playing for `machine`.
    pub fn set_muted(&self, machine: Machine, muted: bool) {
        if let Some(sink) = self.slots.borrow().get(&machine) {
            sink.set_volume(self.effective_volume(muted));
        }
    }

    fn effective_volume(&self, muted: bool) -> f32 {
        if muted {
            0.0
        } else {
            self.volume
        }
    }
}

impl std::fmt::Debug for RodioSoundPlayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RodioSoundPlayer")
            .field("volume", &self.volume)
            .field("slots", &self.slots.borrow().len())
            .finish_non_exhaustive()
    }
}

/// Opens and decodes a sound file.
fn open_decoder(path: &Path) -> Result<Decoder<BufReader<File>>, SoundError> {
    let file = File::open(path)
        .map_err(|e| SoundError::FileNotFound(format!("{}: {}", path.display(), e)))?;
    Decoder::new(BufReader::new(file)).map_err(|e| SoundError::DecodeError(e.to_string()))
}

/// Generates the fallback tone.
fn tone(frequency: f32) -> impl Source<Item = f32> + Send + 'static {
    SineWave::new(frequency)
        .take_duration(TONE_DURATION)
        .amplify(TONE_AMPLITUDE)
}
