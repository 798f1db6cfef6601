//! Tick driver and event dispatcher.
//!
//! The tick driver calls `Tools::update` on a fixed period with the
//! measured wall-clock delta. The dispatcher consumes `ToolEvent`s and
//! routes them to the sound player and the state store.

use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::{mpsc, Mutex};
use tokio::time::{interval, Duration, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::sound::{resolve_sound, SoundPlayer};
use crate::tools::{ToolEvent, Tools};

use super::store::StateStore;

/// Shared handle to the tools.
pub type SharedTools = Arc<Mutex<Tools>>;

/// Shared sound player usable from any task.
pub type SharedPlayer = Arc<dyn SoundPlayer + Send + Sync>;

// ============================================================================
// Tick driver
// ============================================================================

/// Advances the tools every `period` until the task is dropped.
///
/// Missed ticks are skipped; the next delta covers the whole gap.
pub async fn run_tick_driver(tools: SharedTools, period: Duration) {
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut last = Instant::now();

    loop {
        ticker.tick().await;
        let now = Instant::now();
        let delta = now.duration_since(last).as_secs_f64();
        last = now;

        tools.lock().await.update(delta);
    }
}

// ============================================================================
// EventDispatcher
// ============================================================================

/// Routes tool events to the sound player and the state store.
pub struct EventDispatcher {
    tools: SharedTools,
    player: Option<SharedPlayer>,
    sounds_dir: Option<PathBuf>,
    store: Option<StateStore>,
}

impl EventDispatcher {
    pub fn new(
        tools: SharedTools,
        player: Option<SharedPlayer>,
        sounds_dir: Option<PathBuf>,
        store: Option<StateStore>,
    ) -> Self {
        Self {
            tools,
            player,
            sounds_dir,
            store,
        }
    }

    /// Consumes events until every sender is gone.
    ///
    /// Events that arrive together are handled as one batch, so a burst of
    /// state changes results in a single save.
    pub async fn run(self, mut event_rx: mpsc::UnboundedReceiver<ToolEvent>) {
        while let Some(event) = event_rx.recv().await {
            let mut needs_save = self.handle(event);
            while let Ok(event) = event_rx.try_recv() {
                needs_save |= self.handle(event);
            }
            if needs_save {
                self.save().await;
            }
        }
        debug!("Event dispatcher stopped");
    }

    /// Handles one event. Returns true if the state should be saved.
    pub fn handle(&self, event: ToolEvent) -> bool {
        match event {
            ToolEvent::PlayCue {
                machine,
                cue,
                sound,
                muted,
            } => {
                let source = resolve_sound(self.sounds_dir.as_deref(), &sound);
                debug!("{} cue {:?}: {:?}", machine.as_str(), cue, source);
                if let Some(player) = &self.player {
                    if let Err(e) = player.play(machine, &source, muted) {
                        warn!("Failed to play cue for {}: {}", machine.as_str(), e);
                    }
                }
                false
            }
            ToolEvent::StopCue { machine } => {
                if let Some(player) = &self.player {
                    if let Err(e) = player.stop(machine) {
                        warn!("Failed to stop cue for {}: {}", machine.as_str(), e);
                    }
                }
                false
            }
            ToolEvent::MuteChanged { machine, muted } => {
                if let Some(player) = &self.player {
                    if let Err(e) = player.set_muted(machine, muted) {
                        warn!("Failed to change mute for {}: {}", machine.as_str(), e);
                    }
                }
                false
            }
            ToolEvent::PhaseChanged { phase, cycles } => {
                info!("Pomodoro phase: {} (cycles: {})", phase.as_str(), cycles);
                false
            }
            ToolEvent::AlarmRaised { machine } => {
                info!("{} alarm raised", machine.as_str());
                false
            }
            ToolEvent::StateChanged { .. } => true,
        }
    }

    /// Saves the current state, logging failures.
    pub async fn save(&self) {
        let Some(store) = &self.store else {
            return;
        };
        let state = self.tools.lock().await.persisted();
        if let Err(e) = store.save(&state) {
            warn!("Failed to save state: {}", e);
        }
    }
}
