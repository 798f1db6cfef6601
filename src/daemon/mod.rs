//! Daemon module for Polar Clock.
//!
//! This module contains the core daemon functionality:
//! - `engine`: Tick driver and event dispatcher
//! - `ipc`: Unix socket server and request handler
//! - `store`: JSON state persistence

pub mod engine;
pub mod ipc;
pub mod store;

pub use engine::{run_tick_driver, EventDispatcher, SharedPlayer, SharedTools};
pub use ipc::{default_socket_path, IpcError, IpcServer, RequestHandler};
pub use store::{StateStore, StoreError};

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::{mpsc, Mutex};
use tokio::time::Duration;
use tracing::{info, warn};

use crate::settings::Settings;
use crate::sound::{default_sounds_dir, AudioThread};
use crate::tools::{SystemClock, Tools};

/// Paths used by the daemon. `None` selects the default under `~/.polar-clock`.
#[derive(Debug, Clone, Default)]
pub struct DaemonOptions {
    pub settings_path: Option<PathBuf>,
    pub state_path: Option<PathBuf>,
    pub socket_path: Option<PathBuf>,
}

/// Runs the daemon until Ctrl-C or SIGTERM.
///
/// # Errors
///
/// Returns an error if the settings cannot be loaded, the socket cannot be
/// bound, or the final save fails.
pub async fn run(options: DaemonOptions) -> Result<()> {
    let settings_path = match options.settings_path {
        Some(path) => path,
        None => Settings::default_path()?,
    };
    let settings = Settings::load(&settings_path)
        .with_context(|| format!("Failed to load settings from {}", settings_path.display()))?;

    let store = StateStore::new(match options.state_path {
        Some(path) => path,
        None => StateStore::default_path()?,
    });
    let initial_state = store.load().unwrap_or_else(|e| {
        warn!("Starting with fresh state: {}", e);
        None
    });

    let (event_tx, event_rx) = mpsc::unbounded_channel();
    let tools = Tools::init(
        &settings,
        initial_state.as_ref(),
        Box::new(SystemClock::new()),
        event_tx,
    );
    let tools: SharedTools = Arc::new(Mutex::new(tools));

    let player: Option<SharedPlayer> = match AudioThread::spawn(settings.volume) {
        Ok(thread) => Some(Arc::new(thread)),
        Err(e) => {
            warn!("Audio disabled: {}", e);
            None
        }
    };
    let sounds_dir = settings.sounds_dir.clone().or_else(default_sounds_dir);

    let socket_path = match options.socket_path {
        Some(path) => path,
        None => default_socket_path()?,
    };
    let server = IpcServer::new(&socket_path)?;
    let handler = Arc::new(RequestHandler::new(Arc::clone(&tools)));

    let tick_handle = tokio::spawn(run_tick_driver(
        Arc::clone(&tools),
        Duration::from_millis(settings.tick_interval_ms),
    ));
    let dispatcher = EventDispatcher::new(Arc::clone(&tools), player, sounds_dir, Some(store.clone()));
    let dispatch_handle = tokio::spawn(dispatcher.run(event_rx));

    let mut terminate = signal(SignalKind::terminate()).context("Failed to listen for SIGTERM")?;
    info!("Daemon listening on {}", socket_path.display());

    let result = tokio::select! {
        result = server.serve(handler) => result,
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl-C, shutting down");
            Ok(())
        }
        _ = terminate.recv() => {
            info!("Received SIGTERM, shutting down");
            Ok(())
        }
    };

    tick_handle.abort();
    dispatch_handle.abort();

    let state = tools.lock().await.persisted();
    store.save(&state).context("Failed to save state")?;
    info!("State saved to {}", store.path().display());

    result
}
