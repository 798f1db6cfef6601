//! IPC Server for the Polar Clock daemon.
//!
//! This module provides Unix Domain Socket IPC functionality:
//! - Server that listens on a Unix socket
//! - One JSON request and one JSON response per connection
//! - Request handler applying tool actions and returning the snapshot

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{UnixListener, UnixStream};
use tokio::time::{timeout, Duration};
use tracing::{debug, warn};

use crate::settings::APP_DIR;
use crate::types::{IpcRequest, IpcResponse};

use super::engine::SharedTools;

// ============================================================================
// Constants
// ============================================================================

/// Socket file name (under `~/.polar-clock`)
pub const SOCKET_FILE: &str = "polar-clock.sock";

/// Maximum request size in bytes (4KB)
pub const MAX_REQUEST_SIZE: usize = 4096;

/// Read timeout in seconds
const READ_TIMEOUT_SECS: u64 = 5;

/// Returns the default socket path (`~/.polar-clock/polar-clock.sock`).
pub fn default_socket_path() -> Result<PathBuf, IpcError> {
    let home = dirs::home_dir().ok_or(IpcError::NoHomeDir)?;
    Ok(home.join(APP_DIR).join(SOCKET_FILE))
}

// ============================================================================
// IpcError
// ============================================================================

/// IPC-specific error types.
#[derive(Debug, thiserror::Error)]
pub enum IpcError {
    /// Read error
    #[error("Failed to read request: {0}")]
    ReadError(String),

    /// Write error
    #[error("Failed to write response: {0}")]
    WriteError(String),

    /// Timeout error
    #[error("Operation timed out")]
    Timeout,

    /// Request too large
    #[error("Request too large (max 4096 bytes)")]
    RequestTooLarge,

    /// Home directory could not be determined
    #[error("home directory is not available")]
    NoHomeDir,
}

// ============================================================================
// IpcServer
// ============================================================================

/// Unix Domain Socket IPC server.
pub struct IpcServer {
    /// Unix socket listener
    listener: UnixListener,
    /// Socket path (for cleanup)
    socket_path: PathBuf,
}

impl IpcServer {
    /// Creates a new IPC server bound to the specified socket path.
    ///
    /// If the socket file already exists, it will be removed before binding.
    ///
    /// # Errors
    ///
    /// Returns an error if the socket cannot be bound.
    pub fn new(socket_path: &Path) -> Result<Self> {
        if socket_path.exists() {
            std::fs::remove_file(socket_path)
                .with_context(|| format!("Failed to remove existing socket: {:?}", socket_path))?;
        }

        if let Some(parent) = socket_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create socket directory: {:?}", parent))?;
        }

        let listener = UnixListener::bind(socket_path)
            .with_context(|| format!("Failed to bind Unix socket: {:?}", socket_path))?;

        Ok(Self {
            listener,
            socket_path: socket_path.to_path_buf(),
        })
    }

    /// Accepts an incoming client connection.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be accepted.
    pub async fn accept(&self) -> Result<UnixStream> {
        let (stream, _addr) = self
            .listener
            .accept()
            .await
            .context("Failed to accept connection")?;
        Ok(stream)
    }

    /// Serves connections until accepting fails.
    ///
    /// Each connection is handled on its own task.
    pub async fn serve(&self, handler: Arc<RequestHandler>) -> Result<()> {
        loop {
            let stream = self.accept().await?;
            let handler = Arc::clone(&handler);
            tokio::spawn(async move {
                if let Err(e) = handle_connection(stream, &handler).await {
                    debug!("Connection ended with error: {:#}", e);
                }
            });
        }
    }

    /// Receives and deserializes an IPC request from the stream.
    ///
    /// Reads until the client shuts down its write half or the size cap is
    /// reached, with a read timeout to prevent blocking indefinitely.
    ///
    /// # Errors
    ///
    /// Returns an error if reading or deserialization fails.
    pub async fn receive_request(stream: &mut UnixStream) -> Result<IpcRequest> {
        let mut buffer = Vec::with_capacity(1024);
        let mut chunk = [0u8; 1024];

        loop {
            let read_result = timeout(
                Duration::from_secs(READ_TIMEOUT_SECS),
                stream.read(&mut chunk),
            )
            .await;

            let n = match read_result {
                Ok(Ok(n)) => n,
                Ok(Err(e)) => return Err(IpcError::ReadError(e.to_string()).into()),
                Err(_) => return Err(IpcError::Timeout.into()),
            };

            if n == 0 {
                break;
            }
            if buffer.len() + n > MAX_REQUEST_SIZE {
                return Err(IpcError::RequestTooLarge.into());
            }
            buffer.extend_from_slice(&chunk[..n]);

            // A complete document ends the request even without shutdown.
            if serde_json::from_slice::<serde_json::Value>(&buffer).is_ok() {
                break;
            }
        }

        if buffer.is_empty() {
            anyhow::bail!("Connection closed by client");
        }

        let request: IpcRequest = serde_json::from_slice(&buffer)
            .with_context(|| "Failed to deserialize IPC request")?;

        Ok(request)
    }

    /// Serializes and sends an IPC response to the stream.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    pub async fn send_response(stream: &mut UnixStream, response: &IpcResponse) -> Result<()> {
        let json = serde_json::to_vec(response).context("Failed to serialize IPC response")?;

        stream
            .write_all(&json)
            .await
            .map_err(|e| IpcError::WriteError(e.to_string()))?;
        stream.flush().await.context("Failed to flush response")?;
        stream.shutdown().await.context("Failed to close response")?;

        Ok(())
    }

    /// Returns the socket path.
    pub fn socket_path(&self) -> &Path {
        &self.socket_path
    }
}

impl Drop for IpcServer {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.socket_path);
    }
}

/// Reads one request, applies it and writes the response.
async fn handle_connection(mut stream: UnixStream, handler: &RequestHandler) -> Result<()> {
    let response = match IpcServer::receive_request(&mut stream).await {
        Ok(request) => handler.handle(request).await,
        Err(e) => {
            warn!("Rejected IPC request: {:#}", e);
            IpcResponse::error(format!("{:#}", e))
        }
    };
    IpcServer::send_response(&mut stream, &response).await
}

// ============================================================================
// RequestHandler
// ============================================================================

/// Handles IPC requests by dispatching to the tools.
pub struct RequestHandler {
    /// Shared reference to the tools
    tools: SharedTools,
}

impl RequestHandler {
    /// Creates a new request handler for the given tools.
    pub fn new(tools: SharedTools) -> Self {
        Self { tools }
    }

    /// Handles an IPC request and returns the response.
    ///
    /// Tool actions never fail; the response always carries the snapshot
    /// taken after the action.
    pub async fn handle(&self, request: IpcRequest) -> IpcResponse {
        let mut tools = self.tools.lock().await;
        let message = match &request {
            IpcRequest::Timer { action } => tools.apply_timer_action(action),
            IpcRequest::Stopwatch { action } => tools.apply_stopwatch_action(action),
            IpcRequest::Pomodoro { action } => tools.apply_pomodoro_action(action),
            IpcRequest::Status => String::new(),
        };
        debug!("Handled {:?}: {}", request, message);

        IpcResponse::success(message, Some(tools.get_state()))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::{mpsc, Mutex};

    use crate::settings::Settings;
    use crate::tools::{ManualClock, ToolEvent, Tools};
    use crate::types::{PomodoroAction, PomodoroPhase, StopwatchAction, TimerAction};

    // ------------------------------------------------------------------------
    // Helper functions
    // ------------------------------------------------------------------------

    fn create_temp_socket_path() -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.sock");
        (dir, path)
    }

    fn create_tools() -> (SharedTools, ManualClock, mpsc::UnboundedReceiver<ToolEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let clock = ManualClock::new();
        let tools = Tools::init(&Settings::default(), None, Box::new(clock.clone()), tx);
        (Arc::new(Mutex::new(tools)), clock, rx)
    }

    async fn send_raw(path: PathBuf, payload: Vec<u8>) -> IpcResponse {
        let mut stream = UnixStream::connect(&path).await.unwrap();
        stream.write_all(&payload).await.unwrap();
        stream.shutdown().await.unwrap();
        let mut buffer = Vec::new();
        stream.read_to_end(&mut buffer).await.unwrap();
        serde_json::from_slice(&buffer).unwrap()
    }

    // ------------------------------------------------------------------------
    // IpcServer Tests
    // ------------------------------------------------------------------------

    mod ipc_server_tests {
        use super::*;

        #[tokio::test]
        async fn test_server_creation() {
            let (_dir, socket_path) = create_temp_socket_path();
            let server = IpcServer::new(&socket_path);

            assert!(server.is_ok());
            assert!(socket_path.exists());
        }

        #[tokio::test]
        async fn test_server_removes_existing_socket() {
            let (_dir, socket_path) = create_temp_socket_path();
            std::fs::write(&socket_path, "dummy").unwrap();

            let server = IpcServer::new(&socket_path);
            assert!(server.is_ok());
        }

        #[tokio::test]
        async fn test_server_creates_parent_directory() {
            let dir = tempfile::tempdir().unwrap();
            let socket_path = dir.path().join("subdir").join("test.sock");

            let server = IpcServer::new(&socket_path);
            assert!(server.is_ok());
            assert!(socket_path.parent().unwrap().exists());
        }

        #[tokio::test]
        async fn test_receive_request_status() {
            let (_dir, socket_path) = create_temp_socket_path();
            let server = IpcServer::new(&socket_path).unwrap();

            let client_path = socket_path.clone();
            let client_handle = tokio::spawn(async move {
                let mut stream = UnixStream::connect(&client_path).await.unwrap();
                stream.write_all(br#"{"command":"status"}"#).await.unwrap();
                stream.flush().await.unwrap();
                stream
            });

            let mut stream = server.accept().await.unwrap();
            let request = IpcServer::receive_request(&mut stream).await.unwrap();
            assert_eq!(request, IpcRequest::Status);

            client_handle.await.unwrap();
        }

        #[tokio::test]
        async fn test_receive_request_timer_action() {
            let (_dir, socket_path) = create_temp_socket_path();
            let server = IpcServer::new(&socket_path).unwrap();

            let client_path = socket_path.clone();
            let client_handle = tokio::spawn(async move {
                let mut stream = UnixStream::connect(&client_path).await.unwrap();
                let request = r#"{"command":"timer","action":{"type":"interval","enabled":true}}"#;
                stream.write_all(request.as_bytes()).await.unwrap();
                stream.shutdown().await.unwrap();
            });

            let mut stream = server.accept().await.unwrap();
            let request = IpcServer::receive_request(&mut stream).await.unwrap();
            assert_eq!(
                request,
                IpcRequest::Timer {
                    action: TimerAction::Interval { enabled: true }
                }
            );

            client_handle.await.unwrap();
        }

        #[tokio::test]
        async fn test_receive_request_invalid_json() {
            let (_dir, socket_path) = create_temp_socket_path();
            let server = IpcServer::new(&socket_path).unwrap();

            let client_path = socket_path.clone();
            let _client_handle = tokio::spawn(async move {
                let mut stream = UnixStream::connect(&client_path).await.unwrap();
                stream.write_all(b"not valid json").await.unwrap();
                stream.shutdown().await.unwrap();
            });

            let mut stream = server.accept().await.unwrap();
            let request = IpcServer::receive_request(&mut stream).await;
            assert!(request.is_err());
        }

        #[tokio::test]
        async fn test_receive_request_too_large() {
            let (_dir, socket_path) = create_temp_socket_path();
            let server = IpcServer::new(&socket_path).unwrap();

            let client_path = socket_path.clone();
            let _client_handle = tokio::spawn(async move {
                let mut stream = UnixStream::connect(&client_path).await.unwrap();
                let payload = vec![b' '; MAX_REQUEST_SIZE + 1];
                let _ = stream.write_all(&payload).await;
                let _ = stream.shutdown().await;
            });

            let mut stream = server.accept().await.unwrap();
            let error = IpcServer::receive_request(&mut stream).await.unwrap_err();
            assert!(matches!(
                error.downcast_ref::<IpcError>(),
                Some(IpcError::RequestTooLarge)
            ));
        }

        #[tokio::test]
        async fn test_socket_path_getter() {
            let (_dir, socket_path) = create_temp_socket_path();
            let server = IpcServer::new(&socket_path).unwrap();

            assert_eq!(server.socket_path(), socket_path);
        }

        #[tokio::test]
        async fn test_server_drop_cleanup() {
            let (_dir, socket_path) = create_temp_socket_path();

            {
                let _server = IpcServer::new(&socket_path).unwrap();
                assert!(socket_path.exists());
            }

            assert!(!socket_path.exists());
        }

        #[tokio::test]
        async fn test_serve_round_trip() {
            let (_dir, socket_path) = create_temp_socket_path();
            let server = IpcServer::new(&socket_path).unwrap();
            let (tools, _clock, _rx) = create_tools();
            let handler = Arc::new(RequestHandler::new(tools));
            let serve_handle = tokio::spawn(async move { server.serve(handler).await });

            let response = send_raw(
                socket_path.clone(),
                br#"{"command":"pomodoro","action":{"type":"next"}}"#.to_vec(),
            )
            .await;
            assert!(!response.is_error());
            assert_eq!(response.data.unwrap().pomodoro.phase, PomodoroPhase::ShortBreak);

            let response = send_raw(socket_path.clone(), b"{\"command\":\"nope\"}".to_vec()).await;
            assert!(response.is_error());

            serve_handle.abort();
        }
    }

    // ------------------------------------------------------------------------
    // RequestHandler Tests
    // ------------------------------------------------------------------------

    mod request_handler_tests {
        use super::*;

        #[tokio::test]
        async fn test_handle_status() {
            let (tools, _clock, _rx) = create_tools();
            let handler = RequestHandler::new(tools);

            let response = handler.handle(IpcRequest::Status).await;

            assert_eq!(response.status, "success");
            let data = response.data.unwrap();
            assert_eq!(data.timer.total_seconds, 0.0);
            assert_eq!(data.pomodoro.phase, PomodoroPhase::Work);
            assert_eq!(data.pomodoro.remaining_seconds, 1500.0);
        }

        #[tokio::test]
        async fn test_handle_timer_configure_and_start() {
            let (tools, _clock, _rx) = create_tools();
            let handler = RequestHandler::new(tools);

            handler
                .handle(IpcRequest::Timer {
                    action: TimerAction::Configure {
                        hours: 0,
                        minutes: 5,
                        seconds: 0,
                    },
                })
                .await;
            let response = handler
                .handle(IpcRequest::Timer {
                    action: TimerAction::Start,
                })
                .await;

            assert_eq!(response.message, "Timer started");
            let data = response.data.unwrap();
            assert!(data.timer.is_running);
            assert_eq!(data.timer.remaining_seconds, 300.0);
        }

        #[tokio::test]
        async fn test_handle_start_without_duration_is_not_error() {
            let (tools, _clock, _rx) = create_tools();
            let handler = RequestHandler::new(tools);

            let response = handler
                .handle(IpcRequest::Timer {
                    action: TimerAction::Start,
                })
                .await;

            assert!(!response.is_error());
            assert!(!response.data.unwrap().timer.is_running);
        }

        #[tokio::test]
        async fn test_handle_stopwatch_laps() {
            let (tools, clock, _rx) = create_tools();
            let handler = RequestHandler::new(tools);

            handler
                .handle(IpcRequest::Stopwatch {
                    action: StopwatchAction::Start,
                })
                .await;
            clock.advance(1250.0);
            let response = handler
                .handle(IpcRequest::Stopwatch {
                    action: StopwatchAction::Lap,
                })
                .await;

            assert_eq!(response.message, "Lap 1 recorded");
            let laps = response.data.unwrap().stopwatch.laps;
            assert_eq!(laps.len(), 1);
            assert_eq!(laps[0].time, 1250.0);
        }

        #[tokio::test]
        async fn test_handle_pomodoro_snooze() {
            let (tools, _clock, _rx) = create_tools();
            let handler = RequestHandler::new(tools);

            let response = handler
                .handle(IpcRequest::Pomodoro {
                    action: PomodoroAction::Snooze,
                })
                .await;

            let data = response.data.unwrap();
            assert!(data.pomodoro.is_snoozing);
            assert_eq!(data.pomodoro.remaining_seconds, 1800.0);
        }
    }
}
