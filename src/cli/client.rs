//! IPC Client for communicating with the Polar Clock daemon.
//!
//! This module provides:
//! - Unix Domain Socket client
//! - Request/response handling
//! - Connection retry logic
//! - Timeout handling

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::UnixStream;
use tokio::time::timeout;

use crate::daemon::default_socket_path;
use crate::types::{IpcRequest, IpcResponse};

// ============================================================================
// Constants
// ============================================================================

/// Connection timeout in seconds
const CONNECTION_TIMEOUT_SECS: u64 = 5;

/// Read/write timeout in seconds
const IO_TIMEOUT_SECS: u64 = 5;

/// Maximum response size in bytes (1MB; lap lists grow without bound)
const MAX_RESPONSE_SIZE: u64 = 1024 * 1024;

/// Maximum connection attempts
const MAX_RETRIES: u32 = 3;

/// Retry delay in milliseconds (base delay, multiplied by attempt number)
const RETRY_DELAY_MS: u64 = 500;

// ============================================================================
// IpcClient
// ============================================================================

/// IPC client for daemon communication.
pub struct IpcClient {
    /// Socket path
    socket_path: PathBuf,
    /// Connection timeout
    timeout: Duration,
}

impl IpcClient {
    /// Creates a new IPC client with the default socket path.
    pub fn new() -> Result<Self> {
        let socket_path = default_socket_path()?;
        Ok(Self::with_socket_path(socket_path))
    }

    /// Creates a new IPC client with a custom socket path.
    pub fn with_socket_path(socket_path: PathBuf) -> Self {
        Self {
            socket_path,
            timeout: Duration::from_secs(CONNECTION_TIMEOUT_SECS),
        }
    }

    /// Returns the socket path.
    pub fn socket_path(&self) -> &Path {
        &self.socket_path
    }

    /// Sends a request to the daemon.
    ///
    /// Connecting is retried with a growing delay. Once connected the
    /// request is sent exactly once, so actions are never applied twice.
    ///
    /// # Errors
    ///
    /// Returns an error if the daemon is unreachable, the exchange fails,
    /// or the daemon answers with an error response.
    pub async fn send(&self, request: &IpcRequest) -> Result<IpcResponse> {
        let stream = self.connect_with_retry().await?;
        let response = self.exchange(stream, request).await?;

        if response.is_error() {
            anyhow::bail!("{}", response.message);
        }

        Ok(response)
    }

    /// Connects to the daemon with retry logic.
    async fn connect_with_retry(&self) -> Result<UnixStream> {
        let mut last_error = None;

        for attempt in 1..=MAX_RETRIES {
            match self.connect().await {
                Ok(stream) => return Ok(stream),
                Err(e) => {
                    tracing::debug!("Connection failed (attempt {}/{}): {:#}", attempt, MAX_RETRIES, e);
                    last_error = Some(e);

                    if attempt < MAX_RETRIES {
                        let delay = Duration::from_millis(RETRY_DELAY_MS * u64::from(attempt));
                        tokio::time::sleep(delay).await;
                    }
                }
            }
        }

        Err(last_error.unwrap_or_else(|| anyhow!("No connection attempt was made")))
    }

    async fn connect(&self) -> Result<UnixStream> {
        timeout(self.timeout, UnixStream::connect(&self.socket_path))
            .await
            .context("Connection timed out")?
            .with_context(|| {
                format!(
                    "Cannot connect to the daemon at {}. Start it with 'polar-clock daemon'",
                    self.socket_path.display()
                )
            })
    }

    /// Writes one request and reads one response.
    async fn exchange(&self, mut stream: UnixStream, request: &IpcRequest) -> Result<IpcResponse> {
        let request_json = serde_json::to_vec(request).context("Failed to serialize request")?;
        let io_timeout = Duration::from_secs(IO_TIMEOUT_SECS);

        timeout(io_timeout, stream.write_all(&request_json))
            .await
            .context("Write timed out")?
            .context("Failed to send request")?;

        // Shutdown write side to signal end of request
        timeout(io_timeout, stream.shutdown())
            .await
            .context("Shutdown timed out")?
            .context("Failed to finish request")?;

        let mut buffer = Vec::new();
        timeout(
            io_timeout,
            (&mut stream).take(MAX_RESPONSE_SIZE).read_to_end(&mut buffer),
        )
        .await
        .context("Read timed out")?
        .context("Failed to receive response")?;

        if buffer.is_empty() {
            anyhow::bail!("The daemon closed the connection without answering");
        }

        serde_json::from_slice(&buffer).context("Failed to parse response")
    }
}

// ============================================================================
// Tests
// ============================================================================
