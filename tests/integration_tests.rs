//! Integration tests for Daemon-CLI IPC communication.
//!
//! These tests run a real IPC server over a temporary Unix socket and talk
//! to it with the CLI client:
//! - Timer, stopwatch and Pomodoro actions via IPC
//! - Status queries
//! - Connection and protocol error handling

use std::path::PathBuf;
use std::sync::Arc;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::UnixStream;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{timeout, Duration};

use polar_clock::cli::client::IpcClient;
use polar_clock::daemon::ipc::{IpcServer, RequestHandler};
use polar_clock::daemon::SharedTools;
use polar_clock::settings::Settings;
use polar_clock::tools::{ManualClock, ToolEvent, Tools};
use polar_clock::types::{
    IpcRequest, IpcResponse, PomodoroAction, PomodoroInput, PomodoroPhase, StopwatchAction,
    TimerAction,
};

// ============================================================================
// Test Helpers
// ============================================================================

/// Creates a temporary socket path for testing.
fn create_temp_socket_path() -> PathBuf {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("integration_test.sock");
    // Keep the directory so it's not deleted
    std::mem::forget(dir);
    path
}

/// Creates the tools with a manual clock.
fn create_tools() -> (SharedTools, ManualClock, mpsc::UnboundedReceiver<ToolEvent>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let clock = ManualClock::new();
    let tools = Tools::init(&Settings::default(), None, Box::new(clock.clone()), tx);
    (Arc::new(Mutex::new(tools)), clock, rx)
}

/// Starts a server on `socket_path` serving `tools`.
fn start_server(socket_path: &PathBuf, tools: SharedTools) -> JoinHandle<()> {
    let server = IpcServer::new(socket_path).unwrap();
    let handler = Arc::new(RequestHandler::new(tools));
    tokio::spawn(async move {
        let _ = server.serve(handler).await;
    })
}

async fn send(client: &IpcClient, request: IpcRequest) -> IpcResponse {
    timeout(Duration::from_secs(5), client.send(&request))
        .await
        .expect("request timed out")
        .expect("request failed")
}

// ============================================================================
// Timer via IPC
// ============================================================================

#[tokio::test]
async fn timer_configure_start_and_tick_via_ipc() {
    let socket_path = create_temp_socket_path();
    let (tools, _clock, _rx) = create_tools();
    let server_handle = start_server(&socket_path, tools.clone());
    let client = IpcClient::with_socket_path(socket_path);

    let response = send(
        &client,
        IpcRequest::Timer {
            action: TimerAction::Configure {
                hours: 0,
                minutes: 1,
                seconds: 30,
            },
        },
    )
    .await;
    assert_eq!(response.message, "Timer set to 00:01:30");
    assert_eq!(response.data.unwrap().timer.total_seconds, 90.0);

    send(
        &client,
        IpcRequest::Timer {
            action: TimerAction::Start,
        },
    )
    .await;
    tools.lock().await.update(10.0);

    let response = send(&client, IpcRequest::Status).await;
    let timer = response.data.unwrap().timer;
    assert!(timer.is_running);
    assert_eq!(timer.remaining_seconds, 80.0);

    server_handle.abort();
}

#[tokio::test]
async fn timer_alarm_and_snooze_via_ipc() {
    let socket_path = create_temp_socket_path();
    let (tools, _clock, _rx) = create_tools();
    let server_handle = start_server(&socket_path, tools.clone());
    let client = IpcClient::with_socket_path(socket_path);

    {
        let mut guard = tools.lock().await;
        guard.timer_configure(0, 0, 5);
        guard.timer_start();
        guard.update(6.0);
    }

    let response = send(&client, IpcRequest::Status).await;
    let timer = response.data.unwrap().timer;
    assert!(timer.alarm_playing);
    assert!(!timer.is_running);

    let response = send(
        &client,
        IpcRequest::Timer {
            action: TimerAction::Snooze,
        },
    )
    .await;
    let timer = response.data.unwrap().timer;
    assert!(!timer.alarm_playing);
    assert!(timer.is_running);
    assert!(timer.is_snoozing);
    assert_eq!(timer.remaining_seconds, 300.0);

    server_handle.abort();
}

// ============================================================================
// Stopwatch via IPC
// ============================================================================

#[tokio::test]
async fn stopwatch_laps_and_labels_via_ipc() {
    let socket_path = create_temp_socket_path();
    let (tools, clock, _rx) = create_tools();
    let server_handle = start_server(&socket_path, tools);
    let client = IpcClient::with_socket_path(socket_path);

    send(
        &client,
        IpcRequest::Stopwatch {
            action: StopwatchAction::Start,
        },
    )
    .await;
    for at in [1000.0, 2500.0, 4000.0] {
        clock.set(at);
        send(
            &client,
            IpcRequest::Stopwatch {
                action: StopwatchAction::Lap,
            },
        )
        .await;
    }

    let response = send(
        &client,
        IpcRequest::Stopwatch {
            action: StopwatchAction::Label {
                display_index: 0,
                text: "final".to_string(),
            },
        },
    )
    .await;
    assert_eq!(response.message, "Lap labeled");

    let laps = response.data.unwrap().stopwatch.laps;
    let times: Vec<f64> = laps.iter().map(|lap| lap.time).collect();
    assert_eq!(times, vec![1000.0, 2500.0, 4000.0]);
    assert_eq!(laps[2].label, "final");
    assert_eq!(laps[0].label, "");

    server_handle.abort();
}

#[tokio::test]
async fn stopwatch_catch_up_via_ipc() {
    let socket_path = create_temp_socket_path();
    let (tools, _clock, _rx) = create_tools();
    let server_handle = start_server(&socket_path, tools);
    let client = IpcClient::with_socket_path(socket_path);

    let response = send(
        &client,
        IpcRequest::Stopwatch {
            action: StopwatchAction::CatchUp {
                minutes: 2,
                seconds: 5,
            },
        },
    )
    .await;
    assert_eq!(response.data.unwrap().stopwatch.elapsed_time, 125_000.0);

    let response = send(
        &client,
        IpcRequest::Stopwatch {
            action: StopwatchAction::CatchUp {
                minutes: 0,
                seconds: 0,
            },
        },
    )
    .await;
    assert_eq!(response.message, "Catch-up time must be positive");
    assert_eq!(response.data.unwrap().stopwatch.elapsed_time, 125_000.0);

    server_handle.abort();
}

// ============================================================================
// Pomodoro via IPC
// ============================================================================

#[tokio::test]
async fn pomodoro_configure_and_skip_via_ipc() {
    let socket_path = create_temp_socket_path();
    let (tools, _clock, _rx) = create_tools();
    let server_handle = start_server(&socket_path, tools);
    let client = IpcClient::with_socket_path(socket_path);

    let response = send(
        &client,
        IpcRequest::Pomodoro {
            action: PomodoroAction::Configure {
                input: PomodoroInput {
                    work_minutes: Some("50".to_string()),
                    short_break_minutes: Some("ten".to_string()),
                    long_break_minutes: None,
                    continuous: Some(true),
                },
            },
        },
    )
    .await;
    let pomodoro = response.data.unwrap().pomodoro;
    assert_eq!(pomodoro.work_duration, 50.0);
    assert_eq!(pomodoro.short_break_duration, 5.0);
    assert!(pomodoro.continuous);
    assert_eq!(pomodoro.remaining_seconds, 3000.0);

    let response = send(
        &client,
        IpcRequest::Pomodoro {
            action: PomodoroAction::Next,
        },
    )
    .await;
    let pomodoro = response.data.unwrap().pomodoro;
    assert_eq!(pomodoro.phase, PomodoroPhase::ShortBreak);
    assert_eq!(pomodoro.cycles, 1);
    assert_eq!(pomodoro.remaining_seconds, 300.0);

    server_handle.abort();
}

// ============================================================================
// Error Handling
// ============================================================================

#[tokio::test]
async fn connection_error_without_daemon() {
    let socket_path = create_temp_socket_path();
    let client = IpcClient::with_socket_path(socket_path);

    let result = client.send(&IpcRequest::Status).await;
    assert!(result.is_err());
}

#[tokio::test]
async fn malformed_request_gets_error_response() {
    let socket_path = create_temp_socket_path();
    let (tools, _clock, _rx) = create_tools();
    let server_handle = start_server(&socket_path, tools);

    let mut stream = UnixStream::connect(&socket_path).await.unwrap();
    stream
        .write_all(br#"{"command":"timer","action":{"type":"explode"}}"#)
        .await
        .unwrap();
    stream.shutdown().await.unwrap();

    let mut buffer = Vec::new();
    stream.read_to_end(&mut buffer).await.unwrap();
    let response: IpcResponse = serde_json::from_slice(&buffer).unwrap();

    assert!(response.is_error());
    assert!(response.data.is_none());

    server_handle.abort();
}

#[tokio::test]
async fn concurrent_clients_are_served() {
    let socket_path = create_temp_socket_path();
    let (tools, _clock, _rx) = create_tools();
    let server_handle = start_server(&socket_path, tools);

    let mut handles = Vec::new();
    for _ in 0..5 {
        let path = socket_path.clone();
        handles.push(tokio::spawn(async move {
            let client = IpcClient::with_socket_path(path);
            client
                .send(&IpcRequest::Stopwatch {
                    action: StopwatchAction::CatchUp {
                        minutes: 0,
                        seconds: 1,
                    },
                })
                .await
                .unwrap()
        }));
    }
    for handle in handles {
        assert!(!handle.await.unwrap().is_error());
    }

    let client = IpcClient::with_socket_path(socket_path);
    let response = send(&client, IpcRequest::Status).await;
    assert_eq!(response.data.unwrap().stopwatch.elapsed_time, 5000.0);

    server_handle.abort();
}
