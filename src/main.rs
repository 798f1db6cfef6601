//! Polar Clock CLI
//!
//! Three tools behind one daemon:
//! - A countdown timer with snooze and interval repeat
//! - A stopwatch with labeled laps
//! - A Pomodoro cycle (work, short break, long break after 4 work phases)

use anyhow::Result;
use clap::{CommandFactory, Parser};

use polar_clock::cli::{Cli, Commands, Display, IpcClient};
use polar_clock::daemon::{self, DaemonOptions};

/// Main entry point
#[tokio::main(flavor = "current_thread")]
async fn main() {
    // Parse command line arguments
    let cli = Cli::parse();

    // Initialize logging
    init_tracing(cli.verbose);

    // Execute command
    if let Err(e) = execute(cli).await {
        Display::show_error(&format!("{:#}", e));
        std::process::exit(1);
    }
}

/// Initializes the tracing subscriber for logging.
///
/// `RUST_LOG` wins over `--verbose`.
fn init_tracing(verbose: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();
}

/// Executes the CLI command.
async fn execute(cli: Cli) -> Result<()> {
    if cli.verbose {
        tracing::info!("Verbose mode enabled");
    }

    let Some(command) = cli.command else {
        // No command provided, show help
        Cli::command().print_help()?;
        return Ok(());
    };

    match command {
        Commands::Daemon(args) => {
            daemon::run(DaemonOptions {
                settings_path: args.settings,
                state_path: args.state,
                socket_path: cli.socket,
            })
            .await?;
        }
        Commands::Completions { shell } => {
            generate_completions(shell);
        }
        command => {
            let Some(request) = command.to_request() else {
                return Ok(());
            };
            let client = match cli.socket {
                Some(path) => IpcClient::with_socket_path(path),
                None => IpcClient::new()?,
            };
            let response = client.send(&request).await?;
            Display::show_response(&request, &response);
        }
    }

    Ok(())
}

/// Generates shell completion scripts.
fn generate_completions(shell: clap_complete::Shell) {
    use clap_complete::generate;
    use std::io;

    let mut cmd = Cli::command();
    let bin_name = cmd.get_name().to_string();
    generate(shell, &mut cmd, bin_name, &mut io::stdout());
}

// ============================================================================
// Tests
// ============================================================================
