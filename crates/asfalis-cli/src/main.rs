//! Asfalis CLI - a terminal shell for the Asfalis session core.
//!
//! Each invocation behaves like an app launch: the shell builds a session
//! manager from configuration, runs one operation and prints the outcome.

mod commands;

use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use asfalis_core::Config;

#[derive(Parser, Debug)]
#[command(name = "asfalis", version, about = "Sign in to Asfalis and resolve access codes")]
struct Cli {
    /// Write logs to this file instead of stderr
    #[arg(long, global = true, value_name = "PATH")]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Sign in with username and password
    Login {
        /// Login name (defaults to ASFALIS_USERNAME or the last used name)
        #[arg(long)]
        name: Option<String>,
    },
    /// Start as the app would: reset the login flag and revalidate the stored token
    Resume,
    /// Resolve a scanned QR code
    Scan {
        /// Code text as read by the scanner
        code: String,
    },
    /// Sign out, keeping the token for biometric re-entry
    SignOut,
    /// Show the stored session
    Status,
}

/// Initialize the tracing subscriber for logging
fn init_tracing(log_file: Option<&Path>) -> Result<Option<WorkerGuard>> {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    match log_file {
        Some(path) => {
            let dir = path.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or(Path::new("."));
            let file_name = path
                .file_name()
                .ok_or_else(|| anyhow::anyhow!("Log file path has no file name: {}", path.display()))?;
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create log directory {}", dir.display()))?;

            let appender = tracing_appender::rolling::never(dir, file_name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::registry()
                .with(fmt::layer().with_writer(writer).with_ansi(false))
                .with(filter)
                .init();
            Ok(Some(guard))
        }
        None => {
            tracing_subscriber::registry()
                .with(fmt::layer().with_writer(io::stderr))
                .with(filter)
                .init();
            Ok(None)
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    let _log_guard = init_tracing(cli.log_file.as_deref())?;
    info!("Asfalis CLI starting");

    let config = Config::load().context("Failed to load configuration")?;
    let shell = commands::Shell::new(config)?;

    let result = match cli.command {
        Command::Login { name } => shell.login(name).await,
        Command::Resume => shell.resume().await,
        Command::Scan { code } => shell.scan(&code).await,
        Command::SignOut => shell.sign_out(),
        Command::Status => shell.status(),
    };

    info!("Asfalis CLI shutting down");
    result
}
