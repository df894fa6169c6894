//! Structured logging for import runs.
//!
//! Intended for the binaries and services embedding this crate: console
//! plus a daily-rotating file, with a run-correlation UUID so one publish
//! run's lines can be grepped together.
//!
//! Environment variables:
//! - `LOG_FORMAT=pretty|json` (default: pretty)
//! - `LOG_DIR=/path/to/logs` (default: ./logs)
//! - `RUN_ID=<uuid>` (default: auto-generated)
//! - `RUST_LOG=level` (default: info)

use std::io;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl LogFormat {
    pub fn from_env() -> Self {
        match std::env::var("LOG_FORMAT")
            .unwrap_or_default()
            .to_lowercase()
            .as_str()
        {
            "json" => LogFormat::Json,
            _ => LogFormat::Pretty,
        }
    }
}

/// The run-correlation id: `RUN_ID` from the environment when set and
/// valid, a fresh UUID otherwise.
pub fn run_id() -> Uuid {
    std::env::var("RUN_ID")
        .ok()
        .and_then(|s| Uuid::parse_str(&s).ok())
        .unwrap_or_else(Uuid::new_v4)
}

/// Install console + rotating-file logging.
///
/// Returns the writer guard; keep it alive for the program lifetime so
/// the non-blocking file writer flushes on exit.
pub fn init_logging() -> WorkerGuard {
    let format = LogFormat::from_env();
    let log_dir = std::env::var("LOG_DIR").unwrap_or_else(|_| "./logs".to_string());
    let run_id = run_id();

    if let Err(e) = std::fs::create_dir_all(&log_dir) {
        eprintln!("Failed to create log directory: {}", e);
    }

    let file_appender = tracing_appender::rolling::daily(&log_dir, "turnering.log");
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    let filter = || {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("info,turnering_import=info"))
    };

    let file_layer = fmt::layer()
        .with_writer(file_writer)
        .with_target(true)
        .with_ansi(false)
        .compact()
        .with_filter(filter());

    let console = match format {
        LogFormat::Pretty => fmt::layer()
            .with_writer(io::stdout)
            .with_target(false)
            .pretty()
            .with_filter(filter())
            .boxed(),
        LogFormat::Json => fmt::layer()
            .with_writer(io::stdout)
            .with_ansi(false)
            .json()
            .flatten_event(true)
            .with_filter(filter())
            .boxed(),
    };
    tracing_subscriber::registry()
        .with(console)
        .with(file_layer)
        .init();

    tracing::info!(
        run_id = %run_id,
        log_format = ?format,
        log_dir = %log_dir,
        "Logging initialized"
    );

    guard
}
