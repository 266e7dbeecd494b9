//! Logging initialization for Baitbot.
//!
//! Supports three formats:
//! - `pretty`: multi-line human-readable output
//! - `component`: `[timestamp] [LEVEL] target message {fields}`, compact and grep-friendly;
//!   use the [`log_component!`] macro to add a `component` field for per-subsystem filtering
//! - `json`: structured JSON lines for log aggregators
//!
//! Any format can be redirected to an append-only log file.

use std::fs::File;
use std::sync::Arc;

use crate::config::{LogFormat, LoggingConfig};
use crate::error::Result;

/// Initialize the global tracing subscriber from config.
///
/// Call this once at startup before any tracing events are emitted.
/// Falls back to `RUST_LOG` env var; if unset, uses `cfg.level`.
///
/// # Errors
/// Returns `BaitError::Io` if the log file cannot be opened.
pub fn init_logging(cfg: &LoggingConfig) -> Result<()> {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cfg.level));
    let file = open_log_file(cfg)?.map(Arc::new);

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    // `Arc<File>` implements `MakeWriter` through `&File: Write`.
    match (cfg.format, file) {
        (LogFormat::Json, Some(file)) => builder.json().with_writer(file).init(),
        (LogFormat::Json, None) => builder.json().init(),
        (LogFormat::Pretty, Some(file)) => builder.pretty().with_writer(file).init(),
        (LogFormat::Pretty, None) => builder.pretty().init(),
        (LogFormat::Component, Some(file)) => builder
            .with_target(true)
            .with_ansi(false)
            .compact()
            .with_writer(file)
            .init(),
        (LogFormat::Component, None) => builder.with_target(true).compact().init(),
    }
    Ok(())
}

/// Opens the configured log file, if any, without installing a subscriber.
pub fn open_log_file(cfg: &LoggingConfig) -> Result<Option<File>> {
    match &cfg.file {
        Some(path) => Ok(Some(
            std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)?,
        )),
        None => Ok(None),
    }
}

/// Emit a component-tagged tracing event.
///
/// Works with any tracing level (`trace`, `debug`, `info`, `warn`, `error`).
/// The `component` field makes it easy to grep logs by subsystem:
///
/// ```
/// # use baitbot::log_component;
/// log_component!(info, "registry", "conversation registered");
/// log_component!(warn, "agent", "history trimmed", evicted = 3u64, tokens = 2998u64);
/// ```
#[macro_export]
macro_rules! log_component {
    ($level:ident, $component:expr, $msg:expr) => {
        tracing::$level!(component = $component, $msg)
    };
    ($level:ident, $component:expr, $msg:expr, $($key:ident = $val:expr),+ $(,)?) => {
        tracing::$level!(component = $component, $($key = $val,)+ $msg)
    };
}
