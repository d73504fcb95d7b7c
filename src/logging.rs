//! Tracing setup for binaries embedding the runtime client
//!
//! The library itself only emits `tracing` events. These helpers install a
//! subscriber for callers that do not bring their own. `RUST_LOG` always
//! wins over the defaults chosen here.

use std::path::Path;

use anyhow::{anyhow, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

/// File name prefix for rolling log files
pub const LOG_FILE_PREFIX: &str = "recallbricks-runtime.log";

fn default_filter(debug: bool) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if debug {
            EnvFilter::new("recallbricks_runtime=debug")
        } else {
            EnvFilter::new("recallbricks_runtime=info")
        }
    })
}

/// Log to stderr at `info`
pub fn init_logging() -> Result<()> {
    init_logging_with_debug(false)
}

/// Log to stderr, at `debug` when `debug` is set
///
/// Pass `RuntimeOptions::debug` to mirror the backend's debug flag locally.
pub fn init_logging_with_debug(debug: bool) -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(default_filter(debug))
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow!("Failed to install tracing subscriber: {}", e))
}

/// Log as JSON lines to a daily rolling file under `dir`
///
/// Keep the returned guard alive for as long as logs should be written;
/// dropping it flushes and stops the background writer.
pub fn init_file_logging(dir: impl AsRef<Path>, debug: bool) -> Result<WorkerGuard> {
    let dir = dir.as_ref();
    std::fs::create_dir_all(dir)?;

    let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    tracing_subscriber::fmt()
        .json()
        .with_env_filter(default_filter(debug))
        .with_writer(writer)
        .try_init()
        .map_err(|e| anyhow!("Failed to install tracing subscriber: {}", e))?;

    Ok(guard)
}
