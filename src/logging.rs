//! Log file setup
//!
//! Logs go to a file so the terminal stays free for the progress display.

use crate::Result;
use anyhow::Context;
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

/// Default log level when `RUST_LOG` is not set
const DEFAULT_FILTER: &str = "info";

/// Install a global subscriber appending to `path`.
///
/// The returned guard flushes buffered lines on drop and must be held until exit.
pub fn init<P: AsRef<Path>>(path: P) -> Result<WorkerGuard> {
    let path = path.as_ref();
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("failed to open log file {:?}", path))?;

    let (writer, guard) = tracing_appender::non_blocking(file);
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .with_target(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to install log subscriber: {}", e))?;

    Ok(guard)
}
