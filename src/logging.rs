//! File-based logging for playback-hub
//!
//! stdout carries the session transcript printed by the binary, so tracing
//! output goes to a daily rolling file instead.

use std::path::Path;

use anyhow::Context;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

pub const DEFAULT_LOG_DIR: &str = ".logs";
const LOG_FILE_PREFIX: &str = "playback-hub";
const DEFAULT_FILTER: &str = "playback_hub=debug,warn";

/// Install the global subscriber writing to `<dir>/playback-hub.YYYY-MM-DD.log`.
///
/// `RUST_LOG` overrides the default filter (`playback_hub` at DEBUG, other
/// crates at WARN). Buffered lines are flushed when the returned guard is
/// dropped, so hold it until the process exits.
pub fn init_logging(dir: &Path) -> anyhow::Result<WorkerGuard> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("creating log directory {}", dir.display()))?;

    let appender = RollingFileAppender::new(Rotation::DAILY, dir, LOG_FILE_PREFIX);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let file_layer = fmt::layer()
        .with_writer(writer)
        .with_ansi(false)
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE);

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .try_init()
        .context("a global tracing subscriber is already installed")?;

    tracing::info!(dir = %dir.display(), "Logging initialized");
    Ok(guard)
}

/// Log the result of a backend transport command
#[macro_export]
macro_rules! log_command_result {
    ($operation:expr, $result:expr) => {
        match &$result {
            Ok(_) => tracing::trace!(operation = $operation, "Backend command succeeded"),
            Err(e) => tracing::warn!(operation = $operation, error = %e, "Backend command failed"),
        }
    };
}
