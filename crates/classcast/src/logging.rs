//! Tracing subscriber setup for the binary.

use crate::AppResult;

use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize stderr plus daily-rolling-file logging.
///
/// The returned guard must stay alive for the process lifetime so buffered
/// lines are flushed on exit. Per-session transcoder diagnostics are NOT
/// routed here; the supervisor writes those to their own artifacts.
///
/// # Errors
///
/// Log directory cannot be created.
pub fn init(log_dir: &Path) -> AppResult<WorkerGuard> {
    std::fs::create_dir_all(log_dir)?;

    let file_appender = tracing_appender::rolling::daily(log_dir, "classcast.log");
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("classcast=debug,classcast_core=debug"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(fmt::layer().with_ansi(false).with_writer(file_writer))
        .init();

    Ok(guard)
}
