//! Logging
//!
//! stdout by default, or a daily rolling `print-bridge.YYYY-MM-DD` file when a
//! log directory is configured. `RUST_LOG` overrides the configured level.

use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

/// Initialize stdout logging at `info`
pub fn init_logger() -> Option<WorkerGuard> {
    init_logger_with_file(None, None)
}

/// Initialize logging with optional file output
///
/// Keep the returned guard alive for the life of the process: dropping it
/// flushes and stops the file writer.
pub fn init_logger_with_file(log_level: Option<&str>, log_dir: Option<&str>) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level.unwrap_or("info")));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_line_number(false)
        .with_thread_ids(false);

    if let Some(dir) = log_dir.map(Path::new) {
        match std::fs::create_dir_all(dir) {
            Ok(()) => {
                let appender = tracing_appender::rolling::daily(dir, "print-bridge");
                let (writer, guard) = tracing_appender::non_blocking(appender);
                let _ = builder.with_ansi(false).with_writer(writer).try_init();
                return Some(guard);
            }
            // No subscriber yet, so this cannot go through tracing
            Err(e) => eprintln!("Log directory {} unusable, logging to stdout: {}", dir.display(), e),
        }
    }

    let _ = builder.try_init();
    None
}
