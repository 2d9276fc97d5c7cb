//! Print Bridge - prints invoices shown in an embedded web view
//!
//! # Architecture
//!
//! - **Trigger detection** (`printing::trigger`): navigation URLs containing
//!   `print` start a job; `img` names the image
//! - **Image acquisition** (`printing::fetch`): HTTP GET of the image
//! - **Encoding + transport** (`label-printer`): ZPL over TCP 9100
//! - **Orchestration** (`printing::service`, `printing::worker`): one job at
//!   a time, failures alerted once
//! - **Settings** (`settings`): polled web-view URL
//!
//! ```text
//! print-bridge/src/
//! ├── core/          # configuration
//! ├── printing/      # trigger, fetch, orchestrator, worker, alerts
//! ├── settings.rs    # polled settings file
//! └── utils/         # error kinds, logging
//! ```

pub mod core;
pub mod printing;
pub mod settings;
pub mod utils;

use tracing_appender::non_blocking::WorkerGuard;

// Re-export public types
pub use crate::core::Config;
pub use printing::{
    JobState, PrintHandle, PrintJob, PrintOrchestrator, PrintWorker, TriggerDetector, ViewEvent,
    spawn_print_worker,
};
pub use settings::{FileSettingsStore, Settings, SettingsStore, poll_settings};
pub use utils::{ErrorKind, JobError, JobResult};

// Re-export logger functions
pub use utils::logger::{init_logger, init_logger_with_file};

/// Load `.env` and initialize logging from the environment
///
/// The returned guard must outlive the program when logging to a file.
pub fn setup_environment() -> (Config, Option<WorkerGuard>) {
    let _ = dotenv::dotenv();
    let config = Config::from_env();
    let guard = init_logger_with_file(Some(&config.log_level), config.log_dir.as_deref());
    (config, guard)
}
