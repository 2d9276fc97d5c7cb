//! Invoice Printing Module
//!
//! Turns web-view navigation into printed labels:
//! - Trigger detection: which navigations are print requests
//! - Image acquisition: download the image named by the trigger
//! - Orchestration: fetch, encode, send, alert on failure
//! - Worker: one job at a time, newest trigger queued behind it

pub mod alert;
pub mod fetch;
pub mod service;
pub mod trigger;
pub mod types;
pub mod worker;

pub use alert::{Alerter, LogAlerter, alert_text};
pub use fetch::{HttpImageFetcher, ImageFetcher};
pub use service::PrintOrchestrator;
pub use trigger::{TriggerDetector, query_param};
pub use types::*;
pub use worker::{PrintHandle, PrintWorker, spawn_print_worker};
