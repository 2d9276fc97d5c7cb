//! Utilities - error kinds and logging

pub mod error;
pub mod logger;

pub use error::{ErrorKind, JobError, JobResult};
