//! Print job types

use std::fmt;
use std::str::FromStr;

use label_printer::PrinterAck;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::utils::ErrorKind;

/// Print job lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobState {
    Detected,
    Fetching,
    Encoding,
    Sending,
    Acknowledged,
    Failed,
}

impl JobState {
    pub fn is_terminal(self) -> bool {
        matches!(self, JobState::Acknowledged | JobState::Failed)
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            JobState::Detected => "DETECTED",
            JobState::Fetching => "FETCHING",
            JobState::Encoding => "ENCODING",
            JobState::Sending => "SENDING",
            JobState::Acknowledged => "ACKNOWLEDGED",
            JobState::Failed => "FAILED",
        };
        f.write_str(s)
    }
}

/// One detected print request
#[derive(Debug, Clone)]
pub struct PrintJob {
    pub id: Uuid,
    /// Navigation URL that triggered the job
    pub trigger_url: String,
    /// Decoded `img` query parameter, if present
    pub image_url: Option<String>,
    pub state: JobState,
    /// Set when the job fails
    pub error: Option<ErrorKind>,
    /// Printer reply, set when the job is acknowledged
    pub ack: Option<PrinterAck>,
    /// Last message the page posted before this job was detected
    pub last_message: Option<String>,
}

impl PrintJob {
    pub fn new(trigger_url: impl Into<String>, image_url: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            trigger_url: trigger_url.into(),
            image_url,
            state: JobState::Detected,
            error: None,
            ack: None,
            last_message: None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }
}

/// How fetched image bytes are placed in the graphic field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageMode {
    /// Embed the downloaded bytes unchanged
    #[default]
    Raw,
    /// Decode, scale to the label width and convert to a 1-bit bitmap
    Raster,
}

impl FromStr for ImageMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "raw" => Ok(ImageMode::Raw),
            "raster" => Ok(ImageMode::Raster),
            other => Err(format!("Unknown image mode: {}", other)),
        }
    }
}

/// Events from the hosting web view
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewEvent {
    /// The view navigated to a URL
    Navigated(String),
    /// "Generate now" pressed: re-examine the current URL
    GenerateNow,
    /// Settings changed the page the view shows
    PageChanged(String),
    /// The page posted a message (the invoice it is showing)
    Message(String),
    /// The view was torn down; abandon any job in flight
    Unloaded,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_job_is_detected() {
        let job = PrintJob::new("http://host/print", None);
        assert_eq!(job.state, JobState::Detected);
        assert!(!job.is_terminal());
        assert!(job.error.is_none());
        assert!(job.last_message.is_none());
    }

    #[test]
    fn test_terminal_states() {
        assert!(JobState::Acknowledged.is_terminal());
        assert!(JobState::Failed.is_terminal());
        assert!(!JobState::Sending.is_terminal());
    }

    #[test]
    fn test_image_mode_parse() {
        assert_eq!("RASTER".parse::<ImageMode>().unwrap(), ImageMode::Raster);
        assert_eq!("raw".parse::<ImageMode>().unwrap(), ImageMode::Raw);
        assert!("jpeg".parse::<ImageMode>().is_err());
    }
}
