//! Print orchestration
//!
//! Drives one [`PrintJob`] through fetch, encode and send:
//!
//! ```text
//! DETECTED -> FETCHING -> ENCODING -> SENDING -> ACKNOWLEDGED
//!                 \___________\___________\-----> FAILED (alert)
//! ```
//!
//! Jobs are serialized by an in-flight lock, so two callers can never hold
//! printer connections at the same time. Failures are recorded on the job and
//! on the orchestrator, and reported to the [`Alerter`] exactly once; nothing
//! is retried.

use std::sync::Arc;

use label_printer::{
    ImagePlacement, LabelSpec, NetworkPrinter, Printer, PrinterAck, encode, rasterize,
};
use parking_lot::Mutex;
use tracing::{debug, error, info, instrument};

use super::alert::{Alerter, LogAlerter, alert_text};
use super::fetch::{HttpImageFetcher, ImageFetcher};
use super::types::{ImageMode, JobState, PrintJob};
use crate::core::Config;
use crate::utils::{ErrorKind, JobError, JobResult};

pub struct PrintOrchestrator {
    fetcher: Arc<dyn ImageFetcher>,
    printer: Arc<dyn Printer>,
    alerter: Arc<dyn Alerter>,
    label: LabelSpec,
    image_x: u32,
    image_y: u32,
    image_mode: ImageMode,
    in_flight: tokio::sync::Mutex<()>,
    last_error: Mutex<Option<ErrorKind>>,
}

impl PrintOrchestrator {
    /// Image at (50, 50), embedded as-is
    pub fn new(
        fetcher: Arc<dyn ImageFetcher>,
        printer: Arc<dyn Printer>,
        alerter: Arc<dyn Alerter>,
        label: LabelSpec,
    ) -> Self {
        Self {
            fetcher,
            printer,
            alerter,
            label,
            image_x: 50,
            image_y: 50,
            image_mode: ImageMode::Raw,
            in_flight: tokio::sync::Mutex::new(()),
            last_error: Mutex::new(None),
        }
    }

    /// HTTP fetcher, network printer and log alerts, all from `config`
    pub fn from_config(config: &Config) -> JobResult<Self> {
        let fetcher = HttpImageFetcher::new(config.fetch_timeout())?;
        let printer =
            NetworkPrinter::new(config.printer_endpoint()?).with_timeout(config.printer_timeout());

        Ok(Self::new(
            Arc::new(fetcher),
            Arc::new(printer),
            Arc::new(LogAlerter),
            config.label.clone(),
        )
        .with_image_position(config.image_x, config.image_y)
        .with_image_mode(config.image_mode))
    }

    pub fn with_image_position(mut self, x: u32, y: u32) -> Self {
        self.image_x = x;
        self.image_y = y;
        self
    }

    pub fn with_image_mode(mut self, mode: ImageMode) -> Self {
        self.image_mode = mode;
        self
    }

    pub fn label(&self) -> &LabelSpec {
        &self.label
    }

    /// A job is currently between DETECTED and a terminal state
    pub fn is_busy(&self) -> bool {
        self.in_flight.try_lock().is_err()
    }

    /// Error kind of the most recent failed job
    pub fn last_error(&self) -> Option<ErrorKind> {
        *self.last_error.lock()
    }

    /// Run one job to a terminal state
    ///
    /// Waits for any job already in flight. Dropping the returned future
    /// abandons the job: the printer socket is released and no alert is raised.
    #[instrument(
        skip(self, job),
        fields(job_id = %job.id, image_url = ?job.image_url, has_message = job.last_message.is_some())
    )]
    pub async fn run_job(&self, job: &mut PrintJob) -> JobResult<()> {
        let _in_flight = self.in_flight.lock().await;
        job.error = None;
        job.ack = None;

        match self.drive(job).await {
            Ok(ack) => {
                if !ack.is_empty() {
                    info!(response = %ack.text(), "Printer response");
                }
                job.ack = Some(ack);
                advance(job, JobState::Acknowledged);
                info!("Print job acknowledged");
                Ok(())
            }
            Err(e) => {
                let kind = e.kind();
                job.error = Some(kind);
                advance(job, JobState::Failed);
                *self.last_error.lock() = Some(kind);
                error!(kind = %kind, error = %e, "Print job failed");

                let (title, message) = alert_text(&e);
                self.alerter.notify(title, &message);
                Err(e)
            }
        }
    }

    async fn drive(&self, job: &mut PrintJob) -> JobResult<PrinterAck> {
        advance(job, JobState::Fetching);
        let image_url = job.image_url.as_deref().ok_or_else(|| {
            JobError::MissingParameter("Print URL has no img parameter".to_string())
        })?;
        let image = self.fetcher.fetch(image_url).await?;

        advance(job, JobState::Encoding);
        let placement = self.place(image)?;
        let document = encode(&self.label, &placement)?;
        debug!(bytes = document.len(), "Label encoded");

        advance(job, JobState::Sending);
        Ok(self.printer.send(&document).await?)
    }

    fn place(&self, image: Vec<u8>) -> JobResult<ImagePlacement> {
        match self.image_mode {
            ImageMode::Raw => Ok(ImagePlacement::new(self.image_x, self.image_y, image)),
            ImageMode::Raster => {
                let max_width = self.label.width_dots.saturating_sub(self.image_x);
                let raster = rasterize(&image, max_width)?;
                Ok(raster.place(self.image_x, self.image_y))
            }
        }
    }
}

fn advance(job: &mut PrintJob, next: JobState) {
    debug!(from = %job.state, to = %next, "job state");
    job.state = next;
}
