//! Print Worker
//!
//! Single consumer of web-view events. Runs at most one job at a time and
//! keeps at most one job queued behind it: a trigger that arrives while a job
//! is printing replaces whatever is already queued, since a stale print
//! request is not worth repeating.
//!
//! The latest message posted by the page is handed to the next detected job
//! and then forgotten.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::SendError;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::service::PrintOrchestrator;
use super::trigger::TriggerDetector;
use super::types::{PrintJob, ViewEvent};

/// Capacity of the event channel feeding the worker
pub const EVENT_CHANNEL_CAPACITY: usize = 32;

/// What an event asks the worker to do
enum Intake {
    Job(PrintJob),
    Abandon,
}

pub struct PrintWorker {
    orchestrator: Arc<PrintOrchestrator>,
    detector: TriggerDetector,
    current_url: String,
    last_message: Option<String>,
}

impl PrintWorker {
    pub fn new(orchestrator: Arc<PrintOrchestrator>, initial_url: impl Into<String>) -> Self {
        Self {
            orchestrator,
            detector: TriggerDetector::new(),
            current_url: initial_url.into(),
            last_message: None,
        }
    }

    /// URL the view currently shows
    pub fn current_url(&self) -> &str {
        &self.current_url
    }

    /// Run until shutdown, or until the channel closes and the queue drains
    pub async fn run(mut self, mut event_rx: mpsc::Receiver<ViewEvent>, shutdown: CancellationToken) {
        tracing::info!("Print worker started");
        let mut pending: Option<PrintJob> = None;
        let mut channel_open = true;

        loop {
            let mut job = match pending.take() {
                Some(job) => job,
                None if !channel_open => {
                    tracing::info!("Event channel closed, print worker stopping");
                    break;
                }
                None => {
                    tokio::select! {
                        _ = shutdown.cancelled() => {
                            tracing::info!("Print worker received shutdown signal");
                            break;
                        }
                        event = event_rx.recv() => match event {
                            Some(event) => match self.intake(event) {
                                Some(Intake::Job(job)) => job,
                                Some(Intake::Abandon) | None => continue,
                            },
                            None => {
                                channel_open = false;
                                continue;
                            }
                        }
                    }
                }
            };

            let job_id = job.id;
            let orchestrator = Arc::clone(&self.orchestrator);
            let run = orchestrator.run_job(&mut job);
            tokio::pin!(run);

            loop {
                tokio::select! {
                    biased;
                    _ = shutdown.cancelled() => {
                        tracing::warn!(job_id = %job_id, "Shutdown while printing, job abandoned");
                        return;
                    }
                    _ = &mut run => break,
                    event = event_rx.recv(), if channel_open => match event {
                        Some(event) => match self.intake(event) {
                            Some(Intake::Job(next)) => {
                                if let Some(stale) = pending.replace(next) {
                                    tracing::warn!(
                                        job_id = %stale.id,
                                        "Queued print job replaced by a newer trigger"
                                    );
                                } else {
                                    tracing::info!("Print job queued behind the running one");
                                }
                            }
                            Some(Intake::Abandon) => {
                                tracing::warn!(job_id = %job_id, "View unloaded, job abandoned");
                                pending = None;
                                break;
                            }
                            None => {}
                        },
                        None => channel_open = false,
                    }
                }
            }
        }
    }

    fn intake(&mut self, event: ViewEvent) -> Option<Intake> {
        let job = match event {
            ViewEvent::Navigated(url) => {
                let job = self.detector.on_navigation(&url);
                self.current_url = url;
                job
            }
            ViewEvent::GenerateNow => {
                let job = self.detector.on_navigation(&self.current_url);
                if job.is_none() {
                    tracing::info!(url = %self.current_url, "Manual print: current page is not a print page");
                }
                job
            }
            ViewEvent::PageChanged(url) => {
                tracing::info!(url = %url, "Web view page changed");
                self.current_url = url;
                None
            }
            ViewEvent::Message(message) => {
                tracing::info!(message = %message, "Message from web view");
                self.last_message = Some(message);
                None
            }
            ViewEvent::Unloaded => {
                self.last_message = None;
                return Some(Intake::Abandon);
            }
        };

        job.map(|mut job| {
            job.last_message = self.last_message.take();
            Intake::Job(job)
        })
    }
}

/// Sending side of the worker's event channel
#[derive(Debug, Clone)]
pub struct PrintHandle {
    tx: mpsc::Sender<ViewEvent>,
}

impl PrintHandle {
    pub fn new(tx: mpsc::Sender<ViewEvent>) -> Self {
        Self { tx }
    }

    pub async fn navigate(&self, url: impl Into<String>) -> Result<(), SendError<ViewEvent>> {
        self.tx.send(ViewEvent::Navigated(url.into())).await
    }

    pub async fn generate_now(&self) -> Result<(), SendError<ViewEvent>> {
        self.tx.send(ViewEvent::GenerateNow).await
    }

    pub async fn post_message(&self, message: impl Into<String>) -> Result<(), SendError<ViewEvent>> {
        self.tx.send(ViewEvent::Message(message.into())).await
    }

    pub async fn unload(&self) -> Result<(), SendError<ViewEvent>> {
        self.tx.send(ViewEvent::Unloaded).await
    }

    /// Raw sender for other producers (e.g. the settings poller)
    pub fn sender(&self) -> mpsc::Sender<ViewEvent> {
        self.tx.clone()
    }
}

/// Spawn a [`PrintWorker`] and return its handle
pub fn spawn_print_worker(
    orchestrator: Arc<PrintOrchestrator>,
    initial_url: impl Into<String>,
    shutdown: CancellationToken,
) -> (PrintHandle, JoinHandle<()>) {
    let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
    let worker = PrintWorker::new(orchestrator, initial_url);
    let task = tokio::spawn(worker.run(rx, shutdown));
    (PrintHandle::new(tx), task)
}
