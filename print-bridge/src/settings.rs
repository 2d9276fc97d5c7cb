//! Web-view settings polling
//!
//! The settings store only supplies the page the web view should show. It is
//! re-read on an interval and every change is forwarded to the print worker
//! as [`ViewEvent::PageChanged`].

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::printing::ViewEvent;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    #[serde(alias = "WebViewUrl", default)]
    pub web_view_url: String,
}

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Settings IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Settings parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

#[async_trait]
pub trait SettingsStore: Send + Sync {
    /// `Ok(None)` when nothing has been saved yet
    async fn load(&self) -> Result<Option<Settings>, SettingsError>;
}

/// Settings kept in a JSON file
#[derive(Debug, Clone)]
pub struct FileSettingsStore {
    path: PathBuf,
}

impl FileSettingsStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn save(&self, settings: &Settings) -> Result<(), SettingsError> {
        let json = serde_json::to_string_pretty(settings)?;
        tokio::fs::write(&self.path, json).await?;
        Ok(())
    }
}

#[async_trait]
impl SettingsStore for FileSettingsStore {
    async fn load(&self) -> Result<Option<Settings>, SettingsError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(text) => Ok(Some(serde_json::from_str(&text)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

/// Re-read `store` every `interval` and forward URL changes to `events`
///
/// The first successful read is always forwarded. Read failures are logged
/// and retried on the next tick. Returns on shutdown or when the receiver is
/// gone.
pub async fn poll_settings(
    store: Arc<dyn SettingsStore>,
    interval: Duration,
    events: mpsc::Sender<ViewEvent>,
    shutdown: CancellationToken,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    let mut last_url: Option<String> = None;

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => {
                tracing::debug!("Settings poller stopped");
                return;
            }
            _ = ticker.tick() => {}
        }

        let url = match store.load().await {
            Ok(Some(settings)) if !settings.web_view_url.trim().is_empty() => settings.web_view_url,
            Ok(_) => {
                tracing::warn!("WebView URL not found in settings");
                continue;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Error fetching settings");
                continue;
            }
        };

        if last_url.as_deref() == Some(url.as_str()) {
            continue;
        }

        tracing::info!(url = %url, "WebView URL loaded from settings");
        last_url = Some(url.clone());
        if events.send(ViewEvent::PageChanged(url)).await.is_err() {
            tracing::debug!("Print worker gone, settings poller stopping");
            return;
        }
    }
}
