//! Print trigger detection
//!
//! Pure URL inspection, no I/O: a navigation URL containing `print` starts a
//! job, and the `img` query parameter names the image to print.

use reqwest::Url;
use tracing::debug;

use super::types::PrintJob;

/// Substring that marks a navigation as a print request
pub const PRINT_MARKER: &str = "print";

/// Query parameter carrying the image URL
pub const IMAGE_PARAM: &str = "img";

#[derive(Debug, Clone, Default)]
pub struct TriggerDetector;

impl TriggerDetector {
    pub fn new() -> Self {
        Self
    }

    /// Inspect one navigation URL
    ///
    /// Also used for manual triggers with the view's current URL. A trigger
    /// without `img` still yields a job; the fetch step reports it.
    pub fn on_navigation(&self, url: &str) -> Option<PrintJob> {
        if !url.contains(PRINT_MARKER) {
            return None;
        }

        let image_url = query_param(url, IMAGE_PARAM).filter(|v| !v.is_empty());
        debug!(url = %url, image_url = ?image_url, "print trigger detected");
        Some(PrintJob::new(url, image_url))
    }
}

/// First value of query parameter `name`, percent- and `+`-decoded
///
/// Works on relative and malformed URLs too: only the part between the first
/// `?` and the fragment is parsed.
pub fn query_param(url: &str, name: &str) -> Option<String> {
    let (_, query) = url.split_once('?')?;
    let query = query.split_once('#').map_or(query, |(q, _)| q);
    let parsed = Url::parse(&format!("http://localhost/?{}", query)).ok()?;
    parsed
        .query_pairs()
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.into_owned())
}
