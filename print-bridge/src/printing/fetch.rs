//! Image acquisition over HTTP

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};
use tracing::{info, instrument};

use crate::utils::{JobError, JobResult};

/// Downloads the image a job refers to
#[async_trait]
pub trait ImageFetcher: Send + Sync {
    /// GET `url` and buffer the whole body
    async fn fetch(&self, url: &str) -> JobResult<Vec<u8>>;
}

/// reqwest-backed fetcher; one GET per call, no retries
#[derive(Debug, Clone)]
pub struct HttpImageFetcher {
    client: Client,
}

impl HttpImageFetcher {
    pub fn new(timeout: Duration) -> JobResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| JobError::NetworkUnavailable(format!("HTTP client init failed: {}", e)))?;
        Ok(Self { client })
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ImageFetcher for HttpImageFetcher {
    #[instrument(skip(self))]
    async fn fetch(&self, url: &str) -> JobResult<Vec<u8>> {
        let parsed = Url::parse(url)
            .map_err(|e| JobError::MissingParameter(format!("img is not a URL ({}): {}", url, e)))?;

        let response = self
            .client
            .get(parsed)
            .send()
            .await
            .map_err(|e| JobError::NetworkUnavailable(format!("{}: {}", url, e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(JobError::BadResponse(format!("{} returned {}", url, status)));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| JobError::NetworkUnavailable(format!("{}: {}", url, e)))?;

        if body.is_empty() {
            return Err(JobError::BadResponse(format!("{} returned an empty body", url)));
        }

        info!(bytes = body.len(), "Image fetched");
        Ok(body.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::ErrorKind;

    #[tokio::test]
    async fn test_invalid_url() {
        let fetcher = HttpImageFetcher::new(Duration::from_secs(1)).unwrap();
        let err = fetcher.fetch("1.png").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingParameter);
    }

    #[tokio::test]
    async fn test_unreachable_host() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let client = Client::builder().no_proxy().build().unwrap();
        let fetcher = HttpImageFetcher::with_client(client);
        let err = fetcher
            .fetch(&format!("http://127.0.0.1:{}/1.png", port))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NetworkUnavailable);
    }
}
