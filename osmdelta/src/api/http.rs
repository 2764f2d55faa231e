//! HTTP client abstraction for testability

use std::time::Duration;

use crate::error::{BoxFuture, FeedError, FeedResult};

/// Default timeout for feed requests in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Trait for HTTP client operations.
///
/// This abstraction allows for dependency injection and easier testing by
/// enabling mock HTTP clients in tests. The boxed future keeps the trait
/// dyn-compatible and the scanner's loop future `Send`-spawnable.
pub trait AsyncHttpClient: Send + Sync {
    /// Performs an HTTP GET request and returns the body as text.
    fn get_text<'a>(&'a self, url: &'a str) -> BoxFuture<'a, FeedResult<String>>;
}

/// Real HTTP client implementation using reqwest.
pub struct ReqwestClient {
    client: reqwest::Client,
    timeout: Duration,
}

impl ReqwestClient {
    /// Creates a new ReqwestClient with the default timeout.
    pub fn new() -> FeedResult<Self> {
        Self::with_timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    /// Creates a new ReqwestClient with a custom timeout.
    pub fn with_timeout(timeout: Duration) -> FeedResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FeedError::Network(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self { client, timeout })
    }
}

impl AsyncHttpClient for ReqwestClient {
    fn get_text<'a>(&'a self, url: &'a str) -> BoxFuture<'a, FeedResult<String>> {
        Box::pin(async move {
            let response = self.client.get(url).send().await.map_err(|e| {
                if e.is_timeout() {
                    FeedError::Timeout {
                        url: url.to_string(),
                        timeout_secs: self.timeout.as_secs(),
                    }
                } else {
                    FeedError::Network(format!("request to {} failed: {}", url, e))
                }
            })?;

            let status = response.status();
            if !status.is_success() {
                return Err(FeedError::Http {
                    status: status.as_u16(),
                    url: url.to_string(),
                });
            }

            response.text().await.map_err(|e| {
                FeedError::Network(format!("failed to read response from {}: {}", url, e))
            })
        })
    }
}
