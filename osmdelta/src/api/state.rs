//! State endpoint fetcher.

use std::sync::Arc;

use crate::api::{AsyncHttpClient, FeedEndpoint};
use crate::error::{FeedError, FeedResult};

/// Retrieves the latest diff sequence number from the service.
///
/// State is fetched exactly once per run invocation; there are no internal
/// retries here. Retrying belongs to the scan loop, and only for the
/// change fetch.
pub struct StateFetcher<C: AsyncHttpClient> {
    client: Arc<C>,
    endpoint: FeedEndpoint,
}

impl<C: AsyncHttpClient> StateFetcher<C> {
    pub fn new(client: Arc<C>, endpoint: FeedEndpoint) -> Self {
        Self { client, endpoint }
    }

    /// Fetches the current cursor value.
    ///
    /// The response body is plain text containing a single base-10 integer.
    pub async fn fetch_state(&self) -> FeedResult<i64> {
        let url = self.endpoint.state_url();
        let body = self.client.get_text(&url).await?;
        let trimmed = body.trim();
        trimmed.parse::<i64>().map_err(|_| {
            FeedError::Parse(format!("state body is not an integer: {:?}", trimmed))
        })
    }
}
