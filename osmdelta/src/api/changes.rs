//! Diff endpoint fetcher.

use std::sync::Arc;

use crate::api::{AsyncHttpClient, BoundingBox, FeedEndpoint};
use crate::error::FeedResult;

/// Retrieves the raw augmented diff document for a given cursor value.
///
/// Content is returned as-is; decoding is the parser's job.
pub struct ChangeFetcher<C: AsyncHttpClient> {
    client: Arc<C>,
    endpoint: FeedEndpoint,
}

impl<C: AsyncHttpClient> ChangeFetcher<C> {
    pub fn new(client: Arc<C>, endpoint: FeedEndpoint) -> Self {
        Self { client, endpoint }
    }

    /// Fetches the diff document at `cursor`, filtered to `bbox`.
    pub async fn fetch_changes(&self, cursor: i64, bbox: &BoundingBox) -> FeedResult<String> {
        let url = self.endpoint.diff_url(cursor, bbox);
        self.client.get_text(&url).await
    }
}
