//! Change feed service access.
//!
//! This module provides the HTTP seam and the two fetchers the scan loop
//! drives: [`StateFetcher`] for the latest cursor value and
//! [`ChangeFetcher`] for individual diff documents.
//!
//! # Testability
//!
//! All network access goes through the [`AsyncHttpClient`] trait, so tests
//! inject mock clients instead of touching the network:
//!
//! ```ignore
//! use osmdelta::api::{FeedEndpoint, StateFetcher};
//!
//! let fetcher = StateFetcher::new(client, FeedEndpoint::overpass());
//! let cursor = fetcher.fetch_state().await?;
//! ```

mod changes;
mod endpoint;
mod http;
mod state;

pub use changes::ChangeFetcher;
pub use endpoint::{BoundingBox, FeedEndpoint, DEFAULT_BASE_URL};
pub use http::{AsyncHttpClient, ReqwestClient};
pub use state::StateFetcher;

#[cfg(test)]
pub use http::tests::{MockHttpClient, ScriptedHttpClient};
