//! Error types for the change feed.

use std::future::Future;
use std::pin::Pin;

use thiserror::Error;

/// Result type for feed operations.
pub type FeedResult<T> = Result<T, FeedError>;

/// Boxed future type for dyn-compatible async methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Errors that can occur while fetching or decoding the change feed.
///
/// The scan loop folds per-cycle errors into its retry/advance decision
/// instead of propagating them; only start-up failures reach the caller.
/// `Clone` lets the loop hand the same value to the error hook and the log.
#[derive(Debug, Error, Clone)]
pub enum FeedError {
    /// Transport failure: connect error, broken body read, client build.
    #[error("network error: {0}")]
    Network(String),

    /// The request exceeded the client timeout.
    #[error("request to {url} timed out after {timeout_secs}s")]
    Timeout { url: String, timeout_secs: u64 },

    /// The server answered with a non-success status.
    #[error("HTTP {status} from {url}")]
    Http { status: u16, url: String },

    /// The state body was not an integer, or the diff document violated
    /// the expected schema.
    #[error("parse error: {0}")]
    Parse(String),

    /// The diff body carried no markup at all.
    ///
    /// Retryable: the scan loop treats this exactly like a transport
    /// failure rather than a hard error.
    #[error("diff document contains no markup")]
    EmptyDiff,
}
