//! Error types for the CLI.

use osmdelta::FeedError;
use thiserror::Error;

/// Errors surfaced by CLI commands.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Feed(#[from] FeedError),

    #[error("failed to encode record: {0}")]
    Encode(#[from] serde_json::Error),
}
