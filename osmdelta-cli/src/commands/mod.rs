//! CLI subcommands and shared argument types.

pub mod once;
pub mod watch;

use std::sync::Arc;
use std::time::Duration;

use clap::ValueEnum;

use osmdelta::{DiffScanner, FeedEndpoint, ReqwestClient, ScanDirection};

use crate::error::CliError;

/// Scan direction selection for CLI arguments.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum DirectionArg {
    /// Follow the feed towards newer diffs
    Forward,
    /// Walk backwards through diff history
    Backward,
}

impl From<DirectionArg> for ScanDirection {
    fn from(direction: DirectionArg) -> Self {
        match direction {
            DirectionArg::Forward => ScanDirection::Forward,
            DirectionArg::Backward => ScanDirection::Backward,
        }
    }
}

/// Builds the scanner shared by all subcommands.
pub fn build_scanner(
    base_url: &str,
    timeout_secs: u64,
) -> Result<DiffScanner<ReqwestClient>, CliError> {
    let client = ReqwestClient::with_timeout(Duration::from_secs(timeout_secs))?;
    Ok(DiffScanner::with_client(
        Arc::new(client),
        FeedEndpoint::new(base_url),
    ))
}
