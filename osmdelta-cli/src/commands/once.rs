//! The `once` subcommand: a single batch.

use clap::Args;
use tracing::info;

use osmdelta::{BoundingBox, DiffScanner, ReqwestClient};

use crate::error::CliError;

#[derive(Args, Debug)]
pub struct OnceArgs {
    /// Bounding box filter as west,south,east,north (default: whole world)
    #[arg(long)]
    bbox: Option<BoundingBox>,
}

/// Fetches one diff at the feed's current cursor and prints its records.
pub async fn run(scanner: DiffScanner<ReqwestClient>, args: OnceArgs) -> Result<(), CliError> {
    let records = scanner.run_once(args.bbox).await?;
    info!(records = records.len(), "fetched one diff");

    for record in records {
        println!("{}", serde_json::to_string(&record)?);
    }
    Ok(())
}
