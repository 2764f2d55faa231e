//! The `watch` subcommand: continuous polling.

use std::time::Duration;

use clap::Args;
use tracing::info;

use osmdelta::{BoundingBox, DiffScanner, ReqwestClient, ScanConfig};

use super::DirectionArg;
use crate::error::CliError;

#[derive(Args, Debug)]
pub struct WatchArgs {
    /// Seconds between polls
    #[arg(long, default_value_t = 60)]
    interval_secs: u64,

    /// Direction the cursor walks through the diff numbering
    #[arg(long, value_enum, default_value_t = DirectionArg::Forward)]
    direction: DirectionArg,

    /// Bounding box filter as west,south,east,north (default: whole world)
    #[arg(long)]
    bbox: Option<BoundingBox>,

    /// Failed-cycle budget per cursor value; omit to retry forever
    #[arg(long)]
    max_retries: Option<u32>,
}

/// Streams records to stdout as JSON lines until interrupted.
///
/// Ctrl-C requests cooperative cancellation: the in-flight cycle finishes
/// and delivers its records before the stream closes.
pub async fn run(scanner: DiffScanner<ReqwestClient>, args: WatchArgs) -> Result<(), CliError> {
    let mut config = ScanConfig::default()
        .with_poll_interval(Duration::from_secs(args.interval_secs))
        .with_direction(args.direction.into());
    if let Some(bbox) = args.bbox {
        config = config.with_bbox(bbox);
    }
    if let Some(max_retries) = args.max_retries {
        config = config.with_max_retries(max_retries);
    }

    let (mut stream, handle) = scanner.run_stream(config).await?;

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("interrupt received, finishing the current cycle");
            handle.cancel();
        }
    });

    while let Some(record) = stream.recv().await {
        println!("{}", serde_json::to_string(&record)?);
    }

    info!("feed closed");
    Ok(())
}
