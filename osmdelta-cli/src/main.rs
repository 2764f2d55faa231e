//! OsmDelta CLI - stream OpenStreetMap changes to standard output.
//!
//! Records are printed to stdout as JSON lines; logs go to stderr so the
//! output stays pipeable.

mod commands;
mod error;

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing::error;
use tracing_subscriber::EnvFilter;

use osmdelta::api::DEFAULT_BASE_URL;

#[derive(Parser)]
#[command(
    name = "osmdelta",
    about = "Stream OpenStreetMap changes from augmented diffs",
    version
)]
struct Cli {
    /// Base URL of the Overpass-style API instance
    #[arg(long, global = true, default_value = DEFAULT_BASE_URL)]
    base_url: String,

    /// HTTP request timeout in seconds
    #[arg(long, global = true, default_value_t = 30)]
    timeout_secs: u64,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Continuously poll the feed and print records as JSON lines
    Watch(commands::watch::WatchArgs),
    /// Fetch one diff at the current cursor and print its records
    Once(commands::once::OnceArgs),
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let scanner = match commands::build_scanner(&cli.base_url, cli.timeout_secs) {
        Ok(scanner) => scanner,
        Err(err) => {
            error!(error = %err, "failed to set up feed client");
            return ExitCode::FAILURE;
        }
    };

    let result = match cli.command {
        Command::Watch(args) => commands::watch::run(scanner, args).await,
        Command::Once(args) => commands::once::run(scanner, args).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = %err, "command failed");
            ExitCode::FAILURE
        }
    }
}
