//! The scan loop: cursor-driven polling of the change feed.
//!
//! # Architecture
//!
//! ```text
//! DiffScanner (orchestrator)
//!     │
//!     ├─► api::StateFetcher    one-time lookup of the starting cursor
//!     │
//!     ├─► loop (one spawned task, one fetch in flight at a time):
//!     │     api::ChangeFetcher ──► parser::parse_diff ──► Delivery
//!     │     then CursorState decides: advance or retry (config.rs budget)
//!     │     then sleep(poll_interval), unless cancelled
//!     │
//!     └─► ScanHandle (handle.rs): cooperative cancellation
//! ```
//!
//! Records from one cycle are fully delivered before the next cycle starts,
//! and a cancelled scan still finishes the cycle that is in flight. The
//! stream variant's channel closes once the loop stops.
//!
//! # Example
//!
//! ```ignore
//! use osmdelta::{DiffScanner, FeedEndpoint, ScanConfig};
//!
//! let scanner = DiffScanner::new(FeedEndpoint::overpass())?;
//! let (mut stream, handle) = scanner.run_stream(ScanConfig::default()).await?;
//!
//! while let Some(record) = stream.recv().await {
//!     println!("{} {:?}", record.action, record.entity().map(|e| e.id));
//! }
//!
//! // Stop after the current cycle:
//! handle.cancel();
//! ```

mod config;
mod cursor;
mod handle;

pub use config::{ScanConfig, ScanDirection, DEFAULT_POLL_INTERVAL};
pub use handle::ScanHandle;

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::api::{
    AsyncHttpClient, BoundingBox, ChangeFetcher, FeedEndpoint, ReqwestClient, StateFetcher,
};
use crate::error::{FeedError, FeedResult};
use crate::model::ChangeRecord;
use crate::parser::parse_diff;

use cursor::CursorState;

/// Hook receiving the raw structured error of every failed cycle.
pub type ErrorHook = Arc<dyn Fn(&FeedError) + Send + Sync>;

/// Cursor-driven scanner over the change feed.
///
/// One scanner drives one run: a one-shot batch ([`run_once`]), a pull
/// stream ([`run_stream`]), or per-cycle callbacks ([`run_callback`]).
/// Per-cycle fetch and parse errors never reach the caller; they are
/// folded into the retry/advance decision (and passed to the error hook
/// when one is installed). Only a failed start-up state fetch aborts a run.
///
/// [`run_once`]: DiffScanner::run_once
/// [`run_stream`]: DiffScanner::run_stream
/// [`run_callback`]: DiffScanner::run_callback
pub struct DiffScanner<C: AsyncHttpClient> {
    state: StateFetcher<C>,
    changes: ChangeFetcher<C>,
    on_error: Option<ErrorHook>,
}

impl DiffScanner<ReqwestClient> {
    /// Creates a scanner against `endpoint` with the default HTTP client.
    pub fn new(endpoint: FeedEndpoint) -> FeedResult<Self> {
        Ok(Self::with_client(Arc::new(ReqwestClient::new()?), endpoint))
    }
}

impl<C: AsyncHttpClient + 'static> DiffScanner<C> {
    /// Creates a scanner with an injected HTTP client.
    pub fn with_client(client: Arc<C>, endpoint: FeedEndpoint) -> Self {
        Self {
            state: StateFetcher::new(Arc::clone(&client), endpoint.clone()),
            changes: ChangeFetcher::new(client, endpoint),
            on_error: None,
        }
    }

    /// Installs a hook that receives every failed cycle's error.
    pub fn with_error_hook(mut self, hook: impl Fn(&FeedError) + Send + Sync + 'static) -> Self {
        self.on_error = Some(Arc::new(hook));
        self
    }

    /// Fetches and parses exactly one diff at the feed's current cursor.
    ///
    /// No loop, no retries, no cancellation handle.
    pub async fn run_once(&self, bbox: Option<BoundingBox>) -> FeedResult<Vec<ChangeRecord>> {
        let cursor = self.state.fetch_state().await?;
        let bbox = bbox.unwrap_or_default();
        debug!(cursor, "one-shot diff fetch");
        self.cycle(cursor, &bbox).await
    }

    /// Starts the scan loop and returns a pull stream of records.
    ///
    /// Records are pushed individually in parse order; the channel closes
    /// when the loop stops. The channel is deliberately unbounded: a slow
    /// consumer accumulates backlog instead of stalling the pacing loop.
    pub async fn run_stream(
        self,
        config: ScanConfig,
    ) -> FeedResult<(mpsc::UnboundedReceiver<ChangeRecord>, ScanHandle)> {
        let cursor = self.state.fetch_state().await?;
        let (tx, rx) = mpsc::unbounded_channel();
        let handle = self.spawn_loop(cursor, Delivery::Stream(tx), config);
        Ok((rx, handle))
    }

    /// Starts the scan loop, invoking `on_batch` once per successful cycle
    /// with that cycle's records (possibly an empty batch).
    pub async fn run_callback<F>(self, on_batch: F, config: ScanConfig) -> FeedResult<ScanHandle>
    where
        F: FnMut(Vec<ChangeRecord>) + Send + 'static,
    {
        let cursor = self.state.fetch_state().await?;
        Ok(self.spawn_loop(cursor, Delivery::Batch(Box::new(on_batch)), config))
    }

    fn spawn_loop(self, cursor: i64, delivery: Delivery, config: ScanConfig) -> ScanHandle {
        let cancellation = CancellationToken::new();
        let token = cancellation.clone();
        tokio::spawn(async move {
            self.run_loop(cursor, delivery, config, token).await;
        });
        ScanHandle::new(cancellation)
    }

    /// The scan loop. Runs until cancelled or the consumer goes away.
    async fn run_loop(
        self,
        initial_cursor: i64,
        mut delivery: Delivery,
        config: ScanConfig,
        cancellation: CancellationToken,
    ) {
        let mut cursor = CursorState::new(initial_cursor, config.direction.step());
        info!(
            cursor = cursor.value(),
            interval_ms = config.poll_interval.as_millis() as u64,
            direction = ?config.direction,
            "scan loop starting"
        );

        loop {
            match self.cycle(cursor.value(), &config.bbox).await {
                Ok(records) => {
                    debug!(
                        cursor = cursor.value(),
                        records = records.len(),
                        "diff cycle succeeded"
                    );
                    if !delivery.deliver(records) {
                        debug!("consumer gone, stopping scan");
                        break;
                    }
                    cursor.advance();
                }
                Err(err) => {
                    warn!(cursor = cursor.value(), error = %err, "diff cycle failed");
                    if let Some(hook) = &self.on_error {
                        hook(&err);
                    }
                    if cursor.fail(config.max_retries) {
                        warn!(
                            next_cursor = cursor.value(),
                            "retry budget exhausted, moving to next diff"
                        );
                    }
                }
            }

            // cancellation takes effect here, after the cycle's records
            // have been delivered, and again during the timed wait
            if cancellation.is_cancelled() {
                break;
            }
            tokio::select! {
                biased;

                _ = cancellation.cancelled() => break,
                _ = tokio::time::sleep(config.poll_interval) => {}
            }
        }

        info!("scan loop stopped");
    }

    /// One fetch-and-parse cycle. The loop awaits this to completion before
    /// doing anything else, so at most one fetch is ever in flight.
    async fn cycle(&self, cursor: i64, bbox: &BoundingBox) -> FeedResult<Vec<ChangeRecord>> {
        let document = self.changes.fetch_changes(cursor, bbox).await?;
        parse_diff(&document)
    }
}

/// How a run hands records to its consumer.
enum Delivery {
    /// Push each record into the stream channel as it is produced.
    Stream(mpsc::UnboundedSender<ChangeRecord>),
    /// Hand the whole cycle's batch to a consumer closure.
    Batch(Box<dyn FnMut(Vec<ChangeRecord>) + Send>),
}

impl Delivery {
    /// Delivers one successful cycle's records, in order.
    ///
    /// Returns false when the consumer has gone away.
    fn deliver(&mut self, records: Vec<ChangeRecord>) -> bool {
        match self {
            Delivery::Stream(tx) => records.into_iter().all(|record| tx.send(record).is_ok()),
            Delivery::Batch(on_batch) => {
                on_batch(records);
                true
            }
        }
    }
}
