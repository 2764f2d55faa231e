//! Scan loop configuration.

use std::time::Duration;

use crate::api::BoundingBox;

/// Default delay between scan cycles.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(60);

/// Which way the cursor walks through the diff numbering.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ScanDirection {
    /// Follow the feed towards newer diffs (+1 per cycle).
    #[default]
    Forward,
    /// Walk backwards through history (-1 per cycle).
    Backward,
}

impl ScanDirection {
    /// The signed cursor step this direction applies each cycle.
    pub fn step(self) -> i64 {
        match self {
            ScanDirection::Forward => 1,
            ScanDirection::Backward => -1,
        }
    }
}

/// Configuration for a scan run.
#[derive(Clone, Debug)]
pub struct ScanConfig {
    /// Delay between cycles; constant and independent of cycle outcome.
    pub poll_interval: Duration,

    /// Cursor direction.
    pub direction: ScanDirection,

    /// Geographic filter applied to every diff fetch.
    pub bbox: BoundingBox,

    /// Failed-cycle budget per cursor value.
    ///
    /// `None` retries the same cursor forever. `Some(0)` advances on every
    /// failure. `Some(n)` retries the same cursor n times before moving on
    /// without emitting anything for it.
    pub max_retries: Option<u32>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            direction: ScanDirection::default(),
            bbox: BoundingBox::WORLD,
            max_retries: None,
        }
    }
}

impl ScanConfig {
    /// Set the delay between cycles.
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Set the cursor direction.
    pub fn with_direction(mut self, direction: ScanDirection) -> Self {
        self.direction = direction;
        self
    }

    /// Set the geographic filter.
    pub fn with_bbox(mut self, bbox: BoundingBox) -> Self {
        self.bbox = bbox;
        self
    }

    /// Set the failed-cycle budget.
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = Some(max_retries);
        self
    }
}
