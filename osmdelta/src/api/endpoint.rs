//! Feed endpoint URL construction.
//!
//! The change feed lives on an Overpass-style API with two HTTP GET
//! endpoints: a state endpoint answering the latest diff sequence number as
//! plain text, and a diff endpoint answering the augmented diff document
//! for a given sequence number and bounding box.

use std::fmt;
use std::str::FromStr;

use crate::error::FeedError;

/// Base URL of the public Overpass API instance.
pub const DEFAULT_BASE_URL: &str = "https://overpass-api.de/";

/// Path of the state endpoint (latest diff sequence number).
const STATE_PATH: &str = "api/augmented_diff_status";

/// Path of the diff endpoint.
const DIFF_PATH: &str = "api/augmented_diff";

/// Rectangular geographic filter limiting which changes are returned.
///
/// Wire format is `west,south,east,north`. The default covers the whole
/// world. Coordinate validation is deliberately out of scope.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundingBox {
    pub west: f64,
    pub south: f64,
    pub east: f64,
    pub north: f64,
}

impl BoundingBox {
    /// The full-world extent.
    pub const WORLD: BoundingBox = BoundingBox {
        west: -180.0,
        south: -90.0,
        east: 180.0,
        north: 90.0,
    };

    pub fn new(west: f64, south: f64, east: f64, north: f64) -> Self {
        Self {
            west,
            south,
            east,
            north,
        }
    }
}

impl Default for BoundingBox {
    fn default() -> Self {
        Self::WORLD
    }
}

impl fmt::Display for BoundingBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{},{}", self.west, self.south, self.east, self.north)
    }
}

impl FromStr for BoundingBox {
    type Err = FeedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(',').collect();
        if parts.len() != 4 {
            return Err(FeedError::Parse(format!(
                "bbox must be west,south,east,north, got {:?}",
                s
            )));
        }
        let mut values = [0.0f64; 4];
        for (slot, part) in values.iter_mut().zip(&parts) {
            *slot = part
                .trim()
                .parse()
                .map_err(|_| FeedError::Parse(format!("bbox coordinate {:?} is not a number", part)))?;
        }
        Ok(BoundingBox::new(values[0], values[1], values[2], values[3]))
    }
}

/// A change feed service endpoint.
///
/// Points at the public Overpass instance by default; any base URL works
/// for self-hosted instances.
#[derive(Clone, Debug)]
pub struct FeedEndpoint {
    base_url: String,
}

impl FeedEndpoint {
    /// Creates an endpoint on the given base URL.
    pub fn new(base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        if !base_url.ends_with('/') {
            base_url.push('/');
        }
        Self { base_url }
    }

    /// The public Overpass API instance.
    pub fn overpass() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }

    /// URL of the state endpoint.
    pub fn state_url(&self) -> String {
        format!("{}{}", self.base_url, STATE_PATH)
    }

    /// URL of the diff endpoint for one cursor value and bbox.
    ///
    /// `info=no` is fixed: the feed never needs the extra changeset info
    /// block the server would otherwise include.
    pub fn diff_url(&self, cursor: i64, bbox: &BoundingBox) -> String {
        format!(
            "{}{}?id={}&info=no&bbox={}",
            self.base_url, DIFF_PATH, cursor, bbox
        )
    }
}

impl Default for FeedEndpoint {
    fn default() -> Self {
        Self::overpass()
    }
}
