use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

/// Photo metadata as read from disk, before it is tied to a route.
#[derive(Debug, Clone, PartialEq)]
pub struct PhotoCandidate {
    pub filename: String,
    /// Where the file was read from. Two directories may hold the same name.
    pub path: PathBuf,
    pub timestamp: Option<DateTime<Utc>>,
    pub location: Option<GeoPoint>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchMethod {
    Gps,
    Timestamp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchPolicy {
    /// GPS snapping first, nearest timestamp when GPS is absent or too far.
    #[default]
    GpsThenTimestamp,
    /// Only photos whose GPS lies within the match radius are kept.
    GpsOnly,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhotoStats {
    pub speed: f64,
    pub elevation: f64,
    pub distance: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hr: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub power: Option<u16>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Photo {
    pub filename: String,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<GeoPoint>,
    pub route_index: usize,
    pub stats: PhotoStats,
    #[serde(skip)]
    pub method: Option<MatchMethod>,
    #[serde(skip)]
    pub source: Option<PathBuf>,
}
