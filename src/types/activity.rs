use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackPoint {
    pub lat: f64,
    pub lon: f64,
    pub elevation: Option<f64>,
    pub time: DateTime<Utc>,
    pub heart_rate: Option<u16>,
    pub power: Option<u16>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FileFormat {
    Fit,
    Tcx,
    Gpx,
}

impl FileFormat {
    pub fn from_filename(filename: &str) -> Option<Self> {
        let (_, ext) = filename.rsplit_once('.')?;
        match ext.to_lowercase().as_str() {
            "fit" => Some(FileFormat::Fit),
            "tcx" => Some(FileFormat::Tcx),
            "gpx" => Some(FileFormat::Gpx),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FileFormat::Fit => "fit",
            FileFormat::Tcx => "tcx",
            FileFormat::Gpx => "gpx",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ParsedActivity {
    pub points: Vec<TrackPoint>,
    pub file_format: FileFormat,
}

/// A trackpoint with the metrics derived from its predecessor.
///
/// Serialized as one entry of a ride's `route` array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedTrackPoint {
    pub lat: f64,
    pub lon: f64,
    pub ele: f64,
    pub time: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hr: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub power: Option<u16>,
    /// km/h
    pub speed: f64,
    /// Cumulative km from the first point.
    pub distance: f64,
    /// Percent, over the pair formed with the previous point.
    pub gradient: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub distance: f64,
    pub elevation_gain: f64,
    pub duration: u64,
    pub avg_speed: f64,
    pub max_speed: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avg_hr: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avg_power: Option<u16>,
    pub max_elevation: f64,
}

#[derive(Debug, Clone)]
pub struct ProcessedActivity {
    pub points: Vec<EnrichedTrackPoint>,
    pub summary: Summary,
}

impl ProcessedActivity {
    pub fn start_time(&self) -> Option<DateTime<Utc>> {
        self.points.first().map(|p| p.time)
    }
}
