use std::path::PathBuf;

use chrono::Duration;

use crate::error::AppError;
use crate::types::photo::MatchPolicy;

#[derive(Debug, Clone)]
pub struct Config {
    pub tracks_dir: PathBuf,
    pub photo_dirs: Vec<PathBuf>,
    pub output: PathBuf,
    pub copy_photos_to: Option<PathBuf>,
    pub matching: MatchConfig,
    pub downsample_stride: usize,
}

/// Knobs for tying photos to a route.
#[derive(Debug, Clone)]
pub struct MatchConfig {
    pub radius_m: f64,
    pub time_window: Duration,
    pub policy: MatchPolicy,
    /// Applied to EXIF capture times that carry no offset of their own.
    pub camera_utc_offset_minutes: i32,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            radius_m: 100.0,
            time_window: Duration::hours(2),
            policy: MatchPolicy::GpsThenTimestamp,
            camera_utc_offset_minutes: 0,
        }
    }
}

impl MatchConfig {
    /// The photo window for a whole number of hours. Negative counts and
    /// counts beyond what a `Duration` holds are rejected.
    pub fn window_from_hours(hours: i64) -> Result<Duration, AppError> {
        Duration::try_hours(hours)
            .filter(|_| hours >= 0)
            .ok_or_else(|| AppError::InvalidSetting {
                name: "time window (hours)",
                value: hours.to_string(),
            })
    }

    /// Camera offsets must stay within a day of UTC.
    pub fn checked_camera_offset(minutes: i32) -> Result<i32, AppError> {
        if minutes.unsigned_abs() < 24 * 60 {
            Ok(minutes)
        } else {
            Err(AppError::InvalidSetting {
                name: "camera UTC offset (minutes)",
                value: minutes.to_string(),
            })
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let tracks_dir = std::env::var("RIDE_ATLAS_TRACKS_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("files"));

        let photo_dirs = std::env::var("RIDE_ATLAS_PHOTO_DIRS")
            .map(|s| {
                s.split(',')
                    .filter(|p| !p.trim().is_empty())
                    .map(|p| PathBuf::from(p.trim()))
                    .collect()
            })
            .unwrap_or_default();

        let output = std::env::var("RIDE_ATLAS_OUTPUT")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("public/data/rides.json"));

        let copy_photos_to = std::env::var("RIDE_ATLAS_COPY_PHOTOS").ok().map(PathBuf::from);

        let radius_m = std::env::var("RIDE_ATLAS_RADIUS_M")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(100.0);

        let time_window = std::env::var("RIDE_ATLAS_WINDOW_HOURS")
            .ok()
            .and_then(|s| s.parse().ok())
            .and_then(|hours| match MatchConfig::window_from_hours(hours) {
                Ok(window) => Some(window),
                Err(e) => {
                    tracing::warn!("Ignoring RIDE_ATLAS_WINDOW_HOURS: {}", e);
                    None
                }
            })
            .unwrap_or_else(|| Duration::hours(2));

        let gps_only = std::env::var("RIDE_ATLAS_GPS_ONLY")
            .map(|s| matches!(s.as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);

        let camera_utc_offset_minutes = std::env::var("RIDE_ATLAS_CAMERA_UTC_OFFSET_MINUTES")
            .ok()
            .and_then(|s| s.parse().ok())
            .and_then(|minutes| match MatchConfig::checked_camera_offset(minutes) {
                Ok(minutes) => Some(minutes),
                Err(e) => {
                    tracing::warn!("Ignoring RIDE_ATLAS_CAMERA_UTC_OFFSET_MINUTES: {}", e);
                    None
                }
            })
            .unwrap_or(0);

        let downsample_stride = std::env::var("RIDE_ATLAS_STRIDE")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(1);

        Self {
            tracks_dir,
            photo_dirs,
            output,
            copy_photos_to,
            matching: MatchConfig {
                radius_m,
                time_window,
                policy: if gps_only {
                    MatchPolicy::GpsOnly
                } else {
                    MatchPolicy::GpsThenTimestamp
                },
                camera_utc_offset_minutes,
            },
            downsample_stride,
        }
    }
}
