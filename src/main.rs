use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, ValueHint};
use ride_atlas::config::{Config, MatchConfig};
use ride_atlas::pipeline::{batch, output};
use ride_atlas::types::photo::MatchPolicy;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(author, version, about = "Build the rides.json payload from activity files and photos", long_about = None)]
struct Cli {
    /// Directory holding FIT/TCX/GPX activity files
    #[arg(long, value_hint = ValueHint::DirPath)]
    tracks: Option<PathBuf>,

    /// Directories holding geotagged photos
    #[arg(long, num_args = 1.., value_hint = ValueHint::DirPath)]
    photos: Vec<PathBuf>,

    /// Output JSON path
    #[arg(short, long, value_hint = ValueHint::FilePath)]
    output: Option<PathBuf>,

    /// Copy matched photos into this directory
    #[arg(long, value_hint = ValueHint::DirPath)]
    copy_photos: Option<PathBuf>,

    /// Keep every Nth route point (photo points are always kept, 1 keeps all)
    #[arg(long)]
    stride: Option<usize>,

    /// GPS snapping radius in meters
    #[arg(long)]
    radius_m: Option<f64>,

    /// Hours before ride start / after ride end in which photos are eligible
    #[arg(long)]
    window_hours: Option<i64>,

    /// Drop photos that cannot be placed by GPS instead of falling back to timestamps
    #[arg(long, action = ArgAction::SetTrue)]
    gps_only: bool,

    /// Camera clock offset from UTC, for photos without an EXIF offset tag
    #[arg(long, allow_hyphen_values = true)]
    camera_utc_offset_minutes: Option<i32>,
}

impl Cli {
    fn apply(self, mut config: Config) -> Result<Config> {
        if let Some(tracks) = self.tracks {
            config.tracks_dir = tracks;
        }
        if !self.photos.is_empty() {
            config.photo_dirs = self.photos;
        }
        if let Some(output) = self.output {
            config.output = output;
        }
        if self.copy_photos.is_some() {
            config.copy_photos_to = self.copy_photos;
        }
        if let Some(stride) = self.stride {
            config.downsample_stride = stride;
        }
        if let Some(radius_m) = self.radius_m {
            config.matching.radius_m = radius_m;
        }
        if let Some(hours) = self.window_hours {
            config.matching.time_window = MatchConfig::window_from_hours(hours)?;
        }
        if self.gps_only {
            config.matching.policy = MatchPolicy::GpsOnly;
        }
        if let Some(offset) = self.camera_utc_offset_minutes {
            config.matching.camera_utc_offset_minutes = MatchConfig::checked_camera_offset(offset)?;
        }
        Ok(config)
    }
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ride_atlas=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Cli::parse()
        .apply(Config::from_env())
        .context("invalid command line")?;

    let batch::BatchOutput { document, report } = batch::run(&config)
        .with_context(|| format!("processing {}", config.tracks_dir.display()))?;

    output::write_document(&document, &config.output)
        .with_context(|| format!("writing {}", config.output.display()))?;

    if let Some(dest) = &config.copy_photos_to {
        output::copy_photos(&document, &config.photo_dirs, dest)
            .with_context(|| format!("copying photos to {}", dest.display()))?;
    }

    for failure in &report.track_failures {
        tracing::warn!("Failed: {}: {}", failure.file.display(), failure.error);
    }
    for failure in &report.photo_failures {
        tracing::warn!("Failed photo: {}: {}", failure.file.display(), failure.error);
    }
    if !report.photos_without_timestamp.is_empty() {
        tracing::warn!(
            "{} photos carry no capture time and were not matched",
            report.photos_without_timestamp.len()
        );
    }

    tracing::info!(
        "Total rides: {}, photos matched: {}/{}, failed files: {}",
        document.rides.len(),
        report.photos_matched,
        report.photos_total,
        report.track_failures.len()
    );

    Ok(())
}
