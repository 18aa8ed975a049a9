use std::path::{Path, PathBuf};

use rayon::prelude::*;
use walkdir::WalkDir;

use crate::config::{Config, MatchConfig};
use crate::error::AppError;
use crate::pipeline::{assign, downsample, matcher, metadata, parse, process};
use crate::types::activity::{FileFormat, ProcessedActivity};
use crate::types::photo::{MatchMethod, PhotoCandidate};
use crate::types::ride::{Ride, RidesDocument};

/// One ride file that made it through parsing and enrichment.
#[derive(Debug, Clone)]
pub struct LoadedRide {
    pub id: String,
    pub activity: ProcessedActivity,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FileFailure {
    pub file: PathBuf,
    pub error: String,
}

#[derive(Debug, Default)]
pub struct BatchReport {
    pub track_failures: Vec<FileFailure>,
    pub photo_failures: Vec<FileFailure>,
    pub photos_total: usize,
    pub photos_matched: usize,
    pub photos_matched_by_gps: usize,
    pub photos_matched_by_timestamp: usize,
    pub photos_without_timestamp: Vec<String>,
    pub photos_unmatched: Vec<String>,
}

#[derive(Debug)]
pub struct BatchOutput {
    pub document: RidesDocument,
    pub report: BatchReport,
}

pub fn run(config: &Config) -> Result<BatchOutput, AppError> {
    let track_files = list_files(&config.tracks_dir, |path| {
        path.file_name()
            .and_then(|name| name.to_str())
            .and_then(FileFormat::from_filename)
            .is_some()
    })?;
    tracing::info!(
        "Found {} track files in {}",
        track_files.len(),
        config.tracks_dir.display()
    );

    let mut report = BatchReport::default();

    let results: Vec<(PathBuf, Result<LoadedRide, AppError>)> = track_files
        .par_iter()
        .map(|path| (path.clone(), load_ride(path)))
        .collect();

    let mut loaded = Vec::with_capacity(results.len());
    for (path, result) in results {
        match result {
            Ok(ride) => loaded.push(ride),
            Err(e) => {
                tracing::warn!("Skipping {}: {}", path.display(), e);
                report.track_failures.push(FileFailure {
                    file: path,
                    error: e.to_string(),
                });
            }
        }
    }

    let photos = load_photos(&config.photo_dirs, &config.matching, &mut report)?;
    report.photos_total = photos.len();

    let document = build_rides(loaded, photos, &config.matching, config.downsample_stride, &mut report);

    tracing::info!(
        "Processed {} rides, matched {} of {} photos ({} by GPS, {} by timestamp)",
        document.rides.len(),
        report.photos_matched,
        report.photos_total,
        report.photos_matched_by_gps,
        report.photos_matched_by_timestamp
    );
    if !report.photos_unmatched.is_empty() {
        tracing::warn!(
            "{} photos matched no ride: {}",
            report.photos_unmatched.len(),
            report.photos_unmatched.join(", ")
        );
    }

    Ok(BatchOutput { document, report })
}

/// Reads, parses and enriches one activity file. The file handle is released
/// before enrichment starts.
pub fn load_ride(path: &Path) -> Result<LoadedRide, AppError> {
    let filename = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let format = FileFormat::from_filename(&filename)
        .ok_or_else(|| AppError::UnsupportedFormat(filename.clone()))?;

    let bytes = std::fs::read(path).map_err(|e| AppError::io(path, e))?;

    tracing::info!("Parsing {} file: {}", format.as_str(), filename);
    let parsed = parse::parse(&bytes, format)?;
    let activity = process::process(&parsed);

    tracing::info!(
        "Loaded {} ({} points, {:.2} km)",
        filename,
        activity.points.len(),
        activity.summary.distance
    );

    let id = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or(filename);

    Ok(LoadedRide { id, activity })
}

fn load_photos(
    dirs: &[PathBuf],
    config: &MatchConfig,
    report: &mut BatchReport,
) -> Result<Vec<PhotoCandidate>, AppError> {
    let mut photos = Vec::new();

    for dir in dirs {
        if !dir.exists() {
            tracing::warn!("Photo directory {} does not exist", dir.display());
            continue;
        }

        let files = list_files(dir, metadata::is_photo)?;
        tracing::info!("Processing {} photos from {}", files.len(), dir.display());

        let results: Vec<_> = files
            .par_iter()
            .map(|path| (path.clone(), metadata::read_photo(path, config.camera_utc_offset_minutes)))
            .collect();

        for (path, result) in results {
            match result {
                Ok(photo) => photos.push(photo),
                Err(e) => {
                    tracing::warn!("Skipping photo {}: {}", path.display(), e);
                    report.photo_failures.push(FileFailure {
                        file: path,
                        error: e.to_string(),
                    });
                }
            }
        }
    }

    Ok(photos)
}

/// Orders rides, hands photos to them and assembles the output document.
pub fn build_rides(
    mut loaded: Vec<LoadedRide>,
    photos: Vec<PhotoCandidate>,
    config: &MatchConfig,
    stride: usize,
    report: &mut BatchReport,
) -> RidesDocument {
    loaded.retain(|ride| !ride.activity.points.is_empty());
    loaded.sort_by(|a, b| {
        a.activity
            .start_time()
            .cmp(&b.activity.start_time())
            .then_with(|| a.id.cmp(&b.id))
    });

    let routes: Vec<&[_]> = loaded.iter().map(|r| r.activity.points.as_slice()).collect();
    let assignment = assign::assign_photos(&routes, photos, config);

    report.photos_without_timestamp = assignment
        .without_timestamp
        .iter()
        .map(|p| p.filename.clone())
        .collect();
    report.photos_unmatched = assignment.unclaimed.iter().map(|p| p.filename.clone()).collect();

    let mut rides = Vec::with_capacity(loaded.len());
    for (n, (ride, candidates)) in loaded.into_iter().zip(assignment.per_ride).enumerate() {
        let mut photos = matcher::match_photos(&ride.activity.points, &candidates, config);

        for candidate in &candidates {
            if !photos.iter().any(|p| p.source.as_ref() == Some(&candidate.path)) {
                report.photos_unmatched.push(candidate.filename.clone());
            }
        }
        for photo in &photos {
            match photo.method {
                Some(MatchMethod::Gps) => report.photos_matched_by_gps += 1,
                Some(MatchMethod::Timestamp) => report.photos_matched_by_timestamp += 1,
                None => {}
            }
        }
        report.photos_matched += photos.len();

        let date = ride
            .activity
            .start_time()
            .map(|t| t.format("%Y-%m-%d").to_string())
            .unwrap_or_default();

        if !photos.is_empty() {
            tracing::info!("{}: {} photos", ride.id, photos.len());
        }

        let original_len = ride.activity.points.len();
        let route = downsample::downsample(ride.activity.points, &mut photos, stride);
        tracing::debug!(
            "Downsampled {}: {} -> {} points",
            ride.id,
            original_len,
            route.len()
        );

        rides.push(Ride {
            name: format!("Ride {}: {}", n + 1, date),
            id: ride.id,
            date,
            route,
            photos,
            summary: ride.activity.summary,
        });
    }

    report.photos_unmatched.sort();
    RidesDocument { rides }
}

/// Files directly inside `dir` accepted by `keep`, sorted by path.
pub fn list_files(dir: &Path, keep: impl Fn(&Path) -> bool) -> Result<Vec<PathBuf>, AppError> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1).sort_by_file_name() {
        let entry = entry.map_err(|e| {
            let path = e.path().map(Path::to_path_buf).unwrap_or_else(|| dir.to_path_buf());
            AppError::io(path, e.into())
        })?;
        if entry.file_type().is_file() && keep(entry.path()) {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}
