use std::path::{Path, PathBuf};

use crate::error::AppError;
use crate::types::photo::Photo;
use crate::types::ride::RidesDocument;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CopyStats {
    pub copied: usize,
    pub skipped: usize,
    pub missing: Vec<String>,
}

pub fn to_json(document: &RidesDocument) -> Result<String, AppError> {
    Ok(serde_json::to_string_pretty(document)?)
}

pub fn write_document(document: &RidesDocument, path: &Path) -> Result<(), AppError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| AppError::io(parent, e))?;
    }
    let json = to_json(document)?;
    std::fs::write(path, json).map_err(|e| AppError::io(path, e))?;
    tracing::info!("Output written to {}", path.display());
    Ok(())
}

/// Copies every matched photo into `dest` so the front-end can serve it.
/// Files already present in `dest` are left alone.
///
/// A photo is copied from the path it was read from; photos without one are
/// looked up by filename in `photo_dirs`.
pub fn copy_photos(
    document: &RidesDocument,
    photo_dirs: &[PathBuf],
    dest: &Path,
) -> Result<CopyStats, AppError> {
    std::fs::create_dir_all(dest).map_err(|e| AppError::io(dest, e))?;

    let mut stats = CopyStats::default();
    for photo in document.rides.iter().flat_map(|ride| ride.photos.iter()) {
        let Some(src) = source_path(photo, photo_dirs) else {
            tracing::warn!("Photo not found: {}", photo.filename);
            stats.missing.push(photo.filename.clone());
            continue;
        };

        let dst = dest.join(&photo.filename);
        if dst.exists() {
            stats.skipped += 1;
            continue;
        }
        std::fs::copy(&src, &dst).map_err(|e| AppError::io(&src, e))?;
        stats.copied += 1;
    }

    tracing::info!(
        "Copied {} photos to {} ({} already present)",
        stats.copied,
        dest.display(),
        stats.skipped
    );
    Ok(stats)
}

fn source_path(photo: &Photo, photo_dirs: &[PathBuf]) -> Option<PathBuf> {
    match &photo.source {
        Some(path) => Some(path.clone()).filter(|path| path.is_file()),
        None => photo_dirs
            .iter()
            .map(|dir| dir.join(&photo.filename))
            .find(|candidate| candidate.is_file()),
    }
}
