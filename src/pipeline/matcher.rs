use chrono::{DateTime, Utc};

use crate::config::MatchConfig;
use crate::pipeline::process::haversine_distance;
use crate::types::activity::EnrichedTrackPoint;
use crate::types::photo::{GeoPoint, MatchMethod, MatchPolicy, Photo, PhotoCandidate, PhotoStats};

/// Distances closer than this are treated as equal; the earlier index wins.
const TIE_TOLERANCE_M: f64 = 1e-9;

/// Ties photos to positions on one ride's route.
///
/// The result holds only photos that found a position, ordered by route
/// index (then capture time, then filename).
pub fn match_photos(
    route: &[EnrichedTrackPoint],
    photos: &[PhotoCandidate],
    config: &MatchConfig,
) -> Vec<Photo> {
    let mut ordered: Vec<&PhotoCandidate> = photos.iter().collect();
    ordered.sort_by(|a, b| {
        a.timestamp
            .cmp(&b.timestamp)
            .then_with(|| a.filename.cmp(&b.filename))
    });

    let mut matched: Vec<Photo> = ordered
        .into_iter()
        .filter_map(|photo| match_photo(route, photo, config))
        .collect();

    matched.sort_by(|a, b| {
        a.route_index
            .cmp(&b.route_index)
            .then_with(|| a.timestamp.cmp(&b.timestamp))
            .then_with(|| a.filename.cmp(&b.filename))
    });
    matched
}

pub fn match_photo(
    route: &[EnrichedTrackPoint],
    photo: &PhotoCandidate,
    config: &MatchConfig,
) -> Option<Photo> {
    let timestamp = photo.timestamp?;
    if !within_window(route, timestamp, config) {
        return None;
    }

    let gps_match = photo
        .location
        .and_then(|location| nearest_by_distance(route, location))
        .filter(|(_, distance_m)| *distance_m <= config.radius_m)
        .map(|(index, _)| index);

    let (route_index, method) = match (gps_match, config.policy) {
        (Some(index), _) => (index, MatchMethod::Gps),
        (None, MatchPolicy::GpsThenTimestamp) => {
            (nearest_by_time(route, timestamp)?, MatchMethod::Timestamp)
        }
        (None, MatchPolicy::GpsOnly) => return None,
    };

    tracing::debug!(
        "{} -> route index {} by {:?}",
        photo.filename,
        route_index,
        method
    );

    let point = &route[route_index];
    Some(Photo {
        filename: photo.filename.clone(),
        timestamp,
        location: photo.location,
        route_index,
        stats: PhotoStats {
            speed: point.speed,
            elevation: point.ele,
            distance: point.distance,
            hr: point.hr,
            power: point.power,
        },
        method: Some(method),
        source: Some(photo.path.clone()),
    })
}

/// True when `timestamp` lies within the configured window around the
/// ride's first and last fix.
pub fn within_window(
    route: &[EnrichedTrackPoint],
    timestamp: DateTime<Utc>,
    config: &MatchConfig,
) -> bool {
    match (route.first(), route.last()) {
        (Some(first), Some(last)) => {
            let opens = first.time.checked_sub_signed(config.time_window);
            let closes = last.time.checked_add_signed(config.time_window);
            opens.map_or(true, |opens| timestamp >= opens) && closes.map_or(true, |closes| timestamp <= closes)
        }
        _ => false,
    }
}

/// Index of the closest fix and its distance in meters.
pub fn nearest_by_distance(route: &[EnrichedTrackPoint], location: GeoPoint) -> Option<(usize, f64)> {
    let mut best: Option<(usize, f64)> = None;
    for (i, point) in route.iter().enumerate() {
        let distance_m = haversine_distance(location.lat, location.lon, point.lat, point.lon) * 1000.0;
        match best {
            Some((_, best_m)) if distance_m >= best_m - TIE_TOLERANCE_M => {}
            _ => best = Some((i, distance_m)),
        }
    }
    best
}

pub fn nearest_by_time(route: &[EnrichedTrackPoint], timestamp: DateTime<Utc>) -> Option<usize> {
    route
        .iter()
        .enumerate()
        .min_by_key(|(_, point)| (point.time - timestamp).num_milliseconds().unsigned_abs())
        .map(|(i, _)| i)
}
