use chrono::{DateTime, Utc};

use crate::config::MatchConfig;
use crate::pipeline::matcher::within_window;
use crate::types::activity::EnrichedTrackPoint;
use crate::types::photo::PhotoCandidate;

#[derive(Debug, Default)]
pub struct Assignment {
    /// Parallel to the routes passed to [`assign_photos`].
    pub per_ride: Vec<Vec<PhotoCandidate>>,
    pub unclaimed: Vec<PhotoCandidate>,
    pub without_timestamp: Vec<PhotoCandidate>,
}

/// Hands every photo to at most one ride so overlapping time windows in a
/// batch never emit the same photo twice.
///
/// A photo goes to the ride whose span is nearest its capture time (zero
/// inside the span); ties go to the ride listed first. Routes are expected
/// in ride order.
pub fn assign_photos(
    routes: &[&[EnrichedTrackPoint]],
    photos: Vec<PhotoCandidate>,
    config: &MatchConfig,
) -> Assignment {
    let mut assignment = Assignment {
        per_ride: vec![Vec::new(); routes.len()],
        ..Assignment::default()
    };

    for photo in photos {
        let Some(timestamp) = photo.timestamp else {
            assignment.without_timestamp.push(photo);
            continue;
        };

        let best = routes
            .iter()
            .enumerate()
            .filter(|(_, route)| within_window(route, timestamp, config))
            .filter_map(|(i, route)| span_gap_seconds(route, timestamp).map(|gap| (i, gap)))
            .min_by_key(|(_, gap)| *gap);

        match best {
            Some((ride, _)) => assignment.per_ride[ride].push(photo),
            None => assignment.unclaimed.push(photo),
        }
    }

    assignment
}

fn span_gap_seconds(route: &[EnrichedTrackPoint], timestamp: DateTime<Utc>) -> Option<i64> {
    let start = route.first()?.time;
    let end = route.last()?.time;
    let gap = if timestamp < start {
        (start - timestamp).num_seconds()
    } else if timestamp > end {
        (timestamp - end).num_seconds()
    } else {
        0
    };
    Some(gap)
}
