use std::collections::BTreeMap;

use crate::types::activity::EnrichedTrackPoint;
use crate::types::photo::Photo;

/// Thins a route for the map while keeping every point a photo sits on.
///
/// Keeps the first and last points, every `stride`th point and each photo's
/// `route_index`, then rewrites those indices against the thinned route.
/// A stride of 0 or 1 keeps everything.
pub fn downsample(
    route: Vec<EnrichedTrackPoint>,
    photos: &mut [Photo],
    stride: usize,
) -> Vec<EnrichedTrackPoint> {
    if stride <= 1 || route.len() <= 2 {
        return route;
    }

    let last = route.len() - 1;
    let mut remap: BTreeMap<usize, usize> = BTreeMap::new();
    for photo in photos.iter() {
        remap.insert(photo.route_index, 0);
    }

    let mut sampled = Vec::with_capacity(route.len() / stride + remap.len() + 2);
    for (i, point) in route.into_iter().enumerate() {
        let keep = i == 0 || i == last || i % stride == 0 || remap.contains_key(&i);
        if keep {
            if let Some(slot) = remap.get_mut(&i) {
                *slot = sampled.len();
            }
            sampled.push(point);
        }
    }

    for photo in photos.iter_mut() {
        if let Some(new_index) = remap.get(&photo.route_index) {
            photo.route_index = *new_index;
        }
    }

    sampled
}
