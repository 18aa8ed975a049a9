use crate::types::activity::{
    EnrichedTrackPoint, ParsedActivity, ProcessedActivity, Summary, TrackPoint,
};

/// Horizontal runs shorter than this produce a 0% gradient.
const MIN_GRADIENT_RUN_M: f64 = 1.0;

pub fn process(parsed: &ParsedActivity) -> ProcessedActivity {
    let points = enrich(&parsed.points);
    let summary = summarize(&points);
    ProcessedActivity { points, summary }
}

/// Derives distance, speed and gradient for every point. Never fails:
/// degenerate intervals (repeated timestamps, coincident fixes) yield zeros.
pub fn enrich(points: &[TrackPoint]) -> Vec<EnrichedTrackPoint> {
    let elevations = resolve_elevations(points);
    let mut enriched: Vec<EnrichedTrackPoint> = Vec::with_capacity(points.len());
    let mut distance_km = 0.0;

    for (i, curr) in points.iter().enumerate() {
        let ele = elevations[i];
        let (speed, gradient) = match i.checked_sub(1).map(|j| (&points[j], elevations[j])) {
            Some((prev, prev_ele)) => {
                let step_km = haversine_distance(prev.lat, prev.lon, curr.lat, curr.lon);
                distance_km += step_km;

                let dt_seconds = (curr.time - prev.time).num_milliseconds() as f64 / 1000.0;
                let speed = if dt_seconds > 0.0 {
                    step_km / dt_seconds * 3600.0
                } else {
                    0.0
                };

                let run_m = step_km * 1000.0;
                let gradient = if run_m >= MIN_GRADIENT_RUN_M {
                    (ele - prev_ele) / run_m * 100.0
                } else {
                    0.0
                };

                (finite_or_zero(speed), finite_or_zero(gradient))
            }
            None => (0.0, 0.0),
        };

        enriched.push(EnrichedTrackPoint {
            lat: curr.lat,
            lon: curr.lon,
            ele,
            time: curr.time,
            hr: curr.heart_rate,
            power: curr.power,
            speed,
            distance: distance_km,
            gradient,
        });
    }

    enriched
}

/// Fills elevation gaps with the last known value. A leading gap takes the
/// first known value; a file with no elevation at all sits at 0 m.
fn resolve_elevations(points: &[TrackPoint]) -> Vec<f64> {
    let first_known = points
        .iter()
        .find_map(|p| p.elevation.filter(|e| e.is_finite()))
        .unwrap_or(0.0);
    let mut last = first_known;
    points
        .iter()
        .map(|p| {
            if let Some(ele) = p.elevation.filter(|e| e.is_finite()) {
                last = ele;
            }
            last
        })
        .collect()
}

pub fn summarize(points: &[EnrichedTrackPoint]) -> Summary {
    let mut elevation_gain = 0.0;
    let mut speed_sum = 0.0;
    let mut speed_count = 0u64;
    let mut max_speed: f64 = 0.0;
    let mut hr_sum = 0u64;
    let mut hr_count = 0u64;
    let mut power_sum = 0u64;
    let mut power_count = 0u64;
    let mut max_elevation = f64::NEG_INFINITY;

    for (i, curr) in points.iter().enumerate() {
        if i > 0 {
            let gain = curr.ele - points[i - 1].ele;
            if gain > 0.0 {
                elevation_gain += gain;
            }
        }

        if curr.speed > 0.0 {
            speed_sum += curr.speed;
            speed_count += 1;
            max_speed = max_speed.max(curr.speed);
        }

        if let Some(hr) = curr.hr {
            hr_sum += hr as u64;
            hr_count += 1;
        }

        if let Some(power) = curr.power {
            power_sum += power as u64;
            power_count += 1;
        }

        max_elevation = max_elevation.max(curr.ele);
    }

    let duration = match (points.first(), points.last()) {
        (Some(first), Some(last)) => (last.time - first.time).num_seconds().max(0) as u64,
        _ => 0,
    };

    Summary {
        distance: points.last().map(|p| p.distance).unwrap_or(0.0),
        elevation_gain,
        duration,
        avg_speed: if speed_count > 0 {
            speed_sum / speed_count as f64
        } else {
            0.0
        },
        max_speed,
        avg_hr: if hr_count > 0 {
            Some((hr_sum as f64 / hr_count as f64).round() as u16)
        } else {
            None
        },
        avg_power: if power_count > 0 {
            Some((power_sum as f64 / power_count as f64).round() as u16)
        } else {
            None
        },
        max_elevation: if max_elevation.is_finite() {
            max_elevation
        } else {
            0.0
        },
    }
}

fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

/// Great-circle distance in km.
pub fn haversine_distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    const R: f64 = 6371.0; // Earth radius in km

    let d_lat = (lat2 - lat1).to_radians();
    let d_lon = (lon2 - lon1).to_radians();

    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lon / 2.0).sin().powi(2);
    let a = a.clamp(0.0, 1.0);

    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    R * c
}
