use chrono::{DateTime, Duration, TimeZone, Utc};
use ride_atlas::pipeline::process::{self, haversine_distance};
use ride_atlas::types::activity::TrackPoint;

fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2022, 5, 14, 8, 0, 0).single().expect("valid date")
}

fn point(lat: f64, lon: f64, ele: Option<f64>, seconds: i64) -> TrackPoint {
    TrackPoint {
        lat,
        lon,
        elevation: ele,
        time: start() + Duration::seconds(seconds),
        heart_rate: None,
        power: None,
    }
}

#[test]
fn distance_accumulates_haversine_from_zero() {
    let points = vec![
        point(0.0, 0.0, Some(0.0), 0),
        point(0.0, 0.001, Some(0.0), 10),
        point(0.0, 0.002, Some(0.0), 20),
    ];
    let enriched = process::enrich(&points);

    let step = haversine_distance(0.0, 0.0, 0.0, 0.001);
    assert!((step - 0.111_194_9).abs() < 1e-6, "step {step}");
    assert_eq!(enriched[0].distance, 0.0);
    assert!((enriched[1].distance - step).abs() < 1e-12);
    assert!((enriched[2].distance - 2.0 * step).abs() < 1e-9);

    // 111 m in 10 s
    assert!((enriched[1].speed - step / 10.0 * 3600.0).abs() < 1e-9);
    assert_eq!(enriched[0].speed, 0.0);
}

#[test]
fn output_matches_input_length_and_order() {
    let points: Vec<TrackPoint> = (0..50)
        .map(|i| point(48.0 + i as f64 * 1e-4, -123.0, Some(10.0), i))
        .collect();
    let enriched = process::enrich(&points);

    assert_eq!(enriched.len(), points.len());
    for (src, out) in points.iter().zip(&enriched) {
        assert_eq!(src.time, out.time);
        assert_eq!(src.lat, out.lat);
    }
}

#[test]
fn distance_never_decreases_with_noisy_input() {
    let offsets = [0.0, 3e-4, 3e-4, -2e-4, 5e-4, 5e-4, 1e-3, 0.0, -7e-4];
    let points: Vec<TrackPoint> = offsets
        .iter()
        .enumerate()
        .map(|(i, d)| point(47.6 + d, 8.5 - d, Some(400.0 + d * 1e4), (i as i64) / 2))
        .collect();
    let enriched = process::enrich(&points);

    for pair in enriched.windows(2) {
        assert!(pair[1].distance >= pair[0].distance);
    }
    for p in &enriched {
        assert!(p.speed.is_finite() && p.speed >= 0.0, "speed {}", p.speed);
        assert!(p.gradient.is_finite());
    }
}

#[test]
fn equal_timestamps_give_zero_speed() {
    let points = vec![
        point(52.52, 13.405, Some(34.0), 0),
        point(52.5205, 13.406, Some(39.0), 0),
    ];
    let enriched = process::enrich(&points);

    assert!(enriched[1].distance > 0.0);
    assert_eq!(enriched[1].speed, 0.0);
}

#[test]
fn gradient_is_zero_for_coincident_fixes() {
    let points = vec![
        point(52.52, 13.405, Some(34.0), 0),
        point(52.52, 13.405, Some(40.0), 5),
    ];
    let enriched = process::enrich(&points);

    assert_eq!(enriched[1].distance, 0.0);
    assert_eq!(enriched[1].gradient, 0.0);
}

#[test]
fn gradient_is_rise_over_run_percent() {
    let points = vec![
        point(0.0, 0.0, Some(100.0), 0),
        point(0.0, 0.001, Some(105.0), 20),
    ];
    let enriched = process::enrich(&points);

    let run_m = haversine_distance(0.0, 0.0, 0.0, 0.001) * 1000.0;
    assert!((enriched[1].gradient - 5.0 / run_m * 100.0).abs() < 1e-9);
}

#[test]
fn missing_elevation_carries_last_known_value() {
    let points = vec![
        point(0.0, 0.0, None, 0),
        point(0.0, 0.001, Some(20.0), 10),
        point(0.0, 0.002, None, 20),
        point(0.0, 0.003, Some(25.0), 30),
    ];
    let enriched = process::enrich(&points);

    let eles: Vec<f64> = enriched.iter().map(|p| p.ele).collect();
    assert_eq!(eles, vec![20.0, 20.0, 20.0, 25.0]);
}

#[test]
fn summary_omits_absent_sensors() {
    let points = vec![
        point(0.0, 0.0, Some(10.0), 0),
        point(0.0, 0.001, Some(15.0), 10),
        point(0.0, 0.002, Some(12.0), 20),
    ];
    let summary = process::summarize(&process::enrich(&points));

    assert_eq!(summary.avg_hr, None);
    assert_eq!(summary.avg_power, None);
    assert_eq!(summary.duration, 20);
    assert_eq!(summary.elevation_gain, 5.0);
    assert_eq!(summary.max_elevation, 15.0);
    assert!(summary.avg_speed > 0.0);

    let json = serde_json::to_value(&summary).expect("summary json");
    assert!(json.get("avgHr").is_none());
    assert!(json.get("elevationGain").is_some());
}

#[test]
fn summary_averages_present_sensor_values() {
    let mut points = vec![
        point(0.0, 0.0, Some(10.0), 0),
        point(0.0, 0.001, Some(10.0), 10),
        point(0.0, 0.002, Some(10.0), 20),
    ];
    points[0].heart_rate = Some(120);
    points[2].heart_rate = Some(131);
    points[1].power = Some(200);

    let summary = process::summarize(&process::enrich(&points));
    assert_eq!(summary.avg_hr, Some(126));
    assert_eq!(summary.avg_power, Some(200));
}

#[test]
fn single_point_track_is_enriched() {
    let points = vec![point(0.0, 0.0, Some(1.0), 0)];
    let enriched = process::enrich(&points);
    let summary = process::summarize(&enriched);

    assert_eq!(enriched.len(), 1);
    assert_eq!(enriched[0].speed, 0.0);
    assert_eq!(summary.distance, 0.0);
    assert_eq!(summary.duration, 0);
}
