use ride_atlas::error::ParseError;
use ride_atlas::pipeline::parse;
use ride_atlas::types::activity::FileFormat;

fn sample_tcx() -> &'static str {
    r#"<?xml version="1.0" encoding="UTF-8"?>
<TrainingCenterDatabase xmlns="http://www.garmin.com/xmlschemas/TrainingCenterDatabase/v2" xmlns:ns3="http://www.garmin.com/xmlschemas/ActivityExtension/v2">
  <Activities><Activity Sport="Biking"><Id>2022-05-14T08:00:00Z</Id>
    <Lap StartTime="2022-05-14T08:00:00Z"><DistanceMeters>250.0</DistanceMeters><Track>
      <Trackpoint>
        <Time>2022-05-14T08:00:00Z</Time>
        <Position><LatitudeDegrees>48.428421</LatitudeDegrees><LongitudeDegrees>-123.365644</LongitudeDegrees></Position>
        <AltitudeMeters>12.0</AltitudeMeters>
        <HeartRateBpm><Value>120</Value></HeartRateBpm>
        <Extensions><ns3:TPX><ns3:Watts>180</ns3:Watts></ns3:TPX></Extensions>
      </Trackpoint>
      <Trackpoint>
        <Time>2022-05-14T08:00:05Z</Time>
        <AltitudeMeters>12.5</AltitudeMeters>
      </Trackpoint>
      <Trackpoint>
        <Time>2022-05-14T08:00:10Z</Time>
        <Position><LatitudeDegrees>48.428900</LatitudeDegrees><LongitudeDegrees>-123.365000</LongitudeDegrees></Position>
        <AltitudeMeters>13.0</AltitudeMeters>
      </Trackpoint>
    </Track></Lap>
  </Activity></Activities>
</TrainingCenterDatabase>"#
}

fn sample_gpx() -> &'static str {
    r#"<?xml version="1.0" encoding="UTF-8"?>
<gpx version="1.1" creator="test" xmlns:gpxtpx="http://www.garmin.com/xmlschemas/TrackPointExtension/v1">
  <trk><name>Test Ride</name><trkseg>
    <trkpt lat="52.5200" lon="13.4050"><ele>34.0</ele><time>2026-01-01T12:00:00Z</time><extensions><gpxtpx:TrackPointExtension><gpxtpx:hr>140</gpxtpx:hr></gpxtpx:TrackPointExtension></extensions></trkpt>
    <trkpt lat="52.5205" lon="13.4060"><ele>39.0</ele><time>2026-01-01T12:00:10Z</time></trkpt>
    <trkpt lat="52.5205" lon="13.4060"><ele>39.0</ele><time>2026-01-01T12:00:10Z</time></trkpt>
  </trkseg></trk>
</gpx>"#
}

#[test]
fn detects_format_from_extension() {
    assert_eq!(FileFormat::from_filename("ride.FIT"), Some(FileFormat::Fit));
    assert_eq!(FileFormat::from_filename("2022-05-14T08-00-00Z-1.tcx"), Some(FileFormat::Tcx));
    assert_eq!(FileFormat::from_filename("morning.gpx"), Some(FileFormat::Gpx));
    assert_eq!(FileFormat::from_filename("notes.txt"), None);
    assert_eq!(FileFormat::from_filename("fit"), None);
}

#[test]
fn tcx_reads_sensors_and_skips_pause_records() {
    let parsed = parse::parse(sample_tcx().as_bytes(), FileFormat::Tcx).expect("parse tcx");

    assert_eq!(parsed.points.len(), 2);
    let first = &parsed.points[0];
    assert!((first.lat - 48.428421).abs() < 1e-9);
    assert!((first.lon + 123.365644).abs() < 1e-9);
    assert_eq!(first.elevation, Some(12.0));
    assert_eq!(first.heart_rate, Some(120));
    assert_eq!(first.power, Some(180));

    let last = &parsed.points[1];
    assert_eq!(last.heart_rate, None);
    assert_eq!(last.power, None);
    assert_eq!(last.time.to_rfc3339(), "2022-05-14T08:00:10+00:00");
}

#[test]
fn gpx_keeps_duplicate_timestamps() {
    let parsed = parse::parse(sample_gpx().as_bytes(), FileFormat::Gpx).expect("parse gpx");

    assert_eq!(parsed.points.len(), 3);
    assert_eq!(parsed.points[0].heart_rate, Some(140));
    assert_eq!(parsed.points[1].time, parsed.points[2].time);
}

#[test]
fn out_of_order_timestamps_are_rejected() {
    let gpx = r#"<gpx><trk><trkseg>
    <trkpt lat="52.5200" lon="13.4050"><time>2026-01-01T12:00:10Z</time></trkpt>
    <trkpt lat="52.5205" lon="13.4060"><time>2026-01-01T12:00:00Z</time></trkpt>
  </trkseg></trk></gpx>"#;

    let err = parse::parse(gpx.as_bytes(), FileFormat::Gpx).expect_err("should fail");
    assert!(matches!(err, ParseError::OutOfOrder { record: 1 }), "got {err:?}");
}

#[test]
fn malformed_field_reports_record_and_field() {
    let gpx = r#"<gpx><trk><trkseg>
    <trkpt lat="52.5200" lon="13.4050"><time>2026-01-01T12:00:00Z</time></trkpt>
    <trkpt lat="52.5205" lon="13.4060"><ele>abc</ele><time>2026-01-01T12:00:05Z</time></trkpt>
  </trkseg></trk></gpx>"#;

    let err = parse::parse(gpx.as_bytes(), FileFormat::Gpx).expect_err("should fail");
    match err {
        ParseError::InvalidField { record, field, value } => {
            assert_eq!(record, 1);
            assert_eq!(field, "elevation");
            assert_eq!(value, "abc");
        }
        other => panic!("unexpected error {other:?}"),
    }
    let message = parse::parse(gpx.as_bytes(), FileFormat::Gpx)
        .expect_err("should fail")
        .to_string();
    assert!(message.contains("Record 1"));
}

#[test]
fn bad_latitude_in_tcx_is_an_error() {
    let tcx = sample_tcx().replace("48.428900", "north");
    let err = parse::parse(tcx.as_bytes(), FileFormat::Tcx).expect_err("should fail");
    assert!(
        matches!(err, ParseError::InvalidField { record: 2, field: "latitude", .. }),
        "got {err:?}"
    );
}

#[test]
fn positioned_record_without_time_is_an_error() {
    let gpx = r#"<gpx><trk><trkseg>
    <trkpt lat="52.5200" lon="13.4050"><ele>3.0</ele></trkpt>
  </trkseg></trk></gpx>"#;

    let err = parse::parse(gpx.as_bytes(), FileFormat::Gpx).expect_err("should fail");
    assert!(matches!(err, ParseError::MissingField { record: 0, field: "timestamp" }));
}

#[test]
fn truncated_xml_is_rejected_not_truncated() {
    let full = sample_tcx();
    let cut = full.find("<AltitudeMeters>13.0").expect("marker");
    let truncated = &full[..cut];

    let err = parse::parse(truncated.as_bytes(), FileFormat::Tcx).expect_err("should fail");
    assert!(matches!(err, ParseError::InvalidXml(_)), "got {err:?}");
}

#[test]
fn gpx_cut_after_a_closed_trackpoint_is_rejected() {
    let full = sample_gpx();
    let cut = full.find("    <trkpt lat=\"52.5205\" lon=\"13.4060\"><ele>39.0</ele><time>2026-01-01T12:00:10Z</time></trkpt>\n  </trkseg>")
        .expect("marker");
    let truncated = &full[..cut];
    assert!(truncated.trim_end().ends_with("</trkpt>"));

    let err = parse::parse(truncated.as_bytes(), FileFormat::Gpx).expect_err("should fail");
    match err {
        ParseError::InvalidXml(message) => assert!(message.contains("<trkseg>"), "got {message}"),
        other => panic!("expected InvalidXml, got {other:?}"),
    }
}

#[test]
fn tcx_cut_after_a_closed_trackpoint_is_rejected() {
    let full = sample_tcx();
    let cut = full.find("      <Trackpoint>\n        <Time>2022-05-14T08:00:05Z").expect("marker");
    let truncated = &full[..cut];
    assert!(truncated.trim_end().ends_with("</Trackpoint>"));

    let err = parse::parse(truncated.as_bytes(), FileFormat::Tcx).expect_err("should fail");
    match err {
        ParseError::InvalidXml(message) => assert!(message.contains("<Track>"), "got {message}"),
        other => panic!("expected InvalidXml, got {other:?}"),
    }
}

#[test]
fn file_without_track_points_is_empty() {
    let gpx = r#"<gpx><trk><name>nothing</name><trkseg></trkseg></trk></gpx>"#;
    let err = parse::parse(gpx.as_bytes(), FileFormat::Gpx).expect_err("should fail");
    assert!(matches!(err, ParseError::EmptyFile));
}

#[test]
fn truncated_fit_is_rejected() {
    // Valid 14-byte header announcing 100 data bytes, followed by only 4.
    let mut bytes = vec![14u8, 0x10, 0x00, 0x00, 100, 0, 0, 0, b'.', b'F', b'I', b'T', 0, 0];
    bytes.extend_from_slice(&[0x40, 0x00, 0x00, 0x00]);

    let err = parse::parse(&bytes, FileFormat::Fit).expect_err("should fail");
    assert!(matches!(err, ParseError::InvalidFit(_)), "got {err:?}");
}
