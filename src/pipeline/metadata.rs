use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use chrono::{DateTime, FixedOffset, NaiveDateTime, TimeZone, Utc};
use exif::{Exif, In, Tag, Value};

use crate::error::PhotoError;
use crate::types::photo::{GeoPoint, PhotoCandidate};

const PHOTO_EXTENSIONS: [&str; 4] = ["jpg", "jpeg", "png", "heic"];

/// Timestamp tags in order of preference, each with its offset tag.
const CAPTURE_TIME_TAGS: [(Tag, Tag); 2] = [
    (Tag::DateTimeOriginal, Tag::OffsetTimeOriginal),
    (Tag::DateTime, Tag::OffsetTime),
];

pub fn is_photo(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| PHOTO_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// Reads capture time and GPS position from a photo's EXIF block.
///
/// A photo whose container carries no readable EXIF is still returned, just
/// without timestamp or location; only I/O failures are errors.
pub fn read_photo(path: &Path, camera_utc_offset_minutes: i32) -> Result<PhotoCandidate, PhotoError> {
    let filename = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();

    let file = File::open(path).map_err(|source| PhotoError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut reader = BufReader::new(file);

    let exif = match exif::Reader::new().read_from_container(&mut reader) {
        Ok(exif) => exif,
        Err(exif::Error::Io(source)) => {
            return Err(PhotoError::Io {
                path: path.to_path_buf(),
                source,
            })
        }
        Err(e) => {
            tracing::debug!("No EXIF metadata in {}: {}", filename, e);
            return Ok(PhotoCandidate {
                filename,
                path: path.to_path_buf(),
                timestamp: None,
                location: None,
            });
        }
    };

    Ok(PhotoCandidate {
        timestamp: capture_time(&exif, camera_utc_offset_minutes),
        location: gps_location(&exif),
        filename,
        path: path.to_path_buf(),
    })
}

fn capture_time(exif: &Exif, camera_utc_offset_minutes: i32) -> Option<DateTime<Utc>> {
    capture_time_from(|tag| ascii_field(exif, tag), camera_utc_offset_minutes)
}

/// Picks the first timestamp tag present and reads the offset tag recorded
/// with that same stamp. `lookup` returns a tag's ASCII value.
pub fn capture_time_from(
    lookup: impl Fn(Tag) -> Option<String>,
    camera_utc_offset_minutes: i32,
) -> Option<DateTime<Utc>> {
    let (text, offset_tag) = CAPTURE_TIME_TAGS
        .iter()
        .find_map(|&(tag, offset_tag)| lookup(tag).map(|text| (text, offset_tag)))?;
    let offset = lookup(offset_tag);
    parse_exif_datetime(&text, offset.as_deref(), camera_utc_offset_minutes)
}

fn gps_location(exif: &Exif) -> Option<GeoPoint> {
    let lat = rational_triplet(exif, Tag::GPSLatitude)?;
    let lat_ref = ascii_field(exif, Tag::GPSLatitudeRef)?;
    let lon = rational_triplet(exif, Tag::GPSLongitude)?;
    let lon_ref = ascii_field(exif, Tag::GPSLongitudeRef)?;

    Some(GeoPoint {
        lat: round6(dms_to_degrees(lat, &lat_ref)),
        lon: round6(dms_to_degrees(lon, &lon_ref)),
    })
}

fn ascii_field(exif: &Exif, tag: Tag) -> Option<String> {
    let field = exif.get_field(tag, In::PRIMARY)?;
    match &field.value {
        Value::Ascii(values) => values
            .first()
            .map(|bytes| String::from_utf8_lossy(bytes).trim().to_string())
            .filter(|s| !s.is_empty()),
        _ => None,
    }
}

fn rational_triplet(exif: &Exif, tag: Tag) -> Option<[f64; 3]> {
    let field = exif.get_field(tag, In::PRIMARY)?;
    match &field.value {
        Value::Rational(values) if values.len() >= 3 && values.iter().all(|r| r.denom != 0) => {
            Some([values[0].to_f64(), values[1].to_f64(), values[2].to_f64()])
        }
        _ => None,
    }
}

/// Parses an EXIF `YYYY:MM:DD HH:MM:SS` stamp. `offset` is the matching
/// `OffsetTime*` tag (`+02:00`); without one the camera offset applies.
pub fn parse_exif_datetime(
    text: &str,
    offset: Option<&str>,
    camera_utc_offset_minutes: i32,
) -> Option<DateTime<Utc>> {
    let naive = NaiveDateTime::parse_from_str(text.trim(), "%Y:%m:%d %H:%M:%S").ok()?;
    let offset_seconds = match offset.and_then(parse_offset_seconds) {
        Some(seconds) => seconds,
        None => camera_utc_offset_minutes.checked_mul(60)?,
    };
    let zone = FixedOffset::east_opt(offset_seconds)?;
    zone.from_local_datetime(&naive)
        .single()
        .map(|dt| dt.with_timezone(&Utc))
}

fn parse_offset_seconds(text: &str) -> Option<i32> {
    let text = text.trim();
    let (sign, rest) = match text.as_bytes().first()? {
        b'+' => (1, &text[1..]),
        b'-' => (-1, &text[1..]),
        _ => return None,
    };
    let (hours, minutes) = rest.split_once(':')?;
    let hours: i32 = hours.parse().ok()?;
    let minutes: i32 = minutes.parse().ok()?;
    let seconds = hours.checked_mul(3600)?.checked_add(minutes.checked_mul(60)?)?;
    Some(sign * seconds)
}

/// Degrees/minutes/seconds to signed decimal degrees; `S` and `W` are negative.
pub fn dms_to_degrees(dms: [f64; 3], reference: &str) -> f64 {
    let degrees = dms[0] + dms[1] / 60.0 + dms[2] / 3600.0;
    match reference.trim() {
        "S" | "W" => -degrees,
        _ => degrees,
    }
}

fn round6(value: f64) -> f64 {
    (value * 1_000_000.0).round() / 1_000_000.0
}
