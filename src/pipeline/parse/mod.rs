mod fit;
mod gpx;
mod tcx;

use chrono::{DateTime, Utc};

use crate::error::ParseError;
use crate::types::activity::{FileFormat, ParsedActivity, TrackPoint};

pub trait Parser {
    fn parse(&self, bytes: &[u8]) -> Result<ParsedActivity, ParseError>;
}

pub fn parse(bytes: &[u8], format: FileFormat) -> Result<ParsedActivity, ParseError> {
    match format {
        FileFormat::Fit => fit::FitParser.parse(bytes),
        FileFormat::Tcx => tcx::TcxParser.parse(bytes),
        FileFormat::Gpx => gpx::GpxParser.parse(bytes),
    }
}

/// Collects positioned points and rejects timestamps that go backwards.
/// Equal timestamps are kept as separate points.
struct TrackBuilder {
    points: Vec<TrackPoint>,
    last_time: Option<DateTime<Utc>>,
}

impl TrackBuilder {
    fn new() -> Self {
        Self {
            points: Vec::new(),
            last_time: None,
        }
    }

    fn push(&mut self, record: usize, point: TrackPoint) -> Result<(), ParseError> {
        if let Some(last) = self.last_time {
            if point.time < last {
                return Err(ParseError::OutOfOrder { record });
            }
        }
        self.last_time = Some(point.time);
        self.points.push(point);
        Ok(())
    }

    fn finish(self, file_format: FileFormat) -> Result<ParsedActivity, ParseError> {
        if self.points.is_empty() {
            return Err(ParseError::EmptyFile);
        }
        Ok(ParsedActivity {
            points: self.points,
            file_format,
        })
    }
}

/// Fields gathered for one record before it is known to carry a position.
#[derive(Default)]
struct RawPoint {
    lat: Option<f64>,
    lon: Option<f64>,
    elevation: Option<f64>,
    time: Option<DateTime<Utc>>,
    heart_rate: Option<u16>,
    power: Option<u16>,
}

impl RawPoint {
    /// Records without a full position are pauses and yield `None`.
    fn into_point(self, record: usize) -> Result<Option<TrackPoint>, ParseError> {
        let (Some(lat), Some(lon)) = (self.lat, self.lon) else {
            return Ok(None);
        };
        if !(-90.0..=90.0).contains(&lat) {
            return Err(ParseError::InvalidField {
                record,
                field: "latitude",
                value: lat.to_string(),
            });
        }
        if !(-180.0..=180.0).contains(&lon) {
            return Err(ParseError::InvalidField {
                record,
                field: "longitude",
                value: lon.to_string(),
            });
        }
        let time = self.time.ok_or(ParseError::MissingField {
            record,
            field: "timestamp",
        })?;
        Ok(Some(TrackPoint {
            lat,
            lon,
            elevation: self.elevation,
            time,
            heart_rate: self.heart_rate,
            power: self.power,
        }))
    }
}

fn parse_number<T: std::str::FromStr>(
    text: &str,
    record: usize,
    field: &'static str,
) -> Result<T, ParseError> {
    text.trim().parse().map_err(|_| ParseError::InvalidField {
        record,
        field,
        value: text.to_string(),
    })
}

fn parse_time(text: &str, record: usize) -> Result<DateTime<Utc>, ParseError> {
    text.trim()
        .parse::<DateTime<Utc>>()
        .map_err(|_| ParseError::InvalidField {
            record,
            field: "timestamp",
            value: text.to_string(),
        })
}

/// Strips an XML namespace prefix such as `gpxtpx:` or `ns3:`.
fn local_name(name: &[u8]) -> Result<&str, ParseError> {
    let name = std::str::from_utf8(name).map_err(|e| ParseError::InvalidXml(e.to_string()))?;
    Ok(name.rsplit(':').next().unwrap_or(name))
}

/// Names of the XML elements opened but not yet closed. quick-xml stops at
/// end of input without complaining about unclosed ancestors, so a file cut
/// between two complete trackpoints is caught here instead.
#[derive(Default)]
struct OpenElements(Vec<String>);

impl OpenElements {
    fn open(&mut self, name: &str) {
        self.0.push(name.to_string());
    }

    fn close(&mut self) {
        self.0.pop();
    }

    fn finish(self) -> Result<(), ParseError> {
        match self.0.last() {
            Some(name) => Err(ParseError::InvalidXml(format!(
                "document ends inside <{name}>"
            ))),
            None => Ok(()),
        }
    }
}
