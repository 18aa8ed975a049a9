use quick_xml::events::Event;
use quick_xml::Reader;

use crate::error::ParseError;
use crate::pipeline::parse::{
    local_name, parse_number, parse_time, OpenElements, Parser, RawPoint, TrackBuilder,
};
use crate::types::activity::{FileFormat, ParsedActivity};

/// Garmin Training Center XML. Heart rate sits in `HeartRateBpm/Value`,
/// power in the `TPX/Watts` activity extension.
pub struct TcxParser;

impl Parser for TcxParser {
    fn parse(&self, bytes: &[u8]) -> Result<ParsedActivity, ParseError> {
        let mut reader = Reader::from_reader(bytes);
        reader.trim_text(true);

        let mut track = TrackBuilder::new();
        let mut record = 0usize;
        let mut current_point: Option<RawPoint> = None;
        let mut current_element = String::new();
        let mut in_heart_rate = false;
        let mut open = OpenElements::default();
        let mut buf = Vec::new();

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Start(e)) => {
                    let name = e.name();
                    let name_str = local_name(name.as_ref())?;
                    open.open(name_str);

                    match name_str {
                        "Trackpoint" => current_point = Some(RawPoint::default()),
                        "HeartRateBpm" if current_point.is_some() => in_heart_rate = true,
                        _ if current_point.is_some() => current_element = name_str.to_string(),
                        _ => {}
                    }
                }
                Ok(Event::Empty(e)) => {
                    let name = e.name();
                    if local_name(name.as_ref())? == "Trackpoint" {
                        record += 1;
                    }
                }
                Ok(Event::Text(e)) => {
                    if let Some(point) = current_point.as_mut() {
                        let text = e
                            .unescape()
                            .map_err(|e| ParseError::InvalidXml(e.to_string()))?;

                        match current_element.as_str() {
                            "Time" => point.time = Some(parse_time(&text, record)?),
                            "LatitudeDegrees" => {
                                point.lat = Some(parse_number(&text, record, "latitude")?)
                            }
                            "LongitudeDegrees" => {
                                point.lon = Some(parse_number(&text, record, "longitude")?)
                            }
                            "AltitudeMeters" => {
                                point.elevation = Some(parse_number(&text, record, "elevation")?)
                            }
                            "Value" if in_heart_rate => {
                                point.heart_rate = Some(parse_number(&text, record, "heart rate")?)
                            }
                            "Watts" => point.power = Some(parse_number(&text, record, "power")?),
                            _ => {}
                        }
                    }
                }
                Ok(Event::End(e)) => {
                    open.close();
                    let name = e.name();
                    match local_name(name.as_ref())? {
                        "Trackpoint" => {
                            if let Some(raw) = current_point.take() {
                                if let Some(point) = raw.into_point(record)? {
                                    track.push(record, point)?;
                                }
                            }
                            record += 1;
                        }
                        "HeartRateBpm" => in_heart_rate = false,
                        _ => {}
                    }
                    current_element.clear();
                }
                Ok(Event::Eof) => break,
                Err(e) => {
                    return Err(ParseError::InvalidXml(format!(
                        "at byte {}: {}",
                        reader.buffer_position(),
                        e
                    )))
                }
                _ => {}
            }
            buf.clear();
        }

        if current_point.is_some() {
            return Err(ParseError::InvalidXml(format!(
                "trackpoint {} is not closed",
                record
            )));
        }

        open.finish()?;
        track.finish(FileFormat::Tcx)
    }
}
