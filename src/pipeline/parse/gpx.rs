use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::error::ParseError;
use crate::pipeline::parse::{
    local_name, parse_number, parse_time, OpenElements, Parser, RawPoint, TrackBuilder,
};
use crate::types::activity::{FileFormat, ParsedActivity};

pub struct GpxParser;

impl Parser for GpxParser {
    fn parse(&self, bytes: &[u8]) -> Result<ParsedActivity, ParseError> {
        let mut reader = Reader::from_reader(bytes);
        reader.trim_text(true);

        let mut track = TrackBuilder::new();
        let mut record = 0usize;
        let mut current_point: Option<RawPoint> = None;
        let mut current_element = String::new();
        let mut open = OpenElements::default();
        let mut buf = Vec::new();

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Start(e)) => {
                    let name = e.name();
                    let name_str = local_name(name.as_ref())?;
                    open.open(name_str);

                    if name_str == "trkpt" {
                        current_point = Some(point_from_attributes(&e, record)?);
                    } else if current_point.is_some() {
                        current_element = name_str.to_string();
                    }
                }
                Ok(Event::Empty(e)) => {
                    let name = e.name();
                    if local_name(name.as_ref())? == "trkpt" {
                        let raw = point_from_attributes(&e, record)?;
                        if let Some(point) = raw.into_point(record)? {
                            track.push(record, point)?;
                        }
                        record += 1;
                    }
                }
                Ok(Event::Text(e)) => {
                    if let Some(point) = current_point.as_mut() {
                        let text = e
                            .unescape()
                            .map_err(|e| ParseError::InvalidXml(e.to_string()))?;

                        match current_element.as_str() {
                            "ele" => point.elevation = Some(parse_number(&text, record, "elevation")?),
                            "time" => point.time = Some(parse_time(&text, record)?),
                            "hr" => point.heart_rate = Some(parse_number(&text, record, "heart rate")?),
                            "power" => point.power = Some(parse_number(&text, record, "power")?),
                            _ => {}
                        }
                    }
                }
                Ok(Event::End(e)) => {
                    open.close();
                    let name = e.name();
                    if local_name(name.as_ref())? == "trkpt" {
                        if let Some(raw) = current_point.take() {
                            if let Some(point) = raw.into_point(record)? {
                                track.push(record, point)?;
                            }
                        }
                        record += 1;
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
        track.finish(FileFormat::Gpx)
    }
}

fn point_from_attributes(e: &BytesStart<'_>, record: usize) -> Result<RawPoint, ParseError> {
    let mut point = RawPoint::default();

    for attr in e.attributes() {
        let attr = attr.map_err(|e| ParseError::InvalidXml(e.to_string()))?;
        let key = local_name(attr.key.as_ref())?;
        let value =
            std::str::from_utf8(&attr.value).map_err(|e| ParseError::InvalidXml(e.to_string()))?;

        match key {
            "lat" => point.lat = Some(parse_number(value, record, "latitude")?),
            "lon" => point.lon = Some(parse_number(value, record, "longitude")?),
            _ => {}
        }
    }

    Ok(point)
}
