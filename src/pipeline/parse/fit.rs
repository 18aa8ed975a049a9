use chrono::Utc;
use fitparser::profile::MesgNum;
use fitparser::Value;

use crate::error::ParseError;
use crate::pipeline::parse::{Parser, RawPoint, TrackBuilder};
use crate::types::activity::{FileFormat, ParsedActivity};

pub struct FitParser;

impl Parser for FitParser {
    fn parse(&self, bytes: &[u8]) -> Result<ParsedActivity, ParseError> {
        let data = fitparser::from_bytes(bytes)
            .map_err(|e| ParseError::InvalidFit(format!("Failed to parse FIT file: {}", e)))?;

        let mut track = TrackBuilder::new();
        let records = data.iter().filter(|r| r.kind() == MesgNum::Record);
        for (record, message) in records.enumerate() {
            let mut raw = RawPoint::default();
            let mut altitude_fallback = None;

            for field in message.fields() {
                match field.name() {
                    "position_lat" => raw.lat = Some(semicircles(field.value(), record, "latitude")?),
                    "position_long" => {
                        raw.lon = Some(semicircles(field.value(), record, "longitude")?)
                    }
                    "enhanced_altitude" => raw.elevation = as_f64(field.value()),
                    "altitude" => altitude_fallback = as_f64(field.value()),
                    "timestamp" => match field.value() {
                        Value::Timestamp(val) => raw.time = Some(val.with_timezone(&Utc)),
                        other => {
                            return Err(ParseError::InvalidField {
                                record,
                                field: "timestamp",
                                value: format!("{:?}", other),
                            })
                        }
                    },
                    "heart_rate" => raw.heart_rate = as_f64(field.value()).map(|v| v as u16),
                    "power" => raw.power = as_f64(field.value()).map(|v| v as u16),
                    _ => {}
                }
            }

            if raw.elevation.is_none() {
                raw.elevation = altitude_fallback;
            }

            if let Some(point) = raw.into_point(record)? {
                track.push(record, point)?;
            }
        }

        track.finish(FileFormat::Fit)
    }
}

fn semicircles(value: &Value, record: usize, field: &'static str) -> Result<f64, ParseError> {
    match value {
        Value::SInt32(val) => Ok(semicircles_to_degrees(*val)),
        other => Err(ParseError::InvalidField {
            record,
            field,
            value: format!("{:?}", other),
        }),
    }
}

fn semicircles_to_degrees(semicircles: i32) -> f64 {
    (semicircles as f64) * (180.0 / 2_147_483_648.0)
}

fn as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Float64(v) => Some(*v),
        Value::Float32(v) => Some(*v as f64),
        Value::UInt8(v) => Some(*v as f64),
        Value::UInt16(v) => Some(*v as f64),
        Value::UInt32(v) => Some(*v as f64),
        Value::SInt8(v) => Some(*v as f64),
        Value::SInt16(v) => Some(*v as f64),
        Value::SInt32(v) => Some(*v as f64),
        _ => None,
    }
}
