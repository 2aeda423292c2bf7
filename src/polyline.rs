//! Polyline representation for route geometries.
//!
//! Geometries are kept as decoded coordinate sequences. Encoding/decoding
//! happens at the boundary: OSRM returns Google encoded polylines, AMap
//! returns `lng,lat;lng,lat` strings.

use serde::{Deserialize, Serialize};

use crate::error::ServiceError;

/// Precision of the encoded polylines OSRM returns by default.
pub const POLYLINE5: u32 = 5;

/// A polyline representing a route geometry as decoded coordinates.
///
/// Each point is a (latitude, longitude) tuple.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Polyline {
    points: Vec<(f64, f64)>,
}

impl Polyline {
    pub fn new(points: Vec<(f64, f64)>) -> Self {
        Self { points }
    }

    pub fn points(&self) -> &[(f64, f64)] {
        &self.points
    }

    pub fn into_points(self) -> Vec<(f64, f64)> {
        self.points
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Append `other`, dropping its first point when it repeats our last.
    pub fn extend(&mut self, other: &Polyline) {
        let skip = match (self.points.last(), other.points.first()) {
            (Some(last), Some(first)) if last == first => 1,
            _ => 0,
        };
        self.points.extend(other.points.iter().skip(skip).copied());
    }

    /// Decode a Google encoded polyline with `precision` decimal digits.
    pub fn decode(encoded: &str, precision: u32) -> Result<Self, ServiceError> {
        let factor = 10_f64.powi(precision as i32);
        let mut bytes = encoded.bytes();
        let mut points = Vec::new();
        let (mut lat, mut lng) = (0_i64, 0_i64);

        loop {
            let Some(delta_lat) = next_value(&mut bytes)? else {
                break;
            };
            let delta_lng = next_value(&mut bytes)?.ok_or_else(|| {
                ServiceError::Malformed("polyline ends mid-coordinate".to_string())
            })?;
            lat += delta_lat;
            lng += delta_lng;
            points.push((lat as f64 / factor, lng as f64 / factor));
        }

        Ok(Self { points })
    }

    /// Encode as a Google encoded polyline with `precision` decimal digits.
    pub fn encode(&self, precision: u32) -> String {
        let factor = 10_f64.powi(precision as i32);
        let mut out = String::new();
        let (mut prev_lat, mut prev_lng) = (0_i64, 0_i64);
        for &(lat, lng) in &self.points {
            let lat = (lat * factor).round() as i64;
            let lng = (lng * factor).round() as i64;
            push_value(&mut out, lat - prev_lat);
            push_value(&mut out, lng - prev_lng);
            prev_lat = lat;
            prev_lng = lng;
        }
        out
    }

    /// Parse AMap's `lng,lat;lng,lat` format. An empty string is an empty line.
    pub fn from_lng_lat_pairs(raw: &str) -> Result<Self, ServiceError> {
        let points = raw
            .split(';')
            .map(str::trim)
            .filter(|pair| !pair.is_empty())
            .map(|pair| -> Result<(f64, f64), ServiceError> {
                let bad_pair = || ServiceError::Malformed(format!("bad coordinate pair `{}`", pair));
                let (lng, lat) = pair.split_once(',').ok_or_else(bad_pair)?;
                let parse = |value: &str| value.trim().parse::<f64>().map_err(|_| bad_pair());
                Ok((parse(lat)?, parse(lng)?))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { points })
    }
}

fn next_value(bytes: &mut impl Iterator<Item = u8>) -> Result<Option<i64>, ServiceError> {
    let mut result: i64 = 0;
    let mut shift = 0;
    let mut started = false;

    for byte in bytes.by_ref() {
        started = true;
        let chunk = i64::from(byte)
            .checked_sub(63)
            .filter(|value| (0..64).contains(value))
            .ok_or_else(|| ServiceError::Malformed(format!("invalid polyline byte {}", byte)))?;
        if shift > 60 {
            return Err(ServiceError::Malformed("polyline value overflows".to_string()));
        }
        result |= (chunk & 0x1f) << shift;
        shift += 5;
        if chunk < 0x20 {
            let value = if result & 1 == 1 { !(result >> 1) } else { result >> 1 };
            return Ok(Some(value));
        }
    }

    if started {
        Err(ServiceError::Malformed("polyline ends mid-value".to_string()))
    } else {
        Ok(None)
    }
}

fn push_value(out: &mut String, value: i64) {
    let mut value = if value < 0 { !(value << 1) } else { value << 1 };
    while value >= 0x20 {
        out.push(char::from((((value & 0x1f) | 0x20) + 63) as u8));
        value >>= 5;
    }
    out.push(char::from((value + 63) as u8));
}
