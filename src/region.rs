use serde::Serialize;
use thiserror::Error;

pub const LATITUDE_DELTA: f64 = 0.0922;
pub const LONGITUDE_DELTA: f64 = 0.0421;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegionError {
    #[error("malformed location: {0:?}")]
    MalformedLocation(String),
}

/// Map viewport handed to the map widget.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Region {
    pub latitude: f64,
    pub longitude: f64,
    pub latitude_delta: f64,
    pub longitude_delta: f64,
}

pub fn derive_region(gps: &str) -> Result<Region, RegionError> {
    let malformed = || RegionError::MalformedLocation(gps.to_string());

    let mut parts = gps.split(',');
    let (lat, lon) = match (parts.next(), parts.next(), parts.next()) {
        (Some(lat), Some(lon), None) => (lat, lon),
        _ => return Err(malformed()),
    };

    let latitude = parse_coordinate(lat).ok_or_else(malformed)?;
    let longitude = parse_coordinate(lon).ok_or_else(malformed)?;

    Ok(Region {
        latitude,
        longitude,
        latitude_delta: LATITUDE_DELTA,
        longitude_delta: LONGITUDE_DELTA,
    })
}

fn parse_coordinate(text: &str) -> Option<f64> {
    text.trim()
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
}
