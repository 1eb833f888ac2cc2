//! Observer location on the Earth's surface.

use serde::{Deserialize, Serialize};

use crate::error::{ensure_finite, LunarError};

/// Highest supported observer altitude in metres (exclusive).
pub const MAX_ALTITUDE_M: f64 = 11_000.0;

/// Geographic position of an observer.
///
/// Latitude positive north, longitude positive east, altitude above sea level.
/// Construction validates every component, so a `GeoLocation` is always usable.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GeoLocation {
    latitude: f64,
    longitude: f64,
    altitude_m: f64,
}

impl GeoLocation {
    /// Sea-level location in decimal degrees.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, LunarError> {
        Self::with_altitude(latitude, longitude, 0.0)
    }

    pub fn with_altitude(
        latitude: f64,
        longitude: f64,
        altitude_m: f64,
    ) -> Result<Self, LunarError> {
        let latitude = ensure_finite(latitude, "latitude")?;
        let longitude = ensure_finite(longitude, "longitude")?;
        let altitude_m = ensure_finite(altitude_m, "altitude")?;

        if !(-90.0..=90.0).contains(&latitude) {
            return Err(LunarError::invalid(format!(
                "latitude {latitude} outside [-90, 90]"
            )));
        }
        if !(-180.0..=180.0).contains(&longitude) {
            return Err(LunarError::invalid(format!(
                "longitude {longitude} outside [-180, 180]"
            )));
        }
        if !(0.0..MAX_ALTITUDE_M).contains(&altitude_m) {
            return Err(LunarError::invalid(format!(
                "altitude {altitude_m} m outside [0, {MAX_ALTITUDE_M})"
            )));
        }

        Ok(Self {
            latitude,
            longitude,
            altitude_m,
        })
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    pub fn altitude_m(&self) -> f64 {
        self.altitude_m
    }
}

// Deserialization goes through the validating constructor.
impl<'de> Deserialize<'de> for GeoLocation {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct Raw {
            latitude: f64,
            longitude: f64,
            #[serde(default)]
            altitude_m: f64,
        }

        let raw = Raw::deserialize(deserializer)?;
        GeoLocation::with_altitude(raw.latitude, raw.longitude, raw.altitude_m)
            .map_err(serde::de::Error::custom)
    }
}

/// Convert degrees, arc minutes and arc seconds into decimal degrees.
///
/// Components must be non-negative with minutes and seconds below 60; `max_degrees`
/// bounds the whole angle (90 for latitude, 180 for longitude).
pub fn dms_to_degrees(
    degrees: u32,
    minutes: u32,
    seconds: f64,
    max_degrees: u32,
) -> Result<f64, LunarError> {
    let seconds = ensure_finite(seconds, "arc seconds")?;
    if minutes >= 60 || !(0.0..60.0).contains(&seconds) {
        return Err(LunarError::invalid(format!(
            "malformed angle {degrees}°{minutes}'{seconds}\""
        )));
    }
    let value = f64::from(degrees) + f64::from(minutes) / 60.0 + seconds / 3600.0;
    if value > f64::from(max_degrees) {
        return Err(LunarError::invalid(format!(
            "angle {degrees}°{minutes}'{seconds}\" exceeds {max_degrees}°"
        )));
    }
    Ok(value)
}
