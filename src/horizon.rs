//! # Horizon Transforms
//!
//! Sidereal time, the equatorial → horizontal rotation and the corrections
//! that turn a geometric horizon crossing into an observed moonrise:
//!
//! ```text
//! h0 = HP − SD − refraction − dip − 19″·√h
//! ```
//!
//! with the horizontal parallax `HP = asin(6378.14 / Δ)`, the semidiameter
//! `SD = asin(1737.4 / Δ)`, a fixed standard refraction (34′ by default), the
//! geometric dip `sqrt(2h / R⊕)` of an observer `h` metres up and the extra
//! refraction along the longer sight line to that lowered horizon (Reingold &
//! Dershowitz). The Moon's upper limb touches the apparent horizon when its
//! geocentric altitude equals `h0`.

use core::f64::consts::PI;

use serde::{Deserialize, Serialize};

use crate::location::GeoLocation;
use crate::lunar::{normalize_degrees, position, LunarPosition};
use crate::time_scale::{EphemerisInstant, DAYS_PER_CENTURY, J2000_JDE};

const DEG: f64 = PI / 180.0;

/// Earth's equatorial radius in km (parallax).
const EARTH_EQUATORIAL_RADIUS_KM: f64 = 6378.14;

/// Mean lunar radius in km (semidiameter).
const MOON_RADIUS_KM: f64 = 1737.4;

/// Mean Earth radius in metres (geometric dip).
const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Extra refraction per √metre of observer altitude, in degrees (19″).
const ALTITUDE_REFRACTION_DEG: f64 = 19.0 / 3600.0;

/// Tunable parts of the horizon definition.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HorizonConfig {
    /// Atmospheric refraction at the horizon in arcminutes. Default: 34.0.
    pub refraction_arcmin: f64,
    /// Lower the horizon for an elevated observer: geometric dip plus the
    /// extra refraction along the longer sight line.
    /// Default: true.
    pub altitude_correction: bool,
}

impl Default for HorizonConfig {
    fn default() -> Self {
        Self {
            refraction_arcmin: 34.0,
            altitude_correction: true,
        }
    }
}

impl HorizonConfig {
    /// Geocentric altitude (deg) at which the Moon's upper limb touches the
    /// observed horizon, for a Moon at `distance_km`.
    pub fn moon_horizon_deg(&self, distance_km: f64, altitude_m: f64) -> f64 {
        horizontal_parallax(distance_km)
            - semidiameter(distance_km)
            - self.refraction_arcmin / 60.0
            - self.dip_deg(altitude_m)
            - self.altitude_refraction_deg(altitude_m)
    }

    /// Refraction gained over the dip of an elevated observer, in degrees.
    pub fn altitude_refraction_deg(&self, altitude_m: f64) -> f64 {
        if self.altitude_correction && altitude_m > 0.0 {
            ALTITUDE_REFRACTION_DEG * altitude_m.sqrt()
        } else {
            0.0
        }
    }

    /// Geometric dip of the horizon in degrees.
    pub fn dip_deg(&self, altitude_m: f64) -> f64 {
        if self.altitude_correction && altitude_m > 0.0 {
            (2.0 * altitude_m / EARTH_RADIUS_M).sqrt() / DEG
        } else {
            0.0
        }
    }
}

/// Topocentric horizontal coordinates of the Moon.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HorizontalPosition {
    /// Azimuth in degrees from north through east, [0, 360).
    pub azimuth: f64,
    /// Elevation above the horizon in degrees.
    pub elevation: f64,
    /// Distance from Earth's centre in km.
    pub distance_km: f64,
    /// Equatorial horizontal parallax in degrees.
    pub horizontal_parallax: f64,
}

/// Equatorial horizontal parallax (deg) of a body at `distance_km`.
pub fn horizontal_parallax(distance_km: f64) -> f64 {
    (EARTH_EQUATORIAL_RADIUS_KM / distance_km).asin() / DEG
}

/// Apparent lunar semidiameter (deg) at `distance_km`.
pub fn semidiameter(distance_km: f64) -> f64 {
    (MOON_RADIUS_KM / distance_km).asin() / DEG
}

/// Greenwich mean sidereal time in degrees (Meeus 12.4) for a UT Julian Day.
pub fn mean_sidereal_time(jd_ut: f64) -> f64 {
    let t = (jd_ut - J2000_JDE) / DAYS_PER_CENTURY;
    normalize_degrees(
        280.460_618_37 + 360.985_647_366_29 * (jd_ut - J2000_JDE) + 0.000_387_933 * t * t
            - t * t * t / 38_710_000.0,
    )
}

/// Greenwich apparent sidereal time: mean time plus the equation of the equinoxes.
pub fn apparent_sidereal_time(jd_ut: f64, nutation_longitude: f64, true_obliquity: f64) -> f64 {
    let equation_of_equinoxes = nutation_longitude * (true_obliquity * DEG).cos();
    normalize_degrees(mean_sidereal_time(jd_ut) + equation_of_equinoxes)
}

/// Rotate (RA, Dec) into (azimuth from north, altitude) for a local hour angle.
///
/// All angles in degrees; `hour_angle` is positive west of the meridian.
pub fn equatorial_to_horizontal(hour_angle: f64, declination: f64, latitude: f64) -> (f64, f64) {
    let h = hour_angle * DEG;
    let dec = declination * DEG;
    let lat = latitude * DEG;

    let altitude = (lat.sin() * dec.sin() + lat.cos() * dec.cos() * h.cos())
        .clamp(-1.0, 1.0)
        .asin();
    // Meeus 13.5 counts from the south
    let azimuth_south = h.sin().atan2(h.cos() * lat.sin() - dec.tan() * lat.cos());

    (normalize_degrees(azimuth_south / DEG + 180.0), altitude / DEG)
}

/// Refraction in degrees for a true altitude in degrees (Sæmundsson, Meeus 16.4).
pub fn refraction(true_altitude: f64) -> f64 {
    if true_altitude < -1.0 {
        return 0.0;
    }
    let r_arcmin = 1.02 / ((true_altitude + 10.3 / (true_altitude + 5.11)) * DEG).tan();
    r_arcmin.max(0.0) / 60.0
}

/// Geocentric azimuth and altitude of the Moon from an already computed position.
fn geocentric_horizontal(
    pos: &LunarPosition,
    jd_ut: f64,
    location: &GeoLocation,
) -> (f64, f64) {
    let sidereal = apparent_sidereal_time(jd_ut, pos.nutation_longitude, pos.true_obliquity);
    let hour_angle = sidereal + location.longitude() - pos.moon_equatorial.right_ascension;
    equatorial_to_horizontal(
        hour_angle,
        pos.moon_equatorial.declination,
        location.latitude(),
    )
}

/// Geocentric altitude of the Moon's centre (deg) and its distance (km).
pub fn moon_geocentric_altitude(
    instant: EphemerisInstant,
    location: &GeoLocation,
) -> (f64, f64) {
    let pos = position(instant);
    let (_, altitude) = geocentric_horizontal(&pos, instant.jd_ut(), location);
    (altitude, pos.moon.distance_km)
}

/// Topocentric azimuth and elevation of the Moon's centre.
///
/// Elevation includes parallax in altitude and, when `refracted`, standard
/// refraction for the observer.
pub fn moon_horizontal(
    instant: EphemerisInstant,
    location: &GeoLocation,
    refracted: bool,
) -> HorizontalPosition {
    let pos = position(instant);
    let (azimuth, geocentric) = geocentric_horizontal(&pos, instant.jd_ut(), location);
    let parallax = horizontal_parallax(pos.moon.distance_km);

    let mut elevation = geocentric - parallax * (geocentric * DEG).cos();
    if refracted {
        elevation += refraction(elevation);
    }

    HorizontalPosition {
        azimuth,
        elevation,
        distance_km: pos.moon.distance_km,
        horizontal_parallax: parallax,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time_scale::julian_day;

    #[test]
    fn test_mean_sidereal_time_meeus_12a() {
        // 1987-04-10 0h UT: 13h10m46.3668s
        let theta = mean_sidereal_time(2_446_895.5);
        let expected = (13.0 + 10.0 / 60.0 + 46.3668 / 3600.0) * 15.0;
        assert!((theta - expected).abs() < 1e-5, "θ0 = {theta}");
    }

    #[test]
    fn test_mean_sidereal_time_meeus_12b() {
        // 1987-04-10 19:21:00 UT: 128.7378734°
        let theta = mean_sidereal_time(julian_day(1987, 4, 10.0 + (19.0 + 21.0 / 60.0) / 24.0));
        assert!((theta - 128.737_873_4).abs() < 1e-5, "θ0 = {theta}");
    }

    #[test]
    fn test_apparent_sidereal_adds_equation_of_equinoxes() {
        // Δψ = −3.788″, ε = 23°26′36.85″ gives −0.2317 s of time
        let mean = mean_sidereal_time(2_446_895.5);
        let apparent = apparent_sidereal_time(2_446_895.5, -3.788 / 3600.0, 23.443_57);
        let diff_seconds = (apparent - mean) * 240.0;
        assert!((diff_seconds + 0.2317).abs() < 1e-3, "{diff_seconds}");
    }

    #[test]
    fn test_horizontal_transform() {
        // object on the meridian at the observer's latitude stands at the zenith
        let (_, alt) = equatorial_to_horizontal(0.0, 48.0, 48.0);
        assert!((alt - 90.0).abs() < 1e-9);

        // celestial equator, hour angle 90° west: on the horizon due west
        let (az, alt) = equatorial_to_horizontal(90.0, 0.0, 48.0);
        assert!(alt.abs() < 1e-9);
        assert!((az - 270.0).abs() < 1e-9, "azimuth {az}");

        // due east six hours before transit
        let (az, _) = equatorial_to_horizontal(-90.0, 0.0, 48.0);
        assert!((az - 90.0).abs() < 1e-9, "azimuth {az}");
    }

    #[test]
    fn test_horizon_corrections() {
        let config = HorizonConfig::default();
        let distance = 384_400.0;
        let hp = horizontal_parallax(distance);
        let sd = semidiameter(distance);
        assert!((hp - 0.9507).abs() < 1e-3);
        assert!((sd - 0.2590).abs() < 1e-3);

        let h0 = config.moon_horizon_deg(distance, 0.0);
        assert!((h0 - (hp - sd - 34.0 / 60.0)).abs() < 1e-12);

        // 46 m above sea level lowers the horizon by about 13′
        let dip = config.dip_deg(46.0);
        assert!((dip * 60.0 - 13.05).abs() < 0.1, "dip {dip}");

        // the sight line to the lowered horizon adds about 2′ of refraction
        let extra = config.altitude_refraction_deg(46.0);
        assert!((extra * 60.0 - 2.15).abs() < 0.01, "extra {extra}");
        let elevated = config.moon_horizon_deg(distance, 46.0);
        assert!((h0 - elevated - dip - extra).abs() < 1e-12);

        let flat = HorizonConfig {
            altitude_correction: false,
            ..config
        };
        assert_eq!(flat.dip_deg(46.0), 0.0);
        assert_eq!(flat.altitude_refraction_deg(46.0), 0.0);
        assert_eq!(flat.moon_horizon_deg(distance, 46.0), h0);
    }

    #[test]
    fn test_saemundsson_refraction() {
        // about 29′ for a true altitude of zero, about 1′ at 45°
        assert!((refraction(0.0) * 60.0 - 28.98).abs() < 0.1);
        assert!((refraction(45.0) * 60.0 - 1.0).abs() < 0.1);
        assert_eq!(refraction(-5.0), 0.0);
    }

    #[test]
    fn test_moon_horizontal_is_consistent() {
        let london = GeoLocation::new(51.509_4, -0.118_3).unwrap();
        let instant = EphemerisInstant::from_jde(2_457_620.0).unwrap();
        let raw = moon_horizontal(instant, &london, false);
        let refracted = moon_horizontal(instant, &london, true);
        let (geocentric, distance) = moon_geocentric_altitude(instant, &london);

        assert!((0.0..360.0).contains(&raw.azimuth));
        assert_eq!(raw.distance_km, distance);
        // parallax always depresses the topocentric Moon
        assert!(raw.elevation < geocentric);
        assert!(refracted.elevation >= raw.elevation);
    }

    #[test]
    fn test_horizon_config_toml() {
        let config: HorizonConfig = toml::from_str("refraction_arcmin = 35.4").unwrap();
        assert_eq!(config.refraction_arcmin, 35.4);
        assert!(config.altitude_correction);
    }
}
