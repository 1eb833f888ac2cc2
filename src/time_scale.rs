//! # Time Scale Conversion
//!
//! Every astronomical routine in this crate works on a continuous day count in
//! Terrestrial Time, the Julian Ephemeris Day (JDE). This module converts civil
//! `chrono` timestamps to and from that axis.
//!
//! ## ΔT policy
//! The offset ΔT = TT − UT is supplied through the [`DeltaT`] trait so callers
//! can plug in their own Earth-rotation model. [`StandardDeltaT`] is the default:
//!
//! - **1972 onwards**: `ΔT = (TAI − UTC) + 32.184 s` from the leap second table.
//!   Dates after the last tabulated leap second keep the final offset.
//! - **Before 1972**: the Espenak–Meeus polynomial approximations, one per era.
//!
//! UT1 and UTC are treated as identical (they never differ by more than 0.9 s).

use chrono::{DateTime, NaiveDateTime, SubsecRound, Utc};
use serde::Serialize;

use crate::error::{ensure_finite, LunarError};

/// Julian Ephemeris Day of the J2000.0 epoch (2000-01-01 12:00 TT).
pub const J2000_JDE: f64 = 2_451_545.0;

/// Days in a Julian century.
pub const DAYS_PER_CENTURY: f64 = 36_525.0;

/// Julian Day of the Unix epoch (1970-01-01 00:00 UTC).
const UNIX_EPOCH_JD: f64 = 2_440_587.5;

const SECONDS_PER_DAY: f64 = 86_400.0;

/// TT − TAI in seconds.
const TT_MINUS_TAI: f64 = 32.184;

/// TAI − UTC in seconds, effective from the first day of (year, month).
#[rustfmt::skip]
static LEAP_SECONDS: [(i32, u32, f64); 28] = [
    (1972, 1, 10.0), (1972, 7, 11.0), (1973, 1, 12.0), (1974, 1, 13.0),
    (1975, 1, 14.0), (1976, 1, 15.0), (1977, 1, 16.0), (1978, 1, 17.0),
    (1979, 1, 18.0), (1980, 1, 19.0), (1981, 7, 20.0), (1982, 7, 21.0),
    (1983, 7, 22.0), (1985, 7, 23.0), (1988, 1, 24.0), (1990, 1, 25.0),
    (1991, 1, 26.0), (1992, 7, 27.0), (1993, 7, 28.0), (1994, 7, 29.0),
    (1996, 1, 30.0), (1997, 7, 31.0), (1999, 1, 32.0), (2006, 1, 33.0),
    (2009, 1, 34.0), (2012, 7, 35.0), (2015, 7, 36.0), (2017, 1, 37.0),
];

/// Source of ΔT = TT − UT in seconds for a Julian Day on the UT axis.
pub trait DeltaT: Send + Sync {
    fn delta_t_seconds(&self, jd_ut: f64) -> f64;
}

/// Leap seconds since 1972, Espenak–Meeus polynomials before.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StandardDeltaT;

impl DeltaT for StandardDeltaT {
    fn delta_t_seconds(&self, jd_ut: f64) -> f64 {
        let (year, month, _) = LEAP_SECONDS[0];
        if jd_ut >= julian_day(year, month, 1.0) {
            tai_minus_utc(jd_ut) + TT_MINUS_TAI
        } else {
            espenak_meeus(2000.0 + (jd_ut - J2000_JDE) / 365.25)
        }
    }
}

fn tai_minus_utc(jd_utc: f64) -> f64 {
    LEAP_SECONDS
        .iter()
        .rev()
        .find(|&&(year, month, _)| jd_utc >= julian_day(year, month, 1.0))
        .map(|&(_, _, offset)| offset)
        .unwrap_or(LEAP_SECONDS[0].2)
}

/// Polynomial ΔT approximations (Espenak & Meeus, NASA 2006) by decimal year.
fn espenak_meeus(y: f64) -> f64 {
    match y {
        y if y < -500.0 => {
            let u = (y - 1820.0) / 100.0;
            -20.0 + 32.0 * u * u
        }
        y if y < 500.0 => {
            let u = y / 100.0;
            10583.6 - 1014.41 * u + 33.78311 * u.powi(2) - 5.952053 * u.powi(3)
                - 0.1798452 * u.powi(4)
                + 0.022174192 * u.powi(5)
                + 0.0090316521 * u.powi(6)
        }
        y if y < 1600.0 => {
            let u = (y - 1000.0) / 100.0;
            1574.2 - 556.01 * u + 71.23472 * u.powi(2) + 0.319781 * u.powi(3)
                - 0.8503463 * u.powi(4)
                - 0.005050998 * u.powi(5)
                + 0.0083572073 * u.powi(6)
        }
        y if y < 1700.0 => {
            let t = y - 1600.0;
            120.0 - 0.9808 * t - 0.01532 * t.powi(2) + t.powi(3) / 7129.0
        }
        y if y < 1800.0 => {
            let t = y - 1700.0;
            8.83 + 0.1603 * t - 0.0059285 * t.powi(2) + 0.00013336 * t.powi(3)
                - t.powi(4) / 1_174_000.0
        }
        y if y < 1860.0 => {
            let t = y - 1800.0;
            13.72 - 0.332447 * t + 0.0068612 * t.powi(2) + 0.0041116 * t.powi(3)
                - 0.00037436 * t.powi(4)
                + 0.0000121272 * t.powi(5)
                - 0.0000001699 * t.powi(6)
                + 0.000000000875 * t.powi(7)
        }
        y if y < 1900.0 => {
            let t = y - 1860.0;
            7.62 + 0.5737 * t - 0.251754 * t.powi(2) + 0.01680668 * t.powi(3)
                - 0.0004473624 * t.powi(4)
                + t.powi(5) / 233_174.0
        }
        y if y < 1920.0 => {
            let t = y - 1900.0;
            -2.79 + 1.494119 * t - 0.0598939 * t.powi(2) + 0.0061966 * t.powi(3)
                - 0.000197 * t.powi(4)
        }
        y if y < 1941.0 => {
            let t = y - 1920.0;
            21.20 + 0.84493 * t - 0.076100 * t.powi(2) + 0.0020936 * t.powi(3)
        }
        y if y < 1961.0 => {
            let t = y - 1950.0;
            29.07 + 0.407 * t - t.powi(2) / 233.0 + t.powi(3) / 2547.0
        }
        y => {
            let t = y - 1975.0;
            45.45 + 1.067 * t - t.powi(2) / 260.0 - t.powi(3) / 718.0
        }
    }
}

/// Julian Day of a Gregorian calendar date with fractional day (Meeus 7.1).
pub fn julian_day(year: i32, month: u32, day: f64) -> f64 {
    let (y, m) = if month <= 2 {
        (year - 1, month as i32 + 12)
    } else {
        (year, month as i32)
    };
    let a = (y as f64 / 100.0).floor();
    let b = 2.0 - a + (a / 4.0).floor();
    (365.25 * (y as f64 + 4716.0)).floor() + (30.6001 * (m as f64 + 1.0)).floor() + day + b
        - 1524.5
}

fn unix_jd(dt: &DateTime<Utc>) -> f64 {
    let seconds = dt.timestamp() as f64 + f64::from(dt.timestamp_subsec_nanos()) * 1e-9;
    seconds / SECONDS_PER_DAY + UNIX_EPOCH_JD
}

/// A point on the Terrestrial Time axis, as a Julian Ephemeris Day.
///
/// Always finite. Ordering follows the day count.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize)]
pub struct EphemerisInstant {
    jde: f64,
}

impl EphemerisInstant {
    /// Wrap a Julian Ephemeris Day, rejecting NaN and infinities.
    pub fn from_jde(jde: f64) -> Result<Self, LunarError> {
        ensure_finite(jde, "julian ephemeris day").map(|jde| Self { jde })
    }

    /// Internal constructor for values that are finite by construction.
    pub(crate) fn new(jde: f64) -> Self {
        debug_assert!(jde.is_finite());
        Self { jde }
    }

    /// Convert a UTC timestamp using the default ΔT policy.
    pub fn from_utc(dt: DateTime<Utc>) -> Self {
        Self::from_utc_with(dt, &StandardDeltaT)
    }

    /// Convert a UTC timestamp using a caller-supplied ΔT policy.
    pub fn from_utc_with(dt: DateTime<Utc>, delta_t: &dyn DeltaT) -> Self {
        let jd_utc = unix_jd(&dt);
        Self::new(jd_utc + delta_t.delta_t_seconds(jd_utc) / SECONDS_PER_DAY)
    }

    /// Interpret a calendar timestamp directly on the TT axis (no ΔT).
    pub fn from_terrestrial_time(tt: NaiveDateTime) -> Self {
        Self::new(unix_jd(&tt.and_utc()))
    }

    pub fn jde(&self) -> f64 {
        self.jde
    }

    /// Julian centuries since J2000.0.
    pub fn centuries_j2000(&self) -> f64 {
        (self.jde - J2000_JDE) / DAYS_PER_CENTURY
    }

    /// Shift by a (possibly fractional) number of days.
    pub fn plus_days(&self, days: f64) -> Self {
        Self::new(self.jde + days)
    }

    /// Julian Day on the UT axis under the default ΔT policy.
    pub fn jd_ut(&self) -> f64 {
        self.jd_ut_with(&StandardDeltaT)
    }

    /// Julian Day on the UT axis; ΔT depends on UT, so iterate a few times.
    pub fn jd_ut_with(&self, delta_t: &dyn DeltaT) -> f64 {
        let mut jd_ut = self.jde;
        for _ in 0..3 {
            jd_ut = self.jde - delta_t.delta_t_seconds(jd_ut) / SECONDS_PER_DAY;
        }
        jd_ut
    }

    /// Convert to a UTC timestamp using the default ΔT policy.
    pub fn to_utc(&self) -> Result<DateTime<Utc>, LunarError> {
        self.to_utc_with(&StandardDeltaT)
    }

    pub fn to_utc_with(&self, delta_t: &dyn DeltaT) -> Result<DateTime<Utc>, LunarError> {
        let unix = (self.jd_ut_with(delta_t) - UNIX_EPOCH_JD) * SECONDS_PER_DAY;
        let secs = unix.floor();
        let nanos = (((unix - secs) * 1e9).round() as u32).min(999_999_999);
        DateTime::from_timestamp(secs as i64, nanos).ok_or_else(|| {
            LunarError::Unrepresentable(format!("JDE {} is outside the civil range", self.jde))
        })
    }

    /// UTC timestamp truncated to whole seconds, the published precision.
    pub fn to_utc_seconds(&self) -> Result<DateTime<Utc>, LunarError> {
        self.to_utc().map(|dt| dt.trunc_subsecs(0))
    }
}
