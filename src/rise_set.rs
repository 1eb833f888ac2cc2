//! # Moonrise and Moonset
//!
//! For one observer and one civil day (local midnight to the next local
//! midnight in the observer's zone), the Moon's clearance above the horizon
//!
//! ```text
//! clearance(t) = geocentric altitude(t) − h0(t)
//! ```
//!
//! is sampled every hour. Each sign change is bisected down to one second.
//! Moonrise is the first second at which the Moon is up; moonset the first
//! second at which it is down again.
//!
//! ## Day patterns
//! | Crossings found     | Pattern       | Visible duration                       |
//! |---------------------|---------------|----------------------------------------|
//! | rise then set       | `RiseAndSet`  | `set − rise`                           |
//! | set then rise       | `RiseAndSet`  | `(set − start) + (end − rise)`         |
//! | rise only           | `RiseOnly`    | `end − rise`                           |
//! | set only            | `SetOnly`     | `set − start`                          |
//! | none, Moon up       | `AlwaysUp`    | whole civil day (86400 s unless DST)   |
//! | none, Moon down     | `AlwaysDown`  | 0                                      |
//!
//! Results are stored in UTC and can be presented in any zone afterwards.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, TimeZone, Utc};
use log::{debug, trace};
use serde::{Deserialize, Serialize};

use crate::error::LunarError;
use crate::horizon::{moon_geocentric_altitude, HorizonConfig};
use crate::location::{dms_to_degrees, GeoLocation};
use crate::time_scale::EphemerisInstant;

/// Spacing of the coarse altitude samples.
const SAMPLE_STEP_SECONDS: i64 = 3600;

/// How the Moon's visibility evolves over one civil day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DayPattern {
    RiseAndSet,
    RiseOnly,
    SetOnly,
    AlwaysUp,
    AlwaysDown,
}

/// Moonrise/moonset calculator for one location and time zone.
///
/// ```
/// use chrono::NaiveDate;
/// use chrono_tz::Australia::Perth;
/// use lunar_almanac_lib::LunarTime;
///
/// let lunar_time = LunarTime::of_location(Perth)
///     .southern_latitude(22, 35, 37.31)
///     .eastern_longitude(114, 57, 39.24)
///     .at_altitude(46.0)
///     .build()
///     .unwrap();
/// let moonlight = lunar_time.on(NaiveDate::from_ymd_opt(2016, 7, 4).unwrap()).unwrap();
/// assert!(moonlight.moonrise().is_some());
/// ```
#[derive(Debug, Clone)]
pub struct LunarTime<Tz: TimeZone> {
    location: GeoLocation,
    zone: Tz,
    horizon: HorizonConfig,
}

impl<Tz: TimeZone> LunarTime<Tz> {
    /// Start building a calculator whose civil days follow `zone`.
    pub fn of_location(zone: Tz) -> LunarTimeBuilder<Tz> {
        LunarTimeBuilder::new(zone)
    }

    /// Sea-level observer at decimal-degree coordinates.
    pub fn new(zone: Tz, latitude: f64, longitude: f64) -> Result<Self, LunarError> {
        Ok(Self::from_location(GeoLocation::new(latitude, longitude)?, zone))
    }

    pub fn from_location(location: GeoLocation, zone: Tz) -> Self {
        Self {
            location,
            zone,
            horizon: HorizonConfig::default(),
        }
    }

    pub fn with_horizon(mut self, horizon: HorizonConfig) -> Self {
        self.horizon = horizon;
        self
    }

    pub fn location(&self) -> &GeoLocation {
        &self.location
    }

    pub fn zone(&self) -> &Tz {
        &self.zone
    }

    pub fn horizon(&self) -> &HorizonConfig {
        &self.horizon
    }

    /// Moon's clearance above the observed horizon in degrees; positive when up.
    fn clearance(&self, t: DateTime<Utc>) -> f64 {
        let instant = EphemerisInstant::from_utc(t);
        let (altitude, distance) = moon_geocentric_altitude(instant, &self.location);
        altitude - self.horizon.moon_horizon_deg(distance, self.location.altitude_m())
    }

    fn is_up(&self, t: DateTime<Utc>) -> bool {
        self.clearance(t) > 0.0
    }

    /// First whole second in `(lo, hi]` at which the Moon is `up`.
    fn bisect(&self, mut lo: DateTime<Utc>, mut hi: DateTime<Utc>, up: bool) -> DateTime<Utc> {
        while (hi - lo).num_seconds() > 1 {
            let mid = lo + Duration::seconds((hi - lo).num_seconds() / 2);
            if self.is_up(mid) == up {
                hi = mid;
            } else {
                lo = mid;
            }
        }
        hi
    }

    /// Moonrise, moonset and visibility for the civil day `date` in this zone.
    ///
    /// # Errors
    /// [`LunarError::Unrepresentable`] when a local day boundary cannot be
    /// resolved or lies outside `chrono`'s range.
    pub fn on(&self, date: NaiveDate) -> Result<Moonlight<Tz>, LunarError> {
        let start = start_of_day(&self.zone, date)?;
        let next = date
            .succ_opt()
            .ok_or_else(|| LunarError::Unrepresentable(format!("no day after {date}")))?;
        let end = start_of_day(&self.zone, next)?;

        let up_at_start = self.is_up(start);
        let mut rise = None;
        let mut set = None;

        let mut prev_time = start;
        let mut prev_up = up_at_start;
        while prev_time < end && (rise.is_none() || set.is_none()) {
            let time = (prev_time + Duration::seconds(SAMPLE_STEP_SECONDS)).min(end);
            let up = self.is_up(time);
            if up != prev_up {
                let crossing = self.bisect(prev_time, time, up);
                trace!("horizon crossing (up = {up}) at {crossing}");
                // the next midnight belongs to the following day
                if crossing < end {
                    if up && rise.is_none() {
                        rise = Some(crossing);
                    } else if !up && set.is_none() {
                        set = Some(crossing);
                    }
                }
            }
            prev_time = time;
            prev_up = up;
        }

        let moonlight = Moonlight {
            rise,
            set,
            start,
            end,
            up_at_start,
            zone: self.zone.clone(),
        };
        debug!(
            "moonlight on {date} at ({}, {}): {:?}, {} s",
            self.location.latitude(),
            self.location.longitude(),
            moonlight.pattern(),
            moonlight.length()
        );
        Ok(moonlight)
    }
}

/// Builder for [`LunarTime`] taking coordinates in degrees, minutes and seconds.
///
/// Each component may be given once; the first problem is reported by
/// [`build`](LunarTimeBuilder::build).
#[derive(Debug, Clone)]
pub struct LunarTimeBuilder<Tz: TimeZone> {
    zone: Tz,
    latitude: Option<f64>,
    longitude: Option<f64>,
    altitude_m: Option<f64>,
    horizon: HorizonConfig,
    error: Option<LunarError>,
}

impl<Tz: TimeZone> LunarTimeBuilder<Tz> {
    fn new(zone: Tz) -> Self {
        Self {
            zone,
            latitude: None,
            longitude: None,
            altitude_m: None,
            horizon: HorizonConfig::default(),
            error: None,
        }
    }

    fn fail(mut self, error: LunarError) -> Self {
        if self.error.is_none() {
            self.error = Some(error);
        }
        self
    }

    fn set_latitude(self, degrees: u32, minutes: u32, seconds: f64, sign: f64) -> Self {
        if self.latitude.is_some() {
            return self.fail(LunarError::invalid("latitude already set"));
        }
        match dms_to_degrees(degrees, minutes, seconds, 90) {
            Ok(value) => Self {
                latitude: Some(sign * value),
                ..self
            },
            Err(e) => self.fail(e),
        }
    }

    fn set_longitude(self, degrees: u32, minutes: u32, seconds: f64, sign: f64) -> Self {
        if self.longitude.is_some() {
            return self.fail(LunarError::invalid("longitude already set"));
        }
        match dms_to_degrees(degrees, minutes, seconds, 180) {
            Ok(value) => Self {
                longitude: Some(sign * value),
                ..self
            },
            Err(e) => self.fail(e),
        }
    }

    pub fn northern_latitude(self, degrees: u32, minutes: u32, seconds: f64) -> Self {
        self.set_latitude(degrees, minutes, seconds, 1.0)
    }

    pub fn southern_latitude(self, degrees: u32, minutes: u32, seconds: f64) -> Self {
        self.set_latitude(degrees, minutes, seconds, -1.0)
    }

    pub fn eastern_longitude(self, degrees: u32, minutes: u32, seconds: f64) -> Self {
        self.set_longitude(degrees, minutes, seconds, 1.0)
    }

    pub fn western_longitude(self, degrees: u32, minutes: u32, seconds: f64) -> Self {
        self.set_longitude(degrees, minutes, seconds, -1.0)
    }

    /// Observer altitude above sea level in metres.
    pub fn at_altitude(self, altitude_m: f64) -> Self {
        if self.altitude_m.is_some() {
            return self.fail(LunarError::invalid("altitude already set"));
        }
        Self {
            altitude_m: Some(altitude_m),
            ..self
        }
    }

    pub fn with_horizon(self, horizon: HorizonConfig) -> Self {
        Self { horizon, ..self }
    }

    /// # Errors
    /// [`LunarError::InvalidArgument`] for a missing latitude or longitude, a
    /// component given twice or any value out of range.
    pub fn build(self) -> Result<LunarTime<Tz>, LunarError> {
        if let Some(error) = self.error {
            return Err(error);
        }
        let latitude = self
            .latitude
            .ok_or_else(|| LunarError::invalid("latitude not set"))?;
        let longitude = self
            .longitude
            .ok_or_else(|| LunarError::invalid("longitude not set"))?;
        let location =
            GeoLocation::with_altitude(latitude, longitude, self.altitude_m.unwrap_or(0.0))?;
        Ok(LunarTime::from_location(location, self.zone).with_horizon(self.horizon))
    }
}

/// Resolve local midnight of `date`; a midnight skipped by a DST jump resolves
/// to the first valid local time after it.
fn start_of_day<Tz: TimeZone>(zone: &Tz, date: NaiveDate) -> Result<DateTime<Utc>, LunarError> {
    let midnight = date
        .and_hms_opt(0, 0, 0)
        .ok_or_else(|| LunarError::Unrepresentable(format!("no midnight on {date}")))?;
    (0..=24 * 4)
        .map(|quarter| midnight + Duration::minutes(15 * quarter))
        .find_map(|local| zone.from_local_datetime(&local).earliest())
        .map(|dt| dt.with_timezone(&Utc))
        .ok_or_else(|| LunarError::Unrepresentable(format!("cannot resolve start of {date}")))
}

/// Moonrise, moonset and visibility of one civil day at one location.
#[derive(Debug, Clone)]
pub struct Moonlight<Tz: TimeZone> {
    rise: Option<DateTime<Utc>>,
    set: Option<DateTime<Utc>>,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    up_at_start: bool,
    zone: Tz,
}

impl<Tz: TimeZone> Moonlight<Tz> {
    pub fn moonrise(&self) -> Option<DateTime<Tz>> {
        self.rise.map(|t| t.with_timezone(&self.zone))
    }

    pub fn moonset(&self) -> Option<DateTime<Tz>> {
        self.set.map(|t| t.with_timezone(&self.zone))
    }

    pub fn moonrise_in<Z: TimeZone>(&self, zone: &Z) -> Option<DateTime<Z>> {
        self.rise.map(|t| t.with_timezone(zone))
    }

    pub fn moonset_in<Z: TimeZone>(&self, zone: &Z) -> Option<DateTime<Z>> {
        self.set.map(|t| t.with_timezone(zone))
    }

    /// Moonrise as wall-clock time in the calculator's zone.
    pub fn moonrise_local(&self) -> Option<NaiveDateTime> {
        self.moonrise().map(|t| t.naive_local())
    }

    pub fn moonset_local(&self) -> Option<NaiveDateTime> {
        self.moonset().map(|t| t.naive_local())
    }

    /// First instant of the civil day.
    pub fn start(&self) -> DateTime<Tz> {
        self.start.with_timezone(&self.zone)
    }

    /// First instant of the following civil day.
    pub fn end(&self) -> DateTime<Tz> {
        self.end.with_timezone(&self.zone)
    }

    pub fn pattern(&self) -> DayPattern {
        match (self.rise, self.set) {
            (Some(_), Some(_)) => DayPattern::RiseAndSet,
            (Some(_), None) => DayPattern::RiseOnly,
            (None, Some(_)) => DayPattern::SetOnly,
            (None, None) if self.up_at_start => DayPattern::AlwaysUp,
            (None, None) => DayPattern::AlwaysDown,
        }
    }

    /// Seconds the Moon spends above the horizon during the day.
    pub fn length(&self) -> i64 {
        let seconds = match (self.rise, self.set) {
            (Some(rise), Some(set)) if rise < set => set - rise,
            (Some(rise), Some(set)) => (set - self.start) + (self.end - rise),
            (Some(rise), None) => self.end - rise,
            (None, Some(set)) => set - self.start,
            (None, None) if self.up_at_start => self.end - self.start,
            (None, None) => Duration::zero(),
        };
        seconds.num_seconds()
    }

    /// Moon below the horizon for the whole day.
    pub fn is_absent(&self) -> bool {
        self.pattern() == DayPattern::AlwaysDown
    }

    /// Moon above the horizon for the whole day.
    pub fn is_present_all_day(&self) -> bool {
        self.pattern() == DayPattern::AlwaysUp
    }

    /// Whether the Moon is up at `t`; false outside this civil day.
    pub fn is_present<Z: TimeZone>(&self, t: &DateTime<Z>) -> bool {
        let t = t.with_timezone(&Utc);
        if t < self.start || t >= self.end {
            return false;
        }
        let mut events: Vec<(DateTime<Utc>, bool)> = self
            .rise
            .map(|r| (r, true))
            .into_iter()
            .chain(self.set.map(|s| (s, false)))
            .collect();
        events.sort_by_key(|&(time, _)| time);
        events
            .iter()
            .filter(|&&(time, _)| time <= t)
            .last()
            .map_or(self.up_at_start, |&(_, up)| up)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, Timelike};

    fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, s).unwrap()
    }

    fn synthetic(
        rise: Option<DateTime<Utc>>,
        set: Option<DateTime<Utc>>,
        up_at_start: bool,
    ) -> Moonlight<Utc> {
        Moonlight {
            rise,
            set,
            start: utc(2020, 5, 1, 0, 0, 0),
            end: utc(2020, 5, 2, 0, 0, 0),
            up_at_start,
            zone: Utc,
        }
    }

    #[test]
    fn test_length_rise_before_set() {
        let m = synthetic(
            Some(utc(2020, 5, 1, 6, 25, 10)),
            Some(utc(2020, 5, 1, 17, 48, 40)),
            false,
        );
        assert_eq!(m.pattern(), DayPattern::RiseAndSet);
        assert_eq!(m.length(), 41_010);
    }

    #[test]
    fn test_length_set_before_rise() {
        let m = synthetic(
            Some(utc(2020, 5, 1, 20, 45, 13)),
            Some(utc(2020, 5, 1, 7, 3, 14)),
            true,
        );
        assert_eq!(m.length(), 37_081);
        assert!(m.is_present(&utc(2020, 5, 1, 1, 0, 0)));
        assert!(!m.is_present(&utc(2020, 5, 1, 12, 0, 0)));
        assert!(m.is_present(&utc(2020, 5, 1, 23, 0, 0)));
    }

    #[test]
    fn test_length_missing_boundaries() {
        let rise_only = synthetic(Some(utc(2020, 5, 1, 18, 0, 0)), None, false);
        assert_eq!(rise_only.pattern(), DayPattern::RiseOnly);
        assert_eq!(rise_only.length(), 6 * 3600);

        let set_only = synthetic(None, Some(utc(2020, 5, 1, 8, 58, 33)), true);
        assert_eq!(set_only.pattern(), DayPattern::SetOnly);
        assert_eq!(set_only.length(), 32_313);
        assert!(!set_only.is_absent());
        assert!(!set_only.is_present_all_day());

        let up = synthetic(None, None, true);
        assert!(up.is_present_all_day());
        assert_eq!(up.length(), 86_400);

        let down = synthetic(None, None, false);
        assert!(down.is_absent());
        assert_eq!(down.length(), 0);
    }

    #[test]
    fn test_is_present_edges() {
        let m = synthetic(
            Some(utc(2020, 5, 1, 6, 25, 10)),
            Some(utc(2020, 5, 1, 17, 48, 40)),
            false,
        );
        assert!(!m.is_present(&utc(2020, 5, 1, 6, 25, 9)));
        assert!(m.is_present(&utc(2020, 5, 1, 6, 25, 10)));
        assert!(m.is_present(&utc(2020, 5, 1, 17, 48, 39)));
        assert!(!m.is_present(&utc(2020, 5, 1, 17, 48, 40)));
        // outside the civil day
        assert!(!m.is_present(&utc(2020, 5, 2, 12, 0, 0)));
    }

    #[test]
    fn test_polar_day_and_night() {
        let zone = FixedOffset::east_opt(2 * 3600).unwrap();
        let lunar_time = LunarTime::new(zone, 65.0, 10.0).unwrap();

        let up = lunar_time.on(NaiveDate::from_ymd_opt(2007, 6, 14).unwrap()).unwrap();
        assert!(up.is_present_all_day());
        assert_eq!(up.length(), 86_400);
        assert!(up.moonrise().is_none() && up.moonset().is_none());

        let down = lunar_time.on(NaiveDate::from_ymd_opt(2007, 6, 30).unwrap()).unwrap();
        assert!(down.is_absent());
        assert_eq!(down.length(), 0);
    }

    #[test]
    fn test_crossings_are_consistent_with_clearance() {
        let lunar_time = LunarTime::new(Utc, 51.5, 0.0).unwrap();
        let day = lunar_time.on(NaiveDate::from_ymd_opt(2016, 8, 19).unwrap()).unwrap();
        if let Some(rise) = day.moonrise() {
            assert!(lunar_time.clearance(rise) > 0.0);
            assert!(lunar_time.clearance(rise - Duration::seconds(1)) <= 0.0);
            assert_eq!(rise.nanosecond(), 0);
        }
        if let Some(set) = day.moonset() {
            assert!(lunar_time.clearance(set) <= 0.0);
            assert!(lunar_time.clearance(set - Duration::seconds(1)) > 0.0);
        }
        assert!(day.moonrise().is_some() || day.moonset().is_some());
    }

    #[test]
    fn test_builder_validation() {
        let missing = LunarTime::of_location(Utc).northern_latitude(48, 0, 0.0).build();
        assert!(matches!(missing, Err(LunarError::InvalidArgument(_))));

        let twice = LunarTime::of_location(Utc)
            .northern_latitude(48, 0, 0.0)
            .southern_latitude(10, 0, 0.0)
            .eastern_longitude(11, 0, 0.0)
            .build();
        assert!(twice.is_err());

        let bad_minutes = LunarTime::of_location(Utc)
            .northern_latitude(48, 61, 0.0)
            .eastern_longitude(11, 0, 0.0)
            .build();
        assert!(bad_minutes.is_err());

        let too_high = LunarTime::of_location(Utc)
            .northern_latitude(48, 0, 0.0)
            .eastern_longitude(11, 0, 0.0)
            .at_altitude(11_000.0)
            .build();
        assert!(too_high.is_err());

        let london = LunarTime::of_location(Utc)
            .northern_latitude(51, 30, 33.8)
            .western_longitude(0, 7, 5.95)
            .build()
            .unwrap();
        assert!((london.location().latitude() - 51.509_389).abs() < 1e-6);
        assert!((london.location().longitude() + 0.118_319).abs() < 1e-6);
    }

    #[test]
    fn test_start_of_day_across_dst() {
        let berlin = chrono_tz::Europe::Berlin;
        // spring forward: 23-hour day
        let start = start_of_day(&berlin, NaiveDate::from_ymd_opt(2000, 3, 26).unwrap()).unwrap();
        let end = start_of_day(&berlin, NaiveDate::from_ymd_opt(2000, 3, 27).unwrap()).unwrap();
        assert_eq!((end - start).num_hours(), 23);
        assert_eq!(start, utc(2000, 3, 25, 23, 0, 0));
    }

    #[test]
    fn test_start_of_day_skipped_midnight() {
        // Santiago skips 00:00 to 01:00 when DST starts
        let santiago = chrono_tz::America::Santiago;
        let start = start_of_day(&santiago, NaiveDate::from_ymd_opt(2023, 9, 3).unwrap()).unwrap();
        assert_eq!(start.with_timezone(&santiago).hour(), 1);
    }
}
