//! # Lunar Almanac Core Library
//!
//! Low-precision lunar ephemeris for calendars, almanacs and event planners
//! that need trustworthy Moon data without a full planetary ephemeris.
//!
//! ## What it computes
//! - **Position** ([`lunar`]): apparent geocentric longitude, latitude and
//!   distance of the Moon and Sun, right ascension and declination of the Moon
//! - **Phase** ([`phase`]): phase angle and illuminated fraction
//! - **Phase events** ([`phase_event`]): new moon, quarters and full moon by
//!   lunation index or nearest a given instant
//! - **Rise and set** ([`rise_set`]): moonrise, moonset and visible duration for
//!   one civil day at one location, in any `chrono` time zone
//!
//! ## Data Flow
//! 1. A civil `DateTime<Utc>` becomes an [`EphemerisInstant`] (Terrestrial Time)
//! 2. The position series is evaluated at that instant
//! 3. Phase, events and horizon searches are pure functions of positions
//!
//! Nothing in the library performs I/O except [`config`]; every type is a
//! plain value and safe to share across threads.
//!
//! ## Example
//! ```
//! use chrono::{TimeZone, Utc};
//! use lunar_almanac_lib::{phase, EphemerisInstant, MoonPhaseKind};
//!
//! let t = Utc.with_ymd_and_hms(2017, 11, 1, 0, 0, 0).unwrap();
//! let full = MoonPhaseKind::Full.after(t).unwrap();
//! assert!(full > t);
//!
//! let k = phase::illumination(EphemerisInstant::from_utc(full));
//! assert_eq!(k, 1.0);
//! ```

use serde::{Deserialize, Serialize};

pub mod config;
pub mod error;
pub mod horizon;
pub mod location;
pub mod lunar;
pub mod nutation;
pub mod phase;
pub mod phase_event;
pub mod renderer;
pub mod rise_set;
pub mod series;
pub mod time_scale;

pub use error::LunarError;
pub use horizon::{HorizonConfig, HorizontalPosition};
pub use location::GeoLocation;
pub use lunar::{position, EclipticPosition, EquatorialPosition, LunarPosition};
pub use phase_event::MoonPhaseKind;
pub use rise_set::{DayPattern, LunarTime, LunarTimeBuilder, Moonlight};
pub use time_scale::{DeltaT, EphemerisInstant, StandardDeltaT};

/// Illuminated fraction of the Moon at a time relative to a reference instant.
///
/// Sized like a chart column: `i16` hours cover ±3.7 years, `f32` is ample for
/// a fraction that is plotted, not published.
///
/// # Example
/// ```
/// use lunar_almanac_lib::IlluminationSample;
///
/// let now = IlluminationSample { hours_rel: 0, fraction: 0.68 };
/// let yesterday = IlluminationSample { hours_rel: -24, fraction: 0.58 };
/// assert!(now.fraction > yesterday.fraction);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct IlluminationSample {
    /// Hours relative to the reference instant (negative = past)
    pub hours_rel: i16,
    /// Illuminated fraction in [0, 1]
    pub fraction: f32,
}

/// Evenly spaced illumination samples centred on a reference instant.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct IlluminationSeries {
    /// Samples in chronological order; the middle one is the reference instant
    pub samples: Vec<IlluminationSample>,
    /// True while the illuminated fraction grows (phase angle below 180°)
    pub waxing: bool,
}
