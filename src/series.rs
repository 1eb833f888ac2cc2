//! # Illumination Series
//!
//! Samples the illuminated fraction at a fixed step on both sides of a
//! reference instant, for charting the waxing and waning of the Moon.
//!
//! - The window is always centred on the reference instant, so the middle
//!   sample (`hours_rel == 0`) is "now"
//! - `Vec::with_capacity` sizes the sample buffer exactly once
//! - Each sample is an independent position evaluation; there is no state
//!   carried between samples

use chrono::{DateTime, Utc};

use crate::error::LunarError;
use crate::phase::{illuminated_fraction, phase_angle};
use crate::time_scale::EphemerisInstant;
use crate::{IlluminationSample, IlluminationSeries};

/// Sample illumination every `step_hours` from `-window_hours` to `+window_hours`
/// around `now` (or the current time when `None`).
///
/// # Errors
/// [`LunarError::InvalidArgument`] when the step is not positive, the window is
/// negative, or the window is not a whole number of steps.
pub fn illumination_series(
    now: Option<DateTime<Utc>>,
    window_hours: i16,
    step_hours: i16,
) -> Result<IlluminationSeries, LunarError> {
    if step_hours <= 0 || window_hours < 0 || window_hours % step_hours != 0 {
        return Err(LunarError::invalid(format!(
            "window of {window_hours} h cannot be sampled every {step_hours} h"
        )));
    }

    let now = now.unwrap_or_else(Utc::now);
    let reference = EphemerisInstant::from_utc(now);

    let count = (2 * i32::from(window_hours) / i32::from(step_hours)) as usize + 1;
    let mut samples = Vec::with_capacity(count);
    for hours_rel in (-window_hours..=window_hours).step_by(step_hours as usize) {
        let instant = reference.plus_days(f64::from(hours_rel) / 24.0);
        samples.push(IlluminationSample {
            hours_rel,
            fraction: illuminated_fraction(instant) as f32,
        });
    }

    Ok(IlluminationSeries {
        samples,
        waxing: phase_angle(reference) < 180.0,
    })
}
