//! # Phase Calculator
//!
//! Derives the Moon's phase angle and illuminated fraction from the geocentric
//! positions of the Moon and Sun (Meeus ch. 48, first method).
//!
//! - **Phase angle**: `λ☾ − λ☉` wrapped to [0, 360). 0° is new moon, 90° first
//!   quarter, 180° full, 270° last quarter.
//! - **Illuminated fraction**: `k = (1 + cos i) / 2` where `i` is the
//!   Sun–Moon–Earth angle.
//!
//! [`illumination`] rounds to two decimals, the precision at which the
//! fraction is published (new moon reads 0.0, full moon 1.0, quarters 0.5).

use crate::error::LunarError;
use crate::lunar::{normalize_degrees, position, LunarPosition};
use crate::time_scale::EphemerisInstant;

const DEG: f64 = core::f64::consts::PI / 180.0;

/// Largest number of decimal digits accepted by [`illumination_with_precision`].
pub const MAX_PRECISION: u32 = 15;

/// Elongation of the Moon from the Sun in ecliptic longitude, [0, 360).
pub fn phase_angle(instant: EphemerisInstant) -> f64 {
    phase_angle_of(&position(instant))
}

/// [`phase_angle`] from an already computed position.
pub fn phase_angle_of(pos: &LunarPosition) -> f64 {
    normalize_degrees(pos.moon.longitude - pos.sun.longitude)
}

/// Geocentric angular distance between Moon and Sun ψ in degrees, [0, 180].
pub fn elongation(instant: EphemerisInstant) -> f64 {
    elongation_of(&position(instant))
}

/// [`elongation`] from an already computed position.
pub fn elongation_of(pos: &LunarPosition) -> f64 {
    let beta = pos.moon.latitude * DEG;
    let dlon = (pos.moon.longitude - pos.sun.longitude) * DEG;
    (beta.cos() * dlon.cos()).clamp(-1.0, 1.0).acos() / DEG
}

/// Sun–Moon–Earth angle `i` in degrees.
fn phase_angle_i(pos: &LunarPosition) -> f64 {
    let psi = elongation_of(pos) * DEG;
    let sun_distance = pos.sun.distance_km;
    let moon_distance = pos.moon.distance_km;
    (sun_distance * psi.sin()).atan2(moon_distance - sun_distance * psi.cos()) / DEG
}

/// Unrounded illuminated fraction, clipped to [0, 1].
pub fn illuminated_fraction(instant: EphemerisInstant) -> f64 {
    illuminated_fraction_of(&position(instant))
}

/// [`illuminated_fraction`] from an already computed position.
pub fn illuminated_fraction_of(pos: &LunarPosition) -> f64 {
    let i = phase_angle_i(pos) * DEG;
    ((1.0 + i.cos()) / 2.0).clamp(0.0, 1.0)
}

/// Illuminated fraction rounded to two decimal places.
pub fn illumination(instant: EphemerisInstant) -> f64 {
    round_to(illuminated_fraction(instant), 2)
}

/// Illuminated fraction rounded to `digits` decimal places (0 ..= 15).
///
/// # Errors
/// [`LunarError::InvalidArgument`] when `digits` exceeds [`MAX_PRECISION`].
pub fn illumination_with_precision(
    instant: EphemerisInstant,
    digits: u32,
) -> Result<f64, LunarError> {
    if digits > MAX_PRECISION {
        return Err(LunarError::invalid(format!(
            "precision must be in 0..={MAX_PRECISION}, got {digits}"
        )));
    }
    Ok(round_to(illuminated_fraction(instant), digits))
}

fn round_to(value: f64, digits: u32) -> f64 {
    let scale = 10f64.powi(digits as i32);
    ((value * scale).round() / scale).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn meeus_48a() -> EphemerisInstant {
        EphemerisInstant::from_terrestrial_time(
            NaiveDate::from_ymd_opt(1992, 4, 12)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap(),
        )
    }

    #[test]
    fn test_illumination_meeus_48a() {
        // k = 0.6786
        let raw = illuminated_fraction(meeus_48a());
        assert!((raw - 0.6786).abs() < 5e-4, "k = {raw}");
        assert_eq!(illumination(meeus_48a()), 0.68);
    }

    #[test]
    fn test_elongation_and_phase_angle_agree_near_ecliptic() {
        let instant = meeus_48a();
        let psi = elongation(instant);
        let angle = phase_angle(instant);
        // waxing gibbous: moon east of the sun by a bit under 120°
        assert!((100.0..130.0).contains(&angle), "phase angle {angle}");
        assert!((psi - angle).abs() < 1.0);
    }

    #[test]
    fn test_position_variants_agree() {
        let instant = meeus_48a();
        let pos = position(instant);
        assert_eq!(phase_angle_of(&pos), phase_angle(instant));
        assert_eq!(elongation_of(&pos), elongation(instant));
        assert_eq!(illuminated_fraction_of(&pos), illuminated_fraction(instant));
    }

    #[test]
    fn test_precision() {
        let instant = meeus_48a();
        assert_eq!(illumination_with_precision(instant, 1).unwrap(), 0.7);
        assert_eq!(illumination_with_precision(instant, 0).unwrap(), 1.0);
        let fine = illumination_with_precision(instant, 4).unwrap();
        assert!((fine - 0.6786).abs() <= 6e-4);
        assert!(illumination_with_precision(instant, MAX_PRECISION).is_ok());
        assert!(matches!(
            illumination_with_precision(instant, 16),
            Err(LunarError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_fraction_bounded_over_months() {
        let start = meeus_48a();
        for step in 0..240 {
            let k = illuminated_fraction(start.plus_days(f64::from(step) * 0.25));
            assert!((0.0..=1.0).contains(&k));
        }
    }
}
