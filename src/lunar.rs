//! Low-precision lunar and solar ephemeris (Meeus, *Astronomical Algorithms*)
//!
//! Moon: chapter 47, the 60 + 60 periodic terms of the ELP-2000/82 truncation.
//! Accuracy: about 10″ in longitude, 4″ in latitude, a few km in distance.
//! Sun: chapter 25, the low-accuracy solution (about 0.01°), which is plenty
//! for phase and illumination work.
//!
//! Everything here is a pure function of an [`EphemerisInstant`]; the tables
//! are static and evaluation is a fixed-length sum.

use core::f64::consts::PI;

use serde::{Deserialize, Serialize};

use crate::nutation::{nutation, true_obliquity, Nutation};
use crate::time_scale::EphemerisInstant;

const DEG: f64 = PI / 180.0;

/// Astronomical unit in km.
pub const AU_KM: f64 = 149_597_870.7;

/// Geocentric ecliptic coordinates of a body, referred to the equinox of date.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EclipticPosition {
    /// Ecliptic longitude (deg, 0 – 360).
    pub longitude: f64,
    /// Ecliptic latitude (deg, −90 – 90).
    pub latitude: f64,
    /// Distance from Earth's centre in km.
    pub distance_km: f64,
}

/// Geocentric equatorial coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EquatorialPosition {
    /// Right ascension (deg, 0 – 360).
    pub right_ascension: f64,
    /// Declination (deg, −90 – 90).
    pub declination: f64,
}

/// Everything the position calculator derives for one instant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LunarPosition {
    /// Apparent geocentric position of the Moon.
    pub moon: EclipticPosition,
    /// Apparent geocentric position of the Sun.
    pub sun: EclipticPosition,
    /// Nutation in longitude (deg).
    pub nutation_longitude: f64,
    /// True obliquity of the ecliptic (deg).
    pub true_obliquity: f64,
    /// Apparent right ascension and declination of the Moon.
    pub moon_equatorial: EquatorialPosition,
}

/// Wrap an angle in degrees into [0, 360).
pub fn normalize_degrees(angle: f64) -> f64 {
    let wrapped = angle.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360 for tiny negative inputs
    if wrapped >= 360.0 {
        0.0
    } else {
        wrapped
    }
}

// Table 47.A: multipliers of (D, M, M', F), Σl in 1e-6 deg, Σr in 1e-3 km.
#[rustfmt::skip]
static LONGITUDE_DISTANCE_TERMS: [(i8, i8, i8, i8, f64, f64); 60] = [
    (0,  0,  1,  0, 6_288_774.0, -20_905_355.0),
    (2,  0, -1,  0, 1_274_027.0,  -3_699_111.0),
    (2,  0,  0,  0,   658_314.0,  -2_955_968.0),
    (0,  0,  2,  0,   213_618.0,    -569_925.0),
    (0,  1,  0,  0,  -185_116.0,      48_888.0),
    (0,  0,  0,  2,  -114_332.0,      -3_149.0),
    (2,  0, -2,  0,    58_793.0,     246_158.0),
    (2, -1, -1,  0,    57_066.0,    -152_138.0),
    (2,  0,  1,  0,    53_322.0,    -170_733.0),
    (2, -1,  0,  0,    45_758.0,    -204_586.0),
    (0,  1, -1,  0,   -40_923.0,    -129_620.0),
    (1,  0,  0,  0,   -34_720.0,     108_743.0),
    (0,  1,  1,  0,   -30_383.0,     104_755.0),
    (2,  0,  0, -2,    15_327.0,      10_321.0),
    (0,  0,  1,  2,   -12_528.0,           0.0),
    (0,  0,  1, -2,    10_980.0,      79_661.0),
    (4,  0, -1,  0,    10_675.0,     -34_782.0),
    (0,  0,  3,  0,    10_034.0,     -23_210.0),
    (4,  0, -2,  0,     8_548.0,     -21_636.0),
    (2,  1, -1,  0,    -7_888.0,      24_208.0),
    (2,  1,  0,  0,    -6_766.0,      30_824.0),
    (1,  0, -1,  0,    -5_163.0,      -8_379.0),
    (1,  1,  0,  0,     4_987.0,     -16_675.0),
    (2, -1,  1,  0,     4_036.0,     -12_831.0),
    (2,  0,  2,  0,     3_994.0,     -10_445.0),
    (4,  0,  0,  0,     3_861.0,     -11_650.0),
    (2,  0, -3,  0,     3_665.0,      14_403.0),
    (0,  1, -2,  0,    -2_689.0,      -7_003.0),
    (2,  0, -1,  2,    -2_602.0,           0.0),
    (2, -1, -2,  0,     2_390.0,      10_056.0),
    (1,  0,  1,  0,    -2_348.0,       6_322.0),
    (2, -2,  0,  0,     2_236.0,      -9_884.0),
    (0,  1,  2,  0,    -2_120.0,       5_751.0),
    (0,  2,  0,  0,    -2_069.0,           0.0),
    (2, -2, -1,  0,     2_048.0,      -4_950.0),
    (2,  0,  1, -2,    -1_773.0,       4_130.0),
    (2,  0,  0,  2,    -1_595.0,           0.0),
    (4, -1, -1,  0,     1_215.0,      -3_958.0),
    (0,  0,  2,  2,    -1_110.0,           0.0),
    (3,  0, -1,  0,      -892.0,       3_258.0),
    (2,  1,  1,  0,      -810.0,       2_616.0),
    (4, -1, -2,  0,       759.0,      -1_897.0),
    (0,  2, -1,  0,      -713.0,      -2_117.0),
    (2,  2, -1,  0,      -700.0,       2_354.0),
    (2,  1, -2,  0,       691.0,           0.0),
    (2, -1,  0, -2,       596.0,           0.0),
    (4,  0,  1,  0,       549.0,      -1_423.0),
    (0,  0,  4,  0,       537.0,      -1_117.0),
    (4, -1,  0,  0,       520.0,      -1_571.0),
    (1,  0, -2,  0,      -487.0,      -1_739.0),
    (2,  1,  0, -2,      -399.0,           0.0),
    (0,  0,  2, -2,      -381.0,      -4_421.0),
    (1,  1,  1,  0,       351.0,           0.0),
    (3,  0, -2,  0,      -340.0,           0.0),
    (4,  0, -3,  0,       330.0,           0.0),
    (2, -1,  2,  0,       327.0,           0.0),
    (0,  2,  1,  0,      -323.0,       1_165.0),
    (1,  1, -1,  0,       299.0,           0.0),
    (2,  0,  3,  0,       294.0,           0.0),
    (2,  0, -1, -2,         0.0,       8_752.0),
];

// Table 47.B: multipliers of (D, M, M', F), Σb in 1e-6 deg.
#[rustfmt::skip]
static LATITUDE_TERMS: [(i8, i8, i8, i8, f64); 60] = [
    (0,  0,  0,  1, 5_128_122.0),
    (0,  0,  1,  1,   280_602.0),
    (0,  0,  1, -1,   277_693.0),
    (2,  0,  0, -1,   173_237.0),
    (2,  0, -1,  1,    55_413.0),
    (2,  0, -1, -1,    46_271.0),
    (2,  0,  0,  1,    32_573.0),
    (0,  0,  2,  1,    17_198.0),
    (2,  0,  1, -1,     9_266.0),
    (0,  0,  2, -1,     8_822.0),
    (2, -1,  0, -1,     8_216.0),
    (2,  0, -2, -1,     4_324.0),
    (2,  0,  1,  1,     4_200.0),
    (2,  1,  0, -1,    -3_359.0),
    (2, -1, -1,  1,     2_463.0),
    (2, -1,  0,  1,     2_211.0),
    (2, -1, -1, -1,     2_065.0),
    (0,  1, -1, -1,    -1_870.0),
    (4,  0, -1, -1,     1_828.0),
    (0,  1,  0,  1,    -1_794.0),
    (0,  0,  0,  3,    -1_749.0),
    (0,  1, -1,  1,    -1_565.0),
    (1,  0,  0,  1,    -1_491.0),
    (0,  1,  1,  1,    -1_475.0),
    (0,  1,  1, -1,    -1_410.0),
    (0,  1,  0, -1,    -1_344.0),
    (1,  0,  0, -1,    -1_335.0),
    (0,  0,  3,  1,     1_107.0),
    (4,  0,  0, -1,     1_021.0),
    (4,  0, -1,  1,       833.0),
    (0,  0,  1, -3,       777.0),
    (4,  0, -2,  1,       671.0),
    (2,  0,  0, -3,       607.0),
    (2,  0,  2, -1,       596.0),
    (2, -1,  1, -1,       491.0),
    (2,  0, -2,  1,      -451.0),
    (0,  0,  3, -1,       439.0),
    (2,  0,  2,  1,       422.0),
    (2,  0, -3, -1,       421.0),
    (2,  1, -1,  1,      -366.0),
    (2,  1,  0,  1,      -351.0),
    (4,  0,  0,  1,       331.0),
    (2, -1,  1,  1,       315.0),
    (2, -2,  0, -1,       302.0),
    (0,  0,  1,  3,      -283.0),
    (2,  1,  1, -1,      -229.0),
    (1,  1,  0, -1,       223.0),
    (1,  1,  0,  1,       223.0),
    (0,  1, -2, -1,      -220.0),
    (2,  1, -1, -1,      -220.0),
    (1,  0,  1,  1,      -185.0),
    (2, -1, -2, -1,       181.0),
    (0,  1,  2,  1,      -177.0),
    (4,  0, -2, -1,       176.0),
    (4, -1, -1, -1,       166.0),
    (1,  0,  1, -1,      -164.0),
    (4,  0,  1, -1,       132.0),
    (1,  0, -1, -1,      -119.0),
    (4, -1,  0, -1,       115.0),
    (2, -2,  0,  1,       107.0),
];

/// Mean lunar arguments in degrees (Meeus 47.1 – 47.6).
#[derive(Debug, Clone, Copy)]
struct MeanArguments {
    /// Moon's mean longitude L′.
    mean_longitude: f64,
    /// Mean elongation D.
    elongation: f64,
    /// Sun's mean anomaly M.
    sun_anomaly: f64,
    /// Moon's mean anomaly M′.
    moon_anomaly: f64,
    /// Argument of latitude F.
    argument_of_latitude: f64,
    /// Eccentricity correction E of Earth's orbit.
    eccentricity: f64,
}

impl MeanArguments {
    fn at(t: f64) -> Self {
        let poly = |c0: f64, c1: f64, c2: f64, c3: f64, c4: f64| {
            normalize_degrees(c0 + t * (c1 + t * (c2 + t * (c3 + t * c4))))
        };
        Self {
            mean_longitude: poly(
                218.316_447_7,
                481_267.881_234_21,
                -0.001_578_6,
                1.0 / 538_841.0,
                -1.0 / 65_194_000.0,
            ),
            elongation: poly(
                297.850_192_1,
                445_267.111_403_4,
                -0.001_881_9,
                1.0 / 545_868.0,
                -1.0 / 113_065_000.0,
            ),
            sun_anomaly: poly(357.529_109_2, 35_999.050_290_9, -0.000_153_6, 1.0 / 24_490_000.0, 0.0),
            moon_anomaly: poly(
                134.963_396_4,
                477_198.867_505_5,
                0.008_741_4,
                1.0 / 69_699.0,
                -1.0 / 14_712_000.0,
            ),
            argument_of_latitude: poly(
                93.272_095_0,
                483_202.017_523_3,
                -0.003_653_9,
                -1.0 / 3_526_000.0,
                1.0 / 863_310_000.0,
            ),
            eccentricity: 1.0 - t * (0.002_516 + 0.000_007_4 * t),
        }
    }

    /// Argument of a periodic term in radians.
    fn argument(&self, d: i8, m: i8, mp: i8, f: i8) -> f64 {
        (f64::from(d) * self.elongation
            + f64::from(m) * self.sun_anomaly
            + f64::from(mp) * self.moon_anomaly
            + f64::from(f) * self.argument_of_latitude)
            * DEG
    }

    /// Terms containing the Sun's mean anomaly shrink with Earth's eccentricity.
    fn eccentricity_factor(&self, m: i8) -> f64 {
        match m.abs() {
            1 => self.eccentricity,
            2 => self.eccentricity * self.eccentricity,
            _ => 1.0,
        }
    }
}

/// Geometric position of the Moon, mean equinox of date (no nutation).
pub fn moon_geometric(t: f64) -> EclipticPosition {
    let args = MeanArguments::at(t);

    let mut sum_l = 0.0;
    let mut sum_r = 0.0;
    for &(d, m, mp, f, coeff_l, coeff_r) in LONGITUDE_DISTANCE_TERMS.iter() {
        let arg = args.argument(d, m, mp, f);
        let e = args.eccentricity_factor(m);
        sum_l += coeff_l * e * arg.sin();
        sum_r += coeff_r * e * arg.cos();
    }

    let mut sum_b = 0.0;
    for &(d, m, mp, f, coeff_b) in LATITUDE_TERMS.iter() {
        sum_b += coeff_b * args.eccentricity_factor(m) * args.argument(d, m, mp, f).sin();
    }

    // Venus (A1), Jupiter (A2) and Earth flattening (L′) corrections
    let a1 = (119.75 + 131.849 * t) * DEG;
    let a2 = (53.09 + 479_264.290 * t) * DEG;
    let a3 = (313.45 + 481_266.484 * t) * DEG;
    let lp = args.mean_longitude * DEG;
    let f = args.argument_of_latitude * DEG;
    let mp = args.moon_anomaly * DEG;

    sum_l += 3958.0 * a1.sin() + 1962.0 * (lp - f).sin() + 318.0 * a2.sin();
    sum_b += -2235.0 * lp.sin()
        + 382.0 * a3.sin()
        + 175.0 * (a1 - f).sin()
        + 175.0 * (a1 + f).sin()
        + 127.0 * (lp - mp).sin()
        - 115.0 * (lp + mp).sin();

    EclipticPosition {
        longitude: normalize_degrees(args.mean_longitude + sum_l / 1_000_000.0),
        latitude: sum_b / 1_000_000.0,
        distance_km: 385_000.56 + sum_r / 1000.0,
    }
}

/// Apparent position of the Moon: geometric longitude plus nutation.
pub fn moon_apparent(t: f64, nutation: &Nutation) -> EclipticPosition {
    let geometric = moon_geometric(t);
    EclipticPosition {
        longitude: normalize_degrees(geometric.longitude + nutation.longitude),
        ..geometric
    }
}

/// Apparent position of the Sun (Meeus ch. 25, low accuracy).
///
/// Longitude includes nutation and annual aberration; latitude is taken as zero.
pub fn sun_apparent(t: f64, nutation: &Nutation) -> EclipticPosition {
    let l0 = 280.466_46 + t * (36_000.769_83 + t * 0.000_303_2);
    let m = normalize_degrees(357.529_11 + t * (35_999.050_29 - t * 0.000_153_7));
    let e = 0.016_708_634 - t * (0.000_042_037 + t * 0.000_000_126_7);

    let m_rad = m * DEG;
    let center = (1.914_602 - t * (0.004_817 + t * 0.000_014)) * m_rad.sin()
        + (0.019_993 - 0.000_101 * t) * (2.0 * m_rad).sin()
        + 0.000_289 * (3.0 * m_rad).sin();

    let true_longitude = l0 + center;
    let true_anomaly = (m + center) * DEG;
    let radius_au = 1.000_001_018 * (1.0 - e * e) / (1.0 + e * true_anomaly.cos());

    let aberration = -20.4898 / 3600.0 / radius_au;

    EclipticPosition {
        longitude: normalize_degrees(true_longitude + nutation.longitude + aberration),
        latitude: 0.0,
        distance_km: radius_au * AU_KM,
    }
}

/// Rotate ecliptic coordinates into the equator of date.
pub fn ecliptic_to_equatorial(position: &EclipticPosition, obliquity: f64) -> EquatorialPosition {
    let lon = position.longitude * DEG;
    let lat = position.latitude * DEG;
    let eps = obliquity * DEG;

    let ra = (lon.sin() * eps.cos() - lat.tan() * eps.sin()).atan2(lon.cos());
    let dec = (lat.sin() * eps.cos() + lat.cos() * eps.sin() * lon.sin())
        .clamp(-1.0, 1.0)
        .asin();

    EquatorialPosition {
        right_ascension: normalize_degrees(ra / DEG),
        declination: dec / DEG,
    }
}

/// Full geocentric solution for the Moon and Sun at `instant`.
pub fn position(instant: EphemerisInstant) -> LunarPosition {
    let t = instant.centuries_j2000();
    let nutation = nutation(t);
    let obliquity = true_obliquity(t, &nutation);
    let moon = moon_apparent(t, &nutation);

    LunarPosition {
        moon,
        sun: sun_apparent(t, &nutation),
        nutation_longitude: nutation.longitude,
        true_obliquity: obliquity,
        moon_equatorial: ecliptic_to_equatorial(&moon, obliquity),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn meeus_47a() -> EphemerisInstant {
        EphemerisInstant::from_terrestrial_time(
            NaiveDate::from_ymd_opt(1992, 4, 12)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap(),
        )
    }

    #[test]
    fn test_moon_geometric_meeus_47a() {
        let moon = moon_geometric(meeus_47a().centuries_j2000());
        // λ = 133.162655°, β = −3.229126°, Δ = 368409.7 km
        assert!((moon.longitude - 133.162_655).abs() < 1e-5, "λ = {}", moon.longitude);
        assert!((moon.latitude + 3.229_126).abs() < 1e-5, "β = {}", moon.latitude);
        assert!((moon.distance_km - 368_409.7).abs() < 0.1, "Δ = {}", moon.distance_km);
    }

    #[test]
    fn test_position_meeus_47a() {
        let pos = position(meeus_47a());
        assert!((pos.nutation_longitude - 0.004_610).abs() < 2e-5);
        assert!((pos.true_obliquity - 23.440_636).abs() < 2e-5);
        assert!(
            (pos.moon_equatorial.right_ascension - 134.688_470).abs() < 1e-4,
            "α = {}",
            pos.moon_equatorial.right_ascension
        );
        assert!(
            (pos.moon_equatorial.declination - 13.768_368).abs() < 1e-4,
            "δ = {}",
            pos.moon_equatorial.declination
        );
        assert!((pos.moon.distance_km - 368_409.68).abs() < 0.1);
    }

    #[test]
    fn test_sun_meeus_25a() {
        // 1992-10-13 0h TD: apparent λ = 199.90895° (low accuracy), R = 0.99766 AU
        let instant = EphemerisInstant::from_jde(2_448_908.5).unwrap();
        let t = instant.centuries_j2000();
        let sun = sun_apparent(t, &nutation(t));
        assert!((sun.longitude - 199.908_95).abs() < 0.003, "λ☉ = {}", sun.longitude);
        assert!((sun.distance_km / AU_KM - 0.997_66).abs() < 1e-4);
    }

    #[test]
    fn test_normalize_degrees() {
        assert_eq!(normalize_degrees(370.0), 10.0);
        assert_eq!(normalize_degrees(-90.0), 270.0);
        assert_eq!(normalize_degrees(-1e-18), 0.0);
        assert!((0.0..360.0).contains(&normalize_degrees(720.0)));
    }

    #[test]
    fn test_ecliptic_pole_and_equinox() {
        let equinox = EclipticPosition { longitude: 0.0, latitude: 0.0, distance_km: 1.0 };
        let eq = ecliptic_to_equatorial(&equinox, 23.44);
        assert!(eq.right_ascension.abs() < 1e-12 || (eq.right_ascension - 360.0).abs() < 1e-12);
        assert!(eq.declination.abs() < 1e-12);

        let solstice = EclipticPosition { longitude: 90.0, latitude: 0.0, distance_km: 1.0 };
        let eq = ecliptic_to_equatorial(&solstice, 23.44);
        assert!((eq.right_ascension - 90.0).abs() < 1e-9);
        assert!((eq.declination - 23.44).abs() < 1e-9);
    }

    #[test]
    fn test_distance_within_orbit_bounds() {
        for day in 0..60 {
            let instant = EphemerisInstant::from_jde(2_460_000.5 + f64::from(day)).unwrap();
            let pos = position(instant);
            assert!((356_000.0..407_000.0).contains(&pos.moon.distance_km));
            assert!(pos.moon.latitude.abs() < 5.4);
            assert!(pos.moon_equatorial.declination.abs() < 29.0);
        }
    }
}
