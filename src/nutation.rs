//! Nutation and obliquity of the ecliptic.
//!
//! Nutation uses the truncated IAU 2000B lunisolar series (77 terms) over the
//! five Delaunay arguments, good to about a milliarcsecond, which is far below
//! what the low-precision lunar series needs. Mean obliquity follows the
//! IAU 1980 polynomial (Meeus 22.2).

use std::f64::consts::TAU;

/// Arcseconds to radians.
const ARCSEC_TO_RAD: f64 = TAU / 1_296_000.0;

/// Nutation in longitude (Δψ) and in obliquity (Δε), both in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Nutation {
    pub longitude: f64,
    pub obliquity: f64,
}

/// Delaunay arguments `[l, l', F, D, Ω]` in radians for `t` Julian centuries (TT).
///
/// - `l`  mean anomaly of the Moon
/// - `l'` mean anomaly of the Sun
/// - `F`  mean argument of latitude of the Moon
/// - `D`  mean elongation of the Moon from the Sun
/// - `Ω`  mean longitude of the Moon's ascending node
pub fn delaunay_arguments(t: f64) -> [f64; 5] {
    let poly = |c: [f64; 5]| (c[0] + t * (c[1] + t * (c[2] + t * (c[3] + t * c[4])))) * ARCSEC_TO_RAD;
    [
        poly([485_868.249036, 1_717_915_923.2178, 31.8792, 0.051635, -0.000_244_70]),
        poly([1_287_104.79305, 129_596_581.0481, -0.5532, 0.000136, -0.000_011_49]),
        poly([335_779.526232, 1_739_527_262.8478, -12.7512, -0.001037, 0.000_004_17]),
        poly([1_072_260.70369, 1_602_961_601.2090, -6.3706, 0.006593, -0.000_031_69]),
        poly([450_160.398036, -6_962_890.5431, 7.4722, 0.007702, -0.000_059_39]),
    ]
}

/// IAU 2000B lunisolar terms: multipliers of `[l, l', F, D, Ω]`, then
/// `S, S'` for Δψ and `C, C'` for Δε, in arcseconds (`S + S'·T`).
#[rustfmt::skip]
static NUTATION_TERMS: [([i8; 5], f64, f64, f64, f64); 77] = [
    ([  0,   0,   0,   0,   1],   -17.2064161, -0.0174666,    9.2052331,  0.0009086),
    ([  0,   0,   2,  -2,   2],    -1.3170906, -0.0001675,    0.5730336, -0.0003015),
    ([  0,   0,   2,   0,   2],    -0.2276413, -0.0000234,    0.0978459, -0.0000485),
    ([  0,   0,   0,   0,   2],     0.2074554,  0.0000207,   -0.0897492,  0.0000470),
    ([  0,   1,   0,   0,   0],     0.1475877, -0.0003633,    0.0073871, -0.0000184),
    ([  0,   1,   2,  -2,   2],    -0.0516821,  0.0001226,    0.0224386, -0.0000677),
    ([  1,   0,   0,   0,   0],     0.0711159,  0.0000073,   -0.0006750,  0.0000000),
    ([  0,   0,   2,   0,   1],    -0.0387298, -0.0000367,    0.0200728,  0.0000018),
    ([  1,   0,   2,   0,   2],    -0.0301461, -0.0000036,    0.0129025, -0.0000063),
    ([  0,  -1,   2,  -2,   2],     0.0215829, -0.0000494,   -0.0095929,  0.0000299),
    ([  0,   0,   2,  -2,   1],     0.0128227,  0.0000137,   -0.0068982, -0.0000009),
    ([ -1,   0,   2,   0,   2],     0.0123457,  0.0000011,   -0.0053311,  0.0000032),
    ([ -1,   0,   0,   2,   0],     0.0156994,  0.0000010,   -0.0001235,  0.0000000),
    ([  1,   0,   0,   0,   1],     0.0063110,  0.0000063,   -0.0033228,  0.0000000),
    ([ -1,   0,   0,   0,   1],    -0.0057976, -0.0000063,    0.0031429,  0.0000000),
    ([ -1,   0,   2,   2,   2],    -0.0059641, -0.0000011,    0.0025543, -0.0000011),
    ([  1,   0,   2,   0,   1],    -0.0051613, -0.0000042,    0.0026366,  0.0000000),
    ([ -2,   0,   2,   0,   1],     0.0045893,  0.0000050,   -0.0024236, -0.0000010),
    ([  0,   0,   0,   2,   0],     0.0063384,  0.0000011,   -0.0001220,  0.0000000),
    ([  0,   0,   2,   2,   2],    -0.0038571, -0.0000001,    0.0016452, -0.0000011),
    ([  0,  -2,   2,  -2,   2],     0.0032481,  0.0000000,   -0.0013870,  0.0000000),
    ([ -2,   0,   0,   2,   0],    -0.0047722,  0.0000000,    0.0000477,  0.0000000),
    ([  2,   0,   2,   0,   2],    -0.0031046, -0.0000001,    0.0013238, -0.0000011),
    ([  1,   0,   2,  -2,   2],     0.0028593,  0.0000000,   -0.0012338,  0.0000010),
    ([ -1,   0,   2,   0,   1],     0.0020441,  0.0000021,   -0.0010758,  0.0000000),
    ([  2,   0,   0,   0,   0],     0.0029243,  0.0000000,   -0.0000609,  0.0000000),
    ([  0,   0,   2,   0,   0],     0.0025887,  0.0000000,   -0.0000550,  0.0000000),
    ([  0,   1,   0,   0,   1],    -0.0014053, -0.0000025,    0.0008551, -0.0000002),
    ([ -1,   0,   0,   2,   1],     0.0015164,  0.0000010,   -0.0008001,  0.0000000),
    ([  0,   2,   2,  -2,   2],    -0.0015794,  0.0000072,    0.0006850, -0.0000042),
    ([  0,   0,  -2,   2,   0],     0.0021783,  0.0000000,   -0.0000167,  0.0000000),
    ([  1,   0,   0,  -2,   1],    -0.0012873, -0.0000010,    0.0006953,  0.0000000),
    ([  0,  -1,   0,   0,   1],    -0.0012654,  0.0000011,    0.0006415,  0.0000000),
    ([ -1,   0,   2,   2,   1],    -0.0010204,  0.0000000,    0.0005222,  0.0000000),
    ([  0,   2,   0,   0,   0],     0.0016707, -0.0000085,    0.0000168, -0.0000001),
    ([  1,   0,   2,   2,   2],    -0.0007691,  0.0000000,    0.0003268,  0.0000000),
    ([ -2,   0,   2,   0,   0],    -0.0011024,  0.0000000,    0.0000104,  0.0000000),
    ([  0,   1,   2,   0,   2],     0.0007566, -0.0000021,   -0.0003250,  0.0000000),
    ([  0,   0,   2,   2,   1],    -0.0006637, -0.0000011,    0.0003353,  0.0000000),
    ([  0,  -1,   2,   0,   2],    -0.0007141,  0.0000021,    0.0003070,  0.0000000),
    ([  0,   0,   0,   2,   1],    -0.0006302, -0.0000011,    0.0003272,  0.0000000),
    ([  1,   0,   2,  -2,   1],     0.0005800,  0.0000010,   -0.0003045,  0.0000000),
    ([  2,   0,   2,  -2,   2],     0.0006443,  0.0000000,   -0.0002768,  0.0000000),
    ([ -2,   0,   0,   2,   1],    -0.0005774, -0.0000011,    0.0003041,  0.0000000),
    ([  2,   0,   2,   0,   1],    -0.0005350,  0.0000000,    0.0002695,  0.0000000),
    ([  0,  -1,   2,  -2,   1],    -0.0004752, -0.0000011,    0.0002719,  0.0000000),
    ([  0,   0,   0,  -2,   1],    -0.0004940, -0.0000011,    0.0002720,  0.0000000),
    ([ -1,  -1,   0,   2,   0],     0.0007350,  0.0000000,   -0.0000051,  0.0000000),
    ([  2,   0,   0,  -2,   1],    -0.0004803, -0.0000011,    0.0002556,  0.0000000),
    ([  1,   0,   0,   2,   0],    -0.0007677,  0.0000000,    0.0000462,  0.0000000),
    ([  0,   1,   2,  -2,   1],     0.0005417,  0.0000000,   -0.0002520,  0.0000000),
    ([  1,  -1,   0,   0,   0],     0.0006624,  0.0000000,   -0.0000468,  0.0000000),
    ([ -2,   0,   2,   0,   2],    -0.0005433,  0.0000000,    0.0002334,  0.0000000),
    ([  3,   0,   2,   0,   2],    -0.0004632,  0.0000000,    0.0001991,  0.0000000),
    ([  0,  -1,   0,   2,   0],     0.0006106,  0.0000000,   -0.0000167,  0.0000000),
    ([  1,  -1,   2,   0,   2],    -0.0003593,  0.0000000,    0.0001556,  0.0000000),
    ([  0,   0,   0,   1,   0],    -0.0004766,  0.0000000,    0.0000270,  0.0000000),
    ([ -1,  -1,   2,   2,   2],    -0.0004095,  0.0000000,    0.0001793,  0.0000000),
    ([ -1,   0,   2,   0,   0],     0.0004229,  0.0000000,   -0.0000101,  0.0000000),
    ([  0,  -1,   2,   2,   2],    -0.0003372,  0.0000000,    0.0001487,  0.0000000),
    ([  2,   0,   0,   0,   1],    -0.0003353,  0.0000000,    0.0001758,  0.0000000),
    ([  1,   0,   2,   0,   0],    -0.0003523,  0.0000000,    0.0000246,  0.0000000),
    ([  1,   1,   0,   0,   0],    -0.0003613,  0.0000000,    0.0000329,  0.0000000),
    ([ -1,   0,   2,  -2,   1],     0.0003522,  0.0000000,   -0.0001830,  0.0000000),
    ([  2,   0,   0,   0,  -1],     0.0003312,  0.0000000,   -0.0001730,  0.0000000),
    ([  0,   0,  -2,   2,   1],    -0.0003142,  0.0000000,    0.0001704,  0.0000000),
    ([  0,   1,   0,   0,  -1],    -0.0002927,  0.0000000,    0.0001564,  0.0000000),
    ([  0,   1,   2,   0,   1],    -0.0002887,  0.0000000,    0.0001401,  0.0000000),
    ([  0,  -1,   2,   0,   1],     0.0002451,  0.0000000,   -0.0001200,  0.0000000),
    ([  2,   0,  -2,   0,   0],    -0.0002790,  0.0000000,    0.0000410,  0.0000000),
    ([ -1,   0,   0,   2,  -1],     0.0002145,  0.0000000,   -0.0001154,  0.0000000),
    ([  0,   0,   2,  -2,   0],     0.0002816,  0.0000000,    0.0000286,  0.0000000),
    ([  0,   1,   0,  -2,   0],     0.0002700,  0.0000000,   -0.0000258,  0.0000000),
    ([  1,   0,   0,  -1,   0],    -0.0002330,  0.0000000,   -0.0000037,  0.0000000),
    ([  0,   0,   0,   0,   2],     0.0002283,  0.0000000,   -0.0001039,  0.0000000),
    ([  1,   0,  -2,   0,   0],    -0.0002321,  0.0000000,    0.0000284,  0.0000000),
    ([ -1,   0,   0,   1,   1],    -0.0002049,  0.0000000,    0.0001112,  0.0000000),
];

/// Nutation for `t` Julian centuries of TT since J2000.0.
pub fn nutation(t: f64) -> Nutation {
    let args = delaunay_arguments(t);
    let (mut dpsi, mut deps) = (0.0_f64, 0.0_f64);

    for (mult, s, s_t, c, c_t) in NUTATION_TERMS.iter() {
        let arg: f64 = mult
            .iter()
            .zip(args.iter())
            .map(|(&n, &a)| f64::from(n) * a)
            .sum();
        dpsi += (s + s_t * t) * arg.sin();
        deps += (c + c_t * t) * arg.cos();
    }

    // fixed offsets standing in for the planetary terms dropped by 2000B
    let dpsi = dpsi - 0.000_135;
    let deps = deps + 0.000_388;

    Nutation {
        longitude: dpsi / 3600.0,
        obliquity: deps / 3600.0,
    }
}

/// Mean obliquity of the ecliptic in degrees.
pub fn mean_obliquity(t: f64) -> f64 {
    let arcsec = 84_381.448 + t * (-46.8150 + t * (-0.000_59 + t * 0.001_813));
    arcsec / 3600.0
}

/// True obliquity (mean obliquity plus nutation in obliquity) in degrees.
pub fn true_obliquity(t: f64, nutation: &Nutation) -> f64 {
    mean_obliquity(t) + nutation.obliquity
}
