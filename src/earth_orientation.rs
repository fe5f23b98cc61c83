//! # Earth orientation
//!
//! Time-dependent orientation of the Earth's equator and equinox with respect to the
//! equatorial mean J2000 frame, plus the Earth's orbital velocity used for aberration.
//!
//! All matrices returned here act on **column vectors** and map coordinates expressed in
//! the source frame to coordinates expressed in the target frame (`x₂ = M · x₁`).
//!
//! | Function       | Model                     | Maps                                |
//! |----------------|---------------------------|-------------------------------------|
//! | [`prec`]       | IAU 1976 precession       | mean J2000 → mean of date           |
//! | [`rnut80`]     | IAU 1980 nutation         | mean of date → true of date         |
//! | [`obleq`]      | IAU 1976 mean obliquity   | -                                   |
//! | [`equequ`]     | equation of the equinoxes | GMST → GAST correction              |
//! | [`earth_velocity`] | circular-orbit model  | Earth velocity in mean J2000 (AU/d) |
use nalgebra::{Matrix3, Vector3};

use crate::constants::{ArcSec, Radian, DPI, RADEG, RADSEC, VLIGHT_AU};
use crate::ref_system::rotmt;
use crate::time::centuries_since_j2000;

/// Compute the mean obliquity of the ecliptic at a given epoch (IAU 1976 model).
///
/// Arguments
/// ---------
/// * `tjm`: Modified Julian Date (TT scale).
///
/// Returns
/// --------
/// * Mean obliquity of the ecliptic in radians.
///
/// Formula
/// -------
/// ```text
/// ε(T) = 84381.448″ − 46.815″·T − 0.00059″·T² + 0.001813″·T³
/// ```
/// with `T` in Julian centuries since J2000, evaluated with Horner's scheme.
pub fn obleq(tjm: f64) -> Radian {
    let ob0 = ((23.0 * 3600.0 + 26.0 * 60.0) + 21.448) * RADSEC;
    let ob1 = -46.815 * RADSEC;
    let ob2 = -0.0006 * RADSEC;
    let ob3 = 0.00181 * RADSEC;

    let t = centuries_since_j2000(tjm);

    ((ob3 * t + ob2) * t + ob1) * t + ob0
}

/// One periodic term of the IAU 1980 nutation series.
///
/// The argument is `D·d + M·m + M'·m' + F·f + Ω·n` (multipliers of the mean elongation of
/// the Moon, mean anomaly of the Sun, mean anomaly of the Moon, argument of latitude of
/// the Moon, longitude of the lunar ascending node). Amplitudes are in units of 0.0001″.
struct NutationTerm {
    multipliers: [f64; 5],
    psi: (f64, f64),
    eps: (f64, f64),
}

const fn term(multipliers: [f64; 5], psi: (f64, f64), eps: (f64, f64)) -> NutationTerm {
    NutationTerm {
        multipliers,
        psi,
        eps,
    }
}

/// Leading terms of the IAU 1980 series, sorted by decreasing amplitude in Δψ.
///
/// Truncating after these terms keeps both angles within a few hundredths of an arcsecond
/// of the full 106-term theory, far below the refraction and aberration effects that the
/// frame conversion deals with.
const NUTATION_SERIES: [NutationTerm; 25] = [
    term([0., 0., 0., 0., 1.], (-171996.0, -174.2), (92025.0, 8.9)),
    term([-2., 0., 0., 2., 2.], (-13187.0, -1.6), (5736.0, -3.1)),
    term([0., 0., 0., 2., 2.], (-2274.0, -0.2), (977.0, -0.5)),
    term([0., 0., 0., 0., 2.], (2062.0, 0.2), (-895.0, 0.5)),
    term([0., 1., 0., 0., 0.], (1426.0, -3.4), (54.0, -0.1)),
    term([0., 0., 1., 0., 0.], (712.0, 0.1), (-7.0, 0.0)),
    term([-2., 1., 0., 2., 2.], (-517.0, 1.2), (224.0, -0.6)),
    term([0., 0., 0., 2., 1.], (-386.0, -0.4), (200.0, 0.0)),
    term([0., 0., 1., 2., 2.], (-301.0, 0.0), (129.0, -0.1)),
    term([-2., -1., 0., 2., 2.], (217.0, -0.5), (-95.0, 0.3)),
    term([-2., 0., 1., 0., 0.], (-158.0, 0.0), (0.0, 0.0)),
    term([-2., 0., 0., 2., 1.], (129.0, 0.1), (-70.0, 0.0)),
    term([0., 0., -1., 2., 2.], (123.0, 0.0), (-53.0, 0.0)),
    term([2., 0., 0., 0., 0.], (63.0, 0.0), (0.0, 0.0)),
    term([0., 0., 1., 0., 1.], (63.0, 0.1), (-33.0, 0.0)),
    term([2., 0., -1., 2., 2.], (-59.0, 0.0), (26.0, 0.0)),
    term([0., 0., -1., 0., 1.], (-58.0, -0.1), (32.0, 0.0)),
    term([0., 0., 1., 2., 1.], (-51.0, 0.0), (27.0, 0.0)),
    term([-2., 0., 2., 0., 0.], (48.0, 0.0), (0.0, 0.0)),
    term([0., 0., -2., 2., 1.], (46.0, 0.0), (-24.0, 0.0)),
    term([2., 0., 0., 2., 2.], (-38.0, 0.0), (16.0, 0.0)),
    term([0., 0., 2., 2., 2.], (-31.0, 0.0), (13.0, 0.0)),
    term([0., 0., 2., 0., 0.], (29.0, 0.0), (0.0, 0.0)),
    term([-2., 0., 1., 2., 2.], (29.0, 0.0), (-12.0, 0.0)),
    term([0., 0., 0., 2., 0.], (26.0, 0.0), (0.0, 0.0)),
];

/// Fundamental lunar and solar arguments `[D, M, M', F, Ω]` in radians (IAU 1980).
fn fundamental_arguments(t: f64) -> [f64; 5] {
    let poly = |c0: f64, c1: f64, c2: f64, c3: f64| -> f64 {
        ((((c3 * t + c2) * t + c1) * t + c0) * RADSEC) % DPI
    };

    [
        poly(1072261.307, 1602961601.328, -6.891, 0.019),
        poly(1287099.804, 129596581.224, -0.577, -0.012),
        poly(485866.733, 1717915922.633, 31.310, 0.064),
        poly(335778.877, 1739527263.137, -13.257, 0.011),
        poly(450160.280, -6962890.539, 7.455, 0.008),
    ]
}

/// Compute the nutation angles in longitude and obliquity (IAU 1980 / Wahr theory).
///
/// Arguments
/// ---------
/// * `tjm`: Modified Julian Date (TT scale).
///
/// Returns
/// --------
/// * `(Δψ, Δε)` in **arcseconds**.
pub fn nutn80(tjm: f64) -> (ArcSec, ArcSec) {
    let t = centuries_since_j2000(tjm);
    let args = fundamental_arguments(t);

    let (dpsi, deps) = NUTATION_SERIES.iter().fold((0.0, 0.0), |(dpsi, deps), term| {
        let arg: f64 = term
            .multipliers
            .iter()
            .zip(args.iter())
            .map(|(k, a)| k * a)
            .sum();
        (
            dpsi + (term.psi.0 + term.psi.1 * t) * arg.sin(),
            deps + (term.eps.0 + term.eps.1 * t) * arg.cos(),
        )
    });

    (dpsi * 1e-4, deps * 1e-4)
}

/// Nutation matrix, mean equator and equinox of date → true equator and equinox of date.
///
/// Built as `R₁(ε + Δε) · R₃(Δψ) · R₁(−ε)`: go to the mean ecliptic of date, shift the
/// longitude by Δψ, come back on the true equator.
pub fn rnut80(tjm: f64) -> Matrix3<f64> {
    let epsm = obleq(tjm);
    let (dpsi, deps) = nutn80(tjm);
    let epst = epsm + deps * RADSEC;

    rotmt(epst, 0) * rotmt(dpsi * RADSEC, 2) * rotmt(-epsm, 0)
}

/// Equation of the equinoxes `Δψ·cos ε` in radians (GAST − GMST).
pub fn equequ(tjm: f64) -> Radian {
    let (dpsi, _deps) = nutn80(tjm);
    RADSEC * dpsi * obleq(tjm).cos()
}

/// Precession matrix, mean equator and equinox of J2000 → mean equator and equinox of date
/// (IAU 1976, Lieske angles ζ, z, θ).
///
/// ```text
/// ζ(T) = (0.6406161 + 0.0000839·T + 0.0000050·T²) · T  [deg]
/// z(T) = (0.6406161 + 0.0003041·T + 0.0000051·T²) · T  [deg]
/// θ(T) = (0.5567530 − 0.0001185·T − 0.0000116·T²) · T  [deg]
/// P    = R₃(z) · R₂(−θ) · R₃(ζ)
/// ```
pub fn prec(tjm: f64) -> Matrix3<f64> {
    let t = centuries_since_j2000(tjm);

    let zeta = ((0.0000050 * t + 0.0000839) * t + 0.6406161) * t * RADEG;
    let z = ((0.0000051 * t + 0.0003041) * t + 0.6406161) * t * RADEG;
    let theta = ((-0.0000116 * t - 0.0001185) * t + 0.5567530) * t * RADEG;

    rotmt(z, 2) * rotmt(-theta, 1) * rotmt(zeta, 2)
}

/// Heliocentric velocity of the Earth in the equatorial mean J2000 frame, in AU/day.
///
/// Uses the low-precision circular-orbit model of the annual aberration vector
/// (Montenbruck & Pfleger, *Astronomy on the Personal Computer*), whose components are
/// `v/c`; they are rescaled by the speed of light in AU/day. The model is good to about
/// 1 % of the velocity, i.e. a fraction of an arcsecond on the aberration offset.
pub fn earth_velocity(tjm: f64) -> Vector3<f64> {
    let t = centuries_since_j2000(tjm);
    let l = DPI * (0.27908 + 100.00214 * t).rem_euclid(1.0);
    let (sl, cl) = l.sin_cos();

    Vector3::new(-0.994e-4 * sl, 0.912e-4 * cl, 0.395e-4 * cl) * VLIGHT_AU
}
