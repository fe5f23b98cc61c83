//! # Celestial coordinates
//!
//! Conversion of horizontal observations into right ascension and declination.
//!
//! ## Pipeline
//!
//! For an [`Observation`] (direction + [`crate::horizontal::ObservationContext`]):
//!
//! 1. remove the atmospheric refraction if the context carries an atmosphere,
//! 2. rotate the horizontal direction to the local equatorial frame (hour angle, declination),
//! 3. add the local apparent sidereal time `LAST = GMST(UT1) + Eq.eq.(TT) + λ` to reach the
//!    true equator and equinox of date ([`ApparentPlace`]),
//! 4. rotate to the equatorial mean J2000 frame with [`rotpn`],
//! 5. remove the annual and diurnal aberration,
//! 6. convert to `(α, δ)` ([`CelestialCoordinate`]).
//!
//! The J2000 mean equator and equinox is used as the realisation of the ICRS; the
//! 20 milliarcsecond frame bias between the two is neglected.
use std::fmt;

use log::debug;
use nalgebra::{Matrix3, Vector3};
use serde::{Deserialize, Serialize};

use crate::constants::{Degree, Radian, DPI};
use crate::earth_orientation::{earth_velocity, equequ};
use crate::horizontal::Observation;
use crate::mount_errors::MountError;
use crate::ref_system::{
    cartesian_to_radec, correct_aberration, radec_to_cartesian, rotmt, rotpn, RefEpoch, RefSystem,
};
use crate::time::{gmst, mjd_tt, mjd_ut1};

/// Right ascension and declination in the equatorial mean J2000 frame.
///
/// Angles are stored in radians: `ra ∈ [0, 2π)`, `dec ∈ [−π/2, π/2]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CelestialCoordinate {
    pub ra: Radian,
    pub dec: Radian,
}

impl CelestialCoordinate {
    /// Build a coordinate from angles in radians. The right ascension is wrapped to
    /// `[0, 2π)`.
    ///
    /// Errors
    /// ------
    /// * [`MountError::NonFiniteValue`] for NaN or infinite angles.
    /// * [`MountError::InvalidSimulationParameter`] if `|dec| > π/2`.
    pub fn new(ra: Radian, dec: Radian) -> Result<Self, MountError> {
        let ra = MountError::ensure_finite(ra, "right ascension")?;
        let dec = MountError::ensure_finite(dec, "declination")?;
        if dec.abs() > std::f64::consts::FRAC_PI_2 {
            return Err(MountError::InvalidSimulationParameter(format!(
                "declination must lie in [-90°, 90°], got {}°",
                dec.to_degrees()
            )));
        }
        Ok(CelestialCoordinate {
            ra: wrap_two_pi(ra),
            dec,
        })
    }

    /// Same as [`CelestialCoordinate::new`] with angles in degrees.
    pub fn from_degrees(ra: Degree, dec: Degree) -> Result<Self, MountError> {
        Self::new(ra.to_radians(), dec.to_radians())
    }

    /// Build from a Cartesian vector of the equatorial frame (any non-zero length).
    pub fn from_cartesian(vector: &Vector3<f64>) -> Self {
        let (ra, dec, _) = cartesian_to_radec(*vector);
        CelestialCoordinate { ra, dec }
    }

    pub fn ra_deg(&self) -> Degree {
        self.ra.to_degrees()
    }

    pub fn dec_deg(&self) -> Degree {
        self.dec.to_degrees()
    }

    /// Unit vector of the equatorial frame pointing to this coordinate.
    pub fn to_cartesian(&self) -> Vector3<f64> {
        radec_to_cartesian(self.ra, self.dec)
    }

    /// Great-circle distance to another coordinate, in radians.
    pub fn separation(&self, other: &CelestialCoordinate) -> Radian {
        let a = self.to_cartesian();
        let b = other.to_cartesian();
        a.cross(&b).norm().atan2(a.dot(&b))
    }
}

/// Sexagesimal rendering: `03h 21m 12.345s +41° 02′ 03.21″`.
impl fmt::Display for CelestialCoordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (h, m, s) = ra_to_hms(self.ra_deg());
        let (sign, d, am, asec) = dec_to_dms(self.dec_deg());
        write!(
            f,
            "{h:02}h {m:02}m {s:06.3}s {sign}{d:02}° {am:02}′ {asec:05.2}″"
        )
    }
}

/// Position of an observation on the true equator and equinox of date.
///
/// The hour angle is counted positive toward the west, in `(−π, π]`; the right ascension
/// of date in `[0, 2π)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ApparentPlace {
    pub hour_angle: Radian,
    pub declination: Radian,
    pub right_ascension: Radian,
}

/// Split a right ascension in degrees into hours, minutes and seconds of time, rounded to
/// the millisecond.
fn ra_to_hms(ra: Degree) -> (u32, u32, f64) {
    let millis = (ra.rem_euclid(360.0) / 15.0 * 3_600_000.0).round() as u64 % 86_400_000;
    let h = millis / 3_600_000;
    let m = (millis / 60_000) % 60;
    let s = (millis % 60_000) as f64 / 1000.0;
    (h as u32, m as u32, s)
}

/// Split a declination in degrees into sign, degrees, arcminutes and arcseconds, rounded
/// to the centi-arcsecond.
fn dec_to_dms(dec: Degree) -> (char, u32, u32, f64) {
    let sign = if dec < 0.0 { '-' } else { '+' };
    let centis = (dec.abs() * 360_000.0).round() as u64;
    let d = centis / 360_000;
    let m = (centis / 6_000) % 60;
    let s = (centis % 6_000) as f64 / 100.0;
    (sign, d as u32, m as u32, s)
}

fn wrap_two_pi(angle: Radian) -> Radian {
    let wrapped = angle.rem_euclid(DPI);
    // rem_euclid may round up to exactly 2π
    if wrapped >= DPI {
        0.0
    } else {
        wrapped
    }
}

/// Rotation from the horizontal frame (north, east, zenith) to the local equatorial frame
/// `(cos δ cos H, cos δ sin H, sin δ)`, for a site of geodetic latitude `lat`.
fn horizontal_to_hadec(lat: Radian) -> Matrix3<f64> {
    let (sl, cl) = lat.sin_cos();
    Matrix3::new(-sl, 0.0, cl, 0.0, -1.0, 0.0, cl, 0.0, sl)
}

/// Intermediate state of the conversion, shared by the apparent and J2000 outputs.
struct TrueOfDate {
    place: ApparentPlace,
    /// Unit vector on the true equator and equinox of date
    direction: Vector3<f64>,
    mjd_tt: f64,
    gast: Radian,
}

fn to_true_of_date(obs: &Observation) -> Result<TrueOfDate, MountError> {
    let ctx = &obs.context;

    let observed = obs.direction.to_cartesian();
    let topocentric = match &ctx.atmosphere {
        Some(atm) => atm.remove_refraction(&observed),
        None => observed,
    };

    let hadec = horizontal_to_hadec(ctx.location.latitude_rad()) * topocentric;

    let tut = mjd_ut1(&ctx.epoch, ctx.dut1)?;
    let tt = mjd_tt(&ctx.epoch);
    let gast = gmst(tut) + equequ(tt);
    let last = gast + ctx.location.longitude_rad();

    // H is counted westward: flip the y axis to get an angle counted like the RA, then
    // rotate by the local sidereal time.
    let flip = Matrix3::new(1.0, 0.0, 0.0, 0.0, -1.0, 0.0, 0.0, 0.0, 1.0);
    let direction = rotmt(last, 2) * flip * hadec;

    let (_, declination, _) = cartesian_to_radec(hadec);
    let hour_angle = hadec.y.atan2(hadec.x);
    let (right_ascension, _, _) = cartesian_to_radec(direction);

    debug!(
        "topocentric = {:?}, H = {:.9} rad, δ = {:.9} rad, LAST = {:.9} rad",
        topocentric.as_slice(),
        hour_angle,
        declination,
        wrap_two_pi(last)
    );

    Ok(TrueOfDate {
        place: ApparentPlace {
            hour_angle,
            declination,
            right_ascension,
        },
        direction,
        mjd_tt: tt,
        gast,
    })
}

/// Hour angle, declination and right ascension of an observation on the true equator and
/// equinox of date.
///
/// Refraction is removed first when the observation context carries an atmosphere.
///
/// Errors
/// ------
/// * [`MountError::InvalidSimulationParameter`] if the context ΔUT1 exceeds 0.9 s.
pub fn observation_to_apparent(obs: &Observation) -> Result<ApparentPlace, MountError> {
    Ok(to_true_of_date(obs)?.place)
}

/// Transform a horizontal observation into right ascension and declination in the
/// equatorial mean J2000 frame.
///
/// Arguments
/// ---------
/// * `obs`: the observed direction and its context (instant, ΔUT1, site, atmosphere).
///
/// Returns
/// --------
/// * the geometric (aberration-free) [`CelestialCoordinate`] of the direction.
///
/// Remarks
/// -------
/// * The observer velocity used for the aberration is the sum of the Earth orbital
///   velocity and the velocity of the site due to the Earth's rotation.
/// * Directions below the horizon are converted like any other one.
///
/// # See also
/// * [`observation_to_apparent`] – stops at the true equator and equinox of date
/// * [`rotpn`] – rotation between reference frames
/// * [`correct_aberration`] – first-order aberration correction
pub fn observation_to_celestial(obs: &Observation) -> Result<CelestialCoordinate, MountError> {
    Ok(observation_to_places(obs)?.1)
}

/// Both the apparent place of date and the J2000 coordinate of an observation.
pub(crate) fn observation_to_places(
    obs: &Observation,
) -> Result<(ApparentPlace, CelestialCoordinate), MountError> {
    let tod = to_true_of_date(obs)?;

    let rot = rotpn(
        &RefSystem::Equt(RefEpoch::Epoch(tod.mjd_tt)),
        &RefSystem::Equm(RefEpoch::J2000),
    );
    let apparent_j2000 = rot * tod.direction;

    let diurnal = rot * rotmt(tod.gast, 2) * obs.context.location.body_fixed_velocity();
    let observer_velocity = earth_velocity(tod.mjd_tt) + diurnal;

    let geometric = correct_aberration(apparent_j2000, observer_velocity).normalize();
    let coord = CelestialCoordinate::from_cartesian(&geometric);

    debug!(
        "apparent J2000 = {:?}, observer velocity = {:?} AU/d, result = {}",
        apparent_j2000.as_slice(),
        observer_velocity.as_slice(),
        coord
    );

    Ok((tod.place, coord))
}

#[cfg(test)]
mod celestial_test {
    use super::*;
    use crate::atmosphere::AtmosphereParameters;
    use crate::horizontal::{HorizontalDirection, ObservationContext};
    use crate::location::GeodeticLocation;
    use crate::time::parse_utc;
    use approx::assert_abs_diff_eq;

    const ARCSEC: f64 = std::f64::consts::PI / 648000.0;

    fn context(atmosphere: Option<AtmosphereParameters>) -> ObservationContext {
        ObservationContext::new(
            parse_utc("2000-01-01T00:00:00").unwrap(),
            GeodeticLocation::new(40.0, 0.0, 0.0).unwrap(),
            atmosphere,
        )
    }

    fn observe(ctx: &ObservationContext, alt: f64, az: f64) -> Observation {
        ctx.observe(HorizontalDirection::from_altaz(alt, az).unwrap())
    }

    #[test]
    fn test_coordinate_constructor() {
        let c = CelestialCoordinate::from_degrees(-30.0, 12.5).unwrap();
        assert_abs_diff_eq!(c.ra_deg(), 330.0, epsilon = 1e-12);
        assert_abs_diff_eq!(c.dec_deg(), 12.5, epsilon = 1e-12);

        assert!(CelestialCoordinate::from_degrees(0.0, 91.0).is_err());
        assert_eq!(
            CelestialCoordinate::new(f64::NAN, 0.0),
            Err(MountError::NonFiniteValue("right ascension"))
        );
    }

    #[test]
    fn test_display_sexagesimal() {
        let c = CelestialCoordinate::from_degrees(343.097375, -0.5039444444444444).unwrap();
        assert_eq!(format!("{c}"), "22h 52m 23.370s -00° 30′ 14.20″");

        // rounding carries into the next unit
        let c = CelestialCoordinate::from_degrees(359.99999999, 89.9999999).unwrap();
        assert_eq!(format!("{c}"), "00h 00m 00.000s +90° 00′ 00.00″");
    }

    #[test]
    fn test_separation() {
        let a = CelestialCoordinate::from_degrees(10.0, 0.0).unwrap();
        let b = CelestialCoordinate::from_degrees(40.0, 0.0).unwrap();
        assert_abs_diff_eq!(a.separation(&b).to_degrees(), 30.0, epsilon = 1e-12);

        let pole = CelestialCoordinate::from_degrees(0.0, 90.0).unwrap();
        assert_abs_diff_eq!(pole.separation(&b).to_degrees(), 90.0, epsilon = 1e-12);
    }

    #[test]
    fn test_pole_direction() {
        let ctx = context(None);
        let place = observe(&ctx, 40.0, 0.0).to_apparent().unwrap();
        assert_abs_diff_eq!(place.declination, std::f64::consts::FRAC_PI_2, epsilon = 1e-12);
    }

    #[test]
    fn test_meridian_and_east_point() {
        let ctx = context(None);

        // due south at 50° of altitude: on the meridian, on the equator
        let south = observe(&ctx, 50.0, 180.0).to_apparent().unwrap();
        assert_abs_diff_eq!(south.hour_angle, 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(south.declination, 0.0, epsilon = 1e-12);

        // the east point rises six hours before its transit
        let east = observe(&ctx, 0.0, 90.0).to_apparent().unwrap();
        assert_abs_diff_eq!(east.hour_angle, -std::f64::consts::FRAC_PI_2, epsilon = 1e-12);
        assert_abs_diff_eq!(east.declination, 0.0, epsilon = 1e-12);

        let ra_diff = (east.right_ascension - south.right_ascension).rem_euclid(DPI);
        assert_abs_diff_eq!(ra_diff, std::f64::consts::FRAC_PI_2, epsilon = 1e-12);
    }

    #[test]
    fn test_meridian_ra_is_sidereal_time() {
        let ctx = context(None);
        let south = observe(&ctx, 50.0, 180.0).to_apparent().unwrap();

        let tut = mjd_ut1(&ctx.epoch, 0.0).unwrap();
        let last = (gmst(tut) + equequ(mjd_tt(&ctx.epoch))).rem_euclid(DPI);
        assert_abs_diff_eq!(south.right_ascension, last, epsilon = 1e-12);

        // 2000-01-01T00:00 UT1: GMST ≈ 6h 39m 52s
        assert_abs_diff_eq!(last.to_degrees() / 15.0, 6.6645, epsilon = 1e-3);
    }

    #[test]
    fn test_j2000_close_to_true_of_date() {
        // Eight hours before J2000.0: nutation (≈ 17″) and aberration (≤ 20.5″) only
        let ctx = context(None);
        for (alt, az) in [(20.0, 70.0), (60.0, 200.0), (35.0, 310.0)] {
            let obs = observe(&ctx, alt, az);
            let place = obs.to_apparent().unwrap();
            let of_date = CelestialCoordinate::new(place.right_ascension, place.declination)
                .unwrap();
            let j2000 = obs.to_celestial().unwrap();

            let sep = of_date.separation(&j2000) / ARCSEC;
            assert!(sep > 0.5 && sep < 45.0, "separation {sep}″");
        }
    }

    #[test]
    fn test_dut1_shifts_right_ascension() {
        let ctx = context(None);
        let base = observe(&ctx, 30.0, 100.0).to_apparent().unwrap();
        let shifted = observe(&ctx.with_dut1(0.5), 30.0, 100.0)
            .to_apparent()
            .unwrap();

        let diff = (shifted.right_ascension - base.right_ascension) / ARCSEC;
        assert_abs_diff_eq!(diff, 0.5 * 15.0 * 1.00273790934, epsilon = 1e-3);
        assert_eq!(base.hour_angle, shifted.hour_angle);

        assert!(observe(&ctx.with_dut1(2.0), 30.0, 100.0)
            .to_celestial()
            .is_err());
    }

    #[test]
    fn test_refraction_raises_object() {
        let atm = AtmosphereParameters::new(7.0, 1005.0, 0.8, 0.574).unwrap();

        let without = observe(&context(None), 20.0, 70.0).to_celestial().unwrap();
        let with = observe(&context(Some(atm)), 20.0, 70.0)
            .to_celestial()
            .unwrap();

        // ≈ 2.7′ of refraction at 20° of altitude
        let sep = with.separation(&without) / ARCSEC;
        assert!(sep > 120.0 && sep < 200.0, "separation {sep}″");

        let zenith_without = observe(&context(None), 90.0, 0.0).to_celestial().unwrap();
        let zenith_with = observe(&context(Some(atm)), 90.0, 0.0)
            .to_celestial()
            .unwrap();
        assert!(zenith_with.separation(&zenith_without) < 1e-9);
    }
}
