//! # Observing site
//!
//! Geodetic description of the place where the mount stands, and the derived quantities
//! needed by the frame conversion: geocentric parallax constants `(ρ·cosφ', ρ·sinφ')`,
//! the body-fixed position of the site and its velocity due to the Earth's rotation.
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::constants::{
    Degree, Meter, Radian, DPI, EARTH_MAJOR_AXIS, EARTH_MINOR_AXIS, ERAU, SIDEREAL_RATE,
};
use crate::mount_errors::MountError;

/// Geodetic position of an observing site on the GRS80/WGS84 ellipsoid.
///
/// Deserialization goes through [`GeodeticLocation::new`], so invalid sites are rejected.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawLocation")]
pub struct GeodeticLocation {
    latitude: Degree,
    longitude: Degree,
    height: Meter,
}

#[derive(Deserialize)]
struct RawLocation {
    latitude: Degree,
    longitude: Degree,
    height: Meter,
}

impl TryFrom<RawLocation> for GeodeticLocation {
    type Error = MountError;

    fn try_from(raw: RawLocation) -> Result<Self, Self::Error> {
        GeodeticLocation::new(raw.latitude, raw.longitude, raw.height)
    }
}

impl GeodeticLocation {
    /// Create a new site from geodetic coordinates.
    ///
    /// Arguments
    /// -----------------
    /// * `latitude`: geodetic latitude in **degrees**, in `[-90, 90]`.
    /// * `longitude`: longitude in **degrees**, east positive. Any finite value is accepted.
    /// * `height`: height above the reference ellipsoid in **meters**.
    ///
    /// Errors
    /// ----------
    /// * [`MountError::InvalidLatitude`] if the latitude is outside `[-90, 90]` or NaN.
    /// * [`MountError::NonFiniteValue`] for non-finite longitude or height.
    pub fn new(latitude: Degree, longitude: Degree, height: Meter) -> Result<Self, MountError> {
        if !(-90.0..=90.0).contains(&latitude) {
            return Err(MountError::InvalidLatitude(latitude));
        }
        Ok(GeodeticLocation {
            latitude,
            longitude: MountError::ensure_finite(longitude, "longitude")?,
            height: MountError::ensure_finite(height, "height")?,
        })
    }

    pub fn latitude(&self) -> Degree {
        self.latitude
    }

    pub fn longitude(&self) -> Degree {
        self.longitude
    }

    pub fn height(&self) -> Meter {
        self.height
    }

    pub fn latitude_rad(&self) -> Radian {
        self.latitude.to_radians()
    }

    pub fn longitude_rad(&self) -> Radian {
        self.longitude.to_radians()
    }

    /// Geocentric parallax constants `(ρ·cosφ', ρ·sinφ')` in Earth equatorial radii.
    pub fn parallax(&self) -> (f64, f64) {
        geodetic_to_parallax(self.latitude, self.height)
    }

    /// Get the fixed position of the site in the terrestrial frame.
    ///
    /// Return
    /// ------
    /// * site coordinates in the Earth-fixed frame (not corrected from Earth motion)
    /// * units is AU
    pub fn body_fixed_coord(&self) -> Vector3<f64> {
        let (rho_cos_phi, rho_sin_phi) = self.parallax();
        let lon_radians = self.longitude_rad();

        Vector3::new(
            ERAU * rho_cos_phi * lon_radians.cos(),
            ERAU * rho_cos_phi * lon_radians.sin(),
            ERAU * rho_sin_phi,
        )
    }

    /// Velocity of the site in the Earth-fixed axes due to the Earth's rotation,
    /// `v = ω × r` with `ω = (0, 0, 2π·1.00273790934)` rad/day, in **AU/day**.
    pub fn body_fixed_velocity(&self) -> Vector3<f64> {
        let omega = Vector3::new(0.0, 0.0, DPI * SIDEREAL_RATE);
        omega.cross(&self.body_fixed_coord())
    }
}

/// Convert geodetic latitude (in radians) and height (in meters)
/// into normalized parallax coordinates.
///
/// Returns
/// -------
/// A tuple `(rho_cos_phi, rho_sin_phi)` expressed in Earth equatorial radii.
///
/// Formula
/// -------
/// ```text
/// u = atan( (sin φ * (b/a)) / cos φ )
/// ρ_sinφ = (b/a) * sin u + (h/a) * sin φ
/// ρ_cosφ = cos u + (h/a) * cos φ
/// ```
///
/// where `a` and `b` are the Earth's semi-major and semi-minor axes,
/// and `h` is the height above the ellipsoid.
pub fn lat_alt_to_parallax(lat: Radian, height: Meter) -> (f64, f64) {
    let axis_ratio = EARTH_MINOR_AXIS / EARTH_MAJOR_AXIS;

    // parametric latitude
    let u = (lat.sin() * axis_ratio).atan2(lat.cos());

    let rho_sin_phi = axis_ratio * u.sin() + (height / EARTH_MAJOR_AXIS) * lat.sin();
    let rho_cos_phi = u.cos() + (height / EARTH_MAJOR_AXIS) * lat.cos();

    (rho_cos_phi, rho_sin_phi)
}

/// Same as [`lat_alt_to_parallax`] with the latitude given in **degrees**.
pub fn geodetic_to_parallax(lat: Degree, height: Meter) -> (f64, f64) {
    lat_alt_to_parallax(lat.to_radians(), height)
}

#[cfg(test)]
mod location_test {
    use super::*;

    #[test]
    fn test_deserialize_is_validated() {
        let site: GeodeticLocation =
            serde_json::from_str(r#"{"latitude": 40.0, "longitude": -3.5, "height": 650.0}"#)
                .unwrap();
        assert_eq!(site, GeodeticLocation::new(40.0, -3.5, 650.0).unwrap());

        assert!(serde_json::from_str::<GeodeticLocation>(
            r#"{"latitude": 120.0, "longitude": 0.0, "height": 0.0}"#
        )
        .is_err());
    }
    use approx::assert_relative_eq;

    #[test]
    fn test_location_constructor() {
        let site = GeodeticLocation::new(40.0, -3.5, 650.0).unwrap();
        assert_eq!(site.latitude(), 40.0);
        assert_eq!(site.longitude(), -3.5);
        assert_eq!(site.height(), 650.0);

        assert_eq!(
            GeodeticLocation::new(90.5, 0.0, 0.0),
            Err(MountError::InvalidLatitude(90.5))
        );
        assert!(matches!(
            GeodeticLocation::new(f64::NAN, 0.0, 0.0),
            Err(MountError::InvalidLatitude(_))
        ));
        assert_eq!(
            GeodeticLocation::new(10.0, f64::INFINITY, 0.0),
            Err(MountError::NonFiniteValue("longitude"))
        );
        assert!(GeodeticLocation::new(-90.0, 0.0, 0.0).is_ok());
    }

    #[test]
    fn geodetic_to_parallax_test() {
        // latitude and height of Pan-STARRS 1, Haleakala
        let (pxy1, pz1) = geodetic_to_parallax(20.707233557, 3067.694);
        assert_relative_eq!(pxy1, 0.9362410003211518, epsilon = 1e-15);
        assert_relative_eq!(pz1, 0.35154299856304305, epsilon = 1e-15);
    }

    #[test]
    fn test_parallax_limits() {
        let (c, s) = geodetic_to_parallax(0.0, 0.0);
        assert_relative_eq!(c, 1.0, epsilon = 1e-15);
        assert_eq!(s, 0.0);

        let (c, s) = geodetic_to_parallax(90.0, 0.0);
        assert!(c.abs() < 1e-15);
        assert_relative_eq!(s, EARTH_MINOR_AXIS / EARTH_MAJOR_AXIS, epsilon = 1e-15);
    }

    #[test]
    fn body_fixed_coord_test() {
        let site = GeodeticLocation::new(20.707233557, 203.744090000, 3067.694).unwrap();
        let coord = site.body_fixed_coord();
        assert_relative_eq!(coord.x, -0.00003653799439776371, max_relative = 1e-12);
        assert_relative_eq!(coord.y, -0.00001607260397528885, max_relative = 1e-12);
        assert_relative_eq!(coord.z, 0.000014988110430544328, max_relative = 1e-12);
    }

    #[test]
    fn test_body_fixed_velocity() {
        let site = GeodeticLocation::new(0.0, 0.0, 0.0).unwrap();
        let v = site.body_fixed_velocity();

        // ≈ 465 m/s toward the east at the equator
        let speed_m_s = v.norm() * crate::constants::AU * 1000.0 / crate::constants::SECONDS_PER_DAY;
        assert_relative_eq!(speed_m_s, 465.1, max_relative = 1e-3);
        assert!(v.y > 0.0);
        assert_eq!(v.z, 0.0);

        let pole = GeodeticLocation::new(90.0, 0.0, 0.0).unwrap();
        assert!(pole.body_fixed_velocity().norm() < 1e-18);
    }
}
