//! # Local horizontal frame
//!
//! Directions as seen from the observing site, and the context (instant, site, weather)
//! needed to place them on the sky.
//!
//! The Cartesian form of a direction of altitude `a` and azimuth `A` is
//!
//! ```text
//! (cos a · cos A, cos a · sin A, sin a)
//! ```
//!
//! with the azimuth counted from the north through the east. The axes point north, east
//! and to the zenith, so the frame is left-handed. Rotations are nevertheless expressed
//! with the plain right-hand rule on the components.
use std::fmt;

use hifitime::Epoch;
use nalgebra::Vector3;

use crate::atmosphere::AtmosphereParameters;
use crate::celestial::{
    observation_to_apparent, observation_to_celestial, ApparentPlace, CelestialCoordinate,
};
use crate::constants::{Degree, Radian, DPI};
use crate::location::GeodeticLocation;
use crate::mount_errors::MountError;

/// A unit direction in the local horizontal frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HorizontalDirection {
    cartesian: Vector3<f64>,
}

impl HorizontalDirection {
    /// Direction from altitude and azimuth in **degrees**.
    pub fn from_altaz(altitude: Degree, azimuth: Degree) -> Result<Self, MountError> {
        Self::from_altaz_rad(
            MountError::ensure_finite(altitude, "altitude")?.to_radians(),
            MountError::ensure_finite(azimuth, "azimuth")?.to_radians(),
        )
    }

    /// Direction from altitude and azimuth in **radians**.
    pub fn from_altaz_rad(altitude: Radian, azimuth: Radian) -> Result<Self, MountError> {
        Ok(Self::from_finite_altaz(
            MountError::ensure_finite(altitude, "altitude")?,
            MountError::ensure_finite(azimuth, "azimuth")?,
        ))
    }

    /// Callers guarantee finite angles (radians).
    pub(crate) fn from_finite_altaz(altitude: Radian, azimuth: Radian) -> Self {
        let (sa, ca) = altitude.sin_cos();
        let (sz, cz) = azimuth.sin_cos();
        HorizontalDirection {
            cartesian: Vector3::new(ca * cz, ca * sz, sa),
        }
    }

    /// Direction pointed by a Cartesian vector of the horizontal frame.
    ///
    /// The vector is normalized; a null or non-finite vector is rejected with
    /// [`MountError::ZeroLengthAxis`].
    pub fn from_cartesian(vector: &Vector3<f64>) -> Result<Self, MountError> {
        let norm = vector.norm();
        if norm == 0.0 || !norm.is_finite() {
            return Err(MountError::ZeroLengthAxis);
        }
        Ok(HorizontalDirection {
            cartesian: vector / norm,
        })
    }

    pub fn to_cartesian(&self) -> Vector3<f64> {
        self.cartesian
    }

    /// Altitude above the horizon, in degrees `[-90, 90]`.
    pub fn altitude(&self) -> Degree {
        let horizontal = self.cartesian.x.hypot(self.cartesian.y);
        self.cartesian.z.atan2(horizontal).to_degrees()
    }

    /// Azimuth from the north through the east, in degrees `[0, 360)`.
    ///
    /// The azimuth of the zenith and nadir is reported as 0.
    pub fn azimuth(&self) -> Degree {
        let az = self.cartesian.y.atan2(self.cartesian.x).rem_euclid(DPI);
        // rem_euclid may round up to exactly 2π
        if az >= DPI {
            0.0
        } else {
            az.to_degrees()
        }
    }
}

impl fmt::Display for HorizontalDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "alt = {:.6}°, az = {:.6}°",
            self.altitude(),
            self.azimuth()
        )
    }
}

/// When, where and through which atmosphere a direction is observed.
///
/// `atmosphere = None` means the directions are free of refraction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObservationContext {
    pub epoch: Epoch,
    /// UT1 − UTC, in seconds
    pub dut1: f64,
    pub location: GeodeticLocation,
    pub atmosphere: Option<AtmosphereParameters>,
}

impl ObservationContext {
    pub fn new(
        epoch: Epoch,
        location: GeodeticLocation,
        atmosphere: Option<AtmosphereParameters>,
    ) -> Self {
        ObservationContext {
            epoch,
            dut1: 0.0,
            location,
            atmosphere,
        }
    }

    pub fn with_dut1(mut self, dut1: f64) -> Self {
        self.dut1 = dut1;
        self
    }

    /// Attach this context to a direction.
    pub fn observe(&self, direction: HorizontalDirection) -> Observation {
        Observation {
            direction,
            context: *self,
        }
    }
}

/// A horizontal direction tagged with its observation context.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Observation {
    pub direction: HorizontalDirection,
    pub context: ObservationContext,
}

impl Observation {
    /// Place the observation in the equatorial mean J2000 frame (ICRS-aligned).
    ///
    /// See [`observation_to_celestial`].
    pub fn to_celestial(&self) -> Result<CelestialCoordinate, MountError> {
        observation_to_celestial(self)
    }

    /// Hour angle and coordinates in the true equator and equinox of date.
    ///
    /// See [`observation_to_apparent`].
    pub fn to_apparent(&self) -> Result<ApparentPlace, MountError> {
        observation_to_apparent(self)
    }
}
