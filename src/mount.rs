//! # Mount kinematics
//!
//! An equatorial mount turns the telescope about its polar axis. When that axis is not
//! aligned with the celestial pole, slewing the right ascension axis by a fixed angle
//! moves the pointed direction along a circle centred on the *mechanical* axis instead of
//! the true pole.
//!
//! This module builds:
//!
//! * the misaligned axis itself ([`mount_axis`]),
//! * the finite rotation about that axis ([`MountRotation`]),
//! * the successive pointed directions ([`propagate`], [`trace`]).
//!
//! All vectors live in the local horizontal frame of [`crate::horizontal`].
//!
//! ## Example
//!
//! ```rust
//! use nalgebra::Vector3;
//! use polar_axis_sim::mount::{angle_about_axis, propagate, MountRotation};
//!
//! let axis = Vector3::new(0.766, 0.0, 0.643);
//! let rotation = MountRotation::new(&axis, 30f64.to_radians()).unwrap();
//! let [p1, p2, _p3] = propagate(&rotation, &Vector3::new(0.0, 1.0, 0.0));
//!
//! let step = angle_about_axis(&axis, &p1, &p2).unwrap();
//! assert!((step.to_degrees() - 30.0).abs() < 1e-9);
//! ```
use std::iter::successors;

use log::debug;
use nalgebra::{Matrix3, Quaternion, Unit, UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};

use crate::constants::{Degree, Radian};
use crate::horizontal::{HorizontalDirection, Observation, ObservationContext};
use crate::mount_errors::MountError;

/// Offsets of the mount polar axis with respect to the true celestial pole, in degrees.
///
/// The misaligned axis points to altitude `latitude + altitude` and azimuth `azimuth`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(try_from = "RawMisalignment")]
pub struct AxisMisalignment {
    pub azimuth: Degree,
    pub altitude: Degree,
}

#[derive(Deserialize)]
struct RawMisalignment {
    azimuth: Degree,
    altitude: Degree,
}

impl TryFrom<RawMisalignment> for AxisMisalignment {
    type Error = MountError;

    fn try_from(raw: RawMisalignment) -> Result<Self, Self::Error> {
        AxisMisalignment::new(raw.azimuth, raw.altitude)
    }
}

impl AxisMisalignment {
    pub fn new(azimuth: Degree, altitude: Degree) -> Result<Self, MountError> {
        Ok(AxisMisalignment {
            azimuth: MountError::ensure_finite(azimuth, "misalignment azimuth")?,
            altitude: MountError::ensure_finite(altitude, "misalignment altitude")?,
        })
    }

    /// Total angular offset between the mount axis and the pole, in degrees.
    pub fn total_error(&self, latitude: Degree) -> Degree {
        let pole = HorizontalDirection::from_finite_altaz(latitude.to_radians(), 0.0);
        let axis = HorizontalDirection::from_finite_altaz(
            (latitude + self.altitude).to_radians(),
            self.azimuth.to_radians(),
        );
        let (a, b) = (pole.to_cartesian(), axis.to_cartesian());
        a.cross(&b).norm().atan2(a.dot(&b)).to_degrees()
    }
}

/// Signed angle by which the mount turns at every step, in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(into = "f64", try_from = "f64")]
pub struct RotationStep(Degree);

impl TryFrom<Degree> for RotationStep {
    type Error = MountError;

    fn try_from(angle: Degree) -> Result<Self, Self::Error> {
        RotationStep::new(angle)
    }
}

impl From<RotationStep> for Degree {
    fn from(step: RotationStep) -> Self {
        step.0
    }
}

impl RotationStep {
    pub fn new(angle: Degree) -> Result<Self, MountError> {
        Ok(RotationStep(MountError::ensure_finite(angle, "rotation step")?))
    }

    pub fn degrees(&self) -> Degree {
        self.0
    }

    pub fn radians(&self) -> Radian {
        self.0.to_radians()
    }
}

/// Build the mechanical axis of a misaligned mount.
///
/// Arguments
/// ---------
/// * `context`: the observation context; only the site latitude matters.
/// * `misalignment`: azimuth and altitude offsets from the true pole.
///
/// Returns
/// --------
/// * the axis as an [`Observation`] sharing `context`, pointing to altitude
///   `latitude + misalignment.altitude` and azimuth `misalignment.azimuth`. The direction is
///   unit length by construction.
///
/// Remarks
/// -------
/// * The atmosphere of the context does not bend the axis: it is a mechanical direction.
pub fn mount_axis(context: &ObservationContext, misalignment: &AxisMisalignment) -> Observation {
    let altitude = context.location.latitude() + misalignment.altitude;
    let direction = HorizontalDirection::from_finite_altaz(
        altitude.to_radians(),
        misalignment.azimuth.to_radians(),
    );
    context.observe(direction)
}

/// A finite rotation of the mount about its polar axis.
///
/// A positive angle turns counterclockwise when looking from the tip of the axis toward
/// the origin, applying the right-hand rule to the components of the horizontal frame.
/// About the northern celestial pole this follows the apparent diurnal motion of the sky.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MountRotation {
    axis: Unit<Vector3<f64>>,
    angle: Radian,
    rotation: UnitQuaternion<f64>,
}

impl MountRotation {
    /// Build the rotation of `angle` radians about `axis`.
    ///
    /// The axis is normalized, then the quaternion
    /// `q = (cos θ/2, sin θ/2 · x̂, sin θ/2 · ŷ, sin θ/2 · ẑ)` is built and normalized.
    ///
    /// Errors
    /// ------
    /// * [`MountError::ZeroLengthAxis`] if the axis is null or not finite.
    /// * [`MountError::NonFiniteValue`] if the angle is not finite.
    pub fn new(axis: &Vector3<f64>, angle: Radian) -> Result<Self, MountError> {
        let norm = axis.norm();
        if norm == 0.0 || !norm.is_finite() {
            return Err(MountError::ZeroLengthAxis);
        }
        let angle = MountError::ensure_finite(angle, "rotation angle")?;

        Ok(Self::about_unit_axis(
            Unit::new_unchecked(axis / norm),
            angle,
        ))
    }

    fn about_unit_axis(axis: Unit<Vector3<f64>>, angle: Radian) -> Self {
        let (s, c) = (angle / 2.0).sin_cos();
        let rotation =
            UnitQuaternion::new_normalize(Quaternion::new(c, s * axis.x, s * axis.y, s * axis.z));

        debug!(
            "mount rotation: axis = {:?}, angle = {:.6}°, q = {:?}",
            axis.as_slice(),
            angle.to_degrees(),
            rotation.coords.as_slice()
        );

        MountRotation {
            axis,
            angle,
            rotation,
        }
    }

    /// Rotate a vector.
    pub fn apply(&self, vector: &Vector3<f64>) -> Vector3<f64> {
        self.rotation * vector
    }

    /// The rotation angle as requested, in radians (signed).
    pub fn angle(&self) -> Radian {
        self.angle
    }

    /// The unit rotation axis.
    pub fn axis(&self) -> Unit<Vector3<f64>> {
        self.axis
    }

    pub fn quaternion(&self) -> &UnitQuaternion<f64> {
        &self.rotation
    }

    pub fn to_rotation_matrix(&self) -> Matrix3<f64> {
        self.rotation.to_rotation_matrix().into_inner()
    }

    /// The rotation of `n` times the angle about the same axis, built directly from the
    /// multiplied angle rather than by composition.
    pub fn powi(&self, n: i32) -> Self {
        Self::about_unit_axis(self.axis, self.angle * f64::from(n))
    }
}

/// Successive directions pointed by the mount: `start`, `R(start)`, `R(R(start))`, ...
///
/// Every point is obtained by rotating the previous one. Returns `n` points, the first
/// being `start`.
pub fn trace(rotation: &MountRotation, start: &Vector3<f64>, n: usize) -> Vec<Vector3<f64>> {
    successors(Some(*start), |previous| Some(rotation.apply(previous)))
        .take(n)
        .collect()
}

/// The three directions `(p1, p2, p3)` with `p2 = R(p1)` and `p3 = R(p2)`.
pub fn propagate(rotation: &MountRotation, start: &Vector3<f64>) -> [Vector3<f64>; 3] {
    let p2 = rotation.apply(start);
    let p3 = rotation.apply(&p2);
    [*start, p2, p3]
}

/// Signed rotation angle about `axis` that carries `from` onto `to`, in `(−π, π]`.
///
/// Both vectors are projected onto the plane normal to the axis; the result is the angle
/// between the projections, positive following the right-hand rule about the axis.
/// Vectors parallel to the axis give 0.
///
/// Errors
/// ------
/// * [`MountError::ZeroLengthAxis`] if the axis is null or not finite.
pub fn angle_about_axis(
    axis: &Vector3<f64>,
    from: &Vector3<f64>,
    to: &Vector3<f64>,
) -> Result<Radian, MountError> {
    let norm = axis.norm();
    if norm == 0.0 || !norm.is_finite() {
        return Err(MountError::ZeroLengthAxis);
    }
    let u = axis / norm;

    let a = from - u * u.dot(from);
    let b = to - u * u.dot(to);

    Ok(a.cross(&b).dot(&u).atan2(a.dot(&b)))
}
