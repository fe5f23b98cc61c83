use nalgebra::{Matrix3, Rotation3, Vector3};

use crate::constants::{Radian, DPI, T2000, VLIGHT_AU};
use crate::earth_orientation::{prec, rnut80};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RefEpoch {
    J2000,
    Epoch(f64),
}

impl RefEpoch {
    pub fn date(&self) -> f64 {
        match *self {
            RefEpoch::J2000 => T2000,
            RefEpoch::Epoch(d) => d,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RefSystem {
    // Equatorial mean: mean equator and mean equinox at the given epoch
    // (precession applied, nutation not)
    Equm(RefEpoch),
    // Equatorial true: same as Equm with nutation applied
    Equt(RefEpoch),
}

impl RefSystem {
    pub fn epoch(&self) -> RefEpoch {
        match *self {
            RefSystem::Equm(e) => e,
            RefSystem::Equt(e) => e,
        }
    }

    /// Rotation taking coordinates expressed in `self` to the equatorial mean J2000 frame.
    fn to_equm_j2000(self) -> Matrix3<f64> {
        let date = self.epoch().date();
        let from_mean_of_date = prec(date).transpose();
        match self {
            RefSystem::Equm(_) => from_mean_of_date,
            RefSystem::Equt(_) => from_mean_of_date * rnut80(date).transpose(),
        }
    }
}

/// Compute the rotation matrix between two celestial reference systems and epochs.
///
/// Both systems are first related to the equatorial mean J2000 frame; the result is the
/// composition `(target → J2000)ᵀ · (source → J2000)`.
///
/// Arguments
/// ---------
/// * `ref_sys1`: source reference system and epoch (MJD TT for [`RefEpoch::Epoch`]).
/// * `ref_sys2`: target reference system and epoch.
///
/// Returns
/// --------
/// * the rotation matrix such that `x₂ = rot · x₁`, where `x₁` is a vector in the
///   source system and `x₂` the same vector expressed in the target system.
///
/// # See also
/// * [`prec`] – IAU 1976 precession matrix
/// * [`rnut80`] – IAU 1980 nutation matrix
pub fn rotpn(ref_sys1: &RefSystem, ref_sys2: &RefSystem) -> Matrix3<f64> {
    if ref_sys1 == ref_sys2 {
        return Matrix3::identity();
    }
    ref_sys2.to_equm_j2000().transpose() * ref_sys1.to_equm_j2000()
}

/// Elementary rotation matrix of angle `alpha` around the X (`k = 0`), Y (`k = 1`) or
/// Z (`k = 2`) axis.
///
/// The rotation is active (right-hand rule). Indices outside `0..3` wrap around, so that
/// `k = 3` is the X axis again.
pub fn rotmt(alpha: Radian, k: usize) -> Matrix3<f64> {
    let axis = match k % 3 {
        0 => Vector3::x_axis(),
        1 => Vector3::y_axis(),
        _ => Vector3::z_axis(),
    };

    Rotation3::from_axis_angle(&axis, alpha).into()
}

/// Apply the first-order aberration correction to a position vector.
///
/// Arguments
/// ---------
/// * `xrel`: position vector from the observer to the target.
/// * `vrel`: velocity of the observer [AU/day].
///
/// Formula
/// -------
/// ```text
/// x_corr = xrel − (‖xrel‖ / c) · vrel
/// ```
/// where `c` is the speed of light in AU/day (`VLIGHT_AU`). For a unit direction this
/// moves an apparent direction back to the geometric one.
///
/// Remarks
/// -------
/// * This function does **not** normalize the output.
pub(crate) fn correct_aberration(xrel: Vector3<f64>, vrel: Vector3<f64>) -> Vector3<f64> {
    let dt = xrel.norm() / VLIGHT_AU;
    xrel - dt * vrel
}

/// Convert a 3D Cartesian vector to right ascension and declination.
///
/// Returns
/// --------
/// * Tuple `(α, δ, ρ)`:
///     - `α`: right ascension in radians, in the range [0, 2π).
///     - `δ`: declination in radians, in the range [−π/2, +π/2].
///     - `ρ`: Euclidean norm of the vector.
///
/// Remarks
/// -------
/// * If the input vector has zero norm, the result is `(0.0, 0.0, 0.0)`.
/// * At the poles the right ascension is undefined and reported as `0.0`.
pub(crate) fn cartesian_to_radec(cartesian_position: Vector3<f64>) -> (f64, f64, f64) {
    let pos_norm = cartesian_position.norm();
    if pos_norm == 0. {
        return (0.0, 0.0, pos_norm);
    }

    let rho_xy = cartesian_position.x.hypot(cartesian_position.y);
    let delta = cartesian_position.z.atan2(rho_xy);

    if rho_xy == 0.0 {
        return (0.0, delta, pos_norm);
    }

    let alpha = cartesian_position.y.atan2(cartesian_position.x);
    let alpha = if alpha < 0.0 { alpha + DPI } else { alpha };
    // tiny negative angles round up to exactly 2π
    let alpha = if alpha >= DPI { alpha - DPI } else { alpha };
    (alpha, delta, pos_norm)
}

/// Unit vector pointing toward the spherical direction `(α, δ)`.
pub(crate) fn radec_to_cartesian(alpha: Radian, delta: Radian) -> Vector3<f64> {
    let (sa, ca) = alpha.sin_cos();
    let (sd, cd) = delta.sin_cos();
    Vector3::new(cd * ca, cd * sa, sd)
}
