use approx::assert_abs_diff_eq;
use polar_axis_sim::celestial::CelestialCoordinate;
use polar_axis_sim::constants::Radian;

/// Wrap an angle difference into `(−π, π]`.
pub fn wrap_pi(angle: Radian) -> Radian {
    let pi = std::f64::consts::PI;
    let wrapped = (angle + pi).rem_euclid(std::f64::consts::TAU) - pi;
    if wrapped <= -pi {
        wrapped + std::f64::consts::TAU
    } else {
        wrapped
    }
}

/// Assert that two coordinates are within `arcsec` arcseconds of each other.
pub fn assert_sky_close(actual: &CelestialCoordinate, expected: &CelestialCoordinate, arcsec: f64) {
    let separation = actual.separation(expected).to_degrees() * 3600.0;
    assert_abs_diff_eq!(separation, 0.0, epsilon = arcsec);
}
