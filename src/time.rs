use hifitime::{Epoch, Unit};
use std::str::FromStr;

use crate::constants::{DPI, JULIAN_CENTURY, MAX_DUT1, MJD, SIDEREAL_RATE, T2000};
use crate::mount_errors::MountError;

/// Parse an ISO 8601 timestamp into an [`Epoch`].
///
/// Strings without an explicit time scale suffix are read as UTC, so that
/// `"2000-01-01T00:00:00"` and `"2000-01-01T00:00:00 UTC"` are the same instant.
///
/// Argument
/// --------
/// * `date`: a date in the format `YYYY-MM-ddTHH:mm:ss[.fff] [SCALE]`
///
/// Return
/// ------
/// * the parsed epoch, or [`MountError::InvalidEpoch`] carrying the hifitime diagnostic
pub fn parse_utc(date: &str) -> Result<Epoch, MountError> {
    Epoch::from_str(date.trim()).map_err(|e| MountError::InvalidEpoch(format!("{date}: {e}")))
}

/// Modified Julian Date of an epoch in the UT1 time scale.
///
/// UT1 is obtained from UTC and a user supplied ΔUT1 = UT1 − UTC offset
/// (in seconds), instead of an Earth orientation parameter file.
///
/// Arguments
/// ---------
/// * `epoch`: the observation instant.
/// * `dut1`: UT1 − UTC in seconds, |ΔUT1| ≤ 0.9 s.
pub fn mjd_ut1(epoch: &Epoch, dut1: f64) -> Result<MJD, MountError> {
    if !dut1.is_finite() || dut1.abs() > MAX_DUT1 {
        return Err(MountError::InvalidSimulationParameter(format!(
            "dut1 must lie in [-{MAX_DUT1}, {MAX_DUT1}] s, got {dut1}"
        )));
    }
    Ok((*epoch + dut1 * Unit::Second).to_mjd_utc_days())
}

/// Modified Julian Date of an epoch in Terrestrial Time.
pub fn mjd_tt(epoch: &Epoch) -> MJD {
    epoch.to_mjd_tt_days()
}

/// Julian centuries elapsed since J2000.0 for a MJD.
pub fn centuries_since_j2000(tjm: MJD) -> f64 {
    (tjm - T2000) / JULIAN_CENTURY
}

/// Compute the Greenwich Mean Sidereal Time (GMST) in radians
/// for a given Modified Julian Date (UT1 time scale).
///
/// This function implements the IAU 1982 polynomial formula
/// for the mean sidereal time at 0h UT1, plus the fractional-day
/// correction term due to Earth's rotation rate.
///
/// # Arguments
/// * `tjm` - Modified Julian Date (MJD, UT1 time scale)
///
/// # Returns
/// * GMST angle in radians, normalized to the interval [0, 2π).
///
/// # Details
/// 1. A cubic polynomial (coefficients C0–C3) gives GMST at 0h UT1 in seconds.
/// 2. The elapsed fraction of the day is added, scaled by the sidereal/solar day ratio.
///
/// # References
/// * IAU 1982, Explanatory Supplement to the Astronomical Almanac (1992).
pub fn gmst(tjm: MJD) -> f64 {
    // Polynomial coefficients for GMST at 0h UT1 (in seconds)
    const C0: f64 = 24110.54841;
    const C1: f64 = 8640184.812866;
    const C2: f64 = 9.3104e-2;
    const C3: f64 = -6.2e-6;

    let midnight = tjm.floor();
    let t = centuries_since_j2000(midnight);

    let gmst0 = (((C3 * t + C2) * t + C1) * t + C0) * DPI / 86400.0;
    let day_fraction = (tjm - midnight) * DPI;

    (gmst0 + day_fraction * SIDEREAL_RATE).rem_euclid(DPI)
}
