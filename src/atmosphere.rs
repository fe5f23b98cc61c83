//! # Atmospheric refraction
//!
//! Two-coefficient refraction model `Δζ = A·tan ζ + B·tan³ ζ`, with the coefficients
//! derived from the local weather (temperature, pressure, relative humidity) and the
//! observing wavelength following the Green (1987) / Hohenkerk & Sinclair formulation used
//! by SOFA/ERFA.
//!
//! Directions are handled as Cartesian vectors of the local horizontal frame, whose third
//! component points to the zenith (see [`crate::horizontal::HorizontalDirection`]).
//!
//! ## Example
//!
//! ```rust
//! use polar_axis_sim::atmosphere::AtmosphereParameters;
//!
//! let atm = AtmosphereParameters::standard();
//! let coeffs = atm.refraction_constants();
//! // about one arcminute at 45° of altitude
//! assert!((coeffs.a.to_degrees() * 3600.0 - 57.0).abs() < 1.0);
//! ```
use log::warn;
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::constants::{Celsius, HectoPascal, Micron, ZERO_CELSIUS_K};
use crate::mount_errors::MountError;

/// Standard pressure at sea level, in hPa.
pub const STANDARD_PRESSURE: HectoPascal = 1013.25;
/// Standard temperature, in °C.
pub const STANDARD_TEMPERATURE: Celsius = 15.0;
/// Standard relative humidity.
pub const STANDARD_HUMIDITY: f64 = 0.0;
/// Default observing wavelength (visual), in µm.
pub const STANDARD_WAVELENGTH: Micron = 0.55;

// Lowest horizontal component of a direction (about 0.2 arcsec from the zenith)
const CEL_MIN: f64 = 1e-6;
// Lowest sine of altitude (about 3°): below it the displacement is frozen
const SIN_ALT_MIN: f64 = 0.05;

/// Weather and wavelength conditions of an observation.
///
/// Deserialization goes through [`AtmosphereParameters::new`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawAtmosphere")]
pub struct AtmosphereParameters {
    temperature: Celsius,
    pressure: HectoPascal,
    humidity: f64,
    wavelength: Micron,
}

#[derive(Deserialize)]
struct RawAtmosphere {
    temperature: Celsius,
    pressure: HectoPascal,
    humidity: f64,
    wavelength: Micron,
}

impl TryFrom<RawAtmosphere> for AtmosphereParameters {
    type Error = MountError;

    fn try_from(raw: RawAtmosphere) -> Result<Self, Self::Error> {
        AtmosphereParameters::new(raw.temperature, raw.pressure, raw.humidity, raw.wavelength)
    }
}

/// Coefficients of the refraction model, in radians.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RefractionConstants {
    pub a: f64,
    pub b: f64,
}

impl AtmosphereParameters {
    /// Build a validated set of atmospheric conditions.
    ///
    /// Arguments
    /// ---------
    /// * `temperature`: ambient temperature in °C, above absolute zero.
    /// * `pressure`: ambient pressure in hPa, non-negative (0 disables refraction).
    /// * `humidity`: relative humidity in `[0, 1]`.
    /// * `wavelength`: observing wavelength in µm, positive. Values above 100 µm select the
    ///   radio formula.
    ///
    /// Errors
    /// ------
    /// * [`MountError::NonFiniteValue`] for NaN or infinite inputs.
    /// * [`MountError::InvalidHumidity`] for humidity outside `[0, 1]`.
    /// * [`MountError::InvalidAtmosphere`] for non-physical temperature, pressure or wavelength.
    pub fn new(
        temperature: Celsius,
        pressure: HectoPascal,
        humidity: f64,
        wavelength: Micron,
    ) -> Result<Self, MountError> {
        let temperature = MountError::ensure_finite(temperature, "temperature")?;
        let pressure = MountError::ensure_finite(pressure, "pressure")?;
        let humidity = MountError::ensure_finite(humidity, "humidity")?;
        let wavelength = MountError::ensure_finite(wavelength, "wavelength")?;

        if !(0.0..=1.0).contains(&humidity) {
            return Err(MountError::InvalidHumidity(humidity));
        }
        if temperature <= -ZERO_CELSIUS_K {
            return Err(MountError::InvalidAtmosphere(format!(
                "temperature {temperature} °C is below absolute zero"
            )));
        }
        if pressure < 0.0 {
            return Err(MountError::InvalidAtmosphere(format!(
                "pressure must be non-negative, got {pressure} hPa"
            )));
        }
        if wavelength <= 0.0 {
            return Err(MountError::InvalidAtmosphere(format!(
                "wavelength must be positive, got {wavelength} µm"
            )));
        }

        Ok(AtmosphereParameters {
            temperature,
            pressure,
            humidity,
            wavelength,
        })
    }

    /// Standard atmosphere: 1013.25 hPa, 15 °C, dry air, 0.55 µm.
    pub fn standard() -> Self {
        AtmosphereParameters {
            temperature: STANDARD_TEMPERATURE,
            pressure: STANDARD_PRESSURE,
            humidity: STANDARD_HUMIDITY,
            wavelength: STANDARD_WAVELENGTH,
        }
    }

    /// Build the conditions from weather station readings, replacing every missing or
    /// implausible reading with its standard value.
    ///
    /// A reading is replaced when it is `None` or NaN, and additionally when the pressure
    /// is below 500 hPa, the temperature outside `[-100, 100]` °C, or the humidity outside
    /// `[0, 1]`. Each substitution is logged as a warning.
    ///
    /// Errors
    /// ------
    /// * the errors of [`AtmosphereParameters::new`], which can only come from `wavelength`.
    pub fn from_station_readings(
        pressure: Option<HectoPascal>,
        temperature: Option<Celsius>,
        humidity: Option<f64>,
        wavelength: Micron,
    ) -> Result<Self, MountError> {
        let pressure = reading_or_standard(pressure, "pressure", STANDARD_PRESSURE, |p| {
            p >= 500.0
        });
        let temperature =
            reading_or_standard(temperature, "temperature", STANDARD_TEMPERATURE, |t| {
                (-100.0..=100.0).contains(&t)
            });
        let humidity = reading_or_standard(humidity, "humidity", STANDARD_HUMIDITY, |h| {
            (0.0..=1.0).contains(&h)
        });

        Self::new(temperature, pressure, humidity, wavelength)
    }

    pub fn temperature(&self) -> Celsius {
        self.temperature
    }

    pub fn pressure(&self) -> HectoPascal {
        self.pressure
    }

    pub fn humidity(&self) -> f64 {
        self.humidity
    }

    pub fn wavelength(&self) -> Micron {
        self.wavelength
    }

    /// Compute the refraction constants `A` and `B` for these conditions.
    ///
    /// Returns
    /// --------
    /// * [`RefractionConstants`] such that the refraction in zenith distance is
    ///   `Δζ = A·tan ζ + B·tan³ ζ` (radians).
    ///
    /// Remarks
    /// -------
    /// * The inputs are clamped to the domain of the model before use
    ///   (temperature `[-150, 200]` °C, pressure `[0, 10000]` hPa, wavelength `[0.1, 1e6]` µm).
    /// * The water vapour pressure comes from the saturation pressure of Gill (1982) with the
    ///   enhancement factor of Crane (1976).
    pub fn refraction_constants(&self) -> RefractionConstants {
        let optic = self.wavelength <= 100.0;

        let t = self.temperature.clamp(-150.0, 200.0);
        let p = self.pressure.clamp(0.0, 10000.0);
        let r = self.humidity.clamp(0.0, 1.0);
        let w = self.wavelength.clamp(0.1, 1e6);

        let pw = if p > 0.0 {
            let ps = 10f64.powf((0.7859 + 0.03477 * t) / (1.0 + 0.00412 * t))
                * (1.0 + p * (4.5e-6 + 6e-10 * t * t));
            r * ps / (1.0 - (1.0 - r) * ps / p)
        } else {
            0.0
        };

        let tk = t + ZERO_CELSIUS_K;

        let gamma = if optic {
            let wlsq = w * w;
            ((77.53484e-6 + (4.391e-7 + 3.57e-9 / wlsq) / wlsq) * p - 11.2684e-6 * pw) / tk
        } else {
            (77.6890e-6 * p - (6.3938e-6 - 0.375463 / tk) * pw) / tk
        };

        let mut beta = 4.4474e-6 * tk;
        if !optic {
            beta -= 0.0074 * pw * beta;
        }

        RefractionConstants {
            a: gamma * (1.0 - beta),
            b: -gamma * (beta - gamma / 2.0),
        }
    }

    /// Turn an observed (refracted) horizontal direction into the topocentric one.
    ///
    /// The direction is moved away from the zenith by `Δζ = A·tan ζ + B·tan³ ζ`, ζ being the
    /// observed zenith distance, keeping its azimuth. The zenith itself is returned unchanged.
    ///
    /// Remarks
    /// -------
    /// * The model diverges at the horizon: `tan ζ` is evaluated with the sine of altitude
    ///   clamped at 0.05, so below about 3° of altitude (and below the horizon) the
    ///   displacement stays close to its value at the clamp, about 10 arcminutes.
    pub fn remove_refraction(&self, observed: &Vector3<f64>) -> Vector3<f64> {
        let RefractionConstants { a, b } = self.refraction_constants();
        let v = observed.normalize();

        let r = v.x.hypot(v.y);
        if r == 0.0 {
            return v;
        }

        let tz = r.max(CEL_MIN) / v.z.max(SIN_ALT_MIN);
        let del = (a + b * tz * tz) * tz;

        let (sz, cz) = (r.atan2(v.z) + del).sin_cos();
        Vector3::new(v.x / r * sz, v.y / r * sz, cz)
    }

    /// Turn a topocentric horizontal direction into the observed (refracted) one.
    ///
    /// Inverse of [`AtmosphereParameters::remove_refraction`] to a few milliarcseconds above
    /// 5° of altitude; below the horizon the displacement is frozen at its 3° value.
    pub fn apply_refraction(&self, topocentric: &Vector3<f64>) -> Vector3<f64> {
        let RefractionConstants { a, b } = self.refraction_constants();
        let v = topocentric.normalize();

        let r = v.x.hypot(v.y);
        if r == 0.0 {
            return v;
        }
        let z = v.z.max(SIN_ALT_MIN);

        let tz = r.max(CEL_MIN) / z;
        let w = b * tz * tz;
        let del = (a + w) * tz / (1.0 + (a + 3.0 * w) / (z * z));

        let cosdel = 1.0 - del * del / 2.0;
        let f = cosdel - del * z / r;

        Vector3::new(v.x * f, v.y * f, cosdel * v.z + del * r).normalize()
    }
}

impl Default for AtmosphereParameters {
    fn default() -> Self {
        Self::standard()
    }
}

fn reading_or_standard(
    reading: Option<f64>,
    name: &str,
    standard: f64,
    plausible: impl Fn(f64) -> bool,
) -> f64 {
    match reading {
        Some(value) if !value.is_nan() && plausible(value) => value,
        Some(value) => {
            warn!("Implausible {name} reading {value}, using standard value {standard}");
            standard
        }
        None => {
            warn!("No {name} reading, using standard value {standard}");
            standard
        }
    }
}
