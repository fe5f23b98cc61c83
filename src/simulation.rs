//! # Polar misalignment simulation
//!
//! This module defines the [`SimulationParams`] configuration struct and its builder,
//! and the [`simulate`] entry point which chains the whole pipeline:
//!
//! 1. **Axis construction**
//!    The mount axis is placed at altitude `latitude + altitude offset`, azimuth
//!    `azimuth offset` ([`mount_axis`]).
//!
//! 2. **Rotation**
//!    A rotation of `step` degrees about that axis is built ([`MountRotation`]).
//!
//! 3. **Propagation**
//!    The initial pointed direction is rotated twice ([`propagate`]), giving three
//!    directions of the local horizontal frame.
//!
//! 4. **Conversion**
//!    The three directions share one [`ObservationContext`] (same instant, site and
//!    atmosphere) and are converted to right ascension and declination.
//!
//! ## Example
//!
//! ```rust
//! use polar_axis_sim::simulation::{simulate, SimulationParams};
//!
//! let params = SimulationParams::builder()
//!     .latitude(48.5)
//!     .misalignment(0.5, -0.25)
//!     .step(20.0)
//!     .refraction(false)
//!     .build()
//!     .unwrap();
//!
//! let result = simulate(&params).unwrap();
//! for point in result.points.iter() {
//!     println!("{}", point.icrs);
//! }
//! ```
use std::cmp::Ordering::{Equal, Less};
use std::fmt;

use hifitime::Epoch;
use log::info;
use nalgebra::Vector3;
use rayon::prelude::*;

use crate::atmosphere::AtmosphereParameters;
use crate::celestial::{observation_to_places, ApparentPlace, CelestialCoordinate};
use crate::constants::{Celsius, Degree, HectoPascal, Meter, Micron, Radian, MAX_DUT1};
use crate::horizontal::{HorizontalDirection, Observation, ObservationContext};
use crate::location::GeodeticLocation;
use crate::mount::{
    angle_about_axis, mount_axis, propagate, AxisMisalignment, MountRotation, RotationStep,
};
use crate::mount_errors::MountError;

/// Inputs of a polar misalignment scenario.
///
/// Defaults
/// -----------------
/// The [`Default`] implementation is the reference scenario:
///
/// * `latitude`: 40°, `longitude`: 0°, `height`: 0 m
/// * `misalignment`: azimuth 1°, altitude 1°
/// * `step`: 30°
/// * `initial_altitude`: 20°, `initial_azimuth`: 70°
/// * `epoch`: 2000-01-01T00:00:00 UTC, `dut1`: 0 s
/// * `temperature`: 7 °C, `pressure`: 1005 hPa, `humidity`: 0.8, `wavelength`: 0.574 µm
/// * `refraction`: on
///
/// Notes & Validation
/// -----------------
/// * `latitude ∈ [-90, 90]`, `humidity ∈ [0, 1]`, `|dut1| ≤ 0.9 s`.
/// * All angles and weather values must be finite; the atmosphere must be physical
///   (see [`AtmosphereParameters::new`]) even when refraction is disabled.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationParams {
    // --- Site ---
    pub latitude: Degree,
    pub longitude: Degree,
    pub height: Meter,

    // --- Mount ---
    pub misalignment: AxisMisalignment,
    /// Signed rotation applied about the mount axis at every step.
    pub step: Degree,
    pub initial_altitude: Degree,
    pub initial_azimuth: Degree,

    // --- Time ---
    /// Instant shared by the three pointings.
    pub epoch: Epoch,
    /// UT1 − UTC in seconds.
    pub dut1: f64,

    // --- Atmosphere ---
    pub temperature: Celsius,
    pub pressure: HectoPascal,
    pub humidity: f64,
    pub wavelength: Micron,
    /// When false the directions are taken as free of refraction.
    pub refraction: bool,
}

impl SimulationParams {
    /// Equivalent to [`SimulationParams::default()`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new [`SimulationParamsBuilder`] initialized with the reference scenario.
    pub fn builder() -> SimulationParamsBuilder {
        SimulationParamsBuilder::new()
    }

    pub fn location(&self) -> Result<GeodeticLocation, MountError> {
        GeodeticLocation::new(self.latitude, self.longitude, self.height)
    }

    /// The atmosphere, or `None` when refraction is disabled.
    pub fn atmosphere(&self) -> Result<Option<AtmosphereParameters>, MountError> {
        let atm = AtmosphereParameters::new(
            self.temperature,
            self.pressure,
            self.humidity,
            self.wavelength,
        )?;
        Ok(self.refraction.then_some(atm))
    }

    /// Context shared by the three pointings.
    pub fn context(&self) -> Result<ObservationContext, MountError> {
        Ok(
            ObservationContext::new(self.epoch, self.location()?, self.atmosphere()?)
                .with_dut1(self.dut1),
        )
    }
}

impl Default for SimulationParams {
    fn default() -> Self {
        SimulationParams {
            latitude: 40.0,
            longitude: 0.0,
            height: 0.0,
            misalignment: AxisMisalignment {
                azimuth: 1.0,
                altitude: 1.0,
            },
            step: 30.0,
            initial_altitude: 20.0,
            initial_azimuth: 70.0,
            epoch: Epoch::from_gregorian_utc_at_midnight(2000, 1, 1),
            dut1: 0.0,
            temperature: 7.0,
            pressure: 1005.0,
            humidity: 0.8,
            wavelength: 0.574,
            refraction: true,
        }
    }
}

/// Builder for [`SimulationParams`], with validation.
#[derive(Debug, Clone)]
pub struct SimulationParamsBuilder {
    params: SimulationParams,
}

impl Default for SimulationParamsBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulationParamsBuilder {
    /// Create a new builder initialized with default values.
    pub fn new() -> Self {
        Self {
            params: SimulationParams::default(),
        }
    }

    // --- Site ---
    pub fn latitude(mut self, v: Degree) -> Self {
        self.params.latitude = v;
        self
    }
    pub fn longitude(mut self, v: Degree) -> Self {
        self.params.longitude = v;
        self
    }
    pub fn height(mut self, v: Meter) -> Self {
        self.params.height = v;
        self
    }

    // --- Mount ---
    /// Azimuth and altitude offsets of the mount axis from the pole, in degrees.
    pub fn misalignment(mut self, azimuth: Degree, altitude: Degree) -> Self {
        self.params.misalignment = AxisMisalignment { azimuth, altitude };
        self
    }
    pub fn step(mut self, v: Degree) -> Self {
        self.params.step = v;
        self
    }
    pub fn initial_point(mut self, altitude: Degree, azimuth: Degree) -> Self {
        self.params.initial_altitude = altitude;
        self.params.initial_azimuth = azimuth;
        self
    }

    // --- Time ---
    pub fn epoch(mut self, v: Epoch) -> Self {
        self.params.epoch = v;
        self
    }
    pub fn dut1(mut self, v: f64) -> Self {
        self.params.dut1 = v;
        self
    }

    // --- Atmosphere ---
    pub fn temperature(mut self, v: Celsius) -> Self {
        self.params.temperature = v;
        self
    }
    pub fn pressure(mut self, v: HectoPascal) -> Self {
        self.params.pressure = v;
        self
    }
    pub fn humidity(mut self, v: f64) -> Self {
        self.params.humidity = v;
        self
    }
    pub fn wavelength(mut self, v: Micron) -> Self {
        self.params.wavelength = v;
        self
    }
    pub fn refraction(mut self, v: bool) -> Self {
        self.params.refraction = v;
        self
    }

    /// Return true iff |x| <= bound and comparable (i.e., not NaN).
    #[inline]
    fn within(x: f64, bound: f64) -> bool {
        matches!(x.abs().partial_cmp(&bound), Some(Less) | Some(Equal))
    }

    /// Finalize the builder and produce a [`SimulationParams`] instance.
    ///
    /// Validation rules
    /// -----------------
    /// * every angle, the height and `dut1` must be finite,
    /// * `-90 ≤ latitude ≤ 90`,
    /// * `|dut1| ≤ 0.9` s,
    /// * the weather values must describe a physical atmosphere (humidity in `[0, 1]`,
    ///   pressure ≥ 0, temperature above absolute zero, wavelength > 0).
    ///
    /// Returns
    /// -----------------
    /// * `Ok(SimulationParams)` if all values are valid.
    /// * `Err(MountError)` naming the first invalid value otherwise.
    pub fn build(self) -> Result<SimulationParams, MountError> {
        let p = &self.params;

        for (value, name) in [
            (p.longitude, "longitude"),
            (p.height, "height"),
            (p.misalignment.azimuth, "misalignment azimuth"),
            (p.misalignment.altitude, "misalignment altitude"),
            (p.step, "rotation step"),
            (p.initial_altitude, "initial altitude"),
            (p.initial_azimuth, "initial azimuth"),
            (p.dut1, "dut1"),
        ] {
            MountError::ensure_finite(value, name)?;
        }

        if !Self::within(p.latitude, 90.0) {
            return Err(MountError::InvalidLatitude(p.latitude));
        }
        if !Self::within(p.dut1, MAX_DUT1) {
            return Err(MountError::InvalidSimulationParameter(format!(
                "dut1 must lie in [-{MAX_DUT1}, {MAX_DUT1}] s, got {}",
                p.dut1
            )));
        }

        AtmosphereParameters::new(p.temperature, p.pressure, p.humidity, p.wavelength)?;

        Ok(self.params)
    }
}

impl fmt::Display for SimulationParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if f.alternate() {
            const PARAM_COL: usize = 42; // width reserved for "name = value"
            writeln!(f, "Polar Misalignment Simulation Parameters")?;
            writeln!(f, "----------------------------------------")?;

            macro_rules! line {
                ($fmt:expr, $val:expr, $comment:expr) => {{
                    let s = format!($fmt, $val);
                    let pad = if s.chars().count() < PARAM_COL {
                        " ".repeat(PARAM_COL - s.chars().count())
                    } else {
                        " ".to_string()
                    };
                    writeln!(f, "  {}{}# {}", s, pad, $comment)
                }};
            }

            writeln!(f, "[Site]")?;
            line!("latitude         = {:.6}°", self.latitude, "Geodetic latitude")?;
            line!("longitude        = {:.6}°", self.longitude, "East longitude")?;
            line!("height           = {:.1} m", self.height, "Height above the ellipsoid")?;

            writeln!(f, "\n[Mount]")?;
            line!(
                "misalignment az  = {:.4}°",
                self.misalignment.azimuth,
                "Azimuth offset of the axis"
            )?;
            line!(
                "misalignment alt = {:.4}°",
                self.misalignment.altitude,
                "Altitude offset of the axis"
            )?;
            line!("step             = {:.4}°", self.step, "Rotation per step")?;
            line!(
                "initial altitude = {:.4}°",
                self.initial_altitude,
                "First pointing"
            )?;
            line!(
                "initial azimuth  = {:.4}°",
                self.initial_azimuth,
                "First pointing"
            )?;

            writeln!(f, "\n[Time]")?;
            line!("epoch            = {}", self.epoch, "Shared by the three pointings")?;
            line!("dut1             = {:.3} s", self.dut1, "UT1 - UTC")?;

            writeln!(f, "\n[Atmosphere]")?;
            line!("refraction       = {}", self.refraction, "Remove refraction")?;
            line!("temperature      = {:.1} °C", self.temperature, "Ambient temperature")?;
            line!("pressure         = {:.2} hPa", self.pressure, "Ambient pressure")?;
            line!("humidity         = {:.2}", self.humidity, "Relative humidity")?;
            line!("wavelength       = {:.3} µm", self.wavelength, "Observing wavelength")?;

            Ok(())
        } else {
            write!(
                f,
                "SimulationParams(lat={:.4}°, lon={:.4}°, misalignment=({:.3}°, {:.3}°), step={:.3}°, start=({:.3}°, {:.3}°), epoch={}, refraction={})",
                self.latitude,
                self.longitude,
                self.misalignment.azimuth,
                self.misalignment.altitude,
                self.step,
                self.initial_altitude,
                self.initial_azimuth,
                self.epoch,
                self.refraction,
            )
        }
    }
}

/// One pointing of the simulated mount.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulatedPoint {
    /// Direction in the local horizontal frame, as pointed by the mount
    pub observed: HorizontalDirection,
    /// Position on the true equator and equinox of date
    pub apparent: ApparentPlace,
    /// Geometric position in the equatorial mean J2000 frame
    pub icrs: CelestialCoordinate,
}

/// Outcome of [`simulate`].
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationResult {
    /// Mount axis and the context shared by every point
    pub axis: Observation,
    pub rotation: MountRotation,
    /// Pointings in order: initial, after one step, after two steps
    pub points: [SimulatedPoint; 3],
}

impl SimulationResult {
    /// The three J2000 coordinates in order.
    pub fn celestial_coordinates(&self) -> [CelestialCoordinate; 3] {
        self.points.map(|p| p.icrs)
    }

    /// Rotation angles about the mount axis between consecutive pointings.
    pub fn step_angles(&self) -> Result<[Radian; 2], MountError> {
        let axis = self.axis.direction.to_cartesian();
        let [p1, p2, p3] = self.points.map(|p| p.observed.to_cartesian());
        Ok([
            angle_about_axis(&axis, &p1, &p2)?,
            angle_about_axis(&axis, &p2, &p3)?,
        ])
    }
}

impl fmt::Display for SimulationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Mount axis: {}", self.axis.direction)?;
        writeln!(
            f,
            "Rotation step: {:.6}°",
            self.rotation.angle().to_degrees()
        )?;
        for (i, point) in self.points.iter().enumerate() {
            writeln!(
                f,
                "Point {}: {} -> {} (RA {:.6}°, Dec {:.6}°)",
                i + 1,
                point.observed,
                point.icrs,
                point.icrs.ra_deg(),
                point.icrs.dec_deg()
            )?;
        }
        Ok(())
    }
}

/// Run a polar misalignment scenario.
///
/// Arguments
/// ---------
/// * `params`: the scenario inputs.
///
/// Returns
/// --------
/// * a [`SimulationResult`] with the mount axis, the rotation and the three pointings,
///   each converted to the J2000 frame at the shared instant.
///
/// Errors
/// ------
/// * any validation error of the inputs (latitude, atmosphere, ΔUT1, non-finite angles).
///   No partial result is returned.
pub fn simulate(params: &SimulationParams) -> Result<SimulationResult, MountError> {
    let context = params.context()?;

    let misalignment =
        AxisMisalignment::new(params.misalignment.azimuth, params.misalignment.altitude)?;
    let axis = mount_axis(&context, &misalignment);
    let step = RotationStep::new(params.step)?;
    let rotation = MountRotation::new(&axis.direction.to_cartesian(), step.radians())?;

    let start = HorizontalDirection::from_altaz(params.initial_altitude, params.initial_azimuth)?;
    let [p1, p2, p3] = propagate(&rotation, &start.to_cartesian());

    let point = |vector: &Vector3<f64>| -> Result<SimulatedPoint, MountError> {
        let observed = HorizontalDirection::from_cartesian(vector)?;
        let (apparent, icrs) = observation_to_places(&context.observe(observed))?;
        Ok(SimulatedPoint {
            observed,
            apparent,
            icrs,
        })
    };
    let points = [point(&p1)?, point(&p2)?, point(&p3)?];

    info!(
        "{params}: {} | {} | {}",
        points[0].icrs, points[1].icrs, points[2].icrs
    );

    Ok(SimulationResult {
        axis,
        rotation,
        points,
    })
}

/// Run independent scenarios in parallel.
///
/// Returns one result per scenario, in input order.
pub fn simulate_batch(params: &[SimulationParams]) -> Vec<Result<SimulationResult, MountError>> {
    params.par_iter().map(simulate).collect()
}
