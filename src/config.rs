//! # Scenario files
//!
//! A scenario is a flat JSON object. Every field is optional and falls back to the
//! reference scenario of [`SimulationParams::default`]:
//!
//! ```json
//! {
//!     "latitude": 40.0,
//!     "longitude": 0.0,
//!     "height": 0.0,
//!     "misalignment_azimuth": 1.0,
//!     "misalignment_altitude": 1.0,
//!     "step": 30.0,
//!     "initial_altitude": 20.0,
//!     "initial_azimuth": 70.0,
//!     "time": "2000-01-01T00:00:00",
//!     "dut1": 0.0,
//!     "temperature": 7.0,
//!     "pressure": 1005.0,
//!     "humidity": 0.8,
//!     "wavelength": 0.574,
//!     "refraction": true
//! }
//! ```
//!
//! Unknown keys are rejected, so that a misspelled field is not silently replaced by
//! its default value.
use std::fs;
use std::path::Path;

use log::debug;
use serde::de::Error as _;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::constants::{Celsius, Degree, HectoPascal, Meter, Micron};
use crate::mount_errors::MountError;
use crate::simulation::SimulationParams;
use crate::time::parse_utc;

/// Serialized form of a [`SimulationParams`].
///
/// Angles are in degrees, the time is an ISO 8601 string read as UTC unless it carries a
/// time scale suffix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScenarioConfig {
    pub latitude: Degree,
    pub longitude: Degree,
    pub height: Meter,
    pub misalignment_azimuth: Degree,
    pub misalignment_altitude: Degree,
    pub step: Degree,
    pub initial_altitude: Degree,
    pub initial_azimuth: Degree,
    pub time: String,
    pub dut1: f64,
    pub temperature: Celsius,
    pub pressure: HectoPascal,
    pub humidity: f64,
    pub wavelength: Micron,
    pub refraction: bool,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        let params = SimulationParams::default();
        ScenarioConfig {
            latitude: params.latitude,
            longitude: params.longitude,
            height: params.height,
            misalignment_azimuth: params.misalignment.azimuth,
            misalignment_altitude: params.misalignment.altitude,
            step: params.step,
            initial_altitude: params.initial_altitude,
            initial_azimuth: params.initial_azimuth,
            time: "2000-01-01T00:00:00".to_string(),
            dut1: params.dut1,
            temperature: params.temperature,
            pressure: params.pressure,
            humidity: params.humidity,
            wavelength: params.wavelength,
            refraction: params.refraction,
        }
    }
}

impl ScenarioConfig {
    /// Parse a scenario from JSON text.
    ///
    /// Only a JSON object is accepted: arrays are rejected even though serde would map
    /// them onto the fields by position.
    pub fn from_json_str(json: &str) -> Result<Self, MountError> {
        match serde_json::from_str::<Value>(json)? {
            object @ Value::Object(_) => Ok(serde_json::from_value(object)?),
            other => Err(MountError::ScenarioParseError(serde_json::Error::custom(
                format!("a scenario must be a JSON object, got {other}"),
            ))),
        }
    }

    /// Read a scenario from a JSON file.
    ///
    /// Errors
    /// ------
    /// * [`MountError::IoError`] if the file cannot be read.
    /// * [`MountError::ScenarioParseError`] if it is not a valid scenario.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, MountError> {
        let path = path.as_ref();
        debug!("Reading scenario from {}", path.display());
        let content = fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    /// Validate the scenario and turn it into simulation inputs.
    pub fn into_params(self) -> Result<SimulationParams, MountError> {
        SimulationParams::builder()
            .latitude(self.latitude)
            .longitude(self.longitude)
            .height(self.height)
            .misalignment(self.misalignment_azimuth, self.misalignment_altitude)
            .step(self.step)
            .initial_point(self.initial_altitude, self.initial_azimuth)
            .epoch(parse_utc(&self.time)?)
            .dut1(self.dut1)
            .temperature(self.temperature)
            .pressure(self.pressure)
            .humidity(self.humidity)
            .wavelength(self.wavelength)
            .refraction(self.refraction)
            .build()
    }
}

impl TryFrom<ScenarioConfig> for SimulationParams {
    type Error = MountError;

    fn try_from(config: ScenarioConfig) -> Result<Self, Self::Error> {
        config.into_params()
    }
}
