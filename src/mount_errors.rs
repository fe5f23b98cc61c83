use thiserror::Error;

#[derive(Error, Debug)]
pub enum MountError {
    #[error("Latitude must lie in [-90, 90] degrees, got {0}")]
    InvalidLatitude(f64),

    #[error("Relative humidity must lie in [0, 1], got {0}")]
    InvalidHumidity(f64),

    #[error("Invalid atmosphere parameter: {0}")]
    InvalidAtmosphere(String),

    #[error("Rotation axis has zero (or non-finite) length; the rotation is undefined")]
    ZeroLengthAxis,

    #[error("Non-finite value for {0}")]
    NonFiniteValue(&'static str),

    #[error("Invalid simulation parameter: {0}")]
    InvalidSimulationParameter(String),

    #[error("Invalid observation epoch: {0}")]
    InvalidEpoch(String),

    #[error("Unable to read scenario file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Unable to parse scenario description: {0}")]
    ScenarioParseError(#[from] serde_json::Error),
}

impl MountError {
    /// Reject NaN and infinities, naming the offending input.
    pub(crate) fn ensure_finite(value: f64, name: &'static str) -> Result<f64, MountError> {
        if value.is_finite() {
            Ok(value)
        } else {
            Err(MountError::NonFiniteValue(name))
        }
    }
}

impl PartialEq for MountError {
    fn eq(&self, other: &Self) -> bool {
        use MountError::*;
        match (self, other) {
            (InvalidLatitude(a), InvalidLatitude(b)) => a == b,
            (InvalidHumidity(a), InvalidHumidity(b)) => a == b,
            (InvalidAtmosphere(a), InvalidAtmosphere(b)) => a == b,
            (NonFiniteValue(a), NonFiniteValue(b)) => a == b,
            (InvalidSimulationParameter(a), InvalidSimulationParameter(b)) => a == b,
            (InvalidEpoch(a), InvalidEpoch(b)) => a == b,

            // Wrapped errors are not comparable: same variant is enough
            (IoError(_), IoError(_)) => true,
            (ScenarioParseError(_), ScenarioParseError(_)) => true,

            (ZeroLengthAxis, ZeroLengthAxis) => true,

            _ => false,
        }
    }
}
