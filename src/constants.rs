//! # Constants and type definitions
//!
//! This module centralizes the **physical constants**, **conversion factors**, and **angle/time
//! type aliases** used throughout the crate.
//!
//! ## Overview
//!
//! - Astronomical and geophysical constants
//! - Unit conversions (degrees ↔ radians, arcseconds ↔ radians, days ↔ seconds, AU ↔ km)
//! - Core type aliases used across the crate

// -------------------------------------------------------------------------------------------------
// Physical constants and unit conversions
// -------------------------------------------------------------------------------------------------

/// 2π, useful for trigonometric conversions
pub const DPI: f64 = 2. * std::f64::consts::PI;

/// Number of seconds in a Julian day
pub const SECONDS_PER_DAY: f64 = 86_400.0;

/// Astronomical Unit in kilometers (IAU 2012)
pub const AU: f64 = 149_597_870.7;

/// MJD epoch of J2000.0 (2000-01-01 12:00:00 TT)
pub const T2000: f64 = 51544.5;

/// Days in a Julian century
pub const JULIAN_CENTURY: f64 = 36525.0;

/// Degrees → radians
pub const RADEG: f64 = std::f64::consts::PI / 180.0;

/// Arcseconds → radians
pub const RADSEC: f64 = std::f64::consts::PI / 648000.0;

/// Earth equatorial radius in meters (GRS1980/WGS84)
pub const EARTH_MAJOR_AXIS: f64 = 6_378_137.0;

/// Earth polar radius in meters (GRS1980/WGS84)
pub const EARTH_MINOR_AXIS: f64 = 6_356_752.3;

/// Earth radius expressed in astronomical units
pub const ERAU: f64 = (EARTH_MAJOR_AXIS / 1000.) / AU;

/// Ratio of the sidereal to the solar day (Earth rotation rate in turns per solar day)
pub const SIDEREAL_RATE: f64 = 1.00273790934;

/// Speed of light in km/s
pub const VLIGHT: f64 = 2.99792458e5;

/// Speed of light in astronomical units per day
pub const VLIGHT_AU: f64 = VLIGHT / AU * SECONDS_PER_DAY;

/// Offset between the Celsius and Kelvin scales
pub const ZERO_CELSIUS_K: f64 = 273.15;

/// Largest accepted |UT1 − UTC|, in seconds (UTC is steered to stay within 0.9 s)
pub const MAX_DUT1: f64 = 0.9;

// -------------------------------------------------------------------------------------------------
// Type aliases
// -------------------------------------------------------------------------------------------------

/// Angle in degrees
pub type Degree = f64;
/// Angle in arcseconds
pub type ArcSec = f64;
/// Angle in radians
pub type Radian = f64;
/// Distance in meters
pub type Meter = f64;
/// Pressure in hectopascals
pub type HectoPascal = f64;
/// Temperature in degrees Celsius
pub type Celsius = f64;
/// Wavelength in micrometers
pub type Micron = f64;
/// Modified Julian Date (days)
pub type MJD = f64;
