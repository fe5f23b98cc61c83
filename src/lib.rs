//! Forward simulation of an equatorial mount slewing about a misaligned polar axis.
//!
//! Given the offsets of the mount axis from the celestial pole, a rotation step and a
//! first pointing, [`simulation::simulate`] rotates the pointing twice about the
//! misaligned axis and reports the three directions as J2000 right ascension and
//! declination, optionally removing atmospheric refraction first.
pub mod atmosphere;
pub mod celestial;
pub mod config;
pub mod constants;
pub mod earth_orientation;
pub mod horizontal;
pub mod location;
pub mod mount;
pub mod mount_errors;
pub mod ref_system;
pub mod simulation;
pub mod time;
