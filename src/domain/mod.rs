//! Domain models - core geofence types
//!
//! This module contains the canonical data types used throughout the system:
//! - `Coordinate` - a WGS84 latitude/longitude pair
//! - `Zone` - a circular risk zone with label, color and icon
//! - `LocationSample` - one fix from the location provider
//! - `geo` - great-circle distance
//! - `error` - typed errors for rejected samples and bad zone setup

pub mod error;
pub mod geo;
pub mod types;

pub use error::{ConfigError, SampleError};
pub use types::{Coordinate, LocationSample, PermissionState, Zone, ZoneColor, ZoneId};
