//! Typed errors for the tracking core

use thiserror::Error;

/// Rejection of a single location sample
///
/// Rejected samples never touch tracker state; the next valid fix supersedes them.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SampleError {
    #[error("invalid sample: lat={lat}, lon={lon}")]
    InvalidSample { lat: f64, lon: f64 },
}

/// Zone setup that can never be evaluated correctly
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("zone radius must be a positive finite number of meters, got {0}")]
    InvalidRadius(f64),

    #[error("zone {index} ({label}) has an invalid center: lat={lat}, lon={lon}")]
    InvalidZoneCenter { index: usize, label: String, lat: f64, lon: f64 },

    #[error("zone index {0} does not fit in a zone id")]
    TooManyZones(usize),
}
