//! Shared types for the risk zone tracker

use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// Get current epoch milliseconds
#[inline]
pub fn epoch_ms() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis() as u64
}

/// Newtype wrapper for zone IDs to provide type safety
///
/// Assigned from the zone's declaration index, so two zones sharing a center
/// are still distinct.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct ZoneId(pub u32);

impl std::fmt::Display for ZoneId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// WGS84 position in degrees
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinate {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinate {
    #[inline]
    pub const fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Finite and inside [-90, 90] x [-180, 180]
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lon.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lon)
    }
}

impl std::fmt::Display for Coordinate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.6},{:.6}", self.lat, self.lon)
    }
}

/// Alert styling color of a zone
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ZoneColor {
    Red,
    Yellow,
    Green,
    Blue,
}

impl ZoneColor {
    pub fn as_str(&self) -> &'static str {
        match self {
            ZoneColor::Red => "red",
            ZoneColor::Yellow => "yellow",
            ZoneColor::Green => "green",
            ZoneColor::Blue => "blue",
        }
    }
}

/// Circular risk zone
#[derive(Debug, Clone, PartialEq)]
pub struct Zone {
    pub id: ZoneId,
    pub center: Coordinate,
    /// Risk tier, e.g. "Fazla Riskli"
    pub label: String,
    pub color: ZoneColor,
    /// Status icon shown while inside the zone
    pub icon: String,
    pub radius_m: f64,
}

impl Zone {
    /// Strictly inside the radius; a fix exactly on the boundary does not count
    #[inline]
    pub fn contains_distance(&self, distance_m: f64) -> bool {
        distance_m < self.radius_m
    }
}

/// One fix from the location provider
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocationSample {
    pub coordinate: Coordinate,
    /// Provider timestamp (epoch ms); ordering comes from the stream
    pub ts: u64,
}

impl LocationSample {
    pub fn new(lat: f64, lon: f64, ts: u64) -> Self {
        Self { coordinate: Coordinate::new(lat, lon), ts }
    }

    /// Sample stamped with the current wall clock
    pub fn now(lat: f64, lon: f64) -> Self {
        Self::new(lat, lon, epoch_ms())
    }
}

/// Location authorization reported by the host platform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermissionState {
    #[default]
    NotDetermined,
    Granted,
    Denied,
    Restricted,
}

impl std::str::FromStr for PermissionState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "not_determined" => PermissionState::NotDetermined,
            "granted" => PermissionState::Granted,
            "denied" => PermissionState::Denied,
            "restricted" => PermissionState::Restricted,
            other => return Err(format!("unknown permission state: {}", other)),
        })
    }
}

impl PermissionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            PermissionState::NotDetermined => "not_determined",
            PermissionState::Granted => "granted",
            PermissionState::Denied => "denied",
            PermissionState::Restricted => "restricted",
        }
    }

    /// Denied or restricted; the user has to act before samples flow
    pub fn is_blocked(&self) -> bool {
        matches!(self, PermissionState::Denied | PermissionState::Restricted)
    }
}
