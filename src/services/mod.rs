//! Services - business logic and state management
//!
//! This module contains the core business logic services:
//! - `zone_registry` - Immutable ordered zone list
//! - `proximity` - Alert-once and active zone evaluation
//! - `permission` - Location permission gate
//! - `tracker` - Feed consumer wiring the above to egress and metrics

pub mod permission;
pub mod proximity;
pub mod tracker;
pub mod zone_registry;

// Re-export commonly used types
pub use permission::PermissionGate;
pub use proximity::{ActiveZoneChange, LocationUpdate, ProximityTracker, ZoneAlert};
pub use tracker::Tracker;
pub use zone_registry::ZoneRegistry;
