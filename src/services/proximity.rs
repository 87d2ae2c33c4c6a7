//! Proximity evaluation against the zone registry
//!
//! Each location sample runs two independent passes in registry order:
//! - alert pass: the first zone containing the fix that has not alerted yet
//!   alerts, at most one per sample
//! - active pass: the first zone containing the fix becomes the active zone
//!   for the status icon, regardless of alert history
//!
//! Pure computation: no I/O, no clocks, no rendering state.

use crate::domain::error::SampleError;
use crate::domain::geo::haversine_m;
use crate::domain::types::{LocationSample, Zone, ZoneId};
use crate::infra::config::ReentryPolicy;
use crate::services::zone_registry::ZoneRegistry;
use rustc_hash::FxHashSet;
use tracing::debug;

/// Zone entered for the first time (under the current policy)
#[derive(Debug, Clone, PartialEq)]
pub struct ZoneAlert {
    pub zone: Zone,
    pub distance_m: f64,
}

/// New value of the active zone
#[derive(Debug, Clone, PartialEq)]
pub enum ActiveZoneChange {
    Set(Zone),
    Cleared,
}

impl ActiveZoneChange {
    pub fn zone(&self) -> Option<&Zone> {
        match self {
            ActiveZoneChange::Set(zone) => Some(zone),
            ActiveZoneChange::Cleared => None,
        }
    }
}

/// Outcome of one location sample
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LocationUpdate {
    pub alert: Option<ZoneAlert>,
    /// Present only when the active zone differs from the previous sample's
    pub active_zone_changed: Option<ActiveZoneChange>,
}

impl LocationUpdate {
    pub fn is_empty(&self) -> bool {
        self.alert.is_none() && self.active_zone_changed.is_none()
    }
}

/// Geofence state machine over a fixed registry
#[derive(Debug)]
pub struct ProximityTracker {
    registry: ZoneRegistry,
    policy: ReentryPolicy,
    /// Zones that already alerted
    alerted: FxHashSet<ZoneId>,
    /// Zone currently shown as the status icon
    active_zone: Option<ZoneId>,
}

impl ProximityTracker {
    pub fn new(registry: ZoneRegistry, policy: ReentryPolicy) -> Self {
        Self { registry, policy, alerted: FxHashSet::default(), active_zone: None }
    }

    /// Evaluate one sample
    ///
    /// Invalid coordinates are rejected before any state is touched.
    pub fn on_location_update(
        &mut self,
        sample: &LocationSample,
    ) -> Result<LocationUpdate, SampleError> {
        let position = sample.coordinate;
        if !position.is_valid() {
            return Err(SampleError::InvalidSample { lat: position.lat, lon: position.lon });
        }

        let mut alert: Option<ZoneAlert> = None;
        let mut active: Option<&Zone> = None;

        for zone in self.registry.zones() {
            let distance_m = haversine_m(position, zone.center);

            if !zone.contains_distance(distance_m) {
                if self.policy == ReentryPolicy::RearmOnExit && self.alerted.remove(&zone.id) {
                    debug!(zone = %zone.id, label = %zone.label, "zone_alert_rearmed");
                }
                continue;
            }

            if active.is_none() {
                active = Some(zone);
            }

            if alert.is_none() && self.alerted.insert(zone.id) {
                alert = Some(ZoneAlert { zone: zone.clone(), distance_m });
            }
        }

        let active_id = active.map(|z| z.id);
        let active_zone_changed = if active_id != self.active_zone {
            self.active_zone = active_id;
            Some(match active {
                Some(zone) => ActiveZoneChange::Set(zone.clone()),
                None => ActiveZoneChange::Cleared,
            })
        } else {
            None
        };

        Ok(LocationUpdate { alert, active_zone_changed })
    }

    pub fn active_zone(&self) -> Option<&Zone> {
        self.active_zone.and_then(|id| self.registry.get(id))
    }

    pub fn has_alerted(&self, id: ZoneId) -> bool {
        self.alerted.contains(&id)
    }

    pub fn alerted_count(&self) -> usize {
        self.alerted.len()
    }

    pub fn policy(&self) -> ReentryPolicy {
        self.policy
    }

    pub fn registry(&self) -> &ZoneRegistry {
        &self.registry
    }
}
