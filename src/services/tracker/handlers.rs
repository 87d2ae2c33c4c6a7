//! Message handlers for the Tracker
//!
//! Each handler processes one feed message kind, updating tracker state and
//! publishing the resulting output events.

use super::Tracker;
use crate::domain::types::{epoch_ms, LocationSample, PermissionState};
use crate::io::{ActiveZonePayload, AlertPayload, PermissionPayload};
use crate::services::proximity::ActiveZoneChange;
use std::time::Instant;
use tracing::{debug, info, warn};

impl Tracker {
    /// Handle a location fix
    ///
    /// Dropped while permission is not granted; rejected samples leave state
    /// untouched and the next valid fix supersedes them.
    pub(crate) fn handle_location(&mut self, sample: &LocationSample) {
        if !self.permission.allows_samples() {
            self.metrics.record_sample_unauthorized();
            debug!(
                permission = %self.permission.state().as_str(),
                position = %sample.coordinate,
                "sample_ignored_no_permission"
            );
            return;
        }

        let started = Instant::now();
        let result = self.proximity.on_location_update(sample);
        self.metrics.record_sample_processed(started.elapsed().as_micros() as u64);

        let update = match result {
            Ok(update) => update,
            Err(e) => {
                self.metrics.record_sample_rejected();
                warn!(ts = %sample.ts, error = %e, "sample_rejected");
                return;
            }
        };

        if let Some(alert) = update.alert {
            self.metrics.record_alert();
            info!(
                zone = %alert.zone.id,
                label = %alert.zone.label,
                color = %alert.zone.color.as_str(),
                distance_m = %format!("{:.1}", alert.distance_m),
                ts = %sample.ts,
                "zone_alert"
            );

            if let Some(ref sender) = self.egress_sender {
                sender.send_alert(AlertPayload::new(sample.ts, &alert.zone, alert.distance_m));
            }
        }

        if let Some(change) = update.active_zone_changed {
            self.metrics.record_active_zone_change();
            match &change {
                ActiveZoneChange::Set(zone) => {
                    info!(zone = %zone.id, icon = %zone.icon, ts = %sample.ts, "active_zone_changed");
                }
                ActiveZoneChange::Cleared => {
                    info!(ts = %sample.ts, "active_zone_cleared");
                }
            }

            if let Some(ref sender) = self.egress_sender {
                sender.send_active_zone(ActiveZonePayload::new(sample.ts, change.zone()));
            }
        }
    }

    /// Handle a permission transition reported by the host
    ///
    /// Denied or restricted publishes a notice so the host can ask the user.
    pub(crate) fn handle_permission(&mut self, state: PermissionState) {
        if self.permission.transition(state).is_none() {
            return;
        }

        if state.is_blocked() {
            if let Some(ref sender) = self.egress_sender {
                sender.send_permission_required(PermissionPayload {
                    site: None,
                    ts: epoch_ms(),
                    state,
                });
            }
        }
    }
}
