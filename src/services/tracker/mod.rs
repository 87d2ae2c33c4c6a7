//! Tracker service and event orchestration
//!
//! The Tracker owns the proximity state and is the single consumer of the
//! feed channel. It coordinates:
//! - Permission gating (samples only flow while granted)
//! - Proximity evaluation (alerts and active zone)
//! - Egress of output events and metrics recording

mod handlers;
#[cfg(test)]
mod tests;

use crate::domain::error::ConfigError;
use crate::domain::types::PermissionState;
use crate::infra::config::Config;
use crate::infra::metrics::Metrics;
use crate::io::{EgressSender, FeedMessage};
use crate::services::permission::PermissionGate;
use crate::services::proximity::ProximityTracker;
use crate::services::zone_registry::ZoneRegistry;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::info;

/// Single consumer of location and permission messages
pub struct Tracker {
    /// Alert and active zone state
    pub(crate) proximity: ProximityTracker,
    /// Latest location permission reported by the host
    pub(crate) permission: PermissionGate,
    /// Metrics collector
    pub(crate) metrics: Arc<Metrics>,
    /// Output event sender (optional)
    pub(crate) egress_sender: Option<EgressSender>,
}

impl Tracker {
    /// Create a new Tracker from configuration
    ///
    /// Fails if the configured zones can never be evaluated.
    pub fn new(
        config: &Config,
        metrics: Arc<Metrics>,
        egress_sender: Option<EgressSender>,
    ) -> Result<Self, ConfigError> {
        let registry = ZoneRegistry::from_config(config)?;
        Ok(Self {
            proximity: ProximityTracker::new(registry, config.reentry()),
            permission: PermissionGate::default(),
            metrics,
            egress_sender,
        })
    }

    /// Start with a known permission state instead of waiting for the host
    pub fn with_permission(mut self, state: PermissionState) -> Self {
        self.permission = PermissionGate::new(state);
        self
    }

    /// Start the tracker, consuming messages until every feed sender is dropped
    /// or shutdown is signalled
    pub async fn run(
        &mut self,
        mut feed_rx: mpsc::Receiver<FeedMessage>,
        report_every: Duration,
        mut shutdown: watch::Receiver<bool>,
    ) {
        let mut report_interval = interval(report_every);
        report_interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // First tick completes immediately
        report_interval.tick().await;

        loop {
            tokio::select! {
                message = feed_rx.recv() => {
                    match message {
                        Some(m) => self.process_message(m),
                        None => break, // Channel closed
                    }
                }
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        info!("tracker_shutdown");
                        break;
                    }
                }
                _ = report_interval.tick() => {
                    self.metrics.report(self.proximity.alerted_count()).log();
                }
            }
        }

        info!(alerted_zones = %self.proximity.alerted_count(), "tracker_stopped");
    }

    /// Process a single message, dispatching to the appropriate handler
    pub fn process_message(&mut self, message: FeedMessage) {
        match message {
            FeedMessage::Location(sample) => self.handle_location(&sample),
            FeedMessage::Permission(state) => self.handle_permission(state),
        }
    }

    pub fn proximity(&self) -> &ProximityTracker {
        &self.proximity
    }

    pub fn permission(&self) -> PermissionState {
        self.permission.state()
    }
}
