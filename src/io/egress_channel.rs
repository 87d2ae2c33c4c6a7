//! Typed channel for tracker output events
//!
//! Provides a non-blocking way for the tracker to hand alerts and
//! active-zone changes to sinks. Uses a bounded mpsc channel to prevent
//! unbounded memory growth; a full channel drops the message and counts it.

use crate::domain::types::{PermissionState, Zone, ZoneColor};
use crate::infra::metrics::Metrics;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::warn;
use uuid::Uuid;

/// Messages that can be sent to the event sinks
///
/// Serialized as one JSON object per line, discriminated by `t`.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "t", rename_all = "snake_case")]
pub enum EgressMessage {
    /// First entry into a zone; drives the alert modal
    Alert(AlertPayload),
    /// Status icon swap or clear
    ActiveZone(ActiveZonePayload),
    /// Location permission was denied or restricted
    PermissionRequired(PermissionPayload),
}

impl EgressMessage {
    pub fn as_str(&self) -> &'static str {
        match self {
            EgressMessage::Alert(_) => "alert",
            EgressMessage::ActiveZone(_) => "active_zone",
            EgressMessage::PermissionRequired(_) => "permission_required",
        }
    }
}

/// Payload for zone alerts
#[derive(Debug, Clone, Serialize)]
pub struct AlertPayload {
    /// Site identifier
    #[serde(skip_serializing_if = "Option::is_none")]
    pub site: Option<String>,
    /// Timestamp of the triggering sample (epoch ms)
    pub ts: u64,
    /// Alert ID (UUIDv7, time-sortable)
    pub aid: String,
    /// Zone ID (declaration index)
    pub zone: u32,
    /// Risk tier label
    pub label: String,
    /// Alert styling color
    pub color: ZoneColor,
    pub icon: String,
    /// Distance from the zone center when the alert fired
    pub distance_m: f64,
}

impl AlertPayload {
    pub fn new(ts: u64, zone: &Zone, distance_m: f64) -> Self {
        Self {
            site: None,
            ts,
            aid: Uuid::now_v7().to_string(),
            zone: zone.id.0,
            label: zone.label.clone(),
            color: zone.color,
            icon: zone.icon.clone(),
            distance_m,
        }
    }
}

/// Payload for active zone changes; `zone` and `icon` absent when cleared
#[derive(Debug, Clone, Serialize)]
pub struct ActiveZonePayload {
    /// Site identifier
    #[serde(skip_serializing_if = "Option::is_none")]
    pub site: Option<String>,
    /// Timestamp of the triggering sample (epoch ms)
    pub ts: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zone: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

impl ActiveZonePayload {
    pub fn new(ts: u64, zone: Option<&Zone>) -> Self {
        Self {
            site: None,
            ts,
            zone: zone.map(|z| z.id.0),
            icon: zone.map(|z| z.icon.clone()),
        }
    }
}

/// Payload for permission notices
#[derive(Debug, Clone, Serialize)]
pub struct PermissionPayload {
    /// Site identifier
    #[serde(skip_serializing_if = "Option::is_none")]
    pub site: Option<String>,
    /// Timestamp (epoch ms)
    pub ts: u64,
    pub state: PermissionState,
}

/// Sender handle for egress messages
///
/// Clone this to share across multiple producers.
/// Non-blocking - if the channel is full, messages are dropped.
#[derive(Clone)]
pub struct EgressSender {
    tx: mpsc::Sender<EgressMessage>,
    site_id: String,
    metrics: Arc<Metrics>,
}

impl EgressSender {
    /// Create a new sender from an mpsc sender
    pub fn new(tx: mpsc::Sender<EgressMessage>, site_id: String, metrics: Arc<Metrics>) -> Self {
        Self { tx, site_id, metrics }
    }

    /// Send a zone alert
    /// Injects site_id into the payload
    pub fn send_alert(&self, mut payload: AlertPayload) {
        payload.site = Some(self.site_id.clone());
        self.send(EgressMessage::Alert(payload));
    }

    /// Send an active zone change
    /// Injects site_id into the payload
    pub fn send_active_zone(&self, mut payload: ActiveZonePayload) {
        payload.site = Some(self.site_id.clone());
        self.send(EgressMessage::ActiveZone(payload));
    }

    /// Send a permission notice
    /// Injects site_id into the payload
    pub fn send_permission_required(&self, mut payload: PermissionPayload) {
        payload.site = Some(self.site_id.clone());
        self.send(EgressMessage::PermissionRequired(payload));
    }

    fn send(&self, message: EgressMessage) {
        // Use try_send to avoid blocking the tracker - drop if channel full
        match self.tx.try_send(message) {
            Ok(()) => {}
            Err(TrySendError::Full(message)) => {
                self.metrics.record_egress_dropped();
                warn!(t = %message.as_str(), "egress_dropped: channel full");
            }
            Err(TrySendError::Closed(_)) => {}
        }
    }
}

/// Create a new egress channel pair
///
/// Returns (sender, receiver) where sender can be cloned and shared.
/// Buffer size determines how many messages can be queued.
/// site_id is included in every payload for downstream consumers.
pub fn create_egress_channel(
    buffer_size: usize,
    site_id: String,
    metrics: Arc<Metrics>,
) -> (EgressSender, mpsc::Receiver<EgressMessage>) {
    let (tx, rx) = mpsc::channel(buffer_size);
    (EgressSender::new(tx, site_id, metrics), rx)
}
