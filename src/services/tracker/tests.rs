//! Tests for the Tracker service

use super::*;
use crate::domain::geo::offset_north;
use crate::domain::types::{Coordinate, LocationSample, ZoneColor, ZoneId};
use crate::infra::config::{ReentryPolicy, ZoneConfig};
use crate::io::{create_egress_channel, EgressMessage};

const CENTER: Coordinate = Coordinate::new(40.90, 31.17);

/// Test harness that keeps the egress receiver alive so `try_send` succeeds
struct TestTracker {
    tracker: Tracker,
    egress_rx: mpsc::Receiver<EgressMessage>,
    metrics: Arc<Metrics>,
}

impl std::ops::Deref for TestTracker {
    type Target = Tracker;
    fn deref(&self) -> &Self::Target {
        &self.tracker
    }
}

impl std::ops::DerefMut for TestTracker {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.tracker
    }
}

impl TestTracker {
    /// Drain everything published so far
    fn published(&mut self) -> Vec<EgressMessage> {
        let mut out = Vec::new();
        while let Ok(message) = self.egress_rx.try_recv() {
            out.push(message);
        }
        out
    }
}

fn test_config(policy: ReentryPolicy) -> Config {
    Config::default().with_radius_m(250.0).with_reentry(policy).with_zones(vec![ZoneConfig {
        lat: CENTER.lat,
        lon: CENTER.lon,
        label: "Fazla Riskli".to_string(),
        color: ZoneColor::Red,
        icon: Some("redIcon".to_string()),
    }])
}

fn create_test_tracker(policy: ReentryPolicy) -> TestTracker {
    let metrics = Arc::new(Metrics::new());
    let (sender, egress_rx) = create_egress_channel(64, "test-site".to_string(), metrics.clone());
    let tracker = Tracker::new(&test_config(policy), metrics.clone(), Some(sender))
        .unwrap()
        .with_permission(PermissionState::Granted);
    TestTracker { tracker, egress_rx, metrics }
}

fn location(meters_north: f64) -> FeedMessage {
    let p = offset_north(CENTER, meters_north);
    FeedMessage::Location(LocationSample::new(p.lat, p.lon, 1_700_000_000_000))
}

#[test]
fn test_entry_publishes_alert_and_active_zone() {
    let mut tracker = create_test_tracker(ReentryPolicy::Once);

    tracker.process_message(location(300.0));
    assert!(tracker.published().is_empty());

    tracker.process_message(location(100.0));
    let published = tracker.published();
    assert_eq!(published.len(), 2);

    match &published[0] {
        EgressMessage::Alert(p) => {
            assert_eq!(p.site.as_deref(), Some("test-site"));
            assert_eq!(p.zone, 0);
            assert_eq!(p.label, "Fazla Riskli");
            assert_eq!(p.color, ZoneColor::Red);
            assert_eq!(p.ts, 1_700_000_000_000);
        }
        other => panic!("expected alert, got {:?}", other),
    }
    match &published[1] {
        EgressMessage::ActiveZone(p) => {
            assert_eq!(p.zone, Some(0));
            assert_eq!(p.icon.as_deref(), Some("redIcon"));
        }
        other => panic!("expected active zone, got {:?}", other),
    }

    assert_eq!(tracker.metrics.alerts_total(), 1);
    assert_eq!(tracker.metrics.active_zone_changes(), 1);
    assert_eq!(tracker.metrics.samples_total(), 2);
}

#[test]
fn test_repeat_sample_publishes_nothing() {
    let mut tracker = create_test_tracker(ReentryPolicy::Once);

    tracker.process_message(location(100.0));
    tracker.published();

    tracker.process_message(location(100.0));
    assert!(tracker.published().is_empty());
    assert_eq!(tracker.metrics.alerts_total(), 1);
}

#[test]
fn test_exit_publishes_cleared_icon() {
    let mut tracker = create_test_tracker(ReentryPolicy::Once);

    tracker.process_message(location(100.0));
    tracker.published();

    tracker.process_message(location(400.0));
    let published = tracker.published();
    assert_eq!(published.len(), 1);
    match &published[0] {
        EgressMessage::ActiveZone(p) => {
            assert!(p.zone.is_none());
            assert!(p.icon.is_none());
        }
        other => panic!("expected active zone, got {:?}", other),
    }

    // Re-entry under the default policy only swaps the icon back
    tracker.process_message(location(50.0));
    let published = tracker.published();
    assert_eq!(published.len(), 1);
    assert!(matches!(published[0], EgressMessage::ActiveZone(_)));
}

#[test]
fn test_rearm_policy_alerts_on_reentry() {
    let mut tracker = create_test_tracker(ReentryPolicy::RearmOnExit);

    tracker.process_message(location(100.0));
    tracker.process_message(location(400.0));
    tracker.process_message(location(100.0));

    let alerts = tracker
        .published()
        .into_iter()
        .filter(|m| matches!(m, EgressMessage::Alert(_)))
        .count();
    assert_eq!(alerts, 2);
}

#[test]
fn test_samples_dropped_until_permission_granted() {
    let metrics = Arc::new(Metrics::new());
    let (sender, mut egress_rx) = create_egress_channel(64, "s".to_string(), metrics.clone());
    let mut tracker =
        Tracker::new(&test_config(ReentryPolicy::Once), metrics.clone(), Some(sender)).unwrap();
    assert_eq!(tracker.permission(), PermissionState::NotDetermined);

    tracker.process_message(location(10.0));
    assert_eq!(metrics.samples_unauthorized(), 1);
    assert_eq!(metrics.samples_total(), 0);
    assert!(!tracker.proximity().has_alerted(ZoneId(0)));

    tracker.process_message(FeedMessage::Permission(PermissionState::Granted));
    tracker.process_message(location(10.0));
    assert!(tracker.proximity().has_alerted(ZoneId(0)));

    let mut kinds = Vec::new();
    while let Ok(m) = egress_rx.try_recv() {
        kinds.push(m.as_str());
    }
    assert_eq!(kinds, ["alert", "active_zone"]);
}

#[test]
fn test_denied_publishes_permission_notice_once() {
    let mut tracker = create_test_tracker(ReentryPolicy::Once);

    tracker.process_message(FeedMessage::Permission(PermissionState::Denied));
    tracker.process_message(FeedMessage::Permission(PermissionState::Denied));

    let published = tracker.published();
    assert_eq!(published.len(), 1);
    match &published[0] {
        EgressMessage::PermissionRequired(p) => {
            assert_eq!(p.state, PermissionState::Denied);
            assert_eq!(p.site.as_deref(), Some("test-site"));
        }
        other => panic!("expected permission notice, got {:?}", other),
    }

    tracker.process_message(location(10.0));
    assert!(tracker.published().is_empty());
    assert_eq!(tracker.metrics.samples_unauthorized(), 1);
}

#[test]
fn test_invalid_sample_counted_and_state_kept() {
    let mut tracker = create_test_tracker(ReentryPolicy::Once);

    tracker.process_message(location(10.0));
    tracker.published();

    tracker.process_message(FeedMessage::Location(LocationSample::new(f64::NAN, 31.0, 0)));
    assert!(tracker.published().is_empty());
    assert_eq!(tracker.metrics.samples_rejected(), 1);
    assert_eq!(tracker.proximity().active_zone().map(|z| z.id), Some(ZoneId(0)));
    assert_eq!(tracker.proximity().alerted_count(), 1);
}

#[test]
fn test_new_rejects_bad_radius() {
    let config = test_config(ReentryPolicy::Once).with_radius_m(0.0);
    assert!(Tracker::new(&config, Arc::new(Metrics::new()), None).is_err());
}

#[test]
fn test_without_egress_sender() {
    let metrics = Arc::new(Metrics::new());
    let mut tracker = Tracker::new(&test_config(ReentryPolicy::Once), metrics.clone(), None)
        .unwrap()
        .with_permission(PermissionState::Granted);

    tracker.process_message(location(10.0));
    assert_eq!(metrics.alerts_total(), 1);
}

#[tokio::test]
async fn test_run_until_feed_closed() {
    let mut tracker = create_test_tracker(ReentryPolicy::Once);
    let (feed_tx, feed_rx) = mpsc::channel(16);

    feed_tx.send(location(300.0)).await.unwrap();
    feed_tx.send(location(100.0)).await.unwrap();
    feed_tx.send(location(100.0)).await.unwrap();
    feed_tx.send(location(400.0)).await.unwrap();
    drop(feed_tx);

    let (_shutdown_tx, shutdown_rx) = watch::channel(false);
    tracker.run(feed_rx, Duration::from_secs(3600), shutdown_rx).await;

    let kinds: Vec<&str> = tracker.published().iter().map(|m| m.as_str()).collect();
    assert_eq!(kinds, ["alert", "active_zone", "active_zone"]);
    assert_eq!(tracker.metrics.samples_total(), 4);
}

#[tokio::test]
async fn test_run_stops_on_shutdown() {
    let mut tracker = create_test_tracker(ReentryPolicy::Once);
    // Sender kept alive: only the shutdown signal can end the loop
    let (_feed_tx, feed_rx) = mpsc::channel::<FeedMessage>(16);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    shutdown_tx.send(true).unwrap();

    tokio::time::timeout(
        Duration::from_secs(5),
        tracker.run(feed_rx, Duration::from_secs(3600), shutdown_rx),
    )
    .await
    .expect("tracker did not stop on shutdown");
}
