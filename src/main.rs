//! Risk zone tracker - headless host for the geofence core
//!
//! Reads location fixes and permission transitions from a line feed, raises
//! one alert per risk zone entry and tracks the active zone icon.
//!
//! Module structure:
//! - `domain/` - Core types (Coordinate, Zone, LocationSample)
//! - `io/` - External interfaces (feed input, event egress)
//! - `services/` - Business logic (ZoneRegistry, ProximityTracker, Tracker)
//! - `infra/` - Infrastructure (Config, Metrics)

use clap::Parser;
use riskzone_tracker::infra::{Config, Metrics};
use riskzone_tracker::io::{
    bind_tcp_feed, create_egress_channel, open_feed_input, read_feed, start_tcp_feed, Egress,
};
use riskzone_tracker::services::Tracker;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tracing::{error, info};
use tracing_subscriber::fmt::time::UtcTime;
use tracing_subscriber::EnvFilter;

/// Risk zone tracker - alerts when a live position enters a risk zone
#[derive(Parser, Debug)]
#[command(name = "riskzone-tracker", version, about)]
struct Args {
    /// Path to TOML configuration file (falls back to CONFIG_FILE, then config/dev.toml)
    #[arg(short, long)]
    config: Option<String>,

    /// Feed file to replay ("-" reads stdin)
    #[arg(short, long, default_value = "-")]
    input: String,

    /// Treat location permission as granted from the start
    #[arg(long)]
    assume_granted: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize structured logging with configurable level via RUST_LOG env var
    // Default: INFO, use RUST_LOG=debug for per-sample visibility
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_timer(UtcTime::rfc_3339())
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    info!(git_hash = %env!("GIT_HASH"), "riskzone-tracker starting");

    let args = Args::parse();
    let config_path = args.config.clone().unwrap_or_else(Config::resolve_config_path);
    let config = Config::load_from_path(&config_path);

    info!(
        config_file = %config.config_file(),
        site = %config.site_id(),
        zones = %config.zones().len(),
        radius_m = %config.radius_m(),
        reentry = %config.reentry().as_str(),
        feed_tcp_port = %config.feed_tcp_port(),
        egress_file = %config.egress_file(),
        "config_loaded"
    );

    // Open every input before spawning anything so a bad path or busy port
    // exits non-zero
    let input = open_feed_input(&args.input).await?;
    let tcp_listener = match config.feed_tcp_port() {
        0 => None,
        port => Some(bind_tcp_feed(port).await?),
    };

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let metrics = Arc::new(Metrics::new());

    // Egress sink: drains until the tracker drops its sender
    let (egress_sender, egress_rx) = create_egress_channel(
        config.egress_channel_capacity(),
        config.site_id().to_string(),
        metrics.clone(),
    );
    let egress = Egress::new(config.egress_file());
    let egress_handle = tokio::spawn(egress.run(egress_rx));

    let mut tracker = Tracker::new(&config, metrics.clone(), Some(egress_sender))?;
    if args.assume_granted {
        tracker = tracker.with_permission(riskzone_tracker::domain::PermissionState::Granted);
    }

    // Feed channel (bounded for backpressure)
    let (feed_tx, feed_rx) = mpsc::channel(config.feed_channel_capacity());

    // File or stdin replay
    let reader_tx = feed_tx.clone();
    let reader_metrics = metrics.clone();
    let reader_shutdown = shutdown_rx.clone();
    let source = args.input.clone();
    tokio::spawn(async move {
        if let Err(e) = read_feed(input, &source, reader_tx, reader_metrics, reader_shutdown).await
        {
            error!(input = %source, error = %e, "feed_reader_error");
        }
    });

    // Live TCP feed (if port > 0)
    if let Some(listener) = tcp_listener {
        tokio::spawn(start_tcp_feed(listener, feed_tx.clone(), metrics.clone(), shutdown_rx.clone()));
    }

    // Only the spawned producers hold senders now
    drop(feed_tx);

    // Handle shutdown on Ctrl+C
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("shutdown_signal_received");
        let _ = shutdown_tx.send(true);
    });

    info!("tracker_started");
    let report_every = std::time::Duration::from_secs(config.metrics_interval_secs().max(1));
    tracker.run(feed_rx, report_every, shutdown_rx).await;

    metrics.report(tracker.proximity().alerted_count()).log();

    // Dropping the tracker closes the egress channel
    drop(tracker);
    if let Ok(written) = egress_handle.await {
        info!(written = %written, "egress_flushed");
    }

    info!("riskzone-tracker shutdown complete");
    Ok(())
}
