//! Location feed input
//!
//! Protocol: one JSON object per line.
//! - `{"type":"location","lat":40.9,"lon":31.17,"ts":1700000000000}` (`ts` optional)
//! - `{"type":"permission","state":"granted"}`
//!
//! Blank lines and lines starting with `#` are skipped. Lines come from a
//! file, stdin, or TCP connections.

use crate::domain::types::{LocationSample, PermissionState};
use crate::infra::metrics::Metrics;
use anyhow::Context;
use serde::Deserialize;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::net::TcpListener;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info, warn};

/// Message delivered to the tracker
#[derive(Debug, Clone, PartialEq)]
pub enum FeedMessage {
    Location(LocationSample),
    Permission(PermissionState),
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum FeedLine {
    Location {
        lat: f64,
        lon: f64,
        #[serde(default)]
        ts: Option<u64>,
    },
    Permission {
        state: PermissionState,
    },
}

/// Parse one feed line
///
/// Returns `Ok(None)` for blank lines and comments. Coordinates are not
/// range-checked here; the tracker rejects invalid samples itself.
pub fn parse_feed_line(line: &str) -> Result<Option<FeedMessage>, serde_json::Error> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }

    let message = match serde_json::from_str::<FeedLine>(line)? {
        FeedLine::Location { lat, lon, ts: Some(ts) } => {
            FeedMessage::Location(LocationSample::new(lat, lon, ts))
        }
        FeedLine::Location { lat, lon, ts: None } => {
            FeedMessage::Location(LocationSample::now(lat, lon))
        }
        FeedLine::Permission { state } => FeedMessage::Permission(state),
    };
    Ok(Some(message))
}

/// Replay source for `read_feed`
pub type FeedInput = Box<dyn AsyncBufRead + Unpin + Send>;

/// Open a replay source: `-` is stdin, anything else a file path
///
/// Fails up front when the file cannot be opened, so a bad path is never
/// mistaken for an empty feed.
pub async fn open_feed_input(input: &str) -> anyhow::Result<FeedInput> {
    if input == "-" {
        return Ok(Box::new(BufReader::new(tokio::io::stdin())));
    }
    let file = tokio::fs::File::open(input)
        .await
        .with_context(|| format!("Failed to open feed input {}", input))?;
    Ok(Box::new(BufReader::new(file)))
}

/// Read feed lines from a buffered reader until EOF or shutdown
///
/// Replays must not lose samples, so this applies backpressure with
/// `send().await` instead of dropping. Returns the number of messages forwarded.
pub async fn read_feed<R>(
    reader: R,
    source: &str,
    feed_tx: mpsc::Sender<FeedMessage>,
    metrics: Arc<Metrics>,
    mut shutdown: watch::Receiver<bool>,
) -> std::io::Result<usize>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    let mut forwarded = 0;

    info!(source = %source, "feed_reader_started");

    loop {
        tokio::select! {
            _ = shutdown.changed() => {
                if *shutdown.borrow() {
                    info!(source = %source, "feed_reader_shutdown");
                    break;
                }
            }
            line = lines.next_line() => {
                let Some(line) = line? else {
                    break;
                };
                match parse_feed_line(&line) {
                    Ok(Some(message)) => {
                        if feed_tx.send(message).await.is_err() {
                            warn!(source = %source, "feed_channel_closed");
                            break;
                        }
                        forwarded += 1;
                    }
                    Ok(None) => {}
                    Err(e) => {
                        metrics.record_feed_line_invalid();
                        warn!(source = %source, line = %line.trim(), error = %e, "feed_line_invalid");
                    }
                }
            }
        }
    }

    info!(source = %source, forwarded = %forwarded, "feed_reader_finished");
    Ok(forwarded)
}

/// Bind the TCP feed listener on all interfaces
pub async fn bind_tcp_feed(port: u16) -> anyhow::Result<TcpListener> {
    let addr = format!("0.0.0.0:{}", port);
    TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind feed listener on {}", addr))
}

/// Serve the TCP feed on an already bound listener until shutdown
///
/// Each connection streams feed lines. Live sources must never stall the
/// tracker, so messages go through `try_send` and drops are counted in metrics.
pub async fn start_tcp_feed(
    listener: TcpListener,
    feed_tx: mpsc::Sender<FeedMessage>,
    metrics: Arc<Metrics>,
    mut shutdown: watch::Receiver<bool>,
) {
    match listener.local_addr() {
        Ok(addr) => info!(addr = %addr, "feed_listener_started"),
        Err(e) => warn!(error = %e, "feed_listener_started"),
    }

    loop {
        tokio::select! {
            _ = shutdown.changed() => {
                if *shutdown.borrow() {
                    info!("feed_listener_shutdown");
                    return;
                }
            }
            result = listener.accept() => {
                match result {
                    Ok((socket, addr)) => {
                        let tx = feed_tx.clone();
                        let m = metrics.clone();
                        tokio::spawn(async move {
                            handle_feed_connection(socket, addr, tx, m).await;
                        });
                    }
                    Err(e) => {
                        error!(error = %e, "feed_listener_accept_failed");
                    }
                }
            }
        }
    }
}

async fn handle_feed_connection(
    socket: tokio::net::TcpStream,
    addr: SocketAddr,
    feed_tx: mpsc::Sender<FeedMessage>,
    metrics: Arc<Metrics>,
) {
    let peer = addr.to_string();
    debug!(peer = %peer, "feed_connection_accepted");

    let mut lines = BufReader::new(socket).lines();

    // Rate-limit drop warnings to 1 per second
    let mut last_drop_warn = Instant::now() - Duration::from_secs(2);

    while let Ok(Some(line)) = lines.next_line().await {
        let message = match parse_feed_line(&line) {
            Ok(Some(message)) => message,
            Ok(None) => continue,
            Err(e) => {
                metrics.record_feed_line_invalid();
                warn!(peer = %peer, error = %e, "feed_line_invalid");
                continue;
            }
        };

        match feed_tx.try_send(message) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                metrics.record_feed_dropped();
                if last_drop_warn.elapsed() > Duration::from_secs(1) {
                    warn!(peer = %peer, "feed_message_dropped: channel full");
                    last_drop_warn = Instant::now();
                }
            }
            Err(TrySendError::Closed(_)) => {
                warn!(peer = %peer, "feed_channel_closed");
                break;
            }
        }
    }

    debug!(peer = %peer, "feed_connection_closed");
}
