//! Lock-free metrics collection and periodic reporting
//!
//! Uses atomics for hot-path operations so feed readers, the tracker task and
//! the reporter never contend on a mutex. Reporting is the only operation that
//! resets anything (via atomic swap).
//!
//! NOTE: All atomics use Relaxed ordering intentionally. These are statistical
//! counters only and must not be used for coordination or logic decisions.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use tracing::info;

/// Exponential bucket boundaries for sample evaluation latency (microseconds)
/// Buckets: ≤1, ≤2, ≤4, ≤8, ≤16, ≤32, ≤64, ≤128, ≤256, ≤512, >512
const BUCKET_BOUNDS: [u64; 10] = [1, 2, 4, 8, 16, 32, 64, 128, 256, 512];
const NUM_BUCKETS: usize = 11;

/// Compute bucket index for a latency value using binary search
#[inline]
fn bucket_index(latency_us: u64) -> usize {
    BUCKET_BOUNDS.partition_point(|&bound| bound < latency_us)
}

/// Update an atomic max value using compare-and-swap loop
#[inline]
fn update_atomic_max(atomic_max: &AtomicU64, new_value: u64) {
    let mut current_max = atomic_max.load(Ordering::Relaxed);
    while new_value > current_max {
        match atomic_max.compare_exchange_weak(
            current_max,
            new_value,
            Ordering::Relaxed,
            Ordering::Relaxed,
        ) {
            Ok(_) => break,
            Err(actual) => current_max = actual,
        }
    }
}

/// Swap all buckets to zero and return their values
#[inline]
fn swap_buckets(buckets: &[AtomicU64; NUM_BUCKETS]) -> [u64; NUM_BUCKETS] {
    let mut result = [0u64; NUM_BUCKETS];
    for (i, bucket) in buckets.iter().enumerate() {
        result[i] = bucket.swap(0, Ordering::Relaxed);
    }
    result
}

/// Compute percentile from histogram buckets
/// Returns the upper bound of the bucket containing the percentile
fn percentile_from_buckets(buckets: &[u64; NUM_BUCKETS], percentile: f64) -> u64 {
    let total: u64 = buckets.iter().sum();
    if total == 0 {
        return 0;
    }

    let target = (total as f64 * percentile) as u64;
    let mut cumulative = 0u64;

    // Upper bounds for each bucket (last bucket uses 2x the previous bound)
    const BUCKET_UPPER_BOUNDS: [u64; NUM_BUCKETS] = [1, 2, 4, 8, 16, 32, 64, 128, 256, 512, 1024];

    for (i, &count) in buckets.iter().enumerate() {
        cumulative += count;
        if cumulative >= target {
            return BUCKET_UPPER_BOUNDS[i];
        }
    }
    BUCKET_UPPER_BOUNDS[NUM_BUCKETS - 1]
}

/// Lock-free metrics collector
///
/// All recording operations are lock-free using atomics.
/// The `report()` method atomically swaps periodic counters to get a snapshot.
pub struct Metrics {
    /// Samples evaluated by the tracker (monotonic)
    samples_total: AtomicU64,
    /// Samples evaluated since last report (reset on report)
    samples_since_report: AtomicU64,
    /// Sum of evaluation latencies in microseconds (reset on report)
    latency_sum_us: AtomicU64,
    /// Max evaluation latency in microseconds (reset on report)
    latency_max_us: AtomicU64,
    /// Evaluation latency histogram buckets (reset on report)
    latency_buckets: [AtomicU64; NUM_BUCKETS],
    /// Samples rejected as invalid (monotonic)
    samples_rejected: AtomicU64,
    /// Samples dropped because location permission was not granted (monotonic)
    samples_unauthorized: AtomicU64,
    /// Feed lines that failed to parse (monotonic)
    feed_lines_invalid: AtomicU64,
    /// Feed messages dropped because the tracker channel was full (monotonic)
    feed_dropped: AtomicU64,
    /// Egress messages dropped because the sink channel was full (monotonic)
    egress_dropped: AtomicU64,
    /// Zone alerts raised (monotonic)
    alerts_total: AtomicU64,
    /// Active zone transitions, including clears (monotonic)
    active_zone_changes: AtomicU64,
    /// Last report time (only accessed from reporter)
    last_report_time: parking_lot::Mutex<Instant>,
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            samples_total: AtomicU64::new(0),
            samples_since_report: AtomicU64::new(0),
            latency_sum_us: AtomicU64::new(0),
            latency_max_us: AtomicU64::new(0),
            latency_buckets: std::array::from_fn(|_| AtomicU64::new(0)),
            samples_rejected: AtomicU64::new(0),
            samples_unauthorized: AtomicU64::new(0),
            feed_lines_invalid: AtomicU64::new(0),
            feed_dropped: AtomicU64::new(0),
            egress_dropped: AtomicU64::new(0),
            alerts_total: AtomicU64::new(0),
            active_zone_changes: AtomicU64::new(0),
            last_report_time: parking_lot::Mutex::new(Instant::now()),
        }
    }

    /// Record a sample was evaluated with given latency (lock-free)
    #[inline]
    pub fn record_sample_processed(&self, latency_us: u64) {
        self.samples_total.fetch_add(1, Ordering::Relaxed);
        self.samples_since_report.fetch_add(1, Ordering::Relaxed);
        self.latency_sum_us.fetch_add(latency_us, Ordering::Relaxed);

        let bucket = bucket_index(latency_us);
        self.latency_buckets[bucket].fetch_add(1, Ordering::Relaxed);

        update_atomic_max(&self.latency_max_us, latency_us);
    }

    #[inline]
    pub fn record_sample_rejected(&self) {
        self.samples_rejected.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_sample_unauthorized(&self) {
        self.samples_unauthorized.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_feed_line_invalid(&self) {
        self.feed_lines_invalid.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_feed_dropped(&self) {
        self.feed_dropped.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_egress_dropped(&self) {
        self.egress_dropped.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_alert(&self) {
        self.alerts_total.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_active_zone_change(&self) {
        self.active_zone_changes.fetch_add(1, Ordering::Relaxed);
    }

    pub fn samples_total(&self) -> u64 {
        self.samples_total.load(Ordering::Relaxed)
    }

    pub fn samples_rejected(&self) -> u64 {
        self.samples_rejected.load(Ordering::Relaxed)
    }

    pub fn samples_unauthorized(&self) -> u64 {
        self.samples_unauthorized.load(Ordering::Relaxed)
    }

    pub fn feed_lines_invalid(&self) -> u64 {
        self.feed_lines_invalid.load(Ordering::Relaxed)
    }

    pub fn feed_dropped(&self) -> u64 {
        self.feed_dropped.load(Ordering::Relaxed)
    }

    pub fn egress_dropped(&self) -> u64 {
        self.egress_dropped.load(Ordering::Relaxed)
    }

    pub fn alerts_total(&self) -> u64 {
        self.alerts_total.load(Ordering::Relaxed)
    }

    pub fn active_zone_changes(&self) -> u64 {
        self.active_zone_changes.load(Ordering::Relaxed)
    }

    /// Generate a summary and reset periodic counters
    ///
    /// This is the only method that resets counters. It uses atomic swap
    /// to get a consistent snapshot while allowing concurrent updates.
    pub fn report(&self, alerted_zones: usize) -> MetricsSummary {
        let samples_count = self.samples_since_report.swap(0, Ordering::Relaxed);
        let latency_sum = self.latency_sum_us.swap(0, Ordering::Relaxed);
        let max_latency = self.latency_max_us.swap(0, Ordering::Relaxed);
        let lat_buckets = swap_buckets(&self.latency_buckets);

        let elapsed = {
            let mut last = self.last_report_time.lock();
            let elapsed = last.elapsed();
            *last = Instant::now();
            elapsed
        };

        let samples_per_sec = if elapsed.as_secs_f64() > 0.0 {
            samples_count as f64 / elapsed.as_secs_f64()
        } else {
            0.0
        };

        let avg_latency = if samples_count > 0 { latency_sum / samples_count } else { 0 };

        MetricsSummary {
            samples_total: self.samples_total(),
            samples_per_sec,
            avg_latency_us: avg_latency,
            max_latency_us: max_latency,
            lat_buckets,
            lat_p50_us: percentile_from_buckets(&lat_buckets, 0.50),
            lat_p99_us: percentile_from_buckets(&lat_buckets, 0.99),
            samples_rejected: self.samples_rejected(),
            samples_unauthorized: self.samples_unauthorized(),
            feed_lines_invalid: self.feed_lines_invalid(),
            feed_dropped: self.feed_dropped(),
            egress_dropped: self.egress_dropped(),
            alerts_total: self.alerts_total(),
            active_zone_changes: self.active_zone_changes(),
            alerted_zones,
        }
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug)]
pub struct MetricsSummary {
    pub samples_total: u64,
    pub samples_per_sec: f64,
    pub avg_latency_us: u64,
    pub max_latency_us: u64,
    /// Evaluation latency histogram buckets
    /// Bounds: ≤1, ≤2, ≤4, ≤8, ≤16, ≤32, ≤64, ≤128, ≤256, ≤512, >512 µs
    pub lat_buckets: [u64; NUM_BUCKETS],
    pub lat_p50_us: u64,
    pub lat_p99_us: u64,
    pub samples_rejected: u64,
    pub samples_unauthorized: u64,
    pub feed_lines_invalid: u64,
    pub feed_dropped: u64,
    pub egress_dropped: u64,
    pub alerts_total: u64,
    pub active_zone_changes: u64,
    /// Zones currently holding an alert
    pub alerted_zones: usize,
}

impl MetricsSummary {
    pub fn log(&self) {
        info!(
            samples_total = %self.samples_total,
            samples_per_sec = %format!("{:.1}", self.samples_per_sec),
            avg_latency_us = %self.avg_latency_us,
            max_latency_us = %self.max_latency_us,
            p50_us = %self.lat_p50_us,
            p99_us = %self.lat_p99_us,
            rejected = %self.samples_rejected,
            unauthorized = %self.samples_unauthorized,
            feed_invalid = %self.feed_lines_invalid,
            feed_dropped = %self.feed_dropped,
            egress_dropped = %self.egress_dropped,
            alerts = %self.alerts_total,
            active_changes = %self.active_zone_changes,
            alerted_zones = %self.alerted_zones,
            "metrics"
        );
    }
}
