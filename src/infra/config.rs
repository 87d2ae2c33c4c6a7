//! Configuration loading from TOML files
//!
//! Config file is selected via:
//! 1. --config <path> command line argument (parsed by the binary)
//! 2. CONFIG_FILE environment variable
//! 3. Default: config/dev.toml

use crate::domain::types::ZoneColor;
use anyhow::Context;
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::Path;

const DEFAULT_CONFIG_PATH: &str = "config/dev.toml";

/// What happens when a fix re-enters a zone that already alerted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReentryPolicy {
    /// Alert once per zone for the lifetime of the process
    #[default]
    Once,
    /// Leaving a zone re-arms its alert
    RearmOnExit,
}

impl ReentryPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReentryPolicy::Once => "once",
            ReentryPolicy::RearmOnExit => "rearm_on_exit",
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TrackerConfig {
    /// Radius applied to every zone (meters)
    #[serde(default = "default_radius_m")]
    pub radius_m: f64,
    #[serde(default)]
    pub reentry: ReentryPolicy,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self { radius_m: default_radius_m(), reentry: ReentryPolicy::default() }
    }
}

fn default_radius_m() -> f64 {
    250.0
}

/// One `[[zones]]` entry
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ZoneConfig {
    pub lat: f64,
    pub lon: f64,
    pub label: String,
    pub color: ZoneColor,
    /// Status icon identifier; defaults to the label
    #[serde(default)]
    pub icon: Option<String>,
}

impl ZoneConfig {
    fn new(lat: f64, lon: f64, label: &str, color: ZoneColor) -> Self {
        Self { lat, lon, label: label.to_string(), color, icon: None }
    }

    pub fn icon(&self) -> &str {
        self.icon.as_deref().unwrap_or(&self.label)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct FeedConfig {
    /// TCP listener port for feed lines (0 to disable)
    #[serde(default)]
    pub tcp_port: u16,
    /// Bounded capacity of the sample channel into the tracker
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self { tcp_port: 0, channel_capacity: default_channel_capacity() }
    }
}

fn default_channel_capacity() -> usize {
    256
}

#[derive(Debug, Clone, Deserialize)]
pub struct EgressConfig {
    /// File path for tracker events (JSONL format)
    #[serde(default = "default_egress_file")]
    pub file: String,
    /// Bounded capacity of the event channel to the sink; overflow is dropped
    #[serde(default = "default_egress_capacity")]
    pub channel_capacity: usize,
}

impl Default for EgressConfig {
    fn default() -> Self {
        Self { file: default_egress_file(), channel_capacity: default_egress_capacity() }
    }
}

fn default_egress_file() -> String {
    "events.jsonl".to_string()
}

fn default_egress_capacity() -> usize {
    1000
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
    #[serde(default = "default_metrics_interval")]
    pub interval_secs: u64,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self { interval_secs: default_metrics_interval() }
    }
}

fn default_metrics_interval() -> u64 {
    60
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct SiteConfig {
    /// Deployment identifier (e.g., "bolu", "duzce")
    #[serde(default = "default_site_id")]
    pub id: String,
}

fn default_site_id() -> String {
    "riskzone".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct TomlConfig {
    #[serde(default)]
    pub site: SiteConfig,
    #[serde(default)]
    pub tracker: TrackerConfig,
    pub zones: Vec<ZoneConfig>,
    #[serde(default)]
    pub feed: FeedConfig,
    #[serde(default)]
    pub egress: EgressConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
}

/// Main configuration struct used throughout the application
#[derive(Debug, Clone)]
pub struct Config {
    site_id: String,
    radius_m: f64,
    reentry: ReentryPolicy,
    zones: Vec<ZoneConfig>,
    feed_tcp_port: u16,
    feed_channel_capacity: usize,
    egress_file: String,
    egress_channel_capacity: usize,
    metrics_interval_secs: u64,
    config_file: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            site_id: default_site_id(),
            radius_m: default_radius_m(),
            reentry: ReentryPolicy::Once,
            zones: Self::default_zones(),
            feed_tcp_port: 0,
            feed_channel_capacity: default_channel_capacity(),
            egress_file: default_egress_file(),
            egress_channel_capacity: default_egress_capacity(),
            metrics_interval_secs: default_metrics_interval(),
            config_file: "default".to_string(),
        }
    }
}

impl Config {
    fn default_zones() -> Vec<ZoneConfig> {
        vec![
            ZoneConfig::new(40.8927236, 31.1680019, "Fazla Riskli", ZoneColor::Red),
            ZoneConfig::new(40.8664894, 31.1672618, "Orta Riskli", ZoneColor::Yellow),
            ZoneConfig::new(40.8767913, 31.1687546, "Riskli", ZoneColor::Blue),
            ZoneConfig::new(40.9055567, 31.154617, "Riskli", ZoneColor::Blue),
            ZoneConfig::new(40.9005048, 31.1724293, "Orta Riskli", ZoneColor::Yellow),
            ZoneConfig::new(40.9050723, 31.17691, "Fazla Riskli", ZoneColor::Red),
        ]
    }

    /// Config path used when none is given on the command line
    pub fn resolve_config_path() -> String {
        env::var("CONFIG_FILE").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string())
    }

    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;

        let toml_config: TomlConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;

        Ok(Self {
            site_id: toml_config.site.id,
            radius_m: toml_config.tracker.radius_m,
            reentry: toml_config.tracker.reentry,
            zones: toml_config.zones,
            feed_tcp_port: toml_config.feed.tcp_port,
            feed_channel_capacity: toml_config.feed.channel_capacity.max(1),
            egress_file: toml_config.egress.file,
            egress_channel_capacity: toml_config.egress.channel_capacity.max(1),
            metrics_interval_secs: toml_config.metrics.interval_secs,
            config_file: path.display().to_string(),
        })
    }

    /// Load configuration from an explicit path, falling back to defaults
    pub fn load_from_path(path: &str) -> Self {
        match Self::from_file(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Warning: {:#}. Using defaults.", e);
                Self::default()
            }
        }
    }

    pub fn site_id(&self) -> &str {
        &self.site_id
    }

    pub fn radius_m(&self) -> f64 {
        self.radius_m
    }

    pub fn reentry(&self) -> ReentryPolicy {
        self.reentry
    }

    pub fn zones(&self) -> &[ZoneConfig] {
        &self.zones
    }

    pub fn feed_tcp_port(&self) -> u16 {
        self.feed_tcp_port
    }

    pub fn feed_channel_capacity(&self) -> usize {
        self.feed_channel_capacity
    }

    pub fn egress_file(&self) -> &str {
        &self.egress_file
    }

    pub fn egress_channel_capacity(&self) -> usize {
        self.egress_channel_capacity
    }

    pub fn metrics_interval_secs(&self) -> u64 {
        self.metrics_interval_secs
    }

    pub fn config_file(&self) -> &str {
        &self.config_file
    }

    /// Builder method to override the zone radius
    pub fn with_radius_m(mut self, radius_m: f64) -> Self {
        self.radius_m = radius_m;
        self
    }

    /// Builder method to override the re-entry policy
    pub fn with_reentry(mut self, reentry: ReentryPolicy) -> Self {
        self.reentry = reentry;
        self
    }

    /// Builder method to replace the zone list
    pub fn with_zones(mut self, zones: Vec<ZoneConfig>) -> Self {
        self.zones = zones;
        self
    }
}
