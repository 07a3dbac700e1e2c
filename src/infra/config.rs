//! Configuration loading from TOML files
//!
//! Config file is selected via the --config command line argument
//! (default: config/dev.toml). A missing or unparsable file falls back
//! to built-in defaults with a warning.
//!
//! Occupancy thresholds, the settle delay and the sequence timeout budget
//! are deliberately NOT configurable - they are fixed policy owned by the
//! services layer.

use anyhow::Context;
use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Deserialize)]
pub struct MqttConfig {
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    /// Feed carrying the occupancy count as a decimal ASCII integer
    #[serde(default = "default_people_count_topic")]
    pub people_count_topic: String,
    /// Feed carrying the commanded temperature as a decimal ASCII integer
    #[serde(default = "default_temperature_topic")]
    pub temperature_topic: String,
    /// Topic for periodic JSON snapshots
    #[serde(default = "default_snapshot_topic")]
    pub snapshot_topic: String,
}

fn default_people_count_topic() -> String {
    "jeanmagnus/feeds/people-count".to_string()
}

fn default_temperature_topic() -> String {
    "jeanmagnus/feeds/temperature".to_string()
}

fn default_snapshot_topic() -> String {
    "roomctl/snapshot".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct SensorsConfig {
    pub device: String,
    pub baud: u32,
    pub poll_interval_ms: u64,
    /// Objects closer than the baseline count as "present"
    #[serde(default = "default_baseline_cm")]
    pub s1_baseline_cm: u16,
    #[serde(default = "default_baseline_cm")]
    pub s2_baseline_cm: u16,
    /// Readings taken per sensor at startup to calibrate the baseline
    #[serde(default = "default_calibration_samples")]
    pub calibration_samples: usize,
}

fn default_baseline_cm() -> u16 {
    50
}

fn default_calibration_samples() -> usize {
    5
}

#[derive(Debug, Clone, Deserialize)]
pub struct IrConfig {
    pub device: String,
    pub baud: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// File path for the occupancy log (one line per flush interval)
    #[serde(default = "default_log_file")]
    pub file: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self { file: default_log_file() }
    }
}

fn default_log_file() -> String {
    "people_log.txt".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct TelemetryConfig {
    /// Interval between occupancy log appends / snapshot publishes
    #[serde(default = "default_flush_interval")]
    pub flush_interval_secs: u64,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self { flush_interval_secs: default_flush_interval() }
    }
}

fn default_flush_interval() -> u64 {
    60
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
    10
}

#[derive(Debug, Clone, Deserialize)]
pub struct SiteConfig {
    /// Unique site identifier carried in the snapshot payload
    #[serde(default = "default_site_id")]
    pub id: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self { id: default_site_id() }
    }
}

fn default_site_id() -> String {
    "roomctl".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct TomlConfig {
    #[serde(default)]
    pub site: SiteConfig,
    pub mqtt: MqttConfig,
    pub sensors: SensorsConfig,
    pub ir: IrConfig,
    #[serde(default)]
    pub log: LogConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
}

/// Main configuration struct used throughout the application
#[derive(Debug, Clone)]
pub struct Config {
    site_id: String,
    mqtt_host: String,
    mqtt_port: u16,
    mqtt_username: Option<String>,
    mqtt_password: Option<String>,
    people_count_topic: String,
    temperature_topic: String,
    snapshot_topic: String,
    sensor_device: String,
    sensor_baud: u32,
    sensor_poll_interval_ms: u64,
    s1_baseline_cm: u16,
    s2_baseline_cm: u16,
    calibration_samples: usize,
    ir_device: String,
    ir_baud: u32,
    log_file: String,
    flush_interval_secs: u64,
    metrics_interval_secs: u64,
    config_file: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            site_id: "roomctl".to_string(),
            mqtt_host: "io.adafruit.com".to_string(),
            mqtt_port: 1883,
            mqtt_username: None,
            mqtt_password: None,
            people_count_topic: default_people_count_topic(),
            temperature_topic: default_temperature_topic(),
            snapshot_topic: default_snapshot_topic(),
            sensor_device: "/dev/ttyUSB0".to_string(),
            sensor_baud: 9600,
            sensor_poll_interval_ms: 250,
            s1_baseline_cm: 50,
            s2_baseline_cm: 50,
            calibration_samples: 5,
            ir_device: "/dev/ttyUSB1".to_string(),
            ir_baud: 9600,
            log_file: default_log_file(),
            flush_interval_secs: 60,
            metrics_interval_secs: 10,
            config_file: "default".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;

        let toml_config: TomlConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;

        Ok(Self {
            site_id: toml_config.site.id,
            mqtt_host: toml_config.mqtt.host,
            mqtt_port: toml_config.mqtt.port,
            mqtt_username: toml_config.mqtt.username,
            mqtt_password: toml_config.mqtt.password,
            people_count_topic: toml_config.mqtt.people_count_topic,
            temperature_topic: toml_config.mqtt.temperature_topic,
            snapshot_topic: toml_config.mqtt.snapshot_topic,
            sensor_device: toml_config.sensors.device,
            sensor_baud: toml_config.sensors.baud,
            sensor_poll_interval_ms: toml_config.sensors.poll_interval_ms,
            s1_baseline_cm: toml_config.sensors.s1_baseline_cm,
            s2_baseline_cm: toml_config.sensors.s2_baseline_cm,
            calibration_samples: toml_config.sensors.calibration_samples,
            ir_device: toml_config.ir.device,
            ir_baud: toml_config.ir.baud,
            log_file: toml_config.log.file,
            flush_interval_secs: toml_config.telemetry.flush_interval_secs,
            metrics_interval_secs: toml_config.metrics.interval_secs,
            config_file: path.display().to_string(),
        })
    }

    /// Load configuration - tries the TOML file first, falls back to defaults
    pub fn load_from_path(path: &str) -> Self {
        match Self::from_file(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Warning: {}. Using defaults.", e);
                Self::default()
            }
        }
    }

    // Getters for all config fields
    pub fn site_id(&self) -> &str {
        &self.site_id
    }

    pub fn mqtt_host(&self) -> &str {
        &self.mqtt_host
    }

    pub fn mqtt_port(&self) -> u16 {
        self.mqtt_port
    }

    pub fn mqtt_username(&self) -> Option<&str> {
        self.mqtt_username.as_deref()
    }

    pub fn mqtt_password(&self) -> Option<&str> {
        self.mqtt_password.as_deref()
    }

    pub fn people_count_topic(&self) -> &str {
        &self.people_count_topic
    }

    pub fn temperature_topic(&self) -> &str {
        &self.temperature_topic
    }

    pub fn snapshot_topic(&self) -> &str {
        &self.snapshot_topic
    }

    pub fn sensor_device(&self) -> &str {
        &self.sensor_device
    }

    pub fn sensor_baud(&self) -> u32 {
        self.sensor_baud
    }

    pub fn sensor_poll_interval_ms(&self) -> u64 {
        self.sensor_poll_interval_ms
    }

    pub fn s1_baseline_cm(&self) -> u16 {
        self.s1_baseline_cm
    }

    pub fn s2_baseline_cm(&self) -> u16 {
        self.s2_baseline_cm
    }

    pub fn calibration_samples(&self) -> usize {
        self.calibration_samples
    }

    pub fn ir_device(&self) -> &str {
        &self.ir_device
    }

    pub fn ir_baud(&self) -> u32 {
        self.ir_baud
    }

    pub fn log_file(&self) -> &str {
        &self.log_file
    }

    pub fn flush_interval_secs(&self) -> u64 {
        self.flush_interval_secs
    }

    pub fn metrics_interval_secs(&self) -> u64 {
        self.metrics_interval_secs
    }

    pub fn config_file(&self) -> &str {
        &self.config_file
    }

    /// Builder method for tests to redirect the occupancy log
    #[cfg(test)]
    pub fn with_log_file(mut self, path: &str) -> Self {
        self.log_file = path.to_string();
        self
    }

    /// Builder method for tests to shorten the flush interval
    #[cfg(test)]
    pub fn with_flush_interval_secs(mut self, secs: u64) -> Self {
        self.flush_interval_secs = secs;
        self
    }
}
