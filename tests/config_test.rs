//! Integration tests for configuration loading

use roomctl::infra::Config;
use std::io::Write;
use tempfile::NamedTempFile;

#[test]
fn test_load_config_from_file() {
    let mut temp_file = NamedTempFile::new().unwrap();

    let config_content = r#"
[site]
id = "meeting-room-2"

[mqtt]
host = "test-broker"
port = 1884
username = "testuser"
password = "testkey"
people_count_topic = "testuser/feeds/people-count"
temperature_topic = "testuser/feeds/temperature"

[sensors]
device = "/dev/ttyAMA2"
baud = 19200
poll_interval_ms = 200
s1_baseline_cm = 60
s2_baseline_cm = 55
calibration_samples = 9

[ir]
device = "/dev/ttyAMA3"
baud = 9600

[log]
file = "/var/log/roomctl/people_log.txt"

[telemetry]
flush_interval_secs = 30

[metrics]
interval_secs = 15
"#;

    temp_file.write_all(config_content.as_bytes()).unwrap();
    temp_file.flush().unwrap();

    let config = Config::from_file(temp_file.path()).unwrap();

    assert_eq!(config.site_id(), "meeting-room-2");
    assert_eq!(config.mqtt_host(), "test-broker");
    assert_eq!(config.mqtt_port(), 1884);
    assert_eq!(config.mqtt_username(), Some("testuser"));
    assert_eq!(config.mqtt_password(), Some("testkey"));
    assert_eq!(config.people_count_topic(), "testuser/feeds/people-count");
    assert_eq!(config.sensor_device(), "/dev/ttyAMA2");
    assert_eq!(config.sensor_baud(), 19200);
    assert_eq!(config.sensor_poll_interval_ms(), 200);
    assert_eq!(config.s1_baseline_cm(), 60);
    assert_eq!(config.s2_baseline_cm(), 55);
    assert_eq!(config.calibration_samples(), 9);
    assert_eq!(config.ir_device(), "/dev/ttyAMA3");
    assert_eq!(config.log_file(), "/var/log/roomctl/people_log.txt");
    assert_eq!(config.flush_interval_secs(), 30);
    assert_eq!(config.metrics_interval_secs(), 15);
}

#[test]
fn test_load_from_path_fallback() {
    let config = Config::load_from_path("/nonexistent/config.toml");
    assert_eq!(config.mqtt_host(), "io.adafruit.com");
    assert_eq!(config.mqtt_port(), 1883);
    assert_eq!(config.sensor_poll_interval_ms(), 250);
}

#[test]
fn test_defaulted_sections_omitted() {
    let mut temp_file = NamedTempFile::new().unwrap();

    // Only the required sections; site/log/telemetry/metrics use defaults
    let config_content = r#"
[mqtt]
host = "broker.local"
port = 1883

[sensors]
device = "/dev/ttyUSB0"
baud = 9600
poll_interval_ms = 250

[ir]
device = "/dev/ttyUSB1"
baud = 9600
"#;

    temp_file.write_all(config_content.as_bytes()).unwrap();
    temp_file.flush().unwrap();

    let config = Config::from_file(temp_file.path()).unwrap();

    assert_eq!(config.site_id(), "roomctl");
    assert_eq!(config.log_file(), "people_log.txt");
    assert_eq!(config.flush_interval_secs(), 60);
    assert_eq!(config.metrics_interval_secs(), 10);
    assert_eq!(config.s1_baseline_cm(), 50);
}
