//! Ultrasonic rangefinder pair on a shared serial bus
//!
//! Protocol:
//! - Baud: 9600, 8N1
//! - Command frame: 6 bytes, starts with 0xAE, addressed per sensor head
//! - Response frame: 8 bytes, starts with 0xAF, distance in centimeters
//! - Checksum: sum all bytes, bitwise NOT

use crate::domain::types::SensorSide;
use crate::infra::config::Config;
use std::io::ErrorKind;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio_serial::SerialPortBuilderExt;
use tracing::{debug, error, info, warn};

// Protocol constants
const START_BYTE_COMMAND: u8 = 0xAE;
const START_BYTE_RESPONSE: u8 = 0xAF;
const CMD_RANGE: u8 = 0x01;
const COMMAND_FRAME_LEN: usize = 6;
const RESPONSE_FRAME_LEN: usize = 8;

/// Maximum read attempts per measurement (prevents infinite loop)
const MAX_READ_ATTEMPTS: usize = 20;

/// Build a range query frame for one sensor head
fn build_range_command(address: u8) -> [u8; COMMAND_FRAME_LEN] {
    let mut frame = [0u8; COMMAND_FRAME_LEN];
    frame[0] = START_BYTE_COMMAND;
    frame[1] = address;
    frame[2] = CMD_RANGE;
    frame[3] = 0x00; // Data0
    frame[4] = 0x00; // Data1

    // Checksum: sum all bytes, bitwise NOT
    let sum: u8 = frame[..5].iter().fold(0u8, |acc, &x| acc.wrapping_add(x));
    frame[5] = !sum;

    frame
}

/// Parse a response frame, returning the distance in centimeters
fn parse_response(address: u8, data: &[u8]) -> Option<u16> {
    if data.len() != RESPONSE_FRAME_LEN {
        warn!(len = data.len(), expected = RESPONSE_FRAME_LEN, "ultrasonic_invalid_response_length");
        return None;
    }

    if data[0] != START_BYTE_RESPONSE {
        warn!(byte = data[0], expected = START_BYTE_RESPONSE, "ultrasonic_invalid_start_byte");
        return None;
    }

    // Validate checksum: sum all bytes (including checksum), add 1, should be 0
    let sum: u8 = data.iter().fold(0u8, |acc, &x| acc.wrapping_add(x));
    if sum.wrapping_add(1) != 0 {
        let hex_dump: String =
            data.iter().map(|b| format!("{:02X}", b)).collect::<Vec<_>>().join(" ");
        warn!(raw_bytes = %hex_dump, "ultrasonic_checksum_failed");
        return None;
    }

    if data[1] != address {
        debug!(got = data[1], expected = address, "ultrasonic_address_mismatch");
        return None;
    }

    let distance_cm = u16::from_be_bytes([data[3], data[4]]);
    Some(distance_cm)
}

/// Polls the two doorway sensor heads and reduces distances to
/// "object present" booleans against per-sensor baselines.
pub struct SensorArray {
    device: String,
    port: Option<tokio_serial::SerialStream>,
    /// Persistent read buffer; responses can arrive in chunks, so partial
    /// data is kept for the next read.
    read_buffer: Vec<u8>,
    baseline_s1_cm: u16,
    baseline_s2_cm: u16,
    calibration_samples: usize,
}

impl SensorArray {
    /// Open the sensor bus. A missing device is tolerated: readings then
    /// report "not present" and the controller keeps running.
    pub fn open(config: &Config) -> Self {
        let port = match tokio_serial::new(config.sensor_device(), config.sensor_baud())
            .timeout(Duration::from_millis(100))
            .open_native_async()
        {
            Ok(p) => {
                info!(device = %config.sensor_device(), "ultrasonic_port_opened");
                Some(p)
            }
            Err(e) => {
                error!(device = %config.sensor_device(), error = %e, "ultrasonic_port_open_failed");
                None
            }
        };

        Self {
            device: config.sensor_device().to_string(),
            port,
            read_buffer: Vec::with_capacity(64),
            baseline_s1_cm: config.s1_baseline_cm(),
            baseline_s2_cm: config.s2_baseline_cm(),
            calibration_samples: config.calibration_samples(),
        }
    }

    pub fn baseline_cm(&self, side: SensorSide) -> u16 {
        match side {
            SensorSide::S1 => self.baseline_s1_cm,
            SensorSide::S2 => self.baseline_s2_cm,
        }
    }

    /// Capture per-sensor baselines from the empty doorway.
    ///
    /// Takes the median of the configured number of samples; keeps the
    /// configured default when the device is absent or readings fail.
    pub async fn calibrate(&mut self) {
        for side in [SensorSide::S1, SensorSide::S2] {
            let mut samples = Vec::with_capacity(self.calibration_samples);
            for _ in 0..self.calibration_samples {
                if let Some(distance) = self.measure(side).await {
                    samples.push(distance);
                }
            }

            if samples.is_empty() {
                warn!(
                    sensor = %side,
                    fallback_cm = self.baseline_cm(side),
                    "ultrasonic_calibration_fallback"
                );
                continue;
            }

            samples.sort_unstable();
            let baseline = samples[samples.len() / 2];
            match side {
                SensorSide::S1 => self.baseline_s1_cm = baseline,
                SensorSide::S2 => self.baseline_s2_cm = baseline,
            }
            info!(sensor = %side, baseline_cm = baseline, "ultrasonic_calibrated");
        }
    }

    /// Sample both sensors and reduce to "object present" booleans.
    ///
    /// Sensor 1 is measured before sensor 2; a failed measurement counts
    /// as "not present" for that tick.
    pub async fn sample(&mut self) -> (bool, bool) {
        let s1 = self.present(SensorSide::S1).await;
        let s2 = self.present(SensorSide::S2).await;
        (s1, s2)
    }

    async fn present(&mut self, side: SensorSide) -> bool {
        match self.measure(side).await {
            Some(distance_cm) => distance_cm < self.baseline_cm(side),
            None => false,
        }
    }

    /// Measure the distance reported by one sensor head, in centimeters
    pub async fn measure(&mut self, side: SensorSide) -> Option<u16> {
        let address = side.bus_address();

        let cmd = build_range_command(address);
        {
            let port = self.port.as_mut()?;
            if let Err(e) = port.write_all(&cmd).await {
                debug!(device = %self.device, sensor = %side, error = %e, "ultrasonic_write_error");
                return None;
            }
        }

        self.read_frame(address).await
    }

    /// Discard buffered bytes up to the response start byte
    fn synchronize_buffer(&mut self) {
        if self.read_buffer.is_empty() || self.read_buffer[0] == START_BYTE_RESPONSE {
            return;
        }

        if let Some(start_idx) = self.read_buffer.iter().position(|&b| b == START_BYTE_RESPONSE) {
            debug!(discarded = start_idx, "ultrasonic_sync_discarded_bytes");
            self.read_buffer.drain(..start_idx);
        } else {
            debug!(discarded = self.read_buffer.len(), "ultrasonic_sync_no_start_byte");
            self.read_buffer.clear();
        }
    }

    /// Read a complete response frame into the persistent buffer and parse it
    async fn read_frame(&mut self, address: u8) -> Option<u16> {
        self.synchronize_buffer();

        let mut temp_buf = [0u8; 64];
        let mut attempts = 0;

        while self.read_buffer.len() < RESPONSE_FRAME_LEN {
            attempts += 1;
            if attempts > MAX_READ_ATTEMPTS {
                debug!(
                    attempts = MAX_READ_ATTEMPTS,
                    buffer_len = self.read_buffer.len(),
                    "ultrasonic_max_read_attempts"
                );
                return None;
            }

            let read = {
                let port = self.port.as_mut()?;
                tokio::time::timeout(Duration::from_millis(50), port.read(&mut temp_buf)).await
            };
            match read {
                Ok(Ok(n)) if n > 0 => {
                    self.read_buffer.extend_from_slice(&temp_buf[..n]);
                    self.synchronize_buffer();
                }
                Ok(Ok(_)) => {
                    // Zero bytes read, continue
                }
                Ok(Err(e)) if e.kind() == ErrorKind::TimedOut => {
                    // Timeout, continue trying
                }
                Ok(Err(e)) => {
                    warn!(error = %e, "ultrasonic_read_error");
                    return None;
                }
                Err(_) => {
                    // Timeout from tokio::time::timeout, continue
                }
            }
        }

        let frame: Vec<u8> = self.read_buffer.drain(..RESPONSE_FRAME_LEN).collect();
        parse_response(address, &frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_response(address: u8, distance_cm: u16) -> [u8; RESPONSE_FRAME_LEN] {
        let mut frame = [0u8; RESPONSE_FRAME_LEN];
        frame[0] = START_BYTE_RESPONSE;
        frame[1] = address;
        frame[2] = 0x00; // status
        frame[3..5].copy_from_slice(&distance_cm.to_be_bytes());
        let sum: u8 = frame[..7].iter().fold(0u8, |acc, &x| acc.wrapping_add(x));
        frame[7] = !sum;
        frame
    }

    #[test]
    fn test_build_range_command() {
        let cmd = build_range_command(1);

        assert_eq!(cmd.len(), COMMAND_FRAME_LEN);
        assert_eq!(cmd[0], START_BYTE_COMMAND);
        assert_eq!(cmd[1], 1);
        assert_eq!(cmd[2], CMD_RANGE);

        // Verify checksum: sum + checksum + 1 = 0
        let sum: u8 = cmd.iter().fold(0u8, |acc, &x| acc.wrapping_add(x));
        assert_eq!(sum.wrapping_add(1), 0);
    }

    #[test]
    fn test_parse_response_extracts_distance() {
        let frame = make_response(2, 47);
        assert_eq!(parse_response(2, &frame), Some(47));
    }

    #[test]
    fn test_parse_response_rejects_bad_checksum() {
        let mut frame = make_response(1, 47);
        frame[4] ^= 0xFF;
        assert_eq!(parse_response(1, &frame), None);
    }

    #[test]
    fn test_parse_response_rejects_wrong_address() {
        let frame = make_response(1, 47);
        assert_eq!(parse_response(2, &frame), None);
    }

    #[test]
    fn test_parse_response_rejects_wrong_start_byte() {
        let mut frame = make_response(1, 47);
        frame[0] = 0x00;
        // Fix the checksum so only the start byte is at fault
        let sum: u8 = frame[..7].iter().fold(0u8, |acc, &x| acc.wrapping_add(x));
        frame[7] = !sum;
        assert_eq!(parse_response(1, &frame), None);
    }

    #[tokio::test]
    async fn test_missing_device_reads_not_present() {
        let config = Config::default(); // /dev/ttyUSB0 absent in test env
        let mut sensors = SensorArray::open(&config);
        if sensors.port.is_some() {
            return; // device actually exists; nothing to assert here
        }
        assert_eq!(sensors.sample().await, (false, false));
    }
}
