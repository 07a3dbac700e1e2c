//! IO modules - external system interfaces
//!
//! This module contains all external IO operations:
//! - `ultrasonic` - Serial-polled ultrasonic rangefinder pair
//! - `ir` - Fire-and-forget IR transmitter for the AC unit
//! - `telemetry` - MQTT publisher for occupancy/temperature feeds
//! - `occupancy_log` - Local append-only occupancy log file

pub mod ir;
pub mod occupancy_log;
pub mod telemetry;
pub mod ultrasonic;

// Re-export commonly used types
pub use ir::IrTransmitter;
pub use occupancy_log::OccupancyLog;
pub use telemetry::{create_telemetry_channel, SnapshotPayload, TelemetryPublisher, TelemetrySender};
pub use ultrasonic::SensorArray;
