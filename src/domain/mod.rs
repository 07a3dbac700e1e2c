//! Domain models - core types for occupancy and climate control
//!
//! This module contains the canonical data types used throughout the system:
//! - `SensorSide` - which of the two doorway sensors triggered
//! - `PassageEvent` - a completed directional passage (enter/exit)
//! - `IrCommand` - infrared command set for the AC unit
//! - `ClimateTier` - occupancy band driving the climate policy
//! - `ClimateAction` - output of one climate policy evaluation

pub mod types;
