//! Shared types for the room controller

use serde::Serialize;
use std::time::{SystemTime, UNIX_EPOCH};

/// Current time as epoch milliseconds
pub fn epoch_ms() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis() as u64
}

/// Which of the two doorway sensors produced a reading.
///
/// Sensor 1 is on the outside of the doorway, sensor 2 on the inside,
/// so a 1-then-2 trigger order means someone walked in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SensorSide {
    S1,
    S2,
}

impl SensorSide {
    pub fn as_str(&self) -> &'static str {
        match self {
            SensorSide::S1 => "s1",
            SensorSide::S2 => "s2",
        }
    }

    /// Protocol address of the sensor head on the shared serial bus
    pub fn bus_address(&self) -> u8 {
        match self {
            SensorSide::S1 => 1,
            SensorSide::S2 => 2,
        }
    }
}

impl std::fmt::Display for SensorSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A completed directional passage through the doorway
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassageEvent {
    Enter,
    Exit,
}

impl PassageEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            PassageEvent::Enter => "enter",
            PassageEvent::Exit => "exit",
        }
    }
}

impl std::fmt::Display for PassageEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Infrared command set for the AC unit (NEC protocol).
///
/// Codes are the raw values captured from the unit's remote; they must be
/// transmitted bit-exact or the unit ignores the frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IrCommand {
    PowerOn,
    PowerOff,
    SetTemp22,
    SetTemp18,
    /// Companion device toggled together with AC power-up
    Projector,
}

impl IrCommand {
    /// Raw NEC code transmitted over the IR link
    pub fn code(&self) -> u32 {
        match self {
            IrCommand::PowerOn => 0xB2BF00,
            IrCommand::PowerOff => 0xB27BE0,
            IrCommand::SetTemp22 => 0xB2BF70,
            IrCommand::SetTemp18 => 0xB2BF10,
            IrCommand::Projector => 0x807F42BD,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            IrCommand::PowerOn => "power_on",
            IrCommand::PowerOff => "power_off",
            IrCommand::SetTemp22 => "set_temp_22",
            IrCommand::SetTemp18 => "set_temp_18",
            IrCommand::Projector => "projector",
        }
    }
}

impl std::fmt::Display for IrCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Occupancy band driving the climate policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ClimateTier {
    Off,
    Low,
    Mid,
    High,
}

impl ClimateTier {
    /// Band for a given occupancy count: OFF(0), LOW(1-4), MID(5-14), HIGH(15+)
    pub fn from_count(people: u32) -> Self {
        match people {
            0 => ClimateTier::Off,
            1..=4 => ClimateTier::Low,
            5..=14 => ClimateTier::Mid,
            _ => ClimateTier::High,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ClimateTier::Off => "off",
            ClimateTier::Low => "low",
            ClimateTier::Mid => "mid",
            ClimateTier::High => "high",
        }
    }
}

impl std::fmt::Display for ClimateTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One output of a climate policy evaluation, in emission order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClimateAction {
    SendIr(IrCommand),
    /// Commanded target temperature changed; 0 means the unit is no longer
    /// forced by a tier (or is off entirely)
    TemperatureChanged(i32),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_bands() {
        assert_eq!(ClimateTier::from_count(0), ClimateTier::Off);
        assert_eq!(ClimateTier::from_count(1), ClimateTier::Low);
        assert_eq!(ClimateTier::from_count(4), ClimateTier::Low);
        assert_eq!(ClimateTier::from_count(5), ClimateTier::Mid);
        assert_eq!(ClimateTier::from_count(14), ClimateTier::Mid);
        assert_eq!(ClimateTier::from_count(15), ClimateTier::High);
        assert_eq!(ClimateTier::from_count(100), ClimateTier::High);
    }

    #[test]
    fn test_ir_codes_bit_exact() {
        assert_eq!(IrCommand::PowerOn.code(), 0xB2BF00);
        assert_eq!(IrCommand::PowerOff.code(), 0xB27BE0);
        assert_eq!(IrCommand::SetTemp22.code(), 0xB2BF70);
        assert_eq!(IrCommand::SetTemp18.code(), 0xB2BF10);
        assert_eq!(IrCommand::Projector.code(), 0x807F42BD);
    }

    #[test]
    fn test_sensor_bus_addresses() {
        assert_eq!(SensorSide::S1.bus_address(), 1);
        assert_eq!(SensorSide::S2.bus_address(), 2);
        assert_ne!(SensorSide::S1.bus_address(), SensorSide::S2.bus_address());
    }
}
