//! Occupancy-to-climate control policy
//!
//! Maps the occupancy count to AC power and target temperature, emitting
//! the minimal set of IR commands needed to reach that state. The two
//! occupancy tiers are level-triggered through "was above" latches, so a
//! count oscillating inside a band never re-emits the band's command.
//!
//! IR transmission is fire-and-forget (no acknowledgment channel exists on
//! the medium); a command that does not reach the unit is indistinguishable
//! from success and is not retried.

use crate::domain::types::{ClimateAction, IrCommand};
use smallvec::SmallVec;
use tracing::debug;

/// Target commanded when the unit powers up
pub const DEFAULT_TEMPERATURE: i32 = 24;
/// Target for the mid tier, 5-14 people
pub const MID_TEMPERATURE: i32 = 22;
/// Target for the high tier, 15+ people
pub const HIGH_TEMPERATURE: i32 = 18;

/// Mid tier lower bound (inclusive)
pub const MID_THRESHOLD: u32 = 5;
/// High tier lower bound (inclusive); also the mid tier's exclusive upper bound
pub const HIGH_THRESHOLD: u32 = 15;

/// Ordered outputs of one policy evaluation
pub type ClimateActions = SmallVec<[ClimateAction; 6]>;

/// Three-tier hysteresis state machine over the occupancy count.
///
/// `target_temperature == 0` doubles as the "unit is off / no tier is
/// forcing a setpoint" indicator, matching the value reported on the
/// temperature feed.
#[derive(Debug)]
pub struct ClimateController {
    /// Latched once the count has entered [5, 15)
    above_mid: bool,
    /// Latched once the count has reached 15
    above_high: bool,
    target_temperature: i32,
}

impl ClimateController {
    pub fn new() -> Self {
        Self { above_mid: false, above_high: false, target_temperature: 0 }
    }

    /// Currently commanded target temperature; 0 means off / unforced
    pub fn target_temperature(&self) -> i32 {
        self.target_temperature
    }

    /// Evaluate the policy against a new occupancy count.
    ///
    /// Must be called only when the count actually changed; repeated calls
    /// with the same count are harmless (latches keep them silent) but
    /// wasteful. Returns the IR commands and temperature notifications to
    /// issue, in order.
    pub fn apply(&mut self, people: u32) -> ClimateActions {
        let mut actions = ClimateActions::new();

        if people == 0 {
            // Empty room dominates: power down and reset every latch
            actions.push(ClimateAction::SendIr(IrCommand::PowerOff));
            self.target_temperature = 0;
            actions.push(ClimateAction::TemperatureChanged(0));
            self.above_mid = false;
            self.above_high = false;
            debug!("climate_power_off");
            return actions;
        }

        if self.target_temperature == 0 {
            actions.push(ClimateAction::SendIr(IrCommand::PowerOn));
            actions.push(ClimateAction::SendIr(IrCommand::Projector));
            self.target_temperature = DEFAULT_TEMPERATURE;
            actions.push(ClimateAction::TemperatureChanged(DEFAULT_TEMPERATURE));
            debug!(setpoint = DEFAULT_TEMPERATURE, "climate_power_on");
        }

        // High tier, evaluated independently of the mid tier
        if people >= HIGH_THRESHOLD {
            if !self.above_high {
                actions.push(ClimateAction::SendIr(IrCommand::SetTemp18));
                self.target_temperature = HIGH_TEMPERATURE;
                actions.push(ClimateAction::TemperatureChanged(HIGH_TEMPERATURE));
                self.above_high = true;
                debug!(people, setpoint = HIGH_TEMPERATURE, "climate_high_tier");
            }
        } else if self.above_high {
            // Dropped below 15: the tier no longer forces 18. The 0 on the
            // temperature feed is the indicator; no IR command is sent.
            self.target_temperature = 0;
            actions.push(ClimateAction::TemperatureChanged(0));
            self.above_high = false;
            debug!(people, "climate_high_tier_released");
        }

        // Mid tier, half-open band [5, 15)
        if (MID_THRESHOLD..HIGH_THRESHOLD).contains(&people) {
            if !self.above_mid {
                actions.push(ClimateAction::SendIr(IrCommand::SetTemp22));
                self.target_temperature = MID_TEMPERATURE;
                actions.push(ClimateAction::TemperatureChanged(MID_TEMPERATURE));
                self.above_mid = true;
                debug!(people, setpoint = MID_TEMPERATURE, "climate_mid_tier");
            }
        } else if self.above_mid && people < MID_THRESHOLD {
            self.target_temperature = 0;
            actions.push(ClimateAction::TemperatureChanged(0));
            self.above_mid = false;
            debug!(people, "climate_mid_tier_released");
        }

        actions
    }
}

impl Default for ClimateController {
    fn default() -> Self {
        Self::new()
    }
}
