//! Room controller - per-tick orchestration
//!
//! The controller owns all mutable state exclusively (occupancy count,
//! sequencer, climate latches) and coordinates one control loop tick:
//! sensor sampling, direction sequencing, occupancy update, climate
//! evaluation, then IR/telemetry dispatch - strictly in that order. No tick
//! begins before the previous tick's emissions were issued.
//!
//! The pure per-tick step lives in [`ControllerState::advance`] so the
//! sequencing and policy logic is testable without hardware.

use crate::domain::types::{ClimateAction, PassageEvent};
use crate::infra::config::Config;
use crate::infra::metrics::Metrics;
use crate::io::ir::IrTransmitter;
use crate::io::occupancy_log::OccupancyLog;
use crate::io::telemetry::TelemetrySender;
use crate::io::ultrasonic::SensorArray;
use crate::services::climate::{ClimateActions, ClimateController};
use crate::services::sequencer::DirectionSequencer;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tokio::time::interval;
use tracing::{debug, info, trace};

/// Result of one control loop tick
#[derive(Debug)]
pub struct TickOutput {
    /// Completed passage event, if any
    pub event: Option<PassageEvent>,
    /// Whether the occupancy count actually changed
    pub count_changed: bool,
    /// Occupancy count after the tick
    pub people: u32,
    /// Climate emissions to issue, in order
    pub actions: ClimateActions,
}

/// All mutable controller state, owned exclusively by the control loop.
///
/// A fresh boot always assumes an empty room: count 0, unit off, buffer
/// empty, not blocked. Nothing is persisted across restarts.
#[derive(Debug, Default)]
pub struct ControllerState {
    sequencer: DirectionSequencer,
    climate: ClimateController,
    people: u32,
}

impl ControllerState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn people(&self) -> u32 {
        self.people
    }

    pub fn target_temperature(&self) -> i32 {
        self.climate.target_temperature()
    }

    /// One pure control step: sequencer -> occupancy update -> climate.
    ///
    /// An exit from an already-empty room is a no-op on the count (it never
    /// goes negative) and triggers no climate evaluation, but the sequencer
    /// still completes the passage (clear, block, settle).
    pub fn advance(&mut self, s1_present: bool, s2_present: bool, now: Instant) -> TickOutput {
        let event = self.sequencer.observe(s1_present, s2_present, now);

        let mut count_changed = false;
        match event {
            Some(PassageEvent::Enter) => {
                self.people += 1;
                count_changed = true;
                info!(people = %self.people, "entry_detected");
            }
            Some(PassageEvent::Exit) => {
                if self.people > 0 {
                    self.people -= 1;
                    count_changed = true;
                    info!(people = %self.people, "exit_detected");
                } else {
                    debug!("exit_ignored_empty_room");
                }
            }
            None => {}
        }

        let actions =
            if count_changed { self.climate.apply(self.people) } else { ClimateActions::new() };

        TickOutput { event, count_changed, people: self.people, actions }
    }
}

/// Control loop: samples sensors, advances the state machine and dispatches
/// the resulting IR commands, telemetry and periodic log flushes.
pub struct RoomController {
    state: ControllerState,
    sensors: SensorArray,
    ir: IrTransmitter,
    telemetry: Option<TelemetrySender>,
    occupancy_log: OccupancyLog,
    metrics: Arc<Metrics>,
    poll_interval: Duration,
    flush_interval: Duration,
    last_flush: Instant,
}

impl RoomController {
    pub fn new(config: &Config, metrics: Arc<Metrics>, telemetry: Option<TelemetrySender>) -> Self {
        let occupancy_log = OccupancyLog::new(config.log_file());
        Self {
            state: ControllerState::new(),
            sensors: SensorArray::open(config),
            ir: IrTransmitter::open(config),
            telemetry,
            occupancy_log,
            metrics,
            poll_interval: Duration::from_millis(config.sensor_poll_interval_ms()),
            flush_interval: Duration::from_secs(config.flush_interval_secs()),
            last_flush: Instant::now(),
        }
    }

    /// Run the control loop until shutdown
    pub async fn run(&mut self, mut shutdown: watch::Receiver<bool>) {
        self.occupancy_log.log_existing();
        self.sensors.calibrate().await;

        info!(
            poll_interval_ms = %self.poll_interval.as_millis(),
            flush_interval_secs = %self.flush_interval.as_secs(),
            "controller_started"
        );

        let mut tick = interval(self.poll_interval);

        loop {
            tokio::select! {
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        info!(people = %self.state.people(), "controller_shutdown");
                        return;
                    }
                }
                _ = tick.tick() => {}
            }

            let (s1_present, s2_present) = self.sensors.sample().await;
            let out = self.state.advance(s1_present, s2_present, Instant::now());

            self.metrics.record_tick();
            trace!(
                s1 = s1_present,
                s2 = s2_present,
                people = %out.people,
                "tick"
            );

            self.dispatch(out).await;
            self.flush_if_due();
        }
    }

    /// Issue the tick's emissions: occupancy telemetry first, then the
    /// climate actions in their given order
    async fn dispatch(&mut self, out: TickOutput) {
        match out.event {
            Some(PassageEvent::Enter) => self.metrics.record_entry(),
            Some(PassageEvent::Exit) => self.metrics.record_exit(),
            None => {}
        }

        if out.count_changed {
            self.metrics.set_people(out.people);
            if let Some(ref telemetry) = self.telemetry {
                telemetry.send_people_count(out.people);
                self.metrics.record_telemetry_send();
            }
        }

        for action in &out.actions {
            match *action {
                ClimateAction::SendIr(command) => {
                    self.ir.send(command).await;
                    self.metrics.record_ir_command();
                }
                ClimateAction::TemperatureChanged(temperature) => {
                    self.metrics.set_target_temperature(temperature);
                    if let Some(ref telemetry) = self.telemetry {
                        telemetry.send_temperature(temperature);
                        self.metrics.record_telemetry_send();
                    }
                }
            }
        }
    }

    /// Append to the occupancy log and publish a snapshot once per flush
    /// interval, gated by an elapsed-time check against the monotonic clock
    fn flush_if_due(&mut self) {
        if self.last_flush.elapsed() < self.flush_interval {
            return;
        }
        self.last_flush = Instant::now();

        let timestamp = chrono::Local::now().format("%d-%m-%Y %H:%M:%S").to_string();
        if self.occupancy_log.append(&timestamp, self.state.people()) {
            self.metrics.record_log_append();
        }

        if let Some(ref telemetry) = self.telemetry {
            telemetry.send_snapshot(self.state.people(), self.state.target_temperature());
            self.metrics.record_telemetry_send();
        }
    }
}
