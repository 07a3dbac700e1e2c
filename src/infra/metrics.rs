//! Lock-free metrics collection and periodic reporting
//!
//! Counter updates on the control-loop hot path are plain atomic adds.
//! All atomics use Relaxed ordering - these are statistical counters only,
//! never used for coordination.

use parking_lot::Mutex;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::time::Instant;
use tracing::info;

/// Lock-free metrics collector
///
/// Recording operations are lock-free; `report()` swaps the per-interval
/// counters to produce a consistent snapshot.
pub struct Metrics {
    /// Control loop ticks ever executed (monotonic)
    ticks_total: AtomicU64,
    /// Ticks since last report (reset on report)
    ticks_since_report: AtomicU64,
    /// Completed entry passages (monotonic)
    entries_total: AtomicU64,
    /// Completed exit passages (monotonic)
    exits_total: AtomicU64,
    /// IR commands transmitted (monotonic)
    ir_commands_total: AtomicU64,
    /// Telemetry messages handed to the publisher (monotonic)
    telemetry_sends_total: AtomicU64,
    /// Occupancy log lines appended (monotonic)
    log_appends_total: AtomicU64,
    /// Current occupancy count (gauge)
    people: AtomicU64,
    /// Currently commanded target temperature, 0 = off (gauge)
    target_temperature: AtomicI64,
    /// Timing state for the per-second rate in reports
    last_report_time: Mutex<Instant>,
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            ticks_total: AtomicU64::new(0),
            ticks_since_report: AtomicU64::new(0),
            entries_total: AtomicU64::new(0),
            exits_total: AtomicU64::new(0),
            ir_commands_total: AtomicU64::new(0),
            telemetry_sends_total: AtomicU64::new(0),
            log_appends_total: AtomicU64::new(0),
            people: AtomicU64::new(0),
            target_temperature: AtomicI64::new(0),
            last_report_time: Mutex::new(Instant::now()),
        }
    }

    #[inline]
    pub fn record_tick(&self) {
        self.ticks_total.fetch_add(1, Ordering::Relaxed);
        self.ticks_since_report.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_entry(&self) {
        self.entries_total.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_exit(&self) {
        self.exits_total.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_ir_command(&self) {
        self.ir_commands_total.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_telemetry_send(&self) {
        self.telemetry_sends_total.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_log_append(&self) {
        self.log_appends_total.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn set_people(&self, people: u32) {
        self.people.store(people as u64, Ordering::Relaxed);
    }

    #[inline]
    pub fn set_target_temperature(&self, temperature: i32) {
        self.target_temperature.store(temperature as i64, Ordering::Relaxed);
    }

    pub fn people(&self) -> u32 {
        self.people.load(Ordering::Relaxed) as u32
    }

    pub fn target_temperature(&self) -> i32 {
        self.target_temperature.load(Ordering::Relaxed) as i32
    }

    /// Produce a snapshot and reset the per-interval counters
    pub fn report(&self) -> MetricsSummary {
        let ticks_interval = self.ticks_since_report.swap(0, Ordering::Relaxed);

        let elapsed_secs = {
            let mut last = self.last_report_time.lock();
            let elapsed = last.elapsed().as_secs_f64();
            *last = Instant::now();
            elapsed
        };

        let ticks_per_sec =
            if elapsed_secs > 0.0 { ticks_interval as f64 / elapsed_secs } else { 0.0 };

        MetricsSummary {
            ticks_total: self.ticks_total.load(Ordering::Relaxed),
            ticks_per_sec,
            entries_total: self.entries_total.load(Ordering::Relaxed),
            exits_total: self.exits_total.load(Ordering::Relaxed),
            ir_commands_total: self.ir_commands_total.load(Ordering::Relaxed),
            telemetry_sends_total: self.telemetry_sends_total.load(Ordering::Relaxed),
            log_appends_total: self.log_appends_total.load(Ordering::Relaxed),
            people: self.people(),
            target_temperature: self.target_temperature(),
        }
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Consistent snapshot of the collector, produced by `report()`
#[derive(Debug, Clone)]
pub struct MetricsSummary {
    pub ticks_total: u64,
    pub ticks_per_sec: f64,
    pub entries_total: u64,
    pub exits_total: u64,
    pub ir_commands_total: u64,
    pub telemetry_sends_total: u64,
    pub log_appends_total: u64,
    pub people: u32,
    pub target_temperature: i32,
}

impl MetricsSummary {
    pub fn log(&self) {
        info!(
            ticks = %self.ticks_total,
            ticks_per_sec = %format!("{:.1}", self.ticks_per_sec),
            entries = %self.entries_total,
            exits = %self.exits_total,
            ir_commands = %self.ir_commands_total,
            telemetry_sends = %self.telemetry_sends_total,
            log_appends = %self.log_appends_total,
            people = %self.people,
            target_temperature = %self.target_temperature,
            "metrics_report"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_accumulate() {
        let metrics = Metrics::new();
        metrics.record_tick();
        metrics.record_tick();
        metrics.record_entry();
        metrics.record_exit();
        metrics.record_ir_command();

        let summary = metrics.report();
        assert_eq!(summary.ticks_total, 2);
        assert_eq!(summary.entries_total, 1);
        assert_eq!(summary.exits_total, 1);
        assert_eq!(summary.ir_commands_total, 1);
    }

    #[test]
    fn test_interval_counter_resets_on_report() {
        let metrics = Metrics::new();
        metrics.record_tick();
        metrics.report();
        metrics.record_tick();

        let summary = metrics.report();
        // Total is monotonic even though the interval counter was swapped out
        assert_eq!(summary.ticks_total, 2);
    }

    #[test]
    fn test_gauges() {
        let metrics = Metrics::new();
        metrics.set_people(7);
        metrics.set_target_temperature(22);
        assert_eq!(metrics.people(), 7);
        assert_eq!(metrics.target_temperature(), 22);

        metrics.set_target_temperature(0);
        assert_eq!(metrics.target_temperature(), 0);
    }
}
