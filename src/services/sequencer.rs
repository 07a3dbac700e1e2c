//! Doorway direction sequencing
//!
//! Converts two unsynchronized "object present" signals into a discrete
//! enter/exit event using an ordered two-symbol buffer, a door-blocked
//! latch and a timeout-based reset.
//!
//! Key behaviors:
//! - A symbol is appended only if it differs from the buffer's first symbol,
//!   so a single sensor re-triggering (someone lingering) never grows the
//!   buffer.
//! - Sensor 1 is checked before sensor 2 every tick. This is a tie-break
//!   policy, not incidental: when both trigger on an empty buffer, S1 wins
//!   the first slot.
//! - After a completed passage the door-blocked latch suppresses detection
//!   until both sensors report clear, so one physical transit counts once.
//! - A buffer stuck at one symbol (sensor glitch) is discarded after a fixed
//!   tick budget with no occupancy change.

use crate::domain::types::{PassageEvent, SensorSide};
use std::time::{Duration, Instant};
use tracing::debug;

/// Settle pause after a detected passage; observations are ignored until the
/// deadline passes. A scheduled deadline rather than a sleep, so the control
/// loop keeps servicing its other duties during the debounce.
pub const SETTLE: Duration = Duration::from_millis(550);

/// Ticks a single-symbol buffer may persist before it is discarded as a glitch
pub const TIMEOUT_TICKS: u32 = 200;

/// Ordered trigger sequence since the last reset, capacity 2.
///
/// The fixed capacity makes the overlength buffers the reference hardware
/// had to reset unrepresentable; a push onto a full buffer is dropped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct SequenceBuffer {
    slots: [Option<SensorSide>; 2],
}

impl SequenceBuffer {
    fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    fn first(&self) -> Option<SensorSide> {
        self.slots[0]
    }

    fn push(&mut self, side: SensorSide) {
        if self.slots[0].is_none() {
            self.slots[0] = Some(side);
        } else if self.slots[1].is_none() {
            self.slots[1] = Some(side);
        }
    }

    fn clear(&mut self) {
        self.slots = [None, None];
    }

    fn as_pair(&self) -> Option<(SensorSide, SensorSide)> {
        match self.slots {
            [Some(a), Some(b)] => Some((a, b)),
            _ => None,
        }
    }
}

/// Turns per-tick proximity readings into directional passage events
#[derive(Debug)]
pub struct DirectionSequencer {
    buffer: SequenceBuffer,
    /// While set, no symbols are appended and no events fire. Cleared only
    /// when both sensors simultaneously report clear.
    door_blocked: bool,
    /// Ticks the buffer has held exactly one symbol
    timeout_ticks: u32,
    /// Observations are ignored until this deadline after a passage
    settle_until: Option<Instant>,
}

impl DirectionSequencer {
    pub fn new() -> Self {
        Self {
            buffer: SequenceBuffer::default(),
            door_blocked: false,
            timeout_ticks: 0,
            settle_until: None,
        }
    }

    /// Whether the door-blocked latch is currently set
    pub fn door_blocked(&self) -> bool {
        self.door_blocked
    }

    /// Feed one tick of proximity readings.
    ///
    /// Returns a completed passage event, or `None` for every partial,
    /// rejected or suppressed observation.
    pub fn observe(
        &mut self,
        s1_present: bool,
        s2_present: bool,
        now: Instant,
    ) -> Option<PassageEvent> {
        if let Some(until) = self.settle_until {
            if now < until {
                return None;
            }
            self.settle_until = None;
        }

        if self.door_blocked {
            if s1_present || s2_present {
                return None;
            }
            // Both clear: the transit zone is empty again
            self.door_blocked = false;
            debug!("door_unblocked");
            return None;
        }

        // One append per tick; s1 before s2 is the tie-break policy
        if s1_present && self.buffer.first() != Some(SensorSide::S1) {
            self.buffer.push(SensorSide::S1);
        } else if s2_present && self.buffer.first() != Some(SensorSide::S2) {
            self.buffer.push(SensorSide::S2);
        }

        let event = match self.buffer.as_pair() {
            Some((SensorSide::S1, SensorSide::S2)) => Some(PassageEvent::Enter),
            Some((SensorSide::S2, SensorSide::S1)) => Some(PassageEvent::Exit),
            _ => None,
        };

        if let Some(ev) = event {
            self.buffer.clear();
            self.door_blocked = true;
            self.settle_until = Some(now + SETTLE);
            self.timeout_ticks = 0;
            debug!(event = %ev, "passage_sequenced");
            return Some(ev);
        }

        // Same-symbol pairs are unreachable given the append guard but are
        // checked anyway; a wedged single-symbol buffer is walked back once
        // the counter has passed the budget.
        if self.same_symbol_pair() || self.timeout_ticks > TIMEOUT_TICKS {
            if self.timeout_ticks > TIMEOUT_TICKS {
                debug!(ticks = self.timeout_ticks, "sequence_timeout_reset");
            }
            self.buffer.clear();
        }

        if self.buffer.len() == 1 {
            self.timeout_ticks += 1;
        } else {
            self.timeout_ticks = 0;
        }

        None
    }

    fn same_symbol_pair(&self) -> bool {
        matches!(self.buffer.as_pair(), Some((a, b)) if a == b)
    }
}

impl Default for DirectionSequencer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn past_settle(now: Instant) -> Instant {
        now + SETTLE + Duration::from_millis(10)
    }

    #[test]
    fn test_enter_sequence() {
        let mut seq = DirectionSequencer::new();
        let now = Instant::now();

        assert_eq!(seq.observe(true, false, now), None);
        assert_eq!(seq.observe(true, true, now), Some(PassageEvent::Enter));
        assert!(seq.door_blocked());
    }

    #[test]
    fn test_exit_sequence() {
        let mut seq = DirectionSequencer::new();
        let now = Instant::now();

        assert_eq!(seq.observe(false, true, now), None);
        assert_eq!(seq.observe(true, true, now), Some(PassageEvent::Exit));
        assert!(seq.door_blocked());
    }

    #[test]
    fn test_single_sensor_retrigger_does_not_grow_buffer() {
        let mut seq = DirectionSequencer::new();
        let now = Instant::now();

        // Someone lingering in front of sensor 1 for many ticks
        for _ in 0..50 {
            assert_eq!(seq.observe(true, false, now), None);
        }
        // A subsequent S2 trigger still completes a clean entry
        assert_eq!(seq.observe(false, true, now), Some(PassageEvent::Enter));
    }

    #[test]
    fn test_simultaneous_first_trigger_s1_wins() {
        let mut seq = DirectionSequencer::new();
        let now = Instant::now();

        // Both trigger on an empty buffer: S1 takes the first slot,
        // so the passage resolves as an entry once S2 follows.
        assert_eq!(seq.observe(true, true, now), None);
        assert_eq!(seq.observe(false, true, now), Some(PassageEvent::Enter));
    }

    #[test]
    fn test_blocked_latch_suppresses_observations() {
        let mut seq = DirectionSequencer::new();
        let now = Instant::now();

        seq.observe(true, false, now);
        seq.observe(false, true, now);
        assert!(seq.door_blocked());

        // Still mid-transit: readings ignored even after the settle pause
        let later = past_settle(now);
        assert_eq!(seq.observe(true, false, later), None);
        assert_eq!(seq.observe(false, true, later), None);
        assert!(seq.door_blocked());
    }

    #[test]
    fn test_unblock_requires_both_clear() {
        let mut seq = DirectionSequencer::new();
        let now = Instant::now();

        seq.observe(true, false, now);
        seq.observe(false, true, now);

        let later = past_settle(now);
        seq.observe(true, false, later);
        assert!(seq.door_blocked());
        seq.observe(false, false, later);
        assert!(!seq.door_blocked());

        // Detection resumes after the unblock tick
        assert_eq!(seq.observe(true, false, later), None);
        assert_eq!(seq.observe(false, true, later), Some(PassageEvent::Enter));
    }

    #[test]
    fn test_settle_cooldown_ignores_observations() {
        let mut seq = DirectionSequencer::new();
        let now = Instant::now();

        seq.observe(true, false, now);
        assert_eq!(seq.observe(false, true, now), Some(PassageEvent::Enter));

        // Within the settle window nothing is processed, not even the
        // unblock check
        let within = now + Duration::from_millis(100);
        seq.observe(false, false, within);
        assert!(seq.door_blocked());

        // Past the window the clear readings unblock as usual
        seq.observe(false, false, past_settle(now));
        assert!(!seq.door_blocked());
    }

    #[test]
    fn test_timeout_clears_stuck_symbol() {
        let mut seq = DirectionSequencer::new();
        let now = Instant::now();

        // A glitching sensor leaves one symbol in the buffer
        seq.observe(true, false, now);

        // The counter has to pass the budget before the reset fires
        for _ in 0..=TIMEOUT_TICKS {
            assert_eq!(seq.observe(false, false, now), None);
        }

        // Buffer was cleared: an S2 trigger now starts an exit sequence
        // rather than completing an entry
        assert_eq!(seq.observe(false, true, now), None);
        assert_eq!(seq.observe(true, false, now), Some(PassageEvent::Exit));
    }

    #[test]
    fn test_no_event_without_second_symbol() {
        let mut seq = DirectionSequencer::new();
        let now = Instant::now();

        for _ in 0..10 {
            assert_eq!(seq.observe(false, false, now), None);
        }
        assert!(!seq.door_blocked());
    }

    #[test]
    fn test_back_to_back_passages() {
        let mut seq = DirectionSequencer::new();
        let now = Instant::now();

        seq.observe(true, false, now);
        assert_eq!(seq.observe(false, true, now), Some(PassageEvent::Enter));

        // Transit completes: both clear after the settle pause
        let t1 = past_settle(now);
        seq.observe(false, false, t1);

        seq.observe(false, true, t1);
        assert_eq!(seq.observe(true, false, t1), Some(PassageEvent::Exit));
    }
}
