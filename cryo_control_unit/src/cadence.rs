//! Interval gate on the shared millisecond clock.

use cryo_common::control_unit::sensor::TimestampMs;

/// Fires on the first poll, then whenever `period_ms` has elapsed since
/// the last time it fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cadence {
    period_ms: u64,
    last_run: Option<TimestampMs>,
}

impl Cadence {
    pub const fn new(period_ms: u64) -> Self {
        Self {
            period_ms,
            last_run: None,
        }
    }

    /// True when due; the run is recorded at `now`.
    pub fn take_due(&mut self, now: TimestampMs) -> bool {
        let due = self
            .last_run
            .is_none_or(|last| now.saturating_sub(last) >= self.period_ms);
        if due {
            self.last_run = Some(now);
        }
        due
    }

    #[inline]
    pub const fn period_ms(&self) -> u64 {
        self.period_ms
    }

    #[inline]
    pub const fn last_run(&self) -> Option<TimestampMs> {
        self.last_run
    }
}
