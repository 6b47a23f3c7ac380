//! Safety interlock state machine.
//!
//! The authority of last resort over actuator output. Checks run at three
//! cadences, each gated by its own last-run timestamp:
//!
//! | Cadence | Period | Checks                                   |
//! |---------|--------|------------------------------------------|
//! | fast    | 100 ms | e-stop, thermal trips, pressure switch   |
//! | normal  | 1 s    | temperatures, pressures, flow, phase     |
//! | slow    | 5 s    | trends, over-temperature, sensor failure |
//!
//! State is the maximum severity among active alarms, except while a
//! lockout is engaged: then it is [`SafetyState::Lockout`] until the timer
//! expires, whatever the alarms say. Lockout is entered only through
//! [`InterlockMachine::trip_lockout`], which an emergency alarm calls.
//!
//! Alarms below critical clear on their own when the condition resolves.
//! Critical and emergency alarms latch until [`InterlockMachine::clear_alarm`].

use cryo_common::consts::{
    SAFETY_FAST_PERIOD_MS, SAFETY_NORMAL_PERIOD_MS, SAFETY_SLOW_PERIOD_MS,
};
use cryo_common::control_unit::alarm::{AlarmId, AlarmSeverity};
use cryo_common::control_unit::config::SafetyLimits;
use cryo_common::control_unit::inputs::EmergencyStopLatch;
use cryo_common::control_unit::sensor::TimestampMs;
use cryo_common::control_unit::state::{SafetyState, ShutdownCommand};
use cryo_common::ring::RingBuffer;

use crate::cadence::Cadence;
use crate::io::EventLog;

use super::alarms::AlarmTable;
use super::checks::{CheckResult, SafetySnapshot, fast_checks, normal_checks, slow_checks};

/// Slow-check samples kept for the rise-rate trend (one minute).
const RISE_WINDOW: usize = (60_000 / SAFETY_SLOW_PERIOD_MS) as usize;

const SUBSYSTEM: &str = "safety";

#[derive(Debug, Clone)]
pub struct InterlockMachine {
    alarms: AlarmTable,
    limits: SafetyLimits,
    state: SafetyState,
    lockout_until: Option<TimestampMs>,
    fast: Cadence,
    normal: Cadence,
    slow: Cadence,
    return_trend: RingBuffer<f64, RISE_WINDOW>,
    lockouts_total: u64,
}

impl InterlockMachine {
    pub fn new(limits: SafetyLimits) -> Self {
        Self {
            alarms: AlarmTable::new(),
            limits,
            state: SafetyState::Normal,
            lockout_until: None,
            fast: Cadence::new(SAFETY_FAST_PERIOD_MS),
            normal: Cadence::new(SAFETY_NORMAL_PERIOD_MS),
            slow: Cadence::new(SAFETY_SLOW_PERIOD_MS),
            return_trend: RingBuffer::new(),
            lockouts_total: 0,
        }
    }

    /// Run whichever cadences are due, then derive the state.
    pub fn evaluate(
        &mut self,
        snapshot: &SafetySnapshot,
        estop: &EmergencyStopLatch,
        now: TimestampMs,
        log: &mut dyn EventLog,
    ) -> SafetyState {
        if self.fast.take_due(now) {
            let latched = estop.take();
            let results = fast_checks(snapshot, &self.limits, latched);
            self.apply(&results, now, log);
        }
        if self.normal.take_due(now) {
            let results = normal_checks(snapshot, &self.limits);
            self.apply(&results, now, log);
        }
        if self.slow.take_due(now) {
            let rate = self.rise_rate(snapshot.return_water);
            let results = slow_checks(snapshot, &self.limits, rate);
            self.apply(&results, now, log);
        }
        self.refresh(now, log)
    }

    /// Return-water trend [°C/min] over the last minute of slow checks.
    fn rise_rate(&mut self, return_water: Option<f64>) -> Option<f64> {
        let rw = return_water?;
        self.return_trend.push(rw);
        (self.return_trend.len() >= 2).then(|| {
            self.return_trend.slope(RISE_WINDOW) * (60_000 / SAFETY_SLOW_PERIOD_MS) as f64
        })
    }

    fn apply(&mut self, results: &[CheckResult], now: TimestampMs, log: &mut dyn EventLog) {
        for r in results {
            let current = self.alarms.get(r.id).copied();
            match (r.condition, current) {
                (Some(c), None) => self.raise_alarm(r.id, c.severity, c.data, now, log),
                (Some(c), Some(a)) => {
                    let escalate = c.severity > a.severity;
                    let relax = c.severity < a.severity && !a.is_latching();
                    if escalate || relax {
                        self.raise_alarm(r.id, c.severity, c.data, now, log);
                    }
                }
                (None, Some(a)) if !a.is_latching() => {
                    self.alarms.clear(r.id);
                    log.log_event(
                        SUBSYSTEM,
                        &format!("alarm resolved: {}", r.id.name()),
                        AlarmSeverity::Info,
                    );
                }
                _ => {}
            }
        }
    }

    /// Insert or overwrite the active entry and append to history.
    /// An emergency alarm trips the lockout.
    pub fn raise_alarm(
        &mut self,
        id: AlarmId,
        severity: AlarmSeverity,
        data: u16,
        now: TimestampMs,
        log: &mut dyn EventLog,
    ) {
        self.alarms.raise(id, severity, data, now);
        log.log_event(
            SUBSYSTEM,
            &format!("alarm {} [{}]: {}", id.name(), severity.name(), id.description()),
            severity,
        );
        if severity == AlarmSeverity::Emergency {
            self.trip_lockout(self.limits.lockout_ms, now, log);
        }
    }

    /// Remove `id` from the active table. History is untouched.
    pub fn clear_alarm(&mut self, id: AlarmId, now: TimestampMs, log: &mut dyn EventLog) -> bool {
        let cleared = self.alarms.clear(id).is_some();
        if cleared {
            log.log_event(
                SUBSYSTEM,
                &format!("alarm cleared: {}", id.name()),
                AlarmSeverity::Info,
            );
            self.refresh(now, log);
        }
        cleared
    }

    /// Flag `id` acknowledged. It keeps driving the state.
    pub fn acknowledge(&mut self, id: AlarmId) -> bool {
        self.alarms.acknowledge(id)
    }

    pub fn acknowledge_all(&mut self) -> usize {
        self.alarms.acknowledge_all()
    }

    /// Engage lockout for `duration_ms`. An existing longer lockout is kept.
    pub fn trip_lockout(&mut self, duration_ms: u64, now: TimestampMs, log: &mut dyn EventLog) {
        let until = now.saturating_add(duration_ms);
        if self.lockout_until.is_some_and(|t| t >= until) {
            return;
        }
        self.lockout_until = Some(until);
        self.lockouts_total += 1;
        self.state = SafetyState::Lockout;
        log.log_event(
            SUBSYSTEM,
            &format!("lockout engaged for {duration_ms} ms"),
            AlarmSeverity::Emergency,
        );
    }

    /// Expire the lockout if due and re-derive the state.
    pub fn refresh(&mut self, now: TimestampMs, log: &mut dyn EventLog) -> SafetyState {
        if self.lockout_until.is_some_and(|t| now >= t) {
            self.lockout_until = None;
            log.log_event(SUBSYSTEM, "lockout expired", AlarmSeverity::Info);
        }
        self.state = if self.lockout_until.is_some() {
            SafetyState::Lockout
        } else {
            self.alarms
                .max_severity()
                .map_or(SafetyState::Normal, SafetyState::from_severity)
        };
        self.state
    }

    #[inline]
    pub const fn state(&self) -> SafetyState {
        self.state
    }

    #[inline]
    pub const fn is_locked_out(&self) -> bool {
        self.lockout_until.is_some()
    }

    pub fn lockout_remaining(&self, now: TimestampMs) -> u64 {
        self.lockout_until
            .map_or(0, |t| t.saturating_sub(now))
    }

    /// The single gate for actuator output.
    #[inline]
    pub fn can_operate(&self) -> bool {
        self.state <= SafetyState::Alarm && !self.is_locked_out()
    }

    /// Shutdown to issue while operation is blocked.
    pub const fn shutdown_command(&self) -> Option<ShutdownCommand> {
        match self.state {
            SafetyState::Emergency | SafetyState::Lockout => Some(ShutdownCommand::Emergency),
            SafetyState::Critical => Some(ShutdownCommand::Controlled),
            _ => None,
        }
    }

    #[inline]
    pub fn alarms(&self) -> &AlarmTable {
        &self.alarms
    }

    #[inline]
    pub const fn limits(&self) -> &SafetyLimits {
        &self.limits
    }

    #[inline]
    pub const fn lockouts_total(&self) -> u64 {
        self.lockouts_total
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
