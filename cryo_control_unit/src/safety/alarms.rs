//! Active alarm table and history log.
//!
//! The active table holds at most one entry per [`AlarmId`]; raising an
//! id that is already active overwrites that entry. Every raise appends
//! an immutable copy to the bounded history, and clearing never touches
//! the history.

use cryo_common::consts::{ALARM_HISTORY_LEN, MAX_ACTIVE_ALARMS};
use cryo_common::control_unit::alarm::{AlarmId, AlarmSeverity, SafetyAlarm};
use cryo_common::control_unit::sensor::TimestampMs;
use cryo_common::ring::RingBuffer;
use heapless::Vec;

/// Whether a raise created or overwrote the active entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RaiseOutcome {
    Inserted,
    Updated,
}

#[derive(Debug, Clone, Default)]
pub struct AlarmTable {
    active: Vec<SafetyAlarm, MAX_ACTIVE_ALARMS>,
    history: RingBuffer<SafetyAlarm, ALARM_HISTORY_LEN>,
    raised_total: u64,
}

impl AlarmTable {
    pub const fn new() -> Self {
        Self {
            active: Vec::new(),
            history: RingBuffer::new(),
            raised_total: 0,
        }
    }

    pub fn raise(
        &mut self,
        id: AlarmId,
        severity: AlarmSeverity,
        data: u16,
        now: TimestampMs,
    ) -> RaiseOutcome {
        let alarm = SafetyAlarm::new(id, severity, data, now);
        let outcome = match self.active.iter_mut().find(|a| a.id == id) {
            Some(slot) => {
                *slot = alarm;
                RaiseOutcome::Updated
            }
            None => {
                // One slot per catalog id, the table cannot be full here.
                let _ = self.active.push(alarm);
                RaiseOutcome::Inserted
            }
        };
        self.history.push(alarm);
        self.raised_total += 1;
        outcome
    }

    /// Remove `id` from the active table.
    pub fn clear(&mut self, id: AlarmId) -> Option<SafetyAlarm> {
        let pos = self.active.iter().position(|a| a.id == id)?;
        let mut alarm = self.active.remove(pos);
        alarm.active = false;
        Some(alarm)
    }

    /// Mark `id` acknowledged. It stays active.
    pub fn acknowledge(&mut self, id: AlarmId) -> bool {
        match self.active.iter_mut().find(|a| a.id == id) {
            Some(a) => {
                a.acknowledged = true;
                true
            }
            None => false,
        }
    }

    /// Acknowledge every active alarm; returns how many were newly acknowledged.
    pub fn acknowledge_all(&mut self) -> usize {
        let mut n = 0;
        for a in self.active.iter_mut().filter(|a| !a.acknowledged) {
            a.acknowledged = true;
            n += 1;
        }
        n
    }

    pub fn get(&self, id: AlarmId) -> Option<&SafetyAlarm> {
        self.active.iter().find(|a| a.id == id)
    }

    #[inline]
    pub fn is_active(&self, id: AlarmId) -> bool {
        self.get(id).is_some()
    }

    #[inline]
    pub fn active(&self) -> &[SafetyAlarm] {
        &self.active
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.active.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    /// Highest severity among active alarms, acknowledged or not.
    pub fn max_severity(&self) -> Option<AlarmSeverity> {
        self.active.iter().map(|a| a.severity).max()
    }

    /// Any unacknowledged alarm at or above `severity`.
    pub fn unacknowledged_at_least(&self, severity: AlarmSeverity) -> bool {
        self.active
            .iter()
            .any(|a| !a.acknowledged && a.severity >= severity)
    }

    #[inline]
    pub fn history(&self) -> &RingBuffer<SafetyAlarm, ALARM_HISTORY_LEN> {
        &self.history
    }

    #[inline]
    pub const fn raised_total(&self) -> u64 {
        self.raised_total
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
