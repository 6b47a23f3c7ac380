//! Control-fault detection.
//!
//! Each pass the detector derives the set of present [`FaultConditions`]
//! from the sensor bank and control output. A fault is raised on the pass
//! its condition first appears. The core keeps one active fault slot:
//! a newly raised fault replaces the recorded one and the previous fault
//! is not queued. The record stays until [`FaultDetector::reset_fault`];
//! automatic control resumes as soon as the fatal condition is gone.
//! A channel is invalid once stale or after a rejected read, so a single
//! failed primary read raises `PrimarySensorTimeout` before the timeout.
//!
//! | Condition            | Fault                    | Effect                   |
//! |----------------------|--------------------------|--------------------------|
//! | return water invalid | `PrimarySensorTimeout`   | blocks automatic control |
//! | supply water stale   | `SupplySensorTimeout`    | degraded                 |
//! | ambient stale        | `AmbientSensorTimeout`   | degraded                 |
//! | \|pv − sp\| > 5 °C   | `SetpointDeviation`      | degraded                 |
//! | efficiency < limit   | `LowEfficiency`          | degraded                 |
//! | output pinned at max | `OutputSaturation`       | degraded                 |

use cryo_common::consts::SETPOINT_DEVIATION_LIMIT;
use cryo_common::control_unit::alarm::AlarmSeverity;
use cryo_common::control_unit::fault::{ActiveFault, FaultConditions, FaultKind};
use cryo_common::control_unit::sensor::TimestampMs;
use cryo_common::control_unit::state::ControlState;

use crate::io::EventLog;

/// Output must sit at its upper bound this long to count as saturated.
pub const SATURATION_WINDOW_MS: u64 = 60_000;

/// Raise order within one pass. The last raised fault owns the slot.
const RAISE_ORDER: [FaultKind; 6] = [
    FaultKind::SupplySensorTimeout,
    FaultKind::AmbientSensorTimeout,
    FaultKind::LowEfficiency,
    FaultKind::OutputSaturation,
    FaultKind::SetpointDeviation,
    FaultKind::PrimarySensorTimeout,
];

/// Readings the detector cross-checks in one pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DetectorInput {
    /// Valid return-water reading.
    pub return_water: Option<f64>,
    pub supply_valid: bool,
    pub ambient_valid: bool,
    /// Setpoint after compensation.
    pub setpoint: f64,
    /// Measured efficiency, `None` while the plant is not cooling.
    pub efficiency: Option<f64>,
    pub output: f64,
    pub output_max: f64,
    pub now: TimestampMs,
}

#[derive(Debug, Clone)]
pub struct FaultDetector {
    active: Option<ActiveFault>,
    conditions: FaultConditions,
    efficiency_threshold: f64,
    saturated_since: Option<TimestampMs>,
    raised_total: u64,
}

impl FaultDetector {
    pub const fn new(efficiency_threshold: f64) -> Self {
        Self {
            active: None,
            conditions: FaultConditions::empty(),
            efficiency_threshold,
            saturated_since: None,
            raised_total: 0,
        }
    }

    /// Run one detection pass. Returns the fault raised on this pass, if any.
    pub fn evaluate(&mut self, input: &DetectorInput, log: &mut dyn EventLog) -> Option<FaultKind> {
        let now = input.now;
        let mut present = FaultConditions::empty();
        let mut values = [0.0_f64; RAISE_ORDER.len()];

        match input.return_water {
            None => present |= FaultConditions::PRIMARY_SENSOR,
            Some(rw) => {
                let deviation = (rw - input.setpoint).abs();
                if deviation > SETPOINT_DEVIATION_LIMIT {
                    present |= FaultConditions::DEVIATION;
                    values[4] = deviation;
                }
            }
        }
        if !input.supply_valid {
            present |= FaultConditions::SUPPLY_SENSOR;
        }
        if !input.ambient_valid {
            present |= FaultConditions::AMBIENT_SENSOR;
        }
        if let Some(eff) = input.efficiency.filter(|e| *e < self.efficiency_threshold) {
            present |= FaultConditions::LOW_EFFICIENCY;
            values[2] = eff;
        }

        if input.output >= input.output_max {
            let since = *self.saturated_since.get_or_insert(now);
            if now.saturating_sub(since) >= SATURATION_WINDOW_MS {
                present |= FaultConditions::SATURATION;
                values[3] = input.output;
            }
        } else {
            self.saturated_since = None;
        }

        let appeared = present.difference(self.conditions);
        let resolved = self.conditions.difference(present);
        self.conditions = present;

        for kind in RAISE_ORDER {
            if resolved.contains(kind.condition()) {
                log.log_event(
                    "control",
                    &format!("{} condition resolved", kind.name()),
                    AlarmSeverity::Info,
                );
            }
        }

        let mut raised = None;
        for (i, kind) in RAISE_ORDER.into_iter().enumerate() {
            if appeared.contains(kind.condition()) {
                self.raise(kind, values[i], now, log);
                raised = Some(kind);
            }
        }
        raised
    }

    fn raise(&mut self, kind: FaultKind, value: f64, now: TimestampMs, log: &mut dyn EventLog) {
        if let Some(prev) = self.active.filter(|p| p.kind != kind) {
            log.log_event(
                "control",
                &format!("fault {} replaced by {}", prev.kind.name(), kind.name()),
                AlarmSeverity::Info,
            );
        }
        self.active = Some(ActiveFault {
            kind,
            raised_at: now,
            value,
        });
        self.raised_total += 1;
        log.log_event(
            "control",
            &format!("fault raised: {}", kind.name()),
            AlarmSeverity::Warning,
        );
    }

    /// Clear the recorded fault. Conditions still present re-raise on the next pass.
    pub fn reset_fault(&mut self, log: &mut dyn EventLog) -> Option<ActiveFault> {
        let cleared = self.active.take();
        self.conditions = FaultConditions::empty();
        self.saturated_since = None;
        if let Some(f) = cleared {
            log.log_event(
                "control",
                &format!("fault reset: {}", f.kind.name()),
                AlarmSeverity::Info,
            );
        }
        cleared
    }

    #[inline]
    pub const fn active(&self) -> Option<ActiveFault> {
        self.active
    }

    #[inline]
    pub const fn conditions(&self) -> FaultConditions {
        self.conditions
    }

    /// Automatic control must stop while a fatal condition is present.
    #[inline]
    pub const fn blocks_auto(&self) -> bool {
        self.conditions.is_fatal()
    }

    pub fn control_state(&self) -> ControlState {
        if self.conditions.is_fatal() {
            ControlState::Fault
        } else if !self.conditions.is_empty() || self.active.is_some() {
            ControlState::Degraded
        } else {
            ControlState::Normal
        }
    }

    #[inline]
    pub const fn raised_total(&self) -> u64 {
        self.raised_total
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
