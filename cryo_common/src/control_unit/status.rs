//! Status snapshot and display register image.
//!
//! Built by the control core at the end of a pass, persisted by the
//! storage collaborator and pushed to the remote display.

use serde::{Deserialize, Serialize};

use crate::consts::DISPLAY_SCALE;

use super::fault::FaultKind;
use super::state::{AlgorithmKind, OperatingMode, SafetyState};

/// Point-in-time view of the control core.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StatusSnapshot {
    pub timestamp: u64,
    /// Configured setpoint [°C].
    pub setpoint: f64,
    /// Setpoint after hot-climate compensation [°C].
    pub effective_setpoint: f64,
    pub compensation: f64,
    pub return_water: Option<f64>,
    pub supply_water: Option<f64>,
    pub ambient: Option<f64>,
    /// Control output after safety gating [%].
    pub output: f64,
    /// Normalised efficiency [0, 1].
    pub efficiency: f64,
    pub optimization_score: f64,
    /// Efficiency slope per control update over the recent window.
    pub efficiency_trend: f64,
    /// Electrical power slope per control update [kW].
    pub power_trend: f64,
    /// Return minus supply [°C].
    pub delta_t: f64,
    pub safety_state: SafetyState,
    pub mode: OperatingMode,
    pub algorithm: AlgorithmKind,
    pub active_fault: Option<FaultKind>,
    pub active_alarms: usize,
    pub lockout_remaining_ms: u64,
}

/// Fixed display register image; analog values are pre-scaled ×10.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DisplayRegisters {
    pub setpoint: i16,
    pub pid_output: i16,
    /// Efficiency in percent ×10.
    pub efficiency: i16,
    pub delta_t: i16,
    pub state: u16,
    pub mode: u16,
    pub fault_active: u16,
    pub fault_type: u16,
}

/// Scale a value for one decimal of display precision.
#[inline]
pub fn scale_for_display(value: f64) -> i16 {
    (value * DISPLAY_SCALE)
        .round()
        .clamp(i16::MIN as f64, i16::MAX as f64) as i16
}

impl From<&StatusSnapshot> for DisplayRegisters {
    fn from(s: &StatusSnapshot) -> Self {
        Self {
            setpoint: scale_for_display(s.setpoint),
            pid_output: scale_for_display(s.output),
            efficiency: scale_for_display(s.efficiency * 100.0),
            delta_t: scale_for_display(s.delta_t),
            state: s.safety_state as u16,
            mode: s.mode as u16,
            fault_active: s.active_fault.is_some() as u16,
            fault_type: s.active_fault.map_or(0, |k| k as u16),
        }
    }
}
