//! Interlock checks, grouped by cadence.
//!
//! Each check reports whether its condition is present and at which
//! severity. The checks are pure: applying results to the alarm table is
//! the interlock machine's job.
//!
//! - fast: emergency stop, motor thermal, compressor overload,
//!   high-pressure switch, freeze protection
//! - normal: water temperatures, condenser, refrigerant pressures, flow,
//!   phase, low-pressure switch
//! - slow: return-water rise rate, compressor over-temperature, ambient,
//!   primary sensor failure

use cryo_common::consts::MAX_COMPRESSORS;
use cryo_common::control_unit::alarm::{AlarmId, AlarmSeverity};
use cryo_common::control_unit::config::SafetyLimits;
use cryo_common::control_unit::inputs::SafetyInputs;

/// Read-only view of the plant handed to the interlock each pass.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SafetySnapshot {
    pub return_water: Option<f64>,
    pub supply_water: Option<f64>,
    pub ambient: Option<f64>,
    pub condenser: Option<f64>,
    pub discharge_pressure: Option<f64>,
    pub suction_pressure: Option<f64>,
    pub compressor_temps: [Option<f64>; MAX_COMPRESSORS],
    pub compressor_count: u8,
    pub inputs: SafetyInputs,
}

/// Present condition of one check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Condition {
    pub severity: AlarmSeverity,
    /// Auxiliary data word stored with the alarm.
    pub data: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckResult {
    pub id: AlarmId,
    /// `None` when the condition is absent.
    pub condition: Option<Condition>,
}

impl CheckResult {
    #[inline]
    const fn when(id: AlarmId, present: bool, severity: AlarmSeverity, data: u16) -> Self {
        Self {
            id,
            condition: if present {
                Some(Condition { severity, data })
            } else {
                None
            },
        }
    }
}

/// Reading ×10 as an alarm data word.
#[inline]
fn scaled(value: f64) -> u16 {
    (value * 10.0).round().clamp(0.0, u16::MAX as f64) as u16
}

/// Two-band high check: `>= upper` → `upper_sev`, `>= lower` → `lower_sev`.
fn high_bands(
    id: AlarmId,
    value: Option<f64>,
    lower: (f64, AlarmSeverity),
    upper: (f64, AlarmSeverity),
) -> CheckResult {
    let severity = match value {
        Some(v) if v >= upper.0 => Some(upper.1),
        Some(v) if v >= lower.0 => Some(lower.1),
        _ => None,
    };
    CheckResult {
        id,
        condition: severity.map(|severity| Condition {
            severity,
            data: value.map_or(0, scaled),
        }),
    }
}

fn low_check(id: AlarmId, value: Option<f64>, limit: f64, severity: AlarmSeverity) -> CheckResult {
    match value {
        Some(v) if v < limit => CheckResult::when(id, true, severity, scaled(v)),
        _ => CheckResult::when(id, false, severity, 0),
    }
}

/// Installed-compressor mask.
#[inline]
fn installed_mask(count: u8) -> u16 {
    (1u16 << count.min(MAX_COMPRESSORS as u8)) - 1
}

/// Fast cadence (≈100 ms). `estop_latched` is the consumed interrupt flag.
pub fn fast_checks(s: &SafetySnapshot, limits: &SafetyLimits, estop_latched: bool) -> [CheckResult; 5] {
    use AlarmSeverity as S;
    let overloads = s.inputs.overload_bits() & installed_mask(s.compressor_count);
    let freeze = s.supply_water.filter(|v| *v <= limits.freeze_limit);
    [
        CheckResult::when(
            AlarmId::EmergencyStop,
            estop_latched || s.inputs.contains(SafetyInputs::EMERGENCY_STOP),
            S::Emergency,
            0,
        ),
        CheckResult::when(
            AlarmId::MotorThermal,
            s.inputs.contains(SafetyInputs::MOTOR_THERMAL),
            S::Critical,
            0,
        ),
        CheckResult::when(AlarmId::CompressorOverload, overloads != 0, S::Critical, overloads),
        CheckResult::when(
            AlarmId::HighPressureSwitch,
            s.inputs.contains(SafetyInputs::HIGH_PRESSURE_SWITCH),
            S::Critical,
            0,
        ),
        CheckResult::when(
            AlarmId::FreezeProtection,
            freeze.is_some(),
            S::Critical,
            freeze.map_or(0, scaled),
        ),
    ]
}

/// Normal cadence (≈1 s).
pub fn normal_checks(s: &SafetySnapshot, limits: &SafetyLimits) -> [CheckResult; 8] {
    use AlarmSeverity as S;
    [
        high_bands(
            AlarmId::ReturnWaterHigh,
            s.return_water,
            (limits.return_water_warning, S::Warning),
            (limits.return_water_alarm, S::Alarm),
        ),
        low_check(AlarmId::SupplyWaterLow, s.supply_water, limits.supply_water_low, S::Alarm),
        high_bands(
            AlarmId::CondenserHigh,
            s.condenser,
            (limits.condenser_alarm, S::Alarm),
            (limits.condenser_critical, S::Critical),
        ),
        high_bands(
            AlarmId::DischargePressureHigh,
            s.discharge_pressure,
            (limits.discharge_alarm, S::Alarm),
            (limits.discharge_critical, S::Critical),
        ),
        low_check(AlarmId::SuctionPressureLow, s.suction_pressure, limits.suction_low, S::Alarm),
        CheckResult::when(
            AlarmId::WaterFlowLoss,
            s.inputs.contains(SafetyInputs::FLOW_LOSS),
            S::Alarm,
            0,
        ),
        CheckResult::when(
            AlarmId::PhaseFailure,
            s.inputs.contains(SafetyInputs::PHASE_FAILURE),
            S::Critical,
            0,
        ),
        CheckResult::when(
            AlarmId::LowPressureSwitch,
            s.inputs.contains(SafetyInputs::LOW_PRESSURE_SWITCH),
            S::Alarm,
            0,
        ),
    ]
}

/// Slow cadence (≈5 s). `rise_rate` is the return-water trend [°C/min].
pub fn slow_checks(s: &SafetySnapshot, limits: &SafetyLimits, rise_rate: Option<f64>) -> [CheckResult; 4] {
    use AlarmSeverity as S;
    let rising = rise_rate.filter(|r| *r >= limits.rise_rate_warning);

    let mut hot_mask = 0u16;
    for (i, t) in s
        .compressor_temps
        .iter()
        .enumerate()
        .take(s.compressor_count as usize)
    {
        if t.is_some_and(|t| t >= limits.compressor_over_temp) {
            hot_mask |= 1 << i;
        }
    }

    let ambient_high = s.ambient.filter(|a| *a >= limits.ambient_warning);
    [
        CheckResult::when(
            AlarmId::ReturnWaterRising,
            rising.is_some(),
            S::Warning,
            rising.map_or(0, scaled),
        ),
        CheckResult::when(AlarmId::CompressorOverTemp, hot_mask != 0, S::Alarm, hot_mask),
        CheckResult::when(
            AlarmId::AmbientHigh,
            ambient_high.is_some(),
            S::Warning,
            ambient_high.map_or(0, scaled),
        ),
        CheckResult::when(AlarmId::SensorFailure, s.return_water.is_none(), S::Alarm, 0),
    ]
}

// ─── Tests ──────────────────────────────────────────────────────────
