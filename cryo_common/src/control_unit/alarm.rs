//! Alarm catalog and alarm records.
//!
//! Alarm ids are a fixed enumeration grouped by category (high byte of
//! the code). Each id has a catalog description and a latching policy.

use serde::{Deserialize, Serialize};
use static_assertions::const_assert;

use crate::consts::MAX_ACTIVE_ALARMS;

use super::sensor::TimestampMs;

// ─── Severity ───────────────────────────────────────────────────────

/// Alarm severity, ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum AlarmSeverity {
    #[default]
    Info = 0,
    Warning = 1,
    Alarm = 2,
    Critical = 3,
    Emergency = 4,
}

impl AlarmSeverity {
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Alarm => "alarm",
            Self::Critical => "critical",
            Self::Emergency => "emergency",
        }
    }
}

// ─── Catalog ────────────────────────────────────────────────────────

/// Alarm category (high byte of [`AlarmId::code`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AlarmCategory {
    System,
    Temperature,
    Pressure,
    Compressor,
}

/// Enumerated alarm catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u16)]
pub enum AlarmId {
    // System
    EmergencyStop = 0x0101,
    PhaseFailure = 0x0102,
    SensorFailure = 0x0103,
    // Temperature
    ReturnWaterHigh = 0x0201,
    SupplyWaterLow = 0x0202,
    FreezeProtection = 0x0203,
    CondenserHigh = 0x0204,
    AmbientHigh = 0x0205,
    ReturnWaterRising = 0x0206,
    // Pressure
    DischargePressureHigh = 0x0301,
    SuctionPressureLow = 0x0302,
    HighPressureSwitch = 0x0303,
    LowPressureSwitch = 0x0304,
    WaterFlowLoss = 0x0305,
    // Compressor
    CompressorOverload = 0x0401,
    CompressorOverTemp = 0x0402,
    MotorThermal = 0x0403,
}

impl AlarmId {
    pub const ALL: [AlarmId; 17] = [
        Self::EmergencyStop,
        Self::PhaseFailure,
        Self::SensorFailure,
        Self::ReturnWaterHigh,
        Self::SupplyWaterLow,
        Self::FreezeProtection,
        Self::CondenserHigh,
        Self::AmbientHigh,
        Self::ReturnWaterRising,
        Self::DischargePressureHigh,
        Self::SuctionPressureLow,
        Self::HighPressureSwitch,
        Self::LowPressureSwitch,
        Self::WaterFlowLoss,
        Self::CompressorOverload,
        Self::CompressorOverTemp,
        Self::MotorThermal,
    ];

    #[inline]
    pub const fn code(&self) -> u16 {
        *self as u16
    }

    pub const fn category(&self) -> AlarmCategory {
        match self.code() >> 8 {
            0x01 => AlarmCategory::System,
            0x02 => AlarmCategory::Temperature,
            0x03 => AlarmCategory::Pressure,
            _ => AlarmCategory::Compressor,
        }
    }

    pub const fn description(&self) -> &'static str {
        match self {
            Self::EmergencyStop => "Emergency stop activated",
            Self::PhaseFailure => "Supply phase loss or reversal",
            Self::SensorFailure => "Primary temperature sensor failure",
            Self::ReturnWaterHigh => "Return water temperature high",
            Self::SupplyWaterLow => "Supply water temperature low",
            Self::FreezeProtection => "Evaporator freeze protection",
            Self::CondenserHigh => "Condenser temperature high",
            Self::AmbientHigh => "Ambient temperature high",
            Self::ReturnWaterRising => "Return water temperature rising",
            Self::DischargePressureHigh => "Discharge pressure high",
            Self::SuctionPressureLow => "Suction pressure low",
            Self::HighPressureSwitch => "High pressure switch tripped",
            Self::LowPressureSwitch => "Low pressure switch tripped",
            Self::WaterFlowLoss => "Chilled water flow lost",
            Self::CompressorOverload => "Compressor overload relay tripped",
            Self::CompressorOverTemp => "Compressor over temperature",
            Self::MotorThermal => "Compressor motor thermal trip",
        }
    }

    /// Snake-case name used by remote commands.
    pub fn name(&self) -> &'static str {
        match self {
            Self::EmergencyStop => "emergency_stop",
            Self::PhaseFailure => "phase_failure",
            Self::SensorFailure => "sensor_failure",
            Self::ReturnWaterHigh => "return_water_high",
            Self::SupplyWaterLow => "supply_water_low",
            Self::FreezeProtection => "freeze_protection",
            Self::CondenserHigh => "condenser_high",
            Self::AmbientHigh => "ambient_high",
            Self::ReturnWaterRising => "return_water_rising",
            Self::DischargePressureHigh => "discharge_pressure_high",
            Self::SuctionPressureLow => "suction_pressure_low",
            Self::HighPressureSwitch => "high_pressure_switch",
            Self::LowPressureSwitch => "low_pressure_switch",
            Self::WaterFlowLoss => "water_flow_loss",
            Self::CompressorOverload => "compressor_overload",
            Self::CompressorOverTemp => "compressor_over_temp",
            Self::MotorThermal => "motor_thermal",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|id| id.name() == name)
    }

    pub fn from_code(code: u16) -> Option<Self> {
        Self::ALL.into_iter().find(|id| id.code() == code)
    }
}

// Every catalog entry must fit in the active table at once.
const_assert!(AlarmId::ALL.len() <= MAX_ACTIVE_ALARMS);

// ─── Alarm Record ───────────────────────────────────────────────────

/// One alarm occurrence.
///
/// The active table holds the live copy (acknowledge flips a flag);
/// the history log holds immutable copies taken at raise time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SafetyAlarm {
    pub id: AlarmId,
    pub severity: AlarmSeverity,
    /// Raise time on the shared clock.
    pub timestamp: TimestampMs,
    pub active: bool,
    pub acknowledged: bool,
    /// Auxiliary data (compressor bitmask, scaled reading, ...).
    pub data: u16,
}

impl SafetyAlarm {
    pub const fn new(id: AlarmId, severity: AlarmSeverity, data: u16, now: TimestampMs) -> Self {
        Self {
            id,
            severity,
            timestamp: now,
            active: true,
            acknowledged: false,
            data,
        }
    }

    #[inline]
    pub const fn description(&self) -> &'static str {
        self.id.description()
    }

    /// Critical and emergency alarms stay active until explicitly cleared.
    #[inline]
    pub fn is_latching(&self) -> bool {
        self.severity >= AlarmSeverity::Critical
    }
}
