//! Control fault types.
//!
//! The control core keeps a single active fault slot: raising a new fault
//! replaces the recorded one. Conditions that are currently present are
//! tracked separately as [`FaultConditions`] bitflags so escalation does
//! not depend on which fault happened to be raised last.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use super::sensor::TimestampMs;

/// Typed control fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum FaultKind {
    /// Return-water channel stale or invalid. Blocks automatic control.
    PrimarySensorTimeout = 1,
    SupplySensorTimeout = 2,
    AmbientSensorTimeout = 3,
    /// Return water further than the fixed limit from the setpoint.
    SetpointDeviation = 4,
    /// Efficiency below the configured threshold.
    LowEfficiency = 5,
    /// Output pinned at a bound for the whole saturation window.
    OutputSaturation = 6,
}

impl FaultKind {
    pub const fn name(&self) -> &'static str {
        match self {
            Self::PrimarySensorTimeout => "primary_sensor_timeout",
            Self::SupplySensorTimeout => "supply_sensor_timeout",
            Self::AmbientSensorTimeout => "ambient_sensor_timeout",
            Self::SetpointDeviation => "setpoint_deviation",
            Self::LowEfficiency => "low_efficiency",
            Self::OutputSaturation => "output_saturation",
        }
    }

    /// Condition bit matching this fault.
    pub const fn condition(&self) -> FaultConditions {
        match self {
            Self::PrimarySensorTimeout => FaultConditions::PRIMARY_SENSOR,
            Self::SupplySensorTimeout => FaultConditions::SUPPLY_SENSOR,
            Self::AmbientSensorTimeout => FaultConditions::AMBIENT_SENSOR,
            Self::SetpointDeviation => FaultConditions::DEVIATION,
            Self::LowEfficiency => FaultConditions::LOW_EFFICIENCY,
            Self::OutputSaturation => FaultConditions::SATURATION,
        }
    }
}

/// The recorded fault. Persists until explicitly reset.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ActiveFault {
    pub kind: FaultKind,
    pub raised_at: TimestampMs,
    /// Reading that triggered the fault (deviation, efficiency, ...).
    pub value: f64,
}

bitflags! {
    /// Fault conditions present in the latest detection pass.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct FaultConditions: u8 {
        const PRIMARY_SENSOR = 0x01;
        const SUPPLY_SENSOR  = 0x02;
        const AMBIENT_SENSOR = 0x04;
        const DEVIATION      = 0x08;
        const LOW_EFFICIENCY = 0x10;
        const SATURATION     = 0x20;
    }
}

impl FaultConditions {
    /// Conditions that stop automatic control.
    pub const FATAL_MASK: Self = Self::PRIMARY_SENSOR;

    #[inline]
    pub const fn is_fatal(&self) -> bool {
        self.intersects(Self::FATAL_MASK)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_primary_sensor_is_fatal() {
        assert!(FaultKind::PrimarySensorTimeout.condition().is_fatal());
        assert!(!FaultKind::SupplySensorTimeout.condition().is_fatal());
        assert!(!FaultKind::SetpointDeviation.condition().is_fatal());
        assert!(!(FaultConditions::DEVIATION | FaultConditions::LOW_EFFICIENCY).is_fatal());
    }
}
