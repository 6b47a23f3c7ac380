//! State enums for the control core.
//!
//! All enums use `#[repr(u8)]` so they can be pushed to the display as a
//! plain register value.

use serde::{Deserialize, Serialize};

use super::alarm::AlarmSeverity;

// ─── Safety State ───────────────────────────────────────────────────

/// Interlock state, ranked by severity.
///
/// Derived each evaluation as the maximum severity of the active alarms.
/// `Lockout` only follows an explicit trip and holds until its timer
/// expires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum SafetyState {
    #[default]
    Normal = 0,
    Warning = 1,
    Alarm = 2,
    Critical = 3,
    Emergency = 4,
    Lockout = 5,
}

impl SafetyState {
    /// State implied by a single alarm severity.
    #[inline]
    pub const fn from_severity(severity: AlarmSeverity) -> Self {
        match severity {
            AlarmSeverity::Info => Self::Normal,
            AlarmSeverity::Warning => Self::Warning,
            AlarmSeverity::Alarm => Self::Alarm,
            AlarmSeverity::Critical => Self::Critical,
            AlarmSeverity::Emergency => Self::Emergency,
        }
    }

    pub const fn name(&self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Warning => "warning",
            Self::Alarm => "alarm",
            Self::Critical => "critical",
            Self::Emergency => "emergency",
            Self::Lockout => "lockout",
        }
    }
}

// ─── Operating Mode ─────────────────────────────────────────────────

/// How the output percentage is produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum OperatingMode {
    /// Controller disabled, output 0 %.
    Off = 0,
    /// Operator supplied output.
    Manual = 1,
    /// Selected control algorithm.
    #[default]
    Auto = 2,
}

impl OperatingMode {
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Off => "off",
            Self::Manual => "manual",
            Self::Auto => "auto",
        }
    }
}

// ─── Control Algorithm ──────────────────────────────────────────────

/// Selectable output-generation strategy for automatic mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum AlgorithmKind {
    #[default]
    BasicPid = 0,
    AdaptivePid = 1,
    Predictive = 2,
    FuzzyLogic = 3,
    /// Fixed 0.7 PID / 0.3 fuzzy blend.
    Hybrid = 4,
}

impl AlgorithmKind {
    pub const ALL: [AlgorithmKind; 5] = [
        Self::BasicPid,
        Self::AdaptivePid,
        Self::Predictive,
        Self::FuzzyLogic,
        Self::Hybrid,
    ];

    pub const fn name(&self) -> &'static str {
        match self {
            Self::BasicPid => "basic",
            Self::AdaptivePid => "adaptive",
            Self::Predictive => "predictive",
            Self::FuzzyLogic => "fuzzy",
            Self::Hybrid => "hybrid",
        }
    }

    /// Parse the short command name (`basic`, `adaptive`, ...).
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.name() == name)
    }
}

// ─── Control State ──────────────────────────────────────────────────

/// Health of the automatic control path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum ControlState {
    /// No control fault.
    #[default]
    Normal = 0,
    /// A control or secondary sensor fault is recorded; control continues.
    Degraded = 1,
    /// Primary sensor lost; automatic control blocked.
    Fault = 2,
}

// ─── Shutdown ───────────────────────────────────────────────────────

/// Shutdown request issued by the interlock in place of a control output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum ShutdownCommand {
    /// Orderly compressor unload and stop.
    Controlled = 1,
    /// Immediate de-energise of all compressors.
    Emergency = 2,
}
