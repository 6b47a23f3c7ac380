//! Prelude module for common re-exports.
//!
//! ```rust
//! use cryo_common::prelude::*;
//! ```

// ─── Configuration ──────────────────────────────────────────────────
pub use crate::config::{ConfigError, ConfigLoader, LogLevel};
pub use crate::control_unit::config::ControlConfiguration;

// ─── Data Model ─────────────────────────────────────────────────────
pub use crate::control_unit::alarm::{AlarmId, AlarmSeverity, SafetyAlarm};
pub use crate::control_unit::fault::{ActiveFault, FaultKind};
pub use crate::control_unit::inputs::{PlantTelemetry, SafetyInputs};
pub use crate::control_unit::sensor::{ChannelId, SensorChannel, TimestampMs};
pub use crate::control_unit::state::{AlgorithmKind, OperatingMode, SafetyState, ShutdownCommand};
pub use crate::control_unit::status::{DisplayRegisters, StatusSnapshot};
pub use crate::ring::RingBuffer;
