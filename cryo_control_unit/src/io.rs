//! Collaborator seams of the control core.
//!
//! The core never touches a bus, a file or a display directly. Each pass
//! it reads through a [`SensorSource`], reports through an [`EventLog`]
//! and pushes status to a [`StatusSink`]. Configuration persistence goes
//! through a [`ConfigStore`].

use std::path::{Path, PathBuf};

use cryo_common::config::{ConfigError, ConfigLoader, save_toml};
use cryo_common::control_unit::alarm::AlarmSeverity;
use cryo_common::control_unit::config::ControlConfiguration;
use cryo_common::control_unit::inputs::{PlantTelemetry, SafetyInputs};
use cryo_common::control_unit::sensor::ChannelId;
use cryo_common::control_unit::status::{DisplayRegisters, StatusSnapshot};
use tracing::{error, info, warn};

// ─── Sensor Source ──────────────────────────────────────────────────

/// Plant-side reader, polled once per sampling tick.
pub trait SensorSource {
    /// Latest reading of `id`, or `None` when the read failed.
    fn read_channel(&mut self, id: ChannelId) -> Option<f64>;

    fn safety_inputs(&mut self) -> SafetyInputs;

    fn telemetry(&mut self) -> PlantTelemetry;
}

// ─── Event Log ──────────────────────────────────────────────────────

/// Fire-and-forget event sink. The core never depends on its success.
pub trait EventLog {
    fn log_event(&mut self, subsystem: &str, message: &str, severity: AlarmSeverity);
}

/// Forwards events to `tracing` at a level matching the severity.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingEventLog;

impl EventLog for TracingEventLog {
    fn log_event(&mut self, subsystem: &str, message: &str, severity: AlarmSeverity) {
        match severity {
            AlarmSeverity::Info => info!(subsystem, "{message}"),
            AlarmSeverity::Warning => warn!(subsystem, "{message}"),
            AlarmSeverity::Alarm | AlarmSeverity::Critical | AlarmSeverity::Emergency => {
                error!(subsystem, severity = severity.name(), "{message}")
            }
        }
    }
}

/// One recorded event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggedEvent {
    pub subsystem: String,
    pub message: String,
    pub severity: AlarmSeverity,
}

/// Keeps every event in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryEventLog {
    pub events: Vec<LoggedEvent>,
}

impl MemoryEventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Events whose subsystem equals `subsystem`.
    pub fn for_subsystem<'a>(&'a self, subsystem: &'a str) -> impl Iterator<Item = &'a LoggedEvent> {
        self.events.iter().filter(move |e| e.subsystem == subsystem)
    }
}

impl EventLog for MemoryEventLog {
    fn log_event(&mut self, subsystem: &str, message: &str, severity: AlarmSeverity) {
        self.events.push(LoggedEvent {
            subsystem: subsystem.to_owned(),
            message: message.to_owned(),
            severity,
        });
    }
}

// ─── Status Sink ────────────────────────────────────────────────────

/// Receives the status snapshot and display image on the status cadence.
pub trait StatusSink {
    fn push(&mut self, snapshot: &StatusSnapshot, registers: &DisplayRegisters);
}

/// Keeps the most recent push.
#[derive(Debug, Clone, Default)]
pub struct LatestStatus {
    pub snapshot: Option<StatusSnapshot>,
    pub registers: DisplayRegisters,
    pub pushes: u64,
}

impl StatusSink for LatestStatus {
    fn push(&mut self, snapshot: &StatusSnapshot, registers: &DisplayRegisters) {
        self.snapshot = Some(*snapshot);
        self.registers = *registers;
        self.pushes += 1;
    }
}

// ─── Config Store ───────────────────────────────────────────────────

/// Persistent configuration storage.
pub trait ConfigStore {
    /// A validated configuration, or `None` meaning "use defaults".
    fn load(&mut self) -> Option<ControlConfiguration>;

    fn save(&mut self, config: &ControlConfiguration) -> bool;
}

/// TOML file backed store.
#[derive(Debug, Clone)]
pub struct TomlConfigStore {
    path: PathBuf,
}

impl TomlConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[inline]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load and validate, keeping the failure reason.
    pub fn try_load(&self) -> Result<ControlConfiguration, ConfigError> {
        let config = ControlConfiguration::load(&self.path)?;
        config.validate()?;
        Ok(config)
    }
}

impl ConfigStore for TomlConfigStore {
    fn load(&mut self) -> Option<ControlConfiguration> {
        match self.try_load() {
            Ok(config) => {
                info!(path = %self.path.display(), "configuration loaded");
                Some(config)
            }
            Err(ConfigError::FileNotFound) => {
                info!(path = %self.path.display(), "no configuration file, using defaults");
                None
            }
            Err(e) => {
                warn!(path = %self.path.display(), "configuration rejected ({e}), using defaults");
                None
            }
        }
    }

    fn save(&mut self, config: &ControlConfiguration) -> bool {
        match save_toml(config, &self.path) {
            Ok(()) => {
                info!(path = %self.path.display(), "configuration saved");
                true
            }
            Err(e) => {
                warn!(path = %self.path.display(), "configuration save failed: {e}");
                false
            }
        }
    }
}

/// Store that never persists anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoConfigStore;

impl ConfigStore for NoConfigStore {
    fn load(&mut self) -> Option<ControlConfiguration> {
        None
    }

    fn save(&mut self, _config: &ControlConfiguration) -> bool {
        false
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
