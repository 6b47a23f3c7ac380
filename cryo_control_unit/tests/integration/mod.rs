//! Shared closed-loop rig.

mod commands;
mod hot_climate;
mod lockout;
mod nominal_control;
mod sensor_fault;

use cryo_common::control_unit::config::ControlConfiguration;
use cryo_common::control_unit::sensor::TimestampMs;
use cryo_control_unit::command::{CommandContext, CommandError, CommandResponse, handle_line};
use cryo_control_unit::cycle::{ActuatorCommand, ControlCore, PassIo};
use cryo_control_unit::io::{LatestStatus, MemoryEventLog, NoConfigStore};
use cryo_control_unit::sim::SimulatedChiller;

/// Main loop period used by the rig [ms].
pub const PASS_MS: u64 = 500;

pub const MINUTE_MS: u64 = 60_000;

/// Control core wired to the plant model with in-memory collaborators.
pub struct Rig {
    pub core: ControlCore,
    pub plant: SimulatedChiller,
    pub events: MemoryEventLog,
    pub status: LatestStatus,
    /// Time of the next pass.
    pub now: TimestampMs,
    pub last: ActuatorCommand,
}

impl Rig {
    pub fn new(config: ControlConfiguration, return_water: f64, ambient: f64) -> Self {
        let plant = SimulatedChiller::new(return_water, ambient, config.compressor_count);
        Self {
            core: ControlCore::new(config, 0).expect("valid configuration"),
            plant,
            events: MemoryEventLog::new(),
            status: LatestStatus::default(),
            now: 0,
            last: ActuatorCommand::default(),
        }
    }

    /// Default configuration.
    pub fn nominal(return_water: f64, ambient: f64) -> Self {
        Self::new(ControlConfiguration::default(), return_water, ambient)
    }

    /// Step the plant by one period, then run one pass.
    pub fn pass(&mut self) -> ActuatorCommand {
        self.plant.step(&self.last, PASS_MS as f64 / 1000.0);
        let mut io = PassIo {
            sensors: &mut self.plant,
            events: &mut self.events,
            status: &mut self.status,
        };
        self.last = self.core.run_pass(&mut io, self.now);
        self.now += PASS_MS;
        self.last
    }

    pub fn run_for(&mut self, ms: u64) {
        let end = self.now + ms;
        while self.now < end {
            self.pass();
        }
    }

    /// Run until `done` holds after a pass, for at most `limit_ms`.
    pub fn run_until(&mut self, limit_ms: u64, mut done: impl FnMut(&Rig) -> bool) -> bool {
        let end = self.now + limit_ms;
        while self.now < end {
            self.pass();
            if done(self) {
                return true;
            }
        }
        false
    }

    /// Send one command line at the time of the next pass.
    pub fn command(&mut self, line: &str) -> Result<CommandResponse, CommandError> {
        let mut store = NoConfigStore;
        let mut ctx = CommandContext {
            events: &mut self.events,
            store: &mut store,
        };
        handle_line(&mut self.core, line, &mut ctx, self.now)
    }
}
