//! Lumped-parameter chiller plant used by the binary and the tests.
//!
//! One well-mixed chilled-water loop: the building load heats it, the
//! compressors take heat out in proportion to the commanded capacity.
//! Refrigerant-side readings are simple functions of ambient and output.

use cryo_common::control_unit::inputs::{PlantTelemetry, SafetyInputs};
use cryo_common::control_unit::sensor::ChannelId;
use tracing::trace;

use crate::cycle::ActuatorCommand;
use crate::io::SensorSource;

/// Loop water mass × cp [kJ/K] (5 m³).
pub const LOOP_HEAT_CAPACITY: f64 = 20_930.0;
/// Chilled-water ṁ·cp [kW/K] (15 kg/s).
pub const FLOW_HEAT_RATE: f64 = 62.8;
/// Cooling at 100 % output [kW].
pub const RATED_CAPACITY_KW: f64 = 350.0;
/// Pumps and fans [kW].
pub const AUXILIARY_POWER_KW: f64 = 5.0;

const BASE_LOAD_KW: f64 = 220.0;
const LOAD_PER_DEGREE_KW: f64 = 2.0;

pub struct SimulatedChiller {
    return_water: f64,
    ambient: f64,
    output: f64,
    compressors: u8,
    running: u8,
    inputs: SafetyInputs,
    /// Channels forced to fail their reads.
    failed: Vec<ChannelId>,
}

impl SimulatedChiller {
    pub fn new(return_water: f64, ambient: f64, compressors: u8) -> Self {
        Self {
            return_water,
            ambient,
            output: 0.0,
            compressors,
            running: 0,
            inputs: SafetyInputs::empty(),
            failed: Vec::new(),
        }
    }

    pub fn set_ambient(&mut self, ambient: f64) {
        self.ambient = ambient;
    }

    pub fn set_return_water(&mut self, value: f64) {
        self.return_water = value;
    }

    pub fn set_inputs(&mut self, inputs: SafetyInputs) {
        self.inputs = inputs;
    }

    /// Make reads of `id` fail until [`restore`](Self::restore).
    pub fn fail(&mut self, id: ChannelId) {
        if !self.failed.contains(&id) {
            self.failed.push(id);
        }
    }

    pub fn restore(&mut self, id: ChannelId) {
        self.failed.retain(|c| *c != id);
    }

    pub fn return_water(&self) -> f64 {
        self.return_water
    }

    pub fn load_kw(&self) -> f64 {
        (BASE_LOAD_KW + LOAD_PER_DEGREE_KW * (self.ambient - 30.0)).max(0.0)
    }

    pub fn cooling_kw(&self) -> f64 {
        if self.running == 0 {
            return 0.0;
        }
        self.output / 100.0 * RATED_CAPACITY_KW
    }

    pub fn supply_water(&self) -> f64 {
        self.return_water - self.cooling_kw() / FLOW_HEAT_RATE
    }

    pub fn condenser(&self) -> f64 {
        self.ambient + 5.0 + 10.0 * self.output / 100.0
    }

    pub fn cop(&self) -> f64 {
        (4.5 - 0.05 * (self.condenser() - 35.0)).clamp(1.0, 5.0)
    }

    pub fn power_kw(&self) -> f64 {
        self.cooling_kw() / self.cop() + AUXILIARY_POWER_KW
    }

    /// Apply `cmd` and advance the loop by `dt_s` seconds.
    pub fn step(&mut self, cmd: &ActuatorCommand, dt_s: f64) {
        self.output = cmd.output.clamp(0.0, 100.0);
        self.running = cmd.compressor_stages.min(self.compressors);
        let net_kw = self.load_kw() - self.cooling_kw();
        self.return_water += net_kw * dt_s / LOOP_HEAT_CAPACITY;
        trace!(
            return_water = self.return_water,
            output = self.output,
            net_kw,
            "plant step"
        );
    }

    fn value(&self, id: ChannelId) -> f64 {
        match id {
            ChannelId::ReturnWater => self.return_water,
            ChannelId::SupplyWater => self.supply_water(),
            ChannelId::Ambient => self.ambient,
            ChannelId::Condenser => self.condenser(),
            ChannelId::DischargePressure => 4.0 + 0.3 * self.condenser(),
            ChannelId::SuctionPressure => 2.0 + 0.25 * self.supply_water(),
            ChannelId::Compressor(i) => {
                let load = if i < self.running { self.output } else { 0.0 };
                40.0 + 0.4 * load + 0.3 * (self.ambient - 30.0)
            }
        }
    }
}

impl SensorSource for SimulatedChiller {
    fn read_channel(&mut self, id: ChannelId) -> Option<f64> {
        if self.failed.contains(&id) {
            return None;
        }
        Some(self.value(id))
    }

    fn safety_inputs(&mut self) -> SafetyInputs {
        self.inputs
    }

    fn telemetry(&mut self) -> PlantTelemetry {
        PlantTelemetry {
            power_kw: self.power_kw(),
            cooling_kw: self.cooling_kw(),
        }
    }
}
