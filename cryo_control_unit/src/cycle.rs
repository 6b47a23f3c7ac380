//! Control core: one cooperative pass over the whole controller.
//!
//! ## Pass order
//! 1. Sensor update (sample cadence) and digital safety inputs.
//! 2. Operator mode changes (every pass).
//! 3. Fault detection (control cadence).
//! 4. Compensation, gain scheduling and strategy output (control cadence).
//! 5. Safety interlock evaluation, every pass, on this pass's decision.
//! 6. Actuator dispatch, gated by [`InterlockMachine::can_operate`].
//! 7. Status push (status cadence).
//!
//! Every step is a bounded computation over already-sampled data. The
//! only cross-thread input is the [`EmergencyStopLatch`], which the fast
//! interlock check consumes.

use std::sync::Arc;
use std::time::Instant;

use cryo_common::control_unit::alarm::{AlarmId, AlarmSeverity};
use cryo_common::control_unit::config::{
    AMBIENT_BASELINE_MAX, AMBIENT_BASELINE_MIN, ControlConfiguration, DEADBAND_MAX,
    EFFICIENCY_TARGET_MAX, EFFICIENCY_TARGET_MIN, LEARNING_RATE_MAX, SETPOINT_MAX, SETPOINT_MIN,
};
use cryo_common::control_unit::fault::ActiveFault;
use cryo_common::control_unit::inputs::{EmergencyStopLatch, PlantTelemetry, SafetyInputs};
use cryo_common::control_unit::sensor::{ChannelId, TimestampMs};
use cryo_common::control_unit::state::{
    AlgorithmKind, ControlState, OperatingMode, ShutdownCommand,
};
use cryo_common::control_unit::status::{DisplayRegisters, StatusSnapshot};
use serde::Serialize;
use tracing::debug;

use crate::cadence::Cadence;
use crate::control::analytics::{
    DEFAULT_TREND_SAMPLES, PerformanceAnalytics, TREND_TOLERANCE, Trend,
};
use crate::control::compensation::{GainScheduler, compensation, effective_setpoint};
use crate::control::optimization::{OptimizationEngine, efficiency};
use crate::control::pid::PidGains;
use crate::control::strategy::{ControlAlgorithm, StrategyInput, StrategyParams};
use crate::error::CoreError;
use crate::error::detector::{DetectorInput, FaultDetector};
use crate::io::{ConfigStore, EventLog, SensorSource, StatusSink};
use crate::safety::alarms::AlarmTable;
use crate::safety::checks::SafetySnapshot;
use crate::safety::interlock::InterlockMachine;
use crate::sensor::SensorBank;

const SUBSYSTEM: &str = "control";

// ─── Cycle Statistics ───────────────────────────────────────────────

/// Per-pass counters. O(1), no allocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct CycleStats {
    pub passes: u64,
    /// Passes that ran the control step.
    pub control_updates: u64,
    pub last_pass_ns: u64,
    pub max_pass_ns: u64,
    /// Passes whose output was forced to the safe value.
    pub forced_safe: u64,
}

impl CycleStats {
    pub const fn new() -> Self {
        Self {
            passes: 0,
            control_updates: 0,
            last_pass_ns: 0,
            max_pass_ns: 0,
            forced_safe: 0,
        }
    }

    #[inline]
    pub fn record(&mut self, duration_ns: u64) {
        self.passes += 1;
        self.last_pass_ns = duration_ns;
        self.max_pass_ns = self.max_pass_ns.max(duration_ns);
    }
}

// ─── Actuator Command ───────────────────────────────────────────────

/// What the relay/actuator collaborator applies after a pass.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct ActuatorCommand {
    /// Capacity demand after safety gating [%].
    pub output: f64,
    /// Compressors to run.
    pub compressor_stages: u8,
    pub pump: bool,
    /// Any unacknowledged alarm at alarm severity or above.
    pub alarm_horn: bool,
    pub shutdown: Option<ShutdownCommand>,
}

/// Compressors needed for `output`, split evenly over `count`.
pub fn compressor_stages(output: f64, count: u8) -> u8 {
    if output <= 0.0 || count == 0 {
        return 0;
    }
    let stages = (output / 100.0 * count as f64).ceil();
    stages.clamp(1.0, count as f64) as u8
}

/// Collaborators touched during one pass.
pub struct PassIo<'a> {
    pub sensors: &'a mut dyn SensorSource,
    pub events: &'a mut dyn EventLog,
    pub status: &'a mut dyn StatusSink,
}

// ─── Control Core ───────────────────────────────────────────────────

/// Owns every piece of controller state. Nothing is reachable globally.
pub struct ControlCore {
    config: ControlConfiguration,
    nominal_gains: PidGains,
    sensors: SensorBank,
    algorithm: ControlAlgorithm,
    scheduler: GainScheduler,
    optimizer: OptimizationEngine,
    analytics: PerformanceAnalytics,
    detector: FaultDetector,
    interlock: InterlockMachine,
    estop: Arc<EmergencyStopLatch>,

    mode: OperatingMode,
    inputs: SafetyInputs,
    telemetry: PlantTelemetry,
    compensation: f64,
    effective_setpoint: f64,
    /// Strategy output before safety gating.
    commanded: f64,
    command: ActuatorCommand,

    sample_cadence: Cadence,
    control_cadence: Cadence,
    status_cadence: Cadence,
    stats: CycleStats,
}

impl ControlCore {
    /// Validate `config` and build the core with its clock at `now`.
    pub fn new(config: ControlConfiguration, now: TimestampMs) -> Result<Self, CoreError> {
        let opt = &config.optimization;
        if !(EFFICIENCY_TARGET_MIN..=EFFICIENCY_TARGET_MAX).contains(&opt.efficiency_target) {
            return Err(CoreError::InvalidParameter {
                name: "efficiency_target",
                value: opt.efficiency_target,
            });
        }
        if !(opt.learning_rate > 0.0 && opt.learning_rate <= LEARNING_RATE_MAX) {
            return Err(CoreError::InvalidParameter {
                name: "learning_rate",
                value: opt.learning_rate,
            });
        }
        let baseline = config.compensation.ambient_baseline;
        if !(AMBIENT_BASELINE_MIN..=AMBIENT_BASELINE_MAX).contains(&baseline) {
            return Err(CoreError::InvalidParameter {
                name: "ambient_baseline",
                value: baseline,
            });
        }
        config.validate()?;

        let params = StrategyParams {
            tuning: config.pid,
            gains: None,
            learning_rate: opt.learning_rate,
            deadband: config.deadband,
        };
        let optimizer =
            OptimizationEngine::new(opt, config.timing.optimization_interval_ms, now)?;

        Ok(Self {
            nominal_gains: PidGains::from(&config.pid),
            sensors: SensorBank::new(config.timing.fault_timeout_ms, config.compressor_count),
            algorithm: ControlAlgorithm::new(config.algorithm, &params, now),
            scheduler: GainScheduler::new(),
            optimizer,
            analytics: PerformanceAnalytics::new(),
            detector: FaultDetector::new(opt.efficiency_threshold),
            interlock: InterlockMachine::new(config.safety),
            estop: Arc::new(EmergencyStopLatch::new()),
            mode: config.operating_mode(),
            inputs: SafetyInputs::empty(),
            telemetry: PlantTelemetry::default(),
            compensation: 0.0,
            effective_setpoint: config.setpoint,
            commanded: 0.0,
            command: ActuatorCommand::default(),
            sample_cadence: Cadence::new(config.timing.sample_period_ms),
            control_cadence: Cadence::new(config.timing.pid_period_ms),
            status_cadence: Cadence::new(config.timing.status_period_ms),
            stats: CycleStats::new(),
            config,
        })
    }

    /// Build from the store's configuration, or defaults when it has none.
    pub fn from_store(store: &mut dyn ConfigStore, now: TimestampMs) -> Result<Self, CoreError> {
        let config = store.load().unwrap_or_default();
        Self::new(config, now)
    }

    /// Run one pass.
    pub fn run_pass(&mut self, io: &mut PassIo<'_>, now: TimestampMs) -> ActuatorCommand {
        let started = Instant::now();

        // ═══ SENSORS ═══
        if self.sample_cadence.take_due(now) {
            self.sensors.sample_all(io.sensors, now);
            self.telemetry = io.sensors.telemetry();
        }
        self.inputs = io.sensors.safety_inputs();

        // ═══ OPERATOR MODE ═══
        self.apply_mode(now, io.events);

        // ═══ FAULTS + STRATEGY ═══
        if self.control_cadence.take_due(now) {
            self.control_step(now, io.events);
            self.stats.control_updates += 1;
        }

        // ═══ SAFETY ═══
        let snapshot = self.safety_snapshot(now);
        self.interlock
            .evaluate(&snapshot, &self.estop, now, io.events);

        // ═══ DISPATCH ═══
        self.command = self.dispatch();

        // ═══ STATUS ═══
        if self.status_cadence.take_due(now) {
            let snap = self.snapshot(now);
            io.status.push(&snap, &DisplayRegisters::from(&snap));
        }

        self.stats
            .record(started.elapsed().as_nanos().min(u64::MAX as u128) as u64);
        self.command
    }

    fn control_step(&mut self, now: TimestampMs, log: &mut dyn EventLog) {
        let return_water = self.sensors.reading(ChannelId::ReturnWater, now);
        let ambient = self.sensors.reading(ChannelId::Ambient, now);

        // ── Compensation & gain schedule ──
        let cfg = &self.config.compensation;
        self.compensation = ambient.map_or(0.0, |a| compensation(cfg, a));
        self.effective_setpoint = effective_setpoint(self.config.setpoint, cfg, ambient);

        if let Some(band) = ambient.and_then(|a| self.scheduler.update(a)) {
            let gains = band.schedule(self.nominal_gains);
            if let Some(pid) = self.algorithm.pid_mut() {
                pid.set_gains(gains);
            }
            log.log_event(
                SUBSYSTEM,
                &format!(
                    "ambient band {:?}: kp {:.3} ki {:.3}",
                    band, gains.kp, gains.ki
                ),
                AlarmSeverity::Info,
            );
        }

        // ── Metrics ──
        let eff = efficiency(&self.telemetry);
        let load = self.load_factor();
        self.analytics.record(eff, self.telemetry.power_kw, load);

        // ── Faults ──
        let cooling = self.telemetry.power_kw > 0.0 && self.telemetry.cooling_kw > 0.0;
        self.detector.evaluate(
            &DetectorInput {
                return_water,
                supply_valid: self.sensors.valid(ChannelId::SupplyWater, now),
                ambient_valid: self.sensors.valid(ChannelId::Ambient, now),
                setpoint: self.effective_setpoint,
                efficiency: cooling.then_some(eff),
                output: self.commanded,
                output_max: self.config.pid.output_max,
                now,
            },
            log,
        );

        let mode = self.mode;
        self.commanded = match mode {
            OperatingMode::Off => 0.0,
            OperatingMode::Manual => self.config.manual_output,
            OperatingMode::Auto => self.auto_output(return_water, load, now),
        };

        // ── Optimisation ──
        if mode == OperatingMode::Auto && self.optimizer.is_due(now, load) {
            let nudged = self
                .optimizer
                .run(&self.telemetry, self.algorithm.pid_mut(), now);
            let slope = self.analytics.efficiency_trend(DEFAULT_TREND_SAMPLES);
            debug!(
                trend = ?Trend::classify(slope, TREND_TOLERANCE),
                slope,
                average_efficiency = self.analytics.average_efficiency(),
                nudged,
                "efficiency trend"
            );
        }
    }

    fn auto_output(&mut self, return_water: Option<f64>, load: f64, now: TimestampMs) -> f64 {
        let Some(pv) = return_water.filter(|_| !self.detector.blocks_auto()) else {
            self.algorithm.hold(now);
            return 0.0;
        };
        if (pv - self.effective_setpoint).abs() <= self.config.deadband {
            self.algorithm.hold(now);
            return self.commanded;
        }
        self.algorithm.compute(&StrategyInput {
            setpoint: self.effective_setpoint,
            process_value: pv,
            load_factor: load,
            average_load: self.analytics.average_load(),
            now,
        })
    }

    /// Mode changes and manual values act on the pass they are made. Auto
    /// output waits for the next control update.
    fn apply_mode(&mut self, now: TimestampMs, log: &mut dyn EventLog) {
        let mode = self.config.operating_mode();
        if mode != self.mode {
            self.change_mode(mode, now, log);
        }
        match mode {
            OperatingMode::Off => self.commanded = 0.0,
            OperatingMode::Manual => self.commanded = self.config.manual_output,
            OperatingMode::Auto => {}
        }
    }

    fn change_mode(&mut self, mode: OperatingMode, now: TimestampMs, log: &mut dyn EventLog) {
        match mode {
            OperatingMode::Off => {
                if let Some(pid) = self.algorithm.pid_mut() {
                    pid.disable();
                }
            }
            OperatingMode::Manual => {}
            OperatingMode::Auto => {
                self.algorithm.reset(now);
                if let Some(pid) = self.algorithm.pid_mut() {
                    pid.enable(now);
                }
            }
        }
        log.log_event(
            SUBSYSTEM,
            &format!("mode {} -> {}", self.mode.name(), mode.name()),
            AlarmSeverity::Info,
        );
        self.mode = mode;
    }

    fn dispatch(&mut self) -> ActuatorCommand {
        let (min, max) = (self.config.pid.output_min, self.config.pid.output_max);
        let (output, shutdown) = if !self.interlock.can_operate() {
            self.stats.forced_safe += 1;
            let shutdown = self
                .interlock
                .shutdown_command()
                .unwrap_or(ShutdownCommand::Controlled);
            (0.0, Some(shutdown))
        } else if self.auto_blocked() {
            (0.0, None)
        } else if self.mode == OperatingMode::Off {
            (0.0, None)
        } else {
            (self.commanded.clamp(min, max), None)
        };

        if shutdown.is_some() {
            debug!(state = self.interlock.state().name(), "output forced safe");
        }

        ActuatorCommand {
            output,
            compressor_stages: compressor_stages(output, self.config.compressor_count),
            pump: self.mode != OperatingMode::Off
                && shutdown != Some(ShutdownCommand::Emergency),
            alarm_horn: self
                .interlock
                .alarms()
                .unacknowledged_at_least(AlarmSeverity::Alarm),
            shutdown,
        }
    }

    #[inline]
    fn auto_blocked(&self) -> bool {
        self.mode == OperatingMode::Auto && self.detector.blocks_auto()
    }

    fn load_factor(&self) -> f64 {
        let rated = self.config.optimization.rated_capacity_kw;
        if rated <= 0.0 {
            return 0.0;
        }
        (self.telemetry.cooling_kw / rated).clamp(0.0, 1.0)
    }

    fn safety_snapshot(&self, now: TimestampMs) -> SafetySnapshot {
        let r = |id| self.sensors.reading(id, now);
        SafetySnapshot {
            return_water: r(ChannelId::ReturnWater),
            supply_water: r(ChannelId::SupplyWater),
            ambient: r(ChannelId::Ambient),
            condenser: r(ChannelId::Condenser),
            discharge_pressure: r(ChannelId::DischargePressure),
            suction_pressure: r(ChannelId::SuctionPressure),
            compressor_temps: self.sensors.compressor_temps(now),
            compressor_count: self.sensors.compressor_count(),
            inputs: self.inputs,
        }
    }

    /// Point-in-time status.
    pub fn snapshot(&self, now: TimestampMs) -> StatusSnapshot {
        let return_water = self.sensors.reading(ChannelId::ReturnWater, now);
        let supply_water = self.sensors.reading(ChannelId::SupplyWater, now);
        let delta_t = match (return_water, supply_water) {
            (Some(r), Some(s)) => r - s,
            _ => 0.0,
        };
        StatusSnapshot {
            timestamp: now,
            setpoint: self.config.setpoint,
            effective_setpoint: self.effective_setpoint,
            compensation: self.compensation,
            return_water,
            supply_water,
            ambient: self.sensors.reading(ChannelId::Ambient, now),
            output: self.command.output,
            efficiency: efficiency(&self.telemetry),
            optimization_score: self.optimizer.metrics().score,
            efficiency_trend: self.analytics.efficiency_trend(DEFAULT_TREND_SAMPLES),
            power_trend: self.analytics.power_trend(DEFAULT_TREND_SAMPLES),
            delta_t,
            safety_state: self.interlock.state(),
            mode: self.mode,
            algorithm: self.algorithm.kind(),
            active_fault: self.detector.active().map(|f| f.kind),
            active_alarms: self.interlock.alarms().len(),
            lockout_remaining_ms: self.interlock.lockout_remaining(now),
        }
    }

    // ─── Operations ─────────────────────────────────────────────────

    pub fn set_setpoint(&mut self, setpoint: f64) -> Result<(), CoreError> {
        if !(SETPOINT_MIN..=SETPOINT_MAX).contains(&setpoint) {
            return Err(CoreError::InvalidParameter {
                name: "setpoint",
                value: setpoint,
            });
        }
        self.config.setpoint = setpoint;
        self.effective_setpoint = setpoint + self.compensation;
        Ok(())
    }

    /// Switch strategy. Current PID gains carry over.
    pub fn set_algorithm(&mut self, kind: AlgorithmKind, now: TimestampMs, log: &mut dyn EventLog) {
        if kind == self.algorithm.kind() {
            return;
        }
        let params = StrategyParams {
            tuning: self.config.pid,
            gains: Some(
                self.algorithm
                    .pid()
                    .map_or_else(|| self.scheduler.band().schedule(self.nominal_gains), |p| p.gains()),
            ),
            learning_rate: self.config.optimization.learning_rate,
            deadband: self.config.deadband,
        };
        let mut algorithm = ControlAlgorithm::new(kind, &params, now);
        if self.mode == OperatingMode::Off {
            if let Some(pid) = algorithm.pid_mut() {
                pid.disable();
            }
        }
        log.log_event(
            SUBSYSTEM,
            &format!("algorithm {} -> {}", self.algorithm.kind().name(), kind.name()),
            AlarmSeverity::Info,
        );
        self.algorithm = algorithm;
        self.config.algorithm = kind;
    }

    /// Manual mode at `output` percent.
    pub fn set_manual(&mut self, output: f64) -> Result<(), CoreError> {
        let (min, max) = (self.config.pid.output_min, self.config.pid.output_max);
        if !(min..=max).contains(&output) {
            return Err(CoreError::InvalidParameter {
                name: "manual_output",
                value: output,
            });
        }
        self.config.enabled = true;
        self.config.manual_override = true;
        self.config.manual_output = output;
        Ok(())
    }

    pub fn set_auto(&mut self) {
        self.config.enabled = true;
        self.config.manual_override = false;
    }

    pub fn enable(&mut self) {
        self.config.enabled = true;
    }

    pub fn disable(&mut self) {
        self.config.enabled = false;
    }

    pub fn set_deadband(&mut self, deadband: f64) -> Result<(), CoreError> {
        if !(0.0..=DEADBAND_MAX).contains(&deadband) {
            return Err(CoreError::InvalidParameter {
                name: "deadband",
                value: deadband,
            });
        }
        self.config.deadband = deadband;
        self.algorithm.set_deadband(deadband);
        Ok(())
    }

    pub fn set_compensation(&mut self, enabled: bool) {
        self.config.compensation.enabled = enabled;
    }

    pub fn acknowledge_alarm(&mut self, id: AlarmId) -> bool {
        self.interlock.acknowledge(id)
    }

    pub fn acknowledge_all(&mut self) -> usize {
        self.interlock.acknowledge_all()
    }

    pub fn clear_alarm(&mut self, id: AlarmId, now: TimestampMs, log: &mut dyn EventLog) -> bool {
        self.interlock.clear_alarm(id, now, log)
    }

    pub fn reset_fault(&mut self, log: &mut dyn EventLog) -> Option<ActiveFault> {
        self.detector.reset_fault(log)
    }

    pub fn reset_pid(&mut self, now: TimestampMs) {
        self.algorithm.reset(now);
    }

    pub fn trip_lockout(&mut self, duration_ms: u64, now: TimestampMs, log: &mut dyn EventLog) {
        self.interlock.trip_lockout(duration_ms, now, log);
    }

    pub fn save_config(&self, store: &mut dyn ConfigStore) -> bool {
        store.save(&self.config)
    }

    // ─── Accessors ──────────────────────────────────────────────────

    /// Interlock permits operation and, in automatic mode, no fatal fault blocks it.
    pub fn can_operate(&self) -> bool {
        self.interlock.can_operate() && !self.auto_blocked()
    }

    #[inline]
    pub const fn config(&self) -> &ControlConfiguration {
        &self.config
    }

    #[inline]
    pub const fn mode(&self) -> OperatingMode {
        self.mode
    }

    pub fn control_state(&self) -> ControlState {
        self.detector.control_state()
    }

    #[inline]
    pub const fn effective_setpoint(&self) -> f64 {
        self.effective_setpoint
    }

    #[inline]
    pub const fn sensors(&self) -> &SensorBank {
        &self.sensors
    }

    #[inline]
    pub const fn algorithm(&self) -> &ControlAlgorithm {
        &self.algorithm
    }

    #[inline]
    pub const fn interlock(&self) -> &InterlockMachine {
        &self.interlock
    }

    #[inline]
    pub fn alarms(&self) -> &AlarmTable {
        self.interlock.alarms()
    }

    #[inline]
    pub const fn detector(&self) -> &FaultDetector {
        &self.detector
    }

    #[inline]
    pub const fn optimizer(&self) -> &OptimizationEngine {
        &self.optimizer
    }

    #[inline]
    pub const fn analytics(&self) -> &PerformanceAnalytics {
        &self.analytics
    }

    #[inline]
    pub const fn stats(&self) -> &CycleStats {
        &self.stats
    }

    /// Handle for interrupt-style emergency stop sources.
    pub fn estop_handle(&self) -> Arc<EmergencyStopLatch> {
        Arc::clone(&self.estop)
    }
}

// ─── Tests ──────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::{LatestStatus, MemoryEventLog};

    struct Plant {
        return_water: Option<f64>,
        ambient: f64,
        inputs: SafetyInputs,
    }

    impl SensorSource for Plant {
        fn read_channel(&mut self, id: ChannelId) -> Option<f64> {
            match id {
                ChannelId::ReturnWater => self.return_water,
                ChannelId::SupplyWater => Some(7.0),
                ChannelId::Ambient => Some(self.ambient),
                ChannelId::Condenser => Some(45.0),
                ChannelId::DischargePressure => Some(16.0),
                ChannelId::SuctionPressure => Some(4.0),
                ChannelId::Compressor(_) => Some(80.0),
            }
        }

        fn safety_inputs(&mut self) -> SafetyInputs {
            self.inputs
        }

        fn telemetry(&mut self) -> PlantTelemetry {
            PlantTelemetry {
                power_kw: 60.0,
                cooling_kw: 200.0,
            }
        }
    }

    fn plant(return_water: f64) -> Plant {
        Plant {
            return_water: Some(return_water),
            ambient: 30.0,
            inputs: SafetyInputs::empty(),
        }
    }

    fn pass(core: &mut ControlCore, p: &mut Plant, now: TimestampMs) -> ActuatorCommand {
        let mut events = MemoryEventLog::new();
        let mut status = LatestStatus::default();
        let mut io = PassIo {
            sensors: p,
            events: &mut events,
            status: &mut status,
        };
        core.run_pass(&mut io, now)
    }

    #[test]
    fn compressor_stage_split() {
        assert_eq!(compressor_stages(0.0, 2), 0);
        assert_eq!(compressor_stages(10.0, 2), 1);
        assert_eq!(compressor_stages(50.0, 2), 1);
        assert_eq!(compressor_stages(51.0, 2), 2);
        assert_eq!(compressor_stages(100.0, 4), 4);
    }

    #[test]
    fn stats_track_max() {
        let mut s = CycleStats::new();
        s.record(500);
        s.record(200);
        assert_eq!(s.passes, 2);
        assert_eq!(s.last_pass_ns, 200);
        assert_eq!(s.max_pass_ns, 500);
    }

    #[test]
    fn rejects_bad_efficiency_target() {
        let mut cfg = ControlConfiguration::default();
        cfg.optimization.efficiency_target = 1.5;
        assert!(matches!(
            ControlCore::new(cfg, 0),
            Err(CoreError::InvalidParameter {
                name: "efficiency_target",
                ..
            })
        ));
    }

    #[test]
    fn rejects_bad_ambient_baseline() {
        let mut cfg = ControlConfiguration::default();
        cfg.compensation.ambient_baseline = 75.0;
        assert!(matches!(
            ControlCore::new(cfg, 0),
            Err(CoreError::InvalidParameter {
                name: "ambient_baseline",
                ..
            })
        ));
    }

    #[test]
    fn rejects_other_invalid_config() {
        let cfg = ControlConfiguration {
            setpoint: 30.0,
            ..Default::default()
        };
        assert!(matches!(ControlCore::new(cfg, 0), Err(CoreError::Config(_))));
    }

    #[test]
    fn warm_return_drives_output() {
        let mut core = ControlCore::new(ControlConfiguration::default(), 0).unwrap();
        let cmd = pass(&mut core, &mut plant(12.0), 5_000);
        assert!((cmd.output - 5.02).abs() < 1e-9);
        assert_eq!(cmd.compressor_stages, 1);
        assert!(cmd.pump);
        assert_eq!(cmd.shutdown, None);
    }

    #[test]
    fn deadband_holds_output() {
        let mut core = ControlCore::new(ControlConfiguration::default(), 0).unwrap();
        let first = pass(&mut core, &mut plant(12.0), 5_000).output;
        let held = pass(&mut core, &mut plant(10.1), 6_000).output;
        assert_eq!(first, held);
    }

    #[test]
    fn manual_and_off_modes() {
        let mut core = ControlCore::new(ControlConfiguration::default(), 0).unwrap();
        core.set_manual(35.0).unwrap();
        let cmd = pass(&mut core, &mut plant(12.0), 1_000);
        assert_eq!(core.mode(), OperatingMode::Manual);
        assert_eq!(cmd.output, 35.0);

        core.disable();
        let cmd = pass(&mut core, &mut plant(12.0), 2_000);
        assert_eq!(core.mode(), OperatingMode::Off);
        assert_eq!(cmd.output, 0.0);
        assert!(!cmd.pump);
        assert!(core.set_manual(150.0).is_err());
    }

    #[test]
    fn mode_changes_apply_between_control_updates() {
        let mut core = ControlCore::new(ControlConfiguration::default(), 0).unwrap();
        let mut p = plant(12.0);
        assert!(pass(&mut core, &mut p, 1_000).output > 0.0);

        // Control cadence is 1 s; these passes fall between updates.
        core.set_manual(35.0).unwrap();
        let cmd = pass(&mut core, &mut p, 1_500);
        assert_eq!(core.mode(), OperatingMode::Manual);
        assert_eq!(cmd.output, 35.0);

        core.set_manual(60.0).unwrap();
        assert_eq!(pass(&mut core, &mut p, 2_500).output, 60.0);

        core.disable();
        let cmd = pass(&mut core, &mut p, 2_700);
        assert_eq!(core.mode(), OperatingMode::Off);
        assert_eq!(cmd.output, 0.0);
        assert_eq!(cmd.compressor_stages, 0);
        assert_eq!(core.stats().control_updates, 2);
    }

    #[test]
    fn estop_latch_forces_safe_output() {
        let mut core = ControlCore::new(ControlConfiguration::default(), 0).unwrap();
        let mut p = plant(12.0);
        pass(&mut core, &mut p, 5_000);
        core.estop_handle().trigger();
        let cmd = pass(&mut core, &mut p, 5_100);
        assert_eq!(cmd.output, 0.0);
        assert_eq!(cmd.shutdown, Some(ShutdownCommand::Emergency));
        assert!(!cmd.pump);
        assert!(cmd.alarm_horn);
        assert_eq!(core.stats().forced_safe, 1);
    }

    #[test]
    fn algorithm_switch_carries_gains() {
        let mut core = ControlCore::new(ControlConfiguration::default(), 0).unwrap();
        let mut log = MemoryEventLog::new();
        let mut p = Plant {
            ambient: 42.0,
            ..plant(12.0)
        };
        pass(&mut core, &mut p, 1_000);
        let scheduled = core.algorithm().pid().unwrap().gains();
        assert!((scheduled.kp - 1.6).abs() < 1e-12);

        core.set_algorithm(AlgorithmKind::Hybrid, 2_000, &mut log);
        assert_eq!(core.config().algorithm, AlgorithmKind::Hybrid);
        assert_eq!(core.algorithm().pid().unwrap().gains(), scheduled);
        assert_eq!(log.events.len(), 1);
    }

    #[test]
    fn compensation_raises_effective_setpoint() {
        let mut core = ControlCore::new(ControlConfiguration::default(), 0).unwrap();
        let mut p = Plant {
            ambient: 42.0,
            ..plant(12.0)
        };
        pass(&mut core, &mut p, 1_000);
        assert!((core.effective_setpoint() - 10.2).abs() < 1e-12);

        core.set_compensation(false);
        pass(&mut core, &mut p, 2_000);
        assert!((core.effective_setpoint() - 10.0).abs() < 1e-12);
    }
}
