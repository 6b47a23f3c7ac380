//! Control configuration.
//!
//! All config types use `serde::Deserialize` for TOML loading with
//! `#[serde(default)]` on every field, so a partial file overrides only
//! what it names. Bounds are checked by [`ControlConfiguration::validate`];
//! callers substitute defaults on failure rather than clamping.
//!
//! # TOML Example
//!
//! ```toml
//! setpoint = 10.0
//! algorithm = "hybrid"
//!
//! [pid]
//! kp = 2.0
//! ki = 0.1
//!
//! [compensation]
//! ambient_baseline = 38.0
//! ```

use serde::{Deserialize, Serialize};

use crate::config::{ConfigError, LogLevel};
use crate::consts::{DEFAULT_LOCKOUT_MS, MAX_COMPRESSORS};

use super::state::{AlgorithmKind, OperatingMode};

// ─── Bounds ─────────────────────────────────────────────────────────

pub const SETPOINT_MIN: f64 = 5.0;
pub const SETPOINT_MAX: f64 = 20.0;
pub const DEADBAND_MAX: f64 = 5.0;
pub const AMBIENT_BASELINE_MIN: f64 = 0.0;
pub const AMBIENT_BASELINE_MAX: f64 = 60.0;
pub const COMPENSATION_FACTOR_MAX: f64 = 5.0;
pub const COMPENSATION_LIMIT_MAX: f64 = 5.0;
pub const EFFICIENCY_TARGET_MIN: f64 = 0.1;
pub const EFFICIENCY_TARGET_MAX: f64 = 1.0;
pub const LEARNING_RATE_MAX: f64 = 1.0;

// ─── Top-Level Config ───────────────────────────────────────────────

/// Control configuration owned by the control core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlConfiguration {
    pub log_level: LogLevel,
    /// Return-water setpoint [°C].
    pub setpoint: f64,
    /// Error band inside which the output is held [°C].
    pub deadband: f64,
    /// Algorithm used in automatic mode.
    pub algorithm: AlgorithmKind,
    /// Controller enabled (false = Off).
    pub enabled: bool,
    pub manual_override: bool,
    /// Output used while `manual_override` is set [%].
    pub manual_output: f64,
    /// Installed compressors (1..=4).
    pub compressor_count: u8,
    pub pid: PidTuning,
    pub compensation: CompensationConfig,
    pub timing: TimingConfig,
    pub optimization: OptimizationConfig,
    pub safety: SafetyLimits,
}

impl Default for ControlConfiguration {
    fn default() -> Self {
        Self {
            log_level: LogLevel::Info,
            setpoint: 10.0,
            deadband: 0.2,
            algorithm: AlgorithmKind::BasicPid,
            enabled: true,
            manual_override: false,
            manual_output: 0.0,
            compressor_count: 2,
            pid: PidTuning::default(),
            compensation: CompensationConfig::default(),
            timing: TimingConfig::default(),
            optimization: OptimizationConfig::default(),
            safety: SafetyLimits::default(),
        }
    }
}

/// Nominal PID gains and limits.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PidTuning {
    pub kp: f64,
    pub ki: f64,
    pub kd: f64,
    pub output_min: f64,
    pub output_max: f64,
    /// Absolute bound on the integral accumulator.
    pub integral_max: f64,
}

impl Default for PidTuning {
    fn default() -> Self {
        Self {
            kp: 2.0,
            ki: 0.1,
            kd: 0.5,
            output_min: 0.0,
            output_max: 100.0,
            integral_max: 2000.0,
        }
    }
}

/// Hot-climate compensation settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompensationConfig {
    pub enabled: bool,
    /// Ambient above which compensation starts [°C].
    pub ambient_baseline: f64,
    pub factor: f64,
    /// Upper bound on the setpoint offset [°C].
    pub max: f64,
}

impl Default for CompensationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            ambient_baseline: 38.0,
            factor: 1.0,
            max: 2.0,
        }
    }
}

/// Loop cadences [ms].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    pub sample_period_ms: u64,
    pub pid_period_ms: u64,
    /// Staleness threshold for every sensor channel.
    pub fault_timeout_ms: u64,
    pub status_period_ms: u64,
    pub optimization_interval_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            sample_period_ms: 500,
            pid_period_ms: 1_000,
            fault_timeout_ms: 5_000,
            status_period_ms: 2_000,
            optimization_interval_ms: 60_000,
        }
    }
}

/// Efficiency optimisation settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizationConfig {
    pub enabled: bool,
    /// Target normalised efficiency [0.1, 1].
    pub efficiency_target: f64,
    /// Efficiency below which a control fault is raised.
    pub efficiency_threshold: f64,
    /// Adaptive PID gain learning rate (0, 1].
    pub learning_rate: f64,
    /// Nominal cooling capacity used for the load factor [kW].
    pub rated_capacity_kw: f64,
}

impl Default for OptimizationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            efficiency_target: 0.75,
            efficiency_threshold: 0.4,
            learning_rate: 0.01,
            rated_capacity_kw: 350.0,
        }
    }
}

/// Interlock limits.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SafetyLimits {
    pub return_water_warning: f64,
    pub return_water_alarm: f64,
    pub supply_water_low: f64,
    /// Supply water at or below this trips freeze protection.
    pub freeze_limit: f64,
    pub condenser_alarm: f64,
    pub condenser_critical: f64,
    /// Discharge pressure [bar].
    pub discharge_alarm: f64,
    pub discharge_critical: f64,
    /// Suction pressure [bar].
    pub suction_low: f64,
    pub ambient_warning: f64,
    pub compressor_over_temp: f64,
    /// Return water rise that raises a trend warning [°C/min].
    pub rise_rate_warning: f64,
    /// Lockout duration after an emergency trip.
    pub lockout_ms: u64,
}

impl Default for SafetyLimits {
    fn default() -> Self {
        Self {
            return_water_warning: 16.0,
            return_water_alarm: 20.0,
            supply_water_low: 4.0,
            freeze_limit: 2.0,
            condenser_alarm: 55.0,
            condenser_critical: 62.0,
            discharge_alarm: 24.0,
            discharge_critical: 28.0,
            suction_low: 2.0,
            ambient_warning: 48.0,
            compressor_over_temp: 105.0,
            rise_rate_warning: 0.5,
            lockout_ms: DEFAULT_LOCKOUT_MS,
        }
    }
}

// ─── Validation ─────────────────────────────────────────────────────

fn check_range(name: &str, value: f64, min: f64, max: f64) -> Result<(), ConfigError> {
    if !value.is_finite() || value < min || value > max {
        return Err(ConfigError::ValidationError(format!(
            "{name} {value} out of range [{min}, {max}]"
        )));
    }
    Ok(())
}

fn check_positive(name: &str, value: u64) -> Result<(), ConfigError> {
    if value == 0 {
        return Err(ConfigError::ValidationError(format!("{name} must be > 0")));
    }
    Ok(())
}

impl ControlConfiguration {
    /// Operating mode implied by `enabled` and `manual_override`.
    #[inline]
    pub const fn operating_mode(&self) -> OperatingMode {
        if !self.enabled {
            OperatingMode::Off
        } else if self.manual_override {
            OperatingMode::Manual
        } else {
            OperatingMode::Auto
        }
    }

    /// Validate parameter bounds.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_range("setpoint", self.setpoint, SETPOINT_MIN, SETPOINT_MAX)?;
        check_range("deadband", self.deadband, 0.0, DEADBAND_MAX)?;
        check_range("manual_output", self.manual_output, 0.0, 100.0)?;
        if self.compressor_count == 0 || self.compressor_count as usize > MAX_COMPRESSORS {
            return Err(ConfigError::ValidationError(format!(
                "compressor_count {} out of range [1, {MAX_COMPRESSORS}]",
                self.compressor_count
            )));
        }
        self.pid.validate()?;
        self.compensation.validate()?;
        self.timing.validate()?;
        self.optimization.validate()?;
        self.safety.validate()
    }
}

impl PidTuning {
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, gain) in [("pid.kp", self.kp), ("pid.ki", self.ki), ("pid.kd", self.kd)] {
            check_range(name, gain, 0.0, f64::MAX)?;
        }
        if !(self.output_min < self.output_max) {
            return Err(ConfigError::ValidationError(format!(
                "pid.output_min {} must be below pid.output_max {}",
                self.output_min, self.output_max
            )));
        }
        check_range("pid.output_min", self.output_min, 0.0, 100.0)?;
        check_range("pid.output_max", self.output_max, 0.0, 100.0)?;
        check_range("pid.integral_max", self.integral_max, f64::MIN_POSITIVE, f64::MAX)
    }
}

impl CompensationConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_range(
            "compensation.ambient_baseline",
            self.ambient_baseline,
            AMBIENT_BASELINE_MIN,
            AMBIENT_BASELINE_MAX,
        )?;
        check_range("compensation.factor", self.factor, 0.0, COMPENSATION_FACTOR_MAX)?;
        check_range("compensation.max", self.max, 0.0, COMPENSATION_LIMIT_MAX)
    }
}

impl TimingConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_positive("timing.sample_period_ms", self.sample_period_ms)?;
        check_positive("timing.pid_period_ms", self.pid_period_ms)?;
        check_positive("timing.fault_timeout_ms", self.fault_timeout_ms)?;
        check_positive("timing.status_period_ms", self.status_period_ms)?;
        check_positive("timing.optimization_interval_ms", self.optimization_interval_ms)
    }
}

impl OptimizationConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_range(
            "optimization.efficiency_target",
            self.efficiency_target,
            EFFICIENCY_TARGET_MIN,
            EFFICIENCY_TARGET_MAX,
        )?;
        check_range(
            "optimization.efficiency_threshold",
            self.efficiency_threshold,
            0.0,
            1.0,
        )?;
        if !(self.learning_rate > 0.0 && self.learning_rate <= LEARNING_RATE_MAX) {
            return Err(ConfigError::ValidationError(format!(
                "optimization.learning_rate {} out of range (0, {LEARNING_RATE_MAX}]",
                self.learning_rate
            )));
        }
        check_range(
            "optimization.rated_capacity_kw",
            self.rated_capacity_kw,
            f64::MIN_POSITIVE,
            f64::MAX,
        )
    }
}

impl SafetyLimits {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.return_water_warning > self.return_water_alarm {
            return Err(ConfigError::ValidationError(
                "safety.return_water_warning above return_water_alarm".to_string(),
            ));
        }
        if self.freeze_limit > self.supply_water_low {
            return Err(ConfigError::ValidationError(
                "safety.freeze_limit above supply_water_low".to_string(),
            ));
        }
        if self.condenser_alarm > self.condenser_critical {
            return Err(ConfigError::ValidationError(
                "safety.condenser_alarm above condenser_critical".to_string(),
            ));
        }
        if self.discharge_alarm > self.discharge_critical {
            return Err(ConfigError::ValidationError(
                "safety.discharge_alarm above discharge_critical".to_string(),
            ));
        }
        check_range("safety.rise_rate_warning", self.rise_rate_warning, 0.0, f64::MAX)?;
        check_positive("safety.lockout_ms", self.lockout_ms)
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
