//! Efficiency-driven self tuning.
//!
//! Runs on its own interval (halved above 0.8 load, doubled below 0.3).
//! Each run recomputes efficiency and a 0–100 score; when efficiency
//! trails the target by more than five points the PID gains are nudged
//! up (`kp` ×1.05, `ki` ×1.02). Gains never decrease here.

use cryo_common::consts::MAX_COP;
use cryo_common::control_unit::config::{
    EFFICIENCY_TARGET_MAX, EFFICIENCY_TARGET_MIN, LEARNING_RATE_MAX, OptimizationConfig,
};
use cryo_common::control_unit::inputs::PlantTelemetry;
use cryo_common::control_unit::sensor::TimestampMs;
use tracing::{debug, info};

use crate::error::CoreError;

use super::pid::PidController;

const KP_NUDGE: f64 = 1.05;
const KI_NUDGE: f64 = 1.02;
/// Efficiency shortfall that triggers a nudge.
const NUDGE_MARGIN: f64 = 0.05;

/// Normalised efficiency: `cooling / power / MAX_COP`, clamped to [0, 1].
pub fn efficiency(telemetry: &PlantTelemetry) -> f64 {
    if telemetry.power_kw <= 0.0 || !telemetry.cooling_kw.is_finite() {
        return 0.0;
    }
    (telemetry.cooling_kw / telemetry.power_kw / MAX_COP).clamp(0.0, 1.0)
}

/// Composite score: half efficiency level, half proximity to target.
pub fn score(efficiency: f64, target: f64) -> f64 {
    let proximity = (1.0 - (efficiency - target).abs() / target).clamp(0.0, 1.0);
    (50.0 * efficiency + 50.0 * proximity).clamp(0.0, 100.0)
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct OptimizationMetrics {
    pub current_efficiency: f64,
    pub target_efficiency: f64,
    pub power_consumption: f64,
    pub cooling_capacity: f64,
    pub score: f64,
    pub cycles: u64,
    pub active: bool,
}

#[derive(Debug, Clone)]
pub struct OptimizationEngine {
    metrics: OptimizationMetrics,
    base_interval_ms: u64,
    last_run: TimestampMs,
}

impl OptimizationEngine {
    /// Validate the target and learning rate and start the interval at `now`.
    pub fn new(
        cfg: &OptimizationConfig,
        interval_ms: u64,
        now: TimestampMs,
    ) -> Result<Self, CoreError> {
        if !(EFFICIENCY_TARGET_MIN..=EFFICIENCY_TARGET_MAX).contains(&cfg.efficiency_target) {
            return Err(CoreError::InvalidParameter {
                name: "efficiency_target",
                value: cfg.efficiency_target,
            });
        }
        if !(cfg.learning_rate > 0.0 && cfg.learning_rate <= LEARNING_RATE_MAX) {
            return Err(CoreError::InvalidParameter {
                name: "learning_rate",
                value: cfg.learning_rate,
            });
        }
        if interval_ms == 0 {
            return Err(CoreError::InvalidParameter {
                name: "optimization_interval_ms",
                value: 0.0,
            });
        }
        Ok(Self {
            metrics: OptimizationMetrics {
                target_efficiency: cfg.efficiency_target,
                active: cfg.enabled,
                ..Default::default()
            },
            base_interval_ms: interval_ms,
            last_run: now,
        })
    }

    /// Interval adjusted for load.
    pub fn interval_for(&self, load_factor: f64) -> u64 {
        if load_factor > 0.8 {
            (self.base_interval_ms / 2).max(1)
        } else if load_factor < 0.3 {
            self.base_interval_ms.saturating_mul(2)
        } else {
            self.base_interval_ms
        }
    }

    pub fn is_due(&self, now: TimestampMs, load_factor: f64) -> bool {
        self.metrics.active && now.saturating_sub(self.last_run) >= self.interval_for(load_factor)
    }

    /// Run one optimisation cycle. Returns true when the PID gains were nudged.
    pub fn run(
        &mut self,
        telemetry: &PlantTelemetry,
        pid: Option<&mut PidController>,
        now: TimestampMs,
    ) -> bool {
        let eff = efficiency(telemetry);
        let m = &mut self.metrics;
        m.current_efficiency = eff;
        m.power_consumption = telemetry.power_kw;
        m.cooling_capacity = telemetry.cooling_kw;
        m.score = score(eff, m.target_efficiency);
        m.cycles += 1;
        self.last_run = now;

        debug!(
            efficiency = eff,
            score = m.score,
            cycle = m.cycles,
            "optimization cycle"
        );

        if m.target_efficiency - eff <= NUDGE_MARGIN {
            return false;
        }
        match pid {
            Some(pid) if pid.is_enabled() => {
                pid.scale_gains(KP_NUDGE, KI_NUDGE);
                let g = pid.gains();
                info!(
                    efficiency = eff,
                    target = m.target_efficiency,
                    kp = g.kp,
                    ki = g.ki,
                    "efficiency below target, gains nudged"
                );
                true
            }
            _ => false,
        }
    }

    #[inline]
    pub const fn metrics(&self) -> &OptimizationMetrics {
        &self.metrics
    }
}

// ─── Tests ──────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::control::pid::ControlAction;
    use cryo_common::control_unit::config::PidTuning;

    fn engine() -> OptimizationEngine {
        OptimizationEngine::new(&OptimizationConfig::default(), 60_000, 0).unwrap()
    }

    fn telemetry(cooling: f64, power: f64) -> PlantTelemetry {
        PlantTelemetry {
            power_kw: power,
            cooling_kw: cooling,
        }
    }

    #[test]
    fn efficiency_normalised_by_max_cop() {
        assert!((efficiency(&telemetry(300.0, 100.0)) - 0.75).abs() < 1e-12);
        assert_eq!(efficiency(&telemetry(900.0, 100.0)), 1.0);
        assert_eq!(efficiency(&telemetry(300.0, 0.0)), 0.0);
    }

    #[test]
    fn score_halves() {
        assert!((score(0.75, 0.75) - 87.5).abs() < 1e-12);
        assert!((score(0.0, 0.75) - 0.0).abs() < 1e-12);
        assert!(score(1.0, 0.75) <= 100.0);
    }

    #[test]
    fn invalid_target_rejected() {
        let cfg = OptimizationConfig {
            efficiency_target: 0.0,
            ..Default::default()
        };
        assert!(matches!(
            OptimizationEngine::new(&cfg, 1_000, 0),
            Err(CoreError::InvalidParameter { name: "efficiency_target", .. })
        ));
    }

    #[test]
    fn invalid_learning_rate_rejected() {
        let cfg = OptimizationConfig {
            learning_rate: 3.0,
            ..Default::default()
        };
        assert!(OptimizationEngine::new(&cfg, 1_000, 0).is_err());
    }

    #[test]
    fn interval_follows_load() {
        let e = engine();
        assert_eq!(e.interval_for(0.9), 30_000);
        assert_eq!(e.interval_for(0.5), 60_000);
        assert_eq!(e.interval_for(0.1), 120_000);
        assert!(!e.is_due(59_999, 0.5));
        assert!(e.is_due(60_000, 0.5));
        assert!(e.is_due(30_000, 0.9));
        assert!(!e.is_due(60_000, 0.1));
    }

    #[test]
    fn low_efficiency_nudges_gains_up() {
        let mut e = engine();
        let mut pid = PidController::new(&PidTuning::default(), ControlAction::Reverse, 0);
        // efficiency 0.5, target 0.75
        assert!(e.run(&telemetry(200.0, 100.0), Some(&mut pid), 60_000));
        assert!((pid.gains().kp - 2.1).abs() < 1e-12);
        assert!((pid.gains().ki - 0.102).abs() < 1e-12);
        assert_eq!(e.metrics().cycles, 1);
        assert!((e.metrics().current_efficiency - 0.5).abs() < 1e-12);
    }

    #[test]
    fn near_target_leaves_gains() {
        let mut e = engine();
        let mut pid = PidController::new(&PidTuning::default(), ControlAction::Reverse, 0);
        // efficiency 0.72, within five points of 0.75
        assert!(!e.run(&telemetry(288.0, 100.0), Some(&mut pid), 60_000));
        assert_eq!(pid.gains().kp, 2.0);
    }

    #[test]
    fn disabled_pid_not_nudged() {
        let mut e = engine();
        let mut pid = PidController::new(&PidTuning::default(), ControlAction::Reverse, 0);
        pid.disable();
        assert!(!e.run(&telemetry(100.0, 100.0), Some(&mut pid), 60_000));
        assert_eq!(pid.gains().kp, 2.0);
        assert!(!e.run(&telemetry(100.0, 100.0), None, 120_000));
    }

    #[test]
    fn nudged_gains_saturate_without_windup() {
        let mut e = engine();
        let tuning = PidTuning::default();
        let mut pid = PidController::new(&tuning, ControlAction::Reverse, 0);
        let mut now = 0;
        for _ in 0..30 {
            now += 60_000;
            assert!(e.run(&telemetry(100.0, 100.0), Some(&mut pid), now));
        }
        assert!(pid.gains().kp > 8.0, "kp = {}", pid.gains().kp);

        pid.reset(now);
        for _ in 0..600 {
            now += 1_000;
            assert_eq!(pid.compute(10.0, 25.0, now), 100.0);
            assert!(pid.integral().abs() <= tuning.integral_max);
            assert!(pid.integral() >= 0.0);
        }

        // Warm but near setpoint: output stays positive and below max.
        now += 1_000;
        let out = pid.compute(10.0, 12.0, now);
        assert!(out > 0.0 && out < 100.0, "out = {out}");

        // Reversal drops straight off the limit, never above it.
        now += 1_000;
        let out = pid.compute(10.0, 5.0, now);
        assert!(out < 100.0, "out = {out}");
        assert!(pid.integral().abs() <= tuning.integral_max);
    }
}
