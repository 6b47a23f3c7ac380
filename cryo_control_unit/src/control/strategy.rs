//! Control strategy selector.
//!
//! [`ControlAlgorithm`] is a tagged variant owning the state each
//! strategy needs. Every call site goes through [`ControlAlgorithm::compute`],
//! so a new strategy cannot be forgotten in a dispatch somewhere else.

use cryo_common::consts::HYBRID_PID_WEIGHT;
use cryo_common::control_unit::config::PidTuning;
use cryo_common::control_unit::sensor::TimestampMs;
use cryo_common::control_unit::state::AlgorithmKind;

use super::fuzzy::FuzzyController;
use super::pid::{ControlAction, PidController, PidGains};

/// Bounds of the adaptive output multiplier.
const ADAPTIVE_MULTIPLIER_MIN: f64 = 0.5;
const ADAPTIVE_MULTIPLIER_MAX: f64 = 2.0;

/// Per-pass input shared by all strategies.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrategyInput {
    /// Setpoint after compensation [°C].
    pub setpoint: f64,
    /// Return-water temperature [°C].
    pub process_value: f64,
    /// Current load factor [0, 1].
    pub load_factor: f64,
    /// Rolling average load factor [0, 1].
    pub average_load: f64,
    pub now: TimestampMs,
}

/// Online output multiplier for the adaptive PID strategy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Adaptation {
    multiplier: f64,
    learning_rate: f64,
    deadband: f64,
}

impl Adaptation {
    pub const fn new(learning_rate: f64, deadband: f64) -> Self {
        Self {
            multiplier: 1.0,
            learning_rate,
            deadband,
        }
    }

    /// Grow while the error sits outside the deadband, shrink inside it.
    pub fn update(&mut self, error: f64) -> f64 {
        self.multiplier = (self.multiplier + self.learning_rate * (error.abs() - self.deadband))
            .clamp(ADAPTIVE_MULTIPLIER_MIN, ADAPTIVE_MULTIPLIER_MAX);
        self.multiplier
    }

    #[inline]
    pub const fn multiplier(&self) -> f64 {
        self.multiplier
    }

    pub fn set_deadband(&mut self, deadband: f64) {
        self.deadband = deadband;
    }
}

/// Active control strategy with its state.
#[derive(Debug, Clone)]
pub enum ControlAlgorithm {
    BasicPid {
        pid: PidController,
    },
    AdaptivePid {
        pid: PidController,
        adaptation: Adaptation,
    },
    /// PID scaled by predicted load.
    Predictive {
        pid: PidController,
    },
    FuzzyLogic {
        fuzzy: FuzzyController,
    },
    /// Fixed 0.7 PID + 0.3 fuzzy blend.
    Hybrid {
        pid: PidController,
        fuzzy: FuzzyController,
    },
}

/// Parameters needed to build any strategy.
#[derive(Debug, Clone, Copy)]
pub struct StrategyParams {
    pub tuning: PidTuning,
    /// Gains to carry over instead of the nominal tuning.
    pub gains: Option<PidGains>,
    pub learning_rate: f64,
    pub deadband: f64,
}

impl ControlAlgorithm {
    /// Build the strategy for `kind`. Chilled-water regulation is reverse acting.
    pub fn new(kind: AlgorithmKind, params: &StrategyParams, now: TimestampMs) -> Self {
        let pid = || {
            let mut pid = PidController::new(&params.tuning, ControlAction::Reverse, now);
            if let Some(g) = params.gains {
                pid.set_gains(g);
            }
            pid
        };
        let fuzzy = || {
            FuzzyController::new(
                ControlAction::Reverse,
                params.tuning.output_min,
                params.tuning.output_max,
                now,
            )
        };
        match kind {
            AlgorithmKind::BasicPid => Self::BasicPid { pid: pid() },
            AlgorithmKind::AdaptivePid => Self::AdaptivePid {
                pid: pid(),
                adaptation: Adaptation::new(params.learning_rate, params.deadband),
            },
            AlgorithmKind::Predictive => Self::Predictive { pid: pid() },
            AlgorithmKind::FuzzyLogic => Self::FuzzyLogic { fuzzy: fuzzy() },
            AlgorithmKind::Hybrid => Self::Hybrid {
                pid: pid(),
                fuzzy: fuzzy(),
            },
        }
    }

    pub const fn kind(&self) -> AlgorithmKind {
        match self {
            Self::BasicPid { .. } => AlgorithmKind::BasicPid,
            Self::AdaptivePid { .. } => AlgorithmKind::AdaptivePid,
            Self::Predictive { .. } => AlgorithmKind::Predictive,
            Self::FuzzyLogic { .. } => AlgorithmKind::FuzzyLogic,
            Self::Hybrid { .. } => AlgorithmKind::Hybrid,
        }
    }

    /// Produce the output percentage for this pass.
    pub fn compute(&mut self, input: &StrategyInput) -> f64 {
        let StrategyInput {
            setpoint: sp,
            process_value: pv,
            now,
            ..
        } = *input;

        match self {
            Self::BasicPid { pid } => pid.compute(sp, pv, now),
            Self::AdaptivePid { pid, adaptation } => {
                let base = pid.compute(sp, pv, now);
                let m = adaptation.update(pid.prev_error());
                clamp_to(pid, base * m)
            }
            Self::Predictive { pid } => {
                let base = pid.compute(sp, pv, now);
                let predicted = input.load_factor + 0.1 * input.average_load;
                clamp_to(pid, base * (1.0 + predicted * 0.1))
            }
            Self::FuzzyLogic { fuzzy } => fuzzy.compute(sp, pv, now),
            Self::Hybrid { pid, fuzzy } => {
                let p = pid.compute(sp, pv, now);
                let f = fuzzy.compute(sp, pv, now);
                clamp_to(pid, HYBRID_PID_WEIGHT * p + (1.0 - HYBRID_PID_WEIGHT) * f)
            }
        }
    }

    /// PID controller owned by this strategy, if any.
    pub fn pid(&self) -> Option<&PidController> {
        match self {
            Self::BasicPid { pid }
            | Self::AdaptivePid { pid, .. }
            | Self::Predictive { pid }
            | Self::Hybrid { pid, .. } => Some(pid),
            Self::FuzzyLogic { .. } => None,
        }
    }

    pub fn pid_mut(&mut self) -> Option<&mut PidController> {
        match self {
            Self::BasicPid { pid }
            | Self::AdaptivePid { pid, .. }
            | Self::Predictive { pid }
            | Self::Hybrid { pid, .. } => Some(pid),
            Self::FuzzyLogic { .. } => None,
        }
    }

    /// Advance every owned controller's clock without computing.
    pub fn hold(&mut self, now: TimestampMs) {
        match self {
            Self::BasicPid { pid } | Self::AdaptivePid { pid, .. } | Self::Predictive { pid } => {
                pid.hold(now)
            }
            Self::FuzzyLogic { fuzzy } => fuzzy.hold(now),
            Self::Hybrid { pid, fuzzy } => {
                pid.hold(now);
                fuzzy.hold(now);
            }
        }
    }

    pub fn set_deadband(&mut self, deadband: f64) {
        if let Self::AdaptivePid { adaptation, .. } = self {
            adaptation.set_deadband(deadband);
        }
    }

    /// Reset every controller the strategy owns.
    pub fn reset(&mut self, now: TimestampMs) {
        match self {
            Self::BasicPid { pid } | Self::Predictive { pid } => pid.reset(now),
            Self::AdaptivePid { pid, adaptation } => {
                pid.reset(now);
                adaptation.multiplier = 1.0;
            }
            Self::FuzzyLogic { fuzzy } => fuzzy.reset(now),
            Self::Hybrid { pid, fuzzy } => {
                pid.reset(now);
                fuzzy.reset(now);
            }
        }
    }
}

#[inline]
fn clamp_to(pid: &PidController, value: f64) -> f64 {
    let (lo, hi) = pid.output_limits();
    if value.is_finite() { value.clamp(lo, hi) } else { lo }
}

// ─── Tests ──────────────────────────────────────────────────────────
