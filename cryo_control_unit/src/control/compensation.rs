//! Hot-climate compensation.
//!
//! Two independent adjustments driven by ambient temperature:
//! - a setpoint offset added before regulation (the configured setpoint is
//!   never modified)
//! - a discrete gain schedule stepping `kp`/`ki` down in fixed bands

use cryo_common::control_unit::config::CompensationConfig;

use super::pid::PidGains;

/// Setpoint offset per °C of ambient above baseline, before `factor`.
const COMPENSATION_SLOPE: f64 = 0.05;

/// Setpoint offset [°C] for the given ambient.
///
/// Zero at or below the baseline, otherwise
/// `min((ambient − baseline) · 0.05 · factor, max)`.
pub fn compensation(cfg: &CompensationConfig, ambient: f64) -> f64 {
    if !cfg.enabled || ambient <= cfg.ambient_baseline {
        return 0.0;
    }
    ((ambient - cfg.ambient_baseline) * COMPENSATION_SLOPE * cfg.factor).min(cfg.max)
}

/// Setpoint handed to the regulation engine.
#[inline]
pub fn effective_setpoint(setpoint: f64, cfg: &CompensationConfig, ambient: Option<f64>) -> f64 {
    setpoint + ambient.map_or(0.0, |a| compensation(cfg, a))
}

// ─── Gain Schedule ──────────────────────────────────────────────────

/// Ambient band of the gain schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AmbientBand {
    #[default]
    Nominal,
    /// Ambient above 35 °C.
    Hot,
    /// Ambient above 40 °C.
    Extreme,
}

impl AmbientBand {
    pub fn classify(ambient: f64) -> Self {
        if ambient > 40.0 {
            Self::Extreme
        } else if ambient > 35.0 {
            Self::Hot
        } else {
            Self::Nominal
        }
    }

    /// `(kp, ki)` multipliers.
    pub const fn factors(&self) -> (f64, f64) {
        match self {
            Self::Nominal => (1.0, 1.0),
            Self::Hot => (0.9, 0.8),
            Self::Extreme => (0.8, 0.6),
        }
    }

    /// Nominal gains scaled for this band. `kd` is unchanged.
    pub fn schedule(&self, nominal: PidGains) -> PidGains {
        let (kp, ki) = self.factors();
        PidGains {
            kp: nominal.kp * kp,
            ki: nominal.ki * ki,
            kd: nominal.kd,
        }
    }
}

/// Tracks the active band and reports transitions.
///
/// Gains are rewritten only when the band changes, so optimisation nudges
/// made inside a band survive until the next transition.
#[derive(Debug, Clone, Default)]
pub struct GainScheduler {
    band: AmbientBand,
}

impl GainScheduler {
    pub const fn new() -> Self {
        Self {
            band: AmbientBand::Nominal,
        }
    }

    #[inline]
    pub const fn band(&self) -> AmbientBand {
        self.band
    }

    /// Classify `ambient`; returns the new band on a transition.
    pub fn update(&mut self, ambient: f64) -> Option<AmbientBand> {
        let band = AmbientBand::classify(ambient);
        if band != self.band {
            self.band = band;
            Some(band)
        } else {
            None
        }
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
