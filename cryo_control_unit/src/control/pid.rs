//! PID regulation engine.
//!
//! Bounded output in `[output_min, output_max]` with:
//! - integral anti-windup clamped per update so `Ki·∫e` never pushes past
//!   the output bounds left by the P term, and never past zero when P alone
//!   saturates; the absolute `integral_max` bound is applied last
//! - derivative on raw error change, smoothed by a fixed 0.1 low-pass
//! - bounded error history
//!
//! Zero Ki disables integral contribution; zero Kd disables derivative.

use cryo_common::consts::{DERIVATIVE_FILTER_FACTOR, ERROR_HISTORY_LEN, PID_MIN_DT};
use cryo_common::control_unit::config::PidTuning;
use cryo_common::control_unit::sensor::TimestampMs;
use cryo_common::ring::RingBuffer;

/// Sign convention of the error term.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlAction {
    /// `error = setpoint − process_value` (heating-style).
    Direct,
    /// `error = process_value − setpoint` (cooling: warm water → more output).
    Reverse,
}

impl ControlAction {
    #[inline]
    pub fn error(&self, setpoint: f64, process_value: f64) -> f64 {
        match self {
            Self::Direct => setpoint - process_value,
            Self::Reverse => process_value - setpoint,
        }
    }
}

/// PID gains.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PidGains {
    pub kp: f64,
    pub ki: f64,
    pub kd: f64,
}

impl From<&PidTuning> for PidGains {
    fn from(t: &PidTuning) -> Self {
        Self {
            kp: t.kp,
            ki: t.ki,
            kd: t.kd,
        }
    }
}

/// PID controller with its internal state.
#[derive(Debug, Clone)]
pub struct PidController {
    gains: PidGains,
    action: ControlAction,
    enabled: bool,
    setpoint: f64,
    prev_error: f64,
    /// Integral accumulator [error·s].
    integral: f64,
    /// Low-pass filtered derivative [error/s].
    derivative: f64,
    output: f64,
    output_min: f64,
    output_max: f64,
    integral_max: f64,
    last_update: TimestampMs,
    history: RingBuffer<f64, ERROR_HISTORY_LEN>,
}

impl PidController {
    /// Create an enabled controller whose clock starts at `now`.
    pub fn new(tuning: &PidTuning, action: ControlAction, now: TimestampMs) -> Self {
        Self {
            gains: PidGains::from(tuning),
            action,
            enabled: true,
            setpoint: 0.0,
            prev_error: 0.0,
            integral: 0.0,
            derivative: 0.0,
            output: 0.0,
            output_min: tuning.output_min,
            output_max: tuning.output_max,
            integral_max: tuning.integral_max.abs(),
            last_update: now,
            history: RingBuffer::new(),
        }
    }

    /// Compute one update and return the bounded output.
    ///
    /// A disabled controller returns its held output untouched.
    pub fn compute(&mut self, setpoint: f64, process_value: f64, now: TimestampMs) -> f64 {
        if !self.enabled {
            return self.output;
        }

        let dt = (now.saturating_sub(self.last_update) as f64 / 1000.0).max(PID_MIN_DT);
        let error = self.action.error(setpoint, process_value);

        // ── P term ──────────────────────────────────────────────
        let p_term = self.gains.kp * error;

        // ── I term with anti-windup ─────────────────────────────
        let mut integral = self.integral + error * dt;
        if self.gains.ki > 0.0 {
            // Never pulled past zero: a saturating P term stops integration
            // instead of inverting the accumulator.
            let lo = ((self.output_min - p_term) / self.gains.ki).min(0.0);
            let hi = ((self.output_max - p_term) / self.gains.ki).max(0.0);
            integral = integral.clamp(lo, hi);
        }
        let integral = integral.clamp(-self.integral_max, self.integral_max);
        let i_term = self.gains.ki * integral;

        // ── D term (filtered) ───────────────────────────────────
        let raw_derivative = (error - self.prev_error) / dt;
        let derivative =
            self.derivative + DERIVATIVE_FILTER_FACTOR * (raw_derivative - self.derivative);
        let d_term = self.gains.kd * derivative;

        let raw = p_term + i_term + d_term;
        let output = if raw.is_finite() {
            raw.clamp(self.output_min, self.output_max)
        } else {
            self.output_min
        };

        // State committed only after the output is known.
        self.integral = integral;
        self.derivative = if derivative.is_finite() { derivative } else { 0.0 };
        self.setpoint = setpoint;
        self.prev_error = error;
        self.last_update = now;
        self.output = output;
        self.history.push(error);

        output
    }

    /// Zero dynamic state and restart the clock. Gains and limits are kept.
    pub fn reset(&mut self, now: TimestampMs) {
        self.prev_error = 0.0;
        self.integral = 0.0;
        self.derivative = 0.0;
        self.output = 0.0;
        self.last_update = now;
        self.history.clear();
    }

    /// Enable; a disabled controller is reset first.
    pub fn enable(&mut self, now: TimestampMs) {
        if !self.enabled {
            self.reset(now);
            self.enabled = true;
        }
    }

    /// Advance the clock without an update (deadband hold).
    pub fn hold(&mut self, now: TimestampMs) {
        self.last_update = now;
    }

    pub fn disable(&mut self) {
        self.enabled = false;
    }

    #[inline]
    pub const fn is_enabled(&self) -> bool {
        self.enabled
    }

    #[inline]
    pub const fn gains(&self) -> PidGains {
        self.gains
    }

    pub fn set_gains(&mut self, gains: PidGains) {
        self.gains = gains;
    }

    /// Multiply `kp` and `ki` in place.
    pub fn scale_gains(&mut self, kp_factor: f64, ki_factor: f64) {
        self.gains.kp *= kp_factor;
        self.gains.ki *= ki_factor;
    }

    #[inline]
    pub const fn output(&self) -> f64 {
        self.output
    }

    #[inline]
    pub const fn output_limits(&self) -> (f64, f64) {
        (self.output_min, self.output_max)
    }

    #[inline]
    pub const fn integral(&self) -> f64 {
        self.integral
    }

    #[inline]
    pub const fn prev_error(&self) -> f64 {
        self.prev_error
    }

    #[inline]
    pub const fn setpoint(&self) -> f64 {
        self.setpoint
    }

    #[inline]
    pub const fn last_update(&self) -> TimestampMs {
        self.last_update
    }

    #[inline]
    pub const fn action(&self) -> ControlAction {
        self.action
    }

    /// Most recent errors, oldest first.
    #[inline]
    pub fn error_history(&self) -> &RingBuffer<f64, ERROR_HISTORY_LEN> {
        &self.history
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
