//! Fuzzy-logic output path.
//!
//! Three triangular sets each for error and error rate, three rules
//! combined by min-conjunction, and a weighted-average defuzzification
//! over singleton rule outputs:
//!
//! | error | rate | output |
//! |-------|------|--------|
//! | zero  | zero | medium |
//! | pos   | pos  | high   |
//! | neg   | neg  | low    |
//!
//! Inputs saturate at the outer peaks so a large error still belongs
//! fully to its outer set. When no rule fires the previous output is held.
//!
//! The weighted sum of rule outputs is divided by the total firing
//! strength, so a single rule firing at any strength yields its full
//! singleton (a lone `pos∧pos` at 0.1 still gives 100 %). A plain
//! unnormalised sum would give 10 % there.

use cryo_common::consts::PID_MIN_DT;
use cryo_common::control_unit::sensor::TimestampMs;

use super::pid::ControlAction;

/// Triangular membership with feet `a`, `c` and peak `b`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Triangle {
    pub a: f64,
    pub b: f64,
    pub c: f64,
}

impl Triangle {
    pub const fn new(a: f64, b: f64, c: f64) -> Self {
        Self { a, b, c }
    }

    pub fn membership(&self, x: f64) -> f64 {
        if x <= self.a || x >= self.c {
            // Degenerate shoulder: a == b or b == c at the peak itself.
            if x == self.b {
                return 1.0;
            }
            return 0.0;
        }
        if x <= self.b {
            (x - self.a) / (self.b - self.a)
        } else {
            (self.c - x) / (self.c - self.b)
        }
    }
}

/// Negative / zero / positive partition of one input.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FuzzySets {
    pub negative: Triangle,
    pub zero: Triangle,
    pub positive: Triangle,
}

impl FuzzySets {
    /// Symmetric partition with outer peaks at `±peak` and a zero set of
    /// half-width `zero_width`.
    pub const fn symmetric(peak: f64, zero_width: f64) -> Self {
        Self {
            negative: Triangle::new(-2.0 * peak, -peak, 0.0),
            zero: Triangle::new(-zero_width, 0.0, zero_width),
            positive: Triangle::new(0.0, peak, 2.0 * peak),
        }
    }

    /// `(negative, zero, positive)` memberships, saturating at the peaks.
    pub fn fuzzify(&self, x: f64) -> (f64, f64, f64) {
        let x = x.clamp(self.negative.b, self.positive.b);
        (
            self.negative.membership(x),
            self.zero.membership(x),
            self.positive.membership(x),
        )
    }
}

/// Rule output singletons [%].
const OUTPUT_LOW: f64 = 0.0;
const OUTPUT_MEDIUM: f64 = 50.0;
const OUTPUT_HIGH: f64 = 100.0;

/// Fuzzy controller state.
#[derive(Debug, Clone)]
pub struct FuzzyController {
    /// Error partition [°C].
    error_sets: FuzzySets,
    /// Error-rate partition [°C/min].
    rate_sets: FuzzySets,
    action: ControlAction,
    prev_error: f64,
    output: f64,
    output_min: f64,
    output_max: f64,
    last_update: TimestampMs,
}

impl FuzzyController {
    pub fn new(action: ControlAction, output_min: f64, output_max: f64, now: TimestampMs) -> Self {
        Self {
            error_sets: FuzzySets::symmetric(5.0, 2.0),
            rate_sets: FuzzySets::symmetric(1.0, 0.5),
            action,
            prev_error: 0.0,
            output: output_min,
            output_min,
            output_max,
            last_update: now,
        }
    }

    pub fn compute(&mut self, setpoint: f64, process_value: f64, now: TimestampMs) -> f64 {
        let dt = (now.saturating_sub(self.last_update) as f64 / 1000.0).max(PID_MIN_DT);
        let error = self.action.error(setpoint, process_value);
        let rate = (error - self.prev_error) / dt * 60.0;

        let (e_neg, e_zero, e_pos) = self.error_sets.fuzzify(error);
        let (r_neg, r_zero, r_pos) = self.rate_sets.fuzzify(rate);

        let rules = [
            (e_zero.min(r_zero), OUTPUT_MEDIUM),
            (e_pos.min(r_pos), OUTPUT_HIGH),
            (e_neg.min(r_neg), OUTPUT_LOW),
        ];
        let weight: f64 = rules.iter().map(|(w, _)| w).sum();
        if weight > f64::EPSILON {
            let centroid = rules.iter().map(|(w, o)| w * o).sum::<f64>() / weight;
            self.output = centroid.clamp(self.output_min, self.output_max);
        }

        self.prev_error = error;
        self.last_update = now;
        self.output
    }

    pub fn hold(&mut self, now: TimestampMs) {
        self.last_update = now;
    }

    pub fn reset(&mut self, now: TimestampMs) {
        self.prev_error = 0.0;
        self.output = self.output_min;
        self.last_update = now;
    }

    #[inline]
    pub const fn output(&self) -> f64 {
        self.output
    }
}

// ─── Tests ──────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn triangle_membership() {
        let t = Triangle::new(0.0, 5.0, 10.0);
        assert_eq!(t.membership(0.0), 0.0);
        assert_eq!(t.membership(2.5), 0.5);
        assert_eq!(t.membership(5.0), 1.0);
        assert_eq!(t.membership(7.5), 0.5);
        assert_eq!(t.membership(12.0), 0.0);
    }

    #[test]
    fn fuzzify_saturates_at_peaks() {
        let sets = FuzzySets::symmetric(5.0, 2.0);
        assert_eq!(sets.fuzzify(12.0), (0.0, 0.0, 1.0));
        assert_eq!(sets.fuzzify(-40.0), (1.0, 0.0, 0.0));
        assert_eq!(sets.fuzzify(0.0), (0.0, 1.0, 0.0));
    }

    #[test]
    fn at_setpoint_and_steady_gives_medium() {
        let mut f = FuzzyController::new(ControlAction::Reverse, 0.0, 100.0, 0);
        let out = f.compute(10.0, 10.0, 1_000);
        assert!((out - 50.0).abs() < 1e-12);
    }

    #[test]
    fn warm_and_warming_gives_high() {
        let mut f = FuzzyController::new(ControlAction::Reverse, 0.0, 100.0, 0);
        f.compute(10.0, 10.0, 60_000);
        // Error jumps to +5 within one minute: rate +5 °C/min.
        let out = f.compute(10.0, 15.0, 120_000);
        assert!((out - 100.0).abs() < 1e-12, "out = {out}");
    }

    #[test]
    fn cold_and_cooling_gives_low() {
        let mut f = FuzzyController::new(ControlAction::Reverse, 0.0, 100.0, 0);
        f.compute(10.0, 10.0, 60_000);
        let out = f.compute(10.0, 5.0, 120_000);
        assert!(out.abs() < 1e-12, "out = {out}");
    }

    #[test]
    fn blended_rules_between_singletons() {
        let mut f = FuzzyController::new(ControlAction::Reverse, 0.0, 100.0, 0);
        f.compute(10.0, 10.0, 60_000);
        // Error +0.5, rate +0.5 °C/min:
        // zero∧zero = min(0.75, 0.0) = 0, pos∧pos = min(0.1, 0.5) = 0.1
        let out = f.compute(10.0, 10.5, 120_000);
        // Normalised by firing strength: 0.1 · 100 / 0.1, not 0.1 · 100.
        assert!((out - 100.0).abs() < 1e-9, "out = {out}");
        // Hold a tiny positive rate near zero error: both medium and high fire.
        let mut g = FuzzyController::new(ControlAction::Reverse, 0.0, 100.0, 0);
        g.compute(10.0, 10.0, 60_000);
        let out = g.compute(10.0, 10.2, 120_000);
        // e = 0.2: zero 0.9, pos 0.04; rate 0.2: zero 0.6, pos 0.2
        // w_med = 0.6, w_high = 0.04 → (30 + 4) / 0.64
        assert!((out - 34.0 / 0.64).abs() < 1e-9, "out = {out}");
    }

    #[test]
    fn no_rule_fired_holds_output() {
        let mut f = FuzzyController::new(ControlAction::Reverse, 0.0, 100.0, 0);
        f.compute(10.0, 10.0, 1_000);
        assert_eq!(f.output(), 50.0);
        // Steady +3 error: rate zero after the first step, only pos error fires.
        f.compute(10.0, 13.0, 61_000);
        let held = f.output();
        let out = f.compute(10.0, 13.0, 121_000);
        assert_eq!(out, held);
    }
}
