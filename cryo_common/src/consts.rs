//! System-wide constants for the CRYO workspace.
//!
//! Single source of truth for numeric limits, plausibility windows and
//! default cadences. Imported by all crates.

/// Maximum number of compressors with their own temperature channel.
pub const MAX_COMPRESSORS: usize = 4;

/// Number of sensor channels (6 plant channels + one per compressor).
pub const CHANNEL_COUNT: usize = 6 + MAX_COMPRESSORS;

/// Capacity of the PID error history ring.
pub const ERROR_HISTORY_LEN: usize = 32;

/// Capacity of each performance analytics window.
pub const ANALYTICS_WINDOW_LEN: usize = 64;

/// Capacity of the active alarm table (one slot per catalog entry).
pub const MAX_ACTIVE_ALARMS: usize = 32;

/// Capacity of the alarm history log.
pub const ALARM_HISTORY_LEN: usize = 128;

/// Exponential filter weight applied to a new sensor sample.
pub const SENSOR_AVERAGE_WEIGHT: f64 = 0.1;

/// Low-pass factor applied to the raw PID derivative each update.
pub const DERIVATIVE_FILTER_FACTOR: f64 = 0.1;

/// Smallest PID time step [s].
pub const PID_MIN_DT: f64 = 1e-3;

/// Assumed maximum coefficient of performance used to normalise efficiency.
pub const MAX_COP: f64 = 4.0;

/// Setpoint deviation beyond which a control fault is raised [°C].
pub const SETPOINT_DEVIATION_LIMIT: f64 = 5.0;

/// Hybrid blend weight of the PID path (fuzzy path gets the remainder).
pub const HYBRID_PID_WEIGHT: f64 = 0.7;

// ─── Display ────────────────────────────────────────────────────────

/// Display registers carry one decimal of precision.
pub const DISPLAY_SCALE: f64 = 10.0;

// ─── Interlock cadences [ms] ────────────────────────────────────────

/// Emergency stop and thermal trips.
pub const SAFETY_FAST_PERIOD_MS: u64 = 100;

/// Temperature and pressure limits.
pub const SAFETY_NORMAL_PERIOD_MS: u64 = 1_000;

/// Trend checks.
pub const SAFETY_SLOW_PERIOD_MS: u64 = 5_000;

/// Default lockout duration after an emergency trip [ms].
pub const DEFAULT_LOCKOUT_MS: u64 = 30_000;

// ─── Default configuration paths ────────────────────────────────────

/// Default control configuration file.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/cryo/control.toml";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cadences_are_ordered() {
        assert!(SAFETY_FAST_PERIOD_MS < SAFETY_NORMAL_PERIOD_MS);
        assert!(SAFETY_NORMAL_PERIOD_MS < SAFETY_SLOW_PERIOD_MS);
    }

    #[test]
    fn filter_weights_are_fractions() {
        assert!(SENSOR_AVERAGE_WEIGHT > 0.0 && SENSOR_AVERAGE_WEIGHT < 1.0);
        assert!(DERIVATIVE_FILTER_FACTOR > 0.0 && DERIVATIVE_FILTER_FACTOR < 1.0);
        assert!(HYBRID_PID_WEIGHT > 0.0 && HYBRID_PID_WEIGHT < 1.0);
    }
}
