//! Rolling performance analytics.
//!
//! Fixed windows of efficiency, power and load samples with rolling
//! averages and a least-squares trend over the most recent samples.

use cryo_common::consts::ANALYTICS_WINDOW_LEN;
use cryo_common::ring::RingBuffer;

/// Samples used for trend estimation unless asked otherwise.
pub const DEFAULT_TREND_SAMPLES: usize = 16;

/// Slope magnitude below which a trend reads as flat.
pub const TREND_TOLERANCE: f64 = 0.001;

/// Direction of a trend slope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trend {
    Falling,
    Flat,
    Rising,
}

impl Trend {
    /// Classify `slope` with a dead zone of `±tolerance`.
    pub fn classify(slope: f64, tolerance: f64) -> Self {
        if slope > tolerance {
            Self::Rising
        } else if slope < -tolerance {
            Self::Falling
        } else {
            Self::Flat
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct PerformanceAnalytics {
    efficiency: RingBuffer<f64, ANALYTICS_WINDOW_LEN>,
    power: RingBuffer<f64, ANALYTICS_WINDOW_LEN>,
    load: RingBuffer<f64, ANALYTICS_WINDOW_LEN>,
}

impl PerformanceAnalytics {
    pub const fn new() -> Self {
        Self {
            efficiency: RingBuffer::new(),
            power: RingBuffer::new(),
            load: RingBuffer::new(),
        }
    }

    pub fn record(&mut self, efficiency: f64, power_kw: f64, load_factor: f64) {
        self.efficiency.push(efficiency);
        self.power.push(power_kw);
        self.load.push(load_factor);
    }

    #[inline]
    pub fn samples(&self) -> usize {
        self.efficiency.len()
    }

    pub fn average_efficiency(&self) -> f64 {
        self.efficiency.mean()
    }

    pub fn average_power(&self) -> f64 {
        self.power.mean()
    }

    pub fn average_load(&self) -> f64 {
        self.load.mean()
    }

    /// Efficiency slope per sample over the last `n` samples.
    pub fn efficiency_trend(&self, n: usize) -> f64 {
        self.efficiency.slope(n)
    }

    pub fn power_trend(&self, n: usize) -> f64 {
        self.power.slope(n)
    }

    pub fn clear(&mut self) {
        self.efficiency.clear();
        self.power.clear();
        self.load.clear();
    }
}
