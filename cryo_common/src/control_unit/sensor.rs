//! Sensor channel model.
//!
//! One [`SensorChannel`] per physical measurement. Channels only keep
//! bookkeeping (value, validity, fault counter, running statistics);
//! plausibility windows per physical role live on [`ChannelId`].
//!
//! Staleness is derived: [`SensorChannel::valid`] recomputes it from the
//! caller's clock on every query, so a channel expires on its own when
//! polling stalls.

use serde::{Deserialize, Serialize};

use crate::consts::{CHANNEL_COUNT, MAX_COMPRESSORS, SENSOR_AVERAGE_WEIGHT};

/// Milliseconds on the shared monotonic clock.
pub type TimestampMs = u64;

// ─── Channel Identity ───────────────────────────────────────────────

/// Physical measurement role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum ChannelId {
    /// Chilled water returning from the load. Primary control variable.
    ReturnWater = 0,
    /// Chilled water leaving the evaporator.
    SupplyWater = 1,
    /// Outdoor ambient air.
    Ambient = 2,
    /// Condenser refrigerant temperature.
    Condenser = 3,
    /// High-side (discharge) refrigerant pressure [bar].
    DischargePressure = 4,
    /// Low-side (suction) refrigerant pressure [bar].
    SuctionPressure = 5,
    /// Compressor shell temperature (index 0-based).
    Compressor(u8),
}

/// Inclusive plausibility window for a channel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlausibleRange {
    pub min: f64,
    pub max: f64,
}

impl PlausibleRange {
    #[inline]
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    #[inline]
    pub fn contains(&self, value: f64) -> bool {
        value.is_finite() && value >= self.min && value <= self.max
    }
}

impl ChannelId {
    /// All plant channels in index order, followed by every compressor.
    pub const ALL: [ChannelId; CHANNEL_COUNT] = [
        ChannelId::ReturnWater,
        ChannelId::SupplyWater,
        ChannelId::Ambient,
        ChannelId::Condenser,
        ChannelId::DischargePressure,
        ChannelId::SuctionPressure,
        ChannelId::Compressor(0),
        ChannelId::Compressor(1),
        ChannelId::Compressor(2),
        ChannelId::Compressor(3),
    ];

    /// Dense array index, `None` for a compressor beyond `MAX_COMPRESSORS`.
    #[inline]
    pub const fn index(&self) -> Option<usize> {
        match self {
            Self::ReturnWater => Some(0),
            Self::SupplyWater => Some(1),
            Self::Ambient => Some(2),
            Self::Condenser => Some(3),
            Self::DischargePressure => Some(4),
            Self::SuctionPressure => Some(5),
            Self::Compressor(n) => {
                if (*n as usize) < MAX_COMPRESSORS {
                    Some(6 + *n as usize)
                } else {
                    None
                }
            }
        }
    }

    /// Physical plausibility window for the channel's role.
    pub const fn plausible_range(&self) -> PlausibleRange {
        match self {
            Self::ReturnWater | Self::SupplyWater => PlausibleRange::new(0.0, 25.0),
            Self::Ambient => PlausibleRange::new(0.0, 60.0),
            Self::Condenser => PlausibleRange::new(0.0, 80.0),
            Self::DischargePressure => PlausibleRange::new(0.0, 35.0),
            Self::SuctionPressure => PlausibleRange::new(0.0, 15.0),
            Self::Compressor(_) => PlausibleRange::new(0.0, 130.0),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::ReturnWater => "return_water",
            Self::SupplyWater => "supply_water",
            Self::Ambient => "ambient",
            Self::Condenser => "condenser",
            Self::DischargePressure => "discharge_pressure",
            Self::SuctionPressure => "suction_pressure",
            Self::Compressor(0) => "compressor_1",
            Self::Compressor(1) => "compressor_2",
            Self::Compressor(2) => "compressor_3",
            Self::Compressor(3) => "compressor_4",
            Self::Compressor(_) => "compressor",
        }
    }
}

// ─── Sensor Channel ─────────────────────────────────────────────────

/// Outcome of offering a sample to a channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleOutcome {
    /// Value stored, statistics updated.
    Stored,
    /// Read failed or value implausible; fault counter incremented.
    Rejected,
}

/// Bookkeeping for one physical measurement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensorChannel {
    /// Last stored value.
    pub value: f64,
    /// Stored validity flag (staleness is checked separately).
    pub valid: bool,
    /// Timestamp of the last stored value.
    pub last_update: TimestampMs,
    /// Rejected reads since start.
    pub fault_count: u32,
    /// Running minimum of stored values.
    pub min: f64,
    /// Running maximum of stored values.
    pub max: f64,
    /// Exponentially weighted average of stored values.
    pub average: f64,
    /// Number of stored samples.
    pub samples: u64,
}

impl Default for SensorChannel {
    fn default() -> Self {
        Self {
            value: 0.0,
            valid: false,
            last_update: 0,
            fault_count: 0,
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
            average: 0.0,
            samples: 0,
        }
    }
}

impl SensorChannel {
    /// Offer a read result to the channel.
    ///
    /// `None` (read failed) and values outside `range` are rejected and
    /// count a fault; the previously stored value is kept.
    ///
    /// A reject clears the valid flag at once, without waiting for the
    /// staleness timeout. On the return-water channel this blocks automatic
    /// control from the first bad read until the next stored sample.
    pub fn record(
        &mut self,
        reading: Option<f64>,
        range: PlausibleRange,
        now: TimestampMs,
    ) -> SampleOutcome {
        match reading {
            Some(value) if range.contains(value) => {
                self.store(value, now);
                SampleOutcome::Stored
            }
            _ => {
                self.fault_count = self.fault_count.saturating_add(1);
                self.valid = false;
                SampleOutcome::Rejected
            }
        }
    }

    fn store(&mut self, value: f64, now: TimestampMs) {
        self.value = value;
        self.valid = true;
        self.last_update = now;
        self.min = self.min.min(value);
        self.max = self.max.max(value);
        self.average = if self.samples == 0 {
            value
        } else {
            SENSOR_AVERAGE_WEIGHT * value + (1.0 - SENSOR_AVERAGE_WEIGHT) * self.average
        };
        self.samples += 1;
    }

    /// Valid flag set and the last store is younger than `timeout_ms`.
    #[inline]
    pub fn valid(&self, now: TimestampMs, timeout_ms: u64) -> bool {
        self.valid && !self.is_stale(now, timeout_ms)
    }

    /// Elapsed time since the last store reached `timeout_ms`.
    #[inline]
    pub fn is_stale(&self, now: TimestampMs, timeout_ms: u64) -> bool {
        now.saturating_sub(self.last_update) >= timeout_ms
    }

    /// Value if currently valid.
    #[inline]
    pub fn reading(&self, now: TimestampMs, timeout_ms: u64) -> Option<f64> {
        self.valid(now, timeout_ms).then_some(self.value)
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
