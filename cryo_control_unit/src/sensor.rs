//! Sensor bank: one [`SensorChannel`] per physical measurement.
//!
//! Every offered sample is re-checked against the channel's plausibility
//! window. Validity is recomputed on every read against the shared
//! timeout, so a channel expires on its own when polling stalls.

use cryo_common::consts::{CHANNEL_COUNT, MAX_COMPRESSORS};
use cryo_common::control_unit::sensor::{ChannelId, SampleOutcome, SensorChannel, TimestampMs};
use tracing::debug;

use crate::io::SensorSource;

#[derive(Debug, Clone)]
pub struct SensorBank {
    channels: [SensorChannel; CHANNEL_COUNT],
    timeout_ms: u64,
    compressor_count: u8,
}

impl SensorBank {
    pub fn new(timeout_ms: u64, compressor_count: u8) -> Self {
        Self {
            channels: [SensorChannel::default(); CHANNEL_COUNT],
            timeout_ms,
            compressor_count: compressor_count.min(MAX_COMPRESSORS as u8),
        }
    }

    /// Offer one read result. Out-of-range values count as failed reads.
    pub fn update_channel(
        &mut self,
        id: ChannelId,
        reading: Option<f64>,
        now: TimestampMs,
    ) -> SampleOutcome {
        let Some(idx) = id.index() else {
            return SampleOutcome::Rejected;
        };
        let outcome = self.channels[idx].record(reading, id.plausible_range(), now);
        if outcome == SampleOutcome::Rejected {
            debug!(
                channel = id.name(),
                ?reading,
                faults = self.channels[idx].fault_count,
                "sample rejected"
            );
        }
        outcome
    }

    /// Poll every installed channel once. Returns the number of rejects.
    pub fn sample_all(&mut self, source: &mut dyn SensorSource, now: TimestampMs) -> usize {
        let mut rejected = 0;
        for id in self.installed() {
            let reading = source.read_channel(id);
            if self.update_channel(id, reading, now) == SampleOutcome::Rejected {
                rejected += 1;
            }
        }
        rejected
    }

    /// Installed channels: the six plant channels plus configured compressors.
    pub fn installed(&self) -> impl Iterator<Item = ChannelId> + use<> {
        let limit = 6 + self.compressor_count as usize;
        ChannelId::ALL.into_iter().take(limit)
    }

    pub fn channel(&self, id: ChannelId) -> Option<&SensorChannel> {
        id.index().map(|i| &self.channels[i])
    }

    #[inline]
    pub fn valid(&self, id: ChannelId, now: TimestampMs) -> bool {
        self.channel(id)
            .is_some_and(|c| c.valid(now, self.timeout_ms))
    }

    #[inline]
    pub fn reading(&self, id: ChannelId, now: TimestampMs) -> Option<f64> {
        self.channel(id)
            .and_then(|c| c.reading(now, self.timeout_ms))
    }

    pub fn fault_count(&self, id: ChannelId) -> u32 {
        self.channel(id).map_or(0, |c| c.fault_count)
    }

    /// Valid readings of the installed compressors, `None` where invalid.
    pub fn compressor_temps(&self, now: TimestampMs) -> [Option<f64>; MAX_COMPRESSORS] {
        let mut temps = [None; MAX_COMPRESSORS];
        for (i, t) in temps
            .iter_mut()
            .enumerate()
            .take(self.compressor_count as usize)
        {
            *t = self.reading(ChannelId::Compressor(i as u8), now);
        }
        temps
    }

    #[inline]
    pub const fn timeout_ms(&self) -> u64 {
        self.timeout_ms
    }

    #[inline]
    pub const fn compressor_count(&self) -> u8 {
        self.compressor_count
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
