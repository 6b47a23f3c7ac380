//! Read-only snapshots handed to the control core at the top of a pass.
//!
//! Digital safety inputs are packed into [`SafetyInputs`] bitflags.
//! Interrupt-driven sources go through [`EmergencyStopLatch`], which the
//! fast interlock check consumes; they never touch the alarm tables.

use core::sync::atomic::{AtomicBool, Ordering};

use bitflags::bitflags;

use crate::consts::MAX_COMPRESSORS;

bitflags! {
    /// Digital safety inputs. A set bit means the fault condition is present.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct SafetyInputs: u16 {
        const EMERGENCY_STOP       = 0x0001;
        const HIGH_PRESSURE_SWITCH = 0x0002;
        const LOW_PRESSURE_SWITCH  = 0x0004;
        /// Flow switch open (no chilled-water flow).
        const FLOW_LOSS            = 0x0008;
        const PHASE_FAILURE        = 0x0010;
        const MOTOR_THERMAL        = 0x0020;
        const OVERLOAD_1           = 0x0100;
        const OVERLOAD_2           = 0x0200;
        const OVERLOAD_3           = 0x0400;
        const OVERLOAD_4           = 0x0800;
    }
}

impl SafetyInputs {
    /// All compressor overload bits.
    pub const OVERLOAD_MASK: Self = Self::from_bits_truncate(0x0F00);

    /// Overload bit for a 0-based compressor index.
    pub const fn overload(index: usize) -> Self {
        if index < MAX_COMPRESSORS {
            Self::from_bits_truncate(0x0100 << index)
        } else {
            Self::empty()
        }
    }

    /// Bitmask of overloaded compressors (bit n = compressor n).
    #[inline]
    pub const fn overload_bits(&self) -> u16 {
        (self.bits() & Self::OVERLOAD_MASK.bits()) >> 8
    }
}

/// Plant telemetry that is not a sensor channel.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PlantTelemetry {
    /// Electrical power drawn by the compressors [kW].
    pub power_kw: f64,
    /// Heat removed from the chilled-water loop [kW].
    pub cooling_kw: f64,
}

/// Emergency-stop line staged from interrupt context.
///
/// `trigger` is safe from any context; the main loop calls `take` once
/// per fast check.
#[derive(Debug, Default)]
pub struct EmergencyStopLatch {
    pending: AtomicBool,
}

impl EmergencyStopLatch {
    pub const fn new() -> Self {
        Self {
            pending: AtomicBool::new(false),
        }
    }

    #[inline]
    pub fn trigger(&self) {
        self.pending.store(true, Ordering::Release);
    }

    #[inline]
    pub fn take(&self) -> bool {
        self.pending.swap(false, Ordering::AcqRel)
    }

    #[inline]
    pub fn is_pending(&self) -> bool {
        self.pending.load(Ordering::Acquire)
    }
}
