//! Safety module root.
//!
//! Alarm bookkeeping, the per-cadence interlock checks, and the interlock
//! state machine that gates every actuator command.

pub mod alarms;
pub mod checks;
pub mod interlock;
