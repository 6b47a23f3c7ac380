//! Control-core shared types.
//!
//! Consumed by the control unit and by every collaborator that feeds it
//! (sensor bus readers, config storage, display, remote command links).

pub mod alarm;
pub mod config;
pub mod fault;
pub mod inputs;
pub mod sensor;
pub mod state;
pub mod status;
