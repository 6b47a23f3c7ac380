//! # Cryo Control Unit Library
//!
//! Return-water temperature regulation for an industrial chiller in hot
//! climates. A single-threaded pass samples the sensors, runs the selected
//! control strategy against a compensated setpoint, looks for control
//! faults and evaluates a layered safety interlock that can override the
//! output at any time.
//!
//! ## Pass Layers
//!
//! 1. **Sensors**: validity, plausibility and staleness per channel
//! 2. **Control**: PID family, fuzzy, hybrid; compensation and gain schedule
//! 3. **Detection**: edge-triggered control fault slot
//! 4. **Safety**: fast / normal / slow checks, alarm table, lockout
//!
//! Plant access, event logging, status display and configuration storage
//! are collaborator traits in [`io`].

pub mod cadence;
pub mod command;
pub mod control;
pub mod cycle;
pub mod error;
pub mod io;
pub mod safety;
pub mod sensor;
pub mod sim;
