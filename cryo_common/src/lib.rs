//! CRYO Common Library
//!
//! Shared data model, constants and configuration loading for the CRYO
//! chiller control workspace.
//!
//! # Module Structure
//!
//! - [`consts`] - Numeric limits, plausibility ranges and cadences
//! - [`config`] - TOML configuration loading traits and errors
//! - [`ring`] - Bounded circular buffer used by every history window
//! - [`control_unit`] - Types shared between the control core and its collaborators
//! - [`prelude`] - Common re-exports for convenience

pub mod config;
pub mod consts;
pub mod control_unit;
pub mod prelude;
pub mod ring;
