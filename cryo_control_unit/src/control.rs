//! Control engine root.
//!
//! PID regulation, hot-climate compensation and the strategy selector,
//! plus the periodic optimisation and analytics that feed back into it.

pub mod analytics;
pub mod compensation;
pub mod fuzzy;
pub mod optimization;
pub mod pid;
pub mod strategy;
