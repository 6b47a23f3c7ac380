//! Error module root.
//!
//! Control-fault detection lives in [`detector`]. [`CoreError`] covers
//! rejected parameters at construction time and on live changes.

pub mod detector;

use cryo_common::config::ConfigError;
use thiserror::Error;

/// Errors raised by the control core.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoreError {
    /// Parameter outside its sanity bounds.
    #[error("parameter {name} = {value} outside sanity bounds")]
    InvalidParameter { name: &'static str, value: f64 },

    #[error(transparent)]
    Config(#[from] ConfigError),
}
