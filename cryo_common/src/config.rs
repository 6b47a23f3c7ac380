//! Configuration loading traits and types.
//!
//! This module provides a standardized way to load and store TOML
//! configuration files across all CRYO applications.
//!
//! # Usage
//!
//! ```rust,no_run
//! use cryo_common::config::{ConfigLoader, ConfigError};
//! use cryo_common::control_unit::config::ControlConfiguration;
//! use std::path::Path;
//!
//! fn main() -> Result<(), ConfigError> {
//!     let config = ControlConfiguration::load(Path::new("control.toml"))?;
//!     println!("Setpoint: {}", config.setpoint);
//!     Ok(())
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Error type for configuration loading operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// Configuration file not found at specified path.
    #[error("Configuration file not found")]
    FileNotFound,

    /// TOML parsing failed.
    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    /// Semantic validation failed.
    #[error("Configuration validation failed: {0}")]
    ValidationError(String),

    /// Serialization or file write failed.
    #[error("Failed to write configuration: {0}")]
    WriteError(String),
}

/// Log level for application logging.
///
/// Uses lowercase serde values for TOML compatibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Most verbose, detailed tracing information.
    Trace,
    /// Debug information useful during development.
    Debug,
    /// General information about application operation.
    #[default]
    Info,
    /// Warning messages for potentially problematic situations.
    Warn,
    /// Error messages for serious problems.
    Error,
}

impl LogLevel {
    /// Directive string understood by `tracing_subscriber::EnvFilter`.
    pub const fn as_directive(&self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }

    /// Raise to `Debug` when `verbose` asks for more detail than `self`.
    pub const fn with_verbose(self, verbose: bool) -> Self {
        match (self, verbose) {
            (Self::Trace, _) => Self::Trace,
            (_, true) => Self::Debug,
            (level, false) => level,
        }
    }
}

/// Trait for loading configuration from TOML files.
///
/// # Contract
///
/// - Returns `ConfigError::FileNotFound` if the file does not exist
/// - Returns `ConfigError::ParseError` if TOML syntax is invalid
pub trait ConfigLoader: Sized + serde::de::DeserializeOwned {
    /// Load configuration from a TOML file.
    fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::FileNotFound
            } else {
                ConfigError::ParseError(e.to_string())
            }
        })?;

        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string.
    fn from_toml(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }
}

// Blanket implementation for all types that implement DeserializeOwned.
impl<T: serde::de::DeserializeOwned> ConfigLoader for T {}

/// Serialize `value` as TOML and write it to `path`.
pub fn save_toml<T: Serialize>(value: &T, path: &Path) -> Result<(), ConfigError> {
    let content = toml::to_string_pretty(value).map_err(|e| ConfigError::WriteError(e.to_string()))?;
    std::fs::write(path, content).map_err(|e| ConfigError::WriteError(e.to_string()))
}
