//! Error types for device-sync

use std::time::Duration;

use thiserror::Error;

use crate::logging::LoggingError;

/// Failure reported by a [`ShellExecutor`](crate::shell::ShellExecutor).
///
/// The helpers in [`shell`](crate::shell) log these and carry on; only code
/// calling an executor directly ever sees one.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ShellError {
    /// The command did not finish within its timeout
    #[error("Command timed out after {0:?}")]
    Timeout(Duration),

    /// The transport to the device failed
    #[error("Transport error: {0}")]
    Transport(String),

    /// The device refused the command
    #[error("Command rejected: {0}")]
    Rejected(String),

    /// The output receiver asked to stop
    #[error("Command cancelled by receiver")]
    Cancelled,
}

/// Invalid [`SyncConfig`](crate::config::SyncConfig) values
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{field} must be greater than zero")]
    ZeroDuration { field: &'static str },

    #[error("boot_check_timeout ({check:?}) must be shorter than poll_interval ({interval:?})")]
    CheckExceedsInterval { check: Duration, interval: Duration },
}

/// Top-level error type for device-sync
#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Registry error: {0}")]
    Registry(#[from] device_registry::RegistryError),

    #[error("Logging error: {0}")]
    Logging(#[from] LoggingError),

    /// A required builder component was not supplied
    #[error("Missing component: {0}")]
    MissingComponent(&'static str),
}

/// Result type for device-sync operations
pub type Result<T> = std::result::Result<T, SyncError>;
