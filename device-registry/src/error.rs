//! Error types for registry bookkeeping.

use thiserror::Error;

/// Errors returned by [`LocalRegistry`](crate::LocalRegistry) mutations.
///
/// Listener registration never fails; these only cover attempts to drive
/// device state for serials the registry does not (or already does) know.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// No device with this serial is connected
    #[error("Unknown device: {0}")]
    UnknownDevice(String),

    /// A device with this serial is already connected
    #[error("Device already connected: {0}")]
    DuplicateDevice(String),
}

/// Result type for registry operations
pub type Result<T> = std::result::Result<T, RegistryError>;
