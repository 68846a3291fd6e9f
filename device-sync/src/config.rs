//! Configuration for device-sync
//!
//! `SyncConfig` holds the poll interval and the per-command timeouts used by
//! the reconfiguration routines on [`DeviceTools`](crate::DeviceTools).
//! Readiness waits take their timeout per call and are not configured here.

use std::time::Duration;

use crate::error::ConfigError;

/// Timing configuration for [`DeviceTools`](crate::DeviceTools)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncConfig {
    /// Pause between boot-completion polls
    /// Default: 1 second
    pub poll_interval: Duration,

    /// Timeout for each boot-completion query while polling
    /// Default: 500 milliseconds
    pub boot_check_timeout: Duration,

    /// Timeout for quick state-changing commands (`stop`, `start`, `rm`, `setprop`)
    /// Default: 100 milliseconds
    pub short_command_timeout: Duration,

    /// Timeout for slower commands (remount, cache deletion, `ls`)
    /// Default: 500 milliseconds
    pub command_timeout: Duration,

    /// Timeout for reading file contents from the device
    /// Default: 1 second
    pub read_timeout: Duration,

    /// Timeout for reading a system property
    /// Default: 500 milliseconds
    pub property_read_timeout: Duration,

    /// Timeout for starting an activity
    /// Default: 30 seconds
    pub activity_start_timeout: Duration,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(1),
            boot_check_timeout: Duration::from_millis(500),
            short_command_timeout: Duration::from_millis(100),
            command_timeout: Duration::from_millis(500),
            read_timeout: Duration::from_secs(1),
            property_read_timeout: Duration::from_millis(500),
            activity_start_timeout: Duration::from_secs(30),
        }
    }
}

impl SyncConfig {
    /// Create a new SyncConfig with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Short intervals for emulators and test rigs that boot quickly
    pub fn fast() -> Self {
        Self {
            poll_interval: Duration::from_millis(200),
            boot_check_timeout: Duration::from_millis(100),
            activity_start_timeout: Duration::from_secs(10),
            ..Default::default()
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        let durations = [
            ("poll_interval", self.poll_interval),
            ("boot_check_timeout", self.boot_check_timeout),
            ("short_command_timeout", self.short_command_timeout),
            ("command_timeout", self.command_timeout),
            ("read_timeout", self.read_timeout),
            ("property_read_timeout", self.property_read_timeout),
            ("activity_start_timeout", self.activity_start_timeout),
        ];
        if let Some(&(field, _)) = durations.iter().find(|(_, d)| d.is_zero()) {
            return Err(ConfigError::ZeroDuration { field });
        }

        if self.boot_check_timeout >= self.poll_interval {
            return Err(ConfigError::CheckExceedsInterval {
                check: self.boot_check_timeout,
                interval: self.poll_interval,
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets_are_valid() {
        assert!(SyncConfig::default().validate().is_ok());
        assert!(SyncConfig::fast().validate().is_ok());
    }

    #[test]
    fn test_zero_duration_rejected() {
        let config = SyncConfig {
            read_timeout: Duration::ZERO,
            ..Default::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::ZeroDuration {
                field: "read_timeout"
            })
        );
    }

    #[test]
    fn test_check_must_be_shorter_than_interval() {
        let config = SyncConfig {
            poll_interval: Duration::from_millis(500),
            boot_check_timeout: Duration::from_millis(500),
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::CheckExceedsInterval { .. })
        ));
    }
}
