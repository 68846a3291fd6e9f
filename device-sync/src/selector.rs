//! Device selection criteria.

use std::fmt;

use device_registry::Device;

/// Which device a wait is looking for.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum DeviceSelector {
    /// The first device the registry knows about
    #[default]
    Any,
    /// The device with this serial
    Serial(String),
}

impl DeviceSelector {
    pub fn serial(serial: impl Into<String>) -> Self {
        DeviceSelector::Serial(serial.into())
    }

    /// Whether `device` satisfies this selector
    pub fn matches(&self, device: &dyn Device) -> bool {
        match self {
            DeviceSelector::Any => true,
            DeviceSelector::Serial(serial) => device.serial() == serial,
        }
    }
}

impl From<&str> for DeviceSelector {
    fn from(serial: &str) -> Self {
        DeviceSelector::Serial(serial.to_string())
    }
}

impl From<String> for DeviceSelector {
    fn from(serial: String) -> Self {
        DeviceSelector::Serial(serial)
    }
}

/// `None` selects any device, mirroring a missing serial on the command line
impl From<Option<&str>> for DeviceSelector {
    fn from(serial: Option<&str>) -> Self {
        serial.map_or(DeviceSelector::Any, DeviceSelector::from)
    }
}

impl fmt::Display for DeviceSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceSelector::Any => write!(f, "<any>"),
            DeviceSelector::Serial(serial) => write!(f, "{}", serial),
        }
    }
}
