//! Device handles and change masks.

use std::fmt;
use std::ops::{BitOr, BitOrAssign};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// A remote target known to a registry.
///
/// Implementations must answer `has_clients()` from live state on every call;
/// readiness waiting relies on the predicate never being cached.
pub trait Device: Send + Sync + fmt::Debug {
    /// Opaque serial identifying the device
    fn serial(&self) -> &str;

    /// Whether the device currently has at least one active managed connection
    fn has_clients(&self) -> bool;
}

/// Shared handle to a device owned by a registry
pub type DeviceRef = Arc<dyn Device>;

/// Bitmask describing what changed in a [`DeviceEvent::Changed`](crate::DeviceEvent::Changed).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct DeviceChange(u32);

impl DeviceChange {
    /// The device's online state changed
    pub const STATE: DeviceChange = DeviceChange(0x0001);
    /// The list of managed clients (active connections) changed
    pub const CLIENT_LIST: DeviceChange = DeviceChange(0x0002);
    /// Build information became available
    pub const BUILD_INFO: DeviceChange = DeviceChange(0x0004);

    /// An empty mask
    pub const fn empty() -> Self {
        DeviceChange(0)
    }

    /// Build a mask from raw bits
    pub const fn from_bits(bits: u32) -> Self {
        DeviceChange(bits)
    }

    /// Raw bits of the mask
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Whether every bit in `other` is set in `self`
    pub const fn contains(self, other: DeviceChange) -> bool {
        other.0 != 0 && self.0 & other.0 == other.0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl BitOr for DeviceChange {
    type Output = DeviceChange;

    fn bitor(self, rhs: DeviceChange) -> DeviceChange {
        DeviceChange(self.0 | rhs.0)
    }
}

impl BitOrAssign for DeviceChange {
    fn bitor_assign(&mut self, rhs: DeviceChange) {
        self.0 |= rhs.0;
    }
}

impl fmt::Debug for DeviceChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names = Vec::new();
        if self.contains(Self::STATE) {
            names.push("STATE");
        }
        if self.contains(Self::CLIENT_LIST) {
            names.push("CLIENT_LIST");
        }
        if self.contains(Self::BUILD_INFO) {
            names.push("BUILD_INFO");
        }
        write!(f, "DeviceChange({:#06x}: {})", self.0, names.join(" | "))
    }
}

/// A device whose client state is set explicitly.
///
/// Used by [`LocalRegistry`](crate::LocalRegistry), and by transports that
/// track connection counts themselves and only need to flip a flag.
#[derive(Debug)]
pub struct SimpleDevice {
    serial: String,
    has_clients: AtomicBool,
}

impl SimpleDevice {
    pub fn new(serial: impl Into<String>) -> Self {
        Self {
            serial: serial.into(),
            has_clients: AtomicBool::new(false),
        }
    }

    /// Create a device that already reports active clients
    pub fn with_clients(serial: impl Into<String>) -> Self {
        let device = Self::new(serial);
        device.set_has_clients(true);
        device
    }

    /// Update the client flag, returning whether it changed
    pub fn set_has_clients(&self, value: bool) -> bool {
        self.has_clients.swap(value, Ordering::AcqRel) != value
    }
}

impl Device for SimpleDevice {
    fn serial(&self) -> &str {
        &self.serial
    }

    fn has_clients(&self) -> bool {
        self.has_clients.load(Ordering::Acquire)
    }
}
