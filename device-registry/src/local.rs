//! In-memory registry.
//!
//! `LocalRegistry` keeps devices in connection order and delivers events
//! synchronously on the thread that caused them. Delivery iterates over a
//! snapshot of the listener list, so listeners may add or remove listeners
//! (including themselves) from inside a callback.

use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, trace};

use crate::device::{Device, DeviceChange, DeviceRef, SimpleDevice};
use crate::error::{RegistryError, Result};
use crate::listener::{DeviceEvent, DeviceRegistry, ListenerRef};

/// Thread-safe in-memory [`DeviceRegistry`]
///
/// # Example
///
/// ```
/// use device_registry::{Device, DeviceRegistry, LocalRegistry};
///
/// let registry = LocalRegistry::new();
/// let device = registry.connect("emulator-5554").unwrap();
/// assert!(!device.has_clients());
///
/// registry.set_has_clients("emulator-5554", true).unwrap();
/// assert!(registry.devices()[0].has_clients());
/// ```
#[derive(Default)]
pub struct LocalRegistry {
    devices: RwLock<Vec<Arc<SimpleDevice>>>,
    listeners: RwLock<Vec<ListenerRef>>,
}

impl LocalRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a device and notify listeners with `Connected`
    pub fn connect(&self, serial: &str) -> Result<Arc<SimpleDevice>> {
        self.attach(Arc::new(SimpleDevice::new(serial)))
    }

    /// Add an existing device handle and notify listeners with `Connected`
    pub fn attach(&self, device: Arc<SimpleDevice>) -> Result<Arc<SimpleDevice>> {
        {
            let mut devices = self.devices.write();
            if devices.iter().any(|d| d.serial() == device.serial()) {
                return Err(RegistryError::DuplicateDevice(device.serial().to_string()));
            }
            devices.push(Arc::clone(&device));
        }

        debug!(serial = %device.serial(), "Device connected");
        self.emit(&DeviceEvent::Connected(device.clone() as DeviceRef));
        Ok(device)
    }

    /// Update a device's client state and notify listeners with
    /// `Changed(CLIENT_LIST)`.
    ///
    /// The event is sent even when the flag already had this value, matching
    /// registries that report every client-list refresh.
    pub fn set_has_clients(&self, serial: &str, has_clients: bool) -> Result<()> {
        let device = self.require(serial)?;
        device.set_has_clients(has_clients);

        debug!(serial = %serial, has_clients, "Device client list changed");
        self.emit(&DeviceEvent::Changed(device as DeviceRef, DeviceChange::CLIENT_LIST));
        Ok(())
    }

    /// Notify listeners that something about a device changed
    pub fn mark_changed(&self, serial: &str, change: DeviceChange) -> Result<()> {
        let device = self.require(serial)?;
        self.emit(&DeviceEvent::Changed(device as DeviceRef, change));
        Ok(())
    }

    /// Remove a device and notify listeners with `Disconnected`
    pub fn disconnect(&self, serial: &str) -> Result<Arc<SimpleDevice>> {
        let device = {
            let mut devices = self.devices.write();
            let index = devices
                .iter()
                .position(|d| d.serial() == serial)
                .ok_or_else(|| RegistryError::UnknownDevice(serial.to_string()))?;
            devices.remove(index)
        };

        debug!(serial = %serial, "Device disconnected");
        self.emit(&DeviceEvent::Disconnected(device.clone() as DeviceRef));
        Ok(device)
    }

    /// Deliver an arbitrary event to all registered listeners
    pub fn emit(&self, event: &DeviceEvent) {
        let listeners: Vec<ListenerRef> = self.listeners.read().clone();
        trace!(
            kind = %event.kind(),
            serial = %event.device().serial(),
            listeners = listeners.len(),
            "Dispatching device event"
        );
        for listener in listeners {
            listener.on_event(event);
        }
    }

    /// Look up a connected device by serial
    pub fn get(&self, serial: &str) -> Option<Arc<SimpleDevice>> {
        self.devices
            .read()
            .iter()
            .find(|d| d.serial() == serial)
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.devices.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.read().is_empty()
    }

    /// Number of currently registered listeners
    pub fn listener_count(&self) -> usize {
        self.listeners.read().len()
    }

    fn require(&self, serial: &str) -> Result<Arc<SimpleDevice>> {
        self.get(serial)
            .ok_or_else(|| RegistryError::UnknownDevice(serial.to_string()))
    }
}

impl DeviceRegistry for LocalRegistry {
    fn add_listener(&self, listener: ListenerRef) {
        let mut listeners = self.listeners.write();
        listeners.push(listener);
        trace!(listeners = listeners.len(), "Listener added");
    }

    fn remove_listener(&self, listener: &ListenerRef) -> bool {
        let mut listeners = self.listeners.write();
        match listeners.iter().position(|l| Arc::ptr_eq(l, listener)) {
            Some(index) => {
                listeners.remove(index);
                trace!(listeners = listeners.len(), "Listener removed");
                true
            }
            None => false,
        }
    }

    fn devices(&self) -> Vec<DeviceRef> {
        self.devices
            .read()
            .iter()
            .map(|d| Arc::clone(d) as DeviceRef)
            .collect()
    }
}

impl std::fmt::Debug for LocalRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalRegistry")
            .field("device_count", &self.len())
            .field("listener_count", &self.listener_count())
            .finish()
    }
}
