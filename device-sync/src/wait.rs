//! Readiness waiting
//!
//! Blocks the calling thread until a device shows up in a [`DeviceRegistry`]
//! and, in a second phase, until it has active clients.
//!
//! Both phases follow the same order:
//!
//! 1. register a listener with the registry (scoped by [`ListenerGuard`])
//! 2. inspect the current state
//! 3. if not satisfied, wait on a condition variable until the listener fires
//!    or the deadline passes
//!
//! Registering before inspecting means an event raised between the two steps
//! reaches the listener instead of being lost. Every wake-up re-checks the
//! shared state, so spurious wake-ups only cost another wait.
//!
//! A timeout is a normal outcome, reported as `None` (discovery phase) or as
//! the unchanged device (client phase), never as an error.

use std::sync::Arc;
use std::time::{Duration, Instant};

use device_registry::{
    Device, DeviceChange, DeviceChangeListener, DeviceRef, DeviceRegistry, ListenerGuard,
};
use parking_lot::{Condvar, Mutex};
use tracing::{debug, trace};

use crate::selector::DeviceSelector;

/// Wait until a device matching `selector` is known to `registry`.
///
/// Returns immediately when the registry already has a match:
/// - `Any` resolves to the first known device, whatever its client state
/// - `Serial` resolves only if that device already has clients; a known
///   device without clients is treated as not found yet and the call waits
///   for the next `Connected`/`Changed` event about it
///
/// Otherwise blocks for up to `timeout`, resolving to the first device named
/// by a matching event. A zero timeout never blocks.
pub fn await_device<R>(
    registry: &R,
    selector: &DeviceSelector,
    timeout: Duration,
) -> Option<DeviceRef>
where
    R: DeviceRegistry + ?Sized,
{
    let slot = Arc::new(DeviceSlot::new());
    let listener = Arc::new(DeviceWaitListener {
        selector: selector.clone(),
        slot: Arc::clone(&slot),
    });
    let _guard = ListenerGuard::register(registry, listener);

    let known = registry.devices();
    if let Some(device) = match_known(selector, &known) {
        debug!(selector = %selector, serial = %device.serial(), "Device already known");
        return Some(device);
    }

    trace!(selector = %selector, ?timeout, known = known.len(), "Waiting for device");
    let found = slot.wait(timeout);
    match &found {
        Some(device) => debug!(selector = %selector, serial = %device.serial(), "Device found"),
        None => debug!(selector = %selector, ?timeout, "Timed out waiting for device"),
    }
    found
}

/// Wait until `device` reports active clients.
///
/// Returns `device` itself in every case so calls can be chained; check
/// [`Device::has_clients`] afterwards to tell success from timeout. The wait
/// ends early on a `Changed` event for the same serial carrying
/// [`DeviceChange::CLIENT_LIST`]; other events are ignored.
pub fn await_clients<R>(registry: &R, device: DeviceRef, timeout: Duration) -> DeviceRef
where
    R: DeviceRegistry + ?Sized,
{
    let signal = Arc::new(ClientSignal::new());
    let listener = Arc::new(ClientWaitListener {
        serial: device.serial().to_string(),
        signal: Arc::clone(&signal),
    });
    let _guard = ListenerGuard::register(registry, listener);

    if device.has_clients() {
        trace!(serial = %device.serial(), "Device already has clients");
        return device;
    }

    trace!(serial = %device.serial(), ?timeout, "Waiting for clients");
    if signal.wait(device.as_ref(), timeout) {
        debug!(serial = %device.serial(), "Client list changed");
    } else {
        debug!(serial = %device.serial(), ?timeout, "Timed out waiting for clients");
    }
    device
}

/// Locate a device and wait for it to have clients.
///
/// Runs [`await_device`] and then [`await_clients`], each with its own
/// `timeout`, so the call can block for up to twice `timeout` in total.
pub fn find_device<R>(registry: &R, selector: &DeviceSelector, timeout: Duration) -> Option<DeviceRef>
where
    R: DeviceRegistry + ?Sized,
{
    let device = await_device(registry, selector, timeout)?;
    Some(await_clients(registry, device, timeout))
}

/// Wait for any device (as [`find_device`] with [`DeviceSelector::Any`]) and
/// return everything the registry knows afterwards.
///
/// An empty vector means nothing showed up within the timeout.
pub fn find_all_devices<R>(registry: &R, timeout: Duration) -> Vec<DeviceRef>
where
    R: DeviceRegistry + ?Sized,
{
    let _ = find_device(registry, &DeviceSelector::Any, timeout);
    registry.devices()
}

fn match_known(selector: &DeviceSelector, known: &[DeviceRef]) -> Option<DeviceRef> {
    match selector {
        DeviceSelector::Any => known.first().cloned(),
        DeviceSelector::Serial(serial) => known
            .iter()
            .find(|d| d.serial() == serial)
            .filter(|d| d.has_clients())
            .cloned(),
    }
}

/// `None` when `timeout` is too large to represent, meaning "no deadline"
fn deadline_after(timeout: Duration) -> Option<Instant> {
    Instant::now().checked_add(timeout)
}

/// Holds at most one device; the first offer wins.
struct DeviceSlot {
    device: Mutex<Option<DeviceRef>>,
    filled: Condvar,
}

impl DeviceSlot {
    fn new() -> Self {
        Self {
            device: Mutex::new(None),
            filled: Condvar::new(),
        }
    }

    /// Store `device` if the slot is empty and wake all waiters
    fn offer(&self, device: &DeviceRef) -> bool {
        let mut slot = self.device.lock();
        if slot.is_some() {
            return false;
        }
        *slot = Some(Arc::clone(device));
        self.filled.notify_all();
        true
    }

    fn wait(&self, timeout: Duration) -> Option<DeviceRef> {
        let mut slot = self.device.lock();
        if timeout.is_zero() {
            return slot.clone();
        }

        let deadline = deadline_after(timeout);
        while slot.is_none() {
            match deadline {
                Some(deadline) => {
                    if self.filled.wait_until(&mut slot, deadline).timed_out() {
                        break;
                    }
                }
                None => self.filled.wait(&mut slot),
            }
        }
        slot.clone()
    }

    #[cfg(test)]
    fn wake_without_filling(&self) {
        let _slot = self.device.lock();
        self.filled.notify_all();
    }
}

/// Set once the awaited client-list change has been seen.
struct ClientSignal {
    changed: Mutex<bool>,
    cond: Condvar,
}

impl ClientSignal {
    fn new() -> Self {
        Self {
            changed: Mutex::new(false),
            cond: Condvar::new(),
        }
    }

    fn notify(&self) {
        let mut changed = self.changed.lock();
        *changed = true;
        self.cond.notify_all();
    }

    /// Wait for a notification or for `device` to report clients.
    /// Returns whether either happened before the deadline.
    fn wait(&self, device: &dyn Device, timeout: Duration) -> bool {
        let mut changed = self.changed.lock();
        let satisfied = |changed: bool| changed || device.has_clients();
        if timeout.is_zero() {
            return satisfied(*changed);
        }

        let deadline = deadline_after(timeout);
        while !satisfied(*changed) {
            match deadline {
                Some(deadline) => {
                    if self.cond.wait_until(&mut changed, deadline).timed_out() {
                        return satisfied(*changed);
                    }
                }
                None => self.cond.wait(&mut changed),
            }
        }
        true
    }

    #[cfg(test)]
    fn wake_without_change(&self) {
        let _changed = self.changed.lock();
        self.cond.notify_all();
    }
}

/// Resolves the discovery slot from `Connected`/`Changed` events.
///
/// A `Changed` event is handled like a connection, since a registry may report
/// an already-tracked device coming online that way. Disconnects are ignored.
struct DeviceWaitListener {
    selector: DeviceSelector,
    slot: Arc<DeviceSlot>,
}

impl DeviceWaitListener {
    fn consider(&self, device: &DeviceRef) {
        if self.selector.matches(device.as_ref()) && self.slot.offer(device) {
            trace!(selector = %self.selector, serial = %device.serial(), "Listener matched device");
        }
    }
}

impl DeviceChangeListener for DeviceWaitListener {
    fn device_connected(&self, device: &DeviceRef) {
        self.consider(device);
    }

    fn device_changed(&self, device: &DeviceRef, _change: DeviceChange) {
        self.consider(device);
    }
}

/// Signals when the watched device's client list changes.
///
/// Devices are matched by serial, so a handle re-created by the registry for
/// the same device still counts.
struct ClientWaitListener {
    serial: String,
    signal: Arc<ClientSignal>,
}

impl DeviceChangeListener for ClientWaitListener {
    fn device_changed(&self, device: &DeviceRef, change: DeviceChange) {
        if device.serial() == self.serial && change.contains(DeviceChange::CLIENT_LIST) {
            self.signal.notify();
        }
    }
}
