//! Events, listeners and the registry trait.

use std::fmt;
use std::sync::Arc;

use crate::device::{DeviceChange, DeviceRef};

/// Event pushed by a registry to every registered listener.
#[derive(Debug, Clone)]
pub enum DeviceEvent {
    /// A device became known to the registry
    Connected(DeviceRef),
    /// Something about a known device changed
    Changed(DeviceRef, DeviceChange),
    /// A device is gone; its handle should no longer be used
    Disconnected(DeviceRef),
}

impl DeviceEvent {
    /// The device this event is about
    pub fn device(&self) -> &DeviceRef {
        match self {
            DeviceEvent::Connected(device)
            | DeviceEvent::Changed(device, _)
            | DeviceEvent::Disconnected(device) => device,
        }
    }

    pub fn kind(&self) -> EventKind {
        match self {
            DeviceEvent::Connected(_) => EventKind::Connected,
            DeviceEvent::Changed(_, _) => EventKind::Changed,
            DeviceEvent::Disconnected(_) => EventKind::Disconnected,
        }
    }
}

/// Discriminant of a [`DeviceEvent`], handy for logging and filtering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Connected,
    Changed,
    Disconnected,
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventKind::Connected => write!(f, "connected"),
            EventKind::Changed => write!(f, "changed"),
            EventKind::Disconnected => write!(f, "disconnected"),
        }
    }
}

/// Callback target registered with a [`DeviceRegistry`].
///
/// Registries call listeners synchronously on an internal thread, so
/// implementations must be cheap and must not block for long. Every method
/// defaults to doing nothing; implement only the events you care about.
pub trait DeviceChangeListener: Send + Sync {
    fn device_connected(&self, _device: &DeviceRef) {}

    fn device_changed(&self, _device: &DeviceRef, _change: DeviceChange) {}

    fn device_disconnected(&self, _device: &DeviceRef) {}

    /// Dispatch an event to the matching callback
    fn on_event(&self, event: &DeviceEvent) {
        match event {
            DeviceEvent::Connected(device) => self.device_connected(device),
            DeviceEvent::Changed(device, change) => self.device_changed(device, *change),
            DeviceEvent::Disconnected(device) => self.device_disconnected(device),
        }
    }
}

/// Shared listener handle; registries compare these by pointer identity
pub type ListenerRef = Arc<dyn DeviceChangeListener>;

/// Process-wide source of device events.
///
/// Implementations must tolerate concurrent `add_listener`/`remove_listener`
/// calls from any thread, including from inside a listener callback. An event
/// raised after `add_listener` has returned must reach that listener.
pub trait DeviceRegistry: Send + Sync {
    /// Subscribe a listener to all future events
    fn add_listener(&self, listener: ListenerRef);

    /// Unsubscribe a listener, returning whether it was registered
    fn remove_listener(&self, listener: &ListenerRef) -> bool;

    /// Snapshot of the devices currently known to the registry
    fn devices(&self) -> Vec<DeviceRef>;
}

impl<R: DeviceRegistry + ?Sized> DeviceRegistry for Arc<R> {
    fn add_listener(&self, listener: ListenerRef) {
        (**self).add_listener(listener)
    }

    fn remove_listener(&self, listener: &ListenerRef) -> bool {
        (**self).remove_listener(listener)
    }

    fn devices(&self) -> Vec<DeviceRef> {
        (**self).devices()
    }
}

/// Scoped listener registration.
///
/// The listener is added on construction and removed when the guard is
/// dropped, whether the scope ends by return, early exit, or unwinding.
///
/// ```rust,ignore
/// let guard = ListenerGuard::register(&registry, listener);
/// let devices = registry.devices(); // taken after registration
/// // ... wait ...
/// drop(guard); // listener removed
/// ```
pub struct ListenerGuard<'a, R: DeviceRegistry + ?Sized> {
    registry: &'a R,
    listener: ListenerRef,
}

impl<'a, R: DeviceRegistry + ?Sized> ListenerGuard<'a, R> {
    /// Register `listener` with `registry` for the lifetime of the guard
    pub fn register(registry: &'a R, listener: ListenerRef) -> Self {
        registry.add_listener(Arc::clone(&listener));
        Self { registry, listener }
    }
}

impl<R: DeviceRegistry + ?Sized> Drop for ListenerGuard<'_, R> {
    fn drop(&mut self) {
        if !self.registry.remove_listener(&self.listener) {
            tracing::warn!("Listener was already removed from the registry");
        }
    }
}

/// Listener backed by a closure receiving every event
pub struct FnListener<F> {
    callback: F,
}

impl<F> FnListener<F>
where
    F: Fn(&DeviceEvent) + Send + Sync,
{
    pub fn new(callback: F) -> Self {
        Self { callback }
    }
}

impl<F> DeviceChangeListener for FnListener<F>
where
    F: Fn(&DeviceEvent) + Send + Sync,
{
    fn device_connected(&self, device: &DeviceRef) {
        (self.callback)(&DeviceEvent::Connected(Arc::clone(device)));
    }

    fn device_changed(&self, device: &DeviceRef, change: DeviceChange) {
        (self.callback)(&DeviceEvent::Changed(Arc::clone(device), change));
    }

    fn device_disconnected(&self, device: &DeviceRef) {
        (self.callback)(&DeviceEvent::Disconnected(Arc::clone(device)));
    }

    fn on_event(&self, event: &DeviceEvent) {
        (self.callback)(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SimpleDevice;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct Recorder {
        seen: Mutex<Vec<String>>,
    }

    impl DeviceChangeListener for Recorder {
        fn device_connected(&self, device: &DeviceRef) {
            self.seen.lock().push(format!("+{}", device.serial()));
        }

        fn device_changed(&self, device: &DeviceRef, change: DeviceChange) {
            self.seen
                .lock()
                .push(format!("~{}:{}", device.serial(), change.bits()));
        }
    }

    fn device(serial: &str) -> DeviceRef {
        Arc::new(SimpleDevice::new(serial))
    }

    #[test]
    fn test_on_event_dispatches_by_kind() {
        let recorder = Recorder::default();
        recorder.on_event(&DeviceEvent::Connected(device("a")));
        recorder.on_event(&DeviceEvent::Changed(device("a"), DeviceChange::CLIENT_LIST));
        // Disconnected falls through to the default no-op
        recorder.on_event(&DeviceEvent::Disconnected(device("a")));

        let seen = recorder.seen.lock().clone();
        assert_eq!(seen, vec!["+a".to_string(), "~a:2".to_string()]);
    }

    #[test]
    fn test_event_accessors() {
        let event = DeviceEvent::Changed(device("b"), DeviceChange::STATE);
        assert_eq!(event.device().serial(), "b");
        assert_eq!(event.kind(), EventKind::Changed);
        assert_eq!(event.kind().to_string(), "changed");
    }

    #[test]
    fn test_fn_listener_receives_direct_callbacks() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let listener = FnListener::new(move |event: &DeviceEvent| {
            sink.lock().push(event.kind());
        });

        listener.device_connected(&device("c"));
        listener.device_disconnected(&device("c"));

        assert_eq!(
            *seen.lock(),
            vec![EventKind::Connected, EventKind::Disconnected]
        );
    }
}
