//! Which event resolves a discovery wait when several arrive at once

use std::sync::Arc;
use std::time::Duration;

use device_registry::{
    DeviceChange, DeviceEvent, DeviceRef, DeviceRegistry, ListenerRef, SimpleDevice,
};
use device_sync::{await_device, DeviceSelector};
use parking_lot::Mutex;
use proptest::prelude::*;

const SERIALS: [&str; 3] = ["A", "B", "C"];

/// Registry that fires a scripted burst of events while the waiter takes its
/// snapshot, then reports no known devices.
struct BurstRegistry {
    listeners: Mutex<Vec<ListenerRef>>,
    burst: Vec<DeviceEvent>,
}

impl DeviceRegistry for BurstRegistry {
    fn add_listener(&self, listener: ListenerRef) {
        self.listeners.lock().push(listener);
    }

    fn remove_listener(&self, listener: &ListenerRef) -> bool {
        let mut listeners = self.listeners.lock();
        let before = listeners.len();
        listeners.retain(|l| !Arc::ptr_eq(l, listener));
        listeners.len() != before
    }

    fn devices(&self) -> Vec<DeviceRef> {
        let listeners = self.listeners.lock().clone();
        for event in &self.burst {
            for listener in &listeners {
                listener.on_event(event);
            }
        }
        Vec::new()
    }
}

fn event_strategy() -> impl Strategy<Value = (u8, usize)> {
    (0u8..3, 0..SERIALS.len())
}

fn build_event(kind: u8, device: &DeviceRef) -> DeviceEvent {
    match kind {
        0 => DeviceEvent::Connected(Arc::clone(device)),
        1 => DeviceEvent::Changed(Arc::clone(device), DeviceChange::STATE),
        _ => DeviceEvent::Disconnected(Arc::clone(device)),
    }
}

proptest! {
    #[test]
    fn prop_first_matching_event_wins(
        script in prop::collection::vec(event_strategy(), 0..12),
        target in prop::option::of(0..SERIALS.len()),
    ) {
        let devices: Vec<DeviceRef> = SERIALS
            .iter()
            .map(|s| Arc::new(SimpleDevice::new(*s)) as DeviceRef)
            .collect();
        let burst: Vec<DeviceEvent> = script
            .iter()
            .map(|(kind, idx)| build_event(*kind, &devices[*idx]))
            .collect();

        let selector = match target {
            Some(idx) => DeviceSelector::serial(SERIALS[idx]),
            None => DeviceSelector::Any,
        };
        let expected = script
            .iter()
            .find(|(kind, idx)| *kind != 2 && target.map_or(true, |t| t == *idx))
            .map(|(_, idx)| SERIALS[*idx]);

        let registry = BurstRegistry {
            listeners: Mutex::new(Vec::new()),
            burst,
        };
        let found = await_device(&registry, &selector, Duration::ZERO);

        prop_assert_eq!(found.as_ref().map(|d| d.serial()), expected);
        prop_assert!(registry.listeners.lock().is_empty());
    }
}
