//! Device registry interfaces
//!
//! This crate describes the registry side of device readiness waiting: what a
//! device looks like, which events a registry pushes, and how listeners are
//! registered. It does not discover devices itself; transports implement
//! [`DeviceRegistry`] and push [`DeviceEvent`]s to registered listeners.
//!
//! # Quick Start
//!
//! ```
//! use std::sync::Arc;
//! use device_registry::{DeviceEvent, DeviceRegistry, FnListener, ListenerGuard, LocalRegistry};
//!
//! let registry = LocalRegistry::new();
//!
//! let listener = Arc::new(FnListener::new(|event: &DeviceEvent| {
//!     println!("{} {}", event.kind(), event.device().serial());
//! }));
//!
//! {
//!     // Removed again when the guard goes out of scope
//!     let _guard = ListenerGuard::register(&registry, listener);
//!     registry.connect("emulator-5554").unwrap();
//! }
//!
//! assert_eq!(registry.listener_count(), 0);
//! assert_eq!(registry.devices().len(), 1);
//! ```
//!
//! # Architecture
//!
//! ```text
//! DeviceRegistry (trait)
//!     │
//!     ├── add_listener / remove_listener
//!     │       │
//!     │       └── DeviceChangeListener (trait) ◄── ListenerGuard (scoped)
//!     │
//!     └── devices() ──► Vec<DeviceRef>
//!
//! LocalRegistry: in-memory implementation, events delivered synchronously
//! ```

mod device;
mod error;
mod listener;
mod local;

pub use device::{Device, DeviceChange, DeviceRef, SimpleDevice};
pub use error::{RegistryError, Result};
pub use listener::{
    DeviceChangeListener, DeviceEvent, DeviceRegistry, EventKind, FnListener, ListenerGuard,
    ListenerRef,
};
pub use local::LocalRegistry;
