//! # device-sync
//!
//! Sync-first helpers for automating devices that appear in a
//! [`DeviceRegistry`](device_registry::DeviceRegistry):
//!
//! - **Readiness waiting**: block until a device is known and has active
//!   clients, without losing events that arrive while the wait is set up
//! - **Bounded polling**: wait for transitions the registry never reports
//!   (such as boot completion) by re-running a query command on a fixed
//!   interval against a wall-clock budget
//! - **Shell helpers**: run commands through a pluggable
//!   [`ShellExecutor`](shell::ShellExecutor), discarding or collecting output
//! - **Reconfiguration**: clear preloaded classes and reboot, enable method
//!   tracing, inspect the build
//!
//! ```rust
//! use std::sync::Arc;
//! use std::thread;
//! use std::time::Duration;
//!
//! use device_registry::{Device, LocalRegistry};
//! use device_sync::{find_device, DeviceSelector};
//!
//! let registry = Arc::new(LocalRegistry::new());
//!
//! let producer = {
//!     let registry = Arc::clone(&registry);
//!     thread::spawn(move || {
//!         thread::sleep(Duration::from_millis(20));
//!         registry.connect("emulator-5554").unwrap();
//!         registry.set_has_clients("emulator-5554", true).unwrap();
//!     })
//! };
//!
//! let device = find_device(&*registry, &DeviceSelector::Any, Duration::from_secs(5))
//!     .expect("device should connect");
//! producer.join().unwrap();
//!
//! assert_eq!(device.serial(), "emulator-5554");
//! ```
//!
//! ## Timeouts
//!
//! Running out of time is an expected outcome, reported as `None` or `false`.
//! [`find_device`] spends up to `timeout` finding the device and up to
//! `timeout` again waiting for clients.
//!
//! ## Architecture
//!
//! ```text
//! DeviceTools (facade + SyncConfig)
//!     │
//!     ├── wait::find_device ──► ListenerGuard + Condvar ──► DeviceRegistry
//!     │
//!     ├── poll::PollLoop ─────► Clock + run_shell_collect_text
//!     │
//!     └── shell ──────────────► ShellExecutor (transport)
//! ```

pub mod clock;
pub mod config;
pub mod error;
pub mod logging;
pub mod poll;
mod preload;
pub mod selector;
pub mod shell;
pub mod testing;
mod tools;
pub mod wait;

pub use clock::{Clock, SystemClock};
pub use config::SyncConfig;
pub use error::{ConfigError, Result, ShellError, SyncError};
pub use poll::PollLoop;
pub use selector::DeviceSelector;
pub use shell::{
    run_shell, run_shell_collect_text, run_shell_with, CollectingReceiver, NullReceiver,
    ShellExecutor, ShellOutputReceiver,
};
pub use tools::{DeviceTools, DeviceToolsBuilder};
pub use wait::{await_clients, await_device, find_all_devices, find_device};

// Re-export registry types used in signatures
pub use device_registry::{Device, DeviceChange, DeviceEvent, DeviceRef, DeviceRegistry};
