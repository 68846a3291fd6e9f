//! Device reconfiguration routines for class-preload data collection
//!
//! These drive multi-step command sequences on a device: clearing the
//! preloaded-classes list and boot image, restarting the framework, and
//! waiting for `dev.bootcomplete` with the bounded poll loop.

use std::time::Duration;

use device_registry::Device;
use tracing::{debug, info, warn};

use crate::tools::DeviceTools;

const PRELOADED_CLASSES: &str = "/etc/preloaded-classes";
const BOOT_COMPLETE_QUERY: &str = "getprop dev.bootcomplete";
const MISSING_FILE: &str = "No such file or directory";

/// Commands run between `stop` and `start` by [`DeviceTools::remove_preloaded`]
const CLEAR_PRELOAD_STEPS: &[(&str, Timing)] = &[
    ("mount -o remount,rw /system", Timing::Normal),
    ("rm /etc/preloaded-classes", Timing::Short),
    // An empty file must exist
    ("touch /etc/preloaded-classes", Timing::Short),
    ("rm /data/dalvik-cache/*/*boot.art", Timing::Normal),
    // `stop` leaves the old value in place
    ("setprop dev.bootcomplete \"0\"", Timing::Normal),
];

const TRACING_STEPS: &[&str] = &[
    "setenforce 0",
    "chmod 777 /data/dalvik-cache/profiles",
    "setprop dalvik.vm.method-trace true",
    "setprop dalvik.vm.method-trace-file /data/dalvik-cache/profiles/zygote.trace.bin",
    "setprop dalvik.vm.method-trace-file-siz 1024",
    "setprop dalvik.vm.method-trace-stream true",
];

#[derive(Clone, Copy)]
enum Timing {
    Short,
    Normal,
}

impl DeviceTools {
    fn timeout_for(&self, timing: Timing) -> Duration {
        match timing {
            Timing::Short => self.config().short_command_timeout,
            Timing::Normal => self.config().command_timeout,
        }
    }

    /// Launch `activity` from `package` with `am start`
    pub fn start_activity(&self, device: &dyn Device, package: &str, activity: &str) {
        let command = format!("am start -n {}/.{}", package, activity);
        self.run_shell(device, &command, self.config().activity_start_timeout);
    }

    /// The device's `ro.build.type` (`user`, `userdebug`, `eng`), or `None`
    /// if it could not be read
    pub fn build_type(&self, device: &dyn Device) -> Option<String> {
        let value = self.run_shell_collect_text(
            device,
            "getprop ro.build.type",
            self.config().property_read_timeout,
        );
        let value = value.trim();
        (!value.is_empty()).then(|| value.to_string())
    }

    /// Whether a compiled boot image exists under `/system/framework/*/`
    pub fn has_prebuilt_boot_image(&self, device: &dyn Device) -> bool {
        let listing = self.run_shell_collect_text(
            device,
            "ls /system/framework/*/boot.art",
            self.config().command_timeout,
        );
        !listing.contains(MISSING_FILE)
    }

    /// Empty `/etc/preloaded-classes`, delete compiled boot images and restart
    /// the framework, then wait up to `wait` for the boot to complete.
    ///
    /// Returns `true` right away if the file is already empty. Returns `false`
    /// if `dev.bootcomplete` did not become `1` in time; the device is left
    /// mid-boot in that case.
    pub fn remove_preloaded(&self, device: &dyn Device, wait: Duration) -> bool {
        let current = self.run_shell_collect_text(
            device,
            &format!("cat {}", PRELOADED_CLASSES),
            self.config().read_timeout,
        );
        if current.trim().is_empty() {
            info!(serial = %device.serial(), "Preloaded-classes already empty");
            return true;
        }

        self.run_shell(device, "stop", self.config().short_command_timeout);
        for (command, timing) in CLEAR_PRELOAD_STEPS {
            self.run_shell(device, command, self.timeout_for(*timing));
        }
        self.run_shell(device, "start", self.config().short_command_timeout);

        debug!(serial = %device.serial(), ?wait, "Waiting for boot to complete");
        let booted = self.poll_until(
            device,
            BOOT_COMPLETE_QUERY,
            self.config().boot_check_timeout,
            wait,
            |output| output.trim() == "1",
        );

        if booted {
            info!(serial = %device.serial(), "Device booted without preloaded classes");
        } else {
            warn!(serial = %device.serial(), ?wait, "Device did not finish booting in time");
        }
        booted
    }

    /// Turn on streaming method tracing in the runtime with a 1K buffer.
    ///
    /// Takes effect after the framework restarts.
    pub fn enable_tracing(&self, device: &dyn Device) {
        for command in TRACING_STEPS {
            self.run_shell(device, command, self.config().short_command_timeout);
        }
    }
}
