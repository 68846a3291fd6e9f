//! DeviceTools - entry point bundling a registry, an executor and timings
//!
//! Sync-first: every method blocks the calling thread, so call them from a
//! worker thread if the caller must stay responsive.

use std::sync::Arc;
use std::time::Duration;

use device_registry::{Device, DeviceRef, DeviceRegistry};

use crate::clock::{Clock, SystemClock};
use crate::config::SyncConfig;
use crate::error::{Result, SyncError};
use crate::poll::PollLoop;
use crate::selector::DeviceSelector;
use crate::shell::{self, ShellExecutor, ShellOutputReceiver};
use crate::wait;

/// Device automation handle
///
/// # Example
///
/// ```rust,ignore
/// use std::time::Duration;
/// use device_sync::DeviceTools;
///
/// let tools = DeviceTools::builder()
///     .registry(registry)
///     .executor(adb_shell)
///     .build()?;
///
/// let device = tools
///     .find_device("emulator-5554", Duration::from_secs(10))
///     .ok_or("device did not show up")?;
///
/// if !tools.remove_preloaded(device.as_ref(), Duration::from_secs(120)) {
///     eprintln!("Device did not finish booting in time");
/// }
/// ```
#[derive(Clone)]
pub struct DeviceTools {
    registry: Arc<dyn DeviceRegistry>,
    executor: Arc<dyn ShellExecutor>,
    config: SyncConfig,
    poller: PollLoop,
}

impl DeviceTools {
    pub fn builder() -> DeviceToolsBuilder {
        DeviceToolsBuilder::default()
    }

    /// Create with default configuration and the system clock
    pub fn new(registry: Arc<dyn DeviceRegistry>, executor: Arc<dyn ShellExecutor>) -> Result<Self> {
        Self::builder().registry(registry).executor(executor).build()
    }

    /// Find a device and wait for it to have clients.
    ///
    /// `selector` accepts a serial (`&str`/`String`), `Option<&str>` where
    /// `None` means any device, or a [`DeviceSelector`]. Each of the two
    /// waiting phases may use the full `timeout`. See [`wait::find_device`].
    pub fn find_device(
        &self,
        selector: impl Into<DeviceSelector>,
        timeout: Duration,
    ) -> Option<DeviceRef> {
        wait::find_device(&*self.registry, &selector.into(), timeout)
    }

    /// Wait for any device, then return all known devices
    pub fn find_all_devices(&self, timeout: Duration) -> Vec<DeviceRef> {
        wait::find_all_devices(&*self.registry, timeout)
    }

    /// Run a command, discarding output and logging failures
    pub fn run_shell(&self, device: &dyn Device, command: &str, timeout: Duration) {
        shell::run_shell(&*self.executor, device, command, timeout)
    }

    /// Run a command and return its output without trailing line endings
    pub fn run_shell_collect_text(
        &self,
        device: &dyn Device,
        command: &str,
        timeout: Duration,
    ) -> String {
        shell::run_shell_collect_text(&*self.executor, device, command, timeout)
    }

    /// Run a command, directing output to `receiver`
    pub fn run_shell_with(
        &self,
        device: &dyn Device,
        command: &str,
        receiver: &mut dyn ShellOutputReceiver,
        timeout: Duration,
    ) -> bool {
        shell::run_shell_with(&*self.executor, device, command, receiver, timeout)
    }

    /// Poll `command` at the configured interval until `accept` passes or
    /// `overall_timeout` elapses. See [`PollLoop::poll_until`].
    pub fn poll_until<F>(
        &self,
        device: &dyn Device,
        command: &str,
        per_attempt_timeout: Duration,
        overall_timeout: Duration,
        accept: F,
    ) -> bool
    where
        F: FnMut(&str) -> bool,
    {
        self.poller.poll_until(
            &*self.executor,
            device,
            command,
            per_attempt_timeout,
            overall_timeout,
            accept,
        )
    }

    pub fn registry(&self) -> &Arc<dyn DeviceRegistry> {
        &self.registry
    }

    pub fn executor(&self) -> &Arc<dyn ShellExecutor> {
        &self.executor
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }
}

impl std::fmt::Debug for DeviceTools {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceTools")
            .field("config", &self.config)
            .field("poller", &self.poller)
            .finish_non_exhaustive()
    }
}

/// Builder for [`DeviceTools`]
#[derive(Default)]
pub struct DeviceToolsBuilder {
    registry: Option<Arc<dyn DeviceRegistry>>,
    executor: Option<Arc<dyn ShellExecutor>>,
    config: SyncConfig,
    clock: Option<Arc<dyn Clock>>,
}

impl DeviceToolsBuilder {
    /// Registry to watch for devices (required)
    pub fn registry(mut self, registry: Arc<dyn DeviceRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Executor for shell commands (required)
    pub fn executor(mut self, executor: Arc<dyn ShellExecutor>) -> Self {
        self.executor = Some(executor);
        self
    }

    pub fn config(mut self, config: SyncConfig) -> Self {
        self.config = config;
        self
    }

    /// Clock used by the poll loop; defaults to [`SystemClock`]
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn build(self) -> Result<DeviceTools> {
        self.config.validate()?;

        let registry = self.registry.ok_or(SyncError::MissingComponent("registry"))?;
        let executor = self.executor.ok_or(SyncError::MissingComponent("executor"))?;
        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock));
        let poller = PollLoop::with_clock(self.config.poll_interval, clock);

        Ok(DeviceTools {
            registry,
            executor,
            config: self.config,
            poller,
        })
    }
}
