//! Bounded poll loop
//!
//! Some device transitions (boot completion, a property flipping) never show
//! up as registry events. They are observed by running a query command at a
//! fixed interval until its output is accepted or a wall-clock budget runs
//! out.

use std::sync::Arc;
use std::time::Duration;

use device_registry::Device;
use tracing::{debug, trace};

use crate::clock::{Clock, SystemClock};
use crate::shell::{run_shell_collect_text, ShellExecutor};

/// Default pause between poll attempts
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Fixed-interval, time-bounded query loop.
///
/// Each attempt sleeps for `interval`, runs the query command, and hands the
/// trimmed output to the acceptance check. There is no attempt limit; the
/// loop stops once the time since entry reaches `overall_timeout`. A slow
/// command can overshoot that budget by up to one `per_attempt_timeout`.
#[derive(Clone)]
pub struct PollLoop {
    interval: Duration,
    clock: Arc<dyn Clock>,
}

impl PollLoop {
    pub fn new(interval: Duration) -> Self {
        Self::with_clock(interval, Arc::new(SystemClock))
    }

    pub fn with_clock(interval: Duration, clock: Arc<dyn Clock>) -> Self {
        Self { interval, clock }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Poll `command` on `device` until `accept` returns `true`.
    ///
    /// Returns `true` as soon as an attempt is accepted, without further
    /// attempts, and `false` once `overall_timeout` has elapsed. Command
    /// failures count as empty output.
    pub fn poll_until<E, F>(
        &self,
        executor: &E,
        device: &dyn Device,
        command: &str,
        per_attempt_timeout: Duration,
        overall_timeout: Duration,
        mut accept: F,
    ) -> bool
    where
        E: ShellExecutor + ?Sized,
        F: FnMut(&str) -> bool,
    {
        let started = self.clock.now();
        let mut attempts = 0u32;

        loop {
            self.clock.sleep(self.interval);

            attempts += 1;
            let output = run_shell_collect_text(executor, device, command, per_attempt_timeout);
            if accept(&output) {
                debug!(serial = %device.serial(), command, attempts, "Poll condition met");
                return true;
            }
            trace!(serial = %device.serial(), command, attempts, output = %output, "Poll condition not met");

            // Measured, not counted: sleeps may end early and commands take time
            let elapsed = self.clock.now().saturating_duration_since(started);
            if elapsed >= overall_timeout {
                debug!(
                    serial = %device.serial(),
                    command,
                    attempts,
                    ?elapsed,
                    "Poll budget exhausted"
                );
                return false;
            }
        }
    }
}

impl Default for PollLoop {
    fn default() -> Self {
        Self::new(DEFAULT_POLL_INTERVAL)
    }
}

impl std::fmt::Debug for PollLoop {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PollLoop")
            .field("interval", &self.interval)
            .finish()
    }
}
