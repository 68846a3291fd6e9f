//! Time source for the bounded poll loop.

use std::thread;
use std::time::{Duration, Instant};

/// Monotonic time and sleeping, injectable so poll budgets can be tested
/// without real delays.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;

    /// Block the calling thread for roughly `duration`.
    ///
    /// Returning early is allowed; callers measure elapsed time with `now()`
    /// rather than trusting the sleep length.
    fn sleep(&self, duration: Duration);
}

/// Wall clock backed by `std::time::Instant` and `std::thread::sleep`
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn sleep(&self, duration: Duration) {
        thread::sleep(duration);
    }
}
