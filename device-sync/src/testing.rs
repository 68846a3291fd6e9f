//! Test doubles for code built on device-sync.
//!
//! - [`ManualClock`]: a [`Clock`] whose sleeps advance virtual time instantly
//! - [`ScriptedShell`]: a [`ShellExecutor`] returning canned replies and
//!   recording every command it receives
//!
//! Pair them with [`LocalRegistry`](device_registry::LocalRegistry) to drive
//! complete reconfiguration flows without a device.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::{Duration, Instant};

use device_registry::Device;
use parking_lot::Mutex;

use crate::clock::Clock;
use crate::error::ShellError;
use crate::shell::{ShellExecutor, ShellOutputReceiver};

/// Virtual clock: `sleep` returns immediately after moving time forward.
#[derive(Debug)]
pub struct ManualClock {
    origin: Instant,
    elapsed: Mutex<Duration>,
    sleeps: Mutex<Vec<Duration>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            elapsed: Mutex::new(Duration::ZERO),
            sleeps: Mutex::new(Vec::new()),
        }
    }

    /// Move time forward without recording a sleep
    pub fn advance(&self, by: Duration) {
        *self.elapsed.lock() += by;
    }

    /// Virtual time since the clock was created
    pub fn elapsed(&self) -> Duration {
        *self.elapsed.lock()
    }

    /// Every duration passed to `sleep`, in order
    pub fn sleeps(&self) -> Vec<Duration> {
        self.sleeps.lock().clone()
    }

    /// Sum of all sleeps
    pub fn slept(&self) -> Duration {
        self.sleeps.lock().iter().sum()
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.origin + *self.elapsed.lock()
    }

    fn sleep(&self, duration: Duration) {
        self.sleeps.lock().push(duration);
        self.advance(duration);
    }
}

type Reply = Result<String, ShellError>;

#[derive(Default)]
struct Script {
    queued: HashMap<String, VecDeque<Reply>>,
    standing: HashMap<String, Reply>,
    log: Vec<(String, String, Duration)>,
}

/// Executor with canned replies per exact command string.
///
/// Lookup order for a command: the next queued reply, then the standing
/// reply, then empty success. Output is delivered one line per chunk.
///
/// ```
/// use std::time::Duration;
/// use device_registry::SimpleDevice;
/// use device_sync::shell::run_shell_collect_text;
/// use device_sync::testing::ScriptedShell;
///
/// let shell = ScriptedShell::new();
/// shell.queue("getprop dev.bootcomplete", Ok("0\r\n"));
/// shell.reply("getprop dev.bootcomplete", "1\r\n");
///
/// let device = SimpleDevice::new("emulator-5554");
/// let timeout = Duration::from_millis(500);
/// assert_eq!(run_shell_collect_text(&shell, &device, "getprop dev.bootcomplete", timeout), "0");
/// assert_eq!(run_shell_collect_text(&shell, &device, "getprop dev.bootcomplete", timeout), "1");
/// assert_eq!(shell.count("getprop dev.bootcomplete"), 2);
/// ```
#[derive(Default)]
pub struct ScriptedShell {
    script: Mutex<Script>,
    latency: Option<(Arc<ManualClock>, Duration)>,
}

impl ScriptedShell {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance `clock` by `latency` for every executed command
    pub fn with_latency(clock: Arc<ManualClock>, latency: Duration) -> Self {
        Self {
            script: Mutex::new(Script::default()),
            latency: Some((clock, latency)),
        }
    }

    /// Reply with `output` every time `command` runs (after queued replies)
    pub fn reply(&self, command: &str, output: &str) {
        self.script
            .lock()
            .standing
            .insert(command.to_string(), Ok(output.to_string()));
    }

    /// Fail with `error` every time `command` runs (after queued replies)
    pub fn fail(&self, command: &str, error: ShellError) {
        self.script
            .lock()
            .standing
            .insert(command.to_string(), Err(error));
    }

    /// Queue a one-shot reply for `command`
    pub fn queue(&self, command: &str, reply: Result<&str, ShellError>) {
        self.script
            .lock()
            .queued
            .entry(command.to_string())
            .or_default()
            .push_back(reply.map(str::to_string));
    }

    /// Commands executed so far, in order
    pub fn commands(&self) -> Vec<String> {
        self.script
            .lock()
            .log
            .iter()
            .map(|(_, command, _)| command.clone())
            .collect()
    }

    /// Commands executed against one device serial
    pub fn commands_for(&self, serial: &str) -> Vec<String> {
        self.script
            .lock()
            .log
            .iter()
            .filter(|(s, _, _)| s == serial)
            .map(|(_, command, _)| command.clone())
            .collect()
    }

    /// Timeout passed with each executed command, in order
    pub fn timeouts(&self) -> Vec<Duration> {
        self.script.lock().log.iter().map(|(_, _, t)| *t).collect()
    }

    /// How many times `command` was executed
    pub fn count(&self, command: &str) -> usize {
        self.script
            .lock()
            .log
            .iter()
            .filter(|(_, c, _)| c == command)
            .count()
    }

    fn next_reply(&self, serial: &str, command: &str, timeout: Duration) -> Reply {
        let mut script = self.script.lock();
        script
            .log
            .push((serial.to_string(), command.to_string(), timeout));

        if let Some(reply) = script.queued.get_mut(command).and_then(VecDeque::pop_front) {
            return reply;
        }
        script
            .standing
            .get(command)
            .cloned()
            .unwrap_or_else(|| Ok(String::new()))
    }
}

impl ShellExecutor for ScriptedShell {
    fn execute(
        &self,
        device: &dyn Device,
        command: &str,
        receiver: &mut dyn ShellOutputReceiver,
        timeout: Duration,
    ) -> Result<(), ShellError> {
        let reply = self.next_reply(device.serial(), command, timeout);
        if let Some((clock, latency)) = &self.latency {
            clock.advance(*latency);
        }

        let output = reply?;
        for line in output.split_inclusive('\n') {
            if receiver.is_cancelled() {
                return Err(ShellError::Cancelled);
            }
            receiver.add_output(line.as_bytes());
        }
        receiver.flush();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shell::CollectingReceiver;
    use device_registry::SimpleDevice;

    struct CancelImmediately;

    impl ShellOutputReceiver for CancelImmediately {
        fn is_cancelled(&self) -> bool {
            true
        }

        fn add_output(&mut self, _data: &[u8]) {
            panic!("cancelled receiver should not get output");
        }
    }

    #[test]
    fn test_manual_clock_sleep_is_virtual() {
        let clock = ManualClock::new();
        let start = clock.now();
        clock.sleep(Duration::from_secs(60));
        clock.advance(Duration::from_secs(1));

        assert_eq!(clock.now().duration_since(start), Duration::from_secs(61));
        assert_eq!(clock.sleeps(), vec![Duration::from_secs(60)]);
        assert_eq!(clock.slept(), Duration::from_secs(60));
    }

    #[test]
    fn test_queued_replies_take_precedence() {
        let shell = ScriptedShell::new();
        shell.reply("cmd", "standing");
        shell.queue("cmd", Ok("first"));
        shell.queue("cmd", Err(ShellError::Timeout(Duration::from_millis(5))));
        let device = SimpleDevice::new("a");

        let mut receiver = CollectingReceiver::new();
        shell
            .execute(&device, "cmd", &mut receiver, Duration::ZERO)
            .unwrap();
        assert_eq!(receiver.text(), "first");

        let mut receiver = CollectingReceiver::new();
        assert!(shell
            .execute(&device, "cmd", &mut receiver, Duration::ZERO)
            .is_err());

        let mut receiver = CollectingReceiver::new();
        shell
            .execute(&device, "cmd", &mut receiver, Duration::ZERO)
            .unwrap();
        assert_eq!(receiver.text(), "standing");
    }

    #[test]
    fn test_unknown_command_is_empty_success() {
        let shell = ScriptedShell::new();
        let device = SimpleDevice::new("a");
        let mut receiver = CollectingReceiver::new();
        shell
            .execute(&device, "true", &mut receiver, Duration::ZERO)
            .unwrap();
        assert!(receiver.bytes().is_empty());
    }

    #[test]
    fn test_cancelled_receiver_stops_delivery() {
        let shell = ScriptedShell::new();
        shell.reply("cat big", "line\n");
        let device = SimpleDevice::new("a");

        let result = shell.execute(&device, "cat big", &mut CancelImmediately, Duration::ZERO);
        assert_eq!(result, Err(ShellError::Cancelled));
    }

    #[test]
    fn test_latency_advances_clock_and_log_keeps_serials() {
        let clock = Arc::new(ManualClock::new());
        let shell = ScriptedShell::with_latency(Arc::clone(&clock), Duration::from_millis(250));

        let mut receiver = CollectingReceiver::new();
        shell
            .execute(&SimpleDevice::new("a"), "one", &mut receiver, Duration::from_secs(1))
            .unwrap();
        shell
            .execute(&SimpleDevice::new("b"), "two", &mut receiver, Duration::from_secs(2))
            .unwrap();

        assert_eq!(clock.elapsed(), Duration::from_millis(500));
        assert_eq!(shell.commands_for("b"), vec!["two".to_string()]);
        assert_eq!(
            shell.timeouts(),
            vec![Duration::from_secs(1), Duration::from_secs(2)]
        );
    }
}
