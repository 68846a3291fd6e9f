//! Remote shell commands
//!
//! Command execution itself belongs to the transport, behind
//! [`ShellExecutor`]. This module supplies the output receivers and the
//! fire-and-forget helpers used by the reconfiguration routines: failures are
//! logged and treated as "no output", never returned.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use device_registry::Device;
use tracing::{trace, warn};

use crate::error::ShellError;

/// Push-style sink for command output.
///
/// Executors call `add_output` once per chunk as bytes arrive, then `flush`
/// when the command ends. Chunks may split lines and multi-byte characters.
pub trait ShellOutputReceiver {
    /// Checked by executors between chunks; `true` asks them to stop early
    fn is_cancelled(&self) -> bool {
        false
    }

    fn add_output(&mut self, data: &[u8]);

    fn flush(&mut self) {}
}

/// Discards all output
#[derive(Debug, Default, Clone, Copy)]
pub struct NullReceiver;

impl ShellOutputReceiver for NullReceiver {
    fn add_output(&mut self, _data: &[u8]) {}
}

/// Accumulates output and exposes it as text without trailing line endings.
///
/// ```
/// use device_sync::shell::{CollectingReceiver, ShellOutputReceiver};
///
/// let mut receiver = CollectingReceiver::new();
/// receiver.add_output(b"abc\r\n");
/// receiver.add_output(b"\n");
/// assert_eq!(receiver.text(), "abc");
/// ```
#[derive(Debug, Default, Clone)]
pub struct CollectingReceiver {
    buffer: Vec<u8>,
}

impl CollectingReceiver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw bytes received so far
    pub fn bytes(&self) -> &[u8] {
        &self.buffer
    }

    /// Output decoded as UTF-8 (lossily), with every trailing `\r` and `\n`
    /// removed. Devices commonly answer with `\r\n` line endings.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.buffer)
            .trim_end_matches(|c| c == '\r' || c == '\n')
            .to_string()
    }
}

impl ShellOutputReceiver for CollectingReceiver {
    fn add_output(&mut self, data: &[u8]) {
        self.buffer.extend_from_slice(data);
    }
}

impl fmt::Display for CollectingReceiver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text())
    }
}

/// Runs a command on a device, streaming output into a receiver.
///
/// Implemented by the transport; must be callable from several threads.
pub trait ShellExecutor: Send + Sync {
    fn execute(
        &self,
        device: &dyn Device,
        command: &str,
        receiver: &mut dyn ShellOutputReceiver,
        timeout: Duration,
    ) -> Result<(), ShellError>;
}

impl<E: ShellExecutor + ?Sized> ShellExecutor for Arc<E> {
    fn execute(
        &self,
        device: &dyn Device,
        command: &str,
        receiver: &mut dyn ShellOutputReceiver,
        timeout: Duration,
    ) -> Result<(), ShellError> {
        (**self).execute(device, command, receiver, timeout)
    }
}

/// Run `command`, sending output to `receiver`.
///
/// Returns whether the executor reported success. Failures are logged at
/// warn level; whatever output arrived before the failure stays in `receiver`.
pub fn run_shell_with<E>(
    executor: &E,
    device: &dyn Device,
    command: &str,
    receiver: &mut dyn ShellOutputReceiver,
    timeout: Duration,
) -> bool
where
    E: ShellExecutor + ?Sized,
{
    trace!(serial = %device.serial(), command, ?timeout, "Running shell command");
    match executor.execute(device, command, receiver, timeout) {
        Ok(()) => true,
        Err(e) => {
            warn!(serial = %device.serial(), command, error = %e, "Shell command failed");
            false
        }
    }
}

/// Run `command` and discard its output
pub fn run_shell<E>(executor: &E, device: &dyn Device, command: &str, timeout: Duration)
where
    E: ShellExecutor + ?Sized,
{
    run_shell_with(executor, device, command, &mut NullReceiver, timeout);
}

/// Run `command` and return its output with trailing line endings removed.
///
/// A failed command yields whatever was received before the failure, usually
/// an empty string.
pub fn run_shell_collect_text<E>(
    executor: &E,
    device: &dyn Device,
    command: &str,
    timeout: Duration,
) -> String
where
    E: ShellExecutor + ?Sized,
{
    let mut receiver = CollectingReceiver::new();
    run_shell_with(executor, device, command, &mut receiver, timeout);
    receiver.text()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedShell;
    use device_registry::SimpleDevice;
    use rstest::rstest;

    #[rstest]
    #[case(&[b"abc\r\n".as_slice(), b"\n".as_slice()], "abc")]
    #[case(&[b"1".as_slice()], "1")]
    #[case(&[b"a\r\nb\r\n".as_slice()], "a\r\nb")]
    #[case(&[b"\r\n\r\n".as_slice()], "")]
    #[case(&[], "")]
    fn test_collecting_receiver_trims_trailing_line_endings(
        #[case] chunks: &[&[u8]],
        #[case] expected: &str,
    ) {
        let mut receiver = CollectingReceiver::new();
        for chunk in chunks {
            receiver.add_output(chunk);
        }
        receiver.flush();
        assert_eq!(receiver.text(), expected);
        assert_eq!(receiver.to_string(), expected);
    }

    #[test]
    fn test_collecting_receiver_joins_split_utf8() {
        let bytes = "héllo".as_bytes();
        let mut receiver = CollectingReceiver::new();
        // Split inside the two-byte 'é'
        receiver.add_output(&bytes[..2]);
        receiver.add_output(&bytes[2..]);
        assert_eq!(receiver.text(), "héllo");
    }

    #[test]
    fn test_null_receiver_is_never_cancelled() {
        let mut receiver = NullReceiver;
        receiver.add_output(b"ignored");
        assert!(!receiver.is_cancelled());
    }

    #[test]
    fn test_run_shell_collect_text_returns_trimmed_output() {
        let shell = ScriptedShell::new();
        shell.reply("getprop ro.build.type", "userdebug\r\n");
        let device = SimpleDevice::new("a");

        let text =
            run_shell_collect_text(&shell, &device, "getprop ro.build.type", Duration::from_millis(500));
        assert_eq!(text, "userdebug");
    }

    #[test]
    fn test_failures_are_swallowed() {
        let shell = ScriptedShell::new();
        shell.fail("stop", ShellError::Transport("connection reset".to_string()));
        let device = SimpleDevice::new("a");

        run_shell(&shell, &device, "stop", Duration::from_millis(100));
        assert!(!run_shell_with(
            &shell,
            &device,
            "stop",
            &mut NullReceiver,
            Duration::from_millis(100)
        ));
        assert_eq!(
            run_shell_collect_text(&shell, &device, "stop", Duration::from_millis(100)),
            ""
        );
        assert_eq!(shell.commands().len(), 3);
    }
}
