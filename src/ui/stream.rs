//! Live rendering of streaming commands.
//!
//! The renderer drives a [`StreamingProcess`]: it prints output chunks as
//! they arrive, forwards lines typed at the terminal to the child's
//! stdin, and stops on child exit or Ctrl-C. Closing the handle's
//! streams is left to the caller.

use std::io::{self, IsTerminal, Write};
use std::time::Duration;

use super::theme::ShellTheme;
use crate::shell::signals::InterruptGuard;
use crate::shell::streaming::{StreamEvent, StreamingProcess};

/// How often the loop checks for input, exit and interrupts.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Drain window for output still buffered after the child exits.
const DRAIN_INTERVAL: Duration = Duration::from_millis(20);

/// Longest command shown in the banner.
const TITLE_LIMIT: usize = 60;

/// Result of driving a streaming command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StreamOutcome {
    /// Everything the child printed, lossily decoded.
    pub output: String,
    /// Exit code, when the child was seen to exit.
    pub exit_code: Option<i32>,
    /// The user cancelled before the child finished.
    pub cancelled: bool,
}

/// Drives a streaming child until it exits or the user cancels.
pub trait StreamRenderer {
    fn stream_shell_command(
        &mut self,
        command: &str,
        process: &mut StreamingProcess,
    ) -> StreamOutcome;
}

/// Renders streaming output straight to the terminal.
pub struct TerminalStreamRenderer {
    theme: ShellTheme,
}

impl TerminalStreamRenderer {
    pub fn new(theme: ShellTheme) -> Self {
        Self { theme }
    }
}

/// Shorten a command for banners.
pub fn title_for(command: &str) -> String {
    if command.chars().count() <= TITLE_LIMIT {
        return command.to_string();
    }
    let kept: String = command.chars().take(TITLE_LIMIT - 3).collect();
    format!("{kept}...")
}

impl StreamRenderer for TerminalStreamRenderer {
    fn stream_shell_command(
        &mut self,
        command: &str,
        process: &mut StreamingProcess,
    ) -> StreamOutcome {
        let title = title_for(command);
        let mut stdout = io::stdout();
        writeln!(
            stdout,
            "{}",
            self.theme.format_status(&format!("Executing: '{}'", title))
        )
        .ok();

        let guard = InterruptGuard::install();
        let mut input = TerminalInput::new();
        let mut captured = Vec::new();
        let mut outcome = StreamOutcome::default();

        loop {
            if guard.interrupted() {
                outcome.cancelled = true;
                if let Err(e) = process.interrupt() {
                    tracing::debug!("Failed to interrupt {}: {}", command, e);
                }
                break;
            }

            if let Some(bytes) = input.poll() {
                if bytes.contains(&0x03) {
                    outcome.cancelled = true;
                    if let Err(e) = process.interrupt() {
                        tracing::debug!("Failed to interrupt {}: {}", command, e);
                    }
                    break;
                }
                if let Err(e) = process.write_input(&bytes) {
                    tracing::debug!("Input not forwarded to {}: {}", command, e);
                }
            }

            match process.read(POLL_INTERVAL) {
                StreamEvent::Output(chunk) => {
                    stdout.write_all(&chunk).ok();
                    stdout.flush().ok();
                    captured.extend_from_slice(&chunk);
                }
                StreamEvent::Pending => {
                    if let Ok(Some(code)) = process.try_wait() {
                        drain(process, &mut stdout, &mut captured);
                        outcome.exit_code = Some(code);
                        break;
                    }
                }
                StreamEvent::Closed => {
                    outcome.exit_code = process.wait().ok();
                    break;
                }
            }
        }

        if outcome.cancelled {
            // Give the child a moment to act on SIGINT.
            std::thread::sleep(DRAIN_INTERVAL);
            outcome.exit_code = process.try_wait().ok().flatten();
        }
        drop(guard);

        outcome.output = String::from_utf8_lossy(&captured).into_owned();
        if !outcome.output.is_empty() && !outcome.output.ends_with('\n') {
            writeln!(stdout).ok();
        }

        let footer = match (outcome.cancelled, outcome.exit_code) {
            (true, _) => self.theme.format_warning(&format!("{} cancelled", title)),
            (false, Some(0)) => self.theme.format_success(&format!("{} completed", title)),
            (false, Some(code)) => self
                .theme
                .format_error(&format!("{} exited with code: {}", title, code)),
            (false, None) => self
                .theme
                .format_warning(&format!("{} finished with unknown status", title)),
        };
        writeln!(stdout, "{}", footer).ok();
        outcome
    }
}

fn drain(process: &mut StreamingProcess, stdout: &mut io::Stdout, captured: &mut Vec<u8>) {
    while let StreamEvent::Output(chunk) = process.read(DRAIN_INTERVAL) {
        stdout.write_all(&chunk).ok();
        captured.extend_from_slice(&chunk);
    }
    stdout.flush().ok();
}

/// Non-blocking reads of whatever the user typed.
///
/// Only active when stdin is a terminal, so piped input meant for the
/// shell itself is never consumed.
struct TerminalInput {
    open: bool,
}

impl TerminalInput {
    fn new() -> Self {
        Self {
            open: cfg!(unix) && io::stdin().is_terminal(),
        }
    }

    #[cfg(unix)]
    fn poll(&mut self) -> Option<Vec<u8>> {
        if !self.open {
            return None;
        }
        let mut fds = libc::pollfd {
            fd: libc::STDIN_FILENO,
            events: libc::POLLIN,
            revents: 0,
        };
        // SAFETY: `fds` is a valid pollfd for the duration of the call.
        let ready = unsafe { libc::poll(&mut fds, 1, 0) };
        if ready <= 0 || fds.revents & libc::POLLIN == 0 {
            return None;
        }

        let mut buf = [0u8; 4096];
        // SAFETY: `buf` is writable for `buf.len()` bytes.
        let n = unsafe { libc::read(libc::STDIN_FILENO, buf.as_mut_ptr().cast(), buf.len()) };
        if n <= 0 {
            self.open = false;
            return None;
        }
        Some(buf[..n as usize].to_vec())
    }

    #[cfg(not(unix))]
    fn poll(&mut self) -> Option<Vec<u8>> {
        None
    }
}
