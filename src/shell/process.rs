//! Child process execution.
//!
//! Three modes share one spawn path:
//! - captured: stdout and stderr buffered and returned after exit
//! - streaming: merged output delivered incrementally through a
//!   [`StreamingProcess`] handle
//! - passthrough: the child inherits the terminal
//!
//! Every child gets the session working directory and a copy of the
//! process environment taken at spawn time.

use std::ffi::OsString;
use std::io::Read;
use std::path::Path;
use std::process::{Command, ExitStatus, Stdio};
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

use crate::error::{Result, ShellError};
use crate::shell::platform::{self, ShellInfo};
use crate::shell::streaming::StreamingProcess;

/// Exit code reserved for "the process could not be started".
pub const SPAWN_FAILURE: i32 = -1;

/// Normalized result of a finished child.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessResult {
    /// Exit code, [`SPAWN_FAILURE`] when the child never started.
    pub exit_code: i32,

    /// Standard output.
    pub stdout: String,

    /// Standard error, or the spawn error text.
    pub stderr: String,

    /// Wall-clock duration.
    pub duration: Duration,
}

impl ProcessResult {
    /// Result for a child that could not be started.
    pub fn spawn_failure(message: impl Into<String>, duration: Duration) -> Self {
        Self {
            exit_code: SPAWN_FAILURE,
            stdout: String::new(),
            stderr: message.into(),
            duration,
        }
    }

    /// Whether the child exited with code 0.
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// Whether the child never started.
    pub fn is_spawn_failure(&self) -> bool {
        self.exit_code == SPAWN_FAILURE
    }

    /// Stdout followed by stderr.
    pub fn combined_output(&self) -> String {
        format!("{}{}", self.stdout, self.stderr)
    }
}

/// How a command line reaches the operating system.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Invocation {
    /// Argument vector executed directly.
    Direct(Vec<String>),

    /// Text handed to the interpreter as `<shell> -c <text>`.
    Interpreter(String),
}

impl Invocation {
    /// Pick direct execution when the text splits cleanly into words,
    /// interpreter execution otherwise.
    pub fn for_command(command: &str, needs_interpreter: bool) -> Self {
        if !needs_interpreter {
            if let Some(argv) = shlex::split(command).filter(|argv| !argv.is_empty()) {
                return Invocation::Direct(argv);
            }
        }
        Invocation::Interpreter(command.to_string())
    }
}

/// Spawns children for the session.
#[derive(Debug, Clone)]
pub struct ProcessRunner {
    shell: ShellInfo,
}

impl ProcessRunner {
    /// Create a runner using `shell` for interpreter invocations.
    pub fn new(shell: ShellInfo) -> Self {
        Self { shell }
    }

    /// The interpreter used for `-c` invocations.
    pub fn shell(&self) -> &ShellInfo {
        &self.shell
    }

    /// Full argument vector for an invocation.
    pub fn argv(&self, invocation: &Invocation) -> Vec<String> {
        match invocation {
            Invocation::Direct(argv) => argv.clone(),
            Invocation::Interpreter(text) => self.shell.invocation(text),
        }
    }

    fn command(&self, invocation: &Invocation, cwd: &Path) -> Option<Command> {
        let argv = self.argv(invocation);
        let (program, args) = argv.split_first()?;

        let env: Vec<(OsString, OsString)> = std::env::vars_os().collect();
        let mut cmd = Command::new(program);
        cmd.args(args).current_dir(cwd).env_clear().envs(env);
        Some(cmd)
    }

    /// Run to completion with both output streams buffered.
    ///
    /// Spawn errors are folded into the result with exit code
    /// [`SPAWN_FAILURE`].
    pub fn run_captured(&self, invocation: &Invocation, cwd: &Path) -> ProcessResult {
        let start = Instant::now();
        let Some(mut cmd) = self.command(invocation, cwd) else {
            return ProcessResult::spawn_failure("empty command", start.elapsed());
        };
        tracing::debug!("Running captured: {:?}", invocation);

        let output = match cmd.stdin(Stdio::null()).output() {
            Ok(output) => output,
            Err(e) => return ProcessResult::spawn_failure(e.to_string(), start.elapsed()),
        };

        ProcessResult {
            exit_code: exit_code(output.status),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            duration: start.elapsed(),
        }
    }

    /// Run with the terminal handed to the child.
    ///
    /// Output is not captured; only the exit code and duration are
    /// meaningful in the result.
    pub fn run_passthrough(&self, command: &str, cwd: &Path) -> ProcessResult {
        let start = Instant::now();
        let invocation = Invocation::Interpreter(command.to_string());
        let Some(mut cmd) = self.command(&invocation, cwd) else {
            return ProcessResult::spawn_failure("empty command", start.elapsed());
        };
        tracing::debug!("Running passthrough: {}", command);

        let status = cmd
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status();

        match status {
            Ok(status) => ProcessResult {
                exit_code: exit_code(status),
                stdout: String::new(),
                stderr: String::new(),
                duration: start.elapsed(),
            },
            Err(e) => ProcessResult::spawn_failure(e.to_string(), start.elapsed()),
        }
    }

    /// Start a streaming child with merged output and writable stdin.
    ///
    /// On unix, a command starting with `sudo ` asks `password` for credentials
    /// first and runs as `sudo -S <rest>` with the password written to
    /// stdin. A cancelled or empty password yields `Ok(None)` and
    /// nothing is spawned.
    pub fn run_streaming<F>(
        &self,
        command: &str,
        cwd: &Path,
        password: F,
    ) -> Result<Option<StreamingProcess>>
    where
        F: FnOnce() -> Option<String>,
    {
        let trimmed = command.trim();
        let mut script = trimmed.to_string();
        let mut credentials = None;

        if let Some(rest) = sudo_target(trimmed, platform::supports_sudo()) {
            if rest.is_empty() {
                return Err(ShellError::SudoWithoutCommand);
            }
            match password().filter(|p| !p.is_empty()) {
                Some(secret) => credentials = Some(secret),
                None => return Ok(None),
            }
            script = format!("sudo -S {rest}");
        }

        let invocation = Invocation::Interpreter(script);
        let cmd = self
            .command(&invocation, cwd)
            .ok_or_else(|| ShellError::SpawnFailed {
                command: command.to_string(),
                message: "empty command".to_string(),
            })?;
        tracing::debug!("Running streaming: {}", command);

        let mut process =
            StreamingProcess::spawn(cmd, command).map_err(|e| ShellError::SpawnFailed {
                command: command.to_string(),
                message: e.to_string(),
            })?;

        if let Some(secret) = credentials {
            let mut line = secret.into_bytes();
            line.push(b'\n');
            if let Err(e) = process.write_input(&line) {
                tracing::debug!("Failed to send sudo password: {}", e);
            }
        }

        Ok(Some(process))
    }

    /// Run `argv` with a hard time budget, returning stdout on exit 0.
    ///
    /// Timeouts, spawn errors and non-zero exits all yield `None`; a
    /// child still running at the deadline is killed.
    pub fn run_bounded(argv: &[String], cwd: Option<&Path>, timeout: Duration) -> Option<String> {
        let (program, args) = argv.split_first()?;
        let mut cmd = Command::new(program);
        cmd.args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null());
        if let Some(dir) = cwd {
            cmd.current_dir(dir);
        }

        let mut child = match cmd.spawn() {
            Ok(child) => child,
            Err(e) => {
                tracing::debug!("Failed to start {}: {}", program, e);
                return None;
            }
        };
        let mut stdout = child.stdout.take()?;

        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            let mut buf = Vec::new();
            let _ = stdout.read_to_end(&mut buf);
            let _ = tx.send(buf);
        });

        let deadline = Instant::now() + timeout;
        let status = loop {
            match child.try_wait() {
                Ok(Some(status)) => break status,
                Ok(None) if Instant::now() < deadline => {
                    thread::sleep(Duration::from_millis(10));
                }
                Ok(None) => {
                    tracing::debug!("{} timed out after {:?}", program, timeout);
                    let _ = child.kill();
                    let _ = child.wait();
                    return None;
                }
                Err(e) => {
                    tracing::debug!("Failed waiting for {}: {}", program, e);
                    return None;
                }
            }
        };

        let remaining = deadline.saturating_duration_since(Instant::now());
        let output = rx.recv_timeout(remaining.max(Duration::from_millis(50))).ok()?;
        if !status.success() {
            tracing::debug!("{} exited with {:?}", program, status.code());
            return None;
        }
        Some(String::from_utf8_lossy(&output).into_owned())
    }
}

/// Exit code of a finished child, `128 + signal` when killed by a signal.
/// What follows `sudo` when credentials must be injected; `None` for
/// other commands or where injection is unsupported.
fn sudo_target(command: &str, supported: bool) -> Option<&str> {
    if !supported {
        return None;
    }
    if command == "sudo" {
        return Some("");
    }
    command.strip_prefix("sudo ").map(str::trim)
}

pub fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }
    1
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn runner() -> ProcessRunner {
        ProcessRunner::new(ShellInfo::new("/bin/sh"))
    }

    #[test]
    fn invocation_prefers_direct_argv() {
        assert_eq!(
            Invocation::for_command("ls -l 'my dir'", false),
            Invocation::Direct(vec!["ls".into(), "-l".into(), "my dir".into()])
        );
        assert_eq!(
            Invocation::for_command("a && b", true),
            Invocation::Interpreter("a && b".into())
        );
        assert_eq!(
            Invocation::for_command("echo 'open", false),
            Invocation::Interpreter("echo 'open".into())
        );
    }

    #[test]
    fn argv_wraps_interpreter_text() {
        let argv = runner().argv(&Invocation::Interpreter("echo hi".into()));
        assert_eq!(argv, vec!["/bin/sh", "-c", "echo hi"]);
    }

    #[test]
    fn result_helpers() {
        let failed = ProcessResult::spawn_failure("nope", Duration::ZERO);
        assert!(failed.is_spawn_failure());
        assert!(!failed.success());

        let ok = ProcessResult {
            exit_code: 0,
            stdout: "out\n".into(),
            stderr: "err\n".into(),
            duration: Duration::ZERO,
        };
        assert!(ok.success());
        assert_eq!(ok.combined_output(), "out\nerr\n");
    }

    #[cfg(unix)]
    #[test]
    fn captured_run_collects_both_streams() {
        let temp = TempDir::new().unwrap();
        let result = runner().run_captured(
            &Invocation::Interpreter("echo out; echo err >&2; exit 3".into()),
            temp.path(),
        );
        assert_eq!(result.exit_code, 3);
        assert_eq!(result.stdout, "out\n");
        assert_eq!(result.stderr, "err\n");
    }

    #[cfg(unix)]
    #[test]
    fn captured_run_uses_working_directory() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("marker.txt"), "").unwrap();
        let result = runner().run_captured(&Invocation::Direct(vec!["ls".into()]), temp.path());
        assert!(result.success());
        assert!(result.stdout.contains("marker.txt"));
    }

    #[test]
    fn missing_program_is_spawn_failure() {
        let temp = TempDir::new().unwrap();
        let result = runner().run_captured(
            &Invocation::Direct(vec!["hybridshell-no-such-program".into()]),
            temp.path(),
        );
        assert_eq!(result.exit_code, SPAWN_FAILURE);
        assert!(!result.stderr.is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn bounded_run_returns_stdout() {
        let argv: Vec<String> = vec!["sh".into(), "-c".into(), "printf 'a\\nb\\n'".into()];
        let out = ProcessRunner::run_bounded(&argv, None, Duration::from_secs(5));
        assert_eq!(out.as_deref(), Some("a\nb\n"));
    }

    #[cfg(unix)]
    #[test]
    fn bounded_run_times_out() {
        let argv: Vec<String> = vec!["sh".into(), "-c".into(), "sleep 5".into()];
        let start = Instant::now();
        let out = ProcessRunner::run_bounded(&argv, None, Duration::from_millis(100));
        assert!(out.is_none());
        assert!(start.elapsed() < Duration::from_secs(4));
    }

    #[cfg(unix)]
    #[test]
    fn bounded_run_rejects_nonzero_exit() {
        let argv: Vec<String> = vec!["sh".into(), "-c".into(), "echo x; exit 1".into()];
        assert!(ProcessRunner::run_bounded(&argv, None, Duration::from_secs(5)).is_none());
    }

    #[test]
    fn sudo_target_requires_support() {
        assert_eq!(sudo_target("sudo apt upgrade", true), Some("apt upgrade"));
        assert_eq!(sudo_target("sudo", true), Some(""));
        assert_eq!(sudo_target("sudo apt upgrade", false), None);
        assert_eq!(sudo_target("sudoedit /etc/hosts", true), None);
        assert_eq!(platform::supports_sudo(), cfg!(unix));
    }

    #[cfg(unix)]
    #[test]
    fn sudo_without_password_is_cancelled() {
        let temp = TempDir::new().unwrap();
        let spawned = runner()
            .run_streaming("sudo apt upgrade", temp.path(), || None)
            .unwrap();
        assert!(spawned.is_none());

        let spawned = runner()
            .run_streaming("sudo apt upgrade", temp.path(), || Some(String::new()))
            .unwrap();
        assert!(spawned.is_none());
    }

    #[cfg(unix)]
    #[test]
    fn bare_sudo_is_an_error() {
        let temp = TempDir::new().unwrap();
        let err = runner()
            .run_streaming("sudo", temp.path(), || Some("pw".into()))
            .unwrap_err();
        assert!(matches!(err, ShellError::SudoWithoutCommand));
    }

    #[cfg(unix)]
    #[test]
    fn password_prompt_skipped_without_sudo() {
        let temp = TempDir::new().unwrap();
        let mut asked = false;
        let process = runner()
            .run_streaming("echo streamed", temp.path(), || {
                asked = true;
                None
            })
            .unwrap();
        assert!(process.is_some());
        assert!(!asked);
    }
}
