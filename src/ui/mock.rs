//! Mock UI implementation for testing.
//!
//! `MockUI` implements the `UserInterface` trait and captures all
//! interactions for later assertion. It can be configured with
//! pre-determined prompt responses.
//!
//! # Example
//!
//! ```
//! use hybridshell::ui::{MockUI, Prompt, UserInterface};
//!
//! let mut ui = MockUI::new();
//! ui.set_prompt_response("sudo_password", "hunter2");
//!
//! let answer = ui.prompt(&Prompt::password("sudo_password", "[sudo] password")).unwrap();
//! assert_eq!(answer, "hunter2");
//! assert_eq!(ui.prompts_shown(), &["sudo_password".to_string()]);
//! ```

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{Result, ShellError};
use crate::shell::env::EnvironmentDiff;
use crate::shell::process::ProcessResult;
use crate::shell::streaming::{StreamEvent, StreamingProcess};

use super::hints::help_lines;
use super::output::env_change_lines;
use super::stream::{StreamOutcome, StreamRenderer};
use super::{OutputMode, Prompt, SpinnerHandle, Table, UserInterface};

/// Mock UI implementation for testing.
///
/// Prompts without a configured response answer with an empty string,
/// unless [`MockUI::fail_prompt`] marked the key as failing.
#[derive(Debug, Default)]
pub struct MockUI {
    mode: OutputMode,
    interactive: bool,
    messages: Vec<String>,
    successes: Vec<String>,
    warnings: Vec<String>,
    errors: Vec<String>,
    spinners: Vec<String>,
    prompt_responses: HashMap<String, String>,
    failing_prompts: Vec<String>,
    prompts_shown: Vec<String>,
    shell_outputs: Vec<(String, ProcessResult)>,
    listings: Vec<(String, PathBuf, ProcessResult)>,
    directory_changes: Vec<PathBuf>,
    interactive_starts: Vec<String>,
    interactive_ends: Vec<(String, i32)>,
    env_lines: Vec<String>,
    tables: Vec<(String, Table)>,
    help_shown: usize,
    clears: usize,
}

impl MockUI {
    /// Create a new MockUI with Normal output mode.
    pub fn new() -> Self {
        Self {
            mode: OutputMode::Normal,
            ..Default::default()
        }
    }

    /// Create a new MockUI with a specific output mode.
    pub fn with_mode(mode: OutputMode) -> Self {
        Self {
            mode,
            ..Default::default()
        }
    }

    /// Set a response for a prompt key.
    pub fn set_prompt_response(&mut self, key: &str, response: &str) {
        self.prompt_responses
            .insert(key.to_string(), response.to_string());
    }

    /// Make prompts with this key fail as if the user aborted them.
    pub fn fail_prompt(&mut self, key: &str) {
        self.failing_prompts.push(key.to_string());
    }

    /// Set whether this mock behaves as interactive.
    pub fn set_interactive(&mut self, interactive: bool) {
        self.interactive = interactive;
    }

    pub fn messages(&self) -> &[String] {
        &self.messages
    }

    pub fn successes(&self) -> &[String] {
        &self.successes
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    /// Get all spinner messages that were started.
    pub fn spinners(&self) -> &[String] {
        &self.spinners
    }

    /// Get all prompts that were shown (by key).
    pub fn prompts_shown(&self) -> &[String] {
        &self.prompts_shown
    }

    /// Captured `(command, result)` pairs passed to `show_shell_output`.
    pub fn shell_outputs(&self) -> &[(String, ProcessResult)] {
        &self.shell_outputs
    }

    /// Commands rendered as listing tables, with the directory and result.
    pub fn listings(&self) -> &[(String, PathBuf, ProcessResult)] {
        &self.listings
    }

    pub fn directory_changes(&self) -> &[PathBuf] {
        &self.directory_changes
    }

    pub fn interactive_starts(&self) -> &[String] {
        &self.interactive_starts
    }

    pub fn interactive_ends(&self) -> &[(String, i32)] {
        &self.interactive_ends
    }

    /// Plain text of every environment change line shown.
    pub fn env_lines(&self) -> &[String] {
        &self.env_lines
    }

    pub fn tables(&self) -> &[(String, Table)] {
        &self.tables
    }

    /// How many times help was shown.
    pub fn help_shown(&self) -> usize {
        self.help_shown
    }

    /// How many times the screen was cleared.
    pub fn clears(&self) -> usize {
        self.clears
    }

    /// Check if a specific message was shown.
    pub fn has_message(&self, msg: &str) -> bool {
        self.messages.iter().any(|m| m.contains(msg))
    }

    /// Check if a specific success was shown.
    pub fn has_success(&self, msg: &str) -> bool {
        self.successes.iter().any(|m| m.contains(msg))
    }

    /// Check if a specific error was shown.
    pub fn has_error(&self, msg: &str) -> bool {
        self.errors.iter().any(|m| m.contains(msg))
    }

    /// Check if a specific warning was shown.
    pub fn has_warning(&self, msg: &str) -> bool {
        self.warnings.iter().any(|m| m.contains(msg))
    }

    /// Check if any captured command output contains `text`.
    pub fn has_output(&self, text: &str) -> bool {
        let in_result = |r: &ProcessResult| r.stdout.contains(text) || r.stderr.contains(text);
        self.shell_outputs.iter().any(|(_, r)| in_result(r))
            || self.listings.iter().any(|(_, _, r)| in_result(r))
    }

    /// Clear all captured interactions.
    pub fn clear(&mut self) {
        self.messages.clear();
        self.successes.clear();
        self.warnings.clear();
        self.errors.clear();
        self.spinners.clear();
        self.prompts_shown.clear();
        self.shell_outputs.clear();
        self.listings.clear();
        self.directory_changes.clear();
        self.interactive_starts.clear();
        self.interactive_ends.clear();
        self.env_lines.clear();
        self.tables.clear();
        self.help_shown = 0;
        self.clears = 0;
    }
}

impl UserInterface for MockUI {
    fn output_mode(&self) -> OutputMode {
        self.mode
    }

    fn message(&mut self, msg: &str) {
        self.messages.push(msg.to_string());
    }

    fn success(&mut self, msg: &str) {
        self.successes.push(msg.to_string());
    }

    fn warning(&mut self, msg: &str) {
        self.warnings.push(msg.to_string());
    }

    fn error(&mut self, msg: &str) {
        self.errors.push(msg.to_string());
    }

    fn prompt(&mut self, prompt: &Prompt) -> Result<String> {
        self.prompts_shown.push(prompt.key.clone());
        if self.failing_prompts.contains(&prompt.key) {
            return Err(ShellError::Other(anyhow::anyhow!(
                "prompt '{}' aborted",
                prompt.key
            )));
        }
        Ok(self
            .prompt_responses
            .get(&prompt.key)
            .cloned()
            .unwrap_or_default())
    }

    fn start_spinner(&mut self, message: &str) -> Box<dyn SpinnerHandle> {
        self.spinners.push(message.to_string());
        Box::new(MockSpinner::new())
    }

    fn is_interactive(&self) -> bool {
        self.interactive
    }

    fn show_error(&mut self, command: &str, msg: &str) {
        self.errors.push(format!("{}: {}", command, msg));
    }

    fn show_shell_output(&mut self, command: &str, result: &ProcessResult) {
        self.shell_outputs
            .push((command.to_string(), result.clone()));
    }

    fn show_listing(&mut self, command: &str, result: &ProcessResult, cwd: &Path) {
        self.listings
            .push((command.to_string(), cwd.to_path_buf(), result.clone()));
    }

    fn show_directory_change(&mut self, _command: &str, dir: &Path) {
        self.directory_changes.push(dir.to_path_buf());
        self.successes
            .push(format!("Changed directory to: {}", dir.display()));
    }

    fn show_interactive_start(&mut self, command: &str) {
        self.interactive_starts.push(command.to_string());
    }

    fn show_interactive_end(&mut self, command: &str, exit_code: i32) {
        self.interactive_ends
            .push((command.to_string(), exit_code));
    }

    fn show_env_changes(&mut self, diff: &EnvironmentDiff) {
        self.env_lines.extend(
            env_change_lines(diff)
                .iter()
                .map(|line| line.text().to_string()),
        );
    }

    fn show_table(&mut self, title: &str, table: &Table) {
        self.tables.push((title.to_string(), table.clone()));
    }

    fn show_help(&mut self) {
        self.help_shown += 1;
        self.messages.extend(help_lines());
    }

    fn clear_screen(&mut self) {
        self.clears += 1;
    }
}

/// Mock spinner for testing.
#[derive(Debug, Default)]
pub struct MockSpinner {
    messages: Vec<String>,
    finish_message: Option<String>,
    status: Option<SpinnerStatus>,
}

/// Status of a mock spinner when finished.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SpinnerStatus {
    Success,
    Error,
    Cleared,
}

impl MockSpinner {
    /// Create a new mock spinner.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get all messages set during spinning.
    pub fn messages(&self) -> &[String] {
        &self.messages
    }

    /// Get the final finish message.
    pub fn finish_message(&self) -> Option<&str> {
        self.finish_message.as_deref()
    }

    /// Get the final status.
    pub fn status(&self) -> Option<SpinnerStatus> {
        self.status
    }
}

impl SpinnerHandle for MockSpinner {
    fn set_message(&mut self, msg: &str) {
        self.messages.push(msg.to_string());
    }

    fn finish_success(&mut self, msg: &str) {
        self.finish_message = Some(msg.to_string());
        self.status = Some(SpinnerStatus::Success);
    }

    fn finish_error(&mut self, msg: &str) {
        self.finish_message = Some(msg.to_string());
        self.status = Some(SpinnerStatus::Error);
    }

    fn finish_clear(&mut self) {
        self.status = Some(SpinnerStatus::Cleared);
    }
}

/// Stream renderer that collects output without touching the terminal.
///
/// With [`MockStreamRenderer::cancelling`] it interrupts the child as
/// soon as the first output chunk arrives, like a user pressing Ctrl-C.
#[derive(Debug, Default)]
pub struct MockStreamRenderer {
    cancel: bool,
    streamed: Vec<String>,
}

impl MockStreamRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// A renderer that cancels every command it drives.
    pub fn cancelling() -> Self {
        Self {
            cancel: true,
            ..Default::default()
        }
    }

    /// Commands driven so far.
    pub fn streamed(&self) -> &[String] {
        &self.streamed
    }
}

impl StreamRenderer for MockStreamRenderer {
    fn stream_shell_command(
        &mut self,
        command: &str,
        process: &mut StreamingProcess,
    ) -> StreamOutcome {
        self.streamed.push(command.to_string());
        let mut captured = Vec::new();
        let mut outcome = StreamOutcome::default();

        loop {
            match process.read(Duration::from_millis(50)) {
                StreamEvent::Output(chunk) => {
                    captured.extend_from_slice(&chunk);
                    if self.cancel {
                        outcome.cancelled = true;
                        process.interrupt().ok();
                        break;
                    }
                }
                StreamEvent::Pending => {
                    if let Ok(Some(code)) = process.try_wait() {
                        while let StreamEvent::Output(chunk) =
                            process.read(Duration::from_millis(10))
                        {
                            captured.extend_from_slice(&chunk);
                        }
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

        outcome.output = String::from_utf8_lossy(&captured).into_owned();
        outcome
    }
}
