//! Terminal user interface.
//!
//! This module provides:
//! - [`UserInterface`] trait for UI abstraction
//! - [`TerminalUI`] for interactive terminal usage
//! - [`MockUI`] for tests
//! - [`StreamRenderer`] for live output of streaming commands
//! - Prompts, spinners, panels and listing tables
//!
//! # Example
//!
//! ```
//! use hybridshell::ui::{MockUI, UserInterface};
//!
//! let mut ui = MockUI::new();
//! ui.show_error("cd nowhere", "cd: nowhere: No such file or directory");
//! assert!(ui.has_error("No such file"));
//! ```

pub mod hints;
pub mod icons;
pub mod listing;
pub mod mock;
pub mod output;
pub mod prompts;
pub mod spinner;
pub mod stream;
pub mod table;
pub mod terminal;
pub mod theme;

pub use icons::FileKind;
pub use listing::build_listing_table;
pub use mock::{MockSpinner, MockStreamRenderer, MockUI};
pub use output::{env_change_lines, EnvLine, OutputMode};
pub use prompts::prompt_user;
pub use spinner::ProgressSpinner;
pub use stream::{StreamOutcome, StreamRenderer, TerminalStreamRenderer};
pub use table::Table;
pub use terminal::{create_ui, TerminalUI};
pub use theme::{should_use_colors, ShellTheme};

use std::path::Path;

use crate::error::Result;
use crate::shell::env::EnvironmentDiff;
use crate::shell::process::ProcessResult;

/// Trait for user interface interactions.
///
/// This trait allows mocking the UI in tests.
pub trait UserInterface {
    /// Get the current output mode.
    fn output_mode(&self) -> OutputMode;

    /// Display a message to the user.
    fn message(&mut self, msg: &str);

    /// Display a success message.
    fn success(&mut self, msg: &str);

    /// Display a warning message.
    fn warning(&mut self, msg: &str);

    /// Display an error message.
    fn error(&mut self, msg: &str);

    /// Show a prompt and return the answer.
    fn prompt(&mut self, prompt: &Prompt) -> Result<String>;

    /// Start a spinner for an operation.
    fn start_spinner(&mut self, message: &str) -> Box<dyn SpinnerHandle>;

    /// Check if running in interactive mode.
    fn is_interactive(&self) -> bool;

    /// Report a failed command.
    fn show_error(&mut self, command: &str, msg: &str);

    /// Show captured output of a finished command.
    fn show_shell_output(&mut self, command: &str, result: &ProcessResult);

    /// Show the output of a listing command as a table.
    fn show_listing(&mut self, command: &str, result: &ProcessResult, cwd: &Path);

    /// Confirm a working directory change.
    fn show_directory_change(&mut self, command: &str, dir: &Path);

    /// Announce that a command takes over the terminal.
    fn show_interactive_start(&mut self, command: &str);

    /// Report how a terminal-owning command ended.
    fn show_interactive_end(&mut self, command: &str, exit_code: i32);

    /// List variables added or changed by an environment script.
    fn show_env_changes(&mut self, diff: &EnvironmentDiff);

    /// Show a titled table.
    fn show_table(&mut self, title: &str, table: &Table);

    /// Show built-in help.
    fn show_help(&mut self);

    /// Clear the terminal.
    fn clear_screen(&mut self);
}

/// Handle for controlling a spinner.
pub trait SpinnerHandle {
    /// Update the spinner message.
    fn set_message(&mut self, msg: &str);

    /// Mark the operation as successful.
    fn finish_success(&mut self, msg: &str);

    /// Mark the operation as failed.
    fn finish_error(&mut self, msg: &str);

    /// Remove the spinner without a final line.
    fn finish_clear(&mut self);
}

/// A prompt to show to the user.
#[derive(Debug, Clone)]
pub struct Prompt {
    /// Unique key for the prompt (used for lookup in tests).
    pub key: String,
    /// The question to display.
    pub question: String,
    /// The type of prompt.
    pub prompt_type: PromptType,
}

/// The type of prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptType {
    /// Hidden input, e.g. a sudo password.
    Password,
}

impl Prompt {
    /// Hidden-input prompt.
    pub fn password(key: &str, question: &str) -> Self {
        Self {
            key: key.to_string(),
            question: question.to_string(),
            prompt_type: PromptType::Password,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_prompt_creation() {
        let prompt = Prompt::password("sudo_password", "[sudo] password");
        assert_eq!(prompt.key, "sudo_password");
        assert_eq!(prompt.question, "[sudo] password");
        assert_eq!(prompt.prompt_type, PromptType::Password);
    }
}
