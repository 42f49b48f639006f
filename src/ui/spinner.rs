//! Progress spinners.

use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

use super::theme::ShellTheme;
use super::SpinnerHandle;

/// A progress spinner shown while a captured command runs.
pub struct ProgressSpinner {
    bar: ProgressBar,
    theme: ShellTheme,
}

fn spinner_style() -> ProgressStyle {
    ProgressStyle::with_template("{spinner:.magenta} {msg}")
        .map(|style| style.tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏ "))
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
}

fn message_style() -> ProgressStyle {
    ProgressStyle::with_template("{msg}").unwrap_or_else(|_| ProgressStyle::default_spinner())
}

impl ProgressSpinner {
    /// Create a new spinner with a message.
    pub fn new(message: &str, theme: ShellTheme) -> Self {
        let bar = ProgressBar::new_spinner();
        bar.set_style(spinner_style());
        bar.set_message(message.to_string());
        bar.enable_steady_tick(Duration::from_millis(80));

        Self { bar, theme }
    }

    /// Create a spinner that doesn't show (for quiet mode).
    pub fn hidden() -> Self {
        Self {
            bar: ProgressBar::hidden(),
            theme: ShellTheme::plain(),
        }
    }

    fn finish_with(&mut self, line: String) {
        self.bar.set_style(message_style());
        self.bar.finish_with_message(line);
    }
}

impl SpinnerHandle for ProgressSpinner {
    fn set_message(&mut self, msg: &str) {
        self.bar.set_message(msg.to_string());
    }

    fn finish_success(&mut self, msg: &str) {
        let line = self.theme.format_success(msg);
        self.finish_with(line);
    }

    fn finish_error(&mut self, msg: &str) {
        let line = self.theme.format_error(msg);
        self.finish_with(line);
    }

    fn finish_clear(&mut self) {
        self.bar.finish_and_clear();
    }
}

impl Drop for ProgressSpinner {
    fn drop(&mut self) {
        if !self.bar.is_finished() {
            self.bar.finish_and_clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hidden_spinner() {
        let spinner = ProgressSpinner::hidden();
        drop(spinner);
    }

    #[test]
    fn spinner_finish_success() {
        let mut spinner = ProgressSpinner::hidden();
        spinner.finish_success("Done");
        assert!(spinner.bar.is_finished());
        assert_eq!(spinner.bar.message(), "✓ Done");
    }

    #[test]
    fn spinner_finish_error() {
        let mut spinner = ProgressSpinner::hidden();
        spinner.finish_error("Failed");
        assert_eq!(spinner.bar.message(), "✗ Failed");
    }

    #[test]
    fn spinner_set_message() {
        let mut spinner = ProgressSpinner::new("Executing: ls", ShellTheme::plain());
        spinner.set_message("Executing: ls -la");
        assert_eq!(spinner.bar.message(), "Executing: ls -la");
        spinner.finish_clear();
        assert!(spinner.bar.is_finished());
    }

    #[test]
    fn drop_clears_unfinished_spinner() {
        let spinner = ProgressSpinner::new("Executing: sleep 1", ShellTheme::plain());
        let bar = spinner.bar.clone();
        drop(spinner);
        assert!(bar.is_finished());
    }
}
