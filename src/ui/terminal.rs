//! Interactive terminal UI.

use console::Term;
use std::io::Write;
use std::path::Path;
use std::time::Duration;

use crate::error::Result;
use crate::shell::env::EnvironmentDiff;
use crate::shell::process::ProcessResult;

use super::hints::{help_lines, INTERACTIVE_HINT};
use super::listing::build_listing_table;
use super::output::{env_change_lines, EnvLine};
use super::{
    prompt_user, should_use_colors, OutputMode, ProgressSpinner, Prompt, ShellTheme,
    SpinnerHandle, Table, UserInterface,
};

/// Width of the rule drawn under panel titles.
const RULE_WIDTH: usize = 40;

/// Interactive terminal UI implementation.
pub struct TerminalUI {
    term: Term,
    theme: ShellTheme,
    mode: OutputMode,
}

impl TerminalUI {
    /// Create a new terminal UI, colored when the terminal allows it.
    pub fn new(mode: OutputMode) -> Self {
        Self::with_theme(mode, ShellTheme::for_colors(should_use_colors()))
    }

    pub fn with_theme(mode: OutputMode, theme: ShellTheme) -> Self {
        Self {
            term: Term::stdout(),
            theme,
            mode,
        }
    }

    pub fn theme(&self) -> &ShellTheme {
        &self.theme
    }

    /// Boxed panel: title row, body lines, closing rule.
    fn panel(&mut self, title: &str, body: &[String]) {
        let b = &self.theme.border;
        let fill = RULE_WIDTH.saturating_sub(console::measure_text_width(title));
        writeln!(
            self.term,
            "{} {} {}",
            b.apply_to("┌─"),
            title,
            b.apply_to("─".repeat(fill))
        )
        .ok();
        for line in body {
            writeln!(self.term, "{} {}", b.apply_to("│"), line).ok();
        }
        writeln!(self.term, "{}", b.apply_to(format!("└{}", "─".repeat(RULE_WIDTH + 2)))).ok();
    }

    fn shell_title(&self, command: &str) -> String {
        self.theme.format_panel_title("Shell:", command)
    }

    fn timing(&mut self, duration: Duration) {
        if self.mode.shows_timing() {
            writeln!(
                self.term,
                "{}",
                self.theme
                    .dim
                    .apply_to(format!("  finished in {:.2}s", duration.as_secs_f64()))
            )
            .ok();
        }
    }
}

impl UserInterface for TerminalUI {
    fn output_mode(&self) -> OutputMode {
        self.mode
    }

    fn message(&mut self, msg: &str) {
        if self.mode.shows_status() {
            writeln!(self.term, "{}", msg).ok();
        }
    }

    fn success(&mut self, msg: &str) {
        if self.mode.shows_status() {
            writeln!(self.term, "{}", self.theme.format_success(msg)).ok();
        }
    }

    fn warning(&mut self, msg: &str) {
        if self.mode.shows_status() {
            writeln!(self.term, "{}", self.theme.format_warning(msg)).ok();
        }
    }

    fn error(&mut self, msg: &str) {
        writeln!(self.term, "{}", self.theme.format_error(msg)).ok();
    }

    fn prompt(&mut self, prompt: &Prompt) -> Result<String> {
        prompt_user(prompt, &self.term)
    }

    fn start_spinner(&mut self, message: &str) -> Box<dyn SpinnerHandle> {
        if self.mode.shows_spinners() && self.term.is_term() {
            Box::new(ProgressSpinner::new(message, self.theme.clone()))
        } else {
            Box::new(ProgressSpinner::hidden())
        }
    }

    fn is_interactive(&self) -> bool {
        self.term.is_term()
    }

    fn show_error(&mut self, command: &str, msg: &str) {
        let title = self.shell_title(command);
        let body: Vec<String> = msg
            .lines()
            .map(|l| self.theme.error.apply_to(l).to_string())
            .collect();
        self.panel(&title, &body);
    }

    fn show_shell_output(&mut self, command: &str, result: &ProcessResult) {
        let mut body: Vec<String> = result.stdout.lines().map(str::to_string).collect();
        body.extend(
            result
                .stderr
                .lines()
                .map(|l| self.theme.stderr.apply_to(l).to_string()),
        );
        if body.is_empty() {
            body.push(self.theme.dim.apply_to("No output").to_string());
        }
        let title = self.shell_title(command);
        self.panel(&title, &body);
        self.timing(result.duration);
    }

    fn show_listing(&mut self, command: &str, result: &ProcessResult, cwd: &Path) {
        if !result.success() {
            self.show_error(command, &result.stderr);
            return;
        }
        let title = self
            .theme
            .format_panel_title("Directory Listing:", command);
        if result.stdout.trim().is_empty() {
            let body = [self.theme.warning.apply_to("Directory is empty").to_string()];
            self.panel(&title, &body);
            return;
        }

        let table = build_listing_table(command, &result.stdout, cwd, &self.theme);
        writeln!(self.term, "{}", title).ok();
        write!(self.term, "{}", table.render()).ok();
        self.timing(result.duration);
    }

    fn show_directory_change(&mut self, command: &str, dir: &Path) {
        let title = self.shell_title(command);
        let body = [self
            .theme
            .success
            .apply_to(format!("Changed directory to: {}", dir.display()))
            .to_string()];
        self.panel(&title, &body);
    }

    fn show_interactive_start(&mut self, command: &str) {
        writeln!(
            self.term,
            " {}",
            self.theme
                .warning
                .apply_to(format!("Starting interactive mode: {}", command))
        )
        .ok();
        writeln!(
            self.term,
            " {} {}",
            self.theme.border.apply_to("└──"),
            self.theme.info.apply_to(INTERACTIVE_HINT)
        )
        .ok();
    }

    fn show_interactive_end(&mut self, command: &str, exit_code: i32) {
        let line = if exit_code == 0 {
            self.theme
                .success
                .apply_to(format!("{} completed successfully", command))
        } else {
            self.theme
                .warning
                .apply_to(format!("{} exited with code: {}", command, exit_code))
        };
        writeln!(self.term, " {}", line).ok();
    }

    fn show_env_changes(&mut self, diff: &EnvironmentDiff) {
        if !self.mode.shows_status() {
            return;
        }
        for line in env_change_lines(diff) {
            let styled = match &line {
                EnvLine::Header(s) => self.theme.highlight.apply_to(s.as_str()),
                EnvLine::Added(s) => self.theme.added.apply_to(s.as_str()),
                EnvLine::Changed(s) => self.theme.changed.apply_to(s.as_str()),
                EnvLine::More(s) => self.theme.dim.apply_to(s.as_str()),
            };
            writeln!(self.term, "{}", styled).ok();
        }
    }

    fn show_table(&mut self, title: &str, table: &Table) {
        writeln!(self.term, "{}", self.theme.header.apply_to(title)).ok();
        write!(self.term, "{}", table.render()).ok();
    }

    fn show_help(&mut self) {
        for line in help_lines() {
            if !line.is_empty() && !line.starts_with(' ') {
                writeln!(self.term, "{}", self.theme.header.apply_to(line)).ok();
            } else {
                writeln!(self.term, "{}", line).ok();
            }
        }
    }

    fn clear_screen(&mut self) {
        self.term.clear_screen().ok();
    }
}

/// Create the terminal UI for the given color preference.
pub fn create_ui(colors: bool, mode: OutputMode) -> TerminalUI {
    TerminalUI::with_theme(mode, ShellTheme::for_colors(colors && should_use_colors()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_ui_output_mode() {
        let ui = TerminalUI::new(OutputMode::Quiet);
        assert_eq!(ui.output_mode(), OutputMode::Quiet);
    }

    #[test]
    fn create_ui_respects_mode() {
        let ui = create_ui(false, OutputMode::Verbose);
        assert_eq!(ui.output_mode(), OutputMode::Verbose);
    }

    #[test]
    fn create_ui_without_colors_uses_plain_theme() {
        let ui = create_ui(false, OutputMode::Normal);
        assert_eq!(ui.theme().format_success("ok"), "✓ ok");
    }

    #[test]
    fn shell_panel_title_names_command() {
        let ui = create_ui(false, OutputMode::Normal);
        assert_eq!(ui.shell_title("ls"), "Shell: ls");
    }
}
