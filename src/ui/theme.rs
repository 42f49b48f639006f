//! Visual theme and styling.

use console::Style;

/// Terminal styles used by the shell.
#[derive(Debug, Clone)]
pub struct ShellTheme {
    /// Style for success messages (green).
    pub success: Style,
    /// Style for warning messages (orange).
    pub warning: Style,
    /// Style for error messages (red bold).
    pub error: Style,
    /// Style for status lines such as "Executing: ..." (magenta).
    pub info: Style,
    /// Style for dim/secondary text.
    pub dim: Style,
    /// Style for highlighted/important text (bold).
    pub highlight: Style,
    /// Style for panel titles (magenta bold).
    pub header: Style,
    /// Style for commands shown in output (dim italic).
    pub command: Style,
    /// Style for captured standard error (red).
    pub stderr: Style,
    /// Style for box-drawing borders (dim).
    pub border: Style,
    /// Style for added environment variables (green).
    pub added: Style,
    /// Style for changed environment variables (yellow).
    pub changed: Style,
    /// Style for key labels in key-value displays (bold).
    pub key: Style,
    /// Style for the working directory in the prompt (cyan bold).
    pub prompt_path: Style,
}

impl Default for ShellTheme {
    fn default() -> Self {
        Self::new()
    }
}

impl ShellTheme {
    /// Create the default theme.
    pub fn new() -> Self {
        Self {
            success: Style::new().green(),
            warning: Style::new().color256(208),
            error: Style::new().red().bold(),
            info: Style::new().magenta(),
            dim: Style::new().dim(),
            highlight: Style::new().bold(),
            header: Style::new().bold().magenta(),
            command: Style::new().dim().italic(),
            stderr: Style::new().red(),
            border: Style::new().dim(),
            added: Style::new().green(),
            changed: Style::new().yellow(),
            key: Style::new().bold(),
            prompt_path: Style::new().cyan().bold(),
        }
    }

    /// Create a theme without colors (for non-TTY or --no-color).
    pub fn plain() -> Self {
        Self {
            success: Style::new(),
            warning: Style::new(),
            error: Style::new(),
            info: Style::new(),
            dim: Style::new(),
            highlight: Style::new(),
            header: Style::new(),
            command: Style::new(),
            stderr: Style::new(),
            border: Style::new(),
            added: Style::new(),
            changed: Style::new(),
            key: Style::new(),
            prompt_path: Style::new(),
        }
    }

    /// Pick the colored or plain theme.
    pub fn for_colors(colors: bool) -> Self {
        if colors {
            Self::new()
        } else {
            Self::plain()
        }
    }

    /// Format a success message (icon + text in green).
    pub fn format_success(&self, msg: &str) -> String {
        format!("{}", self.success.apply_to(format!("✓ {}", msg)))
    }

    /// Format a warning message (icon + text in orange).
    pub fn format_warning(&self, msg: &str) -> String {
        format!("{}", self.warning.apply_to(format!("⚠ {}", msg)))
    }

    /// Format an error message (icon + text in red bold).
    pub fn format_error(&self, msg: &str) -> String {
        format!("{}", self.error.apply_to(format!("✗ {}", msg)))
    }

    /// Format a status line such as `Executing: ls`.
    pub fn format_status(&self, msg: &str) -> String {
        format!("{}", self.info.apply_to(format!("◆ {}", msg)))
    }

    /// Format a panel title with the command it belongs to.
    pub fn format_panel_title(&self, title: &str, command: &str) -> String {
        format!(
            "{} {}",
            self.header.apply_to(title),
            self.command.apply_to(command)
        )
    }
}

/// Check if colors should be enabled.
pub fn should_use_colors() -> bool {
    // Check NO_COLOR env var (https://no-color.org/)
    if std::env::var("NO_COLOR").is_ok() {
        return false;
    }

    // Check if stdout is a TTY
    console::Term::stdout().is_term()
}
