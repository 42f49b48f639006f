//! Help text and usage hints.

/// Shown under the banner of a terminal-owning command.
pub const INTERACTIVE_HINT: &str = "Use Ctrl+C or app's exit command to return to shell";

/// One titled group of help entries.
#[derive(Debug, Clone, Copy)]
pub struct HelpSection {
    pub title: &'static str,
    pub entries: &'static [(&'static str, &'static str)],
}

/// Sections shown by `/help`.
pub const HELP_SECTIONS: &[HelpSection] = &[
    HelpSection {
        title: "Keybindings",
        entries: &[
            ("Tab", "Complete commands, paths and arguments"),
            ("Up/Down", "Browse command history"),
            ("Ctrl+C", "Clear the line or interrupt the running command"),
            ("Ctrl+D", "Exit the shell"),
        ],
    },
    HelpSection {
        title: "Built-in Commands",
        entries: &[
            ("cd [dir]", "Change directory (home when omitted)"),
            ("source <file>", "Run a script and keep its environment changes"),
            ("<venv>/bin/activate", "Activate a Python virtual environment"),
            ("activate <env>", "Activate a conda environment"),
            ("deactivate", "Leave the active virtualenv or conda environment"),
            ("clear", "Clear the screen"),
            ("/help", "Show this help"),
            ("exit", "Exit the shell"),
        ],
    },
    HelpSection {
        title: "Environment Commands",
        entries: &[
            ("!env", "Show current environment status"),
            ("!status", "Show detailed system and environment info"),
            ("!git", "Show git repository information"),
            ("!python", "Show Python environment details"),
        ],
    },
];

/// Help as plain lines, section titles unindented.
pub fn help_lines() -> Vec<String> {
    let mut lines = Vec::new();
    for (i, section) in HELP_SECTIONS.iter().enumerate() {
        if i > 0 {
            lines.push(String::new());
        }
        lines.push(section.title.to_string());
        for (name, description) in section.entries {
            lines.push(format!("  • {} – {}", name, description));
        }
    }
    lines
}
