//! Configuration schema definitions.
//!
//! This module contains the struct definitions that map to the YAML
//! configuration file format. Every field has a default so a partial
//! file (or no file at all) yields a usable configuration.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::PathBuf;

/// Root configuration structure for `config.yml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ShellConfig {
    /// Interpreter used for `<shell> -c <text>` invocations.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shell: Option<PathBuf>,

    /// Commands that take over the terminal.
    pub interactive_commands: BTreeSet<String>,

    /// Interactive commands whose output is streamed live instead.
    pub streaming_commands: BTreeSet<String>,

    /// Commands whose output is rendered as a directory listing table.
    pub ls_commands: Vec<String>,

    /// Commands after which the directory cache is invalidated.
    pub file_mutating_commands: BTreeSet<String>,

    /// Number of shell context records kept for the assistant.
    pub max_shell_context: usize,

    /// Tab completion settings.
    pub completion: CompletionSettings,
}

/// Tab completion settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CompletionSettings {
    /// Interpreter that hosts programmable completion functions.
    pub interpreter: String,

    /// System-wide completion bootstrap scripts, sourced before every query.
    pub bootstrap_scripts: Vec<PathBuf>,

    /// Directories searched for per-command completion scripts.
    pub script_dirs: Vec<PathBuf>,

    /// Offer dot-files as path candidates.
    pub show_hidden: bool,

    /// Budget for `complete -p` discovery runs.
    pub discovery_timeout_ms: u64,

    /// Budget for invoking a completion function.
    pub execution_timeout_ms: u64,
}

fn set_of(items: &[&str]) -> BTreeSet<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            shell: None,
            interactive_commands: set_of(&[
                "nano", "vim", "vi", "emacs", "mc", "htop", "top", "fzf", "less", "more", "man",
                "tmux", "screen", "python3", "python", "node", "irb", "psql", "mysql", "nvim",
                "nu", "xonsh", "apt", "sudo", "sqlite3", "redis-cli", "mongo", "bash", "zsh",
                "fish",
            ]),
            streaming_commands: set_of(&[
                "apt", "apt-get", "pip", "pip3", "npm", "pnpm", "yarn", "poetry", "composer",
                "cargo", "brew", "bundle", "go", "apk",
            ]),
            ls_commands: vec!["ls".into(), "la".into(), "lsd".into(), "ll".into()],
            file_mutating_commands: set_of(&["touch", "mkdir", "rm", "rmdir", "mv", "cp", "ln"]),
            max_shell_context: 10,
            completion: CompletionSettings::default(),
        }
    }
}

impl Default for CompletionSettings {
    fn default() -> Self {
        Self {
            interpreter: "bash".to_string(),
            bootstrap_scripts: vec![
                PathBuf::from("/usr/share/bash-completion/bash_completion"),
                PathBuf::from("/etc/bash_completion"),
            ],
            script_dirs: vec![
                PathBuf::from("/usr/share/bash-completion/completions"),
                PathBuf::from("/etc/bash_completion.d"),
            ],
            show_hidden: false,
            discovery_timeout_ms: 1500,
            execution_timeout_ms: 1000,
        }
    }
}

impl ShellConfig {
    /// Check whether a command name takes over the terminal.
    pub fn is_interactive(&self, name: &str) -> bool {
        self.interactive_commands.contains(name)
    }

    /// Check whether a command name should be streamed.
    pub fn is_streaming(&self, name: &str) -> bool {
        self.streaming_commands.contains(name)
    }

    /// Check whether a command name changes directory contents.
    pub fn is_file_mutating(&self, name: &str) -> bool {
        self.file_mutating_commands.contains(name)
    }

    /// Check whether output of a command name gets the listing table.
    pub fn is_ls_command(&self, name: &str) -> bool {
        self.ls_commands.iter().any(|c| c == name)
    }
}
