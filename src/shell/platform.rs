//! Platform-specific interpreter detection.

use std::path::{Path, PathBuf};

use crate::config::{ShellConfig, SHELL_OVERRIDE_VAR};

/// The interpreter used for `<shell> -c <text>` invocations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellInfo {
    /// Interpreter executable path.
    pub executable: PathBuf,

    /// Interpreter family.
    pub kind: ShellType,
}

/// Known shell types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShellType {
    Bash,
    Zsh,
    Fish,
    Sh,
    PowerShell,
    Cmd,
    Unknown,
}

impl ShellType {
    /// Parse shell type from executable name.
    pub fn from_executable(exe: &str) -> Self {
        let name = Path::new(exe)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("")
            .to_lowercase();

        match name.as_str() {
            "bash" => ShellType::Bash,
            "zsh" => ShellType::Zsh,
            "fish" => ShellType::Fish,
            "sh" | "dash" => ShellType::Sh,
            "powershell" | "pwsh" => ShellType::PowerShell,
            "cmd" => ShellType::Cmd,
            _ => ShellType::Unknown,
        }
    }

    /// Flag that makes the interpreter run its next argument as a script.
    pub fn command_flag(&self) -> &'static str {
        match self {
            ShellType::Cmd => "/C",
            ShellType::PowerShell => "-Command",
            _ => "-c",
        }
    }
}

impl ShellInfo {
    /// Build from an executable path.
    pub fn new(executable: impl Into<PathBuf>) -> Self {
        let executable = executable.into();
        let kind = ShellType::from_executable(&executable.to_string_lossy());
        Self { executable, kind }
    }

    /// Resolve the interpreter.
    ///
    /// Order: explicit override, `HYBRIDSHELL_SHELL`, config `shell`,
    /// then `SHELL` (Unix) or `COMSPEC` (Windows), then the platform default.
    pub fn resolve(cli_override: Option<&Path>, config: &ShellConfig) -> Self {
        if let Some(path) = cli_override {
            return Self::new(path);
        }
        if let Some(path) = std::env::var_os(SHELL_OVERRIDE_VAR).filter(|v| !v.is_empty()) {
            return Self::new(PathBuf::from(path));
        }
        if let Some(path) = &config.shell {
            return Self::new(path.clone());
        }
        Self::new(get_shell_executable())
    }

    /// Argument vector for running `script` through this interpreter.
    pub fn invocation(&self, script: &str) -> Vec<String> {
        vec![
            self.executable.to_string_lossy().into_owned(),
            self.kind.command_flag().to_string(),
            script.to_string(),
        ]
    }

    /// Short name for display, e.g. `zsh`.
    pub fn name(&self) -> String {
        self.executable
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.executable.display().to_string())
    }
}

fn get_shell_executable() -> PathBuf {
    if cfg!(target_os = "windows") {
        std::env::var("COMSPEC")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("cmd.exe"))
    } else {
        std::env::var("SHELL")
            .ok()
            .filter(|s| !s.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("/bin/bash"))
    }
}

/// Whether live streaming of child output is available.
///
/// Streaming uses a reader thread per child, so every platform with
/// threads and anonymous pipes qualifies.
pub fn supports_streaming() -> bool {
    cfg!(any(unix, windows))
}

/// Whether `sudo -S` credential injection is available.
pub fn supports_sudo() -> bool {
    cfg!(unix)
}

/// Expand a leading `~` to the home directory.
pub fn expand_tilde(path: &str) -> PathBuf {
    if path == "~" {
        return dirs::home_dir().unwrap_or_else(|| PathBuf::from(path));
    }
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}

/// Separator between `PATH` entries.
pub fn path_list_separator() -> char {
    if cfg!(windows) {
        ';'
    } else {
        ':'
    }
}
