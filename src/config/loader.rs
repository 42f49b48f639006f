//! Configuration file discovery and loading.

use crate::config::schema::ShellConfig;
use crate::error::{Result, ShellError};
use std::fs;
use std::path::{Path, PathBuf};

/// Environment variable that overrides the interpreter.
pub const SHELL_OVERRIDE_VAR: &str = "HYBRIDSHELL_SHELL";

/// Directory holding configuration and history: `~/.hybridshell`.
pub fn config_dir() -> Option<PathBuf> {
    Some(dirs::home_dir()?.join(".hybridshell"))
}

/// Find the user's config at `~/.hybridshell/config.yml`.
fn find_user_config() -> Option<PathBuf> {
    let path = config_dir()?.join("config.yml");
    if path.exists() {
        Some(path)
    } else {
        None
    }
}

/// Load a single config file.
///
/// # Errors
///
/// Returns `ConfigNotFound` if the file doesn't exist.
/// Returns `ConfigParseError` if the YAML is invalid.
pub fn load_config_file(path: &Path) -> Result<ShellConfig> {
    let content = fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            ShellError::ConfigNotFound {
                path: path.to_path_buf(),
            }
        } else {
            ShellError::Io(e)
        }
    })?;

    parse_config(&content, path)
}

/// Parse YAML content into `ShellConfig`.
///
/// An empty document yields the defaults.
pub fn parse_config(content: &str, source_path: &Path) -> Result<ShellConfig> {
    if content.trim().is_empty() {
        return Ok(ShellConfig::default());
    }
    serde_yaml::from_str(content).map_err(|e| ShellError::ConfigParseError {
        path: source_path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Load config with optional path override.
///
/// An explicit path must exist. Without one, the user config is used
/// when present and the built-in defaults otherwise.
pub fn load_config(config_override: Option<&Path>) -> Result<ShellConfig> {
    if let Some(path) = config_override {
        return load_config_file(path);
    }
    match find_user_config() {
        Some(path) => {
            tracing::debug!("Loading config from {}", path.display());
            load_config_file(&path)
        }
        None => Ok(ShellConfig::default()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn explicit_missing_file_is_an_error() {
        let temp = TempDir::new().unwrap();
        let missing = temp.path().join("nope.yml");
        let err = load_config(Some(&missing)).unwrap_err();
        assert!(matches!(err, ShellError::ConfigNotFound { .. }));
    }

    #[test]
    fn explicit_file_is_loaded() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.yml");
        fs::write(&path, "shell: /bin/zsh\nmax_shell_context: 3\n").unwrap();

        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.shell, Some(PathBuf::from("/bin/zsh")));
        assert_eq!(config.max_shell_context, 3);
    }

    #[test]
    fn invalid_yaml_reports_path() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.yml");
        fs::write(&path, "interactive_commands: {not: [a list").unwrap();

        let err = load_config_file(&path).unwrap_err();
        match err {
            ShellError::ConfigParseError { path: p, .. } => assert_eq!(p, path),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn empty_file_yields_defaults() {
        let config = parse_config("   \n", Path::new("config.yml")).unwrap();
        assert_eq!(config.max_shell_context, 10);
    }
}
