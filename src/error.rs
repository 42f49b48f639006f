//! Error types for shell operations.
//!
//! This module defines [`ShellError`], the primary error type used throughout
//! the engine, and a [`Result`] type alias for convenience.
//!
//! # Error Handling Strategy
//!
//! - Use `ShellError` for failures that are reported to the user
//! - Use `anyhow::Error` (via `ShellError::Other`) for unexpected errors
//! - Completion failures never surface here; they degrade to zero candidates
//! - Display strings are the exact messages shown in the error panel

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for shell operations.
#[derive(Debug, Error)]
pub enum ShellError {
    /// A child process could not be started.
    #[error("{command}: failed to start: {message}")]
    SpawnFailed { command: String, message: String },

    /// An environment-mutating script ran but exited unsuccessfully.
    #[error("{command}: {message}")]
    ScriptFailed { command: String, message: String },

    /// `cd` target could not be entered.
    #[error("cd: {path}: {source}")]
    ChangeDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A built-in was invoked without its required operand.
    #[error("{command}: missing file operand")]
    MissingOperand { command: String },

    /// A script passed to `source` or an activate script does not exist.
    #[error("{command}: {path}: No such file or directory")]
    FileNotFound { command: String, path: PathBuf },

    /// `activate <env>` without a conda installation.
    #[error("activate: conda not found, cannot activate environment '{env}'")]
    CondaNotFound { env: String },

    /// `deactivate` with neither a virtualenv nor a conda env active.
    #[error("deactivate: No virtual environment currently activated")]
    NoActiveEnvironment,

    /// `sudo` given without a command to run.
    #[error("sudo requires a command to execute.")]
    SudoWithoutCommand,

    /// `!name` where `name` is not a known environment command.
    #[error("Unknown environment command: {name}")]
    UnknownEnvironmentCommand { name: String },

    /// Configuration file not found at an explicitly requested location.
    #[error("Configuration not found: {path}")]
    ConfigNotFound { path: PathBuf },

    /// Failed to parse configuration file.
    #[error("Failed to parse config at {path}: {message}")]
    ConfigParseError { path: PathBuf, message: String },

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic wrapped error for anyhow interop.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias for shell operations.
pub type Result<T> = std::result::Result<T, ShellError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spawn_failed_displays_command_and_message() {
        let err = ShellError::SpawnFailed {
            command: "nosuchtool --flag".into(),
            message: "No such file or directory".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("nosuchtool --flag"));
        assert!(msg.contains("No such file or directory"));
    }

    #[test]
    fn change_directory_displays_path() {
        let err = ShellError::ChangeDirectory {
            path: PathBuf::from("/does/not/exist"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
        };
        let msg = err.to_string();
        assert!(msg.starts_with("cd: "));
        assert!(msg.contains("/does/not/exist"));
    }

    #[test]
    fn missing_operand_matches_shell_wording() {
        let err = ShellError::MissingOperand {
            command: "source".into(),
        };
        assert_eq!(err.to_string(), "source: missing file operand");
    }

    #[test]
    fn file_not_found_matches_shell_wording() {
        let err = ShellError::FileNotFound {
            command: "source".into(),
            path: PathBuf::from("env.sh"),
        };
        assert_eq!(err.to_string(), "source: env.sh: No such file or directory");
    }

    #[test]
    fn no_active_environment_message() {
        assert_eq!(
            ShellError::NoActiveEnvironment.to_string(),
            "deactivate: No virtual environment currently activated"
        );
    }

    #[test]
    fn conda_not_found_names_environment() {
        let err = ShellError::CondaNotFound { env: "ml".into() };
        assert!(err.to_string().contains("'ml'"));
    }

    #[test]
    fn unknown_environment_command_names_command() {
        let err = ShellError::UnknownEnvironmentCommand {
            name: "docker".into(),
        };
        assert_eq!(err.to_string(), "Unknown environment command: docker");
    }

    #[test]
    fn io_error_converts_from_std() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file missing");
        let err: ShellError = io_err.into();
        assert!(matches!(err, ShellError::Io(_)));
    }

    #[test]
    fn result_type_alias_works() {
        fn returns_error() -> Result<()> {
            Err(ShellError::SudoWithoutCommand)
        }
        assert!(returns_error().is_err());
    }
}
