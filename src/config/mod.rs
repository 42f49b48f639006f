//! Configuration loading.
//!
//! - Schema definitions in [`schema`]
//! - File discovery and loading in [`loader`]
//!
//! # Example
//!
//! ```
//! use hybridshell::config::{parse_config, ShellConfig};
//! use std::path::Path;
//!
//! let config = parse_config("ls_commands: [ls, exa]", Path::new("config.yml")).unwrap();
//! assert!(config.is_ls_command("exa"));
//! assert!(config.is_streaming("npm"));
//! ```
//!
//! # Configuration File Location
//!
//! `--config <path>` when given, otherwise `~/.hybridshell/config.yml`
//! if it exists, otherwise built-in defaults.

pub mod loader;
pub mod schema;

pub use loader::{config_dir, load_config, load_config_file, parse_config, SHELL_OVERRIDE_VAR};
pub use schema::{CompletionSettings, ShellConfig};
