//! Command classification, process execution and environment handling.
//!
//! [`ShellExecutor`] is the entry point; the other modules are the
//! pieces it composes:
//!
//! - [`classify`] maps input text to an [`ExecutionPlan`]
//! - [`process`] spawns captured, streaming and passthrough children
//! - [`env`] snapshots, diffs and edits the process environment
//! - [`env_commands`] implements the `!name` status commands

pub mod classify;
pub mod env;
pub mod env_commands;
pub mod executor;
pub mod platform;
pub mod process;
pub mod signals;
pub mod streaming;

pub use classify::{Builtin, CommandClassifier, ExecutionPlan, MutationKind};
pub use env::{EnvironmentDiff, EnvironmentSnapshot};
pub use env_commands::EnvCommand;
pub use executor::{Outcome, ShellExecutor};
pub use platform::{ShellInfo, ShellType};
pub use process::{Invocation, ProcessResult, ProcessRunner};
pub use streaming::{StreamEvent, StreamingProcess};
