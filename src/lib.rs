//! hybridshell - An interactive shell front end.
//!
//! Input lines are classified and run the way a terminal user expects:
//! built-ins inside the process, editors and REPLs with the terminal
//! handed over, package managers streamed live, everything else
//! captured and rendered. Tab completion combines command discovery,
//! directory listings and bash's programmable completion.
//!
//! # Modules
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`completion`] - Tab completion engine
//! - [`config`] - Configuration loading
//! - [`context`] - Record of recent shell activity
//! - [`error`] - Error types and result aliases
//! - [`repl`] - Interactive read-eval loop
//! - [`shell`] - Classification, process execution and environment handling
//! - [`ui`] - Panels, prompts, spinners and streaming output
//!
//! # Example
//!
//! ```
//! use hybridshell::config::ShellConfig;
//! use hybridshell::shell::{CommandClassifier, ExecutionPlan};
//!
//! let classifier = CommandClassifier::new(&ShellConfig::default());
//! let plan = classifier.classify("vim notes.txt").unwrap();
//! assert_eq!(plan, ExecutionPlan::PassthroughInteractive("vim notes.txt".to_string()));
//! ```

pub mod cli;
pub mod completion;
pub mod config;
pub mod context;
pub mod error;
pub mod repl;
pub mod shell;
pub mod ui;

pub use error::{Result, ShellError};
