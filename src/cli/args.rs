//! CLI argument definitions.
//!
//! This module defines all CLI arguments using clap's derive macros.
//! The main entry point is the [`Cli`] struct.

use clap::Parser;
use std::path::PathBuf;

use crate::ui::OutputMode;

/// hybridshell - Interactive shell with live output and smart completion.
#[derive(Debug, Parser)]
#[command(name = "hybridshell")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to config file (overrides ~/.hybridshell/config.yml)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Interpreter used for `<shell> -c` invocations
    #[arg(long)]
    pub shell: Option<PathBuf>,

    /// Run a single command and exit
    #[arg(short = 'c', long = "command", value_name = "COMMAND")]
    pub command: Option<String>,

    /// Offer dot-files in path completion
    #[arg(long)]
    pub show_hidden: bool,

    /// Show verbose output
    #[arg(short, long, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Minimal output
    #[arg(short, long)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,
}

impl Cli {
    /// Output mode selected by `--quiet` / `--verbose`.
    pub fn output_mode(&self) -> OutputMode {
        OutputMode::from_flags(self.quiet, self.verbose)
    }
}
