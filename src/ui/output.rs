//! Output mode and environment-change formatting.

use crate::shell::env::{EnvironmentDiff, IMPORTANT_VARS};

/// Output verbosity mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMode {
    /// Status lines plus timing and debug details.
    Verbose,
    /// Status lines and command output.
    #[default]
    Normal,
    /// Command output and errors only.
    Quiet,
}

impl OutputMode {
    /// Pick a mode from the `--quiet` / `--verbose` flags.
    pub fn from_flags(quiet: bool, verbose: bool) -> Self {
        if quiet {
            Self::Quiet
        } else if verbose {
            Self::Verbose
        } else {
            Self::Normal
        }
    }

    /// Check if this mode shows status messages.
    pub fn shows_status(&self) -> bool {
        matches!(self, Self::Verbose | Self::Normal)
    }

    /// Check if this mode shows progress spinners.
    pub fn shows_spinners(&self) -> bool {
        matches!(self, Self::Verbose | Self::Normal)
    }

    /// Check if this mode shows command durations.
    pub fn shows_timing(&self) -> bool {
        matches!(self, Self::Verbose)
    }
}

/// New variables listed before the rest are summarised.
const NEW_VAR_LIMIT: usize = 5;
/// Changed variables listed before the rest are summarised.
const CHANGED_VAR_LIMIT: usize = 3;

/// One line of an environment change report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnvLine {
    Header(String),
    Added(String),
    Changed(String),
    More(String),
}

impl EnvLine {
    pub fn text(&self) -> &str {
        match self {
            EnvLine::Header(s) | EnvLine::Added(s) | EnvLine::Changed(s) | EnvLine::More(s) => s,
        }
    }
}

/// Cut `value` to `max` characters, ending in `...` when shortened.
pub fn truncate(value: &str, max: usize) -> String {
    if value.chars().count() <= max {
        return value.to_string();
    }
    let kept: String = value.chars().take(max.saturating_sub(3)).collect();
    format!("{kept}...")
}

/// Report lines for a diff.
///
/// Important variables are always listed; others fill the remaining
/// slots up to the per-section limit.
pub fn env_change_lines(diff: &EnvironmentDiff) -> Vec<EnvLine> {
    let mut lines = Vec::new();

    if !diff.added.is_empty() {
        lines.push(EnvLine::Header("New environment variables:".to_string()));
        let mut shown = 0;
        for (key, value) in &diff.added {
            if IMPORTANT_VARS.contains(&key.as_str()) || shown < NEW_VAR_LIMIT {
                lines.push(EnvLine::Added(format!("  +{}={}", key, truncate(value, 60))));
                shown += 1;
            }
        }
        if diff.added.len() > shown {
            lines.push(EnvLine::More(format!(
                "  ... and {} more new variables",
                diff.added.len() - shown
            )));
        }
    }

    if !diff.changed.is_empty() {
        lines.push(EnvLine::Header(
            "Changed environment variables:".to_string(),
        ));
        let mut shown = 0;
        for (key, change) in &diff.changed {
            if IMPORTANT_VARS.contains(&key.as_str()) || shown < CHANGED_VAR_LIMIT {
                lines.push(EnvLine::Changed(format!(
                    "  ~{}: {} → {}",
                    key,
                    truncate(&change.old, 30),
                    truncate(&change.new, 30)
                )));
                shown += 1;
            }
        }
        if diff.changed.len() > shown {
            lines.push(EnvLine::More(format!(
                "  ... and {} more changed variables",
                diff.changed.len() - shown
            )));
        }
    }

    lines
}
