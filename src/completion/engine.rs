//! Candidate production for the line editor.
//!
//! The first word completes against known commands. Later words ask the
//! completion bridge first and fall back to directory listings.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, OnceLock, PoisonError};

use super::bridge::CompletionProtocolBridge;
use super::scanner::FileSystemScanner;
use super::{commands, fuzzy};
use crate::config::CompletionSettings;
use crate::shell::platform::expand_tilde;

/// A replacement for the partial word under the cursor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    /// Text inserted in place of the partial word.
    pub replacement: String,
    /// Text shown in the candidate list.
    pub display: String,
    pub description: Option<String>,
    /// Characters before the cursor replaced by `replacement`.
    pub replace_chars: usize,
}

impl Candidate {
    pub fn new(replacement: impl Into<String>, replace_chars: usize) -> Self {
        let replacement = replacement.into();
        Self {
            display: replacement.clone(),
            replacement,
            description: None,
            replace_chars,
        }
    }

    pub fn with_display(mut self, display: impl Into<String>) -> Self {
        self.display = display.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// What the cursor is completing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionKind {
    Command,
    Path,
}

/// The input before the cursor, broken down for completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionContext {
    pub kind: CompletionKind,
    pub command: String,
    pub args: Vec<String>,
    /// Partial word under the cursor; empty after a space.
    pub current_arg: String,
    /// Directory whose entries are offered.
    pub target_dir: PathBuf,
}

/// Break `text` (everything before the cursor) into a completion context.
///
/// A single word with no trailing space completes a command; anything
/// else completes a path. When the partial word contains a separator and
/// its directory part exists, that directory becomes the target.
pub fn parse_input(text: &str, cwd: &Path) -> CompletionContext {
    let parts: Vec<&str> = text.split_whitespace().collect();
    let Some((&command, args)) = parts.split_first() else {
        return CompletionContext {
            kind: CompletionKind::Command,
            command: String::new(),
            args: Vec::new(),
            current_arg: String::new(),
            target_dir: cwd.to_path_buf(),
        };
    };

    let trailing_space = text.ends_with(' ');
    let (kind, current_arg) = if args.is_empty() && !trailing_space {
        (CompletionKind::Command, command)
    } else if trailing_space {
        (CompletionKind::Path, "")
    } else {
        (CompletionKind::Path, args.last().copied().unwrap_or(""))
    };

    let mut target_dir = cwd.to_path_buf();
    if let Some((dir_part, _)) = split_path_arg(current_arg) {
        if !dir_part.is_empty() {
            let candidate = cwd.join(expand_tilde(dir_part));
            if candidate.is_dir() {
                target_dir = candidate;
            }
        }
    }

    CompletionContext {
        kind,
        command: command.to_string(),
        args: args.iter().map(|a| a.to_string()).collect(),
        current_arg: current_arg.to_string(),
        target_dir,
    }
}

/// Split a partial path at its last separator into directory and file
/// parts. `None` when there is no separator.
fn split_path_arg(arg: &str) -> Option<(&str, &str)> {
    let idx = arg.rfind(['/', '\\'])?;
    let head = &arg[..=idx];
    let trimmed = head.trim_end_matches(['/', '\\']);
    let dir_part = if trimmed.is_empty() { head } else { trimmed };
    Some((dir_part, &arg[idx + 1..]))
}

/// Shared completion service. Interior locks let the line editor and the
/// executor hold it through an `Arc`.
pub struct CompletionEngine {
    scanner: Mutex<FileSystemScanner>,
    bridge: Mutex<CompletionProtocolBridge>,
    commands: OnceLock<Vec<String>>,
}

impl CompletionEngine {
    pub fn new(settings: &CompletionSettings) -> Self {
        Self {
            scanner: Mutex::new(FileSystemScanner::new(settings.show_hidden)),
            bridge: Mutex::new(CompletionProtocolBridge::new(settings)),
            commands: OnceLock::new(),
        }
    }

    /// Use a fixed command list instead of scanning `PATH`.
    pub fn with_commands(self, commands: Vec<String>) -> Self {
        let _ = self.commands.set(commands);
        self
    }

    /// Known command names, discovered on first use.
    pub fn commands(&self) -> &[String] {
        self.commands.get_or_init(commands::all_commands)
    }

    /// Candidates for `line` with the cursor at byte offset `cursor`.
    pub fn complete(&self, line: &str, cursor: usize, cwd: &Path) -> Vec<Candidate> {
        let mut end = cursor.min(line.len());
        while !line.is_char_boundary(end) {
            end -= 1;
        }
        let text = &line[..end];
        let context = parse_input(text, cwd);

        match context.kind {
            CompletionKind::Command => self.complete_command(&context.current_arg),
            CompletionKind::Path => {
                let from_bridge = lock(&self.bridge).complete(text, end, cwd);
                if !from_bridge.is_empty() {
                    return from_bridge;
                }
                self.complete_path(&context)
            }
        }
    }

    fn complete_command(&self, partial: &str) -> Vec<Candidate> {
        let replace = partial.chars().count();
        fuzzy::rank(self.commands().iter(), partial, |c| c.as_str())
            .into_iter()
            .map(|name| {
                let candidate = Candidate::new(name.as_str(), replace);
                match commands::describe(name) {
                    Some(text) => candidate.with_description(text),
                    None => candidate,
                }
            })
            .collect()
    }

    fn complete_path(&self, context: &CompletionContext) -> Vec<Candidate> {
        let entries =
            lock(&self.scanner).completions_for_command(&context.command, &context.target_dir);

        let query = match split_path_arg(&context.current_arg) {
            Some((_, file_part)) => file_part,
            None => context.current_arg.as_str(),
        };
        let replace = query.chars().count();

        fuzzy::rank(entries, query, |e| e.name.as_str())
            .into_iter()
            .map(|entry| {
                let display = if entry.is_dir {
                    format!("{}/", entry.name)
                } else {
                    entry.name.clone()
                };
                let candidate = Candidate::new(entry.name, replace).with_display(display);
                match entry.meta {
                    Some(meta) => candidate.with_description(meta),
                    None => candidate,
                }
            })
            .collect()
    }

    /// Forget the cached listing for `dir`.
    pub fn invalidate(&self, dir: &Path) {
        lock(&self.scanner).invalidate(dir);
    }

    /// Forget every cached listing.
    pub fn clear_cache(&self) {
        lock(&self.scanner).clear();
    }

    pub fn set_show_hidden(&self, show_hidden: bool) {
        lock(&self.scanner).set_show_hidden(show_hidden);
    }

    /// Whether a listing for `dir` is cached.
    pub fn is_cached(&self, dir: &Path) -> bool {
        lock(&self.scanner).is_cached(dir)
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
