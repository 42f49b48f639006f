//! Record of recent shell activity.
//!
//! Every executed command leaves one entry: what ran, what it printed
//! (or the message shown in its place), and where it ran. Only the most
//! recent entries are kept.

use std::collections::VecDeque;
use std::path::PathBuf;

use chrono::{DateTime, Local};

use crate::ui::output::truncate;
use crate::ui::Table;

/// Sink for per-command records.
pub trait ContextRecorder {
    /// Record `output` as the result of `command`.
    fn add_shell_context(&mut self, command: &str, output: &str);

    /// Number of records currently held.
    fn entry_count(&self) -> usize;
}

/// One recorded command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextEntry {
    pub timestamp: DateTime<Local>,
    pub command: String,
    pub output: String,
    pub cwd: PathBuf,
}

/// In-memory ring of the most recent [`ContextEntry`] records.
#[derive(Debug, Clone)]
pub struct ShellContext {
    entries: VecDeque<ContextEntry>,
    capacity: usize,
}

impl ShellContext {
    /// Keep at most `capacity` entries; zero keeps nothing.
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Entries, oldest first.
    pub fn entries(&self) -> impl Iterator<Item = &ContextEntry> {
        self.entries.iter()
    }

    pub fn latest(&self) -> Option<&ContextEntry> {
        self.entries.back()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Time / Command / Directory / Output Preview table.
    pub fn to_table(&self) -> Table {
        let mut table = Table::new(vec!["Time", "Command", "Directory", "Output Preview"]);
        for entry in &self.entries {
            let dir = entry
                .cwd
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| entry.cwd.display().to_string());
            let preview = truncate(&entry.output, 53).replace('\n', " ");
            table.add_row(vec![
                entry.timestamp.format("%H:%M:%S").to_string(),
                entry.command.clone(),
                dir,
                preview,
            ]);
        }
        table
    }
}

impl Default for ShellContext {
    fn default() -> Self {
        Self::new(10)
    }
}

impl ContextRecorder for ShellContext {
    fn add_shell_context(&mut self, command: &str, output: &str) {
        if self.capacity == 0 {
            return;
        }
        let cwd = std::env::current_dir().unwrap_or_default();
        tracing::debug!("Recording context for {:?}", command);
        self.entries.push_back(ContextEntry {
            timestamp: Local::now(),
            command: command.to_string(),
            output: output.to_string(),
            cwd,
        });
        while self.entries.len() > self.capacity {
            self.entries.pop_front();
        }
    }

    fn entry_count(&self) -> usize {
        self.entries.len()
    }
}
