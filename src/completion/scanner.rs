//! Directory listing cache for path completion.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

use super::metadata;

/// Commands whose operand must be a directory.
const DIRECTORY_COMMANDS: &[&str] = &["cd", "pushd", "popd", "rmdir"];

/// One scanned directory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirectoryListing {
    pub files: BTreeSet<String>,
    pub directories: BTreeSet<String>,
    /// Name to formatted metadata string.
    pub metadata: BTreeMap<String, String>,
}

/// A path completion candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathEntry {
    pub name: String,
    pub is_dir: bool,
    pub meta: Option<String>,
}

struct CachedListing {
    modified: Option<SystemTime>,
    listing: Arc<DirectoryListing>,
}

/// Scans directories and caches each listing until the directory's
/// modification time changes or it is invalidated explicitly.
pub struct FileSystemScanner {
    cache: HashMap<PathBuf, CachedListing>,
    show_hidden: bool,
}

impl FileSystemScanner {
    pub fn new(show_hidden: bool) -> Self {
        Self {
            cache: HashMap::new(),
            show_hidden,
        }
    }

    /// Toggle dot-files. Clears the cache when the setting changes.
    pub fn set_show_hidden(&mut self, show_hidden: bool) {
        if self.show_hidden != show_hidden {
            self.show_hidden = show_hidden;
            self.cache.clear();
        }
    }

    /// List `dir`, serving the cached listing while its mtime is unchanged.
    ///
    /// Unreadable directories yield an empty listing.
    pub fn scan(&mut self, dir: &Path) -> Arc<DirectoryListing> {
        let modified = fs::metadata(dir).and_then(|m| m.modified()).ok();

        if let Some(cached) = self.cache.get(dir) {
            if cached.modified == modified {
                tracing::debug!("Directory cache hit: {}", dir.display());
                return Arc::clone(&cached.listing);
            }
        }

        tracing::debug!("Scanning directory: {}", dir.display());
        let listing = Arc::new(self.read_directory(dir));
        self.cache.insert(
            dir.to_path_buf(),
            CachedListing {
                modified,
                listing: Arc::clone(&listing),
            },
        );
        listing
    }

    fn read_directory(&self, dir: &Path) -> DirectoryListing {
        let mut listing = DirectoryListing::default();
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::debug!("Cannot read {}: {}", dir.display(), e);
                return listing;
            }
        };

        for entry in entries.flatten() {
            let name = entry.file_name().to_string_lossy().into_owned();
            if !self.show_hidden && name.starts_with('.') {
                continue;
            }
            let path = entry.path();
            listing
                .metadata
                .insert(name.clone(), metadata::describe(&path));

            // Follows symlinks, so a link to a directory lists as one.
            match fs::metadata(&path) {
                Ok(meta) if meta.is_dir() => {
                    listing.directories.insert(name);
                }
                Ok(meta) if meta.is_file() => {
                    listing.files.insert(name);
                }
                _ => {}
            }
        }
        listing
    }

    /// Candidates for an operand of `command` inside `dir`.
    ///
    /// Directory-only commands see directories; everything else sees
    /// files followed by directories.
    pub fn completions_for_command(&mut self, command: &str, dir: &Path) -> Vec<PathEntry> {
        let listing = self.scan(dir);
        let entry = |name: &String, is_dir: bool| PathEntry {
            name: name.clone(),
            is_dir,
            meta: listing.metadata.get(name).cloned(),
        };

        let directories = listing.directories.iter().map(|n| entry(n, true));
        if DIRECTORY_COMMANDS.contains(&command) {
            return directories.collect();
        }
        listing
            .files
            .iter()
            .map(|n| entry(n, false))
            .chain(directories)
            .collect()
    }

    /// Drop the cached listing for `dir`.
    pub fn invalidate(&mut self, dir: &Path) {
        if self.cache.remove(dir).is_some() {
            tracing::debug!("Invalidated directory cache: {}", dir.display());
        }
    }

    /// Drop every cached listing.
    pub fn clear(&mut self) {
        self.cache.clear();
    }

    /// Whether a listing for `dir` is cached.
    pub fn is_cached(&self, dir: &Path) -> bool {
        self.cache.contains_key(dir)
    }
}

impl Default for FileSystemScanner {
    fn default() -> Self {
        Self::new(false)
    }
}
