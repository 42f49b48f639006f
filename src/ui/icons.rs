//! File-kind icons for directory listings.

use std::fs;
use std::path::Path;

use super::theme::ShellTheme;
use crate::completion::metadata::extension_label;

/// Broad kind of a listed entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileKind {
    Directory,
    Symlink,
    Executable,
    Code,
    Document,
    Config,
    Image,
    Archive,
    Media,
    File,
}

impl FileKind {
    /// Icon shown in the listing's type column.
    pub fn icon(self) -> &'static str {
        match self {
            Self::Directory => "📁",
            Self::Symlink => "🔗",
            Self::Executable => "⚙",
            Self::Code => "📝",
            Self::Document => "📄",
            Self::Config => "🔧",
            Self::Image => "🖼",
            Self::Archive => "📦",
            Self::Media => "🎵",
            Self::File => "·",
        }
    }

    /// Name styled for this kind. Dot-files are dimmed.
    pub fn styled_name(self, theme: &ShellTheme, name: &str) -> String {
        if name.starts_with('.') {
            return theme.dim.apply_to(name).to_string();
        }
        let style = match self {
            Self::Directory => &theme.prompt_path,
            Self::Symlink => &theme.info,
            Self::Executable => &theme.success,
            Self::Archive => &theme.stderr,
            _ => &theme.highlight,
        };
        style.apply_to(name).to_string()
    }

    /// Kind from a file name's extension.
    pub fn from_name(name: &str) -> Self {
        let ext = match name.rsplit_once('.') {
            Some((stem, ext)) if !stem.is_empty() => ext,
            _ => return Self::File,
        };
        match extension_label(ext) {
            "Python" | "JavaScript" | "TypeScript" | "Rust" | "Go" | "HTML" | "CSS"
            | "Shell Script" | "Bash Script" | "Zsh Script" | "Fish Script" => Self::Code,
            "Markdown" | "Text" | "Log" | "PDF" | "Word Doc" | "Excel" => Self::Document,
            "JSON" | "XML" | "YAML" | "TOML" | "Config" => Self::Config,
            label if label.ends_with("Image") => Self::Image,
            label if label.ends_with("Archive") => Self::Archive,
            label if label.ends_with("Audio") || label.ends_with("Video") => Self::Media,
            _ => Self::File,
        }
    }

    /// Kind from an `ls -l` permission string.
    pub fn from_permissions(permissions: &str, name: &str) -> Self {
        if permissions.starts_with('d') {
            Self::Directory
        } else if permissions.starts_with('l') {
            Self::Symlink
        } else if permissions.contains('x') {
            Self::Executable
        } else {
            Self::from_name(name)
        }
    }

    /// Kind of the entry at `path`, falling back to the name.
    pub fn from_path(path: &Path, name: &str) -> Self {
        let Ok(meta) = fs::metadata(path) else {
            return Self::from_name(name);
        };
        if meta.is_dir() {
            return Self::Directory;
        }
        if fs::symlink_metadata(path).is_ok_and(|m| m.file_type().is_symlink()) {
            return Self::Symlink;
        }
        if is_executable(&meta) {
            return Self::Executable;
        }
        Self::from_name(name)
    }
}

#[cfg(unix)]
fn is_executable(meta: &fs::Metadata) -> bool {
    use std::os::unix::fs::PermissionsExt;
    meta.permissions().mode() & 0o111 != 0
}

#[cfg(not(unix))]
fn is_executable(_meta: &fs::Metadata) -> bool {
    false
}
