//! Command-name candidates: a fixed common set plus `PATH` executables.

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use crate::shell::platform::path_list_separator;

/// Commands offered even when not found on `PATH`.
pub const BASE_COMMANDS: &[&str] = &[
    "ls", "cd", "pwd", "cat", "less", "more", "head", "tail", "cp", "mv", "rm", "mkdir", "rmdir",
    "chmod", "chown", "find", "grep", "awk", "sed", "sort", "uniq", "wc", "ps", "kill", "jobs",
    "bg", "fg", "top", "htop", "vim", "nano", "code", "git", "python", "pip", "source", "clear",
    "history", "exit", "which", "whereis",
];

/// Short description for well-known commands.
pub fn describe(command: &str) -> Option<&'static str> {
    let text = match command {
        "ls" => "List directory contents",
        "cd" => "Change directory",
        "pwd" => "Print working directory",
        "cat" => "Display file contents",
        "less" | "more" => "View file with paging",
        "head" => "Display first lines of file",
        "tail" => "Display last lines of file",
        "cp" => "Copy files or directories",
        "mv" => "Move/rename files or directories",
        "rm" => "Remove files or directories",
        "mkdir" => "Create directory",
        "rmdir" => "Remove empty directory",
        "chmod" => "Change file permissions",
        "chown" => "Change file ownership",
        "find" => "Search for files and directories",
        "grep" => "Search text patterns in files",
        "vim" => "Vi/Vim text editor",
        "nano" => "Nano text editor",
        "code" => "VS Code editor",
        "git" => "Git version control",
        "python" => "Python interpreter",
        "pip" => "Python package installer",
        "source" => "Run a script in the current environment",
        "exit" => "Exit the shell",
        _ => return None,
    };
    Some(text)
}

/// Executables found in the directories of `path_var`.
pub fn path_executables(path_var: &str) -> BTreeSet<String> {
    let mut found = BTreeSet::new();
    for dir in path_var.split(path_list_separator()).filter(|d| !d.is_empty()) {
        let Ok(entries) = fs::read_dir(dir) else {
            continue;
        };
        for entry in entries.flatten() {
            let name = entry.file_name().to_string_lossy().into_owned();
            if !name.is_empty() && !found.contains(&name) && is_executable(&entry.path()) {
                found.insert(name);
            }
        }
    }
    found
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    fs::metadata(path).is_ok_and(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    fs::metadata(path).is_ok_and(|m| m.is_file())
}

/// Sorted, deduplicated union of [`BASE_COMMANDS`] and `PATH` executables.
pub fn all_commands() -> Vec<String> {
    let path = std::env::var("PATH").unwrap_or_default();
    let mut commands = path_executables(&path);
    commands.extend(BASE_COMMANDS.iter().map(|c| c.to_string()));
    commands.into_iter().collect()
}
