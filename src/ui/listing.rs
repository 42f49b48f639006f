//! Directory listing tables built from `ls` output.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use chrono::{DateTime, Local};
use regex::Regex;

use super::icons::FileKind;
use super::table::Table;
use super::theme::ShellTheme;
use crate::completion::metadata::format_size;

/// `ls -l` permission column, e.g. `drwxr-xr-x`.
static PERMISSIONS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[-dlbcsp][rwx-]{9}$").expect("constant regex pattern is valid")
});

/// Lines inspected when guessing whether output is a long listing.
const SAMPLE_LINES: usize = 5;

/// Whether `lines` look like `ls -l` output.
///
/// True when the command has `-l`, or when over half of the listed
/// entries in the first few lines carry a permission column.
pub fn is_detailed_listing(lines: &[&str], command: &str) -> bool {
    if command.contains("-l") {
        return true;
    }

    let detailed = lines
        .iter()
        .take(SAMPLE_LINES)
        .map(|l| l.trim())
        .filter(|l| !l.is_empty() && !l.starts_with("total"))
        .filter(|l| {
            let parts: Vec<&str> = l.split_whitespace().collect();
            parts.len() >= 8 && PERMISSIONS.is_match(parts[0])
        })
        .count();

    let entries = lines
        .iter()
        .filter(|l| !l.trim().is_empty() && !l.starts_with("total"))
        .count();
    detailed > 0 && detailed as f64 / entries.max(1) as f64 > 0.5
}

/// Directory an `ls` command lists: its first non-flag operand, or `cwd`.
pub fn target_directory(command: &str, cwd: &Path) -> PathBuf {
    command
        .split_whitespace()
        .skip(1)
        .find(|part| !part.starts_with('-'))
        .map(|part| cwd.join(part))
        .unwrap_or_else(|| cwd.to_path_buf())
}

/// Build the listing table for `output` of `command` run in `cwd`.
pub fn build_listing_table(command: &str, output: &str, cwd: &Path, theme: &ShellTheme) -> Table {
    let lines: Vec<&str> = output.trim().lines().collect();
    let detailed = is_detailed_listing(&lines, command);
    let dir = target_directory(command, cwd);

    let mut table = if detailed {
        Table::new(vec![
            "Permissions",
            "Links",
            "Owner",
            "Group",
            "Size",
            "Date",
            "Name",
        ])
        .align_right(1)
        .align_right(4)
    } else {
        Table::new(vec!["Type", "Name", "Size", "Modified"]).align_right(2)
    };

    for line in lines.iter().map(|l| l.trim()) {
        if line.is_empty() || line.starts_with("total ") {
            continue;
        }
        if detailed {
            add_detailed_row(&mut table, line, theme);
        } else {
            add_simple_row(&mut table, line, &dir, theme);
        }
    }
    table
}

fn add_detailed_row(table: &mut Table, line: &str, theme: &ShellTheme) {
    let parts: Vec<&str> = line.split_whitespace().collect();
    if parts.len() < 8 {
        return;
    }

    let (date, name) = if parts.len() >= 9 {
        (parts[5..8].join(" "), parts[8..].join(" "))
    } else {
        (parts[5..7].join(" "), parts[7..].join(" "))
    };
    let size = match parts[4].parse::<u64>() {
        Ok(bytes) => format_size(bytes),
        Err(_) => parts[4].to_string(),
    };
    let kind = FileKind::from_permissions(parts[0], &name);

    table.add_row(vec![
        theme.dim.apply_to(parts[0]).to_string(),
        theme.dim.apply_to(parts[1]).to_string(),
        theme.dim.apply_to(parts[2]).to_string(),
        theme.dim.apply_to(parts[3]).to_string(),
        theme.info.apply_to(size).to_string(),
        theme.changed.apply_to(date).to_string(),
        format!("{} {}", kind.icon(), kind.styled_name(theme, &name)),
    ]);
}

fn add_simple_row(table: &mut Table, name: &str, dir: &Path, theme: &ShellTheme) {
    let path = dir.join(name);
    let kind = FileKind::from_path(&path, name);

    let (size, modified) = match fs::metadata(&path) {
        Ok(meta) => {
            let size = if meta.is_dir() {
                "-".to_string()
            } else {
                format_size(meta.len())
            };
            let modified = meta
                .modified()
                .map(|t| DateTime::<Local>::from(t).format("%b %d %H:%M").to_string())
                .unwrap_or_else(|_| "?".to_string());
            (size, modified)
        }
        Err(_) if !path.exists() => ("-".to_string(), "?".to_string()),
        Err(_) => ("?".to_string(), "?".to_string()),
    };

    table.add_row(vec![
        kind.icon().to_string(),
        kind.styled_name(theme, name),
        theme.info.apply_to(size).to_string(),
        theme.changed.apply_to(modified).to_string(),
    ]);
}
