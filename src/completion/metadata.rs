//! Per-entry metadata strings shown beside path candidates.
//!
//! Format: `<type> | <size> | <permissions> | <owner>:<group> | <YYYY-MM-DD HH:MM>`.

use std::fs::{self, Metadata};
use std::path::Path;

use chrono::{DateTime, Local};

/// Shown for entries that cannot be inspected.
pub const ACCESS_DENIED: &str = "Access denied or file not found";

const SIZE_UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];

/// Human-readable size with 1024-based units.
///
/// Bytes are shown as an integer, larger units with one decimal.
pub fn format_size(bytes: u64) -> String {
    if bytes == 0 {
        return "0 B".to_string();
    }
    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < SIZE_UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} {}", bytes, SIZE_UNITS[0])
    } else {
        format!("{:.1} {}", size, SIZE_UNITS[unit])
    }
}

/// Label for a file extension (without the dot, any case).
pub fn extension_label(ext: &str) -> &'static str {
    match ext.to_ascii_lowercase().as_str() {
        "py" => "Python",
        "js" => "JavaScript",
        "ts" => "TypeScript",
        "rs" => "Rust",
        "go" => "Go",
        "html" => "HTML",
        "css" => "CSS",
        "json" => "JSON",
        "xml" => "XML",
        "yaml" | "yml" => "YAML",
        "toml" => "TOML",
        "md" => "Markdown",
        "txt" => "Text",
        "log" => "Log",
        "conf" | "cfg" | "ini" => "Config",
        "sh" => "Shell Script",
        "bash" => "Bash Script",
        "zsh" => "Zsh Script",
        "fish" => "Fish Script",
        "jpg" | "jpeg" => "JPEG Image",
        "png" => "PNG Image",
        "gif" => "GIF Image",
        "svg" => "SVG Image",
        "pdf" => "PDF",
        "doc" | "docx" => "Word Doc",
        "xls" | "xlsx" => "Excel",
        "zip" => "ZIP Archive",
        "tar" => "TAR Archive",
        "gz" => "GZip Archive",
        "rar" => "RAR Archive",
        "7z" => "7Z Archive",
        "mp3" => "MP3 Audio",
        "wav" => "WAV Audio",
        "flac" => "FLAC Audio",
        "mp4" => "MP4 Video",
        "avi" => "AVI Video",
        "mov" => "MOV Video",
        _ => "File",
    }
}

/// Type label for an entry: directory, symlink, executable, or by extension.
pub fn type_label(path: &Path, meta: &Metadata) -> &'static str {
    if meta.is_dir() {
        return "Directory";
    }
    if fs::symlink_metadata(path).is_ok_and(|m| m.file_type().is_symlink()) {
        return "Symlink";
    }
    if is_executable(meta) {
        return "Executable";
    }
    path.extension()
        .and_then(|e| e.to_str())
        .map(extension_label)
        .unwrap_or("File")
}

/// Full metadata string for `path`, or [`ACCESS_DENIED`].
pub fn describe(path: &Path) -> String {
    let Ok(meta) = fs::metadata(path) else {
        return ACCESS_DENIED.to_string();
    };

    let modified = meta
        .modified()
        .map(|t| DateTime::<Local>::from(t).format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|_| "?".to_string());

    format!(
        "{} | {} | {} | {} | {}",
        type_label(path, &meta),
        format_size(meta.len()),
        permission_string(&meta),
        ownership(&meta),
        modified
    )
}

#[cfg(unix)]
fn is_executable(meta: &Metadata) -> bool {
    use std::os::unix::fs::PermissionsExt;
    meta.is_file() && meta.permissions().mode() & 0o111 != 0
}

#[cfg(not(unix))]
fn is_executable(_meta: &Metadata) -> bool {
    false
}

/// `ls -l` style permission string, e.g. `drwxr-xr-x`.
#[cfg(unix)]
pub fn permission_string(meta: &Metadata) -> String {
    use std::os::unix::fs::{FileTypeExt, PermissionsExt};

    let ft = meta.file_type();
    let kind = if ft.is_dir() {
        'd'
    } else if ft.is_symlink() {
        'l'
    } else if ft.is_char_device() {
        'c'
    } else if ft.is_block_device() {
        'b'
    } else if ft.is_fifo() {
        'p'
    } else if ft.is_socket() {
        's'
    } else {
        '-'
    };

    let mode = meta.permissions().mode();
    let mut out = String::with_capacity(10);
    out.push(kind);
    for (shift, special, set_char) in [(6, 0o4000, 's'), (3, 0o2000, 's'), (0, 0o1000, 't')] {
        let bits = (mode >> shift) & 0o7;
        out.push(if bits & 0o4 != 0 { 'r' } else { '-' });
        out.push(if bits & 0o2 != 0 { 'w' } else { '-' });
        let exec = bits & 0o1 != 0;
        out.push(match (mode & special != 0, exec) {
            (true, true) => set_char,
            (true, false) => set_char.to_ascii_uppercase(),
            (false, true) => 'x',
            (false, false) => '-',
        });
    }
    out
}

/// `ls -l` style permission string, e.g. `drwxr-xr-x`.
#[cfg(not(unix))]
pub fn permission_string(meta: &Metadata) -> String {
    let kind = if meta.is_dir() { 'd' } else { '-' };
    let write = if meta.permissions().readonly() { '-' } else { 'w' };
    format!("{kind}r{write}-r--r--")
}

#[cfg(unix)]
fn ownership(meta: &Metadata) -> String {
    use std::os::unix::fs::MetadataExt;
    let (uid, gid) = (meta.uid(), meta.gid());
    format!(
        "{}:{}",
        user_name(uid).unwrap_or_else(|| uid.to_string()),
        group_name(gid).unwrap_or_else(|| gid.to_string())
    )
}

#[cfg(not(unix))]
fn ownership(_meta: &Metadata) -> String {
    "-:-".to_string()
}

#[cfg(unix)]
fn user_name(uid: libc::uid_t) -> Option<String> {
    let mut buf = vec![0 as libc::c_char; 4096];
    // SAFETY: passwd is plain old data; getpwuid_r writes into it and
    // `buf`, and only sets `result` on success.
    unsafe {
        let mut pwd: libc::passwd = std::mem::zeroed();
        let mut result: *mut libc::passwd = std::ptr::null_mut();
        let rc = libc::getpwuid_r(uid, &mut pwd, buf.as_mut_ptr(), buf.len(), &mut result);
        if rc != 0 || result.is_null() || pwd.pw_name.is_null() {
            return None;
        }
        Some(
            std::ffi::CStr::from_ptr(pwd.pw_name)
                .to_string_lossy()
                .into_owned(),
        )
    }
}

#[cfg(unix)]
fn group_name(gid: libc::gid_t) -> Option<String> {
    let mut buf = vec![0 as libc::c_char; 4096];
    // SAFETY: see `user_name`.
    unsafe {
        let mut grp: libc::group = std::mem::zeroed();
        let mut result: *mut libc::group = std::ptr::null_mut();
        let rc = libc::getgrgid_r(gid, &mut grp, buf.as_mut_ptr(), buf.len(), &mut result);
        if rc != 0 || result.is_null() || grp.gr_name.is_null() {
            return None;
        }
        Some(
            std::ffi::CStr::from_ptr(grp.gr_name)
                .to_string_lossy()
                .into_owned(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn size_formatting() {
        assert_eq!(format_size(0), "0 B");
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(1023), "1023 B");
        assert_eq!(format_size(1024), "1.0 KB");
        assert_eq!(format_size(1536), "1.5 KB");
        assert_eq!(format_size(5 * 1024 * 1024), "5.0 MB");
        assert_eq!(format_size(3 * 1024_u64.pow(4)), "3.0 TB");
        assert_eq!(format_size(2048 * 1024_u64.pow(4)), "2048.0 TB");
    }

    #[test]
    fn extension_labels() {
        assert_eq!(extension_label("py"), "Python");
        assert_eq!(extension_label("YML"), "YAML");
        assert_eq!(extension_label("rs"), "Rust");
        assert_eq!(extension_label("unknown"), "File");
    }

    #[test]
    fn describes_directory() {
        let temp = TempDir::new().unwrap();
        let sub = temp.path().join("src");
        fs::create_dir(&sub).unwrap();

        let meta = describe(&sub);
        let fields: Vec<&str> = meta.split(" | ").collect();
        assert_eq!(fields.len(), 5, "{meta}");
        assert_eq!(fields[0], "Directory");
        assert!(fields[2].starts_with('d'));
        assert!(fields[3].contains(':'));
        assert_eq!(fields[4].len(), "2024-01-01 12:00".len());
    }

    #[test]
    fn describes_file_by_extension() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("main.py");
        fs::write(&file, "print('hi')\n").unwrap();

        let meta = describe(&file);
        assert!(meta.starts_with("Python | 12 B | "), "{meta}");
    }

    #[test]
    fn missing_entry_degrades() {
        let temp = TempDir::new().unwrap();
        assert_eq!(describe(&temp.path().join("gone")), ACCESS_DENIED);
    }

    #[cfg(unix)]
    #[test]
    fn executable_and_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let temp = TempDir::new().unwrap();
        let script = temp.path().join("run");
        fs::write(&script, "#!/bin/sh\n").unwrap();
        fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();

        let meta = fs::metadata(&script).unwrap();
        assert_eq!(type_label(&script, &meta), "Executable");
        assert_eq!(permission_string(&meta), "-rwxr-xr-x");
    }

    #[cfg(unix)]
    #[test]
    fn symlink_label() {
        let temp = TempDir::new().unwrap();
        let target = temp.path().join("notes.txt");
        fs::write(&target, "x").unwrap();
        let link = temp.path().join("link");
        std::os::unix::fs::symlink(&target, &link).unwrap();

        assert!(describe(&link).starts_with("Symlink | "));
    }
}
