//! Environment snapshots and their reconciliation.
//!
//! Environment-mutating scripts run in a child interpreter followed by
//! `env`. The printed `KEY=VALUE` lines are parsed into an
//! [`EnvironmentSnapshot`], diffed against the live environment, and the
//! differences applied to this process.
//!
//! Parsing is line-based: a value containing a newline is split across
//! lines and its continuation lines are read as separate entries when
//! they contain `=`. This matches what `env` prints and is accepted as a
//! boundary condition.

use std::collections::BTreeMap;
use std::path::Path;

use crate::error::{Result, ShellError};
use crate::shell::platform::path_list_separator;

/// Keys never copied back from a child interpreter.
const IGNORED_KEYS: &[&str] = &["PS1", "PS2", "_"];

/// Prefix of exported bash function definitions.
const BASH_FUNCTION_PREFIX: &str = "BASH_FUNC_";

/// Variables always listed first when reporting changes.
pub const IMPORTANT_VARS: &[&str] = &[
    "PATH",
    "VIRTUAL_ENV",
    "CONDA_DEFAULT_ENV",
    "NODE_ENV",
    "PYTHONPATH",
    "LD_LIBRARY_PATH",
    "JAVA_HOME",
];

/// Whether a key is interpreter bookkeeping that must not propagate.
pub fn is_ignored_key(key: &str) -> bool {
    IGNORED_KEYS.contains(&key) || key.starts_with(BASH_FUNCTION_PREFIX)
}

/// An immutable copy of an environment mapping.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvironmentSnapshot {
    vars: BTreeMap<String, String>,
}

impl EnvironmentSnapshot {
    /// Copy the live process environment.
    pub fn capture() -> Self {
        let vars = std::env::vars_os()
            .map(|(k, v)| {
                (
                    k.to_string_lossy().into_owned(),
                    v.to_string_lossy().into_owned(),
                )
            })
            .collect();
        Self { vars }
    }

    /// Parse the output of `env`.
    ///
    /// Lines without `=` and the `_=` line are skipped.
    pub fn from_env_output(output: &str) -> Self {
        let vars = output
            .lines()
            .filter(|line| !line.starts_with("_="))
            .filter_map(|line| line.split_once('='))
            .filter(|(key, _)| !key.is_empty())
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        Self { vars }
    }

    /// Value of a key.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    /// Number of variables.
    pub fn len(&self) -> usize {
        self.vars.len()
    }

    /// Whether the snapshot holds no variables.
    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    /// Iterate in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.vars.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Variables added or changed in `after`, ignoring bookkeeping keys.
    ///
    /// Keys present here but missing from `after` are not reported.
    pub fn diff(&self, after: &EnvironmentSnapshot) -> EnvironmentDiff {
        let mut diff = EnvironmentDiff::default();
        for (key, new) in after.iter().filter(|(key, _)| !is_ignored_key(key)) {
            match self.get(key) {
                None => {
                    diff.added.insert(key.to_string(), new.to_string());
                }
                Some(old) if old != new => {
                    diff.changed.insert(
                        key.to_string(),
                        ChangedValue {
                            old: old.to_string(),
                            new: new.to_string(),
                        },
                    );
                }
                Some(_) => {}
            }
        }
        diff
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for EnvironmentSnapshot {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            vars: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// Old and new value of a changed variable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangedValue {
    pub old: String,
    pub new: String,
}

/// Variables added or changed by a mutating script.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvironmentDiff {
    pub added: BTreeMap<String, String>,
    pub changed: BTreeMap<String, ChangedValue>,
}

impl EnvironmentDiff {
    /// Whether nothing changed.
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.changed.is_empty()
    }

    /// Write every added and changed value into the live environment.
    pub fn apply(&self) {
        for (key, value) in &self.added {
            std::env::set_var(key, value);
        }
        for (key, change) in &self.changed {
            std::env::set_var(key, &change.new);
        }
    }

    /// `"<command> completed successfully"`, followed by
    /// `" (N new, M changed variables)"` when anything changed.
    pub fn summary(&self, command: &str) -> String {
        let mut msg = format!("{} completed successfully", command);
        if !self.is_empty() {
            msg.push_str(&format!(
                " ({} new, {} changed variables)",
                self.added.len(),
                self.changed.len()
            ));
        }
        msg
    }
}

/// Which kind of environment `deactivate` left.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvironmentKind {
    Virtualenv,
    Conda,
}

impl EnvironmentKind {
    pub fn label(&self) -> &'static str {
        match self {
            EnvironmentKind::Virtualenv => "virtualenv/venv",
            EnvironmentKind::Conda => "conda",
        }
    }
}

/// What `deactivate` changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeactivateReport {
    pub kind: EnvironmentKind,
    pub name: String,
    pub removed: Vec<String>,
}

impl DeactivateReport {
    /// `"Deactivated <kind> environment: <name>"`.
    pub fn message(&self) -> String {
        format!("Deactivated {} environment: {}", self.kind.label(), self.name)
    }
}

/// Leave the active virtualenv or conda environment in-process.
///
/// A virtualenv takes precedence when both are active.
pub fn deactivate() -> Result<DeactivateReport> {
    let virtual_env = std::env::var("VIRTUAL_ENV").ok().filter(|v| !v.is_empty());
    let conda_env = std::env::var("CONDA_DEFAULT_ENV")
        .ok()
        .filter(|v| !v.is_empty());

    if let Some(venv) = virtual_env {
        return Ok(deactivate_virtualenv(&venv));
    }
    if let Some(name) = conda_env {
        return Ok(deactivate_conda(name));
    }
    Err(ShellError::NoActiveEnvironment)
}

fn deactivate_virtualenv(venv: &str) -> DeactivateReport {
    let venv_bin = Path::new(venv).join("bin");
    let venv_bin = venv_bin.to_string_lossy();
    let path = std::env::var("PATH").unwrap_or_default();
    std::env::set_var("PATH", strip_path_prefix(&path, &venv_bin));

    let mut removed = remove_vars(&["VIRTUAL_ENV", "VIRTUAL_ENV_PROMPT"]);
    if let Some(original) = std::env::var("_OLD_VIRTUAL_PS1")
        .ok()
        .filter(|v| !v.is_empty())
    {
        std::env::set_var("PS1", original);
        std::env::remove_var("_OLD_VIRTUAL_PS1");
        removed.push("_OLD_VIRTUAL_PS1".to_string());
    }

    DeactivateReport {
        kind: EnvironmentKind::Virtualenv,
        name: Path::new(venv)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| venv.to_string()),
        removed,
    }
}

fn deactivate_conda(name: String) -> DeactivateReport {
    let removed = remove_vars(&["CONDA_DEFAULT_ENV", "CONDA_PREFIX", "CONDA_PYTHON_EXE"]);

    if let Some(base_bin) = std::env::var("CONDA_EXE")
        .ok()
        .and_then(|exe| Path::new(&exe).parent().map(|p| p.to_string_lossy().into_owned()))
    {
        let path = std::env::var("PATH").unwrap_or_default();
        if !path.contains(&base_bin) {
            std::env::set_var(
                "PATH",
                format!("{}{}{}", base_bin, path_list_separator(), path),
            );
        }
    }

    DeactivateReport {
        kind: EnvironmentKind::Conda,
        name,
        removed,
    }
}

fn remove_vars(keys: &[&str]) -> Vec<String> {
    keys.iter()
        .filter(|key| std::env::var_os(key).is_some())
        .map(|key| {
            std::env::remove_var(key);
            key.to_string()
        })
        .collect()
}

/// Drop every `PATH` entry starting with `prefix`.
pub fn strip_path_prefix(path: &str, prefix: &str) -> String {
    let sep = path_list_separator();
    path.split(sep)
        .filter(|part| !part.starts_with(prefix))
        .collect::<Vec<_>>()
        .join(&sep.to_string())
}

/// First three `PATH` entries, for display after a change.
pub fn path_head() -> String {
    let sep = path_list_separator();
    std::env::var("PATH")
        .unwrap_or_default()
        .split(sep)
        .take(3)
        .collect::<Vec<_>>()
        .join(&sep.to_string())
}
