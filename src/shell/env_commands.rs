//! `!name` environment-status commands.
//!
//! Each command is a variant of [`EnvCommand`] with its own handler.
//! Handlers only read state: they probe the environment, run a few
//! short `git`/`python3`/`node` queries with a time budget, and render
//! tables through the UI.

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{Result, ShellError};
use crate::shell::process::ProcessRunner;
use crate::ui::{Table, UserInterface};

/// Budget for each helper query.
const QUERY_TIMEOUT: Duration = Duration::from_secs(3);

/// Budget for `pip list`.
const PIP_TIMEOUT: Duration = Duration::from_secs(5);

/// Packages listed by `!python`.
const PACKAGE_LIMIT: usize = 10;

/// A known `!name` command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvCommand {
    Env,
    Status,
    Git,
    Python,
}

/// What the handlers need to know about the session.
#[derive(Debug, Clone)]
pub struct StatusInputs {
    pub cwd: PathBuf,
    pub interpreter: String,
    pub context_entries: usize,
}

impl EnvCommand {
    /// Look up a command by the text after `!`.
    pub fn parse(name: &str) -> Result<Self> {
        match name {
            "env" => Ok(EnvCommand::Env),
            "status" => Ok(EnvCommand::Status),
            "git" => Ok(EnvCommand::Git),
            "python" => Ok(EnvCommand::Python),
            other => Err(ShellError::UnknownEnvironmentCommand {
                name: other.to_string(),
            }),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            EnvCommand::Env => "env",
            EnvCommand::Status => "status",
            EnvCommand::Git => "git",
            EnvCommand::Python => "python",
        }
    }

    /// Run the handler for this command.
    pub fn run<U: UserInterface + ?Sized>(&self, inputs: &StatusInputs, ui: &mut U) {
        let handler: fn(&StatusInputs, &mut U) = match self {
            EnvCommand::Env => show_environment_status,
            EnvCommand::Status => show_system_status,
            EnvCommand::Git => show_git_info,
            EnvCommand::Python => show_python_info,
        };
        handler(inputs, ui);
    }
}

/// An active Python virtual environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PythonEnvironment {
    pub name: String,
    /// `virtualenv` or `conda`.
    pub kind: &'static str,
    pub path: Option<String>,
}

impl PythonEnvironment {
    /// Detect from the process environment.
    pub fn detect() -> Option<Self> {
        Self::detect_with_env(|key| std::env::var(key))
    }

    /// Detect with a custom env var lookup (for testing).
    pub fn detect_with_env<F>(env_fn: F) -> Option<Self>
    where
        F: Fn(&str) -> std::result::Result<String, std::env::VarError>,
    {
        let lookup = |key: &str| env_fn(key).ok().filter(|v| !v.is_empty());

        if let Some(venv) = lookup("VIRTUAL_ENV") {
            let name = Path::new(&venv)
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| venv.clone());
            return Some(Self {
                name,
                kind: "virtualenv",
                path: Some(venv),
            });
        }
        lookup("CONDA_DEFAULT_ENV").map(|name| Self {
            name,
            kind: "conda",
            path: lookup("CONDA_PREFIX"),
        })
    }
}

/// Branch and sync state of the repository around `cwd`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitStatus {
    pub branch: String,
    pub has_changes: bool,
    pub ahead: u32,
    pub behind: u32,
}

impl GitStatus {
    /// Query `git`; `None` outside a repository or without git.
    pub fn query(cwd: &Path) -> Option<Self> {
        let branch = git(cwd, &["rev-parse", "--abbrev-ref", "HEAD"])?
            .trim()
            .to_string();
        let has_changes = git(cwd, &["status", "--porcelain"])
            .map(|out| !out.trim().is_empty())
            .unwrap_or(false);
        let (ahead, behind) = git(
            cwd,
            &["rev-list", "--left-right", "--count", "HEAD...@{upstream}"],
        )
        .and_then(|out| parse_ahead_behind(&out))
        .unwrap_or((0, 0));

        Some(Self {
            branch,
            has_changes,
            ahead,
            behind,
        })
    }

    fn state_label(&self) -> &'static str {
        if self.has_changes {
            "Modified"
        } else {
            "Clean"
        }
    }
}

/// Parse `git rev-list --left-right --count` output: `"<ahead>\t<behind>"`.
pub fn parse_ahead_behind(output: &str) -> Option<(u32, u32)> {
    let mut parts = output.split_whitespace();
    let ahead = parts.next()?.parse().ok()?;
    let behind = parts.next()?.parse().ok()?;
    Some((ahead, behind))
}

/// Container-related files and markers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DockerMarkers {
    pub dockerfile: bool,
    pub compose: bool,
    pub inside_container: bool,
}

impl DockerMarkers {
    pub fn detect(cwd: &Path) -> Self {
        Self {
            dockerfile: cwd.join("Dockerfile").exists(),
            compose: ["docker-compose.yml", "docker-compose.yaml", "compose.yml", "compose.yaml"]
                .iter()
                .any(|name| cwd.join(name).exists()),
            inside_container: Path::new("/.dockerenv").exists(),
        }
    }

    pub fn any(&self) -> bool {
        self.dockerfile || self.compose || self.inside_container
    }

    pub fn details(&self) -> String {
        let mut parts = Vec::new();
        if self.dockerfile {
            parts.push("Dockerfile");
        }
        if self.compose {
            parts.push("Compose");
        }
        if self.inside_container {
            parts.push("In Container");
        }
        if parts.is_empty() {
            "Basic".to_string()
        } else {
            parts.join(", ")
        }
    }
}

fn query(argv: &[&str], cwd: &Path, timeout: Duration) -> Option<String> {
    let argv: Vec<String> = argv.iter().map(|s| s.to_string()).collect();
    ProcessRunner::run_bounded(&argv, Some(cwd), timeout)
}

fn git(cwd: &Path, args: &[&str]) -> Option<String> {
    let mut argv = vec!["git"];
    argv.extend_from_slice(args);
    query(&argv, cwd, QUERY_TIMEOUT)
}

fn node_version(cwd: &Path) -> Option<String> {
    query(&["node", "--version"], cwd, QUERY_TIMEOUT)
        .map(|v| v.trim().trim_start_matches('v').to_string())
        .filter(|v| !v.is_empty())
}

/// `(version, executable)` of `python3`.
fn python_details(cwd: &Path) -> Option<(String, String)> {
    let out = query(
        &[
            "python3",
            "-c",
            "import platform, sys; print(platform.python_version()); print(sys.executable)",
        ],
        cwd,
        QUERY_TIMEOUT,
    )?;
    let mut lines = out.lines();
    let version = lines.next()?.trim().to_string();
    let executable = lines.next().unwrap_or("").trim().to_string();
    Some((version, executable))
}

fn show_environment_status<U: UserInterface + ?Sized>(inputs: &StatusInputs, ui: &mut U) {
    let mut table = Table::new(vec!["Type", "Status", "Details"]);
    let version = python_details(&inputs.cwd)
        .map(|(v, _)| format!("v{}", v))
        .unwrap_or_else(|| "-".to_string());

    match PythonEnvironment::detect() {
        Some(env) => table.add_row(vec![
            "Python".to_string(),
            env.name,
            format!("{} ({})", version, env.kind),
        ]),
        None => table.add_row(vec!["Python".to_string(), "System".to_string(), version]),
    }

    match GitStatus::query(&inputs.cwd) {
        Some(status) => table.add_row(vec![
            "Git".to_string(),
            format!("{} ({})", status.branch, status.state_label()),
            format!("Ahead: {}, Behind: {}", status.ahead, status.behind),
        ]),
        None => table.add_row(vec!["Git", "Not a repository", "-"]),
    }

    match node_version(&inputs.cwd) {
        Some(version) => {
            let modules = if inputs.cwd.join("node_modules").is_dir() {
                "installed"
            } else {
                "missing"
            };
            table.add_row(vec![
                "Node.js".to_string(),
                "Available".to_string(),
                format!("v{} (modules: {})", version, modules),
            ]);
        }
        None => table.add_row(vec!["Node.js", "Not detected", "-"]),
    }

    let docker = DockerMarkers::detect(&inputs.cwd);
    if docker.any() {
        table.add_row(vec!["Docker".to_string(), "Available".to_string(), docker.details()]);
    } else {
        table.add_row(vec!["Docker", "Not detected", "-"]);
    }

    ui.show_table("Environment Status", &table);
}

fn show_system_status<U: UserInterface + ?Sized>(inputs: &StatusInputs, ui: &mut U) {
    let mut table = Table::new(vec!["Property", "Value"]);
    table.add_row(vec![
        "Directory".to_string(),
        inputs.cwd.display().to_string(),
    ]);
    table.add_row(vec!["Interpreter", inputs.interpreter.as_str()]);

    let mut active = Vec::new();
    if let Some(env) = PythonEnvironment::detect() {
        active.push(format!("Python {} ({})", env.name, env.kind));
    }
    if let Some(status) = GitStatus::query(&inputs.cwd) {
        active.push(format!("Git {} ({})", status.branch, status.state_label()));
    }
    if let Some(version) = node_version(&inputs.cwd) {
        active.push(format!("Node.js v{}", version));
    }
    let docker = DockerMarkers::detect(&inputs.cwd);
    if docker.any() {
        active.push(format!("Docker ({})", docker.details()));
    }
    if active.is_empty() {
        active.push("No special environments detected".to_string());
    }
    for (i, env) in active.into_iter().enumerate() {
        let label = if i == 0 { "Environments" } else { "" };
        table.add_row(vec![label.to_string(), env]);
    }

    table.add_row(vec![
        "Context entries".to_string(),
        inputs.context_entries.to_string(),
    ]);
    ui.show_table("System Status", &table);
}

fn show_git_info<U: UserInterface + ?Sized>(inputs: &StatusInputs, ui: &mut U) {
    let Some(status) = GitStatus::query(&inputs.cwd) else {
        ui.warning("Not in a Git repository");
        return;
    };

    let mut table = Table::new(vec!["Property", "Value"]);
    table.add_row(vec!["Branch".to_string(), status.branch.clone()]);
    table.add_row(vec!["Status", status.state_label()]);
    table.add_row(vec!["Commits Ahead".to_string(), status.ahead.to_string()]);
    table.add_row(vec!["Commits Behind".to_string(), status.behind.to_string()]);
    ui.show_table("Git Repository Information", &table);

    if let Some(log) = git(&inputs.cwd, &["log", "--oneline", "-5"]) {
        let mut commits = Table::new(vec!["Commit", "Message"]);
        for line in log.lines() {
            let (hash, message) = line.split_once(' ').unwrap_or((line, ""));
            commits.add_row(vec![hash, message]);
        }
        if !commits.is_empty() {
            ui.show_table("Recent Commits", &commits);
        }
    }
}

fn show_python_info<U: UserInterface + ?Sized>(inputs: &StatusInputs, ui: &mut U) {
    let mut table = Table::new(vec!["Property", "Value"]);
    match python_details(&inputs.cwd) {
        Some((version, executable)) => {
            table.add_row(vec!["Python Version".to_string(), version]);
            table.add_row(vec!["Python Executable".to_string(), executable]);
        }
        None => table.add_row(vec!["Python Version", "python3 not found"]),
    }
    match PythonEnvironment::detect() {
        Some(env) => {
            table.add_row(vec!["Virtual Environment".to_string(), env.name]);
            table.add_row(vec!["Environment Type", env.kind]);
            if let Some(path) = env.path {
                table.add_row(vec!["Environment Path".to_string(), path]);
            }
        }
        None => table.add_row(vec!["Virtual Environment", "None (System Python)"]),
    }
    ui.show_table("Python Environment", &table);

    let Some(list) = query(&["python3", "-m", "pip", "list"], &inputs.cwd, PIP_TIMEOUT) else {
        return;
    };
    // Skip the two header lines.
    let packages: Vec<&str> = list.lines().skip(2).filter(|l| !l.trim().is_empty()).collect();
    if packages.is_empty() {
        return;
    }
    let mut pkg_table = Table::new(vec!["Package", "Version"]);
    for line in packages.iter().take(PACKAGE_LIMIT) {
        let mut cols = line.split_whitespace();
        pkg_table.add_row(vec![cols.next().unwrap_or(""), cols.next().unwrap_or("")]);
    }
    ui.show_table("Installed Packages (Top 10)", &pkg_table);
    if packages.len() > PACKAGE_LIMIT {
        ui.message(&format!(
            "... and {} more packages",
            packages.len() - PACKAGE_LIMIT
        ));
    }
}
