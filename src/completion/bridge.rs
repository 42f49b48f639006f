//! Bridge to bash programmable completion.
//!
//! Completion functions registered with `complete -F` (or commands
//! registered with `complete -C`) are discovered by running `complete -p`
//! in a throwaway interpreter, then invoked out-of-process with the
//! `COMP_*` variables they expect. Every failure path yields no
//! candidates.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::engine::Candidate;
use crate::config::CompletionSettings;
use crate::shell::process::ProcessRunner;

/// `complete` flags that take a value, consumed when the next token is
/// not itself a flag.
const OPTIONS_WITH_VALUES: &[&str] = &[
    "-o", "-A", "-G", "-W", "-X", "-P", "-S", "-D", "-E", "-I", "-M", "-O", "-Q", "-R", "-T",
    "-U",
];

/// How a command's completions are produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistrationKind {
    /// `complete -F function`: fills `COMPREPLY`.
    Function,
    /// `complete -C command`: prints candidates.
    Command,
}

/// One entry of the `complete -p` table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionRegistration {
    /// Function or command name to invoke.
    pub handler: String,
    pub kind: RegistrationKind,
    /// Script that registered it, when loaded on demand.
    pub source: Option<PathBuf>,
}

/// Out-of-process client for the interpreter's completion machinery.
pub struct CompletionProtocolBridge {
    interpreter: String,
    bootstrap_scripts: Vec<PathBuf>,
    script_dirs: Vec<PathBuf>,
    discovery_timeout: Duration,
    execution_timeout: Duration,
    registrations: Option<HashMap<String, CompletionRegistration>>,
    attempted: HashSet<String>,
}

impl CompletionProtocolBridge {
    /// Build a bridge from settings. Scripts and directories that do not
    /// exist are dropped up front.
    pub fn new(settings: &CompletionSettings) -> Self {
        Self {
            interpreter: settings.interpreter.clone(),
            bootstrap_scripts: settings
                .bootstrap_scripts
                .iter()
                .filter(|p| p.is_file())
                .cloned()
                .collect(),
            script_dirs: settings
                .script_dirs
                .iter()
                .filter(|p| p.is_dir())
                .cloned()
                .collect(),
            discovery_timeout: Duration::from_millis(settings.discovery_timeout_ms),
            execution_timeout: Duration::from_millis(settings.execution_timeout_ms),
            registrations: None,
            attempted: HashSet::new(),
        }
    }

    /// Whether any bootstrap script was found.
    pub fn is_available(&self) -> bool {
        !self.bootstrap_scripts.is_empty()
    }

    /// Candidates for `line` with the cursor at byte offset `cursor`.
    pub fn complete(&mut self, line: &str, cursor: usize, cwd: &Path) -> Vec<Candidate> {
        if !self.is_available() {
            return Vec::new();
        }

        let prefix = line_before_cursor(line, cursor);
        let words = split_words(prefix);
        let Some(command) = words.first().filter(|w| !w.is_empty()).cloned() else {
            return Vec::new();
        };
        let Some(registration) = self.registration_for(&command) else {
            return Vec::new();
        };

        let Some(script) = build_script(&self.sources(), &registration, &command, prefix, &words)
        else {
            return Vec::new();
        };
        let argv = [self.interpreter.clone(), "-c".to_string(), script];
        let Some(output) = ProcessRunner::run_bounded(&argv, Some(cwd), self.execution_timeout)
        else {
            return Vec::new();
        };

        let replace_chars = current_token_length(prefix);
        let candidates: Vec<Candidate> = output
            .lines()
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(|item| Candidate::new(item, replace_chars))
            .collect();
        tracing::debug!(
            "{} completion candidates from {} for {:?}",
            candidates.len(),
            registration.handler,
            command
        );
        candidates
    }

    /// The registration for `command`, discovering it if needed.
    ///
    /// A command whose script lookup fails is never looked up again.
    fn registration_for(&mut self, command: &str) -> Option<CompletionRegistration> {
        if self.registrations.is_none() {
            let table = self.discover(None).unwrap_or_default();
            tracing::debug!("Loaded {} completion registrations", table.len());
            self.registrations = Some(table);
        }
        if let Some(found) = self.registrations.as_ref().and_then(|r| r.get(command)) {
            return Some(found.clone());
        }
        if !self.attempted.insert(command.to_string()) {
            return None;
        }

        let script = self.find_completion_script(command)?;
        tracing::debug!("Loading completion script {}", script.display());
        let discovered = self.discover(Some((command, &script)))?;
        let registrations = self.registrations.get_or_insert_with(HashMap::new);
        registrations.extend(discovered);
        registrations.get(command).cloned()
    }

    /// Run `complete -p`, optionally after sourcing a per-command script
    /// and scoped to that command.
    fn discover(
        &self,
        scoped: Option<(&str, &Path)>,
    ) -> Option<HashMap<String, CompletionRegistration>> {
        let mut script = self.sources();
        let mut query = "complete -p".to_string();
        if let Some((command, path)) = scoped {
            script.push_str(&source_line(path)?);
            query.push(' ');
            query.push_str(&quote(command)?);
        }
        script.push_str(&query);

        let argv = [self.interpreter.clone(), "-c".to_string(), script];
        let output = ProcessRunner::run_bounded(&argv, None, self.discovery_timeout)?;
        Some(parse_complete_output(&output, scoped.map(|(_, p)| p)))
    }

    fn sources(&self) -> String {
        self.bootstrap_scripts
            .iter()
            .filter_map(|p| source_line(p))
            .collect()
    }

    /// First matching script in the completion directories: the command
    /// name, then with `-` replaced by `_`, then `<command>.*`.
    pub fn find_completion_script(&self, command: &str) -> Option<PathBuf> {
        let mut names = vec![command.to_string()];
        if command.contains('-') {
            names.push(command.replace('-', "_"));
        }
        let dotted = format!("{command}.");

        for dir in &self.script_dirs {
            for name in &names {
                let path = dir.join(name);
                if path.is_file() {
                    return Some(path);
                }
            }

            let Ok(entries) = fs::read_dir(dir) else {
                continue;
            };
            let mut matches: Vec<PathBuf> = entries
                .flatten()
                .filter(|e| e.file_name().to_string_lossy().starts_with(&dotted))
                .map(|e| e.path())
                .filter(|p| p.is_file())
                .collect();
            matches.sort();
            if let Some(path) = matches.into_iter().next() {
                return Some(path);
            }
        }
        None
    }

    /// Number of known registrations, without triggering discovery.
    pub fn registration_count(&self) -> usize {
        self.registrations.as_ref().map_or(0, HashMap::len)
    }
}

fn quote(word: &str) -> Option<String> {
    shlex::try_quote(word).ok().map(|q| q.into_owned())
}

fn source_line(path: &Path) -> Option<String> {
    Some(format!("source {};", quote(&path.to_string_lossy())?))
}

fn line_before_cursor(line: &str, cursor: usize) -> &str {
    let mut end = cursor.min(line.len());
    while !line.is_char_boundary(end) {
        end -= 1;
    }
    &line[..end]
}

/// Parse `complete -p` output into a command → registration table.
///
/// Lines without a handler or without command names are skipped. Later
/// lines win for a command listed twice.
pub fn parse_complete_output(
    output: &str,
    source: Option<&Path>,
) -> HashMap<String, CompletionRegistration> {
    let mut table = HashMap::new();

    for line in output.lines().map(str::trim) {
        if !line.starts_with("complete ") {
            continue;
        }
        let Some(parts) = shlex::split(line) else {
            tracing::debug!("Unparseable completion line: {}", line);
            continue;
        };

        let mut handler = None;
        let mut commands: &[String] = &[];
        let mut i = 1;
        while i < parts.len() {
            let token = parts[i].as_str();
            if (token == "-F" || token == "-C") && i + 1 < parts.len() {
                let kind = if token == "-F" {
                    RegistrationKind::Function
                } else {
                    RegistrationKind::Command
                };
                handler = Some((parts[i + 1].clone(), kind));
                i += 2;
            } else if token.starts_with('-') {
                i += 1;
                if OPTIONS_WITH_VALUES.contains(&token)
                    && i < parts.len()
                    && !parts[i].starts_with('-')
                {
                    i += 1;
                }
            } else {
                commands = &parts[i..];
                break;
            }
        }

        let Some((name, kind)) = handler else {
            continue;
        };
        for command in commands {
            table.insert(
                command.clone(),
                CompletionRegistration {
                    handler: name.clone(),
                    kind,
                    source: source.map(Path::to_path_buf),
                },
            );
        }
    }
    table
}

/// Shell words of `text`. A trailing empty word marks a cursor that sits
/// after whitespace.
///
/// Falls back to whitespace splitting when quoting is unbalanced.
pub fn split_words(text: &str) -> Vec<String> {
    let mut words = shlex::split(text)
        .unwrap_or_else(|| text.split_whitespace().map(str::to_string).collect());
    if text.ends_with(char::is_whitespace) {
        words.push(String::new());
    }
    words
}

/// Characters of the partial word under the cursor.
pub fn current_token_length(prefix: &str) -> usize {
    if prefix.is_empty() || prefix.ends_with(' ') {
        return 0;
    }
    prefix
        .split_whitespace()
        .last()
        .map_or(0, |w| w.chars().count())
}

/// Script that sets up `COMP_*`, runs the handler and prints its reply.
///
/// Returns `None` when a word cannot be quoted (it contains a NUL byte).
pub fn build_script(
    sources: &str,
    registration: &CompletionRegistration,
    command: &str,
    prefix: &str,
    words: &[String],
) -> Option<String> {
    let mut script = sources.to_string();
    if let Some(path) = &registration.source {
        script.push_str(&source_line(path)?);
    }

    let quoted: Vec<String> = words.iter().map(|w| quote(w)).collect::<Option<_>>()?;
    let current = words.last().map(String::as_str).unwrap_or("");
    let previous = words
        .len()
        .checked_sub(2)
        .and_then(|i| words.get(i))
        .map(String::as_str)
        .unwrap_or("");
    let args = format!("{} {} {}", quote(command)?, quote(current)?, quote(previous)?);
    let handler = quote(&registration.handler)?;

    let comp_line = quote(prefix)?;
    let comp_point = prefix.chars().count();
    let comp_cword = words.len().saturating_sub(1);

    match registration.kind {
        RegistrationKind::Function => {
            script.push_str(&format!(
                "COMP_LINE={comp_line};COMP_POINT={comp_point};COMP_WORDS=({});\
                 COMP_CWORD={comp_cword};COMPREPLY=();{handler} {args} >/dev/null;\
                 printf '%s\\n' \"${{COMPREPLY[@]}}\"",
                quoted.join(" ")
            ));
        }
        RegistrationKind::Command => {
            script.push_str(&format!(
                "export COMP_LINE={comp_line} COMP_POINT={comp_point};{handler} {args}"
            ));
        }
    }
    Some(script)
}
