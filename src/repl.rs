//! Interactive read-eval loop.
//!
//! - Line editing and history via rustyline
//! - Tab completion from the shared [`CompletionEngine`]
//! - Prompt shows the working directory, `~`-abbreviated

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context as _, Result};
use rustyline::completion::{Completer, Pair};
use rustyline::error::ReadlineError;
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::history::DefaultHistory;
use rustyline::validate::Validator;
use rustyline::{CompletionType, Config, Context, Editor, Helper};

use crate::completion::{Candidate, CompletionEngine};
use crate::config::config_dir;
use crate::context::ContextRecorder;
use crate::shell::{Outcome, ShellExecutor};
use crate::ui::{ShellTheme, StreamRenderer, UserInterface};

/// Line editor helper that completes through the [`CompletionEngine`].
pub struct ShellHelper {
    engine: Arc<CompletionEngine>,
}

impl ShellHelper {
    pub fn new(engine: Arc<CompletionEngine>) -> Self {
        Self { engine }
    }
}

/// Byte offset where a candidate's replacement starts.
pub fn replacement_start(line: &str, pos: usize, replace_chars: usize) -> usize {
    if replace_chars == 0 {
        return pos;
    }
    line[..pos]
        .char_indices()
        .rev()
        .nth(replace_chars - 1)
        .map(|(i, _)| i)
        .unwrap_or(0)
}

fn to_pair(candidate: Candidate) -> Pair {
    let display = match &candidate.description {
        Some(desc) => format!("{:<24} {}", candidate.display, desc),
        None => candidate.display,
    };
    Pair {
        display,
        replacement: candidate.replacement,
    }
}

impl Completer for ShellHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        let candidates = self.engine.complete(line, pos, &cwd);

        // Every candidate replaces the same partial word.
        let start = candidates
            .first()
            .map(|c| replacement_start(line, pos, c.replace_chars))
            .unwrap_or(pos);
        Ok((start, candidates.into_iter().map(to_pair).collect()))
    }
}

impl Hinter for ShellHelper {
    type Hint = String;
}

impl Highlighter for ShellHelper {}

impl Validator for ShellHelper {}

impl Helper for ShellHelper {}

/// `dir` with the home directory replaced by `~`.
pub fn abbreviate_home(dir: &Path, home: Option<&Path>) -> String {
    if let Some(home) = home {
        if let Ok(rest) = dir.strip_prefix(home) {
            if rest.as_os_str().is_empty() {
                return "~".to_string();
            }
            return format!("~/{}", rest.display());
        }
    }
    dir.display().to_string()
}

fn prompt(theme: &ShellTheme) -> String {
    let cwd = std::env::current_dir().unwrap_or_default();
    let shown = abbreviate_home(&cwd, dirs::home_dir().as_deref());
    format!("{} {} ", theme.prompt_path.apply_to(shown), theme.info.apply_to("❯"))
}

fn history_path() -> Option<PathBuf> {
    Some(config_dir()?.join("history.txt"))
}

fn save_history(rl: &mut Editor<ShellHelper, DefaultHistory>, path: &Option<PathBuf>) {
    if let Some(path) = path {
        if let Some(parent) = path.parent() {
            if let Err(e) = std::fs::create_dir_all(parent) {
                tracing::warn!("Failed to create history directory: {}", e);
            }
        }
        if let Err(e) = rl.save_history(path) {
            tracing::warn!("Failed to save history: {}", e);
        }
    }
}

/// Read and execute lines until `exit` or Ctrl-D.
pub fn run<U, R, C>(executor: &mut ShellExecutor<U, R, C>, theme: &ShellTheme) -> Result<()>
where
    U: UserInterface,
    R: StreamRenderer,
    C: ContextRecorder,
{
    let config = Config::builder()
        .completion_type(CompletionType::List)
        .auto_add_history(false)
        .build();
    let mut rl: Editor<ShellHelper, DefaultHistory> =
        Editor::with_config(config).context("Failed to create editor")?;
    rl.set_helper(Some(ShellHelper::new(executor.completer())));

    let history = history_path();
    if let Some(ref path) = history {
        if let Err(e) = rl.load_history(path) {
            let is_not_found = matches!(&e, ReadlineError::Io(io_err) if io_err.kind() == std::io::ErrorKind::NotFound);
            if !is_not_found {
                tracing::warn!("Failed to load history: {}", e);
            }
        }
    }

    executor.ui_mut().message(&format!(
        "hybridshell v{}. Type /help for help, exit to quit.",
        env!("CARGO_PKG_VERSION")
    ));

    loop {
        match rl.readline(&prompt(theme)) {
            Ok(line) => {
                if line.trim().is_empty() {
                    continue;
                }
                if let Err(e) = rl.add_history_entry(line.as_str()) {
                    tracing::warn!("Failed to add history entry: {}", e);
                }
                if executor.execute(&line) == Outcome::Exit {
                    break;
                }
            }
            // Ctrl-C clears the line.
            Err(ReadlineError::Interrupted) => continue,
            Err(ReadlineError::Eof) => break,
            Err(err) => {
                save_history(&mut rl, &history);
                return Err(err).context("Failed to read input");
            }
        }
    }

    save_history(&mut rl, &history);
    executor.ui_mut().warning("Goodbye!");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replacement_start_counts_characters() {
        assert_eq!(replacement_start("cd Doc", 6, 3), 3);
        assert_eq!(replacement_start("ls", 2, 0), 2);
        assert_eq!(replacement_start("cat ñam", 8, 3), 4);
    }

    #[test]
    fn abbreviates_home_directory() {
        let home = Path::new("/home/ada");
        assert_eq!(abbreviate_home(Path::new("/home/ada"), Some(home)), "~");
        assert_eq!(
            abbreviate_home(Path::new("/home/ada/src/app"), Some(home)),
            "~/src/app"
        );
        assert_eq!(abbreviate_home(Path::new("/tmp"), Some(home)), "/tmp");
        assert_eq!(abbreviate_home(Path::new("/tmp"), None), "/tmp");
    }

    #[test]
    fn candidates_with_descriptions_are_padded() {
        let pair = to_pair(Candidate::new("ls", 1).with_description("List directory contents"));
        assert_eq!(pair.replacement, "ls");
        assert!(pair.display.starts_with("ls "));
        assert!(pair.display.ends_with("List directory contents"));
    }

    #[test]
    fn helper_completes_commands() {
        let engine = Arc::new(
            CompletionEngine::new(&crate::config::CompletionSettings::default())
                .with_commands(vec!["grep".into(), "git".into()]),
        );
        let helper = ShellHelper::new(engine);
        let history = DefaultHistory::new();
        let ctx = Context::new(&history);
        let (start, pairs) = helper.complete("gi", 2, &ctx).unwrap();
        assert_eq!(start, 0);
        assert!(pairs.iter().any(|p| p.replacement == "git"));
    }
}
