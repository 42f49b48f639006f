//! The `execute(command)` entry point.
//!
//! [`ShellExecutor`] classifies each input line, dispatches it to the
//! matching handler, and turns every failure into an error panel plus a
//! context record. Nothing a handler does, including panicking, escapes
//! [`ShellExecutor::execute`].

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::completion::CompletionEngine;
use crate::config::ShellConfig;
use crate::context::ContextRecorder;
use crate::error::{Result, ShellError};
use crate::shell::classify::{
    base_command, Builtin, CommandClassifier, ExecutionPlan, MutationKind,
};
use crate::shell::env::{self, EnvironmentSnapshot};
use crate::shell::env_commands::{EnvCommand, StatusInputs};
use crate::shell::platform::{expand_tilde, ShellInfo};
use crate::shell::process::{Invocation, ProcessRunner};
use crate::shell::signals::InterruptGuard;
use crate::ui::{Prompt, StreamRenderer, UserInterface};

/// Shown and recorded when Ctrl-C interrupts a captured command.
pub const INTERRUPTED: &str = "^C - Command interrupted";

const STREAM_CANCELLED: &str = "Streaming command cancelled by user";

/// What the caller should do after a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Keep reading input.
    None,
    /// The user asked to leave.
    Exit,
    /// The command failed; the message was already shown.
    Failed(String),
}

/// Runs input lines for one session.
pub struct ShellExecutor<U, R, C> {
    config: ShellConfig,
    classifier: CommandClassifier,
    runner: ProcessRunner,
    completer: Arc<CompletionEngine>,
    ui: U,
    renderer: R,
    context: C,
}

impl<U, R, C> ShellExecutor<U, R, C>
where
    U: UserInterface,
    R: StreamRenderer,
    C: ContextRecorder,
{
    pub fn new(config: ShellConfig, shell: ShellInfo, ui: U, renderer: R, context: C) -> Self {
        Self {
            classifier: CommandClassifier::new(&config),
            runner: ProcessRunner::new(shell),
            completer: Arc::new(CompletionEngine::new(&config.completion)),
            config,
            ui,
            renderer,
            context,
        }
    }

    /// Share an existing completion engine.
    pub fn with_completer(mut self, completer: Arc<CompletionEngine>) -> Self {
        self.completer = completer;
        self
    }

    /// Override platform streaming support.
    pub fn with_streaming_support(mut self, supported: bool) -> Self {
        self.classifier = self.classifier.with_streaming_support(supported);
        self
    }

    pub fn ui(&self) -> &U {
        &self.ui
    }

    pub fn ui_mut(&mut self) -> &mut U {
        &mut self.ui
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn context(&self) -> &C {
        &self.context
    }

    pub fn config(&self) -> &ShellConfig {
        &self.config
    }

    /// The engine used for tab completion.
    pub fn completer(&self) -> Arc<CompletionEngine> {
        Arc::clone(&self.completer)
    }

    /// Drop cached listings for `path`, or all of them.
    pub fn update_completion_cache(&self, path: Option<&Path>) {
        match path {
            Some(dir) => self.completer.invalidate(dir),
            None => self.completer.clear_cache(),
        }
    }

    /// Run one input line.
    pub fn execute(&mut self, text: &str) -> Outcome {
        let Some(plan) = self.classifier.classify(text) else {
            return Outcome::None;
        };
        let command = text.trim().to_string();

        let result = panic::catch_unwind(AssertUnwindSafe(|| self.dispatch(&command, plan)));
        let message = match result {
            Ok(Ok(outcome)) => return outcome,
            Ok(Err(e)) => user_message(&e),
            Err(payload) => format!("Error: {}", panic_message(payload.as_ref())),
        };

        tracing::debug!("{} failed: {}", command, message);
        self.ui.show_error(&command, &message);
        self.context.add_shell_context(&command, &message);
        Outcome::Failed(message)
    }

    fn dispatch(&mut self, command: &str, plan: ExecutionPlan) -> Result<Outcome> {
        match plan {
            ExecutionPlan::Builtin(builtin) => self.run_builtin(command, builtin),
            ExecutionPlan::ShellMutating { kind, target } => {
                self.run_mutating(command, kind, &target)?;
                Ok(Outcome::None)
            }
            ExecutionPlan::StreamingInteractive(cmd) => {
                self.run_streaming(&cmd)?;
                Ok(Outcome::None)
            }
            ExecutionPlan::PassthroughInteractive(cmd) => {
                self.run_passthrough(&cmd)?;
                Ok(Outcome::None)
            }
            ExecutionPlan::Regular {
                command,
                needs_interpreter,
            } => {
                self.run_regular(&command, needs_interpreter)?;
                Ok(Outcome::None)
            }
        }
    }

    fn run_builtin(&mut self, command: &str, builtin: Builtin) -> Result<Outcome> {
        match builtin {
            Builtin::Exit => return Ok(Outcome::Exit),
            Builtin::Clear => self.ui.clear_screen(),
            Builtin::Help => self.ui.show_help(),
            Builtin::Cd(target) => self.change_directory(command, target.as_deref())?,
            Builtin::Deactivate => self.deactivate(command)?,
            Builtin::Environment(name) => {
                let env_command = EnvCommand::parse(&name)?;
                let inputs = StatusInputs {
                    cwd: current_dir()?,
                    interpreter: self.runner.shell().executable.display().to_string(),
                    context_entries: self.context.entry_count(),
                };
                env_command.run(&inputs, &mut self.ui);
                self.context.add_shell_context(
                    command,
                    &format!("Environment command '{}' executed", env_command.name()),
                );
            }
        }
        Ok(Outcome::None)
    }

    fn change_directory(&mut self, command: &str, target: Option<&str>) -> Result<()> {
        let path = match target {
            Some(raw) => expand_tilde(raw),
            None => dirs::home_dir().unwrap_or_else(|| PathBuf::from("/")),
        };
        std::env::set_current_dir(&path)
            .map_err(|source| ShellError::ChangeDirectory { path, source })?;

        let new_dir = current_dir()?;
        self.update_completion_cache(Some(&new_dir));
        self.ui.show_directory_change(command, &new_dir);
        self.context.add_shell_context(
            command,
            &format!("Changed directory to: {}", new_dir.display()),
        );
        Ok(())
    }

    fn deactivate(&mut self, command: &str) -> Result<()> {
        let report = env::deactivate()?;
        let message = report.message();
        self.ui.success(&message);
        self.context.add_shell_context(command, &message);
        if !report.removed.is_empty() {
            self.ui.message(&format!(
                "Removed environment variables: {}",
                report.removed.join(", ")
            ));
        }
        self.ui
            .message(&format!("Updated PATH: {}...", env::path_head()));
        Ok(())
    }

    fn run_mutating(&mut self, command: &str, kind: MutationKind, target: &str) -> Result<()> {
        let script = match kind {
            MutationKind::Source | MutationKind::ActivateScript => {
                if target.is_empty() {
                    return Err(ShellError::MissingOperand {
                        command: kind.label().to_string(),
                    });
                }
                let path = expand_tilde(target);
                if !path.exists() {
                    return Err(ShellError::FileNotFound {
                        command: kind.label().to_string(),
                        path,
                    });
                }
                format!(
                    "source {} && env",
                    shell_quote(command, &path.to_string_lossy())?
                )
            }
            MutationKind::CondaActivate => {
                let conda_bin = std::env::var("CONDA_EXE")
                    .ok()
                    .filter(|exe| !exe.is_empty())
                    .and_then(|exe| Path::new(&exe).parent().map(Path::to_path_buf))
                    .ok_or_else(|| ShellError::CondaNotFound {
                        env: target.to_string(),
                    })?;
                format!(
                    "source {} && conda activate {} && env",
                    shell_quote(command, &conda_bin.join("activate").to_string_lossy())?,
                    shell_quote(command, target)?
                )
            }
        };

        let cwd = current_dir()?;
        let before = EnvironmentSnapshot::capture();
        let mut spinner = self.ui.start_spinner(&format!("Executing: {}", command));
        let result = self
            .runner
            .run_captured(&Invocation::Interpreter(script), &cwd);
        spinner.finish_clear();

        if result.is_spawn_failure() {
            return Err(ShellError::SpawnFailed {
                command: command.to_string(),
                message: result.stderr,
            });
        }
        if !result.success() {
            let stderr = result.stderr.trim();
            return Err(ShellError::ScriptFailed {
                command: command.to_string(),
                message: if stderr.is_empty() {
                    "command failed".to_string()
                } else {
                    stderr.to_string()
                },
            });
        }

        let diff = before.diff(&EnvironmentSnapshot::from_env_output(&result.stdout));
        diff.apply();
        let summary = diff.summary(command);
        self.ui.success(&summary);
        self.context.add_shell_context(command, &summary);
        if !diff.is_empty() {
            self.ui.show_env_changes(&diff);
        }
        Ok(())
    }

    fn run_streaming(&mut self, command: &str) -> Result<()> {
        let cwd = current_dir()?;
        let ui = &mut self.ui;
        let spawned = self.runner.run_streaming(command, &cwd, || {
            let prompt = Prompt::password("sudo_password", "sudo password");
            ui.prompt(&prompt).ok().map(|p| p.trim().to_string())
        });

        let mut process = match spawned {
            Ok(Some(process)) => process,
            Ok(None) => {
                self.ui
                    .warning("Cancelled command: sudo password not provided.");
                return Ok(());
            }
            Err(ShellError::SpawnFailed { message, .. }) => {
                self.ui
                    .error(&format!("Streaming setup failed: {}", message));
                return self.run_passthrough(command);
            }
            Err(e) => return Err(e),
        };

        let outcome = self.renderer.stream_shell_command(command, &mut process);
        process.close_streams();

        let record = if outcome.cancelled {
            let partial = outcome.output.trim_end();
            if partial.is_empty() {
                STREAM_CANCELLED.to_string()
            } else {
                format!("{}\n{}", partial, STREAM_CANCELLED)
            }
        } else if outcome.output.is_empty() {
            match outcome.exit_code {
                Some(code) => format!("Exit code: {}", code),
                None => "Exit code: unknown".to_string(),
            }
        } else {
            outcome.output
        };
        self.context.add_shell_context(command, &record);
        Ok(())
    }

    fn run_passthrough(&mut self, command: &str) -> Result<()> {
        let cwd = current_dir()?;
        self.ui.show_interactive_start(command);

        let guard = InterruptGuard::install();
        let result = self.runner.run_passthrough(command, &cwd);
        let interrupted = guard.interrupted();
        drop(guard);

        if result.is_spawn_failure() {
            return Err(ShellError::SpawnFailed {
                command: command.to_string(),
                message: result.stderr,
            });
        }
        if interrupted && !result.success() {
            self.ui.warning("Interactive mode interrupted");
            self.context
                .add_shell_context(command, "Interactive command interrupted by user");
            return Ok(());
        }

        self.ui.show_interactive_end(command, result.exit_code);
        self.context.add_shell_context(
            command,
            &format!(
                "Interactive command completed with exit code: {}",
                result.exit_code
            ),
        );
        Ok(())
    }

    fn run_regular(&mut self, command: &str, needs_interpreter: bool) -> Result<()> {
        let cwd = current_dir()?;
        let invocation = Invocation::for_command(command, needs_interpreter);

        let guard = InterruptGuard::install();
        let mut spinner = self.ui.start_spinner(&format!("Executing: {}", command));
        let result = self.runner.run_captured(&invocation, &cwd);
        spinner.finish_clear();
        let interrupted = guard.interrupted();
        drop(guard);

        if result.is_spawn_failure() {
            return Err(ShellError::SpawnFailed {
                command: command.to_string(),
                message: result.stderr,
            });
        }
        if interrupted {
            self.ui.warning(INTERRUPTED);
            self.context.add_shell_context(command, INTERRUPTED);
            return Ok(());
        }

        let base = base_command(command).unwrap_or("");
        if self.config.is_ls_command(base) {
            self.ui.show_listing(command, &result, &cwd);
        } else {
            self.ui.show_shell_output(command, &result);
        }
        self.context
            .add_shell_context(command, &result.combined_output());

        if self.config.is_file_mutating(base) {
            tracing::debug!("{} may have changed {}", base, cwd.display());
            self.update_completion_cache(Some(&cwd));
        }
        Ok(())
    }
}

/// Quote `word` for interpolation into an interpreter script.
fn shell_quote(command: &str, word: &str) -> Result<String> {
    shlex::try_quote(word)
        .map(|quoted| quoted.into_owned())
        .map_err(|e| ShellError::ScriptFailed {
            command: command.to_string(),
            message: e.to_string(),
        })
}

fn current_dir() -> Result<PathBuf> {
    Ok(std::env::current_dir()?)
}

/// Text shown for an error; unexpected failures get an `Error:` prefix.
fn user_message(error: &ShellError) -> String {
    match error {
        ShellError::Io(_) | ShellError::Other(_) => format!("Error: {}", error),
        _ => error.to_string(),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unexpected failure".to_string()
    }
}
