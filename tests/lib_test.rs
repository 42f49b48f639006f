//! Library integration tests.

use hybridshell::ShellError;

#[test]
fn error_types_are_public() {
    let err = ShellError::UnknownEnvironmentCommand {
        name: "weather".into(),
    };
    assert_eq!(err.to_string(), "Unknown environment command: weather");
}

#[test]
fn result_type_alias_is_public() {
    fn test_fn() -> hybridshell::Result<()> {
        Ok(())
    }
    assert!(test_fn().is_ok());
}

#[test]
fn cli_types_are_public() {
    use clap::Parser;
    use hybridshell::cli::Cli;

    let cli = Cli::parse_from(["hybridshell", "-c", "ls -la", "--show-hidden"]);
    assert_eq!(cli.command.as_deref(), Some("ls -la"));
    assert!(cli.show_hidden);
}

#[test]
fn classifier_is_public() {
    use hybridshell::config::ShellConfig;
    use hybridshell::shell::{Builtin, CommandClassifier, ExecutionPlan};

    let classifier = CommandClassifier::new(&ShellConfig::default());
    assert_eq!(
        classifier.classify("cd src"),
        Some(ExecutionPlan::Builtin(Builtin::Cd(Some("src".into()))))
    );
    assert_eq!(classifier.classify(""), None);
}

#[test]
fn completion_engine_is_public() {
    use hybridshell::completion::CompletionEngine;
    use hybridshell::config::CompletionSettings;

    let engine = CompletionEngine::new(&CompletionSettings::default())
        .with_commands(vec!["git".into(), "grep".into()]);
    let cwd = std::env::temp_dir();
    let candidates = engine.complete("gi", 2, &cwd);
    assert!(candidates.iter().any(|c| c.replacement == "git"));
}

#[test]
fn context_types_are_public() {
    use hybridshell::context::{ContextRecorder, ShellContext};

    let mut context = ShellContext::new(2);
    context.add_shell_context("pwd", "/tmp");
    assert_eq!(context.entry_count(), 1);
}

#[test]
fn ui_types_are_public() {
    use hybridshell::ui::{MockUI, OutputMode, UserInterface};

    let mut ui = MockUI::with_mode(OutputMode::Quiet);
    ui.warning("careful");
    assert!(ui.has_warning("careful"));
}
