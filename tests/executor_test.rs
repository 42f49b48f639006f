//! End-to-end tests for `ShellExecutor::execute` with mock rendering.
#![cfg(unix)]

use std::fs;
use std::path::{Path, PathBuf};

use hybridshell::config::{CompletionSettings, ShellConfig};
use hybridshell::context::ShellContext;
use hybridshell::shell::{Outcome, ShellExecutor, ShellInfo};
use hybridshell::ui::{MockStreamRenderer, MockUI};
use serial_test::serial;
use tempfile::TempDir;

type TestExecutor = ShellExecutor<MockUI, MockStreamRenderer, ShellContext>;

/// Restores the working directory when dropped.
struct CwdGuard(PathBuf);

impl CwdGuard {
    fn enter(dir: &Path) -> Self {
        let previous = std::env::current_dir().unwrap();
        std::env::set_current_dir(dir).unwrap();
        Self(previous)
    }
}

impl Drop for CwdGuard {
    fn drop(&mut self) {
        let _ = std::env::set_current_dir(&self.0);
    }
}

fn quiet_config() -> ShellConfig {
    ShellConfig {
        completion: CompletionSettings {
            bootstrap_scripts: vec![],
            script_dirs: vec![],
            ..CompletionSettings::default()
        },
        ..ShellConfig::default()
    }
}

fn executor_with(config: ShellConfig, shell: &str, renderer: MockStreamRenderer) -> TestExecutor {
    ShellExecutor::new(config, ShellInfo::new(shell), MockUI::new(), renderer, ShellContext::new(10))
        .with_streaming_support(true)
}

fn executor() -> TestExecutor {
    executor_with(quiet_config(), "/bin/sh", MockStreamRenderer::new())
}

fn streaming_config() -> ShellConfig {
    let mut config = quiet_config();
    config.interactive_commands.insert("seq".into());
    config.streaming_commands.insert("seq".into());
    config
}

fn latest_output(exec: &TestExecutor) -> String {
    exec.context().latest().map(|e| e.output.clone()).unwrap_or_default()
}

#[test]
#[serial]
fn regular_command_output_is_shown_and_recorded() {
    let mut exec = executor();
    assert_eq!(exec.execute("echo hello"), Outcome::None);

    let (command, result) = &exec.ui().shell_outputs()[0];
    assert_eq!(command, "echo hello");
    assert_eq!(result.stdout, "hello\n");
    assert_eq!(latest_output(&exec), "hello\n");
}

#[test]
#[serial]
fn shell_syntax_runs_through_the_interpreter() {
    let mut exec = executor();
    exec.execute("echo a && echo b | tr b c");
    assert_eq!(exec.ui().shell_outputs()[0].1.stdout, "a\nc\n");
}

#[test]
#[serial]
fn failing_command_is_not_an_executor_error() {
    let mut exec = executor();
    assert_eq!(exec.execute("sh -c 'echo oops >&2; exit 4'"), Outcome::None);
    let result = &exec.ui().shell_outputs()[0].1;
    assert_eq!(result.exit_code, 4);
    assert!(result.stderr.contains("oops"));
    assert!(exec.ui().errors().is_empty());
}

#[test]
#[serial]
fn missing_program_reports_a_spawn_failure() {
    let mut exec = executor();
    let outcome = exec.execute("hybridshell-no-such-program --flag");
    assert!(matches!(outcome, Outcome::Failed(ref msg) if msg.contains("failed to start")));
    assert_eq!(exec.ui().errors().len(), 1);
    assert!(latest_output(&exec).contains("failed to start"));
}

#[test]
#[serial]
fn cd_changes_the_process_directory() {
    let temp = TempDir::new().unwrap();
    let _cwd = CwdGuard::enter(&std::env::temp_dir());
    let target = temp.path().canonicalize().unwrap();

    let mut exec = executor();
    let outcome = exec.execute(&format!("cd {}", target.display()));
    assert_eq!(outcome, Outcome::None);

    assert_eq!(std::env::current_dir().unwrap().canonicalize().unwrap(), target);
    assert_eq!(exec.ui().directory_changes().len(), 1);
    assert!(latest_output(&exec).starts_with("Changed directory to: "));
    assert!(exec.ui().shell_outputs().is_empty());
}

#[test]
#[serial]
fn cd_to_missing_directory_keeps_the_cwd() {
    let temp = TempDir::new().unwrap();
    let _cwd = CwdGuard::enter(temp.path());
    let before = std::env::current_dir().unwrap();

    let mut exec = executor();
    let outcome = exec.execute("cd does-not-exist");
    assert!(matches!(outcome, Outcome::Failed(ref msg) if msg.starts_with("cd: does-not-exist")));
    assert_eq!(std::env::current_dir().unwrap(), before);
}

#[test]
#[serial]
fn ls_output_goes_to_the_listing_view() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("notes.txt"), "hi").unwrap();
    let _cwd = CwdGuard::enter(temp.path());

    let mut exec = executor();
    exec.execute("ls -l");
    assert_eq!(exec.ui().listings().len(), 1);
    assert!(exec.ui().listings()[0].2.stdout.contains("notes.txt"));
    assert!(exec.ui().shell_outputs().is_empty());
    assert!(latest_output(&exec).contains("notes.txt"));
}

#[test]
#[serial]
fn file_mutating_command_invalidates_the_completion_cache() {
    let temp = TempDir::new().unwrap();
    let _cwd = CwdGuard::enter(temp.path());
    let cwd = std::env::current_dir().unwrap();

    let mut exec = executor();
    exec.completer().complete("cat ", 4, &cwd);
    assert!(exec.completer().is_cached(&cwd));

    exec.execute("touch fresh.txt");
    assert!(!exec.completer().is_cached(&cwd));

    let candidates = exec.completer().complete("cat ", 4, &cwd);
    assert!(candidates.iter().any(|c| c.replacement == "fresh.txt"));
}

#[test]
#[serial]
fn read_only_command_keeps_the_completion_cache() {
    let temp = TempDir::new().unwrap();
    let _cwd = CwdGuard::enter(temp.path());
    let cwd = std::env::current_dir().unwrap();

    let mut exec = executor();
    exec.completer().complete("cat ", 4, &cwd);
    exec.execute("echo untouched");
    assert!(exec.completer().is_cached(&cwd));
}

#[test]
#[serial]
fn source_applies_exported_variables() {
    if !Path::new("/bin/bash").exists() {
        return;
    }
    let temp = TempDir::new().unwrap();
    let script = temp.path().join("env.sh");
    fs::write(&script, "export HYBRIDSHELL_TEST_SOURCED=bar\n").unwrap();
    std::env::remove_var("HYBRIDSHELL_TEST_SOURCED");

    let mut exec = executor_with(quiet_config(), "/bin/bash", MockStreamRenderer::new());
    let command = format!("source {}", script.display());
    assert_eq!(exec.execute(&command), Outcome::None);

    assert_eq!(std::env::var("HYBRIDSHELL_TEST_SOURCED").unwrap(), "bar");
    assert!(exec
        .ui()
        .successes()
        .iter()
        .any(|s| s.starts_with(&format!("{} completed successfully", command))));
    assert!(exec
        .ui()
        .env_lines()
        .iter()
        .any(|l| l.contains("+HYBRIDSHELL_TEST_SOURCED=bar")));

    std::env::remove_var("HYBRIDSHELL_TEST_SOURCED");
}

#[test]
#[serial]
fn failing_source_script_is_reported() {
    if !Path::new("/bin/bash").exists() {
        return;
    }
    let temp = TempDir::new().unwrap();
    let script = temp.path().join("broken.sh");
    fs::write(&script, "echo 'bad things' >&2\nreturn 1\n").unwrap();

    let mut exec = executor_with(quiet_config(), "/bin/bash", MockStreamRenderer::new());
    let outcome = exec.execute(&format!("source {}", script.display()));
    assert!(matches!(outcome, Outcome::Failed(ref msg) if msg.contains("bad things")));
}

#[test]
#[serial]
fn leading_assignment_runs_through_the_interpreter() {
    let mut exec = executor();
    assert_eq!(exec.execute("GREETING=hello printenv GREETING"), Outcome::None);
    assert_eq!(exec.ui().shell_outputs()[0].1.stdout, "hello\n");
    assert!(exec.ui().errors().is_empty());
}

#[test]
#[serial]
fn interpreter_builtins_do_not_fail_to_start() {
    let mut exec = executor();
    for command in ["type ls", "umask", "command -v sh"] {
        assert_eq!(exec.execute(command), Outcome::None, "{command}");
    }
    assert!(exec.ui().errors().is_empty());
    assert_eq!(exec.ui().shell_outputs().len(), 3);
    assert!(exec.ui().shell_outputs().iter().all(|(_, r)| r.success()));
}

#[test]
#[serial]
fn source_path_with_dollar_sign_is_not_expanded() {
    if !Path::new("/bin/bash").exists() {
        return;
    }
    let temp = TempDir::new().unwrap();
    let dir = temp.path().join("cost$HOME");
    fs::create_dir(&dir).unwrap();
    let script = dir.join("env.sh");
    fs::write(&script, "export HYBRIDSHELL_TEST_QUOTED=1\n").unwrap();
    std::env::remove_var("HYBRIDSHELL_TEST_QUOTED");

    let mut exec = executor_with(quiet_config(), "/bin/bash", MockStreamRenderer::new());
    assert_eq!(exec.execute(&format!("source {}", script.display())), Outcome::None);
    assert_eq!(std::env::var("HYBRIDSHELL_TEST_QUOTED").as_deref(), Ok("1"));

    std::env::remove_var("HYBRIDSHELL_TEST_QUOTED");
}

#[test]
#[serial]
fn activate_script_missing_is_reported() {
    let mut exec = executor();
    let outcome = exec.execute("/no/such/venv/bin/activate");
    assert_eq!(
        outcome,
        Outcome::Failed("activate: /no/such/venv/bin/activate: No such file or directory".into())
    );
}

#[test]
#[serial]
fn activate_script_exports_into_the_session() {
    if !Path::new("/bin/bash").exists() {
        return;
    }
    let temp = TempDir::new().unwrap();
    let bin = temp.path().join("venv").join("bin");
    fs::create_dir_all(&bin).unwrap();
    let script = bin.join("activate");
    fs::write(
        &script,
        "export HYBRIDSHELL_TEST_ACTIVATED=yes\nexport HYBRIDSHELL_TEST_PROMPT=\"(venv) \"\n",
    )
    .unwrap();
    std::env::remove_var("HYBRIDSHELL_TEST_ACTIVATED");
    std::env::remove_var("HYBRIDSHELL_TEST_PROMPT");

    let mut exec = executor_with(quiet_config(), "/bin/bash", MockStreamRenderer::new());
    let command = script.display().to_string();
    assert_eq!(exec.execute(&command), Outcome::None);

    assert_eq!(std::env::var("HYBRIDSHELL_TEST_ACTIVATED").as_deref(), Ok("yes"));
    assert!(exec
        .ui()
        .env_lines()
        .iter()
        .any(|l| l.contains("+HYBRIDSHELL_TEST_ACTIVATED=yes")));
    assert!(exec.ui().successes()[0].starts_with(&format!("{} completed successfully", command)));

    std::env::remove_var("HYBRIDSHELL_TEST_ACTIVATED");
    std::env::remove_var("HYBRIDSHELL_TEST_PROMPT");
}

#[test]
#[serial]
fn conda_activate_without_conda_is_reported() {
    let saved = std::env::var_os("CONDA_EXE");
    std::env::remove_var("CONDA_EXE");

    let mut exec = executor();
    let outcome = exec.execute("activate ml");
    assert_eq!(
        outcome,
        Outcome::Failed("activate: conda not found, cannot activate environment 'ml'".into())
    );
    assert_eq!(
        latest_output(&exec),
        "activate: conda not found, cannot activate environment 'ml'"
    );

    if let Some(value) = saved {
        std::env::set_var("CONDA_EXE", value);
    }
}

#[test]
#[serial]
fn deactivate_without_environment_fails() {
    std::env::remove_var("VIRTUAL_ENV");
    std::env::remove_var("CONDA_DEFAULT_ENV");

    let mut exec = executor();
    let outcome = exec.execute("deactivate");
    assert_eq!(
        outcome,
        Outcome::Failed("deactivate: No virtual environment currently activated".into())
    );
}

#[test]
#[serial]
fn deactivate_leaves_the_virtualenv() {
    let original_path = std::env::var("PATH").unwrap_or_default();
    std::env::remove_var("CONDA_DEFAULT_ENV");
    std::env::set_var("VIRTUAL_ENV", "/opt/envs/demo");
    std::env::set_var("PATH", format!("/opt/envs/demo/bin:{}", original_path));

    let mut exec = executor();
    assert_eq!(exec.execute("deactivate"), Outcome::None);

    assert!(exec
        .ui()
        .has_success("Deactivated virtualenv/venv environment: demo"));
    assert!(std::env::var_os("VIRTUAL_ENV").is_none());
    assert!(!std::env::var("PATH").unwrap().contains("/opt/envs/demo/bin"));

    std::env::set_var("PATH", original_path);
}

#[test]
#[serial]
fn streaming_command_is_rendered_live() {
    let mut exec = executor_with(streaming_config(), "/bin/sh", MockStreamRenderer::new());
    assert_eq!(exec.execute("seq 1 3"), Outcome::None);

    assert_eq!(exec.renderer().streamed(), ["seq 1 3"]);
    let recorded = latest_output(&exec);
    assert!(recorded.contains('1'));
    assert!(recorded.contains('3'));
}

#[test]
#[serial]
fn cancelled_stream_keeps_partial_output() {
    let mut exec = executor_with(
        streaming_config(),
        "/bin/sh",
        MockStreamRenderer::cancelling(),
    );
    exec.execute("seq 1 1000000");
    assert!(latest_output(&exec).ends_with("Streaming command cancelled by user"));
}

#[test]
#[serial]
fn sudo_without_password_is_cancelled() {
    let mut exec = executor_with(streaming_config(), "/bin/sh", MockStreamRenderer::new());
    assert_eq!(exec.execute("sudo seq 1 2"), Outcome::None);

    assert_eq!(exec.ui().prompts_shown(), ["sudo_password"]);
    assert!(exec
        .ui()
        .has_warning("Cancelled command: sudo password not provided."));
    assert!(exec.renderer().streamed().is_empty());
}

#[test]
#[serial]
fn interactive_command_reports_its_exit_code() {
    if !Path::new("/bin/bash").exists() {
        return;
    }
    let mut exec = executor();
    exec.execute("bash -c 'exit 3'");

    assert_eq!(exec.ui().interactive_starts(), ["bash -c 'exit 3'"]);
    assert_eq!(exec.ui().interactive_ends()[0].1, 3);
    assert_eq!(
        latest_output(&exec),
        "Interactive command completed with exit code: 3"
    );
}

#[test]
#[serial]
fn status_command_renders_tables() {
    let mut exec = executor();
    exec.execute("echo warmup");
    assert_eq!(exec.execute("!status"), Outcome::None);

    let (title, table) = &exec.ui().tables()[0];
    assert_eq!(title, "System Status");
    assert!(table.row_count() > 0);
    assert_eq!(latest_output(&exec), "Environment command 'status' executed");
}

#[test]
fn blank_input_records_nothing() {
    let mut exec = executor();
    assert_eq!(exec.execute("   \t"), Outcome::None);
    assert!(exec.context().is_empty());
}
