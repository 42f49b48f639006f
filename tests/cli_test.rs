//! Integration tests for the hybridshell binary.
// The cargo_bin function is marked deprecated in favor of cargo_bin! macro,
// but both work correctly. Suppressing until assert_cmd stabilizes the new API.
#![allow(deprecated)]

use assert_cmd::cargo::cargo_bin;
use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

/// A command isolated from the user's real config and history.
fn shell_in(home: &TempDir) -> Command {
    let mut cmd = Command::new(cargo_bin("hybridshell"));
    cmd.env("HOME", home.path())
        .env_remove("HYBRIDSHELL_SHELL")
        .env("NO_COLOR", "1")
        .current_dir(home.path());
    cmd
}

#[test]
fn help_describes_the_shell() -> Result<(), Box<dyn std::error::Error>> {
    let home = TempDir::new()?;
    shell_in(&home)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--command"))
        .stdout(predicate::str::contains("--show-hidden"));
    Ok(())
}

#[test]
fn version_flag() -> Result<(), Box<dyn std::error::Error>> {
    let home = TempDir::new()?;
    shell_in(&home)
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
    Ok(())
}

#[test]
fn verbose_conflicts_with_quiet() -> Result<(), Box<dyn std::error::Error>> {
    let home = TempDir::new()?;
    shell_in(&home)
        .args(["--verbose", "--quiet", "-c", "echo hi"])
        .assert()
        .failure();
    Ok(())
}

#[cfg(unix)]
#[test]
fn runs_a_single_command() -> Result<(), Box<dyn std::error::Error>> {
    let home = TempDir::new()?;
    shell_in(&home)
        .args(["--shell", "/bin/sh", "-c", "echo hello"])
        .assert()
        .success()
        .stdout(predicate::str::contains("hello"));
    Ok(())
}

#[cfg(unix)]
#[test]
fn pipelines_go_through_the_interpreter() -> Result<(), Box<dyn std::error::Error>> {
    let home = TempDir::new()?;
    shell_in(&home)
        .args(["--shell", "/bin/sh", "-c", "printf 'one\\ntwo\\n' | tail -n 1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("two"));
    Ok(())
}

#[cfg(unix)]
#[test]
fn nonzero_exit_is_shown_not_fatal() -> Result<(), Box<dyn std::error::Error>> {
    let home = TempDir::new()?;
    shell_in(&home)
        .args(["--shell", "/bin/sh", "-c", "ls /definitely/not/here"])
        .assert()
        .success();
    Ok(())
}

#[cfg(unix)]
#[test]
fn listing_shows_directory_entries() -> Result<(), Box<dyn std::error::Error>> {
    let home = TempDir::new()?;
    fs::write(home.path().join("notes.txt"), "hi")?;
    fs::create_dir(home.path().join("src"))?;
    shell_in(&home)
        .args(["--shell", "/bin/sh", "-c", "ls"])
        .assert()
        .success()
        .stdout(predicate::str::contains("notes.txt"))
        .stdout(predicate::str::contains("src"));
    Ok(())
}

#[test]
fn unknown_environment_command_fails() -> Result<(), Box<dyn std::error::Error>> {
    let home = TempDir::new()?;
    shell_in(&home)
        .args(["-c", "!weather"])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("Unknown environment command: weather"));
    Ok(())
}

#[test]
fn cd_to_missing_directory_fails() -> Result<(), Box<dyn std::error::Error>> {
    let home = TempDir::new()?;
    shell_in(&home)
        .args(["-c", "cd /definitely/not/here"])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("cd: /definitely/not/here"));
    Ok(())
}

#[test]
fn exit_is_successful() -> Result<(), Box<dyn std::error::Error>> {
    let home = TempDir::new()?;
    shell_in(&home).args(["-c", "exit"]).assert().success();
    Ok(())
}

#[test]
fn help_command_lists_keybindings() -> Result<(), Box<dyn std::error::Error>> {
    let home = TempDir::new()?;
    shell_in(&home)
        .args(["-c", "/help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Tab"));
    Ok(())
}

#[test]
fn missing_config_file_fails() -> Result<(), Box<dyn std::error::Error>> {
    let home = TempDir::new()?;
    shell_in(&home)
        .args(["--config", "missing.yml", "-c", "echo hi"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Failed to load configuration"));
    Ok(())
}

#[test]
fn invalid_config_file_fails() -> Result<(), Box<dyn std::error::Error>> {
    let home = TempDir::new()?;
    let path = home.path().join("broken.yml");
    fs::write(&path, "max_shell_context: [not, a, number]\n")?;
    shell_in(&home)
        .arg("--config")
        .arg(&path)
        .args(["-c", "echo hi"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Failed to parse config"));
    Ok(())
}

#[cfg(unix)]
#[test]
fn user_config_is_loaded_from_home() -> Result<(), Box<dyn std::error::Error>> {
    let home = TempDir::new()?;
    let config_dir = home.path().join(".hybridshell");
    fs::create_dir_all(&config_dir)?;
    fs::write(config_dir.join("config.yml"), "shell: /bin/sh\n")?;
    shell_in(&home)
        .args(["-c", "echo from-config"])
        .assert()
        .success()
        .stdout(predicate::str::contains("from-config"));
    Ok(())
}
