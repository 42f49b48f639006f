//! hybridshell entry point.

use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use hybridshell::cli::Cli;
use hybridshell::config::load_config;
use hybridshell::context::ShellContext;
use hybridshell::repl;
use hybridshell::shell::{Outcome, ShellExecutor, ShellInfo};
use hybridshell::ui::{create_ui, TerminalStreamRenderer};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize the tracing subscriber for logging.
///
/// Log level is controlled by:
/// 1. `--debug` flag sets level to DEBUG
/// 2. `RUST_LOG` environment variable (if set)
/// 3. Default is WARN
///
/// Logs go to stderr so they never mix with command output.
fn init_tracing(debug: bool) {
    let filter = if debug {
        EnvFilter::new("hybridshell=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("hybridshell=warn"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn run(cli: &Cli) -> anyhow::Result<ExitCode> {
    let mut config = load_config(cli.config.as_deref()).context("Failed to load configuration")?;
    if cli.show_hidden {
        config.completion.show_hidden = true;
    }

    let shell = ShellInfo::resolve(cli.shell.as_deref(), &config);
    tracing::debug!("Using interpreter {}", shell.executable.display());

    let ui = create_ui(!cli.no_color, cli.output_mode());
    let theme = ui.theme().clone();
    let renderer = TerminalStreamRenderer::new(theme.clone());
    let context = ShellContext::new(config.max_shell_context);
    let mut executor = ShellExecutor::new(config, shell, ui, renderer, context);

    if let Some(command) = &cli.command {
        return Ok(match executor.execute(command) {
            Outcome::Failed(_) => ExitCode::from(1),
            Outcome::None | Outcome::Exit => ExitCode::SUCCESS,
        });
    }

    repl::run(&mut executor, &theme)?;
    Ok(ExitCode::SUCCESS)
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.debug);

    tracing::debug!("hybridshell starting with args: {:?}", cli);

    // Handle --no-color
    if cli.no_color {
        std::env::set_var("NO_COLOR", "1");
    }

    match run(&cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::from(1)
        }
    }
}
