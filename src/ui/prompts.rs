//! Interactive prompts.

use console::{style, Term};
use dialoguer::theme::ColorfulTheme;
use dialoguer::Password;

use crate::error::{Result, ShellError};

use super::{Prompt, PromptType};

/// Convert dialoguer errors to ShellError.
fn map_dialoguer_err(e: dialoguer::Error) -> ShellError {
    ShellError::Io(e.into())
}

/// Dialoguer theme without the default yellow `?` prefix.
fn prompt_theme() -> ColorfulTheme {
    ColorfulTheme {
        prompt_prefix: style("".to_string()),
        ..ColorfulTheme::default()
    }
}

/// Prompt the user for input.
pub fn prompt_user(prompt: &Prompt, term: &Term) -> Result<String> {
    match prompt.prompt_type {
        PromptType::Password => prompt_password(prompt, term),
    }
}

fn prompt_password(prompt: &Prompt, term: &Term) -> Result<String> {
    Password::with_theme(&prompt_theme())
        .with_prompt(&prompt.question)
        .allow_empty_password(true)
        .interact_on(term)
        .map_err(map_dialoguer_err)
}
