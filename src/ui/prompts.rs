//! ui::prompts
//!
//! Interactive prompts and confirmations.
//!
//! # Design
//!
//! Prompts are only shown in interactive mode. In non-interactive mode,
//! operations requiring user input must either have defaults or fail
//! with a clear error message. Prompt text goes to stderr; answers are read
//! from stdin. The `*_from` variants take explicit streams for testing.

use std::io::{self, BufRead, Write};

use thiserror::Error;

/// Errors from prompts.
#[derive(Debug, Error)]
pub enum PromptError {
    #[error("prompt cancelled by user")]
    Cancelled,

    #[error("not in interactive mode")]
    NotInteractive,

    #[error("IO error: {0}")]
    IoError(String),
}

impl From<io::Error> for PromptError {
    fn from(err: io::Error) -> Self {
        PromptError::IoError(err.to_string())
    }
}

/// Prompt for confirmation (yes/no).
///
/// Returns `Ok(true)` if the user confirms, `Ok(false)` if they decline.
/// Returns `Err(PromptError::NotInteractive)` if not in interactive mode.
pub fn confirm(message: &str, default: bool, interactive: bool) -> Result<bool, PromptError> {
    if !interactive {
        return Err(PromptError::NotInteractive);
    }
    confirm_from(&mut io::stdin().lock(), &mut io::stderr(), message, default)
}

/// [`confirm`] over explicit streams. Re-asks until the answer is understood.
pub fn confirm_from(
    input: &mut impl BufRead,
    output: &mut impl Write,
    message: &str,
    default: bool,
) -> Result<bool, PromptError> {
    let options = if default { "[Y/n]" } else { "[y/N]" };
    loop {
        write!(output, "{} {} ", message, options)?;
        output.flush()?;
        let answer = read_answer(input)?;
        match parse_yes_no(&answer, default) {
            Some(choice) => return Ok(choice),
            None => writeln!(output, "Please answer y or n.")?,
        }
    }
}

/// Prompt for text input, falling back to `default` on an empty answer.
pub fn input(message: &str, default: Option<&str>, interactive: bool) -> Result<String, PromptError> {
    if !interactive {
        return Err(PromptError::NotInteractive);
    }
    input_from(&mut io::stdin().lock(), &mut io::stderr(), message, default)
}

pub fn input_from(
    input: &mut impl BufRead,
    output: &mut impl Write,
    message: &str,
    default: Option<&str>,
) -> Result<String, PromptError> {
    match default {
        Some(d) => write!(output, "{} [{}]: ", message, d)?,
        None => write!(output, "{}: ", message)?,
    }
    output.flush()?;
    let answer = read_answer(input)?;
    if answer.is_empty() {
        Ok(default.unwrap_or_default().to_string())
    } else {
        Ok(answer)
    }
}

/// Prompt for masked input (e.g., passwords).
///
/// The input is not echoed to the terminal.
pub fn password(message: &str, interactive: bool) -> Result<String, PromptError> {
    if !interactive {
        return Err(PromptError::NotInteractive);
    }
    let mut stderr = io::stderr();
    write!(stderr, "{}: ", message)?;
    stderr.flush()?;
    Ok(rpassword::read_password()?)
}

/// Read one secret line from a pipe, e.g. `--password-stdin`.
///
/// Only the trailing newline is stripped; other whitespace is part of the
/// secret.
pub fn read_secret_line(input: &mut impl BufRead) -> Result<String, PromptError> {
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Err(PromptError::Cancelled);
    }
    let trimmed = line.strip_suffix('\n').unwrap_or(&line);
    let trimmed = trimmed.strip_suffix('\r').unwrap_or(trimmed);
    Ok(trimmed.to_string())
}

/// One trimmed line. End of input cancels the prompt.
fn read_answer(input: &mut impl BufRead) -> Result<String, PromptError> {
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Err(PromptError::Cancelled);
    }
    Ok(line.trim().to_string())
}

fn parse_yes_no(answer: &str, default: bool) -> Option<bool> {
    match answer.to_ascii_lowercase().as_str() {
        "" => Some(default),
        "y" | "yes" => Some(true),
        "n" | "no" => Some(false),
        _ => None,
    }
}
