//! cli
//!
//! Command-line interface layer for orgdesk.
//!
//! # Responsibilities
//!
//! - Parse command-line arguments and global flags
//! - Open the session and client for commands that talk to the server
//! - Delegate to command handlers
//!
//! # Architecture
//!
//! The CLI layer is thin. It parses arguments via clap and drives the
//! [`crate::console`] views, which own all data flow. Handlers only collect
//! input and print what the views hold.

pub mod args;
pub mod commands;

pub use args::{Cli, Shell};

use anyhow::Result;

use crate::ui::output::Verbosity;

/// Flags every command handler sees.
#[derive(Debug, Clone, Copy, Default)]
pub struct Context {
    pub debug: bool,
    pub quiet: bool,
    pub interactive: bool,
}

impl Context {
    pub fn from_cli(cli: &Cli) -> Self {
        Self {
            debug: cli.debug,
            quiet: cli.quiet,
            interactive: cli.interactive(),
        }
    }

    pub fn verbosity(&self) -> Verbosity {
        Verbosity::from_flags(self.quiet, self.debug)
    }
}

/// Run the CLI application.
///
/// This is the main entry point called from `main.rs`.
pub fn run(cli: Cli) -> Result<()> {
    let ctx = Context::from_cli(&cli);
    commands::dispatch(cli.command, &ctx)
}
