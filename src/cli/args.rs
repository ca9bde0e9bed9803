//! cli::args
//!
//! Command-line argument definitions using clap derive.
//!
//! # Global Flags
//!
//! These flags are available on all commands:
//! - `--help` / `-h`: Show help
//! - `--version`: Show version
//! - `--debug`: Enable debug logging
//! - `--no-interactive`: Never prompt
//! - `--quiet` / `-q`: Minimal output

use std::io::IsTerminal;

use clap::{Parser, Subcommand};

use crate::core::types::EntityId;

/// orgdesk - manage departments and sub-departments from the terminal
#[derive(Parser, Debug)]
#[command(name = "orgdesk")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Minimal output; implies --no-interactive
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable interactive prompts
    #[arg(long, global = true)]
    pub no_interactive: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Parser::parse()
    }

    /// Interactive unless `--no-interactive` or `--quiet` was given or stdin
    /// is not a terminal.
    pub fn interactive(&self) -> bool {
        !(self.no_interactive || self.quiet) && std::io::stdin().is_terminal()
    }
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Sign in and store the session
    #[command(
        name = "login",
        long_about = "Sign in with a username and password.\n\n\
            The server returns an access token, which is stored together with \
            your username in ~/.orgdesk/secrets.toml (mode 0600). Later commands \
            reuse it until you log out or the server rejects it.",
        after_help = "\
WORKFLOW EXAMPLES:
    # Prompt for username and password
    orgdesk login

    # Scripted login
    echo \"$PASSWORD\" | orgdesk login --username ada --password-stdin"
    )]
    Login {
        /// Username (prompted when omitted)
        #[arg(short, long)]
        username: Option<String>,

        /// Read the password from stdin
        #[arg(long)]
        password_stdin: bool,
    },

    /// Forget the stored session
    Logout,

    /// Show who is logged in
    Status,

    /// List and edit departments
    #[command(
        name = "departments",
        after_help = "\
WORKFLOW EXAMPLES:
    # First page
    orgdesk departments list

    # Filter the page by name
    orgdesk departments list --search eng

    # Create with sub-departments
    orgdesk departments create Engineering --sub Platform --sub Mobile

    # Rename, then delete (asks first; deletes its sub-departments too)
    orgdesk departments update 12 \"Product Engineering\"
    orgdesk departments delete 12"
    )]
    Departments {
        #[command(subcommand)]
        action: DepartmentAction,
    },

    /// List and edit sub-departments
    #[command(name = "sub-departments")]
    SubDepartments {
        #[command(subcommand)]
        action: SubDepartmentAction,
    },

    /// Get, set, or list configuration values
    #[command(
        name = "config",
        long_about = "Get, set, or list configuration values.\n\n\
            Configuration is stored in ~/.orgdesk/config.toml (or $ORGDESK_CONFIG). \
            ORGDESK_GRAPHQL_URL overrides the endpoint for a single run.",
        after_help = "\
WORKFLOW EXAMPLES:
    # List all configuration values
    orgdesk config list

    # Point at a local server
    orgdesk config set endpoint http://localhost:3000/graphql

    # Show more departments per page
    orgdesk config set page_size 25"
    )]
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Generate shell completion scripts
    #[command(
        name = "completion",
        after_help = "\
WORKFLOW EXAMPLES:
    # Bash (add to ~/.bashrc)
    orgdesk completion bash >> ~/.bashrc

    # Zsh (add to ~/.zshrc)
    orgdesk completion zsh >> ~/.zshrc"
    )]
    Completion {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Department subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum DepartmentAction {
    /// List one page of departments
    List {
        /// Page number (1-based)
        #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
        page: u32,

        /// Show only departments on the page whose name contains this text
        #[arg(long)]
        search: Option<String>,
    },
    /// Create a department
    Create {
        /// Department name
        name: String,

        /// Sub-department to create with it (repeatable)
        #[arg(long = "sub", value_name = "NAME")]
        sub_departments: Vec<String>,
    },
    /// Rename a department
    Update {
        /// Department id
        id: EntityId,
        /// New name
        name: String,
    },
    /// Delete a department and its sub-departments
    Delete {
        /// Department id
        id: EntityId,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

/// Sub-department subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum SubDepartmentAction {
    /// List all sub-departments
    List {
        /// Show only entries whose name or department name contains this text
        #[arg(long)]
        search: Option<String>,
    },
    /// Create a sub-department
    Create {
        /// Owning department id
        #[arg(long)]
        department: EntityId,
        /// Sub-department name
        name: String,
    },
    /// Rename a sub-department
    Update {
        /// Sub-department id
        id: EntityId,
        /// New name
        name: String,
    },
    /// Delete a sub-department
    Delete {
        /// Sub-department id
        id: EntityId,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

/// Config subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum ConfigAction {
    /// Get a configuration value
    Get {
        /// Configuration key
        key: String,
    },
    /// Set a configuration value
    Set {
        /// Configuration key
        key: String,
        /// Value to set
        value: String,
    },
    /// List all configuration values
    List,
}

/// Supported shells for completion
#[derive(clap::ValueEnum, Debug, Clone, Copy)]
#[allow(clippy::enum_variant_names)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
}
