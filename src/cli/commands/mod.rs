//! cli::commands
//!
//! Command dispatch and handlers.
//!
//! # Architecture
//!
//! Each command handler:
//! 1. Validates command-specific arguments
//! 2. Drives a console view (list, form or card)
//! 3. Formats and displays output
//!
//! # Async Commands
//!
//! Commands that talk to the server are async. Each one builds a tokio
//! runtime and blocks on its async body, so the rest of the CLI stays
//! synchronous.

mod completion;
mod config_cmd;
mod departments;
mod session;
mod sub_departments;

pub use completion::completion;
pub use session::{login, logout, status};

use std::future::Future;
use std::sync::Arc;

use anyhow::{Context as _, Result};

use super::args::{Command, ConfigAction};
use super::Context;
use crate::api::{ApiError, AuthClassifier, ClientFacade, HttpTransport};
use crate::auth::{AuthError, GuardDecision, RouteGuard, SessionStore};
use crate::console::{CardError, FormError, Navigator};
use crate::core::config::Config;
use crate::secrets;

/// Dispatch a command to its handler.
pub fn dispatch(command: Command, ctx: &Context) -> Result<()> {
    match command {
        Command::Login {
            username,
            password_stdin,
        } => login(ctx, username.as_deref(), password_stdin),
        Command::Logout => logout(ctx),
        Command::Status => status(ctx),
        Command::Departments { action } => departments::run(ctx, action),
        Command::SubDepartments { action } => sub_departments::run(ctx, action),
        Command::Config { action } => match action {
            ConfigAction::Get { key } => config_cmd::get(ctx, &key),
            ConfigAction::Set { key, value } => config_cmd::set(ctx, &key, &value),
            ConfigAction::List => config_cmd::list(ctx),
        },
        Command::Completion { shell } => completion(shell),
    }
}

/// Run an async command body to completion.
pub(crate) fn block_on<F: Future>(fut: F) -> Result<F::Output> {
    let rt = tokio::runtime::Runtime::new().context("Failed to start async runtime")?;
    Ok(rt.block_on(fut))
}

/// Everything a server-facing command needs: configuration, the restored
/// session and the client facade bound to it.
pub(crate) struct App {
    pub config: Config,
    pub session: Arc<SessionStore>,
    pub facade: Arc<ClientFacade>,
    /// Whether a stored session was restored when the command started.
    restored_signed_in: bool,
}

impl App {
    pub fn open() -> Result<Self> {
        let config = Config::load().context("Failed to load config")?;
        let store =
            secrets::create_store(config.secrets_path()).context("Failed to open session storage")?;
        let session = SessionStore::restored(store, Navigator::default());
        let transport =
            HttpTransport::new(config.endpoint()).context("Failed to create HTTP client")?;
        let facade = ClientFacade::new(Arc::clone(&session), Arc::new(transport)).with_classifier(
            AuthClassifier {
                match_unauthorized_text: config.match_unauthorized_text(),
            },
        );
        tracing::debug!(endpoint = config.endpoint(), "opened app");
        let restored_signed_in = session.is_authenticated();
        Ok(Self {
            config,
            session,
            facade: Arc::new(facade),
            restored_signed_in,
        })
    }

    /// Refuse protected commands without a session. The guard also moves
    /// the navigator to the login route.
    pub fn require_session(&self) -> Result<()> {
        let mut guard = RouteGuard::new(&self.session);
        match guard.evaluate() {
            GuardDecision::Allowed => Ok(()),
            GuardDecision::Pending | GuardDecision::Denied => Err(AuthError::NotAuthenticated.into()),
        }
    }

    /// Turn an API failure into the error shown to the user. A failure that
    /// ended the session says so instead of echoing the server text.
    pub fn api_error(&self, err: ApiError) -> anyhow::Error {
        session_error(
            self.restored_signed_in,
            self.session.is_authenticated(),
            err,
        )
    }

    pub fn form_error(&self, err: FormError) -> anyhow::Error {
        match err {
            FormError::Api(api) => self.api_error(api),
            other => other.into(),
        }
    }

    pub fn card_error(&self, err: CardError) -> anyhow::Error {
        match err {
            CardError::Api(api) => self.api_error(api),
            CardError::Form(form) => self.form_error(form),
            other => other.into(),
        }
    }
}

/// Only a session that existed before the call can have been rejected by
/// it. Anonymous failures, such as a wrong password, keep the server text.
fn session_error(was_signed_in: bool, signed_in: bool, err: ApiError) -> anyhow::Error {
    if was_signed_in && !signed_in {
        return AuthError::SessionRejected.into();
    }
    err.into()
}
