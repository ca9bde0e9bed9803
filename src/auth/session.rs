//! auth::session
//!
//! The session store: the single owner of the current credential and identity.
//!
//! # Lifecycle
//!
//! A store starts in [`SessionStatus::Loading`]. [`SessionStore::restore`]
//! always moves it to `Authenticated` or `Anonymous`. After that only
//! [`SessionStore::login`] and [`SessionStore::logout`] change it.
//!
//! # Invariants
//!
//! - The credential and identity are present together or absent together.
//!   `SessionStatus::Authenticated` carries both, every other state carries
//!   neither.
//! - Persisted state mirrors memory: the two secret entries are written in one
//!   batch and cleared in one batch. A stored pair that is incomplete or
//!   unreadable is cleared on restore.
//!
//! Observers subscribe to a `watch` channel and see every status change.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::errors::AuthError;
use crate::console::navigation::{Navigator, Route};
use crate::secrets::SecretStore;

/// Secret key of the bearer credential.
pub const CREDENTIAL_KEY: &str = "session.credential";

/// Secret key of the JSON-encoded identity.
pub const IDENTITY_KEY: &str = "session.identity";

/// Opaque bearer credential.
///
/// `Debug` is redacted. Use [`Credential::expose`] only where the value is
/// sent or stored.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// The raw token.
    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }

    /// Value of the `authorization` header.
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.0)
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Credential").field(&"[REDACTED]").finish()
    }
}

/// Minimal user profile held alongside the credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Display name.
    pub username: String,

    /// When the session was created. Older stored identities lack it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logged_in_at: Option<DateTime<Utc>>,
}

impl Identity {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            logged_in_at: None,
        }
    }
}

/// A complete session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub credential: Credential,
    pub identity: Identity,
}

/// Session lifecycle state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionStatus {
    /// Persisted state has not been read yet.
    Loading,
    /// A complete session is installed.
    Authenticated(Session),
    /// No session.
    Anonymous,
}

impl SessionStatus {
    pub fn is_loading(&self) -> bool {
        matches!(self, SessionStatus::Loading)
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, SessionStatus::Authenticated(_))
    }

    pub fn session(&self) -> Option<&Session> {
        match self {
            SessionStatus::Authenticated(session) => Some(session),
            _ => None,
        }
    }

    pub fn credential(&self) -> Option<&Credential> {
        self.session().map(|s| &s.credential)
    }

    pub fn identity(&self) -> Option<&Identity> {
        self.session().map(|s| &s.identity)
    }
}

/// Owner of the current session.
///
/// Constructed once and shared as `Arc<SessionStore>`.
pub struct SessionStore {
    secrets: Box<dyn SecretStore>,
    navigator: Navigator,
    tx: watch::Sender<SessionStatus>,
}

impl SessionStore {
    /// Create a store in the `Loading` state.
    pub fn new(secrets: Box<dyn SecretStore>, navigator: Navigator) -> Self {
        let (tx, _rx) = watch::channel(SessionStatus::Loading);
        Self {
            secrets,
            navigator,
            tx,
        }
    }

    /// Create a store and restore it immediately.
    pub fn restored(secrets: Box<dyn SecretStore>, navigator: Navigator) -> Arc<Self> {
        let store = Arc::new(Self::new(secrets, navigator));
        store.restore();
        store
    }

    /// Read the persisted session.
    ///
    /// Installs it when both entries are present and the identity parses.
    /// Anything else (one entry missing, garbage identity, storage failure)
    /// clears both entries and leaves the store anonymous.
    pub fn restore(&self) -> SessionStatus {
        let status = match self.read_persisted() {
            Ok(Some(session)) => {
                debug!(username = %session.identity.username, "restored session");
                SessionStatus::Authenticated(session)
            }
            Ok(None) => SessionStatus::Anonymous,
            Err(reason) => {
                warn!(%reason, "discarding persisted session");
                self.clear_persisted();
                SessionStatus::Anonymous
            }
        };
        self.tx.send_replace(status.clone());
        status
    }

    /// Ok(None) means nothing is stored. Err carries why the stored pair is unusable.
    fn read_persisted(&self) -> Result<Option<Session>, String> {
        let credential = self
            .secrets
            .get(CREDENTIAL_KEY)
            .map_err(|e| e.to_string())?;
        let identity = self.secrets.get(IDENTITY_KEY).map_err(|e| e.to_string())?;

        match (credential, identity) {
            (None, None) => Ok(None),
            (Some(credential), Some(identity)) => {
                let credential = Credential::new(credential);
                if credential.is_empty() {
                    return Err("empty credential".into());
                }
                let identity: Identity = serde_json::from_str(&identity)
                    .map_err(|e| format!("unparsable identity: {}", e))?;
                Ok(Some(Session {
                    credential,
                    identity,
                }))
            }
            (Some(_), None) => Err("credential without identity".into()),
            (None, Some(_)) => Err("identity without credential".into()),
        }
    }

    /// Persist and install a new session, then navigate to the departments view.
    ///
    /// Stamps `logged_in_at` when the identity has none. A persistence failure
    /// logs out and returns [`AuthError::Persistence`].
    pub fn login(&self, credential: Credential, mut identity: Identity) -> Result<Session, AuthError> {
        if credential.is_empty() {
            return Err(AuthError::EmptyCredential);
        }
        identity.logged_in_at.get_or_insert_with(Utc::now);

        if let Err(err) = self.persist(&credential, &identity) {
            warn!(error = %err, "could not persist session, logging out");
            self.logout();
            return Err(err);
        }

        let session = Session {
            credential,
            identity,
        };
        self.tx
            .send_replace(SessionStatus::Authenticated(session.clone()));
        info!(username = %session.identity.username, "logged in");
        self.navigator.push(Route::Departments);
        Ok(session)
    }

    fn persist(&self, credential: &Credential, identity: &Identity) -> Result<(), AuthError> {
        let encoded = serde_json::to_string(identity)?;
        self.secrets.set_many(&[
            (CREDENTIAL_KEY, credential.expose()),
            (IDENTITY_KEY, &encoded),
        ])?;
        Ok(())
    }

    /// Clear the session and navigate to the login view.
    ///
    /// Idempotent. Storage failures are logged and do not stop the in-memory
    /// clear.
    pub fn logout(&self) {
        self.clear_persisted();
        let changed = self.tx.send_if_modified(|status| {
            if *status == SessionStatus::Anonymous {
                false
            } else {
                *status = SessionStatus::Anonymous;
                true
            }
        });
        if changed {
            info!("logged out");
        }
        self.navigator.push(Route::Login);
    }

    fn clear_persisted(&self) {
        if let Err(err) = self.secrets.delete_many(&[CREDENTIAL_KEY, IDENTITY_KEY]) {
            warn!(error = %err, "could not clear persisted session");
        }
    }

    /// Watch status changes.
    pub fn subscribe(&self) -> watch::Receiver<SessionStatus> {
        self.tx.subscribe()
    }

    pub fn status(&self) -> SessionStatus {
        self.tx.borrow().clone()
    }

    pub fn session(&self) -> Option<Session> {
        self.tx.borrow().session().cloned()
    }

    pub fn credential(&self) -> Option<Credential> {
        self.tx.borrow().credential().cloned()
    }

    pub fn identity(&self) -> Option<Identity> {
        self.tx.borrow().identity().cloned()
    }

    pub fn is_loading(&self) -> bool {
        self.tx.borrow().is_loading()
    }

    pub fn is_authenticated(&self) -> bool {
        self.tx.borrow().is_authenticated()
    }

    pub fn navigator(&self) -> &Navigator {
        &self.navigator
    }
}

impl fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionStore")
            .field("status", &*self.tx.borrow())
            .field("route", &self.navigator.current())
            .finish()
    }
}
