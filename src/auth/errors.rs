//! auth::errors
//!
//! Session error types.
//!
//! # Example
//!
//! ```
//! use orgdesk::auth::AuthError;
//!
//! let err = AuthError::NotAuthenticated;
//! assert!(err.to_string().contains("orgdesk login"));
//! ```

use thiserror::Error;

/// Errors from session operations.
///
/// # Security
///
/// Messages never include the credential.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AuthError {
    /// No session exists.
    #[error("not logged in. Run 'orgdesk login'.")]
    NotAuthenticated,

    /// The server rejected the session and it was cleared.
    #[error("session expired or was rejected. Run 'orgdesk login' again.")]
    SessionRejected,

    /// The credential handed to `login` was empty.
    #[error("login returned an empty credential")]
    EmptyCredential,

    /// The identity could not be encoded for storage.
    #[error("invalid identity: {0}")]
    InvalidIdentity(String),

    /// Reading or writing the persisted session failed.
    #[error("session storage error: {0}")]
    Persistence(String),
}

impl AuthError {
    /// Check if this error can be resolved by running `orgdesk login`.
    pub fn needs_reauth(&self) -> bool {
        matches!(
            self,
            AuthError::NotAuthenticated | AuthError::SessionRejected | AuthError::Persistence(_)
        )
    }
}

impl From<crate::secrets::SecretError> for AuthError {
    fn from(err: crate::secrets::SecretError) -> Self {
        AuthError::Persistence(err.to_string())
    }
}

impl From<serde_json::Error> for AuthError {
    fn from(err: serde_json::Error) -> Self {
        AuthError::InvalidIdentity(err.to_string())
    }
}
