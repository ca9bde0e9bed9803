//! auth - session and access control
//!
//! # Architecture
//!
//! - [`SessionStore`] owns the current [`Session`] and persists it through a
//!   [`SecretStore`](crate::secrets::SecretStore)
//! - [`RouteGuard`] derives access decisions from the store and redirects to
//!   the login view when access is denied
//!
//! There is no global session. The store is built once per process and shared
//! as `Arc<SessionStore>` with everything that needs it.
//!
//! # Security
//!
//! The credential never appears in:
//! - logs (including --debug)
//! - error messages
//! - debug output
//!
//! [`Credential`] implements a redacting `Debug`.
//!
//! # Example
//!
//! ```ignore
//! use orgdesk::auth::{RouteGuard, SessionStore};
//! use orgdesk::console::navigation::Navigator;
//!
//! let store = SessionStore::restored(secrets::create_store(None)?, Navigator::default());
//! let mut guard = RouteGuard::new(&store);
//! if guard.evaluate() == GuardDecision::Allowed {
//!     // render protected content
//! }
//! ```

mod errors;
pub mod guard;
pub mod session;

pub use errors::AuthError;
pub use guard::{is_allowed, GuardDecision, RouteGuard};
pub use session::{
    Credential, Identity, Session, SessionStatus, SessionStore, CREDENTIAL_KEY, IDENTITY_KEY,
};
