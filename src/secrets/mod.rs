//! secrets
//!
//! Secret storage for the session credential and identity.
//!
//! # Architecture
//!
//! Secrets are stored through the `SecretStore` trait:
//!
//! - [`FileSecretStore`]: `~/.orgdesk/secrets.toml` (default)
//! - [`MemorySecretStore`]: process-local, used by tests and embedders
//!
//! # Security
//!
//! - Secrets are **never** logged or included in error messages
//! - The file store uses 0600 permissions on Unix
//! - File writes are atomic (temp file + rename)
//!
//! # Example
//!
//! ```ignore
//! use orgdesk::secrets::{create_store, SecretStore};
//!
//! let store = create_store(None)?;
//! if let Some(token) = store.get("session.credential")? {
//!     // Use token (never print it!)
//! }
//! ```

mod file_store;
mod memory_store;
mod traits;

use std::path::Path;

pub use file_store::FileSecretStore;
pub use memory_store::{FailOn, MemorySecretStore};
pub use traits::{SecretError, SecretStore};

/// Create the secret store used by the CLI.
///
/// Uses `path` when configured (`secrets.path`), otherwise the default
/// location under the home directory.
///
/// # Errors
///
/// Returns an error if no path is given and the home directory is unknown.
pub fn create_store(path: Option<&Path>) -> Result<Box<dyn SecretStore>, SecretError> {
    match path {
        Some(p) => Ok(Box::new(FileSecretStore::with_path(p))),
        None => Ok(Box::new(FileSecretStore::new()?)),
    }
}
