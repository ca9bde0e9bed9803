//! secrets::traits
//!
//! Secret storage trait definition.
//!
//! # Design
//!
//! The `SecretStore` trait is a small key-value interface. Keys are
//! namespaced (e.g., "session.credential") to avoid collisions.
//!
//! # Security
//!
//! Implementations MUST:
//! - Never log, print, or include secrets in error messages
//! - Use storage appropriate to the platform
//! - Be thread-safe (Send + Sync)

use thiserror::Error;

/// Errors from secret storage operations.
///
/// Note: Error messages intentionally do not include secret values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SecretError {
    /// Failed to read from secret storage.
    #[error("failed to read secret: {0}")]
    ReadError(String),

    /// Failed to write to secret storage.
    #[error("failed to write secret: {0}")]
    WriteError(String),

    /// Failed to delete from secret storage.
    #[error("failed to delete secret: {0}")]
    DeleteError(String),
}

/// Trait for secret storage providers.
///
/// Implementations must be thread-safe (Send + Sync) and must never
/// log, print, or include secret values in error messages.
pub trait SecretStore: Send + Sync {
    /// Get a secret by key.
    ///
    /// Returns `Ok(None)` if the secret does not exist.
    fn get(&self, key: &str) -> Result<Option<String>, SecretError>;

    /// Set a secret, overwriting any existing value.
    fn set(&self, key: &str, value: &str) -> Result<(), SecretError>;

    /// Delete a secret. Deleting a missing key is not an error.
    fn delete(&self, key: &str) -> Result<(), SecretError>;

    /// Set several secrets.
    ///
    /// The default writes them one by one. Stores that can write them in one
    /// step override this so readers never see half the batch.
    fn set_many(&self, entries: &[(&str, &str)]) -> Result<(), SecretError> {
        for (key, value) in entries {
            self.set(key, value)?;
        }
        Ok(())
    }

    /// Delete several secrets.
    ///
    /// Attempts every key and reports the first failure.
    fn delete_many(&self, keys: &[&str]) -> Result<(), SecretError> {
        let mut first_err = None;
        for key in keys {
            if let Err(e) = self.delete(key) {
                first_err.get_or_insert(e);
            }
        }
        first_err.map_or(Ok(()), Err)
    }

    /// Check if a secret exists.
    fn exists(&self, key: &str) -> Result<bool, SecretError> {
        Ok(self.get(key)?.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_does_not_need_values() {
        let err = SecretError::ReadError("disk full".into());
        assert!(err.to_string().contains("read"));

        let err = SecretError::WriteError("permission denied".into());
        assert!(err.to_string().contains("write"));

        let err = SecretError::DeleteError("io error".into());
        assert!(err.to_string().contains("delete"));
    }
}
