//! secrets::file_store
//!
//! File-based secret storage.
//!
//! # Security
//!
//! - Secrets are stored in `~/.orgdesk/secrets.toml`
//! - File permissions are set to 0600 on Unix (owner read/write only)
//! - All writes are atomic (write to temp file, then rename)
//! - Secrets are NEVER logged, printed, or included in error messages
//!
//! Batched writes ([`SecretStore::set_many`], [`SecretStore::delete_many`])
//! land in a single rename, so the session credential and identity are
//! always replaced together.
//!
//! # Example
//!
//! ```ignore
//! use orgdesk::secrets::{FileSecretStore, SecretStore};
//!
//! let store = FileSecretStore::new()?;
//! store.set_many(&[("session.credential", "eyJ..."), ("session.identity", "{...}")])?;
//! ```

use std::collections::BTreeMap;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;

use super::traits::{SecretError, SecretStore};

/// File-based secret storage.
///
/// Stores secrets as a flat TOML table of strings. This is where the
/// session survives between runs.
#[derive(Debug)]
pub struct FileSecretStore {
    /// Path to the secrets file
    path: PathBuf,
}

impl FileSecretStore {
    /// Create a store at the default location, `~/.orgdesk/secrets.toml`.
    ///
    /// # Errors
    ///
    /// Returns an error if the home directory cannot be determined.
    pub fn new() -> Result<Self, SecretError> {
        let home = dirs::home_dir()
            .ok_or_else(|| SecretError::ReadError("cannot determine home directory".into()))?;
        Ok(Self {
            path: home.join(".orgdesk").join("secrets.toml"),
        })
    }

    /// Create a store at a custom path (config override, tests).
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Get the path to the secrets file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<BTreeMap<String, String>, SecretError> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }

        let content = fs::read_to_string(&self.path)
            .map_err(|e| SecretError::ReadError(format!("cannot read secrets file: {}", e)))?;

        toml::from_str(&content)
            .map_err(|e| SecretError::ReadError(format!("cannot parse secrets file: {}", e)))
    }

    fn write_all(&self, secrets: &BTreeMap<String, String>) -> Result<(), SecretError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| SecretError::WriteError(format!("cannot create directory: {}", e)))?;
        }

        let content = toml::to_string_pretty(secrets)
            .map_err(|e| SecretError::WriteError(format!("cannot serialize secrets: {}", e)))?;

        let temp_path = self.path.with_extension("tmp");
        {
            let mut file = OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .open(&temp_path)
                .map_err(|e| SecretError::WriteError(format!("cannot create temp file: {}", e)))?;

            // Restrict before any secret bytes hit the disk.
            #[cfg(unix)]
            file.set_permissions(fs::Permissions::from_mode(0o600))
                .map_err(|e| SecretError::WriteError(format!("cannot set permissions: {}", e)))?;

            file.write_all(content.as_bytes())
                .and_then(|_| file.sync_all())
                .map_err(|e| SecretError::WriteError(format!("cannot write secrets: {}", e)))?;
        }

        fs::rename(&temp_path, &self.path)
            .map_err(|e| SecretError::WriteError(format!("cannot rename temp file: {}", e)))
    }

    /// Returns true if the file doesn't exist or has 0600 permissions.
    #[cfg(unix)]
    pub fn verify_permissions(&self) -> Result<bool, SecretError> {
        if !self.path.exists() {
            return Ok(true);
        }
        let metadata = fs::metadata(&self.path)
            .map_err(|e| SecretError::ReadError(format!("cannot read file metadata: {}", e)))?;
        Ok(metadata.permissions().mode() & 0o777 == 0o600)
    }

    #[cfg(not(unix))]
    pub fn verify_permissions(&self) -> Result<bool, SecretError> {
        Ok(true)
    }
}

impl SecretStore for FileSecretStore {
    fn get(&self, key: &str) -> Result<Option<String>, SecretError> {
        Ok(self.read_all()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), SecretError> {
        self.set_many(&[(key, value)])
    }

    fn delete(&self, key: &str) -> Result<(), SecretError> {
        self.delete_many(&[key])
    }

    fn set_many(&self, entries: &[(&str, &str)]) -> Result<(), SecretError> {
        let mut secrets = self.read_all()?;
        for (key, value) in entries {
            secrets.insert((*key).to_string(), (*value).to_string());
        }
        self.write_all(&secrets)
    }

    fn delete_many(&self, keys: &[&str]) -> Result<(), SecretError> {
        if !self.path.exists() {
            return Ok(());
        }
        // A corrupt file is replaced rather than blocking the delete.
        let mut secrets = self.read_all().unwrap_or_default();
        for key in keys {
            secrets.remove(*key);
        }
        self.write_all(&secrets)
    }
}
