//! secrets::memory_store
//!
//! In-memory secret storage for tests and embedding.
//!
//! Clones share state, so a test can keep a handle while the session store
//! owns another one. Failures can be injected per operation to exercise the
//! persistence error paths.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use super::traits::{SecretError, SecretStore};

/// Which store operation should fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailOn {
    Read,
    Write,
    Delete,
}

#[derive(Debug, Default)]
struct Inner {
    values: HashMap<String, String>,
    fail_on: Option<FailOn>,
}

/// Secret store backed by a shared `HashMap`.
#[derive(Debug, Clone, Default)]
pub struct MemorySecretStore {
    inner: Arc<Mutex<Inner>>,
}

impl MemorySecretStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with the given entries.
    pub fn with_entries(entries: &[(&str, &str)]) -> Self {
        let store = Self::new();
        {
            let mut inner = store.lock();
            for (k, v) in entries {
                inner.values.insert((*k).to_string(), (*v).to_string());
            }
        }
        store
    }

    /// Make the given operation fail until cleared.
    pub fn fail_on(&self, op: FailOn) {
        self.lock().fail_on = Some(op);
    }

    pub fn clear_fail_on(&self) {
        self.lock().fail_on = None;
    }

    /// Number of stored entries.
    pub fn len(&self) -> usize {
        self.lock().values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // A poisoned map is still a valid map.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl SecretStore for MemorySecretStore {
    fn get(&self, key: &str) -> Result<Option<String>, SecretError> {
        let inner = self.lock();
        if inner.fail_on == Some(FailOn::Read) {
            return Err(SecretError::ReadError("injected read failure".into()));
        }
        Ok(inner.values.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), SecretError> {
        let mut inner = self.lock();
        if inner.fail_on == Some(FailOn::Write) {
            return Err(SecretError::WriteError("injected write failure".into()));
        }
        inner.values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), SecretError> {
        let mut inner = self.lock();
        if inner.fail_on == Some(FailOn::Delete) {
            return Err(SecretError::DeleteError("injected delete failure".into()));
        }
        inner.values.remove(key);
        Ok(())
    }

    fn set_many(&self, entries: &[(&str, &str)]) -> Result<(), SecretError> {
        let mut inner = self.lock();
        if inner.fail_on == Some(FailOn::Write) {
            return Err(SecretError::WriteError("injected write failure".into()));
        }
        for (k, v) in entries {
            inner.values.insert((*k).to_string(), (*v).to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_state() {
        let a = MemorySecretStore::new();
        let b = a.clone();
        a.set("k", "v").unwrap();
        assert_eq!(b.get("k").unwrap().as_deref(), Some("v"));
    }

    #[test]
    fn injected_write_failure_leaves_values_untouched() {
        let store = MemorySecretStore::with_entries(&[("k", "old")]);
        store.fail_on(FailOn::Write);

        assert!(store.set_many(&[("k", "new"), ("j", "x")]).is_err());
        store.clear_fail_on();
        assert_eq!(store.get("k").unwrap().as_deref(), Some("old"));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn delete_many_reports_failure_but_tries_all() {
        let store = MemorySecretStore::with_entries(&[("a", "1"), ("b", "2")]);
        store.fail_on(FailOn::Delete);
        assert!(store.delete_many(&["a", "b"]).is_err());
        store.clear_fail_on();
        store.delete_many(&["a", "b"]).unwrap();
        assert!(store.is_empty());
    }
}
