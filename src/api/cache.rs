//! api::cache
//!
//! Normalised query results, keyed by operation and variables.
//!
//! # Mutation discipline
//!
//! Entries change in two ways only:
//! - the client writes the `data` of a successful query under its key
//! - [`QueryCache::patch`] edits the entry under one explicit key
//!
//! A patch of an absent key is a no-op. It never creates a listing.
//!
//! # Write ordering
//!
//! A network fetch reserves a [`WriteTicket`] before it sends. The ticket
//! commits only if nothing touched its key since the reservation: a later
//! fetch, a direct write or a patch all supersede it. An old response that
//! arrives late is dropped instead of replacing newer data.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Mutex, MutexGuard};

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use super::errors::ApiError;
use super::transport::GraphQlRequest;

/// Identity of a cached query: operation name plus canonical variables.
///
/// Object keys in the variables are sorted, so `{"page":1,"limit":10}` and
/// `{"limit":10,"page":1}` name the same entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QueryKey {
    operation: String,
    variables: String,
}

impl QueryKey {
    pub fn new(operation: impl Into<String>, variables: &Value) -> Self {
        let mut canonical = String::new();
        write_canonical(variables, &mut canonical);
        Self {
            operation: operation.into(),
            variables: canonical,
        }
    }

    /// Key under which `request`'s result is cached.
    pub fn of(request: &GraphQlRequest) -> Self {
        Self::new(request.operation_name.clone(), &request.variables)
    }

    pub fn operation(&self) -> &str {
        &self.operation
    }

    /// Canonical JSON text of the variables.
    pub fn variables(&self) -> &str {
        &self.variables
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.operation, self.variables)
    }
}

fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<_> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            out.push('{');
            for (i, (k, v)) in entries.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&Value::String(k.clone()).to_string());
                out.push(':');
                write_canonical(v, out);
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (i, v) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(v, out);
            }
            out.push(']');
        }
        scalar => out.push_str(&scalar.to_string()),
    }
}

/// Reservation for a pending network write under one key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteTicket {
    key: QueryKey,
    seq: u64,
}

impl WriteTicket {
    pub fn key(&self) -> &QueryKey {
        &self.key
    }
}

#[derive(Debug, Default)]
struct Entries {
    values: HashMap<QueryKey, Value>,
    /// Sequence of the last reservation, write or patch per key.
    versions: HashMap<QueryKey, u64>,
    next_seq: u64,
}

impl Entries {
    fn bump(&mut self, key: &QueryKey) -> u64 {
        self.next_seq += 1;
        self.versions.insert(key.clone(), self.next_seq);
        self.next_seq
    }
}

/// In-memory query cache shared by every view using one client.
#[derive(Debug, Default)]
pub struct QueryCache {
    entries: Mutex<Entries>,
}

impl QueryCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Entries> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn read(&self, key: &QueryKey) -> Option<Value> {
        self.lock().values.get(key).cloned()
    }

    pub fn write(&self, key: QueryKey, data: Value) {
        let mut entries = self.lock();
        entries.bump(&key);
        entries.values.insert(key, data);
    }

    /// Reserve the right to write `key` once a response arrives.
    pub fn reserve(&self, key: QueryKey) -> WriteTicket {
        let seq = self.lock().bump(&key);
        WriteTicket { key, seq }
    }

    /// Write `data` if `ticket` is still the latest claim on its key.
    /// Returns whether the entry was written.
    pub fn commit(&self, ticket: WriteTicket, data: Value) -> bool {
        let mut entries = self.lock();
        if entries.versions.get(&ticket.key) != Some(&ticket.seq) {
            tracing::debug!(key = %ticket.key, "dropped superseded cache write");
            return false;
        }
        entries.values.insert(ticket.key, data);
        true
    }

    pub fn read_typed<T: DeserializeOwned>(&self, key: &QueryKey) -> Result<Option<T>, ApiError> {
        match self.read(key) {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    pub fn write_typed<T: Serialize>(&self, key: QueryKey, data: &T) -> Result<(), ApiError> {
        let value = serde_json::to_value(data)?;
        self.write(key, value);
        Ok(())
    }

    /// Edit the entry under `key` in place.
    ///
    /// Returns `Ok(false)` without calling `f` when nothing is cached under
    /// `key`. The entry is replaced only if `f`'s result encodes cleanly.
    pub fn patch<T, F>(&self, key: &QueryKey, f: F) -> Result<bool, ApiError>
    where
        T: DeserializeOwned + Serialize,
        F: FnOnce(&mut T),
    {
        let mut entries = self.lock();
        let Some(slot) = entries.values.get_mut(key) else {
            return Ok(false);
        };
        let mut typed: T = serde_json::from_value(slot.clone())?;
        f(&mut typed);
        *slot = serde_json::to_value(&typed)?;
        entries.bump(key);
        tracing::debug!(key = %key, "patched cache entry");
        Ok(true)
    }

    pub fn contains(&self, key: &QueryKey) -> bool {
        self.lock().values.contains_key(key)
    }

    pub fn evict(&self, key: &QueryKey) -> Option<Value> {
        self.lock().values.remove(key)
    }

    pub fn len(&self) -> usize {
        self.lock().values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every entry. Reservations taken before the clear never commit.
    pub fn clear(&self) {
        let mut entries = self.lock();
        entries.values.clear();
        entries.versions.clear();
    }
}
