//! # Alias Store
//!
//! The CLI remembers things for you — account aliases, asset definitions,
//! free-form variables — in a small embedded key-value store built on sled.
//! Values are UTF-8 strings with an optional TTL; an expired entry behaves
//! exactly like a missing one and is reaped lazily on the read that finds
//! it dead.
//!
//! All keys are namespaced by the caller before they get here (see
//! [`Resolver`](crate::resolver::Resolver)), so the store itself is a flat
//! keyspace. Values go to disk as `bincode(Entry)`.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Errors from the alias store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store error: {0}")]
    Sled(#[from] sled::Error),

    #[error("corrupt store entry for key {0}")]
    Corrupt(String),
}

/// One stored value plus its optional expiry (unix millis).
#[derive(Debug, Serialize, Deserialize)]
struct Entry {
    value: String,
    expires_at: Option<i64>,
}

impl Entry {
    fn expired(&self) -> bool {
        match self.expires_at {
            Some(at) => Utc::now().timestamp_millis() >= at,
            None => false,
        }
    }
}

/// String key-value storage with optional TTL.
///
/// Object-safe so command handlers can hold a `Box<dyn Store>` and tests
/// can swap in [`MemoryStore`].
pub trait Store: Send + Sync {
    /// Returns the live value for `key`, or `None` if absent or expired.
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Sets `key` to `value`, expiring after `ttl` when one is given.
    fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<(), StoreError>;

    /// Deletes `key`. Deleting a missing key is not an error.
    fn delete(&self, key: &str) -> Result<(), StoreError>;
}

// ---------------------------------------------------------------------------
// SledStore
// ---------------------------------------------------------------------------

/// Persistent store backed by a sled database on disk.
pub struct SledStore {
    db: sled::Db,
}

impl SledStore {
    /// Opens (or creates) the store at `path`.
    pub fn open(path: &std::path::Path) -> Result<Self, StoreError> {
        Ok(Self {
            db: sled::open(path)?,
        })
    }

    /// Opens a temporary store that vanishes on drop. For tests.
    pub fn temporary() -> Result<Self, StoreError> {
        Ok(Self {
            db: sled::Config::new().temporary(true).open()?,
        })
    }
}

impl Store for SledStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let Some(bytes) = self.db.get(key)? else {
            return Ok(None);
        };
        let entry: Entry =
            bincode::deserialize(&bytes).map_err(|_| StoreError::Corrupt(key.to_string()))?;
        if entry.expired() {
            // Lazy reaping: the dead entry is removed on the read that
            // discovered it.
            self.db.remove(key)?;
            return Ok(None);
        }
        Ok(Some(entry.value))
    }

    fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<(), StoreError> {
        let entry = Entry {
            value: value.to_string(),
            expires_at: ttl.map(|d| Utc::now().timestamp_millis() + d.as_millis() as i64),
        };
        let bytes =
            bincode::serialize(&entry).map_err(|_| StoreError::Corrupt(key.to_string()))?;
        self.db.insert(key, bytes)?;
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.db.remove(key)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// MemoryStore
// ---------------------------------------------------------------------------

/// In-memory store for tests, backed by a concurrent map.
#[derive(Default)]
pub struct MemoryStore {
    map: dashmap::DashMap<String, Entry>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Store for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        if let Some(entry) = self.map.get(key) {
            if !entry.expired() {
                return Ok(Some(entry.value.clone()));
            }
        }
        self.map.remove_if(key, |_, e| e.expired());
        Ok(None)
    }

    fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<(), StoreError> {
        self.map.insert(
            key.to_string(),
            Entry {
                value: value.to_string(),
                expires_at: ttl.map(|d| Utc::now().timestamp_millis() + d.as_millis() as i64),
            },
        );
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.map.remove(key);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
