//! Session store collaborator.
//!
//! Successful authentication records a last-login timestamp here rather than
//! in the user row.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;

use crate::error::AuthResult;

/// Key/value session store.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Stores a timestamp under `key`, replacing any previous value.
    ///
    /// ## Errors
    ///
    /// Returns `AuthError::Session` if the backing store rejects the write.
    async fn write(&self, key: &str, value: DateTime<Utc>) -> AuthResult<()>;
}

/// In-memory session store.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    entries: RwLock<HashMap<String, DateTime<Utc>>>,
}

impl MemorySessionStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads the value stored under `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<DateTime<Utc>> {
        self.entries.read().get(key).copied()
    }

    /// Number of stored keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Returns true if nothing has been written.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn write(&self, key: &str, value: DateTime<Utc>) -> AuthResult<()> {
        self.entries.write().insert(key.to_string(), value);
        Ok(())
    }
}
