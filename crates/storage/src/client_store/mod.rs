//! Client-side key/value persistence (the respondent's "cookie jar").

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use crate::repository::StorageError;

mod encrypted;

pub use encrypted::EncryptedCookieStore;

/// Key/value store that survives across visits on the same client.
///
/// Values are opaque strings; callers serialize structured data themselves.
/// `set` stages a value, `save` commits everything staged.
pub trait ClientStore: Send + Sync {
    /// Whether previously persisted values have been loaded.
    fn ready(&self) -> bool;

    /// Read a value (staged values are visible before `save`).
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the store cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Stage a value.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the store cannot be updated.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Commit staged values.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if persisting fails.
    fn save(&self) -> Result<(), StorageError>;
}

#[derive(Default)]
struct MemoryJar {
    staged: BTreeMap<String, String>,
    committed: BTreeMap<String, String>,
}

/// In-memory client store for tests and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryClientStore {
    jar: Arc<Mutex<MemoryJar>>,
}

impl InMemoryClientStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Value as of the last `save`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Connection` if the lock is poisoned.
    pub fn committed(&self, key: &str) -> Result<Option<String>, StorageError> {
        let guard = self
            .jar
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.committed.get(key).cloned())
    }
}

impl ClientStore for InMemoryClientStore {
    fn ready(&self) -> bool {
        true
    }

    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let guard = self
            .jar
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.staged.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut guard = self
            .jar
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.staged.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn save(&self) -> Result<(), StorageError> {
        let mut guard = self
            .jar
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.committed = guard.staged.clone();
        Ok(())
    }
}
