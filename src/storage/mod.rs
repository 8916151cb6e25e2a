//! Client-local persistence for the chat surface
//!
//! The conversation log and session identifier are advisory caches: two
//! string-keyed blobs scoped to the client profile. The [`Persistence`]
//! trait abstracts the key-value capability so the production `sled`
//! store and the in-memory test store are interchangeable.

use crate::error::{Result, TaskchatError};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;

/// Key-value persistence capability with get/set/delete of string-keyed blobs
///
/// Implementations must treat missing keys as `Ok(None)`, never as an error.
/// Corrupt values are surfaced as-is; interpreting them is the caller's
/// concern (the message store swallows parse failures).
pub trait Persistence: Send + Sync {
    /// Fetch the blob stored under `key`, if any
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Store `value` under `key`, replacing any previous blob
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Remove the blob stored under `key`; removing a missing key is not an error
    fn delete(&self, key: &str) -> Result<()>;
}

/// Embedded `sled` implementation of [`Persistence`]
///
/// Used by the CLI to persist the conversation across runs. Every write is
/// flushed so a crash between commands never loses an appended turn.
pub struct SledPersistence {
    db: sled::Db,
}

impl SledPersistence {
    /// Open or create the store at `path`
    ///
    /// # Errors
    ///
    /// Returns `TaskchatError::Storage` if the database cannot be opened
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let db = sled::open(path)
            .map_err(|e| TaskchatError::Storage(format!("Failed to open database: {}", e)))?;
        Ok(Self { db })
    }
}

impl Persistence for SledPersistence {
    fn get(&self, key: &str) -> Result<Option<String>> {
        match self
            .db
            .get(key.as_bytes())
            .map_err(|e| TaskchatError::Storage(format!("Get failed: {}", e)))?
        {
            Some(bytes) => {
                let value = String::from_utf8(bytes.to_vec())
                    .map_err(|e| TaskchatError::Storage(format!("Invalid UTF-8 value: {}", e)))?;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.db
            .insert(key.as_bytes(), value.as_bytes())
            .map_err(|e| TaskchatError::Storage(format!("Insert failed: {}", e)))?;
        self.db
            .flush()
            .map_err(|e| TaskchatError::Storage(format!("Flush failed: {}", e)))?;
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<()> {
        self.db
            .remove(key.as_bytes())
            .map_err(|e| TaskchatError::Storage(format!("Remove failed: {}", e)))?;
        self.db
            .flush()
            .map_err(|e| TaskchatError::Storage(format!("Flush failed: {}", e)))?;
        Ok(())
    }
}

/// In-memory implementation of [`Persistence`]
///
/// Backs unit tests and one-off `send` invocations that should not touch
/// the on-disk conversation.
#[derive(Default)]
pub struct MemoryPersistence {
    map: Mutex<HashMap<String, String>>,
}

impl MemoryPersistence {
    /// Create an empty in-memory store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-seeded with key/value pairs
    pub fn with_entries(entries: &[(&str, &str)]) -> Self {
        let map = entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Self {
            map: Mutex::new(map),
        }
    }
}

impl Persistence for MemoryPersistence {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let map = self
            .map
            .lock()
            .map_err(|_| TaskchatError::Storage("Lock poisoned".to_string()))?;
        Ok(map.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut map = self
            .map
            .lock()
            .map_err(|_| TaskchatError::Storage("Lock poisoned".to_string()))?;
        map.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<()> {
        let mut map = self
            .map
            .lock()
            .map_err(|_| TaskchatError::Storage("Lock poisoned".to_string()))?;
        map.remove(key);
        Ok(())
    }
}
