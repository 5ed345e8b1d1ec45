//! Key-value store trait.

use crate::Result;
use serde_json::Value;

/// Durable mapping from string keys to JSON values.
///
/// This is the host's storage primitive. It offers last-writer-wins
/// semantics per key and no transactions across keys; callers go through
/// [`crate::storage::StateStore`] rather than touching keys directly.
pub trait KeyValueStore: Send + Sync {
    /// Reads a value, `None` when the key was never written.
    ///
    /// # Errors
    ///
    /// Returns `PersistenceUnavailable` if the store cannot be read.
    fn get(&self, key: &str) -> Result<Option<Value>>;

    /// Writes a value, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns `PersistenceUnavailable` if the store cannot be written.
    fn set(&self, key: &str, value: Value) -> Result<()>;

    /// Removes a key, returning whether it existed.
    ///
    /// # Errors
    ///
    /// Returns `PersistenceUnavailable` if the store cannot be written.
    fn remove(&self, key: &str) -> Result<bool>;

    /// Checks if a key has a value.
    ///
    /// # Errors
    ///
    /// Returns `PersistenceUnavailable` if the store cannot be read.
    fn contains(&self, key: &str) -> Result<bool> {
        Ok(self.get(key)?.is_some())
    }
}
