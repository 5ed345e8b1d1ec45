//! In-memory key-value store.

use crate::storage::traits::KeyValueStore;
use crate::{Error, Result};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::RwLock;

/// Volatile key-value store for tests and embedding hosts that manage
/// durability themselves.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: RwLock<HashMap<String, Value>>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<Value>> {
        let values = self.values.read().map_err(|e| poisoned("read_value", &e))?;
        Ok(values.get(key).cloned())
    }

    fn set(&self, key: &str, value: Value) -> Result<()> {
        let mut values = self.values.write().map_err(|e| poisoned("write_value", &e))?;
        values.insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<bool> {
        let mut values = self
            .values
            .write()
            .map_err(|e| poisoned("remove_value", &e))?;
        Ok(values.remove(key).is_some())
    }
}

fn poisoned(operation: &str, cause: &impl std::fmt::Display) -> Error {
    Error::PersistenceUnavailable {
        operation: operation.to_string(),
        cause: format!("lock poisoned: {cause}"),
    }
}
