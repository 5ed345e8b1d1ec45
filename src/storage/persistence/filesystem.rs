//! Filesystem-based key-value store.
//!
//! Each key is stored as a pretty-printed JSON file named `<key>.json` in
//! the base directory. Writes go to a temporary file first and are renamed
//! into place, so a crash never leaves a half-written value behind.
//!
//! # Security
//!
//! - **Path traversal**: keys are restricted to alphanumerics, `-` and `_`
//! - **File size limits**: oversized files are rejected before reading

use crate::storage::traits::KeyValueStore;
use crate::{Error, Result};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

/// Maximum size of a stored value (4MB).
const MAX_FILE_SIZE: u64 = 4 * 1024 * 1024;

/// Key-value store backed by one JSON file per key.
pub struct FilesystemStore {
    /// Base directory for storage.
    base_path: PathBuf,
}

impl FilesystemStore {
    /// Creates a store rooted at `base_path`.
    ///
    /// The directory is created lazily on first write.
    #[must_use]
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    /// Creates a store, making sure the directory exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn with_create(base_path: impl Into<PathBuf>) -> Result<Self> {
        let base_path = base_path.into();
        fs::create_dir_all(&base_path).map_err(|e| unavailable("create_storage_dir", &e))?;
        Ok(Self { base_path })
    }

    /// Returns the base path.
    #[must_use]
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Returns the file path for a key.
    fn key_path(&self, key: &str) -> Result<PathBuf> {
        if !Self::is_safe_key(key) {
            return Err(Error::InvalidInput(format!(
                "storage key contains invalid characters: {key}"
            )));
        }
        Ok(self.base_path.join(format!("{key}.json")))
    }

    /// Checks that a key cannot escape the base directory.
    fn is_safe_key(key: &str) -> bool {
        !key.is_empty()
            && key.len() <= 128
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    }
}

impl KeyValueStore for FilesystemStore {
    fn get(&self, key: &str) -> Result<Option<Value>> {
        let path = self.key_path(key)?;
        if !path.exists() {
            return Ok(None);
        }

        let metadata = fs::metadata(&path).map_err(|e| unavailable("read_file_metadata", &e))?;
        if metadata.len() > MAX_FILE_SIZE {
            return Err(Error::PersistenceUnavailable {
                operation: "read_value".to_string(),
                cause: format!(
                    "{} exceeds maximum size of {MAX_FILE_SIZE} bytes",
                    path.display()
                ),
            });
        }

        let contents = fs::read_to_string(&path).map_err(|e| unavailable("read_value", &e))?;
        let value = serde_json::from_str(&contents)
            .map_err(|e| unavailable("deserialize_value", &e))?;
        Ok(Some(value))
    }

    fn set(&self, key: &str, value: Value) -> Result<()> {
        let path = self.key_path(key)?;
        fs::create_dir_all(&self.base_path).map_err(|e| unavailable("create_storage_dir", &e))?;

        let json =
            serde_json::to_string_pretty(&value).map_err(|e| unavailable("serialize_value", &e))?;

        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, json).map_err(|e| unavailable("write_value", &e))?;
        fs::rename(&tmp, &path).map_err(|e| unavailable("commit_value", &e))?;

        tracing::trace!(key, path = %path.display(), "Stored value");
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<bool> {
        let path = self.key_path(key)?;
        if !path.exists() {
            return Ok(false);
        }
        fs::remove_file(&path).map_err(|e| unavailable("remove_value", &e))?;
        Ok(true)
    }
}

/// Wraps an I/O or serde failure as `PersistenceUnavailable`.
fn unavailable(operation: &str, cause: &impl std::fmt::Display) -> Error {
    Error::PersistenceUnavailable {
        operation: operation.to_string(),
        cause: cause.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_set_and_get() {
        let dir = TempDir::new().unwrap();
        let store = FilesystemStore::new(dir.path());

        store.set("rules", json!([{"id": "1"}])).unwrap();
        let value = store.get("rules").unwrap();

        assert_eq!(value, Some(json!([{"id": "1"}])));
        assert!(dir.path().join("rules.json").exists());
        assert!(!dir.path().join("rules.json.tmp").exists());
    }

    #[test]
    fn test_get_missing() {
        let dir = TempDir::new().unwrap();
        let store = FilesystemStore::new(dir.path());
        assert_eq!(store.get("soulText").unwrap(), None);
        assert!(!store.contains("soulText").unwrap());
    }

    #[test]
    fn test_values_survive_reopen() {
        let dir = TempDir::new().unwrap();
        let text = "# Policy\n\nKeep *everything* in Work.\u{2022}";

        FilesystemStore::new(dir.path())
            .set("soulText", json!(text))
            .unwrap();
        let reopened = FilesystemStore::new(dir.path());

        assert_eq!(reopened.get("soulText").unwrap(), Some(json!(text)));
    }

    #[test]
    fn test_remove() {
        let dir = TempDir::new().unwrap();
        let store = FilesystemStore::with_create(dir.path()).unwrap();

        store.set("lastAction", json!({})).unwrap();
        assert!(store.remove("lastAction").unwrap());
        assert!(!store.remove("lastAction").unwrap());
    }

    #[test]
    fn test_rejects_path_traversal() {
        let dir = TempDir::new().unwrap();
        let store = FilesystemStore::new(dir.path());

        assert!(matches!(
            store.set("../escape", json!(1)),
            Err(Error::InvalidInput(_))
        ));
        assert!(store.get("a/b").is_err());
    }

    #[test]
    fn test_corrupt_file_is_unavailable() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("learnedPatterns.json"), "{not json").unwrap();
        let store = FilesystemStore::new(dir.path());

        assert!(matches!(
            store.get("learnedPatterns"),
            Err(Error::PersistenceUnavailable { .. })
        ));
    }
}
