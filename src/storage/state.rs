//! Typed access to persisted state.
//!
//! Every persisted value (credential, rules, learned patterns, policy text,
//! last action) is read and written through [`StateStore`]; nothing else
//! touches the underlying key-value store. Read-modify-write sequences on
//! the pattern store are serialized by a process-wide mutex shared by all
//! clones, which bounds the lost-update window to concurrent writers in
//! other processes.

use crate::models::{
    DEFAULT_SOUL, LastAction, PatternDeltas, PatternStore, Rule, default_rules,
};
use crate::storage::traits::KeyValueStore;
use crate::{Error, Result};
use secrecy::SecretString;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::sync::{Arc, Mutex, MutexGuard};

/// Persisted key names.
pub mod keys {
    /// API credential for the reasoning service.
    pub const API_KEY: &str = "apiKey";
    /// Ordered rule list.
    pub const RULES: &str = "rules";
    /// Learned pattern store.
    pub const PATTERNS: &str = "learnedPatterns";
    /// Policy text.
    pub const SOUL: &str = "soulText";
    /// Last applied grouping.
    pub const LAST_ACTION: &str = "lastAction";
}

/// Typed facade over a [`KeyValueStore`].
#[derive(Clone)]
pub struct StateStore {
    store: Arc<dyn KeyValueStore>,
    patterns_lock: Arc<Mutex<()>>,
}

impl StateStore {
    /// Wraps a key-value store.
    #[must_use]
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            patterns_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Returns the stored API credential, treating blank values as absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    pub fn credential(&self) -> Result<Option<SecretString>> {
        let key: Option<String> = self.read(keys::API_KEY)?;
        Ok(key
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .map(SecretString::from))
    }

    /// Persists the API credential.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be written.
    pub fn set_credential(&self, key: &str) -> Result<()> {
        self.write(keys::API_KEY, &key.trim())
    }

    /// Forgets the API credential.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be written.
    pub fn clear_credential(&self) -> Result<()> {
        self.store.remove(keys::API_KEY).map(|_| ())
    }

    /// Returns the rule list, seeding the defaults on first use.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read or written.
    pub fn rules(&self) -> Result<Vec<Rule>> {
        if let Some(rules) = self.read(keys::RULES)? {
            return Ok(rules);
        }
        let defaults = default_rules();
        self.write(keys::RULES, &defaults)?;
        tracing::debug!(count = defaults.len(), "Seeded default rules");
        Ok(defaults)
    }

    /// Replaces the whole rule list.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be written.
    pub fn save_rules(&self, rules: &[Rule]) -> Result<()> {
        self.write(keys::RULES, &rules)
    }

    /// Restores the default rule list.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be written.
    pub fn reset_rules(&self) -> Result<Vec<Rule>> {
        let defaults = default_rules();
        self.save_rules(&defaults)?;
        Ok(defaults)
    }

    /// Returns the learned patterns, empty when none were recorded.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    pub fn patterns(&self) -> Result<PatternStore> {
        Ok(self.read(keys::PATTERNS)?.unwrap_or_default())
    }

    /// Bulk-replaces the pattern store (import).
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be written.
    pub fn replace_patterns(&self, patterns: &PatternStore) -> Result<()> {
        let _guard = self.lock_patterns()?;
        self.write(keys::PATTERNS, patterns)
    }

    /// Clears every learned association.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be written.
    pub fn reset_patterns(&self) -> Result<()> {
        self.replace_patterns(&PatternStore::new())
    }

    /// Adds one manual-grouping observation and persists it.
    ///
    /// Returns false when the domain or group is empty (nothing stored).
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read or written.
    pub fn record_manual_grouping(&self, domain: &str, group: &str) -> Result<bool> {
        let _guard = self.lock_patterns()?;
        let mut patterns = self.patterns()?;
        if !patterns.increment(domain, group) {
            return Ok(false);
        }
        self.write(keys::PATTERNS, &patterns)?;
        Ok(true)
    }

    /// Merges feedback deltas additively and persists the result.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read or written.
    pub fn merge_pattern_deltas(&self, deltas: &PatternDeltas) -> Result<PatternStore> {
        let _guard = self.lock_patterns()?;
        let mut patterns = self.patterns()?;
        patterns.merge_deltas(deltas);
        self.write(keys::PATTERNS, &patterns)?;
        Ok(patterns)
    }

    /// Returns the policy text, seeding the default on first access.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read or written.
    pub fn soul(&self) -> Result<String> {
        if let Some(text) = self.read(keys::SOUL)? {
            return Ok(text);
        }
        self.write(keys::SOUL, &DEFAULT_SOUL)?;
        Ok(DEFAULT_SOUL.to_string())
    }

    /// Replaces the policy text verbatim.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be written.
    pub fn save_soul(&self, text: &str) -> Result<()> {
        self.write(keys::SOUL, &text)
    }

    /// Restores the built-in policy text.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be written.
    pub fn reset_soul(&self) -> Result<()> {
        self.save_soul(DEFAULT_SOUL)
    }

    /// Returns the last applied grouping, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    pub fn last_action(&self) -> Result<Option<LastAction>> {
        self.read(keys::LAST_ACTION)
    }

    /// Overwrites the last-action slot.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be written.
    pub fn record_last_action(&self, action: &LastAction) -> Result<()> {
        self.write(keys::LAST_ACTION, action)
    }

    fn lock_patterns(&self) -> Result<MutexGuard<'_, ()>> {
        self.patterns_lock
            .lock()
            .map_err(|e| Error::PersistenceUnavailable {
                operation: "lock_patterns".to_string(),
                cause: e.to_string(),
            })
    }

    fn read<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let Some(value) = self.store.get(key)? else {
            return Ok(None);
        };
        serde_json::from_value(value)
            .map(Some)
            .map_err(|e| Error::PersistenceUnavailable {
                operation: format!("decode_{key}"),
                cause: e.to_string(),
            })
    }

    fn write<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        let value = serde_json::to_value(value).map_err(|e| Error::PersistenceUnavailable {
            operation: format!("encode_{key}"),
            cause: e.to_string(),
        })?;
        self.store.set(key, value)
    }
}
