//! # IntelliTab
//!
//! Rule-first, LLM-assisted grouping of open browser tabs.
//!
//! IntelliTab resolves as many tabs as it can with deterministic rules,
//! asks a remote language model to place the rest, and learns
//! domain-to-group associations from user corrections and from groups
//! the user builds by hand.
//!
//! ## Features
//!
//! - Ordered substring rules that always win over the model
//! - Dense index remapping so the model never sees real tab identifiers
//! - Strict validation of model output before it is merged
//! - A weighted pattern store fed by manual grouping and feedback
//! - A free-text policy document ("soul") the feedback loop can rewrite
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use intellitab::llm::OpenAiClient;
//! use intellitab::services::TabOrganizer;
//! use intellitab::storage::{FilesystemStore, StateStore};
//!
//! let state = StateStore::new(Arc::new(FilesystemStore::with_create(".intellitab")?));
//! let organizer = TabOrganizer::new(state, host, Arc::new(OpenAiClient::new()));
//! let result = organizer.analyze_tabs()?;
//! organizer.apply_result(&result)?;
//! ```

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(missing_docs)]
#![forbid(unsafe_code)]
#![allow(clippy::multiple_crate_versions)]

use thiserror::Error as ThisError;

pub mod config;
pub mod host;
pub mod llm;
pub mod models;
pub mod observability;
pub mod services;
pub mod storage;

pub use config::{IntellitabConfig, LlmConfig};
pub use host::TabHost;
pub use llm::LlmProvider;
pub use models::{
    ChatTurn, ClassificationResult, FeedbackResponse, LastAction, PatternDeltas, PatternStore,
    Rule, RuleKind, Sender, Tab, TabGroup, TabId,
};
pub use services::{Classifier, FeedbackProcessor, GroupingObserver, RulesEngine, TabOrganizer};
pub use storage::{FilesystemStore, KeyValueStore, MemoryStore, StateStore};

/// Error type for intellitab operations.
///
/// # Error Variant Triggers
///
/// | Variant | Raised When |
/// |---------|-------------|
/// | `MissingCredential` | No API key persisted or configured; nothing is sent remotely |
/// | `RemoteTransport` | The reasoning service answered with a non-success status |
/// | `RemoteSchema` | The completion is not JSON or breaks the grouping/feedback schema |
/// | `PersistenceUnavailable` | The key-value store cannot be read or written |
/// | `InvalidInput` | Empty feedback transcript, malformed import files |
/// | `OperationFailed` | Connection errors, request timeouts, host failures |
#[derive(Debug, ThisError)]
pub enum Error {
    /// No credential is available for the remote service.
    #[error("{0}")]
    MissingCredential(String),

    /// The remote service returned a non-success status.
    #[error("remote service error: {status} {body}")]
    RemoteTransport {
        /// HTTP status code.
        status: u16,
        /// Raw response body.
        body: String,
    },

    /// The remote response did not match the expected schema.
    #[error("invalid remote response: {0}")]
    RemoteSchema(String),

    /// The key-value store could not be accessed.
    #[error("persistence unavailable during '{operation}': {cause}")]
    PersistenceUnavailable {
        /// The storage operation that failed.
        operation: String,
        /// The underlying cause.
        cause: String,
    },

    /// Invalid input was provided.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// An operation failed.
    #[error("operation '{operation}' failed: {cause}")]
    OperationFailed {
        /// The operation that failed.
        operation: String,
        /// The underlying cause.
        cause: String,
    },
}

impl Error {
    /// Builds the precondition failure raised when no API key is available.
    #[must_use]
    pub fn missing_credential() -> Self {
        Self::MissingCredential(
            "API key is missing. Set it with `intellitab credential set <KEY>`.".to_string(),
        )
    }

    /// Returns true when this error means no credential was configured.
    #[must_use]
    pub const fn is_missing_credential(&self) -> bool {
        matches!(self, Self::MissingCredential(_))
    }
}

/// Result type alias for intellitab operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Returns the current Unix timestamp in milliseconds.
///
/// Falls back to 0 if the system clock is before the Unix epoch.
#[must_use]
pub fn current_timestamp_ms() -> u64 {
    u64::try_from(chrono::Utc::now().timestamp_millis()).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::RemoteTransport {
            status: 401,
            body: "invalid api key".to_string(),
        };
        assert_eq!(err.to_string(), "remote service error: 401 invalid api key");

        let err = Error::InvalidInput("empty transcript".to_string());
        assert_eq!(err.to_string(), "invalid input: empty transcript");

        let err = Error::PersistenceUnavailable {
            operation: "read_key".to_string(),
            cause: "permission denied".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "persistence unavailable during 'read_key': permission denied"
        );
    }

    #[test]
    fn test_missing_credential_is_flagged() {
        let err = Error::missing_credential();
        assert!(err.is_missing_credential());
        assert!(err.to_string().contains("credential set"));
        assert!(!Error::RemoteSchema("x".to_string()).is_missing_credential());
    }

    #[test]
    fn test_current_timestamp_is_recent() {
        // 2020-01-01 in milliseconds
        assert!(current_timestamp_ms() > 1_577_836_800_000);
    }
}
