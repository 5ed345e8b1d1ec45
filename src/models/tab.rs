//! Tab snapshots and identifiers.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque identifier the host assigns to an open tab.
///
/// Stable for the lifetime of the browser session, never sent to the
/// reasoning service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TabId(i64);

impl TabId {
    /// Creates a new tab ID.
    #[must_use]
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    /// Returns the raw identifier.
    #[must_use]
    pub const fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for TabId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for TabId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

/// A snapshot of one open browser tab.
///
/// Produced fresh for every classification request and never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tab {
    /// Host identifier.
    pub id: TabId,
    /// Full URL.
    pub url: String,
    /// Page title.
    pub title: String,
    /// Host component of the URL, empty when the URL has none.
    pub domain: String,
    /// Last-accessed time (Unix epoch milliseconds).
    pub last_accessed: u64,
}

impl Tab {
    /// Creates a tab snapshot, deriving the domain from the URL.
    #[must_use]
    pub fn new(id: TabId, url: impl Into<String>, title: impl Into<String>) -> Self {
        let url = url.into();
        let domain = domain_of(&url);
        Self {
            id,
            url,
            title: title.into(),
            domain,
            last_accessed: 0,
        }
    }

    /// Sets the last-accessed timestamp.
    #[must_use]
    pub const fn with_last_accessed(mut self, last_accessed: u64) -> Self {
        self.last_accessed = last_accessed;
        self
    }
}

/// Extracts the host of a URL.
///
/// Returns an empty string for unparseable URLs and for URLs without a
/// host (`about:blank`, `data:` and similar).
#[must_use]
pub fn domain_of(url: &str) -> String {
    url::Url::parse(url)
        .ok()
        .and_then(|parsed| parsed.host_str().map(str::to_string))
        .unwrap_or_default()
}
