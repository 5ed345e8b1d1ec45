//! Host environment interface.
//!
//! The browser owns tabs and tab groups. The core only consumes the small
//! surface defined by [`TabHost`]; an extension bridge implements it against
//! the real tab APIs, while [`SnapshotHost`] keeps a window in a JSON file
//! for the CLI and tests.

mod snapshot;

pub use snapshot::{SnapshotHost, WindowSnapshot};

use crate::Result;
use crate::models::{Tab, TabId, domain_of};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a tab group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroupId(i64);

impl GroupId {
    /// Creates a group ID.
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

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A tab as the host reports it. Any field but the id may be missing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HostTab {
    /// Tab identifier.
    pub id: TabId,
    /// URL, absent for tabs the extension may not inspect.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Page title.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Last-accessed time (Unix epoch milliseconds).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_accessed: Option<u64>,
    /// Group the tab belongs to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_id: Option<GroupId>,
}

impl HostTab {
    /// Domain of the tab's URL, empty when unknown.
    #[must_use]
    pub fn domain(&self) -> String {
        self.url.as_deref().map(domain_of).unwrap_or_default()
    }

    /// Converts to a classification snapshot.
    ///
    /// Missing fields become empty strings; a missing access time becomes `now`.
    #[must_use]
    pub fn to_tab(&self, now: u64) -> Tab {
        Tab::new(
            self.id,
            self.url.clone().unwrap_or_default(),
            self.title.clone().unwrap_or_default(),
        )
        .with_last_accessed(self.last_accessed.unwrap_or(now))
    }
}

/// Tab and tab-group primitives provided by the browser.
pub trait TabHost: Send + Sync {
    /// Lists the tabs of the current window.
    ///
    /// # Errors
    ///
    /// Returns an error if the host cannot be queried.
    fn current_window_tabs(&self) -> Result<Vec<HostTab>>;

    /// Looks up a single tab, `None` if it no longer exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the host cannot be queried.
    fn get_tab(&self, id: TabId) -> Result<Option<HostTab>>;

    /// Creates a group holding the given tabs.
    ///
    /// # Errors
    ///
    /// Returns an error if the group cannot be created.
    fn create_group(&self, tab_ids: &[TabId]) -> Result<GroupId>;

    /// Sets a group's title and collapsed state.
    ///
    /// # Errors
    ///
    /// Returns an error if the group does not exist or cannot be updated.
    fn update_group(&self, group: GroupId, title: &str, collapsed: bool) -> Result<()>;

    /// Removes the given tabs from whatever groups they are in.
    ///
    /// # Errors
    ///
    /// Returns an error if the host rejects the change.
    fn ungroup(&self, tab_ids: &[TabId]) -> Result<()>;

    /// Lists the tabs currently in a group.
    ///
    /// # Errors
    ///
    /// Returns an error if the host cannot be queried.
    fn group_members(&self, group: GroupId) -> Result<Vec<HostTab>>;
}
