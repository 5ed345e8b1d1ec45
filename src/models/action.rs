//! Last-action memory used as context for feedback conversations.

use serde::{Deserialize, Serialize};

/// Title and domain of a tab as it was when grouped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TabSnapshot {
    /// Page title.
    pub title: String,
    /// Tab domain.
    pub domain: String,
}

impl TabSnapshot {
    /// Placeholder for a tab the host no longer knows about.
    #[must_use]
    pub fn unknown() -> Self {
        Self {
            title: "Unknown".to_string(),
            domain: "unknown".to_string(),
        }
    }
}

/// One group created by the last applied grouping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupSnapshot {
    /// Group label.
    pub group_name: String,
    /// Number of tabs placed in the group.
    pub tab_count: usize,
    /// Snapshots of the grouped tabs.
    pub tabs: Vec<TabSnapshot>,
}

/// The most recently applied grouping.
///
/// A single slot, overwritten on every apply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LastAction {
    /// When the grouping was applied (Unix epoch milliseconds).
    pub timestamp: u64,
    /// Total number of tabs placed into groups.
    pub tabs_organized: usize,
    /// Groups created.
    pub groups_created: Vec<GroupSnapshot>,
    /// Number of close recommendations issued.
    pub close_recommendations: usize,
}

impl LastAction {
    /// An empty record, used when nothing has been applied yet.
    #[must_use]
    pub const fn empty(timestamp: u64) -> Self {
        Self {
            timestamp,
            tabs_organized: 0,
            groups_created: Vec::new(),
            close_recommendations: 0,
        }
    }

    /// Builds a record from the created groups, summing their tab counts.
    #[must_use]
    pub fn from_groups(
        timestamp: u64,
        groups_created: Vec<GroupSnapshot>,
        close_recommendations: usize,
    ) -> Self {
        let tabs_organized = groups_created.iter().map(|g| g.tab_count).sum();
        Self {
            timestamp,
            tabs_organized,
            groups_created,
            close_recommendations,
        }
    }
}
