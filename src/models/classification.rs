//! Grouping decisions returned to callers.

use super::TabId;
use serde::{Deserialize, Serialize};

/// A named group of tabs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TabGroup {
    /// Group label.
    pub group_name: String,
    /// Member tabs, in classification order.
    pub tab_ids: Vec<TabId>,
}

impl TabGroup {
    /// Creates a group.
    #[must_use]
    pub fn new(group_name: impl Into<String>, tab_ids: Vec<TabId>) -> Self {
        Self {
            group_name: group_name.into(),
            tab_ids,
        }
    }
}

/// The outcome of classifying a set of tabs.
///
/// Tab identifiers across groups form a partition of the classified tabs.
/// Tabs nobody could place are simply absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassificationResult {
    /// Groups in order: rule-derived first, then remote-derived.
    pub groups: Vec<TabGroup>,
    /// Tabs recommended for closing.
    #[serde(default)]
    pub close_recommendations: Vec<TabId>,
}

impl ClassificationResult {
    /// Looks up a group by name.
    #[must_use]
    pub fn group(&self, name: &str) -> Option<&TabGroup> {
        self.groups.iter().find(|g| g.group_name == name)
    }

    /// Total number of tabs placed in groups.
    #[must_use]
    pub fn grouped_count(&self) -> usize {
        self.groups.iter().map(|g| g.tab_ids.len()).sum()
    }
}
