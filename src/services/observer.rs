//! Manual-grouping observer.
//!
//! When the user labels a tab group in the browser, every member's domain
//! gains one unit of weight toward that label. This is the organic learning
//! channel; it never touches the policy text.

use crate::Result;
use crate::host::{GroupId, TabHost};
use crate::storage::StateStore;
use std::sync::Arc;
use tracing::instrument;

/// Learns from group labels the user sets by hand.
#[derive(Clone)]
pub struct GroupingObserver {
    state: StateStore,
    host: Arc<dyn TabHost>,
}

impl GroupingObserver {
    /// Creates an observer.
    #[must_use]
    pub fn new(state: StateStore, host: Arc<dyn TabHost>) -> Self {
        Self { state, host }
    }

    /// Handles a "group label changed" notification.
    ///
    /// Returns the number of (domain, label) observations recorded. Blank
    /// or missing labels and members without a domain are ignored.
    ///
    /// # Errors
    ///
    /// Returns an error if the group members cannot be listed or the
    /// pattern store cannot be updated.
    #[instrument(skip(self), fields(group = %group))]
    pub fn on_group_updated(&self, group: GroupId, label: Option<&str>) -> Result<usize> {
        let Some(label) = label.filter(|l| !l.trim().is_empty()) else {
            return Ok(0);
        };

        let mut recorded = 0;
        for tab in self.host.group_members(group)? {
            let domain = tab.domain();
            if self.state.record_manual_grouping(&domain, label)? {
                recorded += 1;
            }
        }

        if recorded > 0 {
            metrics::counter!("patterns_learned_total", "source" => "manual")
                .increment(recorded as u64);
            tracing::info!(label, recorded, "Learned from manual grouping");
        }
        Ok(recorded)
    }
}
