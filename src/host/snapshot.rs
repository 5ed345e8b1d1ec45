//! JSON snapshot host.
//!
//! Models one browser window as a JSON document:
//!
//! ```json
//! {
//!   "tabs": [ { "id": 11, "url": "https://github.com/", "title": "GitHub" } ],
//!   "groups": [ { "id": 1, "title": "Dev", "collapsed": false } ]
//! }
//! ```
//!
//! When backed by a file, every mutation is written back immediately.

use super::{GroupId, HostTab, TabHost};
use crate::models::TabId;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

/// A tab group in the snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotGroup {
    /// Group identifier.
    pub id: GroupId,
    /// Display title.
    #[serde(default)]
    pub title: String,
    /// Whether the group is collapsed.
    #[serde(default)]
    pub collapsed: bool,
}

/// The serialized window.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowSnapshot {
    /// Open tabs in window order.
    #[serde(default)]
    pub tabs: Vec<HostTab>,
    /// Tab groups.
    #[serde(default)]
    pub groups: Vec<SnapshotGroup>,
}

impl WindowSnapshot {
    /// Returns a group by ID.
    #[must_use]
    pub fn group(&self, id: GroupId) -> Option<&SnapshotGroup> {
        self.groups.iter().find(|g| g.id == id)
    }

    fn next_group_id(&self) -> Result<GroupId> {
        let max = self.groups.iter().map(|g| g.id.get()).max().unwrap_or(0);
        max.checked_add(1)
            .map(GroupId::new)
            .ok_or_else(|| Error::OperationFailed {
                operation: "create_group".to_string(),
                cause: format!("group id space exhausted after {max}"),
            })
    }

    /// Drops groups that no longer have members.
    fn prune_empty_groups(&mut self) {
        let tabs = &self.tabs;
        self.groups
            .retain(|g| tabs.iter().any(|t| t.group_id == Some(g.id)));
    }
}

/// [`TabHost`] over a [`WindowSnapshot`], optionally persisted to a file.
pub struct SnapshotHost {
    path: Option<PathBuf>,
    window: Mutex<WindowSnapshot>,
}

impl SnapshotHost {
    /// Creates a host over an in-memory window.
    #[must_use]
    pub const fn in_memory(window: WindowSnapshot) -> Self {
        Self {
            path: None,
            window: Mutex::new(window),
        }
    }

    /// Opens a window file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let window = read_snapshot(&path)?;
        Ok(Self {
            path: Some(path),
            window: Mutex::new(window),
        })
    }

    /// Returns a copy of the current window.
    ///
    /// # Errors
    ///
    /// Returns an error if the window lock is poisoned.
    pub fn snapshot(&self) -> Result<WindowSnapshot> {
        Ok(self.lock()?.clone())
    }

    /// Changes a group's label, as a user would in the browser.
    ///
    /// # Errors
    ///
    /// Returns an error if the group does not exist or cannot be saved.
    pub fn rename_group(&self, group: GroupId, label: &str) -> Result<()> {
        self.mutate(|window| {
            let entry = window
                .groups
                .iter_mut()
                .find(|g| g.id == group)
                .ok_or_else(|| unknown_group(group))?;
            entry.title = label.to_string();
            Ok(())
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, WindowSnapshot>> {
        self.window.lock().map_err(|e| Error::OperationFailed {
            operation: "lock_window".to_string(),
            cause: e.to_string(),
        })
    }

    /// Applies `f` to a copy of the window and keeps it only once saved.
    fn mutate<T>(&self, f: impl FnOnce(&mut WindowSnapshot) -> Result<T>) -> Result<T> {
        let mut window = self.lock()?;
        let mut next = window.clone();
        let out = f(&mut next)?;
        if let Some(path) = &self.path {
            write_snapshot(path, &next)?;
        }
        *window = next;
        Ok(out)
    }
}

impl TabHost for SnapshotHost {
    fn current_window_tabs(&self) -> Result<Vec<HostTab>> {
        Ok(self.lock()?.tabs.clone())
    }

    fn get_tab(&self, id: TabId) -> Result<Option<HostTab>> {
        Ok(self.lock()?.tabs.iter().find(|t| t.id == id).cloned())
    }

    fn create_group(&self, tab_ids: &[TabId]) -> Result<GroupId> {
        self.mutate(|window| {
            if let Some(missing) = tab_ids
                .iter()
                .find(|id| !window.tabs.iter().any(|t| t.id == **id))
            {
                return Err(Error::OperationFailed {
                    operation: "create_group".to_string(),
                    cause: format!("no tab with id {missing}"),
                });
            }

            let group = window.next_group_id()?;
            for tab in &mut window.tabs {
                if tab_ids.contains(&tab.id) {
                    tab.group_id = Some(group);
                }
            }
            window.groups.push(SnapshotGroup {
                id: group,
                title: String::new(),
                collapsed: false,
            });
            window.prune_empty_groups();
            Ok(group)
        })
    }

    fn update_group(&self, group: GroupId, title: &str, collapsed: bool) -> Result<()> {
        self.mutate(|window| {
            let entry = window
                .groups
                .iter_mut()
                .find(|g| g.id == group)
                .ok_or_else(|| unknown_group(group))?;
            entry.title = title.to_string();
            entry.collapsed = collapsed;
            Ok(())
        })
    }

    fn ungroup(&self, tab_ids: &[TabId]) -> Result<()> {
        self.mutate(|window| {
            for tab in &mut window.tabs {
                if tab_ids.contains(&tab.id) {
                    tab.group_id = None;
                }
            }
            window.prune_empty_groups();
            Ok(())
        })
    }

    fn group_members(&self, group: GroupId) -> Result<Vec<HostTab>> {
        Ok(self
            .lock()?
            .tabs
            .iter()
            .filter(|t| t.group_id == Some(group))
            .cloned()
            .collect())
    }
}

fn unknown_group(group: GroupId) -> Error {
    Error::OperationFailed {
        operation: "update_group".to_string(),
        cause: format!("no group with id {group}"),
    }
}

fn read_snapshot(path: &Path) -> Result<WindowSnapshot> {
    let contents = fs::read_to_string(path).map_err(|e| Error::OperationFailed {
        operation: "read_window_snapshot".to_string(),
        cause: format!("{}: {e}", path.display()),
    })?;
    serde_json::from_str(&contents).map_err(|e| {
        Error::InvalidInput(format!("malformed window snapshot {}: {e}", path.display()))
    })
}

fn write_snapshot(path: &Path, window: &WindowSnapshot) -> Result<()> {
    let json = serde_json::to_string_pretty(window).map_err(|e| Error::OperationFailed {
        operation: "serialize_window_snapshot".to_string(),
        cause: e.to_string(),
    })?;
    let tmp = path.with_extension("tmp");
    fs::write(&tmp, json)
        .and_then(|()| fs::rename(&tmp, path))
        .map_err(|e| Error::OperationFailed {
            operation: "write_window_snapshot".to_string(),
            cause: format!("{}: {e}", path.display()),
        })
}
