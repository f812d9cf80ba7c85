//! Per-entity change records.

use std::collections::BTreeSet;

use indexmap::IndexMap;

use crate::path::FieldPath;
use crate::value::Value;

/// Lifecycle of a [`ChangeTracker`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackerState {
    /// Installed, no write observed yet.
    Untracked,
    /// At least one watched write observed.
    Tracking,
    /// Writes pass through without being recorded.
    Paused,
}

/// Original and current value of one changed path.
#[derive(Debug, Clone, PartialEq)]
pub struct Change {
    /// Value before the first recorded write; `None` if the path was absent.
    pub original: Option<Value>,
    /// Most recently written value.
    pub current: Value,
}

/// Records writes to watched paths of one entity.
///
/// A path is watched if it, or one of its ancestors, was registered with
/// [`ChangeTracker::watch`]. Writes below a watched object are recorded
/// under their full dotted path.
#[derive(Debug, Clone)]
pub struct ChangeTracker {
    watched: BTreeSet<FieldPath>,
    changes: IndexMap<FieldPath, Change>,
    state: TrackerState,
    resume_to: TrackerState,
}

impl Default for ChangeTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl ChangeTracker {
    pub fn new() -> Self {
        Self {
            watched: BTreeSet::new(),
            changes: IndexMap::new(),
            state: TrackerState::Untracked,
            resume_to: TrackerState::Untracked,
        }
    }

    pub fn watch(&mut self, path: FieldPath) {
        self.watched.insert(path);
    }

    pub fn watches(&self, path: &FieldPath) -> bool {
        self.watched.iter().any(|w| path.starts_with(w))
    }

    pub fn watched(&self) -> impl Iterator<Item = &FieldPath> {
        self.watched.iter()
    }

    pub fn state(&self) -> TrackerState {
        self.state
    }

    pub fn is_dirty(&self) -> bool {
        !self.changes.is_empty()
    }

    pub fn is_paused(&self) -> bool {
        self.state == TrackerState::Paused
    }

    /// Stops recording. Existing records are kept.
    pub fn pause(&mut self) {
        if self.state != TrackerState::Paused {
            self.resume_to = self.state;
            self.state = TrackerState::Paused;
        }
    }

    /// Resumes recording in the state held before [`ChangeTracker::pause`].
    pub fn resume(&mut self) {
        if self.state == TrackerState::Paused {
            self.state = self.resume_to;
        }
    }

    /// Records a write of `current` over `original` at `path`.
    ///
    /// Writing the first-seen original back removes the record; writing any
    /// other value overwrites the current value and keeps the original.
    ///
    /// Records never nest. A write below a recorded path updates that
    /// record's current value; a write above recorded paths absorbs them,
    /// restoring their originals into the original of the written path.
    pub fn record(&mut self, path: &FieldPath, original: Option<&Value>, current: &Value) {
        if self.is_paused() || !self.watches(path) {
            return;
        }
        self.state = TrackerState::Tracking;

        if let Some(change) = self.changes.get_mut(path) {
            if change.original.as_ref() == Some(current) {
                self.changes.shift_remove(path);
            } else {
                change.current = current.clone();
            }
            return;
        }

        let ancestor = self
            .changes
            .keys()
            .find(|recorded| path.starts_with(recorded))
            .cloned();
        if let Some(ancestor) = ancestor {
            self.update_ancestor(&ancestor, path, current);
            return;
        }

        let first_seen = self.absorb_descendants(path, original.cloned());
        if first_seen.as_ref() == Some(current) {
            return;
        }
        self.changes.insert(
            path.clone(),
            Change {
                original: first_seen,
                current: current.clone(),
            },
        );
    }

    fn update_ancestor(&mut self, ancestor: &FieldPath, path: &FieldPath, current: &Value) {
        let Some(change) = self.changes.get_mut(ancestor) else {
            return;
        };
        if let Some(relative) = path.strip_prefix(ancestor) {
            // the entity accepted the same write, so the mirror accepts it too
            let _ = change.current.set_path(&relative, current.clone());
        }
        if change.original.as_ref() == Some(&change.current) {
            self.changes.shift_remove(ancestor);
        }
    }

    /// Drops records strictly below `path` and returns `previous` with
    /// their originals written back.
    fn absorb_descendants(&mut self, path: &FieldPath, previous: Option<Value>) -> Option<Value> {
        let below: Vec<FieldPath> = self
            .changes
            .keys()
            .filter(|recorded| recorded.starts_with(path))
            .cloned()
            .collect();
        let mut first_seen = previous;
        for recorded in below {
            let Some(change) = self.changes.shift_remove(&recorded) else {
                continue;
            };
            let (Some(base), Some(relative)) = (first_seen.as_mut(), recorded.strip_prefix(path)) else {
                continue;
            };
            match change.original {
                Some(original) => {
                    let _ = base.set_path(&relative, original);
                }
                None => {
                    base.remove_path(&relative);
                }
            }
        }
        first_seen
    }

    pub fn changes(&self) -> &IndexMap<FieldPath, Change> {
        &self.changes
    }

    pub fn change(&self, path: &FieldPath) -> Option<&Change> {
        self.changes.get(path)
    }

    /// Changed paths mapped to their current values.
    pub fn changed_values(&self) -> IndexMap<String, Value> {
        self.changes
            .iter()
            .map(|(path, change)| (path.to_string(), change.current.clone()))
            .collect()
    }

    /// Forgets all records, e.g. after the entity was persisted.
    pub fn clear(&mut self) {
        self.changes.clear();
    }
}
