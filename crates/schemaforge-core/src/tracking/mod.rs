//! Write interception for live entities.
//!
//! An [`Entity`] owns a [`Value`] and routes every mutation through
//! [`Entity::set`] or [`Entity::assign`], which is where frozen and readonly
//! paths are enforced and where writes are fed into the [`ChangeTracker`].
//!
//! # State machine
//!
//! ```text
//! Untracked --first watched write--> Tracking <--pause/resume--> Paused
//! ```

mod tracker;

#[cfg(test)]
mod tests;

pub use tracker::{Change, ChangeTracker, TrackerState};

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::error::{Result, SchemaError};
use crate::path::FieldPath;
use crate::value::Value;

/// How `enrich` prepares the returned entity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum TrackingMode {
    /// Plain entity, no tracker, not frozen.
    Off,
    /// Change tracking installed.
    #[default]
    Tracked,
    /// Frozen; every write fails.
    Immutable,
}

/// A function property bound to its injected dependency and collection.
pub type BoundMethod = Arc<dyn Fn(&Value) -> Value + Send + Sync>;

/// A live entity with write interception.
#[derive(Clone, Default)]
pub struct Entity {
    value: Value,
    tracker: Option<ChangeTracker>,
    frozen: BTreeSet<FieldPath>,
    readonly: BTreeSet<FieldPath>,
    methods: IndexMap<String, BoundMethod>,
}

impl Entity {
    /// Wraps `value` without tracking, freezing or readonly paths.
    pub fn new(value: Value) -> Self {
        Self {
            value,
            ..Self::default()
        }
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn into_value(self) -> Value {
        self.value
    }

    /// Reads the value at a dotted path.
    pub fn get(&self, path: &str) -> Option<&Value> {
        self.value.get_path(&FieldPath::parse(path))
    }

    pub fn get_path(&self, path: &FieldPath) -> Option<&Value> {
        self.value.get_path(path)
    }

    /// User write at a dotted path.
    ///
    /// Fails on frozen paths, on readonly paths that already hold a value,
    /// and when an intermediate is null or not an object.
    pub fn set(&mut self, path: &str, value: impl Into<Value>) -> Result<()> {
        self.set_path(&FieldPath::parse(path), value.into())
    }

    pub fn set_path(&mut self, path: &FieldPath, value: Value) -> Result<()> {
        if self.is_readonly(path) && !self.value.is_missing(path) {
            return Err(SchemaError::Readonly {
                path: path.to_string(),
            });
        }
        self.assign(path, value)
    }

    /// Internal write that skips the readonly check. Still honours frozen
    /// paths and is recorded unless tracking is paused.
    pub fn assign(&mut self, path: &FieldPath, value: Value) -> Result<()> {
        if self.is_frozen(path) {
            return Err(SchemaError::Frozen {
                path: path.to_string(),
            });
        }
        let previous = self.value.set_path(path, value.clone())?;
        if let Some(tracker) = self.tracker.as_mut() {
            tracker.record(path, previous.as_ref(), &value);
        }
        Ok(())
    }

    /// Installs a tracker (if none) and watches `paths`.
    pub fn enable_tracking(&mut self, paths: impl IntoIterator<Item = FieldPath>) {
        let tracker = self.tracker.get_or_insert_with(ChangeTracker::new);
        for path in paths {
            tracker.watch(path);
        }
    }

    pub fn tracker(&self) -> Option<&ChangeTracker> {
        self.tracker.as_ref()
    }

    pub fn is_tracked(&self) -> bool {
        self.tracker.is_some()
    }

    pub fn is_dirty(&self) -> bool {
        self.tracker.as_ref().is_some_and(ChangeTracker::is_dirty)
    }

    /// Changed paths mapped to their current values. Empty when untracked.
    pub fn changed_values(&self) -> IndexMap<String, Value> {
        self.tracker
            .as_ref()
            .map(ChangeTracker::changed_values)
            .unwrap_or_default()
    }

    pub fn changes(&self) -> Option<&IndexMap<FieldPath, Change>> {
        self.tracker.as_ref().map(ChangeTracker::changes)
    }

    pub fn pause_tracking(&mut self) {
        if let Some(tracker) = self.tracker.as_mut() {
            tracker.pause();
        }
    }

    pub fn resume_tracking(&mut self) {
        if let Some(tracker) = self.tracker.as_mut() {
            tracker.resume();
        }
    }

    /// Clears change records once the current state has been persisted.
    pub fn commit(&mut self) {
        if let Some(tracker) = self.tracker.as_mut() {
            tracker.clear();
        }
    }

    /// Freezes `path` and everything below it. The root path freezes all.
    pub fn freeze_path(&mut self, path: FieldPath) {
        self.frozen.insert(path);
    }

    pub fn is_frozen(&self, path: &FieldPath) -> bool {
        self.frozen.iter().any(|f| path.starts_with(f))
    }

    /// True once the root itself is frozen.
    pub fn is_frozen_root(&self) -> bool {
        self.frozen.contains(&FieldPath::root())
    }

    pub fn frozen_paths(&self) -> impl Iterator<Item = &FieldPath> {
        self.frozen.iter()
    }

    pub fn protect(&mut self, path: FieldPath) {
        self.readonly.insert(path);
    }

    pub fn is_readonly(&self, path: &FieldPath) -> bool {
        self.readonly.contains(path)
    }

    pub fn attach_method(&mut self, name: impl Into<String>, method: BoundMethod) {
        self.methods.entry(name.into()).or_insert(method);
    }

    pub fn has_method(&self, name: &str) -> bool {
        self.methods.contains_key(name)
    }

    /// Calls the function property `name` with the current entity value.
    pub fn invoke(&self, name: &str) -> Result<Value> {
        let method = self
            .methods
            .get(name)
            .ok_or_else(|| SchemaError::UnknownFunction {
                name: name.to_owned(),
            })?;
        Ok(method(&self.value))
    }
}

impl fmt::Debug for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Entity")
            .field("value", &self.value)
            .field("tracker", &self.tracker)
            .field("frozen", &self.frozen)
            .field("readonly", &self.readonly)
            .field("methods", &self.methods.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl From<Value> for Entity {
    fn from(value: Value) -> Self {
        Entity::new(value)
    }
}
