//! The compiled schema contract.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use schemaforge_core::{Entity, IndexDescriptor, PropertyInfo, Result, TrackingMode, Value};

use crate::code::Operation;
use crate::synth::Operations;

/// Which values [`CompiledSchema::hash`] interpolates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HashType {
    /// Key leaves only.
    Ids,
    /// Every data leaf.
    Object,
}

/// Entity-lifecycle functions and metadata for one collection.
///
/// Built once by [`crate::SchemaCompiler`] and immutable afterwards. Share
/// it through `Arc`; every operation takes `&self`.
pub struct CompiledSchema {
    pub(crate) collection: String,
    pub(crate) id: u64,
    pub(crate) properties: Vec<Arc<PropertyInfo>>,
    pub(crate) all_properties: Vec<Arc<PropertyInfo>>,
    pub(crate) id_properties: Vec<Arc<PropertyInfo>>,
    pub(crate) indexes: Vec<IndexDescriptor>,
    pub(crate) default_tracking: TrackingMode,
    pub(crate) listings: IndexMap<Operation, String>,
    pub(crate) ops: Operations,
}

impl CompiledSchema {
    /// Identifier of `entity`: the single key value, or the object hash when
    /// the schema declares several keys.
    pub fn get_id(&self, entity: &Value) -> Value {
        if self.id_properties.len() == 1 {
            return self.get_ids(entity).into_iter().next().unwrap_or(Value::Null);
        }
        Value::String(self.hash(entity, HashType::Object))
    }

    /// Key values in declaration order; absent keys are `Null`.
    pub fn get_ids(&self, entity: &Value) -> Vec<Value> {
        (self.ops.id_selector)(entity)
    }

    pub fn hash(&self, entity: &Value, hash_type: HashType) -> String {
        match hash_type {
            HashType::Ids => (self.ops.hash_ids)(entity),
            HashType::Object => (self.ops.hash_object)(entity),
        }
    }

    /// `Object` while any identity key is unassigned, else `Ids`.
    pub fn get_hash_type(&self, entity: &Value) -> HashType {
        (self.ops.hash_type)(entity)
    }

    /// Deep copy of data leaves, objects and computed values.
    pub fn clone_entity(&self, entity: &Value) -> Value {
        (self.ops.clone)(entity)
    }

    /// Persisted fields only: unmapped, computed and function properties dropped.
    pub fn strip(&self, entity: &Value) -> Value {
        (self.ops.strip)(entity)
    }

    /// Like [`CompiledSchema::strip`], with defaults applied and non-nullable
    /// objects materialised.
    pub fn prepare(&self, entity: &Value) -> Value {
        (self.ops.prepare)(entity)
    }

    /// True when every data leaf of `a` equals the same leaf of `b`.
    pub fn compare(&self, a: &Value, b: &Value) -> bool {
        (self.ops.compare)(a, b)
    }

    /// External record with source names and encoded dates.
    pub fn serialize(&self, entity: &Value) -> Value {
        (self.ops.serialize)(entity)
    }

    /// Decodes an external record into an entity value.
    pub fn deserialize(&self, raw: &Value) -> Result<Value> {
        (self.ops.deserialize)(raw)
    }

    /// Builds a live entity from `entity` and applies `mode`.
    pub fn enrich(&self, entity: &Value, mode: TrackingMode) -> Result<Entity> {
        (self.ops.enrich)(entity, mode)
    }

    /// [`CompiledSchema::enrich`] with the configured default mode.
    pub fn enrich_default(&self, entity: &Value) -> Result<Entity> {
        self.enrich(entity, self.default_tracking)
    }

    /// Copies present values of `source` into `destination` without
    /// recording them as changes.
    pub fn merge(&self, destination: &mut Entity, source: &Value) -> Result<()> {
        (self.ops.merge)(destination, source)
    }

    /// Freezes the root and every object path of `entity`.
    pub fn freeze(&self, entity: &mut Entity) {
        (self.ops.freeze)(entity)
    }

    /// Installs a tracker watching every data leaf and object path.
    pub fn enable_change_tracking(&self, entity: &mut Entity) {
        (self.ops.change_tracking)(entity)
    }

    /// Root properties in declaration order.
    pub fn properties(&self) -> &[Arc<PropertyInfo>] {
        &self.properties
    }

    /// Every property, breadth first.
    pub fn all_properties(&self) -> &[Arc<PropertyInfo>] {
        &self.all_properties
    }

    /// Key leaves in declaration order.
    pub fn id_properties(&self) -> &[Arc<PropertyInfo>] {
        &self.id_properties
    }

    pub fn has_identities(&self) -> bool {
        self.properties
            .iter()
            .any(|p| p.is_identity() || p.has_identity_descendant())
    }

    pub fn has_identity_keys(&self) -> bool {
        self.id_properties.iter().any(|p| p.is_identity())
    }

    pub fn get_indexes(&self) -> &[IndexDescriptor] {
        &self.indexes
    }

    /// FNV-1a fingerprint of the property paths and collection.
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Rendered code model of `operation`.
    pub fn listing(&self, operation: Operation) -> Option<&str> {
        self.listings.get(&operation).map(String::as_str)
    }
}

impl fmt::Debug for CompiledSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledSchema")
            .field("collection", &self.collection)
            .field("id", &format!("{:016x}", self.id))
            .field(
                "properties",
                &self.all_properties.iter().map(|p| p.path().to_string()).collect::<Vec<_>>(),
            )
            .field("indexes", &self.indexes)
            .finish()
    }
}
