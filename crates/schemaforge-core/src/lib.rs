//! SchemaForge Core - value model and schema declarations
//!
//! This crate provides the building blocks the schema compiler works on:
//! - [`Value`] trees for dynamic entities and dotted [`FieldPath`]s
//! - The persistent schema builder ([`s`] constructors and [`SchemaNode`] modifiers)
//! - [`PropertyInfo`], the compiled per-field metadata tree
//! - Index discovery over compiled properties
//! - The [`Entity`] wrapper with write interception and change tracking

pub mod error;
pub mod index;
pub mod path;
pub mod property;
pub mod schema;
pub mod tracking;
pub mod value;

pub use error::{Result, SchemaError};
pub use index::{discover_indexes, IndexDescriptor, IndexKind};
pub use path::FieldPath;
pub use property::{PropertyInfo, PropertyKind};
pub use schema::{
    s, ComputeContext, ComputeFn, DefaultFn, Definition, Fields, MapFn, NodeState, NodeType,
    PrimitiveType, SchemaNode,
};
pub use tracking::{BoundMethod, Change, ChangeTracker, Entity, TrackerState, TrackingMode};
pub use value::{date_from_millis, format_date, parse_date, Object, Value};
