//! SchemaForge - compile entity schemas into lifecycle functions.
//!
//! Declare a schema once, compile it for a collection, and use the result to
//! identify, hash, compare, copy, serialize and track entities.
//!
//! # Example
//!
//! ```rust
//! use schemaforge::prelude::*;
//!
//! let schema = s::object([
//!     ("id", s::string().key().identity()),
//!     ("name", s::string().default("anonymous")),
//! ]);
//! let people = compile(&schema, "people").unwrap();
//!
//! let raw = Value::from(serde_json::json!({"id": "p-1"}));
//! let mut person = people.enrich(&people.deserialize(&raw).unwrap(), TrackingMode::Tracked).unwrap();
//! assert_eq!(person.get("name"), Some(&Value::from("anonymous")));
//!
//! person.set("name", "Ada").unwrap();
//! assert!(person.is_dirty());
//! assert!(person.set("id", "p-2").is_err());
//! ```
//!
//! Enable the `console` feature and call `console::init()` for colored
//! compile logs.

pub use schemaforge_core::{
    discover_indexes, s, Change, ChangeTracker, ComputeContext, Entity, FieldPath, IndexDescriptor,
    IndexKind, Object, PrimitiveType, PropertyInfo, PropertyKind, SchemaError, SchemaNode,
    TrackerState, TrackingMode, Value,
};

pub use schemaforge_compiler::{
    compile, fingerprint, CompileError, CompiledSchema, HashType, Operation, SchemaCompiler,
};

pub use schemaforge_config::{CompilerConfig, ConfigError, DateEncoding, TrackingModeConfig};

#[cfg(feature = "console")]
pub mod console;

/// Custom handler chains and code-model inspection.
pub mod advanced {
    pub use schemaforge_compiler::code;
    pub use schemaforge_compiler::{walk, Bindings, CodeModel, Handler, HandlerChain, PropertyTree};
}

pub mod prelude {
    pub use super::{compile, CompiledSchema, HashType, SchemaCompiler};
    pub use super::{s, Entity, FieldPath, SchemaNode, TrackingMode, Value};
    pub use super::{CompilerConfig, DateEncoding};
}
