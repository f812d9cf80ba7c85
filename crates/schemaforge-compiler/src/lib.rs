//! SchemaForge Compiler - schemas to entity-lifecycle functions
//!
//! Compilation walks a schema once, building the [`PropertyInfo`] tree and
//! feeding every property through thirteen handler chains. Each chain writes
//! into the [code model](code) of its operation; the models are then folded
//! into closures and packaged as a [`CompiledSchema`].
//!
//! ```
//! use schemaforge_compiler::{compile, HashType};
//! use schemaforge_core::{s, Value};
//!
//! let schema = s::object([
//!     ("id", s::string().key().identity()),
//!     ("name", s::string().default("anonymous")),
//! ]);
//! let people = compile(&schema, "people").unwrap();
//!
//! let draft = Value::from(serde_json::json!({}));
//! assert_eq!(people.get_hash_type(&draft), HashType::Object);
//! assert_eq!(people.prepare(&draft).to_json(), serde_json::json!({"name": "anonymous"}));
//! ```
//!
//! [`PropertyInfo`]: schemaforge_core::PropertyInfo

pub mod code;
pub mod compiled;
pub mod compiler;
pub mod error;
pub mod fingerprint;
pub mod handlers;
mod synth;
pub mod walker;

pub use code::{CodeModel, Operation};
pub use compiled::{CompiledSchema, HashType};
pub use compiler::{compile, SchemaCompiler};
pub use error::{CompileError, Result};
pub use fingerprint::fingerprint;
pub use handlers::{Handler, HandlerChain};
pub use synth::Bindings;
pub use walker::{walk, PropertyTree};
