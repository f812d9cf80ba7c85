//! Shared test fixtures for SchemaForge crates.
//!
//! - [`person`] - the person/address scenario with one identity key
//! - [`keys`] - composite keys and named indexes
//! - [`typed`] - every primitive kind, renamed fields and derived properties
//!
//! # Usage
//!
//! Add as a dev-dependency in your crate's `Cargo.toml`:
//!
//! ```toml
//! [dev-dependencies]
//! schemaforge-test = { workspace = true }
//! ```

pub mod keys;
pub mod person;
pub mod typed;

pub use keys::{composite_key_schema, indexed_schema, sample_line};
pub use person::{person_schema, sample_person};
pub use typed::{sample_record, typed_schema};

use schemaforge_core::Value;

/// Converts a `serde_json::json!` literal into a [`Value`].
pub fn value(json: serde_json::Value) -> Value {
    Value::from(json)
}
