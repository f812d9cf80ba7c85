//! Person fixtures.
//!
//! ```
//! use schemaforge_test::person::{person_schema, sample_person};
//!
//! let schema = person_schema();
//! assert_eq!(schema.fields().unwrap().len(), 3);
//! assert!(sample_person().get_path(&"address.zip".into()).is_some());
//! ```

use schemaforge_core::{s, SchemaNode, Value};
use serde_json::json;

/// `{ id: key + identity, name, address: { city, zip } }`.
pub fn person_schema() -> SchemaNode {
    s::object([
        ("id", s::string().key().identity()),
        ("name", s::string()),
        (
            "address",
            s::object([("city", s::string()), ("zip", s::string())]),
        ),
    ])
}

pub fn sample_person() -> Value {
    Value::from(json!({
        "id": "p-1",
        "name": "Ada Lovelace",
        "address": {"city": "London", "zip": "W1"}
    }))
}

/// A person the persistence layer has not assigned an id to yet.
pub fn unsaved_person() -> Value {
    Value::from(json!({
        "name": "Grace Hopper",
        "address": {"city": "New York", "zip": "10001"}
    }))
}
