//! Key and index fixtures.

use schemaforge_core::{s, SchemaNode, Value};
use serde_json::json;

/// Order lines keyed by `order` and `line`.
pub fn composite_key_schema() -> SchemaNode {
    s::object([
        ("order", s::string().key()),
        ("line", s::integer().key()),
        ("sku", s::string()),
        ("quantity", s::integer().default(1)),
    ])
}

pub fn sample_line() -> Value {
    Value::from(json!({"order": "o-7", "line": 2, "sku": "A-100", "quantity": 3}))
}

/// `a` (key, identity), `b` and `c` sharing index `ix1`, `email` distinct.
pub fn indexed_schema() -> SchemaNode {
    s::object([
        ("a", s::string().key().identity()),
        ("b", s::integer().index("ix1")),
        ("c", s::integer().index("ix1")),
        ("email", s::string().distinct()),
        ("city", s::string().index("by_city")),
    ])
}
