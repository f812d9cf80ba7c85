//! A record touching every property kind.

use schemaforge_core::{s, SchemaNode, Value};
use serde_json::json;

/// Primitive kinds, a renamed field, a renamed date, a literal allow-list,
/// an unmapped leaf, a computed value and a function.
pub fn typed_schema() -> SchemaNode {
    s::object([
        ("id", s::integer().key()),
        ("title", s::string().source("headline")),
        ("score", s::number()),
        ("active", s::boolean().default(true)),
        ("created", s::date().source("created_at")),
        ("tags", s::array(s::string())),
        ("status", s::literal(["draft", "published"])),
        ("meta", s::json().optional()),
        ("notes", s::string().unmapped()),
        (
            "summary",
            s::computed(|ctx| {
                let title = ctx
                    .entity
                    .get_path(&"title".into())
                    .and_then(Value::as_str)
                    .unwrap_or("untitled");
                Value::from(format!("{}: {title}", ctx.collection))
            }),
        ),
        (
            "tag_count",
            s::function(|ctx| {
                let count = ctx
                    .entity
                    .get_path(&"tags".into())
                    .and_then(Value::as_list)
                    .map_or(0, <[Value]>::len);
                Value::Int(count as i64)
            }),
        ),
    ])
}

/// A stored record in its external shape.
pub fn sample_record() -> Value {
    Value::from(json!({
        "id": 42,
        "headline": "Hello",
        "score": 9.5,
        "active": false,
        "created_at": "2024-05-01T10:00:00.000Z",
        "tags": ["a", "b"],
        "status": "draft",
        "meta": {"source": "import"}
    }))
}
