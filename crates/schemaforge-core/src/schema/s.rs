//! Schema node constructors.

use std::sync::Arc;

use super::{ComputeContext, Definition, Fields, NodeType, PrimitiveType, SchemaNode};
use crate::value::Value;

fn primitive(ty: PrimitiveType) -> SchemaNode {
    SchemaNode::new(NodeType::Primitive(ty))
}

fn collect_fields<N: Into<String>>(fields: impl IntoIterator<Item = (N, SchemaNode)>) -> Fields {
    fields.into_iter().map(|(name, node)| (name.into(), node)).collect()
}

pub fn string() -> SchemaNode {
    primitive(PrimitiveType::String)
}

pub fn number() -> SchemaNode {
    primitive(PrimitiveType::Number)
}

pub fn integer() -> SchemaNode {
    primitive(PrimitiveType::Integer)
}

pub fn boolean() -> SchemaNode {
    primitive(PrimitiveType::Boolean)
}

pub fn date() -> SchemaNode {
    primitive(PrimitiveType::Date)
}

/// Untyped JSON-compatible value.
pub fn json() -> SchemaNode {
    primitive(PrimitiveType::Json)
}

/// A value restricted to `values`.
pub fn literal<V: Into<Value>>(values: impl IntoIterator<Item = V>) -> SchemaNode {
    let values: Arc<[Value]> = values.into_iter().map(Into::into).collect();
    SchemaNode::new(NodeType::Literal(values))
}

/// A nested object with ordered fields.
pub fn object<N: Into<String>>(fields: impl IntoIterator<Item = (N, SchemaNode)>) -> SchemaNode {
    SchemaNode::new(NodeType::Object(Arc::new(collect_fields(fields))))
}

/// A list whose elements follow `element`.
pub fn array(element: SchemaNode) -> SchemaNode {
    SchemaNode::new(NodeType::Array(Arc::new(element)))
}

/// A named, reusable object shape. Inlined wherever it is referenced.
pub fn define<N: Into<String>>(
    name: impl Into<String>,
    fields: impl IntoIterator<Item = (N, SchemaNode)>,
) -> SchemaNode {
    SchemaNode::new(NodeType::Definition(Arc::new(Definition {
        name: name.into(),
        fields: collect_fields(fields),
    })))
}

/// A value derived from the entity during enrichment.
pub fn computed(body: impl Fn(&ComputeContext<'_>) -> Value + Send + Sync + 'static) -> SchemaNode {
    SchemaNode::new(NodeType::Computed(Arc::new(body)))
}

/// A callable attached to enriched entities, invoked with `Entity::invoke`.
pub fn function(body: impl Fn(&ComputeContext<'_>) -> Value + Send + Sync + 'static) -> SchemaNode {
    SchemaNode::new(NodeType::Function(Arc::new(body)))
}
