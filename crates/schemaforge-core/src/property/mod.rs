//! Compiled property metadata.
//!
//! [`PropertyInfo`] is the per-field node of the property tree built once by
//! the compiler's walker. Parents own their children through `Arc`; children
//! point back through `Weak`. Derived values (paths, depth, ancestor and
//! descendant facts) are computed on first access and cached.

#[cfg(test)]
mod tests;

use std::fmt;
use std::sync::{Arc, Weak};

use once_cell::sync::OnceCell;

use crate::error::{Result, SchemaError};
use crate::path::FieldPath;
use crate::schema::{ComputeFn, DefaultFn, MapFn, NodeType, PrimitiveType, SchemaNode};
use crate::value::Value;

/// Closed set of property kinds the handler chains dispatch on.
#[derive(Clone)]
pub enum PropertyKind {
    /// Scalar leaf.
    Primitive(PrimitiveType),
    /// Nested object; its fields are the children.
    Object,
    /// List leaf with the given element type. Object elements use `Json`.
    Array(PrimitiveType),
    /// Value derived from the entity during enrichment.
    Computed(ComputeFn),
    /// Callable attached to enriched entities.
    Function(ComputeFn),
}

impl PropertyKind {
    fn from_node(node: &SchemaNode) -> Self {
        match node.node_type() {
            NodeType::Primitive(ty) => PropertyKind::Primitive(*ty),
            NodeType::Literal(_) => PropertyKind::Primitive(PrimitiveType::Literal),
            NodeType::Object(_) | NodeType::Definition(_) => PropertyKind::Object,
            NodeType::Array(element) => PropertyKind::Array(match element.node_type() {
                NodeType::Primitive(ty) => *ty,
                NodeType::Literal(_) => PrimitiveType::Literal,
                _ => PrimitiveType::Json,
            }),
            NodeType::Computed(body) => PropertyKind::Computed(body.clone()),
            NodeType::Function(body) => PropertyKind::Function(body.clone()),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            PropertyKind::Primitive(ty) => ty.name(),
            PropertyKind::Object => "object",
            PropertyKind::Array(_) => "array",
            PropertyKind::Computed(_) => "computed",
            PropertyKind::Function(_) => "function",
        }
    }
}

impl fmt::Debug for PropertyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyKind::Primitive(ty) => write!(f, "Primitive({ty})"),
            PropertyKind::Object => f.write_str("Object"),
            PropertyKind::Array(ty) => write!(f, "Array({ty})"),
            PropertyKind::Computed(_) => f.write_str("Computed"),
            PropertyKind::Function(_) => f.write_str("Function"),
        }
    }
}

/// Compiled metadata for one schema field.
pub struct PropertyInfo {
    name: String,
    source_name: Option<String>,
    kind: PropertyKind,
    definition: Option<String>,
    optional: bool,
    nullable: bool,
    key: bool,
    identity: bool,
    readonly: bool,
    unmapped: bool,
    distinct: bool,
    indexes: Vec<String>,
    inject: Option<String>,
    default: Option<DefaultFn>,
    serializer: Option<MapFn>,
    deserializer: Option<MapFn>,
    literals: Option<Arc<[Value]>>,
    parent: Option<Weak<PropertyInfo>>,
    children: OnceCell<Vec<Arc<PropertyInfo>>>,
    path: OnceCell<FieldPath>,
    source_path: OnceCell<FieldPath>,
    parent_path: OnceCell<FieldPath>,
    depth: OnceCell<usize>,
    nullable_ancestor: OnceCell<bool>,
    identity_descendant: OnceCell<bool>,
}

impl PropertyInfo {
    /// Builds the property for field `name` declared by `node` under `parent`.
    ///
    /// Validates the field name and that every modifier fits the node kind.
    pub fn from_node(
        name: &str,
        node: &SchemaNode,
        parent: Option<&Arc<PropertyInfo>>,
    ) -> Result<Self> {
        if name.is_empty() || name.contains('.') {
            return Err(SchemaError::InvalidFieldName {
                name: name.to_owned(),
            });
        }
        let state = node.state();
        let info = Self {
            name: name.to_owned(),
            source_name: state.source.clone(),
            kind: PropertyKind::from_node(node),
            definition: match node.node_type() {
                NodeType::Definition(def) => Some(def.name.clone()),
                _ => None,
            },
            optional: state.optional,
            nullable: state.nullable,
            key: state.key,
            identity: state.identity,
            readonly: state.readonly,
            unmapped: state.unmapped,
            distinct: state.distinct,
            indexes: state.indexes.clone(),
            inject: state.inject.clone(),
            default: state.default.clone(),
            serializer: state.serializer.clone(),
            deserializer: state.deserializer.clone(),
            literals: match node.node_type() {
                NodeType::Literal(values) => Some(values.clone()),
                NodeType::Array(element) => match element.node_type() {
                    NodeType::Literal(values) => Some(values.clone()),
                    _ => None,
                },
                _ => None,
            },
            parent: parent.map(Arc::downgrade),
            children: OnceCell::new(),
            path: OnceCell::new(),
            source_path: OnceCell::new(),
            parent_path: OnceCell::new(),
            depth: OnceCell::new(),
            nullable_ancestor: OnceCell::new(),
            identity_descendant: OnceCell::new(),
        };
        // Resolve paths while the parent is guaranteed alive.
        info.path();
        info.source_path();
        info.validate()?;
        Ok(info)
    }

    fn validate(&self) -> Result<()> {
        let invalid = |modifier: &'static str, reason: &'static str| SchemaError::InvalidModifier {
            path: self.path().to_string(),
            modifier,
            reason,
        };
        let scalar = matches!(self.kind, PropertyKind::Primitive(_));
        if self.key && !scalar {
            return Err(invalid("key", "keys must be primitive leaves"));
        }
        if self.identity && !scalar {
            return Err(invalid("identity", "identities must be primitive leaves"));
        }
        if !self.is_leaf() {
            if self.default.is_some() {
                return Err(invalid("default", "defaults apply to data leaves only"));
            }
            if !self.indexes.is_empty() {
                return Err(invalid("index", "only data leaves can be indexed"));
            }
            if self.distinct {
                return Err(invalid("distinct", "only data leaves can be distinct"));
            }
            if self.serializer.is_some() || self.deserializer.is_some() {
                return Err(invalid("serializer", "serializers apply to data leaves only"));
            }
        }
        if self.inject.is_some() && !matches!(self.kind, PropertyKind::Computed(_) | PropertyKind::Function(_)) {
            return Err(invalid("inject", "only computed and function properties take injections"));
        }
        Ok(())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Field name used in serialized records.
    pub fn source_name(&self) -> &str {
        self.source_name.as_deref().unwrap_or(&self.name)
    }

    pub fn kind(&self) -> &PropertyKind {
        &self.kind
    }

    /// Name of the definition this object was unwrapped from.
    pub fn definition(&self) -> Option<&str> {
        self.definition.as_deref()
    }

    /// Primitive and array properties: the values entities actually store.
    pub fn is_leaf(&self) -> bool {
        matches!(self.kind, PropertyKind::Primitive(_) | PropertyKind::Array(_))
    }

    pub fn is_object(&self) -> bool {
        matches!(self.kind, PropertyKind::Object)
    }

    pub fn is_computed(&self) -> bool {
        matches!(self.kind, PropertyKind::Computed(_))
    }

    pub fn is_function(&self) -> bool {
        matches!(self.kind, PropertyKind::Function(_))
    }

    pub fn is_date(&self) -> bool {
        matches!(self.kind, PropertyKind::Primitive(PrimitiveType::Date))
    }

    pub fn is_optional(&self) -> bool {
        self.optional
    }

    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    pub fn is_key(&self) -> bool {
        self.key
    }

    pub fn is_identity(&self) -> bool {
        self.identity
    }

    /// Readonly fields, identities included.
    pub fn is_readonly(&self) -> bool {
        self.readonly || self.identity
    }

    pub fn is_unmapped(&self) -> bool {
        self.unmapped
    }

    /// Whether any ancestor is unmapped, or this property itself.
    pub fn is_effectively_unmapped(&self) -> bool {
        self.unmapped || self.parent().is_some_and(|p| p.is_effectively_unmapped())
    }

    pub fn is_distinct(&self) -> bool {
        self.distinct
    }

    pub fn indexes(&self) -> &[String] {
        &self.indexes
    }

    pub fn inject(&self) -> Option<&str> {
        self.inject.as_deref()
    }

    pub fn default_provider(&self) -> Option<&DefaultFn> {
        self.default.as_ref()
    }

    pub fn serializer(&self) -> Option<&MapFn> {
        self.serializer.as_ref()
    }

    pub fn deserializer(&self) -> Option<&MapFn> {
        self.deserializer.as_ref()
    }

    /// Allow-list of literal properties (or literal array elements).
    pub fn literals(&self) -> Option<&[Value]> {
        self.literals.as_deref()
    }

    /// Body of computed and function properties.
    pub fn body(&self) -> Option<&ComputeFn> {
        match &self.kind {
            PropertyKind::Computed(body) | PropertyKind::Function(body) => Some(body),
            _ => None,
        }
    }

    pub fn parent(&self) -> Option<Arc<PropertyInfo>> {
        self.parent.as_ref().and_then(Weak::upgrade)
    }

    /// Children in declaration order. Empty until attached, and for leaves.
    pub fn children(&self) -> &[Arc<PropertyInfo>] {
        self.children.get().map(Vec::as_slice).unwrap_or(&[])
    }

    /// Attaches the children of an object property. Allowed exactly once.
    pub fn attach_children(&self, children: Vec<Arc<PropertyInfo>>) -> Result<()> {
        self.children.set(children).map_err(|_| {
            SchemaError::Synthesis(format!("children of `{}` attached twice", self.path()))
        })
    }

    /// Full dotted path from the entity root.
    pub fn path(&self) -> &FieldPath {
        self.path.get_or_init(|| match self.parent() {
            Some(parent) => parent.path().child(&self.name),
            None => FieldPath::root().child(&self.name),
        })
    }

    /// Path in serialized records, built from source names.
    pub fn source_path(&self) -> &FieldPath {
        self.source_path.get_or_init(|| match self.parent() {
            Some(parent) => parent.source_path().child(self.source_name()),
            None => FieldPath::root().child(self.source_name()),
        })
    }

    /// Path of the enclosing object; the root path for root properties.
    pub fn parent_path(&self) -> &FieldPath {
        self.parent_path
            .get_or_init(|| self.path().parent().unwrap_or_default())
    }

    /// Nesting depth; root properties have depth 0.
    pub fn depth(&self) -> usize {
        *self
            .depth
            .get_or_init(|| self.parent().map_or(0, |p| p.depth() + 1))
    }

    /// Whether any ancestor may be null or absent.
    pub fn has_nullable_ancestor(&self) -> bool {
        *self.nullable_ancestor.get_or_init(|| {
            self.parent().is_some_and(|p| {
                p.is_nullable() || p.is_optional() || p.has_nullable_ancestor()
            })
        })
    }

    /// Whether any descendant is an identity field.
    ///
    /// Only meaningful after the tree walk completed; the answer is cached.
    pub fn has_identity_descendant(&self) -> bool {
        *self.identity_descendant.get_or_init(|| {
            self.children()
                .iter()
                .any(|c| c.is_identity() || c.has_identity_descendant())
        })
    }
}

impl fmt::Debug for PropertyInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyInfo")
            .field("path", self.path())
            .field("kind", &self.kind)
            .field("key", &self.key)
            .field("identity", &self.identity)
            .field("nullable", &self.nullable)
            .field("optional", &self.optional)
            .field("indexes", &self.indexes)
            .field(
                "children",
                &self.children().iter().map(|c| c.name()).collect::<Vec<_>>(),
            )
            .finish()
    }
}
