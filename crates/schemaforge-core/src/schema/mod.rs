//! Schema declaration types.
//!
//! A schema is a tree of [`SchemaNode`] values built through the [`s`]
//! constructors and modifier chains:
//!
//! ```
//! use schemaforge_core::s;
//!
//! let person = s::object([
//!     ("id", s::string().key().identity()),
//!     ("name", s::string().index("by_name")),
//!     ("address", s::object([("city", s::string()), ("zip", s::string())]).nullable()),
//! ]);
//! assert!(person.fields().is_some());
//! ```
//!
//! Every modifier borrows the receiver and returns a new node, so a base node
//! can be reused in several places without being affected by later modifiers.

pub mod s;


use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::value::Value;

/// Ordered field declarations of an object or definition.
pub type Fields = IndexMap<String, SchemaNode>;

/// Produces a default value for an absent field.
pub type DefaultFn = Arc<dyn Fn() -> Value + Send + Sync>;

/// Maps one value into another (custom serializers and deserializers).
pub type MapFn = Arc<dyn Fn(&Value) -> Value + Send + Sync>;

/// Body of a computed or function property.
pub type ComputeFn = Arc<dyn Fn(&ComputeContext<'_>) -> Value + Send + Sync>;

/// Arguments passed to computed and function property bodies.
#[derive(Debug, Clone, Copy)]
pub struct ComputeContext<'a> {
    /// The entity the property belongs to.
    pub entity: &'a Value,
    /// The injected dependency named by `.inject()`, if any.
    pub injected: Option<&'a Value>,
    /// Collection the schema was compiled for.
    pub collection: &'a str,
}

/// Scalar kinds a leaf property can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveType {
    String,
    Number,
    Integer,
    Boolean,
    Date,
    /// Any JSON-compatible value, passed through untouched.
    Json,
    /// One of an explicit allow-list of values.
    Literal,
}

impl PrimitiveType {
    pub fn name(self) -> &'static str {
        match self {
            PrimitiveType::String => "string",
            PrimitiveType::Number => "number",
            PrimitiveType::Integer => "integer",
            PrimitiveType::Boolean => "boolean",
            PrimitiveType::Date => "date",
            PrimitiveType::Json => "json",
            PrimitiveType::Literal => "literal",
        }
    }
}

impl fmt::Display for PrimitiveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A reusable object shape created by [`s::define`] or [`SchemaNode::modify`].
#[derive(Debug, Clone)]
pub struct Definition {
    pub name: String,
    pub fields: Fields,
}

/// Element type tag of a schema node.
#[derive(Clone)]
pub enum NodeType {
    Primitive(PrimitiveType),
    Literal(Arc<[Value]>),
    Object(Arc<Fields>),
    Array(Arc<SchemaNode>),
    Computed(ComputeFn),
    Function(ComputeFn),
    Definition(Arc<Definition>),
}

impl NodeType {
    pub fn name(&self) -> &'static str {
        match self {
            NodeType::Primitive(p) => p.name(),
            NodeType::Literal(_) => "literal",
            NodeType::Object(_) => "object",
            NodeType::Array(_) => "array",
            NodeType::Computed(_) => "computed",
            NodeType::Function(_) => "function",
            NodeType::Definition(_) => "definition",
        }
    }
}

impl fmt::Debug for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeType::Primitive(p) => write!(f, "Primitive({p})"),
            NodeType::Literal(values) => f.debug_tuple("Literal").field(values).finish(),
            NodeType::Object(fields) => f.debug_tuple("Object").field(&fields.keys().collect::<Vec<_>>()).finish(),
            NodeType::Array(element) => f.debug_tuple("Array").field(element).finish(),
            NodeType::Computed(_) => f.write_str("Computed(<fn>)"),
            NodeType::Function(_) => f.write_str("Function(<fn>)"),
            NodeType::Definition(def) => write!(f, "Definition({})", def.name),
        }
    }
}

/// Modifier state carried by a node.
#[derive(Clone, Default)]
pub struct NodeState {
    pub optional: bool,
    pub nullable: bool,
    pub key: bool,
    pub identity: bool,
    pub readonly: bool,
    pub unmapped: bool,
    pub distinct: bool,
    pub indexes: Vec<String>,
    pub inject: Option<String>,
    pub default: Option<DefaultFn>,
    pub serializer: Option<MapFn>,
    pub deserializer: Option<MapFn>,
    pub source: Option<String>,
}

impl fmt::Debug for NodeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeState")
            .field("optional", &self.optional)
            .field("nullable", &self.nullable)
            .field("key", &self.key)
            .field("identity", &self.identity)
            .field("readonly", &self.readonly)
            .field("unmapped", &self.unmapped)
            .field("distinct", &self.distinct)
            .field("indexes", &self.indexes)
            .field("inject", &self.inject)
            .field("default", &self.default.is_some())
            .field("serializer", &self.serializer.is_some())
            .field("deserializer", &self.deserializer.is_some())
            .field("source", &self.source)
            .finish()
    }
}

/// One node of a schema declaration.
#[derive(Debug, Clone)]
pub struct SchemaNode {
    ty: NodeType,
    state: NodeState,
}

impl SchemaNode {
    /// Creates an unmodified node of the given type.
    pub fn new(ty: NodeType) -> Self {
        Self {
            ty,
            state: NodeState::default(),
        }
    }

    pub fn node_type(&self) -> &NodeType {
        &self.ty
    }

    pub fn state(&self) -> &NodeState {
        &self.state
    }

    /// Field declarations for object and definition nodes.
    pub fn fields(&self) -> Option<&Fields> {
        match &self.ty {
            NodeType::Object(fields) => Some(fields),
            NodeType::Definition(def) => Some(&def.fields),
            _ => None,
        }
    }

    fn with(&self, apply: impl FnOnce(&mut NodeState)) -> Self {
        let mut next = self.clone();
        apply(&mut next.state);
        next
    }

    /// The field may be absent.
    pub fn optional(&self) -> Self {
        self.with(|s| s.optional = true)
    }

    /// The field may hold null.
    pub fn nullable(&self) -> Self {
        self.with(|s| s.nullable = true)
    }

    /// The field is (part of) the entity key.
    pub fn key(&self) -> Self {
        self.with(|s| s.key = true)
    }

    /// The field is assigned by the persistence layer. Implies readonly.
    pub fn identity(&self) -> Self {
        self.with(|s| s.identity = true)
    }

    /// The field cannot be overwritten once it holds a value.
    pub fn readonly(&self) -> Self {
        self.with(|s| s.readonly = true)
    }

    /// The field lives on the entity but is never persisted or serialized.
    pub fn unmapped(&self) -> Self {
        self.with(|s| s.unmapped = true)
    }

    /// The field value is unique across the collection.
    pub fn distinct(&self) -> Self {
        self.with(|s| s.distinct = true)
    }

    /// Adds the field to the named index.
    pub fn index(&self, name: impl Into<String>) -> Self {
        let name = name.into();
        self.with(move |s| s.indexes.push(name))
    }

    /// Names the injected dependency passed to a computed or function body.
    pub fn inject(&self, name: impl Into<String>) -> Self {
        let name = name.into();
        self.with(move |s| s.inject = Some(name))
    }

    /// Uses `value` when the field is absent.
    pub fn default(&self, value: impl Into<Value>) -> Self {
        let value = value.into();
        self.default_with(move || value.clone())
    }

    /// Calls `provider` when the field is absent.
    pub fn default_with(&self, provider: impl Fn() -> Value + Send + Sync + 'static) -> Self {
        let provider: DefaultFn = Arc::new(provider);
        self.with(move |s| s.default = Some(provider))
    }

    /// Custom transform applied by `serialize`.
    pub fn serializer(&self, map: impl Fn(&Value) -> Value + Send + Sync + 'static) -> Self {
        let map: MapFn = Arc::new(map);
        self.with(move |s| s.serializer = Some(map))
    }

    /// Custom transform applied by `deserialize`.
    pub fn deserializer(&self, map: impl Fn(&Value) -> Value + Send + Sync + 'static) -> Self {
        let map: MapFn = Arc::new(map);
        self.with(move |s| s.deserializer = Some(map))
    }

    /// Name of the field in serialized records, when it differs.
    pub fn source(&self, name: impl Into<String>) -> Self {
        let name = name.into();
        self.with(move |s| s.source = Some(name))
    }

    /// Derives a named definition from this node's fields.
    ///
    /// The closure receives a copy of the fields and may add, replace or
    /// remove entries. Nodes without fields start from an empty set. Modifier
    /// state is carried over to the new node.
    pub fn modify(&self, name: impl Into<String>, edit: impl FnOnce(&mut Fields)) -> Self {
        let mut fields = self.fields().cloned().unwrap_or_default();
        edit(&mut fields);
        Self {
            ty: NodeType::Definition(Arc::new(Definition {
                name: name.into(),
                fields,
            })),
            state: self.state.clone(),
        }
    }
}
