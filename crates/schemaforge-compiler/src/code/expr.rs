//! Expression and condition nodes of the code model.

use std::sync::Arc;

use schemaforge_core::{DefaultFn, FieldPath, MapFn, PrimitiveType, Value};

/// Formal parameter an expression reads from.
///
/// `Entity` is the first parameter of an operation (`entity`, `a`,
/// `destination`); inside statements it is the entity being written.
/// `Other` is the second parameter (`b`, `source`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Param {
    Entity,
    Other,
}

/// A value-producing expression.
///
/// Evaluation yields `None` when the value is absent, which makes literal
/// fields drop out of the generated object.
#[derive(Clone)]
pub enum Expr {
    /// Value at a path of a parameter.
    Read(Param, FieldPath),
    /// First expression, or the second when the first is absent.
    OrElse(Box<Expr>, Box<Expr>),
    /// Calls a default provider.
    Default(DefaultFn),
    /// Calls a bound compute helper with the entity.
    Helper(String),
    /// A constant.
    Literal(Value),
    /// Transforms the value at a path. Null passes through.
    Map {
        param: Param,
        path: FieldPath,
        map: MapKind,
    },
    /// Interpolates values into one string, separated by the configured separator.
    Template(Vec<TemplatePart>),
    /// `a.path == b.path`, absent equal to absent.
    Equals(FieldPath),
    /// Logical AND over boolean expressions.
    All(Vec<Expr>),
    /// Logical OR over boolean expressions.
    Any(Vec<Expr>),
    /// Boolean value of a condition.
    Test(Cond),
    /// Positional list; absent entries become null.
    List(Vec<Expr>),
}

impl Expr {
    pub fn read(path: &FieldPath) -> Self {
        Expr::Read(Param::Entity, path.clone())
    }

    /// Combines `self` and `next` with logical AND, flattening nested `All`.
    pub fn and(self, next: Expr) -> Self {
        match self {
            Expr::All(mut terms) => {
                terms.push(next);
                Expr::All(terms)
            }
            first => Expr::All(vec![first, next]),
        }
    }

    /// Whether evaluating the expression can fail at runtime.
    pub fn is_fallible(&self) -> bool {
        match self {
            Expr::Map {
                map: MapKind::Decode(_),
                ..
            } => true,
            Expr::OrElse(a, b) => a.is_fallible() || b.is_fallible(),
            Expr::All(terms) | Expr::Any(terms) | Expr::List(terms) => {
                terms.iter().any(Expr::is_fallible)
            }
            _ => false,
        }
    }
}

/// How [`Expr::Map`] transforms its input.
#[derive(Clone)]
pub enum MapKind {
    /// User-supplied serializer or deserializer.
    Custom(MapFn),
    /// Checks and converts a raw value into the declared type.
    Decode(Decoder),
    /// Encodes dates with the configured date encoding.
    EncodeDate,
}

/// Decoding rule for one deserialized leaf.
#[derive(Debug, Clone)]
pub struct Decoder {
    /// Entity path reported in errors.
    pub path: FieldPath,
    pub ty: PrimitiveType,
    /// Decode element-wise from a list.
    pub array: bool,
    pub literals: Option<Arc<[Value]>>,
}

/// One interpolated segment of a hash template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplatePart {
    Value(FieldPath),
    /// Rendered as compact JSON; absent renders empty.
    Key(FieldPath),
    /// Rendered as RFC 3339 whether stored as a date or as epoch millis.
    Date(FieldPath),
}

/// A boolean test over parameter values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cond {
    /// The path holds a value, null included.
    Exists(Param, FieldPath),
    /// The path holds a non-null value.
    Present(Param, FieldPath),
    /// The path is absent or null.
    Missing(Param, FieldPath),
    /// The path holds null.
    IsNull(Param, FieldPath),
    All(Vec<Cond>),
}
