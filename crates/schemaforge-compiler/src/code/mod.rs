//! Intermediate code model.
//!
//! Every operation owns one [`CodeModel`]: a tree of named fragments that
//! handler passes extend independently. A fragment is addressed by the dotted
//! names of its ancestors (`merge.address.city`), and object literals by the
//! slot holding them plus a field path. Lookups never duplicate a fragment:
//! a name that already exists under a parent is reused.

mod expr;
mod render;

#[cfg(test)]
mod tests;

pub use expr::{Cond, Decoder, Expr, MapKind, Param, TemplatePart};

use std::fmt;

use indexmap::IndexMap;
use schemaforge_core::{ComputeFn, FieldPath, Result, SchemaError, TrackingMode};

/// The thirteen generated entity operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Operation {
    Enrich,
    Merge,
    Prepare,
    Strip,
    Clone,
    Compare,
    Deserialize,
    Serialize,
    Hash,
    HashType,
    IdSelector,
    ChangeTracking,
    Freeze,
}

impl Operation {
    /// All operations in handler invocation order.
    pub const ALL: [Operation; 13] = [
        Operation::Enrich,
        Operation::Merge,
        Operation::Prepare,
        Operation::Strip,
        Operation::Clone,
        Operation::Compare,
        Operation::Deserialize,
        Operation::Serialize,
        Operation::Hash,
        Operation::HashType,
        Operation::IdSelector,
        Operation::ChangeTracking,
        Operation::Freeze,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Operation::Enrich => "enrich",
            Operation::Merge => "merge",
            Operation::Prepare => "prepare",
            Operation::Strip => "strip",
            Operation::Clone => "clone",
            Operation::Compare => "compare",
            Operation::Deserialize => "deserialize",
            Operation::Serialize => "serialize",
            Operation::Hash => "hash",
            Operation::HashType => "hash_type",
            Operation::IdSelector => "id_selector",
            Operation::ChangeTracking => "change_tracking",
            Operation::Freeze => "freeze",
        }
    }

    /// Formal parameter names of the synthesized function.
    pub fn params(self) -> &'static [&'static str] {
        match self {
            Operation::Compare => &["a", "b"],
            Operation::Merge => &["destination", "source"],
            Operation::Hash => &["entity", "type"],
            Operation::Enrich => &["entity", "mode"],
            _ => &["entity"],
        }
    }

    /// Whether the operation reads its input into an object literal.
    pub fn builds_literal(self) -> bool {
        matches!(
            self,
            Operation::Enrich
                | Operation::Prepare
                | Operation::Strip
                | Operation::Clone
                | Operation::Deserialize
                | Operation::Serialize
        )
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Side effects applied to a live entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Instruction {
    /// Watch a path for changes.
    Watch(FieldPath),
    /// Freeze a path and everything below it.
    Freeze(FieldPath),
    /// Reject user writes once the path holds a value.
    Protect(FieldPath),
    /// Attach the bound helper as a callable entity method.
    AttachMethod { name: String, helper: String },
}

/// Scope a wrapper fragment puts around its body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WrapperKind {
    /// Pauses change tracking for the duration of the body.
    PauseTracking,
    /// Runs the body only when enriching with this mode.
    WhenMode(TrackingMode),
}

/// One node of the code model.
#[derive(Clone)]
pub enum Fragment {
    Block(Block),
    Object(ObjectLiteral),
    Conditional { cond: Cond, body: Block },
    Assign { target: FieldPath, expr: Expr },
    Wrapper { kind: WrapperKind, body: Block },
    Return(Expr),
    Op(Instruction),
}

impl Fragment {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Fragment::Block(_) => "block",
            Fragment::Object(_) => "object",
            Fragment::Conditional { .. } => "conditional",
            Fragment::Assign { .. } => "assign",
            Fragment::Wrapper { .. } => "wrapper",
            Fragment::Return(_) => "return",
            Fragment::Op(_) => "op",
        }
    }

    /// Nested fragments of container fragments.
    pub fn body(&self) -> Option<&Block> {
        match self {
            Fragment::Block(body)
            | Fragment::Conditional { body, .. }
            | Fragment::Wrapper { body, .. } => Some(body),
            _ => None,
        }
    }

    pub fn body_mut(&mut self) -> Option<&mut Block> {
        match self {
            Fragment::Block(body)
            | Fragment::Conditional { body, .. }
            | Fragment::Wrapper { body, .. } => Some(body),
            _ => None,
        }
    }

    fn is_fallible(&self) -> bool {
        match self {
            Fragment::Object(literal) => literal.is_fallible(),
            Fragment::Assign { expr, .. } | Fragment::Return(expr) => expr.is_fallible(),
            _ => self.body().is_some_and(Block::is_fallible),
        }
    }
}

/// Ordered, named fragments.
#[derive(Clone, Default)]
pub struct Block {
    fragments: IndexMap<String, Fragment>,
}

impl Block {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&Fragment> {
        self.fragments.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Fragment> {
        self.fragments.get_mut(name)
    }

    /// Returns the fragment named `name`, creating it with `make` if absent.
    pub fn entry(&mut self, name: impl Into<String>, make: impl FnOnce() -> Fragment) -> &mut Fragment {
        self.fragments.entry(name.into()).or_insert_with(make)
    }

    /// Adds a fragment; an existing fragment of the same name is kept.
    pub fn insert(&mut self, name: impl Into<String>, fragment: Fragment) {
        self.fragments.entry(name.into()).or_insert(fragment);
    }

    /// Builder form of [`Block::insert`].
    pub fn with(mut self, name: impl Into<String>, fragment: Fragment) -> Self {
        self.insert(name, fragment);
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Fragment)> {
        self.fragments.iter().map(|(name, f)| (name.as_str(), f))
    }

    pub fn len(&self) -> usize {
        self.fragments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    fn is_fallible(&self) -> bool {
        self.fragments.values().any(Fragment::is_fallible)
    }
}

/// Key of a fragment in a flat block keyed by entity path.
///
/// Segments are joined with `/` so the name resolves as a single segment.
pub fn slot_name(path: &FieldPath) -> String {
    path.segments().join("/")
}

/// Structural object literal.
#[derive(Clone, Default)]
pub struct ObjectLiteral {
    fields: IndexMap<String, Field>,
}

/// One field of an [`ObjectLiteral`].
#[derive(Clone)]
pub enum Field {
    Value(Expr),
    Object(NestedObject),
}

/// A nested literal built from the object at `read`.
///
/// An absent source object drops the field and a null one yields null,
/// unless `ensure` is set, in which case the literal is always built.
#[derive(Clone)]
pub struct NestedObject {
    pub param: Param,
    pub read: FieldPath,
    pub ensure: bool,
    pub literal: ObjectLiteral,
}

impl ObjectLiteral {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `key: expr`. An existing field of the same key is kept.
    pub fn value(&mut self, key: impl Into<String>, expr: Expr) {
        self.fields.entry(key.into()).or_insert(Field::Value(expr));
    }

    /// Returns the nested literal at `key`, creating it if absent.
    pub fn nest(
        &mut self,
        key: impl Into<String>,
        param: Param,
        read: FieldPath,
        ensure: bool,
    ) -> Result<&mut ObjectLiteral> {
        let key = key.into();
        let field = self.fields.entry(key.clone()).or_insert_with(|| {
            Field::Object(NestedObject {
                param,
                read,
                ensure,
                literal: ObjectLiteral::new(),
            })
        });
        match field {
            Field::Object(nested) => Ok(&mut nested.literal),
            Field::Value(_) => Err(SchemaError::Synthesis(format!(
                "field `{key}` is a value, not a nested object"
            ))),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Field> {
        self.fields.get(key)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &Field)> {
        self.fields.iter().map(|(key, f)| (key.as_str(), f))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Nested literal at `path`; the root path returns `self`.
    pub fn at(&self, path: &FieldPath) -> Option<&ObjectLiteral> {
        path.segments()
            .iter()
            .try_fold(self, |literal, key| match literal.fields.get(key)? {
                Field::Object(nested) => Some(&nested.literal),
                Field::Value(_) => None,
            })
    }

    pub fn at_mut(&mut self, path: &FieldPath) -> Option<&mut ObjectLiteral> {
        path.segments()
            .iter()
            .try_fold(self, |literal, key| match literal.fields.get_mut(key)? {
                Field::Object(nested) => Some(&mut nested.literal),
                Field::Value(_) => None,
            })
    }

    fn is_fallible(&self) -> bool {
        self.fields.values().any(|field| match field {
            Field::Value(expr) => expr.is_fallible(),
            Field::Object(nested) => nested.literal.is_fallible(),
        })
    }
}

/// A computed or function body awaiting its injected dependency.
#[derive(Clone)]
pub struct HelperDef {
    /// Property the helper was generated for.
    pub path: FieldPath,
    pub body: ComputeFn,
    pub inject: Option<String>,
}

/// Code model of one operation.
#[derive(Clone)]
pub struct CodeModel {
    operation: Operation,
    root: Block,
    helpers: IndexMap<String, HelperDef>,
}

impl CodeModel {
    /// Creates the model with the slots its operation starts from.
    pub fn new(operation: Operation) -> Self {
        let root = match operation {
            Operation::Enrich => Block::new()
                .with("result", Fragment::Object(ObjectLiteral::new()))
                .with("computed", Fragment::Block(Block::new()))
                .with("methods", Fragment::Block(Block::new()))
                .with("readonly", Fragment::Block(Block::new()))
                .with(
                    "tracked",
                    Fragment::Wrapper {
                        kind: WrapperKind::WhenMode(TrackingMode::Tracked),
                        body: Block::new(),
                    },
                )
                .with(
                    "immutable",
                    Fragment::Wrapper {
                        kind: WrapperKind::WhenMode(TrackingMode::Immutable),
                        body: Block::new().with("root", Fragment::Op(Instruction::Freeze(FieldPath::root()))),
                    },
                ),
            Operation::Merge => Block::new().with(
                "merge",
                Fragment::Wrapper {
                    kind: WrapperKind::PauseTracking,
                    body: Block::new(),
                },
            ),
            Operation::Prepare
            | Operation::Strip
            | Operation::Clone
            | Operation::Deserialize
            | Operation::Serialize => Block::new().with("result", Fragment::Object(ObjectLiteral::new())),
            Operation::Compare => Block::new(),
            Operation::Hash => Block::new()
                .with("ids", Fragment::Return(Expr::Template(Vec::new())))
                .with("object", Fragment::Return(Expr::Template(Vec::new()))),
            Operation::HashType => Block::new().with("result", Fragment::Return(Expr::Any(Vec::new()))),
            Operation::IdSelector => Block::new().with("result", Fragment::Return(Expr::List(Vec::new()))),
            Operation::ChangeTracking => Block::new().with("watch", Fragment::Block(Block::new())),
            Operation::Freeze => Block::new().with(
                "freeze",
                Fragment::Block(Block::new().with("root", Fragment::Op(Instruction::Freeze(FieldPath::root())))),
            ),
        };
        Self {
            operation,
            root,
            helpers: IndexMap::new(),
        }
    }

    pub fn operation(&self) -> Operation {
        self.operation
    }

    pub fn root(&self) -> &Block {
        &self.root
    }

    pub fn root_mut(&mut self) -> &mut Block {
        &mut self.root
    }

    pub fn helpers(&self) -> &IndexMap<String, HelperDef> {
        &self.helpers
    }

    /// Finds the fragment at a dotted path of fragment names.
    pub fn resolve(&self, dotted: &str) -> Option<&Fragment> {
        let mut names = dotted.split('.');
        let first = self.root.get(names.next()?)?;
        names.try_fold(first, |fragment, name| fragment.body()?.get(name))
    }

    /// Body of the container fragment at `path`; the root path is the root block.
    pub fn block_mut(&mut self, path: &FieldPath) -> Result<&mut Block> {
        let operation = self.operation;
        let missing = || SchemaError::Synthesis(format!("{operation} model has no block at `{path}`"));
        let mut block = &mut self.root;
        for name in path.segments() {
            block = block
                .get_mut(name)
                .and_then(Fragment::body_mut)
                .ok_or_else(missing)?;
        }
        Ok(block)
    }

    /// Object literal held by `slot`, descended along `path`.
    pub fn literal(&self, slot: &str, path: &FieldPath) -> Option<&ObjectLiteral> {
        match self.root.get(slot)? {
            Fragment::Object(literal) => literal.at(path),
            _ => None,
        }
    }

    pub fn literal_mut(&mut self, slot: &str, path: &FieldPath) -> Result<&mut ObjectLiteral> {
        let operation = self.operation;
        match self.root.get_mut(slot) {
            Some(Fragment::Object(literal)) => literal.at_mut(path).ok_or_else(|| {
                SchemaError::Synthesis(format!(
                    "{operation} model has no object literal at `{slot}.{path}`"
                ))
            }),
            _ => Err(SchemaError::Synthesis(format!(
                "{operation} model has no object slot `{slot}`"
            ))),
        }
    }

    /// Expression returned by `slot`.
    pub fn returned(&self, slot: &str) -> Option<&Expr> {
        match self.root.get(slot)? {
            Fragment::Return(expr) => Some(expr),
            _ => None,
        }
    }

    pub fn returned_mut(&mut self, slot: &str) -> Result<&mut Expr> {
        let operation = self.operation;
        match self.root.get_mut(slot) {
            Some(Fragment::Return(expr)) => Ok(expr),
            _ => Err(SchemaError::Synthesis(format!(
                "{operation} model has no return slot `{slot}`"
            ))),
        }
    }

    /// Registers a helper under a name unique within this model.
    pub fn add_helper(&mut self, helper: HelperDef) -> String {
        let base = format!("compute_{}", helper.path.segments().join("_"));
        let mut name = base.clone();
        let mut n = 1;
        while self.helpers.contains_key(&name) {
            n += 1;
            name = format!("{base}_{n}");
        }
        self.helpers.insert(name.clone(), helper);
        name
    }

    /// Whether any fragment can fail at runtime.
    pub fn is_fallible(&self) -> bool {
        self.root.is_fallible()
    }

    /// Field of the literal under `slot` at `path`.
    pub fn field(&self, slot: &str, path: &FieldPath) -> Option<&Field> {
        let parent = path.parent()?;
        self.literal(slot, &parent)?.get(path.leaf()?)
    }
}
