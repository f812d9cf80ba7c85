//! Closure synthesis.
//!
//! A [`Linker`] folds code-model fragments into boxed closures. Expressions
//! evaluate against a [`Frame`] of the operation's parameters, statements run
//! against a live [`Entity`], and instructions apply entity side effects.
//! Helpers are bound to their injected dependency before linking, so a
//! linker only ever sees finished [`BoundMethod`]s.

mod decode;
mod ops;

#[cfg(test)]
mod tests;

pub(crate) use ops::{synthesize, Operations};

use std::sync::Arc;

use indexmap::IndexMap;
use schemaforge_config::{CompilerConfig, DateEncoding};
use schemaforge_core::{
    BoundMethod, ComputeContext, Entity, FieldPath, Object, Result, SchemaError, TrackingMode, Value,
};

use crate::code::{
    Block, CodeModel, Cond, Expr, Field, Fragment, Instruction, MapKind, ObjectLiteral, Param,
    TemplatePart, WrapperKind,
};
use decode::{date_segment, decode, encode_date};

/// Parameters an expression is evaluated against.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Frame<'a> {
    pub entity: &'a Value,
    pub other: Option<&'a Value>,
}

impl<'a> Frame<'a> {
    pub fn new(entity: &'a Value) -> Self {
        Self { entity, other: None }
    }

    pub fn pair(entity: &'a Value, other: &'a Value) -> Self {
        Self {
            entity,
            other: Some(other),
        }
    }

    fn param(&self, param: Param) -> Option<&'a Value> {
        match param {
            Param::Entity => Some(self.entity),
            Param::Other => self.other,
        }
    }

    fn read(&self, param: Param, path: &FieldPath) -> Option<&'a Value> {
        self.param(param)?.get_path(path)
    }
}

/// Scope statements run in.
#[derive(Debug, Clone, Copy)]
pub(crate) struct StmtEnv<'a> {
    pub other: Option<&'a Value>,
    pub mode: TrackingMode,
}

/// Evaluates to a value, or `None` when absent.
pub(crate) type ExprFn = Box<dyn Fn(&Frame<'_>) -> Result<Option<Value>> + Send + Sync>;

pub(crate) type CondFn = Box<dyn Fn(&Frame<'_>) -> bool + Send + Sync>;

/// Builds an object from a frame.
pub(crate) type ObjectFn = Box<dyn Fn(&Frame<'_>) -> Result<Value> + Send + Sync>;

pub(crate) type StmtFn = Box<dyn Fn(&mut Entity, &StmtEnv<'_>) -> Result<()> + Send + Sync>;

pub(crate) type InstrFn = Box<dyn Fn(&mut Entity) + Send + Sync>;

/// Creates an operation once its bindings are known.
pub(crate) type Factory<F> = Box<dyn FnOnce(&Bindings) -> Result<F> + Send>;

/// Values the enrich and merge factories are invoked with.
#[derive(Debug, Clone, Default)]
pub struct Bindings {
    pub collection: String,
    pub injections: IndexMap<String, Value>,
}

/// Binds every helper of `model` to its injected dependency.
pub(crate) fn bind_helpers(model: &CodeModel, bindings: &Bindings) -> Result<IndexMap<String, BoundMethod>> {
    let collection: Arc<str> = Arc::from(bindings.collection.as_str());
    let mut bound = IndexMap::with_capacity(model.helpers().len());
    for (name, helper) in model.helpers() {
        let injected = match &helper.inject {
            Some(dependency) => Some(bindings.injections.get(dependency).cloned().ok_or_else(|| {
                SchemaError::MissingInjection {
                    path: helper.path.to_string(),
                    name: dependency.clone(),
                }
            })?),
            None => None,
        };
        let body = helper.body.clone();
        let collection = collection.clone();
        let method: BoundMethod = Arc::new(move |entity: &Value| {
            body(&ComputeContext {
                entity,
                injected: injected.as_ref(),
                collection: &collection,
            })
        });
        bound.insert(name.clone(), method);
    }
    Ok(bound)
}

enum FieldFn {
    Value(ExprFn),
    Object {
        param: Param,
        read: FieldPath,
        ensure: bool,
        build: ObjectFn,
    },
}

/// Turns fragments into closures.
pub(crate) struct Linker {
    separator: Arc<str>,
    date_encoding: DateEncoding,
    helpers: IndexMap<String, BoundMethod>,
}

impl Linker {
    pub fn new(config: &CompilerConfig) -> Self {
        Self {
            separator: Arc::from(config.hash_separator.as_str()),
            date_encoding: config.date_encoding,
            helpers: IndexMap::new(),
        }
    }

    pub fn with_helpers(mut self, helpers: IndexMap<String, BoundMethod>) -> Self {
        self.helpers = helpers;
        self
    }

    fn helper(&self, name: &str) -> Result<BoundMethod> {
        self.helpers
            .get(name)
            .cloned()
            .ok_or_else(|| SchemaError::Synthesis(format!("helper `{name}` is not bound")))
    }

    pub fn compile_expr(&self, expr: &Expr) -> Result<ExprFn> {
        let compiled: ExprFn = match expr {
            Expr::Read(param, path) => {
                let (param, path) = (*param, path.clone());
                Box::new(move |frame: &Frame<'_>| Ok(frame.read(param, &path).cloned()))
            }
            Expr::OrElse(first, second) => {
                let first = self.compile_expr(first)?;
                let second = self.compile_expr(second)?;
                Box::new(move |frame: &Frame<'_>| match first(frame)? {
                    Some(value) => Ok(Some(value)),
                    None => second(frame),
                })
            }
            Expr::Default(provider) => {
                let provider = provider.clone();
                Box::new(move |_: &Frame<'_>| Ok(Some(provider())))
            }
            Expr::Helper(name) => {
                let method = self.helper(name)?;
                Box::new(move |frame: &Frame<'_>| Ok(Some(method(frame.entity))))
            }
            Expr::Literal(value) => {
                let value = value.clone();
                Box::new(move |_: &Frame<'_>| Ok(Some(value.clone())))
            }
            Expr::Map { param, path, map } => self.compile_map(*param, path.clone(), map),
            Expr::Template(parts) => self.compile_template(parts),
            Expr::Equals(path) => {
                let path = path.clone();
                Box::new(move |frame: &Frame<'_>| {
                    let a = frame.read(Param::Entity, &path);
                    let b = frame.read(Param::Other, &path);
                    Ok(Some(Value::Bool(a == b)))
                })
            }
            Expr::All(terms) => {
                let terms = self.compile_exprs(terms)?;
                Box::new(move |frame: &Frame<'_>| {
                    for term in &terms {
                        if !is_true(term(frame)?) {
                            return Ok(Some(Value::Bool(false)));
                        }
                    }
                    Ok(Some(Value::Bool(true)))
                })
            }
            Expr::Any(terms) => {
                let terms = self.compile_exprs(terms)?;
                Box::new(move |frame: &Frame<'_>| {
                    for term in &terms {
                        if is_true(term(frame)?) {
                            return Ok(Some(Value::Bool(true)));
                        }
                    }
                    Ok(Some(Value::Bool(false)))
                })
            }
            Expr::Test(cond) => {
                let cond = compile_cond(cond);
                Box::new(move |frame: &Frame<'_>| Ok(Some(Value::Bool(cond(frame)))))
            }
            Expr::List(items) => {
                let items = self.compile_exprs(items)?;
                Box::new(move |frame: &Frame<'_>| {
                    let values = items
                        .iter()
                        .map(|item| Ok(item(frame)?.unwrap_or(Value::Null)))
                        .collect::<Result<Vec<_>>>()?;
                    Ok(Some(Value::List(values)))
                })
            }
        };
        Ok(compiled)
    }

    fn compile_exprs(&self, exprs: &[Expr]) -> Result<Vec<ExprFn>> {
        exprs.iter().map(|expr| self.compile_expr(expr)).collect()
    }

    fn compile_map(&self, param: Param, path: FieldPath, map: &MapKind) -> ExprFn {
        match map {
            MapKind::Custom(transform) => {
                let transform = transform.clone();
                Box::new(move |frame: &Frame<'_>| {
                    Ok(frame.read(param, &path).map(|value| match value {
                        Value::Null => Value::Null,
                        other => transform(other),
                    }))
                })
            }
            MapKind::Decode(decoder) => {
                let decoder = decoder.clone();
                Box::new(move |frame: &Frame<'_>| {
                    frame
                        .read(param, &path)
                        .map(|value| decode(&decoder, value))
                        .transpose()
                })
            }
            MapKind::EncodeDate => {
                let encoding = self.date_encoding;
                Box::new(move |frame: &Frame<'_>| {
                    Ok(frame.read(param, &path).map(|value| encode_date(encoding, value)))
                })
            }
        }
    }

    fn compile_template(&self, parts: &[TemplatePart]) -> ExprFn {
        let parts = parts.to_vec();
        let separator = self.separator.clone();
        Box::new(move |frame: &Frame<'_>| {
            let segments: Vec<String> = parts
                .iter()
                .map(|part| match part {
                    TemplatePart::Value(path) => frame
                        .read(Param::Entity, path)
                        .map(Value::hash_segment)
                        .unwrap_or_default(),
                    TemplatePart::Key(path) => frame
                        .read(Param::Entity, path)
                        .map(Value::key_segment)
                        .unwrap_or_default(),
                    TemplatePart::Date(path) => frame
                        .read(Param::Entity, path)
                        .map(date_segment)
                        .unwrap_or_default(),
                })
                .collect();
            Ok(Some(Value::String(segments.join(&*separator))))
        })
    }

    /// Compiles a structural literal into an object builder.
    ///
    /// Absent values drop their field. Nested objects follow
    /// [`crate::code::NestedObject`] presence rules.
    pub fn compile_object(&self, literal: &ObjectLiteral) -> Result<ObjectFn> {
        let mut fields = Vec::with_capacity(literal.len());
        for (key, field) in literal.fields() {
            let compiled = match field {
                Field::Value(expr) => FieldFn::Value(self.compile_expr(expr)?),
                Field::Object(nested) => FieldFn::Object {
                    param: nested.param,
                    read: nested.read.clone(),
                    ensure: nested.ensure,
                    build: self.compile_object(&nested.literal)?,
                },
            };
            fields.push((key.to_owned(), compiled));
        }

        Ok(Box::new(move |frame: &Frame<'_>| {
            let mut object = Object::with_capacity(fields.len());
            for (key, field) in &fields {
                match field {
                    FieldFn::Value(expr) => {
                        if let Some(value) = expr(frame)? {
                            object.insert(key.clone(), value);
                        }
                    }
                    FieldFn::Object {
                        param,
                        read,
                        ensure,
                        build,
                    } => match frame.read(*param, read) {
                        None if !ensure => {}
                        Some(Value::Null) if !ensure => {
                            object.insert(key.clone(), Value::Null);
                        }
                        _ => {
                            object.insert(key.clone(), build(frame)?);
                        }
                    },
                }
            }
            Ok(Value::Object(object))
        }))
    }

    /// Compiles every fragment of `block` into one statement, in order.
    pub fn compile_block(&self, block: &Block) -> Result<StmtFn> {
        self.compile_statements(block.iter())
    }

    pub fn compile_statements<'b>(
        &self,
        fragments: impl IntoIterator<Item = (&'b str, &'b Fragment)>,
    ) -> Result<StmtFn> {
        let statements = fragments
            .into_iter()
            .map(|(_, fragment)| self.compile_statement(fragment))
            .collect::<Result<Vec<_>>>()?;
        Ok(Box::new(move |entity: &mut Entity, env: &StmtEnv<'_>| {
            for statement in &statements {
                statement(entity, env)?;
            }
            Ok(())
        }))
    }

    fn compile_statement(&self, fragment: &Fragment) -> Result<StmtFn> {
        let compiled: StmtFn = match fragment {
            Fragment::Block(body) => self.compile_block(body)?,
            Fragment::Conditional { cond, body } => {
                let cond = compile_cond(cond);
                let body = self.compile_block(body)?;
                Box::new(move |entity: &mut Entity, env: &StmtEnv<'_>| {
                    let holds = cond(&Frame {
                        entity: entity.value(),
                        other: env.other,
                    });
                    if holds {
                        body(entity, env)?;
                    }
                    Ok(())
                })
            }
            Fragment::Assign { target, expr } => {
                let target = target.clone();
                let expr = self.compile_expr(expr)?;
                Box::new(move |entity: &mut Entity, env: &StmtEnv<'_>| {
                    let value = expr(&Frame {
                        entity: entity.value(),
                        other: env.other,
                    })?;
                    match value {
                        Some(value) => entity.assign(&target, value),
                        None => Ok(()),
                    }
                })
            }
            Fragment::Wrapper {
                kind: WrapperKind::PauseTracking,
                body,
            } => {
                let body = self.compile_block(body)?;
                Box::new(move |entity: &mut Entity, env: &StmtEnv<'_>| {
                    entity.pause_tracking();
                    let outcome = body(entity, env);
                    entity.resume_tracking();
                    outcome
                })
            }
            Fragment::Wrapper {
                kind: WrapperKind::WhenMode(mode),
                body,
            } => {
                let mode = *mode;
                let body = self.compile_block(body)?;
                Box::new(move |entity: &mut Entity, env: &StmtEnv<'_>| {
                    if env.mode == mode {
                        body(entity, env)?;
                    }
                    Ok(())
                })
            }
            Fragment::Op(instruction) => {
                let apply = self.compile_instruction(instruction)?;
                Box::new(move |entity: &mut Entity, _: &StmtEnv<'_>| {
                    apply(entity);
                    Ok(())
                })
            }
            Fragment::Object(_) | Fragment::Return(_) => {
                return Err(SchemaError::Synthesis(format!(
                    "{} fragment cannot run as a statement",
                    fragment.kind_name()
                )))
            }
        };
        Ok(compiled)
    }

    pub fn compile_instruction(&self, instruction: &Instruction) -> Result<InstrFn> {
        let compiled: InstrFn = match instruction.clone() {
            Instruction::Watch(path) => {
                Box::new(move |entity: &mut Entity| entity.enable_tracking([path.clone()]))
            }
            Instruction::Freeze(path) => Box::new(move |entity: &mut Entity| entity.freeze_path(path.clone())),
            Instruction::Protect(path) => Box::new(move |entity: &mut Entity| entity.protect(path.clone())),
            Instruction::AttachMethod { name, helper } => {
                let method = self.helper(&helper)?;
                Box::new(move |entity: &mut Entity| entity.attach_method(name.clone(), method.clone()))
            }
        };
        Ok(compiled)
    }

    /// Compiles a block made only of instructions and nested blocks.
    pub fn compile_instructions(&self, block: &Block) -> Result<InstrFn> {
        let mut all = Vec::with_capacity(block.len());
        for (name, fragment) in block.iter() {
            match fragment {
                Fragment::Op(instruction) => all.push(self.compile_instruction(instruction)?),
                Fragment::Block(body) => all.push(self.compile_instructions(body)?),
                other => {
                    return Err(SchemaError::Synthesis(format!(
                        "`{name}` is a {} fragment, expected an instruction",
                        other.kind_name()
                    )))
                }
            }
        }
        Ok(Box::new(move |entity: &mut Entity| {
            for apply in &all {
                apply(entity);
            }
        }))
    }
}

fn is_true(value: Option<Value>) -> bool {
    matches!(value, Some(Value::Bool(true)))
}

/// Compiles a condition. An absent parameter counts as an absent value.
pub(crate) fn compile_cond(cond: &Cond) -> CondFn {
    match cond.clone() {
        Cond::Exists(param, path) => Box::new(move |frame: &Frame<'_>| frame.read(param, &path).is_some()),
        Cond::Present(param, path) => Box::new(move |frame: &Frame<'_>| {
            frame.read(param, &path).is_some_and(|value| !value.is_null())
        }),
        Cond::Missing(param, path) => Box::new(move |frame: &Frame<'_>| {
            frame.read(param, &path).map_or(true, Value::is_null)
        }),
        Cond::IsNull(param, path) => {
            Box::new(move |frame: &Frame<'_>| matches!(frame.read(param, &path), Some(Value::Null)))
        }
        Cond::All(conds) => {
            let conds: Vec<CondFn> = conds.iter().map(compile_cond).collect();
            Box::new(move |frame: &Frame<'_>| conds.iter().all(|cond| cond(frame)))
        }
    }
}
