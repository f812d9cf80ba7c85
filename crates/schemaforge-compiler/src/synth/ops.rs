//! Assembly of the thirteen operations from their code models.

use indexmap::IndexMap;
use schemaforge_config::CompilerConfig;
use schemaforge_core::{Entity, Result, SchemaError, TrackingMode, Value};
use tracing::debug;

use super::{bind_helpers, Bindings, ExprFn, Factory, Frame, InstrFn, Linker, ObjectFn, StmtEnv};
use crate::code::{CodeModel, Fragment, Operation};
use crate::compiled::HashType;

pub(crate) type ValueFn = Box<dyn Fn(&Value) -> Value + Send + Sync>;
pub(crate) type DeserializeFn = Box<dyn Fn(&Value) -> Result<Value> + Send + Sync>;
pub(crate) type CompareFn = Box<dyn Fn(&Value, &Value) -> bool + Send + Sync>;
pub(crate) type HashFn = Box<dyn Fn(&Value) -> String + Send + Sync>;
pub(crate) type HashTypeFn = Box<dyn Fn(&Value) -> HashType + Send + Sync>;
pub(crate) type IdsFn = Box<dyn Fn(&Value) -> Vec<Value> + Send + Sync>;
pub(crate) type EnrichFn = Box<dyn Fn(&Value, TrackingMode) -> Result<Entity> + Send + Sync>;
pub(crate) type MergeFn = Box<dyn Fn(&mut Entity, &Value) -> Result<()> + Send + Sync>;

/// The synthesized callables of one compiled schema.
pub(crate) struct Operations {
    pub enrich: EnrichFn,
    pub merge: MergeFn,
    pub prepare: ValueFn,
    pub strip: ValueFn,
    pub clone: ValueFn,
    pub compare: CompareFn,
    pub deserialize: DeserializeFn,
    pub serialize: ValueFn,
    pub hash_ids: HashFn,
    pub hash_object: HashFn,
    pub hash_type: HashTypeFn,
    pub id_selector: IdsFn,
    pub change_tracking: InstrFn,
    pub freeze: InstrFn,
}

/// Links every code model into its operation.
///
/// Enrich and merge are produced by factories invoked once with `bindings`;
/// the rest link without helpers.
pub(crate) fn synthesize(
    models: &IndexMap<Operation, CodeModel>,
    config: &CompilerConfig,
    bindings: &Bindings,
) -> Result<Operations> {
    let linker = Linker::new(config);
    let model = move |operation: Operation| {
        debug!(event = "synthesize", operation = operation.name());
        models.get(&operation).ok_or_else(|| {
            SchemaError::Synthesis(format!("no code model for operation `{operation}`"))
        })
    };

    let enrich = enrich_factory(model(Operation::Enrich)?.clone(), config.clone())(bindings)?;
    let merge = merge_factory(model(Operation::Merge)?.clone(), config.clone())(bindings)?;
    let (hash_ids, hash_object) = hash(&linker, model(Operation::Hash)?)?;

    Ok(Operations {
        enrich,
        merge,
        prepare: infallible_literal(&linker, model(Operation::Prepare)?)?,
        strip: infallible_literal(&linker, model(Operation::Strip)?)?,
        clone: infallible_literal(&linker, model(Operation::Clone)?)?,
        compare: compare(&linker, model(Operation::Compare)?)?,
        deserialize: deserialize(&linker, model(Operation::Deserialize)?)?,
        serialize: infallible_literal(&linker, model(Operation::Serialize)?)?,
        hash_ids,
        hash_object,
        hash_type: hash_type(&linker, model(Operation::HashType)?)?,
        id_selector: id_selector(&linker, model(Operation::IdSelector)?)?,
        change_tracking: linker.compile_instructions(model(Operation::ChangeTracking)?.root())?,
        freeze: linker.compile_instructions(model(Operation::Freeze)?.root())?,
    })
}

fn result_literal(linker: &Linker, model: &CodeModel) -> Result<ObjectFn> {
    match model.root().get("result") {
        Some(Fragment::Object(literal)) => linker.compile_object(literal),
        _ => Err(SchemaError::Synthesis(format!(
            "{} model has no result literal",
            model.operation()
        ))),
    }
}

fn returned(linker: &Linker, model: &CodeModel, slot: &str) -> Result<Option<ExprFn>> {
    model.returned(slot).map(|expr| linker.compile_expr(expr)).transpose()
}

/// Operations that cannot fail at runtime. An empty object stands in for
/// the impossible error case.
fn infallible_literal(linker: &Linker, model: &CodeModel) -> Result<ValueFn> {
    if model.is_fallible() {
        return Err(SchemaError::Synthesis(format!(
            "{} model contains fallible fragments",
            model.operation()
        )));
    }
    let build = result_literal(linker, model)?;
    Ok(Box::new(move |entity: &Value| {
        build(&Frame::new(entity)).unwrap_or_else(|_| Value::object())
    }))
}

fn deserialize(linker: &Linker, model: &CodeModel) -> Result<DeserializeFn> {
    let build = result_literal(linker, model)?;
    Ok(Box::new(move |raw: &Value| build(&Frame::new(raw))))
}

fn compare(linker: &Linker, model: &CodeModel) -> Result<CompareFn> {
    let Some(equal) = returned(linker, model, "result")? else {
        return Ok(Box::new(|_: &Value, _: &Value| true));
    };
    Ok(Box::new(move |a: &Value, b: &Value| {
        matches!(equal(&Frame::pair(a, b)), Ok(Some(Value::Bool(true))))
    }))
}

fn template(linker: &Linker, model: &CodeModel, slot: &str) -> Result<HashFn> {
    let render = returned(linker, model, slot)?.ok_or_else(|| {
        SchemaError::Synthesis(format!("hash model has no `{slot}` template"))
    })?;
    Ok(Box::new(move |entity: &Value| match render(&Frame::new(entity)) {
        Ok(Some(Value::String(hash))) => hash,
        _ => String::new(),
    }))
}

fn hash(linker: &Linker, model: &CodeModel) -> Result<(HashFn, HashFn)> {
    Ok((template(linker, model, "ids")?, template(linker, model, "object")?))
}

fn hash_type(linker: &Linker, model: &CodeModel) -> Result<HashTypeFn> {
    let Some(needs_object) = returned(linker, model, "result")? else {
        return Ok(Box::new(|_: &Value| HashType::Ids));
    };
    Ok(Box::new(move |entity: &Value| {
        match needs_object(&Frame::new(entity)) {
            Ok(Some(Value::Bool(true))) => HashType::Object,
            _ => HashType::Ids,
        }
    }))
}

fn id_selector(linker: &Linker, model: &CodeModel) -> Result<IdsFn> {
    let Some(select) = returned(linker, model, "result")? else {
        return Ok(Box::new(|_: &Value| Vec::new()));
    };
    Ok(Box::new(move |entity: &Value| match select(&Frame::new(entity)) {
        Ok(Some(Value::List(ids))) => ids,
        _ => Vec::new(),
    }))
}

/// Builds the enriched literal, wraps it and runs computed, method,
/// readonly and mode fragments against the live entity.
pub(crate) fn enrich_factory(model: CodeModel, config: CompilerConfig) -> Factory<EnrichFn> {
    Box::new(move |bindings: &Bindings| {
        let linker = Linker::new(&config).with_helpers(bind_helpers(&model, bindings)?);
        let build = result_literal(&linker, &model)?;
        let finish = linker.compile_statements(model.root().iter().filter(|(name, _)| *name != "result"))?;
        let enrich: EnrichFn = Box::new(move |input: &Value, mode: TrackingMode| {
            let mut entity = Entity::new(build(&Frame::new(input))?);
            finish(&mut entity, &StmtEnv { other: None, mode })?;
            Ok(entity)
        });
        Ok(enrich)
    })
}

/// Pours `source` into the destination with tracking paused.
pub(crate) fn merge_factory(model: CodeModel, config: CompilerConfig) -> Factory<MergeFn> {
    Box::new(move |bindings: &Bindings| {
        let linker = Linker::new(&config).with_helpers(bind_helpers(&model, bindings)?);
        let apply = linker.compile_block(model.root())?;
        let merge: MergeFn = Box::new(move |destination: &mut Entity, source: &Value| {
            let env = StmtEnv {
                other: Some(source),
                mode: TrackingMode::Off,
            };
            apply(destination, &env)
        });
        Ok(merge)
    })
}
