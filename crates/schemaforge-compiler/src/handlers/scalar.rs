//! Handlers for operations that reduce an entity to one value: compare,
//! hash, hash type and id selection.

use schemaforge_core::{PropertyInfo, Result, SchemaError};

use super::{is_data_leaf, is_key_leaf, Handler};
use crate::code::{CodeModel, Cond, Expr, Fragment, Param, TemplatePart};

fn compare_leaf(p: &PropertyInfo, model: &mut CodeModel) -> Result<()> {
    let equals = Expr::Equals(p.path().clone());
    if model.returned("result").is_none() {
        model.root_mut().insert("result", Fragment::Return(equals));
        return Ok(());
    }
    let expr = model.returned_mut("result")?;
    *expr = std::mem::replace(expr, Expr::All(Vec::new())).and(equals);
    Ok(())
}

pub(super) fn compare() -> Vec<Handler> {
    vec![Handler::new("leaf", is_data_leaf, compare_leaf)]
}

fn push_part(model: &mut CodeModel, slot: &str, part: TemplatePart) -> Result<()> {
    match model.returned_mut(slot)? {
        Expr::Template(parts) => {
            parts.push(part);
            Ok(())
        }
        _ => Err(SchemaError::Synthesis(format!(
            "hash slot `{slot}` does not hold a template"
        ))),
    }
}

fn object_part(p: &PropertyInfo) -> TemplatePart {
    if p.is_date() {
        TemplatePart::Date(p.path().clone())
    } else {
        TemplatePart::Value(p.path().clone())
    }
}

fn hash_key_leaf(p: &PropertyInfo, model: &mut CodeModel) -> Result<()> {
    push_part(model, "ids", TemplatePart::Key(p.path().clone()))?;
    push_part(model, "object", object_part(p))
}

fn hash_leaf(p: &PropertyInfo, model: &mut CodeModel) -> Result<()> {
    push_part(model, "object", object_part(p))
}

pub(super) fn hash() -> Vec<Handler> {
    vec![
        Handler::new("key", is_key_leaf, hash_key_leaf),
        Handler::new("leaf", is_data_leaf, hash_leaf),
    ]
}

fn is_identity_key(p: &PropertyInfo) -> bool {
    is_key_leaf(p) && p.is_identity()
}

fn hash_type_identity(p: &PropertyInfo, model: &mut CodeModel) -> Result<()> {
    match model.returned_mut("result")? {
        Expr::Any(terms) => {
            terms.push(Expr::Test(Cond::Missing(Param::Entity, p.path().clone())));
            Ok(())
        }
        _ => Err(SchemaError::Synthesis("hash type slot is not a disjunction".into())),
    }
}

pub(super) fn hash_type() -> Vec<Handler> {
    vec![Handler::new("identity_key", is_identity_key, hash_type_identity)]
}

fn select_key(p: &PropertyInfo, model: &mut CodeModel) -> Result<()> {
    match model.returned_mut("result")? {
        Expr::List(items) => {
            items.push(Expr::read(p.path()));
            Ok(())
        }
        _ => Err(SchemaError::Synthesis("id selector slot is not a list".into())),
    }
}

pub(super) fn id_selector() -> Vec<Handler> {
    vec![Handler::new("key", is_key_leaf, select_key)]
}
