//! Handlers for operations that act on live entities: enrich, merge,
//! change-tracking enablement and freeze.

use schemaforge_core::{FieldPath, PropertyInfo, Result, SchemaError, Value};

use super::literal::{copy_leaf, default_leaf, has_default, is_identity_leaf, is_materialized, nest_materialized};
use super::{is_computed, is_data_leaf, is_derived, is_function, is_object, Handler};
use crate::code::{slot_name, Block, CodeModel, Cond, Expr, Fragment, HelperDef, Instruction, Param};

fn op(model: &mut CodeModel, block: &str, path: &FieldPath, instruction: Instruction) -> Result<()> {
    model
        .block_mut(&FieldPath::parse(block))?
        .insert(slot_name(path), Fragment::Op(instruction));
    Ok(())
}

fn helper_for(p: &PropertyInfo, model: &mut CodeModel) -> Result<String> {
    let body = p.body().cloned().ok_or_else(|| {
        SchemaError::Synthesis(format!("property `{}` has no body", p.path()))
    })?;
    Ok(model.add_helper(HelperDef {
        path: p.path().clone(),
        body,
        inject: p.inject().map(str::to_owned),
    }))
}

/// Carries an existing value over and computes it when absent.
fn enrich_computed(p: &PropertyInfo, model: &mut CodeModel) -> Result<()> {
    copy_leaf(p, model)?;
    let helper = helper_for(p, model)?;
    let missing = Cond::Missing(Param::Entity, p.path().clone());
    let cond = if p.parent_path().is_root() {
        missing
    } else {
        Cond::All(vec![
            Cond::Present(Param::Entity, p.parent_path().clone()),
            missing,
        ])
    };
    let body = Block::new().with(
        "assign",
        Fragment::Assign {
            target: p.path().clone(),
            expr: Expr::Helper(helper),
        },
    );
    model
        .block_mut(&FieldPath::parse("computed"))?
        .insert(slot_name(p.path()), Fragment::Conditional { cond, body });
    Ok(())
}

fn enrich_function(p: &PropertyInfo, model: &mut CodeModel) -> Result<()> {
    let helper = helper_for(p, model)?;
    let name = p.path().to_string();
    op(model, "methods", p.path(), Instruction::AttachMethod { name, helper })
}

fn track(p: &PropertyInfo, model: &mut CodeModel) -> Result<()> {
    op(model, "tracked", p.path(), Instruction::Watch(p.path().clone()))?;
    if p.is_readonly() {
        op(model, "readonly", p.path(), Instruction::Protect(p.path().clone()))?;
    }
    Ok(())
}

/// Only materialized objects are watched and frozen as a whole; the root
/// freeze still covers everything below a nullable object.
fn enrich_object(p: &PropertyInfo, model: &mut CodeModel) -> Result<()> {
    nest_materialized(p, model)?;
    if !is_materialized(p) {
        return Ok(());
    }
    op(model, "tracked", p.path(), Instruction::Watch(p.path().clone()))?;
    op(model, "immutable", p.path(), Instruction::Freeze(p.path().clone()))
}

fn enrich_identity(p: &PropertyInfo, model: &mut CodeModel) -> Result<()> {
    copy_leaf(p, model)?;
    track(p, model)
}

fn enrich_default(p: &PropertyInfo, model: &mut CodeModel) -> Result<()> {
    default_leaf(p, model)?;
    track(p, model)
}

fn enrich_leaf(p: &PropertyInfo, model: &mut CodeModel) -> Result<()> {
    copy_leaf(p, model)?;
    track(p, model)
}

pub(super) fn enrich() -> Vec<Handler> {
    vec![
        Handler::new("computed", is_computed, enrich_computed),
        Handler::new("function", is_function, enrich_function),
        Handler::new("object", is_object, enrich_object),
        Handler::new("identity", is_identity_leaf, enrich_identity),
        Handler::new("default", has_default, enrich_default),
        Handler::new("leaf", is_data_leaf, enrich_leaf),
    ]
}

/// Merge fragments nest like the entity: an object's conditional body holds
/// its children, so absent source objects skip the whole subtree.
fn merge_block<'m>(p: &PropertyInfo, model: &'m mut CodeModel) -> Result<&'m mut Block> {
    model.block_mut(&FieldPath::parse("merge").join(p.parent_path()))
}

fn assign(target: &FieldPath, expr: Expr) -> Block {
    Block::new().with(
        "assign",
        Fragment::Assign {
            target: target.clone(),
            expr,
        },
    )
}

fn merge_object(p: &PropertyInfo, model: &mut CodeModel) -> Result<()> {
    let path = p.path();
    let ensure = Fragment::Conditional {
        cond: Cond::Missing(Param::Entity, path.clone()),
        body: assign(path, Expr::Literal(Value::object())),
    };
    let block = merge_block(p, model)?;
    block.insert(
        p.name(),
        Fragment::Conditional {
            cond: Cond::Present(Param::Other, path.clone()),
            body: Block::new().with("ensure", ensure),
        },
    );
    block.insert(
        format!("{}:null", p.name()),
        Fragment::Conditional {
            cond: Cond::IsNull(Param::Other, path.clone()),
            body: assign(path, Expr::Literal(Value::Null)),
        },
    );
    Ok(())
}

fn merge_leaf(p: &PropertyInfo, model: &mut CodeModel) -> Result<()> {
    let path = p.path();
    merge_block(p, model)?.insert(
        p.name(),
        Fragment::Conditional {
            cond: Cond::Exists(Param::Other, path.clone()),
            body: assign(path, Expr::Read(Param::Other, path.clone())),
        },
    );
    Ok(())
}

pub(super) fn merge() -> Vec<Handler> {
    vec![
        Handler::skip("derived", is_derived),
        Handler::new("object", is_object, merge_object),
        Handler::new("leaf", is_data_leaf, merge_leaf),
    ]
}

fn is_tracked_data(p: &PropertyInfo) -> bool {
    p.is_leaf() || p.is_object()
}

fn watch(p: &PropertyInfo, model: &mut CodeModel) -> Result<()> {
    op(model, "watch", p.path(), Instruction::Watch(p.path().clone()))
}

pub(super) fn change_tracking() -> Vec<Handler> {
    vec![Handler::new("data", is_tracked_data, watch)]
}

fn freeze_object(p: &PropertyInfo, model: &mut CodeModel) -> Result<()> {
    op(model, "freeze", p.path(), Instruction::Freeze(p.path().clone()))
}

pub(super) fn freeze() -> Vec<Handler> {
    vec![Handler::new("object", is_object, freeze_object)]
}
