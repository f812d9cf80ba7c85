//! Handlers for operations that build an object literal from their input:
//! prepare, strip, clone, serialize and deserialize.

use schemaforge_core::{FieldPath, PrimitiveType, PropertyInfo, PropertyKind, Result, SchemaError};

use super::{is_computed, is_data_leaf, is_derived, is_function, is_object, is_unmapped, Handler};
use crate::code::{CodeModel, Decoder, Expr, MapKind, ObjectLiteral, Param};

const RESULT: &str = "result";

fn result_at<'m>(model: &'m mut CodeModel, at: &FieldPath) -> Result<&'m mut ObjectLiteral> {
    model.literal_mut(RESULT, at)
}

/// Nests the object, dropping it when absent on the input.
pub(super) fn nest_optional(p: &PropertyInfo, model: &mut CodeModel) -> Result<()> {
    result_at(model, p.parent_path())?.nest(p.name(), Param::Entity, p.path().clone(), false)?;
    Ok(())
}

/// Nests the object, always building it unless it may be null or absent.
/// Objects that are always present: neither nullable nor optional.
pub(super) fn is_materialized(p: &PropertyInfo) -> bool {
    !p.is_nullable() && !p.is_optional()
}

pub(super) fn nest_materialized(p: &PropertyInfo, model: &mut CodeModel) -> Result<()> {
    let ensure = is_materialized(p);
    result_at(model, p.parent_path())?.nest(p.name(), Param::Entity, p.path().clone(), ensure)?;
    Ok(())
}

pub(super) fn copy_leaf(p: &PropertyInfo, model: &mut CodeModel) -> Result<()> {
    result_at(model, p.parent_path())?.value(p.name(), Expr::read(p.path()));
    Ok(())
}

pub(super) fn has_default(p: &PropertyInfo) -> bool {
    p.is_leaf() && p.default_provider().is_some()
}

pub(super) fn is_identity_leaf(p: &PropertyInfo) -> bool {
    p.is_leaf() && p.is_identity()
}

/// Reads the leaf, falling back to its default provider when absent.
pub(super) fn default_leaf(p: &PropertyInfo, model: &mut CodeModel) -> Result<()> {
    let expr = match p.default_provider() {
        Some(provider) => Expr::OrElse(
            Box::new(Expr::read(p.path())),
            Box::new(Expr::Default(provider.clone())),
        ),
        None => Expr::read(p.path()),
    };
    result_at(model, p.parent_path())?.value(p.name(), expr);
    Ok(())
}

pub(super) fn prepare() -> Vec<Handler> {
    vec![
        Handler::skip("unmapped", is_unmapped),
        Handler::skip("derived", is_derived),
        Handler::new("object", is_object, nest_materialized),
        Handler::new("identity", is_identity_leaf, copy_leaf),
        Handler::new("default", has_default, default_leaf),
        Handler::new("leaf", is_data_leaf, copy_leaf),
    ]
}

pub(super) fn strip() -> Vec<Handler> {
    vec![
        Handler::skip("unmapped", is_unmapped),
        Handler::skip("derived", is_derived),
        Handler::new("object", is_object, nest_optional),
        Handler::new("leaf", is_data_leaf, copy_leaf),
    ]
}

pub(super) fn clone() -> Vec<Handler> {
    vec![
        Handler::skip("function", is_function),
        Handler::new("computed", is_computed, copy_leaf),
        Handler::new("object", is_object, nest_optional),
        Handler::new("leaf", is_data_leaf, copy_leaf),
    ]
}

/// Serialized records are keyed by source names, so lookups follow the
/// parent's source path.
fn serialized_parent(p: &PropertyInfo) -> FieldPath {
    p.parent()
        .map(|parent| parent.source_path().clone())
        .unwrap_or_default()
}

fn serialize_object(p: &PropertyInfo, model: &mut CodeModel) -> Result<()> {
    result_at(model, &serialized_parent(p))?.nest(
        p.source_name(),
        Param::Entity,
        p.path().clone(),
        false,
    )?;
    Ok(())
}

fn has_serializer(p: &PropertyInfo) -> bool {
    p.is_leaf() && p.serializer().is_some()
}

fn serialize_custom(p: &PropertyInfo, model: &mut CodeModel) -> Result<()> {
    let expr = match p.serializer() {
        Some(map) => Expr::Map {
            param: Param::Entity,
            path: p.path().clone(),
            map: MapKind::Custom(map.clone()),
        },
        None => Expr::read(p.path()),
    };
    result_at(model, &serialized_parent(p))?.value(p.source_name(), expr);
    Ok(())
}

fn holds_dates(p: &PropertyInfo) -> bool {
    matches!(
        p.kind(),
        PropertyKind::Primitive(PrimitiveType::Date)
            | PropertyKind::Array(PrimitiveType::Date)
    )
}

fn serialize_date(p: &PropertyInfo, model: &mut CodeModel) -> Result<()> {
    let expr = Expr::Map {
        param: Param::Entity,
        path: p.path().clone(),
        map: MapKind::EncodeDate,
    };
    result_at(model, &serialized_parent(p))?.value(p.source_name(), expr);
    Ok(())
}

fn serialize_leaf(p: &PropertyInfo, model: &mut CodeModel) -> Result<()> {
    result_at(model, &serialized_parent(p))?.value(p.source_name(), Expr::read(p.path()));
    Ok(())
}

pub(super) fn serialize() -> Vec<Handler> {
    vec![
        Handler::skip("unmapped", is_unmapped),
        Handler::skip("derived", is_derived),
        Handler::new("object", is_object, serialize_object),
        Handler::new("custom", has_serializer, serialize_custom),
        Handler::new("date", holds_dates, serialize_date),
        Handler::new("leaf", is_data_leaf, serialize_leaf),
    ]
}

fn deserialize_object(p: &PropertyInfo, model: &mut CodeModel) -> Result<()> {
    result_at(model, p.parent_path())?.nest(
        p.name(),
        Param::Entity,
        p.source_path().clone(),
        false,
    )?;
    Ok(())
}

fn has_deserializer(p: &PropertyInfo) -> bool {
    p.is_leaf() && p.deserializer().is_some()
}

fn deserialize_custom(p: &PropertyInfo, model: &mut CodeModel) -> Result<()> {
    let expr = match p.deserializer() {
        Some(map) => Expr::Map {
            param: Param::Entity,
            path: p.source_path().clone(),
            map: MapKind::Custom(map.clone()),
        },
        None => Expr::Read(Param::Entity, p.source_path().clone()),
    };
    result_at(model, p.parent_path())?.value(p.name(), expr);
    Ok(())
}

fn deserialize_leaf(p: &PropertyInfo, model: &mut CodeModel) -> Result<()> {
    let (ty, array) = match p.kind() {
        PropertyKind::Primitive(ty) => (*ty, false),
        PropertyKind::Array(ty) => (*ty, true),
        other => {
            return Err(SchemaError::Synthesis(format!(
                "cannot decode {} property `{}`",
                other.name(),
                p.path()
            )))
        }
    };
    let expr = Expr::Map {
        param: Param::Entity,
        path: p.source_path().clone(),
        map: MapKind::Decode(Decoder {
            path: p.path().clone(),
            ty,
            array,
            literals: p.literals().map(Into::into),
        }),
    };
    result_at(model, p.parent_path())?.value(p.name(), expr);
    Ok(())
}

pub(super) fn deserialize() -> Vec<Handler> {
    vec![
        Handler::skip("unmapped", is_unmapped),
        Handler::skip("derived", is_derived),
        Handler::new("object", is_object, deserialize_object),
        Handler::new("custom", has_deserializer, deserialize_custom),
        Handler::new("leaf", is_data_leaf, deserialize_leaf),
    ]
}
