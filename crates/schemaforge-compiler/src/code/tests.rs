//! Tests for the code model.

use super::*;
use schemaforge_core::Value;

fn path(dotted: &str) -> FieldPath {
    FieldPath::parse(dotted)
}

#[test]
fn test_seeded_slots() {
    let enrich = CodeModel::new(Operation::Enrich);
    let names: Vec<_> = enrich.root().iter().map(|(name, _)| name).collect();
    assert_eq!(
        names,
        ["result", "computed", "methods", "readonly", "tracked", "immutable"]
    );
    assert!(matches!(
        enrich.resolve("immutable.root"),
        Some(Fragment::Op(Instruction::Freeze(p))) if p.is_root()
    ));

    let compare = CodeModel::new(Operation::Compare);
    assert!(compare.root().is_empty());
    assert!(CodeModel::new(Operation::Hash).returned("ids").is_some());
}

#[test]
fn test_nested_literal_is_reused() {
    let mut model = CodeModel::new(Operation::Clone);
    let root = model.literal_mut("result", &FieldPath::root()).unwrap();
    root.nest("address", Param::Entity, path("address"), false)
        .unwrap()
        .value("city", Expr::read(&path("address.city")));

    let again = model.literal_mut("result", &FieldPath::root()).unwrap();
    again
        .nest("address", Param::Entity, path("address"), true)
        .unwrap()
        .value("zip", Expr::read(&path("address.zip")));

    let address = model.literal("result", &path("address")).unwrap();
    assert_eq!(address.len(), 2);
    match model.literal("result", &FieldPath::root()).unwrap().get("address") {
        Some(Field::Object(nested)) => assert!(!nested.ensure),
        _ => panic!("address should be a nested object"),
    }
}

#[test]
fn test_literal_lookup_errors() {
    let mut model = CodeModel::new(Operation::Strip);
    assert!(model.literal_mut("result", &path("missing")).is_err());
    assert!(model.literal_mut("nope", &FieldPath::root()).is_err());

    model
        .literal_mut("result", &FieldPath::root())
        .unwrap()
        .value("name", Expr::read(&path("name")));
    let root = model.literal_mut("result", &FieldPath::root()).unwrap();
    assert!(root.nest("name", Param::Entity, path("name"), false).is_err());
}

#[test]
fn test_block_resolution() {
    let mut model = CodeModel::new(Operation::Merge);
    model.block_mut(&path("merge")).unwrap().insert(
        "address",
        Fragment::Conditional {
            cond: Cond::Present(Param::Other, path("address")),
            body: Block::new(),
        },
    );
    model
        .block_mut(&path("merge.address"))
        .unwrap()
        .insert(
            "city",
            Fragment::Assign {
                target: path("address.city"),
                expr: Expr::Read(Param::Other, path("address.city")),
            },
        );

    assert!(matches!(
        model.resolve("merge.address.city"),
        Some(Fragment::Assign { .. })
    ));
    assert!(model.resolve("merge.address.zip").is_none());
    assert!(model.block_mut(&path("merge.address.city")).is_err());
}

#[test]
fn test_returned_and_and() {
    let mut model = CodeModel::new(Operation::Compare);
    model
        .root_mut()
        .insert("result", Fragment::Return(Expr::Equals(path("a"))));
    let expr = model.returned_mut("result").unwrap();
    *expr = expr.clone().and(Expr::Equals(path("b")));
    let expr = model.returned_mut("result").unwrap();
    *expr = expr.clone().and(Expr::Equals(path("c")));

    match model.returned("result") {
        Some(Expr::All(terms)) => assert_eq!(terms.len(), 3),
        other => panic!("unexpected {other:?}"),
    }
    assert!(model.returned_mut("missing").is_err());
}

#[test]
fn test_helper_names_are_unique() {
    let mut model = CodeModel::new(Operation::Enrich);
    let body: schemaforge_core::ComputeFn =
        std::sync::Arc::new(|_: &schemaforge_core::ComputeContext<'_>| Value::Null);
    let helper = HelperDef {
        path: path("address.label"),
        body,
        inject: None,
    };
    let first = model.add_helper(helper.clone());
    let second = model.add_helper(helper);
    assert_eq!(first, "compute_address_label");
    assert_eq!(second, "compute_address_label_2");
    assert_eq!(model.helpers().len(), 2);
}

#[test]
fn test_fallibility() {
    let mut model = CodeModel::new(Operation::Deserialize);
    assert!(!model.is_fallible());
    model
        .literal_mut("result", &FieldPath::root())
        .unwrap()
        .value(
            "age",
            Expr::Map {
                param: Param::Entity,
                path: path("age"),
                map: MapKind::Decode(Decoder {
                    path: path("age"),
                    ty: schemaforge_core::PrimitiveType::Integer,
                    array: false,
                    literals: None,
                }),
            },
        );
    assert!(model.is_fallible());
}

#[test]
fn test_listing() {
    let mut model = CodeModel::new(Operation::Clone);
    let root = model.literal_mut("result", &FieldPath::root()).unwrap();
    root.value("id", Expr::read(&path("id")));
    root.nest("address", Param::Entity, path("address"), false)
        .unwrap()
        .value("city", Expr::read(&path("address.city")));

    let listing = model.to_string();
    assert!(listing.starts_with("fn clone(entity) {"));
    assert!(listing.contains("id: entity.id,"));
    assert!(listing.contains("address: entity.address (if present) {"));
    assert!(listing.contains("city: entity.address.city,"));
}

#[test]
fn test_slot_name() {
    assert_eq!(slot_name(&path("address.city")), "address/city");
    assert_eq!(slot_name(&path("id")), "id");
}
