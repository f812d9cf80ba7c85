//! Tests for property metadata.

use super::*;
use crate::schema::s;

fn object_with_child(
    parent_node: &SchemaNode,
    child_name: &str,
    child_node: &SchemaNode,
) -> (Arc<PropertyInfo>, Arc<PropertyInfo>) {
    let parent = Arc::new(PropertyInfo::from_node("address", parent_node, None).unwrap());
    let child = Arc::new(PropertyInfo::from_node(child_name, child_node, Some(&parent)).unwrap());
    parent.attach_children(vec![child.clone()]).unwrap();
    (parent, child)
}

#[test]
fn test_root_property_paths() {
    let info = PropertyInfo::from_node("id", &s::string().key(), None).unwrap();
    assert_eq!(info.path().to_string(), "id");
    assert!(info.parent_path().is_root());
    assert_eq!(info.depth(), 0);
    assert!(info.parent().is_none());
    assert!(info.is_leaf());
}

#[test]
fn test_nested_property_paths() {
    let (parent, child) = object_with_child(
        &s::object([("city", s::string())]).nullable(),
        "city",
        &s::string().source("town"),
    );
    assert_eq!(child.path().to_string(), "address.city");
    assert_eq!(child.source_path().to_string(), "address.town");
    assert_eq!(child.parent_path().to_string(), "address");
    assert_eq!(child.depth(), 1);
    assert!(child.has_nullable_ancestor());
    assert!(!parent.has_nullable_ancestor());
    assert_eq!(parent.children().len(), 1);
}

#[test]
fn test_identity_descendant() {
    let (parent, _) = object_with_child(
        &s::object([("ref", s::string())]),
        "ref",
        &s::string().identity(),
    );
    assert!(parent.has_identity_descendant());
}

#[test]
fn test_children_attach_once() {
    let (parent, child) = object_with_child(&s::object([("a", s::string())]), "a", &s::string());
    let err = parent.attach_children(vec![child]).unwrap_err();
    assert!(matches!(err, SchemaError::Synthesis(_)));
}

#[test]
fn test_identity_implies_readonly() {
    let info = PropertyInfo::from_node("id", &s::string().identity(), None).unwrap();
    assert!(info.is_readonly());
    assert!(!info.is_key());
}

#[test]
fn test_invalid_field_names() {
    for name in ["", "a.b"] {
        let err = PropertyInfo::from_node(name, &s::string(), None).unwrap_err();
        assert_eq!(
            err,
            SchemaError::InvalidFieldName {
                name: name.to_string()
            }
        );
    }
}

#[test]
fn test_key_on_object_rejected() {
    let err = PropertyInfo::from_node("address", &s::object([("a", s::string())]).key(), None)
        .unwrap_err();
    assert!(matches!(
        err,
        SchemaError::InvalidModifier { modifier: "key", .. }
    ));
}

#[test]
fn test_inject_on_leaf_rejected() {
    let err = PropertyInfo::from_node("name", &s::string().inject("clock"), None).unwrap_err();
    assert!(matches!(
        err,
        SchemaError::InvalidModifier { modifier: "inject", .. }
    ));
}

#[test]
fn test_kinds() {
    let literal = PropertyInfo::from_node("state", &s::literal(["a", "b"]), None).unwrap();
    assert!(matches!(literal.kind(), PropertyKind::Primitive(PrimitiveType::Literal)));
    assert_eq!(literal.literals().unwrap().len(), 2);

    let tags = PropertyInfo::from_node("tags", &s::array(s::string()), None).unwrap();
    assert!(matches!(tags.kind(), PropertyKind::Array(PrimitiveType::String)));

    let def = PropertyInfo::from_node("home", &s::define("Address", [("city", s::string())]), None)
        .unwrap();
    assert!(def.is_object());
    assert_eq!(def.definition(), Some("Address"));

    let computed = PropertyInfo::from_node("label", &s::computed(|_| Value::Null), None).unwrap();
    assert!(computed.is_computed());
    assert!(computed.body().is_some());
}
