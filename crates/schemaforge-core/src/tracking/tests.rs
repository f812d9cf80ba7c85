//! Tests for entity write interception.

use super::*;
use serde_json::json;

fn tracked() -> Entity {
    let mut entity = Entity::new(Value::from(json!({
        "id": "1",
        "b": 1,
        "address": { "city": "X", "zip": "1" }
    })));
    entity.enable_tracking([FieldPath::root()]);
    entity
}

#[test]
fn test_starts_untracked() {
    let entity = tracked();
    assert_eq!(entity.tracker().unwrap().state(), TrackerState::Untracked);
    assert!(!entity.is_dirty());
}

#[test]
fn test_revert_clears_record() {
    let mut entity = tracked();
    entity.set("b", 5).unwrap();
    assert!(entity.is_dirty());
    assert_eq!(entity.tracker().unwrap().state(), TrackerState::Tracking);

    entity.set("b", 1).unwrap();
    assert!(!entity.is_dirty());
    assert!(entity.changed_values().is_empty());
}

#[test]
fn test_second_write_keeps_first_original() {
    let mut entity = tracked();
    entity.set("b", 5).unwrap();
    entity.set("b", 6).unwrap();

    let change = entity.tracker().unwrap().change(&"b".into()).unwrap();
    assert_eq!(change.original, Some(Value::Int(1)));
    assert_eq!(change.current, Value::Int(6));
    assert_eq!(entity.changed_values().get("b"), Some(&Value::Int(6)));
    assert_eq!(entity.changed_values().len(), 1);
}

#[test]
fn test_nested_write_recorded_on_entity() {
    let mut entity = tracked();
    entity.set("address.city", "Y").unwrap();
    assert!(entity.is_dirty());
    assert_eq!(
        entity.changed_values().get("address.city"),
        Some(&Value::from("Y"))
    );
}

#[test]
fn test_write_to_new_path_has_absent_original() {
    let mut entity = tracked();
    entity.set("nickname", "Bob").unwrap();
    let change = entity.tracker().unwrap().change(&"nickname".into()).unwrap();
    assert_eq!(change.original, None);
}

#[test]
fn test_same_value_is_not_a_change() {
    let mut entity = tracked();
    entity.set("b", 1).unwrap();
    assert!(!entity.is_dirty());
}

#[test]
fn test_paused_writes_pass_through() {
    let mut entity = tracked();
    entity.set("b", 2).unwrap();
    entity.pause_tracking();
    entity.set("address.zip", "2").unwrap();
    assert_eq!(entity.tracker().unwrap().state(), TrackerState::Paused);
    entity.resume_tracking();

    assert_eq!(entity.tracker().unwrap().state(), TrackerState::Tracking);
    assert_eq!(entity.get("address.zip"), Some(&Value::from("2")));
    let changes = entity.changed_values();
    assert_eq!(changes.len(), 1);
    assert!(changes.contains_key("b"));
}

#[test]
fn test_unwatched_paths_not_recorded() {
    let mut entity = Entity::new(Value::from(json!({ "a": 1, "b": 2 })));
    entity.enable_tracking([FieldPath::parse("a")]);
    entity.set("b", 3).unwrap();
    assert!(!entity.is_dirty());
    entity.set("a", 3).unwrap();
    assert!(entity.is_dirty());
}

#[test]
fn test_commit_clears_changes() {
    let mut entity = tracked();
    entity.set("b", 9).unwrap();
    entity.commit();
    assert!(!entity.is_dirty());
    entity.set("b", 1).unwrap();
    assert_eq!(
        entity.tracker().unwrap().change(&"b".into()).unwrap().original,
        Some(Value::Int(9))
    );
}

#[test]
fn test_frozen_paths_reject_writes() {
    let mut entity = tracked();
    entity.freeze_path(FieldPath::parse("address"));
    let err = entity.set("address.city", "Y").unwrap_err();
    assert_eq!(
        err,
        SchemaError::Frozen {
            path: "address.city".into()
        }
    );
    entity.set("b", 3).unwrap();

    entity.freeze_path(FieldPath::root());
    assert!(entity.is_frozen_root());
    assert!(entity.set("b", 4).is_err());
}

#[test]
fn test_readonly_rejects_overwrite_only() {
    let mut entity = Entity::new(Value::from(json!({ "id": null })));
    entity.protect(FieldPath::parse("id"));
    entity.set("id", "a").unwrap();
    let err = entity.set("id", "b").unwrap_err();
    assert_eq!(err, SchemaError::Readonly { path: "id".into() });

    entity.assign(&"id".into(), Value::from("b")).unwrap();
    assert_eq!(entity.get("id"), Some(&Value::from("b")));
}

#[test]
fn test_write_through_null_target_fails_without_record() {
    let mut entity = Entity::new(Value::from(json!({ "address": null })));
    entity.enable_tracking([FieldPath::root()]);
    let err = entity.set("address.city", "Y").unwrap_err();
    assert!(matches!(err, SchemaError::InvalidTarget { .. }));
    assert!(!entity.is_dirty());
}

#[test]
fn test_invoke_methods() {
    let mut entity = Entity::new(Value::from(json!({ "first": "Ada" })));
    entity.attach_method(
        "greet",
        Arc::new(|v: &Value| {
            Value::from(format!(
                "hi {}",
                v.get_path(&"first".into()).and_then(Value::as_str).unwrap_or("")
            ))
        }),
    );
    assert_eq!(entity.invoke("greet").unwrap(), Value::from("hi Ada"));
    assert!(matches!(
        entity.invoke("nope"),
        Err(SchemaError::UnknownFunction { .. })
    ));
}

#[test]
fn test_restoring_object_clears_nested_records() {
    let mut entity = tracked();
    let original = entity.get("address").cloned().unwrap();

    entity.set("address", Value::from(json!({"city": "P", "zip": "75"}))).unwrap();
    entity.set("address.city", "L").unwrap();
    assert_eq!(entity.changed_values().keys().collect::<Vec<_>>(), ["address"]);
    assert_eq!(
        entity.changed_values()["address"],
        Value::from(json!({"city": "L", "zip": "75"}))
    );

    entity.set("address", original).unwrap();
    assert!(!entity.is_dirty());
    assert!(entity.changed_values().is_empty());
}

#[test]
fn test_object_write_absorbs_nested_records() {
    let mut entity = tracked();
    entity.set("address.city", "Y").unwrap();
    entity.set("address", Value::from(json!({"city": "Z", "zip": "1"}))).unwrap();

    let changes = entity.changes().unwrap();
    assert_eq!(changes.len(), 1);
    let change = &changes[&FieldPath::parse("address")];
    assert_eq!(change.original, Some(Value::from(json!({"city": "X", "zip": "1"}))));

    entity.set("address", Value::from(json!({"city": "X", "zip": "1"}))).unwrap();
    assert!(!entity.is_dirty());
}

#[test]
fn test_object_write_matching_restored_original_is_clean() {
    let mut entity = tracked();
    entity.set("address.city", "Y").unwrap();
    entity.set("address", Value::from(json!({"city": "X", "zip": "1"}))).unwrap();
    assert!(!entity.is_dirty());
}

#[test]
fn test_nested_revert_below_object_record_clears_it() {
    let mut entity = tracked();
    entity.set("address", Value::from(json!({"city": "Y", "zip": "1"}))).unwrap();
    entity.set("address.city", "X").unwrap();
    assert!(!entity.is_dirty());
}
