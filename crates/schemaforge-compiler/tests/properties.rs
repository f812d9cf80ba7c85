//! Property tests over generated people.

use proptest::prelude::*;
use schemaforge_compiler::{compile, CompiledSchema, HashType};
use schemaforge_core::Value;
use schemaforge_test::{person_schema, value};
use serde_json::json;

fn people() -> CompiledSchema {
    compile(&person_schema(), "people").unwrap()
}

fn person(id: &str, name: &str, city: Option<&str>, zip: &str) -> Value {
    match city {
        Some(city) => value(json!({"id": id, "name": name, "address": {"city": city, "zip": zip}})),
        None => value(json!({"id": id, "name": name, "address": null})),
    }
}

proptest! {
    #[test]
    fn prop_hash_is_stable(
        id in "[a-z0-9-]{1,12}",
        name in "\\PC{0,16}",
        city in proptest::option::of("[A-Za-z ]{0,10}"),
        zip in "[A-Z0-9]{0,6}",
    ) {
        let people = people();
        let entity = person(&id, &name, city.as_deref(), &zip);
        for hash_type in [HashType::Ids, HashType::Object] {
            prop_assert_eq!(people.hash(&entity, hash_type), people.hash(&entity.clone(), hash_type));
        }
        prop_assert_eq!(people.hash(&entity, HashType::Ids), format!("{id:?}"));
    }

    #[test]
    fn prop_compare_is_reflexive(
        id in "[a-z0-9]{1,8}",
        name in "\\PC{0,16}",
        city in proptest::option::of("[A-Za-z]{0,10}"),
    ) {
        let people = people();
        let entity = person(&id, &name, city.as_deref(), "Z1");
        prop_assert!(people.compare(&entity, &entity));
        prop_assert!(people.compare(&entity, &people.clone_entity(&entity)));
    }

    #[test]
    fn prop_clone_equals_source(
        id in "[a-z0-9]{1,8}",
        name in "\\PC{0,16}",
        city in proptest::option::of("[A-Za-z]{0,10}"),
        zip in "[A-Z0-9]{0,6}",
    ) {
        let people = people();
        let entity = person(&id, &name, city.as_deref(), &zip);
        prop_assert_eq!(people.clone_entity(&entity), entity);
    }

    #[test]
    fn prop_distinct_keys_hash_differently(
        a in "[a-z0-9]{1,8}",
        b in "[a-z0-9]{1,8}",
    ) {
        prop_assume!(a != b);
        let people = people();
        let left = person(&a, "same", Some("Rome"), "00100");
        let right = person(&b, "same", Some("Rome"), "00100");
        prop_assert_ne!(people.hash(&left, HashType::Ids), people.hash(&right, HashType::Ids));
        prop_assert!(!people.compare(&left, &right));
    }

    #[test]
    fn prop_strip_is_idempotent(
        id in "[a-z0-9]{1,8}",
        name in "\\PC{0,16}",
        city in proptest::option::of("[A-Za-z]{0,10}"),
    ) {
        let people = people();
        let stripped = people.strip(&person(&id, &name, city.as_deref(), "Z"));
        prop_assert_eq!(people.strip(&stripped), stripped);
    }
}
