//! Index discovery over a compiled property list.

use std::sync::Arc;

use indexmap::IndexMap;
use serde::Serialize;

use crate::path::FieldPath;
use crate::property::PropertyInfo;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum IndexKind {
    PrimaryKey,
    Unique,
    Single,
    Compound,
}

/// One index over one or more leaf properties.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndexDescriptor {
    pub name: String,
    pub kind: IndexKind,
    pub properties: Vec<FieldPath>,
}

/// Groups leaves by index name.
///
/// Keys and distinct leaves without an explicit index name get an implicit
/// index named after their path. A singleton group is `PrimaryKey` when its
/// leaf is a key, `Unique` when distinct, `Single` otherwise; larger groups
/// are `Compound`. Output order follows the first appearance of each name.
pub fn discover_indexes(properties: &[Arc<PropertyInfo>]) -> Vec<IndexDescriptor> {
    let mut groups: IndexMap<String, Vec<&Arc<PropertyInfo>>> = IndexMap::new();

    for property in properties.iter().filter(|p| p.is_leaf()) {
        if property.indexes().is_empty() {
            if property.is_key() || property.is_distinct() {
                groups
                    .entry(property.path().to_string())
                    .or_default()
                    .push(property);
            }
            continue;
        }
        for name in property.indexes() {
            groups.entry(name.clone()).or_default().push(property);
        }
    }

    groups
        .into_iter()
        .map(|(name, members)| {
            let kind = match members.as_slice() {
                [only] if only.is_key() => IndexKind::PrimaryKey,
                [only] if only.is_distinct() => IndexKind::Unique,
                [_] => IndexKind::Single,
                _ => IndexKind::Compound,
            };
            IndexDescriptor {
                name,
                kind,
                properties: members.iter().map(|p| p.path().clone()).collect(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::s;

    fn props(fields: Vec<(&str, crate::schema::SchemaNode)>) -> Vec<Arc<PropertyInfo>> {
        fields
            .into_iter()
            .map(|(name, node)| Arc::new(PropertyInfo::from_node(name, &node, None).unwrap()))
            .collect()
    }

    #[test]
    fn test_compound_and_primary_key() {
        let properties = props(vec![
            ("a", s::string().key().identity()),
            ("b", s::string().index("ix1")),
            ("c", s::string().index("ix1")),
        ]);
        let indexes = discover_indexes(&properties);
        assert_eq!(
            indexes,
            vec![
                IndexDescriptor {
                    name: "a".into(),
                    kind: IndexKind::PrimaryKey,
                    properties: vec!["a".into()],
                },
                IndexDescriptor {
                    name: "ix1".into(),
                    kind: IndexKind::Compound,
                    properties: vec!["b".into(), "c".into()],
                },
            ]
        );
    }

    #[test]
    fn test_unique_and_single() {
        let properties = props(vec![
            ("email", s::string().distinct()),
            ("age", s::integer().index("by_age")),
            ("note", s::string()),
        ]);
        let indexes = discover_indexes(&properties);
        assert_eq!(indexes.len(), 2);
        assert_eq!(indexes[0].kind, IndexKind::Unique);
        assert_eq!(indexes[0].name, "email");
        assert_eq!(indexes[1].kind, IndexKind::Single);
        assert_eq!(indexes[1].name, "by_age");
    }

    #[test]
    fn test_distinct_with_named_index() {
        let properties = props(vec![("code", s::string().distinct().index("codes"))]);
        let indexes = discover_indexes(&properties);
        assert_eq!(indexes[0].name, "codes");
        assert_eq!(indexes[0].kind, IndexKind::Unique);
    }
}
