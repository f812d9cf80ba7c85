//! Property tree construction.

use std::collections::VecDeque;
use std::sync::Arc;

use schemaforge_core::{FieldPath, Fields, PropertyInfo, Result, SchemaError, SchemaNode};

/// The property tree produced by [`walk`].
#[derive(Debug, Default)]
pub struct PropertyTree {
    /// Root properties in declaration order.
    pub roots: Vec<Arc<PropertyInfo>>,
    /// Every property in visiting order.
    pub all: Vec<Arc<PropertyInfo>>,
}

/// Walks `root` breadth-first, building one [`PropertyInfo`] per field.
///
/// Definitions are unwrapped in place, as if their fields were declared
/// inline. `visit` runs once per property in visiting order; object
/// properties are visited before their children exist, so a visitor must not
/// rely on descendants. Properties deeper than `max_depth` levels fail with
/// [`SchemaError::DepthExceeded`].
pub fn walk(
    root: &SchemaNode,
    max_depth: usize,
    mut visit: impl FnMut(&Arc<PropertyInfo>) -> Result<()>,
) -> Result<PropertyTree> {
    let fields = root.fields().ok_or_else(|| SchemaError::RootNotObject {
        found: root.node_type().name(),
    })?;

    let mut tree = PropertyTree::default();
    let mut queue: VecDeque<(Option<Arc<PropertyInfo>>, &Fields, usize)> = VecDeque::new();
    queue.push_back((None, fields, 0));

    while let Some((parent, fields, depth)) = queue.pop_front() {
        let mut children = Vec::with_capacity(fields.len());
        for (name, node) in fields {
            if depth >= max_depth {
                let path = match &parent {
                    Some(parent) => parent.path().child(name),
                    None => FieldPath::parse(name),
                };
                return Err(SchemaError::DepthExceeded {
                    path: path.to_string(),
                    max_depth,
                });
            }
            let info = Arc::new(PropertyInfo::from_node(name, node, parent.as_ref())?);
            visit(&info)?;
            if let Some(nested) = node.fields() {
                queue.push_back((Some(info.clone()), nested, depth + 1));
            }
            tree.all.push(info.clone());
            children.push(info);
        }
        match parent {
            Some(parent) => parent.attach_children(children)?,
            None => tree.roots = children,
        }
    }
    Ok(tree)
}

#[cfg(test)]
mod tests {
    use super::*;
    use schemaforge_core::s;

    fn names(props: &[Arc<PropertyInfo>]) -> Vec<String> {
        props.iter().map(|p| p.path().to_string()).collect()
    }

    #[test]
    fn test_breadth_first_order() {
        let schema = s::object([
            ("id", s::string().key()),
            (
                "address",
                s::object([("city", s::string()), ("geo", s::object([("lat", s::number())]))]),
            ),
            ("name", s::string()),
        ]);
        let mut visited = Vec::new();
        let tree = walk(&schema, 32, |p| {
            visited.push(p.path().to_string());
            Ok(())
        })
        .unwrap();

        assert_eq!(
            visited,
            ["id", "address", "name", "address.city", "address.geo", "address.geo.lat"]
        );
        assert_eq!(names(&tree.roots), ["id", "address", "name"]);
        assert_eq!(names(tree.roots[1].children()), ["address.city", "address.geo"]);
        assert_eq!(tree.all.len(), 6);
    }

    #[test]
    fn test_objects_visited_before_children_attached() {
        let schema = s::object([("id", s::string().key()), ("a", s::object([("b", s::string())]))]);
        walk(&schema, 32, |p| {
            if p.is_object() {
                assert!(p.children().is_empty());
            }
            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn test_definitions_are_inlined() {
        let address = s::define("Address", [("city", s::string()), ("zip", s::string())]);
        let extended = address.modify("Extended", |fields| {
            fields.insert("country".into(), s::string());
        });
        let schema = s::object([("id", s::string().key()), ("home", extended.nullable())]);
        let tree = walk(&schema, 32, |_| Ok(())).unwrap();

        let home = &tree.roots[1];
        assert!(home.is_object());
        assert!(home.is_nullable());
        assert_eq!(home.definition(), Some("Extended"));
        assert_eq!(names(home.children()), ["home.city", "home.zip", "home.country"]);
    }

    #[test]
    fn test_root_definition() {
        let schema = s::define("Person", [("id", s::string().key())]);
        let tree = walk(&schema, 32, |_| Ok(())).unwrap();
        assert_eq!(names(&tree.roots), ["id"]);
    }

    #[test]
    fn test_root_must_be_object() {
        let err = walk(&s::string(), 32, |_| Ok(())).unwrap_err();
        assert_eq!(err, SchemaError::RootNotObject { found: "string" });
    }

    #[test]
    fn test_depth_guard() {
        let schema = s::object([("a", s::object([("b", s::object([("c", s::string())]))]))]);
        assert!(walk(&schema, 3, |_| Ok(())).is_ok());
        let err = walk(&schema, 2, |_| Ok(())).unwrap_err();
        assert_eq!(
            err,
            SchemaError::DepthExceeded {
                path: "a.b.c".into(),
                max_depth: 2
            }
        );
    }

    #[test]
    fn test_visit_error_aborts() {
        let schema = s::object([("id", s::string().key()), ("name", s::string())]);
        let mut seen = 0;
        let err = walk(&schema, 32, |p| {
            seen += 1;
            if p.name() == "id" {
                return Err(SchemaError::Synthesis("boom".into()));
            }
            Ok(())
        })
        .unwrap_err();
        assert_eq!(err, SchemaError::Synthesis("boom".into()));
        assert_eq!(seen, 1);
    }

    #[test]
    fn test_invalid_field_name() {
        let schema = s::object([("a.b", s::string())]);
        let err = walk(&schema, 32, |_| Ok(())).unwrap_err();
        assert!(matches!(err, SchemaError::InvalidFieldName { .. }));
    }
}
