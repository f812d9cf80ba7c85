//! Tests for closure synthesis.

use super::*;
use crate::code::{HelperDef, NestedObject, Operation};
use schemaforge_core::{SchemaError, Value};
use serde_json::json;

fn value(json: serde_json::Value) -> Value {
    Value::from(json)
}

fn path(dotted: &str) -> FieldPath {
    FieldPath::parse(dotted)
}

fn linker() -> Linker {
    Linker::new(&CompilerConfig::default())
}

fn eval(expr: &Expr, entity: &Value) -> Option<Value> {
    linker().compile_expr(expr).unwrap()(&Frame::new(entity)).unwrap()
}

#[test]
fn test_read_and_or_else() {
    let entity = value(json!({"a": {"b": 1}, "n": null}));
    assert_eq!(eval(&Expr::read(&path("a.b")), &entity), Some(Value::Int(1)));
    assert_eq!(eval(&Expr::read(&path("a.c")), &entity), None);
    assert_eq!(eval(&Expr::read(&path("n")), &entity), Some(Value::Null));

    let fallback = Expr::OrElse(
        Box::new(Expr::read(&path("missing"))),
        Box::new(Expr::Default(Arc::new(|| Value::from("x")))),
    );
    assert_eq!(eval(&fallback, &entity), Some(Value::from("x")));
}

#[test]
fn test_equals_treats_absent_as_equal() {
    let expr = linker().compile_expr(&Expr::Equals(path("a"))).unwrap();
    let a = value(json!({"b": 1}));
    let b = value(json!({"b": 2}));
    assert_eq!(expr(&Frame::pair(&a, &b)).unwrap(), Some(Value::Bool(true)));
    let c = value(json!({"a": 1}));
    assert_eq!(expr(&Frame::pair(&a, &c)).unwrap(), Some(Value::Bool(false)));
}

#[test]
fn test_template_joins_with_separator() {
    let config = CompilerConfig::default().with_hash_separator("#");
    let linker = Linker::new(&config);
    let expr = Expr::Template(vec![
        TemplatePart::Value(path("a")),
        TemplatePart::Value(path("missing")),
        TemplatePart::Date(path("d")),
    ]);
    let render = linker.compile_expr(&expr).unwrap();
    let entity = value(json!({"a": "x", "d": 0}));
    assert_eq!(
        render(&Frame::new(&entity)).unwrap(),
        Some(Value::from("x##1970-01-01T00:00:00.000Z"))
    );
}

#[test]
fn test_list_fills_absent_with_null() {
    let expr = Expr::List(vec![Expr::read(&path("a")), Expr::read(&path("b"))]);
    let entity = value(json!({"a": 1}));
    assert_eq!(
        eval(&expr, &entity),
        Some(Value::List(vec![Value::Int(1), Value::Null]))
    );
}

#[test]
fn test_conditions() {
    let entity = value(json!({"n": null, "v": 1}));
    let frame = Frame::new(&entity);
    assert!(compile_cond(&Cond::Exists(Param::Entity, path("n")))(&frame));
    assert!(!compile_cond(&Cond::Present(Param::Entity, path("n")))(&frame));
    assert!(compile_cond(&Cond::Missing(Param::Entity, path("n")))(&frame));
    assert!(compile_cond(&Cond::Missing(Param::Entity, path("absent")))(&frame));
    assert!(compile_cond(&Cond::IsNull(Param::Entity, path("n")))(&frame));
    assert!(!compile_cond(&Cond::IsNull(Param::Entity, path("absent")))(&frame));
    // no second parameter bound
    assert!(compile_cond(&Cond::Missing(Param::Other, path("v")))(&frame));
    assert!(!compile_cond(&Cond::All(vec![
        Cond::Present(Param::Entity, path("v")),
        Cond::Present(Param::Entity, path("n")),
    ]))(&frame));
}

fn nested_literal(ensure: bool) -> ObjectLiteral {
    let mut root = ObjectLiteral::new();
    root.value("id", Expr::read(&path("id")));
    root.nest("address", Param::Entity, path("address"), ensure)
        .unwrap()
        .value("city", Expr::read(&path("address.city")));
    root
}

#[test]
fn test_object_presence_rules() {
    let build = linker().compile_object(&nested_literal(false)).unwrap();
    let run = |input: serde_json::Value| build(&Frame::new(&value(input))).unwrap().to_json();

    assert_eq!(run(json!({"id": 1})), json!({"id": 1}));
    assert_eq!(run(json!({"id": 1, "address": null})), json!({"id": 1, "address": null}));
    assert_eq!(
        run(json!({"id": 1, "address": {"city": "Oslo", "extra": true}})),
        json!({"id": 1, "address": {"city": "Oslo"}})
    );
}

#[test]
fn test_object_ensure_materializes() {
    let build = linker().compile_object(&nested_literal(true)).unwrap();
    let out = build(&Frame::new(&value(json!({"id": 1})))).unwrap();
    assert_eq!(out.to_json(), json!({"id": 1, "address": {}}));
    let out = build(&Frame::new(&value(json!({"id": 1, "address": null})))).unwrap();
    assert_eq!(out.to_json(), json!({"id": 1, "address": {}}));
}

#[test]
fn test_decode_errors_propagate() {
    let mut literal = ObjectLiteral::new();
    literal.value(
        "n",
        Expr::Map {
            param: Param::Entity,
            path: path("n"),
            map: MapKind::Decode(crate::code::Decoder {
                path: path("n"),
                ty: schemaforge_core::PrimitiveType::Integer,
                array: false,
                literals: None,
            }),
        },
    );
    let build = linker().compile_object(&literal).unwrap();
    let err = build(&Frame::new(&value(json!({"n": "seven"})))).unwrap_err();
    assert!(matches!(err, SchemaError::Deserialize { found: "string", .. }));
}

#[test]
fn test_statements_assign_and_pause() {
    let body = Block::new()
        .with(
            "copy",
            Fragment::Conditional {
                cond: Cond::Exists(Param::Other, path("a")),
                body: Block::new().with(
                    "assign",
                    Fragment::Assign {
                        target: path("a"),
                        expr: Expr::Read(Param::Other, path("a")),
                    },
                ),
            },
        )
        .with(
            "skip",
            Fragment::Conditional {
                cond: Cond::Exists(Param::Other, path("b")),
                body: Block::new().with(
                    "assign",
                    Fragment::Assign {
                        target: path("b"),
                        expr: Expr::Read(Param::Other, path("b")),
                    },
                ),
            },
        );
    let block = Block::new().with(
        "merge",
        Fragment::Wrapper {
            kind: WrapperKind::PauseTracking,
            body,
        },
    );
    let run = linker().compile_block(&block).unwrap();

    let mut entity = Entity::new(value(json!({"a": 1, "b": 2})));
    entity.enable_tracking([path("a"), path("b")]);
    let source = value(json!({"a": 5}));
    run(
        &mut entity,
        &StmtEnv {
            other: Some(&source),
            mode: TrackingMode::Off,
        },
    )
    .unwrap();

    assert_eq!(entity.value().to_json(), json!({"a": 5, "b": 2}));
    assert!(!entity.is_dirty());
    assert!(!entity.tracker().unwrap().is_paused());
}

#[test]
fn test_pause_resumes_after_error() {
    let block = Block::new().with(
        "merge",
        Fragment::Wrapper {
            kind: WrapperKind::PauseTracking,
            body: Block::new().with(
                "assign",
                Fragment::Assign {
                    target: path("a.b"),
                    expr: Expr::Literal(Value::Int(1)),
                },
            ),
        },
    );
    let run = linker().compile_block(&block).unwrap();
    let mut entity = Entity::new(value(json!({"a": 3})));
    entity.enable_tracking([path("a")]);
    let env = StmtEnv {
        other: None,
        mode: TrackingMode::Off,
    };
    let err = run(&mut entity, &env).unwrap_err();
    assert_eq!(err, SchemaError::InvalidTarget { path: "a.b".into() });
    assert!(!entity.tracker().unwrap().is_paused());
}

#[test]
fn test_when_mode_and_instructions() {
    let block = Block::new()
        .with(
            "tracked",
            Fragment::Wrapper {
                kind: WrapperKind::WhenMode(TrackingMode::Tracked),
                body: Block::new().with("a", Fragment::Op(Instruction::Watch(path("a")))),
            },
        )
        .with(
            "immutable",
            Fragment::Wrapper {
                kind: WrapperKind::WhenMode(TrackingMode::Immutable),
                body: Block::new().with("root", Fragment::Op(Instruction::Freeze(FieldPath::root()))),
            },
        );
    let run = linker().compile_block(&block).unwrap();

    let mut tracked = Entity::new(value(json!({"a": 1})));
    run(&mut tracked, &StmtEnv { other: None, mode: TrackingMode::Tracked }).unwrap();
    assert!(tracked.is_tracked());
    assert!(!tracked.is_frozen_root());

    let mut frozen = Entity::new(value(json!({"a": 1})));
    run(&mut frozen, &StmtEnv { other: None, mode: TrackingMode::Immutable }).unwrap();
    assert!(!frozen.is_tracked());
    assert!(frozen.is_frozen_root());
}

#[test]
fn test_statement_rejects_values() {
    let block = Block::new().with("result", Fragment::Return(Expr::Literal(Value::Null)));
    let err = linker().compile_block(&block).err().unwrap();
    assert!(matches!(err, SchemaError::Synthesis(_)));

    let err = linker().compile_instructions(&block).err().unwrap();
    assert!(matches!(err, SchemaError::Synthesis(msg) if msg.contains("result")));
}

fn helper_model(inject: Option<&str>) -> CodeModel {
    let mut model = CodeModel::new(Operation::Enrich);
    model.add_helper(HelperDef {
        path: path("label"),
        body: Arc::new(|ctx: &ComputeContext<'_>| {
            let prefix = ctx.injected.and_then(Value::as_str).unwrap_or(ctx.collection);
            let name = ctx.entity.get_path(&FieldPath::parse("name")).and_then(Value::as_str).unwrap_or("");
            Value::from(format!("{prefix}:{name}"))
        }),
        inject: inject.map(str::to_owned),
    });
    model
}

#[test]
fn test_bind_helpers_uses_collection_and_injection() {
    let entity = value(json!({"name": "ada"}));

    let bindings = Bindings {
        collection: "people".into(),
        ..Bindings::default()
    };
    let bound = bind_helpers(&helper_model(None), &bindings).unwrap();
    assert_eq!(bound["compute_label"](&entity), Value::from("people:ada"));

    let mut bindings = bindings;
    bindings.injections.insert("prefix".into(), Value::from("dr"));
    let bound = bind_helpers(&helper_model(Some("prefix")), &bindings).unwrap();
    assert_eq!(bound["compute_label"](&entity), Value::from("dr:ada"));
}

#[test]
fn test_missing_injection_fails() {
    let err = bind_helpers(&helper_model(Some("clock")), &Bindings::default())
        .err()
        .unwrap();
    assert_eq!(
        err,
        SchemaError::MissingInjection {
            path: "label".into(),
            name: "clock".into(),
        }
    );
}

#[test]
fn test_unbound_helper_is_a_synthesis_error() {
    let err = linker().compile_expr(&Expr::Helper("compute_x".into())).err().unwrap();
    assert!(matches!(err, SchemaError::Synthesis(_)));
}

#[test]
fn test_nested_object_keeps_source_param() {
    let mut root = ObjectLiteral::new();
    root.nest("copy", Param::Other, path("src"), false)
        .unwrap()
        .value("x", Expr::Read(Param::Other, path("src.x")));
    assert!(matches!(
        root.get("copy"),
        Some(Field::Object(NestedObject { param: Param::Other, .. }))
    ));
    let build = linker().compile_object(&root).unwrap();
    let a = Value::object();
    let b = value(json!({"src": {"x": 2}}));
    assert_eq!(build(&Frame::pair(&a, &b)).unwrap().to_json(), json!({"copy": {"x": 2}}));
}
