use super::*;
use crate::error::{ErrorClass, ErrorOrigin};
use serde_json::json;

fn sample() -> Entity {
    Entity::try_from(json!({
        "id": "u-17",
        "tenant": "acme",
        "profile": { "address": { "city": "Oslo" }, "kind": "address" },
        "age": 41,
        "selector": "profile.address.city"
    }))
    .unwrap()
}

fn path(raw: &str) -> FieldPath {
    FieldPath::parse(raw).unwrap()
}

#[test]
fn parse_splits_literals_and_placeholders() {
    let template = KeyTemplate::parse("users:{}:city:{.}").unwrap();

    assert_eq!(
        template.segments(),
        &[
            Segment::Literal("users:".into()),
            Segment::Direct,
            Segment::Literal(":city:".into()),
            Segment::Deref,
        ]
    );
    assert_eq!(template.arity(), 2);
    assert_eq!(template.to_string(), "users:{}:city:{.}");
}

#[test]
fn parse_handles_brace_escapes() {
    let template = KeyTemplate::parse("a{{b}}:{}").unwrap();

    assert_eq!(
        template.segments(),
        &[Segment::Literal("a{b}:".into()), Segment::Direct]
    );
    assert_eq!(template.to_string(), "a{{b}}:{}");
}

#[test]
fn parse_rejects_malformed_placeholders() {
    for pattern in ["users:{", "users:{x}", "users:}", "users:{.", "users:{.x}"] {
        let err = KeyTemplate::parse(pattern).unwrap_err();
        assert_eq!(err.class, ErrorClass::Unsupported, "{pattern}");
        assert_eq!(err.origin, ErrorOrigin::Template, "{pattern}");
    }
}

#[test]
fn new_coalesces_adjacent_literals() {
    let template = KeyTemplate::new([
        Segment::Literal("a".into()),
        Segment::Literal(String::new()),
        Segment::Literal(":b".into()),
        Segment::Deref,
    ]);

    assert_eq!(
        template.segments(),
        &[Segment::Literal("a:b".into()), Segment::Deref]
    );
}

#[test]
fn resolve_mixes_literal_direct_and_nested_deref() {
    let template = KeyTemplate::parse("tenants:{}:city:{.}").unwrap();
    let args = [
        TemplateArg::text("acme"),
        TemplateArg::path(path("profile.address.city")),
    ];

    assert_eq!(
        template.resolve(&sample(), &args).as_deref(),
        Some("tenants:acme:city:Oslo")
    );
    // deterministic
    assert_eq!(
        template.resolve(&sample(), &args),
        template.resolve(&sample(), &args)
    );
}

#[test]
fn deref_of_text_arg_parses_it_as_a_path() {
    let template = KeyTemplate::parse("ages:{.}").unwrap();
    let args = [TemplateArg::text("age")];

    assert_eq!(template.resolve(&sample(), &args).as_deref(), Some("ages:41"));
}

#[test]
fn deref_of_nested_template_resolves_the_path_first() {
    // `profile.{.}.city` -> `profile.address.city` -> `Oslo`
    let inner = KeyExpr::parse("profile.{.}.city", vec![TemplateArg::path(path("profile.kind"))])
        .unwrap();
    let template = KeyTemplate::parse("cities:{.}").unwrap();

    assert_eq!(
        template
            .resolve(&sample(), &[TemplateArg::template(inner)])
            .as_deref(),
        Some("cities:Oslo")
    );
}

#[test]
fn direct_of_nested_template_substitutes_its_key() {
    let inner = KeyExpr::parse("{.}", vec![TemplateArg::path(path("tenant"))]).unwrap();
    let template = KeyTemplate::parse("t:{}:users").unwrap();

    assert_eq!(
        template
            .resolve(&sample(), &[TemplateArg::template(inner)])
            .as_deref(),
        Some("t:acme:users")
    );
}

#[test]
fn resolve_fails_silently_on_missing_values() {
    let template = KeyTemplate::parse("users:{.}").unwrap();

    assert_eq!(
        template.resolve(&sample(), &[TemplateArg::path(path("nope"))]),
        None
    );
    assert_eq!(
        template.resolve(&sample(), &[TemplateArg::path(path("profile"))]),
        None,
        "objects are not indexable"
    );
    assert_eq!(template.resolve(&sample(), &[]), None, "missing argument");
}

#[test]
fn resolve_does_not_touch_the_entity() {
    let entity = sample();
    let before = entity.clone();
    let _ = KeyTemplate::parse("x:{.}")
        .unwrap()
        .resolve(&entity, &[TemplateArg::text("selector")]);

    assert_eq!(entity, before);
}

#[test]
fn fill_substitutes_values_in_order() {
    let template = KeyTemplate::parse("{}:{.}:groups").unwrap();

    assert_eq!(template.fill(&["users", "u1"]).unwrap(), "users:u1:groups");
    assert!(template.fill(&["users"]).is_err());
}

#[test]
fn key_expr_checks_arity() {
    let err = KeyExpr::parse("a:{}:{.}", vec![TemplateArg::text("x")]).unwrap_err();
    assert_eq!(err.origin, ErrorOrigin::Template);

    let expr = KeyExpr::literal("users:email");
    assert_eq!(expr.resolve(&sample()).as_deref(), Some("users:email"));
    assert_eq!(expr.fill(&[]).unwrap(), "users:email");
}

#[test]
fn same_shape_ignores_placeholder_kind() {
    let relation = KeyTemplate::parse("teams:{}:users").unwrap();

    assert!(relation.same_shape(&KeyTemplate::parse("teams:{.}:users").unwrap()));
    assert!(!relation.same_shape(&KeyTemplate::parse("teams:{}:groups").unwrap()));
    assert!(!relation.same_shape(&KeyTemplate::parse("teams:{}").unwrap()));
    assert!(
        !KeyTemplate::literal("users:email").same_shape(&KeyTemplate::parse("users:{}").unwrap())
    );
}
