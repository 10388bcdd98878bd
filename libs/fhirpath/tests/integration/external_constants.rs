use ferrum_path::{Collection, Context, Error, Node};
use serde_json::json;

use crate::test_support::engine;

#[test]
fn resolves_external_context_constants() {
    let resource = Node::from_json(&json!({"resourceType": "Patient", "id": "p1"}));
    let ctx = Context::from_node(resource.clone());

    let result = engine().evaluate_expr("%resource", &ctx).expect("evaluation failed");
    assert_eq!(result.len(), 1);
    assert_eq!(result.first().unwrap(), &resource);

    let ctx_result = engine().evaluate_expr("%context", &ctx).expect("evaluation failed");
    assert_eq!(ctx_result.len(), 1);
    assert_eq!(ctx_result.first().unwrap(), &resource);
}

#[test]
fn resolves_root_resource_and_profile() {
    let root_resource = Node::from_json(&json!({"resourceType": "Patient", "id": "root"}));
    let contained_resource =
        Node::from_json(&json!({"resourceType": "Observation", "id": "contained"}));

    let mut ctx = Context::new_with_root_resource(
        Collection::singleton(contained_resource.clone()),
        Collection::singleton(root_resource.clone()),
    );
    ctx.set_variable(
        "%profile",
        Node::string("http://example.org/StructureDefinition/test"),
    );

    let resource_result = engine().evaluate_expr("%resource", &ctx).expect("evaluation failed");
    assert_eq!(resource_result.first().unwrap(), &contained_resource);

    let root_result = engine()
        .evaluate_expr("%rootResource.id", &ctx)
        .expect("evaluation failed");
    assert_eq!(&*root_result.as_string().unwrap(), "root");

    let profile_result = engine().evaluate_expr("%profile", &ctx).expect("evaluation failed");
    assert_eq!(
        &*profile_result.as_string().unwrap(),
        "http://example.org/StructureDefinition/test"
    );
}

#[test]
fn resolves_builtin_and_user_constants() {
    let ctx = Context::empty()
        .with_variable("threshold", Node::integer(5))
        .with_variable("codes", Collection::from(vec![Node::string("a"), Node::string("b")]));

    let ucum = engine().evaluate_expr("%ucum", &ctx).unwrap();
    assert_eq!(&*ucum.as_string().unwrap(), "http://unitsofmeasure.org");

    let compared = engine().evaluate_expr("%threshold > 3", &ctx).unwrap();
    assert!(compared.as_boolean().unwrap());

    let quoted = engine().evaluate_expr("%`threshold` * 2", &ctx).unwrap();
    assert_eq!(quoted.as_integer().unwrap(), 10);

    let codes = engine().evaluate_expr("%codes.count()", &ctx).unwrap();
    assert_eq!(codes.as_integer().unwrap(), 2);
}

#[test]
fn undefined_constant_is_an_error() {
    let err = engine()
        .evaluate_expr("%missing + 1", &Context::empty())
        .unwrap_err();
    assert_eq!(err, Error::UndefinedVariable("missing".into()));
    assert_eq!(err.to_string(), "Undefined variable: %missing");
}
