//! Compiled expressions shared across threads

use std::sync::Arc;
use std::thread;

use ferrum_path::{Context, ElementNode, Engine, Expression, Node};

fn assert_send_sync<T: Send + Sync>() {}

fn patient(id: usize) -> Node {
    let mut patient = ElementNode::new("Patient")
        .with_base_type("DomainResource")
        .with_child("id", Node::string(format!("p{}", id)))
        .with_child("active", Node::boolean(id % 2 == 0));
    for given in 0..=id {
        let name = ElementNode::new("HumanName")
            .with_child("use", Node::string(if given == 0 { "official" } else { "usual" }))
            .with_child("given", Node::string(format!("g{}-{}", id, given)));
        patient.push_child("name", name);
    }
    patient.into_node()
}

#[test]
fn test_engine_types_are_send_sync() {
    assert_send_sync::<Engine>();
    assert_send_sync::<Expression>();
    assert_send_sync::<Arc<Expression>>();
    assert_send_sync::<Context>();
    assert_send_sync::<Node>();
}

#[test]
fn test_compiled_expression_evaluates_concurrently() {
    let engine = Engine::new();
    let count = engine.compile("Patient.name.given.count()").unwrap();
    let official = engine
        .compile("name.where(use = 'official').given.first() & '/' & id")
        .unwrap();

    thread::scope(|scope| {
        let workers: Vec<_> = (0..8)
            .map(|id| {
                let engine = &engine;
                let count = Arc::clone(&count);
                let official = Arc::clone(&official);
                scope.spawn(move || {
                    let ctx = Context::from_node(patient(id));
                    for _ in 0..50 {
                        let counted = engine.evaluate(&count, &ctx).unwrap();
                        assert_eq!(counted.as_integer().unwrap(), id as i64 + 1);

                        let label = engine.evaluate(&official, &ctx).unwrap();
                        assert_eq!(&*label.as_string().unwrap(), format!("g{}-0/p{}", id, id));
                    }
                    id
                })
            })
            .collect();

        let mut finished: Vec<usize> = workers.into_iter().map(|w| w.join().unwrap()).collect();
        finished.sort_unstable();
        assert_eq!(finished, (0..8).collect::<Vec<_>>());
    });

    assert_eq!(engine.cached_expressions(), 2);
}

#[test]
fn test_concurrent_compilation_shares_the_cache() {
    let engine = Engine::new();
    let expr = "Patient.active.not()";

    let compiled: Vec<Arc<Expression>> = thread::scope(|scope| {
        let workers: Vec<_> = (0..8)
            .map(|id| {
                let engine = &engine;
                scope.spawn(move || {
                    let expression = engine.compile(expr).unwrap();
                    let result = engine
                        .evaluate(&expression, &Context::from_node(patient(id)))
                        .unwrap();
                    assert_eq!(result.as_boolean().unwrap(), id % 2 == 1);
                    expression
                })
            })
            .collect();
        workers.into_iter().map(|w| w.join().unwrap()).collect()
    });

    assert_eq!(engine.cached_expressions(), 1);
    // Threads racing on a cold cache may each parse once; every parse is the same
    assert!(compiled.iter().all(|e| e.ast() == compiled[0].ast()));
    assert!(Arc::ptr_eq(&engine.compile(expr).unwrap(), &engine.compile(expr).unwrap()));
}
