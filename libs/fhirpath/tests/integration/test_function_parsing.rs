//! Tests to verify that every library function can be parsed

use ferrum_path::error::Result;
use ferrum_path::{parse, AstNode, FunctionRegistry};

fn parse_function_call(expr: &str) -> Result<()> {
    parse(expr)?;
    Ok(())
}

#[test]
fn test_parse_all_functions() {
    // Boolean logic and types
    assert!(parse_function_call("not()").is_ok());
    assert!(parse_function_call("is(Integer)").is_ok());
    assert!(parse_function_call("as(System.String)").is_ok());

    // Conversion
    assert!(parse_function_call("iif(true, 'yes', 'no')").is_ok());
    assert!(parse_function_call("iif(true, 'yes')").is_ok());
    assert!(parse_function_call("toBoolean()").is_ok());
    assert!(parse_function_call("convertsToBoolean()").is_ok());
    assert!(parse_function_call("toInteger()").is_ok());
    assert!(parse_function_call("convertsToInteger()").is_ok());
    assert!(parse_function_call("toDecimal()").is_ok());
    assert!(parse_function_call("convertsToDecimal()").is_ok());
    assert!(parse_function_call("toString()").is_ok());
    assert!(parse_function_call("convertsToString()").is_ok());
    assert!(parse_function_call("toDate()").is_ok());
    assert!(parse_function_call("convertsToDate()").is_ok());
    assert!(parse_function_call("toDateTime()").is_ok());
    assert!(parse_function_call("convertsToDateTime()").is_ok());
    assert!(parse_function_call("toTime()").is_ok());
    assert!(parse_function_call("convertsToTime()").is_ok());
    assert!(parse_function_call("toQuantity()").is_ok());
    assert!(parse_function_call("toQuantity('mg')").is_ok());
    assert!(parse_function_call("convertsToQuantity()").is_ok());

    // Existence
    assert!(parse_function_call("empty()").is_ok());
    assert!(parse_function_call("exists()").is_ok());
    assert!(parse_function_call("exists(use = 'official')").is_ok());
    assert!(parse_function_call("all($this > 0)").is_ok());
    assert!(parse_function_call("allTrue()").is_ok());
    assert!(parse_function_call("anyTrue()").is_ok());
    assert!(parse_function_call("allFalse()").is_ok());
    assert!(parse_function_call("anyFalse()").is_ok());
    assert!(parse_function_call("subsetOf(collection)").is_ok());
    assert!(parse_function_call("supersetOf(collection)").is_ok());
    assert!(parse_function_call("count()").is_ok());
    assert!(parse_function_call("distinct()").is_ok());
    assert!(parse_function_call("isDistinct()").is_ok());
    assert!(parse_function_call("hasValue()").is_ok());

    // Filtering
    assert!(parse_function_call("where($this > 0)").is_ok());
    assert!(parse_function_call("select($this.name)").is_ok());
    assert!(parse_function_call("repeat(item)").is_ok());
    assert!(parse_function_call("ofType(Patient)").is_ok());
    assert!(parse_function_call("extension('url')").is_ok());

    // Subsetting
    assert!(parse_function_call("single()").is_ok());
    assert!(parse_function_call("first()").is_ok());
    assert!(parse_function_call("last()").is_ok());
    assert!(parse_function_call("tail()").is_ok());
    assert!(parse_function_call("skip(5)").is_ok());
    assert!(parse_function_call("take(10)").is_ok());
    assert!(parse_function_call("intersect(collection)").is_ok());
    assert!(parse_function_call("exclude(collection)").is_ok());

    // Combining
    assert!(parse_function_call("union(collection)").is_ok());
    assert!(parse_function_call("combine(collection)").is_ok());

    // String
    assert!(parse_function_call("indexOf('test')").is_ok());
    assert!(parse_function_call("lastIndexOf('test')").is_ok());
    assert!(parse_function_call("substring(5)").is_ok());
    assert!(parse_function_call("substring(5, 10)").is_ok());
    assert!(parse_function_call("startsWith('prefix')").is_ok());
    assert!(parse_function_call("endsWith('suffix')").is_ok());
    assert!(parse_function_call("contains('substring')").is_ok());
    assert!(parse_function_call("name.contains('substring')").is_ok());
    assert!(parse_function_call("upper()").is_ok());
    assert!(parse_function_call("lower()").is_ok());
    assert!(parse_function_call("replace('old', 'new')").is_ok());
    assert!(parse_function_call("matches('pattern')").is_ok());
    assert!(parse_function_call("matchesFull('pattern')").is_ok());
    assert!(parse_function_call("replaceMatches('pattern', 'replacement')").is_ok());
    assert!(parse_function_call("length()").is_ok());
    assert!(parse_function_call("toChars()").is_ok());
    assert!(parse_function_call("trim()").is_ok());
    assert!(parse_function_call("split(',')").is_ok());
    assert!(parse_function_call("join(',')").is_ok());
    assert!(parse_function_call("join()").is_ok());

    // Math
    assert!(parse_function_call("abs()").is_ok());
    assert!(parse_function_call("ceiling()").is_ok());
    assert!(parse_function_call("exp()").is_ok());
    assert!(parse_function_call("floor()").is_ok());
    assert!(parse_function_call("ln()").is_ok());
    assert!(parse_function_call("log(10)").is_ok());
    assert!(parse_function_call("power(2)").is_ok());
    assert!(parse_function_call("round()").is_ok());
    assert!(parse_function_call("round(2)").is_ok());
    assert!(parse_function_call("sqrt()").is_ok());
    assert!(parse_function_call("truncate()").is_ok());

    // Navigation
    assert!(parse_function_call("children()").is_ok());
    assert!(parse_function_call("descendants()").is_ok());

    // Utility
    assert!(parse_function_call("trace('label')").is_ok());
    assert!(parse_function_call("trace('label', value)").is_ok());
    assert!(parse_function_call("now()").is_ok());
    assert!(parse_function_call("today()").is_ok());
    assert!(parse_function_call("timeOfDay()").is_ok());

    // Aggregate
    assert!(parse_function_call("aggregate($this + $total, 0)").is_ok());
}

#[test]
fn test_every_registered_function_has_a_parse_form() {
    let registry = FunctionRegistry::new();
    for name in registry.all_function_names() {
        let id = registry.resolve(name).unwrap();
        let min_args = registry.get_metadata(id).unwrap().min_args;
        let args = vec!["1"; min_args].join(", ");
        let expr = format!("{{}}.{}({})", name, args);
        assert!(parse_function_call(&expr).is_ok(), "failed to parse {}", expr);
    }
}

#[test]
fn test_function_call_in_path() {
    assert!(parse_function_call("name.exists()").is_ok());
    assert!(parse_function_call("name.first()").is_ok());
    assert!(parse_function_call("name.where(given = 'John')").is_ok());
    assert!(parse_function_call("name.select(given)").is_ok());
}

#[test]
fn test_chained_function_calls() {
    assert!(parse_function_call("name.first().toString()").is_ok());
    assert!(parse_function_call("name.where(given = 'John').first()").is_ok());

    let ast = parse("name.where(use = 'official').given.first()").unwrap();
    let AstNode::FunctionCall { target, name, arguments } = ast else {
        panic!("expected function call, got {:?}", ast);
    };
    assert_eq!(name, "first");
    assert!(arguments.is_empty());
    assert!(matches!(target.as_deref(), Some(AstNode::Invocation { member, .. }) if member == "given"));
}

#[test]
fn test_arguments_are_not_validated_at_parse_time() {
    // Arity and unknown names are evaluation-time errors
    assert!(parse_function_call("first(1, 2)").is_ok());
    assert!(parse_function_call("noSuchFunction()").is_ok());
}
