//! Integration tests for FHIRPath engine
//!
//! Tests the full pipeline: Tokenize → Parse → AST → Evaluation

use ferrum_path::{Collection, Error, Node};
use rust_decimal::Decimal;
use std::str::FromStr;

use crate::test_support::{eval, eval_empty, eval_json, engine, patient_context, patient_json};

fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

fn integers(values: &[i64]) -> Collection {
    values.iter().map(|v| Node::integer(*v)).collect()
}

fn strings(result: &Collection) -> Vec<String> {
    result
        .iter()
        .map(|n| n.as_string().unwrap().to_string())
        .collect()
}

fn eval_err(expr: &str) -> Error {
    engine()
        .evaluate_expr(expr, &ferrum_path::Context::empty())
        .unwrap_err()
}

// ============================================
// Literals
// ============================================

#[test]
fn test_literals() {
    // Boolean
    let result = eval_empty("true");
    assert_eq!(result.len(), 1);
    assert!(result.as_boolean().unwrap());

    let result = eval_empty("false");
    assert_eq!(result.len(), 1);
    assert!(!result.as_boolean().unwrap());

    // Integer
    let result = eval_empty("42");
    assert_eq!(result.as_integer().unwrap(), 42);

    // Long
    let result = eval_empty("42L");
    assert_eq!(result.as_integer().unwrap(), 42);

    // Decimal
    let result = eval_empty("3.14");
    assert_eq!(result.as_decimal().unwrap(), Decimal::new(314, 2));

    // String
    let result = eval_empty("'hello'");
    assert_eq!(&*result.as_string().unwrap(), "hello");

    // Empty
    assert!(eval_empty("{}").is_empty());

    // Temporal
    let result = eval_empty("@2019-02-03");
    assert_eq!(result.first().unwrap().to_string(), "2019-02-03");
    let result = eval_empty("@T14:30");
    assert_eq!(result.first().unwrap().type_name(), "Time");

    // Quantity
    let result = eval_empty("4.5 'mg'");
    let q = result.first().unwrap().as_quantity().unwrap();
    assert_eq!(q.value, dec("4.5"));
    assert_eq!(&*q.unit, "mg");
}

// ============================================
// Arithmetic Operations
// ============================================

#[test]
fn test_arithmetic() {
    assert_eq!(eval_empty("1 + 2").as_integer().unwrap(), 3);
    assert_eq!(eval_empty("1.5 + 2.5").as_decimal().unwrap(), dec("4.0"));
    assert_eq!(eval_empty("5 - 3").as_integer().unwrap(), 2);
    assert_eq!(eval_empty("3 * 4").as_integer().unwrap(), 12);

    // Division always produces a Decimal
    let result = eval_empty("10 / 4");
    assert_eq!(result.first().unwrap().type_name(), "Decimal");
    assert_eq!(result.as_decimal().unwrap(), dec("2.5"));

    assert_eq!(eval_empty("10 div 3").as_integer().unwrap(), 3);
    assert_eq!(eval_empty("10 mod 3").as_integer().unwrap(), 1);
    assert_eq!(eval_empty("-7 mod 3").as_integer().unwrap(), -1);
    assert_eq!(eval_empty("1 + 2.5").as_decimal().unwrap(), dec("3.5"));
    assert_eq!(&*eval_empty("'ab' + 'cd'").as_string().unwrap(), "abcd");
}

#[test]
fn test_string_concatenation() {
    assert_eq!(&*eval_empty("'a' & 'b'").as_string().unwrap(), "ab");
    assert_eq!(&*eval_empty("'a' & {}").as_string().unwrap(), "a");
    assert_eq!(&*eval_empty("{} & {}").as_string().unwrap(), "");
    assert!(eval_empty("'a' + {}").is_empty());
}

#[test]
fn test_quantity_arithmetic() {
    let result = eval_empty("2 'mg' + 3 'mg'");
    let q = result.first().unwrap().as_quantity().unwrap();
    assert_eq!(q.value, dec("5"));
    assert_eq!(&*q.unit, "mg");

    let result = eval_empty("2 'mg' * 3");
    assert_eq!(result.first().unwrap().as_quantity().unwrap().value, dec("6"));

    assert!(eval_empty("2 'mg' < 3 'mg'").as_boolean().unwrap());
    assert!(eval_empty("1 day = 1 'd'").as_boolean().unwrap());
    assert!(eval_empty("1 year ~ 1 'a'").as_boolean().unwrap());
    assert!(!eval_empty("1 year = 1 'a'").as_boolean().unwrap());
}

#[test]
fn test_date_arithmetic() {
    let result = eval_empty("@2019-01-31 + 1 month");
    assert_eq!(result.first().unwrap().to_string(), "2019-02-28");

    let result = eval_empty("@2019-03-01 - 1 day");
    assert_eq!(result.first().unwrap().to_string(), "2019-02-28");

    let result = eval_empty("@2019-01-01T10:00:00 + 90 minutes");
    assert_eq!(
        result.first().unwrap().as_datetime().unwrap().value.to_string(),
        "2019-01-01 11:30:00"
    );

    let result = eval_empty("@T23:30 + 1 hour");
    assert_eq!(result.first().unwrap().to_string(), "00:30");

    assert!(matches!(
        eval_err("@2019-01-01 + 3 hours"),
        Error::TypeMismatch(_)
    ));
}

// ============================================
// Comparison Operations
// ============================================

#[test]
fn test_comparison() {
    assert!(eval_empty("1 < 2").as_boolean().unwrap());
    assert!(!eval_empty("2 < 1").as_boolean().unwrap());
    assert!(eval_empty("1 <= 2").as_boolean().unwrap());
    assert!(eval_empty("2 <= 2").as_boolean().unwrap());
    assert!(eval_empty("3 > 2").as_boolean().unwrap());
    assert!(eval_empty("3 >= 3").as_boolean().unwrap());
    assert!(eval_empty("1 < 1.5").as_boolean().unwrap());
    assert!(eval_empty("'abc' < 'abd'").as_boolean().unwrap());
    assert!(eval_empty("@2018-03-01 < @2018-03-02").as_boolean().unwrap());

    // Different precision is ambiguous
    assert!(eval_empty("@2018-03 < @2018-03-02").is_empty());
    assert!(eval_empty("{} < 1").is_empty());

    assert!(matches!(eval_err("1 < 'a'"), Error::TypeMismatch(_)));
    assert!(matches!(eval_err("(1 | 2) < 3"), Error::InvalidOperand(_)));
}

// ============================================
// Equality Operations
// ============================================

#[test]
fn test_equality() {
    assert!(eval_empty("1 = 1").as_boolean().unwrap());
    assert!(!eval_empty("1 = 2").as_boolean().unwrap());
    assert!(eval_empty("1 != 2").as_boolean().unwrap());
    assert!(!eval_empty("1 != 1").as_boolean().unwrap());
    assert!(eval_empty("1 = 1.0").as_boolean().unwrap());
    assert!(!eval_empty("1 = 'a'").as_boolean().unwrap());
    assert!(eval_empty("{} = 1").is_empty());
    assert!(eval_empty("{1, 2} = {1, 2}").as_boolean().unwrap());
    assert!(!eval_empty("{1, 2} = {2, 1}").as_boolean().unwrap());
    assert!(!eval_empty("{1, 2} = {1}").as_boolean().unwrap());
    assert!(eval_empty("@2012-04-15 = @2012-04-15T10:00").is_empty());
}

#[test]
fn test_equivalence() {
    assert!(eval_empty("'Hello  World' ~ 'hello world'").as_boolean().unwrap());
    assert!(eval_empty("{} ~ {}").as_boolean().unwrap());
    assert!(!eval_empty("{} ~ 1").as_boolean().unwrap());
    assert!(eval_empty("{1, 2} ~ {2, 1}").as_boolean().unwrap());
    assert!(eval_empty("1.2 ~ 1.24").as_boolean().unwrap());
    assert!(eval_empty("'a' !~ 'b'").as_boolean().unwrap());
}

// ============================================
// Boolean Operations
// ============================================

#[test]
fn test_boolean_ops() {
    assert!(eval_empty("true and true").as_boolean().unwrap());
    assert!(!eval_empty("true and false").as_boolean().unwrap());
    assert!(eval_empty("true or false").as_boolean().unwrap());
    assert!(!eval_empty("false or false").as_boolean().unwrap());
    assert!(eval_empty("true xor false").as_boolean().unwrap());
    assert!(!eval_empty("true xor true").as_boolean().unwrap());

    // Not - called on collection
    assert!(!eval_empty("true.not()").as_boolean().unwrap());
    assert!(eval_empty("false.not()").as_boolean().unwrap());
}

#[test]
fn test_three_valued_logic() {
    assert!(eval_empty("{} and true").is_empty());
    assert!(!eval_empty("{} and false").as_boolean().unwrap());
    assert!(eval_empty("{} or true").as_boolean().unwrap());
    assert!(eval_empty("{} or false").is_empty());
    assert!(eval_empty("{} xor true").is_empty());
    assert!(eval_empty("false implies {}").as_boolean().unwrap());
    assert!(eval_empty("{} implies true").as_boolean().unwrap());
    assert!(eval_empty("true implies {}").is_empty());

    // A non-boolean singleton counts as true
    assert!(eval_empty("5 and true").as_boolean().unwrap());
    assert!(matches!(eval_err("(1 | 2) and true"), Error::InvalidOperand(_)));
}

// ============================================
// Unary Operations
// ============================================

#[test]
fn test_unary() {
    assert_eq!(eval_empty("-5").as_integer().unwrap(), -5);
    assert_eq!(eval_empty("-(-5)").as_integer().unwrap(), 5);
    assert_eq!(eval_empty("+5").as_integer().unwrap(), 5);
}

// ============================================
// Membership
// ============================================

#[test]
fn test_membership() {
    assert!(eval_empty("2 in (1 | 2 | 3)").as_boolean().unwrap());
    assert!(!eval_empty("5 in (1 | 2 | 3)").as_boolean().unwrap());
    assert!(eval_empty("(1 | 2 | 3) contains 3").as_boolean().unwrap());
    assert!(!eval_empty("2 in {}").as_boolean().unwrap());
    assert!(eval_empty("{} in (1 | 2)").is_empty());
}

// ============================================
// Existence Functions
// ============================================

#[test]
fn test_existence_functions() {
    assert!(!eval_empty("1.empty()").as_boolean().unwrap());
    assert!(eval_empty("{}.empty()").as_boolean().unwrap());
    assert!(eval_empty("1.exists()").as_boolean().unwrap());
    assert!(eval_empty("(1 | 2 | 3).exists($this > 2)").as_boolean().unwrap());
    assert_eq!(eval_empty("1.count()").as_integer().unwrap(), 1);
    assert_eq!(eval_empty("{}.count()").as_integer().unwrap(), 0);
    assert!(eval_empty("(1 | 2 | 3).all($this > 0)").as_boolean().unwrap());
    assert!(eval_empty("{}.all(false)").as_boolean().unwrap());
    assert!(eval_empty("(1 | 2).subsetOf(1 | 2 | 3)").as_boolean().unwrap());
    assert!(eval_empty("(1 | 2 | 3).supersetOf(2)").as_boolean().unwrap());
    assert_eq!(eval_empty("{1, 1, 2}.distinct()"), integers(&[1, 2]));
    assert!(!eval_empty("{1, 1, 2}.isDistinct()").as_boolean().unwrap());
}

#[test]
fn test_boolean_aggregation() {
    assert!(eval_empty("{}.allTrue()").as_boolean().unwrap());
    assert!(eval_empty("{}.allFalse()").as_boolean().unwrap());
    assert!(!eval_empty("{}.anyTrue()").as_boolean().unwrap());
    assert!(!eval_empty("{}.anyFalse()").as_boolean().unwrap());
    assert!(eval_empty("(true | false).anyTrue()").as_boolean().unwrap());
    assert!(!eval_empty("{true, true, 1}.allTrue()").as_boolean().unwrap());
    assert!(!eval_empty("{false, 'x'}.allFalse()").as_boolean().unwrap());
}

// ============================================
// Subsetting
// ============================================

#[test]
fn test_subsetting() {
    assert!(eval_empty("{}.first()").is_empty());
    assert_eq!(eval_empty("1.first()").as_integer().unwrap(), 1);
    assert_eq!(eval_empty("1.last()").as_integer().unwrap(), 1);
    assert_eq!(eval_empty("1.single()").as_integer().unwrap(), 1);
    assert_eq!(eval_empty("(1 | 2 | 3).tail()"), integers(&[2, 3]));
    assert_eq!(eval_empty("(1 | 2 | 3).skip(1)"), integers(&[2, 3]));
    assert_eq!(eval_empty("(1 | 2 | 3).take(2)"), integers(&[1, 2]));
    assert!(eval_empty("(1 | 2 | 3).take(-1)").is_empty());
    assert_eq!(eval_empty("(1 | 2 | 3).intersect(2 | 3 | 4)"), integers(&[2, 3]));
    assert_eq!(eval_empty("(1 | 2 | 3).exclude(2)"), integers(&[1, 3]));
    assert!(eval_empty("(1 | 2 | 3)[5]").is_empty());
    assert!(matches!(eval_err("(1 | 2).single()"), Error::InvalidOperand(_)));
}

// ============================================
// String Functions
// ============================================

#[test]
fn test_string_functions() {
    assert_eq!(&*eval_empty("42.toString()").as_string().unwrap(), "42");
    assert_eq!(&*eval_empty("true.toString()").as_string().unwrap(), "true");
    assert_eq!(eval_empty("'hello'.length()").as_integer().unwrap(), 5);
    assert_eq!(&*eval_empty("'hello'.upper()").as_string().unwrap(), "HELLO");
    assert_eq!(&*eval_empty("'HELLO'.lower()").as_string().unwrap(), "hello");
    assert!(eval_empty("'hello'.startsWith('he')").as_boolean().unwrap());
    assert!(!eval_empty("'hello'.startsWith('lo')").as_boolean().unwrap());
    assert!(eval_empty("'hello'.endsWith('lo')").as_boolean().unwrap());
    assert!(eval_empty("'hello'.contains('ell')").as_boolean().unwrap());
    assert!(!eval_empty("'hello'.contains('xyz')").as_boolean().unwrap());
    assert_eq!(eval_empty("'abcdefg'.indexOf('bc')").as_integer().unwrap(), 1);
    assert_eq!(&*eval_empty("'abcdefg'.substring(3, 2)").as_string().unwrap(), "de");
    assert_eq!(&*eval_empty("'abc'.replace('b', 'x')").as_string().unwrap(), "axc");
    assert_eq!(&*eval_empty("'  pad '.trim()").as_string().unwrap(), "pad");
    assert_eq!(strings(&eval_empty("'a,b,c'.split(',')")), vec!["a", "b", "c"]);
    assert_eq!(&*eval_empty("('a' | 'b').join('-')").as_string().unwrap(), "a-b");
    assert_eq!(eval_empty("'abc'.toChars()").len(), 3);
}

#[test]
fn test_string_functions_reject_collections() {
    assert!(eval_empty("{}.upper()").is_empty());
    assert!(matches!(eval_err("('a' | 'b').upper()"), Error::InvalidOperand(_)));
    assert!(matches!(eval_err("1.startsWith('1')"), Error::InvalidOperand(_)));
}

#[test]
fn test_regex_functions() {
    assert!(eval_empty("'abc123'.matches('[a-z]+[0-9]+')").as_boolean().unwrap());
    assert!(!eval_empty("'abc123'.matches('[a-z]+')").as_boolean().unwrap());
    assert!(eval_empty("'abc'.matchesFull('a.c')").as_boolean().unwrap());
    assert_eq!(
        &*eval_empty("'2020-01-02'.replaceMatches('(\\\\d+)-(\\\\d+)-(\\\\d+)', '$3/$2/$1')")
            .as_string()
            .unwrap(),
        "02/01/2020"
    );
    assert!(matches!(
        eval_err("('a' | 'b').matches('a')"),
        Error::InvalidOperand(_)
    ));
    assert!(matches!(eval_err("'a'.matches('(')"), Error::InvalidOperand(_)));
}

// ============================================
// Filtering and Projection
// ============================================

#[test]
fn test_where() {
    assert!(eval_empty("(1 | 2 | 3).where(false)").is_empty());
    assert_eq!(eval_empty("(1 | 2 | 3).where(true)").len(), 3);
    assert_eq!(eval_empty("(1 | 2 | 3).where($this > 1)"), integers(&[2, 3]));
    assert!(eval_empty("(1 | 2 | 3).where($this > 10)").is_empty());
    assert!(eval_empty("{}.where($this > 1)").is_empty());
    assert_eq!(
        eval_empty("('hello' | 'world' | '').where($this.length() > 0)").len(),
        2
    );
    assert_eq!(eval_empty("{1, 2, 3, 2}.where($this = 2)").len(), 2);
    assert_eq!(eval_empty("(10 | 20 | 30).where($index > 0)"), integers(&[20, 30]));
}

#[test]
fn test_select() {
    assert_eq!(eval_empty("(1 | 2 | 3).select($this * 2)"), integers(&[2, 4, 6]));
    assert!(eval_empty("{}.select($this * 2)").is_empty());
    assert_eq!(
        strings(&eval_empty("(1 | 2 | 3).select($this.toString())")),
        vec!["1", "2", "3"]
    );
    // Projections flatten
    assert_eq!(eval_empty("(1 | 2).select({$this, $this})").len(), 4);
}

#[test]
fn test_repeat() {
    assert!(eval_empty("{}.repeat($this)").is_empty());
    assert_eq!(eval_empty("1.repeat($this)"), integers(&[1]));
    assert_eq!(eval_empty("(1 | 2 | 3).repeat($this)"), integers(&[1, 2, 3]));
    assert_eq!(
        eval_empty("1.repeat(iif($this < 4, $this + 1, {}))"),
        integers(&[2, 3, 4])
    );
}

#[test]
fn test_filtering_functions() {
    assert_eq!(eval_empty("(1 | 'hello' | 2).ofType(Integer)").len(), 2);
    assert_eq!(eval_empty("(1 | 'hello' | 2).ofType(System.String)").len(), 1);
    assert!(eval_empty("1.extension('http://example.org/extension')").is_empty());
}

// ============================================
// Conversion Functions
// ============================================

#[test]
fn test_conversion_functions() {
    assert!(eval_empty("true.toBoolean()").as_boolean().unwrap());
    assert!(!eval_empty("false.toBoolean()").as_boolean().unwrap());
    assert!(eval_empty("1.toBoolean()").as_boolean().unwrap());
    assert!(!eval_empty("0.toBoolean()").as_boolean().unwrap());
    assert!(eval_empty("2.toBoolean()").is_empty());
    assert!(eval_empty("'true'.toBoolean()").as_boolean().unwrap());
    assert!(!eval_empty("'false'.toBoolean()").as_boolean().unwrap());
    assert!(eval_empty("'yes'.toBoolean()").as_boolean().unwrap());
    assert!(!eval_empty("'no'.toBoolean()").as_boolean().unwrap());

    assert!(eval_empty("true.convertsToBoolean()").as_boolean().unwrap());
    assert!(!eval_empty("2.convertsToBoolean()").as_boolean().unwrap());
    assert!(!eval_empty("'invalid'.convertsToBoolean()").as_boolean().unwrap());

    assert_eq!(eval_empty("42.toInteger()").as_integer().unwrap(), 42);
    assert!(eval_empty("3.14.toInteger()").is_empty());
    assert_eq!(eval_empty("'42'.toInteger()").as_integer().unwrap(), 42);
    assert!(eval_empty("'3.14'.toInteger()").is_empty());
    assert!(eval_empty("'42'.convertsToInteger()").as_boolean().unwrap());
    assert!(!eval_empty("'invalid'.convertsToInteger()").as_boolean().unwrap());

    assert_eq!(eval_empty("42.toDecimal()").as_decimal().unwrap(), dec("42"));
    assert_eq!(eval_empty("'3.14'.toDecimal()").as_decimal().unwrap(), dec("3.14"));
    assert!(!eval_empty("'invalid'.convertsToDecimal()").as_boolean().unwrap());

    assert_eq!(
        eval_empty("'2019-02-03'.toDate()").first().unwrap().type_name(),
        "Date"
    );
    assert!(eval_empty("'14:30:00'.convertsToTime()").as_boolean().unwrap());
    assert_eq!(
        eval_empty("'3 days'.toQuantity()").first().unwrap().type_name(),
        "Quantity"
    );
    assert!(eval_empty("{}.convertsToInteger()").is_empty());
}

#[test]
fn test_iif() {
    assert_eq!(eval_empty("iif(true, 1, 2)").as_integer().unwrap(), 1);
    assert_eq!(eval_empty("iif(false, 1, 2)").as_integer().unwrap(), 2);
    assert_eq!(&*eval_empty("iif(1 > 0, 'yes', 'no')").as_string().unwrap(), "yes");
    assert_eq!(&*eval_empty("iif(1 < 0, 'yes', 'no')").as_string().unwrap(), "no");
    assert_eq!(eval_empty("iif({}, 1, 2)").as_integer().unwrap(), 2);
    assert!(eval_empty("iif(false, 1)").is_empty());

    // Only the chosen branch is evaluated
    assert_eq!(eval_empty("iif(true, 1, %undefined)").as_integer().unwrap(), 1);
}

// ============================================
// Math Functions
// ============================================

#[test]
fn test_math_functions() {
    assert_eq!(eval_empty("(-5).abs()").as_integer().unwrap(), 5);
    assert_eq!(eval_empty("5.abs()").as_integer().unwrap(), 5);
    assert_eq!(eval_empty("3.7.floor()").as_integer().unwrap(), 3);
    assert_eq!(eval_empty("3.2.ceiling()").as_integer().unwrap(), 4);
    assert_eq!(eval_empty("3.5.round()").as_decimal().unwrap(), dec("4"));
    assert_eq!(eval_empty("3.14159.round(3)").as_decimal().unwrap(), dec("3.142"));
    assert_eq!(eval_empty("3.9.truncate()").as_integer().unwrap(), 3);
    assert_eq!(eval_empty("2.power(3)").as_integer().unwrap(), 8);
    assert_eq!(eval_empty("2.power(-2)").as_decimal().unwrap(), dec("0.25"));
    assert!(eval_empty("0.power(-1)").is_empty());
    assert_eq!(eval_empty("81.sqrt()").as_decimal().unwrap(), dec("9"));
    assert!(eval_empty("(-1).sqrt()").is_empty());
}

// ============================================
// Type Operations
// ============================================

#[test]
fn test_type_operations() {
    assert!(eval_empty("1 is Integer").as_boolean().unwrap());
    assert!(!eval_empty("1 is String").as_boolean().unwrap());
    assert!(eval_empty("'hello' is String").as_boolean().unwrap());
    assert!(eval_empty("'hello' is System.String").as_boolean().unwrap());
    assert_eq!(eval_empty("1 as Integer").as_integer().unwrap(), 1);
    assert!(eval_empty("1 as String").is_empty());

    // Function forms
    assert_eq!(eval_empty("1.as(Integer)").as_integer().unwrap(), 1);
    assert!(eval_empty("1.as(String)").is_empty());
    assert!(eval_empty("1.is(Integer)").as_boolean().unwrap());
    assert!(!eval_empty("1.is(String)").as_boolean().unwrap());
    assert!(eval_empty("@2019.is(Date)").as_boolean().unwrap());
}

// ============================================
// Complex expressions
// ============================================

#[test]
fn test_complex_expressions() {
    assert_eq!(eval_empty("(1 + 2) * 3").as_integer().unwrap(), 9);
    assert_eq!(eval_empty("42.toString().length()").as_integer().unwrap(), 2);
    assert!(eval_empty("(1 < 2) and (3 > 1)").as_boolean().unwrap());
    assert_eq!(eval_empty("{1, 2} | {2, 3}"), integers(&[1, 2, 3]));
}

#[test]
fn test_edge_cases() {
    assert!(eval_empty("{} + 1").is_empty());
    assert!(eval_empty("1 / 0").is_empty());
    assert!(eval_empty("1 div 0").is_empty());
    assert!(eval_empty("1 mod 0").is_empty());
    assert!(eval_empty("9223372036854775807 + 1").is_empty());
}

#[test]
fn test_long_operator_chain_is_rejected() {
    let chain = vec!["1"; 1_500].join(" + ");
    assert!(matches!(eval_err(&chain), Error::ParseError { .. }));

    let path = format!("name{}", ".given".repeat(5_000));
    assert!(matches!(eval_err(&path), Error::ParseError { .. }));

    // The engine is still usable afterwards
    assert_eq!(eval_empty(&vec!["1"; 150].join(" + ")).as_integer().unwrap(), 150);
}

#[test]
fn test_combine() {
    assert_eq!(eval_empty("(1 | 2).combine(3 | 4)").len(), 4);
    assert_eq!(eval_empty("(1 | 1 | 2).combine(2 | 3)").len(), 4);
    assert_eq!(eval_empty("{}.combine(1 | 2)").len(), 2);
    assert_eq!(eval_empty("(1 | 2).combine({})").len(), 2);
    assert!(eval_empty("{}.combine({})").is_empty());
    assert_eq!(eval_empty("(1 | 2).union(2 | 3)"), integers(&[1, 2, 3]));
}

#[test]
fn test_aggregate() {
    assert_eq!(
        eval_empty("(1 | 2 | 3).aggregate($this + $total, 0)").as_integer().unwrap(),
        6
    );
    assert_eq!(
        eval_empty("(1 | 2 | 3).aggregate($total + 1, 0)").as_integer().unwrap(),
        3
    );
    assert_eq!(
        eval_empty("{}.aggregate($this + $total, 42)").as_integer().unwrap(),
        42
    );
    assert!(eval_empty("{}.aggregate($this + $total)").is_empty());
    assert_eq!(
        eval_empty("(3 | 7 | 5).aggregate(iif($total.empty() or $this > $total, $this, $total))")
            .as_integer()
            .unwrap(),
        7
    );
}

#[test]
fn test_function_errors() {
    assert!(matches!(eval_err("1.foo()"), Error::UnknownFunction(_)));
    assert!(matches!(
        eval_err("'a'.substring()"),
        Error::InvalidArity { actual: 0, .. }
    ));
    // Arity is checked before arguments are evaluated
    assert!(matches!(
        eval_err("1.count(%undefined)"),
        Error::InvalidArity { .. }
    ));
}

#[test]
fn test_utility_functions() {
    assert_eq!(eval_empty("(1 | 2).trace('items')"), integers(&[1, 2]));
    assert_eq!(eval_empty("(1 | 2).trace('doubled', $this * 2)"), integers(&[1, 2]));
    assert_eq!(eval_empty("now()").first().unwrap().type_name(), "DateTime");
    assert_eq!(eval_empty("today()").first().unwrap().type_name(), "Date");
    assert_eq!(eval_empty("timeOfDay()").first().unwrap().type_name(), "Time");
}

// ============================================
// Resource navigation
// ============================================

#[test]
fn test_type_name_resolution() {
    let patient = patient_json();
    let given = eval_json("Patient.name.given", &patient);
    assert_eq!(strings(&given), vec!["Peter", "James", "Jim", "Peter", "James"]);
    assert_eq!(eval_json("name.given", &patient), given);
    assert!(eval_json("Observation.name", &patient).is_empty());
    assert!(eval_json("Patient.nonexistentField", &patient).is_empty());
}

#[test]
fn test_resource_paths() {
    let ctx = patient_context();
    assert_eq!(
        strings(&eval("name.where(use = 'official').family", &ctx)),
        vec!["Chalmers"]
    );
    assert_eq!(
        strings(&eval("name.given.distinct()", &ctx)),
        vec!["Peter", "James", "Jim"]
    );
    assert_eq!(eval("telecom.where(system = 'phone').count()", &ctx).as_integer().unwrap(), 2);
    assert_eq!(
        strings(&eval("name[1].given", &ctx)),
        vec!["Jim"]
    );
    assert!(eval("active", &ctx).as_boolean().unwrap());
    assert!(!eval("deceased", &ctx).as_boolean().unwrap());
    assert!(eval("birthDate = @1974-12-25", &ctx).as_boolean().unwrap());
    assert!(eval("birthDate < @2000-01-01", &ctx).as_boolean().unwrap());
    assert!(eval("telecom.rank.select($this * 10).exists($this = 20)", &ctx).as_boolean().unwrap());
}

#[test]
fn test_resource_functions() {
    let ctx = patient_context();
    let ext = eval(
        "extension('http://example.org/fhir/StructureDefinition/eye-colour').value",
        &ctx,
    );
    assert_eq!(strings(&ext), vec!["blue"]);
    assert!(eval("children().count() > 5", &ctx).as_boolean().unwrap());
    assert!(eval("descendants().where($this = 'Windsor').exists()", &ctx)
        .as_boolean()
        .unwrap());
    assert!(eval("name.all(given.exists())", &ctx).as_boolean().unwrap());
    assert!(eval("name.select(given.first()).isDistinct().not()", &ctx)
        .as_boolean()
        .unwrap());
}

#[test]
fn test_evaluate_many_is_order_independent() {
    let engine = engine();
    let expression = engine.compile("name.given.count()").unwrap();
    let patient = patient_context();
    let empty = ferrum_path::Context::empty();

    let first = engine.evaluate(&expression, &patient).unwrap();
    let second = engine.evaluate(&expression, &empty).unwrap();
    let third = engine.evaluate(&expression, &patient).unwrap();
    assert_eq!(first, third);
    assert_eq!(second.as_integer().unwrap(), 0);
}
