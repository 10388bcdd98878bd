//! Shared argument and input handling for function implementations.

use std::sync::Arc;

use crate::ast::AstNode;
use crate::context::Context;
use crate::error::{Error, Result};
use crate::eval::operations::truth_value;
use crate::eval::Evaluator;
use crate::types::TypeSpecifier;
use crate::value::{Collection, Node, PrimitiveValue};

/// Singleton string input; empty input yields `None`
///
/// Several items, or an item that is not a string, is an invalid operand.
pub fn string_input(input: &Collection, function: &str) -> Result<Option<Arc<str>>> {
    match input.singleton_value(function)? {
        None => Ok(None),
        Some(PrimitiveValue::String(s)) => Ok(Some(s)),
        Some(other) => Err(Error::InvalidOperand(format!(
            "{}() requires a String input, got {}",
            function,
            other.type_name()
        ))),
    }
}

/// Singleton string argument; an empty argument yields `None`
pub fn string_arg(arg: &Collection, function: &str) -> Result<Option<Arc<str>>> {
    match arg.singleton_value(function)? {
        None => Ok(None),
        Some(PrimitiveValue::String(s)) => Ok(Some(s)),
        Some(other) => Err(Error::InvalidOperand(format!(
            "{}() requires a String argument, got {}",
            function,
            other.type_name()
        ))),
    }
}

/// Singleton integer argument; an empty argument yields `None`
pub fn integer_arg(arg: &Collection, function: &str) -> Result<Option<i64>> {
    match arg.singleton_value(function)? {
        None => Ok(None),
        Some(PrimitiveValue::Integer(i)) => Ok(Some(i)),
        Some(other) => Err(Error::InvalidOperand(format!(
            "{}() requires an Integer argument, got {}",
            function,
            other.type_name()
        ))),
    }
}

/// Does a per-item criteria result select the item?
///
/// Empty and `false` do not; a non-boolean singleton does.
pub fn predicate_holds(result: &Collection, function: &str) -> Result<bool> {
    Ok(truth_value(result, function)?.unwrap_or(false))
}

/// Evaluate `expr` once for `item` with `$this` and `$index` rebound
pub fn eval_for_item(
    evaluator: &Evaluator<'_>,
    expr: &AstNode,
    ctx: &Context,
    item: &Node,
    index: usize,
) -> Result<Collection> {
    evaluator.eval(expr, &ctx.push_iteration(item.clone(), index))
}

/// Type name argument of `ofType()`, `is()` and `as()`
///
/// The argument is taken from the syntax, never evaluated: `Integer`,
/// `System.Integer`, `FHIR.Patient`.
pub fn type_argument(arg: &AstNode, function: &str) -> Result<TypeSpecifier> {
    match arg {
        AstNode::Identifier(name) => Ok(TypeSpecifier::parse(name)),
        AstNode::Invocation { target, member } => match target.as_ref() {
            AstNode::Identifier(namespace) => {
                Ok(TypeSpecifier::parse(&format!("{}.{}", namespace, member)))
            }
            _ => Err(invalid_type_argument(arg, function)),
        },
        _ => Err(invalid_type_argument(arg, function)),
    }
}

fn invalid_type_argument(arg: &AstNode, function: &str) -> Error {
    Error::InvalidOperand(format!(
        "{}() requires a type name, got '{}'",
        function, arg
    ))
}

pub fn boolean(value: bool) -> Result<Collection> {
    Ok(Collection::boolean(value))
}

pub fn single_value(value: PrimitiveValue) -> Collection {
    Collection::singleton(Node::Primitive(value))
}
