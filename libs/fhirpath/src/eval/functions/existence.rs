//! Existence and collection query functions for FHIRPath.
//!
//! This module implements functions that check collection properties like `empty()`,
//! `exists()`, `all()`, `distinct()`, etc.

use crate::ast::AstNode;
use crate::context::Context;
use crate::error::Result;
use crate::eval::operations::{contains_equal, push_unique};
use crate::eval::Evaluator;
use crate::value::{Collection, Node, PrimitiveValue};

use super::helpers::{boolean, eval_for_item, predicate_holds};

pub fn empty(collection: Collection) -> Result<Collection> {
    boolean(collection.is_empty())
}

pub fn exists(
    evaluator: &Evaluator<'_>,
    collection: Collection,
    criteria: Option<&AstNode>,
    ctx: &Context,
) -> Result<Collection> {
    let Some(criteria) = criteria else {
        return boolean(!collection.is_empty());
    };

    for (index, item) in collection.iter().enumerate() {
        let result = eval_for_item(evaluator, criteria, ctx, item, index)?;
        if predicate_holds(&result, "exists")? {
            return boolean(true);
        }
    }
    boolean(false)
}

pub fn all(
    evaluator: &Evaluator<'_>,
    collection: Collection,
    criteria: &AstNode,
    ctx: &Context,
) -> Result<Collection> {
    for (index, item) in collection.iter().enumerate() {
        let result = eval_for_item(evaluator, criteria, ctx, item, index)?;
        if !predicate_holds(&result, "all")? {
            return boolean(false);
        }
    }
    boolean(true)
}

fn is_boolean(node: &Node, wanted: bool) -> bool {
    matches!(node.primitive_value(), Some(PrimitiveValue::Boolean(b)) if b == wanted)
}

pub fn all_true(collection: Collection) -> Result<Collection> {
    boolean(collection.iter().all(|item| is_boolean(item, true)))
}

pub fn any_true(collection: Collection) -> Result<Collection> {
    boolean(collection.iter().any(|item| is_boolean(item, true)))
}

pub fn all_false(collection: Collection) -> Result<Collection> {
    boolean(collection.iter().all(|item| is_boolean(item, false)))
}

pub fn any_false(collection: Collection) -> Result<Collection> {
    boolean(collection.iter().any(|item| is_boolean(item, false)))
}

pub fn subset_of(collection: Collection, other: &Collection) -> Result<Collection> {
    boolean(collection.iter().all(|item| contains_equal(other, item)))
}

pub fn superset_of(collection: Collection, other: &Collection) -> Result<Collection> {
    boolean(other.iter().all(|item| contains_equal(&collection, item)))
}

pub fn count(collection: Collection) -> Result<Collection> {
    Ok(Collection::singleton(Node::integer(collection.len() as i64)))
}

pub fn distinct(collection: Collection) -> Result<Collection> {
    let mut result = Collection::with_capacity(collection.len());
    for item in collection {
        push_unique(&mut result, item);
    }
    Ok(result)
}

pub fn is_distinct(collection: Collection) -> Result<Collection> {
    let original_len = collection.len();
    let distinct_len = distinct(collection)?.len();
    boolean(original_len == distinct_len)
}

/// A single item carrying a primitive value
pub fn has_value(collection: Collection) -> Result<Collection> {
    boolean(collection.len() == 1 && collection.iter().all(|item| item.primitive_value().is_some()))
}
