//! Filtering and projection functions for FHIRPath.
//!
//! `where()`, `select()` and `repeat()` evaluate their argument once per
//! input item with `$this` and `$index` rebound; `ofType()` and
//! `extension()` filter without a lambda.

use std::collections::VecDeque;

use crate::ast::AstNode;
use crate::context::Context;
use crate::error::Result;
use crate::eval::Evaluator;
use crate::types::TypeSpecifier;
use crate::value::{Collection, Node, PrimitiveValue};

use super::helpers::{eval_for_item, predicate_holds, string_arg};

pub fn where_func(
    evaluator: &Evaluator<'_>,
    collection: Collection,
    criteria: &AstNode,
    ctx: &Context,
) -> Result<Collection> {
    let mut result = Collection::with_capacity(collection.len());
    for (index, item) in collection.into_iter().enumerate() {
        let matched = eval_for_item(evaluator, criteria, ctx, &item, index)?;
        if predicate_holds(&matched, "where")? {
            result.push(item);
        }
    }
    Ok(result)
}

pub fn select_func(
    evaluator: &Evaluator<'_>,
    collection: Collection,
    projection: &AstNode,
    ctx: &Context,
) -> Result<Collection> {
    let mut result = Collection::with_capacity(collection.len());
    for (index, item) in collection.iter().enumerate() {
        result.extend(eval_for_item(evaluator, projection, ctx, item, index)?);
    }
    Ok(result)
}

/// Apply `projection` to the input, then to each new result, until nothing
/// new appears
///
/// Items already in the output are not expanded again, which keeps cyclic
/// projections finite.
pub fn repeat(
    evaluator: &Evaluator<'_>,
    collection: Collection,
    projection: &AstNode,
    ctx: &Context,
) -> Result<Collection> {
    let mut result = Collection::empty();
    let mut queue: VecDeque<Node> = collection.into_iter().collect();
    let mut index = 0;

    while let Some(item) = queue.pop_front() {
        for produced in eval_for_item(evaluator, projection, ctx, &item, index)? {
            if !result.contains_node(&produced) {
                result.push(produced.clone());
                queue.push_back(produced);
            }
        }
        index += 1;
    }
    Ok(result)
}

pub fn of_type(collection: Collection, type_specifier: &TypeSpecifier) -> Result<Collection> {
    Ok(collection
        .into_iter()
        .filter(|item| type_specifier.matches(item))
        .collect())
}

/// Extensions of each item whose `url` equals the argument
pub fn extension(collection: Collection, url: &Collection) -> Result<Collection> {
    let Some(url) = string_arg(url, "extension")? else {
        return Ok(Collection::empty());
    };

    let mut result = Collection::empty();
    for item in &collection {
        for ext in item.children("extension") {
            let matches = ext.children("url").iter().any(|u| {
                matches!(u.primitive_value(), Some(PrimitiveValue::String(s)) if s == url)
            });
            if matches {
                result.push(ext);
            }
        }
    }
    Ok(result)
}
