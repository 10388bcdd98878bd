//! Aggregate function implementation for FHIRPath.
//!
//! The aggregate function applies an aggregator expression to each item in a collection,
//! accumulating results into a single value.

use crate::ast::AstNode;
use crate::context::Context;
use crate::error::Result;
use crate::eval::Evaluator;
use crate::value::Collection;

/// `aggregate(aggregator [, init])`
///
/// - `$total` starts as `init` (evaluated once) or `{}` when not provided.
/// - For each element, the aggregator is evaluated with `$this`, `$index`
///   and `$total` in scope; its result becomes the next `$total`.
pub fn aggregate(
    evaluator: &Evaluator<'_>,
    collection: Collection,
    aggregator: &AstNode,
    init: Option<&AstNode>,
    ctx: &Context,
) -> Result<Collection> {
    let mut total = match init {
        Some(init) => evaluator.eval(init, ctx)?,
        None => Collection::empty(),
    };

    for (index, item) in collection.into_iter().enumerate() {
        let item_ctx = ctx.push_iteration(item, index).with_total(total);
        total = evaluator.eval(aggregator, &item_ctx)?;
    }

    Ok(total)
}
