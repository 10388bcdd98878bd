//! Function implementations for the evaluator
//!
//! Implementations are organized by category in submodules; this module holds
//! the dispatcher. Arity is checked by the registry before dispatch, so the
//! argument accessors below only fail on a registry/dispatcher mismatch.
//!
//! Arguments reach implementations in one of three forms:
//! - evaluated eagerly against the calling context (`substring(1, 2)`),
//! - as an expression evaluated per input item (`where(...)`, `select(...)`),
//! - as a type name taken from the syntax (`ofType(Patient)`).

mod aggregate;
mod combining;
mod conversion;
mod existence;
mod filtering;
mod helpers;
mod math;
mod navigation;
mod string;
mod subsetting;
mod type_op;
mod utility;

use aggregate::aggregate;
use combining::{combine, union_func};
use conversion::{
    converts_to_boolean, converts_to_date, converts_to_datetime, converts_to_decimal,
    converts_to_integer, converts_to_quantity, converts_to_string, converts_to_time, iif,
    to_boolean, to_date, to_datetime, to_decimal, to_integer, to_quantity, to_string, to_time,
};
use existence::{
    all, all_false, all_true, any_false, any_true, count, distinct, empty, exists, has_value,
    is_distinct, subset_of, superset_of,
};
use filtering::{extension, of_type, repeat, select_func, where_func};
use math::{abs, ceiling, exp, floor, ln, log, power, round, sqrt, truncate};
use navigation::{children, descendants};
use string::{
    contains_str, ends_with, index_of, join, last_index_of, length, lower, matches, matches_full,
    replace, replace_matches, split, starts_with, substring, to_chars, trim, upper,
};
use subsetting::{exclude, first, intersect, last, single, skip, tail, take};
use type_op::{as_type, is_type, not};
use utility::{now, time_of_day, today, trace};

use crate::ast::AstNode;
use crate::context::Context;
use crate::error::{Error, Result};
use crate::eval::Evaluator;
use crate::functions::FunctionId;
use crate::value::Collection;

use helpers::type_argument;

/// Execute a function call by dispatching to the appropriate implementation
///
/// `collection` is the already evaluated input (the invocation target, or
/// `$this` for a call without one).
pub(crate) fn execute_function(
    evaluator: &Evaluator<'_>,
    func_id: FunctionId,
    collection: Collection,
    args: &[AstNode],
    ctx: &Context,
) -> Result<Collection> {
    let arg = |i: usize| argument(args, i, func_id);
    let eval_arg = |i: usize| evaluator.eval(argument(args, i, func_id)?, ctx);
    let eval_optional = |i: usize| {
        args.get(i)
            .map(|arg| evaluator.eval(arg, ctx))
            .transpose()
    };

    match func_id {
        // Boolean / type functions
        FunctionId::Not => not(collection),
        FunctionId::Is => is_type(collection, &type_argument(arg(0)?, "is")?),
        FunctionId::As => as_type(collection, &type_argument(arg(0)?, "as")?),

        // Existence functions
        FunctionId::Empty => empty(collection),
        FunctionId::Exists => exists(evaluator, collection, args.first(), ctx),
        FunctionId::All => all(evaluator, collection, arg(0)?, ctx),
        FunctionId::AllTrue => all_true(collection),
        FunctionId::AnyTrue => any_true(collection),
        FunctionId::AllFalse => all_false(collection),
        FunctionId::AnyFalse => any_false(collection),
        FunctionId::SubsetOf => subset_of(collection, &eval_arg(0)?),
        FunctionId::SupersetOf => superset_of(collection, &eval_arg(0)?),
        FunctionId::Count => count(collection),
        FunctionId::Distinct => distinct(collection),
        FunctionId::IsDistinct => is_distinct(collection),
        FunctionId::HasValue => has_value(collection),

        // Filtering and projection functions
        FunctionId::Where => where_func(evaluator, collection, arg(0)?, ctx),
        FunctionId::Select => select_func(evaluator, collection, arg(0)?, ctx),
        FunctionId::Repeat => repeat(evaluator, collection, arg(0)?, ctx),
        FunctionId::OfType => of_type(collection, &type_argument(arg(0)?, "ofType")?),
        FunctionId::Extension => extension(collection, &eval_arg(0)?),

        // Subsetting functions
        FunctionId::Single => single(collection),
        FunctionId::First => first(collection),
        FunctionId::Last => last(collection),
        FunctionId::Tail => tail(collection),
        FunctionId::Skip => skip(collection, &eval_arg(0)?),
        FunctionId::Take => take(collection, &eval_arg(0)?),
        FunctionId::Intersect => intersect(collection, &eval_arg(0)?),
        FunctionId::Exclude => exclude(collection, &eval_arg(0)?),

        // Combining functions
        FunctionId::Union => union_func(collection, &eval_arg(0)?),
        FunctionId::Combine => combine(collection, &eval_arg(0)?),

        // Conversion functions
        FunctionId::Iif => iif(evaluator, collection, arg(0)?, arg(1)?, args.get(2), ctx),
        FunctionId::ToBoolean => to_boolean(collection),
        FunctionId::ConvertsToBoolean => converts_to_boolean(collection),
        FunctionId::ToInteger => to_integer(collection),
        FunctionId::ConvertsToInteger => converts_to_integer(collection),
        FunctionId::ToDecimal => to_decimal(collection),
        FunctionId::ConvertsToDecimal => converts_to_decimal(collection),
        FunctionId::ToString => to_string(collection),
        FunctionId::ConvertsToString => converts_to_string(collection),
        FunctionId::ToDate => to_date(collection),
        FunctionId::ConvertsToDate => converts_to_date(collection),
        FunctionId::ToDateTime => to_datetime(collection),
        FunctionId::ConvertsToDateTime => converts_to_datetime(collection),
        FunctionId::ToTime => to_time(collection),
        FunctionId::ConvertsToTime => converts_to_time(collection),
        FunctionId::ToQuantity => to_quantity(collection, eval_optional(0)?.as_ref()),
        FunctionId::ConvertsToQuantity => {
            converts_to_quantity(collection, eval_optional(0)?.as_ref())
        }

        // String functions
        FunctionId::IndexOf => index_of(collection, &eval_arg(0)?),
        FunctionId::LastIndexOf => last_index_of(collection, &eval_arg(0)?),
        FunctionId::Substring => {
            substring(collection, &eval_arg(0)?, eval_optional(1)?.as_ref())
        }
        FunctionId::StartsWith => starts_with(collection, &eval_arg(0)?),
        FunctionId::EndsWith => ends_with(collection, &eval_arg(0)?),
        FunctionId::Contains => contains_str(collection, &eval_arg(0)?),
        FunctionId::Upper => upper(collection),
        FunctionId::Lower => lower(collection),
        FunctionId::Replace => replace(collection, &eval_arg(0)?, &eval_arg(1)?),
        FunctionId::Matches => matches(collection, &eval_arg(0)?),
        FunctionId::MatchesFull => matches_full(collection, &eval_arg(0)?),
        FunctionId::ReplaceMatches => {
            replace_matches(collection, &eval_arg(0)?, &eval_arg(1)?)
        }
        FunctionId::Length => length(collection),
        FunctionId::ToChars => to_chars(collection),
        FunctionId::Trim => trim(collection),
        FunctionId::Split => split(collection, &eval_arg(0)?),
        FunctionId::Join => join(collection, eval_optional(0)?.as_ref()),

        // Math functions
        FunctionId::Abs => abs(collection),
        FunctionId::Ceiling => ceiling(collection),
        FunctionId::Exp => exp(collection),
        FunctionId::Floor => floor(collection),
        FunctionId::Ln => ln(collection),
        FunctionId::Log => log(collection, &eval_arg(0)?),
        FunctionId::Power => power(collection, &eval_arg(0)?),
        FunctionId::Round => round(collection, eval_optional(0)?.as_ref()),
        FunctionId::Sqrt => sqrt(collection),
        FunctionId::Truncate => truncate(collection),

        // Tree navigation functions
        FunctionId::Children => children(collection),
        FunctionId::Descendants => descendants(collection),

        // Utility functions
        FunctionId::Trace => trace(evaluator, collection, &eval_arg(0)?, args.get(1), ctx),
        FunctionId::Now => now(),
        FunctionId::Today => today(),
        FunctionId::TimeOfDay => time_of_day(),

        // Aggregate functions
        FunctionId::Aggregate => aggregate(evaluator, collection, arg(0)?, args.get(1), ctx),
    }
}

fn argument(args: &[AstNode], index: usize, func_id: FunctionId) -> Result<&AstNode> {
    args.get(index).ok_or_else(|| Error::InvalidArity {
        function: format!("{:?}", func_id),
        min: index + 1,
        max: None,
        actual: args.len(),
    })
}
