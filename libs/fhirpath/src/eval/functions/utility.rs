//! Utility functions for FHIRPath: `trace()` and the clock functions.

use chrono::{Local, Timelike};

use crate::ast::AstNode;
use crate::context::Context;
use crate::error::Result;
use crate::eval::Evaluator;
use crate::value::{
    Collection, DatePrecision, DateTimePrecision, Node, PartialDate, PartialDateTime, PartialTime,
    TimePrecision,
};

use super::helpers::string_arg;

/// Log the input (or a projection of it) and return the input unchanged
pub fn trace(
    evaluator: &Evaluator<'_>,
    collection: Collection,
    name: &Collection,
    projection: Option<&AstNode>,
    ctx: &Context,
) -> Result<Collection> {
    let name = string_arg(name, "trace")?;
    let name = name.as_deref().unwrap_or("trace");

    match projection {
        Some(projection) => {
            let projected = evaluator.eval(projection, &ctx.with_this(collection.clone()))?;
            tracing::debug!(trace = name, items = projected.len(), "fhirpath trace: {}", projected);
        }
        None => {
            tracing::debug!(trace = name, items = collection.len(), "fhirpath trace: {}", collection);
        }
    }

    Ok(collection)
}

/// Current dateTime with the local offset, to millisecond precision
pub fn now() -> Result<Collection> {
    let now = Local::now();
    let value = now.naive_local();
    let value = value
        .with_nanosecond(value.nanosecond() / 1_000_000 * 1_000_000)
        .unwrap_or(value);
    Ok(Collection::singleton(Node::datetime(PartialDateTime {
        value,
        precision: DateTimePrecision::Millisecond,
        offset: Some(now.offset().local_minus_utc()),
    })))
}

pub fn today() -> Result<Collection> {
    Ok(Collection::singleton(Node::date(PartialDate {
        value: Local::now().date_naive(),
        precision: DatePrecision::Day,
    })))
}

pub fn time_of_day() -> Result<Collection> {
    let time = Local::now().time();
    let value = time
        .with_nanosecond(time.nanosecond() / 1_000_000 * 1_000_000)
        .unwrap_or(time);
    Ok(Collection::singleton(Node::time(PartialTime {
        value,
        precision: TimePrecision::Millisecond,
    })))
}
