//! Type conversion functions for FHIRPath.
//!
//! Every `toX()` takes a single-item input and returns empty when the value
//! cannot be represented as `X`; the matching `convertsToX()` reports whether
//! that conversion would succeed. `iif()` lives here as well since it is the
//! only conditional.

use std::str::FromStr;

use rust_decimal::Decimal;

use crate::ast::AstNode;
use crate::context::Context;
use crate::error::{Error, Result};
use crate::eval::operations::truth_value;
use crate::eval::Evaluator;
use crate::temporal_parse::{parse_date, parse_datetime, parse_time};
use crate::value::{
    calendar_keyword, Collection, DatePrecision, DateTimePrecision, PartialDate, PrimitiveValue,
    Quantity,
};

use super::helpers::{boolean, single_value, string_arg};

/// `iif(criterion, true-result [, otherwise-result])`
///
/// Only the selected branch is evaluated.
pub fn iif(
    evaluator: &Evaluator<'_>,
    collection: Collection,
    criterion: &AstNode,
    true_result: &AstNode,
    otherwise: Option<&AstNode>,
    ctx: &Context,
) -> Result<Collection> {
    if collection.len() > 1 {
        return Err(Error::InvalidOperand(format!(
            "iif() requires at most one input item, got {}",
            collection.len()
        )));
    }

    let branch_ctx = ctx.with_this(collection);
    let condition = evaluator.eval(criterion, &branch_ctx)?;
    if truth_value(&condition, "iif")?.unwrap_or(false) {
        evaluator.eval(true_result, &branch_ctx)
    } else if let Some(otherwise) = otherwise {
        evaluator.eval(otherwise, &branch_ctx)
    } else {
        Ok(Collection::empty())
    }
}

fn convert(
    collection: &Collection,
    function: &str,
    conversion: fn(&PrimitiveValue) -> Option<PrimitiveValue>,
) -> Result<Collection> {
    Ok(collection
        .singleton_value(function)?
        .and_then(|value| conversion(&value))
        .map(single_value)
        .unwrap_or_default())
}

fn converts(
    collection: &Collection,
    function: &str,
    conversion: fn(&PrimitiveValue) -> Option<PrimitiveValue>,
) -> Result<Collection> {
    match collection.singleton_value(function)? {
        None => Ok(Collection::empty()),
        Some(value) => boolean(conversion(&value).is_some()),
    }
}

// ============================================
// Boolean
// ============================================

fn boolean_value(value: &PrimitiveValue) -> Option<PrimitiveValue> {
    let result = match value {
        PrimitiveValue::Boolean(b) => *b,
        PrimitiveValue::Integer(1) => true,
        PrimitiveValue::Integer(0) => false,
        PrimitiveValue::Decimal(d) if *d == Decimal::ONE => true,
        PrimitiveValue::Decimal(d) if d.is_zero() => false,
        PrimitiveValue::String(s) => match s.to_ascii_lowercase().as_str() {
            "true" | "t" | "yes" | "y" | "1" | "1.0" => true,
            "false" | "f" | "no" | "n" | "0" | "0.0" => false,
            _ => return None,
        },
        _ => return None,
    };
    Some(PrimitiveValue::Boolean(result))
}

pub fn to_boolean(collection: Collection) -> Result<Collection> {
    convert(&collection, "toBoolean", boolean_value)
}

pub fn converts_to_boolean(collection: Collection) -> Result<Collection> {
    converts(&collection, "convertsToBoolean", boolean_value)
}

// ============================================
// Integer and Decimal
// ============================================

/// `[+-]digits` with an optional `.digits` fraction
fn is_decimal_literal(s: &str, allow_fraction: bool) -> bool {
    let unsigned = s.strip_prefix(['+', '-']).unwrap_or(s);
    let (whole, fraction) = match unsigned.split_once('.') {
        Some((whole, fraction)) if allow_fraction => (whole, Some(fraction)),
        Some(_) => return false,
        None => (unsigned, None),
    };
    let digits = |part: &str| !part.is_empty() && part.chars().all(|c| c.is_ascii_digit());
    digits(whole) && fraction.map_or(true, digits)
}

fn parse_decimal(s: &str) -> Option<Decimal> {
    if !is_decimal_literal(s, true) {
        return None;
    }
    Decimal::from_str(s.strip_prefix('+').unwrap_or(s)).ok()
}

fn integer_value(value: &PrimitiveValue) -> Option<PrimitiveValue> {
    match value {
        PrimitiveValue::Integer(i) => Some(PrimitiveValue::Integer(*i)),
        PrimitiveValue::Boolean(b) => Some(PrimitiveValue::Integer(i64::from(*b))),
        PrimitiveValue::String(s) if is_decimal_literal(s, false) => s
            .strip_prefix('+')
            .unwrap_or(s)
            .parse()
            .ok()
            .map(PrimitiveValue::Integer),
        _ => None,
    }
}

fn decimal_value(value: &PrimitiveValue) -> Option<PrimitiveValue> {
    match value {
        PrimitiveValue::Integer(i) => Some(PrimitiveValue::Decimal(Decimal::from(*i))),
        PrimitiveValue::Decimal(d) => Some(PrimitiveValue::Decimal(*d)),
        PrimitiveValue::Boolean(b) => Some(PrimitiveValue::Decimal(if *b {
            Decimal::ONE
        } else {
            Decimal::ZERO
        })),
        PrimitiveValue::String(s) => parse_decimal(s).map(PrimitiveValue::Decimal),
        _ => None,
    }
}

pub fn to_integer(collection: Collection) -> Result<Collection> {
    convert(&collection, "toInteger", integer_value)
}

pub fn converts_to_integer(collection: Collection) -> Result<Collection> {
    converts(&collection, "convertsToInteger", integer_value)
}

pub fn to_decimal(collection: Collection) -> Result<Collection> {
    convert(&collection, "toDecimal", decimal_value)
}

pub fn converts_to_decimal(collection: Collection) -> Result<Collection> {
    converts(&collection, "convertsToDecimal", decimal_value)
}

// ============================================
// String
// ============================================

fn string_value(value: &PrimitiveValue) -> Option<PrimitiveValue> {
    match value {
        PrimitiveValue::String(s) => Some(PrimitiveValue::String(s.clone())),
        other => Some(PrimitiveValue::String(other.to_string().into())),
    }
}

pub fn to_string(collection: Collection) -> Result<Collection> {
    convert(&collection, "toString", string_value)
}

pub fn converts_to_string(collection: Collection) -> Result<Collection> {
    converts(&collection, "convertsToString", string_value)
}

// ============================================
// Temporal
// ============================================

fn date_value(value: &PrimitiveValue) -> Option<PrimitiveValue> {
    match value {
        PrimitiveValue::Date(d) => Some(PrimitiveValue::Date(*d)),
        PrimitiveValue::DateTime(dt) => {
            let precision = match dt.precision {
                DateTimePrecision::Year => DatePrecision::Year,
                DateTimePrecision::Month => DatePrecision::Month,
                _ => DatePrecision::Day,
            };
            Some(PrimitiveValue::Date(PartialDate {
                value: dt.value.date(),
                precision,
            }))
        }
        PrimitiveValue::String(s) => match parse_date(s) {
            Some(date) => Some(PrimitiveValue::Date(date)),
            None => parse_datetime(s).and_then(|dt| date_value(&PrimitiveValue::DateTime(dt))),
        },
        _ => None,
    }
}

fn datetime_value(value: &PrimitiveValue) -> Option<PrimitiveValue> {
    match value {
        PrimitiveValue::Date(_) | PrimitiveValue::DateTime(_) => {
            value.as_datetime().ok().map(PrimitiveValue::DateTime)
        }
        PrimitiveValue::String(s) => parse_datetime(s).map(PrimitiveValue::DateTime),
        _ => None,
    }
}

fn time_value(value: &PrimitiveValue) -> Option<PrimitiveValue> {
    match value {
        PrimitiveValue::Time(t) => Some(PrimitiveValue::Time(*t)),
        PrimitiveValue::String(s) => {
            parse_time(s.strip_prefix('T').unwrap_or(s)).map(PrimitiveValue::Time)
        }
        _ => None,
    }
}

pub fn to_date(collection: Collection) -> Result<Collection> {
    convert(&collection, "toDate", date_value)
}

pub fn converts_to_date(collection: Collection) -> Result<Collection> {
    converts(&collection, "convertsToDate", date_value)
}

pub fn to_datetime(collection: Collection) -> Result<Collection> {
    convert(&collection, "toDateTime", datetime_value)
}

pub fn converts_to_datetime(collection: Collection) -> Result<Collection> {
    converts(&collection, "convertsToDateTime", datetime_value)
}

pub fn to_time(collection: Collection) -> Result<Collection> {
    convert(&collection, "toTime", time_value)
}

pub fn converts_to_time(collection: Collection) -> Result<Collection> {
    converts(&collection, "convertsToTime", time_value)
}

// ============================================
// Quantity
// ============================================

/// `5`, `5 'mg'`, `3 days`
fn parse_quantity(s: &str) -> Option<Quantity> {
    let s = s.trim();
    let split = s
        .find(|c: char| c.is_whitespace() || c == '\'')
        .unwrap_or(s.len());
    let (number, rest) = s.split_at(split);
    let value = parse_decimal(number)?;

    let rest = rest.trim();
    let unit = if rest.is_empty() {
        "1"
    } else if let Some(quoted) = rest.strip_prefix('\'').and_then(|r| r.strip_suffix('\'')) {
        if quoted.is_empty() || quoted.contains('\'') {
            return None;
        }
        quoted
    } else {
        calendar_keyword(rest)?;
        rest
    };
    Some(Quantity::new(value, unit))
}

fn quantity_value(value: &PrimitiveValue) -> Option<Quantity> {
    match value {
        PrimitiveValue::Quantity(q) => Some(q.clone()),
        PrimitiveValue::Integer(_) | PrimitiveValue::Decimal(_) => value.as_quantity().ok(),
        PrimitiveValue::Boolean(b) => Some(Quantity::new(
            if *b { Decimal::ONE } else { Decimal::ZERO },
            "1",
        )),
        PrimitiveValue::String(s) => parse_quantity(s),
        _ => None,
    }
}

/// Conversion to a quantity, optionally in `unit`
///
/// Units are not converted: a target unit only matches quantities already
/// expressed in it (or its calendar equivalent).
fn quantity_in(collection: &Collection, unit: Option<&Collection>, function: &str) -> Result<Option<Quantity>> {
    let target = match unit {
        Some(unit) => match string_arg(unit, function)? {
            Some(unit) => Some(unit),
            None => return Ok(None),
        },
        None => None,
    };
    let Some(value) = collection.singleton_value(function)? else {
        return Ok(None);
    };
    let quantity = quantity_value(&value);
    Ok(match target {
        Some(target) => quantity.filter(|q| {
            q.unit_key() == Quantity::new(Decimal::ZERO, target.clone()).unit_key()
        }),
        None => quantity,
    })
}

pub fn to_quantity(collection: Collection, unit: Option<&Collection>) -> Result<Collection> {
    Ok(quantity_in(&collection, unit, "toQuantity")?
        .map(|q| single_value(PrimitiveValue::Quantity(q)))
        .unwrap_or_default())
}

pub fn converts_to_quantity(collection: Collection, unit: Option<&Collection>) -> Result<Collection> {
    if collection.is_empty() {
        return Ok(Collection::empty());
    }
    boolean(quantity_in(&collection, unit, "convertsToQuantity")?.is_some())
}
