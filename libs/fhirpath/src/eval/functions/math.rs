//! Mathematical functions for FHIRPath.
//!
//! This module implements mathematical operations like `abs()`, `ceiling()`, `floor()`,
//! `round()`, `sqrt()`, `power()`, `log()`, etc. Transcendental functions go
//! through `f64`; a result that is not a finite number yields empty.

use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;

use crate::error::{Error, Result};
use crate::value::{Collection, Node, PrimitiveValue, Quantity};

use super::helpers::{integer_arg, single_value};

fn numeric_input(collection: &Collection, function: &str) -> Result<Option<PrimitiveValue>> {
    match collection.singleton_value(function)? {
        None => Ok(None),
        Some(value) if value.is_numeric() => Ok(Some(value)),
        Some(other) => Err(Error::InvalidOperand(format!(
            "{}() requires a number, got {}",
            function,
            other.type_name()
        ))),
    }
}

fn numeric_arg(arg: &Collection, function: &str) -> Result<Option<f64>> {
    match numeric_input(arg, function)? {
        Some(value) => Ok(value.as_decimal()?.to_f64()),
        None => Ok(None),
    }
}

fn decimal_from_f64(value: f64) -> Collection {
    if !value.is_finite() {
        return Collection::empty();
    }
    Decimal::from_f64(value)
        .map(|d| single_value(PrimitiveValue::Decimal(d.normalize())))
        .unwrap_or_default()
}

fn float_function(
    collection: Collection,
    function: &str,
    f: impl FnOnce(f64) -> f64,
) -> Result<Collection> {
    let Some(value) = numeric_input(&collection, function)? else {
        return Ok(Collection::empty());
    };
    Ok(value
        .as_decimal()?
        .to_f64()
        .map(|x| decimal_from_f64(f(x)))
        .unwrap_or_default())
}

pub fn abs(collection: Collection) -> Result<Collection> {
    let result = match collection.singleton_value("abs")? {
        None => return Ok(Collection::empty()),
        Some(PrimitiveValue::Integer(i)) => i.checked_abs().map(PrimitiveValue::Integer),
        Some(PrimitiveValue::Decimal(d)) => Some(PrimitiveValue::Decimal(d.abs())),
        Some(PrimitiveValue::Quantity(q)) => {
            Some(PrimitiveValue::Quantity(Quantity::new(q.value.abs(), q.unit)))
        }
        Some(other) => {
            return Err(Error::InvalidOperand(format!(
                "abs() requires a number or quantity, got {}",
                other.type_name()
            )))
        }
    };
    Ok(result.map(single_value).unwrap_or_default())
}

fn to_integer(value: Decimal) -> Collection {
    value
        .to_i64()
        .map(|i| Collection::singleton(Node::integer(i)))
        .unwrap_or_default()
}

pub fn ceiling(collection: Collection) -> Result<Collection> {
    match numeric_input(&collection, "ceiling")? {
        None => Ok(Collection::empty()),
        Some(value) => Ok(to_integer(value.as_decimal()?.ceil())),
    }
}

pub fn floor(collection: Collection) -> Result<Collection> {
    match numeric_input(&collection, "floor")? {
        None => Ok(Collection::empty()),
        Some(value) => Ok(to_integer(value.as_decimal()?.floor())),
    }
}

pub fn truncate(collection: Collection) -> Result<Collection> {
    match numeric_input(&collection, "truncate")? {
        None => Ok(Collection::empty()),
        Some(value) => Ok(to_integer(value.as_decimal()?.trunc())),
    }
}

/// `round([precision])`; halves round away from zero
pub fn round(collection: Collection, precision: Option<&Collection>) -> Result<Collection> {
    let Some(value) = numeric_input(&collection, "round")? else {
        return Ok(Collection::empty());
    };
    let digits = match precision {
        Some(precision) => match integer_arg(precision, "round")? {
            Some(digits) => digits,
            None => return Ok(Collection::empty()),
        },
        None => 0,
    };
    let Ok(digits) = u32::try_from(digits) else {
        return Err(Error::InvalidOperand(format!(
            "round() precision must not be negative, got {}",
            digits
        )));
    };
    let rounded = value
        .as_decimal()?
        .round_dp_with_strategy(digits, rust_decimal::RoundingStrategy::MidpointAwayFromZero);
    Ok(single_value(PrimitiveValue::Decimal(rounded)))
}

pub fn exp(collection: Collection) -> Result<Collection> {
    float_function(collection, "exp", f64::exp)
}

pub fn ln(collection: Collection) -> Result<Collection> {
    float_function(collection, "ln", f64::ln)
}

pub fn sqrt(collection: Collection) -> Result<Collection> {
    float_function(collection, "sqrt", f64::sqrt)
}

pub fn log(collection: Collection, base: &Collection) -> Result<Collection> {
    let Some(base) = numeric_arg(base, "log")? else {
        return Ok(Collection::empty());
    };
    float_function(collection, "log", |x| x.log(base))
}

/// `power(exponent)`; integer base and non-negative integer exponent stay
/// Integer, a negative integer exponent gives the exact Decimal reciprocal
pub fn power(collection: Collection, exponent: &Collection) -> Result<Collection> {
    let Some(base) = numeric_input(&collection, "power")? else {
        return Ok(Collection::empty());
    };
    let Some(exp) = numeric_input(exponent, "power")? else {
        return Ok(Collection::empty());
    };

    if let (PrimitiveValue::Integer(b), PrimitiveValue::Integer(e)) = (&base, &exp) {
        let magnitude = u32::try_from(e.unsigned_abs())
            .ok()
            .and_then(|m| b.checked_pow(m));
        let result = if *e >= 0 {
            magnitude.map(Node::integer)
        } else {
            magnitude
                .and_then(|m| Decimal::ONE.checked_div(Decimal::from(m)))
                .map(Node::decimal)
        };
        return Ok(result.map(Collection::singleton).unwrap_or_default());
    }

    let exp = exp.as_decimal()?.to_f64();
    Ok(match (base.as_decimal()?.to_f64(), exp) {
        (Some(b), Some(e)) => decimal_from_f64(b.powf(e)),
        _ => Collection::empty(),
    })
}
