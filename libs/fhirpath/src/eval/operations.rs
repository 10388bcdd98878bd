//! Binary operator semantics
//!
//! Operands arrive fully evaluated. Singleton operators treat an empty operand
//! as unknown and return empty; arithmetic with an undefined result (division
//! by zero, overflow) also returns empty.

use std::cmp::Ordering;
use std::sync::Arc;

use chrono::{Duration, Months, NaiveDate, NaiveDateTime};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use crate::ast::BinaryOperator;
use crate::error::{Error, Result};
use crate::value::{
    Collection, Node, PartialDate, PartialDateTime, PartialTime, PrimitiveValue, Quantity,
};

/// Execute a binary operator on two evaluated operands
pub fn execute_binary_op(
    op: BinaryOperator,
    left: Collection,
    right: Collection,
) -> Result<Collection> {
    use BinaryOperator as Op;
    match op {
        Op::Multiply | Op::Divide | Op::Div | Op::Mod | Op::Add | Op::Subtract => {
            let symbol = op.symbol();
            let (Some(l), Some(r)) = (left.singleton_value(symbol)?, right.singleton_value(symbol)?)
            else {
                return Ok(Collection::empty());
            };
            Ok(optional(arithmetic(op, l, r)?))
        }
        Op::Concat => {
            let mut text = concat_operand(&left)?.to_string();
            text.push_str(&concat_operand(&right)?);
            Ok(Collection::singleton(Node::string(text)))
        }
        Op::LessThan | Op::LessThanOrEqual | Op::GreaterThan | Op::GreaterThanOrEqual => {
            compare(op, &left, &right)
        }
        Op::Equal => Ok(optional_bool(equals(&left, &right))),
        Op::NotEqual => Ok(optional_bool(equals(&left, &right).map(|b| !b))),
        Op::Equivalent => Ok(Collection::boolean(equivalent(&left, &right))),
        Op::NotEquivalent => Ok(Collection::boolean(!equivalent(&left, &right))),
        Op::In => membership(&left, &right, "in"),
        Op::Contains => membership(&right, &left, "contains"),
        Op::And | Op::Or | Op::Xor | Op::Implies => {
            let l = truth_value(&left, op.symbol())?;
            let r = truth_value(&right, op.symbol())?;
            Ok(optional_bool(logic(op, l, r)))
        }
    }
}

fn optional(value: Option<PrimitiveValue>) -> Collection {
    value
        .map(|value| Collection::singleton(Node::Primitive(value)))
        .unwrap_or_default()
}

fn optional_bool(value: Option<bool>) -> Collection {
    value.map(Collection::boolean).unwrap_or_default()
}

// ============================================
// Equality
// ============================================

/// `=` on two nodes; `None` when the answer is unknown
pub(crate) fn node_equals(left: &Node, right: &Node) -> Option<bool> {
    match (left.primitive_value(), right.primitive_value()) {
        (Some(l), Some(r)) => l.equals(&r),
        _ => Some(left.deep_equals(right)),
    }
}

pub(crate) fn node_equivalent(left: &Node, right: &Node) -> bool {
    match (left.primitive_value(), right.primitive_value()) {
        (Some(l), Some(r)) => l.equivalent(&r),
        _ => left.deep_equals(right),
    }
}

/// Is an item `=` to `node` present?
pub(crate) fn contains_equal(collection: &Collection, node: &Node) -> bool {
    collection
        .iter()
        .any(|item| node_equals(item, node) == Some(true))
}

/// Append `node` unless an equal item is already present
pub(crate) fn push_unique(collection: &mut Collection, node: Node) {
    if !contains_equal(collection, &node) {
        collection.push(node);
    }
}

/// Collection equality: same length and pairwise equal in order
pub(crate) fn equals(left: &Collection, right: &Collection) -> Option<bool> {
    if left.is_empty() || right.is_empty() {
        return None;
    }
    if left.len() != right.len() {
        return Some(false);
    }
    let mut unknown = false;
    for (l, r) in left.iter().zip(right.iter()) {
        match node_equals(l, r) {
            Some(false) => return Some(false),
            None => unknown = true,
            Some(true) => {}
        }
    }
    if unknown {
        None
    } else {
        Some(true)
    }
}

/// Collection equivalence: same length, order-independent
pub(crate) fn equivalent(left: &Collection, right: &Collection) -> bool {
    if left.len() != right.len() {
        return false;
    }
    let covered = |from: &Collection, to: &Collection| {
        from.iter()
            .all(|item| to.iter().any(|other| node_equivalent(item, other)))
    };
    covered(left, right) && covered(right, left)
}

fn membership(item: &Collection, container: &Collection, what: &str) -> Result<Collection> {
    if item.is_empty() {
        return Ok(Collection::empty());
    }
    let node = item.single(what)?;
    Ok(Collection::boolean(contains_equal(container, node)))
}

// ============================================
// Comparison
// ============================================

fn compare(op: BinaryOperator, left: &Collection, right: &Collection) -> Result<Collection> {
    let symbol = op.symbol();
    let (Some(l), Some(r)) = (left.singleton_value(symbol)?, right.singleton_value(symbol)?) else {
        return Ok(Collection::empty());
    };
    let Some(ordering) = l.compare(&r)? else {
        return Ok(Collection::empty());
    };
    let result = match op {
        BinaryOperator::LessThan => ordering == Ordering::Less,
        BinaryOperator::LessThanOrEqual => ordering != Ordering::Greater,
        BinaryOperator::GreaterThan => ordering == Ordering::Greater,
        _ => ordering != Ordering::Less,
    };
    Ok(Collection::boolean(result))
}

// ============================================
// Boolean logic
// ============================================

/// Singleton evaluation to a truth value
///
/// Empty is unknown, a non-boolean singleton is `true`, more than one item is
/// an invalid operand.
pub(crate) fn truth_value(collection: &Collection, what: &str) -> Result<Option<bool>> {
    if collection.is_empty() {
        return Ok(None);
    }
    let node = collection.single(what)?;
    match node.primitive_value() {
        Some(PrimitiveValue::Boolean(b)) => Ok(Some(b)),
        _ => Ok(Some(true)),
    }
}

fn logic(op: BinaryOperator, l: Option<bool>, r: Option<bool>) -> Option<bool> {
    match op {
        BinaryOperator::And => match (l, r) {
            (Some(false), _) | (_, Some(false)) => Some(false),
            (Some(true), Some(true)) => Some(true),
            _ => None,
        },
        BinaryOperator::Or => match (l, r) {
            (Some(true), _) | (_, Some(true)) => Some(true),
            (Some(false), Some(false)) => Some(false),
            _ => None,
        },
        BinaryOperator::Xor => match (l, r) {
            (Some(a), Some(b)) => Some(a != b),
            _ => None,
        },
        _ => match (l, r) {
            (Some(false), _) | (_, Some(true)) => Some(true),
            (Some(true), r) => r,
            (None, _) => None,
        },
    }
}

// ============================================
// Arithmetic
// ============================================

fn concat_operand(collection: &Collection) -> Result<Arc<str>> {
    match collection.singleton_value("&")? {
        None => Ok(Arc::from("")),
        Some(PrimitiveValue::String(s)) => Ok(s),
        Some(other) => Err(Error::TypeMismatch(format!(
            "& requires String operands, found {}",
            other.type_name()
        ))),
    }
}

fn mismatch(op: BinaryOperator, left: &PrimitiveValue, right: &PrimitiveValue) -> Error {
    Error::TypeMismatch(format!(
        "cannot apply {} to {} and {}",
        op.symbol(),
        left.type_name(),
        right.type_name()
    ))
}

fn arithmetic(
    op: BinaryOperator,
    left: PrimitiveValue,
    right: PrimitiveValue,
) -> Result<Option<PrimitiveValue>> {
    use BinaryOperator as Op;
    use PrimitiveValue as P;

    match (op, &left, &right) {
        (Op::Add, P::Integer(a), P::Integer(b)) => Ok(a.checked_add(*b).map(P::Integer)),
        (Op::Subtract, P::Integer(a), P::Integer(b)) => Ok(a.checked_sub(*b).map(P::Integer)),
        (Op::Multiply, P::Integer(a), P::Integer(b)) => Ok(a.checked_mul(*b).map(P::Integer)),
        (Op::Div, P::Integer(a), P::Integer(b)) => Ok(a.checked_div(*b).map(P::Integer)),
        (Op::Mod, P::Integer(a), P::Integer(b)) => Ok(a.checked_rem(*b).map(P::Integer)),

        (_, a, b) if a.is_numeric() && b.is_numeric() => {
            decimal_arithmetic(op, a.as_decimal()?, b.as_decimal()?)
        }

        (Op::Add, P::String(a), P::String(b)) => {
            Ok(Some(P::String(format!("{}{}", a, b).into())))
        }

        (Op::Add | Op::Subtract, P::Quantity(a), P::Quantity(b)) => {
            if a.unit_key() != b.unit_key() {
                return Ok(None);
            }
            let value = if op == Op::Add {
                a.value.checked_add(b.value)
            } else {
                a.value.checked_sub(b.value)
            };
            Ok(value.map(|v| P::Quantity(Quantity::new(v, a.unit.clone()))))
        }

        (Op::Add | Op::Subtract, t, P::Quantity(q)) if t.is_temporal() => {
            add_duration(t, q, op == Op::Subtract)
        }

        (Op::Multiply, P::Quantity(q), n) | (Op::Multiply, n, P::Quantity(q)) if n.is_numeric() => {
            Ok(q.value
                .checked_mul(n.as_decimal()?)
                .map(|v| P::Quantity(Quantity::new(v, q.unit.clone()))))
        }
        (Op::Multiply, P::Quantity(a), P::Quantity(b)) => Ok(a
            .value
            .checked_mul(b.value)
            .map(|v| P::Quantity(Quantity::new(v, unit_product(&a.unit, &b.unit))))),

        (Op::Divide, P::Quantity(q), n) if n.is_numeric() => Ok(q
            .value
            .checked_div(n.as_decimal()?)
            .map(|v| P::Quantity(Quantity::new(v, q.unit.clone())))),
        (Op::Divide, P::Quantity(a), P::Quantity(b)) => {
            let unit: Arc<str> = if a.unit_key() == b.unit_key() {
                Arc::from("1")
            } else {
                Arc::from(format!("{}/{}", a.unit, b.unit))
            };
            Ok(a.value
                .checked_div(b.value)
                .map(|v| P::Quantity(Quantity::new(v, unit))))
        }

        _ => Err(mismatch(op, &left, &right)),
    }
}

fn decimal_arithmetic(op: BinaryOperator, a: Decimal, b: Decimal) -> Result<Option<PrimitiveValue>> {
    use BinaryOperator as Op;
    Ok(match op {
        Op::Add => a.checked_add(b).map(PrimitiveValue::Decimal),
        Op::Subtract => a.checked_sub(b).map(PrimitiveValue::Decimal),
        Op::Multiply => a.checked_mul(b).map(PrimitiveValue::Decimal),
        Op::Divide => a
            .checked_div(b)
            .map(|d| PrimitiveValue::Decimal(d.normalize())),
        Op::Div => a
            .checked_div(b)
            .and_then(|d| d.trunc().to_i64())
            .map(PrimitiveValue::Integer),
        Op::Mod => a.checked_rem(b).map(PrimitiveValue::Decimal),
        _ => None,
    })
}

fn unit_product(a: &str, b: &str) -> String {
    match (a, b) {
        ("1", other) | (other, "1") => other.to_string(),
        _ => format!("{}.{}", a, b),
    }
}

// ============================================
// Temporal arithmetic
// ============================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DurationUnit {
    Year,
    Month,
    Week,
    Day,
    Hour,
    Minute,
    Second,
    Millisecond,
}

impl DurationUnit {
    /// Calendar keyword (`years`) or UCUM code (`a`)
    fn from_unit(unit: &str) -> Option<Self> {
        let keyword = crate::value::calendar_keyword(unit).unwrap_or(unit);
        Some(match keyword {
            "year" | "a" => DurationUnit::Year,
            "month" | "mo" => DurationUnit::Month,
            "week" | "wk" => DurationUnit::Week,
            "day" | "d" => DurationUnit::Day,
            "hour" | "h" => DurationUnit::Hour,
            "minute" | "min" => DurationUnit::Minute,
            "second" | "s" => DurationUnit::Second,
            "millisecond" | "ms" => DurationUnit::Millisecond,
            _ => return None,
        })
    }

    fn months_per_unit(self) -> Option<i64> {
        match self {
            DurationUnit::Year => Some(12),
            DurationUnit::Month => Some(1),
            _ => None,
        }
    }

    fn millis_per_unit(self) -> i64 {
        match self {
            DurationUnit::Week => 7 * 86_400_000,
            DurationUnit::Day => 86_400_000,
            DurationUnit::Hour => 3_600_000,
            DurationUnit::Minute => 60_000,
            DurationUnit::Second => 1_000,
            _ => 1,
        }
    }

    fn is_date_unit(self) -> bool {
        !matches!(
            self,
            DurationUnit::Hour
                | DurationUnit::Minute
                | DurationUnit::Second
                | DurationUnit::Millisecond
        )
    }
}

/// Shift a temporal value by a calendar duration
///
/// Year and month amounts are truncated to whole units and clamp to the end
/// of the month; smaller units are applied as an exact number of milliseconds.
fn add_duration(
    value: &PrimitiveValue,
    quantity: &Quantity,
    subtract: bool,
) -> Result<Option<PrimitiveValue>> {
    let unit = DurationUnit::from_unit(&quantity.unit).ok_or_else(|| {
        Error::TypeMismatch(format!(
            "'{}' is not a calendar duration unit",
            quantity.unit
        ))
    })?;
    let amount = if subtract {
        -quantity.value
    } else {
        quantity.value
    };

    let months = unit
        .months_per_unit()
        .map(|per| amount.trunc().to_i64().and_then(|n| n.checked_mul(per)));
    let millis = || {
        let per = Decimal::from(unit.millis_per_unit());
        amount.checked_mul(per).and_then(|ms| ms.trunc().to_i64())
    };

    match value {
        PrimitiveValue::Date(date) => {
            if !unit.is_date_unit() {
                return Err(Error::TypeMismatch(format!(
                    "cannot add '{}' to a Date",
                    quantity.unit
                )));
            }
            let shifted = match months {
                Some(months) => months.and_then(|m| shift_date_months(date.value, m)),
                // whole days only
                None => amount
                    .trunc()
                    .to_i64()
                    .and_then(|n| n.checked_mul(unit.millis_per_unit() / 86_400_000))
                    .and_then(Duration::try_days)
                    .and_then(|delta| date.value.checked_add_signed(delta)),
            };
            Ok(shifted.map(|value| {
                PrimitiveValue::Date(PartialDate {
                    value,
                    precision: date.precision,
                })
            }))
        }
        PrimitiveValue::DateTime(datetime) => {
            let shifted = match months {
                Some(months) => months.and_then(|m| shift_datetime_months(datetime.value, m)),
                None => millis()
                    .and_then(Duration::try_milliseconds)
                    .and_then(|delta| datetime.value.checked_add_signed(delta)),
            };
            Ok(shifted.map(|value| {
                PrimitiveValue::DateTime(PartialDateTime {
                    value,
                    ..*datetime
                })
            }))
        }
        PrimitiveValue::Time(time) => {
            if unit.is_date_unit() {
                return Err(Error::TypeMismatch(format!(
                    "cannot add '{}' to a Time",
                    quantity.unit
                )));
            }
            Ok(millis().and_then(Duration::try_milliseconds).map(|delta| {
                let (value, _) = time.value.overflowing_add_signed(delta);
                PrimitiveValue::Time(PartialTime { value, ..*time })
            }))
        }
        other => Err(Error::TypeMismatch(format!(
            "cannot add a duration to {}",
            other.type_name()
        ))),
    }
}

fn months_arg(months: i64) -> Option<Months> {
    u32::try_from(months.unsigned_abs()).ok().map(Months::new)
}

fn shift_date_months(value: NaiveDate, months: i64) -> Option<NaiveDate> {
    let delta = months_arg(months)?;
    if months >= 0 {
        value.checked_add_months(delta)
    } else {
        value.checked_sub_months(delta)
    }
}

fn shift_datetime_months(value: NaiveDateTime, months: i64) -> Option<NaiveDateTime> {
    let delta = months_arg(months)?;
    if months >= 0 {
        value.checked_add_months(delta)
    } else {
        value.checked_sub_months(delta)
    }
}
