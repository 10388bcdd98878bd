//! Node model: primitive values, typed elements and collections
//!
//! Every FHIRPath evaluation produces a [`Collection`] of [`Node`]s. A node is
//! either a System primitive ([`PrimitiveValue`]) or an opaque typed element
//! supplied by the host through the [`Element`] trait.

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use rust_decimal::Decimal;
use smallvec::SmallVec;

use crate::error::{Error, Result};
use crate::temporal_parse;

// ============================================
// Temporal values
// ============================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DatePrecision {
    Year,
    Month,
    Day,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DateTimePrecision {
    Year,
    Month,
    Day,
    Hour,
    Minute,
    Second,
    Millisecond,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TimePrecision {
    Hour,
    Minute,
    Second,
    Millisecond,
}

/// A date known to year, month or day precision; unknown parts are `01`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PartialDate {
    pub value: NaiveDate,
    pub precision: DatePrecision,
}

/// A wall-clock dateTime with precision and an optional UTC offset in seconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PartialDateTime {
    pub value: NaiveDateTime,
    pub precision: DateTimePrecision,
    pub offset: Option<i32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PartialTime {
    pub value: NaiveTime,
    pub precision: TimePrecision,
}

impl From<PartialDate> for PartialDateTime {
    fn from(date: PartialDate) -> Self {
        let precision = match date.precision {
            DatePrecision::Year => DateTimePrecision::Year,
            DatePrecision::Month => DateTimePrecision::Month,
            DatePrecision::Day => DateTimePrecision::Day,
        };
        PartialDateTime {
            value: date.value.and_time(NaiveTime::MIN),
            precision,
            offset: None,
        }
    }
}

impl PartialDateTime {
    /// Comparable components: year, month, day, hour, minute, milliseconds of the minute
    ///
    /// Values with an offset are normalised to UTC once they carry a time part.
    fn components(&self) -> [i64; 6] {
        let value = match self.offset {
            Some(offset) if self.precision > DateTimePrecision::Day => {
                self.value - chrono::Duration::seconds(i64::from(offset))
            }
            _ => self.value,
        };
        [
            i64::from(value.year()),
            i64::from(value.month()),
            i64::from(value.day()),
            i64::from(value.hour()),
            i64::from(value.minute()),
            i64::from(value.second()) * 1000 + i64::from(value.nanosecond() / 1_000_000),
        ]
    }

    /// Seconds and milliseconds count as one precision level
    fn precision_depth(&self) -> usize {
        match self.precision {
            DateTimePrecision::Year => 0,
            DateTimePrecision::Month => 1,
            DateTimePrecision::Day => 2,
            DateTimePrecision::Hour => 3,
            DateTimePrecision::Minute => 4,
            DateTimePrecision::Second | DateTimePrecision::Millisecond => 5,
        }
    }

    /// Ordering at the common precision; `None` when the values are equal
    /// up to the coarser precision but differ in precision
    pub fn partial_compare(&self, other: &PartialDateTime) -> Option<Ordering> {
        compare_components(
            &self.components(),
            self.precision_depth(),
            &other.components(),
            other.precision_depth(),
        )
    }
}

impl PartialTime {
    fn components(&self) -> [i64; 3] {
        [
            i64::from(self.value.hour()),
            i64::from(self.value.minute()),
            i64::from(self.value.second()) * 1000
                + i64::from(self.value.nanosecond() / 1_000_000),
        ]
    }

    fn precision_depth(&self) -> usize {
        match self.precision {
            TimePrecision::Hour => 0,
            TimePrecision::Minute => 1,
            TimePrecision::Second | TimePrecision::Millisecond => 2,
        }
    }

    pub fn partial_compare(&self, other: &PartialTime) -> Option<Ordering> {
        compare_components(
            &self.components(),
            self.precision_depth(),
            &other.components(),
            other.precision_depth(),
        )
    }
}

fn compare_components(
    left: &[i64],
    left_depth: usize,
    right: &[i64],
    right_depth: usize,
) -> Option<Ordering> {
    let common = left_depth.min(right_depth);
    for i in 0..=common {
        match left[i].cmp(&right[i]) {
            Ordering::Equal => continue,
            other => return Some(other),
        }
    }
    if left_depth == right_depth {
        Some(Ordering::Equal)
    } else {
        None
    }
}

impl fmt::Display for PartialDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.precision {
            DatePrecision::Year => write!(f, "{}", self.value.format("%Y")),
            DatePrecision::Month => write!(f, "{}", self.value.format("%Y-%m")),
            DatePrecision::Day => write!(f, "{}", self.value.format("%Y-%m-%d")),
        }
    }
}

impl fmt::Display for PartialDateTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let pattern = match self.precision {
            DateTimePrecision::Year => "%Y",
            DateTimePrecision::Month => "%Y-%m",
            DateTimePrecision::Day => "%Y-%m-%d",
            DateTimePrecision::Hour => "%Y-%m-%dT%H",
            DateTimePrecision::Minute => "%Y-%m-%dT%H:%M",
            DateTimePrecision::Second => "%Y-%m-%dT%H:%M:%S",
            DateTimePrecision::Millisecond => "%Y-%m-%dT%H:%M:%S%.3f",
        };
        write!(f, "{}", self.value.format(pattern))?;
        match self.offset {
            Some(offset) if self.precision > DateTimePrecision::Day => {
                write!(f, "{}", format_offset(offset))
            }
            _ => Ok(()),
        }
    }
}

fn format_offset(offset: i32) -> String {
    if offset == 0 {
        return "Z".to_string();
    }
    let sign = if offset < 0 { '-' } else { '+' };
    let abs = offset.abs();
    format!("{}{:02}:{:02}", sign, abs / 3600, (abs % 3600) / 60)
}

impl fmt::Display for PartialTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let pattern = match self.precision {
            TimePrecision::Hour => "%H",
            TimePrecision::Minute => "%H:%M",
            TimePrecision::Second => "%H:%M:%S",
            TimePrecision::Millisecond => "%H:%M:%S%.3f",
        };
        write!(f, "{}", self.value.format(pattern))
    }
}

// ============================================
// Quantity
// ============================================

/// A decimal value with a UCUM unit or calendar duration keyword
#[derive(Debug, Clone, PartialEq)]
pub struct Quantity {
    pub value: Decimal,
    pub unit: Arc<str>,
}

impl Quantity {
    pub fn new(value: Decimal, unit: impl Into<Arc<str>>) -> Self {
        Self {
            value,
            unit: unit.into(),
        }
    }

    /// Canonical unit used for comparison
    ///
    /// Calendar keywords below a month share a canonical form with their UCUM
    /// unit (`1 day = 1 'd'`); `year` and `month` stay distinct from `'a'`/`'mo'`.
    pub fn unit_key(&self) -> &str {
        canonical_unit(&self.unit)
    }

    /// Calendar duration keyword (`year`, `day`, ...) in singular form
    pub fn calendar_unit(&self) -> Option<&'static str> {
        calendar_keyword(&self.unit)
    }

    pub fn partial_compare(&self, other: &Quantity) -> Option<Ordering> {
        if self.unit_key() == other.unit_key() {
            Some(self.value.cmp(&other.value))
        } else {
            None
        }
    }

    /// Equivalence also relates `year`/`month` to `'a'`/`'mo'`
    pub fn equivalent(&self, other: &Quantity) -> bool {
        fn loose(unit: &str) -> &str {
            match canonical_unit(unit) {
                "year" => "a",
                "month" => "mo",
                other => other,
            }
        }
        loose(&self.unit) == loose(&other.unit) && self.value == other.value
    }
}

pub(crate) fn calendar_keyword(unit: &str) -> Option<&'static str> {
    match unit {
        "year" | "years" => Some("year"),
        "month" | "months" => Some("month"),
        "week" | "weeks" => Some("week"),
        "day" | "days" => Some("day"),
        "hour" | "hours" => Some("hour"),
        "minute" | "minutes" => Some("minute"),
        "second" | "seconds" => Some("second"),
        "millisecond" | "milliseconds" => Some("millisecond"),
        _ => None,
    }
}

fn canonical_unit(unit: &str) -> &str {
    match calendar_keyword(unit) {
        Some("year") => "year",
        Some("month") => "month",
        Some("week") => "wk",
        Some("day") => "d",
        Some("hour") => "h",
        Some("minute") => "min",
        Some("second") => "s",
        Some("millisecond") => "ms",
        _ => unit,
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} '{}'", self.value, self.unit)
    }
}

// ============================================
// Primitive values
// ============================================

/// System primitive value
#[derive(Debug, Clone, PartialEq)]
pub enum PrimitiveValue {
    Boolean(bool),
    Integer(i64),
    Decimal(Decimal),
    String(Arc<str>),
    Date(PartialDate),
    DateTime(PartialDateTime),
    Time(PartialTime),
    Quantity(Quantity),
}

impl PrimitiveValue {
    /// System type name (`Boolean`, `Integer`, ...)
    pub fn type_name(&self) -> &'static str {
        match self {
            PrimitiveValue::Boolean(_) => "Boolean",
            PrimitiveValue::Integer(_) => "Integer",
            PrimitiveValue::Decimal(_) => "Decimal",
            PrimitiveValue::String(_) => "String",
            PrimitiveValue::Date(_) => "Date",
            PrimitiveValue::DateTime(_) => "DateTime",
            PrimitiveValue::Time(_) => "Time",
            PrimitiveValue::Quantity(_) => "Quantity",
        }
    }

    fn mismatch(&self, wanted: &str) -> Error {
        Error::TypeMismatch(format!("expected {}, found {}", wanted, self.type_name()))
    }

    pub fn as_boolean(&self) -> Result<bool> {
        match self {
            PrimitiveValue::Boolean(b) => Ok(*b),
            other => Err(other.mismatch("Boolean")),
        }
    }

    pub fn as_integer(&self) -> Result<i64> {
        match self {
            PrimitiveValue::Integer(i) => Ok(*i),
            other => Err(other.mismatch("Integer")),
        }
    }

    /// Integer is promoted to Decimal
    pub fn as_decimal(&self) -> Result<Decimal> {
        match self {
            PrimitiveValue::Integer(i) => Ok(Decimal::from(*i)),
            PrimitiveValue::Decimal(d) => Ok(*d),
            other => Err(other.mismatch("Decimal")),
        }
    }

    pub fn as_string(&self) -> Result<&Arc<str>> {
        match self {
            PrimitiveValue::String(s) => Ok(s),
            other => Err(other.mismatch("String")),
        }
    }

    pub fn as_date(&self) -> Result<PartialDate> {
        match self {
            PrimitiveValue::Date(d) => Ok(*d),
            other => Err(other.mismatch("Date")),
        }
    }

    /// Date is promoted to DateTime
    pub fn as_datetime(&self) -> Result<PartialDateTime> {
        match self {
            PrimitiveValue::Date(d) => Ok(PartialDateTime::from(*d)),
            PrimitiveValue::DateTime(dt) => Ok(*dt),
            other => Err(other.mismatch("DateTime")),
        }
    }

    pub fn as_time(&self) -> Result<PartialTime> {
        match self {
            PrimitiveValue::Time(t) => Ok(*t),
            other => Err(other.mismatch("Time")),
        }
    }

    /// Numbers become quantities with the unity unit `'1'`
    pub fn as_quantity(&self) -> Result<Quantity> {
        match self {
            PrimitiveValue::Quantity(q) => Ok(q.clone()),
            PrimitiveValue::Integer(_) | PrimitiveValue::Decimal(_) => {
                Ok(Quantity::new(self.as_decimal()?, "1"))
            }
            other => Err(other.mismatch("Quantity")),
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, PrimitiveValue::Integer(_) | PrimitiveValue::Decimal(_))
    }

    pub fn is_temporal(&self) -> bool {
        matches!(
            self,
            PrimitiveValue::Date(_) | PrimitiveValue::DateTime(_) | PrimitiveValue::Time(_)
        )
    }

    /// Reinterpret a string as the temporal kind of `like`
    fn coerce_string_to(&self, like: &PrimitiveValue) -> Option<PrimitiveValue> {
        let PrimitiveValue::String(s) = self else {
            return None;
        };
        match like {
            PrimitiveValue::Date(_) => temporal_parse::parse_date(s)
                .map(PrimitiveValue::Date)
                .or_else(|| temporal_parse::parse_datetime(s).map(PrimitiveValue::DateTime)),
            PrimitiveValue::DateTime(_) => {
                temporal_parse::parse_datetime(s).map(PrimitiveValue::DateTime)
            }
            PrimitiveValue::Time(_) => temporal_parse::parse_time(s).map(PrimitiveValue::Time),
            _ => None,
        }
    }

    /// Ordering for comparable kinds
    ///
    /// `Ok(None)` means the comparison is undefined for these particular values
    /// (temporal precision mismatch, incompatible units) and yields empty.
    /// Kinds that cannot be ordered against each other are a type mismatch.
    pub fn compare(&self, other: &PrimitiveValue) -> Result<Option<Ordering>> {
        use PrimitiveValue as P;
        match (self, other) {
            (P::Integer(a), P::Integer(b)) => Ok(Some(a.cmp(b))),
            (a, b) if a.is_numeric() && b.is_numeric() => {
                Ok(Some(a.as_decimal()?.cmp(&b.as_decimal()?)))
            }
            (P::String(a), P::String(b)) => Ok(Some(a.cmp(b))),
            (P::Date(a), P::Date(b)) => {
                Ok(PartialDateTime::from(*a).partial_compare(&PartialDateTime::from(*b)))
            }
            (P::Date(_) | P::DateTime(_), P::Date(_) | P::DateTime(_)) => {
                Ok(self.as_datetime()?.partial_compare(&other.as_datetime()?))
            }
            (P::Time(a), P::Time(b)) => Ok(a.partial_compare(b)),
            (P::Quantity(a), P::Quantity(b)) => Ok(a.partial_compare(b)),
            (P::String(_), b) if b.is_temporal() => match self.coerce_string_to(b) {
                Some(coerced) => coerced.compare(b),
                None => Err(self.incomparable(other)),
            },
            (a, P::String(_)) if a.is_temporal() => match other.coerce_string_to(a) {
                Some(coerced) => a.compare(&coerced),
                None => Err(self.incomparable(other)),
            },
            _ => Err(self.incomparable(other)),
        }
    }

    fn incomparable(&self, other: &PrimitiveValue) -> Error {
        Error::TypeMismatch(format!(
            "cannot compare {} with {}",
            self.type_name(),
            other.type_name()
        ))
    }

    /// FHIRPath `=` on single values; `None` when the result is unknown
    pub fn equals(&self, other: &PrimitiveValue) -> Option<bool> {
        use PrimitiveValue as P;
        match (self, other) {
            (P::Boolean(a), P::Boolean(b)) => Some(a == b),
            (P::String(a), P::String(b)) => Some(a == b),
            (P::Quantity(a), P::Quantity(b)) => match a.partial_compare(b) {
                Some(ord) => Some(ord == Ordering::Equal),
                None if a.calendar_unit().is_some() || b.calendar_unit().is_some() => Some(false),
                None => None,
            },
            _ => match self.compare(other) {
                Ok(Some(ord)) => Some(ord == Ordering::Equal),
                Ok(None) => None,
                Err(_) => Some(false),
            },
        }
    }

    /// FHIRPath `~` on single values
    pub fn equivalent(&self, other: &PrimitiveValue) -> bool {
        use PrimitiveValue as P;
        match (self, other) {
            (P::String(a), P::String(b)) => normalize_for_equivalence(a) == normalize_for_equivalence(b),
            (a, b) if a.is_numeric() && b.is_numeric() => {
                match (a.as_decimal(), b.as_decimal()) {
                    (Ok(x), Ok(y)) => {
                        let scale = x.scale().min(y.scale());
                        x.round_dp(scale) == y.round_dp(scale)
                    }
                    _ => false,
                }
            }
            (P::Quantity(a), P::Quantity(b)) => a.equivalent(b),
            _ => self.equals(other).unwrap_or(false),
        }
    }
}

fn normalize_for_equivalence(s: &str) -> String {
    s.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

impl fmt::Display for PrimitiveValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrimitiveValue::Boolean(b) => write!(f, "{}", b),
            PrimitiveValue::Integer(i) => write!(f, "{}", i),
            PrimitiveValue::Decimal(d) => write!(f, "{}", d),
            PrimitiveValue::String(s) => write!(f, "{}", s),
            PrimitiveValue::Date(d) => write!(f, "{}", d),
            PrimitiveValue::DateTime(dt) => write!(f, "{}", dt),
            PrimitiveValue::Time(t) => write!(f, "{}", t),
            PrimitiveValue::Quantity(q) => write!(f, "{}", q),
        }
    }
}

// ============================================
// Elements
// ============================================

/// A typed node of the host's resource tree
///
/// Implementations must be safe for concurrent reads; compiled expressions
/// can be evaluated against the same tree from several threads.
pub trait Element: fmt::Debug + Send + Sync {
    /// Type name, e.g. `Patient`, `HumanName` or `boolean`
    fn type_name(&self) -> &str;

    /// Type test honouring the element's type hierarchy
    fn is_type(&self, type_name: &str) -> bool {
        self.type_name() == type_name
    }

    /// Children with the given name, in document order; empty when absent
    fn children(&self, name: &str) -> Collection;

    /// All children, in document order
    fn all_children(&self) -> Collection;

    /// Primitive value wrapped by this element (`Patient.active`)
    fn value(&self) -> Option<PrimitiveValue> {
        None
    }
}

/// Structural equality of two elements: type, wrapped value, then children in order
pub fn elements_equal(left: &dyn Element, right: &dyn Element) -> bool {
    if std::ptr::eq(
        left as *const dyn Element as *const u8,
        right as *const dyn Element as *const u8,
    ) {
        return true;
    }
    if left.type_name() != right.type_name() || left.value() != right.value() {
        return false;
    }
    let (lc, rc) = (left.all_children(), right.all_children());
    lc.len() == rc.len() && lc.iter().zip(rc.iter()).all(|(l, r)| l.deep_equals(r))
}

// ============================================
// Node
// ============================================

/// A single item of a collection
#[derive(Clone, Debug)]
pub enum Node {
    Primitive(PrimitiveValue),
    Element(Arc<dyn Element>),
}

impl Node {
    pub fn boolean(value: bool) -> Self {
        Node::Primitive(PrimitiveValue::Boolean(value))
    }

    pub fn integer(value: i64) -> Self {
        Node::Primitive(PrimitiveValue::Integer(value))
    }

    pub fn decimal(value: Decimal) -> Self {
        Node::Primitive(PrimitiveValue::Decimal(value))
    }

    pub fn string(value: impl Into<Arc<str>>) -> Self {
        Node::Primitive(PrimitiveValue::String(value.into()))
    }

    pub fn date(value: PartialDate) -> Self {
        Node::Primitive(PrimitiveValue::Date(value))
    }

    pub fn datetime(value: PartialDateTime) -> Self {
        Node::Primitive(PrimitiveValue::DateTime(value))
    }

    pub fn time(value: PartialTime) -> Self {
        Node::Primitive(PrimitiveValue::Time(value))
    }

    pub fn quantity(value: Decimal, unit: impl Into<Arc<str>>) -> Self {
        Node::Primitive(PrimitiveValue::Quantity(Quantity::new(value, unit)))
    }

    pub fn element(element: impl Element + 'static) -> Self {
        Node::Element(Arc::new(element))
    }

    pub fn type_name(&self) -> &str {
        match self {
            Node::Primitive(p) => p.type_name(),
            Node::Element(e) => e.type_name(),
        }
    }

    pub fn is_primitive(&self) -> bool {
        matches!(self, Node::Primitive(_))
    }

    pub fn is_element(&self) -> bool {
        matches!(self, Node::Element(_))
    }

    /// The node's own primitive, or the value wrapped by an element
    pub fn primitive_value(&self) -> Option<PrimitiveValue> {
        match self {
            Node::Primitive(p) => Some(p.clone()),
            Node::Element(e) => e.value(),
        }
    }

    fn require_primitive(&self, wanted: &str) -> Result<PrimitiveValue> {
        self.primitive_value().ok_or_else(|| {
            Error::TypeMismatch(format!("expected {}, found {}", wanted, self.type_name()))
        })
    }

    pub fn as_boolean(&self) -> Result<bool> {
        self.require_primitive("Boolean")?.as_boolean()
    }

    pub fn as_integer(&self) -> Result<i64> {
        self.require_primitive("Integer")?.as_integer()
    }

    pub fn as_decimal(&self) -> Result<Decimal> {
        self.require_primitive("Decimal")?.as_decimal()
    }

    pub fn as_string(&self) -> Result<Arc<str>> {
        self.require_primitive("String")?.as_string().cloned()
    }

    pub fn as_date(&self) -> Result<PartialDate> {
        self.require_primitive("Date")?.as_date()
    }

    pub fn as_datetime(&self) -> Result<PartialDateTime> {
        self.require_primitive("DateTime")?.as_datetime()
    }

    pub fn as_time(&self) -> Result<PartialTime> {
        self.require_primitive("Time")?.as_time()
    }

    pub fn as_quantity(&self) -> Result<Quantity> {
        self.require_primitive("Quantity")?.as_quantity()
    }

    /// Children by name; primitives have none
    pub fn children(&self, name: &str) -> Collection {
        match self {
            Node::Primitive(_) => Collection::empty(),
            Node::Element(e) => e.children(name),
        }
    }

    pub fn all_children(&self) -> Collection {
        match self {
            Node::Primitive(_) => Collection::empty(),
            Node::Element(e) => e.all_children(),
        }
    }

    /// Structural equality (type and value)
    pub fn deep_equals(&self, other: &Node) -> bool {
        match (self, other) {
            (Node::Primitive(a), Node::Primitive(b)) => a == b,
            (Node::Element(a), Node::Element(b)) => elements_equal(a.as_ref(), b.as_ref()),
            _ => false,
        }
    }
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.deep_equals(other)
    }
}

impl From<PrimitiveValue> for Node {
    fn from(value: PrimitiveValue) -> Self {
        Node::Primitive(value)
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Primitive(p) => write!(f, "{}", p),
            Node::Element(e) => match e.value() {
                Some(value) => write!(f, "{}", value),
                None => write!(f, "{}{{...}}", e.type_name()),
            },
        }
    }
}

// ============================================
// Collection
// ============================================

/// Ordered result of every evaluation
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Collection {
    items: SmallVec<[Node; 1]>,
}

impl Collection {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn singleton(node: Node) -> Self {
        let mut items = SmallVec::new();
        items.push(node);
        Self { items }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            items: SmallVec::with_capacity(capacity),
        }
    }

    pub fn boolean(value: bool) -> Self {
        Self::singleton(Node::boolean(value))
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn push(&mut self, node: Node) {
        self.items.push(node);
    }

    pub fn extend(&mut self, other: Collection) {
        self.items.extend(other.items);
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Node> {
        self.items.iter()
    }

    pub fn get(&self, index: usize) -> Option<&Node> {
        self.items.get(index)
    }

    pub fn first(&self) -> Option<&Node> {
        self.items.first()
    }

    pub fn last(&self) -> Option<&Node> {
        self.items.last()
    }

    pub fn as_slice(&self) -> &[Node] {
        &self.items
    }

    /// Structural membership test
    pub fn contains_node(&self, node: &Node) -> bool {
        self.items.iter().any(|n| n.deep_equals(node))
    }

    /// Append `node` unless a structurally equal node is already present
    pub fn push_distinct(&mut self, node: Node) {
        if !self.contains_node(&node) {
            self.items.push(node);
        }
    }

    /// The single item, failing with `InvalidOperand` unless there is exactly one
    pub fn single(&self, what: &str) -> Result<&Node> {
        match self.items.as_slice() {
            [node] => Ok(node),
            items => Err(Error::InvalidOperand(format!(
                "{} requires a single item, got {}",
                what,
                items.len()
            ))),
        }
    }

    /// Primitive value of a singleton, `None` for an empty collection
    ///
    /// Multi-item collections and elements without a value are invalid operands.
    pub fn singleton_value(&self, what: &str) -> Result<Option<PrimitiveValue>> {
        if self.is_empty() {
            return Ok(None);
        }
        let node = self.single(what)?;
        node.primitive_value().map(Some).ok_or_else(|| {
            Error::InvalidOperand(format!(
                "{} requires a primitive value, got {}",
                what,
                node.type_name()
            ))
        })
    }

    pub fn as_boolean(&self) -> Result<bool> {
        self.single("boolean conversion")?.as_boolean()
    }

    pub fn as_integer(&self) -> Result<i64> {
        self.single("integer conversion")?.as_integer()
    }

    pub fn as_decimal(&self) -> Result<Decimal> {
        self.single("decimal conversion")?.as_decimal()
    }

    pub fn as_string(&self) -> Result<Arc<str>> {
        self.single("string conversion")?.as_string()
    }
}

impl IntoIterator for Collection {
    type Item = Node;
    type IntoIter = smallvec::IntoIter<[Node; 1]>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'a> IntoIterator for &'a Collection {
    type Item = &'a Node;
    type IntoIter = std::slice::Iter<'a, Node>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl FromIterator<Node> for Collection {
    fn from_iter<I: IntoIterator<Item = Node>>(iter: I) -> Self {
        Self {
            items: iter.into_iter().collect(),
        }
    }
}

impl From<Vec<Node>> for Collection {
    fn from(nodes: Vec<Node>) -> Self {
        Self {
            items: SmallVec::from_vec(nodes),
        }
    }
}

impl From<Node> for Collection {
    fn from(node: Node) -> Self {
        Self::singleton(node)
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, node) in self.items.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", node)?;
        }
        write!(f, "]")
    }
}
