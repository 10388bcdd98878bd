//! Function registry for FHIRPath functions
//!
//! Maps function names to [`FunctionId`] and provides the arity contract of
//! each function. Arity is checked by the evaluator before any argument is
//! evaluated.
//!
//! Uses a compile-time perfect hash map (phf) for O(1) function name lookups with zero runtime allocation.

use phf::phf_map;

use crate::error::{Error, Result};

/// Identifier of a built-in function
///
/// Discriminants are grouped by category, the same way the catalogue below is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum FunctionId {
    // Boolean / type
    Not = 0,
    As = 1,
    Is = 2,

    // Existence
    Empty = 10,
    Exists = 11,
    All = 12,
    AllTrue = 13,
    AnyTrue = 14,
    AllFalse = 15,
    AnyFalse = 16,
    SubsetOf = 17,
    SupersetOf = 18,
    Count = 19,
    Distinct = 20,
    IsDistinct = 21,
    HasValue = 22,

    // Filtering and projection
    Where = 30,
    Select = 31,
    Repeat = 32,
    OfType = 33,
    Extension = 34,

    // Subsetting
    Single = 40,
    First = 41,
    Last = 42,
    Tail = 43,
    Skip = 44,
    Take = 45,
    Intersect = 46,
    Exclude = 47,

    // Combining
    Union = 50,
    Combine = 51,

    // Conversion
    Iif = 60,
    ToBoolean = 61,
    ConvertsToBoolean = 62,
    ToInteger = 63,
    ConvertsToInteger = 64,
    ToDecimal = 65,
    ConvertsToDecimal = 66,
    ToString = 67,
    ConvertsToString = 68,
    ToDate = 69,
    ConvertsToDate = 70,
    ToDateTime = 71,
    ConvertsToDateTime = 72,
    ToTime = 73,
    ConvertsToTime = 74,
    ToQuantity = 75,
    ConvertsToQuantity = 76,

    // String
    IndexOf = 80,
    LastIndexOf = 81,
    Substring = 82,
    StartsWith = 83,
    EndsWith = 84,
    Contains = 85,
    Upper = 86,
    Lower = 87,
    Replace = 88,
    Matches = 89,
    MatchesFull = 90,
    ReplaceMatches = 91,
    Length = 92,
    ToChars = 93,
    Trim = 94,
    Split = 95,
    Join = 96,

    // Math
    Abs = 100,
    Ceiling = 101,
    Exp = 102,
    Floor = 103,
    Ln = 104,
    Log = 105,
    Power = 106,
    Round = 107,
    Sqrt = 108,
    Truncate = 109,

    // Tree navigation
    Children = 110,
    Descendants = 111,

    // Utility
    Trace = 120,
    Now = 121,
    Today = 122,
    TimeOfDay = 123,

    // Aggregate
    Aggregate = 130,
}

/// Function metadata
#[derive(Debug, Clone, Copy)]
pub struct FunctionMetadata {
    pub id: FunctionId,
    pub name: &'static str,
    pub min_args: usize,
    pub max_args: Option<usize>, // None = unbounded
}

macro_rules! function {
    ($id:ident, $name:literal, $min:literal, $max:literal) => {
        FunctionMetadata {
            id: FunctionId::$id,
            name: $name,
            min_args: $min,
            max_args: Some($max),
        }
    };
}

/// Static compile-time function registry using perfect hash map
static FUNCTIONS_BY_NAME: phf::Map<&'static str, FunctionMetadata> = phf_map! {
    // Boolean / type functions
    "not" => function!(Not, "not", 0, 0),
    "as" => function!(As, "as", 1, 1),
    "is" => function!(Is, "is", 1, 1),

    // Existence functions
    "empty" => function!(Empty, "empty", 0, 0),
    "exists" => function!(Exists, "exists", 0, 1),
    "all" => function!(All, "all", 1, 1),
    "allTrue" => function!(AllTrue, "allTrue", 0, 0),
    "anyTrue" => function!(AnyTrue, "anyTrue", 0, 0),
    "allFalse" => function!(AllFalse, "allFalse", 0, 0),
    "anyFalse" => function!(AnyFalse, "anyFalse", 0, 0),
    "subsetOf" => function!(SubsetOf, "subsetOf", 1, 1),
    "supersetOf" => function!(SupersetOf, "supersetOf", 1, 1),
    "count" => function!(Count, "count", 0, 0),
    "distinct" => function!(Distinct, "distinct", 0, 0),
    "isDistinct" => function!(IsDistinct, "isDistinct", 0, 0),
    "hasValue" => function!(HasValue, "hasValue", 0, 0),

    // Filtering and projection functions
    "where" => function!(Where, "where", 1, 1),
    "select" => function!(Select, "select", 1, 1),
    "repeat" => function!(Repeat, "repeat", 1, 1),
    "ofType" => function!(OfType, "ofType", 1, 1),
    "extension" => function!(Extension, "extension", 1, 1),

    // Subsetting functions
    "single" => function!(Single, "single", 0, 0),
    "first" => function!(First, "first", 0, 0),
    "last" => function!(Last, "last", 0, 0),
    "tail" => function!(Tail, "tail", 0, 0),
    "skip" => function!(Skip, "skip", 1, 1),
    "take" => function!(Take, "take", 1, 1),
    "intersect" => function!(Intersect, "intersect", 1, 1),
    "exclude" => function!(Exclude, "exclude", 1, 1),

    // Combining functions
    "union" => function!(Union, "union", 1, 1),
    "combine" => function!(Combine, "combine", 1, 1),

    // Conversion functions
    "iif" => function!(Iif, "iif", 2, 3),
    "toBoolean" => function!(ToBoolean, "toBoolean", 0, 0),
    "convertsToBoolean" => function!(ConvertsToBoolean, "convertsToBoolean", 0, 0),
    "toInteger" => function!(ToInteger, "toInteger", 0, 0),
    "convertsToInteger" => function!(ConvertsToInteger, "convertsToInteger", 0, 0),
    "toDecimal" => function!(ToDecimal, "toDecimal", 0, 0),
    "convertsToDecimal" => function!(ConvertsToDecimal, "convertsToDecimal", 0, 0),
    "toString" => function!(ToString, "toString", 0, 0),
    "convertsToString" => function!(ConvertsToString, "convertsToString", 0, 0),
    "toDate" => function!(ToDate, "toDate", 0, 0),
    "convertsToDate" => function!(ConvertsToDate, "convertsToDate", 0, 0),
    "toDateTime" => function!(ToDateTime, "toDateTime", 0, 0),
    "convertsToDateTime" => function!(ConvertsToDateTime, "convertsToDateTime", 0, 0),
    "toTime" => function!(ToTime, "toTime", 0, 0),
    "convertsToTime" => function!(ConvertsToTime, "convertsToTime", 0, 0),
    "toQuantity" => function!(ToQuantity, "toQuantity", 0, 1),
    "convertsToQuantity" => function!(ConvertsToQuantity, "convertsToQuantity", 0, 1),

    // String manipulation functions
    "indexOf" => function!(IndexOf, "indexOf", 1, 1),
    "lastIndexOf" => function!(LastIndexOf, "lastIndexOf", 1, 1),
    "substring" => function!(Substring, "substring", 1, 2),
    "startsWith" => function!(StartsWith, "startsWith", 1, 1),
    "endsWith" => function!(EndsWith, "endsWith", 1, 1),
    "contains" => function!(Contains, "contains", 1, 1),
    "upper" => function!(Upper, "upper", 0, 0),
    "lower" => function!(Lower, "lower", 0, 0),
    "replace" => function!(Replace, "replace", 2, 2),
    "matches" => function!(Matches, "matches", 1, 1),
    "matchesFull" => function!(MatchesFull, "matchesFull", 1, 1),
    "replaceMatches" => function!(ReplaceMatches, "replaceMatches", 2, 2),
    "length" => function!(Length, "length", 0, 0),
    "toChars" => function!(ToChars, "toChars", 0, 0),
    "trim" => function!(Trim, "trim", 0, 0),
    "split" => function!(Split, "split", 1, 1),
    "join" => function!(Join, "join", 0, 1),

    // Math functions
    "abs" => function!(Abs, "abs", 0, 0),
    "ceiling" => function!(Ceiling, "ceiling", 0, 0),
    "exp" => function!(Exp, "exp", 0, 0),
    "floor" => function!(Floor, "floor", 0, 0),
    "ln" => function!(Ln, "ln", 0, 0),
    "log" => function!(Log, "log", 1, 1),
    "power" => function!(Power, "power", 1, 1),
    "round" => function!(Round, "round", 0, 1),
    "sqrt" => function!(Sqrt, "sqrt", 0, 0),
    "truncate" => function!(Truncate, "truncate", 0, 0),

    // Tree navigation functions
    "children" => function!(Children, "children", 0, 0),
    "descendants" => function!(Descendants, "descendants", 0, 0),

    // Utility functions
    "trace" => function!(Trace, "trace", 1, 2),
    "now" => function!(Now, "now", 0, 0),
    "today" => function!(Today, "today", 0, 0),
    "timeOfDay" => function!(TimeOfDay, "timeOfDay", 0, 0),

    // Aggregate functions
    "aggregate" => function!(Aggregate, "aggregate", 1, 2),
};

/// Function registry
///
/// Provides fast function lookups using a compile-time perfect hash map.
/// Lookups by id go through a dense index built once at construction.
pub struct FunctionRegistry {
    functions_by_id: Vec<Option<FunctionMetadata>>,
}

impl FunctionRegistry {
    pub fn new() -> Self {
        let mut registry = Self {
            functions_by_id: Vec::new(),
        };

        registry.build_id_index();
        registry
    }

    fn build_id_index(&mut self) {
        let max_id = FUNCTIONS_BY_NAME
            .values()
            .map(|m| m.id as usize)
            .max()
            .unwrap_or(0);

        self.functions_by_id.resize(max_id + 1, None);

        for metadata in FUNCTIONS_BY_NAME.values() {
            self.functions_by_id[metadata.id as usize] = Some(*metadata);
        }
    }

    /// Resolve function name to FunctionId
    pub fn resolve(&self, name: &str) -> Option<FunctionId> {
        FUNCTIONS_BY_NAME.get(name).map(|m| m.id)
    }

    /// Get function metadata by ID
    pub fn get_metadata(&self, id: FunctionId) -> Option<&FunctionMetadata> {
        self.functions_by_id.get(id as usize)?.as_ref()
    }

    /// Resolve `name` and check it accepts `arg_count` arguments
    pub fn lookup(&self, name: &str, arg_count: usize) -> Result<FunctionId> {
        let id = self
            .resolve(name)
            .ok_or_else(|| Error::UnknownFunction(name.to_string()))?;
        self.validate_args(id, arg_count)?;
        Ok(id)
    }

    /// Validate function call arguments
    pub fn validate_args(&self, id: FunctionId, arg_count: usize) -> Result<()> {
        let metadata = self
            .get_metadata(id)
            .ok_or_else(|| Error::UnknownFunction(format!("{:?}", id)))?;

        let too_many = metadata.max_args.is_some_and(|max| arg_count > max);
        if arg_count < metadata.min_args || too_many {
            return Err(Error::InvalidArity {
                function: metadata.name.to_string(),
                min: metadata.min_args,
                max: metadata.max_args,
                actual: arg_count,
            });
        }

        Ok(())
    }

    /// Get all registered function names (for testing/debugging)
    pub fn all_function_names(&self) -> Vec<&'static str> {
        FUNCTIONS_BY_NAME.keys().copied().collect()
    }
}

impl Default for FunctionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
