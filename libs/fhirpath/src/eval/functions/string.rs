//! String manipulation functions for FHIRPath.
//!
//! All functions take a single String input: empty input yields empty, more
//! than one item or a non-string item is an invalid operand. Positions and
//! lengths count characters, not bytes.

use regex::Regex;

use crate::error::{Error, Result};
use crate::value::{Collection, Node, PrimitiveValue};

use super::helpers::{boolean, integer_arg, string_arg, string_input};

fn string(value: impl Into<std::sync::Arc<str>>) -> Result<Collection> {
    Ok(Collection::singleton(Node::string(value)))
}

fn integer(value: usize) -> Result<Collection> {
    Ok(Collection::singleton(Node::integer(value as i64)))
}

/// Character position of a byte offset
fn char_position(s: &str, byte_offset: usize) -> usize {
    s[..byte_offset].chars().count()
}

/// Compile a FHIRPath regular expression
///
/// Patterns run in single-line mode (`.` matches newlines).
fn compile_regex(pattern: &str, anchored: bool, function: &str) -> Result<Regex> {
    let source = if anchored {
        format!("(?s)^(?:{})$", pattern)
    } else {
        format!("(?s){}", pattern)
    };
    Regex::new(&source).map_err(|e| {
        Error::InvalidOperand(format!("{}(): invalid regular expression: {}", function, e))
    })
}

/// Unwraps the string input and the string arguments, or returns empty
macro_rules! strings_or_empty {
    ($input:expr, $function:literal $(, $arg:ident)*) => {{
        let Some(input) = string_input(&$input, $function)? else {
            return Ok(Collection::empty());
        };
        $(
            let Some($arg) = string_arg($arg, $function)? else {
                return Ok(Collection::empty());
            };
        )*
        (input $(, $arg)*)
    }};
}

pub fn index_of(collection: Collection, substring: &Collection) -> Result<Collection> {
    let (input, substring) = strings_or_empty!(collection, "indexOf", substring);
    match input.find(&*substring) {
        Some(offset) => integer(char_position(&input, offset)),
        None => Ok(Collection::singleton(Node::integer(-1))),
    }
}

pub fn last_index_of(collection: Collection, substring: &Collection) -> Result<Collection> {
    let (input, substring) = strings_or_empty!(collection, "lastIndexOf", substring);
    match input.rfind(&*substring) {
        Some(offset) => integer(char_position(&input, offset)),
        None => Ok(Collection::singleton(Node::integer(-1))),
    }
}

/// `substring(start [, length])`; a start outside the string yields empty
pub fn substring(
    collection: Collection,
    start: &Collection,
    length: Option<&Collection>,
) -> Result<Collection> {
    let Some(input) = string_input(&collection, "substring")? else {
        return Ok(Collection::empty());
    };
    let Some(start) = integer_arg(start, "substring")? else {
        return Ok(Collection::empty());
    };
    let length = match length {
        Some(length) => integer_arg(length, "substring")?,
        None => None,
    };

    let char_count = input.chars().count();
    let Ok(start) = usize::try_from(start) else {
        return Ok(Collection::empty());
    };
    if start >= char_count {
        return Ok(Collection::empty());
    }

    let take = match length {
        Some(length) => usize::try_from(length).unwrap_or(0),
        None => char_count,
    };
    string(input.chars().skip(start).take(take).collect::<String>())
}

pub fn starts_with(collection: Collection, prefix: &Collection) -> Result<Collection> {
    let (input, prefix) = strings_or_empty!(collection, "startsWith", prefix);
    boolean(input.starts_with(&*prefix))
}

pub fn ends_with(collection: Collection, suffix: &Collection) -> Result<Collection> {
    let (input, suffix) = strings_or_empty!(collection, "endsWith", suffix);
    boolean(input.ends_with(&*suffix))
}

pub fn contains_str(collection: Collection, substring: &Collection) -> Result<Collection> {
    let (input, substring) = strings_or_empty!(collection, "contains", substring);
    boolean(input.contains(&*substring))
}

pub fn upper(collection: Collection) -> Result<Collection> {
    let input = strings_or_empty!(collection, "upper");
    string(input.to_uppercase())
}

pub fn lower(collection: Collection) -> Result<Collection> {
    let input = strings_or_empty!(collection, "lower");
    string(input.to_lowercase())
}

pub fn replace(
    collection: Collection,
    pattern: &Collection,
    substitution: &Collection,
) -> Result<Collection> {
    let (input, pattern, substitution) =
        strings_or_empty!(collection, "replace", pattern, substitution);
    string(input.replace(&*pattern, &substitution))
}

/// Whole-string regular expression match
pub fn matches(collection: Collection, regex: &Collection) -> Result<Collection> {
    let (input, regex) = strings_or_empty!(collection, "matches", regex);
    let regex = compile_regex(&regex, true, "matches")?;
    boolean(regex.is_match(&input))
}

pub fn matches_full(collection: Collection, regex: &Collection) -> Result<Collection> {
    let (input, regex) = strings_or_empty!(collection, "matchesFull", regex);
    let regex = compile_regex(&regex, true, "matchesFull")?;
    boolean(regex.is_match(&input))
}

/// Replace every match; `$1` / `${name}` refer to capture groups
pub fn replace_matches(
    collection: Collection,
    regex: &Collection,
    substitution: &Collection,
) -> Result<Collection> {
    let (input, regex, substitution) =
        strings_or_empty!(collection, "replaceMatches", regex, substitution);
    if regex.is_empty() {
        return string(input);
    }
    let regex = compile_regex(&regex, false, "replaceMatches")?;
    string(regex.replace_all(&input, &*substitution).into_owned())
}

pub fn length(collection: Collection) -> Result<Collection> {
    let input = strings_or_empty!(collection, "length");
    integer(input.chars().count())
}

pub fn to_chars(collection: Collection) -> Result<Collection> {
    let input = strings_or_empty!(collection, "toChars");
    Ok(input.chars().map(|c| Node::string(c.to_string())).collect())
}

pub fn trim(collection: Collection) -> Result<Collection> {
    let input = strings_or_empty!(collection, "trim");
    string(input.trim())
}

/// Split on a literal separator; an empty separator splits into characters
pub fn split(collection: Collection, separator: &Collection) -> Result<Collection> {
    let (input, separator) = strings_or_empty!(collection, "split", separator);
    if separator.is_empty() {
        return to_chars(Collection::singleton(Node::string(input)));
    }
    Ok(input
        .split(&*separator)
        .map(Node::string)
        .collect())
}

/// Join a collection of strings, with an optional separator
pub fn join(collection: Collection, separator: Option<&Collection>) -> Result<Collection> {
    if collection.is_empty() {
        return Ok(Collection::empty());
    }
    let separator = match separator {
        Some(separator) => string_arg(separator, "join")?,
        None => None,
    };

    let mut parts = Vec::with_capacity(collection.len());
    for item in &collection {
        match item.primitive_value() {
            Some(PrimitiveValue::String(s)) => parts.push(s),
            _ => {
                return Err(Error::InvalidOperand(format!(
                    "join() requires String items, got {}",
                    item.type_name()
                )))
            }
        }
    }
    string(parts.join(separator.as_deref().unwrap_or("")))
}
