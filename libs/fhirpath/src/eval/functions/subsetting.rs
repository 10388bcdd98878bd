//! Subsetting functions for FHIRPath.
//!
//! Shape-only functions: none of them fail on an empty input.

use crate::error::{Error, Result};
use crate::eval::operations::{contains_equal, push_unique};
use crate::value::Collection;

use super::helpers::integer_arg;

pub fn single(collection: Collection) -> Result<Collection> {
    match collection.len() {
        0 | 1 => Ok(collection),
        n => Err(Error::InvalidOperand(format!(
            "single() requires at most one item, got {}",
            n
        ))),
    }
}

pub fn first(collection: Collection) -> Result<Collection> {
    Ok(collection.into_iter().take(1).collect())
}

pub fn last(collection: Collection) -> Result<Collection> {
    Ok(collection.last().cloned().map(Collection::singleton).unwrap_or_default())
}

pub fn tail(collection: Collection) -> Result<Collection> {
    Ok(collection.into_iter().skip(1).collect())
}

pub fn skip(collection: Collection, num: &Collection) -> Result<Collection> {
    let Some(num) = integer_arg(num, "skip")? else {
        return Ok(Collection::empty());
    };
    let num = usize::try_from(num).unwrap_or(0);
    Ok(collection.into_iter().skip(num).collect())
}

pub fn take(collection: Collection, num: &Collection) -> Result<Collection> {
    let Some(num) = integer_arg(num, "take")? else {
        return Ok(Collection::empty());
    };
    let num = usize::try_from(num).unwrap_or(0);
    Ok(collection.into_iter().take(num).collect())
}

/// Items present in both collections, without duplicates
pub fn intersect(collection: Collection, other: &Collection) -> Result<Collection> {
    let mut result = Collection::empty();
    for item in collection {
        if contains_equal(other, &item) {
            push_unique(&mut result, item);
        }
    }
    Ok(result)
}

/// Items not present in `other`; duplicates and order are kept
pub fn exclude(collection: Collection, other: &Collection) -> Result<Collection> {
    Ok(collection
        .into_iter()
        .filter(|item| !contains_equal(other, item))
        .collect())
}
