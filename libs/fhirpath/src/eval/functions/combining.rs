//! Combining functions for FHIRPath.

use crate::error::Result;
use crate::eval::operations::push_unique;
use crate::value::Collection;

/// Same as the `|` operator
pub fn union_func(collection: Collection, other: &Collection) -> Result<Collection> {
    let mut result = Collection::with_capacity(collection.len() + other.len());
    for item in collection.into_iter().chain(other.iter().cloned()) {
        push_unique(&mut result, item);
    }
    Ok(result)
}

/// Concatenation; duplicates are kept
pub fn combine(mut collection: Collection, other: &Collection) -> Result<Collection> {
    collection.extend(other.clone());
    Ok(collection)
}
