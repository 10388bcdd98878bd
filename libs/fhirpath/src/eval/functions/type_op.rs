//! Boolean and type functions: `not()`, `is()`, `as()`.
//!
//! `is()` and `as()` share their semantics with the `is` / `as` operators.

use crate::error::Result;
use crate::eval::operations::truth_value;
use crate::types::TypeSpecifier;
use crate::value::Collection;

pub fn not(collection: Collection) -> Result<Collection> {
    Ok(truth_value(&collection, "not")?
        .map(|b| Collection::boolean(!b))
        .unwrap_or_default())
}

pub fn is_type(collection: Collection, type_specifier: &TypeSpecifier) -> Result<Collection> {
    crate::eval::is_type(&collection, type_specifier)
}

pub fn as_type(collection: Collection, type_specifier: &TypeSpecifier) -> Result<Collection> {
    crate::eval::as_type(&collection, type_specifier)
}
