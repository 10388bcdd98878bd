//! Integration tests for the full FHIRPath pipeline

#[path = "../test_support/mod.rs"]
mod test_support;

mod external_constants;
mod test_as;
mod test_concurrency;
mod test_date_eq;
mod test_function_parsing;
mod test_integration;
