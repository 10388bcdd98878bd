//! FHIRPath Engine - tokenizer, parser and tree-walking evaluator
//!
//! # Architecture Overview
//!
//! ```text
//! Expression String
//!      |
//!   Lexer -> Tokens
//!      |
//!   Parser -> AST (immutable, cached by the engine)
//!      |
//!   Evaluator + Function Library -> Result Collection
//! ```
//!
//! Data is reached through the [`Element`] trait, so any tree-shaped typed
//! model can be navigated. [`ElementNode`] is a ready-made implementation,
//! buildable from JSON with [`Node::from_json`].
//!
//! ```rust
//! use ferrum_path::{evaluate, Collection, Node};
//!
//! let input: Collection = vec![Node::integer(1), Node::integer(2), Node::integer(3)].into();
//! let result = evaluate("where($this > 1).count()", input).unwrap();
//! assert_eq!(result.as_integer().unwrap(), 2);
//! ```

pub mod ast;
pub mod context;
pub mod element;
pub mod engine;
pub mod error;
pub mod eval;
pub mod functions;
pub mod lexer;
pub mod parser;
mod temporal_parse;
pub mod token;
pub mod types;
pub mod value;

// Re-export main types
pub use ast::AstNode;
pub use context::Context;
pub use element::ElementNode;
pub use engine::{Engine, EngineOptions, Expression};
pub use error::{Error, Result};
pub use eval::Evaluator;
pub use functions::{FunctionId, FunctionRegistry};
pub use lexer::tokenize;
pub use types::TypeSpecifier;
pub use value::{
    Collection, Element, Node, PartialDate, PartialDateTime, PartialTime, PrimitiveValue, Quantity,
};

/// Tokenize and parse an expression into an AST
pub fn parse(expr: &str) -> Result<AstNode> {
    parser::parse(expr)
}

/// One-shot evaluation of `expr` against `input`
///
/// Uses a fresh, uncached engine; hold an [`Engine`] to evaluate repeatedly.
pub fn evaluate(expr: &str, input: impl Into<Collection>) -> Result<Collection> {
    let registry = FunctionRegistry::new();
    let ast = parse(expr)?;
    Evaluator::new(&registry).eval(&ast, &Context::new(input))
}
