//! Error types for the FHIRPath engine

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// FHIRPath lexing, parsing and evaluation errors
///
/// Lex and parse errors abort the parse; every other variant aborts a single
/// evaluation and leaves the engine and compiled expressions reusable.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("Lex error at offset {offset} ('{character}'): {message}")]
    LexError {
        offset: usize,
        character: char,
        message: String,
    },

    #[error("Parse error at offset {offset} near '{token}': {message}")]
    ParseError {
        offset: usize,
        token: String,
        message: String,
    },

    #[error("Unknown function: {0}")]
    UnknownFunction(String),

    #[error("Function '{function}' expects {} argument(s), got {actual}", arity_range(.min, .max))]
    InvalidArity {
        function: String,
        min: usize,
        max: Option<usize>,
        actual: usize,
    },

    #[error("Invalid operand: {0}")]
    InvalidOperand(String),

    #[error("Type mismatch: {0}")]
    TypeMismatch(String),

    #[error("Undefined variable: %{0}")]
    UndefinedVariable(String),
}

fn arity_range(min: &usize, max: &Option<usize>) -> String {
    match *max {
        Some(max) if max == *min => min.to_string(),
        Some(max) => format!("{}..{}", min, max),
        None => format!("at least {}", min),
    }
}

impl Error {
    pub(crate) fn lex(offset: usize, character: char, message: impl Into<String>) -> Self {
        Error::LexError {
            offset,
            character,
            message: message.into(),
        }
    }

    pub(crate) fn parse(offset: usize, token: impl Into<String>, message: impl Into<String>) -> Self {
        Error::ParseError {
            offset,
            token: token.into(),
            message: message.into(),
        }
    }

    /// True for errors raised before evaluation started
    pub fn is_syntax_error(&self) -> bool {
        matches!(self, Error::LexError { .. } | Error::ParseError { .. })
    }
}
