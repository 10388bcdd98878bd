//! Token types for the FHIRPath lexer
//!
//! Tokens represent the lexical elements of FHIRPath expressions.

/// Token types for the FHIRPath lexer
#[derive(Debug, PartialEq, Clone, Copy, Eq)]
pub enum TokenType {
    // Literals
    StringLiteral,
    NumberLiteral,
    LongNumberLiteral,
    DateLiteral,
    DateTimeLiteral,
    TimeLiteral,
    BooleanLiteral,

    // Identifiers
    Identifier,
    DelimitedIdentifier,

    // Keywords
    As,
    Is,
    Div,
    Mod,
    In,
    Contains,
    And,
    Or,
    Xor,
    Implies,
    This,  // $this
    Index, // $index
    Total, // $total

    // External constant
    ExternalConstant, // %identifier, %'string' or %`identifier`

    // Operators
    Dot,                // .
    OpenBracket,        // [
    CloseBracket,       // ]
    Plus,               // +
    Minus,              // -
    Multiply,           // *
    Divide,             // /
    Ampersand,          // &
    Pipe,               // |
    LessThanOrEqual,    // <=
    LessThan,           // <
    GreaterThanOrEqual, // >=
    GreaterThan,        // >
    Equal,              // =
    Equivalent,         // ~
    NotEqual,           // !=
    NotEquivalent,      // !~

    // Delimiters
    OpenParen,  // (
    CloseParen, // )
    OpenBrace,  // {
    CloseBrace, // }
    Comma,      // ,

    // End of input
    Eof,
}

impl TokenType {
    /// Keywords that may still name a member or function (`x.contains('a')`, `x.as(String)`)
    pub fn is_keyword(self) -> bool {
        matches!(
            self,
            TokenType::As
                | TokenType::Is
                | TokenType::Div
                | TokenType::Mod
                | TokenType::In
                | TokenType::Contains
                | TokenType::And
                | TokenType::Or
                | TokenType::Xor
                | TokenType::Implies
        )
    }
}

/// A token in the FHIRPath expression
///
/// `value` holds the decoded text: escapes are resolved for strings and
/// delimited identifiers, and the `%` sigil is stripped from external constants.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub token_type: TokenType,
    pub value: String,
    pub position: usize,
    pub line: usize,
    pub column: usize,
}

impl Token {
    pub fn new(
        token_type: TokenType,
        value: String,
        position: usize,
        line: usize,
        column: usize,
    ) -> Self {
        Self {
            token_type,
            value,
            position,
            line,
            column,
        }
    }

    pub fn eof(position: usize, line: usize, column: usize) -> Self {
        Self {
            token_type: TokenType::Eof,
            value: String::new(),
            position,
            line,
            column,
        }
    }

    /// Identifier-like tokens usable as a member or function name
    pub fn is_name(&self) -> bool {
        matches!(
            self.token_type,
            TokenType::Identifier | TokenType::DelimitedIdentifier
        ) || self.token_type.is_keyword()
    }
}
