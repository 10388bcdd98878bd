//! Abstract Syntax Tree (AST) representation
//!
//! The AST is a closed set of node kinds produced by the parser. It is
//! immutable once built and carries no type or arity information; names are
//! resolved during evaluation.
//!
//! # Operator precedence (lowest to highest)
//!
//! | Level | Operators                | Associativity |
//! |-------|--------------------------|---------------|
//! | 1     | `implies`                | right         |
//! | 2     | `or` `xor`               | left          |
//! | 3     | `and`                    | left          |
//! | 4     | `in` `contains`          | left          |
//! | 5     | `=` `~` `!=` `!~`        | left          |
//! | 6     | `<` `<=` `>` `>=`        | left          |
//! | 7     | `\|`                     | left          |
//! | 8     | `is` `as`                | left          |
//! | 9     | `+` `-` `&`              | left          |
//! | 10    | `*` `/` `div` `mod`      | left          |
//! | 11    | unary `+` `-`            | right         |
//! | 12    | `.` invocation, `[]`     | left          |

use std::fmt;

use rust_decimal::Decimal;

use crate::token::TokenType;
use crate::value::{DateTimePrecision, PartialDate, PartialDateTime, PartialTime};

/// AST node representing a FHIRPath expression
#[derive(Debug, Clone, PartialEq)]
pub enum AstNode {
    /// Literal value, including the empty literal `{}`
    Literal(Literal),

    /// Collection literal: `{ a, b, c }`
    Collection(Vec<AstNode>),

    /// Leading member name or type name: `Patient`, `name`
    Identifier(String),

    /// Member access: `target.member`
    Invocation {
        target: Box<AstNode>,
        member: String,
    },

    /// Indexer: `target[index]`
    Indexer {
        target: Box<AstNode>,
        index: Box<AstNode>,
    },

    /// Function call; a missing target means the call applies to `$this`
    FunctionCall {
        target: Option<Box<AstNode>>,
        name: String,
        arguments: Vec<AstNode>,
    },

    Unary {
        operator: UnaryOperator,
        operand: Box<AstNode>,
    },

    Binary {
        operator: BinaryOperator,
        left: Box<AstNode>,
        right: Box<AstNode>,
    },

    /// Union of two or more operands: `a | b | c`
    Union(Vec<AstNode>),

    /// `operand is Type` / `operand as Type`
    TypeOp {
        operator: TypeOperator,
        operand: Box<AstNode>,
        type_specifier: QualifiedIdentifier,
    },

    /// `$this`
    This,

    /// `$index`
    Index,

    /// `$total`
    Total,

    /// External constant `%name` (stored without the sigil)
    Variable(String),
}

/// Literal values
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    /// `{}`
    Null,
    Boolean(bool),
    String(String),
    /// Integer literal, also used for `L`-suffixed long literals
    Integer(i64),
    Decimal(Decimal),
    Date(PartialDate),
    DateTime(PartialDateTime),
    Time(PartialTime),
    /// `5 'mg'`, `3 days`
    Quantity { value: Decimal, unit: String },
}

/// Qualified identifier: identifier ('.' identifier)*
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QualifiedIdentifier {
    pub parts: Vec<String>,
}

impl QualifiedIdentifier {
    pub fn new(parts: Vec<String>) -> Self {
        Self { parts }
    }

    pub fn single(name: impl Into<String>) -> Self {
        Self {
            parts: vec![name.into()],
        }
    }
}

impl fmt::Display for QualifiedIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.parts.join("."))
    }
}

// ============================================
// Operator types
// ============================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOperator {
    Plus,  // +
    Minus, // -
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeOperator {
    Is, // is
    As, // as
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    // Multiplicative
    Multiply, // *
    Divide,   // /
    Div,      // div
    Mod,      // mod

    // Additive
    Add,      // +
    Subtract, // -
    Concat,   // &

    // Inequality
    LessThan,           // <
    LessThanOrEqual,    // <=
    GreaterThan,        // >
    GreaterThanOrEqual, // >=

    // Equality
    Equal,         // =
    Equivalent,    // ~
    NotEqual,      // !=
    NotEquivalent, // !~

    // Membership
    In,       // in
    Contains, // contains

    // Logic
    And,     // and
    Or,      // or
    Xor,     // xor
    Implies, // implies
}

impl BinaryOperator {
    pub fn from_token(token_type: TokenType) -> Option<Self> {
        Some(match token_type {
            TokenType::Multiply => BinaryOperator::Multiply,
            TokenType::Divide => BinaryOperator::Divide,
            TokenType::Div => BinaryOperator::Div,
            TokenType::Mod => BinaryOperator::Mod,
            TokenType::Plus => BinaryOperator::Add,
            TokenType::Minus => BinaryOperator::Subtract,
            TokenType::Ampersand => BinaryOperator::Concat,
            TokenType::LessThan => BinaryOperator::LessThan,
            TokenType::LessThanOrEqual => BinaryOperator::LessThanOrEqual,
            TokenType::GreaterThan => BinaryOperator::GreaterThan,
            TokenType::GreaterThanOrEqual => BinaryOperator::GreaterThanOrEqual,
            TokenType::Equal => BinaryOperator::Equal,
            TokenType::Equivalent => BinaryOperator::Equivalent,
            TokenType::NotEqual => BinaryOperator::NotEqual,
            TokenType::NotEquivalent => BinaryOperator::NotEquivalent,
            TokenType::In => BinaryOperator::In,
            TokenType::Contains => BinaryOperator::Contains,
            TokenType::And => BinaryOperator::And,
            TokenType::Or => BinaryOperator::Or,
            TokenType::Xor => BinaryOperator::Xor,
            TokenType::Implies => BinaryOperator::Implies,
            _ => return None,
        })
    }

    /// Binding strength; see the module table
    pub fn precedence(self) -> u8 {
        match self {
            BinaryOperator::Implies => 1,
            BinaryOperator::Or | BinaryOperator::Xor => 2,
            BinaryOperator::And => 3,
            BinaryOperator::In | BinaryOperator::Contains => 4,
            BinaryOperator::Equal
            | BinaryOperator::Equivalent
            | BinaryOperator::NotEqual
            | BinaryOperator::NotEquivalent => 5,
            BinaryOperator::LessThan
            | BinaryOperator::LessThanOrEqual
            | BinaryOperator::GreaterThan
            | BinaryOperator::GreaterThanOrEqual => 6,
            BinaryOperator::Add | BinaryOperator::Subtract | BinaryOperator::Concat => 9,
            BinaryOperator::Multiply
            | BinaryOperator::Divide
            | BinaryOperator::Div
            | BinaryOperator::Mod => 10,
        }
    }

    pub fn is_right_associative(self) -> bool {
        self == BinaryOperator::Implies
    }

    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOperator::Multiply => "*",
            BinaryOperator::Divide => "/",
            BinaryOperator::Div => "div",
            BinaryOperator::Mod => "mod",
            BinaryOperator::Add => "+",
            BinaryOperator::Subtract => "-",
            BinaryOperator::Concat => "&",
            BinaryOperator::LessThan => "<",
            BinaryOperator::LessThanOrEqual => "<=",
            BinaryOperator::GreaterThan => ">",
            BinaryOperator::GreaterThanOrEqual => ">=",
            BinaryOperator::Equal => "=",
            BinaryOperator::Equivalent => "~",
            BinaryOperator::NotEqual => "!=",
            BinaryOperator::NotEquivalent => "!~",
            BinaryOperator::In => "in",
            BinaryOperator::Contains => "contains",
            BinaryOperator::And => "and",
            BinaryOperator::Or => "or",
            BinaryOperator::Xor => "xor",
            BinaryOperator::Implies => "implies",
        }
    }
}

/// Precedence of `|`
pub const UNION_PRECEDENCE: u8 = 7;

/// Precedence of `is` / `as`
pub const TYPE_PRECEDENCE: u8 = 8;

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Null => write!(f, "{{}}"),
            Literal::Boolean(b) => write!(f, "{}", b),
            Literal::String(s) => write!(f, "'{}'", s.replace('\\', "\\\\").replace('\'', "\\'")),
            Literal::Integer(i) => write!(f, "{}", i),
            Literal::Decimal(d) => write!(f, "{}", d),
            Literal::Date(d) => write!(f, "@{}", d),
            Literal::DateTime(dt) if dt.precision <= DateTimePrecision::Day => write!(f, "@{}T", dt),
            Literal::DateTime(dt) => write!(f, "@{}", dt),
            Literal::Time(t) => write!(f, "@T{}", t),
            Literal::Quantity { value, unit } => match crate::value::calendar_keyword(unit) {
                Some(_) => write!(f, "{} {}", value, unit),
                None => write!(f, "{} '{}'", value, unit),
            },
        }
    }
}

/// Fully parenthesised rendering, mainly for diagnostics
impl fmt::Display for AstNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AstNode::Literal(literal) => write!(f, "{}", literal),
            AstNode::Collection(items) => {
                write!(f, "{{")?;
                write_list(f, items)?;
                write!(f, "}}")
            }
            AstNode::Identifier(name) => write!(f, "{}", name),
            AstNode::Invocation { target, member } => write!(f, "{}.{}", target, member),
            AstNode::Indexer { target, index } => write!(f, "{}[{}]", target, index),
            AstNode::FunctionCall {
                target,
                name,
                arguments,
            } => {
                if let Some(target) = target {
                    write!(f, "{}.", target)?;
                }
                write!(f, "{}(", name)?;
                write_list(f, arguments)?;
                write!(f, ")")
            }
            AstNode::Unary { operator, operand } => match operator {
                UnaryOperator::Plus => write!(f, "(+{})", operand),
                UnaryOperator::Minus => write!(f, "(-{})", operand),
            },
            AstNode::Binary {
                operator,
                left,
                right,
            } => write!(f, "({} {} {})", left, operator.symbol(), right),
            AstNode::Union(operands) => {
                write!(f, "(")?;
                for (i, operand) in operands.iter().enumerate() {
                    if i > 0 {
                        write!(f, " | ")?;
                    }
                    write!(f, "{}", operand)?;
                }
                write!(f, ")")
            }
            AstNode::TypeOp {
                operator,
                operand,
                type_specifier,
            } => match operator {
                TypeOperator::Is => write!(f, "({} is {})", operand, type_specifier),
                TypeOperator::As => write!(f, "({} as {})", operand, type_specifier),
            },
            AstNode::This => write!(f, "$this"),
            AstNode::Index => write!(f, "$index"),
            AstNode::Total => write!(f, "$total"),
            AstNode::Variable(name) => write!(f, "%{}", name),
        }
    }
}

fn write_list(f: &mut fmt::Formatter<'_>, items: &[AstNode]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}", item)?;
    }
    Ok(())
}
