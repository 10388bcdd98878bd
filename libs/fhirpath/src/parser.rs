//! FHIRPath parser - converts token streams to AST
//!
//! Binary operators are parsed by precedence climbing over the table in
//! [`crate::ast`]; terms, invocations, indexers and function calls by
//! recursive descent. No type or arity checking happens here.

use std::str::FromStr;

use rust_decimal::Decimal;

use crate::ast::*;
use crate::error::{Error, Result};
use crate::lexer::tokenize;
use crate::temporal_parse;
use crate::token::{Token, TokenType};
use crate::value::calendar_keyword;

/// Default nesting limit for parenthesised and operator sub-expressions
pub const MAX_RECURSION_DEPTH: usize = 200;

/// A parsed sub-expression with the depth of its tree
type Parsed = (AstNode, usize);

/// Tokenize and parse an expression
pub fn parse(input: &str) -> Result<AstNode> {
    Parser::new(tokenize(input)?).parse()
}

/// Parser for FHIRPath expressions
pub struct Parser {
    tokens: Vec<Token>,
    position: usize,
    eof: Token,
    recursion_depth: usize,
    max_depth: usize,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        let eof = match tokens.last() {
            Some(last) if last.token_type == TokenType::Eof => last.clone(),
            Some(last) => Token::eof(last.position + last.value.chars().count(), last.line, last.column),
            None => Token::eof(0, 1, 1),
        };
        Self {
            tokens,
            position: 0,
            eof,
            recursion_depth: 0,
            max_depth: MAX_RECURSION_DEPTH,
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    fn current_token(&self) -> &Token {
        self.tokens.get(self.position).unwrap_or(&self.eof)
    }

    fn peek_token(&self) -> &Token {
        self.tokens.get(self.position + 1).unwrap_or(&self.eof)
    }

    fn advance(&mut self) -> Token {
        let token = self.current_token().clone();
        if self.position < self.tokens.len() {
            self.position += 1;
        }
        token
    }

    fn current_token_is(&self, token_type: TokenType) -> bool {
        self.current_token().token_type == token_type
    }

    fn current_token_is_one_of(&self, types: &[TokenType]) -> bool {
        types.contains(&self.current_token().token_type)
    }

    fn error_at_current(&self, message: impl Into<String>) -> Error {
        let token = self.current_token();
        let text = if token.token_type == TokenType::Eof {
            "<end of input>".to_string()
        } else {
            token.value.clone()
        };
        Error::parse(token.position, text, message)
    }

    /// Expect a specific token type and advance
    fn expect(&mut self, token_type: TokenType, what: &str) -> Result<Token> {
        if self.current_token_is(token_type) {
            Ok(self.advance())
        } else {
            Err(self.error_at_current(format!("Expected {}", what)))
        }
    }

    /// Parse the entire token stream; trailing tokens are an error
    pub fn parse(&mut self) -> Result<AstNode> {
        if self.current_token_is(TokenType::Eof) {
            return Err(self.error_at_current("Empty expression"));
        }

        let (expr, _) = self.parse_expression(0)?;

        if !self.current_token_is(TokenType::Eof) {
            return Err(self.error_at_current("Unexpected token"));
        }

        Ok(expr)
    }

    fn check_recursion_depth(&mut self) -> Result<()> {
        self.recursion_depth += 1;
        if self.recursion_depth > self.max_depth {
            return Err(self.error_at_current(format!(
                "Expression too deeply nested (max depth: {})",
                self.max_depth
            )));
        }
        Ok(())
    }

    fn decrement_recursion_depth(&mut self) {
        self.recursion_depth -= 1;
    }

    /// Depth of a node wrapping a child of `child_depth`
    ///
    /// Operator and invocation chains are built iteratively, so the tree can
    /// grow deeper than the parser's own recursion; evaluation cannot.
    fn wrap_depth(&self, child_depth: usize) -> Result<usize> {
        let depth = child_depth + 1;
        if depth > self.max_depth {
            return Err(self.error_at_current(format!(
                "Expression too deeply nested (max depth: {})",
                self.max_depth
            )));
        }
        Ok(depth)
    }

    /// Precedence of the current token if it is an infix operator
    fn infix_precedence(&self) -> Option<u8> {
        let token_type = self.current_token().token_type;
        match token_type {
            TokenType::Pipe => Some(UNION_PRECEDENCE),
            TokenType::Is | TokenType::As => Some(TYPE_PRECEDENCE),
            other => BinaryOperator::from_token(other).map(BinaryOperator::precedence),
        }
    }

    /// Precedence climbing: parse operators binding at least as tightly as `min_precedence`
    fn parse_expression(&mut self, min_precedence: u8) -> Result<Parsed> {
        self.check_recursion_depth()?;
        let (mut left, mut depth) = self.parse_unary()?;

        while let Some(precedence) = self.infix_precedence() {
            if precedence < min_precedence {
                break;
            }

            let operator_token = self.advance();
            match operator_token.token_type {
                TokenType::Is | TokenType::As => {
                    let type_specifier = self.parse_qualified_identifier()?;
                    depth = self.wrap_depth(depth)?;
                    let operator = if operator_token.token_type == TokenType::Is {
                        TypeOperator::Is
                    } else {
                        TypeOperator::As
                    };
                    left = AstNode::TypeOp {
                        operator,
                        operand: Box::new(left),
                        type_specifier,
                    };
                }
                TokenType::Pipe => {
                    let (right, right_depth) = self.parse_expression(precedence + 1)?;
                    left = match left {
                        AstNode::Union(mut operands) => {
                            depth = depth.max(self.wrap_depth(right_depth)?);
                            operands.push(right);
                            AstNode::Union(operands)
                        }
                        other => {
                            depth = self.wrap_depth(depth.max(right_depth))?;
                            AstNode::Union(vec![other, right])
                        }
                    };
                }
                token_type => {
                    let operator = BinaryOperator::from_token(token_type).ok_or_else(|| {
                        Error::parse(
                            operator_token.position,
                            operator_token.value.clone(),
                            "Unknown operator",
                        )
                    })?;
                    let next_min = if operator.is_right_associative() {
                        precedence
                    } else {
                        precedence + 1
                    };
                    let (right, right_depth) = self.parse_expression(next_min)?;
                    depth = self.wrap_depth(depth.max(right_depth))?;
                    left = AstNode::Binary {
                        operator,
                        left: Box::new(left),
                        right: Box::new(right),
                    };
                }
            }
        }

        self.decrement_recursion_depth();
        Ok((left, depth))
    }

    /// Unary `+`/`-` (right-associative), then postfix invocations
    fn parse_unary(&mut self) -> Result<Parsed> {
        if self.current_token_is_one_of(&[TokenType::Plus, TokenType::Minus]) {
            let operator = if self.advance().token_type == TokenType::Minus {
                UnaryOperator::Minus
            } else {
                UnaryOperator::Plus
            };
            self.check_recursion_depth()?;
            let (operand, operand_depth) = self.parse_unary()?;
            self.decrement_recursion_depth();
            let depth = self.wrap_depth(operand_depth)?;
            return Ok((
                AstNode::Unary {
                    operator,
                    operand: Box::new(operand),
                },
                depth,
            ));
        }

        let term = self.parse_term()?;
        self.parse_postfix(term)
    }

    /// `.member`, `.function(...)` and `[index]` chains
    fn parse_postfix(&mut self, (mut expr, mut depth): Parsed) -> Result<Parsed> {
        loop {
            if self.current_token_is(TokenType::Dot) {
                self.advance();
                if !self.current_token().is_name() {
                    return Err(self.error_at_current("Expected member or function name after '.'"));
                }
                let name = self.advance().value;
                expr = if self.current_token_is(TokenType::OpenParen) {
                    let (arguments, arguments_depth) = self.parse_arguments()?;
                    depth = self.wrap_depth(depth.max(arguments_depth))?;
                    AstNode::FunctionCall {
                        target: Some(Box::new(expr)),
                        name,
                        arguments,
                    }
                } else {
                    depth = self.wrap_depth(depth)?;
                    AstNode::Invocation {
                        target: Box::new(expr),
                        member: name,
                    }
                };
            } else if self.current_token_is(TokenType::OpenBracket) {
                self.advance();
                let (index, index_depth) = self.parse_expression(0)?;
                self.expect(TokenType::CloseBracket, "']'")?;
                depth = self.wrap_depth(depth.max(index_depth))?;
                expr = AstNode::Indexer {
                    target: Box::new(expr),
                    index: Box::new(index),
                };
            } else {
                return Ok((expr, depth));
            }
        }
    }

    /// `( arg, arg, ... )` with the depth of the deepest argument
    fn parse_arguments(&mut self) -> Result<(Vec<AstNode>, usize)> {
        self.expect(TokenType::OpenParen, "'('")?;
        let mut arguments = Vec::new();
        let mut depth = 0;

        if !self.current_token_is(TokenType::CloseParen) {
            loop {
                let (argument, argument_depth) = self.parse_expression(0)?;
                arguments.push(argument);
                depth = depth.max(argument_depth);
                if self.current_token_is(TokenType::Comma) {
                    self.advance();
                } else {
                    break;
                }
            }
        }

        self.expect(TokenType::CloseParen, "')' after function arguments")?;
        Ok((arguments, depth))
    }

    /// Call without a target; `name` has already been consumed
    fn parse_function_term(&mut self, name: String) -> Result<Parsed> {
        let (arguments, arguments_depth) = self.parse_arguments()?;
        let depth = self.wrap_depth(arguments_depth)?;
        Ok((
            AstNode::FunctionCall {
                target: None,
                name,
                arguments,
            },
            depth,
        ))
    }

    fn parse_term(&mut self) -> Result<Parsed> {
        let token = self.current_token().clone();
        match token.token_type {
            TokenType::OpenParen => {
                self.advance();
                let expr = self.parse_expression(0)?;
                self.expect(TokenType::CloseParen, "')'")?;
                Ok(expr)
            }
            TokenType::OpenBrace => self.parse_braces(),
            TokenType::ExternalConstant => {
                self.advance();
                Ok((AstNode::Variable(token.value), 1))
            }
            TokenType::This => {
                self.advance();
                Ok((AstNode::This, 1))
            }
            TokenType::Index => {
                self.advance();
                Ok((AstNode::Index, 1))
            }
            TokenType::Total => {
                self.advance();
                Ok((AstNode::Total, 1))
            }
            TokenType::Identifier | TokenType::DelimitedIdentifier => {
                self.advance();
                if self.current_token_is(TokenType::OpenParen) {
                    self.parse_function_term(token.value)
                } else {
                    Ok((AstNode::Identifier(token.value), 1))
                }
            }
            // Keyword-named functions at the start of a path: `is(Patient)`, `contains('a')`
            t if t.is_keyword() && self.peek_token().token_type == TokenType::OpenParen => {
                self.advance();
                self.parse_function_term(token.value)
            }
            TokenType::BooleanLiteral
            | TokenType::StringLiteral
            | TokenType::NumberLiteral
            | TokenType::LongNumberLiteral
            | TokenType::DateLiteral
            | TokenType::DateTimeLiteral
            | TokenType::TimeLiteral => self.parse_literal().map(|literal| (AstNode::Literal(literal), 1)),
            TokenType::Eof => Err(self.error_at_current("Unexpected end of expression")),
            _ => Err(self.error_at_current("Unexpected token")),
        }
    }

    /// `{}` (empty literal) or `{ a, b }` (collection literal)
    fn parse_braces(&mut self) -> Result<Parsed> {
        self.expect(TokenType::OpenBrace, "'{'")?;
        if self.current_token_is(TokenType::CloseBrace) {
            self.advance();
            return Ok((AstNode::Literal(Literal::Null), 1));
        }

        let mut elements = Vec::new();
        let mut depth = 0;
        loop {
            let (element, element_depth) = self.parse_expression(0)?;
            elements.push(element);
            depth = depth.max(element_depth);
            if self.current_token_is(TokenType::Comma) {
                self.advance();
            } else if self.current_token_is(TokenType::CloseBrace) {
                self.advance();
                let depth = self.wrap_depth(depth)?;
                return Ok((AstNode::Collection(elements), depth));
            } else {
                return Err(self.error_at_current("Expected ',' or '}' in collection literal"));
            }
        }
    }

    fn parse_literal(&mut self) -> Result<Literal> {
        let token = self.advance();
        let malformed = |what: &str| {
            Error::parse(
                token.position,
                token.value.clone(),
                format!("Malformed {} literal", what),
            )
        };

        match token.token_type {
            TokenType::BooleanLiteral => Ok(Literal::Boolean(token.value == "true")),
            TokenType::StringLiteral => Ok(Literal::String(token.value.clone())),
            TokenType::NumberLiteral => {
                // Quantity: number followed by a quoted UCUM unit or a calendar keyword
                let unit = if self.current_token_is(TokenType::StringLiteral) {
                    Some(self.advance().value)
                } else if self.current_token_is(TokenType::Identifier)
                    && calendar_keyword(&self.current_token().value).is_some()
                {
                    Some(self.advance().value)
                } else {
                    None
                };

                if let Some(unit) = unit {
                    let value = Decimal::from_str(&token.value).map_err(|_| malformed("quantity"))?;
                    Ok(Literal::Quantity { value, unit })
                } else if token.value.contains('.') {
                    Decimal::from_str(&token.value)
                        .map(Literal::Decimal)
                        .map_err(|_| malformed("decimal"))
                } else {
                    i64::from_str(&token.value)
                        .map(Literal::Integer)
                        .map_err(|_| malformed("integer"))
                }
            }
            TokenType::LongNumberLiteral => i64::from_str(token.value.trim_end_matches('L'))
                .map(Literal::Integer)
                .map_err(|_| malformed("long")),
            TokenType::DateLiteral => temporal_parse::parse_date(&token.value)
                .map(Literal::Date)
                .ok_or_else(|| malformed("date")),
            TokenType::DateTimeLiteral => temporal_parse::parse_datetime(&token.value)
                .map(Literal::DateTime)
                .ok_or_else(|| malformed("dateTime")),
            TokenType::TimeLiteral => temporal_parse::parse_time(&token.value)
                .map(Literal::Time)
                .ok_or_else(|| malformed("time")),
            _ => Err(Error::parse(token.position, token.value.clone(), "Expected literal")),
        }
    }

    /// Parse a qualified identifier: identifier ('.' identifier)*
    fn parse_qualified_identifier(&mut self) -> Result<QualifiedIdentifier> {
        if !self.current_token_is_one_of(&[TokenType::Identifier, TokenType::DelimitedIdentifier]) {
            return Err(self.error_at_current("Expected type name"));
        }
        let mut parts = vec![self.advance().value];

        while self.current_token_is(TokenType::Dot)
            && matches!(
                self.peek_token().token_type,
                TokenType::Identifier | TokenType::DelimitedIdentifier
            )
        {
            self.advance();
            parts.push(self.advance().value);
        }

        Ok(QualifiedIdentifier::new(parts))
    }
}
