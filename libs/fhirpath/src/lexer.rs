//! FHIRPath lexer - tokenizes input strings
//!
//! Converts FHIRPath expression strings into a stream of tokens.
//! Handles all lexical rules from the FHIRPath grammar. Offsets are
//! character offsets into the expression.

use crate::error::{Error, Result};
use crate::token::{Token, TokenType};

/// Tokenize a whole expression, ending with an `Eof` token
pub fn tokenize(input: &str) -> Result<Vec<Token>> {
    let mut lexer = Lexer::new(input);
    let mut tokens = Vec::new();
    loop {
        let token = lexer.next_token()?;
        let is_eof = token.token_type == TokenType::Eof;
        tokens.push(token);
        if is_eof {
            return Ok(tokens);
        }
    }
}

/// The FHIRPath lexer
pub struct Lexer {
    position: usize,
    line: usize,
    column: usize,
    chars: Vec<char>,
    current_char: Option<char>,
}

impl Lexer {
    /// Create a new lexer for the given input
    pub fn new(input: &str) -> Self {
        let chars: Vec<char> = input.chars().collect();
        let current_char = chars.first().copied();

        Self {
            position: 0,
            line: 1,
            column: 1,
            chars,
            current_char,
        }
    }

    /// Advance to the next character
    fn advance(&mut self) {
        if let Some(c) = self.current_char {
            if c == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
        }
        self.position += 1;
        self.current_char = self.chars.get(self.position).copied();
    }

    /// Peek at the next character without advancing
    fn peek(&self) -> Option<char> {
        self.chars.get(self.position + 1).copied()
    }

    /// Error at the current character (or the last one at end of input)
    fn error_here(&self, message: impl Into<String>) -> Error {
        let character = self
            .current_char
            .or_else(|| self.chars.last().copied())
            .unwrap_or('\0');
        Error::lex(self.position, character, message)
    }

    fn skip_whitespace(&mut self) {
        while let Some(c) = self.current_char {
            if c.is_whitespace() {
                self.advance();
            } else {
                break;
            }
        }
    }

    /// Skip comments (both // and /* */)
    fn skip_comment(&mut self) -> Result<()> {
        if self.current_char == Some('/') && self.peek() == Some('/') {
            self.advance();
            self.advance();

            while let Some(c) = self.current_char {
                self.advance();
                if c == '\n' {
                    break;
                }
            }
            Ok(())
        } else if self.current_char == Some('/') && self.peek() == Some('*') {
            let start = self.position;
            self.advance();
            self.advance();

            while let Some(c) = self.current_char {
                if c == '*' && self.peek() == Some('/') {
                    self.advance();
                    self.advance();
                    return Ok(());
                }
                self.advance();
            }

            Err(Error::lex(start, '/', "Unterminated block comment"))
        } else {
            Ok(())
        }
    }

    fn read_identifier(&mut self) -> String {
        let start_pos = self.position;

        while let Some(c) = self.current_char {
            if c.is_alphanumeric() || c == '_' {
                self.advance();
            } else {
                break;
            }
        }

        self.chars[start_pos..self.position].iter().collect()
    }

    /// Read a `\X` escape; the backslash has already been consumed
    fn read_escape(&mut self, value: &mut String) -> Result<()> {
        let Some(escaped) = self.current_char else {
            return Err(self.error_here("Incomplete escape sequence"));
        };

        match escaped {
            '`' => value.push('`'),
            '\'' => value.push('\''),
            '"' => value.push('"'),
            '\\' => value.push('\\'),
            '/' => value.push('/'),
            'f' => value.push('\x0C'),
            'n' => value.push('\n'),
            'r' => value.push('\r'),
            't' => value.push('\t'),
            'u' => {
                self.advance();
                let mut hex = String::with_capacity(4);
                for _ in 0..4 {
                    match self.current_char {
                        Some(h) if h.is_ascii_hexdigit() => {
                            hex.push(h);
                            self.advance();
                        }
                        Some(_) => return Err(self.error_here("Invalid unicode escape sequence")),
                        None => return Err(self.error_here("Incomplete unicode escape sequence")),
                    }
                }
                let code = u32::from_str_radix(&hex, 16)
                    .map_err(|_| self.error_here("Invalid unicode code point"))?;
                let ch = char::from_u32(code)
                    .ok_or_else(|| self.error_here("Invalid unicode character"))?;
                value.push(ch);
                return Ok(());
            }
            other => {
                return Err(self.error_here(format!("Unknown escape sequence '\\{}'", other)));
            }
        }

        self.advance();
        Ok(())
    }

    /// Read text enclosed by `quote` (string literals and delimited identifiers)
    fn read_quoted(&mut self, quote: char, what: &str) -> Result<String> {
        let start = self.position;
        self.advance(); // Skip opening quote

        let mut value = String::new();

        while let Some(c) = self.current_char {
            if c == quote {
                self.advance();
                return Ok(value);
            } else if c == '\\' {
                self.advance();
                self.read_escape(&mut value)?;
            } else {
                value.push(c);
                self.advance();
            }
        }

        Err(Error::lex(start, quote, format!("Unterminated {}", what)))
    }

    /// Read a number (NUMBER or LONGNUMBER)
    fn read_number(&mut self) -> (String, bool) {
        let start_pos = self.position;
        let mut is_long = false;
        let mut has_decimal = false;

        while let Some(c) = self.current_char {
            if c.is_ascii_digit() {
                self.advance();
            } else {
                break;
            }
        }

        // The dot only belongs to the number when digits follow (`1.toString()`)
        if self.current_char == Some('.') && self.peek().is_some_and(|c| c.is_ascii_digit()) {
            has_decimal = true;
            self.advance();
            while let Some(c) = self.current_char {
                if c.is_ascii_digit() {
                    self.advance();
                } else {
                    break;
                }
            }
        }

        if !has_decimal && self.current_char == Some('L') {
            is_long = true;
            self.advance();
        }

        let value: String = self.chars[start_pos..self.position].iter().collect();
        (value, is_long)
    }

    /// Read exactly `count` digits into `value`
    fn read_digits(&mut self, value: &mut String, count: usize, what: &str) -> Result<()> {
        for _ in 0..count {
            match self.current_char {
                Some(c) if c.is_ascii_digit() => {
                    value.push(c);
                    self.advance();
                }
                _ => return Err(self.error_here(format!("Expected 2-digit {}", what))),
            }
        }
        Ok(())
    }

    /// Read a date/time literal: @DATE, @DATETIME, @TIME
    fn read_date_time(&mut self) -> Result<(String, TokenType)> {
        self.advance(); // Skip '@'

        if self.current_char == Some('T') {
            self.advance();
            return self.read_time_format().map(|s| (s, TokenType::TimeLiteral));
        }

        let date_str = self.read_date_format()?;

        if self.current_char == Some('T') {
            self.advance();

            // `@2015T` is a partial DateTime with no time component
            if self.current_char.is_some_and(|c| c.is_ascii_digit()) {
                let time_str = self.read_time_format()?;
                let tz_str = if self.current_char_is_one_of(&['Z', '+', '-']) {
                    self.read_timezone_offset()?
                } else {
                    String::new()
                };
                Ok((
                    format!("{}T{}{}", date_str, time_str, tz_str),
                    TokenType::DateTimeLiteral,
                ))
            } else {
                Ok((format!("{}T", date_str), TokenType::DateTimeLiteral))
            }
        } else {
            Ok((date_str, TokenType::DateLiteral))
        }
    }

    /// Read date format: YYYY(-MM(-DD)?)?
    fn read_date_format(&mut self) -> Result<String> {
        let mut value = String::new();

        for _ in 0..4 {
            match self.current_char {
                Some(c) if c.is_ascii_digit() => {
                    value.push(c);
                    self.advance();
                }
                _ => return Err(self.error_here("Invalid date format: expected 4-digit year")),
            }
        }

        // A '-' not followed by a digit is a minus operator (`@2019 - 1 year`)
        if self.current_char == Some('-') && self.peek().is_some_and(|c| c.is_ascii_digit()) {
            value.push('-');
            self.advance();
            self.read_digits(&mut value, 2, "month")?;

            if self.current_char == Some('-') && self.peek().is_some_and(|c| c.is_ascii_digit()) {
                value.push('-');
                self.advance();
                self.read_digits(&mut value, 2, "day")?;
            }
        }

        Ok(value)
    }

    /// Read time format: HH(:MM(:SS(.fff)?)?)?
    fn read_time_format(&mut self) -> Result<String> {
        let mut value = String::new();

        self.read_digits(&mut value, 2, "hour")?;

        if self.current_char == Some(':') {
            value.push(':');
            self.advance();
            self.read_digits(&mut value, 2, "minute")?;

            if self.current_char == Some(':') {
                value.push(':');
                self.advance();
                self.read_digits(&mut value, 2, "second")?;

                // `@T14:34:28.is(Time)`: a dot without digits ends the literal
                if self.current_char == Some('.') && self.peek().is_some_and(|c| c.is_ascii_digit())
                {
                    value.push('.');
                    self.advance();
                    while let Some(c) = self.current_char {
                        if c.is_ascii_digit() {
                            value.push(c);
                            self.advance();
                        } else {
                            break;
                        }
                    }
                }
            }
        }

        Ok(value)
    }

    /// Read timezone offset: Z or +/-HH:MM
    fn read_timezone_offset(&mut self) -> Result<String> {
        let mut value = String::new();

        if self.current_char == Some('Z') {
            value.push('Z');
            self.advance();
            return Ok(value);
        }

        if let Some(sign) = self.current_char.filter(|c| *c == '+' || *c == '-') {
            value.push(sign);
            self.advance();
            self.read_digits(&mut value, 2, "timezone hour")?;

            if self.current_char != Some(':') {
                return Err(self.error_here("Invalid timezone format: expected ':'"));
            }
            value.push(':');
            self.advance();
            self.read_digits(&mut value, 2, "timezone minute")?;
        }

        Ok(value)
    }

    fn current_char_is_one_of(&self, chars: &[char]) -> bool {
        self.current_char.is_some_and(|c| chars.contains(&c))
    }

    /// Consume one character and build a fixed-text token
    fn single(&mut self, token_type: TokenType, text: &str) -> Token {
        let token = Token::new(token_type, text.into(), self.position, self.line, self.column);
        for _ in text.chars() {
            self.advance();
        }
        token
    }

    /// Get the next token from the input
    pub fn next_token(&mut self) -> Result<Token> {
        loop {
            self.skip_whitespace();
            if self.current_char == Some('/') && matches!(self.peek(), Some('/') | Some('*')) {
                self.skip_comment()?;
            } else {
                break;
            }
        }

        let position = self.position;
        let line = self.line;
        let column = self.column;

        let Some(c) = self.current_char else {
            return Ok(Token::eof(position, line, column));
        };

        let token = match c {
            '.' => self.single(TokenType::Dot, "."),
            '[' => self.single(TokenType::OpenBracket, "["),
            ']' => self.single(TokenType::CloseBracket, "]"),
            '(' => self.single(TokenType::OpenParen, "("),
            ')' => self.single(TokenType::CloseParen, ")"),
            '{' => self.single(TokenType::OpenBrace, "{"),
            '}' => self.single(TokenType::CloseBrace, "}"),
            ',' => self.single(TokenType::Comma, ","),
            '+' => self.single(TokenType::Plus, "+"),
            '-' => self.single(TokenType::Minus, "-"),
            '*' => self.single(TokenType::Multiply, "*"),
            '/' => self.single(TokenType::Divide, "/"),
            '&' => self.single(TokenType::Ampersand, "&"),
            '|' => self.single(TokenType::Pipe, "|"),
            '=' => self.single(TokenType::Equal, "="),
            '~' => self.single(TokenType::Equivalent, "~"),
            '<' if self.peek() == Some('=') => self.single(TokenType::LessThanOrEqual, "<="),
            '<' => self.single(TokenType::LessThan, "<"),
            '>' if self.peek() == Some('=') => self.single(TokenType::GreaterThanOrEqual, ">="),
            '>' => self.single(TokenType::GreaterThan, ">"),
            '!' if self.peek() == Some('=') => self.single(TokenType::NotEqual, "!="),
            '!' if self.peek() == Some('~') => self.single(TokenType::NotEquivalent, "!~"),
            '%' => {
                self.advance();
                let name = match self.current_char {
                    Some('\'') => self.read_quoted('\'', "string literal")?,
                    Some('`') => self.read_quoted('`', "delimited identifier")?,
                    Some(n) if n.is_alphabetic() || n == '_' => self.read_identifier(),
                    _ => return Err(Error::lex(position, '%', "Expected constant name after '%'")),
                };
                Token::new(TokenType::ExternalConstant, name, position, line, column)
            }
            '@' => {
                let (value, token_type) = self.read_date_time()?;
                Token::new(token_type, value, position, line, column)
            }
            '\'' => {
                let value = self.read_quoted('\'', "string literal")?;
                Token::new(TokenType::StringLiteral, value, position, line, column)
            }
            '`' => {
                let value = self.read_quoted('`', "delimited identifier")?;
                Token::new(TokenType::DelimitedIdentifier, value, position, line, column)
            }
            '$' => {
                self.advance();
                let ident = self.read_identifier();
                let token_type = match ident.as_str() {
                    "this" => TokenType::This,
                    "index" => TokenType::Index,
                    "total" => TokenType::Total,
                    _ => {
                        return Err(Error::lex(
                            position,
                            '$',
                            format!("Unknown variable: ${}", ident),
                        ))
                    }
                };
                Token::new(token_type, format!("${}", ident), position, line, column)
            }
            c if c.is_ascii_digit() => {
                let (value, is_long) = self.read_number();
                let token_type = if is_long {
                    TokenType::LongNumberLiteral
                } else {
                    TokenType::NumberLiteral
                };
                Token::new(token_type, value, position, line, column)
            }
            c if c.is_alphabetic() || c == '_' => {
                let ident = self.read_identifier();
                let token_type = match ident.as_str() {
                    "true" | "false" => TokenType::BooleanLiteral,
                    "as" => TokenType::As,
                    "is" => TokenType::Is,
                    "div" => TokenType::Div,
                    "mod" => TokenType::Mod,
                    "in" => TokenType::In,
                    "contains" => TokenType::Contains,
                    "and" => TokenType::And,
                    "or" => TokenType::Or,
                    "xor" => TokenType::Xor,
                    "implies" => TokenType::Implies,
                    _ => TokenType::Identifier,
                };
                Token::new(token_type, ident, position, line, column)
            }
            other => {
                return Err(Error::lex(
                    position,
                    other,
                    format!("Unexpected character: {}", other),
                ))
            }
        };

        Ok(token)
    }
}
