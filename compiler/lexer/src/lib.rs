use std::str::Chars;

use thiserror::Error;

#[derive(Error, Clone, Debug, PartialEq, Eq)]
pub enum LexError {
    #[error("unexpected character")]
    UnexpectedChar,
    #[error("invalid identifier")]
    InvalidIdentifier,
    #[error("integer constant out of range")]
    IntOutOfRange,
}

#[derive(Debug, Clone)]
pub struct Token {
    pub kind: TokenType,
    pub start: usize,
    pub end: usize,
    pub value: TokenValue,
    pub line: i32,
    pub col: i32,
}

impl Token {
    fn new(
        kind: TokenType,
        start: usize,
        end: usize,
        value: TokenValue,
        line: i32,
        col: i32,
    ) -> Self {
        Self {
            kind,
            start,
            end,
            value,
            line,
            col,
        }
    }
}

impl PartialEq for Token {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind
    }
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub enum TokenValue {
    None,
    Integer(i32),
    Ident(String),
    Error(LexError),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TokenType {
    // Single-character tokens
    OpenParen,
    CloseParen,
    OpenBrace,
    CloseBrace,
    Semicolon,
    Tilde,

    // One or two character tokens
    Bang,
    BangEqual,
    Equal,
    EqualEqual,
    Minus,
    Plus,
    Star,
    Slash,
    Percent,
    Amp,
    AmpAmp,
    Pipe,
    PipePipe,
    Less,
    LessEqual,
    LessLess,
    Greater,
    GreaterEqual,
    GreaterGreater,
    Xor,

    // Literals
    Identifier,
    Constant,

    // Keywords
    Int,
    Void,
    Return,

    // Informational
    Whitespace,
    Eof,
    InvalidIdent,
    InvalidConstant,
    Unknown,
}

const EOF: char = '\0';

pub struct Lexer<'a> {
    /// Source Text
    source: &'a str,

    /// Remaining source characters
    chars: Chars<'a>,
    line: i32,
    col: i32,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            chars: source.chars(),
            line: 1,
            col: 1,
        }
    }

    pub fn tokenize(&'a mut self) -> impl Iterator<Item = Token> + '_ {
        std::iter::from_fn(move || {
            let token = self.scan_token();
            if token.kind != TokenType::Eof {
                Some(token)
            } else {
                None
            }
        })
        .filter(|t| t.kind != TokenType::Whitespace)
    }

    fn scan_token(&mut self) -> Token {
        let start = self.offset();
        let col = self.col;

        let c = match self.advance() {
            Some(c) => c,
            None => {
                return Token::new(
                    TokenType::Eof,
                    start,
                    self.offset(),
                    TokenValue::None,
                    self.line,
                    self.col,
                )
            }
        };

        let token_type = match c {
            '(' => TokenType::OpenParen,
            ')' => TokenType::CloseParen,
            '{' => TokenType::OpenBrace,
            '}' => TokenType::CloseBrace,
            ';' => TokenType::Semicolon,
            '~' => TokenType::Tilde,
            '-' => TokenType::Minus,
            '+' => TokenType::Plus,
            '*' => TokenType::Star,
            '/' => TokenType::Slash,
            '%' => TokenType::Percent,
            '!' => match self.peek() {
                '=' => {
                    self.advance();
                    TokenType::BangEqual
                }
                _ => TokenType::Bang,
            },
            '=' => match self.peek() {
                '=' => {
                    self.advance();
                    TokenType::EqualEqual
                }
                _ => TokenType::Equal,
            },
            '&' => match self.peek() {
                '&' => {
                    self.advance();
                    TokenType::AmpAmp
                }
                _ => TokenType::Amp,
            },
            '|' => match self.peek() {
                '|' => {
                    self.advance();
                    TokenType::PipePipe
                }
                _ => TokenType::Pipe,
            },
            '^' => TokenType::Xor,
            '<' => match self.peek() {
                '<' => {
                    self.advance();
                    TokenType::LessLess
                }
                '=' => {
                    self.advance();
                    TokenType::LessEqual
                }
                _ => TokenType::Less,
            },
            '>' => match self.peek() {
                '>' => {
                    self.advance();
                    TokenType::GreaterGreater
                }
                '=' => {
                    self.advance();
                    TokenType::GreaterEqual
                }
                _ => TokenType::Greater,
            },
            _c @ '0'..='9' => self.number(),
            _c @ 'a'..='z' | _c @ 'A'..='Z' | _c @ '_' => self.identifier(start),
            ' ' | '\r' | '\t' => TokenType::Whitespace,
            '\n' => {
                self.line += 1;
                self.col = 1;
                TokenType::Whitespace
            }
            _ => TokenType::Unknown,
        };

        let end = self.offset();

        let (token_type, token_value) = match token_type {
            // a well-formed digit run can still overflow a 32-bit int
            TokenType::Constant => match self.source[start..end].parse::<i32>() {
                Ok(val) => (TokenType::Constant, TokenValue::Integer(val)),
                Err(_) => (
                    TokenType::InvalidConstant,
                    TokenValue::Error(LexError::IntOutOfRange),
                ),
            },
            TokenType::Identifier => (
                token_type,
                TokenValue::Ident(self.source[start..end].to_string()),
            ),
            TokenType::Unknown => (token_type, TokenValue::Error(LexError::UnexpectedChar)),
            TokenType::InvalidIdent => (token_type, TokenValue::Error(LexError::InvalidIdentifier)),
            _ => (token_type, TokenValue::None),
        };

        Token::new(token_type, start, end, token_value, self.line, col)
    }

    fn number(&mut self) -> TokenType {
        while self.peek().is_ascii_digit() {
            self.advance();
        }

        // identifiers may not start with a digit, e.g. "123abc"
        if self.peek().is_alphabetic() || self.peek() == '_' {
            while self.peek().is_alphanumeric() || self.peek() == '_' {
                self.advance();
            }

            return TokenType::InvalidIdent;
        }

        TokenType::Constant
    }

    fn identifier(&mut self, start: usize) -> TokenType {
        while self.peek().is_alphanumeric() || self.peek() == '_' {
            self.advance();
        }

        let text = &self.source[start..self.offset()];

        match text {
            "int" => TokenType::Int,
            "void" => TokenType::Void,
            "return" => TokenType::Return,
            _ => TokenType::Identifier,
        }
    }

    /// Get offset into source text
    fn offset(&self) -> usize {
        self.source.len() - self.chars.as_str().len()
    }

    fn peek(&self) -> char {
        self.chars.clone().next().unwrap_or(EOF)
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.chars.next()?;
        self.col += 1;

        Some(c)
    }
}
