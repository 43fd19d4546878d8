//! Lexer: tokenizes hypothesis script input
//!
//! Handles keywords, identifiers, numbers (integer or decimal) and the
//! structural tokens `{ } [ ] =`.

use crate::errors::{DslError, DslResult};

/// A token produced by the lexer
#[derive(Clone, Debug, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    /// The raw text of the token
    pub text: String,
    /// Line number (1-based)
    pub line: usize,
    /// Column number (1-based)
    pub col: usize,
}

impl Token {
    pub fn new(kind: TokenKind, text: impl Into<String>, line: usize, col: usize) -> Self {
        Self {
            kind,
            text: text.into(),
            line,
            col,
        }
    }
}

/// Token types
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TokenKind {
    // Keywords
    Dist,
    List,
    Permute,
    Bucket,
    Schedule,

    // Identifiers and literals
    Identifier,
    NumberLiteral,

    // Structural
    OpenBrace,
    CloseBrace,
    OpenBracket,
    CloseBracket,
    Equals,

    Eof,
}

impl std::fmt::Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Dist => write!(f, "DIST"),
            Self::List => write!(f, "LIST"),
            Self::Permute => write!(f, "PERMUTE"),
            Self::Bucket => write!(f, "BUCKET"),
            Self::Schedule => write!(f, "SCHEDULE"),
            Self::Identifier => write!(f, "identifier"),
            Self::NumberLiteral => write!(f, "number"),
            Self::OpenBrace => write!(f, "{{"),
            Self::CloseBrace => write!(f, "}}"),
            Self::OpenBracket => write!(f, "["),
            Self::CloseBracket => write!(f, "]"),
            Self::Equals => write!(f, "="),
            Self::Eof => write!(f, "end of input"),
        }
    }
}

/// Lexer for the hypothesis script language
pub struct Lexer {
    input: Vec<char>,
    pos: usize,
    line: usize,
    col: usize,
}

impl Lexer {
    pub fn new(input: &str) -> Self {
        Self {
            input: input.chars().collect(),
            pos: 0,
            line: 1,
            col: 1,
        }
    }

    /// Tokenize the entire input
    pub fn tokenize(&mut self) -> DslResult<Vec<Token>> {
        let mut tokens = Vec::new();

        loop {
            self.skip_whitespace_and_comments();

            if self.pos >= self.input.len() {
                tokens.push(Token::new(TokenKind::Eof, "", self.line, self.col));
                break;
            }

            tokens.push(self.next_token()?);
        }

        Ok(tokens)
    }

    fn next_token(&mut self) -> DslResult<Token> {
        let ch = self.input[self.pos];
        let line = self.line;
        let col = self.col;

        let structural = match ch {
            '{' => Some(TokenKind::OpenBrace),
            '}' => Some(TokenKind::CloseBrace),
            '[' => Some(TokenKind::OpenBracket),
            ']' => Some(TokenKind::CloseBracket),
            '=' => Some(TokenKind::Equals),
            _ => None,
        };
        if let Some(kind) = structural {
            self.advance();
            return Ok(Token::new(kind, ch.to_string(), line, col));
        }

        match ch {
            c if c.is_ascii_digit() => self.read_number(),
            c if c.is_ascii_alphabetic() || c == '_' => Ok(self.read_identifier_or_keyword()),
            _ => Err(DslError::ParseError {
                line,
                col,
                message: format!("Unexpected character: '{}'", ch),
            }),
        }
    }

    fn read_number(&mut self) -> DslResult<Token> {
        let line = self.line;
        let col = self.col;
        let mut text = String::new();
        let mut seen_dot = false;

        while let Some(c) = self.peek_at(0) {
            if c.is_ascii_digit() {
                text.push(c);
            } else if c == '.' && !seen_dot {
                seen_dot = true;
                text.push(c);
            } else {
                break;
            }
            self.advance();
        }

        if text.ends_with('.') {
            return Err(DslError::ParseError {
                line,
                col,
                message: format!("Malformed number: '{}'", text),
            });
        }

        Ok(Token::new(TokenKind::NumberLiteral, text, line, col))
    }

    fn read_identifier_or_keyword(&mut self) -> Token {
        let line = self.line;
        let col = self.col;
        let mut text = String::new();

        while let Some(c) = self.peek_at(0) {
            if !(c.is_ascii_alphanumeric() || c == '_') {
                break;
            }
            text.push(c);
            self.advance();
        }

        let kind = match text.as_str() {
            "DIST" => TokenKind::Dist,
            "LIST" => TokenKind::List,
            "PERMUTE" => TokenKind::Permute,
            "BUCKET" => TokenKind::Bucket,
            "SCHEDULE" => TokenKind::Schedule,
            _ => TokenKind::Identifier,
        };

        Token::new(kind, text, line, col)
    }

    fn skip_whitespace_and_comments(&mut self) {
        while let Some(ch) = self.peek_at(0) {
            if ch.is_whitespace() {
                self.advance();
            } else if ch == '#' || (ch == '/' && self.peek_at(1) == Some('/')) {
                while self.peek_at(0).is_some_and(|c| c != '\n') {
                    self.advance();
                }
            } else {
                break;
            }
        }
    }

    fn advance(&mut self) {
        if self.pos < self.input.len() {
            if self.input[self.pos] == '\n' {
                self.line += 1;
                self.col = 1;
            } else {
                self.col += 1;
            }
            self.pos += 1;
        }
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.input.get(self.pos + offset).copied()
    }
}
