//! Parser: recursive descent parser for hypothesis scripts
//!
//! Produces a flat statement list (ParsedScript). Statements keep source
//! order; the compiler replays them against a ScriptBuilder.

use super::lexer::{Lexer, Token, TokenKind};
use crate::errors::{DslError, DslResult};

/// Parsed script, the intermediate representation
#[derive(Clone, Debug, Default)]
pub struct ParsedScript {
    pub statements: Vec<Statement>,
}

/// One top-level script statement
#[derive(Clone, Debug, PartialEq)]
pub enum Statement {
    /// `DIST name { color weight ... }`
    Dist {
        name: String,
        weights: Vec<(String, f64)>,
        line: usize,
    },
    /// `LIST name [dist ...]`
    List {
        name: String,
        items: Vec<String>,
        line: usize,
    },
    /// `PERMUTE list`
    Permute { list: String, line: usize },
    /// `BUCKET slot = list[index]`
    Bucket {
        slot: String,
        list: String,
        index: usize,
        line: usize,
    },
    /// `SCHEDULE { bucket ... }`
    Schedule { buckets: Vec<String>, line: usize },
}

/// Parser for the hypothesis script language
pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    /// Parse script text into a ParsedScript
    pub fn parse(input: &str) -> DslResult<ParsedScript> {
        let mut lexer = Lexer::new(input);
        let tokens = lexer.tokenize()?;
        let mut parser = Self { tokens, pos: 0 };
        parser.parse_script()
    }

    fn parse_script(&mut self) -> DslResult<ParsedScript> {
        let mut script = ParsedScript::default();

        while !self.check(TokenKind::Eof) {
            let statement = match self.peek_kind() {
                TokenKind::Dist => self.parse_dist()?,
                TokenKind::List => self.parse_list()?,
                TokenKind::Permute => {
                    let line = self.advance().line;
                    let list = self.expect_identifier()?;
                    Statement::Permute { list, line }
                }
                TokenKind::Bucket => self.parse_bucket()?,
                TokenKind::Schedule => self.parse_schedule()?,
                _ => {
                    let tok = self.peek();
                    return Err(DslError::UnknownKeyword(tok.text.clone()));
                }
            };
            script.statements.push(statement);
        }

        Ok(script)
    }

    fn parse_dist(&mut self) -> DslResult<Statement> {
        let line = self.expect(TokenKind::Dist)?.line;
        let name = self.expect_identifier()?;
        self.expect(TokenKind::OpenBrace)?;

        let mut weights = Vec::new();
        while !self.check(TokenKind::CloseBrace) && !self.check(TokenKind::Eof) {
            let color = self.expect_identifier()?;
            let weight = self.expect_number()?;
            weights.push((color, weight));
        }

        self.expect(TokenKind::CloseBrace)?;
        Ok(Statement::Dist {
            name,
            weights,
            line,
        })
    }

    fn parse_list(&mut self) -> DslResult<Statement> {
        let line = self.expect(TokenKind::List)?.line;
        let name = self.expect_identifier()?;
        self.expect(TokenKind::OpenBracket)?;

        let mut items = Vec::new();
        while !self.check(TokenKind::CloseBracket) && !self.check(TokenKind::Eof) {
            items.push(self.expect_identifier()?);
        }

        self.expect(TokenKind::CloseBracket)?;
        Ok(Statement::List { name, items, line })
    }

    fn parse_bucket(&mut self) -> DslResult<Statement> {
        let line = self.expect(TokenKind::Bucket)?.line;
        let slot = self.expect_identifier()?;
        self.expect(TokenKind::Equals)?;
        let list = self.expect_identifier()?;
        self.expect(TokenKind::OpenBracket)?;
        let index = self.expect_index()?;
        self.expect(TokenKind::CloseBracket)?;

        Ok(Statement::Bucket {
            slot,
            list,
            index,
            line,
        })
    }

    fn parse_schedule(&mut self) -> DslResult<Statement> {
        let line = self.expect(TokenKind::Schedule)?.line;
        self.expect(TokenKind::OpenBrace)?;

        let mut buckets = Vec::new();
        while !self.check(TokenKind::CloseBrace) && !self.check(TokenKind::Eof) {
            buckets.push(self.expect_identifier()?);
        }

        self.expect(TokenKind::CloseBrace)?;
        Ok(Statement::Schedule { buckets, line })
    }

    // ── Helpers ──────────────────────────────────────────────────────

    fn peek(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn peek_kind(&self) -> TokenKind {
        self.peek().kind.clone()
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.peek_kind() == kind
    }

    fn advance(&mut self) -> &Token {
        let tok = &self.tokens[self.pos.min(self.tokens.len() - 1)];
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        tok
    }

    fn expect(&mut self, kind: TokenKind) -> DslResult<&Token> {
        if self.check(kind.clone()) {
            Ok(self.advance())
        } else if self.check(TokenKind::Eof) {
            Err(DslError::UnexpectedEof(format!("{}", kind)))
        } else {
            let tok = self.peek();
            Err(DslError::UnexpectedToken {
                expected: format!("{}", kind),
                found: tok.text.clone(),
            })
        }
    }

    fn expect_identifier(&mut self) -> DslResult<String> {
        let tok = self.expect(TokenKind::Identifier)?;
        Ok(tok.text.clone())
    }

    fn expect_number(&mut self) -> DslResult<f64> {
        let tok = self.expect(TokenKind::NumberLiteral)?;
        tok.text.parse::<f64>().map_err(|_| DslError::InvalidValue {
            field: "weight".into(),
            message: format!("'{}' is not a valid number", tok.text),
        })
    }

    fn expect_index(&mut self) -> DslResult<usize> {
        let tok = self.expect(TokenKind::NumberLiteral)?;
        tok.text.parse::<usize>().map_err(|_| DslError::InvalidValue {
            field: "index".into(),
            message: format!("'{}' is not a valid list index", tok.text),
        })
    }
}
