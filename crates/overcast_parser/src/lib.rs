//! Overcast Parser
//!
//! Recursive descent over the token stream with single-token lookahead, a
//! bounded k-token peek and no backtracking. Grammar ambiguities between
//! assignments, member assignments, struct declarations and expression
//! statements are settled by what the parser already knows: the locals of
//! the active function scope and the function names declared so far.

mod error;
mod expr;
mod scope;
mod stmt;
pub mod tokenizer;
mod types;

use std::collections::HashSet;

use overcast_ast::{OcType, Program};

pub use error::{LexError, ParseError};
pub use scope::Scope;
use tokenizer::{Token, TokenKind};

/// Name of the built-in formatted print function.
pub const PRINT_FUNCTION: &str = "print";

pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    eof: Token,
    scopes: Vec<Scope>,
    functions: HashSet<String>,
    structs: HashSet<String>,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        let eof = match tokens.last() {
            Some(last) if last.kind == TokenKind::Eof => last.clone(),
            Some(last) => Token {
                kind: TokenKind::Eof,
                text: String::new(),
                line: last.line,
                column: last.column + last.text.len(),
            },
            None => Token {
                kind: TokenKind::Eof,
                text: String::new(),
                line: 1,
                column: 1,
            },
        };
        let mut functions = HashSet::new();
        functions.insert(PRINT_FUNCTION.to_string());
        Self {
            tokens,
            pos: 0,
            eof,
            scopes: vec![Scope::default()],
            functions,
            structs: HashSet::new(),
        }
    }

    /// Parse every top-level statement until `Eof`.
    pub fn parse_program(&mut self) -> Result<Program, ParseError> {
        let mut body = Vec::new();
        while self.current().kind != TokenKind::Eof {
            body.push(self.parse_statement()?);
        }
        Ok(Program { body })
    }

    /// Function names known to the parser, including `print`.
    pub fn declared_functions(&self) -> &HashSet<String> {
        &self.functions
    }

    pub fn declared_structs(&self) -> &HashSet<String> {
        &self.structs
    }

    fn current(&self) -> &Token {
        self.peek(0)
    }

    /// Token `n` positions ahead; past the end this is always `Eof`.
    fn peek(&self, n: usize) -> &Token {
        self.tokens.get(self.pos + n).unwrap_or(&self.eof)
    }

    fn advance(&mut self) -> Token {
        let token = self.current().clone();
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        token
    }

    fn check(&self, kind: TokenKind, text: &str) -> bool {
        self.current().is(kind, text)
    }

    fn consume(&mut self, kind: TokenKind) -> Result<Token, ParseError> {
        if self.current().kind == kind {
            Ok(self.advance())
        } else {
            Err(ParseError::mismatched(kind.to_string(), self.current()))
        }
    }

    fn consume_value(&mut self, kind: TokenKind, text: &str) -> Result<Token, ParseError> {
        if self.check(kind, text) {
            Ok(self.advance())
        } else {
            Err(ParseError::mismatched(format!("{kind} `{text}`"), self.current()))
        }
    }

    /// Skip a separating comma if present.
    fn eat_comma(&mut self) {
        if self.check(TokenKind::Symbol, ",") {
            self.advance();
        }
    }

    fn push_scope(&mut self) {
        self.scopes.push(Scope::default());
    }

    fn pop_scope(&mut self) {
        self.scopes.pop();
        if self.scopes.is_empty() {
            self.scopes.push(Scope::default());
        }
    }

    fn declare_local(&mut self, name: &str) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.declare(name);
        }
    }

    fn is_local(&self, name: &str) -> bool {
        self.scopes.last().is_some_and(|scope| scope.contains(name))
    }
}

/// Tokenize and parse a complete source text.
pub fn parse_source(source: &str) -> Result<Program, ParseError> {
    let tokens = tokenizer::tokenize(source)?;
    Parser::new(tokens).parse_program()
}

/// Parse the surface syntax of a type, e.g. `int**`.
pub fn parse_type_str(source: &str) -> Result<OcType, ParseError> {
    let tokens = tokenizer::tokenize(source)?;
    let mut parser = Parser::new(tokens);
    let ty = parser.parse_type()?;
    parser.consume(TokenKind::Eof)?;
    Ok(ty)
}
