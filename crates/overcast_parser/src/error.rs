//! Errors raised while tokenizing and parsing.

use thiserror::Error;

use crate::tokenizer::{Token, TokenKind};

/// A character the tokenizer cannot start a token with, or an unterminated
/// string or comment.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} at line {line}, col {column}")]
pub struct LexError {
    pub message: String,
    pub line: usize,
    pub column: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error(transparent)]
    Lex(#[from] LexError),

    /// The current token does not have the kind (or value) the grammar needs.
    #[error("expected {expected}, got {found_kind} `{found}` at line {line}, col {column}")]
    MismatchedToken {
        expected: String,
        found_kind: TokenKind,
        found: String,
        line: usize,
        column: usize,
    },

    /// No expression production starts with the current token.
    #[error("expression expected, but found {found_kind} `{found}` at line {line}, col {column}")]
    NoExpression {
        found_kind: TokenKind,
        found: String,
        line: usize,
        column: usize,
    },

    #[error("{message} at line {line}, col {column}")]
    Syntax {
        message: String,
        line: usize,
        column: usize,
    },
}

impl ParseError {
    pub(crate) fn mismatched(expected: impl Into<String>, found: &Token) -> Self {
        ParseError::MismatchedToken {
            expected: expected.into(),
            found_kind: found.kind,
            found: found.text.clone(),
            line: found.line,
            column: found.column,
        }
    }

    pub(crate) fn no_expression(found: &Token) -> Self {
        ParseError::NoExpression {
            found_kind: found.kind,
            found: found.text.clone(),
            line: found.line,
            column: found.column,
        }
    }

    pub(crate) fn syntax(message: impl Into<String>, at: &Token) -> Self {
        ParseError::Syntax {
            message: message.into(),
            line: at.line,
            column: at.column,
        }
    }

    /// Line and column of the offending token.
    pub fn position(&self) -> (usize, usize) {
        match self {
            ParseError::Lex(err) => (err.line, err.column),
            ParseError::MismatchedToken { line, column, .. }
            | ParseError::NoExpression { line, column, .. }
            | ParseError::Syntax { line, column, .. } => (*line, *column),
        }
    }
}
